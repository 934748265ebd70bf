//! Stage spinner for pipeline runs.

use std::time::Duration;

use apismith_core::Stage;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Spinner that follows the stages of one run on stderr.
///
/// Hidden while the credential prompt owns the terminal. Disabled entirely
/// when stderr is not a terminal or output is quiet.
#[derive(Clone)]
pub struct StageProgress {
    bar: Option<ProgressBar>,
}

impl StageProgress {
    /// Create a spinner, or a no-op when `enabled` is false.
    pub fn new(enabled: bool) -> Self {
        let bar = enabled.then(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg} {elapsed:.dim}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });
        Self { bar }
    }

    /// Reflect a stage reported by the pipeline.
    pub fn update(&self, stage: Stage) {
        let Some(pb) = &self.bar else {
            return;
        };
        match stage {
            Stage::CredentialPending => pb.set_draw_target(ProgressDrawTarget::hidden()),
            Stage::CredentialCollected => {
                pb.set_draw_target(ProgressDrawTarget::stderr());
                pb.set_message(stage_message(stage));
            },
            Stage::Persisted | Stage::Failed => pb.finish_and_clear(),
            _ => pb.set_message(stage_message(stage)),
        }
    }
}

/// What the run is doing after reaching `stage`.
pub const fn stage_message(stage: Stage) -> &'static str {
    match stage {
        Stage::Init => "Reading documentation page...",
        Stage::Extracted | Stage::CredentialCollected => "Generating client...",
        Stage::CredentialPending => "Waiting for API key...",
        Stage::CodeGenerated => "Writing client...",
        Stage::Persisted => "Done",
        Stage::Failed => "Failed",
    }
}
