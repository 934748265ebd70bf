//! # Output Formatting
//!
//! Run results go to stdout, as colored text or a single JSON object
//! (`--format json`). Progress and prompts go to stderr so stdout can be piped.
//!
//! ```bash
//! apismith run --url "$DOCS" --task "list users" --format json | jq .file
//! ```

mod progress;
mod summary;

pub use progress::StageProgress;
pub use summary::RunSummary;
