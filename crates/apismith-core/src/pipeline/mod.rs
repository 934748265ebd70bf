//! The documentation-to-client pipeline.
//!
//! A run threads one [`PipelineState`] through fetch, extraction, an optional
//! credential prompt, code generation and persistence. [`select_route`]
//! decides after extraction whether the credential stage runs.

mod branch;
mod orchestrator;
mod stages;
mod state;

pub use branch::{merge_credential, requires_credential, select_route};
pub use orchestrator::{Pipeline, PipelineBuilder, PipelineFailure, ProgressCallback};
pub use stages::{
    CodeGenerator, ContentFetcher, CredentialCollector, MetadataExtractor, StaticCredential,
};
pub use state::{PipelineState, Stage};
