//! Flatten nested speech corpora into `wavs/` plus a pipe-delimited index,
//! and turn that index into a JSONL manifest for TTS training.

pub mod config;
pub mod error;
pub mod flatten;
pub mod index;
pub mod manifest;
pub mod pipeline;
pub mod speaker;

pub use config::PrepConfig;
pub use error::{PipelineError, PrepError, SkipReason, Stage};
pub use flatten::{FlattenSummary, flatten_corpus};
pub use index::IndexRecord;
pub use manifest::{ManifestOptions, ManifestRecord, ManifestSummary, build_manifest};
pub use pipeline::{PipelineSummary, run_pipeline};
pub use speaker::SpeakerPolicy;
