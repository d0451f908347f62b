use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal failures of a conversion stage.
///
/// Anything that only affects a single corpus entry is a [`SkipReason`]
/// instead and never surfaces here.
#[derive(Debug, Error)]
pub enum PrepError {
    #[error("input root does not exist or is not a directory: {}", .0.display())]
    InputRootMissing(PathBuf),
    #[error("flat index not found: {}", .0.display())]
    IndexMissing(PathBuf),
    #[error("no speaker policy configured (expected `simple` or `composite`)")]
    SpeakerPolicyUnset,
    #[error("no language tag configured")]
    LanguageUnset,
    #[error("failed to parse config {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode manifest record: {0}")]
    Encode(#[from] serde_json::Error),
}

impl PrepError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

/// Why a single corpus entry was left out of the flat index.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("no transcript at {}", .0.display())]
    MissingTranscript(PathBuf),
    #[error("cannot read transcript {}: {source}", .path.display())]
    UnreadableTranscript {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("transcript {} is empty", .0.display())]
    EmptyTranscript(PathBuf),
    #[error("cannot copy to {}: {source}", .dest.display())]
    CopyFailed {
        dest: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("file name of {} is not valid UTF-8", .0.display())]
    NonUtf8Name(PathBuf),
}

/// Which half of `run_pipeline` failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Flatten,
    Manifest,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Flatten => f.write_str("step 1 (flatten)"),
            Stage::Manifest => f.write_str("step 2 (manifest)"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Precondition(PrepError),
    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: PrepError,
    },
    #[error("step 1 (flatten) produced no flat index at {}", .0.display())]
    IndexMissing(PathBuf),
}
