use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::PrepError;
use crate::speaker::SpeakerPolicy;

/// Corpus conventions shared by both conversion stages.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PrepConfig {
    /// Audio file extension to collect, without the dot. Matched case-insensitively.
    pub audio_extension: String,
    /// Replaces the audio extension to locate the sidecar transcript.
    pub transcript_suffix: String,
    /// Flat audio directory, relative to the output root.
    pub audio_dir: String,
    pub index_file: String,
    pub manifest_file: String,
    pub language: Option<String>,
    pub speaker_policy: Option<SpeakerPolicy>,
    pub progress_every: usize,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            audio_extension: "wav".to_string(),
            transcript_suffix: ".normalized.txt".to_string(),
            audio_dir: "wavs".to_string(),
            index_file: "train.txt".to_string(),
            manifest_file: "train.jsonl".to_string(),
            language: None,
            speaker_policy: None,
            progress_every: 100,
        }
    }
}

impl PrepConfig {
    pub fn load(path: &Path) -> Result<Self, PrepError> {
        let contents =
            fs::read_to_string(path).map_err(|e| PrepError::io("failed to read", path, e))?;
        toml::from_str(&contents).map_err(|source| PrepError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Language tag, which must be configured before writing a manifest.
    pub fn language(&self) -> Result<&str, PrepError> {
        self.language
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .ok_or(PrepError::LanguageUnset)
    }

    pub fn speaker_policy(&self) -> Result<SpeakerPolicy, PrepError> {
        self.speaker_policy.ok_or(PrepError::SpeakerPolicyUnset)
    }
}
