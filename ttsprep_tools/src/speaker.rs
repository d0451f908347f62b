//! Speaker ids derived from audio file names.
//!
//! Corpora encode speakers in their file names in incompatible ways, so the
//! caller always picks the rule explicitly.

use std::fmt;
use std::path::Path;

use serde::Deserialize;

pub const UNKNOWN_SPEAKER: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeakerPolicy {
    /// Token before the first underscore: `1089_1000_004074_000003` -> `1089`.
    /// Collision suffixes count as tokens, so `001_1.wav` -> `001`.
    Simple,
    /// `{token[3]}_{token[0]}` for names with at least four tokens:
    /// `1581_060_000083_000001` -> `000001_1581`.
    Composite,
}

impl SpeakerPolicy {
    /// Infer the speaker for an audio path (only the file stem is looked at).
    pub fn infer(self, audio: &Path) -> String {
        let stem = audio
            .file_stem()
            .map(|s| s.to_string_lossy())
            .unwrap_or_default();
        match self {
            SpeakerPolicy::Simple => simple(&stem),
            SpeakerPolicy::Composite => composite(&stem),
        }
    }
}

fn simple(stem: &str) -> String {
    match stem.split_once('_') {
        Some((speaker, _)) if !speaker.is_empty() => speaker.to_string(),
        _ => UNKNOWN_SPEAKER.to_string(),
    }
}

fn composite(stem: &str) -> String {
    let tokens: Vec<&str> = stem.split('_').collect();
    if tokens.len() >= 4 {
        format!("{}_{}", tokens[3], tokens[0])
    } else {
        UNKNOWN_SPEAKER.to_string()
    }
}

impl fmt::Display for SpeakerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeakerPolicy::Simple => f.write_str("simple"),
            SpeakerPolicy::Composite => f.write_str("composite"),
        }
    }
}
