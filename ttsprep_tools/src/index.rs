//! The pipe-delimited flat index shared by both stages.

use std::fmt;

/// One `relative_audio_path | transcript` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRecord {
    pub audio: String,
    pub text: String,
}

/// Why an index line did not yield a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSkip {
    Blank,
    /// No `|`, or nothing before it.
    Malformed,
    EmptyText,
}

impl IndexRecord {
    pub fn new(audio: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            audio: audio.into(),
            text: text.into(),
        }
    }

    /// Parse one index line. Only the first `|` separates path from text.
    pub fn parse(line: &str) -> Result<Self, LineSkip> {
        let line = line.trim();
        if line.is_empty() {
            return Err(LineSkip::Blank);
        }
        let (audio, text) = line.split_once('|').ok_or(LineSkip::Malformed)?;
        let (audio, text) = (audio.trim(), text.trim());
        if audio.is_empty() {
            return Err(LineSkip::Malformed);
        }
        if text.is_empty() {
            return Err(LineSkip::EmptyText);
        }
        Ok(Self::new(audio, text))
    }
}

impl fmt::Display for IndexRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.audio, self.text)
    }
}
