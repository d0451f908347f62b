//! Stage two: turn the flat index into a JSONL training manifest.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::PrepConfig;
use crate::error::PrepError;
use crate::index::{IndexRecord, LineSkip};
use crate::speaker::SpeakerPolicy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestRecord {
    pub id: String,
    pub text: String,
    pub audio: String,
    pub speaker: String,
    pub language: String,
}

#[derive(Debug, Clone)]
pub struct ManifestOptions {
    /// Root the relative index paths hang off. Falls back to the working
    /// directory when unset.
    pub dataset_root: Option<PathBuf>,
    pub language: String,
    pub speaker_policy: SpeakerPolicy,
}

impl ManifestOptions {
    pub fn from_config(
        config: &PrepConfig,
        dataset_root: Option<PathBuf>,
    ) -> Result<Self, PrepError> {
        Ok(Self {
            dataset_root,
            language: config.language()?.to_string(),
            speaker_policy: config.speaker_policy()?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ManifestSummary {
    pub written: usize,
    pub blank: usize,
    pub malformed: usize,
    pub empty_text: usize,
    pub manifest_path: PathBuf,
}

pub fn build_manifest(
    index_path: &Path,
    manifest_path: &Path,
    options: &ManifestOptions,
) -> Result<ManifestSummary, PrepError> {
    if !index_path.is_file() {
        return Err(PrepError::IndexMissing(index_path.to_path_buf()));
    }
    let base = match &options.dataset_root {
        Some(root) => std::path::absolute(root)
            .map_err(|e| PrepError::io("failed to resolve", root, e))?,
        None => std::env::current_dir().map_err(|e| PrepError::io("failed to resolve", ".", e))?,
    };

    println!("Generating manifest: {}", manifest_path.display());
    info!(
        index = %index_path.display(),
        root = %base.display(),
        policy = %options.speaker_policy,
        "building manifest"
    );

    let input =
        File::open(index_path).map_err(|e| PrepError::io("failed to open", index_path, e))?;
    let mut reader = BufReader::new(input);

    if let Some(parent) = manifest_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PrepError::io("failed to create", parent, e))?;
    }
    let out_file = File::create(manifest_path)
        .map_err(|e| PrepError::io("failed to create", manifest_path, e))?;
    let mut writer = BufWriter::new(out_file);

    let mut summary = ManifestSummary {
        manifest_path: manifest_path.to_path_buf(),
        ..Default::default()
    };
    let mut buf = Vec::new();
    let mut line_no = 0usize;

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| PrepError::io("failed to read", index_path, e))?;
        if read == 0 {
            break;
        }
        line_no += 1;

        let parsed = match std::str::from_utf8(&buf) {
            Ok(line) => IndexRecord::parse(line),
            Err(_) => Err(LineSkip::Malformed),
        };
        let entry = match parsed {
            Ok(entry) => entry,
            Err(skip) => {
                debug!(line = line_no, ?skip, "skipping index line");
                match skip {
                    LineSkip::Blank => summary.blank += 1,
                    LineSkip::Malformed => summary.malformed += 1,
                    LineSkip::EmptyText => summary.empty_text += 1,
                }
                continue;
            }
        };

        let record = ManifestRecord {
            id: Uuid::new_v4().to_string(),
            audio: resolve_audio_path(&base, &entry.audio)
                .to_string_lossy()
                .into_owned(),
            speaker: options.speaker_policy.infer(Path::new(&entry.audio)),
            language: options.language.clone(),
            text: entry.text,
        };

        serde_json::to_writer(&mut writer, &record)?;
        writer
            .write_all(b"\n")
            .map_err(|e| PrepError::io("failed to write", manifest_path, e))?;
        summary.written += 1;
    }

    writer
        .flush()
        .map_err(|e| PrepError::io("failed to write", manifest_path, e))?;

    println!("Wrote: {}", manifest_path.display());
    println!("Kept: {}", summary.written);
    println!(
        "Skipped (blank: {}, malformed: {}, empty text: {})",
        summary.blank, summary.malformed, summary.empty_text
    );

    Ok(summary)
}

/// Absolute location of `rel` under `base`. Existing files are fully
/// canonicalized; otherwise `.` and `..` are collapsed lexically.
pub fn resolve_audio_path(base: &Path, rel: &str) -> PathBuf {
    let joined = base.join(rel);
    fs::canonicalize(&joined).unwrap_or_else(|_| normalize_lexically(&joined))
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}
