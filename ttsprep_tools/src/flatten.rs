//! Stage one: copy every transcribed audio file of a nested corpus into a
//! single directory and write the flat index next to it.

use std::fs::{self, File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::{Path, PathBuf};

use filetime::FileTime;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::PrepConfig;
use crate::error::{PrepError, SkipReason};
use crate::index::IndexRecord;

/// Result of handling one discovered audio file.
#[derive(Debug)]
pub enum EntryOutcome {
    Indexed(IndexRecord),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Default)]
pub struct FlattenSummary {
    pub indexed: usize,
    pub missing_transcript: usize,
    pub unreadable_transcript: usize,
    pub empty_transcript: usize,
    pub copy_failed: usize,
    pub non_utf8_name: usize,
    pub index_path: PathBuf,
    pub audio_dir: PathBuf,
}

impl FlattenSummary {
    pub fn skipped(&self) -> usize {
        self.missing_transcript
            + self.unreadable_transcript
            + self.empty_transcript
            + self.copy_failed
            + self.non_utf8_name
    }

    fn count_skip(&mut self, reason: &SkipReason) {
        match reason {
            SkipReason::MissingTranscript(_) => self.missing_transcript += 1,
            SkipReason::UnreadableTranscript { .. } => self.unreadable_transcript += 1,
            SkipReason::EmptyTranscript(_) => self.empty_transcript += 1,
            SkipReason::CopyFailed { .. } => self.copy_failed += 1,
            SkipReason::NonUtf8Name(_) => self.non_utf8_name += 1,
        }
    }
}

pub fn flatten_corpus(
    input_root: &Path,
    output_root: &Path,
    config: &PrepConfig,
) -> Result<FlattenSummary, PrepError> {
    if !input_root.is_dir() {
        return Err(PrepError::InputRootMissing(input_root.to_path_buf()));
    }
    let input_root = fs::canonicalize(input_root)
        .map_err(|e| PrepError::io("failed to resolve", input_root, e))?;

    let audio_dir = output_root.join(&config.audio_dir);
    fs::create_dir_all(&audio_dir)
        .map_err(|e| PrepError::io("failed to create", &audio_dir, e))?;
    let audio_dir = fs::canonicalize(&audio_dir)
        .map_err(|e| PrepError::io("failed to resolve", &audio_dir, e))?;

    // Collected up front so files copied into an output nested inside the
    // input are never picked up again.
    let sources = discover_audio(&input_root, &config.audio_extension, Some(&audio_dir));
    info!(
        count = sources.len(),
        root = %input_root.display(),
        "discovered audio files"
    );

    let index_path = output_root.join(&config.index_file);
    let index_file =
        File::create(&index_path).map_err(|e| PrepError::io("failed to create", &index_path, e))?;
    let mut index = LineWriter::new(index_file);

    let mut summary = FlattenSummary {
        index_path: index_path.clone(),
        audio_dir: audio_dir.clone(),
        ..Default::default()
    };
    let rel_dir = config.audio_dir.trim_end_matches(['/', '\\']);

    for source in &sources {
        match flatten_entry(source, &audio_dir, rel_dir, &config.transcript_suffix) {
            EntryOutcome::Indexed(record) => {
                writeln!(index, "{record}")
                    .map_err(|e| PrepError::io("failed to write", &index_path, e))?;
                summary.indexed += 1;
                if config.progress_every > 0 && summary.indexed % config.progress_every == 0 {
                    println!("Processed {} files...", summary.indexed);
                }
            }
            EntryOutcome::Skipped(reason) => {
                warn!(audio = %source.display(), "skipped: {reason}");
                summary.count_skip(&reason);
            }
        }
    }
    index
        .flush()
        .map_err(|e| PrepError::io("failed to write", &index_path, e))?;

    println!(
        "Flattened {} entries into {} (skipped {})",
        summary.indexed,
        index_path.display(),
        summary.skipped()
    );
    println!("Audio files copied to {}", audio_dir.display());
    Ok(summary)
}

/// Every file under `root` whose extension matches, visited in file-name
/// order. `exclude` prunes one directory from the walk.
pub fn discover_audio(root: &Path, extension: &str, exclude: Option<&Path>) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| exclude.is_none_or(|dir| e.path() != dir))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("cannot read directory entry: {err}");
                None
            }
        })
        .filter(|e| has_extension(e.path(), extension) && e.path().is_file())
        .map(|e| e.into_path())
        .collect()
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension.trim_start_matches('.')))
}

/// `a/1/001.wav` with `.normalized.txt` -> `a/1/001.normalized.txt`.
pub fn sidecar_path(audio: &Path, suffix: &str) -> PathBuf {
    let mut path = audio.with_extension("").into_os_string();
    path.push(suffix);
    PathBuf::from(path)
}

/// Trimmed transcript text. Line breaks are folded into spaces so the text
/// fits on one index line.
pub fn read_transcript(path: &Path) -> Result<String, SkipReason> {
    if !path.is_file() {
        return Err(SkipReason::MissingTranscript(path.to_path_buf()));
    }
    let raw = fs::read_to_string(path).map_err(|source| SkipReason::UnreadableTranscript {
        path: path.to_path_buf(),
        source,
    })?;
    let text = raw.trim();
    if text.is_empty() {
        return Err(SkipReason::EmptyTranscript(path.to_path_buf()));
    }
    if text.contains(['\n', '\r']) {
        Ok(text
            .split(['\n', '\r'])
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" "))
    } else {
        Ok(text.to_string())
    }
}

/// Names tried for `source` inside `dir`: the original name, then
/// `{stem}_1.ext`, `{stem}_2.ext`, ... A suffix adds an underscore token to
/// the name, which speaker inference later sees.
pub fn destination_candidates(dir: &Path, source: &Path) -> impl Iterator<Item = PathBuf> {
    let name = source.file_name().unwrap_or_default().to_os_string();
    let stem = source.file_stem().unwrap_or_default().to_os_string();
    let ext = source.extension().map(|e| e.to_os_string());
    let dir = dir.to_path_buf();

    let suffixed = (1u64..).map(move |n| {
        let mut candidate = stem.clone();
        candidate.push(format!("_{n}"));
        if let Some(ext) = &ext {
            candidate.push(".");
            candidate.push(ext);
        }
        candidate
    });
    std::iter::once(name)
        .chain(suffixed)
        .map(move |candidate| dir.join(candidate))
}

/// Copy `source` into the first free name inside `dir`, keeping permissions
/// and timestamps. Names are claimed with `create_new`, so an existing file is
/// never truncated. A failed copy leaves nothing behind.
pub fn copy_to_unique(source: &Path, dir: &Path) -> io::Result<PathBuf> {
    let mut input = File::open(source)?;
    let meta = input.metadata()?;

    for candidate in destination_candidates(dir, source) {
        let output = match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(output) => output,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err),
        };
        if let Err(err) = fill_destination(&mut input, output, &candidate, &meta) {
            let _ = fs::remove_file(&candidate);
            return Err(err);
        }
        return Ok(candidate);
    }
    Err(io::Error::other("no free destination name"))
}

fn fill_destination(
    input: &mut File,
    mut output: File,
    dest: &Path,
    meta: &fs::Metadata,
) -> io::Result<()> {
    io::copy(input, &mut output)?;
    output.sync_all()?;
    drop(output);
    fs::set_permissions(dest, meta.permissions())?;
    filetime::set_file_times(
        dest,
        FileTime::from_last_access_time(meta),
        FileTime::from_last_modification_time(meta),
    )
}

fn flatten_entry(source: &Path, audio_dir: &Path, rel_dir: &str, suffix: &str) -> EntryOutcome {
    // Index lines are UTF-8 and must name the copied file exactly.
    if source.file_name().and_then(|n| n.to_str()).is_none() {
        return EntryOutcome::Skipped(SkipReason::NonUtf8Name(source.to_path_buf()));
    }
    let text = match read_transcript(&sidecar_path(source, suffix)) {
        Ok(text) => text,
        Err(reason) => return EntryOutcome::Skipped(reason),
    };

    let dest = match copy_to_unique(source, audio_dir) {
        Ok(dest) => dest,
        Err(err) => {
            return EntryOutcome::Skipped(SkipReason::CopyFailed {
                dest: audio_dir.to_path_buf(),
                source: err,
            });
        }
    };

    let name = match dest.file_name().and_then(|n| n.to_str()) {
        Some(name) => name.to_string(),
        None => return EntryOutcome::Skipped(SkipReason::NonUtf8Name(dest.clone())),
    };
    let audio = if rel_dir.is_empty() {
        name
    } else {
        format!("{rel_dir}/{name}")
    };
    EntryOutcome::Indexed(IndexRecord::new(audio, text))
}
