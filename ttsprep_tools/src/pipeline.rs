//! Flatten, then build the manifest, against one output root.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::config::PrepConfig;
use crate::error::{PipelineError, PrepError, Stage};
use crate::flatten::{FlattenSummary, flatten_corpus};
use crate::manifest::{ManifestOptions, ManifestSummary, build_manifest};

#[derive(Debug, Clone)]
pub struct PipelineSummary {
    pub flatten: FlattenSummary,
    pub manifest: ManifestSummary,
}

/// Run both stages. Everything the manifest stage needs is validated before
/// the first file is copied; nothing is rolled back on failure.
pub fn run_pipeline(
    input_root: &Path,
    output_root: &Path,
    config: &PrepConfig,
) -> Result<PipelineSummary, PipelineError> {
    let options = ManifestOptions::from_config(config, Some(output_root.to_path_buf()))
        .map_err(PipelineError::Precondition)?;
    if !input_root.is_dir() {
        return Err(PipelineError::Precondition(PrepError::InputRootMissing(
            input_root.to_path_buf(),
        )));
    }
    fs::create_dir_all(output_root).map_err(|e| {
        PipelineError::Precondition(PrepError::io("failed to create", output_root, e))
    })?;

    println!("\n[step 1/2] Flattening corpus and copying audio...");
    info!(input = %input_root.display(), output = %output_root.display(), "flatten stage");
    let flatten = flatten_corpus(input_root, output_root, config).map_err(|source| {
        PipelineError::Stage {
            stage: Stage::Flatten,
            source,
        }
    })?;

    let index_path = output_root.join(&config.index_file);
    if !index_path.is_file() {
        return Err(PipelineError::IndexMissing(index_path));
    }

    println!("\n[step 2/2] Generating JSONL manifest...");
    info!(index = %index_path.display(), "manifest stage");
    let manifest_path = output_root.join(&config.manifest_file);
    let manifest = build_manifest(&index_path, &manifest_path, &options).map_err(|source| {
        PipelineError::Stage {
            stage: Stage::Manifest,
            source,
        }
    })?;

    Ok(PipelineSummary { flatten, manifest })
}
