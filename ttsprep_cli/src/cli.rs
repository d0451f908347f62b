//! Command-line interface for ttsprep.
//!
//! Provides commands for flattening a corpus, building a manifest from an
//! existing flat index, and running both in sequence.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use ttsprep_tools::{
    ManifestOptions, PrepConfig, SpeakerPolicy, build_manifest, flatten_corpus, run_pipeline,
};

/// ttsprep - speech corpus flattening and TTS manifest generation
#[derive(Parser, Debug)]
#[command(name = "ttsprep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TOML file with corpus conventions (suffixes, language, speaker policy)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Copy transcribed audio into <output>/wavs and write the flat index
    Flatten {
        /// Corpus root to search recursively
        #[arg(short, long)]
        input: PathBuf,

        /// Output dataset root
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Build the JSONL manifest from an existing flat index
    Manifest {
        /// Flat index (`wavs/x.wav | text` per line)
        #[arg(long)]
        index: PathBuf,

        /// Manifest to write (defaults to the configured manifest file beside the index)
        #[arg(short, long)]
        manifest: Option<PathBuf>,

        /// Root the index paths are relative to (defaults to the working directory)
        #[arg(long)]
        dataset_root: Option<PathBuf>,

        #[command(flatten)]
        tags: ManifestArgs,
    },

    /// Flatten, then build the manifest, in one output root
    Run {
        /// Corpus root to search recursively
        #[arg(short, long)]
        input: PathBuf,

        /// Output dataset root
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        tags: ManifestArgs,
    },
}

#[derive(clap::Args, Debug)]
pub struct ManifestArgs {
    /// How speaker ids are read from file names
    #[arg(short, long, value_enum)]
    pub speaker_policy: Option<PolicyArg>,

    /// Language tag written to every record
    #[arg(short, long)]
    pub language: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum PolicyArg {
    /// Token before the first underscore
    Simple,
    /// `{token[3]}_{token[0]}` for four or more tokens
    Composite,
}

impl From<PolicyArg> for SpeakerPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Simple => SpeakerPolicy::Simple,
            PolicyArg::Composite => SpeakerPolicy::Composite,
        }
    }
}

impl ManifestArgs {
    fn apply(&self, config: &mut PrepConfig) {
        if let Some(policy) = self.speaker_policy {
            config.speaker_policy = Some(policy.into());
        }
        if let Some(language) = &self.language {
            config.language = Some(language.clone());
        }
    }
}

impl Cli {
    pub fn execute(self) -> Result<()> {
        let mut config = match &self.config {
            Some(path) => PrepConfig::load(path)?,
            None => PrepConfig::default(),
        };

        match self.command {
            Commands::Flatten { input, output } => {
                let summary = flatten_corpus(&input, &output, &config)
                    .with_context(|| format!("Failed to flatten {}", input.display()))?;
                println!(
                    "Done: {} entries indexed, {} skipped",
                    summary.indexed,
                    summary.skipped()
                );
            }

            Commands::Manifest {
                index,
                manifest,
                dataset_root,
                tags,
            } => {
                tags.apply(&mut config);
                let manifest = manifest.unwrap_or_else(|| sibling(&index, &config.manifest_file));
                let options = ManifestOptions::from_config(&config, dataset_root)?;
                if options.dataset_root.is_none() {
                    tracing::warn!("no --dataset-root given; using the working directory");
                }
                let summary = build_manifest(&index, &manifest, &options)
                    .with_context(|| format!("Failed to build manifest from {}", index.display()))?;
                println!("Done: {} records written", summary.written);
            }

            Commands::Run {
                input,
                output,
                tags,
            } => {
                tags.apply(&mut config);
                println!("=== Preparing dataset ===");
                println!("Input:  {}", input.display());
                println!("Output: {}", output.display());

                let summary = run_pipeline(&input, &output, &config)?;
                println!("\n=== Done ===");
                println!(
                    "{} entries indexed ({} skipped), {} manifest records",
                    summary.flatten.indexed,
                    summary.flatten.skipped(),
                    summary.manifest.written
                );
                println!(
                    "Manifest ready for training: {}",
                    summary.manifest.manifest_path.display()
                );
            }
        }

        Ok(())
    }
}

fn sibling(index: &Path, name: &str) -> PathBuf {
    index
        .parent()
        .map(|dir| dir.join(name))
        .unwrap_or_else(|| PathBuf::from(name))
}
