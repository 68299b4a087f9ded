use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, bail};
use image::{GrayImage, ImageError, ImageFormat, ImageReader};
use rayon::prelude::*;

use crate::config::CropConfig;
use crate::detection::build_standard_pipeline;
use crate::error::CropError;
use crate::models::CoinLocation;
use crate::pipeline::Pipeline;

/// Shared flag that stops a batch from starting new files.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub enum FileStatus {
    Written {
        output: PathBuf,
        location: Option<CoinLocation>,
    },
    Failed(CropError),
    /// Not started because the batch was cancelled
    Skipped,
}

/// What happened to one input file
#[derive(Debug)]
pub struct FileOutcome {
    /// Position in the sorted input list
    pub index: usize,
    pub file_name: String,
    pub status: FileStatus,
}

/// Result of a whole batch, with outcomes in input order
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub outcomes: Vec<FileOutcome>,
}

impl BatchSummary {
    fn from_outcomes(outcomes: Vec<FileOutcome>) -> Self {
        let mut summary = Self {
            total: outcomes.len(),
            ..Default::default()
        };
        for outcome in &outcomes {
            match outcome.status {
                FileStatus::Written { .. } => summary.succeeded += 1,
                FileStatus::Failed(_) => summary.failed += 1,
                FileStatus::Skipped => summary.skipped += 1,
            }
        }
        summary.outcomes = outcomes;
        summary
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &CropError)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            FileStatus::Failed(e) => Some((o.file_name.as_str(), e)),
            _ => None,
        })
    }
}

/// Crops every photograph of an input directory into an output directory.
pub struct BatchRunner {
    input_dir: PathBuf,
    output_dir: PathBuf,
    config: CropConfig,
    pipeline: Pipeline,
    cancel: CancelHandle,
}

impl BatchRunner {
    pub fn new(input_dir: PathBuf, output_dir: PathBuf, config: CropConfig) -> Result<Self> {
        config.validate().context("Invalid crop configuration")?;
        let pipeline = build_standard_pipeline(&config, false);
        Ok(Self {
            input_dir,
            output_dir,
            config,
            pipeline,
            cancel: CancelHandle::default(),
        })
    }

    /// Replace the standard pipeline (e.g. one with debug output enabled)
    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Save per-stage debug images under `dir` (which must be empty or absent).
    /// The input directory is checked before anything is created.
    pub fn with_debug_output(mut self, dir: PathBuf) -> Result<Self> {
        self.check_input_dir()?;
        self.pipeline = std::mem::take(&mut self.pipeline).with_debug(dir)?;
        Ok(self)
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Regular, non-hidden files of `dir`, sorted by file name
    pub fn list_inputs(dir: &Path) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("Cannot read input directory {}", dir.display()))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry =
                entry.with_context(|| format!("Cannot list input directory {}", dir.display()))?;
            let path = entry.path();
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if path.is_file() && !hidden {
                files.push(path);
            }
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// Process every input file. Only directory-level problems are errors;
    /// per-file failures are collected in the summary.
    pub fn run(&self) -> Result<BatchSummary> {
        self.prepare_output_dir()?;
        let inputs = Self::list_inputs(&self.input_dir)?;
        let total = inputs.len();

        tracing::info!(
            "Cropping {} files from {} into {} ({} job(s))",
            total,
            self.input_dir.display(),
            self.output_dir.display(),
            self.config.jobs
        );

        let outcomes: Vec<FileOutcome> = if self.config.jobs > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.jobs)
                .build()
                .context("Failed to start worker pool")?;
            pool.install(|| {
                inputs
                    .par_iter()
                    .enumerate()
                    .map(|(index, path)| self.process_indexed(index, total, path))
                    .collect()
            })
        } else {
            inputs
                .iter()
                .enumerate()
                .map(|(index, path)| self.process_indexed(index, total, path))
                .collect()
        };

        let summary = BatchSummary::from_outcomes(outcomes);
        tracing::info!(
            "Finished: {} total, {} succeeded, {} failed, {} skipped",
            summary.total,
            summary.succeeded,
            summary.failed,
            summary.skipped
        );
        Ok(summary)
    }

    fn check_input_dir(&self) -> Result<()> {
        if !self.input_dir.is_dir() {
            bail!("Input directory does not exist: {}", self.input_dir.display());
        }
        Ok(())
    }

    fn prepare_output_dir(&self) -> Result<()> {
        self.check_input_dir()?;

        std::fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Cannot create output directory {}", self.output_dir.display())
        })?;

        let input = self.input_dir.canonicalize()?;
        let output = self.output_dir.canonicalize()?;
        if input == output {
            bail!(
                "Output directory must differ from input directory: {}",
                input.display()
            );
        }
        Ok(())
    }

    fn process_indexed(&self, index: usize, total: usize, path: &Path) -> FileOutcome {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if self.cancel.is_cancelled() {
            return FileOutcome {
                index,
                file_name,
                status: FileStatus::Skipped,
            };
        }

        tracing::info!("Processing image {} of {}: {}", index + 1, total, file_name);

        let status = match self.process_file(path, &file_name) {
            Ok((output, location)) => {
                tracing::debug!(file = %file_name, "Done");
                FileStatus::Written { output, location }
            }
            Err(e) => {
                tracing::warn!(file = %file_name, kind = e.kind(), "Skipping file: {}", e);
                FileStatus::Failed(e)
            }
        };

        FileOutcome {
            index,
            file_name,
            status,
        }
    }

    /// Read, crop and write one file
    pub fn process_file(
        &self,
        path: &Path,
        file_name: &str,
    ) -> Result<(PathBuf, Option<CoinLocation>), CropError> {
        let reader = ImageReader::open(path)
            .and_then(|r| r.with_guessed_format())
            .map_err(|source| CropError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let input_format = reader.format();
        let img = reader.decode().map_err(|source| CropError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

        let item = self.pipeline.run(file_name, img)?;
        let location = item.location();
        let gray = item.into_gray();

        // The output keeps the input's name; without a known extension it is
        // encoded in the format the input was decoded from
        let output = self.output_dir.join(file_name);
        let format = ImageFormat::from_path(&output).ok().or(input_format);
        self.write_with_retry(&gray, &output, format)?;
        Ok((output, location))
    }

    fn write_with_retry(
        &self,
        gray: &GrayImage,
        output: &Path,
        format: Option<ImageFormat>,
    ) -> Result<(), CropError> {
        let mut attempt = 0;
        loop {
            let saved = match format {
                Some(format) => gray.save_with_format(output, format),
                None => gray.save(output),
            };
            match saved {
                Ok(()) => return Ok(()),
                Err(ImageError::IoError(e)) if attempt < self.config.write_retries => {
                    attempt += 1;
                    tracing::debug!(
                        "Retrying write of {} ({}/{}): {}",
                        output.display(),
                        attempt,
                        self.config.write_retries,
                        e
                    );
                }
                Err(source) => {
                    return Err(CropError::Write {
                        path: output.to_path_buf(),
                        source,
                    });
                }
            }
        }
    }
}
