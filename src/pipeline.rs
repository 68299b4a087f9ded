use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use image::{DynamicImage, GrayImage, RgbImage};

use crate::error::CropError;
use crate::models::{BoundingBox, CoinLocation, Contour, EnclosingCircle};

/// Working state for one photograph as it moves through the pipeline.
///
/// A context is built from a freshly decoded image and dropped once the file
/// is finished, so nothing computed for one file can leak into the next.
#[derive(Clone)]
pub struct CropContext {
    /// Name used for logging and debug output (usually the file name)
    pub name: String,

    /// The decoded photograph (shared, never modified)
    pub source: Arc<RgbImage>,

    /// Output of the most recent step
    pub raster: DynamicImage,

    pub otsu_level: Option<u8>,
    pub contour: Option<Contour>,
    pub contour_area: Option<f64>,
    pub fill_ratio: Option<f64>,
    pub circle: Option<EnclosingCircle>,
    pub bbox: Option<BoundingBox>,
}

impl CropContext {
    pub fn from_image(name: impl Into<String>, image: DynamicImage) -> Self {
        let source = Arc::new(image.to_rgb8());
        Self {
            name: name.into(),
            raster: DynamicImage::ImageRgb8(source.as_ref().clone()),
            source,
            otsu_level: None,
            contour: None,
            contour_area: None,
            fill_ratio: None,
            circle: None,
            bbox: None,
        }
    }

    /// Replace the current raster, keeping everything else
    pub fn with_raster(mut self, raster: DynamicImage) -> Self {
        self.raster = raster;
        self
    }

    /// Locator findings, once the localize step has run
    pub fn location(&self) -> Option<CoinLocation> {
        Some(CoinLocation {
            otsu_level: self.otsu_level?,
            contour_area: self.contour_area?,
            contour_points: self.contour.as_ref()?.len(),
            fill_ratio: self.fill_ratio.unwrap_or(0.0),
            circle: self.circle?,
        })
    }

    /// The current raster as a single-channel image
    pub fn into_gray(self) -> GrayImage {
        match self.raster {
            DynamicImage::ImageLuma8(gray) => gray,
            other => other.to_luma8(),
        }
    }
}

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
    /// Whether debug mode is enabled
    pub enabled: bool,
}

impl DebugConfig {
    /// Directory that receives one file's stage images, named after the full
    /// file name so `a.jpg` and `a.png` never share one
    fn item_dir(&self, item_name: &str) -> PathBuf {
        let file_name = Path::new(item_name)
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| item_name.to_string());
        self.output_dir.join(file_name)
    }

    fn save(&self, item: &CropContext, file_name: &str) -> Result<(), CropError> {
        let dir = self.item_dir(&item.name);
        std::fs::create_dir_all(&dir).map_err(|e| CropError::Debug(e.to_string()))?;
        item.raster
            .save(dir.join(file_name))
            .map_err(|e| CropError::Debug(e.to_string()))
    }
}

/// Context available to all pipeline steps
#[derive(Clone, Default)]
pub struct PipelineContext {
    pub verbose: bool,
    pub debug: Option<DebugConfig>,
}

impl PipelineContext {
    fn active_debug(&self) -> Option<&DebugConfig> {
        self.debug.as_ref().filter(|d| d.enabled)
    }
}

/// One stage of the coin cropping pipeline
pub trait PipelineStep: Send + Sync {
    /// Consume the file's context and return it advanced by this stage
    fn process(
        &self,
        item: CropContext,
        context: &PipelineContext,
    ) -> Result<CropContext, CropError>;

    /// Human-readable name for this step (used in logs and debug output)
    fn name(&self) -> &str;
}

/// Composable pipeline builder
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
    context: PipelineContext,
}

impl Pipeline {
    /// Create a new empty pipeline
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            context: PipelineContext::default(),
        }
    }

    /// Enable verbose output
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.context.verbose = verbose;
        self
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.context.debug = Some(DebugConfig {
            output_dir,
            enabled: true,
        });

        Ok(self)
    }

    /// Add a processing step to the pipeline
    pub fn add_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Helper method to add a step from a Box (for convenience)
    pub fn add_step_boxed(mut self, step: Box<dyn PipelineStep>) -> Self {
        self.steps.push(Arc::from(step));
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step on one decoded photograph
    pub fn run(&self, name: &str, input: DynamicImage) -> Result<CropContext, CropError> {
        self.run_partial(name, input, self.steps.len())
    }

    /// Run only the first `num_steps` steps (useful for debugging)
    pub fn run_partial(
        &self,
        name: &str,
        input: DynamicImage,
        num_steps: usize,
    ) -> Result<CropContext, CropError> {
        let mut item = CropContext::from_image(name, input);

        if let Some(debug) = self.context.active_debug() {
            debug.save(&item, "00_input.png")?;
        }

        for (step_idx, step) in self.steps.iter().take(num_steps).enumerate() {
            tracing::trace!(file = %item.name, step = step.name(), "running step");

            item = step.process(item, &self.context)?;

            if let Some(debug) = self.context.active_debug() {
                let file_name = format!(
                    "{:02}_{}.png",
                    step_idx + 1,
                    step.name().to_lowercase().replace(' ', "_")
                );
                debug.save(&item, &file_name)?;
                if self.context.verbose {
                    tracing::debug!(file = %item.name, "debug: saved {}", file_name);
                }
            }
        }

        Ok(item)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
