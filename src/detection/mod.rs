pub mod preprocessing;
pub mod contours;
pub mod circles;
pub mod masking;
pub mod steps;

use std::sync::Arc;

use image::{DynamicImage, GrayImage};

use crate::config::CropConfig;
use crate::error::CropError;
use crate::models::{CoinLocation, Contour};
use crate::pipeline::Pipeline;
use steps::*;

/// Number of leading steps in the standard pipeline that locate the coin
/// (blur, threshold, close, contour selection, circle fit)
pub const LOCATE_STEPS: usize = 5;

/// Build the standard coin cropping pipeline from a configuration
pub fn build_standard_pipeline(config: &CropConfig, verbose: bool) -> Pipeline {
    Pipeline::new()
        .with_verbose(verbose)
        .add_step(Arc::new(DenoiseStep {
            sigma: config.blur_sigma(),
        }))
        .add_step(Arc::new(BinarizeStep { luma: config.luma }))
        .add_step(Arc::new(CloseMaskStep {
            kernel: config.close_kernel,
        }))
        .add_step(Arc::new(ContourSelectionStep))
        .add_step(Arc::new(LocalizeStep))
        .add_step(Arc::new(BackgroundRemovalStep {
            edge_policy: config.edge_policy,
        }))
        .add_step(Arc::new(GrayscaleStep { luma: config.luma }))
        .add_step(Arc::new(ResizeStep {
            target_size: config.target_size,
            filter: config.interpolation.filter_type(),
        }))
}

/// Finds and normalizes the coin in a single photograph
pub struct CoinLocator {
    pipeline: Pipeline,
    config: CropConfig,
}

impl CoinLocator {
    pub fn new(config: CropConfig) -> Self {
        Self {
            pipeline: build_standard_pipeline(&config, false),
            config,
        }
    }

    pub fn with_pipeline(config: CropConfig, pipeline: Pipeline) -> Self {
        Self { pipeline, config }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Run the full pipeline and return the normalized grayscale crop
    pub fn crop(&self, name: &str, img: DynamicImage) -> Result<GrayImage, CropError> {
        Ok(self.pipeline.run(name, img)?.into_gray())
    }

    /// Run only the locating steps and report where the coin is
    pub fn locate(&self, name: &str, img: DynamicImage) -> Result<CoinLocation, CropError> {
        let item = self.pipeline.run_partial(name, img, LOCATE_STEPS)?;
        item.location().ok_or(CropError::MissingStageInput {
            step: "Circle Fit",
            expected: "a located coin",
        })
    }

    /// Get the external contours of the cleaned mask (for debugging)
    pub fn get_contours(&self, img: &DynamicImage) -> Vec<Contour> {
        let rgb = preprocessing::to_rgb(img);
        let blurred = preprocessing::apply_blur(&rgb, self.config.blur_sigma());
        let gray = preprocessing::to_grayscale(&blurred, self.config.luma);
        let (_, mask) = preprocessing::binarize_otsu(&gray);
        let closed = preprocessing::close_mask(&mask, self.config.close_kernel);
        contours::find_external_contours(&closed)
    }
}

impl Default for CoinLocator {
    fn default() -> Self {
        Self::new(CropConfig::default())
    }
}
