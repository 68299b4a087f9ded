use crate::config::{EdgePolicy, LumaWeights};
use crate::detection::{circles, contours, masking, preprocessing};
use crate::error::CropError;
use crate::models::EnclosingCircle;
use crate::pipeline::{CropContext, PipelineContext, PipelineStep};
use image::DynamicImage;
use image::imageops::FilterType;

/// Gaussian smoothing of the colour photograph
pub struct DenoiseStep {
    pub sigma: f32,
}

impl PipelineStep for DenoiseStep {
    fn process(
        &self,
        item: CropContext,
        _context: &PipelineContext,
    ) -> Result<CropContext, CropError> {
        let blurred = preprocessing::apply_blur(&preprocessing::to_rgb(&item.raster), self.sigma);
        Ok(item.with_raster(DynamicImage::ImageRgb8(blurred)))
    }

    fn name(&self) -> &str {
        "Gaussian Blur"
    }
}

/// Luminance conversion followed by Otsu binarization
pub struct BinarizeStep {
    pub luma: LumaWeights,
}

impl PipelineStep for BinarizeStep {
    fn process(
        &self,
        item: CropContext,
        context: &PipelineContext,
    ) -> Result<CropContext, CropError> {
        let gray = preprocessing::to_grayscale(&preprocessing::to_rgb(&item.raster), self.luma);
        let (level, mask) = preprocessing::binarize_otsu(&gray);

        if context.verbose {
            tracing::debug!(file = %item.name, "Otsu level {}", level);
        }

        let mut item = item.with_raster(DynamicImage::ImageLuma8(mask));
        item.otsu_level = Some(level);
        Ok(item)
    }

    fn name(&self) -> &str {
        "Otsu Threshold"
    }
}

/// Morphological closing to fill small holes in the mask
pub struct CloseMaskStep {
    pub kernel: u32,
}

impl PipelineStep for CloseMaskStep {
    fn process(
        &self,
        item: CropContext,
        _context: &PipelineContext,
    ) -> Result<CropContext, CropError> {
        let closed = preprocessing::close_mask(&item.raster.to_luma8(), self.kernel);
        Ok(item.with_raster(DynamicImage::ImageLuma8(closed)))
    }

    fn name(&self) -> &str {
        "Morphological Close"
    }
}

/// Pick the external contour with the largest area as the coin candidate
pub struct ContourSelectionStep;

impl PipelineStep for ContourSelectionStep {
    fn process(
        &self,
        item: CropContext,
        context: &PipelineContext,
    ) -> Result<CropContext, CropError> {
        let mask = item.raster.to_luma8();

        let total = mask.width() as u64 * mask.height() as u64;
        match preprocessing::foreground_count(&mask) {
            0 => return Err(CropError::no_coin("mask is empty")),
            n if n == total => return Err(CropError::no_coin("mask covers the whole image")),
            _ => {}
        }

        let found = contours::find_external_contours(&mask);
        if context.verbose {
            tracing::debug!(file = %item.name, "Found {} external contours", found.len());
        }

        let largest = contours::largest_contour(&found)
            .cloned()
            .ok_or_else(|| CropError::no_coin("no contours found"))?;

        let mut item = item;
        item.contour_area = Some(largest.area());
        item.contour = Some(largest);
        Ok(item)
    }

    fn name(&self) -> &str {
        "Contour Selection"
    }
}

/// Fit the minimum enclosing circle around the selected contour
pub struct LocalizeStep;

impl PipelineStep for LocalizeStep {
    fn process(
        &self,
        item: CropContext,
        context: &PipelineContext,
    ) -> Result<CropContext, CropError> {
        let contour = item.contour.as_ref().ok_or(CropError::MissingStageInput {
            step: "Circle Fit",
            expected: "a selected contour",
        })?;

        let fit = circles::min_enclosing_circle(&contour.points)
            .ok_or_else(|| CropError::no_coin("selected contour has no points"))?;
        let circle = EnclosingCircle::from_f64(fit.center_x, fit.center_y, fit.radius);
        if circle.radius <= 0 {
            return Err(CropError::no_coin("enclosing circle has zero radius"));
        }

        let fill_ratio = circles::fill_ratio(item.contour_area.unwrap_or(0.0), &fit);
        if context.verbose {
            tracing::debug!(
                file = %item.name,
                "Circle center=({}, {}) radius={} fill={:.3}",
                circle.center_x, circle.center_y, circle.radius, fill_ratio
            );
        }

        let mut item = item;
        item.fill_ratio = Some(fill_ratio);
        item.bbox = Some(circle.bounding_box());
        item.circle = Some(circle);
        Ok(item)
    }

    fn name(&self) -> &str {
        "Circle Fit"
    }
}

/// Black out everything outside the circle and crop to its bounding box
pub struct BackgroundRemovalStep {
    pub edge_policy: EdgePolicy,
}

impl PipelineStep for BackgroundRemovalStep {
    fn process(
        &self,
        item: CropContext,
        _context: &PipelineContext,
    ) -> Result<CropContext, CropError> {
        let (circle, bbox) = match (item.circle, item.bbox) {
            (Some(c), Some(b)) => (c, b),
            _ => {
                return Err(CropError::MissingStageInput {
                    step: "Background Removal",
                    expected: "an enclosing circle",
                });
            }
        };

        let (width, height) = item.source.dimensions();

        if self.edge_policy == EdgePolicy::Reject && !bbox.fits_within(width, height) {
            return Err(CropError::CoinTouchesEdge {
                bbox,
                width,
                height,
            });
        }

        let region = bbox
            .clip_to(width, height)
            .ok_or(CropError::EmptyCrop {
                bbox,
                width,
                height,
            })?;

        let mask = masking::circle_mask(width, height, &circle);
        let masked = masking::apply_mask(&item.source, &mask);
        let cropped = masking::crop(&masked, region);

        Ok(item.with_raster(DynamicImage::ImageRgb8(cropped)))
    }

    fn name(&self) -> &str {
        "Background Removal"
    }
}

/// Convert the cropped coin to a single channel
pub struct GrayscaleStep {
    pub luma: LumaWeights,
}

impl PipelineStep for GrayscaleStep {
    fn process(
        &self,
        item: CropContext,
        _context: &PipelineContext,
    ) -> Result<CropContext, CropError> {
        let gray = preprocessing::to_grayscale(&preprocessing::to_rgb(&item.raster), self.luma);
        Ok(item.with_raster(DynamicImage::ImageLuma8(gray)))
    }

    fn name(&self) -> &str {
        "Grayscale Conversion"
    }
}

/// Resize to a fixed square, ignoring aspect ratio
pub struct ResizeStep {
    pub target_size: u32,
    pub filter: FilterType,
}

impl PipelineStep for ResizeStep {
    fn process(
        &self,
        item: CropContext,
        _context: &PipelineContext,
    ) -> Result<CropContext, CropError> {
        let gray = item.raster.to_luma8();
        let resized =
            image::imageops::resize(&gray, self.target_size, self.target_size, self.filter);
        Ok(item.with_raster(DynamicImage::ImageLuma8(resized)))
    }

    fn name(&self) -> &str {
        "Resize"
    }
}
