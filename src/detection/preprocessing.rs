use image::{DynamicImage, GrayImage, ImageBuffer, Luma, RgbImage};
use imageproc::contrast::{ThresholdType, otsu_level, threshold};
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::close;

use crate::config::LumaWeights;

/// Decode result in the colour layout the pipeline works on
pub fn to_rgb(img: &DynamicImage) -> RgbImage {
    img.to_rgb8()
}

/// Apply Gaussian blur to suppress sensor noise and surface texture
pub fn apply_blur(img: &RgbImage, sigma: f32) -> RgbImage {
    gaussian_blur_f32(img, sigma)
}

/// Convert a colour image to luminance with the given channel weights
pub fn to_grayscale(img: &RgbImage, weights: LumaWeights) -> GrayImage {
    match weights {
        LumaWeights::Bt709 => DynamicImage::ImageRgb8(img.clone()).to_luma8(),
        LumaWeights::Bt601 => ImageBuffer::from_fn(img.width(), img.height(), |x, y| {
            let [r, g, b] = img.get_pixel(x, y).0;
            let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
            Luma([luma.round().clamp(0.0, 255.0) as u8])
        }),
    }
}

/// Binarize with Otsu's global level; pixels strictly brighter become 255.
/// Returns the chosen level together with the mask.
pub fn binarize_otsu(gray: &GrayImage) -> (u8, GrayImage) {
    let level = otsu_level(gray);
    (level, threshold(gray, level, ThresholdType::Binary))
}

/// Morphological closing with a square all-ones element of side `kernel`
pub fn close_mask(mask: &GrayImage, kernel: u32) -> GrayImage {
    let radius = (kernel / 2).min(u8::MAX as u32) as u8;
    if radius == 0 {
        return mask.clone();
    }
    close(mask, Norm::LInf, radius)
}

/// Number of nonzero pixels in a binary mask
pub fn foreground_count(mask: &GrayImage) -> u64 {
    mask.pixels().filter(|p| p[0] != 0).count() as u64
}
