use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;

use crate::models::{CropRegion, EnclosingCircle};

/// White filled disc on a black canvas of the given size
pub fn circle_mask(width: u32, height: u32, circle: &EnclosingCircle) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    draw_filled_circle_mut(
        &mut mask,
        (circle.center_x, circle.center_y),
        circle.radius,
        Luma([255u8]),
    );
    mask
}

/// Keep source pixels where the mask is set, black elsewhere
pub fn apply_mask(img: &RgbImage, mask: &GrayImage) -> RgbImage {
    RgbImage::from_fn(img.width(), img.height(), |x, y| {
        let m = mask.get_pixel(x, y)[0];
        let Rgb([r, g, b]) = *img.get_pixel(x, y);
        Rgb([r & m, g & m, b & m])
    })
}

pub fn crop(img: &RgbImage, region: CropRegion) -> RgbImage {
    image::imageops::crop_imm(img, region.x, region.y, region.width, region.height).to_image()
}
