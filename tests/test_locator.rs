//! Tests for locating and cropping a coin in a single photograph.
//!
//! Tests cover:
//! - Locating a synthetic disc of known center and radius
//! - Uniform images without a coin
//! - Output shape of the full pipeline
//! - Edge policy for coins touching the frame

mod common;

use coinprep::config::LumaWeights;
use coinprep::detection::LOCATE_STEPS;
use image::{DynamicImage, Rgb};

use common::*;

#[test]
fn test_locates_white_disc_on_black() -> anyhow::Result<()> {
    let mut img = image::RgbImage::new(320, 240);
    imageproc::drawing::draw_filled_circle_mut(&mut img, (150, 130), 60, Rgb([255, 255, 255]));

    let locator = CoinLocator::default();
    let location = locator.locate("disc.png", DynamicImage::ImageRgb8(img))?;

    assert!((location.circle.center_x - 150).abs() <= 2, "center x = {}", location.circle.center_x);
    assert!((location.circle.center_y - 130).abs() <= 2, "center y = {}", location.circle.center_y);
    assert!((location.circle.radius - 60).abs() <= 2, "radius = {}", location.circle.radius);
    assert!(location.fill_ratio > 0.9, "fill ratio = {}", location.fill_ratio);

    Ok(())
}

#[test]
fn test_locates_coloured_coin_with_either_luma_weighting() -> anyhow::Result<()> {
    let img = coin_image(400, 300, (220, 140), 90, BRASS);

    for luma in [LumaWeights::Bt601, LumaWeights::Bt709] {
        let config = CropConfig {
            luma,
            ..Default::default()
        };
        let location =
            CoinLocator::new(config).locate("coin.png", DynamicImage::ImageRgb8(img.clone()))?;

        assert!((location.circle.center_x - 220).abs() <= 2);
        assert!((location.circle.center_y - 140).abs() <= 2);
        assert!((location.circle.radius - 90).abs() <= 2);
    }

    Ok(())
}

#[test]
fn test_uniform_image_reports_no_coin() {
    let locator = CoinLocator::default();

    for colour in [Rgb([0, 0, 0]), Rgb([128, 128, 128]), Rgb([255, 255, 255])] {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(120, 80, colour));
        let result = locator.crop("flat.png", img);
        assert!(
            matches!(result, Err(CropError::NoCoinDetected { .. })),
            "colour {:?} gave {:?}",
            colour,
            result.map(|g| g.dimensions())
        );
    }
}

#[test]
fn test_crop_is_square_grayscale_of_target_size() -> anyhow::Result<()> {
    let img = coin_image(640, 480, (300, 250), 150, BRASS);

    let gray = CoinLocator::default().crop("coin.jpg", DynamicImage::ImageRgb8(img.clone()))?;
    assert_eq!(gray.dimensions(), (256, 256));

    let small = CoinLocator::new(CropConfig {
        target_size: 64,
        ..Default::default()
    })
    .crop("coin.jpg", DynamicImage::ImageRgb8(img))?;
    assert_eq!(small.dimensions(), (64, 64));

    Ok(())
}

#[test]
fn test_background_is_black_and_coin_is_kept() -> anyhow::Result<()> {
    let img = coin_image(500, 500, (250, 250), 200, BRASS);
    let gray = CoinLocator::default().crop("coin.png", DynamicImage::ImageRgb8(img))?;

    // Corners of the square crop lie outside the circle
    assert_eq!(gray.get_pixel(0, 0)[0], 0);
    assert_eq!(gray.get_pixel(255, 255)[0], 0);

    // Center keeps the coin's luminance (BT.601 of the brass colour)
    let center = gray.get_pixel(128, 128)[0] as i32;
    let expected = (0.299 * 205.0 + 0.587 * 170.0 + 0.114 * 90.0f32).round() as i32;
    assert!((center - expected).abs() <= 2, "center = {}, expected {}", center, expected);

    Ok(())
}

#[test]
fn test_largest_coin_wins() -> anyhow::Result<()> {
    let mut img = coin_image(600, 300, (150, 150), 40, BRASS);
    imageproc::drawing::draw_filled_circle_mut(&mut img, (420, 150), 100, BRASS);

    let location = CoinLocator::default().locate("two.png", DynamicImage::ImageRgb8(img))?;
    assert!((location.circle.center_x - 420).abs() <= 2);
    assert!((location.circle.radius - 100).abs() <= 2);

    Ok(())
}

#[test]
fn test_coin_touching_edge_follows_policy() -> anyhow::Result<()> {
    let img = coin_image(300, 300, (40, 150), 70, BRASS);

    let clipped = CoinLocator::default().crop("edge.png", DynamicImage::ImageRgb8(img.clone()))?;
    assert_eq!(clipped.dimensions(), (256, 256));

    let rejecting = CoinLocator::new(CropConfig {
        edge_policy: EdgePolicy::Reject,
        ..Default::default()
    });
    let result = rejecting.crop("edge.png", DynamicImage::ImageRgb8(img));
    assert!(matches!(result, Err(CropError::CoinTouchesEdge { .. })));

    Ok(())
}

#[test]
fn test_partial_run_stops_after_locating() -> anyhow::Result<()> {
    let img = coin_image(200, 200, (100, 100), 50, BRASS);
    let locator = CoinLocator::default();

    let item = locator
        .pipeline()
        .run_partial("coin.png", DynamicImage::ImageRgb8(img), LOCATE_STEPS)?;

    assert!(item.circle.is_some());
    assert!(item.bbox.is_some());
    // The raster is still the cleaned mask, not a crop
    assert_eq!(item.raster.width(), 200);

    Ok(())
}

#[test]
fn test_get_contours_ignores_holes() {
    // A ring: one outer border and one hole border
    let mut img = coin_image(200, 200, (100, 100), 80, BRASS);
    imageproc::drawing::draw_filled_circle_mut(&mut img, (100, 100), 40, TABLE);

    let contours = CoinLocator::default().get_contours(&DynamicImage::ImageRgb8(img));
    assert_eq!(contours.len(), 1);
}
