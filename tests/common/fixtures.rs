use std::path::{Path, PathBuf};

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;

/// Background and coin colours of the synthetic photographs
pub const TABLE: Rgb<u8> = Rgb([25, 30, 35]);
pub const BRASS: Rgb<u8> = Rgb([205, 170, 90]);

/// A coin of the given colour on a dark table
pub fn coin_image(
    width: u32,
    height: u32,
    center: (i32, i32),
    radius: i32,
    coin: Rgb<u8>,
) -> RgbImage {
    let mut img = RgbImage::from_pixel(width, height, TABLE);
    draw_filled_circle_mut(&mut img, center, radius, coin);
    img
}

/// Writes a coin photograph and returns its path
pub fn write_coin_image(
    dir: &Path,
    name: &str,
    width: u32,
    height: u32,
    center: (i32, i32),
    radius: i32,
) -> PathBuf {
    let path = dir.join(name);
    coin_image(width, height, center, radius, BRASS)
        .save(&path)
        .expect("Failed to save coin image");
    path
}

/// Writes an image of a single colour (no coin to find)
pub fn write_uniform_image(dir: &Path, name: &str, colour: Rgb<u8>) -> PathBuf {
    let path = dir.join(name);
    RgbImage::from_pixel(200, 150, colour)
        .save(&path)
        .expect("Failed to save uniform image");
    path
}

/// Writes bytes that no decoder accepts, under an image extension
pub fn write_corrupt_file(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"definitely not an image").expect("Failed to write corrupt file");
    path
}

/// Writes a grayscale square as a crop would look
pub fn write_gray_crop(dir: &Path, name: &str, size: u32, value: u8) -> PathBuf {
    let path = dir.join(name);
    GrayImage::from_pixel(size, size, Luma([value]))
        .save(&path)
        .expect("Failed to save gray crop");
    path
}

/// Input and output directories for one batch run
pub struct BatchDirs {
    pub root: tempfile::TempDir,
    pub input: PathBuf,
    pub output: PathBuf,
}

pub fn batch_dirs() -> BatchDirs {
    let root = tempfile::TempDir::new().expect("Failed to create temp directory");
    let input = root.path().join("raw");
    let output = root.path().join("processed");
    std::fs::create_dir_all(&input).expect("Failed to create input directory");
    BatchDirs {
        root,
        input,
        output,
    }
}

/// Sorted file names in a directory
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("Failed to list directory")
        .map(|e| e.expect("bad entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
