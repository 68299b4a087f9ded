use coinprep::Pipeline;
use coinprep::config::{EdgePolicy, LumaWeights, sigma_for_kernel};
use coinprep::detection::steps::*;
use image::ImageReader;
use image::imageops::FilterType;
use std::env;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <image_path> <output_path>", args[0]);
        std::process::exit(1);
    }

    let img = ImageReader::open(&args[1])?
        .with_guessed_format()?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?;

    println!("Loaded image: {}x{}", img.width(), img.height());

    // Heavier blur and a larger closing element than the defaults,
    // rejecting coins that touch the frame
    let pipeline = Pipeline::new()
        .add_step_boxed(Box::new(DenoiseStep { sigma: sigma_for_kernel(9) }))
        .add_step_boxed(Box::new(BinarizeStep { luma: LumaWeights::Bt601 }))
        .add_step_boxed(Box::new(CloseMaskStep { kernel: 9 }))
        .add_step_boxed(Box::new(ContourSelectionStep))
        .add_step_boxed(Box::new(LocalizeStep))
        .add_step_boxed(Box::new(BackgroundRemovalStep { edge_policy: EdgePolicy::Reject }))
        .add_step_boxed(Box::new(GrayscaleStep { luma: LumaWeights::Bt601 }))
        .add_step_boxed(Box::new(ResizeStep { target_size: 128, filter: FilterType::CatmullRom }));

    println!("Steps: {}", pipeline.step_names().join(" -> "));

    let item = pipeline.run(&args[1], img)?;
    if let Some(location) = item.location() {
        println!(
            "Coin at ({}, {}) radius {}",
            location.circle.center_x, location.circle.center_y, location.circle.radius
        );
    }

    item.into_gray().save(&args[2])?;
    println!("Saved {}", args[2]);
    Ok(())
}
