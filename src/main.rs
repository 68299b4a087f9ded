use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use image::ImageReader;

use coinprep::config::{CropConfig, EdgePolicy, Interpolation, LumaWeights, SplitConfig};
use coinprep::dataset::{self, LabeledDataset};
use coinprep::report::{self, BatchReport};
use coinprep::{BatchRunner, CoinLocator, build_standard_pipeline, logging};

#[derive(Parser)]
#[command(name = "coinprep")]
#[command(about = "Crop coin photographs and prepare them for classification")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Crop every photograph of a directory to a normalized grayscale coin
    Crop {
        /// Directory of raw photographs
        #[arg(value_name = "INPUT_DIR")]
        input_dir: PathBuf,

        /// Directory that receives the crops (created if missing)
        #[arg(value_name = "OUTPUT_DIR")]
        output_dir: PathBuf,

        #[command(flatten)]
        crop: CropArgs,

        /// Save per-stage debug images to directory (must be empty)
        #[arg(long, value_name = "DIR")]
        debug_out: Option<PathBuf>,

        /// Write a JSON run report
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// Locate the coin in a single photograph
    Locate {
        #[arg(value_name = "IMAGE")]
        image_path: PathBuf,

        #[command(flatten)]
        crop: CropArgs,
    },

    /// Check and split a class-labeled directory of crops
    Dataset {
        /// Directory whose subdirectories are class labels
        #[arg(value_name = "ROOT")]
        root: PathBuf,

        /// Expected image side length
        #[arg(long, default_value_t = 256)]
        size: u32,

        #[arg(long, default_value_t = 0.3)]
        validation_split: f64,

        #[arg(long, default_value_t = 64)]
        batch_size: usize,

        #[arg(long, default_value_t = 2000)]
        seed: u64,

        /// Do not decode every sample
        #[arg(long)]
        skip_validation: bool,
    },

    /// Prepare one crop as classifier input and describe the tensor
    PredictInput {
        #[arg(value_name = "IMAGE")]
        image_path: PathBuf,

        #[arg(long, default_value_t = 256)]
        size: u32,
    },
}

/// Cropping parameters; flags override values from `--config`
#[derive(Args)]
struct CropArgs {
    /// TOML file with cropping parameters
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Worker threads
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Output side length in pixels
    #[arg(long)]
    size: Option<u32>,

    /// Gaussian kernel size (odd)
    #[arg(long)]
    blur_kernel: Option<u32>,

    /// Closing kernel size (odd)
    #[arg(long)]
    close_kernel: Option<u32>,

    #[arg(long, value_enum)]
    interpolation: Option<Interpolation>,

    #[arg(long, value_enum)]
    luma: Option<LumaWeights>,

    #[arg(long, value_enum)]
    edge_policy: Option<EdgePolicy>,

    /// Extra attempts for failed output writes
    #[arg(long)]
    write_retries: Option<u32>,
}

impl CropArgs {
    fn resolve(&self) -> anyhow::Result<CropConfig> {
        let mut config = match &self.config {
            Some(path) => CropConfig::from_toml_file(path)?,
            None => CropConfig::default(),
        };

        if let Some(v) = self.jobs {
            config.jobs = v;
        }
        if let Some(v) = self.size {
            config.target_size = v;
        }
        if let Some(v) = self.blur_kernel {
            config.blur_kernel = v;
        }
        if let Some(v) = self.close_kernel {
            config.close_kernel = v;
        }
        if let Some(v) = self.interpolation {
            config.interpolation = v;
        }
        if let Some(v) = self.luma {
            config.luma = v;
        }
        if let Some(v) = self.edge_policy {
            config.edge_policy = v;
        }
        if let Some(v) = self.write_retries {
            config.write_retries = v;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    logging::init_logger(args.verbose);

    match args.command {
        Command::Crop {
            input_dir,
            output_dir,
            crop,
            debug_out,
            report,
        } => run_crop(input_dir, output_dir, &crop, debug_out, report, args.verbose),
        Command::Locate { image_path, crop } => run_locate(image_path, &crop, args.verbose),
        Command::Dataset {
            root,
            size,
            validation_split,
            batch_size,
            seed,
            skip_validation,
        } => run_dataset(
            root,
            size,
            SplitConfig {
                validation_split,
                batch_size,
                seed,
            },
            skip_validation,
        ),
        Command::PredictInput { image_path, size } => {
            let tensor = dataset::load_input_tensor(&image_path, size)?;
            let (min, max) = tensor
                .data
                .iter()
                .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
            println!("Input shape: {:?}", tensor.shape);
            println!("Value range: [{:.4}, {:.4}]", min, max);
            Ok(())
        }
    }
}

fn run_crop(
    input_dir: PathBuf,
    output_dir: PathBuf,
    crop: &CropArgs,
    debug_out: Option<PathBuf>,
    report_path: Option<PathBuf>,
    verbose: bool,
) -> anyhow::Result<()> {
    let config = crop.resolve()?;

    let mut runner = BatchRunner::new(input_dir.clone(), output_dir.clone(), config.clone())?
        .with_pipeline(build_standard_pipeline(&config, verbose));
    if let Some(debug_dir) = debug_out {
        runner = runner.with_debug_output(debug_dir)?;
    }

    let started_at = report::now();
    let summary = runner.run()?;
    let finished_at = report::now();

    println!("\n=== Coin Cropping Results ===");
    println!("Total files: {}", summary.total);
    println!("Succeeded:   {}", summary.succeeded);
    println!("Failed:      {}", summary.failed);
    if summary.skipped > 0 {
        println!("Skipped:     {}", summary.skipped);
    }

    if summary.failed > 0 {
        println!("\nFailures:");
        for (file, error) in summary.failures() {
            println!("  {} [{}]: {}", file, error.kind(), error);
        }
    }

    if let Some(path) = report_path {
        BatchReport::new(
            &summary,
            &config,
            &input_dir,
            &output_dir,
            started_at,
            finished_at,
        )?
        .write_json(&path)?;
        println!("\nReport written to {}", path.display());
    }

    Ok(())
}

fn run_locate(image_path: PathBuf, crop: &CropArgs, verbose: bool) -> anyhow::Result<()> {
    let config = crop.resolve()?;

    tracing::debug!("Loading image: {}", image_path.display());
    let img = ImageReader::open(&image_path)?
        .with_guessed_format()?
        .decode()
        .with_context(|| format!("Failed to decode image {}", image_path.display()))?;
    tracing::debug!("Image loaded: {}x{}", img.width(), img.height());

    let name = image_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let locator =
        CoinLocator::with_pipeline(config.clone(), build_standard_pipeline(&config, verbose));
    let location = locator.locate(&name, img)?;

    println!("\n=== Coin Location ===");
    println!("Otsu level:     {}", location.otsu_level);
    println!(
        "Contour:        area={:.1}, points={}",
        location.contour_area, location.contour_points
    );
    println!(
        "Circle:         center=({}, {}), radius={}",
        location.circle.center_x, location.circle.center_y, location.circle.radius
    );
    println!("Fill ratio:     {:.3}", location.fill_ratio);

    let bbox = location.circle.bounding_box();
    println!(
        "Bounding box:   ({}, {}) {}x{}",
        bbox.x, bbox.y, bbox.width, bbox.height
    );

    Ok(())
}

fn run_dataset(
    root: PathBuf,
    size: u32,
    split_config: SplitConfig,
    skip_validation: bool,
) -> anyhow::Result<()> {
    split_config.validate()?;
    let dataset = LabeledDataset::scan(&root)?;

    println!("\n=== Dataset {} ===", root.display());
    println!("Class names: {:?}", dataset.class_names);
    for (name, count) in dataset.class_counts() {
        println!("  {:<20} {}", name, count);
    }

    if !skip_validation {
        let violations = dataset.validate(size);
        if violations.is_empty() {
            println!("\nAll {} samples are {}x{} grayscale", dataset.len(), size, size);
        } else {
            println!(
                "\n{} samples break the {}x{} grayscale contract:",
                violations.len(),
                size,
                size
            );
            for v in &violations {
                println!("  {}: {}", v.path.display(), v.problem);
            }
        }
    }

    let split = dataset.split(&split_config);
    println!(
        "\nSplit (seed {}): train={}, validation={}, test={}",
        split_config.seed,
        split.train.len(),
        split.validation.len(),
        split.test.len()
    );

    Ok(())
}
