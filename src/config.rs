use std::path::Path;

use anyhow::{Context, Result, bail};
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

/// Resampling filter used for the final resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Interpolation {
    Nearest,
    /// Bilinear
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl Interpolation {
    pub fn filter_type(self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Triangle => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Gaussian => FilterType::Gaussian,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Channel weighting for colour to luminance conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LumaWeights {
    /// 0.299 R + 0.587 G + 0.114 B
    Bt601,
    /// 0.2126 R + 0.7152 G + 0.0722 B
    Bt709,
}

/// What to do when the coin's bounding box leaves the photograph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EdgePolicy {
    /// Crop the part of the box that lies inside the image
    Clip,
    /// Report the file as a failure
    Reject,
}

/// Parameters of the coin cropping pipeline and its batch runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CropConfig {
    /// Side length of the square output image
    pub target_size: u32,
    /// Gaussian kernel size (odd)
    pub blur_kernel: u32,
    /// Closing structuring element size (odd)
    pub close_kernel: u32,
    pub interpolation: Interpolation,
    pub luma: LumaWeights,
    pub edge_policy: EdgePolicy,
    /// Worker threads for the batch; 1 processes files in order on the caller's thread
    pub jobs: usize,
    /// Extra attempts when writing an output file fails with an I/O error
    pub write_retries: u32,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            target_size: 256,
            blur_kernel: 5,
            close_kernel: 5,
            interpolation: Interpolation::Triangle,
            luma: LumaWeights::Bt601,
            edge_policy: EdgePolicy::Clip,
            jobs: 1,
            write_retries: 1,
        }
    }
}

impl CropConfig {
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("TOML parsing error")?;
        config.validate()?;
        Ok(config)
    }

    /// Sigma the Gaussian denoise uses for `blur_kernel`
    pub fn blur_sigma(&self) -> f32 {
        sigma_for_kernel(self.blur_kernel)
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_size == 0 {
            bail!("target_size must be at least 1");
        }
        validate_kernel("blur_kernel", self.blur_kernel)?;
        validate_kernel("close_kernel", self.close_kernel)?;
        if self.jobs == 0 {
            bail!("jobs must be at least 1");
        }
        Ok(())
    }
}

/// Sigma implied by a Gaussian kernel size when none is given explicitly.
pub fn sigma_for_kernel(kernel: u32) -> f32 {
    0.3 * ((kernel as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

fn validate_kernel(field: &str, value: u32) -> Result<()> {
    if value == 0 || value % 2 == 0 {
        bail!("{} must be a positive odd number, got {}", field, value);
    }
    Ok(())
}

/// Options for turning a labeled dataset into train/validation/test subsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of samples held out for validation and test together
    pub validation_split: f64,
    pub batch_size: usize,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            validation_split: 0.3,
            batch_size: 64,
            seed: 2000,
        }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.validation_split) {
            bail!(
                "validation_split must be in [0, 1), got {}",
                self.validation_split
            );
        }
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        Ok(())
    }
}
