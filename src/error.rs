use std::path::PathBuf;

use thiserror::Error;

use crate::models::BoundingBox;

/// Why a single photograph could not be turned into a normalized crop.
///
/// None of these abort a batch; the runner records them and moves on.
#[derive(Error, Debug)]
pub enum CropError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path} as an image: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("no coin detected: {reason}")]
    NoCoinDetected { reason: String },

    #[error("crop region is empty for bounding box {bbox:?} in a {width}x{height} image")]
    EmptyCrop {
        bbox: BoundingBox,
        width: u32,
        height: u32,
    },

    #[error("coin touches the image edge: bounding box {bbox:?} exceeds {width}x{height}")]
    CoinTouchesEdge {
        bbox: BoundingBox,
        width: u32,
        height: u32,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("pipeline step '{step}' expected {expected}")]
    MissingStageInput {
        step: &'static str,
        expected: &'static str,
    },

    #[error("failed to save debug image: {0}")]
    Debug(String),
}

impl CropError {
    pub fn no_coin(reason: impl Into<String>) -> Self {
        Self::NoCoinDetected {
            reason: reason.into(),
        }
    }

    /// Stable identifier used in run reports
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Read { .. } => "read",
            Self::Decode { .. } => "decode",
            Self::NoCoinDetected { .. } => "no_coin_detected",
            Self::EmptyCrop { .. } => "empty_crop",
            Self::CoinTouchesEdge { .. } => "coin_touches_edge",
            Self::Write { .. } => "write",
            Self::MissingStageInput { .. } => "pipeline",
            Self::Debug(_) => "debug_output",
        }
    }
}

/// Problems with a class-labeled dataset tree.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("dataset root {0} contains no class directories")]
    NoClasses(PathBuf),

    #[error("failed to list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("{path} is {width}x{height}, expected {expected}x{expected}")]
    WrongSize {
        path: PathBuf,
        width: u32,
        height: u32,
        expected: u32,
    },

    #[error("got {got} probabilities for {expected} classes")]
    ClassCountMismatch { expected: usize, got: usize },

    #[error("probability vector is empty")]
    EmptyPrediction,
}
