pub mod batch;
pub mod config;
pub mod dataset;
pub mod detection;
pub mod error;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod report;

pub use batch::{BatchRunner, BatchSummary, CancelHandle, FileOutcome, FileStatus};
pub use config::{CropConfig, EdgePolicy, Interpolation, LumaWeights, SplitConfig};
pub use dataset::{LabeledDataset, Prediction};
pub use detection::{CoinLocator, build_standard_pipeline};
pub use error::{CropError, DatasetError};
pub use models::{BoundingBox, CoinLocation, Contour, EnclosingCircle};
pub use pipeline::{CropContext, DebugConfig, Pipeline, PipelineContext, PipelineStep};
