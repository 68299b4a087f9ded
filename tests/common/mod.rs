mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from coinprep for tests
pub use coinprep::{
    BatchRunner, CoinLocator, CropConfig, CropError, EdgePolicy, FileStatus,
    LabeledDataset, Prediction, SplitConfig,
};
