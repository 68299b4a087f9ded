//! The classifier's side of the handoff: a directory tree whose immediate
//! subdirectories name the classes and hold the cropped coin images.

use std::path::{Path, PathBuf};

use image::{ColorType, DynamicImage, GrayImage, ImageReader};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::config::{LumaWeights, SplitConfig};
use crate::detection::preprocessing;
use crate::error::DatasetError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sample {
    pub path: PathBuf,
    /// Index into the dataset's class names
    pub label: usize,
}

/// A sample that breaks the cropper's output contract
#[derive(Debug, Clone, Serialize)]
pub struct ContractViolation {
    pub path: PathBuf,
    pub problem: String,
}

#[derive(Debug, Clone)]
pub struct LabeledDataset {
    pub root: PathBuf,
    pub class_names: Vec<String>,
    pub samples: Vec<Sample>,
}

impl LabeledDataset {
    /// Index `root`: class names are the sorted subdirectory names, samples the
    /// sorted regular files inside each. Hidden entries are ignored.
    pub fn scan(root: &Path) -> Result<Self, DatasetError> {
        let mut class_names: Vec<String> = sorted_entries(root)?
            .into_iter()
            .filter(|p| p.is_dir())
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        class_names.sort();

        if class_names.is_empty() {
            return Err(DatasetError::NoClasses(root.to_path_buf()));
        }

        let mut samples = Vec::new();
        for (label, class) in class_names.iter().enumerate() {
            for path in sorted_entries(&root.join(class))? {
                if path.is_file() {
                    samples.push(Sample { path, label });
                }
            }
        }

        tracing::debug!(
            "Scanned {}: {} classes, {} samples",
            root.display(),
            class_names.len(),
            samples.len()
        );

        Ok(Self {
            root: root.to_path_buf(),
            class_names,
            samples,
        })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of samples per class, in class order
    pub fn class_counts(&self) -> Vec<(&str, usize)> {
        self.class_names
            .iter()
            .enumerate()
            .map(|(label, name)| {
                let count = self.samples.iter().filter(|s| s.label == label).count();
                (name.as_str(), count)
            })
            .collect()
    }

    /// Every sample must decode as an 8-bit single-channel square of `image_size`
    pub fn validate(&self, image_size: u32) -> Vec<ContractViolation> {
        self.samples
            .iter()
            .filter_map(|sample| {
                check_sample(&sample.path, image_size)
                    .err()
                    .map(|problem| ContractViolation {
                        path: sample.path.clone(),
                        problem,
                    })
            })
            .collect()
    }

    /// Seeded shuffle, then hold out the last `validation_split` share of the
    /// samples. The first half of the held-out batches becomes the test set.
    pub fn split(&self, config: &SplitConfig) -> DatasetSplit {
        let mut shuffled = self.samples.clone();
        let mut rng = StdRng::seed_from_u64(config.seed);
        shuffled.shuffle(&mut rng);

        let n = shuffled.len();
        let held_out = ((n as f64) * config.validation_split).floor() as usize;
        let held = shuffled.split_off(n - held_out);

        let batch_size = config.batch_size.max(1);
        let held_batches = held.len().div_ceil(batch_size);
        let test_count = ((held_batches / 2) * batch_size).min(held.len());

        let mut validation = held;
        let test: Vec<Sample> = validation.drain(..test_count).collect();

        DatasetSplit {
            train: shuffled,
            validation,
            test,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatasetSplit {
    pub train: Vec<Sample>,
    pub validation: Vec<Sample>,
    pub test: Vec<Sample>,
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, DatasetError> {
    let io_err = |source: std::io::Error| DatasetError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        if !entry.file_name().to_string_lossy().starts_with('.') {
            paths.push(entry.path());
        }
    }
    paths.sort();
    Ok(paths)
}

fn open_image(path: &Path) -> Result<DynamicImage, DatasetError> {
    ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .decode()
        .map_err(|source| DatasetError::Image {
            path: path.to_path_buf(),
            source,
        })
}

fn check_sample(path: &Path, image_size: u32) -> Result<(), String> {
    let img = open_image(path).map_err(|e| e.to_string())?;
    if img.color() != ColorType::L8 {
        return Err(format!("colour type is {:?}, expected L8", img.color()));
    }
    if img.width() != image_size || img.height() != image_size {
        return Err(format!(
            "size is {}x{}, expected {}x{}",
            img.width(),
            img.height(),
            image_size,
            image_size
        ));
    }
    Ok(())
}

/// Batch of one single-channel image, laid out as `[batch, height, width, channels]`
#[derive(Debug, Clone)]
pub struct InputTensor {
    pub shape: [usize; 4],
    pub data: Vec<f32>,
}

/// Load one image as classifier input with intensities scaled to `[0, 1]`
pub fn load_input_tensor(path: &Path, image_size: u32) -> Result<InputTensor, DatasetError> {
    let img = open_image(path)?;
    let gray: GrayImage = match img {
        DynamicImage::ImageLuma8(gray) => gray,
        other => preprocessing::to_grayscale(&other.to_rgb8(), LumaWeights::Bt601),
    };

    if gray.width() != image_size || gray.height() != image_size {
        return Err(DatasetError::WrongSize {
            path: path.to_path_buf(),
            width: gray.width(),
            height: gray.height(),
            expected: image_size,
        });
    }

    let data = gray.pixels().map(|p| p[0] as f32 / 255.0).collect();
    Ok(InputTensor {
        shape: [1, image_size as usize, image_size as usize, 1],
        data,
    })
}

/// Most probable class for one image
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub label: String,
    pub index: usize,
    pub confidence: f32,
    pub probabilities: Vec<f32>,
}

impl Prediction {
    /// Argmax over a per-class probability vector; the first index wins ties
    pub fn from_probabilities(
        class_names: &[String],
        probabilities: &[f32],
    ) -> Result<Self, DatasetError> {
        if probabilities.is_empty() {
            return Err(DatasetError::EmptyPrediction);
        }
        if probabilities.len() != class_names.len() {
            return Err(DatasetError::ClassCountMismatch {
                expected: class_names.len(),
                got: probabilities.len(),
            });
        }

        let (index, confidence) = probabilities.iter().copied().enumerate().fold(
            (0, probabilities[0]),
            |(best_i, best_p), (i, p)| if p > best_p { (i, p) } else { (best_i, best_p) },
        );

        Ok(Self {
            label: class_names[index].clone(),
            index,
            confidence,
            probabilities: probabilities.to_vec(),
        })
    }
}
