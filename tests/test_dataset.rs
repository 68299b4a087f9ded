//! Tests for the classifier-facing dataset contract.

mod common;

use coinprep::dataset::load_input_tensor;
use coinprep::error::DatasetError;
use image::{Rgb, RgbImage};

use common::*;

fn class_tree(classes: &[(&str, usize)]) -> tempfile::TempDir {
    let root = tempfile::TempDir::new().expect("Failed to create temp directory");
    for (class, count) in classes {
        let dir = root.path().join(class);
        std::fs::create_dir_all(&dir).expect("Failed to create class directory");
        for i in 0..*count {
            write_gray_crop(&dir, &format!("IMG_{:03}.png", i), 256, (i * 10) as u8);
        }
    }
    root
}

#[test]
fn test_scan_infers_sorted_labels() -> anyhow::Result<()> {
    let root = class_tree(&[("5_rupee", 2), ("1_rupee", 3), ("reverse", 1), ("2_rupee", 2)]);
    std::fs::create_dir(root.path().join(".cache"))?;
    std::fs::write(root.path().join("notes.txt"), "not a class")?;

    let dataset = LabeledDataset::scan(root.path())?;

    assert_eq!(dataset.class_names, vec!["1_rupee", "2_rupee", "5_rupee", "reverse"]);
    assert_eq!(dataset.len(), 8);
    assert_eq!(
        dataset.class_counts(),
        vec![("1_rupee", 3), ("2_rupee", 2), ("5_rupee", 2), ("reverse", 1)]
    );
    assert!(dataset.samples[0].path.ends_with("1_rupee/IMG_000.png"));
    assert_eq!(dataset.samples[7].label, 3);

    Ok(())
}

#[test]
fn test_scan_without_classes_fails() {
    let root = tempfile::TempDir::new().expect("Failed to create temp directory");
    let result = LabeledDataset::scan(root.path());
    assert!(matches!(result, Err(DatasetError::NoClasses(_))));
}

#[test]
fn test_validate_flags_contract_violations() -> anyhow::Result<()> {
    let root = class_tree(&[("1_rupee", 2)]);
    let class_dir = root.path().join("1_rupee");
    RgbImage::from_pixel(256, 256, Rgb([10, 20, 30])).save(class_dir.join("colour.png"))?;
    write_gray_crop(&class_dir, "small.png", 100, 50);
    write_corrupt_file(&class_dir, "broken.png");

    let dataset = LabeledDataset::scan(root.path())?;
    let violations = dataset.validate(256);

    let mut flagged: Vec<String> = violations
        .iter()
        .map(|v| v.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    flagged.sort();
    assert_eq!(flagged, vec!["broken.png", "colour.png", "small.png"]);

    Ok(())
}

#[test]
fn test_split_partitions_samples_deterministically() -> anyhow::Result<()> {
    let root = class_tree(&[("a", 7), ("b", 7), ("c", 6)]);
    let dataset = LabeledDataset::scan(root.path())?;
    let config = SplitConfig {
        validation_split: 0.3,
        batch_size: 2,
        seed: 2000,
    };

    let split = dataset.split(&config);
    // 20 samples: 6 held out in 3 batches of 2, the first batch is the test set
    assert_eq!(split.train.len(), 14);
    assert_eq!(split.test.len(), 2);
    assert_eq!(split.validation.len(), 4);

    let mut all: Vec<_> = split
        .train
        .iter()
        .chain(&split.validation)
        .chain(&split.test)
        .map(|s| s.path.clone())
        .collect();
    all.sort();
    let mut expected: Vec<_> = dataset.samples.iter().map(|s| s.path.clone()).collect();
    expected.sort();
    assert_eq!(all, expected);

    let again = dataset.split(&config);
    assert_eq!(again.train, split.train);
    assert_eq!(again.validation, split.validation);
    assert_eq!(again.test, split.test);

    Ok(())
}

#[test]
fn test_split_with_default_batches_keeps_small_holdout_for_validation() -> anyhow::Result<()> {
    let root = class_tree(&[("a", 5), ("b", 5)]);
    let dataset = LabeledDataset::scan(root.path())?;

    // 3 held-out samples fit in one batch of 64, and half of one batch is zero
    let split = dataset.split(&SplitConfig::default());
    assert_eq!(split.train.len(), 7);
    assert_eq!(split.validation.len(), 3);
    assert!(split.test.is_empty());

    Ok(())
}

#[test]
fn test_split_holds_out_exact_decimal_share() -> anyhow::Result<()> {
    let root = class_tree(&[("a", 5), ("b", 5)]);
    let dataset = LabeledDataset::scan(root.path())?;

    for (fraction, held_out) in [(0.7, 7), (0.9, 9), (0.3, 3)] {
        let split = dataset.split(&SplitConfig {
            validation_split: fraction,
            ..Default::default()
        });
        assert_eq!(
            split.validation.len() + split.test.len(),
            held_out,
            "split {} of 10 samples",
            fraction
        );
        assert_eq!(split.train.len(), 10 - held_out);
    }

    Ok(())
}

#[test]
fn test_cropped_batch_satisfies_dataset_contract() -> anyhow::Result<()> {
    let dirs = batch_dirs();
    write_coin_image(&dirs.input, "coin_1.png", 300, 300, (150, 150), 100);
    write_coin_image(&dirs.input, "coin_2.jpg", 320, 240, (160, 120), 90);

    let dataset_root = dirs.root.path().join("dataset");
    let class_dir = dataset_root.join("1_rupee");
    BatchRunner::new(dirs.input.clone(), class_dir, CropConfig::default())?.run()?;

    let dataset = LabeledDataset::scan(&dataset_root)?;
    assert_eq!(dataset.len(), 2);
    assert!(dataset.validate(256).is_empty());

    Ok(())
}

#[test]
fn test_input_tensor_is_scaled_single_image_batch() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = write_gray_crop(dir.path(), "crop.png", 256, 255);

    let tensor = load_input_tensor(&path, 256)?;
    assert_eq!(tensor.shape, [1, 256, 256, 1]);
    assert_eq!(tensor.data.len(), 256 * 256);
    assert!(tensor.data.iter().all(|&v| (v - 1.0).abs() < f32::EPSILON));

    let wrong = load_input_tensor(&path, 128);
    assert!(matches!(wrong, Err(DatasetError::WrongSize { .. })));

    Ok(())
}

#[test]
fn test_prediction_picks_most_probable_class() -> anyhow::Result<()> {
    let classes: Vec<String> = ["1_rupee", "2_rupee", "5_rupee", "invalid", "reverse"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let prediction = Prediction::from_probabilities(&classes, &[0.05, 0.7, 0.1, 0.05, 0.1])?;
    assert_eq!(prediction.label, "2_rupee");
    assert_eq!(prediction.index, 1);
    assert!((prediction.confidence - 0.7).abs() < 1e-6);

    let tie = Prediction::from_probabilities(&classes, &[0.4, 0.1, 0.4, 0.05, 0.05])?;
    assert_eq!(tie.index, 0);

    assert!(matches!(
        Prediction::from_probabilities(&classes, &[0.5, 0.5]),
        Err(DatasetError::ClassCountMismatch { expected: 5, got: 2 })
    ));
    assert!(matches!(
        Prediction::from_probabilities(&classes, &[]),
        Err(DatasetError::EmptyPrediction)
    ));

    Ok(())
}
