mod common;

use common::{csv_rows, manager, write_corrupt, write_gray, BrightnessClassifier, FailingClassifier};
use skin_classifier::batch::{run_batch, run_batch_with, CSV_HEADER};
use skin_classifier::{BatchOptions, Config, SkinError, TensorLayout};
use std::fs;
use std::path::Path;

// 灰度 230/102/153 -> 置信度约 0.90 / 0.40 / 0.60
fn three_images(dir: &Path) {
    write_gray(&dir.join("bright.png"), 230);
    write_gray(&dir.join("dim.png"), 102);
    write_gray(&dir.join("mid.png"), 153);
}

fn options(image_dir: &Path, output_csv: &Path) -> BatchOptions {
    let mut options = BatchOptions::new(image_dir);
    options.output_csv = output_csv.to_path_buf();
    options
}

fn confidences(rows: &[Vec<String>]) -> Vec<String> {
    let mut values: Vec<String> = rows.iter().map(|r| r[3].clone()).collect();
    values.sort();
    values
}

#[test]
fn threshold_filters_low_confidence_rows() {
    let images = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    three_images(images.path());
    let csv_path = out.path().join("reports/predictions.csv");

    let mut opts = options(images.path(), &csv_path);
    opts.min_confidence = 0.5;

    let summary = run_batch_with(&manager(BrightnessClassifier), &opts).unwrap();
    assert_eq!(summary.counters.scanned, 3);
    assert_eq!(summary.counters.written, 2);
    assert_eq!(summary.counters.skipped, 1);
    assert_eq!(summary.counters.errors, 0);
    assert!(summary.counters.is_balanced());
    assert!(summary
        .to_string()
        .contains("Scanned: 3 images, Written to CSV: 2"));

    let rows = csv_rows(&csv_path);
    assert_eq!(rows.len(), 2);
    assert_eq!(confidences(&rows), vec!["0.600000", "0.901961"]);
    for row in &rows {
        assert_eq!(row[2], "acne");
        assert!(Path::new(&row[1]).is_absolute());
        assert!(row[1].ends_with(&row[0]));
    }
}

#[test]
fn include_low_confidence_keeps_every_row() {
    let images = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    three_images(images.path());
    let csv_path = out.path().join("predictions.csv");

    let mut opts = options(images.path(), &csv_path);
    opts.min_confidence = 0.5;
    opts.include_low_confidence = true;

    let summary = run_batch_with(&manager(BrightnessClassifier), &opts).unwrap();
    assert_eq!(summary.counters.written, 3);
    assert_eq!(summary.counters.skipped, 0);

    let rows = csv_rows(&csv_path);
    assert_eq!(confidences(&rows), vec!["0.400000", "0.600000", "0.901961"]);
}

#[test]
fn corrupt_image_is_logged_and_skipped() {
    let images = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_gray(&images.path().join("one.png"), 230);
    write_gray(&images.path().join("two.jpg"), 153);
    write_corrupt(&images.path().join("broken.jpg"));
    let csv_path = out.path().join("predictions.csv");

    let mut opts = options(images.path(), &csv_path);
    opts.min_confidence = 0.5;

    let summary = run_batch_with(&manager(BrightnessClassifier), &opts).unwrap();
    assert_eq!(summary.counters.scanned, 3);
    assert_eq!(summary.counters.errors, 1);
    assert_eq!(summary.counters.written, 2);
    assert!(summary.counters.is_balanced());

    let rows = csv_rows(&csv_path);
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r[0] != "broken.jpg"));
}

#[test]
fn inference_errors_are_counted_per_image() {
    let images = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_gray(&images.path().join("dark1.png"), 10);
    write_gray(&images.path().join("dark2.png"), 20);
    let csv_path = out.path().join("predictions.csv");

    let summary =
        run_batch_with(&manager(FailingClassifier), &options(images.path(), &csv_path)).unwrap();
    assert_eq!(summary.counters.scanned, 2);
    assert_eq!(summary.counters.errors, 2);
    assert_eq!(summary.counters.written, 0);
    assert!(csv_rows(&csv_path).is_empty());
}

#[test]
fn unrecoverable_error_aborts_the_run() {
    let images = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_gray(&images.path().join("bright.png"), 230);
    let csv_path = out.path().join("predictions.csv");

    let err = run_batch_with(&manager(FailingClassifier), &options(images.path(), &csv_path))
        .unwrap_err();
    assert!(matches!(err, SkinError::Config(_)));
}

#[test]
fn non_image_files_are_never_counted() {
    let images = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_gray(&images.path().join("a.PNG"), 200);
    fs::write(images.path().join("notes.txt"), "hello").unwrap();
    fs::write(images.path().join("labels.json"), "{}").unwrap();
    let csv_path = out.path().join("predictions.csv");

    let summary =
        run_batch_with(&manager(BrightnessClassifier), &options(images.path(), &csv_path)).unwrap();
    assert_eq!(summary.counters.scanned, 1);
    assert_eq!(summary.counters.written, 1);
}

#[test]
fn recursive_flag_controls_subdirectories() {
    let images = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_gray(&images.path().join("top.png"), 200);
    write_gray(&images.path().join("nested/deeper/inner.png"), 200);
    let csv_path = out.path().join("predictions.csv");

    let flat =
        run_batch_with(&manager(BrightnessClassifier), &options(images.path(), &csv_path)).unwrap();
    let flat_rows = csv_rows(&csv_path);

    let mut opts = options(images.path(), &csv_path);
    opts.recursive = true;
    let deep = run_batch_with(&manager(BrightnessClassifier), &opts).unwrap();
    let deep_rows = csv_rows(&csv_path);

    assert_eq!(flat.counters.scanned, 1);
    assert_eq!(deep.counters.scanned, 2);
    for row in &flat_rows {
        assert!(deep_rows.contains(row));
    }
}

#[test]
fn empty_directory_writes_header_only() {
    let images = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let csv_path = out.path().join("predictions.csv");

    let summary =
        run_batch_with(&manager(BrightnessClassifier), &options(images.path(), &csv_path)).unwrap();
    assert_eq!(summary.counters.scanned, 0);

    let content = fs::read_to_string(&csv_path).unwrap();
    assert_eq!(content.trim_end(), CSV_HEADER.join(","));
}

#[test]
fn missing_model_aborts_before_output() {
    let images = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    three_images(images.path());

    let class_map = work.path().join("class_indices.json");
    fs::write(&class_map, r#"{"acne": 0, "eczema": 1}"#).unwrap();
    let config = Config::new(
        work.path().join("skin_model.onnx"),
        &class_map,
        224,
        224,
        TensorLayout::Nhwc,
        Some(1),
    )
    .unwrap();
    let csv_path = work.path().join("reports/predictions.csv");

    let err = run_batch(&config, &options(images.path(), &csv_path)).unwrap_err();
    assert!(matches!(err, SkinError::ModelLoad(_)));
    assert!(!csv_path.exists());
}

#[test]
fn missing_image_dir_is_fatal() {
    let out = tempfile::tempdir().unwrap();
    let csv_path = out.path().join("predictions.csv");
    let err = run_batch_with(
        &manager(BrightnessClassifier),
        &options(&out.path().join("nowhere"), &csv_path),
    )
    .unwrap_err();
    assert!(matches!(err, SkinError::InvalidInput(_)));
}

#[test]
fn invalid_threshold_is_rejected() {
    let images = tempfile::tempdir().unwrap();
    let mut opts = options(images.path(), &images.path().join("out.csv"));
    opts.min_confidence = -0.1;
    let err = run_batch_with(&manager(BrightnessClassifier), &opts).unwrap_err();
    assert!(matches!(err, SkinError::Config(_)));
}
