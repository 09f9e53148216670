use std::path::PathBuf;

use cvtoolkit::datasets::{LabelError, LabelSet, RecordSchema, YoloLabelsDataset};

const IMAGE_SHAPE: (u64, u64) = (1280, 720);

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data")
}

fn dataset() -> YoloLabelsDataset {
    YoloLabelsDataset::from_folder(data_dir().join("labels"), IMAGE_SHAPE.0 * IMAGE_SHAPE.1)
        .expect("fixture labels load")
}

fn row_counts(labels: &LabelSet) -> Vec<usize> {
    labels.iter().map(|(_, records)| records.len()).collect()
}

#[test]
fn loads_fixture() {
    let mut dataset = dataset();
    let filtered = dataset.reset_filter().get_filtered_labels();
    assert_eq!(filtered.len(), 2);
    assert_eq!(filtered.total_records(), 11);
    assert_eq!(dataset.schema(), RecordSchema::BoxWithConfidence);
    // frame_0003.txt is empty and gets no entry
    assert_eq!(dataset.label_files().len(), 3);
    assert!(dataset.get("frame_0003").is_none());
}

#[test]
fn filter_by_class() {
    let mut dataset = dataset();
    let kept = dataset
        .reset_filter()
        .filter_by_class(0u32)
        .get_filtered_labels()
        .total_records();
    assert_eq!(kept, 8);

    let kept = dataset
        .reset_filter()
        .filter_by_class(10u32)
        .get_filtered_labels()
        .total_records();
    assert_eq!(kept, 0);
    // images stay present with no rows
    assert_eq!(dataset.get_filtered_labels().len(), 2);
}

#[test]
fn filter_by_class_list() {
    let mut dataset = dataset();
    let kept = dataset
        .reset_filter()
        .filter_by_class([3u32, 4])
        .get_filtered_labels()
        .total_records();
    assert_eq!(kept, 2);
}

#[test]
fn filter_by_size() {
    let mut dataset = dataset();
    let kept = dataset
        .reset_filter()
        .filter_by_size((200.0, 400.0))
        .get_filtered_labels()
        .total_records();
    assert_eq!(kept, 3);
}

#[test]
fn filter_by_size_percentage() {
    let mut dataset = dataset();
    let kept = dataset
        .reset_filter()
        .filter_by_size_percentage((0.0002, 0.0004))
        .get_filtered_labels()
        .total_records();
    assert_eq!(kept, 4);

    let area = dataset.image_area();
    let by_size = dataset
        .reset_filter()
        .filter_by_size((0.0002 * area, 0.0004 * area))
        .filtered();
    let by_pct = dataset
        .reset_filter()
        .filter_by_size_percentage((0.0002, 0.0004))
        .filtered();
    assert_eq!(by_size, by_pct);
}

#[test]
fn filter_by_confidence() {
    let mut dataset = dataset();
    let kept = dataset
        .reset_filter()
        .filter_by_confidence(0.8)
        .expect("fixture carries confidences")
        .get_filtered_labels()
        .total_records();
    assert_eq!(kept, 6);
}

#[test]
fn forgetting_reset_compounds_filters() {
    let mut dataset = dataset();
    dataset.reset_filter().filter_by_class(0u32);
    dataset.filter_by_size((200.0, 400.0));
    assert_eq!(dataset.get_filtered_labels().total_records(), 3);

    dataset.filter_by_class([3u32, 4]);
    assert_eq!(dataset.get_filtered_labels().total_records(), 0);

    dataset.reset_filter();
    assert_eq!(dataset.get_filtered_labels(), dataset.get_labels());
}

#[test]
fn filters_never_grow_rows_or_images() {
    let mut dataset = dataset();
    let full = dataset.get_labels().clone();
    let mut previous = row_counts(&full);

    dataset.reset_filter().filter_by_size_percentage((0.0001, 0.01));
    let after_size = row_counts(dataset.get_filtered_labels());
    dataset.filter_by_confidence(0.5).unwrap();
    let after_conf = row_counts(dataset.get_filtered_labels());

    for counts in [after_size, after_conf] {
        assert_eq!(counts.len(), previous.len());
        assert!(counts.iter().zip(&previous).all(|(now, before)| now <= before));
        previous = counts;
    }
    assert!(dataset
        .get_filtered_labels()
        .image_ids()
        .all(|id| full.contains_image(id)));
    assert_eq!(dataset.get_labels(), &full);
}

#[test]
fn class_and_size_filters_commute() {
    let mut dataset = dataset();
    let a = dataset
        .reset_filter()
        .filter_by_class(0u32)
        .filter_by_size((200.0, 400.0))
        .filtered();
    let b = dataset
        .reset_filter()
        .filter_by_size((200.0, 400.0))
        .filter_by_class(0u32)
        .filtered();
    assert_eq!(a, b);
}

#[test]
fn detached_chain_leaves_store_untouched() {
    let dataset = dataset();
    let area = dataset.image_area();
    let small_people = dataset
        .filtered()
        .filter_by_class(0u32)
        .filter_by_size((0.0, 400.0), area);
    assert_eq!(small_people.total_records(), 4);
    assert_eq!(dataset.get_filtered_labels().total_records(), 11);
}

#[test]
fn loads_validation_json() {
    let mut dataset =
        YoloLabelsDataset::from_yolo_validation_json(data_dir().join("predictions.json"), (100, 100))
            .unwrap();
    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.image_area(), 10_000.0);

    let first = dataset.get("1").unwrap()[0];
    assert_eq!(first.class_id, 0);
    assert!((first.x_center - 0.25).abs() < 1e-6);
    assert!((first.y_center - 0.40).abs() < 1e-6);
    assert!((first.width - 0.30).abs() < 1e-6);
    assert!((first.height - 0.40).abs() < 1e-6);
    assert_eq!(first.confidence, Some(0.9));

    let kept = dataset
        .filter_by_confidence(0.5)
        .unwrap()
        .get_filtered_labels()
        .total_records();
    assert_eq!(kept, 2);
}

#[test]
fn confidence_filter_needs_confidence_column() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("img.txt"), "1 0.5 0.5 0.1 0.1\n").unwrap();
    let mut dataset = YoloLabelsDataset::from_folder(dir.path(), 100).unwrap();
    assert!(matches!(
        dataset.filter_by_confidence(0.5),
        Err(LabelError::ConfidenceUnavailable)
    ));
}

#[test]
fn empty_folder_is_empty_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = YoloLabelsDataset::from_folder(dir.path(), 100).unwrap();
    assert!(dataset.is_empty());
    assert_eq!(dataset.get_filtered_labels().total_records(), 0);
}

#[test]
fn malformed_line_aborts_load() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("img.txt"),
        "1 0.5 0.5 0.1 0.1\n1 0.5 oops 0.1 0.1\n",
    )
    .unwrap();
    let err = YoloLabelsDataset::from_folder(dir.path(), 100).unwrap_err();
    assert!(matches!(err, LabelError::MalformedLine { line: 2, .. }));
}
