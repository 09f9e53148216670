use std::path::{Path, PathBuf};

use super::error::LabelError;
use super::filter::{AreaInterval, ClassSelection};
use super::loader;
use super::model::{DetectionRecord, LabelSet, RecordSchema};

// ---------------------------------------------------------------------------
// Label source – remembered for reload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum LabelSource {
    /// Flat directory of `<image_id>.txt` files.
    Folder(PathBuf),
    /// Single COCO-style JSON export for images of `(width, height)` pixels.
    ValidationJson { path: PathBuf, image_shape: (u32, u32) },
}

// ---------------------------------------------------------------------------
// YoloLabelsDataset
// ---------------------------------------------------------------------------

/// YOLO detections of a set of images with a resettable filter chain.
///
/// `labels` is the full set as loaded. `filtered` is the working set: every
/// `filter_by_*` call narrows it further until [`reset_filter`] restores a
/// copy of the full set.
///
/// ```no_run
/// use cvtoolkit::datasets::YoloLabelsDataset;
///
/// let mut dataset = YoloLabelsDataset::from_folder("labels", 1280 * 720)?;
/// let kept = dataset
///     .reset_filter()
///     .filter_by_class(0u32)
///     .filter_by_size((200.0, 400.0))
///     .get_filtered_labels()
///     .total_records();
/// # Ok::<(), cvtoolkit::datasets::LabelError>(())
/// ```
///
/// [`reset_filter`]: YoloLabelsDataset::reset_filter
#[derive(Debug, Clone)]
pub struct YoloLabelsDataset {
    source: LabelSource,
    label_files: Vec<String>,
    image_area: f64,
    labels: LabelSet,
    filtered: LabelSet,
}

impl YoloLabelsDataset {
    /// Load every `*.txt` label file of `folder_path`.
    pub fn from_folder(folder_path: impl AsRef<Path>, image_area: u64) -> Result<Self, LabelError> {
        let folder_path = folder_path.as_ref().to_path_buf();
        let label_files = loader::list_label_files(&folder_path)?;
        let labels = loader::load_label_folder(&folder_path, &label_files)?;
        log::info!(
            "Loaded {} detections for {} images from {} ({})",
            labels.total_records(),
            labels.len(),
            folder_path.display(),
            labels.schema()
        );

        Ok(YoloLabelsDataset {
            source: LabelSource::Folder(folder_path),
            label_files,
            image_area: image_area as f64,
            filtered: labels.clone(),
            labels,
        })
    }

    /// Load a COCO-style validation/prediction JSON for images of
    /// `image_shape = (width, height)` pixels.
    pub fn from_yolo_validation_json(
        json_path: impl AsRef<Path>,
        image_shape: (u32, u32),
    ) -> Result<Self, LabelError> {
        let json_path = json_path.as_ref().to_path_buf();
        let labels = loader::load_validation_json(&json_path, image_shape)?;
        log::info!(
            "Loaded {} detections for {} images from {} ({})",
            labels.total_records(),
            labels.len(),
            json_path.display(),
            labels.schema()
        );

        Ok(YoloLabelsDataset {
            source: LabelSource::ValidationJson {
                path: json_path,
                image_shape,
            },
            label_files: Vec::new(),
            image_area: image_shape.0 as f64 * image_shape.1 as f64,
            filtered: labels.clone(),
            labels,
        })
    }

    /// Open a label folder or a `.json` export. Dispatch by path kind.
    pub fn open(path: impl AsRef<Path>, image_shape: (u32, u32)) -> Result<Self, LabelError> {
        let path = path.as_ref();
        if path.is_dir() {
            return Self::from_folder(path, image_shape.0 as u64 * image_shape.1 as u64);
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "json" => Self::from_yolo_validation_json(path, image_shape),
            _ => Err(LabelError::UnsupportedSource {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Re-read the source, replacing the full set and resetting the filter.
    pub fn reload(&mut self) -> Result<(), LabelError> {
        let labels = match &self.source {
            LabelSource::Folder(dir) => {
                self.label_files = loader::list_label_files(dir)?;
                loader::load_label_folder(dir, &self.label_files)?
            }
            LabelSource::ValidationJson { path, image_shape } => {
                loader::load_validation_json(path, *image_shape)?
            }
        };
        log::info!("Reloaded {} images", labels.len());
        self.filtered = labels.clone();
        self.labels = labels;
        Ok(())
    }

    // -- Filter chain --

    pub fn reset_filter(&mut self) -> &mut Self {
        self.filtered = self.labels.clone();
        self
    }

    pub fn filter_by_class(&mut self, classes: impl Into<ClassSelection>) -> &mut Self {
        let classes = classes.into();
        self.filtered = self.filtered.filter_by_class(classes.clone());
        log::debug!(
            "Class filter {:?}: {} detections left",
            classes.iter().collect::<Vec<_>>(),
            self.filtered.total_records()
        );
        self
    }

    /// Keep detections with `width * height * image_area` in the inclusive
    /// pixel interval.
    pub fn filter_by_size(&mut self, interval: impl Into<AreaInterval>) -> &mut Self {
        let interval = interval.into();
        self.filtered = self.filtered.filter_by_size(interval, self.image_area);
        log::debug!(
            "Size filter [{}, {}]: {} detections left",
            interval.min,
            interval.max,
            self.filtered.total_records()
        );
        self
    }

    /// Size filter with bounds given as fractions of the image area.
    pub fn filter_by_size_percentage(&mut self, percentage: impl Into<AreaInterval>) -> &mut Self {
        let pct = percentage.into();
        self.filter_by_size(AreaInterval::from_percentage(
            pct.min,
            pct.max,
            self.image_area,
        ))
    }

    /// Keep detections with a confidence of at least `threshold`.
    ///
    /// Fails without touching the working set when the labels carry no
    /// confidence column.
    pub fn filter_by_confidence(&mut self, threshold: f32) -> Result<&mut Self, LabelError> {
        self.filtered = self.filtered.filter_by_confidence(threshold)?;
        log::debug!(
            "Confidence filter >= {threshold}: {} detections left",
            self.filtered.total_records()
        );
        Ok(self)
    }

    // -- Accessors --

    pub fn get_labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn get_filtered_labels(&self) -> &LabelSet {
        &self.filtered
    }

    /// Detached copy of the working set, for building an independent chain
    /// with the [`LabelSet`] filters.
    pub fn filtered(&self) -> LabelSet {
        self.filtered.clone()
    }

    /// Full labels of one image.
    pub fn get(&self, image_id: &str) -> Option<&[DetectionRecord]> {
        self.labels.get(image_id)
    }

    /// Number of images with at least one label line.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn image_area(&self) -> f64 {
        self.image_area
    }

    pub fn schema(&self) -> RecordSchema {
        self.labels.schema()
    }

    /// Label file names found in the folder, empty files included.
    pub fn label_files(&self) -> &[String] {
        &self.label_files
    }

    pub fn source(&self) -> &LabelSource {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    fn folder() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.txt", "0 0.5 0.5 0.5 0.5\n1 0.5 0.5 0.25 0.25\n");
        write(dir.path(), "b.txt", "1 0.5 0.5 0.125 0.125\n");
        write(dir.path(), "empty.txt", "");
        write(dir.path(), "notes.md", "0 0.5 0.5 0.5 0.5\n");
        dir
    }

    #[test]
    fn loads_folder_and_skips_empty_files() {
        let dir = folder();
        let dataset = YoloLabelsDataset::from_folder(dir.path(), 100).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.label_files(), ["a.txt", "b.txt", "empty.txt"]);
        assert!(dataset.get("empty").is_none());
        assert_eq!(dataset.get("a").unwrap().len(), 2);
        assert_eq!(dataset.schema(), RecordSchema::Box);
    }

    #[test]
    fn chained_filters_compound_until_reset() {
        let dir = folder();
        let mut dataset = YoloLabelsDataset::from_folder(dir.path(), 100).unwrap();

        dataset.filter_by_class(1u32);
        assert_eq!(dataset.get_filtered_labels().total_records(), 2);
        dataset.filter_by_size((5.0, 10.0));
        assert_eq!(dataset.get_filtered_labels().total_records(), 1);

        dataset.filter_by_class(0u32);
        assert_eq!(dataset.get_filtered_labels().total_records(), 0);

        dataset.reset_filter();
        assert_eq!(dataset.get_filtered_labels(), dataset.get_labels());
        assert_eq!(dataset.get_labels().total_records(), 3);
    }

    #[test]
    fn confidence_on_box_labels_leaves_working_set() {
        let dir = folder();
        let mut dataset = YoloLabelsDataset::from_folder(dir.path(), 100).unwrap();
        dataset.filter_by_class(1u32);
        let err = dataset.filter_by_confidence(0.5).unwrap_err();
        assert!(matches!(err, LabelError::ConfidenceUnavailable));
        assert_eq!(dataset.get_filtered_labels().total_records(), 2);
    }

    #[test]
    fn mixed_schemas_across_files_fail() {
        let dir = folder();
        write(dir.path(), "c.txt", "0 0.5 0.5 0.5 0.5 0.9\n");
        let err = YoloLabelsDataset::from_folder(dir.path(), 100).unwrap_err();
        assert!(matches!(err, LabelError::SchemaMismatch { .. }));
    }

    #[test]
    fn reload_picks_up_new_files() {
        let dir = folder();
        let mut dataset = YoloLabelsDataset::from_folder(dir.path(), 100).unwrap();
        dataset.filter_by_class(0u32);
        write(dir.path(), "d.txt", "2 0.1 0.1 0.1 0.1\n");
        dataset.reload().unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.get_filtered_labels().total_records(), 4);
    }

    #[test]
    fn open_dispatches_on_path_kind() {
        let dir = folder();
        let dataset = YoloLabelsDataset::open(dir.path(), (10, 10)).unwrap();
        assert_eq!(dataset.image_area(), 100.0);
        assert!(matches!(dataset.source(), LabelSource::Folder(_)));

        let json = dir.path().join("preds.json");
        fs::write(
            &json,
            r#"[{"image_id": 1, "category_id": 0, "bbox": [0, 0, 5, 5], "score": 0.7}]"#,
        )
        .unwrap();
        let dataset = YoloLabelsDataset::open(&json, (10, 20)).unwrap();
        assert_eq!(dataset.image_area(), 200.0);
        assert_eq!(dataset.schema(), RecordSchema::BoxWithConfidence);

        let err = YoloLabelsDataset::open(dir.path().join("notes.md"), (10, 10)).unwrap_err();
        assert!(matches!(err, LabelError::UnsupportedSource { .. }));
    }

    #[test]
    fn missing_folder_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = YoloLabelsDataset::from_folder(dir.path().join("nope"), 100).unwrap_err();
        assert!(matches!(err, LabelError::Io { .. }));
    }
}
