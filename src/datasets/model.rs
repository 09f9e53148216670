use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// RecordSchema – which columns a label set carries
// ---------------------------------------------------------------------------

/// Column layout shared by every record of a [`LabelSet`].
///
/// YOLO ground-truth files carry 5 columns, prediction exports add a 6th
/// confidence column. A set never mixes the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordSchema {
    /// `class_id x_center y_center width height`
    #[default]
    Box,
    /// `class_id x_center y_center width height confidence`
    BoxWithConfidence,
}

impl RecordSchema {
    /// Number of fields per row in the text encoding.
    pub fn field_count(self) -> usize {
        match self {
            RecordSchema::Box => 5,
            RecordSchema::BoxWithConfidence => 6,
        }
    }

    pub fn from_field_count(count: usize) -> Option<Self> {
        match count {
            5 => Some(RecordSchema::Box),
            6 => Some(RecordSchema::BoxWithConfidence),
            _ => None,
        }
    }

    pub fn has_confidence(self) -> bool {
        matches!(self, RecordSchema::BoxWithConfidence)
    }
}

impl fmt::Display for RecordSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordSchema::Box => write!(f, "5 fields (box)"),
            RecordSchema::BoxWithConfidence => write!(f, "6 fields (box + confidence)"),
        }
    }
}

// ---------------------------------------------------------------------------
// DetectionRecord – one object instance
// ---------------------------------------------------------------------------

/// A single detection in normalized YOLO geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionRecord {
    pub class_id: u32,
    /// Box center and size as fractions of the image width/height.
    pub x_center: f32,
    pub y_center: f32,
    pub width: f32,
    pub height: f32,
    /// Present only for prediction exports.
    pub confidence: Option<f32>,
}

impl DetectionRecord {
    pub fn new(class_id: u32, x_center: f32, y_center: f32, width: f32, height: f32) -> Self {
        DetectionRecord {
            class_id,
            x_center,
            y_center,
            width,
            height,
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Absolute box area in pixels for an image of `image_area` pixels.
    pub fn area(&self, image_area: f64) -> f64 {
        self.width as f64 * self.height as f64 * image_area
    }

    pub fn schema(&self) -> RecordSchema {
        if self.confidence.is_some() {
            RecordSchema::BoxWithConfidence
        } else {
            RecordSchema::Box
        }
    }
}

// ---------------------------------------------------------------------------
// LabelSet – image id → detections
// ---------------------------------------------------------------------------

/// Detections of every image, keyed by the opaque image identifier.
///
/// Ids are kept sorted so iteration and exports are deterministic.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LabelSet {
    schema: RecordSchema,
    images: BTreeMap<String, Vec<DetectionRecord>>,
}

impl LabelSet {
    pub fn new(schema: RecordSchema) -> Self {
        LabelSet {
            schema,
            images: BTreeMap::new(),
        }
    }

    /// Build a set from already-grouped records. The caller guarantees every
    /// record matches `schema`.
    pub(crate) fn from_parts(
        schema: RecordSchema,
        images: BTreeMap<String, Vec<DetectionRecord>>,
    ) -> Self {
        debug_assert!(images.values().flatten().all(|r| r.schema() == schema));
        LabelSet { schema, images }
    }

    pub fn schema(&self) -> RecordSchema {
        self.schema
    }

    /// Number of images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Number of detections over all images.
    pub fn total_records(&self) -> usize {
        self.images.values().map(Vec::len).sum()
    }

    pub fn get(&self, image_id: &str) -> Option<&[DetectionRecord]> {
        self.images.get(image_id).map(Vec::as_slice)
    }

    pub fn contains_image(&self, image_id: &str) -> bool {
        self.images.contains_key(image_id)
    }

    pub fn image_ids(&self) -> impl Iterator<Item = &str> {
        self.images.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[DetectionRecord])> {
        self.images
            .iter()
            .map(|(id, records)| (id.as_str(), records.as_slice()))
    }

    /// All detections paired with their image id, in id order.
    pub fn records(&self) -> impl Iterator<Item = (&str, &DetectionRecord)> {
        self.images
            .iter()
            .flat_map(|(id, records)| records.iter().map(move |r| (id.as_str(), r)))
    }

    /// Number of detections per class id.
    pub fn class_histogram(&self) -> BTreeMap<u32, usize> {
        let mut histogram = BTreeMap::new();
        for (_, record) in self.records() {
            *histogram.entry(record.class_id).or_insert(0) += 1;
        }
        histogram
    }

    /// Keep the rows matching `keep`, image keys are never dropped.
    pub(crate) fn retain_rows<F>(&self, mut keep: F) -> LabelSet
    where
        F: FnMut(&DetectionRecord) -> bool,
    {
        let images = self
            .images
            .iter()
            .map(|(id, records)| {
                let kept: Vec<DetectionRecord> =
                    records.iter().filter(|r| keep(r)).copied().collect();
                (id.clone(), kept)
            })
            .collect();
        LabelSet {
            schema: self.schema,
            images,
        }
    }
}
