use std::collections::{BTreeSet, HashSet};

use super::error::LabelError;
use super::model::{DetectionRecord, LabelSet};

// ---------------------------------------------------------------------------
// Filter predicates
// ---------------------------------------------------------------------------

/// Class ids a class filter keeps. Built from a single id or any collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSelection(BTreeSet<u32>);

impl ClassSelection {
    pub fn contains(&self, class_id: u32) -> bool {
        self.0.contains(&class_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }
}

impl From<u32> for ClassSelection {
    fn from(class_id: u32) -> Self {
        ClassSelection(BTreeSet::from([class_id]))
    }
}

impl From<&[u32]> for ClassSelection {
    fn from(ids: &[u32]) -> Self {
        ClassSelection(ids.iter().copied().collect())
    }
}

impl<const N: usize> From<[u32; N]> for ClassSelection {
    fn from(ids: [u32; N]) -> Self {
        ClassSelection(ids.into_iter().collect())
    }
}

impl From<Vec<u32>> for ClassSelection {
    fn from(ids: Vec<u32>) -> Self {
        ClassSelection(ids.into_iter().collect())
    }
}

impl From<BTreeSet<u32>> for ClassSelection {
    fn from(ids: BTreeSet<u32>) -> Self {
        ClassSelection(ids)
    }
}

impl From<HashSet<u32>> for ClassSelection {
    fn from(ids: HashSet<u32>) -> Self {
        ClassSelection(ids.into_iter().collect())
    }
}

/// Absolute pixel area interval, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaInterval {
    pub min: f64,
    pub max: f64,
}

impl AreaInterval {
    pub fn new(min: f64, max: f64) -> Self {
        AreaInterval { min, max }
    }

    /// Interval expressed as fractions of `image_area`.
    pub fn from_percentage(min_pct: f64, max_pct: f64, image_area: f64) -> Self {
        AreaInterval {
            min: min_pct * image_area,
            max: max_pct * image_area,
        }
    }

    pub fn contains(&self, area: f64) -> bool {
        area >= self.min && area <= self.max
    }
}

impl From<(f64, f64)> for AreaInterval {
    fn from((min, max): (f64, f64)) -> Self {
        AreaInterval { min, max }
    }
}

impl From<[f64; 2]> for AreaInterval {
    fn from([min, max]: [f64; 2]) -> Self {
        AreaInterval { min, max }
    }
}

fn confidence_at_least(record: &DetectionRecord, threshold: f32) -> bool {
    record.confidence.is_some_and(|c| c >= threshold)
}

// ---------------------------------------------------------------------------
// Pure filters: LabelSet → LabelSet
// ---------------------------------------------------------------------------

impl LabelSet {
    /// Keep rows whose class is in `classes`.
    pub fn filter_by_class(&self, classes: impl Into<ClassSelection>) -> LabelSet {
        let classes = classes.into();
        self.retain_rows(|r| classes.contains(r.class_id))
    }

    /// Keep rows whose absolute area lies in `interval` (inclusive).
    pub fn filter_by_size(&self, interval: impl Into<AreaInterval>, image_area: f64) -> LabelSet {
        let interval = interval.into();
        self.retain_rows(|r| interval.contains(r.area(image_area)))
    }

    /// Same as [`LabelSet::filter_by_size`] with bounds given as fractions of
    /// `image_area`.
    pub fn filter_by_size_percentage(
        &self,
        percentage: impl Into<AreaInterval>,
        image_area: f64,
    ) -> LabelSet {
        let pct = percentage.into();
        self.filter_by_size(
            AreaInterval::from_percentage(pct.min, pct.max, image_area),
            image_area,
        )
    }

    /// Keep rows with `confidence >= threshold`.
    pub fn filter_by_confidence(&self, threshold: f32) -> Result<LabelSet, LabelError> {
        if !self.schema().has_confidence() {
            return Err(LabelError::ConfidenceUnavailable);
        }
        Ok(self.retain_rows(|r| confidence_at_least(r, threshold)))
    }
}
