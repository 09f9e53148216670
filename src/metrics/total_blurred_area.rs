use std::path::Path;

use image::GrayImage;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricError {
    #[error("Mask size mismatch: truth is {truth:?}, prediction is {prediction:?}")]
    DimensionMismatch {
        truth: (u32, u32),
        prediction: (u32, u32),
    },
    #[error("Mask of {width}x{height} needs {expected} pixels, got {actual}")]
    InvalidMaskLength {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("Failed to read mask {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

// ---------------------------------------------------------------------------
// BinaryMask
// ---------------------------------------------------------------------------

/// Row-major boolean mask, `true` marks a blurred pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    width: u32,
    height: u32,
    pixels: Vec<bool>,
}

impl BinaryMask {
    pub fn new(width: u32, height: u32, pixels: Vec<bool>) -> Result<Self, MetricError> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(MetricError::InvalidMaskLength {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(BinaryMask {
            width,
            height,
            pixels,
        })
    }

    /// Any non-zero luma value counts as set.
    pub fn from_luma(image: &GrayImage) -> Self {
        BinaryMask {
            width: image.width(),
            height: image.height(),
            pixels: image.pixels().map(|p| p.0[0] != 0).collect(),
        }
    }

    pub fn open(path: &Path) -> Result<Self, MetricError> {
        let image = image::open(path).map_err(|source| MetricError::Image {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::from_luma(&image.to_luma8()))
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn count_set(&self) -> usize {
        self.pixels.iter().filter(|&&p| p).count()
    }
}

// ---------------------------------------------------------------------------
// ConfusionCounts – pixel-level accumulator
// ---------------------------------------------------------------------------

/// Pixel counts accumulated over any number of mask pairs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionCounts {
    pub true_positives: u64,
    pub false_positives: u64,
    pub true_negatives: u64,
    pub false_negatives: u64,
}

impl ConfusionCounts {
    /// Fold one truth/prediction pair into the counts.
    pub fn update(self, truth: &BinaryMask, prediction: &BinaryMask) -> Result<Self, MetricError> {
        if truth.dimensions() != prediction.dimensions() {
            return Err(MetricError::DimensionMismatch {
                truth: truth.dimensions(),
                prediction: prediction.dimensions(),
            });
        }

        let mut next = self;
        for (&t, &p) in truth.pixels.iter().zip(&prediction.pixels) {
            match (t, p) {
                (true, true) => next.true_positives += 1,
                (false, true) => next.false_positives += 1,
                (false, false) => next.true_negatives += 1,
                (true, false) => next.false_negatives += 1,
            }
        }
        Ok(next)
    }

    /// Fold a sequence of mask pairs, starting from empty counts.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, MetricError>
    where
        I: IntoIterator<Item = (&'a BinaryMask, &'a BinaryMask)>,
    {
        pairs
            .into_iter()
            .try_fold(ConfusionCounts::default(), |acc, (truth, prediction)| {
                acc.update(truth, prediction)
            })
    }

    /// Precision, recall and F1 of the accumulated counts.
    ///
    /// Each ratio is `None` when undefined. Values are rounded to 3 decimals
    /// and F1 is derived from the rounded precision and recall.
    pub fn statistics(&self) -> BlurStatistics {
        let tp = self.true_positives as f64;
        let precision = ratio(tp, tp + self.false_positives as f64).map(round3);
        let recall = ratio(tp, tp + self.false_negatives as f64).map(round3);
        let f1_score = match (precision, recall) {
            (Some(p), Some(r)) if p > 0.0 && r > 0.0 => Some(round3(2.0 * p * r / (p + r))),
            _ => None,
        };

        BlurStatistics {
            counts: *self,
            precision,
            recall,
            f1_score,
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    (denominator > 0.0).then(|| numerator / denominator)
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Final report of a blurred-area evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BlurStatistics {
    #[serde(flatten)]
    pub counts: ConfusionCounts,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub f1_score: Option<f64>,
}
