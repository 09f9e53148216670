use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float32Array, StringArray, UInt32Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::errors::ParquetError;
use serde::Serialize;
use thiserror::Error;

use super::model::LabelSet;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),
    #[error("Unsupported export extension: .{0}")]
    UnsupportedFormat(String),
}

/// One exported detection row.
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    image_id: &'a str,
    class_id: u32,
    x_center: f32,
    y_center: f32,
    width: f32,
    height: f32,
    confidence: Option<f32>,
}

/// Write labels to `path`, choosing the format by extension
/// (`.csv`, `.parquet` / `.pq`).
pub fn write_file(labels: &LabelSet, path: &Path) -> Result<(), ExportError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => write_csv(labels, path),
        "parquet" | "pq" => write_parquet(labels, path),
        other => Err(ExportError::UnsupportedFormat(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// One row per detection; the confidence cell is empty for 5-field labels.
pub fn write_csv(labels: &LabelSet, path: &Path) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    for (image_id, r) in labels.records() {
        writer.serialize(ExportRow {
            image_id,
            class_id: r.class_id,
            x_center: r.x_center,
            y_center: r.y_center,
            width: r.width,
            height: r.height,
            confidence: r.confidence,
        })?;
    }
    writer.flush()?;
    log::info!(
        "Wrote {} detections to {}",
        labels.total_records(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Arrow / Parquet
// ---------------------------------------------------------------------------

pub fn export_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("image_id", DataType::Utf8, false),
        Field::new("class_id", DataType::UInt32, false),
        Field::new("x_center", DataType::Float32, false),
        Field::new("y_center", DataType::Float32, false),
        Field::new("width", DataType::Float32, false),
        Field::new("height", DataType::Float32, false),
        Field::new("confidence", DataType::Float32, true),
    ]))
}

/// Flatten labels into a single Arrow batch, one row per detection.
pub fn to_record_batch(labels: &LabelSet) -> Result<RecordBatch, ExportError> {
    let n = labels.total_records();
    let mut image_ids = Vec::with_capacity(n);
    let mut class_ids = Vec::with_capacity(n);
    let mut x_centers = Vec::with_capacity(n);
    let mut y_centers = Vec::with_capacity(n);
    let mut widths = Vec::with_capacity(n);
    let mut heights = Vec::with_capacity(n);
    let mut confidences = Vec::with_capacity(n);

    for (image_id, r) in labels.records() {
        image_ids.push(image_id);
        class_ids.push(r.class_id);
        x_centers.push(r.x_center);
        y_centers.push(r.y_center);
        widths.push(r.width);
        heights.push(r.height);
        confidences.push(r.confidence);
    }

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(image_ids)),
        Arc::new(UInt32Array::from(class_ids)),
        Arc::new(Float32Array::from(x_centers)),
        Arc::new(Float32Array::from(y_centers)),
        Arc::new(Float32Array::from(widths)),
        Arc::new(Float32Array::from(heights)),
        Arc::new(Float32Array::from(confidences)),
    ];

    Ok(RecordBatch::try_new(export_schema(), columns)?)
}

pub fn write_parquet(labels: &LabelSet, path: &Path) -> Result<(), ExportError> {
    let batch = to_record_batch(labels)?;
    let file = std::fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(&batch)?;
    writer.close()?;
    log::info!("Wrote {} detections to {}", batch.num_rows(), path.display());
    Ok(())
}
