use std::collections::BTreeMap;
use std::path::Path;

use serde_json::{Map, Value as JsonValue};

use super::error::LabelError;
use super::model::{DetectionRecord, LabelSet, RecordSchema};

/// Extension of per-image YOLO label files.
pub const LABEL_EXTENSION: &str = "txt";

// ---------------------------------------------------------------------------
// Path A: directory of per-image text files
// ---------------------------------------------------------------------------

/// Names of the label files directly inside `dir`, sorted.
pub fn list_label_files(dir: &Path) -> Result<Vec<String>, LabelError> {
    let entries = std::fs::read_dir(dir).map_err(|e| LabelError::io(dir, e))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| LabelError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(LABEL_EXTENSION) {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            names.push(name.to_string());
        } else {
            log::warn!("Skipping label file with non UTF-8 name: {}", path.display());
        }
    }
    names.sort();
    Ok(names)
}

/// Parse every label file of `dir` into one [`LabelSet`].
///
/// Files without any non-blank line produce no entry. All files must agree on
/// the field count.
pub fn load_label_folder(dir: &Path, label_files: &[String]) -> Result<LabelSet, LabelError> {
    let mut schema: Option<RecordSchema> = None;
    let mut images = BTreeMap::new();

    for name in label_files {
        let path = dir.join(name);
        let text = std::fs::read_to_string(&path).map_err(|e| LabelError::io(&path, e))?;
        let Some((file_schema, records)) = parse_label_text(&text, &path)? else {
            log::debug!("Skipping empty label file {}", path.display());
            continue;
        };

        match schema {
            None => schema = Some(file_schema),
            Some(expected) if expected != file_schema => {
                return Err(LabelError::SchemaMismatch {
                    expected,
                    found: file_schema,
                    context: path.display().to_string(),
                });
            }
            Some(_) => {}
        }

        let image_id = Path::new(name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(name)
            .to_string();
        log::debug!("Parsed {} detections for image '{image_id}'", records.len());
        images.insert(image_id, records);
    }

    Ok(LabelSet::from_parts(schema.unwrap_or_default(), images))
}

/// Parse the content of one label file.
///
/// Returns `None` when the file holds no non-blank line. `path` is only used
/// for error reporting.
pub fn parse_label_text(
    text: &str,
    path: &Path,
) -> Result<Option<(RecordSchema, Vec<DetectionRecord>)>, LabelError> {
    let mut schema: Option<RecordSchema> = None;
    let mut records = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }

        let malformed = |reason: String| LabelError::MalformedLine {
            path: path.to_path_buf(),
            line: line_no,
            reason,
        };

        let line_schema = RecordSchema::from_field_count(tokens.len())
            .ok_or_else(|| malformed(format!("expected 5 or 6 fields, got {}", tokens.len())))?;
        match schema {
            None => schema = Some(line_schema),
            Some(expected) if expected != line_schema => {
                return Err(malformed(format!(
                    "expected {} fields like the previous lines, got {}",
                    expected.field_count(),
                    tokens.len()
                )));
            }
            Some(_) => {}
        }

        let class_id = parse_class_id(tokens[0]).ok_or_else(|| {
            malformed(format!("'{}' is not a valid class id", tokens[0]))
        })?;
        let mut values = [0f32; 5];
        for (slot, tok) in values.iter_mut().zip(&tokens[1..]) {
            *slot = tok
                .parse::<f32>()
                .map_err(|_| malformed(format!("'{tok}' is not a number")))?;
        }

        let record = DetectionRecord::new(class_id, values[0], values[1], values[2], values[3]);
        records.push(if line_schema.has_confidence() {
            record.with_confidence(values[4])
        } else {
            record
        });
    }

    Ok(schema.map(|s| (s, records)))
}

/// Class ids may be written as `3` or `3.0`.
fn parse_class_id(token: &str) -> Option<u32> {
    if let Ok(id) = token.parse::<u32>() {
        return Some(id);
    }
    let value = token.parse::<f64>().ok()?;
    float_to_class_id(value)
}

fn float_to_class_id(value: f64) -> Option<u32> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
        Some(value as u32)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Path B: single JSON annotation export
// ---------------------------------------------------------------------------

/// Load a COCO-style annotation/prediction export.
///
/// Expected JSON schema, either wrapped in `{"annotations": [...]}` or bare:
///
/// ```json
/// [
///   { "image_id": "frame_1", "category_id": 0, "bbox": [10, 20, 30, 40], "score": 0.9 },
///   ...
/// ]
/// ```
///
/// `bbox` is `[xmin, ymin, width, height]` in pixels of an image of
/// `image_shape = (width, height)`.
pub fn load_validation_json(path: &Path, image_shape: (u32, u32)) -> Result<LabelSet, LabelError> {
    let text = std::fs::read_to_string(path).map_err(|e| LabelError::io(path, e))?;
    let root: JsonValue = serde_json::from_str(&text).map_err(|source| LabelError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    parse_validation_json(&root, path, image_shape)
}

/// Convert an already parsed JSON export. `path` is only used for errors.
pub fn parse_validation_json(
    root: &JsonValue,
    path: &Path,
    image_shape: (u32, u32),
) -> Result<LabelSet, LabelError> {
    let (image_width, image_height) = image_shape;
    if image_width == 0 || image_height == 0 {
        return Err(LabelError::InvalidImageShape {
            width: image_width,
            height: image_height,
        });
    }

    let annotations = match root {
        JsonValue::Object(obj) => obj
            .get("annotations")
            .ok_or(LabelError::MissingField {
                index: 0,
                field: "annotations",
            })?
            .as_array()
            .ok_or_else(|| LabelError::UnknownJsonShape {
                path: path.to_path_buf(),
            })?,
        JsonValue::Array(list) => list,
        _ => {
            return Err(LabelError::UnknownJsonShape {
                path: path.to_path_buf(),
            })
        }
    };

    let (width, height) = (image_width as f64, image_height as f64);
    let mut schema: Option<RecordSchema> = None;
    let mut images: BTreeMap<String, Vec<DetectionRecord>> = BTreeMap::new();

    for (index, entry) in annotations.iter().enumerate() {
        let obj = entry.as_object().ok_or_else(|| LabelError::InvalidField {
            index,
            field: "annotation",
            reason: "not a JSON object".to_string(),
        })?;

        let [xmin, ymin, box_w, box_h] = bbox_field(obj, index)?;
        let class_id = class_id_field(obj, index)?;
        let image_id = image_id_field(obj, index)?;
        let score = score_field(obj, index)?;

        let mut record = DetectionRecord::new(
            class_id,
            ((xmin + box_w / 2.0) / width) as f32,
            ((ymin + box_h / 2.0) / height) as f32,
            (box_w / width) as f32,
            (box_h / height) as f32,
        );
        if let Some(score) = score {
            record = record.with_confidence(score);
        }

        match schema {
            None => schema = Some(record.schema()),
            Some(expected) if expected != record.schema() => {
                return Err(LabelError::SchemaMismatch {
                    expected,
                    found: record.schema(),
                    context: format!("{} (annotation {index})", path.display()),
                });
            }
            Some(_) => {}
        }

        images.entry(image_id).or_default().push(record);
    }

    Ok(LabelSet::from_parts(schema.unwrap_or_default(), images))
}

fn bbox_field(obj: &Map<String, JsonValue>, index: usize) -> Result<[f64; 4], LabelError> {
    let invalid = |reason: String| LabelError::InvalidField {
        index,
        field: "bbox",
        reason,
    };

    let arr = obj
        .get("bbox")
        .ok_or(LabelError::MissingField {
            index,
            field: "bbox",
        })?
        .as_array()
        .ok_or_else(|| invalid("not an array".to_string()))?;
    if arr.len() != 4 {
        return Err(invalid(format!("expected 4 values, got {}", arr.len())));
    }

    let mut out = [0f64; 4];
    for (j, (slot, v)) in out.iter_mut().zip(arr).enumerate() {
        *slot = v
            .as_f64()
            .ok_or_else(|| invalid(format!("bbox[{j}] is not a number")))?;
    }
    Ok(out)
}

fn class_id_field(obj: &Map<String, JsonValue>, index: usize) -> Result<u32, LabelError> {
    let value = obj.get("category_id").ok_or(LabelError::MissingField {
        index,
        field: "category_id",
    })?;
    value
        .as_u64()
        .and_then(|id| u32::try_from(id).ok())
        .or_else(|| value.as_f64().and_then(float_to_class_id))
        .ok_or_else(|| LabelError::InvalidField {
            index,
            field: "category_id",
            reason: format!("{value} is not a non-negative integer"),
        })
}

fn image_id_field(obj: &Map<String, JsonValue>, index: usize) -> Result<String, LabelError> {
    match obj.get("image_id") {
        Some(JsonValue::String(s)) => Ok(s.clone()),
        Some(JsonValue::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(LabelError::InvalidField {
            index,
            field: "image_id",
            reason: format!("{other} is neither a string nor a number"),
        }),
        None => Err(LabelError::MissingField {
            index,
            field: "image_id",
        }),
    }
}

fn score_field(obj: &Map<String, JsonValue>, index: usize) -> Result<Option<f32>, LabelError> {
    match obj.get("score") {
        None => Ok(None),
        Some(value) => value
            .as_f64()
            .map(|s| Some(s as f32))
            .ok_or_else(|| LabelError::InvalidField {
                index,
                field: "score",
                reason: format!("{value} is not a number"),
            }),
    }
}
