//! Label datasets: parsing, model, filtering and export.
//!
//! Architecture:
//! ```text
//!  labels/*.txt    predictions.json
//!        │               │
//!        ▼               ▼
//!   ┌──────────────────────┐
//!   │        loader        │  parse → LabelSet
//!   └──────────────────────┘
//!              │
//!              ▼
//!   ┌──────────────────────┐
//!   │  YoloLabelsDataset   │  full set + working set
//!   └──────────────────────┘
//!              │
//!              ▼
//!   ┌──────────────────────┐
//!   │        filter        │  class / size / confidence → LabelSet
//!   └──────────────────────┘
//!              │
//!              ▼
//!   ┌──────────────────────┐
//!   │        export        │  CSV / Parquet
//!   └──────────────────────┘
//! ```

pub mod error;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
mod yolo_labels;

pub use error::LabelError;
pub use filter::{AreaInterval, ClassSelection};
pub use model::{DetectionRecord, LabelSet, RecordSchema};
pub use yolo_labels::{LabelSource, YoloLabelsDataset};
