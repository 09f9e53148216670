//! Computer-vision dataset utilities.
//!
//! * [`datasets`] – YOLO label loading, filtering and export
//! * [`metrics`] – blurred-area confusion counts over binary masks
//! * [`helpers`] – group flattening and file copy/delete

pub mod datasets;
pub mod helpers;
pub mod metrics;
