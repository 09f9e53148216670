//! Small file-system and collection helpers.

pub mod data_structure;
pub mod files;

pub use data_structure::flatten_groups;
pub use files::{copy_file, delete_file, FileError};
