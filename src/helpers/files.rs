use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("Failed to {action} '{path}': {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to copy '{source_path}' to the destination: {destination}")]
    CopyVerification {
        source_path: PathBuf,
        destination: PathBuf,
    },
}

/// Remove a file. A file that is already gone is logged, not returned.
pub fn delete_file(path: &Path) -> Result<(), FileError> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            log::info!("{} has been deleted.", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::error!("{} does not exist.", path.display());
            Ok(())
        }
        Err(source) => {
            log::error!("Failed to remove file '{}': {source}", path.display());
            Err(FileError::Io {
                action: "remove file",
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

/// Copy `input_root + relative` to `output_root + relative`.
///
/// Roots are joined by plain concatenation, not `Path::join`, so mount
/// prefixes of blob storage paths are kept untouched. Returns `false` when the
/// source does not exist.
pub fn copy_file(relative: &str, input_root: &str, output_root: &str) -> Result<bool, FileError> {
    let source_path = PathBuf::from(format!("{input_root}{relative}"));
    let destination = PathBuf::from(format!("{output_root}{relative}"));

    log::info!(
        "Copying {} to {}..",
        source_path.display(),
        destination.display()
    );
    if !source_path.exists() {
        log::info!("Source file '{}' does not exist.", source_path.display());
        return Ok(false);
    }

    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent).map_err(|source| FileError::Io {
            action: "create directory",
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::copy(&source_path, &destination).map_err(|source| FileError::Io {
        action: "copy file",
        path: source_path.clone(),
        source,
    })?;

    if !destination.exists() {
        log::error!(
            "Failed to move file '{}' to the destination: {}",
            source_path.display(),
            destination.display()
        );
        return Err(FileError::CopyVerification {
            source_path,
            destination,
        });
    }
    log::debug!(
        "File '{}' copied to '{}'",
        source_path.display(),
        destination.display()
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root(dir: &Path) -> String {
        format!("{}/", dir.display())
    }

    #[test]
    fn copies_into_nested_destination() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(input.path().join("frames")).unwrap();
        std::fs::write(input.path().join("frames/0001.jpg"), b"pixels").unwrap();

        let copied = copy_file(
            "frames/0001.jpg",
            &root(input.path()),
            &root(&output.path().join("out")),
        )
        .unwrap();
        assert!(copied);
        let bytes = std::fs::read(output.path().join("out/frames/0001.jpg")).unwrap();
        assert_eq!(bytes, b"pixels");
    }

    #[test]
    fn missing_source_is_not_an_error() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let copied = copy_file("nope.jpg", &root(input.path()), &root(output.path())).unwrap();
        assert!(!copied);
        assert!(!output.path().join("nope.jpg").exists());
    }

    #[test]
    fn delete_removes_file_and_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        std::fs::write(&path, b"x").unwrap();

        delete_file(&path).unwrap();
        assert!(!path.exists());
        delete_file(&path).unwrap();
    }

    #[test]
    fn delete_reports_other_failures() {
        let dir = tempfile::tempdir().unwrap();
        let err = delete_file(dir.path()).unwrap_err();
        assert!(matches!(err, FileError::Io { .. }));
    }
}
