//! Grid artifact storage under the configured storage root.
//!
//! Generated GPX documents land in `{root}/grids/`. Writes go through a
//! temp file and a rename, so the published name either holds a complete
//! document or does not exist; the static file route never serves a
//! half-written artifact.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;

/// Subdirectory of the storage root that holds generated grid files.
const GRIDS_SUBDIR: &str = "grids";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid grid file name '{0}'")]
    InvalidFilename(String),

    #[error("storage i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of a grid file write.
#[derive(Debug)]
pub struct StoredGrid {
    /// Final on-disk path of the document.
    pub path: PathBuf,
    /// True when the write replaced an artifact already published under
    /// this name, e.g. a same-day regeneration for the same surname.
    pub replaced: bool,
}

/// Filesystem store for generated grid artifacts. Cheap to clone; handlers
/// receive it through application state, never through a global.
#[derive(Debug, Clone)]
pub struct GridStore {
    root: PathBuf,
}

impl GridStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Public URL path of a stored grid file, as served by the static file
    /// route mounted on the storage root.
    #[must_use]
    pub fn public_path(filename: &str) -> String {
        format!("/files/{GRIDS_SUBDIR}/{filename}")
    }

    /// Creates the grids directory if missing. Called once at startup.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory cannot be created.
    pub async fn ensure_layout(&self) -> Result<(), StorageError> {
        fs::create_dir_all(self.root.join(GRIDS_SUBDIR)).await?;
        Ok(())
    }

    /// Writes a grid file. Rewrites of the same name replace the previous
    /// document in place; the returned [`StoredGrid`] says whether that
    /// happened, so a caller rolling back a failed reference update knows
    /// whether the name was already published.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidFilename`] for names that would escape
    /// the grids directory, [`StorageError::Io`] on write failure.
    pub async fn store_grid_file(
        &self,
        filename: &str,
        contents: &[u8],
    ) -> Result<StoredGrid, StorageError> {
        validate_filename(filename)?;
        let dir = self.root.join(GRIDS_SUBDIR);
        fs::create_dir_all(&dir).await?;

        let tmp_path = dir.join(format!("{filename}.tmp"));
        let final_path = dir.join(filename);
        let replaced = fs::metadata(&final_path).await.is_ok();
        fs::write(&tmp_path, contents).await?;
        fs::rename(&tmp_path, &final_path).await?;
        Ok(StoredGrid {
            path: final_path,
            replaced,
        })
    }

    /// Removes a stored grid file. A missing file counts as removed: this
    /// runs as rollback for a freshly created file after a failed database
    /// update.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidFilename`] for names that would escape
    /// the grids directory, [`StorageError::Io`] on other failures.
    pub async fn remove_grid_file(&self, filename: &str) -> Result<(), StorageError> {
        validate_filename(filename)?;
        match fs::remove_file(self.root.join(GRIDS_SUBDIR).join(filename)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}

// Generated filenames are already transliterated down to ASCII, but the API
// takes any &str, so separators and dot-names are rejected here.
fn validate_filename(filename: &str) -> Result<(), StorageError> {
    let valid = !filename.is_empty()
        && !filename.contains(['/', '\\'])
        && filename != "."
        && filename != "..";
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidFilename(filename.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_and_overwrites_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = GridStore::new(dir.path());

        let first = store
            .store_grid_file("shevchenko_2025-08-10.gpx", b"<gpx one/>")
            .await
            .expect("first write");
        assert!(!first.replaced);
        assert_eq!(fs::read(&first.path).await.expect("read back"), b"<gpx one/>");

        let second = store
            .store_grid_file("shevchenko_2025-08-10.gpx", b"<gpx two/>")
            .await
            .expect("second write");
        assert!(second.replaced, "second write lands on the published name");
        assert_eq!(fs::read(&second.path).await.expect("read back"), b"<gpx two/>");

        // The temp file must not survive the rename.
        let tmp = dir.path().join("grids/shevchenko_2025-08-10.gpx.tmp");
        assert!(!tmp.exists());
    }

    #[tokio::test]
    async fn rejects_names_that_escape_the_grids_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = GridStore::new(dir.path());

        for bad in ["../evil.gpx", "nested/evil.gpx", "..", ""] {
            let err = store
                .store_grid_file(bad, b"x")
                .await
                .expect_err("name should be rejected");
            assert!(matches!(err, StorageError::InvalidFilename(_)), "{bad}");
        }
    }

    #[tokio::test]
    async fn removing_a_missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = GridStore::new(dir.path());

        store
            .remove_grid_file("never-written.gpx")
            .await
            .expect("missing file should be fine");
    }

    #[test]
    fn public_path_points_under_the_files_route() {
        assert_eq!(
            GridStore::public_path("doe_2025-08-10.gpx"),
            "/files/grids/doe_2025-08-10.gpx"
        );
    }
}
