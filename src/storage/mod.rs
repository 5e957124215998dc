//! File writer: output directory setup and collision-free saves.
//!
//! Deduplication relies on the filesystem, not an in-memory registry. Each
//! [`save`] call probes `stem.ext`, `stem_1.ext`, `stem_2.ext`, … and creates
//! the first name that does not exist yet.

mod filename;

pub use filename::{desired_filename, replace_extension, split_stem_extension};

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

/// The output directory could not be prepared. Fatal for the run.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The path exists but is not a directory.
    #[error("output path exists and is not a directory: {}", path.display())]
    NotADirectory {
        /// The offending path.
        path: PathBuf,
    },

    /// Creating the directory tree failed.
    #[error("cannot create output directory {}: {source}", path.display())]
    Create {
        /// The directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// One image could not be written. Recorded against that image only.
#[derive(Debug, Error)]
#[error("failed to write {}: {source}", path.display())]
pub struct FileWriteError {
    /// Path that was being written.
    pub path: PathBuf,
    /// Underlying I/O error.
    #[source]
    pub source: std::io::Error,
}

/// Creates `path` (and its parents) if needed.
///
/// # Errors
///
/// Returns [`DirectoryError`] when the path is an existing non-directory or
/// cannot be created (permissions, invalid path).
#[instrument(fields(path = %path.display()))]
pub async fn ensure_directory(path: &Path) -> Result<(), DirectoryError> {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => {
            debug!("output directory already exists");
            return Ok(());
        }
        Ok(_) => {
            return Err(DirectoryError::NotADirectory {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {}
    }

    fs::create_dir_all(path)
        .await
        .map_err(|source| DirectoryError::Create {
            path: path.to_path_buf(),
            source,
        })?;
    debug!("output directory created");
    Ok(())
}

/// Writes `bytes` into `directory` under `desired`, or the first free
/// `stem_N.ext` variant, and returns the path actually written.
///
/// Existing files are never overwritten: each candidate is opened with
/// `create_new`, so a name taken between probe and open moves on to the next
/// suffix.
///
/// # Errors
///
/// Returns [`FileWriteError`] when a candidate cannot be created for a reason
/// other than already existing, or when writing the bytes fails.
#[instrument(skip(bytes), fields(directory = %directory.display(), desired = %desired, len = bytes.len()))]
pub async fn save(bytes: &[u8], directory: &Path, desired: &str) -> Result<PathBuf, FileWriteError> {
    let (stem, extension) = split_stem_extension(desired);
    let mut suffix: u64 = 0;

    loop {
        let candidate = if suffix == 0 {
            directory.join(desired)
        } else {
            directory.join(format!("{stem}_{suffix}{extension}"))
        };

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
            .await
        {
            Ok(mut file) => {
                write_all(&mut file, bytes, &candidate).await?;
                debug!(path = %candidate.display(), "image written");
                return Ok(candidate);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                suffix += 1;
            }
            Err(source) => {
                return Err(FileWriteError {
                    path: candidate,
                    source,
                });
            }
        }
    }
}

async fn write_all(file: &mut fs::File, bytes: &[u8], path: &Path) -> Result<(), FileWriteError> {
    let to_error = |source| FileWriteError {
        path: path.to_path_buf(),
        source,
    };
    file.write_all(bytes).await.map_err(to_error)?;
    file.flush().await.map_err(to_error)?;
    Ok(())
}
