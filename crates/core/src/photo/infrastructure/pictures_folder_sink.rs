use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::photo::domain::photo_sink::PhotoSink;
use crate::shared::constants::MAX_UNIQUE_NAME_ATTEMPTS;
use crate::shared::mirror_error::MirrorError;

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("failed to create pictures directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write photo to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no free file name for {0} in {1}")]
    NamesExhausted(String, PathBuf),
}

/// Saves photos into a pictures folder under a fixed base name.
///
/// Existing files are never overwritten: on collision the name gets a
/// ` (n)` suffix, e.g. `SimplePhoto (1).jpeg`.
pub struct PicturesFolderSink {
    dir: PathBuf,
    file_name: String,
}

impl PicturesFolderSink {
    pub fn new(dir: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            file_name: file_name.into(),
        }
    }

    /// Writes `bytes` under the first free name and returns the path used.
    pub fn save(&self, bytes: &[u8]) -> Result<PathBuf, PersistError> {
        fs::create_dir_all(&self.dir).map_err(|e| PersistError::CreateDir {
            path: self.dir.clone(),
            source: e,
        })?;

        for n in 0..MAX_UNIQUE_NAME_ATTEMPTS {
            let path = self.dir.join(candidate_name(&self.file_name, n));
            // create_new makes the existence check and the create one step
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return write_file(file, &path, bytes).map(|()| path),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(PersistError::Write { path, source: e }),
            }
        }

        Err(PersistError::NamesExhausted(
            self.file_name.clone(),
            self.dir.clone(),
        ))
    }
}

impl PhotoSink for PicturesFolderSink {
    type Output = PathBuf;

    fn deliver(&self, photo: &[u8]) -> Result<PathBuf, MirrorError> {
        let path = self.save(photo)?;
        log::info!("Photo saved to {}", path.display());
        Ok(path)
    }
}

fn write_file(mut file: fs::File, path: &Path, bytes: &[u8]) -> Result<(), PersistError> {
    let result = file.write_all(bytes).and_then(|()| file.flush());
    if let Err(e) = result {
        drop(file);
        let _ = fs::remove_file(path);
        return Err(PersistError::Write {
            path: path.to_path_buf(),
            source: e,
        });
    }
    Ok(())
}

/// `SimplePhoto.jpeg`, `SimplePhoto (1).jpeg`, `SimplePhoto (2).jpeg`, ...
fn candidate_name(file_name: &str, n: u32) -> String {
    if n == 0 {
        return file_name.to_string();
    }
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem} ({n}).{ext}"),
        None => format!("{stem} ({n})"),
    }
}
