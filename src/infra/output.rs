//! The generated site directory.

use std::{
    fs, io,
    path::{Component, Path, PathBuf},
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("`{0}` escapes the output directory")]
    InvalidPath(PathBuf),
    #[error("failed to write `{path}`: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to copy `{from}` to `{to}`: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to remove `{path}`: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Writes confined to one root directory.
#[derive(Debug, Clone)]
pub struct OutputDir {
    root: PathBuf,
}

impl OutputDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path for an output-relative one. Absolute paths and `..`
    /// segments are rejected.
    pub fn resolve(&self, relative: &Path) -> Result<PathBuf, OutputError> {
        if relative.is_absolute()
            || relative.components().any(|component| {
                matches!(
                    component,
                    Component::ParentDir | Component::Prefix(_) | Component::RootDir
                )
            })
        {
            return Err(OutputError::InvalidPath(relative.to_path_buf()));
        }

        Ok(self.root.join(relative))
    }

    pub fn exists(&self, relative: &Path) -> bool {
        self.resolve(relative)
            .map(|path| path.is_file())
            .unwrap_or(false)
    }

    /// Write a file, creating parent directories as needed.
    pub fn write(&self, relative: &Path, contents: impl AsRef<[u8]>) -> Result<PathBuf, OutputError> {
        let target = self.resolve(relative)?;
        let wrap = |source| OutputError::Write {
            path: target.clone(),
            source,
        };
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(wrap)?;
        }
        fs::write(&target, contents).map_err(wrap)?;
        Ok(target)
    }

    /// Copy an external file into the output tree.
    pub fn copy_from(&self, source: &Path, relative: &Path) -> Result<u64, OutputError> {
        let target = self.resolve(relative)?;
        let wrap = |err| OutputError::Copy {
            from: source.to_path_buf(),
            to: target.clone(),
            source: err,
        };
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(wrap)?;
        }
        fs::copy(source, &target).map_err(wrap)
    }

    /// Remove the whole directory. A missing directory counts as success;
    /// returns whether anything was removed.
    pub fn clean(&self) -> Result<bool, OutputError> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(OutputError::Remove {
                path: self.root.clone(),
                source: err,
            }),
        }
    }
}
