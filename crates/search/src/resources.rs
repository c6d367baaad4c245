//! Access to mapping and template resources contributed by modules.
//!
//! A module is identified by a dotted name such as `records.mappings`.
//! [`ResourceLoader`] lists and locates the files a module ships; the
//! registry only ever sees resolved file paths afterwards.

use std::fmt::Debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{ResourceError, SearchResult};

/// Resource access for dotted module names.
pub trait ResourceLoader: Debug + Send + Sync {
    /// Lists the entry names of `path` inside `module`.
    ///
    /// Fails with [`io::ErrorKind::NotFound`] when the directory is absent.
    fn list_dir(&self, module: &str, path: &Path) -> io::Result<Vec<String>>;

    /// Returns true if `path` inside `module` is a directory.
    fn is_dir(&self, module: &str, path: &Path) -> bool;

    /// Returns the filesystem path of `path` inside `module`.
    fn resource_path(&self, module: &str, path: &Path) -> PathBuf;
}

/// Resolves modules to directories below a root directory.
///
/// `records.mappings.v7` maps to `{root}/records/mappings/v7`.
#[derive(Debug, Clone)]
pub struct DirectoryResources {
    root: PathBuf,
}

impl DirectoryResources {
    /// Creates a loader rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn module_dir(&self, module: &str) -> PathBuf {
        module
            .split('.')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |dir, segment| dir.join(segment))
    }
}

impl ResourceLoader for DirectoryResources {
    fn list_dir(&self, module: &str, path: &Path) -> io::Result<Vec<String>> {
        let dir = self.module_dir(module).join(path);
        let mut names = fs::read_dir(&dir)?
            .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<io::Result<Vec<_>>>()?;
        names.sort();
        Ok(names)
    }

    fn is_dir(&self, module: &str, path: &Path) -> bool {
        self.module_dir(module).join(path).is_dir()
    }

    fn resource_path(&self, module: &str, path: &Path) -> PathBuf {
        self.module_dir(module).join(path)
    }
}

/// Reads a mapping or template file into a string.
pub fn read_resource(path: &Path) -> SearchResult<String> {
    fs::read_to_string(path).map_err(|source| {
        ResourceError::Read {
            path: path.to_path_buf(),
            source,
        }
        .into()
    })
}

/// Parses JSON text read from `path`.
pub fn parse_json(path: &Path, text: &str) -> SearchResult<Value> {
    serde_json::from_str(text).map_err(|source| {
        ResourceError::Parse {
            path: path.to_path_buf(),
            source,
        }
        .into()
    })
}

/// Reads and parses a JSON resource file.
pub fn load_json(path: &Path) -> SearchResult<Value> {
    let text = read_resource(path)?;
    parse_json(path, &text)
}
