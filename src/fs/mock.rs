// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

#[derive(Debug, Clone)]
pub enum MockEntry {
    File { modified: SystemTime, readable: bool },
    Dir(Vec<String>), // List of child names
}

/// In-memory filesystem with settable modification times.
///
/// Clones share the same underlying tree, so a test can keep one handle to
/// mutate files while the code under test holds another.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
}

fn parent_or_dot(path: &Path) -> Option<&Path> {
    path.parent().map(|parent| {
        if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        }
    })
}

fn child_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut files = HashMap::new();
        // Ensure root exists
        files.insert(PathBuf::from("."), MockEntry::Dir(Vec::new()));

        Self {
            files: Arc::new(Mutex::new(files)),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<PathBuf, MockEntry>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create or overwrite a file with the given modification time.
    pub fn add_file(&self, path: impl AsRef<Path>, modified: SystemTime) {
        let path = path.as_ref().to_path_buf();
        let mut files = self.entries();
        files.insert(
            path.clone(),
            MockEntry::File {
                modified,
                readable: true,
            },
        );
        Self::link_into_parent(&mut files, &path);
    }

    /// Create an (empty) directory and its parents.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut files = self.entries();
        Self::ensure_dir_entry(&mut files, path.as_ref());
    }

    /// Set a new modification time on an existing file.
    pub fn touch(&self, path: impl AsRef<Path>, modified: SystemTime) {
        self.add_file(path, modified);
    }

    /// Remove a file (or directory entry) from the tree.
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut files = self.entries();
        files.remove(path);
        if let (Some(parent), Some(name)) = (parent_or_dot(path), child_name(path)) {
            if let Some(MockEntry::Dir(children)) = files.get_mut(parent) {
                children.retain(|c| c != &name);
            }
        }
    }

    /// Make `modified` fail with `PermissionDenied` for this file.
    pub fn deny(&self, path: impl AsRef<Path>) {
        let mut files = self.entries();
        if let Some(MockEntry::File { readable, .. }) = files.get_mut(path.as_ref()) {
            *readable = false;
        }
    }

    fn link_into_parent(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        // Ensure parent directories exist implicitly for simplicity in this mock
        if let Some(parent) = parent_or_dot(path) {
            if parent == path {
                return;
            }
            Self::ensure_dir_entry(files, parent);
            if let (Some(MockEntry::Dir(children)), Some(name)) =
                (files.get_mut(parent), child_name(path))
            {
                if !children.contains(&name) {
                    children.push(name);
                }
            }
        }
    }

    fn ensure_dir_entry(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        if !files.contains_key(path) {
            files.insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
            Self::link_into_parent(files, path);
        }
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.entries().contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.entries().get(path), Some(MockEntry::Dir(_)))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let files = self.entries();
        match files.get(path) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        match self.entries().get(path) {
            Some(MockEntry::File { readable: false, .. }) => Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("permission denied: {:?}", path),
            )),
            Some(MockEntry::File { modified, .. }) => Ok(*modified),
            Some(MockEntry::Dir(_)) => Ok(SystemTime::UNIX_EPOCH),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )),
        }
    }
}
