//! Filesystem-backed document provider.
//!
//! Maps granted tree handles onto local directories and behaves like the OS
//! provider where it matters: creation picks `name (1)` when the requested
//! name is taken, and revoked trees stop resolving.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::debug;

use crate::provider::{Document, DocumentKind, DocumentProvider, UriPermission};
use crate::uri::TreeUri;

#[derive(Debug, Clone)]
struct LocalGrant {
    root: PathBuf,
    read: bool,
    write: bool,
}

/// Document provider over local directories.
#[derive(Debug, Default)]
pub struct LocalDocumentProvider {
    grants: RwLock<HashMap<TreeUri, LocalGrant>>,
}

impl LocalDocumentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants `tree`, backed by the directory `root`.
    pub fn grant(&self, tree: &TreeUri, root: &Path, read: bool, write: bool) {
        self.grants.write().unwrap().insert(
            tree.clone(),
            LocalGrant {
                root: root.to_path_buf(),
                read,
                write,
            },
        );
    }

    /// Drops the grant for `tree`, as the OS does on revocation.
    pub fn revoke(&self, tree: &TreeUri) {
        self.grants.write().unwrap().remove(tree);
    }

    fn entry(path: PathBuf) -> io::Result<Document> {
        let meta = fs::symlink_metadata(&path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Document {
            id: path.to_string_lossy().into_owned(),
            name,
            kind: if meta.is_dir() {
                DocumentKind::Directory
            } else {
                DocumentKind::File
            },
        })
    }

    /// First free name in `dir`: `name`, then `stem (1).ext`, `stem (2).ext`…
    fn unique_path(dir: &Path, name: &str) -> PathBuf {
        let candidate = dir.join(name);
        if fs::symlink_metadata(&candidate).is_err() {
            return candidate;
        }
        let (stem, ext) = match name.rfind('.') {
            Some(i) if i > 0 => (&name[..i], &name[i..]),
            _ => (name, ""),
        };
        (1..)
            .map(|n| dir.join(format!("{stem} ({n}){ext}")))
            .find(|p| fs::symlink_metadata(p).is_err())
            .unwrap_or(candidate)
    }

    fn require_dir(parent: &Document) -> io::Result<&Path> {
        if !parent.is_directory() {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("{} is not a directory", parent.name),
            ));
        }
        Ok(Path::new(&parent.id))
    }
}

impl DocumentProvider for LocalDocumentProvider {
    fn persisted_permissions(&self) -> Vec<UriPermission> {
        self.grants
            .read()
            .unwrap()
            .iter()
            .map(|(uri, g)| UriPermission {
                uri: uri.clone(),
                read: g.read,
                write: g.write,
            })
            .collect()
    }

    fn open_tree(&self, tree: &TreeUri) -> io::Result<Option<Document>> {
        let Some(grant) = self.grants.read().unwrap().get(tree).cloned() else {
            return Ok(None);
        };
        match Self::entry(grant.root) {
            Ok(doc) if doc.is_directory() => Ok(Some(doc)),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn find(&self, parent: &Document, name: &str) -> io::Result<Option<Document>> {
        let dir = Self::require_dir(parent)?;
        match Self::entry(dir.join(name)) {
            Ok(doc) => Ok(Some(doc)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn create_directory(&self, parent: &Document, name: &str) -> io::Result<Option<Document>> {
        let dir = Self::require_dir(parent)?;
        let path = Self::unique_path(dir, name);
        fs::create_dir(&path)?;
        debug!(path = %path.display(), "created directory document");
        Self::entry(path).map(Some)
    }

    fn create_file(
        &self,
        parent: &Document,
        _mime_type: &str,
        name: &str,
    ) -> io::Result<Option<Document>> {
        let dir = Self::require_dir(parent)?;
        let path = Self::unique_path(dir, name);
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)?;
        debug!(path = %path.display(), "created file document");
        Self::entry(path).map(Some)
    }

    fn delete(&self, document: &Document) -> io::Result<bool> {
        let path = Path::new(&document.id);
        let result = if document.is_directory() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        match result {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn open_write(&self, document: &Document) -> io::Result<Box<dyn Write + Send>> {
        let file = fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&document.id)?;
        Ok(Box::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_with_root() -> (tempfile::TempDir, LocalDocumentProvider, Document) {
        let tmp = tempfile::tempdir().unwrap();
        let tree = TreeUri::for_package("com.example.game");
        let provider = LocalDocumentProvider::new();
        provider.grant(&tree, tmp.path(), true, true);
        let root = provider.open_tree(&tree).unwrap().unwrap();
        (tmp, provider, root)
    }

    #[test]
    fn open_tree_requires_grant() {
        let provider = LocalDocumentProvider::new();
        let tree = TreeUri::for_package("com.example.game");
        assert_eq!(provider.open_tree(&tree).unwrap(), None);
    }

    #[test]
    fn create_file_never_overwrites() {
        let (tmp, provider, root) = provider_with_root();
        let first = provider
            .create_file(&root, "application/json", "ja.json")
            .unwrap()
            .unwrap();
        let second = provider
            .create_file(&root, "application/json", "ja.json")
            .unwrap()
            .unwrap();

        assert_eq!(first.name, "ja.json");
        assert_eq!(second.name, "ja (1).json");
        assert!(tmp.path().join("ja (1).json").exists());
    }

    #[test]
    fn find_reports_kind() {
        let (tmp, provider, root) = provider_with_root();
        fs::write(tmp.path().join("files"), b"oops").unwrap();
        fs::create_dir(tmp.path().join("cache")).unwrap();

        let file = provider.find(&root, "files").unwrap().unwrap();
        assert_eq!(file.kind, DocumentKind::File);
        let dir = provider.find(&root, "cache").unwrap().unwrap();
        assert!(dir.is_directory());
        assert_eq!(provider.find(&root, "missing").unwrap(), None);
    }

    #[test]
    fn write_and_delete() {
        let (tmp, provider, root) = provider_with_root();
        let doc = provider.create_file(&root, "text/plain", "a.txt").unwrap().unwrap();
        {
            let mut w = provider.open_write(&doc).unwrap();
            w.write_all(b"content").unwrap();
        }
        assert_eq!(fs::read(tmp.path().join("a.txt")).unwrap(), b"content");
        assert!(provider.delete(&doc).unwrap());
        assert!(!provider.delete(&doc).unwrap());
    }

    #[test]
    fn file_parent_is_rejected() {
        let (_tmp, provider, root) = provider_with_root();
        let doc = provider.create_file(&root, "text/plain", "a.txt").unwrap().unwrap();
        let err = provider.create_directory(&doc, "child").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotADirectory);
    }
}
