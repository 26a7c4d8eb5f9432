//! OS document API abstraction.

use std::io::{self, Write};

use crate::uri::TreeUri;

/// A persisted URI permission as reported by the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriPermission {
    pub uri: TreeUri,
    pub read: bool,
    pub write: bool,
}

/// Kind of a document entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Directory,
    File,
}

/// Handle to one entry inside a granted tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Provider-specific document id.
    pub id: String,
    /// Display name.
    pub name: String,
    pub kind: DocumentKind,
}

impl Document {
    pub fn is_directory(&self) -> bool {
        self.kind == DocumentKind::Directory
    }
}

/// Blocking document operations.
///
/// Mirrors the OS document API: creation may pick a different name when the
/// requested one is taken, and there is no overwrite primitive.
pub trait DocumentProvider: Send + Sync {
    /// Persisted permissions currently held by the app.
    fn persisted_permissions(&self) -> Vec<UriPermission>;

    /// Resolves a tree handle to its root directory, or `None` if the tree no
    /// longer exists.
    fn open_tree(&self, tree: &TreeUri) -> io::Result<Option<Document>>;

    /// Finds a direct child of `parent` by name.
    fn find(&self, parent: &Document, name: &str) -> io::Result<Option<Document>>;

    /// Creates a child directory. `None` if the provider refused.
    fn create_directory(&self, parent: &Document, name: &str) -> io::Result<Option<Document>>;

    /// Creates an empty child file. `None` if the provider refused.
    fn create_file(&self, parent: &Document, mime_type: &str, name: &str)
    -> io::Result<Option<Document>>;

    /// Deletes a document (recursively for directories).
    fn delete(&self, document: &Document) -> io::Result<bool>;

    /// Opens a file document for writing from the start.
    fn open_write(&self, document: &Document) -> io::Result<Box<dyn Write + Send>>;
}
