//! Content-tree URIs.

use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};

/// Authority of the external storage document provider.
pub const EXTERNAL_STORAGE_AUTHORITY: &str = "com.android.externalstorage.documents";

/// Characters left unescaped in a document id, matching `Uri.encode`.
const DOCUMENT_ID: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'-')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Opaque handle to a granted directory tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeUri(String);

impl TreeUri {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// Tree URI of `Android/data/<package>` on primary storage.
    pub fn for_package(package: &str) -> Self {
        let document_id = format!("primary:Android/data/{package}");
        Self(format!(
            "content://{EXTERNAL_STORAGE_AUTHORITY}/tree/{}",
            utf8_percent_encode(&document_id, DOCUMENT_ID)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TreeUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TreeUri {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
