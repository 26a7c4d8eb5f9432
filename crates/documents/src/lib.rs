//! Document-tree access for the persisted-grant mechanism.
//!
//! A document tree is an opaque, persistable handle to a directory subtree
//! that the user grants once through a picker and the OS may revoke at any
//! time. [`DocumentProvider`] abstracts the OS document API, [`GrantStore`]
//! remembers which tree was granted for each package, and [`TreeMatcher`]
//! decides whether two handles name the same logical directory.

pub mod grants;
pub mod local;
pub mod matcher;
pub mod provider;
pub mod uri;

pub use grants::{
    DocumentAccess, GrantCheck, GrantStore, GrantStoreError, JsonGrantStore, MemoryGrantStore,
    accept_picked_tree, check_grant,
};
pub use local::LocalDocumentProvider;
pub use matcher::{ExactMatch, NormalizedMatch, TreeMatcher};
pub use provider::{Document, DocumentKind, DocumentProvider, UriPermission};
pub use uri::TreeUri;
