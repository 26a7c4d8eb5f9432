//! Persisted tree grants.
//!
//! The store remembers which tree the user granted for each package. The OS
//! can revoke a grant silently, so a stored handle is only trusted after it
//! is cross-checked against the provider's persisted-permission list.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use crate::matcher::TreeMatcher;
use crate::provider::DocumentProvider;
use crate::uri::TreeUri;

/// Errors from grant store operations.
#[derive(Debug, thiserror::Error)]
pub enum GrantStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Remembers the granted tree per package.
pub trait GrantStore: Send + Sync {
    /// The stored tree for `package`, if any.
    fn tree(&self, package: &str) -> Option<TreeUri>;

    /// Stores `tree` as the grant for `package`.
    fn persist(&self, package: &str, tree: &TreeUri) -> Result<(), GrantStoreError>;

    /// Forgets the grant for `package`.
    fn clear(&self, package: &str) -> Result<(), GrantStoreError>;
}

/// Outcome of validating the stored grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantCheck {
    /// Stored and still held with read and write access.
    Live(TreeUri),
    /// Nothing stored for the package.
    Missing,
    /// Stored, but the OS no longer lists a read+write permission for it.
    Revoked(TreeUri),
}

/// Validates the stored grant for `package` against the OS permission list.
pub fn check_grant(
    store: &dyn GrantStore,
    provider: &dyn DocumentProvider,
    matcher: &dyn TreeMatcher,
    package: &str,
) -> GrantCheck {
    let Some(tree) = store.tree(package) else {
        return GrantCheck::Missing;
    };
    let live = provider
        .persisted_permissions()
        .iter()
        .any(|p| p.read && p.write && matcher.matches(&tree, &p.uri));
    if live {
        GrantCheck::Live(tree)
    } else {
        debug!(package, tree = %tree, "stored tree grant no longer held");
        GrantCheck::Revoked(tree)
    }
}

/// Accepts a tree returned by the picker if it is the expected directory
/// for `package`, persisting it. Returns whether it was accepted.
pub fn accept_picked_tree(
    store: &dyn GrantStore,
    matcher: &dyn TreeMatcher,
    package: &str,
    picked: &TreeUri,
) -> Result<bool, GrantStoreError> {
    let expected = TreeUri::for_package(package);
    if !matcher.matches(&expected, picked) {
        info!(package, picked = %picked, expected = %expected, "picked tree rejected");
        return Ok(false);
    }
    store.persist(package, picked)?;
    info!(package, tree = %picked, "tree grant persisted");
    Ok(true)
}

/// Collaborators needed to reach a granted document tree.
#[derive(Clone)]
pub struct DocumentAccess {
    pub provider: Arc<dyn DocumentProvider>,
    pub store: Arc<dyn GrantStore>,
    pub matcher: Arc<dyn TreeMatcher>,
}

impl DocumentAccess {
    pub fn new(
        provider: Arc<dyn DocumentProvider>,
        store: Arc<dyn GrantStore>,
        matcher: Arc<dyn TreeMatcher>,
    ) -> Self {
        Self {
            provider,
            store,
            matcher,
        }
    }

    /// Validates the stored grant for `package`. Blocking.
    pub fn check(&self, package: &str) -> GrantCheck {
        check_grant(
            self.store.as_ref(),
            self.provider.as_ref(),
            self.matcher.as_ref(),
            package,
        )
    }
}

/// In-memory grant store.
#[derive(Debug, Default)]
pub struct MemoryGrantStore {
    trees: RwLock<HashMap<String, TreeUri>>,
}

impl MemoryGrantStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GrantStore for MemoryGrantStore {
    fn tree(&self, package: &str) -> Option<TreeUri> {
        self.trees.read().unwrap().get(package).cloned()
    }

    fn persist(&self, package: &str, tree: &TreeUri) -> Result<(), GrantStoreError> {
        self.trees
            .write()
            .unwrap()
            .insert(package.to_string(), tree.clone());
        Ok(())
    }

    fn clear(&self, package: &str) -> Result<(), GrantStoreError> {
        self.trees.write().unwrap().remove(package);
        Ok(())
    }
}

/// Grant store persisted to a JSON file.
///
/// Grants are cached in memory and written back on every change.
pub struct JsonGrantStore {
    path: PathBuf,
    trees: RwLock<HashMap<String, TreeUri>>,
}

impl JsonGrantStore {
    /// Creates a store, loading existing grants from disk.
    pub fn new(path: PathBuf) -> Result<Self, GrantStoreError> {
        let trees = load_grants(&path)?;
        Ok(Self {
            path,
            trees: RwLock::new(trees),
        })
    }

    fn save(&self) -> Result<(), GrantStoreError> {
        let map = self.trees.read().unwrap();
        let json = serde_json::to_string_pretty(&*map)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, json)?;
        debug!("persisted {} grant(s) to {:?}", map.len(), self.path);
        Ok(())
    }
}

impl GrantStore for JsonGrantStore {
    fn tree(&self, package: &str) -> Option<TreeUri> {
        self.trees.read().unwrap().get(package).cloned()
    }

    fn persist(&self, package: &str, tree: &TreeUri) -> Result<(), GrantStoreError> {
        {
            let mut map = self.trees.write().unwrap();
            map.insert(package.to_string(), tree.clone());
        }
        self.save()
    }

    fn clear(&self, package: &str) -> Result<(), GrantStoreError> {
        {
            let mut map = self.trees.write().unwrap();
            map.remove(package);
        }
        self.save()
    }
}

fn load_grants(path: &Path) -> Result<HashMap<String, TreeUri>, GrantStoreError> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let data = std::fs::read_to_string(path)?;
    let trees: HashMap<String, TreeUri> = serde_json::from_str(&data)?;
    debug!("loaded {} grant(s) from {:?}", trees.len(), path);
    Ok(trees)
}
