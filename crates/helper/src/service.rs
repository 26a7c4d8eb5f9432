//! Traits implemented by the platform bridge to the helper process.
//!
//! Using traits keeps install logic decoupled from the actual IPC transport
//! and testable with mocks.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::HelperError;

/// Boxed future returned by helper calls.
pub type HelperFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, HelperError>> + Send + 'a>>;

/// Remote file operations exposed by a bound helper.
pub trait FileHelper: Send + Sync {
    /// Creates `path` and any missing parents.
    fn mkdirs<'a>(&'a self, path: &'a Path) -> HelperFuture<'a, ()>;

    /// Deletes the file at `path`. Resolves to `false` if nothing was there.
    fn delete<'a>(&'a self, path: &'a Path) -> HelperFuture<'a, bool>;

    /// Copies `src` to `dest`.
    fn copy_file<'a>(&'a self, src: &'a Path, dest: &'a Path) -> HelperFuture<'a, ()>;
}

/// Bind/unbind lifecycle of the helper service.
pub trait HelperBinder: Send + Sync {
    /// Whether the helper's binder is alive, without binding to it.
    fn is_reachable(&self) -> bool;

    /// Whether the OS granted this app the helper permission.
    fn permission_granted(&self) -> bool;

    /// Binds to the helper. Resolves once the service is connected or the
    /// bind fails.
    fn bind(&self) -> HelperFuture<'_, Arc<dyn FileHelper>>;

    /// Releases the binding.
    fn unbind(&self);
}
