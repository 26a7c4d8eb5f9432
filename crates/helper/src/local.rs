//! In-process helper for hosts where this process already has the access
//! the remote helper would provide (development machines, rooted test
//! devices running the tool as the target's UID).

use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::error::HelperError;
use crate::service::{FileHelper, HelperBinder, HelperFuture};

fn remote(op: &str, path: &Path, e: io::Error) -> HelperError {
    HelperError::Remote(format!("{op} {}: {e}", path.display()))
}

/// Performs helper operations directly with `tokio::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileHelper;

impl FileHelper for LocalFileHelper {
    fn mkdirs<'a>(&'a self, path: &'a Path) -> HelperFuture<'a, ()> {
        Box::pin(async move {
            tokio::fs::create_dir_all(path)
                .await
                .map_err(|e| remote("mkdirs", path, e))
        })
    }

    fn delete<'a>(&'a self, path: &'a Path) -> HelperFuture<'a, bool> {
        Box::pin(async move {
            match tokio::fs::remove_file(path).await {
                Ok(()) => Ok(true),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
                Err(e) => Err(remote("delete", path, e)),
            }
        })
    }

    fn copy_file<'a>(&'a self, src: &'a Path, dest: &'a Path) -> HelperFuture<'a, ()> {
        Box::pin(async move {
            let bytes = tokio::fs::copy(src, dest)
                .await
                .map_err(|e| remote("copy", dest, e))?;
            debug!(bytes, dest = %dest.display(), "local helper copied file");
            Ok(())
        })
    }
}

/// Binder that connects immediately to a [`LocalFileHelper`].
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalBinder;

impl HelperBinder for LocalBinder {
    fn is_reachable(&self) -> bool {
        true
    }

    fn permission_granted(&self) -> bool {
        true
    }

    fn bind(&self) -> HelperFuture<'_, Arc<dyn FileHelper>> {
        Box::pin(async { Ok(Arc::new(LocalFileHelper) as Arc<dyn FileHelper>) })
    }

    fn unbind(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_helper_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src.txt");
        std::fs::write(&src, b"hello").unwrap();
        let dir = tmp.path().join("a").join("b");
        let dest = dir.join("out.txt");

        let helper = LocalFileHelper;
        helper.mkdirs(&dir).await.unwrap();
        assert!(!helper.delete(&dest).await.unwrap());
        helper.copy_file(&src, &dest).await.unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"hello");
        assert!(helper.delete(&dest).await.unwrap());
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn copy_missing_source_is_remote_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = LocalFileHelper
            .copy_file(&tmp.path().join("nope"), &tmp.path().join("dest"))
            .await
            .unwrap_err();
        assert!(matches!(err, HelperError::Remote(_)));
    }
}
