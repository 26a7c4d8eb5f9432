//! Chunked, cancellable byte copies.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::debug;

use crate::error::InstallError;

/// Copies `reader` into `writer` chunk by chunk, checking `cancel` before
/// each chunk. Returns the number of bytes copied.
pub(crate) fn copy_chunks(
    reader: &mut dyn Read,
    writer: &mut dyn Write,
    chunk_size: usize,
    cancel: &CancellationToken,
) -> Result<u64, InstallError> {
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut total = 0u64;
    loop {
        if cancel.is_cancelled() {
            return Err(InstallError::Cancelled);
        }
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        writer.write_all(&buf[..n])?;
        total += n as u64;
    }
    writer.flush()?;
    Ok(total)
}

fn copy_file_blocking(
    source: &Path,
    dest: &Path,
    chunk_size: usize,
    cancel: &CancellationToken,
) -> Result<u64, InstallError> {
    let mut reader = File::open(source)?;
    let mut writer = File::create(dest)?;
    let result = copy_chunks(&mut reader, &mut writer, chunk_size, cancel)
        .and_then(|n| writer.sync_all().map(|_| n).map_err(InstallError::from));
    if result.is_err() {
        drop(writer);
        if let Err(e) = fs::remove_file(dest) {
            debug!(dest = %dest.display(), error = %e, "could not remove partial file");
        } else {
            debug!(dest = %dest.display(), "removed partial file");
        }
    }
    result
}

/// Copies `source` to `dest` on the blocking pool.
///
/// A cancelled or failed copy removes the partially written destination.
/// The copy keeps running when the returned future is dropped; `tracker`
/// lets the owner wait for it.
pub(crate) async fn copy_file(
    tracker: &TaskTracker,
    source: PathBuf,
    dest: PathBuf,
    chunk_size: usize,
    cancel: CancellationToken,
) -> Result<u64, InstallError> {
    blocking(tracker, move || {
        copy_file_blocking(&source, &dest, chunk_size, &cancel)
    })
    .await
}

/// Runs a blocking closure on the blocking pool, tracked by `tracker`.
pub(crate) async fn blocking<T, F>(tracker: &TaskTracker, f: F) -> Result<T, InstallError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, InstallError> + Send + 'static,
{
    tracker
        .spawn_blocking(f)
        .await
        .map_err(|e| InstallError::IoFailure(io::Error::other(e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn copies_across_chunks() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src.json");
        let dest = tmp.path().join("dest.json");
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(&src, &data).unwrap();

        let tracker = TaskTracker::new();
        let n = copy_file(&tracker, src, dest.clone(), 1000, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(n, data.len() as u64);
        assert_eq!(fs::read(dest).unwrap(), data);
    }

    #[tokio::test]
    async fn cancelled_copy_leaves_no_file() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src.json");
        let dest = tmp.path().join("dest.json");
        fs::write(&src, b"{}").unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let tracker = TaskTracker::new();
        let err = copy_file(&tracker, src, dest.clone(), 1000, cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn missing_source_is_io_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let err = copy_file(
            &TaskTracker::new(),
            tmp.path().join("absent"),
            tmp.path().join("dest"),
            1000,
            CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, InstallError::IoFailure(_)));
    }

    #[tokio::test]
    async fn abandoned_copy_is_still_tracked() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src.json");
        let dest = tmp.path().join("dest.json");
        fs::write(&src, vec![7u8; 4096]).unwrap();
        let tracker = TaskTracker::new();

        let copy = copy_file(&tracker, src, dest.clone(), 1, CancellationToken::new());
        // Polling once spawns the task; dropping the future abandons it.
        let _ = tokio::time::timeout(std::time::Duration::ZERO, copy).await;
        tracker.close();
        tracker.wait().await;

        assert_eq!(fs::read(dest).unwrap().len(), 4096);
    }
}
