//! Privileged copy handlers, one per mechanism.
//!
//! Each handler performs the same sequence: prepare the target directory,
//! remove any existing destination, copy the bytes. Every stage is announced
//! on the progress sink before it runs.

mod direct;
mod document;
mod helper;
mod root;

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use transplant_progress::ProgressSink;

pub(crate) use direct::DirectWriteHandler;
pub(crate) use document::DocumentTreeHandler;
pub(crate) use helper::HelperHandler;
pub(crate) use root::RootShellHandler;

/// Inputs shared by every handler.
pub(crate) struct CopyJob<'a> {
    pub source: &'a Path,
    pub file_name: &'a str,
    pub package: &'a str,
    /// Target directory for path-based mechanisms.
    pub target_dir: PathBuf,
    pub progress: &'a dyn ProgressSink,
    pub cancel: &'a CancellationToken,
    /// Blocking work spawned for this job. The dispatcher waits on it before
    /// releasing the job, including after cancellation.
    pub tracker: &'a TaskTracker,
    pub chunk_size: usize,
}

impl CopyJob<'_> {
    pub fn destination(&self) -> PathBuf {
        self.target_dir.join(self.file_name)
    }

    pub fn announce(&self, message: &str) {
        self.progress.emit(message);
    }
}
