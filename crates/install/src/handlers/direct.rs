use std::{fs, io};

use tracing::{debug, warn};
use transplant_paths::{PathStyle, display_form};

use super::CopyJob;
use crate::copy::{self, blocking};
use crate::error::InstallError;
use crate::messages;

/// Writes directly to the filesystem.
///
/// With [`PathStyle::Obfuscated`] the target path carries the zero-width
/// segment that slips past the scoped-storage check; with
/// [`PathStyle::Canonical`] it relies on the classic storage permission.
pub(crate) struct DirectWriteHandler {
    style: PathStyle,
}

impl DirectWriteHandler {
    pub fn new(style: PathStyle) -> Self {
        Self { style }
    }

    pub async fn install(&self, job: &CopyJob<'_>) -> Result<(), InstallError> {
        job.announce(messages::PREPARING);
        let target = job.target_dir.clone();
        let created = blocking(job.tracker, move || Ok(fs::create_dir_all(&target))).await?;
        if let Err(e) = created {
            warn!(style = ?self.style, error = %e, "creating target directory failed");
            return Err(InstallError::DirectoryCreateFailure(display_form(
                &job.target_dir,
            )));
        }

        job.announce(messages::COPYING);
        let dest = job.destination();
        job.announce(messages::REMOVING_EXISTING);
        let existing = dest.clone();
        let removed = blocking(job.tracker, move || match fs::remove_file(&existing) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        })
        .await?;
        if removed {
            debug!(dest = %display_form(&dest), "removed existing file");
        }

        let bytes = copy::copy_file(
            job.tracker,
            job.source.to_path_buf(),
            dest,
            job.chunk_size,
            job.cancel.clone(),
        )
        .await?;
        debug!(bytes, "direct write finished");
        job.announce(messages::COPY_SUCCESSFUL);
        Ok(())
    }
}
