use std::fs::File;
use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use transplant_documents::{Document, DocumentAccess, DocumentProvider, GrantCheck};
use transplant_paths::TARGET_SEGMENTS;

use super::CopyJob;
use crate::copy::{self, blocking};
use crate::error::InstallError;
use crate::messages;

/// Writes through the document API of a persisted tree grant.
///
/// The provider cannot overwrite, so an existing destination is deleted
/// first. Provider calls block and run on the blocking pool.
pub(crate) struct DocumentTreeHandler {
    access: DocumentAccess,
}

impl DocumentTreeHandler {
    pub fn new(access: DocumentAccess) -> Self {
        Self { access }
    }

    pub async fn install(&self, job: &CopyJob<'_>) -> Result<(), InstallError> {
        job.announce(messages::CHECKING_ACCESS);
        let access = self.access.clone();
        let package = job.package.to_string();
        let root = blocking(job.tracker, move || open_granted_root(&access, &package)).await?;

        job.announce(messages::PREPARING);
        let mut dir = root;
        for segment in TARGET_SEGMENTS {
            let provider = self.access.provider.clone();
            let parent = dir.clone();
            let found =
                blocking(job.tracker, move || Ok(provider.find(&parent, segment)?)).await?;
            if let Some(conflict) = found.as_ref().filter(|d| !d.is_directory()) {
                job.announce(messages::REPLACING_CONFLICT);
                warn!(name = %conflict.name, "non-directory entry in the way, replacing");
            }
            let provider = self.access.provider.clone();
            let parent = dir;
            dir = blocking(job.tracker, move || {
                ensure_directory(provider.as_ref(), &parent, found, segment)
            })
            .await?;
        }

        job.announce(messages::COPYING);
        let provider = self.access.provider.clone();
        let parent = dir.clone();
        let name = job.file_name.to_string();
        let existing = blocking(job.tracker, move || Ok(provider.find(&parent, &name)?)).await?;

        job.announce(messages::REMOVING_EXISTING);
        if let Some(existing) = existing {
            let provider = self.access.provider.clone();
            blocking(job.tracker, move || Ok(provider.delete(&existing)?)).await?;
            debug!(name = job.file_name, "deleted existing document");
        }

        let provider = self.access.provider.clone();
        let source = job.source.to_path_buf();
        let name = job.file_name.to_string();
        let cancel = job.cancel.clone();
        let chunk_size = job.chunk_size;
        let bytes = blocking(job.tracker, move || {
            write_document(provider.as_ref(), &dir, &name, &source, chunk_size, &cancel)
        })
        .await?;
        debug!(bytes, "document write finished");

        job.announce(messages::COPY_SUCCESSFUL);
        Ok(())
    }
}

fn open_granted_root(access: &DocumentAccess, package: &str) -> Result<Document, InstallError> {
    let tree = match access.check(package) {
        GrantCheck::Live(tree) => tree,
        GrantCheck::Missing | GrantCheck::Revoked(_) => return Err(InstallError::PermissionLost),
    };
    access
        .provider
        .open_tree(&tree)?
        .ok_or(InstallError::PermissionLost)
}

/// Returns the directory `name` under `parent`, creating it when missing and
/// replacing a same-named non-directory entry.
fn ensure_directory(
    provider: &dyn DocumentProvider,
    parent: &Document,
    found: Option<Document>,
    name: &str,
) -> Result<Document, InstallError> {
    match found {
        Some(doc) if doc.is_directory() => return Ok(doc),
        Some(conflict) => {
            provider.delete(&conflict)?;
        }
        None => {}
    }
    match provider.create_directory(parent, name) {
        Ok(Some(dir)) if dir.name == name => {
            info!(name, "created directory");
            Ok(dir)
        }
        Ok(Some(dir)) => {
            warn!(requested = name, created = %dir.name, "provider renamed directory");
            Err(InstallError::DirectoryCreateFailure(name.to_string()))
        }
        Ok(None) => Err(InstallError::DirectoryCreateFailure(name.to_string())),
        Err(e) => {
            warn!(name, error = %e, "directory creation failed");
            Err(InstallError::DirectoryCreateFailure(name.to_string()))
        }
    }
}

fn mime_type(file_name: &str) -> &'static str {
    match file_name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "json" => "application/json",
        Some(ext) if ext == "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

fn write_document(
    provider: &dyn DocumentProvider,
    dir: &Document,
    name: &str,
    source: &Path,
    chunk_size: usize,
    cancel: &CancellationToken,
) -> Result<u64, InstallError> {
    let doc = match provider.create_file(dir, mime_type(name), name) {
        Ok(Some(doc)) if doc.name == name => doc,
        Ok(Some(doc)) => {
            warn!(requested = name, created = %doc.name, "provider renamed file");
            if let Err(e) = provider.delete(&doc) {
                debug!(name = %doc.name, error = %e, "could not remove renamed document");
            }
            return Err(InstallError::FileCreateFailure(name.to_string()));
        }
        Ok(None) => return Err(InstallError::FileCreateFailure(name.to_string())),
        Err(e) => {
            warn!(name, error = %e, "file creation failed");
            return Err(InstallError::FileCreateFailure(name.to_string()));
        }
    };

    let result = File::open(source)
        .map_err(InstallError::from)
        .and_then(|mut reader| {
            let mut writer = provider.open_write(&doc)?;
            copy::copy_chunks(&mut reader, writer.as_mut(), chunk_size, cancel)
        });
    if result.is_err()
        && let Err(e) = provider.delete(&doc)
    {
        debug!(name, error = %e, "could not remove partial document");
    }
    result
}
