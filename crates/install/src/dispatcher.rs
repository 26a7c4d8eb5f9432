//! Routes an installation to the handler for its mechanism.

use std::path::Path;
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, debug, error, info, info_span};

use transplant_documents::DocumentAccess;
use transplant_helper::HelperConnection;
use transplant_paths::{PathResolver, PathStyle};
use transplant_progress::ProgressSink;
use transplant_shell::RootShell;
use transplant_types::GrantedType;

use crate::error::InstallError;
use crate::handlers::{
    CopyJob, DirectWriteHandler, DocumentTreeHandler, HelperHandler, RootShellHandler,
};
use crate::messages;
use crate::request::{InstallOptions, InstallationRequest};

/// Installs translation files into one package's data directory.
///
/// Runs at most one installation at a time; a concurrent call fails with
/// [`InstallError::Busy`]. Failures propagate unchanged, there are no retries.
pub struct InstallDispatcher {
    package: String,
    paths: PathResolver,
    options: InstallOptions,
    helper: Option<HelperHandler>,
    root: Option<RootShellHandler>,
    documents: Option<DocumentTreeHandler>,
    running: tokio::sync::Mutex<()>,
    cancel: Mutex<CancellationToken>,
}

impl InstallDispatcher {
    pub fn new(package: impl Into<String>, paths: PathResolver, options: InstallOptions) -> Self {
        Self {
            package: package.into(),
            paths,
            options,
            helper: None,
            root: None,
            documents: None,
            running: tokio::sync::Mutex::new(()),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn with_helper(mut self, connection: Arc<HelperConnection>) -> Self {
        self.helper = Some(HelperHandler::new(connection, self.options.helper_timeout));
        self
    }

    pub fn with_shell(mut self, shell: Arc<RootShell>) -> Self {
        self.root = Some(RootShellHandler::new(shell));
        self
    }

    pub fn with_documents(mut self, access: DocumentAccess) -> Self {
        self.documents = Some(DocumentTreeHandler::new(access));
        self
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    /// Cancels the installation in flight, if any.
    pub fn cancel(&self) {
        self.cancel
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .cancel();
    }

    /// Installs `source` as `file_name` using `granted_type`.
    pub async fn install_package(
        &self,
        source: &Path,
        file_name: &str,
        granted_type: GrantedType,
        progress: &dyn ProgressSink,
    ) -> Result<(), InstallError> {
        let request = InstallationRequest::new(source, file_name, granted_type);
        self.install(&request, progress).await
    }

    /// Runs `request`, reporting each stage to `progress`.
    ///
    /// On cancellation the sink's pending lines are discarded and
    /// [`InstallError::Cancelled`] is returned once the job's blocking work
    /// has stopped, so a cancelled copy cannot touch a later install.
    pub async fn install(
        &self,
        request: &InstallationRequest,
        progress: &dyn ProgressSink,
    ) -> Result<(), InstallError> {
        let _running = self.running.try_lock().map_err(|_| InstallError::Busy)?;
        let token = CancellationToken::new();
        *self.cancel.lock().unwrap_or_else(|e| e.into_inner()) = token.clone();
        let tracker = TaskTracker::new();

        let span = info_span!(
            "install",
            id = %request.id,
            mechanism = %request.granted_type,
            file = %request.file_name
        );
        let result = async {
            progress.emit(&messages::starting(request.granted_type));
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => Err(InstallError::Cancelled),
                r = self.route(request, progress, &token, &tracker) => r,
            };
            tracker.close();
            if !tracker.is_empty() {
                debug!(tasks = tracker.len(), "waiting for abandoned blocking work");
            }
            tracker.wait().await;
            result
        }
        .instrument(span.clone())
        .await;

        span.in_scope(|| match &result {
            Ok(()) => info!("installation finished"),
            Err(e) if e.is_cancelled() => {
                progress.discard_pending();
                info!("installation cancelled");
            }
            Err(e) => error!(error = %e, "installation failed"),
        });
        result
    }

    async fn route(
        &self,
        request: &InstallationRequest,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
        tracker: &TaskTracker,
    ) -> Result<(), InstallError> {
        progress.emit(messages::VERIFYING_SOURCE);
        request.validate()?;
        let meta = tokio::fs::metadata(&request.source_path).await?;
        if !meta.is_file() {
            return Err(InstallError::IoFailure(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a file", request.source_path.display()),
            )));
        }

        let job = CopyJob {
            source: &request.source_path,
            file_name: &request.file_name,
            package: &self.package,
            target_dir: self.paths.target_for(&self.package, request.granted_type),
            progress,
            cancel,
            tracker,
            chunk_size: self.options.chunk_size,
        };
        let unavailable = || InstallError::Unavailable(request.granted_type);

        match request.granted_type {
            GrantedType::PrivilegedHelper => {
                self.helper.as_ref().ok_or_else(unavailable)?.install(&job).await
            }
            GrantedType::RootShell => {
                self.root.as_ref().ok_or_else(unavailable)?.install(&job).await
            }
            GrantedType::PathObfuscationExploit | GrantedType::LegacyDirectWrite => {
                DirectWriteHandler::new(PathStyle::for_mechanism(request.granted_type))
                    .install(&job)
                    .await
            }
            GrantedType::DocumentTreeApi => {
                self.documents
                    .as_ref()
                    .ok_or_else(unavailable)?
                    .install(&job)
                    .await
            }
        }
    }
}
