use std::sync::Arc;

use tracing::debug;

use transplant_documents::{DocumentAccess, GrantCheck};
use transplant_helper::HelperConnection;
use transplant_paths::{PathResolver, PathStyle};
use transplant_shell::RootShell;
use transplant_types::{EXPLOIT_PATCHED_SDK, GrantedType, SCOPED_STORAGE_SDK};

use crate::platform::Platform;

/// Usability of one mechanism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
    pub mechanism: GrantedType,
    pub available: bool,
    /// Why the mechanism cannot be used. `None` when available.
    pub reason: Option<String>,
}

impl Capability {
    fn usable(mechanism: GrantedType) -> Self {
        Self {
            mechanism,
            available: true,
            reason: None,
        }
    }

    fn unusable(mechanism: GrantedType, reason: impl Into<String>) -> Self {
        Self {
            mechanism,
            available: false,
            reason: Some(reason.into()),
        }
    }
}

/// Checks which mechanisms can reach the target package right now.
///
/// Collaborators that are not configured make their mechanism unavailable.
/// Blocking checks run on the blocking pool.
pub struct CapabilityProbe {
    package: String,
    paths: PathResolver,
    platform: Arc<dyn Platform>,
    helper: Option<Arc<HelperConnection>>,
    shell: Option<Arc<RootShell>>,
    documents: Option<DocumentAccess>,
}

impl CapabilityProbe {
    pub fn new(package: impl Into<String>, paths: PathResolver, platform: Arc<dyn Platform>) -> Self {
        Self {
            package: package.into(),
            paths,
            platform,
            helper: None,
            shell: None,
            documents: None,
        }
    }

    pub fn with_helper(mut self, helper: Arc<HelperConnection>) -> Self {
        self.helper = Some(helper);
        self
    }

    pub fn with_shell(mut self, shell: Arc<RootShell>) -> Self {
        self.shell = Some(shell);
        self
    }

    pub fn with_documents(mut self, documents: DocumentAccess) -> Self {
        self.documents = Some(documents);
        self
    }

    /// Evaluates every mechanism. Available ones come first; within each
    /// group the canonical mechanism order is kept.
    pub async fn probe(&self) -> Vec<Capability> {
        let mut caps = Vec::with_capacity(GrantedType::ALL.len());
        for mechanism in GrantedType::ALL {
            caps.push(self.check(mechanism).await);
        }
        caps.sort_by_key(|c| !c.available);
        caps
    }

    /// First available mechanism, if any.
    pub async fn best(&self) -> Option<GrantedType> {
        self.probe()
            .await
            .into_iter()
            .find(|c| c.available)
            .map(|c| c.mechanism)
    }

    /// Evaluates a single mechanism.
    pub async fn check(&self, mechanism: GrantedType) -> Capability {
        let cap = match mechanism {
            GrantedType::PrivilegedHelper => self.check_helper(),
            GrantedType::RootShell => self.check_root().await,
            GrantedType::PathObfuscationExploit => self.check_exploit().await,
            GrantedType::LegacyDirectWrite => self.check_legacy().await,
            GrantedType::DocumentTreeApi => self.check_documents().await,
        };
        debug!(
            mechanism = %mechanism,
            available = cap.available,
            reason = cap.reason.as_deref().unwrap_or(""),
            "capability checked"
        );
        cap
    }

    fn check_helper(&self) -> Capability {
        let m = GrantedType::PrivilegedHelper;
        let Some(helper) = &self.helper else {
            return Capability::unusable(m, "helper service not configured");
        };
        let connected = helper.status() == transplant_helper::ConnectionStatus::Connected;
        if !connected && !helper.is_reachable() {
            return Capability::unusable(m, "helper service is not running");
        }
        if !helper.permission_granted() {
            return Capability::unusable(m, "helper permission not granted");
        }
        Capability::usable(m)
    }

    async fn check_root(&self) -> Capability {
        let m = GrantedType::RootShell;
        let Some(shell) = &self.shell else {
            return Capability::unusable(m, "root shell not configured");
        };
        if shell.resolve_binary().await.is_none() {
            return Capability::unusable(m, format!("`{}` not found", shell.binary()));
        }
        match shell.ensure_session().await {
            Ok(()) => Capability::usable(m),
            Err(e) => Capability::unusable(m, format!("root access unavailable: {e}")),
        }
    }

    async fn check_exploit(&self) -> Capability {
        let m = GrantedType::PathObfuscationExploit;
        let sdk = self.platform.sdk_int();
        if sdk >= EXPLOIT_PATCHED_SDK {
            return Capability::unusable(
                m,
                format!("patched on this OS version (SDK {sdk}, fixed in {EXPLOIT_PATCHED_SDK})"),
            );
        }
        let dir = self.paths.data_directory(&self.package, PathStyle::Obfuscated);
        let platform = self.platform.clone();
        let reachable = tokio::task::spawn_blocking(move || platform.path_accessible(&dir))
            .await
            .unwrap_or(false);
        if reachable {
            Capability::usable(m)
        } else {
            Capability::unusable(m, "target data directory not reachable through obfuscated path")
        }
    }

    async fn check_legacy(&self) -> Capability {
        let m = GrantedType::LegacyDirectWrite;
        let sdk = self.platform.sdk_int();
        if sdk > SCOPED_STORAGE_SDK {
            return Capability::unusable(m, format!("scoped storage enforced (SDK {sdk})"));
        }
        let platform = self.platform.clone();
        let granted = tokio::task::spawn_blocking(move || platform.legacy_storage_granted())
            .await
            .unwrap_or(false);
        if granted {
            Capability::usable(m)
        } else {
            Capability::unusable(m, "storage permission not granted")
        }
    }

    async fn check_documents(&self) -> Capability {
        let m = GrantedType::DocumentTreeApi;
        let Some(documents) = self.documents.clone() else {
            return Capability::unusable(m, "document access not configured");
        };
        let package = self.package.clone();
        let check = tokio::task::spawn_blocking(move || documents.check(&package)).await;
        match check {
            Ok(GrantCheck::Live(_)) => Capability::usable(m),
            Ok(GrantCheck::Missing) => Capability::unusable(m, "no document tree granted"),
            Ok(GrantCheck::Revoked(_)) => {
                Capability::unusable(m, "document tree access was revoked")
            }
            Err(e) => Capability::unusable(m, format!("grant check failed: {e}")),
        }
    }
}
