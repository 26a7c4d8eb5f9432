//! Single-owner helper connection.
//!
//! Status is published through a `watch` channel so callers can wait for the
//! bind to settle without polling. Every transition happens under one lock,
//! and a generation counter discards results of superseded bind attempts.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::HelperError;
use crate::service::{FileHelper, HelperBinder};

/// Bound on how long an install waits for the helper bind to settle.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection state of the helper service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Not bound.
    Disconnected,
    /// Bind in progress.
    Connecting,
    /// Bound and ready for calls.
    Connected,
    /// Last bind failed with the given cause.
    Error(String),
}

impl ConnectionStatus {
    /// Whether the bind has settled into a state callers can act on.
    pub fn is_settled(&self) -> bool {
        !matches!(self, ConnectionStatus::Connecting)
    }
}

struct BindState {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

struct Inner {
    binder: Arc<dyn HelperBinder>,
    status: watch::Sender<ConnectionStatus>,
    service: Mutex<Option<Arc<dyn FileHelper>>>,
    bind: Mutex<BindState>,
}

impl Inner {
    fn bind_state(&self) -> MutexGuard<'_, BindState> {
        self.bind.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn service_slot(&self) -> MutexGuard<'_, Option<Arc<dyn FileHelper>>> {
        self.service.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn finish_bind(&self, generation: u64, result: Result<Arc<dyn FileHelper>, HelperError>) {
        let mut state = self.bind_state();
        if state.generation != generation {
            debug!(generation, "discarding superseded helper bind result");
            return;
        }
        state.task = None;
        match result {
            Ok(service) => {
                *self.service_slot() = Some(service);
                self.status.send_replace(ConnectionStatus::Connected);
                info!("helper service connected");
            }
            Err(e) => {
                warn!(error = %e, "helper bind failed");
                self.status.send_replace(ConnectionStatus::Error(e.to_string()));
            }
        }
    }
}

/// Owns the process-wide binding to the privileged helper.
///
/// Only the owner binds or unbinds; install attempts share the bound service.
/// Dropping the connection releases the binding.
pub struct HelperConnection {
    inner: Arc<Inner>,
}

impl HelperConnection {
    /// Creates a disconnected connection over `binder`.
    pub fn new(binder: Arc<dyn HelperBinder>) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::Disconnected);
        Self {
            inner: Arc::new(Inner {
                binder,
                status,
                service: Mutex::new(None),
                bind: Mutex::new(BindState {
                    generation: 0,
                    task: None,
                }),
            }),
        }
    }

    /// Current status.
    pub fn status(&self) -> ConnectionStatus {
        self.inner.status.borrow().clone()
    }

    /// Subscribes to status changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.inner.status.subscribe()
    }

    /// Whether the helper's binder is alive.
    pub fn is_reachable(&self) -> bool {
        self.inner.binder.is_reachable()
    }

    /// Whether the helper permission is granted.
    pub fn permission_granted(&self) -> bool {
        self.inner.binder.permission_granted()
    }

    /// Starts a bind unless one is already connecting or connected.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect(&self) {
        let mut state = self.inner.bind_state();
        let current = self.status();
        if matches!(
            current,
            ConnectionStatus::Connecting | ConnectionStatus::Connected
        ) {
            return;
        }

        state.generation += 1;
        let generation = state.generation;
        self.inner.status.send_replace(ConnectionStatus::Connecting);
        debug!(generation, previous = ?current, "binding helper service");

        let inner = self.inner.clone();
        state.task = Some(tokio::spawn(async move {
            let result = inner.binder.bind().await;
            inner.finish_bind(generation, result);
        }));
    }

    /// Waits up to `timeout` for the bind to settle and returns the service.
    pub async fn wait_ready(&self, timeout: Duration) -> Result<Arc<dyn FileHelper>, HelperError> {
        let mut rx = self.inner.status.subscribe();
        let settled = match tokio::time::timeout(timeout, rx.wait_for(|s| s.is_settled())).await {
            Ok(Ok(status)) => (*status).clone(),
            Ok(Err(_)) => return Err(HelperError::Disconnected),
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "helper bind timed out");
                return Err(HelperError::Timeout);
            }
        };

        match settled {
            ConnectionStatus::Connected => self
                .inner
                .service_slot()
                .clone()
                .ok_or(HelperError::Disconnected),
            ConnectionStatus::Error(cause) => Err(HelperError::Bind(cause)),
            ConnectionStatus::Disconnected | ConnectionStatus::Connecting => {
                Err(HelperError::Disconnected)
            }
        }
    }

    /// Ensures a bind is in flight and waits for the bound service.
    pub async fn service(&self, timeout: Duration) -> Result<Arc<dyn FileHelper>, HelperError> {
        if !self.permission_granted() {
            return Err(HelperError::PermissionDenied);
        }
        self.connect();
        self.wait_ready(timeout).await
    }

    /// Called by the platform bridge when the helper process goes away.
    pub fn on_service_disconnected(&self) {
        let _state = self.inner.bind_state();
        self.inner.service_slot().take();
        self.inner.status.send_replace(ConnectionStatus::Disconnected);
        info!("helper service disconnected");
    }

    /// Aborts any bind in flight and releases the binding.
    pub fn disconnect(&self) {
        let mut state = self.inner.bind_state();
        state.generation += 1;
        if let Some(task) = state.task.take() {
            task.abort();
        }
        let had_service = self.inner.service_slot().take().is_some();
        let previous = self.inner.status.send_replace(ConnectionStatus::Disconnected);
        if had_service || previous == ConnectionStatus::Connecting {
            self.inner.binder.unbind();
            debug!(previous = ?previous, "helper service unbound");
        }
    }
}

impl Drop for HelperConnection {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::service::HelperFuture;

    struct NoopHelper;

    impl FileHelper for NoopHelper {
        fn mkdirs<'a>(&'a self, _path: &'a Path) -> HelperFuture<'a, ()> {
            Box::pin(async { Ok(()) })
        }

        fn delete<'a>(&'a self, _path: &'a Path) -> HelperFuture<'a, bool> {
            Box::pin(async { Ok(false) })
        }

        fn copy_file<'a>(&'a self, _src: &'a Path, _dest: &'a Path) -> HelperFuture<'a, ()> {
            Box::pin(async { Ok(()) })
        }
    }

    #[derive(Clone, Copy)]
    enum Behavior {
        Succeed,
        Fail,
        Hang,
        FailOnce,
    }

    struct MockBinder {
        behavior: Behavior,
        permission: bool,
        binds: AtomicUsize,
        unbinds: AtomicUsize,
    }

    impl MockBinder {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                permission: true,
                binds: AtomicUsize::new(0),
                unbinds: AtomicUsize::new(0),
            })
        }
    }

    impl HelperBinder for MockBinder {
        fn is_reachable(&self) -> bool {
            true
        }

        fn permission_granted(&self) -> bool {
            self.permission
        }

        fn bind(&self) -> HelperFuture<'_, Arc<dyn FileHelper>> {
            let attempt = self.binds.fetch_add(1, Ordering::SeqCst);
            let behavior = self.behavior;
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                match behavior {
                    Behavior::Succeed => Ok(Arc::new(NoopHelper) as Arc<dyn FileHelper>),
                    Behavior::Fail => Err(HelperError::Bind("binder died".into())),
                    Behavior::Hang => std::future::pending().await,
                    Behavior::FailOnce if attempt == 0 => {
                        Err(HelperError::Bind("first attempt".into()))
                    }
                    Behavior::FailOnce => Ok(Arc::new(NoopHelper) as Arc<dyn FileHelper>),
                }
            })
        }

        fn unbind(&self) {
            self.unbinds.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn connects_and_returns_service() {
        let binder = MockBinder::new(Behavior::Succeed);
        let conn = HelperConnection::new(binder.clone());
        assert_eq!(conn.status(), ConnectionStatus::Disconnected);

        conn.service(DEFAULT_CONNECT_TIMEOUT).await.unwrap();
        assert_eq!(conn.status(), ConnectionStatus::Connected);
        assert_eq!(binder.binds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_bind_times_out() {
        let binder = MockBinder::new(Behavior::Hang);
        let conn = HelperConnection::new(binder);

        let err = conn.service(DEFAULT_CONNECT_TIMEOUT).await.err().unwrap();
        assert_eq!(err, HelperError::Timeout);
        assert_eq!(conn.status(), ConnectionStatus::Connecting);
    }

    #[tokio::test(start_paused = true)]
    async fn bind_failure_propagates_cause() {
        let binder = MockBinder::new(Behavior::Fail);
        let conn = HelperConnection::new(binder);

        let err = conn.service(DEFAULT_CONNECT_TIMEOUT).await.err().unwrap();
        assert!(matches!(err, HelperError::Bind(ref cause) if cause.contains("binder died")));
        assert!(matches!(conn.status(), ConnectionStatus::Error(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn error_state_rebinds_on_next_attempt() {
        let binder = MockBinder::new(Behavior::FailOnce);
        let conn = HelperConnection::new(binder.clone());

        assert!(conn.service(DEFAULT_CONNECT_TIMEOUT).await.is_err());
        conn.service(DEFAULT_CONNECT_TIMEOUT).await.unwrap();
        assert_eq!(binder.binds.load(Ordering::SeqCst), 2);
        assert_eq!(conn.status(), ConnectionStatus::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_bind() {
        let binder = MockBinder::new(Behavior::Succeed);
        let conn = HelperConnection::new(binder.clone());

        let (a, b) = tokio::join!(
            conn.service(DEFAULT_CONNECT_TIMEOUT),
            conn.service(DEFAULT_CONNECT_TIMEOUT)
        );
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(binder.binds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_permission_skips_bind() {
        let binder = Arc::new(MockBinder {
            behavior: Behavior::Succeed,
            permission: false,
            binds: AtomicUsize::new(0),
            unbinds: AtomicUsize::new(0),
        });
        let conn = HelperConnection::new(binder.clone());

        let err = conn.service(DEFAULT_CONNECT_TIMEOUT).await.err().unwrap();
        assert_eq!(err, HelperError::PermissionDenied);
        assert_eq!(binder.binds.load(Ordering::SeqCst), 0);
        assert_eq!(conn.status(), ConnectionStatus::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_releases_binding() {
        let binder = MockBinder::new(Behavior::Succeed);
        {
            let conn = HelperConnection::new(binder.clone());
            conn.service(DEFAULT_CONNECT_TIMEOUT).await.unwrap();
        }
        assert_eq!(binder.unbinds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_aborts_pending_bind() {
        let binder = MockBinder::new(Behavior::Hang);
        let conn = HelperConnection::new(binder.clone());
        conn.connect();
        assert_eq!(conn.status(), ConnectionStatus::Connecting);

        conn.disconnect();
        assert_eq!(conn.status(), ConnectionStatus::Disconnected);
        assert_eq!(binder.unbinds.load(Ordering::SeqCst), 1);

        // A second disconnect has nothing left to release.
        conn.disconnect();
        assert_eq!(binder.unbinds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn service_loss_returns_to_disconnected() {
        let binder = MockBinder::new(Behavior::Succeed);
        let conn = HelperConnection::new(binder);
        conn.service(DEFAULT_CONNECT_TIMEOUT).await.unwrap();

        conn.on_service_disconnected();
        assert_eq!(conn.status(), ConnectionStatus::Disconnected);
        assert_eq!(
            conn.wait_ready(DEFAULT_CONNECT_TIMEOUT).await.err(),
            Some(HelperError::Disconnected)
        );
    }
}
