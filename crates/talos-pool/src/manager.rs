//! Managed resources with supervised reconnect.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::{BoxError, PoolError};

/// Default monitor interval in milliseconds.
pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 5_000;

/// Establishes and health-checks handles to one backend.
///
/// Implementations carry their own settings (DSN, pool sizes); the
/// manager only drives the lifecycle.
pub trait Connector: Send + Sync + 'static {
    /// The handle type produced by a successful connect.
    type Conn: Send + Sync + 'static;

    /// Establishes a new handle.
    fn connect(&self) -> impl Future<Output = Result<Self::Conn, BoxError>> + Send;

    /// Health-checks an existing handle.
    fn ping(&self, conn: &Self::Conn) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// Settings for a replicated backend pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Primary data source name.
    pub primary_dsn: String,

    /// Replica data source name.
    pub replica_dsn: String,

    /// Monitor interval in milliseconds.
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,

    /// Maximum idle handles, interpreted by the connector.
    #[serde(default)]
    pub max_idle: u32,

    /// Maximum open handles, interpreted by the connector.
    #[serde(default)]
    pub max_open: u32,
}

fn default_retry_interval_ms() -> u64 {
    DEFAULT_RETRY_INTERVAL_MS
}

/// One managed backend: the current handle plus its monitor.
///
/// Callers read the handle through [`Managed::handle`]; the monitor task
/// replaces it behind the lock when the backend recovers.
pub struct Managed<C: Connector> {
    connector: Arc<C>,
    current: Arc<RwLock<Option<Arc<C::Conn>>>>,
    retry_interval: Duration,
    stop_tx: watch::Sender<bool>,
}

impl<C: Connector> Managed<C> {
    /// Creates a manager around a connector. No connection is attempted
    /// until [`Managed::connect`] is called.
    #[must_use]
    pub fn new(connector: C, retry_interval: Duration) -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            connector: Arc::new(connector),
            current: Arc::new(RwLock::new(None)),
            retry_interval,
            stop_tx,
        }
    }

    /// Establishes the initial handle.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Connect`] when the backend is unreachable.
    pub async fn connect(&self) -> Result<(), PoolError> {
        let conn = self.connector.connect().await.map_err(PoolError::Connect)?;
        *self.current.write().await = Some(Arc::new(conn));
        Ok(())
    }

    /// Returns the current handle, if one is established.
    pub async fn handle(&self) -> Option<Arc<C::Conn>> {
        self.current.read().await.clone()
    }

    /// Spawns the supervision loop.
    ///
    /// Every `retry_interval` the monitor pings the current handle and
    /// reconnects when the ping fails or no handle exists. A failed ping
    /// never stops the loop; supervision continues until [`Managed::stop`].
    pub fn spawn_monitor(&self) -> JoinHandle<()> {
        let connector = Arc::clone(&self.connector);
        let current = Arc::clone(&self.current);
        let mut stop_rx = self.stop_tx.subscribe();
        let period = self.retry_interval;

        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        Self::check_once(&connector, &current).await;
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        })
    }

    /// Stops the monitor loop.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    async fn check_once(connector: &Arc<C>, current: &Arc<RwLock<Option<Arc<C::Conn>>>>) {
        let existing = current.read().await.clone();

        if let Some(conn) = existing {
            match connector.ping(&conn).await {
                Ok(()) => return,
                Err(e) => {
                    tracing::warn!(error = %e, "backend ping failed, reconnecting");
                }
            }
        }

        match connector.connect().await {
            Ok(conn) => {
                *current.write().await = Some(Arc::new(conn));
                tracing::info!("backend handle re-established");
            }
            Err(e) => {
                tracing::warn!(error = %e, "backend reconnect failed, will retry");
            }
        }
    }
}

impl<C: Connector> Drop for Managed<C> {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(true);
    }
}

// Hand-written: the handle type carries no Debug bound.
impl<C: Connector> fmt::Debug for Managed<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Managed")
            .field("retry_interval", &self.retry_interval)
            .finish_non_exhaustive()
    }
}

/// A primary/replica pair of managed backends.
///
/// Replaces ambient global handles: construct one, connect it, inject it
/// wherever handlers need backend access.
pub struct Replicated<C: Connector> {
    primary: Managed<C>,
    replica: Managed<C>,
}

impl<C: Connector> Replicated<C> {
    /// Builds the pair from config, constructing one connector per DSN.
    #[must_use]
    pub fn new(config: &PoolConfig, make: impl Fn(&str) -> C) -> Self {
        let retry = Duration::from_millis(config.retry_interval_ms);
        Self {
            primary: Managed::new(make(&config.primary_dsn), retry),
            replica: Managed::new(make(&config.replica_dsn), retry),
        }
    }

    /// Establishes both handles. Either failure is fatal to startup.
    ///
    /// # Errors
    ///
    /// Returns the first [`PoolError::Connect`] encountered.
    pub async fn connect(&self) -> Result<(), PoolError> {
        self.primary.connect().await?;
        self.replica.connect().await?;
        Ok(())
    }

    /// Spawns both supervision loops.
    pub fn start_monitors(&self) -> (JoinHandle<()>, JoinHandle<()>) {
        (self.primary.spawn_monitor(), self.replica.spawn_monitor())
    }

    /// Stops both monitors.
    pub fn stop(&self) {
        self.primary.stop();
        self.replica.stop();
    }

    /// Returns the primary backend.
    #[must_use]
    pub fn primary(&self) -> &Managed<C> {
        &self.primary
    }

    /// Returns the replica backend.
    #[must_use]
    pub fn replica(&self) -> &Managed<C> {
        &self.replica
    }
}

impl<C: Connector> fmt::Debug for Replicated<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Replicated")
            .field("primary", &self.primary)
            .field("replica", &self.replica)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeConnector {
        connects: AtomicUsize,
        pings: AtomicUsize,
        fail_ping: AtomicBool,
        fail_connect: AtomicBool,
    }

    struct FakeConn;

    impl Connector for Arc<FakeConnector> {
        type Conn = FakeConn;

        async fn connect(&self) -> Result<FakeConn, BoxError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            if self.fail_connect.load(Ordering::SeqCst) {
                return Err("connect refused".into());
            }
            Ok(FakeConn)
        }

        async fn ping(&self, _conn: &FakeConn) -> Result<(), BoxError> {
            self.pings.fetch_add(1, Ordering::SeqCst);
            if self.fail_ping.load(Ordering::SeqCst) {
                return Err("ping failed".into());
            }
            Ok(())
        }
    }

    fn managed(fake: &Arc<FakeConnector>, interval_ms: u64) -> Managed<Arc<FakeConnector>> {
        Managed::new(Arc::clone(fake), Duration::from_millis(interval_ms))
    }

    #[tokio::test]
    async fn test_handle_absent_before_connect() {
        let fake = Arc::new(FakeConnector::default());
        let managed = managed(&fake, 1000);

        assert!(managed.handle().await.is_none());
    }

    #[tokio::test]
    async fn test_connect_establishes_handle() {
        let fake = Arc::new(FakeConnector::default());
        let managed = managed(&fake, 1000);

        managed.connect().await.unwrap();
        assert!(managed.handle().await.is_some());
        assert_eq!(fake.connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_connect_failure_surfaces() {
        let fake = Arc::new(FakeConnector::default());
        fake.fail_connect.store(true, Ordering::SeqCst);
        let managed = managed(&fake, 1000);

        assert!(matches!(
            managed.connect().await,
            Err(PoolError::Connect(_))
        ));
        assert!(managed.handle().await.is_none());
    }

    #[tokio::test]
    async fn test_monitor_pings_on_interval() {
        let fake = Arc::new(FakeConnector::default());
        let managed = managed(&fake, 10);
        managed.connect().await.unwrap();

        let monitor = managed.spawn_monitor();
        tokio::time::sleep(Duration::from_millis(60)).await;
        managed.stop();
        monitor.await.unwrap();

        assert!(fake.pings.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_monitor_reconnects_after_failed_ping() {
        let fake = Arc::new(FakeConnector::default());
        let managed = managed(&fake, 10);
        managed.connect().await.unwrap();

        fake.fail_ping.store(true, Ordering::SeqCst);
        let monitor = managed.spawn_monitor();
        tokio::time::sleep(Duration::from_millis(60)).await;
        managed.stop();
        monitor.await.unwrap();

        // Initial connect plus at least one reconnect from the monitor.
        assert!(fake.connects.load(Ordering::SeqCst) >= 2);
        assert!(managed.handle().await.is_some());
    }

    #[tokio::test]
    async fn test_monitor_survives_failed_reconnect() {
        let fake = Arc::new(FakeConnector::default());
        let managed = managed(&fake, 10);
        managed.connect().await.unwrap();

        fake.fail_ping.store(true, Ordering::SeqCst);
        fake.fail_connect.store(true, Ordering::SeqCst);
        let monitor = managed.spawn_monitor();
        tokio::time::sleep(Duration::from_millis(60)).await;

        // Backend recovers; the next tick should re-establish the handle.
        fake.fail_ping.store(false, Ordering::SeqCst);
        fake.fail_connect.store(false, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(40)).await;

        managed.stop();
        monitor.await.unwrap();
        assert!(managed.handle().await.is_some());
    }

    #[tokio::test]
    async fn test_stop_terminates_monitor() {
        let fake = Arc::new(FakeConnector::default());
        let managed = managed(&fake, 10);
        managed.connect().await.unwrap();

        let monitor = managed.spawn_monitor();
        managed.stop();

        tokio::time::timeout(Duration::from_secs(1), monitor)
            .await
            .expect("monitor should stop promptly")
            .unwrap();
    }

    #[test]
    fn test_debug_without_conn_debug_bound() {
        // FakeConn implements no Debug; formatting must not require it.
        let fake = Arc::new(FakeConnector::default());
        let managed = managed(&fake, 1000);

        let rendered = format!("{managed:?}");
        assert!(rendered.contains("Managed"));
        assert!(rendered.contains("retry_interval"));
    }

    #[tokio::test]
    async fn test_replicated_pair() {
        let fake = Arc::new(FakeConnector::default());
        let config = PoolConfig {
            primary_dsn: "primary".to_string(),
            replica_dsn: "replica".to_string(),
            retry_interval_ms: 1000,
            max_idle: 0,
            max_open: 0,
        };

        let pool = Replicated::new(&config, |_dsn| Arc::clone(&fake));
        pool.connect().await.unwrap();

        assert!(pool.primary().handle().await.is_some());
        assert!(pool.replica().handle().await.is_some());
        assert_eq!(fake.connects.load(Ordering::SeqCst), 2);
        assert!(format!("{pool:?}").contains("Replicated"));
        pool.stop();
    }
}
