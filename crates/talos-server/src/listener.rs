//! Graceful TCP listener.
//!
//! A [`GracefulListener`] wraps a bound socket with a three-state
//! lifecycle: `Open` accepts connections, `Draining` refuses new ones
//! while in-flight connections finish, `Closed` means the socket is
//! gone. The transition is one-way; a listener never reopens.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};

use crate::shutdown::{ConnectionToken, ConnectionTracker};

/// Lifecycle state of a [`GracefulListener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// Accepting new connections.
    Open,

    /// Refusing new connections; waiting for in-flight ones to finish.
    Draining,

    /// The socket is closed.
    Closed,
}

const STATE_OPEN: u8 = 0;
const STATE_DRAINING: u8 = 1;
const STATE_CLOSED: u8 = 2;

/// Result of a drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every connection finished within the grace period.
    Drained,

    /// The grace period elapsed with connections still active; the
    /// listener closed without waiting for them.
    GraceExpired {
        /// Number of connections active at the cutoff.
        active: usize,
    },
}

/// A TCP listener that drains instead of severing on shutdown.
///
/// Accepted connections are counted through a [`ConnectionTracker`]; the
/// caller keeps the returned [`ConnectionToken`] alive for the lifetime
/// of the connection so [`GracefulListener::shutdown`] knows when the
/// drain is complete.
#[derive(Debug)]
pub struct GracefulListener {
    inner: Option<TcpListener>,
    local_addr: SocketAddr,
    state: Arc<AtomicU8>,
    tracker: ConnectionTracker,
}

impl GracefulListener {
    /// Binds to the given address.
    ///
    /// # Errors
    ///
    /// Returns the bind error when the address is unavailable.
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        let inner = TcpListener::bind(addr).await?;
        let local_addr = inner.local_addr()?;
        Ok(Self {
            inner: Some(inner),
            local_addr,
            state: Arc::new(AtomicU8::new(STATE_OPEN)),
            tracker: ConnectionTracker::new(),
        })
    }

    /// Returns the bound address.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ListenerState {
        match self.state.load(Ordering::SeqCst) {
            STATE_OPEN => ListenerState::Open,
            STATE_DRAINING => ListenerState::Draining,
            _ => ListenerState::Closed,
        }
    }

    /// Returns the number of connections currently being served.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.tracker.active()
    }

    /// Returns the tracker counting accepted connections.
    #[must_use]
    pub fn tracker(&self) -> ConnectionTracker {
        self.tracker.clone()
    }

    /// Accepts the next connection.
    ///
    /// Returns `None` once the listener has left the `Open` state. The
    /// returned token must be held for the lifetime of the connection;
    /// dropping it marks the connection finished.
    ///
    /// # Errors
    ///
    /// Returns transient accept errors; the caller decides whether to
    /// retry.
    pub async fn accept(
        &self,
    ) -> io::Result<Option<(TcpStream, SocketAddr, ConnectionToken)>> {
        if self.state.load(Ordering::SeqCst) != STATE_OPEN {
            return Ok(None);
        }
        let Some(listener) = self.inner.as_ref() else {
            return Ok(None);
        };

        let (stream, peer) = listener.accept().await?;

        // Shutdown may have raced the accept; a connection taken past the
        // transition is refused rather than served.
        if self.state.load(Ordering::SeqCst) != STATE_OPEN {
            drop(stream);
            return Ok(None);
        }

        let token = self.tracker.acquire();
        Ok(Some((stream, peer, token)))
    }

    /// Drains and closes the listener.
    ///
    /// Stops accepting immediately, then waits up to `grace` for active
    /// connections to finish. Connections still open at the cutoff are
    /// reported in the outcome and left to process teardown to sever.
    /// Idempotent: a second call reports a completed drain.
    pub async fn shutdown(&mut self, grace: Duration) -> DrainOutcome {
        let was_open = self
            .state
            .compare_exchange(
                STATE_OPEN,
                STATE_DRAINING,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok();

        if !was_open {
            return DrainOutcome::Drained;
        }

        // Closing the socket wakes a pending accept with an error rather
        // than letting it sit on a dead fd.
        drop(self.inner.take());

        let outcome = if tokio::time::timeout(grace, self.tracker.wait_idle())
            .await
            .is_ok()
        {
            DrainOutcome::Drained
        } else {
            let active = self.tracker.active();
            tracing::warn!(active, "grace period expired with connections active");
            DrainOutcome::GraceExpired { active }
        };

        self.state.store(STATE_CLOSED, Ordering::SeqCst);
        outcome
    }
}
