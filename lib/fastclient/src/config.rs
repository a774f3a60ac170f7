//! Transport configuration.

use std::time::Duration;

/// Settings of a [`HyperTransport`](crate::HyperTransport).
///
/// Start from [`TransportConfig::default`] and override what you need:
///
/// ```
/// use std::time::Duration;
/// use fastclient::TransportConfig;
///
/// let config = TransportConfig::default()
///     .with_timeout(Duration::from_secs(5))
///     .with_worker_threads(1);
/// assert_eq!(config.worker_threads, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Deadline for a whole round trip, body included.
    pub timeout: Duration,
    /// Deadline for establishing a TCP connection.
    pub connect_timeout: Duration,
    /// Idle connections kept per host.
    pub pool_idle_per_host: usize,
    /// How long an idle connection is kept; `None` keeps it until the server closes it.
    pub pool_idle_timeout: Option<Duration>,
    /// Disable Nagle's algorithm on new connections.
    pub tcp_nodelay: bool,
    /// Worker threads of the runtime the transport blocks on. Never zero.
    pub worker_threads: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_per_host: 32,
            pool_idle_timeout: Some(Duration::from_secs(90)),
            tcp_nodelay: true,
            worker_threads: 2,
        }
    }
}

impl TransportConfig {
    /// Override the round-trip deadline.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the connect deadline.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Override the idle pool size per host. Zero disables pooling.
    #[must_use]
    pub const fn with_pool_idle_per_host(mut self, count: usize) -> Self {
        self.pool_idle_per_host = count;
        self
    }

    /// Override how long idle connections are kept.
    #[must_use]
    pub const fn with_pool_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    /// Toggle `TCP_NODELAY`.
    #[must_use]
    pub const fn with_tcp_nodelay(mut self, nodelay: bool) -> Self {
        self.tcp_nodelay = nodelay;
        self
    }

    /// Override the runtime worker threads; zero is raised to one.
    #[must_use]
    pub const fn with_worker_threads(mut self, count: usize) -> Self {
        self.worker_threads = if count == 0 { 1 } else { count };
        self
    }
}
