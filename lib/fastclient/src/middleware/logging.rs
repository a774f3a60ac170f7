//! Round-trip logging middleware.
//!
//! Logs every transport round trip using the `tracing` crate.

use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use bytes::Bytes;
use tower::{Layer, Service};
use tracing::{Instrument, debug, info, warn};

use crate::transport::ServiceFuture;
use crate::{Error, Request, Response, Result};

/// Layer that logs each round trip with its method, URL, status and
/// elapsed time.
///
/// # Example
///
/// ```no_run
/// use fastclient::HyperTransport;
/// use fastclient::middleware::LoggingLayer;
///
/// let transport = HyperTransport::builder()
///     .layer(LoggingLayer::new())
///     .build()?;
/// # Ok::<(), fastclient::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingLayer {
    level: LogLevel,
}

/// Log level for the logging middleware.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Log at debug level, request and response headers included.
    Debug,
    /// Log at info level (summary only).
    #[default]
    Info,
}

impl LoggingLayer {
    /// Create a logging layer at info level.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a logging layer that logs at debug level.
    #[must_use]
    pub const fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
        }
    }

    /// The level this layer logs at.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = Logging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Logging {
            inner,
            level: self.level,
        }
    }
}

/// Service that logs round trips.
#[derive(Debug, Clone)]
pub struct Logging<S> {
    inner: S,
    level: LogLevel,
}

impl<S> Service<Request<Bytes>> for Logging<S>
where
    S: Service<Request<Bytes>, Response = Response<Bytes>, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        let span = tracing::info_span!("round_trip", method = %request.method(), url = %request.url());
        let level = self.level;
        let mut inner = self.inner.clone();

        let round_trip = async move {
            if level == LogLevel::Debug {
                debug!(headers = ?request.headers(), "sending");
            }
            let started = Instant::now();
            let result = inner.call(request).await;
            report(level, &result, started.elapsed());
            result
        };
        Box::pin(round_trip.instrument(span))
    }
}

fn report(level: LogLevel, result: &Result<Response<Bytes>>, elapsed: Duration) {
    let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    match result {
        Err(err) => warn!(error = %err, elapsed_ms, "round trip failed"),
        Ok(response) if !response.is_success() => {
            warn!(status = response.status(), elapsed_ms, "round trip returned an error status");
        }
        Ok(response) if level == LogLevel::Debug => debug!(
            status = response.status(),
            elapsed_ms,
            headers = ?response.headers(),
            "round trip completed"
        ),
        Ok(response) => info!(status = response.status(), elapsed_ms, "round trip completed"),
    }
}
