//! Blocking HTTP transport using hyper-util.
//!
//! [`HyperTransport`] owns a tokio runtime and a tower service stack. Every
//! [`Transport::send`] blocks the calling thread on that runtime until the
//! response body is complete, so it must not be called from async code.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::{TokioExecutor, TokioTimer},
};
use tokio::runtime::Runtime;
use tower::Layer;
use tower::util::BoxCloneService;
use tower_service::Service;
use tracing::debug;

use crate::middleware::LoggingLayer;
use crate::connector::connector;
use crate::{Error, Request, Response, Result, Transport, TransportConfig};

// ============================================================================
// Type-Erased Service for Middleware Composition
// ============================================================================

/// Type-erased service for middleware composition.
pub type BoxedService = BoxCloneService<Request<Bytes>, Response<Bytes>, Error>;

/// Future type of the transport's tower services.
pub type ServiceFuture = Pin<Box<dyn Future<Output = Result<Response<Bytes>>> + Send + 'static>>;

/// `Sync` wrapper for [`BoxedService`].
///
/// Each call clones the service under the lock and releases it before
/// awaiting, so concurrent callers never wait on each other.
#[derive(Clone)]
struct SyncService {
    inner: Arc<Mutex<BoxedService>>,
}

impl SyncService {
    fn new(service: BoxedService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    fn call(&self, request: Request<Bytes>) -> ServiceFuture {
        let mut service = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        Box::pin(async move { service.call(request).await })
    }
}

// ============================================================================
// Round Trip
// ============================================================================

/// The innermost service: one hyper exchange, body included, under the
/// configured deadline.
#[derive(Clone)]
struct RoundTrip {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    deadline: Duration,
}

impl RoundTrip {
    fn new(config: &TransportConfig) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(connector(config));

        Self {
            client,
            deadline: config.timeout,
        }
    }

    fn to_wire(request: Request<Bytes>) -> Result<http::Request<Full<Bytes>>> {
        let (method, url, headers, body) = request.into_parts();

        let mut wire = http::Request::new(body.map_or_else(Full::default, Full::new));
        *wire.method_mut() = method.into();
        *wire.uri_mut() = url
            .as_str()
            .parse()
            .map_err(|e: http::uri::InvalidUri| Error::invalid_request(format!("{url}: {e}")))?;
        *wire.headers_mut() = headers;

        Ok(wire)
    }

    async fn exchange(self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        let wire = Self::to_wire(request)?;

        let exchange = async {
            let response = self.client.request(wire).await.map_err(transport_error)?;
            let (parts, body) = response.into_parts();
            let body = body
                .collect()
                .await
                .map_err(|e| Error::connection(format!("reading response body: {e}")))?
                .to_bytes();
            Ok::<_, Error>(Response::new(parts.status.as_u16(), parts.headers, body))
        };

        tokio::time::timeout(self.deadline, exchange)
            .await
            .map_err(|_| Error::Timeout)?
    }
}

impl Service<Request<Bytes>> for RoundTrip {
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        Box::pin(self.clone().exchange(request))
    }
}

#[allow(clippy::needless_pass_by_value)]
fn transport_error(err: hyper_util::client::legacy::Error) -> Error {
    let message = describe(&err);
    if caused_by_tls(&err) {
        Error::tls(message)
    } else {
        Error::connection(message)
    }
}

/// The error and its sources, outermost first.
fn describe(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn caused_by_tls(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(error) = current {
        if error.is::<rustls::Error>() {
            return true;
        }
        // rustls failures surface wrapped in an io::Error
        if let Some(io) = error.downcast_ref::<std::io::Error>()
            && io.get_ref().is_some_and(|inner| inner.is::<rustls::Error>())
        {
            return true;
        }
        current = error.source();
    }
    false
}

// ============================================================================
// Public Transport
// ============================================================================

/// Blocking HTTP transport with connection pooling, TLS, and middleware
/// support.
///
/// Clones share the runtime, the connection pool and the middleware stack.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use fastclient::HyperTransport;
///
/// let transport = HyperTransport::builder()
///     .timeout(Duration::from_secs(10))
///     .with_logging()
///     .build()?;
/// # Ok::<(), fastclient::Error>(())
/// ```
#[derive(Clone)]
pub struct HyperTransport {
    runtime: Arc<OwnedRuntime>,
    service: SyncService,
    config: TransportConfig,
}

impl fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HyperTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HyperTransport {
    /// Create a transport with default configuration and no middleware.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot be started.
    pub fn new() -> Result<Self> {
        Self::with_config(TransportConfig::default())
    }

    /// Create a transport with custom configuration (no middleware).
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot be started.
    pub fn with_config(config: TransportConfig) -> Result<Self> {
        let service = BoxCloneService::new(RoundTrip::new(&config));
        Self::with_service(service, config)
    }

    fn with_service(service: BoxedService, config: TransportConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(config.worker_threads)
            .thread_name("fastclient-transport")
            .enable_all()
            .build()
            .map_err(|e| Error::connection(format!("cannot start transport runtime: {e}")))?;
        debug!(worker_threads = config.worker_threads, "transport runtime started");

        Ok(Self {
            runtime: Arc::new(OwnedRuntime(Some(runtime))),
            service: SyncService::new(service),
            config,
        })
    }

    /// Create a new transport builder.
    #[must_use]
    pub fn builder() -> HyperTransportBuilder {
        HyperTransportBuilder::default()
    }

    /// Get the transport configuration.
    #[must_use]
    pub const fn config(&self) -> &TransportConfig {
        &self.config
    }
}

impl Transport for HyperTransport {
    fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        self.runtime.block_on(self.service.call(request))
    }
}

/// The transport runtime, shut down without blocking on drop.
///
/// The last transport clone may be dropped from inside async code, where a
/// blocking shutdown would panic.
struct OwnedRuntime(Option<Runtime>);

impl OwnedRuntime {
    fn block_on<F: Future>(&self, future: F) -> F::Output {
        match &self.0 {
            Some(runtime) => runtime.block_on(future),
            None => unreachable!("runtime is only taken on drop"),
        }
    }
}

impl Drop for OwnedRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.0.take() {
            runtime.shutdown_background();
        }
    }
}

/// Builder for [`HyperTransport`].
///
/// # Example
///
/// ```no_run
/// use fastclient::{HyperTransport, TransportConfig};
/// use fastclient::middleware::LoggingLayer;
///
/// let transport = HyperTransport::builder()
///     .config(TransportConfig::default().with_pool_idle_per_host(4))
///     .layer(LoggingLayer::debug())
///     .build()?;
/// # Ok::<(), fastclient::Error>(())
/// ```
#[derive(Default)]
pub struct HyperTransportBuilder {
    config: TransportConfig,
    layers: Vec<Arc<dyn Fn(BoxedService) -> BoxedService + Send + Sync>>,
}

impl fmt::Debug for HyperTransportBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HyperTransportBuilder")
            .field("config", &self.config)
            .field("layers", &self.layers.len())
            .finish()
    }
}

impl HyperTransportBuilder {
    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: TransportConfig) -> Self {
        self.config = config;
        self
    }

    /// Round-trip deadline, body included.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_timeout(timeout);
        self
    }

    /// Connect deadline.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_connect_timeout(timeout);
        self
    }

    /// Runtime worker threads.
    #[must_use]
    pub fn worker_threads(mut self, count: usize) -> Self {
        self.config = self.config.with_worker_threads(count);
        self
    }

    /// Wrap the round trip in a tower layer.
    ///
    /// The first layer added is the outermost one: it sees the request first
    /// and the response last.
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service: Service<Request<Bytes>, Response = Response<Bytes>, Error = Error>
            + Clone
            + Send
            + 'static,
        <L::Service as Service<Request<Bytes>>>::Future: Send,
    {
        self.layers
            .push(Arc::new(move |service| BoxCloneService::new(layer.layer(service))));
        self
    }

    /// Log every round trip at info level.
    #[must_use]
    pub fn with_logging(self) -> Self {
        self.layer(LoggingLayer::new())
    }

    /// Log every round trip at debug level, headers included.
    #[must_use]
    pub fn with_debug_logging(self) -> Self {
        self.layer(LoggingLayer::debug())
    }

    /// Start the runtime and assemble the service stack.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot be started.
    pub fn build(self) -> Result<HyperTransport> {
        let round_trip = BoxCloneService::new(RoundTrip::new(&self.config));
        let service = self
            .layers
            .iter()
            .rev()
            .fold(round_trip, |service, layer| layer(service));

        HyperTransport::with_service(service, self.config)
    }
}
