//! Tower middleware layers for [`HyperTransport`](crate::HyperTransport).
//!
//! Layers wrap the transport's round trip, below the binding engine: they see
//! rendered requests and raw responses, never call arguments. Add them with
//! [`HyperTransportBuilder::layer`](crate::HyperTransportBuilder::layer); the
//! first layer added is the outermost.
//!
//! # Available Layers
//!
//! - [`LoggingLayer`] - Logs round trips using `tracing`
//!
//! Any `tower` layer over `Request<Bytes>` / `Response<Bytes>` with
//! [`Error`](crate::Error) as its error type fits as well.
//!
//! # Example
//!
//! ```no_run
//! use fastclient::HyperTransport;
//! use fastclient::middleware::LoggingLayer;
//!
//! let transport = HyperTransport::builder()
//!     .layer(LoggingLayer::debug())
//!     .build()?;
//! # Ok::<(), fastclient::Error>(())
//! ```

mod logging;

pub use logging::{LogLevel, Logging, LoggingLayer};

// Re-export tower types for convenience
pub use tower::{Layer, ServiceBuilder};
