//! Client traits.
//!
//! - [`Transport`] - Low-level blocking HTTP execution
//! - [`Client`] - Transport plus base URL, the receiver of every endpoint call
//!
//! Most users get a [`Client`] from the facade crate (`ApiClient`) or from
//! the `#[fastclient]` macro. Implement it directly for custom routing or
//! testing.

use std::sync::Arc;

use bytes::Bytes;
use url::Url;

use crate::{Request, Response, Result};

/// Blocking HTTP transport.
///
/// Connection management, TLS and redirects are the transport's business.
/// Implementations must be shareable across threads.
pub trait Transport: Send + Sync {
    /// Send a request and wait for the complete response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails for any reason:
    /// - Network errors
    /// - TLS errors
    /// - Timeouts
    fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        (**self).send(request)
    }
}

/// A configured API client: one transport and one base URL.
///
/// Every declared endpoint is called on a `Client`. It holds no per-call
/// state.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use fastclient_core::{Client, Request, Response, Result};
/// use url::Url;
///
/// struct Offline {
///     base_url: Url,
/// }
///
/// impl Client for Offline {
///     fn base_url(&self) -> &Url {
///         &self.base_url
///     }
///
///     fn send(&self, _request: Request<Bytes>) -> Result<Response<Bytes>> {
///         Err(fastclient_core::Error::connection("offline"))
///     }
/// }
/// ```
pub trait Client: Send + Sync {
    /// Base URL all endpoint paths are resolved against.
    fn base_url(&self) -> &Url;

    /// Send a rendered request.
    ///
    /// # Errors
    ///
    /// Returns the transport's error unchanged.
    fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>>;
}

impl<C: Client + ?Sized> Client for &C {
    fn base_url(&self) -> &Url {
        (**self).base_url()
    }

    fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        (**self).send(request)
    }
}

impl<C: Client + ?Sized> Client for Arc<C> {
    fn base_url(&self) -> &Url {
        (**self).base_url()
    }

    fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        (**self).send(request)
    }
}
