//! The client base.
//!
//! [`ApiClient`] pairs one [`Transport`] with a base URL. It is the
//! [`Client`] every declared endpoint is called on.

use bytes::Bytes;
use url::Url;

use crate::{Client, Request, Response, Result, Transport};

/// A transport bound to a base URL.
///
/// The transport is chosen once, at construction, and never replaced. Share
/// a transport (and its connection pool) across APIs by cloning it, or by
/// wrapping it in an `Arc`.
///
/// # Example
///
/// ```no_run
/// use fastclient::{ApiClient, HyperTransport};
///
/// let transport = HyperTransport::builder().with_logging().build()?;
/// let posts = ApiClient::parse(transport.clone(), "https://jsonplaceholder.typicode.com")?;
/// let github = ApiClient::parse(transport, "https://api.github.com")?;
/// # Ok::<(), fastclient::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient<T> {
    transport: T,
    base_url: Url,
}

impl<T: Transport> ApiClient<T> {
    /// Create a client with a pre-parsed base URL.
    #[must_use]
    pub const fn new(transport: T, base_url: Url) -> Self {
        Self {
            transport,
            base_url,
        }
    }

    /// Create a client, parsing the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn parse(transport: T, base_url: impl AsRef<str>) -> Result<Self> {
        Ok(Self::new(transport, Url::parse(base_url.as_ref())?))
    }

    /// The transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Consume the client and return the transport.
    #[must_use]
    pub fn into_transport(self) -> T {
        self.transport
    }
}

impl<T: Transport> Client for ApiClient<T> {
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        self.transport.send(request)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use assert2::{check, let_assert};

    use super::*;
    use crate::{Error, Method};

    #[derive(Debug, Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    impl Transport for Counting {
        fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Response::new(
                200,
                http::HeaderMap::new(),
                Bytes::from(request.url().to_string()),
            ))
        }
    }

    #[test]
    fn parse_base_url() {
        let_assert!(Ok(client) = ApiClient::parse(Counting::default(), "https://api.example.com/v1"));
        check!(client.base_url().as_str() == "https://api.example.com/v1");

        let_assert!(Err(Error::InvalidUrl(_)) = ApiClient::parse(Counting::default(), "not a url"));
    }

    #[test]
    fn send_goes_through_the_transport() {
        let url = Url::parse("https://api.example.com").expect("valid URL");
        let client = ApiClient::new(Counting::default(), url.clone());

        let_assert!(Ok(response) = client.send(Request::builder(Method::Get, url).build()));
        check!(&response.body()[..] == b"https://api.example.com/");
        check!(client.transport().calls.load(Ordering::SeqCst) == 1);
    }
}
