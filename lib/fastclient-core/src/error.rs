//! Error types for fastclient.

use std::fmt;

use derive_more::{Display, Error, From};

// ============================================================================
// Configuration Error
// ============================================================================

/// An endpoint declaration that cannot be turned into a working call.
///
/// Raised when an endpoint is registered (`EndpointBuilder::build`), never on
/// a call. It is `Clone` so a lazily registered endpoint can keep reporting
/// the same failure.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("invalid endpoint `{endpoint}`: {message}")]
pub struct ConfigurationError {
    /// Name of the declared endpoint.
    pub endpoint: String,
    /// What is wrong with it.
    pub message: String,
}

impl ConfigurationError {
    /// Create a configuration error for the given endpoint.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Validation Error
// ============================================================================

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("{loc}: {message}")]
pub struct FieldError {
    /// Location of the offending value (e.g. `post_id`, `post.title`, `tags[2]`).
    pub loc: String,
    /// Why the value was rejected.
    pub message: String,
}

impl FieldError {
    /// Create a field error.
    #[must_use]
    pub fn new(loc: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            loc: loc.into(),
            message: message.into(),
        }
    }
}

/// Call-time arguments rejected by an endpoint's adapters.
///
/// Carries every failing field, not only the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationError {
    endpoint: String,
    errors: Vec<FieldError>,
}

impl ValidationError {
    /// Create a validation error from the collected field errors.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self {
            endpoint: endpoint.into(),
            errors,
        }
    }

    /// Name of the endpoint whose arguments were rejected.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The field errors.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Error for a given location, if any.
    #[must_use]
    pub fn field(&self, loc: &str) -> Option<&FieldError> {
        self.errors.iter().find(|error| error.loc == loc)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.errors.len();
        let plural = if count == 1 { "" } else { "s" };
        write!(f, "{count} validation error{plural} for `{}`", self.endpoint)?;
        for error in &self.errors {
            write!(f, "\n  {error}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Error Type
// ============================================================================

/// Main error type for fastclient operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// Endpoint declaration is unusable.
    #[display("{_0}")]
    #[from]
    Configuration(ConfigurationError),

    /// Call-time arguments failed validation; nothing was sent.
    #[display("{_0}")]
    #[from]
    Validation(ValidationError),

    /// HTTP-level errors (non-2xx status codes).
    #[display("HTTP error {status}: {message}")]
    #[from(skip)]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
        /// Response body, if available.
        #[error(not(source))]
        body: Option<bytes::Bytes>,
    },

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// Request timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// A path placeholder had no value after substitution.
    #[display("unresolved path placeholder `{{{name}}}` in `{template}`")]
    #[from(skip)]
    UnresolvedPlaceholder {
        /// Placeholder name.
        name: String,
        /// The template being rendered.
        template: String,
    },

    /// Invalid request configuration.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "user.address.city").
        path: String,
        /// Error message.
        message: String,
    },

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Error for a 4xx or 5xx response, keeping its body.
    ///
    /// The message is the status' canonical reason phrase.
    #[must_use]
    pub fn from_status(status: u16, body: bytes::Bytes) -> Self {
        let reason = http::StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or("error status");
        Self::Http {
            status,
            message: reason.to_string(),
            body: (!body.is_empty()).then_some(body),
        }
    }

    /// Transport could not reach the server.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// TLS handshake or certificate failure.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// A request that cannot be put on the wire.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// A body that does not match the expected type, located by `path`.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// The endpoint declaration was rejected at registration.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Call-time arguments were rejected; nothing was sent.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// The round trip exceeded its deadline.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// See [`Error::connection`].
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// See [`Error::tls`].
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }

    /// Status code of an error response.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The server rejected the request (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self.status(), Some(400..=499))
    }

    /// The server failed (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self.status(), Some(500..=599))
    }

    /// Field-level details of a validation failure.
    #[must_use]
    pub const fn validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(error) => Some(error),
            _ => None,
        }
    }

    /// Body of an error response, when the server sent one.
    #[must_use]
    pub fn body(&self) -> Option<&bytes::Bytes> {
        match self {
            Self::Http { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Decode the body of an error response, typically an API error document.
    ///
    /// `None` when there is no body to decode.
    pub fn decode_body<T: serde::de::DeserializeOwned>(&self) -> Option<Result<T>> {
        self.body().map(|body| crate::from_json(body))
    }
}
