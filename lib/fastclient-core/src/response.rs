//! HTTP response handling and return shapes.
//!
//! [`Response`] gives access to status, headers and body, with JSON
//! deserialization. [`FromResponse`] maps a checked response into the value an
//! endpoint returns.

use bytes::Bytes;
use derive_more::Display;
use http::HeaderMap;
use serde_json::{Map, Value};

/// HTTP response with status, headers, and body.
#[derive(Debug, Clone)]
pub struct Response<B = Bytes> {
    status: u16,
    headers: HeaderMap,
    body: B,
}

impl<B> Response<B> {
    /// Creates a new response.
    #[must_use]
    pub const fn new(status: u16, headers: HeaderMap, body: B) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Single header value by name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Response body.
    #[must_use]
    pub const fn body(&self) -> &B {
        &self.body
    }

    /// Consume into (status, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (u16, HeaderMap, B) {
        (self.status, self.headers, self.body)
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Status is 4xx.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status >= 400 && self.status < 500
    }

    /// Status is 5xx.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status >= 500 && self.status < 600
    }
}

impl Response<Bytes> {
    /// Fail with [`crate::Error::Http`] on a 4xx or 5xx status.
    ///
    /// The error keeps the response body.
    ///
    /// # Errors
    ///
    /// Returns an error for client and server error statuses.
    pub fn error_for_status(self) -> crate::Result<Self> {
        if self.is_client_error() || self.is_server_error() {
            return Err(crate::Error::from_status(self.status, self.body));
        }
        Ok(self)
    }

    /// Deserialize the response body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> crate::Result<T> {
        crate::from_json(&self.body)
    }
}

// ============================================================================
// Return Shapes
// ============================================================================

/// The closed family of values an endpoint can return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ReturnShape {
    /// A typed record parsed and validated from a JSON body.
    #[display("model")]
    Model,
    /// A generic JSON mapping.
    #[display("JSON mapping")]
    Json,
    /// The raw response, passed through without parsing.
    #[display("raw response")]
    Response,
}

impl ReturnShape {
    /// Every supported shape.
    pub const ALL: [Self; 3] = [Self::Model, Self::Json, Self::Response];
}

/// Decode a checked response into an endpoint's return value.
///
/// Implemented for [`Response<Bytes>`] (raw passthrough), JSON mappings, and
/// any record type through `#[derive(Model)]`.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a supported endpoint return type",
    label = "expected a model, a JSON mapping or a raw response",
    note = "derive `Model` for record types, or return `serde_json::Map<String, Value>` or `Response<Bytes>`"
)]
pub trait FromResponse: Sized {
    /// The return shape this type stands for.
    const SHAPE: ReturnShape;

    /// Decode the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the body does not match the declared shape.
    fn from_response(response: Response<Bytes>) -> crate::Result<Self>;
}

impl FromResponse for Response<Bytes> {
    const SHAPE: ReturnShape = ReturnShape::Response;

    fn from_response(response: Response<Bytes>) -> crate::Result<Self> {
        Ok(response)
    }
}

impl FromResponse for Map<String, Value> {
    const SHAPE: ReturnShape = ReturnShape::Json;

    fn from_response(response: Response<Bytes>) -> crate::Result<Self> {
        response.json()
    }
}

impl FromResponse for Value {
    const SHAPE: ReturnShape = ReturnShape::Json;

    fn from_response(response: Response<Bytes>) -> crate::Result<Self> {
        response.json()
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use serde_json::json;

    use super::*;

    fn response(status: u16, body: &'static str) -> Response<Bytes> {
        Response::new(status, HeaderMap::new(), Bytes::from_static(body.as_bytes()))
    }

    #[test]
    fn response_basic() {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/json"),
        );

        let response = Response::new(200, headers, Bytes::from(r#"{"id":1}"#));

        check!(response.status() == 200);
        check!(response.header("Content-Type") == Some("application/json"));
        check!(response.is_success());
        check!(!response.is_client_error());
        check!(!response.is_server_error());
    }

    #[test]
    fn response_status_checks() {
        check!(response(404, "").is_client_error());
        check!(response(500, "").is_server_error());
    }

    #[test]
    fn error_for_status_keeps_body() {
        let_assert!(Err(err) = response(404, r#"{"error":"missing"}"#).error_for_status());
        check!(err.status() == Some(404));
        check!(err.to_string() == "HTTP error 404: Not Found");
        check!(err.body().map(|body| &body[..]) == Some(br#"{"error":"missing"}"#.as_slice()));

        check!(response(204, "").error_for_status().is_ok());
        check!(response(302, "").error_for_status().is_ok());
    }

    #[test]
    fn response_json() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct User {
            id: u64,
            name: String,
        }

        let response = response(200, r#"{"id":1,"name":"test"}"#);
        let_assert!(Ok(user) = response.json::<User>());
        check!(user == User { id: 1, name: "test".to_string() });
    }

    #[test]
    fn raw_response_is_passed_through() {
        let_assert!(Ok(raw) = Response::<Bytes>::from_response(response(200, "<html>not json</html>")));
        check!(&raw.body()[..] == b"<html>not json</html>");
        check!(<Response<Bytes> as FromResponse>::SHAPE == ReturnShape::Response);
    }

    #[test]
    fn json_mapping_decodes_objects_only() {
        let_assert!(Ok(map) = Map::<String, Value>::from_response(response(200, r#"{"a":[1,2]}"#)));
        check!(map.get("a") == Some(&json!([1, 2])));

        let_assert!(Err(err) = Map::<String, Value>::from_response(response(200, "[1,2]")));
        check!(err.to_string().starts_with("JSON deserialization error"));
    }

    #[test]
    fn return_shape_display() {
        let names: Vec<_> = ReturnShape::ALL.iter().map(ToString::to_string).collect();
        check!(names == vec!["model", "JSON mapping", "raw response"]);
    }
}
