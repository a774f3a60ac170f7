//! Declarative HTTP API clients for Rust.
//!
//! Describe a remote API as a trait of annotated methods; every method gets a
//! registered endpoint that validates its arguments, renders them into a
//! request (path, query, headers, JSON body), sends it through a blocking
//! transport and decodes the response into the declared return type.
//!
//! # Example
//!
//! ```no_run
//! use fastclient::prelude::*;
//!
//! #[derive(Debug, Serialize, Deserialize, Model)]
//! pub struct Post {
//!     id: u32,
//!     title: String,
//!     body: String,
//! }
//!
//! #[fastclient(url = "https://jsonplaceholder.typicode.com")]
//! pub trait Blog {
//!     #[get("/posts/{post_id}")]
//!     fn get_post(&self, #[path(gt = 0)] post_id: u32) -> fastclient::Result<Post>;
//!
//!     #[get("/comments")]
//!     fn comments(&self, #[query(alias = "postId")] post_id: u32) -> fastclient::Result<Response<Bytes>>;
//! }
//!
//! let client = BlogClient::connect()?;
//! let post = client.get_post(1)?;
//! # Ok::<(), fastclient::Error>(())
//! ```
//!
//! The same endpoints can be declared without macros through
//! [`Endpoint::builder`].

mod api_client;
mod config;
mod connector;
pub mod middleware;
pub mod prelude;
mod transport;

pub use api_client::ApiClient;
pub use config::TransportConfig;
pub use transport::{BoxedService, HyperTransport, HyperTransportBuilder, ServiceFuture};

// Re-export core types
pub use fastclient_core::{
    Arguments, Binding, BindingDescriptor, BindingKind, Client, CompiledPlan, ConfigurationError,
    Constraint, DEFAULT_USER_AGENT, Endpoint, EndpointBuilder, Error, FieldError, JSON_MEDIA_TYPE,
    FieldType, FromResponse, JsonMap, Method, Param, ParameterPlan, PathTemplate, RecordError,
    RecordSchema, Request, RequestBuilder, RequestShape, Response, Result, ReturnShape, ScalarValue,
    Schema, Signature, TemplateError, Transport, TypeAdapter, Validated, ValidationError, from_json,
    join, to_json,
};

// Re-export http types for status codes and headers
pub use fastclient_core::{HeaderMap, StatusCode, header};

// Re-export crates for macro-generated code
pub use bytes::{self, Bytes};
pub use serde;
pub use serde_json;
pub use tower;
pub use url;

// Re-export macros
pub use fastclient_macro::{
    Model, delete, fastclient, get, head, http, options, patch, post, put,
};
