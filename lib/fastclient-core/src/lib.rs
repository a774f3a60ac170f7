//! Binding engine, core types and traits for the fastclient declarative HTTP
//! client.
//!
//! This crate provides the foundational pieces used by `fastclient`:
//! - [`Endpoint`] and [`EndpointBuilder`] - Declared endpoints and the call pipeline
//! - [`Signature`], [`Param`] and [`Binding`] - The descriptor table of an endpoint
//! - [`ParameterPlan`] - Parameters scanned into path, query, header and body groups
//! - [`CompiledPlan`] and [`TypeAdapter`] - Validation and serialization per group
//! - [`FieldType`], [`Constraint`] and [`Schema`] - Value shapes and their checks
//! - [`Request`], [`Response`] and [`FromResponse`] - Wire types and return shapes
//! - [`Client`] and [`Transport`] - Where rendered requests are sent
//! - [`Error`] and [`Result`] - Error handling

mod adapter;
mod args;
mod binding;
mod body;
mod client;
mod endpoint;
mod error;
mod method;
mod path_template;
mod plan;
pub mod prelude;
mod render;
mod request;
mod response;
mod schema;

pub use adapter::{CompiledPlan, TypeAdapter, Validated};
pub use args::Arguments;
pub use binding::{Binding, BindingDescriptor, BindingKind};
pub use body::{JSON_MEDIA_TYPE, from_json, to_json};
pub use client::{Client, Transport};
pub use endpoint::{Endpoint, EndpointBuilder};
pub use error::{ConfigurationError, Error, FieldError, Result, ValidationError};
pub use method::Method;
pub use path_template::{PathTemplate, TemplateError};
pub use plan::{Param, ParameterPlan, Signature};
pub use render::{DEFAULT_USER_AGENT, RequestShape, join};
pub use request::{Request, RequestBuilder};
pub use response::{FromResponse, ReturnShape, Response};
pub use schema::{Constraint, FieldType, RecordError, RecordSchema, ScalarValue, Schema};

// Re-export http crate types for status codes and headers
pub use http::{HeaderMap, StatusCode, header};

/// A generic JSON mapping, the `JSON mapping` return shape.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;
