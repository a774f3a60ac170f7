//! Prelude module for convenient imports.
//!
//! ```
//! use fastclient_core::prelude::*;
//! ```

pub use crate::{
    Arguments, Binding, Client, ConfigurationError, Endpoint, EndpointBuilder, Error, FromResponse,
    JsonMap, Method, Param, Request, Response, Result, Schema, Transport,
};
