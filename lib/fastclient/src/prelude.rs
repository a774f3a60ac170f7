//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types, functions, and macros
//! for easy glob importing:
//!
//! ```
//! use fastclient::prelude::*;
//! ```

pub use crate::{
    ApiClient, Arguments, Binding, Bytes, Client, ConfigurationError, Endpoint, Error,
    FromResponse, HyperTransport, JsonMap, Method, Model, Param, Request, Response, Result,
    Schema, Transport, delete, fastclient, get, head, http, options, patch, post, put,
};
pub use serde::{Deserialize, Serialize};
