//! Attribute and derive macros behind `fastclient`.
//!
//! Endpoint attributes: `#[get]`, `#[post]`, `#[put]`, `#[delete]`,
//! `#[patch]`, `#[head]`, `#[options]` and `#[http("VERB /path")]`.
//! Parameter markers, read by those attributes: `#[path]`, `#[query]`,
//! `#[header]` and `#[body]`. `#[fastclient]` turns a trait of endpoints into
//! an API, and `#[derive(Model)]` makes a serde record bindable.
//!
//! Generated code names items through `::fastclient`, so depend on the facade
//! crate rather than on this one.
//!
//! # Example
//!
//! ```ignore
//! use fastclient::prelude::*;
//!
//! #[fastclient(url = "https://jsonplaceholder.typicode.com")]
//! pub trait Blog {
//!     #[get("/posts/{post_id}/comments")]
//!     fn get_comments(&self, #[path] post_id: u32) -> fastclient::Result<JsonMap>;
//! }
//!
//! let client = BlogClient::connect()?;
//! let comments = client.get_comments(1)?;
//! ```

mod attrs;
mod check;
mod codegen;
mod expand;
mod model_derive;

use proc_macro::TokenStream;

use crate::attrs::HttpMethod;

fn emit(expansion: syn::Result<proc_macro2::TokenStream>) -> TokenStream {
    expansion.unwrap_or_else(|e| e.to_compile_error()).into()
}

/// Declare a trait as a remote HTTP API.
///
/// Expands to:
/// - the trait itself, stripped of endpoint and marker attributes;
/// - one endpoint per method, registered on first use and shared by every call;
/// - a blanket implementation for every `fastclient::Client`;
/// - a `<Trait>Client<T = HyperTransport>` newtype around `ApiClient<T>`.
///
/// # Attributes
///
/// - `url`: default base URL. Adds `<Trait>Client::with_transport` and
///   `<Trait>Client::connect`.
/// - `user_agent`: `User-Agent` sent by every endpoint of the trait.
///
/// Endpoint methods take `&self`, block, and return `fastclient::Result<T>`
/// with `T` a `#[derive(Model)]` type, a JSON mapping or `Response<Bytes>`.
/// Unmarked parameters are bound when the endpoint is registered: records and
/// maps go to the body, names matching a `{placeholder}` go to the path.
///
/// ```ignore
/// #[fastclient(url = "https://api.example.com", user_agent = "blog/1.0")]
/// pub trait Blog {
///     #[get("/posts/{post_id}/comments")]
///     fn get_comments(
///         &self,
///         #[path(gt = 0)] post_id: u32,
///         #[query("testID")] qs_test_id: Option<u32>,
///     ) -> fastclient::Result<JsonMap>;
/// }
/// ```
#[proc_macro_attribute]
pub fn fastclient(attr: TokenStream, item: TokenStream) -> TokenStream {
    emit(expand::expand_fastclient_trait(attr.into(), item.into()))
}

macro_rules! verb_attribute {
    ($(#[$doc:meta])* $name:ident => $method:ident) => {
        $(#[$doc])*
        ///
        /// Inside a `#[fastclient]` trait the attribute only declares the
        /// endpoint. On an inherent method of a `fastclient::Client` type the
        /// method body is generated.
        #[proc_macro_attribute]
        pub fn $name(attr: TokenStream, item: TokenStream) -> TokenStream {
            emit(expand::expand_http_method(HttpMethod::$method, attr.into(), item.into()))
        }
    };
}

verb_attribute! {
    /// `GET` endpoint: `#[get("/posts/{id}")]`.
    get => Get
}

verb_attribute! {
    /// `POST` endpoint: `#[post("/posts")]`.
    post => Post
}

verb_attribute! {
    /// `PUT` endpoint: `#[put("/posts/{id}")]`.
    put => Put
}

verb_attribute! {
    /// `DELETE` endpoint: `#[delete("/posts/{id}")]`.
    delete => Delete
}

verb_attribute! {
    /// `PATCH` endpoint: `#[patch("/posts/{id}")]`.
    patch => Patch
}

verb_attribute! {
    /// `HEAD` endpoint: `#[head("/posts/{id}")]`.
    head => Head
}

verb_attribute! {
    /// `OPTIONS` endpoint: `#[options("/posts")]`.
    options => Options
}

/// Endpoint with the verb spelled out: `#[http("GET /posts/{id}/raw")]`.
///
/// The verb is case-insensitive and must be one of the verbs above.
#[proc_macro_attribute]
pub fn http(attr: TokenStream, item: TokenStream) -> TokenStream {
    emit(expand::expand_custom_http(attr.into(), item.into()))
}

/// Make a serde record usable as a parameter and as a return type.
///
/// Implements `Schema` (a record field type) and `FromResponse` (the model
/// return shape). The type must also derive `Serialize` and `Deserialize`.
/// Record arguments are validated by deserializing them, so errors point at
/// the failing field (`post.title`).
///
/// `#[model(name = "...")]` overrides the name used in error messages.
///
/// ```ignore
/// #[derive(Debug, Serialize, Deserialize, Model)]
/// struct Post {
///     id: u32,
///     title: String,
/// }
/// ```
#[proc_macro_derive(Model, attributes(model))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    emit(model_derive::expand_model_derive(input.into()))
}
