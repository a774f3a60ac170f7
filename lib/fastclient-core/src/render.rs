//! Request rendering.
//!
//! Turns validated argument values into a [`Request`]: path substitution,
//! base URL join, query string, JSON body and headers, in that order.

use bytes::Bytes;
use http::header::{ACCEPT, HeaderValue, USER_AGENT};
use url::Url;

use crate::adapter::{CompiledPlan, Validated};
use crate::binding::BindingKind;
use crate::path_template::PathTemplate;
use crate::{JSON_MEDIA_TYPE, Method, Request, Result};

/// Default `User-Agent` header value.
pub const DEFAULT_USER_AGENT: &str = concat!("fastclient/", env!("CARGO_PKG_VERSION"));

/// Everything about an endpoint's request that does not change between calls.
#[derive(Debug, Clone, Copy)]
pub struct RequestShape<'a> {
    /// HTTP method.
    pub method: Method,
    /// URL template, relative to the base URL.
    pub template: &'a PathTemplate,
    /// Adapters of the endpoint.
    pub compiled: &'a CompiledPlan,
    /// `User-Agent` sent unless a header parameter overrides it.
    pub user_agent: &'a str,
}

impl RequestShape<'_> {
    /// Render a request from validated values.
    ///
    /// # Errors
    ///
    /// Returns an error if a placeholder stays unresolved, the URL cannot be
    /// built, a header value is invalid, or the body cannot be serialized.
    pub fn render(&self, base_url: &Url, validated: &Validated) -> Result<Request<Bytes>> {
        let path_values = self.compiled.pairs(BindingKind::Path, validated);
        let path = self.template.render(|name| {
            path_values
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone())
        })?;
        let url = join(base_url, &path)?;

        let mut builder = Request::builder(self.method, url)
            .query_pairs(self.compiled.pairs(BindingKind::Query, validated));
        if let Some(body) = self.compiled.body(validated)? {
            builder = builder.json_bytes(body);
        }
        for (name, value) in self.compiled.pairs(BindingKind::Header, validated) {
            builder = builder.header(name, value)?;
        }

        let user_agent = HeaderValue::try_from(self.user_agent)
            .map_err(|e| crate::Error::invalid_request(format!("invalid user agent: {e}")))?;
        Ok(builder
            .default_header(USER_AGENT, user_agent)
            .default_header(ACCEPT, HeaderValue::from_static(JSON_MEDIA_TYPE))
            .build())
    }
}

/// Append `path` to the base URL, keeping the base URL's own path prefix.
///
/// A query string written in the template is kept; the base URL's query and
/// fragment are dropped.
///
/// # Errors
///
/// Returns an error if the base URL cannot carry a path.
pub fn join(base_url: &Url, path: &str) -> Result<Url> {
    if base_url.cannot_be_a_base() {
        return Err(crate::Error::invalid_request(format!(
            "base URL `{base_url}` cannot carry a path"
        )));
    }

    let (path, query) = match path.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (path, None),
    };

    let mut url = base_url.clone();
    let prefix = base_url.path().trim_end_matches('/');
    let relative = path.trim_start_matches('/');
    if !relative.is_empty() {
        url.set_path(&format!("{prefix}/{relative}"));
    }
    url.set_query(query);
    url.set_fragment(None);
    Ok(url)
}
