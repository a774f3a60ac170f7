//! Declared endpoints and the call pipeline.
//!
//! An [`Endpoint`] is registered once through an [`EndpointBuilder`]: the
//! builder scans the declared parameters and compiles their adapters, so every
//! configuration problem surfaces from [`EndpointBuilder::build`]. A built
//! endpoint is immutable and can be called from any number of threads.
//!
//! Each call runs validate, build, send, check and decode, in that order.
//!
//! ```
//! use fastclient_core::{Endpoint, JsonMap};
//!
//! let endpoint = Endpoint::<JsonMap>::get("/posts/{post_id}/comments")
//!     .named("get_comments")
//!     .path::<u32>("post_id")
//!     .build()?;
//! assert_eq!(endpoint.name(), "get_comments");
//! # Ok::<(), fastclient_core::ConfigurationError>(())
//! ```

use std::fmt;
use std::marker::PhantomData;

use bytes::Bytes;
use tracing::{debug, trace, warn};
use url::Url;

use crate::adapter::CompiledPlan;
use crate::args::Arguments;
use crate::binding::Binding;
use crate::error::ConfigurationError;
use crate::path_template::PathTemplate;
use crate::plan::{Param, ParameterPlan, Signature};
use crate::render::{DEFAULT_USER_AGENT, RequestShape};
use crate::response::FromResponse;
use crate::schema::Schema;
use crate::{Client, Method, Request, Result};

/// Builder for an [`Endpoint`] returning `R`.
pub struct EndpointBuilder<R> {
    method: Method,
    template: String,
    signature: Signature,
    user_agent: Option<String>,
    returns: PhantomData<fn() -> R>,
}

impl<R: FromResponse> EndpointBuilder<R> {
    /// Start declaring an endpoint.
    ///
    /// The endpoint is named `"{method} {template}"` until [`Self::named`] is
    /// called.
    #[must_use]
    pub fn new(method: Method, template: impl Into<String>) -> Self {
        let template = template.into();
        Self {
            signature: Signature::new(format!("{method} {template}")),
            method,
            template,
            user_agent: None,
            returns: PhantomData,
        }
    }

    /// Name used in errors and logs.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.signature.set_name(name.into());
        self
    }

    /// Declare a parameter.
    #[must_use]
    pub fn param(mut self, param: Param) -> Self {
        self.signature.push(param);
        self
    }

    /// Declare a parameter of type `T` with an explicit binding.
    #[must_use]
    pub fn bind<T: Schema + ?Sized>(self, name: impl Into<String>, binding: Binding) -> Self {
        self.param(Param::new::<T>(name).bind(binding))
    }

    /// Declare a parameter of type `T` without a marker; its binding is
    /// inferred from its type and the URL template.
    #[must_use]
    pub fn unbound<T: Schema + ?Sized>(self, name: impl Into<String>) -> Self {
        self.param(Param::new::<T>(name))
    }

    /// Declare a path parameter.
    #[must_use]
    pub fn path<T: Schema + ?Sized>(self, name: impl Into<String>) -> Self {
        self.bind::<T>(name, Binding::path())
    }

    /// Declare a query parameter.
    #[must_use]
    pub fn query<T: Schema + ?Sized>(self, name: impl Into<String>) -> Self {
        self.bind::<T>(name, Binding::query())
    }

    /// Declare a header parameter.
    #[must_use]
    pub fn header<T: Schema + ?Sized>(self, name: impl Into<String>) -> Self {
        self.bind::<T>(name, Binding::header())
    }

    /// Declare a body parameter.
    #[must_use]
    pub fn body<T: Schema + ?Sized>(self, name: impl Into<String>) -> Self {
        self.bind::<T>(name, Binding::body())
    }

    /// Override the default `User-Agent`.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Scan and compile the declaration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the template is malformed, the
    /// parameters cannot be bound, or the user agent is not a valid header
    /// value.
    pub fn build(self) -> std::result::Result<Endpoint<R>, ConfigurationError> {
        let Self {
            method,
            template,
            mut signature,
            user_agent,
            returns,
        } = self;
        let fail = |message: String| ConfigurationError::new(signature.name(), message);

        let template = PathTemplate::parse(&template).map_err(|e| fail(e.to_string()))?;
        let user_agent = user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        if http::HeaderValue::try_from(user_agent.as_str()).is_err() {
            return Err(fail(format!("invalid user agent `{user_agent}`")));
        }

        signature.set_returns(R::SHAPE);
        let plan = ParameterPlan::scan(&signature, &template)?;
        debug!(
            endpoint = plan.endpoint(),
            %method,
            template = template.as_str(),
            params = plan.params().len(),
            returns = %plan.returns(),
            "registered endpoint"
        );

        Ok(Endpoint {
            method,
            template,
            compiled: CompiledPlan::compile(plan),
            user_agent,
            returns,
        })
    }
}

impl<R> fmt::Debug for EndpointBuilder<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointBuilder")
            .field("method", &self.method)
            .field("template", &self.template)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// A registered endpoint returning `R`.
pub struct Endpoint<R> {
    method: Method,
    template: PathTemplate,
    compiled: CompiledPlan,
    user_agent: String,
    returns: PhantomData<fn() -> R>,
}

macro_rules! verb_constructors {
    ($($verb:ident => $method:ident),+ $(,)?) => {
        $(
            #[doc = concat!("Start declaring a `", stringify!($method), "` endpoint.")]
            #[must_use]
            pub fn $verb(template: impl Into<String>) -> EndpointBuilder<R> {
                Self::builder(Method::$method, template)
            }
        )+
    };
}

impl<R: FromResponse> Endpoint<R> {
    /// Start declaring an endpoint.
    #[must_use]
    pub fn builder(method: Method, template: impl Into<String>) -> EndpointBuilder<R> {
        EndpointBuilder::new(method, template)
    }

    verb_constructors!(
        get => Get,
        post => Post,
        put => Put,
        delete => Delete,
        patch => Patch,
        head => Head,
        options => Options,
    );

    /// Endpoint name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.compiled.plan().endpoint()
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// URL template.
    #[must_use]
    pub const fn template(&self) -> &PathTemplate {
        &self.template
    }

    /// The scanned parameter plan.
    #[must_use]
    pub const fn plan(&self) -> &ParameterPlan {
        self.compiled.plan()
    }

    /// The compiled adapters.
    #[must_use]
    pub const fn compiled(&self) -> &CompiledPlan {
        &self.compiled
    }

    fn shape(&self) -> RequestShape<'_> {
        RequestShape {
            method: self.method,
            template: &self.template,
            compiled: &self.compiled,
            user_agent: &self.user_agent,
        }
    }

    /// Validate the arguments and render the request, without sending it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Validation`] for rejected arguments, or a
    /// rendering error.
    pub fn prepare(&self, base_url: &Url, arguments: &Arguments) -> Result<Request<Bytes>> {
        let validated = self.compiled.validate(arguments)?;
        trace!(endpoint = self.name(), values = validated.len(), "validated arguments");
        self.shape().render(base_url, &validated)
    }

    /// Call the endpoint.
    ///
    /// Nothing is sent if validation fails. Error statuses are reported
    /// before any decoding, whatever the return shape.
    ///
    /// # Errors
    ///
    /// Returns validation, rendering, transport, HTTP status or decoding
    /// errors.
    pub fn call<C: Client + ?Sized>(&self, client: &C, arguments: Arguments) -> Result<R> {
        let request = self.prepare(client.base_url(), &arguments)?;
        debug!(
            endpoint = self.name(),
            method = %request.method(),
            url = %request.url(),
            "sending request"
        );

        let response = client.send(request)?.error_for_status().inspect_err(|error| {
            warn!(endpoint = self.name(), status = ?error.status(), "error status");
        })?;

        debug!(
            endpoint = self.name(),
            status = response.status(),
            shape = %R::SHAPE,
            "decoding response"
        );
        R::from_response(response)
    }
}

impl<R> Clone for Endpoint<R> {
    fn clone(&self) -> Self {
        Self {
            method: self.method,
            template: self.template.clone(),
            compiled: self.compiled.clone(),
            user_agent: self.user_agent.clone(),
            returns: PhantomData,
        }
    }
}

impl<R> fmt::Debug for Endpoint<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("method", &self.method)
            .field("template", &self.template)
            .field("plan", self.compiled.plan())
            .finish_non_exhaustive()
    }
}
