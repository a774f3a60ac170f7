//! Attribute parsing for fastclient proc-macros.

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{Expr, ExprLit, ExprUnary, Ident, Lit, LitStr, Type, UnOp};

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    /// Variant name of `fastclient::Method`, for code generation.
    #[must_use]
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "Get",
            Self::Post => "Post",
            Self::Put => "Put",
            Self::Delete => "Delete",
            Self::Patch => "Patch",
            Self::Head => "Head",
            Self::Options => "Options",
        }
    }

    /// Parse an HTTP method from a string (case-insensitive).
    /// Returns `None` for unsupported methods.
    #[must_use]
    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            "PATCH" => Some(Self::Patch),
            "HEAD" => Some(Self::Head),
            "OPTIONS" => Some(Self::Options),
            _ => None,
        }
    }

    /// Method of a `#[get]`-style attribute name.
    #[must_use]
    pub(crate) fn from_attr(name: &Ident) -> Option<Self> {
        [
            ("get", Self::Get),
            ("post", Self::Post),
            ("put", Self::Put),
            ("delete", Self::Delete),
            ("patch", Self::Patch),
            ("head", Self::Head),
            ("options", Self::Options),
        ]
        .into_iter()
        .find_map(|(attr, method)| (name == attr).then_some(method))
    }
}

/// Parse a `"VERB /path"` specification, as used by `#[http(...)]`.
pub(crate) fn parse_http_spec(spec: &LitStr) -> syn::Result<(HttpMethod, String)> {
    let value = spec.value();
    let (method, path) = value.split_once(' ').ok_or_else(|| {
        syn::Error::new_spanned(
            spec,
            "expected format: \"METHOD /path\" (e.g., \"GET /users/{id}\")",
        )
    })?;
    let method = HttpMethod::parse(method).ok_or_else(|| {
        syn::Error::new_spanned(
            spec,
            format!(
                "unsupported HTTP method: {method}. Supported: GET, POST, PUT, DELETE, PATCH, HEAD, OPTIONS"
            ),
        )
    })?;
    Ok((method, path.trim().to_string()))
}

/// Find and parse the HTTP method attribute of a method.
pub(crate) fn find_http_attribute(
    attrs: &[syn::Attribute],
) -> syn::Result<Option<(HttpMethod, String)>> {
    for attr in attrs {
        let Some(ident) = attr.path().get_ident() else {
            continue;
        };
        if let Some(method) = HttpMethod::from_attr(ident) {
            let path: LitStr = attr.parse_args()?;
            return Ok(Some((method, path.value())));
        }
        if ident == "http" {
            let spec: LitStr = attr.parse_args()?;
            return parse_http_spec(&spec).map(Some);
        }
    }
    Ok(None)
}

/// Returns `true` for the method-level attributes consumed by `#[fastclient]`.
pub(crate) fn is_http_attr(attr: &syn::Attribute) -> bool {
    attr.path()
        .get_ident()
        .is_some_and(|ident| ident == "http" || HttpMethod::from_attr(ident).is_some())
}

// ============================================================================
// Parameter markers
// ============================================================================

/// Parameter marker attribute names, stripped from generated code.
pub(crate) const PARAM_ATTRS: &[&str] = &["path", "query", "header", "body"];

/// Binding kind of a parameter marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MarkerKind {
    Path,
    Query,
    Header,
    Body,
}

impl MarkerKind {
    fn from_ident(ident: &Ident) -> Option<Self> {
        [
            ("path", Self::Path),
            ("query", Self::Query),
            ("header", Self::Header),
            ("body", Self::Body),
        ]
        .into_iter()
        .find_map(|(attr, kind)| (ident == attr).then_some(kind))
    }

    /// Constructor of `fastclient::Binding` for this kind.
    fn constructor(self) -> Ident {
        let name = match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Body => "body",
        };
        Ident::new(name, Span::call_site())
    }
}

/// A validation constraint written on a marker.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ConstraintArg {
    Bound(&'static str, f64),
    Length(&'static str, usize),
}

/// A parsed parameter marker, e.g. `#[query(alias = "testID", gt = 0)]`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Marker {
    pub(crate) kind: MarkerKind,
    pub(crate) alias: Option<String>,
    pub(crate) constraints: Vec<ConstraintArg>,
    pub(crate) embed: bool,
}

impl Marker {
    fn new(kind: MarkerKind) -> Self {
        Self {
            kind,
            alias: None,
            constraints: Vec::new(),
            embed: true,
        }
    }

    /// `fastclient::Binding` expression for this marker.
    pub(crate) fn to_binding(&self) -> TokenStream {
        let constructor = self.kind.constructor();
        let alias = self.alias.as_ref().map(|alias| quote! { .alias(#alias) });
        let constraints = self.constraints.iter().map(|constraint| match constraint {
            ConstraintArg::Bound(name, value) => {
                let method = Ident::new(name, Span::call_site());
                let literal = proc_macro2::Literal::f64_unsuffixed(value.abs());
                if value.is_sign_negative() {
                    quote! { .#method(-#literal) }
                } else {
                    quote! { .#method(#literal) }
                }
            }
            ConstraintArg::Length(name, value) => {
                let method = Ident::new(name, Span::call_site());
                quote! { .#method(#value) }
            }
        });
        let embed = (!self.embed).then(|| quote! { .embed(false) });
        quote! {
            ::fastclient::Binding::#constructor() #alias #(#constraints)* #embed
        }
    }
}

/// Parse the marker of a parameter, if any.
///
/// # Errors
///
/// Fails on more than one marker, unknown keys, or malformed values.
pub(crate) fn parse_marker(attrs: &[syn::Attribute]) -> syn::Result<Option<Marker>> {
    let mut found: Option<Marker> = None;
    for attr in attrs {
        let Some(kind) = attr.path().get_ident().and_then(MarkerKind::from_ident) else {
            continue;
        };
        if found.is_some() {
            return Err(syn::Error::new_spanned(
                attr,
                "a parameter takes at most one of #[path], #[query], #[header] or #[body]",
            ));
        }
        found = Some(parse_marker_attr(attr, kind)?);
    }
    Ok(found)
}

fn parse_marker_attr(attr: &syn::Attribute, kind: MarkerKind) -> syn::Result<Marker> {
    let mut marker = Marker::new(kind);
    let syn::Meta::List(list) = &attr.meta else {
        return Ok(marker);
    };

    // `#[query("testID")]` is shorthand for `#[query(alias = "testID")]`
    if let Ok(alias) = syn::parse2::<LitStr>(list.tokens.clone()) {
        marker.alias = Some(alias.value());
        return Ok(marker);
    }

    attr.parse_nested_meta(|meta| {
        let key = meta
            .path
            .get_ident()
            .map(ToString::to_string)
            .unwrap_or_default();
        match key.as_str() {
            "alias" => {
                let value: LitStr = meta.value()?.parse()?;
                marker.alias = Some(value.value());
            }
            "gt" | "ge" | "lt" | "le" => {
                let name = match key.as_str() {
                    "gt" => "gt",
                    "ge" => "ge",
                    "lt" => "lt",
                    _ => "le",
                };
                let value: Expr = meta.value()?.parse()?;
                marker
                    .constraints
                    .push(ConstraintArg::Bound(name, parse_number(&value)?));
            }
            "min_length" | "max_length" => {
                let name = if key == "min_length" {
                    "min_length"
                } else {
                    "max_length"
                };
                let value: syn::LitInt = meta.value()?.parse()?;
                marker
                    .constraints
                    .push(ConstraintArg::Length(name, value.base10_parse()?));
            }
            "embed" if kind == MarkerKind::Body => {
                let value: syn::LitBool = meta.value()?.parse()?;
                marker.embed = value.value;
            }
            "embed" => return Err(meta.error("`embed` only applies to #[body] parameters")),
            _ => {
                return Err(meta.error(
                    "unsupported marker option. Expected: alias, gt, ge, lt, le, min_length, max_length, embed",
                ));
            }
        }
        Ok(())
    })?;
    Ok(marker)
}

/// Evaluate a numeric literal, optionally negated.
fn parse_number(expr: &Expr) -> syn::Result<f64> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Int(lit), ..
        }) => lit.base10_parse::<i64>().map(|n| n as f64),
        Expr::Lit(ExprLit {
            lit: Lit::Float(lit),
            ..
        }) => lit.base10_parse(),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr,
            ..
        }) => parse_number(expr).map(|n| -n),
        other => Err(syn::Error::new_spanned(other, "expected a number literal")),
    }
}

/// Returns `true` if the attribute is a parameter marker.
pub(crate) fn is_param_attr(attr: &syn::Attribute) -> bool {
    let path = attr.path();
    PARAM_ATTRS.iter().any(|name| path.is_ident(name))
}

/// A parsed method parameter.
#[derive(Debug)]
pub(crate) struct MethodParam {
    /// Parameter name from the function signature.
    pub(crate) name: Ident,
    /// Parameter type.
    pub(crate) ty: Type,
    /// Explicit marker, if any.
    pub(crate) marker: Option<Marker>,
}

// ============================================================================
// #[fastclient] arguments
// ============================================================================

/// Arguments of the `#[fastclient]` attribute.
#[derive(Debug, Default)]
pub(crate) struct FastclientArgs {
    /// Default base URL.
    pub(crate) url: Option<LitStr>,
    /// `User-Agent` override.
    pub(crate) user_agent: Option<String>,
}

/// Parse the `#[fastclient(...)]` arguments.
pub(crate) fn parse_fastclient_args(attr: TokenStream) -> syn::Result<FastclientArgs> {
    let mut args = FastclientArgs::default();

    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("url") {
            let value: LitStr = meta.value()?.parse()?;
            args.url = Some(value);
            Ok(())
        } else if meta.path.is_ident("user_agent") {
            let value: LitStr = meta.value()?.parse()?;
            args.user_agent = Some(value.value());
            Ok(())
        } else {
            Err(meta.error("unsupported fastclient attribute. Expected: url, user_agent"))
        }
    });

    syn::parse::Parser::parse2(parser, attr)?;
    Ok(args)
}
