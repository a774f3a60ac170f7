//! Declaration checks that need no type information.
//!
//! The runtime scanner applies the same rules when an endpoint is built;
//! running them during expansion turns a bad declaration into a compile error.

use std::collections::HashSet;

use fastclient_core::PathTemplate;
use syn::Ident;

use crate::attrs::{MarkerKind, MethodParam};

impl MarkerKind {
    const fn label(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Body => "body",
        }
    }
}

impl MethodParam {
    /// Name on the wire of an explicitly marked parameter.
    fn wire_name(&self) -> Option<(MarkerKind, String)> {
        let marker = self.marker.as_ref()?;
        let name = match (&marker.alias, marker.kind) {
            (Some(alias), _) => alias.clone(),
            (None, MarkerKind::Header) => self.name.to_string().replace('_', "-"),
            (None, _) => self.name.to_string(),
        };
        Some((marker.kind, name))
    }
}

/// Check an endpoint declaration against its URL template.
///
/// Unmarked parameters are bound from their type, which only the runtime
/// scanner knows; they are assumed to go in the path when their name matches
/// a placeholder and in the body otherwise.
pub(crate) fn check_declaration(endpoint: &Ident, path: &str, params: &[MethodParam]) -> syn::Result<()> {
    let template = PathTemplate::parse(path).map_err(|err| syn::Error::new(endpoint.span(), err))?;

    let mut seen = HashSet::new();
    let mut path_names = HashSet::new();
    for param in params {
        match param.wire_name() {
            Some((kind, wire)) => {
                if kind == MarkerKind::Path && !template.has_placeholder(&wire) {
                    return Err(syn::Error::new(
                        param.name.span(),
                        format!(
                            "path parameter `{}` has no `{{{wire}}}` placeholder in `{template}`",
                            param.name
                        ),
                    ));
                }
                let key = if kind == MarkerKind::Header {
                    wire.to_ascii_lowercase()
                } else {
                    wire.clone()
                };
                if !seen.insert((kind.label(), key)) {
                    return Err(syn::Error::new(
                        param.name.span(),
                        format!("duplicate {} name `{wire}`", kind.label()),
                    ));
                }
                if kind == MarkerKind::Path {
                    path_names.insert(wire);
                }
            }
            None => {
                let name = param.name.to_string();
                if template.has_placeholder(&name) {
                    path_names.insert(name);
                }
            }
        }
    }

    if let Some(placeholder) = template.placeholders().find(|name| !path_names.contains(*name)) {
        return Err(syn::Error::new(
            endpoint.span(),
            format!("placeholder `{{{placeholder}}}` in `{template}` has no path parameter"),
        ));
    }

    check_unembedded_body(&template, params)
}

/// An unembedded body parameter must be the only body parameter.
fn check_unembedded_body(template: &PathTemplate, params: &[MethodParam]) -> syn::Result<()> {
    let in_body = |param: &&MethodParam| match &param.marker {
        Some(marker) => marker.kind == MarkerKind::Body,
        None => !template.has_placeholder(&param.name.to_string()),
    };
    let count = params.iter().filter(in_body).count();
    let unembedded = params
        .iter()
        .find(|param| param.marker.as_ref().is_some_and(|marker| !marker.embed));
    match unembedded {
        Some(param) if count > 1 => Err(syn::Error::new(
            param.name.span(),
            format!(
                "body parameter `{}` is not embedded but the body has {count} parameters",
                param.name
            ),
        )),
        _ => Ok(()),
    }
}
