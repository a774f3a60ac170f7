//! Macro expansion logic for fastclient.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{FnArg, Ident, ItemTrait, Pat, TraitItem, Type, parse2};

use crate::attrs::{
    FastclientArgs, HttpMethod, MethodParam, find_http_attribute, is_http_attr, is_param_attr,
    parse_fastclient_args, parse_http_spec, parse_marker,
};
use crate::check::check_declaration;
use crate::codegen::{EndpointDecl, analyze_return_type, generate_call_body, generate_client_struct};

/// Information about a parsed trait method.
struct TraitMethodInfo {
    /// The method signature, markers stripped.
    sig: syn::Signature,
    /// The HTTP method (GET, POST, etc.).
    http_method: HttpMethod,
    /// The URL path template.
    path: String,
    /// Parsed parameters.
    params: Vec<MethodParam>,
    /// Inner type of the returned `Result`.
    returns: Type,
    /// Attributes kept on the clean trait.
    attrs: Vec<syn::Attribute>,
}

impl TraitMethodInfo {
    fn endpoint_fn_name(&self, trait_name: &Ident) -> Ident {
        format_ident!("__fastclient_{}_{}", trait_name, self.sig.ident)
    }

    fn decl<'a>(&'a self, args: &'a FastclientArgs) -> EndpointDecl<'a> {
        EndpointDecl {
            name: &self.sig.ident,
            method: self.http_method,
            path: &self.path,
            params: &self.params,
            returns: &self.returns,
            user_agent: args.user_agent.as_deref(),
        }
    }
}

/// Expand the `#[fastclient]` attribute on a trait.
pub(crate) fn expand_fastclient_trait(
    attr: TokenStream,
    item: TokenStream,
) -> syn::Result<TokenStream> {
    let trait_def: ItemTrait = parse2(item)?;
    let args = parse_fastclient_args(attr)?;

    if !trait_def.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &trait_def.generics,
            "generic traits are not supported by #[fastclient]",
        ));
    }

    let trait_name = &trait_def.ident;
    let vis = &trait_def.vis;
    let (methods, provided) = extract_trait_methods(&trait_def)?;

    let clean_trait = generate_clean_trait(&methods, &provided, &trait_def);

    let endpoint_fns: Vec<_> = methods
        .iter()
        .map(|m| m.endpoint_fn_name(trait_name))
        .collect();
    let endpoint_decls = methods
        .iter()
        .zip(&endpoint_fns)
        .map(|(m, fn_name)| m.decl(&args).endpoint_fn(fn_name));

    let method_impls = methods.iter().zip(&endpoint_fns).map(|(m, fn_name)| {
        let sig = &m.sig;
        let body = generate_call_body(&quote!(#fn_name), &m.params);
        quote! {
            #sig {
                #body
            }
        }
    });

    let client_name = format_ident!("{}Client", trait_name);
    let client_struct = generate_client_struct(
        vis,
        trait_name,
        &client_name,
        args.url.as_ref(),
        &endpoint_fns,
    );

    Ok(quote! {
        #clean_trait

        #(#endpoint_decls)*

        impl<__C: ::fastclient::Client + ?Sized> #trait_name for __C {
            #(#method_impls)*
        }

        #client_struct
    })
}

/// Split trait methods into declared endpoints and provided methods.
fn extract_trait_methods(
    trait_def: &ItemTrait,
) -> syn::Result<(Vec<TraitMethodInfo>, Vec<syn::TraitItemFn>)> {
    let mut methods = Vec::new();
    let mut provided = Vec::new();

    for item in &trait_def.items {
        let TraitItem::Fn(method) = item else {
            return Err(syn::Error::new_spanned(
                item,
                "only methods are supported in a #[fastclient] trait",
            ));
        };

        let Some((http_method, path)) = find_http_attribute(&method.attrs)? else {
            if method.default.is_some() {
                provided.push(method.clone());
                continue;
            }
            return Err(syn::Error::new_spanned(
                &method.sig,
                format!(
                    "method `{}` needs an HTTP method attribute: #[get], #[post], #[put], #[delete], #[patch], #[head], #[options] or #[http]",
                    method.sig.ident
                ),
            ));
        };

        if method.default.is_some() {
            return Err(syn::Error::new_spanned(
                &method.sig,
                "declared endpoints cannot have a default body",
            ));
        }

        check_signature(&method.sig)?;
        let params = parse_method_params(&method.sig)?;
        check_declaration(&method.sig.ident, &path, &params)?;
        let returns = analyze_return_type(&method.sig.output)
            .map_err(|e| syn::Error::new_spanned(&method.sig, e))?;
        let attrs = method
            .attrs
            .iter()
            .filter(|a| !is_http_attr(a))
            .cloned()
            .collect();

        methods.push(TraitMethodInfo {
            sig: strip_param_attrs(&method.sig),
            http_method,
            path,
            params,
            returns,
            attrs,
        });
    }

    Ok((methods, provided))
}

/// Reject signatures the generated shim cannot implement.
fn check_signature(sig: &syn::Signature) -> syn::Result<()> {
    if let Some(asyncness) = &sig.asyncness {
        return Err(syn::Error::new_spanned(
            asyncness,
            "endpoint methods are blocking: remove `async`",
        ));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "generic endpoint methods are not supported",
        ));
    }
    match sig.inputs.first() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some() && receiver.mutability.is_none() =>
        {
            Ok(())
        }
        Some(other) => Err(syn::Error::new_spanned(
            other,
            "endpoint methods must take `&self`",
        )),
        None => Err(syn::Error::new_spanned(
            &sig.ident,
            "endpoint methods must take `&self`",
        )),
    }
}

/// Parse method parameters and their markers.
///
/// Unmarked parameters are left to the runtime scanner, which binds them from
/// their type and the URL template.
fn parse_method_params(sig: &syn::Signature) -> syn::Result<Vec<MethodParam>> {
    let mut params = Vec::new();

    for input in &sig.inputs {
        let FnArg::Typed(pat_type) = input else {
            continue;
        };
        let Pat::Ident(pat_ident) = pat_type.pat.as_ref() else {
            return Err(syn::Error::new_spanned(
                &pat_type.pat,
                "endpoint parameters must be plain identifiers",
            ));
        };
        if let Type::ImplTrait(_) = pat_type.ty.as_ref() {
            return Err(syn::Error::new_spanned(
                &pat_type.ty,
                "`impl Trait` parameters are not supported: use a concrete type",
            ));
        }

        params.push(MethodParam {
            name: pat_ident.ident.clone(),
            ty: (*pat_type.ty).clone(),
            marker: parse_marker(&pat_type.attrs)?,
        });
    }

    Ok(params)
}

/// Generate a clean trait without fastclient-specific attributes.
fn generate_clean_trait(
    methods: &[TraitMethodInfo],
    provided: &[syn::TraitItemFn],
    original: &ItemTrait,
) -> TokenStream {
    let vis = &original.vis;
    let name = &original.ident;
    let colon = &original.colon_token;
    let supertraits = &original.supertraits;

    // Copy non-fastclient attributes from original trait
    let trait_attrs: Vec<_> = original
        .attrs
        .iter()
        .filter(|a| {
            let path = a.path();
            path.is_ident("doc") || path.is_ident("allow") || path.is_ident("cfg")
        })
        .collect();

    let method_signatures = methods.iter().map(|m| {
        let attrs = &m.attrs;
        let sig = &m.sig;
        quote! {
            #(#attrs)*
            #sig;
        }
    });

    quote! {
        #(#trait_attrs)*
        #vis trait #name #colon #supertraits {
            #(#method_signatures)*
            #(#provided)*
        }
    }
}

/// Strip parameter markers from a method signature.
fn strip_param_attrs(sig: &syn::Signature) -> syn::Signature {
    let mut clean_sig = sig.clone();
    for input in &mut clean_sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            pat_type.attrs.retain(|attr| !is_param_attr(attr));
        }
    }
    clean_sig
}

// Standalone method attribute macros (used on inherent methods of a `Client`)

/// Expand an HTTP method attribute on a standalone method.
pub(crate) fn expand_http_method(
    method: HttpMethod,
    attr: TokenStream,
    item: TokenStream,
) -> syn::Result<TokenStream> {
    let path: syn::LitStr = parse2(attr)?;
    let method_fn: syn::ImplItemFn = parse2(item)?;
    generate_standalone_method(&method_fn, method, &path.value())
}

/// Expand a custom `#[http("VERB /path")]` attribute on a standalone method.
pub(crate) fn expand_custom_http(attr: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    let spec: syn::LitStr = parse2(attr)?;
    let (method, path) = parse_http_spec(&spec)?;
    let method_fn: syn::ImplItemFn = parse2(item)?;
    generate_standalone_method(&method_fn, method, &path)
}

/// Generate a standalone method implementation.
///
/// The method body is replaced. Declaration errors are reported here; the
/// endpoint itself is built on first call.
fn generate_standalone_method(
    method_fn: &syn::ImplItemFn,
    http_method: HttpMethod,
    path: &str,
) -> syn::Result<TokenStream> {
    check_signature(&method_fn.sig)?;
    let params = parse_method_params(&method_fn.sig)?;
    check_declaration(&method_fn.sig.ident, path, &params)?;
    let returns = analyze_return_type(&method_fn.sig.output)
        .map_err(|e| syn::Error::new_spanned(&method_fn.sig, e))?;

    let attrs = &method_fn.attrs;
    let vis = &method_fn.vis;
    let sig = strip_param_attrs(&method_fn.sig);

    let decl = EndpointDecl {
        name: &method_fn.sig.ident,
        method: http_method,
        path,
        params: &params,
        returns: &returns,
        user_agent: None,
    };
    let fn_name = format_ident!("__fastclient_endpoint");
    let endpoint_fn = decl.endpoint_fn(&fn_name);
    let body = generate_call_body(&quote!(#fn_name), &params);

    Ok(quote! {
        #(#attrs)*
        #vis #sig {
            #endpoint_fn
            #body
        }
    })
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;

    fn expand_trait(item: TokenStream) -> syn::Result<String> {
        expand_fastclient_trait(quote! { url = "https://api.example.com" }, item)
            .map(|tokens| tokens.to_string())
    }

    #[test]
    fn expand_trait_generates_client() {
        let_assert!(
            Ok(expanded) = expand_trait(quote! {
                /// Blog API.
                pub trait BlogApi {
                    /// Comments of a post.
                    #[get("/posts/{post_id}/comments")]
                    fn get_comments(&self, post_id: u32, #[query("testID")] qs_test_id: u32) -> fastclient::Result<JsonMap>;
                }
            })
        );

        check!(expanded.contains("pub trait BlogApi"));
        check!(expanded.contains("fn __fastclient_BlogApi_get_comments ()"));
        check!(expanded.contains("impl < __C : :: fastclient :: Client + ? Sized > BlogApi for __C"));
        check!(expanded.contains("pub struct BlogApiClient"));
        check!(expanded.contains("pub fn with_transport"));
        check!(expanded.contains("pub fn connect ()"));
        // markers never reach the clean trait
        check!(!expanded.contains("# [query"));
        check!(!expanded.contains("# [get"));
    }

    #[test]
    fn expand_trait_without_url() {
        let_assert!(
            Ok(expanded) = expand_fastclient_trait(
                TokenStream::new(),
                quote! {
                    trait Api {
                        #[http("DELETE /posts/{id}")]
                        fn delete_post(&self, id: u32) -> Result<Response<Bytes>>;
                    }
                }
            )
        );
        let expanded = expanded.to_string();
        check!(expanded.contains(":: fastclient :: Method :: Delete"));
        check!(!expanded.contains("with_transport"));
    }

    #[test]
    fn provided_methods_are_kept() {
        let_assert!(
            Ok(expanded) = expand_trait(quote! {
                trait Api {
                    #[get("/posts")]
                    fn list(&self) -> Result<JsonMap>;

                    fn count(&self) -> usize {
                        self.list().map(|posts| posts.len()).unwrap_or_default()
                    }
                }
            })
        );
        check!(expanded.contains("fn count (& self) -> usize"));
        check!(!expanded.contains("__fastclient_Api_count"));
    }

    #[test]
    fn missing_return_type_is_a_compile_error() {
        let_assert!(
            Err(err) = expand_trait(quote! {
                trait Api {
                    #[get("/posts")]
                    fn list(&self);
                }
            })
        );
        check!(err.to_string() == "missing return type: expected one of model, JSON mapping, raw response, found none");
    }

    #[test]
    fn rejected_signatures() {
        let_assert!(
            Err(err) = expand_trait(quote! {
                trait Api {
                    #[get("/posts")]
                    async fn list(&self) -> Result<JsonMap>;
                }
            })
        );
        check!(err.to_string() == "endpoint methods are blocking: remove `async`");

        let_assert!(
            Err(err) = expand_trait(quote! {
                trait Api {
                    #[get("/posts")]
                    fn list() -> Result<JsonMap>;
                }
            })
        );
        check!(err.to_string() == "endpoint methods must take `&self`");

        let_assert!(
            Err(err) = expand_trait(quote! {
                trait Api {
                    fn list(&self) -> Result<JsonMap>;
                }
            })
        );
        check!(err.to_string().starts_with("method `list` needs an HTTP method attribute"));

        let_assert!(
            Err(err) = expand_trait(quote! {
                trait Api {
                    const VERSION: u32;
                }
            })
        );
        check!(err.to_string() == "only methods are supported in a #[fastclient] trait");
    }

    #[test]
    fn expand_custom_http_get() {
        let attr: TokenStream = quote! { "GET /users/{id}" };
        let item: TokenStream = quote! {
            pub fn get_user(&self, id: u64) -> fastclient::Result<User> { todo!() }
        };
        let_assert!(Ok(expanded) = expand_custom_http(attr, item));
        let expanded = expanded.to_string();
        check!(expanded.contains("fn __fastclient_endpoint ()"));
        check!(!expanded.contains("todo"));
    }

    #[test]
    fn expand_custom_http_invalid_format() {
        let attr: TokenStream = quote! { "/users" };
        let item: TokenStream = quote! {
            pub fn get_users(&self) -> fastclient::Result<JsonMap> { todo!() }
        };
        check!(expand_custom_http(attr, item).is_err());
    }

    #[test]
    fn expand_custom_http_invalid_method() {
        let attr: TokenStream = quote! { "UNKNOWN /users" };
        let item: TokenStream = quote! {
            pub fn get_users(&self) -> fastclient::Result<JsonMap> { todo!() }
        };
        let_assert!(Err(err) = expand_custom_http(attr, item));
        check!(err.to_string().starts_with("unsupported HTTP method: UNKNOWN"));
    }

    #[test]
    fn expand_http_method_with_markers() {
        let attr: TokenStream = quote! { "/posts" };
        let item: TokenStream = quote! {
            pub fn create_post(&self, #[body(embed = false)] post: &NewPost) -> fastclient::Result<Post> {
                unreachable!()
            }
        };
        let_assert!(Ok(expanded) = expand_http_method(HttpMethod::Post, attr, item));
        let expanded = expanded.to_string();
        check!(expanded.contains(":: fastclient :: Param :: new :: < & NewPost > (\"post\")"));
        check!(expanded.contains(". embed (false)"));
        check!(expanded.contains("arguments . insert (\"post\" , & post) ?"));
    }

    #[test]
    fn declaration_errors_are_compile_errors() {
        let_assert!(
            Err(err) = expand_trait(quote! {
                trait Api {
                    #[get("/posts")]
                    fn list(&self, #[path] page: u32) -> Result<JsonMap>;
                }
            })
        );
        check!(err.to_string() == "path parameter `page` has no `{page}` placeholder in `/posts`");

        let_assert!(
            Err(err) = expand_http_method(
                HttpMethod::Get,
                quote! { "/posts/{post_id}" },
                quote! {
                    fn post(&self, #[query] id: u32) -> fastclient::Result<Post> { unreachable!() }
                },
            )
        );
        check!(err.to_string() == "placeholder `{post_id}` in `/posts/{post_id}` has no path parameter");

        let_assert!(
            Err(err) = expand_custom_http(
                quote! { "GET /posts/{id" },
                quote! {
                    fn post(&self, id: u32) -> fastclient::Result<Post> { unreachable!() }
                },
            )
        );
        check!(err.to_string() == "malformed path template `/posts/{id`: unclosed `{`");

        let_assert!(
            Err(err) = expand_http_method(
                HttpMethod::Put,
                quote! { "/posts" },
                quote! {
                    fn replace(&self, #[body(embed = false)] post: &NewPost, #[body] user_id: u32) -> fastclient::Result<Post> {
                        unreachable!()
                    }
                },
            )
        );
        check!(err.to_string() == "body parameter `post` is not embedded but the body has 2 parameters");
    }

    #[test]
    fn marked_parameters_are_bound_to_scalar_values() {
        let_assert!(
            Ok(expanded) = expand_http_method(
                HttpMethod::Get,
                quote! { "/posts" },
                quote! {
                    fn bad(&self, #[query] tag: Tag) -> fastclient::Result<JsonMap> { unreachable!() }
                },
            )
        );
        let expanded = expanded.to_string();
        check!(expanded.contains(":: fastclient :: ScalarValue"));
        check!(expanded.contains("scalar :: < Tag > ()"));
    }
}
