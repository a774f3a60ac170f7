//! Code generation for fastclient proc-macros.

use proc_macro2::TokenStream;
use quote::{quote, quote_spanned};
use syn::spanned::Spanned;
use syn::{GenericArgument, Ident, LitStr, PathArguments, ReturnType, Type, Visibility};

use crate::attrs::{HttpMethod, MarkerKind, MethodParam};

/// Error reported when a method declares no return type.
pub(crate) const MISSING_RETURN: &str =
    "missing return type: expected one of model, JSON mapping, raw response, found none";

/// Extract `T` from a `Result<T>` return type.
///
/// Whether `T` is a supported shape is checked by the compiler through the
/// `FromResponse` bound.
pub(crate) fn analyze_return_type(output: &ReturnType) -> syn::Result<Type> {
    let ty = match output {
        ReturnType::Default => {
            return Err(syn::Error::new(proc_macro2::Span::call_site(), MISSING_RETURN));
        }
        ReturnType::Type(_, ty) => ty.as_ref(),
    };
    unwrap_result_type(ty).cloned().ok_or_else(|| {
        syn::Error::new_spanned(
            ty,
            format!(
                "unsupported return type `{}`: expected `Result<T>` where T is a model, a JSON mapping or a raw response",
                quote!(#ty).to_string().replace(' ', "")
            ),
        )
    })
}

/// Unwrap `Result<T>` to get `T`, returns None if not a Result.
fn unwrap_result_type(ty: &Type) -> Option<&Type> {
    if let Type::Path(type_path) = ty
        && let Some(segment) = type_path.path.segments.last()
        && segment.ident == "Result"
        && let PathArguments::AngleBracketed(args) = &segment.arguments
        && let Some(GenericArgument::Type(inner)) = args.args.first()
    {
        return Some(inner);
    }
    None
}

/// Replace named lifetimes with `'_` and drop reference lifetimes, so the
/// type can be named inside a free function.
pub(crate) fn erase_lifetimes(ty: &Type) -> Type {
    match ty {
        Type::Reference(reference) => {
            let mut reference = reference.clone();
            reference.lifetime = None;
            reference.elem = Box::new(erase_lifetimes(&reference.elem));
            Type::Reference(reference)
        }
        Type::Path(type_path) => {
            let mut type_path = type_path.clone();
            for segment in &mut type_path.path.segments {
                if let PathArguments::AngleBracketed(args) = &mut segment.arguments {
                    for arg in &mut args.args {
                        match arg {
                            GenericArgument::Lifetime(lifetime) => {
                                *lifetime = syn::Lifetime::new("'_", lifetime.span());
                            }
                            GenericArgument::Type(inner) => *inner = erase_lifetimes(inner),
                            _ => {}
                        }
                    }
                }
            }
            Type::Path(type_path)
        }
        Type::Slice(slice) => {
            let mut slice = slice.clone();
            slice.elem = Box::new(erase_lifetimes(&slice.elem));
            Type::Slice(slice)
        }
        Type::Array(array) => {
            let mut array = array.clone();
            array.elem = Box::new(erase_lifetimes(&array.elem));
            Type::Array(array)
        }
        Type::Paren(paren) => erase_lifetimes(&paren.elem),
        Type::Group(group) => erase_lifetimes(&group.elem),
        other => other.clone(),
    }
}

/// Everything needed to declare one endpoint.
pub(crate) struct EndpointDecl<'a> {
    pub(crate) name: &'a Ident,
    pub(crate) method: HttpMethod,
    pub(crate) path: &'a str,
    pub(crate) params: &'a [MethodParam],
    pub(crate) returns: &'a Type,
    pub(crate) user_agent: Option<&'a str>,
}

impl EndpointDecl<'_> {
    /// The `EndpointBuilder` expression declaring this endpoint.
    pub(crate) fn builder(&self) -> TokenStream {
        let method = Ident::new(self.method.as_str(), proc_macro2::Span::call_site());
        let path = self.path;
        let name = self.name.to_string();
        let returns = self.returns;
        let params = self.params.iter().map(|param| {
            let name = param.name.to_string();
            let ty = erase_lifetimes(&param.ty);
            let binding = param.marker.as_ref().map(|marker| {
                let binding = marker.to_binding();
                quote! { .bind(#binding) }
            });
            quote! {
                .param(::fastclient::Param::new::<#ty>(#name) #binding)
            }
        });
        let user_agent = self.user_agent.map(|ua| quote! { .user_agent(#ua) });

        quote! {
            ::fastclient::Endpoint::<#returns>::builder(::fastclient::Method::#method, #path)
                .named(#name)
                #(#params)*
                #user_agent
        }
    }

    /// Compile-time bounds: path, query and header parameters must have a
    /// flat text form.
    pub(crate) fn scalar_bounds(&self) -> Option<TokenStream> {
        let types: Vec<_> = self
            .params
            .iter()
            .filter(|param| {
                param
                    .marker
                    .as_ref()
                    .is_some_and(|marker| marker.kind != MarkerKind::Body)
            })
            .map(|param| {
                let ty = erase_lifetimes(&param.ty);
                quote_spanned! {param.ty.span()=> scalar::<#ty>(); }
            })
            .collect();
        (!types.is_empty()).then(|| {
            quote! {
                fn scalar<T: ::fastclient::ScalarValue + ?::std::marker::Sized>() {}
                #(#types)*
            }
        })
    }

    /// A function returning the lazily built, shared endpoint.
    pub(crate) fn endpoint_fn(&self, fn_name: &Ident) -> TokenStream {
        let returns = self.returns;
        let builder = self.builder();
        let scalar_bounds = self.scalar_bounds();
        quote! {
            #[doc(hidden)]
            #[allow(non_snake_case)]
            fn #fn_name() -> ::std::result::Result<
                &'static ::fastclient::Endpoint<#returns>,
                ::fastclient::ConfigurationError,
            > {
                #scalar_bounds
                static ENDPOINT: ::std::sync::OnceLock<
                    ::std::result::Result<
                        ::fastclient::Endpoint<#returns>,
                        ::fastclient::ConfigurationError,
                    >,
                > = ::std::sync::OnceLock::new();
                ENDPOINT
                    .get_or_init(|| #builder.build())
                    .as_ref()
                    .map_err(::std::clone::Clone::clone)
            }
        }
    }
}

/// Body of a generated method: collect the arguments and call the endpoint.
pub(crate) fn generate_call_body(endpoint_fn: &TokenStream, params: &[MethodParam]) -> TokenStream {
    let inserts = params.iter().map(|param| {
        let ident = &param.name;
        let name = ident.to_string();
        quote! { arguments.insert(#name, &#ident)?; }
    });
    let arguments = if params.is_empty() {
        quote! { let arguments = ::fastclient::Arguments::new(); }
    } else {
        quote! {
            let mut arguments = ::fastclient::Arguments::new();
            #(#inserts)*
        }
    };

    quote! {
        let endpoint = #endpoint_fn()?;
        #arguments
        endpoint.call(self, arguments)
    }
}

/// Generate the named client newtype for a trait-based API.
pub(crate) fn generate_client_struct(
    vis: &Visibility,
    trait_name: &Ident,
    client_name: &Ident,
    url: Option<&LitStr>,
    endpoint_fns: &[Ident],
) -> TokenStream {
    let doc = format!("Client for [`{trait_name}`], backed by one transport.");

    let default_url = url.map(|url| {
        quote! {
            /// Create a client for the default base URL.
            ///
            /// # Errors
            ///
            /// Returns an error if the default URL is invalid or an endpoint
            /// declaration is rejected.
            pub fn with_transport(transport: T) -> ::fastclient::Result<Self> {
                let base_url = ::fastclient::url::Url::parse(#url)?;
                Ok(Self::new(transport, base_url)?)
            }
        }
    });
    let connect = url.map(|_| {
        quote! {
            impl #client_name {
                /// Create a client for the default base URL over a default
                /// [`HyperTransport`](::fastclient::HyperTransport).
                ///
                /// # Errors
                ///
                /// Returns an error if the transport cannot start, the default
                /// URL is invalid, or an endpoint declaration is rejected.
                pub fn connect() -> ::fastclient::Result<Self> {
                    Self::with_transport(::fastclient::HyperTransport::new()?)
                }
            }
        }
    });

    quote! {
        #[doc = #doc]
        #vis struct #client_name<T: ::fastclient::Transport = ::fastclient::HyperTransport>(
            ::fastclient::ApiClient<T>,
        );

        impl<T: ::fastclient::Transport> #client_name<T> {
            /// Create a client and register every endpoint of the API.
            ///
            /// # Errors
            ///
            /// Returns the first endpoint declaration that is rejected.
            pub fn new(
                transport: T,
                base_url: ::fastclient::url::Url,
            ) -> ::std::result::Result<Self, ::fastclient::ConfigurationError> {
                #(#endpoint_fns()?;)*
                Ok(Self(::fastclient::ApiClient::new(transport, base_url)))
            }

            #default_url

            /// The underlying API client.
            #[must_use]
            pub const fn api_client(&self) -> &::fastclient::ApiClient<T> {
                &self.0
            }

            /// The transport.
            #[must_use]
            pub const fn transport(&self) -> &T {
                self.0.transport()
            }

            /// Consume the client and return the underlying API client.
            #[must_use]
            pub fn into_inner(self) -> ::fastclient::ApiClient<T> {
                self.0
            }
        }

        #connect

        impl<T: ::fastclient::Transport> ::fastclient::Client for #client_name<T> {
            fn base_url(&self) -> &::fastclient::url::Url {
                ::fastclient::Client::base_url(&self.0)
            }

            fn send(
                &self,
                request: ::fastclient::Request<::fastclient::Bytes>,
            ) -> ::fastclient::Result<::fastclient::Response<::fastclient::Bytes>> {
                ::fastclient::Client::send(&self.0, request)
            }
        }

        impl<T: ::fastclient::Transport + ::std::fmt::Debug> ::std::fmt::Debug for #client_name<T> {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.debug_tuple(stringify!(#client_name)).field(&self.0).finish()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use syn::parse_quote;

    use super::*;
    use crate::attrs::parse_marker;

    fn tokens(ty: &Type) -> String {
        quote!(#ty).to_string()
    }

    #[test]
    fn return_type_is_unwrapped() {
        let_assert!(Ok(ty) = analyze_return_type(&parse_quote!(-> fastclient::Result<Post>)));
        check!(tokens(&ty) == "Post");

        let_assert!(Ok(ty) = analyze_return_type(&parse_quote!(-> Result<Response<Bytes>>)));
        check!(tokens(&ty) == "Response < Bytes >");
    }

    #[test]
    fn missing_return_type() {
        let_assert!(Err(err) = analyze_return_type(&ReturnType::Default));
        check!(err.to_string() == MISSING_RETURN);
    }

    #[test]
    fn non_result_return_type() {
        let_assert!(Err(err) = analyze_return_type(&parse_quote!(-> Post)));
        check!(
            err.to_string()
                == "unsupported return type `Post`: expected `Result<T>` where T is a model, a JSON mapping or a raw response"
        );
    }

    #[test]
    fn lifetimes_are_erased() {
        check!(tokens(&erase_lifetimes(&parse_quote!(&'a str))) == "& str");
        check!(tokens(&erase_lifetimes(&parse_quote!(Cow<'a, str>))) == "Cow < '_ , str >");
        check!(tokens(&erase_lifetimes(&parse_quote!(&'a [Tag<'a>]))) == "& [Tag < '_ >]");
        check!(tokens(&erase_lifetimes(&parse_quote!(Option<u32>))) == "Option < u32 >");
    }

    #[test]
    fn builder_tokens() {
        let name: Ident = parse_quote!(get_comments);
        let returns: Type = parse_quote!(JsonMap);
        let_assert!(Ok(marker) = parse_marker(&[parse_quote!(#[query("testID")])]));
        let params = vec![
            MethodParam {
                name: parse_quote!(post_id),
                ty: parse_quote!(u32),
                marker: None,
            },
            MethodParam {
                name: parse_quote!(qs_test_id),
                ty: parse_quote!(u32),
                marker,
            },
        ];
        let decl = EndpointDecl {
            name: &name,
            method: HttpMethod::Get,
            path: "/posts/{post_id}/comments",
            params: &params,
            returns: &returns,
            user_agent: Some("tests/1.0"),
        };

        let expected = quote! {
            ::fastclient::Endpoint::<JsonMap>::builder(::fastclient::Method::Get, "/posts/{post_id}/comments")
                .named("get_comments")
                .param(::fastclient::Param::new::<u32>("post_id"))
                .param(::fastclient::Param::new::<u32>("qs_test_id").bind(::fastclient::Binding::query().alias("testID")))
                .user_agent("tests/1.0")
        };
        check!(decl.builder().to_string() == expected.to_string());
    }

    #[test]
    fn non_body_markers_require_scalar_values() {
        let name: Ident = parse_quote!(search);
        let returns: Type = parse_quote!(JsonMap);
        let param = |name: Ident, ty: Type, attr: syn::Attribute| MethodParam {
            name,
            ty,
            marker: parse_marker(&[attr]).expect("valid marker"),
        };
        let params = vec![
            param(parse_quote!(q), parse_quote!(&'a str), parse_quote!(#[query])),
            param(parse_quote!(tag), parse_quote!(Tag), parse_quote!(#[header])),
            param(parse_quote!(post), parse_quote!(NewPost), parse_quote!(#[body])),
        ];
        let mut decl = EndpointDecl {
            name: &name,
            method: HttpMethod::Get,
            path: "/search",
            params: &params,
            returns: &returns,
            user_agent: None,
        };

        let_assert!(Some(bounds) = decl.scalar_bounds());
        let bounds = bounds.to_string();
        check!(bounds.contains("fn scalar < T : :: fastclient :: ScalarValue"));
        check!(bounds.contains("scalar :: < & str > ()"));
        check!(bounds.contains("scalar :: < Tag > ()"));
        check!(!bounds.contains("NewPost"));

        let (_, body_only) = params.split_at(2);
        decl.params = body_only;
        check!(decl.scalar_bounds().is_none());
    }

    #[test]
    fn call_body_without_params() {
        let endpoint_fn = quote!(__endpoint);
        let body = generate_call_body(&endpoint_fn, &[]).to_string();
        check!(body.contains("let arguments = :: fastclient :: Arguments :: new ()"));
        check!(!body.contains("insert"));
    }
}
