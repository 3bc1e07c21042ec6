//! Procedural macros for the Vendure storefront SDK.
//!
//! # Example
//!
//! ```ignore
//! use storefront_macros::Operation;
//!
//! #[derive(Operation)]
//! #[operation(query = "query getChannelList { getChannelList { id token code } }")]
//! pub struct GetChannelList;
//!
//! // binds `GetChannelListVariables` and `GetChannelListResponse`
//! let channels = sdk.execute::<GetChannelList>(GetChannelListVariables, options).await?;
//! ```

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Attribute, DeriveInput, Ident, LitStr, Type};

/// Derive macro for typed GraphQL operations.
///
/// Attributes:
/// - `query = "..."` / `mutation = "..."` / `document = "..."`: the operation
///   document. With `document` the kind is read from its leading keyword.
/// - `name = "..."`: operation name, defaults to the name in the document.
/// - `variables = Type`, `response = Type`: default to `<Ident>Variables` and
///   `<Ident>Response`.
///
/// # Example
///
/// ```ignore
/// #[derive(Operation)]
/// #[operation(
///     mutation = "mutation login($email: String!, $password: String!) { ... }",
///     response = LoginData
/// )]
/// pub struct Login;
/// ```
#[proc_macro_derive(Operation, attributes(operation))]
pub fn derive_operation(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand_operation(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

struct OperationAttrs {
    document: LitStr,
    kind: Option<&'static str>,
    name: Option<LitStr>,
    variables: Option<Type>,
    response: Option<Type>,
}

fn expand_operation(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let ident = &input.ident;
    let attrs = parse_operation_attrs(&input.attrs, ident)?;

    let text = attrs.document.value();
    let header = parse_operation_header(&text);

    let kind = match (attrs.kind, header.as_ref().map(|h| h.kind)) {
        (Some(declared), Some(found)) if declared != found => {
            return Err(syn::Error::new(
                attrs.document.span(),
                format!("operation is declared as {declared} but the document starts with {found}"),
            ));
        }
        (Some(declared), _) => declared,
        (None, Some(found)) => found,
        // Anonymous selection sets are queries.
        (None, None) => "Query",
    };

    let name = match (attrs.name, header.and_then(|h| h.name)) {
        (Some(name), _) => name.value(),
        (None, Some(name)) => name,
        (None, None) => {
            return Err(syn::Error::new(
                attrs.document.span(),
                "anonymous operation: add `name = \"...\"` to #[operation]",
            ));
        }
    };

    let default_variables = format_ident!("{}Variables", ident);
    let default_response = format_ident!("{}Response", ident);
    let variables_type = attrs
        .variables
        .map_or_else(|| quote!(#default_variables), |ty| quote!(#ty));
    let response_type = attrs
        .response
        .map_or_else(|| quote!(#default_response), |ty| quote!(#ty));

    let kind_ident = Ident::new(kind, Span::call_site());
    let document = attrs.document;

    Ok(quote! {
        impl ::storefront_sdk::operation::Operation for #ident {
            type Variables = #variables_type;
            type Response = #response_type;

            const DOCUMENT: &'static str = #document;
            const OPERATION_NAME: &'static str = #name;
            const KIND: ::storefront_sdk::operation::OperationKind =
                ::storefront_sdk::operation::OperationKind::#kind_ident;
        }
    })
}

fn parse_operation_attrs(attrs: &[Attribute], ident: &Ident) -> syn::Result<OperationAttrs> {
    let mut document = None;
    let mut kind = None;
    let mut name = None;
    let mut variables = None;
    let mut response = None;

    for attr in attrs.iter().filter(|a| a.path().is_ident("operation")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("query") {
                document = Some(meta.value()?.parse::<LitStr>()?);
                kind = Some("Query");
            } else if meta.path.is_ident("mutation") {
                document = Some(meta.value()?.parse::<LitStr>()?);
                kind = Some("Mutation");
            } else if meta.path.is_ident("document") {
                document = Some(meta.value()?.parse::<LitStr>()?);
            } else if meta.path.is_ident("name") {
                name = Some(meta.value()?.parse::<LitStr>()?);
            } else if meta.path.is_ident("variables") {
                variables = Some(meta.value()?.parse::<Type>()?);
            } else if meta.path.is_ident("response") {
                response = Some(meta.value()?.parse::<Type>()?);
            } else {
                return Err(meta.error("unsupported #[operation] key"));
            }
            Ok(())
        })?;
    }

    let document = document.ok_or_else(|| {
        syn::Error::new(
            ident.span(),
            "missing #[operation(query = \"...\")] or #[operation(mutation = \"...\")]",
        )
    })?;

    Ok(OperationAttrs {
        document,
        kind,
        name,
        variables,
        response,
    })
}

#[derive(Debug, PartialEq, Eq)]
struct OperationHeader {
    kind: &'static str,
    name: Option<String>,
}

/// Reads the leading `query name` / `mutation name` of a document, skipping
/// whitespace and `#` comments.
fn parse_operation_header(document: &str) -> Option<OperationHeader> {
    let rest = skip_ignored(document);

    let (kind, after) = [
        ("query", "Query"),
        ("mutation", "Mutation"),
        ("subscription", "Subscription"),
    ]
    .into_iter()
    .find_map(|(keyword, kind)| {
        let after = rest.strip_prefix(keyword)?;
        let boundary = after
            .chars()
            .next()
            .map_or(true, |c| !(c.is_ascii_alphanumeric() || c == '_'));
        boundary.then_some((kind, after))
    })?;

    let rest = skip_ignored(after);
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    let name = (end > 0).then(|| rest[..end].to_string());

    Some(OperationHeader { kind, name })
}

fn skip_ignored(mut text: &str) -> &str {
    loop {
        text = text.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        match text.strip_prefix('#') {
            Some(comment) => {
                text = comment.find('\n').map_or("", |i| &comment[i + 1..]);
            }
            None => return text,
        }
    }
}
