//! Strongly typed GraphQL operations.
//!
//! An operation binds a document to its variables and response types. The
//! `#[derive(Operation)]` macro from `storefront_macros` implements the trait
//! from an `#[operation(...)]` attribute.

use crate::document::Document;
use crate::error::SdkResult;
use crate::headers::HeaderBundle;
use serde::{de::DeserializeOwned, Serialize};
use std::ops::{Deref, DerefMut};

/// A strongly typed GraphQL operation.
///
/// # Example
///
/// ```ignore
/// use storefront_sdk::operation::{Operation, OperationKind};
///
/// struct GetChannelList;
///
/// impl Operation for GetChannelList {
///     type Variables = NoVariables;
///     type Response = GetChannelListResponse;
///
///     const DOCUMENT: &'static str = "query getChannelList { getChannelList { id token code } }";
///     const OPERATION_NAME: &'static str = "getChannelList";
///     const KIND: OperationKind = OperationKind::Query;
/// }
/// ```
pub trait Operation {
    /// The input variables type.
    type Variables: Serialize + Send + Sync;

    /// The response data type.
    type Response: DeserializeOwned;

    /// The GraphQL document text.
    const DOCUMENT: &'static str;

    /// The operation name.
    const OPERATION_NAME: &'static str;

    /// The kind of operation.
    const KIND: OperationKind;

    /// Parses the operation document.
    fn document() -> SdkResult<Document> {
        Document::parse(Self::DOCUMENT)
    }
}

/// The kind of GraphQL operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

/// Marker type for operations without variables.
///
/// Serializes to `null`, matching an omitted `variables` field.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct NoVariables;

/// A payload with the header bundle the caller must propagate.
///
/// Dereferences to the payload. Serializes as the payload's fields plus a
/// `_headers` object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WithHeaders<T> {
    #[serde(flatten)]
    pub data: T,
    #[serde(rename = "_headers")]
    pub headers: HeaderBundle,
}

impl<T> WithHeaders<T> {
    /// Wraps a payload.
    pub fn new(data: T, headers: HeaderBundle) -> Self {
        Self { data, headers }
    }

    /// Maps the payload, keeping the headers.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> WithHeaders<U> {
        WithHeaders {
            data: f(self.data),
            headers: self.headers,
        }
    }

    /// Splits into payload and headers.
    pub fn into_parts(self) -> (T, HeaderBundle) {
        (self.data, self.headers)
    }
}

impl<T> Deref for WithHeaders<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<T> DerefMut for WithHeaders<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}
