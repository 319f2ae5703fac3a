//! Error types for the Lighthouse client.
//!
//! # Design
//! `ApiError` covers everything a fetch can fail with: missing configuration,
//! misuse (asking for tickets of something that is not a project), transport
//! and status failures, malformed XML, and field decoding. `DecodeError` is
//! kept separate so the field decoder can be used without a client.
//!
//! `NotFound` gets a dedicated variant because callers frequently distinguish
//! "the project does not exist" from "the server returned an unexpected
//! status." All other non-200 responses land in `HttpError` with the raw
//! status code and body for debugging.

use thiserror::Error;

use crate::entity::EntityKind;

/// Errors returned by `LighthouseClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// An operation needed the base URL but none was configured.
    #[error("base url is not configured")]
    MissingBaseUrl,

    /// The configured base URL joined with a resource path is not a URL.
    #[error("invalid url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// A project-only operation was handed some other entity.
    #[error("expected a project, got a {0}")]
    NotAProject(EntityKind),

    /// The project carries no integer `id` field to build a resource path from.
    #[error("project has no integer id")]
    MissingProjectId,

    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-200 status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] ureq::Error),

    #[error("malformed xml: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Errors raised while converting a field node's text into a typed value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("invalid integer {0:?}")]
    InvalidInteger(String),

    #[error("invalid timestamp {input:?}: {source}")]
    InvalidDateTime {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    /// The node declared a `type` attribute this client has no decoder for.
    #[error("unknown field type {0:?}")]
    UnknownType(String),
}
