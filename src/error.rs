//! Error types for dialect detection, reference resolution, and registry merging.

use thiserror::Error;

/// Boxed error produced by a retrieval policy.
pub type RetrieveError = Box<dyn std::error::Error + Send + Sync>;

/// Errors while determining which dialect governs a document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DialectError {
    #[error("unknown dialect identifier: {uri}")]
    UnknownDialect { uri: String },

    #[error("contents declare no dialect and no specification was provided")]
    CannotDetermineDialect,
}

impl DialectError {
    /// The dialect-identifier URI that failed to match, if any.
    pub fn uri(&self) -> Option<&str> {
        match self {
            DialectError::UnknownDialect { uri } => Some(uri),
            DialectError::CannotDetermineDialect => None,
        }
    }
}

/// Errors during reference resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no retrievable resource at {uri}")]
    Unretrievable {
        uri: String,
        #[source]
        source: Option<RetrieveError>,
    },

    #[error("no anchor named {anchor:?} in {uri}")]
    NoSuchAnchor { uri: String, anchor: String },

    #[error("pointer {pointer} does not resolve within {uri}")]
    PointerToNowhere { uri: String, pointer: String },

    #[error("cannot use {uri} as a base URI: {source}")]
    InvalidBaseUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },

    #[error("cannot resolve reference {reference:?} against the current base")]
    UnresolvableReference { reference: String },
}

/// Errors while merging registries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CombineError {
    #[error("registries disagree about the resource at {uri}")]
    Collision { uri: String },
}
