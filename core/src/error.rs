//! Error types for building, persisting and querying a documentation index.

use thiserror::Error;

/// Top-level error type for docsearch operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A single input record could not become a fragment. Recovered locally
    /// by the builder; surfaced only when a caller validates one record.
    #[error("malformed fragment: {0}")]
    MalformedFragment(#[from] FragmentError),

    /// The persisted index was written by an incompatible format version.
    #[error("incompatible index format: found version {found}, expected {expected}")]
    IncompatibleIndexFormat { found: u32, expected: u32 },

    /// The bytes do not start with the index magic.
    #[error("not a docsearch index")]
    NotAnIndex,

    /// The payload could not be decoded or violates index invariants.
    #[error("corrupt index: {0}")]
    Corrupt(String),

    /// The index could not be encoded.
    #[error("encode error: {0}")]
    Encode(String),

    /// A query was issued with parameters outside the caller contract.
    #[error("invalid query parameter: {0}")]
    InvalidQueryParameter(String),

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input that is valid JSON but not a fragment collection.
    #[error("unrecognized fragment input: {0}")]
    Input(String),

    /// Input files that are not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Errors that mean the index bytes cannot be trusted for scoring.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Error::IncompatibleIndexFormat { .. } | Error::NotAnIndex | Error::Corrupt(_)
        )
    }
}

/// Why an input record was rejected during ingestion.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FragmentError {
    #[error("missing location")]
    MissingLocation,

    #[error("title and text are both empty")]
    EmptyContent,

    #[error("unknown category {0:?}")]
    UnknownCategory(String),
}

/// Result type for docsearch operations.
pub type Result<T> = std::result::Result<T, Error>;
