use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("'{kind}' is not a known scheme type")]
    InvalidSchemeKind { kind: String },

    #[error("'{path}' is not a valid path")]
    InvalidPath { path: String },

    #[error("No element found using the '{path}' path")]
    NoElementFound { path: String },

    #[error("Field '{field}' expected {expected} values, but found {found}")]
    MismatchedFieldCount {
        field: String,
        expected: usize,
        found: usize,
    },

    #[error("'{url}' is not a valid url")]
    InvalidUrl { url: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
