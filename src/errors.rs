use std::path::PathBuf;

use thiserror::Error;

/// Enumerates high-level errors returned by the HTTP surface and the
/// server-side stores.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Represents an error with the request.
    #[error("Bad request")]
    BadRequest,

    /// Represents a required query parameter that was not supplied.
    #[error("Missing query parameter {0}")]
    MissingParameter(&'static str),

    /// Represents a numeric query parameter that could not be parsed.
    #[error("Invalid number {value:?} for {name}")]
    InvalidNumber { name: &'static str, value: String },

    /// Represents a calendar date that could not be parsed.
    #[error("Invalid date {0:?}")]
    InvalidDate(String),

    /// Represents a `type` filter other than `shrine`, `temple` or `all`.
    #[error("Invalid type filter {0:?}")]
    InvalidTypeFilter(String),

    /// Represents a request body missing required fields.
    #[error("Missing required fields")]
    MissingFields,

    /// Represents a lookup by an ID that does not exist.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// Represents a failure to read or write a backing file.
    #[error("Unable to access {path}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Represents a backing file whose contents are not valid JSON.
    #[error("Unable to parse {path}")]
    MalformedFile {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Represents a failure to serialize records for persistence.
    #[error("Unable to serialize records")]
    Serialization { source: serde_json::Error },
}

/// Enumerates errors returned by the client-side storage services.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Represents a failure of the underlying key/value collaborator.
    #[error("Storage I/O error for key {key}")]
    Io {
        key: String,
        source: std::io::Error,
    },

    /// Represents stored data that is not valid JSON of the expected shape.
    #[error("Corrupt data under key {key}")]
    Corrupt {
        key: String,
        source: serde_json::Error,
    },

    /// Represents a failure to serialize data for storage.
    #[error("Unable to serialize data")]
    Serialization { source: serde_json::Error },

    /// Represents an update or deletion of a record that does not exist.
    #[error("Visit record {0} not found")]
    NotFound(String),

    /// Represents an import payload without a `visitRecords` array.
    #[error("Invalid import data")]
    InvalidImport,
}

/// Enumerates reasons a raw catalog row cannot become a `Place`.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PlaceError {
    /// Represents a row without an ID.
    #[error("Missing ID")]
    MissingId,

    /// Represents a row whose ID is not a string.
    #[error("Invalid ID {0}")]
    InvalidId(String),

    /// Represents a row whose type is neither shrine nor temple.
    #[error("Unknown place type {0:?}")]
    UnknownType(String),
}
