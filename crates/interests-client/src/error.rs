use reqwest::StatusCode;
use snafu::{Location, Snafu};
use tokio::task::JoinError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StorageError {
    #[snafu(display("Client storage is disabled"))]
    Disabled,
    Database {
        source: redb::DatabaseError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(transparent)]
    Table {
        source: redb::TableError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(transparent)]
    Storage {
        source: redb::StorageError,
        #[snafu(implicit)]
        location: Location,
    },
    Transaction {
        #[snafu(source(from(redb::TransactionError, Box::new)))]
        source: Box<redb::TransactionError>,
        #[snafu(implicit)]
        location: Location,
    },
    Commit {
        source: redb::CommitError,
        #[snafu(implicit)]
        location: Location,
    },
    Join {
        source: JoinError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Stored value could not be encoded: {source}"))]
    Encode { source: serde_json::Error },
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Identity could not be read or persisted
///
/// Non-fatal: callers fall back to an identity that only lives for the
/// current session.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[snafu(display("Visitor identity storage unavailable"))]
pub struct IdentityUnavailable {
    source: StorageError,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum InitError {
    #[snafu(display("HTTP client initialization error"))]
    HttpClient { source: reqwest::Error },
    #[snafu(display("Base URL can't be used as a base: {url}"))]
    InvalidBaseUrl { url: url::Url },
    #[snafu(transparent)]
    Storage { source: StorageError },
}

pub type InitResult<T> = std::result::Result<T, InitError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum FetchError {
    #[snafu(display("Network error"))]
    FetchNetwork { source: reqwest::Error },
    /// Non-success status with a message supplied by the service
    #[snafu(display("{message}"))]
    Status { status: StatusCode, message: String },
    #[snafu(display("Failed to fetch data"))]
    StatusNoMessage { status: StatusCode },
    #[snafu(display("Unexpected data format: results is not an array"))]
    UnexpectedFormat,
}

pub type FetchResult<T> = std::result::Result<T, FetchError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SubmitError {
    #[snafu(display("Network error"))]
    SubmitNetwork { source: reqwest::Error },
    #[snafu(display("Network response was not ok: {status}"))]
    SubmitStatus { status: StatusCode },
    #[snafu(display("Visitor identity is not resolved yet"))]
    IdentityNotReady,
}

pub type SubmitResult<T> = std::result::Result<T, SubmitError>;
