//! Library error type

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed GTFS file {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("feed {feed_id} request failed: {source}")]
    FeedRequest {
        feed_id: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("feed {feed_id} could not be decoded: {source}")]
    FeedDecode {
        feed_id: u32,
        #[source]
        source: prost::DecodeError,
    },

    #[error("service status request failed: {0}")]
    StatusRequest(#[source] reqwest::Error),

    #[error("service status could not be parsed: {0}")]
    StatusDecode(#[source] quick_xml::DeError),

    #[error("invalid service status timestamp {0:?}")]
    StatusTimestamp(String),

    #[error("service status is not configured")]
    StatusUnavailable,

    #[error("station {0:?} not found")]
    StationNotFound(String),

    #[error("failed to lock {0}")]
    LockPoisoned(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
