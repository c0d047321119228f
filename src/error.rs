use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Everything that can go wrong while building or publishing the site.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("census request failed: {0}")]
    Census(#[from] reqwest::Error),

    #[error("census returned an error for {collection}: {message}")]
    CensusResponse { collection: String, message: String },

    #[error("invalid data file {path}: {source}")]
    DataFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("unknown {kind} id {id}")]
    UnknownId { kind: &'static str, id: u32 },

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("minified output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("storage error: {0}")]
    Storage(#[from] google_cloud_storage::http::Error),

    #[error("unable to authenticate with cloud storage: {0}")]
    StorageAuth(String),

    #[error("`{command}` exited with {status}")]
    CommandFailed { command: String, status: ExitStatus },

    #[error("no census service id, set CENSUS_SERVICE_ID")]
    MissingServiceId,

    #[error("worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Walk(#[from] walkdir::Error),

    #[error(transparent)]
    StripPrefix(#[from] std::path::StripPrefixError),
}

pub type Result<T> = std::result::Result<T, Error>;
