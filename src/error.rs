use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The request never got a response: DNS failure, refused connection, timeout.
    #[error("could not reach acme-dns server at {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The request could not be built, so nothing was sent: a malformed base URL, or
    /// account credentials that are not valid header values.
    #[error("invalid request to {url}: {source}")]
    InvalidRequest {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a status other than the one the endpoint promises on success.
    #[error("acme-dns server returned HTTP {status}: {body}")]
    Client { status: StatusCode, body: String },

    /// JSON that does not describe accounts, either on disk or in a server response.
    #[error("malformed account data in {context}: {source}")]
    Format {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// HTTP status of a rejected request, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Client { status, .. } => Some(*status),
            _ => None,
        }
    }
}
