use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("{0} has no host to mirror under")]
    NoHost(String),

    #[error("body of {url} unavailable after {attempts} attempt(s): {reason}")]
    BodyUnavailable {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("failed to decode body of {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: base64::DecodeError,
    },

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, CaptureError>;
