use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = TruthSocialError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum TruthSocialError {
    #[error("bearer token is required")]
    MissingToken,

    #[error("invalid client configuration: {msg}")]
    Config { msg: String },

    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("request failed: {url}, {error}")]
    Http { url: String, error: reqwest::Error },

    #[error("unable to decode response: {url}, {msg}")]
    Decode { url: String, msg: String },

    #[error("unexpected response: {msg}")]
    UnexpectedResponse { msg: String },

    #[error("unable to read media file: {path:?}, {error}")]
    Media {
        path: PathBuf,
        error: std::io::Error,
    },
}

impl TruthSocialError {
    /// HTTP status of an API error
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
