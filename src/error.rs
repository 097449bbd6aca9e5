use crate::util::FetchError;

/// Terminal failure kinds for a single extraction call. None of these are
/// retried internally; retry policy belongs to the caller.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("URL is not a valid YouTube watch URL")]
    InvalidUrl,
    #[error("malformed player response: {0}")]
    MalformedPlayerResponse(String),
    #[error("stream is unavailable: {0}")]
    UnavailableStream(String),
    #[error("could not extract decipher routine: {0}")]
    DecipherNotFound(&'static str),
    #[error("network failure: {0}")]
    NetworkFailure(#[from] FetchError),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::MalformedPlayerResponse(e.to_string())
    }
}
