use thiserror::Error;

/// Errors surfaced by the refresh, ingestion and aggregation services.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport failure or a non-success HTTP status from a provider.
    #[error("fetch failed: {0}")]
    FetchFailed(String),

    #[error("failed to decode payload: {0}")]
    DecodeFailed(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("persistence failed: {0}")]
    PersistenceFailed(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::DecodeFailed(err.to_string())
        } else {
            Error::FetchFailed(err.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::DecodeFailed(err.to_string())
    }
}

impl From<fjall::Error> for Error {
    fn from(err: fjall::Error) -> Self {
        Error::PersistenceFailed(err.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::DecodeFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NotFound("currency code XYZ".to_string());
        assert_eq!(err.to_string(), "not found: currency code XYZ");

        let err = Error::FetchFailed("HTTP 502".to_string());
        assert_eq!(err.to_string(), "fetch failed: HTTP 502");
    }

    #[test]
    fn test_serde_json_error_maps_to_decode_failed() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::DecodeFailed(_)));
    }
}
