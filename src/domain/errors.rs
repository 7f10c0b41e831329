//! Core error definitions for the fetch pipeline.
//!
//! Every failure that crosses the catalog boundary carries a tagged
//! [`ErrorKind`] so that retry policy can dispatch on a closed set of
//! kinds instead of matching substrings of stringified errors.

use thiserror::Error;

/// Classification of a remote failure, assigned at the catalog boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// HTTP 401 or an explicit no-authentication-information condition.
    Auth,
    /// HTTP 404; on a signed URL this usually means the URL expired.
    NotFound,
    /// Connection failures and timeouts.
    Network,
    /// The remote payload could not be parsed.
    Malformed,
    Other,
}

/// Error types encountered during a fetch run.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Catalog request failed ({kind:?}): {message}")]
    Catalog { kind: ErrorKind, message: String },

    #[error("Decode failed: {0}")]
    Decode(String),

    #[error("Aggregation failed: {0}")]
    Aggregation(String),

    #[error("Snapshot write failed: {0}")]
    Snapshot(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Convenience constructor for tagged catalog-boundary errors.
    pub fn catalog(kind: ErrorKind, message: impl Into<String>) -> Self {
        FetchError::Catalog {
            kind,
            message: message.into(),
        }
    }

    /// The tagged kind of this error. Local failures map to `Other`
    /// except payload decoding, which is `Malformed`.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Catalog { kind, .. } => *kind,
            FetchError::Decode(_) => ErrorKind::Malformed,
            _ => ErrorKind::Other,
        }
    }

    /// Whether the retry loop may attempt this operation again.
    ///
    /// Only authentication and signed-URL transience are retryable; the
    /// dominant real-world case is an expired signed URL that the next
    /// listing refreshes.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Auth | ErrorKind::NotFound)
    }
}

/// A specialized Result type for the fetch pipeline.
pub type Result<T> = std::result::Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(FetchError::catalog(ErrorKind::Auth, "401").is_retryable());
        assert!(FetchError::catalog(ErrorKind::NotFound, "404").is_retryable());
        assert!(!FetchError::catalog(ErrorKind::Network, "timeout").is_retryable());
        assert!(!FetchError::catalog(ErrorKind::Other, "boom").is_retryable());
        assert!(!FetchError::Decode("bad parquet".into()).is_retryable());
        assert!(!FetchError::Config("missing profile".into()).is_retryable());
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            FetchError::Decode("truncated".into()).kind(),
            ErrorKind::Malformed
        );
        let io = FetchError::from(std::io::Error::other("disk"));
        assert_eq!(io.kind(), ErrorKind::Other);
    }
}
