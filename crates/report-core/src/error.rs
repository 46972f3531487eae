use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the course report pipeline.
#[derive(Error, Debug)]
pub enum ReportError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An output file could not be created or written.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A delimited file could not be parsed or serialised.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The HTTP request itself failed (connect, timeout, body decode).
    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The upstream answered with a non-success status code.
    #[error("Request to {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// A required configuration value is absent from every source.
    #[error("Missing required configuration value: {0}")]
    MissingConfig(String),

    /// A configuration value is present but invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A text encoding name is not one of the supported encodings.
    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the report crates.
pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = ReportError::FileRead {
            path: PathBuf::from("/data/courses.csv"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/data/courses.csv"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_http_status() {
        let err = ReportError::HttpStatus {
            url: "http://api.local/completed".to_string(),
            status: 503,
        };
        assert_eq!(
            err.to_string(),
            "Request to http://api.local/completed returned HTTP 503"
        );
    }

    #[test]
    fn test_error_display_missing_config() {
        let err = ReportError::MissingConfig("USERS_API_URL".to_string());
        assert_eq!(
            err.to_string(),
            "Missing required configuration value: USERS_API_URL"
        );
    }

    #[test]
    fn test_error_display_unsupported_encoding() {
        let err = ReportError::UnsupportedEncoding("ebcdic".to_string());
        assert_eq!(err.to_string(), "Unsupported encoding: ebcdic");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ReportError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: ReportError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }

    #[test]
    fn test_error_display_http_keeps_source() {
        let cause = std::io::Error::new(std::io::ErrorKind::TimedOut, "operation timed out");
        let err = ReportError::Http {
            url: "http://api.local/users".to_string(),
            source: Box::new(cause),
        };
        assert_eq!(
            err.to_string(),
            "Request to http://api.local/users failed: operation timed out"
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
