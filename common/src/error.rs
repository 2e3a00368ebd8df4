//! Error taxonomy shared by the send and receive operations.

/// Error type for a single transfer invocation.
///
/// Every variant is fatal to the invocation. Setup failures report zero bytes; only
/// [`Error::Transfer`] carries a partial byte count.
///
/// # Logging Convention
/// The Display implementation includes the underlying I/O error, so you can log it
/// with any format specifier:
/// ```ignore
/// tracing::error!("receive failed: {}", &error);
/// tracing::error!("receive failed: {:#}", &error);
/// ```
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to listen on {endpoint}: {source}")]
    Bind {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to accept a connection on {endpoint}: {source}")]
    Accept {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },
    #[error("destination {path:?} already exists, did you intend to specify --overwrite?")]
    AlreadyExists { path: std::path::PathBuf },
    #[error("{path:?} not found: {source}")]
    NotFound {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed accessing {path:?}: {source}")]
    UnknownIo {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("transfer failed after {bytes} bytes: {source}")]
    Transfer {
        bytes: u64,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Classifies a filesystem error on `path`.
    #[must_use]
    pub fn from_io(path: &std::path::Path, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound {
                path: path.to_path_buf(),
                source,
            },
            std::io::ErrorKind::AlreadyExists => Error::AlreadyExists {
                path: path.to_path_buf(),
            },
            _ => Error::UnknownIo {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    /// Bytes successfully written before the failure.
    #[must_use]
    pub fn bytes(&self) -> u64 {
        match self {
            Error::Transfer { bytes, .. } => *bytes,
            _ => 0,
        }
    }

    /// True for failures setting up the TCP connection.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Error::Bind { .. } | Error::Accept { .. } | Error::Connect { .. }
        )
    }
}
