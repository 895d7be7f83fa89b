//! Shared error type across rrdpulse crates.

use std::path::PathBuf;

use thiserror::Error;

/// Stable error codes, used in logs and by embedders matching on failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Existing store could not be read.
    StoreUnavailable,
    /// Store creation or migration failed.
    StoreCreateFailed,
    /// A periodic update was rejected.
    FlushFailed,
    /// The final update on shutdown was rejected.
    ShutdownFlushFailed,
    /// Invalid configuration.
    BadConfig,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::StoreUnavailable => "STORE_UNAVAILABLE",
            ErrorCode::StoreCreateFailed => "STORE_CREATE_FAILED",
            ErrorCode::FlushFailed => "FLUSH_FAILED",
            ErrorCode::ShutdownFlushFailed => "SHUTDOWN_FLUSH_FAILED",
            ErrorCode::BadConfig => "BAD_CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Failure reported by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store not found: {0}")]
    NotFound(PathBuf),
    #[error("store io: {0}")]
    Io(#[from] std::io::Error),
    #[error("store corrupt: {0}")]
    Corrupt(String),
    #[error("store rejected request: {0}")]
    Rejected(String),
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, RrdPulseError>;

/// Unified error type used by core and collector.
#[derive(Debug, Error)]
pub enum RrdPulseError {
    #[error("store unavailable at {path}: {source}")]
    StoreUnavailable {
        path: PathBuf,
        #[source]
        source: StoreError,
    },
    #[error("could not create store at {path}: {source}")]
    StoreCreateFailed {
        path: PathBuf,
        #[source]
        source: StoreError,
    },
    #[error("flush failed: {0}")]
    FlushFailed(#[source] StoreError),
    #[error("shutdown flush failed: {0}")]
    ShutdownFlushFailed(#[source] StoreError),
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl RrdPulseError {
    /// Map to a stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            RrdPulseError::StoreUnavailable { .. } => ErrorCode::StoreUnavailable,
            RrdPulseError::StoreCreateFailed { .. } => ErrorCode::StoreCreateFailed,
            RrdPulseError::FlushFailed(_) => ErrorCode::FlushFailed,
            RrdPulseError::ShutdownFlushFailed(_) => ErrorCode::ShutdownFlushFailed,
            RrdPulseError::BadConfig(_) => ErrorCode::BadConfig,
            RrdPulseError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            RrdPulseError::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Fatal errors abort startup. Flush errors are logged and collection
    /// continues.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            RrdPulseError::FlushFailed(_) | RrdPulseError::ShutdownFlushFailed(_)
        )
    }

    /// Re-tag a periodic flush failure as the final one.
    pub fn into_shutdown(self) -> Self {
        match self {
            RrdPulseError::FlushFailed(e) => RrdPulseError::ShutdownFlushFailed(e),
            other => other,
        }
    }
}
