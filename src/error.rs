//! Error types for certificate fetching and hostname-list loading.
//!
//! Per-host faults are described by [`FetchError`]. The evaluator turns every
//! one of them into a failed result, so they never abort a batch. A
//! [`SourceError`] is the only fault that stops a batch before it starts.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Broad classification of a [`FetchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// DNS, TCP, timeout or TLS handshake failure (trust failures included)
    Connection,
    /// The peer certificate was missing or its fields could not be read
    CertificateParse,
    /// The batch was cancelled before or while the host was checked
    Cancelled,
}

/// Error returned when a single host's certificate cannot be retrieved.
#[derive(Debug, Error)]
pub enum FetchError {
    /// DNS resolution failed or returned no addresses
    #[error("Failed to resolve hostname: {hostname} ({reason})")]
    Resolve {
        /// The hostname that failed to resolve
        hostname: String,
        /// Resolver message
        reason: String,
    },

    /// TCP connection failed on every resolved address
    #[error("Connection failed to: {address} ({source})")]
    Connect {
        /// The last address (ip:port) tried
        address: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// DNS, connect or handshake did not finish in time
    #[error("Operation timed out after {timeout:?}: {operation}")]
    Timeout {
        /// Which step ran out of time
        operation: String,
        /// The per-host budget that was exceeded
        timeout: Duration,
    },

    /// TLS handshake or certificate verification failed
    #[error("TLS handshake failed: {details}")]
    Handshake {
        /// OpenSSL error stack and verification result
        details: String,
    },

    /// Peer certificate missing or unreadable
    #[error("Certificate error: {reason}")]
    CertificateParse {
        /// Description of what went wrong
        reason: String,
    },

    /// The batch was cancelled before this host was dialed
    #[error("check cancelled before it started")]
    Cancelled,

    /// The batch was cancelled while this host was being checked
    #[error("check cancelled during {operation}")]
    Interrupted {
        /// The step that was abandoned
        operation: String,
    },

    /// The fetcher panicked while checking this host
    #[error("certificate fetch panicked: {reason}")]
    Panicked {
        /// The panic payload, when it was a string
        reason: String,
    },

    /// The TLS client context could not be built
    #[error("TLS setup failed: {0}")]
    TlsSetup(#[from] openssl::error::ErrorStack),
}

impl FetchError {
    /// Returns the broad class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CertificateParse { .. } => ErrorKind::CertificateParse,
            Self::Cancelled | Self::Interrupted { .. } => ErrorKind::Cancelled,
            Self::Resolve { .. }
            | Self::Connect { .. }
            | Self::Timeout { .. }
            | Self::Handshake { .. }
            | Self::Panicked { .. }
            | Self::TlsSetup(_) => ErrorKind::Connection,
        }
    }

    pub(crate) fn parse(reason: impl Into<String>) -> Self {
        Self::CertificateParse {
            reason: reason.into(),
        }
    }

    pub(crate) fn interrupted(operation: impl Into<String>) -> Self {
        Self::Interrupted {
            operation: operation.into(),
        }
    }

    pub(crate) fn timeout(operation: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout,
        }
    }
}

/// Error raised when a hostname list cannot be produced.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The list file could not be read
    #[error("Failed to read host list {path}: {source}")]
    Read {
        /// Path that was read
        path: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The source identifier is not acceptable (path traversal, empty)
    #[error("Invalid host list id '{id}': {reason}")]
    InvalidId {
        /// The rejected id
        id: String,
        /// Why it was rejected
        reason: String,
    },

    /// A remote list could not be downloaded
    #[error("Failed to fetch host list from {url}: {reason}")]
    Remote {
        /// The requested URL
        url: String,
        /// Transport or status error
        reason: String,
    },

    /// The source was readable but contained no hostnames
    #[error("Host list '{id}' contains no hostnames")]
    Empty {
        /// The source id
        id: String,
    },
}
