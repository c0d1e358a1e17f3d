//! # certexpiry
//!
//! Checks whether the TLS certificates served by a set of hostnames are close
//! to expiry.
//!
//! The [`fetcher`] module retrieves a host's leaf certificate and reads its
//! expiry and issuer organization. The [`evaluator`] module runs the fetcher
//! over a batch of hosts on a bounded thread pool and classifies each one as
//! valid, expiring soon, or failed. Host lists come from [`source`] providers.
//!
//! ## Example
//!
//! ```no_run
//! use certexpiry::{ExpiryEvaluator, OpenSslFetcher};
//!
//! let fetcher = OpenSslFetcher::new()?;
//! let evaluator = ExpiryEvaluator::new(fetcher).with_concurrency(8);
//! let hosts = vec!["example.com".to_string(), "rust-lang.org".to_string()];
//!
//! for result in evaluator.evaluate(&hosts) {
//!     println!("{}: {} ({} days)", result.hostname(), result.status_label(), result.days_display());
//! }
//! # Ok::<(), certexpiry::FetchError>(())
//! ```

pub mod config;
pub mod error;
pub mod evaluator;
pub mod fetcher;
pub mod source;

pub use error::{ErrorKind, FetchError, SourceError};
pub use evaluator::{CheckResult, Clock, ExpiryEvaluator, NowCapture, Status, SystemClock};
pub use fetcher::{
    CancelToken, CertificateFetcher, CertificateInfo, OpenSslFetcher, UNKNOWN_ISSUER,
};
pub use source::{parse_hostnames, DirectorySource, HostListProvider, InlineSource, RemoteSource};
