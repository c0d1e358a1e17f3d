//! Leaf certificate retrieval over TLS.
//!
//! [`OpenSslFetcher`] opens one TCP connection per call, performs a verified
//! TLS handshake with SNI set to the hostname and reads the expiry and issuer
//! organization of the peer's leaf certificate. DNS, connect and handshake
//! share a single per-host time budget.

use crate::error::FetchError;
use chrono::{DateTime, NaiveDateTime, Utc};
use log::debug;
use openssl::nid::Nid;
use openssl::ssl::{HandshakeError, SslConnector, SslMethod, SslStream};
use openssl::x509::{X509NameRef, X509Ref, X509VerifyResult, X509};
use serde::Serialize;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Standard TLS port.
pub const DEFAULT_PORT: u16 = 443;
/// Budget for DNS + connect + handshake of a single host.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Issuer reported when the issuer DN carries no organizationName.
pub const UNKNOWN_ISSUER: &str = "Unknown Issuer";

/// Longest single wait before the deadline and cancel flag are checked again.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The two certificate fields the evaluator needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CertificateInfo {
    /// The leaf certificate's notAfter, in UTC
    pub expiry: DateTime<Utc>,
    /// organizationName of the issuer, or [`UNKNOWN_ISSUER`]
    pub issuer_organization: String,
}

/// Shared flag for aborting running and pending checks.
///
/// A token derived with [`CancelToken::with_deadline`] shares the flag and
/// also reports cancelled once the deadline passes.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(&self, deadline: Instant) -> Self {
        CancelToken {
            flag: Arc::clone(&self.flag),
            deadline: Some(self.deadline.map_or(deadline, |own| own.min(deadline))),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
            || self
                .deadline
                .is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Something that can retrieve a host's leaf certificate.
///
/// Implementations must be usable from several worker threads at once.
pub trait CertificateFetcher: Send + Sync {
    fn fetch(&self, hostname: &str) -> Result<CertificateInfo, FetchError>;

    /// Like [`fetch`](Self::fetch), but gives up early once `cancel` fires.
    ///
    /// The default ignores the token.
    fn fetch_with_cancel(
        &self,
        hostname: &str,
        cancel: &CancelToken,
    ) -> Result<CertificateInfo, FetchError> {
        let _ = cancel;
        self.fetch(hostname)
    }
}

/// Fetcher backed by OpenSSL and blocking std sockets.
pub struct OpenSslFetcher {
    connector: SslConnector,
    port: u16,
    timeout: Duration,
}

impl OpenSslFetcher {
    /// Creates a fetcher with the default port, timeout and trust store.
    pub fn new() -> Result<Self, FetchError> {
        Self::builder().build()
    }

    pub fn builder() -> FetcherBuilder {
        FetcherBuilder::default()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn connect(
        &self,
        hostname: &str,
        addresses: &[SocketAddr],
        deadline: Instant,
        cancel: &CancelToken,
    ) -> Result<TcpStream, FetchError> {
        let mut last_error = None;
        for address in addresses {
            if cancel.is_cancelled() {
                return Err(FetchError::interrupted("TCP connect"));
            }
            let remaining = remaining_budget(deadline, "TCP connect", self.timeout)?;
            debug!("{}: connecting to {}", hostname, address);
            match TcpStream::connect_timeout(address, remaining) {
                Ok(stream) => return Ok(stream),
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                    last_error = Some(FetchError::timeout(
                        format!("TCP connect to {}", address),
                        self.timeout,
                    ));
                }
                Err(e) => {
                    last_error = Some(FetchError::Connect {
                        address: address.to_string(),
                        source: e,
                    });
                }
            }
        }
        Err(last_error.unwrap_or_else(|| FetchError::Resolve {
            hostname: hostname.to_string(),
            reason: "no addresses to connect to".to_string(),
        }))
    }

    fn handshake(
        &self,
        hostname: &str,
        stream: DeadlineStream,
        cancel: &CancelToken,
    ) -> Result<SslStream<DeadlineStream>, FetchError> {
        let config = self.connector.configure()?;
        match config.connect(hostname, stream) {
            Ok(stream) => Ok(stream),
            Err(HandshakeError::SetupFailure(stack)) => Err(FetchError::Handshake {
                details: stack.to_string(),
            }),
            Err(HandshakeError::WouldBlock(_)) => {
                Err(FetchError::timeout("TLS handshake", self.timeout))
            }
            Err(HandshakeError::Failure(mid)) => {
                if cancel.is_cancelled() {
                    return Err(FetchError::interrupted("TLS handshake"));
                }
                let error = mid.error();
                if let Some(io_error) = error.io_error() {
                    if matches!(
                        io_error.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) {
                        return Err(FetchError::timeout("TLS handshake", self.timeout));
                    }
                }
                let verify = mid.ssl().verify_result();
                let details = if verify == X509VerifyResult::OK {
                    error.to_string()
                } else {
                    format!("{} ({})", error, verify.error_string())
                };
                Err(FetchError::Handshake { details })
            }
        }
    }
}

impl CertificateFetcher for OpenSslFetcher {
    fn fetch(&self, hostname: &str) -> Result<CertificateInfo, FetchError> {
        self.fetch_with_cancel(hostname, &CancelToken::new())
    }

    fn fetch_with_cancel(
        &self,
        hostname: &str,
        cancel: &CancelToken,
    ) -> Result<CertificateInfo, FetchError> {
        let deadline = Instant::now() + self.timeout;

        let addresses = resolve(hostname, self.port, deadline, self.timeout, cancel)?;
        let tcp = self.connect(hostname, &addresses, deadline, cancel)?;
        let stream = DeadlineStream {
            inner: tcp,
            deadline,
            cancel: cancel.clone(),
        };

        let mut stream = self.handshake(hostname, stream, cancel)?;
        debug!(
            "{}: handshake complete ({})",
            hostname,
            stream.ssl().version_str()
        );

        let info = stream
            .ssl()
            .peer_certificate()
            .ok_or_else(|| FetchError::parse("server presented no certificate"))
            .and_then(|cert| certificate_info(&cert));

        // Sends close_notify; the socket itself closes when the stream drops.
        let _ = stream.shutdown();
        info
    }
}

/// TCP stream whose reads and writes fail once the per-host deadline passes
/// or the check is cancelled, however slowly the peer trickles data.
struct DeadlineStream {
    inner: TcpStream,
    deadline: Instant,
    cancel: CancelToken,
}

impl DeadlineStream {
    /// Next socket timeout: the time left, capped at [`POLL_INTERVAL`].
    fn next_wait(&self) -> io::Result<Duration> {
        if self.cancel.is_cancelled() {
            return Err(io::Error::new(io::ErrorKind::Other, "check cancelled"));
        }
        match self.deadline.checked_duration_since(Instant::now()) {
            Some(remaining) if !remaining.is_zero() => Ok(remaining.min(POLL_INTERVAL)),
            _ => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "per-host deadline passed",
            )),
        }
    }
}

fn is_wait_expired(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

impl Read for DeadlineStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let wait = self.next_wait()?;
            self.inner.set_read_timeout(Some(wait))?;
            match self.inner.read(buf) {
                Err(e) if is_wait_expired(&e) => continue,
                result => return result,
            }
        }
    }
}

impl Write for DeadlineStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        loop {
            let wait = self.next_wait()?;
            self.inner.set_write_timeout(Some(wait))?;
            match self.inner.write(buf) {
                Err(e) if is_wait_expired(&e) => continue,
                result => return result,
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Builder for [`OpenSslFetcher`].
pub struct FetcherBuilder {
    port: u16,
    timeout: Duration,
    ca_files: Vec<PathBuf>,
    trusted: Vec<X509>,
}

impl Default for FetcherBuilder {
    fn default() -> Self {
        FetcherBuilder {
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            ca_files: Vec::new(),
            trusted: Vec::new(),
        }
    }
}

impl FetcherBuilder {
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the combined DNS, connect and handshake budget.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Adds a PEM bundle of extra trust anchors to the default store.
    pub fn ca_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.ca_files.push(path.as_ref().to_path_buf());
        self
    }

    /// Adds a single extra trust anchor to the default store.
    pub fn trust_certificate(mut self, cert: X509) -> Self {
        self.trusted.push(cert);
        self
    }

    pub fn build(self) -> Result<OpenSslFetcher, FetchError> {
        // SslConnector loads the default verify paths and verifies the peer.
        let mut builder = SslConnector::builder(SslMethod::tls())?;
        for path in &self.ca_files {
            builder.set_ca_file(path)?;
        }
        for cert in self.trusted {
            builder.cert_store_mut().add_cert(cert)?;
        }
        Ok(OpenSslFetcher {
            connector: builder.build(),
            port: self.port,
            timeout: self.timeout,
        })
    }
}

fn remaining_budget(
    deadline: Instant,
    operation: &str,
    timeout: Duration,
) -> Result<Duration, FetchError> {
    match deadline.checked_duration_since(Instant::now()) {
        Some(remaining) if !remaining.is_zero() => Ok(remaining),
        _ => Err(FetchError::timeout(operation, timeout)),
    }
}

/// Resolves on a helper thread so a stuck resolver cannot hold the caller
/// past its budget. The helper is abandoned, not joined, on timeout.
fn resolve(
    hostname: &str,
    port: u16,
    deadline: Instant,
    timeout: Duration,
    cancel: &CancelToken,
) -> Result<Vec<SocketAddr>, FetchError> {
    let (sender, receiver) = mpsc::channel();
    let target = (hostname.to_string(), port);
    thread::spawn(move || {
        let result = target
            .to_socket_addrs()
            .map(|addresses| addresses.collect::<Vec<_>>());
        let _ = sender.send(result);
    });

    loop {
        if cancel.is_cancelled() {
            return Err(FetchError::interrupted("DNS resolution"));
        }
        let wait = remaining_budget(deadline, "DNS resolution", timeout)?.min(POLL_INTERVAL);
        return match receiver.recv_timeout(wait) {
            Ok(Ok(addresses)) if !addresses.is_empty() => {
                debug!("{}: resolved {} address(es)", hostname, addresses.len());
                Ok(addresses)
            }
            Ok(Ok(_)) => Err(FetchError::Resolve {
                hostname: hostname.to_string(),
                reason: "no addresses returned".to_string(),
            }),
            Ok(Err(e)) => Err(FetchError::Resolve {
                hostname: hostname.to_string(),
                reason: e.to_string(),
            }),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => Err(FetchError::Resolve {
                hostname: hostname.to_string(),
                reason: "resolver thread exited".to_string(),
            }),
        };
    }
}

/// Extracts the expiry and issuer organization from a certificate.
pub fn certificate_info(cert: &X509Ref) -> Result<CertificateInfo, FetchError> {
    Ok(CertificateInfo {
        expiry: parse_not_after(&cert.not_after().to_string())?,
        issuer_organization: issuer_organization(cert.issuer_name()),
    })
}

/// Parses a notAfter rendered as `"Mon DD HH:MM:SS YYYY GMT"`.
///
/// The day may be space padded (`"Jan  5 23:59:59 2025 GMT"`).
pub fn parse_not_after(value: &str) -> Result<DateTime<Utc>, FetchError> {
    let fields: Vec<&str> = value.split_whitespace().collect();
    match fields.as_slice() {
        [month, day, time, year, "GMT"] => {
            let normalized = format!("{} {} {} {}", month, day, time, year);
            NaiveDateTime::parse_from_str(&normalized, "%b %d %H:%M:%S %Y")
                .map(|naive| naive.and_utc())
                .map_err(|e| FetchError::parse(format!("invalid notAfter '{}': {}", value, e)))
        }
        _ => Err(FetchError::parse(format!(
            "unexpected notAfter format '{}'",
            value
        ))),
    }
}

/// Returns the issuer's organizationName, or [`UNKNOWN_ISSUER`].
pub fn issuer_organization(issuer: &X509NameRef) -> String {
    issuer
        .entries_by_nid(Nid::ORGANIZATIONNAME)
        .next()
        .and_then(|entry| entry.data().as_utf8().ok())
        .map(|organization| organization.to_string())
        .unwrap_or_else(|| UNKNOWN_ISSUER.to_string())
}
