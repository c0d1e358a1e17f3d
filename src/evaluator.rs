//! Batch expiry evaluation.
//!
//! [`ExpiryEvaluator`] runs a [`CertificateFetcher`] over an ordered list of
//! hostnames on a bounded pool of scoped threads and turns each outcome into a
//! [`CheckResult`]. Results keep the input order and a failing host never
//! affects the others.

use crate::error::FetchError;
use crate::fetcher::{CancelToken, CertificateFetcher, CertificateInfo};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::thread;
use std::time::{Duration, Instant};
use strum_macros::{Display, EnumString};

/// Hosts with fewer days left than this are expiring soon.
pub const EXPIRY_WARNING_DAYS: i64 = 30;
/// Nominal certificate lifetime used for the elapsed percentage.
pub const NOMINAL_LIFETIME_DAYS: i64 = 365;
pub const DEFAULT_CONCURRENCY: usize = 16;

const SECONDS_PER_DAY: i64 = 86_400;

/// Classification of a successfully fetched certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum Status {
    #[strum(serialize = "Valid")]
    Valid,
    #[strum(serialize = "Expiring Soon")]
    ExpiringSoon,
}

/// Outcome of checking one hostname.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckResult {
    Success {
        hostname: String,
        expiry_date: DateTime<Utc>,
        issuer: String,
        days_until_expiry: i64,
        percentage_lifetime_elapsed: f64,
        status: Status,
    },
    Failure {
        hostname: String,
        error_message: String,
    },
}

impl CheckResult {
    pub fn hostname(&self) -> &str {
        match self {
            CheckResult::Success { hostname, .. } | CheckResult::Failure { hostname, .. } => {
                hostname
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CheckResult::Success { .. })
    }

    pub fn status(&self) -> Option<Status> {
        match self {
            CheckResult::Success { status, .. } => Some(*status),
            CheckResult::Failure { .. } => None,
        }
    }

    /// Status label for display: `Valid`, `Expiring Soon` or `Error`.
    pub fn status_label(&self) -> String {
        self.status()
            .map(|status| status.to_string())
            .unwrap_or_else(|| "Error".to_string())
    }

    /// Expiry date as `YYYY-MM-DD HH:MM:SS UTC`, or `N/A`.
    pub fn expiry_display(&self) -> String {
        match self {
            CheckResult::Success { expiry_date, .. } => {
                expiry_date.format("%Y-%m-%d %H:%M:%S UTC").to_string()
            }
            CheckResult::Failure { .. } => "N/A".to_string(),
        }
    }

    pub fn issuer_display(&self) -> &str {
        match self {
            CheckResult::Success { issuer, .. } => issuer,
            CheckResult::Failure { .. } => "N/A",
        }
    }

    pub fn days_display(&self) -> String {
        match self {
            CheckResult::Success {
                days_until_expiry, ..
            } => days_until_expiry.to_string(),
            CheckResult::Failure { .. } => "N/A".to_string(),
        }
    }

    /// Progress value in 0..=100 for bar-style display; 0 on failure.
    pub fn progress(&self) -> f64 {
        match self {
            CheckResult::Success {
                percentage_lifetime_elapsed,
                ..
            } => *percentage_lifetime_elapsed,
            CheckResult::Failure { .. } => 0.0,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            CheckResult::Success { .. } => None,
            CheckResult::Failure { error_message, .. } => Some(error_message),
        }
    }
}

/// Whole days from `now` until `expiry`, rounded down.
///
/// An expiry 36 hours in the past is `-2`, matching calendar-day arithmetic.
pub fn days_until_expiry(expiry: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (expiry - now).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Share of a nominal 365-day lifetime already used, in 0..=100.
///
/// Expired certificates report 0.
pub fn lifetime_elapsed(days_until_expiry: i64) -> f64 {
    if days_until_expiry < 0 {
        return 0.0;
    }
    let elapsed =
        100.0 - (days_until_expiry as f64) * 100.0 / (NOMINAL_LIFETIME_DAYS as f64);
    elapsed.clamp(0.0, 100.0)
}

pub fn classify(days_until_expiry: i64) -> Status {
    if days_until_expiry < EXPIRY_WARNING_DAYS {
        Status::ExpiringSoon
    } else {
        Status::Valid
    }
}

/// Builds the result for one host from its fetch outcome.
pub fn check_result(
    hostname: &str,
    outcome: Result<CertificateInfo, FetchError>,
    now: DateTime<Utc>,
) -> CheckResult {
    match outcome {
        Ok(info) => {
            let days = days_until_expiry(info.expiry, now);
            CheckResult::Success {
                hostname: hostname.to_string(),
                expiry_date: info.expiry,
                issuer: info.issuer_organization,
                days_until_expiry: days,
                percentage_lifetime_elapsed: lifetime_elapsed(days),
                status: classify(days),
            }
        }
        Err(e) => CheckResult::Failure {
            hostname: hostname.to_string(),
            error_message: e.to_string(),
        },
    }
}

/// Source of the evaluation instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// When the evaluation instant is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum NowCapture {
    /// Once when the batch starts; every host sees the same instant
    #[default]
    PerBatch,
    /// After each host's fetch completes
    PerHost,
}

pub struct ExpiryEvaluator<F> {
    fetcher: F,
    clock: Box<dyn Clock>,
    concurrency: usize,
    now_capture: NowCapture,
    batch_timeout: Option<Duration>,
}

impl<F: CertificateFetcher> ExpiryEvaluator<F> {
    pub fn new(fetcher: F) -> Self {
        ExpiryEvaluator {
            fetcher,
            clock: Box::new(SystemClock),
            concurrency: DEFAULT_CONCURRENCY,
            now_capture: NowCapture::PerBatch,
            batch_timeout: None,
        }
    }

    /// Maximum number of hosts fetched at the same time (at least 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_now_capture(mut self, now_capture: NowCapture) -> Self {
        self.now_capture = now_capture;
        self
    }

    /// Hosts not yet dialed when this elapses are reported as cancelled.
    pub fn with_batch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.batch_timeout = timeout;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn evaluate(&self, hostnames: &[String]) -> Vec<CheckResult> {
        self.evaluate_with_cancel(hostnames, &CancelToken::new())
    }

    /// Evaluates every hostname, returning one result per input in input order.
    ///
    /// Once `cancel` fires (or the batch timeout passes) no further hosts are
    /// dialed; those hosts get a cancelled [`CheckResult::Failure`]. The token
    /// is also handed to in-flight fetches so they can stop early.
    pub fn evaluate_with_cancel(
        &self,
        hostnames: &[String],
        cancel: &CancelToken,
    ) -> Vec<CheckResult> {
        if hostnames.is_empty() {
            return Vec::new();
        }

        let started = Instant::now();
        let cancel = match self.batch_timeout {
            Some(timeout) => cancel.with_deadline(started + timeout),
            None => cancel.clone(),
        };
        let batch_now = self.clock.now();
        let slots: Vec<OnceLock<CheckResult>> =
            hostnames.iter().map(|_| OnceLock::new()).collect();
        let next = AtomicUsize::new(0);
        let workers = self.concurrency.min(hostnames.len());

        info!(
            "checking {} host(s) with {} worker(s)",
            hostnames.len(),
            workers
        );

        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    let index = next.fetch_add(1, Ordering::SeqCst);
                    let Some(hostname) = hostnames.get(index) else {
                        break;
                    };
                    if cancel.is_cancelled() {
                        // Leave the slot empty; it is filled as cancelled below.
                        continue;
                    }

                    debug!("{}: fetching certificate", hostname);
                    let outcome = self.fetch_isolated(hostname, &cancel);
                    if let Err(e) = &outcome {
                        debug!("{}: {}", hostname, e);
                    }
                    let now = match self.now_capture {
                        NowCapture::PerBatch => batch_now,
                        NowCapture::PerHost => self.clock.now(),
                    };
                    let _ = slots[index].set(check_result(hostname, outcome, now));
                });
            }
        });

        let results: Vec<CheckResult> = slots
            .into_iter()
            .zip(hostnames)
            .map(|(slot, hostname)| {
                slot.into_inner().unwrap_or_else(|| CheckResult::Failure {
                    hostname: hostname.clone(),
                    error_message: FetchError::Cancelled.to_string(),
                })
            })
            .collect();

        info!(
            "checked {} host(s) in {:?}: {} failed",
            results.len(),
            started.elapsed(),
            results.iter().filter(|result| !result.is_success()).count()
        );
        results
    }

    /// Runs one fetch; a panicking fetcher becomes an error for that host only.
    fn fetch_isolated(
        &self,
        hostname: &str,
        cancel: &CancelToken,
    ) -> Result<CertificateInfo, FetchError> {
        panic::catch_unwind(AssertUnwindSafe(|| {
            self.fetcher.fetch_with_cancel(hostname, cancel)
        }))
        .unwrap_or_else(|payload| {
            let reason = panic_message(payload.as_ref());
            warn!("{}: certificate fetch panicked: {}", hostname, reason);
            Err(FetchError::Panicked { reason })
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    /// Serves canned expiries; unknown hosts fail to connect.
    #[derive(Default)]
    struct StubFetcher {
        expiries: HashMap<String, DateTime<Utc>>,
        delay: Duration,
        calls: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl StubFetcher {
        fn with(hosts: &[(&str, i64)]) -> Self {
            StubFetcher {
                expiries: hosts
                    .iter()
                    .map(|(host, days)| {
                        (host.to_string(), instant() + chrono::Duration::days(*days))
                    })
                    .collect(),
                ..Default::default()
            }
        }
    }

    impl CertificateFetcher for StubFetcher {
        fn fetch(&self, hostname: &str) -> Result<CertificateInfo, FetchError> {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(current, Ordering::SeqCst);
            self.calls.lock().unwrap().push(hostname.to_string());
            thread::sleep(self.delay);
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match self.expiries.get(hostname) {
                Some(expiry) => Ok(CertificateInfo {
                    expiry: *expiry,
                    issuer_organization: "Example CA".to_string(),
                }),
                None => Err(FetchError::Connect {
                    address: format!("{}:443", hostname),
                    source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
                }),
            }
        }
    }

    fn hosts(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn evaluator(fetcher: StubFetcher) -> ExpiryEvaluator<StubFetcher> {
        ExpiryEvaluator::new(fetcher).with_clock(FixedClock(instant()))
    }

    #[test]
    fn test_empty_input() {
        let evaluator = evaluator(StubFetcher::default());
        assert!(evaluator.evaluate(&[]).is_empty());
        assert!(evaluator.fetcher.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_status_boundary() {
        let evaluator = evaluator(StubFetcher::with(&[
            ("a.test", 29),
            ("b.test", 30),
            ("c.test", 31),
        ]));
        let results = evaluator.evaluate(&hosts(&["a.test", "b.test", "c.test"]));

        assert_eq!(results[0].status(), Some(Status::ExpiringSoon));
        assert_eq!(results[1].status(), Some(Status::Valid));
        assert_eq!(results[2].status(), Some(Status::Valid));
    }

    #[test]
    fn test_expired_certificate() {
        let evaluator = evaluator(StubFetcher::with(&[("old.test", -10)]));
        let results = evaluator.evaluate(&hosts(&["old.test"]));

        match &results[0] {
            CheckResult::Success {
                days_until_expiry,
                percentage_lifetime_elapsed,
                status,
                ..
            } => {
                assert_eq!(*days_until_expiry, -10);
                assert_eq!(*status, Status::ExpiringSoon);
                assert_eq!(*percentage_lifetime_elapsed, 0.0);
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_lifetime_percentage() {
        let evaluator = evaluator(StubFetcher::with(&[("ok.test", 200)]));
        let results = evaluator.evaluate(&hosts(&["ok.test"]));

        let expected = 100.0 - 200.0 * 100.0 / 365.0;
        assert!((results[0].progress() - expected).abs() < 1e-9);
        assert!((results[0].progress() - 45.2).abs() < 0.1);
        assert_eq!(results[0].issuer_display(), "Example CA");
    }

    #[test]
    fn test_lifetime_elapsed_clamps() {
        assert_eq!(lifetime_elapsed(400), 0.0);
        assert_eq!(lifetime_elapsed(365), 0.0);
        assert_eq!(lifetime_elapsed(0), 100.0);
        assert_eq!(lifetime_elapsed(-1), 0.0);
    }

    #[test]
    fn test_days_until_expiry_floors() {
        let now = instant();
        let later = now + chrono::Duration::hours(47);
        assert_eq!(days_until_expiry(later, now), 1);
        let earlier = now - chrono::Duration::hours(36);
        assert_eq!(days_until_expiry(earlier, now), -2);
        assert_eq!(days_until_expiry(now, now), 0);
    }

    #[test]
    fn test_failure_is_isolated() {
        let evaluator = evaluator(StubFetcher::with(&[("ok.test", 90)]));
        let results = evaluator.evaluate(&hosts(&["down.test", "ok.test"]));

        assert_eq!(results.len(), 2);
        assert!(!results[0].is_success());
        assert!(!results[0].error_message().unwrap().is_empty());
        assert_eq!(results[0].days_display(), "N/A");
        assert_eq!(results[0].status_label(), "Error");
        assert!(results[1].is_success());
        assert_eq!(results[1].days_display(), "90");
    }

    #[test]
    fn test_order_and_duplicates_preserved() {
        let mut fetcher = StubFetcher::with(&[("a.test", 10), ("b.test", 100)]);
        fetcher.delay = Duration::from_millis(5);
        let evaluator = evaluator(fetcher).with_concurrency(4);
        let input = hosts(&["b.test", "a.test", "x.test", "b.test", "a.test"]);

        let results = evaluator.evaluate(&input);

        let names: Vec<&str> = results.iter().map(|result| result.hostname()).collect();
        assert_eq!(names, vec!["b.test", "a.test", "x.test", "b.test", "a.test"]);
        assert_eq!(results[0], results[3]);
        assert_eq!(results[1], results[4]);
        assert_eq!(evaluator.fetcher.calls.lock().unwrap().len(), 5);
    }

    #[test]
    fn test_concurrency_is_bounded_and_matches_sequential() {
        let names: Vec<String> = (0..12).map(|i| format!("host{}.test", i)).collect();
        let expiries: Vec<(&str, i64)> = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i as i64 * 7 - 20))
            .collect();

        let sequential = evaluator(StubFetcher::with(&expiries))
            .with_concurrency(1)
            .evaluate(&names);

        let mut fetcher = StubFetcher::with(&expiries);
        fetcher.delay = Duration::from_millis(20);
        let concurrent = evaluator(fetcher).with_concurrency(3);
        let results = concurrent.evaluate(&names);

        assert_eq!(results, sequential);
        let peak = concurrent.fetcher.peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak in-flight fetches = {}", peak);
    }

    #[test]
    fn test_cancelled_batch_dials_nothing() {
        let evaluator = evaluator(StubFetcher::with(&[("a.test", 90)]));
        let cancel = CancelToken::new();
        cancel.cancel();

        let results = evaluator.evaluate_with_cancel(&hosts(&["a.test", "b.test"]), &cancel);

        assert_eq!(results.len(), 2);
        for result in &results {
            assert_eq!(
                result.error_message(),
                Some("check cancelled before it started")
            );
        }
        assert!(evaluator.fetcher.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_batch_timeout_keeps_completed_results() {
        let mut fetcher = StubFetcher::with(&[("a.test", 90), ("b.test", 90), ("c.test", 90)]);
        fetcher.delay = Duration::from_millis(150);
        let evaluator = evaluator(fetcher)
            .with_concurrency(1)
            .with_batch_timeout(Some(Duration::from_millis(50)));

        let results = evaluator.evaluate(&hosts(&["a.test", "b.test", "c.test"]));

        assert_eq!(results.len(), 3);
        assert!(results[0].is_success());
        assert!(!results[1].is_success());
        assert!(!results[2].is_success());
    }

    /// Blocks until its token fires, like a fetch stuck on a slow peer.
    struct WaitingFetcher;

    impl CertificateFetcher for WaitingFetcher {
        fn fetch(&self, hostname: &str) -> Result<CertificateInfo, FetchError> {
            self.fetch_with_cancel(hostname, &CancelToken::new())
        }

        fn fetch_with_cancel(
            &self,
            _hostname: &str,
            cancel: &CancelToken,
        ) -> Result<CertificateInfo, FetchError> {
            let started = Instant::now();
            while !cancel.is_cancelled() {
                if started.elapsed() > Duration::from_secs(10) {
                    return Err(FetchError::timeout("wait", Duration::from_secs(10)));
                }
                thread::sleep(Duration::from_millis(10));
            }
            Err(FetchError::interrupted("wait"))
        }
    }

    #[test]
    fn test_cancel_reaches_in_flight_fetches() {
        let evaluator = ExpiryEvaluator::new(WaitingFetcher).with_concurrency(2);
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            trigger.cancel();
        });

        let started = Instant::now();
        let results = evaluator.evaluate_with_cancel(&hosts(&["a.test", "b.test"]), &cancel);
        canceller.join().unwrap();

        assert!(started.elapsed() < Duration::from_secs(3));
        for result in &results {
            assert_eq!(result.error_message(), Some("check cancelled during wait"));
        }
    }

    #[test]
    fn test_batch_timeout_stops_in_flight_fetches() {
        let evaluator = ExpiryEvaluator::new(WaitingFetcher)
            .with_batch_timeout(Some(Duration::from_millis(100)));

        let started = Instant::now();
        let results = evaluator.evaluate(&hosts(&["a.test"]));

        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(results[0].error_message(), Some("check cancelled during wait"));
    }

    /// Panics for one hostname and delegates the rest.
    struct PanickingFetcher {
        inner: StubFetcher,
        bad: &'static str,
    }

    impl CertificateFetcher for PanickingFetcher {
        fn fetch(&self, hostname: &str) -> Result<CertificateInfo, FetchError> {
            if hostname == self.bad {
                panic!("malformed record for {}", hostname);
            }
            self.inner.fetch(hostname)
        }
    }

    #[test]
    fn test_panicking_fetch_becomes_failure() {
        let fetcher = PanickingFetcher {
            inner: StubFetcher::with(&[("a.test", 90), ("c.test", 90)]),
            bad: "b.test",
        };
        let evaluator = ExpiryEvaluator::new(fetcher)
            .with_concurrency(2)
            .with_clock(FixedClock(instant()));

        let results = evaluator.evaluate(&hosts(&["a.test", "b.test", "c.test"]));

        assert_eq!(results.len(), 3);
        assert!(results[0].is_success());
        assert!(results[2].is_success());
        assert_eq!(results[1].hostname(), "b.test");
        assert_eq!(
            results[1].error_message(),
            Some("certificate fetch panicked: malformed record for b.test")
        );
    }

    #[test]
    fn test_panic_message_payloads() {
        let payload: Box<dyn Any + Send> = Box::new("static text");
        assert_eq!(panic_message(payload.as_ref()), "static text");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned text"));
        assert_eq!(panic_message(payload.as_ref()), "owned text");
        let payload: Box<dyn Any + Send> = Box::new(7_u32);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }

    #[test]
    fn test_now_per_host_uses_clock_after_fetch() {
        struct SteppingClock(Mutex<DateTime<Utc>>);

        impl Clock for SteppingClock {
            fn now(&self) -> DateTime<Utc> {
                let mut now = self.0.lock().unwrap();
                let current = *now;
                *now = current + chrono::Duration::days(1);
                current
            }
        }

        let base = ExpiryEvaluator::new(StubFetcher::with(&[("a.test", 40)]))
            .with_concurrency(1)
            .with_clock(SteppingClock(Mutex::new(instant())));
        let input = hosts(&["a.test", "a.test"]);

        let per_batch = base.evaluate(&input);
        assert_eq!(per_batch[0].days_display(), per_batch[1].days_display());

        let per_host = ExpiryEvaluator::new(StubFetcher::with(&[("a.test", 40)]))
            .with_concurrency(1)
            .with_clock(SteppingClock(Mutex::new(instant())))
            .with_now_capture(NowCapture::PerHost);
        let results = per_host.evaluate(&input);
        // Call 0 is the batch instant; hosts see the following ticks.
        assert_eq!(results[0].days_display(), "39");
        assert_eq!(results[1].days_display(), "38");
    }

    #[test]
    fn test_display_accessors() {
        let result = check_result(
            "ok.test",
            Ok(CertificateInfo {
                expiry: Utc.with_ymd_and_hms(2026, 5, 1, 8, 30, 0).unwrap(),
                issuer_organization: "Example CA".to_string(),
            }),
            instant(),
        );
        assert_eq!(result.expiry_display(), "2026-05-01 08:30:00 UTC");
        assert_eq!(result.status_label(), "Valid");

        let failure = check_result("bad.test", Err(FetchError::Cancelled), instant());
        assert_eq!(failure.expiry_display(), "N/A");
        assert_eq!(failure.progress(), 0.0);
    }

    #[test]
    fn test_serializes_with_outcome_tag() {
        let failure = check_result("bad.test", Err(FetchError::Cancelled), instant());
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["outcome"], "failure");
        assert_eq!(json["hostname"], "bad.test");
    }

    #[test]
    fn test_now_capture_parse() {
        assert_eq!("per-host".parse::<NowCapture>().unwrap(), NowCapture::PerHost);
        assert_eq!(NowCapture::PerBatch.to_string(), "per-batch");
    }
}
