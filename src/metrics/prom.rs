use certexpiry::CheckResult;
use lazy_static::lazy_static;
use log::{debug, warn};
use prometheus::{labels, register_gauge_vec, GaugeVec};

lazy_static! {
    static ref CERTEXPIRY_DAYS_UNTIL_EXPIRY: GaugeVec = register_gauge_vec!(
        "certexpiry_days_until_expiry",
        "days until the leaf certificate expires",
        &["host", "issuer", "status"]
    )
    .unwrap();
    static ref CERTEXPIRY_LIFETIME_ELAPSED: GaugeVec = register_gauge_vec!(
        "certexpiry_lifetime_elapsed_percent",
        "share of a nominal 365 day lifetime already used",
        &["host"]
    )
    .unwrap();
    static ref CERTEXPIRY_CHECK_FAILED: GaugeVec = register_gauge_vec!(
        "certexpiry_check_failed",
        "1 when the certificate could not be retrieved",
        &["host"]
    )
    .unwrap();
}

/// Pushes the gauges for a finished batch to the push gateway.
/// # Arguments
/// * `results` - results of the batch, in any order
/// * `prometheus_address` - push gateway base address
pub fn prometheus_metrics(results: &[CheckResult], prometheus_address: &str) {
    for result in results {
        let host = result.hostname();
        match result {
            CheckResult::Success {
                issuer,
                days_until_expiry,
                percentage_lifetime_elapsed,
                status,
                ..
            } => {
                let status = status.to_string();
                CERTEXPIRY_DAYS_UNTIL_EXPIRY
                    .with_label_values(&[host, issuer.as_str(), status.as_str()])
                    .set(*days_until_expiry as f64);
                CERTEXPIRY_LIFETIME_ELAPSED
                    .with_label_values(&[host])
                    .set(*percentage_lifetime_elapsed);
                CERTEXPIRY_CHECK_FAILED.with_label_values(&[host]).set(0.0);
            }
            CheckResult::Failure { .. } => {
                CERTEXPIRY_CHECK_FAILED.with_label_values(&[host]).set(1.0);
            }
        }
    }

    let metric_families = prometheus::gather();
    let pushed = prometheus::push_metrics(
        "certexpiry",
        labels! {
            "instance".to_owned() => "certexpiry".to_owned(),
        },
        &format!("{}/metrics/job", prometheus_address),
        metric_families,
        None,
    );

    match pushed {
        Ok(_) => debug!("pushed metrics for {} host(s)", results.len()),
        Err(e) => warn!("Failed to push metrics to prometheus: {}", e),
    }
}
