//! Gateway counters
//!
//! Emitted through the `metrics` facade; without an installed recorder the
//! calls are no-ops.
//!
//! - `gateway_requests_total` (counter): label `outcome`
//!   (`success` or a failure kind label)
//! - `gateway_refresh_total` (counter): label `outcome` (`success`, `failure`)

/// Record the final outcome of one `Gateway::send` call.
pub fn record_request(outcome: &'static str) {
    metrics::counter!("gateway_requests_total", "outcome" => outcome).increment(1);
}

/// Record one refresh performed by a leader.
pub fn record_refresh(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("gateway_refresh_total", "outcome" => outcome).increment(1);
}
