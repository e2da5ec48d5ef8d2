//! Metrics collection and exposition.
//!
//! # Metrics
//! - `odata_requests_total` (counter): requests by method, status, resource
//! - `odata_request_duration_seconds` (histogram): latency distribution
//! - `odata_catalogue_books` (gauge): books in the store at startup
//!
//! Without an installed recorder every call is a no-op.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, resource: &'static str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("resource", resource.to_string()),
    ];
    counter!("odata_requests_total", &labels).increment(1);
    histogram!("odata_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

pub fn record_catalogue_size(books: usize) {
    gauge!("odata_catalogue_books").set(books as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_request("GET", 200, "books", Instant::now());
        record_catalogue_size(5);
    }
}
