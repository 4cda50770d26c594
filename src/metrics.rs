//! Metric names and one-time registration.

use metrics::{describe_counter, describe_gauge};
use once_cell::sync::OnceCell;

pub const POSTINGS_FETCHED: &str = "radar_postings_fetched_total";
pub const SOURCE_ERRORS: &str = "radar_source_errors_total";
pub const DECISIONS: &str = "radar_decisions_total";
pub const ALERTS_ROUTED: &str = "radar_alerts_routed_total";
pub const SUPPRESSED: &str = "radar_suppressed_total";
pub const FAULTS: &str = "radar_posting_faults_total";
pub const LAST_RUN_TS: &str = "radar_last_run_ts";
pub const STATE_RECORDS: &str = "radar_state_records";

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(POSTINGS_FETCHED, "Postings fetched across all sources.");
        describe_counter!(SOURCE_ERRORS, "Source fetch/parse errors.");
        describe_counter!(DECISIONS, "Routing decisions produced.");
        describe_counter!(ALERTS_ROUTED, "Decisions routed to a channel.");
        describe_counter!(SUPPRESSED, "Decisions suppressed by dedup state.");
        describe_counter!(FAULTS, "Malformed postings skipped.");
        describe_gauge!(LAST_RUN_TS, "Unix ts when the monitor last ran.");
        describe_gauge!(STATE_RECORDS, "Alert records in the persisted snapshot.");
    });
}

/// Install the Prometheus exporter with its own HTTP listener when
/// `METRICS_ADDR` is set (continuous mode only). Returns quietly otherwise.
pub fn maybe_install_exporter() {
    let Ok(addr) = std::env::var("METRICS_ADDR") else {
        return;
    };
    let Ok(addr) = addr.parse::<std::net::SocketAddr>() else {
        tracing::warn!(%addr, "METRICS_ADDR is not a socket address; exporter disabled");
        return;
    };
    match metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
    {
        Ok(()) => tracing::info!(%addr, "prometheus exporter listening"),
        Err(e) => tracing::warn!(error = ?e, "prometheus exporter failed to start"),
    }
}
