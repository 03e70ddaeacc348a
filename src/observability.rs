use std::net::SocketAddr;

// ── Mutation metrics ────────────────────────────────────────────

/// Counter: applied mutations. Labels: document, op.
pub const MUTATIONS_TOTAL: &str = "raidplan_mutations_total";

/// Counter: mutations refused by validation. Labels: document, op.
pub const REJECTED_MUTATIONS_TOTAL: &str = "raidplan_rejected_mutations_total";

// ── History metrics ─────────────────────────────────────────────

/// Counter: successful undo steps. Labels: document.
pub const UNDO_TOTAL: &str = "raidplan_undo_total";

/// Counter: successful redo steps. Labels: document.
pub const REDO_TOTAL: &str = "raidplan_redo_total";

/// Counter: snapshots dropped because the history was full. Labels: document.
pub const HISTORY_EVICTIONS_TOTAL: &str = "raidplan_history_evictions_total";

// ── Derived views ───────────────────────────────────────────────

/// Histogram: time spent building one mitigation series, in seconds.
pub const MITIGATION_COMPUTE_SECONDS: &str = "raidplan_mitigation_compute_seconds";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), metrics_exporter_prometheus::BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}
