//! Prometheus counter export for the /metrics endpoint.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static RECORDER: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the process-wide recorder and keep its render handle.
/// Must run before the first counter is touched; a second call is a
/// programming error and aborts startup.
pub fn init_metrics() {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Prometheus recorder installation failed");
    if RECORDER.set(handle).is_err() {
        panic!("metrics already initialized");
    }
}

/// Prometheus text exposition of everything recorded so far. Falls
/// back to a comment line when no recorder is installed, so the
/// endpoint stays serveable in tests.
pub fn get_metrics() -> String {
    match RECORDER.get() {
        Some(handle) => handle.render(),
        None => String::from("# no metrics recorder installed\n"),
    }
}
