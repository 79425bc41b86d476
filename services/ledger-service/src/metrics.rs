use lazy_static::lazy_static;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::time::Duration;

lazy_static! {
    // Admission outcomes, labelled with the response's wire name ("ok" on success)
    pub static ref PROCESS_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("ledger_process_requests_total", "Total process requests by outcome"),
        &["outcome"]
    ).expect("metric can be created");

    pub static ref PROCESS_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new("ledger_process_duration_seconds", "Time spent admitting one number")
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0])
    ).expect("metric can be created");

    pub static ref LEDGER_RECORDS: IntGauge = IntGauge::new(
        "ledger_records",
        "Number of records seen at the last health check"
    ).expect("metric can be created");
}

/// Register all metrics with the given registry
pub fn register_metrics(registry: &Registry) -> Result<(), prometheus::Error> {
    registry.register(Box::new(PROCESS_REQUESTS_TOTAL.clone()))?;
    registry.register(Box::new(PROCESS_DURATION.clone()))?;
    registry.register(Box::new(LEDGER_RECORDS.clone()))?;
    Ok(())
}

pub fn record_outcome(outcome: &str, elapsed: Option<Duration>) {
    PROCESS_REQUESTS_TOTAL.with_label_values(&[outcome]).inc();
    if let Some(elapsed) = elapsed {
        PROCESS_DURATION.observe(elapsed.as_secs_f64());
    }
}

/// Render a registry in Prometheus text format
pub fn render(registry: &Registry) -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    let mut buffer = vec![];
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
