use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use prometheus::{IntCounterVec, Opts, Registry};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
pub static PROMETHEUS_REGISTRY: OnceLock<Registry> = OnceLock::new();
pub static FEE_RECEIPTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static FEE_AMOUNT_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static REGISTRATIONS_CONFIRMED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

pub fn init_metrics() {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    if METRICS_HANDLE.set(handle).is_err() {
        panic!("failed to set metrics handle: already initialized");
    }

    let registry = Registry::new();

    let receipts_counter = IntCounterVec::new(
        Opts::new(
            "fee_receipts_total",
            "Fee receipts recorded, by branch and purpose",
        ),
        &["branch_id", "purpose"],
    )
    .expect("Failed to create fee_receipts_total metric");

    let amount_counter = IntCounterVec::new(
        Opts::new(
            "fee_amount_total",
            "Total fee amounts collected by branch (whole rupees)",
        ),
        &["branch_id"],
    )
    .expect("Failed to create fee_amount_total metric");

    let registrations_counter = IntCounterVec::new(
        Opts::new(
            "registrations_confirmed_total",
            "Students moved to registered state, by branch",
        ),
        &["branch_id"],
    )
    .expect("Failed to create registrations_confirmed_total metric");

    registry
        .register(Box::new(receipts_counter.clone()))
        .expect("Failed to register fee_receipts_total");
    registry
        .register(Box::new(amount_counter.clone()))
        .expect("Failed to register fee_amount_total");
    registry
        .register(Box::new(registrations_counter.clone()))
        .expect("Failed to register registrations_confirmed_total");

    PROMETHEUS_REGISTRY
        .set(registry)
        .expect("Failed to set prometheus registry");
    FEE_RECEIPTS_TOTAL
        .set(receipts_counter)
        .expect("Failed to set fee_receipts_total");
    FEE_AMOUNT_TOTAL
        .set(amount_counter)
        .expect("Failed to set fee_amount_total");
    REGISTRATIONS_CONFIRMED_TOTAL
        .set(registrations_counter)
        .expect("Failed to set registrations_confirmed_total");
}

pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string());

    if let Some(registry) = PROMETHEUS_REGISTRY.get() {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).ok();
        if let Ok(custom_metrics) = String::from_utf8(buffer) {
            output.push_str(&custom_metrics);
        }
    }

    output
}

/// Record a receipt for metering.
pub fn record_receipt(branch_id: &str, purpose: &str, amount: f64) {
    if let Some(counter) = FEE_RECEIPTS_TOTAL.get() {
        counter.with_label_values(&[branch_id, purpose]).inc();
    }
    if let Some(counter) = FEE_AMOUNT_TOTAL.get() {
        counter
            .with_label_values(&[branch_id])
            .inc_by(amount.max(0.0).round() as u64);
    }
}

/// Record a confirmed registration.
pub fn record_registration(branch_id: &str) {
    if let Some(counter) = REGISTRATIONS_CONFIRMED_TOTAL.get() {
        counter.with_label_values(&[branch_id]).inc();
    }
}
