/// Prometheus metrics for engagement actions
use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, IntCounterVec};

static ENGAGEMENT_ACTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "engagement_actions_total",
        "Engagement actions by kind and result",
        &["action", "result"]
    )
    .expect("Failed to register engagement actions metric")
});

static STORE_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "engagement_store_errors_total",
        "Document store failures seen by the coordinator",
        &["collection", "op"]
    )
    .expect("Failed to register engagement store errors metric")
});

pub fn record_action(action: &str, result: &str) {
    ENGAGEMENT_ACTIONS.with_label_values(&[action, result]).inc();
}

pub fn record_store_error(collection: &str, op: &str) {
    STORE_ERRORS.with_label_values(&[collection, op]).inc();
}
