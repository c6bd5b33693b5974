//! # Provider Metrics
//!
//! Counts RDS API calls by operation and outcome.

use crate::observability::metrics::registry::REGISTRY;
use anyhow::Result;
use prometheus::IntCounterVec;
use std::sync::LazyLock;

static PROVIDER_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "rds_instance_provider_operations_total",
            "Total number of RDS API operations",
        ),
        &["operation", "outcome"],
    )
    .expect("Failed to create PROVIDER_OPERATIONS_TOTAL metric - this should never happen")
});

pub(crate) fn register_provider_metrics() -> Result<()> {
    REGISTRY.register(Box::new(PROVIDER_OPERATIONS_TOTAL.clone()))?;
    Ok(())
}

/// `operation` is e.g. `create`, `describe` or `delete`; `outcome` is
/// `success`, `already_exists`, `not_found` or `error`
pub fn increment_provider_operations(operation: &str, outcome: &str) {
    PROVIDER_OPERATIONS_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
}
