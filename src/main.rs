//! # RDSInstance Controller
//!
//! Provisions AWS RDS instances for `RDSInstance` records.
//!
//! ## Features
//!
//! - **Lifecycle reconciliation**: create, observe and delete DB instances
//! - **Connection secrets**: username, password and endpoint published to a Secret
//! - **Reclaim policy**: retain or delete the DB instance with its record
//! - **Prometheus metrics**: exposes metrics for monitoring and observability
//! - **Health probes**: HTTP endpoints for liveness and readiness checks

use anyhow::Result;
use rds_instance_controller::runtime::{initialize, run_watch_loop};

#[tokio::main]
async fn main() -> Result<()> {
    let init_result = initialize().await?;
    run_watch_loop(init_result.client, init_result.context).await?;
    Ok(())
}
