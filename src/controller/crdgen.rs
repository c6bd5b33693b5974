//! Prints the CustomResourceDefinitions managed by the controller as YAML.
//!
//! ```sh
//! cargo run --bin crdgen > config/crd/rdsinstance.yaml
//! ```

use anyhow::{Context, Result};
use kube::CustomResourceExt;
use rds_instance_controller::{Provider, RDSInstance};

fn main() -> Result<()> {
    let crds = [RDSInstance::crd(), Provider::crd()];
    for crd in &crds {
        let yaml = serde_yaml::to_string(crd).context("Failed to serialize CRD")?;
        println!("---\n{yaml}");
    }
    Ok(())
}
