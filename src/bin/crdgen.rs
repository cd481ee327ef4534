//! # CRD Generator
//!
//! Prints the `PullZone`, `StorageZone` and `EdgeRule` CustomResourceDefinitions
//! as a multi-document YAML stream.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin crdgen > config/crd/bunny-cdn-operator.yaml
//!
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use anyhow::{Context, Result};
use bunny_cdn_operator::{EdgeRule, PullZone, StorageZone};
use kube::core::CustomResourceExt;

fn main() -> Result<()> {
    let crds = [StorageZone::crd(), PullZone::crd(), EdgeRule::crd()];

    println!("# This file is auto-generated by crdgen");
    println!("# DO NOT EDIT THIS FILE MANUALLY");
    for crd in &crds {
        let yaml = serde_yaml::to_string(crd).context("Failed to serialize CRD")?;
        println!("---");
        print!("{yaml}");
    }

    Ok(())
}
