//! # Bunny CDN Operator
//!
//! Kubernetes operator that keeps Bunny CDN pull zones, storage zones and
//! edge rules in sync with `PullZone`, `StorageZone` and `EdgeRule` custom
//! resources.
//!
//! ## Overview
//!
//! 1. **Watch** - one watch stream per resource kind, kinds run concurrently
//! 2. **Finalizer gate** - deletions clean up Bunny CDN before the object goes away
//! 3. **Reconcile** - find-or-create by name, then a full update, once per generation
//! 4. **Resolve references** - wait for referenced zones with bounded backoff
//! 5. **Credentials** - zone credentials are written to a `Secret` next to the resource
//! 6. **Status** - `ready`, `message`, provider id and observed generation

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod provider;
pub mod server;

pub use crd::{EdgeRule, PullZone, StorageZone};
