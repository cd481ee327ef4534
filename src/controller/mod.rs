//! # Controller
//!
//! Reconciliation engine for the Bunny CDN operator.
//!
//! - `backoff`: bounded exponential backoff
//! - `credentials`: credential secrets written next to provisioned resources
//! - `dependency`: resolution of references between resources
//! - `dispatcher`: per-kind watch loops
//! - `error`: tagged reconcile errors
//! - `reconciler`: per-kind reconciliation
//! - `store`: object store capability and finalizer gate

pub mod backoff;
pub mod credentials;
pub mod dependency;
pub mod dispatcher;
pub mod error;
pub mod reconciler;
pub mod store;

pub use error::ReconcileError;
pub use reconciler::Reconciler;
