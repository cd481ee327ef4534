//! # Constants
//!
//! Shared constants used throughout the operator.
//!
//! Values marked as defaults can be overridden through environment variables,
//! see [`crate::config::OperatorConfig`].

/// API group for all custom resources managed by the operator
pub const API_GROUP: &str = "bunny-cdn-operator.com";

/// API version for all custom resources managed by the operator
pub const API_VERSION: &str = "v1alpha1";

/// Field manager name used for status patches
pub const FIELD_MANAGER: &str = "bunny-cdn-operator";

/// Finalizer token attached to `PullZone` resources
pub const PULL_ZONE_FINALIZER: &str = "pullzones.bunny-cdn-operator.com/finalizer";

/// Finalizer token attached to `StorageZone` resources
pub const STORAGE_ZONE_FINALIZER: &str = "storagezones.bunny-cdn-operator.com/finalizer";

/// Finalizer token attached to `EdgeRule` resources
pub const EDGE_RULE_FINALIZER: &str = "edgerules.bunny-cdn-operator.com/finalizer";

/// Default Bunny CDN API endpoint
pub const DEFAULT_BUNNY_API_URL: &str = "https://api.bunny.net";

/// Page size used for provider listings.
/// A full page means the listing may be truncated, which is not supported.
pub const PROVIDER_PAGE_SIZE: usize = 1000;

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default dependency resolution backoff starting value (milliseconds)
pub const DEFAULT_DEPENDENCY_BACKOFF_START_MS: u64 = 500;

/// Default dependency resolution backoff multiplier
pub const DEFAULT_DEPENDENCY_BACKOFF_FACTOR: u32 = 2;

/// Default number of dependency resolution attempts (including the first one)
pub const DEFAULT_DEPENDENCY_BACKOFF_ATTEMPTS: u32 = 5;

/// Process exit code when the provider API key is missing at startup
pub const EXIT_CODE_MISSING_API_KEY: i32 = 9;

/// Secret keys written for pull zones
pub const ZONE_ID_KEY: &str = "BUNNY_CDN_ZONE_ID";
pub const ZONE_SECURITY_KEY_KEY: &str = "BUNNY_CDN_ZONE_SECURITY_KEY";
pub const ZONE_HOST_KEY: &str = "BUNNY_CDN_ZONE_HOST";

/// Secret keys written for storage zones
pub const STORAGE_ZONE_ID_KEY: &str = "BUNNY_CDN_STORAGE_ZONE_ID";
pub const STORAGE_ZONE_NAME_KEY: &str = "BUNNY_CDN_STORAGE_ZONE_NAME";
pub const STORAGE_ZONE_PASSWORD_KEY: &str = "BUNNY_CDN_STORAGE_ZONE_PASSWORD";
pub const STORAGE_ZONE_READ_ONLY_PASSWORD_KEY: &str = "BUNNY_CDN_STORAGE_ZONE_READ_ONLY_PASSWORD";
pub const STORAGE_ZONE_HOSTNAME_KEY: &str = "BUNNY_CDN_STORAGE_ZONE_HOSTNAME";
