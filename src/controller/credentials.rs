//! # Credential Materializer
//!
//! Writes provider credentials into a Kubernetes `Secret` next to the resource
//! they belong to.
//!
//! Secrets are replaced, never patched: an existing secret is deleted and a new
//! one created from scratch. A reader between the two calls sees no secret.

use crate::controller::error::ReconcileError;
use crate::observability::metrics;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use k8s_openapi::api::core::v1::{Namespace, Secret};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::{Api, DeleteParams, PostParams};
use kube::{Client, Resource};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info};

/// Failures reported by a [`SecretStore`]
#[derive(Debug, Error)]
pub enum SecretStoreError {
    /// The store answered with a non-success HTTP status
    #[error("({status}) : {reason}")]
    Http { status: u16, reason: String },

    #[error("{0}")]
    Other(String),
}

impl From<kube::Error> for SecretStoreError {
    fn from(error: kube::Error) -> Self {
        match error {
            kube::Error::Api(api_err) => SecretStoreError::Http {
                status: api_err.code,
                reason: status_reason(api_err.code).unwrap_or(api_err.reason),
            },
            other => SecretStoreError::Other(other.to_string()),
        }
    }
}

/// HTTP reason phrase for `code`, e.g. `Not Found` for 404
fn status_reason(code: u16) -> Option<String> {
    reqwest::StatusCode::from_u16(code)
        .ok()
        .and_then(|status| status.canonical_reason())
        .map(str::to_string)
}

/// A secret ready to be written. `data` values are already base64 encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialSecret {
    pub name: String,
    pub namespace: String,
    pub data: BTreeMap<String, String>,
    pub owner_references: Vec<OwnerReference>,
}

/// Namespace and secret operations the materializer needs
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fails when the namespace cannot be read
    async fn read_namespace(&self, namespace: &str) -> Result<(), SecretStoreError>;

    async fn secret_exists(&self, name: &str, namespace: &str) -> Result<bool, SecretStoreError>;

    async fn delete_secret(&self, name: &str, namespace: &str) -> Result<(), SecretStoreError>;

    async fn create_secret(&self, secret: &CredentialSecret) -> Result<(), SecretStoreError>;
}

/// [`SecretStore`] backed by the Kubernetes core API
#[derive(Clone)]
pub struct KubeSecretStore {
    client: Client,
}

impl std::fmt::Debug for KubeSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeSecretStore").finish_non_exhaustive()
    }
}

impl KubeSecretStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    async fn read_namespace(&self, namespace: &str) -> Result<(), SecretStoreError> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        namespaces.get(namespace).await?;
        Ok(())
    }

    async fn secret_exists(&self, name: &str, namespace: &str) -> Result<bool, SecretStoreError> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        match secrets.get(name).await {
            Ok(_) => Ok(true),
            Err(kube::Error::Api(api_err)) if api_err.code == 404 => {
                debug!("Secret {} not found", name);
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_secret(&self, name: &str, namespace: &str) -> Result<(), SecretStoreError> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        secrets.delete(name, &DeleteParams::default()).await?;
        Ok(())
    }

    async fn create_secret(&self, secret: &CredentialSecret) -> Result<(), SecretStoreError> {
        // `data` goes through serde so the already-encoded values are not
        // encoded a second time.
        let manifest = serde_json::json!({
            "apiVersion": "v1",
            "kind": "Secret",
            "metadata": {
                "name": secret.name,
                "namespace": secret.namespace,
                "ownerReferences": secret.owner_references,
            },
            "data": secret.data,
        });
        let object: Secret = serde_json::from_value(manifest)
            .map_err(|e| SecretStoreError::Other(format!("Invalid secret manifest: {e}")))?;

        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), &secret.namespace);
        secrets.create(&PostParams::default(), &object).await?;
        Ok(())
    }
}

/// Owner reference to `owner`, or `None` unless its api version, kind, name
/// and uid are all known
pub fn owner_reference<K: Resource<DynamicType = ()>>(owner: &K) -> Option<OwnerReference> {
    let api_version = K::api_version(&());
    let kind = K::kind(&());
    let meta = owner.meta();
    let name = meta.name.clone()?;
    let uid = meta.uid.clone()?;

    if api_version.is_empty() || kind.is_empty() || name.is_empty() || uid.is_empty() {
        return None;
    }

    Some(OwnerReference {
        api_version: api_version.into_owned(),
        kind: kind.into_owned(),
        name,
        uid,
        ..OwnerReference::default()
    })
}

/// Replace the secret `name` in `namespace` with `values`.
///
/// Values are base64 encoded before being written. HTTP failures from the
/// store are reported with their status, anything else as `Unknown error`.
pub async fn materialize_secret<K: Resource<DynamicType = ()>>(
    store: &dyn SecretStore,
    name: &str,
    namespace: &str,
    values: &BTreeMap<String, String>,
    owner: Option<&K>,
) -> Result<(), ReconcileError> {
    let secret = CredentialSecret {
        name: name.to_string(),
        namespace: namespace.to_string(),
        data: values
            .iter()
            .map(|(key, value)| (key.clone(), BASE64.encode(value)))
            .collect(),
        owner_references: owner.and_then(owner_reference).into_iter().collect(),
    };

    replace_secret(store, &secret)
        .await
        .map_err(|e| match e {
            SecretStoreError::Http { status, reason } => ReconcileError::Infrastructure(format!(
                "Error occurred when attempting to create secret \"{name}\" in namespace: \"{namespace}\" ({status}) : {reason}"
            )),
            SecretStoreError::Other(detail) => {
                debug!("Secret {} failed: {}", name, detail);
                ReconcileError::Infrastructure("Unknown error".to_string())
            }
        })?;

    metrics::increment_secrets_materialized();
    info!("Materialized secret {}/{}", namespace, name);
    Ok(())
}

async fn replace_secret(
    store: &dyn SecretStore,
    secret: &CredentialSecret,
) -> Result<(), SecretStoreError> {
    store.read_namespace(&secret.namespace).await?;

    if store.secret_exists(&secret.name, &secret.namespace).await? {
        debug!("Secret {} already exists, deleting it", secret.name);
        store
            .delete_secret(&secret.name, &secret.namespace)
            .await?;
    }

    debug!("Creating secret {}", secret.name);
    store.create_secret(secret).await
}
