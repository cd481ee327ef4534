//! Common test utilities
//!
//! In-memory stand-ins for the Kubernetes object store, the secret store and
//! the Bunny CDN API, plus fixtures for the three resource kinds.

#![allow(dead_code, reason = "Each test crate uses a different subset")]

use async_trait::async_trait;
use bunny_cdn_operator::controller::backoff::BackoffSettings;
use bunny_cdn_operator::controller::credentials::{
    CredentialSecret, SecretStore, SecretStoreError,
};
use bunny_cdn_operator::controller::error::ReconcileError;
use bunny_cdn_operator::controller::store::{ObjectStore, WatchEvent};
use bunny_cdn_operator::controller::Reconciler;
use bunny_cdn_operator::crd::{
    EdgeRule, EdgeRuleSpec, EdgeRuleStatus, ManagedResource, PullZone, PullZoneSpec, StorageZone,
    StorageZoneSpec, ZoneStatus,
};
use bunny_cdn_operator::provider::{
    CdnProvider, CreatePullZoneRequest, CreateStorageZoneRequest, EdgeRuleRequest,
    EdgeRuleResource, Hostname, ProviderError, PullZoneResource, StorageZoneResource,
    UpdatePullZoneRequest, UpdateStorageZoneRequest,
};
use futures::stream::{self, BoxStream, StreamExt};
use kube::ResourceExt;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

static RUSTLS_INIT: Once = Once::new();

/// Initialize rustls crypto provider for tests
///
/// Uses a `Once` to ensure it's only called once across all tests.
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        // `PactBuilder::new` may already have installed the ring provider
        if rustls::crypto::CryptoProvider::get_default().is_none() {
            rustls::crypto::ring::default_provider()
                .install_default()
                .expect("Failed to install rustls crypto provider");
        }
    });
}

pub const NAMESPACE: &str = "web";

// ---------------------------------------------------------------------------
// Object store
// ---------------------------------------------------------------------------

/// Object store keeping objects in memory.
///
/// Status writes are applied as a JSON merge patch, like the API server does.
pub struct MemoryStore<K> {
    objects: Mutex<HashMap<(String, String), K>>,
    events: Mutex<Vec<Result<WatchEvent<K>, ReconcileError>>>,
    get_calls: AtomicUsize,
    status_patches: AtomicUsize,
    finalizer_writes: AtomicUsize,
}

impl<K: ManagedResource> MemoryStore<K> {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            events: Mutex::new(Vec::new()),
            get_calls: AtomicUsize::new(0),
            status_patches: AtomicUsize::new(0),
            finalizer_writes: AtomicUsize::new(0),
        }
    }

    pub fn with(objects: Vec<K>) -> Arc<Self> {
        let store = Self::new();
        for obj in objects {
            store.insert(obj);
        }
        Arc::new(store)
    }

    pub fn insert(&self, obj: K) {
        let key = (obj.namespace().unwrap_or_default(), obj.name_any());
        self.objects.lock().unwrap().insert(key, obj);
    }

    pub fn object(&self, name: &str) -> K {
        self.objects
            .lock()
            .unwrap()
            .get(&(NAMESPACE.to_string(), name.to_string()))
            .cloned()
            .expect("object should exist")
    }

    /// Queue events replayed by the next `watch()`
    pub fn push_event(&self, event: Result<WatchEvent<K>, ReconcileError>) {
        self.events.lock().unwrap().push(event);
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn status_patches(&self) -> usize {
        self.status_patches.load(Ordering::SeqCst)
    }

    pub fn finalizer_writes(&self) -> usize {
        self.finalizer_writes.load(Ordering::SeqCst)
    }

    fn update(
        &self,
        obj: &K,
        patch: serde_json::Value,
    ) -> Result<(), ReconcileError> {
        let key = (obj.namespace().unwrap_or_default(), obj.name_any());
        let mut objects = self.objects.lock().unwrap();
        let stored = objects.get(&key).ok_or_else(|| {
            ReconcileError::Infrastructure(format!("{} not found", obj.identity()))
        })?;

        let mut value = serde_json::to_value(stored).unwrap();
        merge(&mut value, patch);
        objects.insert(key, serde_json::from_value(value).unwrap());
        Ok(())
    }
}

/// RFC 7386 JSON merge patch
fn merge(target: &mut serde_json::Value, patch: serde_json::Value) {
    match patch {
        serde_json::Value::Object(entries) => {
            if !target.is_object() {
                *target = serde_json::Value::Object(serde_json::Map::new());
            }
            let map = target.as_object_mut().unwrap();
            for (key, value) in entries {
                if value.is_null() {
                    map.remove(&key);
                } else {
                    merge(map.entry(key).or_insert(serde_json::Value::Null), value);
                }
            }
        }
        other => *target = other,
    }
}

#[async_trait]
impl<K: ManagedResource> ObjectStore<K> for MemoryStore<K> {
    fn watch(&self) -> BoxStream<'static, Result<WatchEvent<K>, ReconcileError>> {
        let events: Vec<_> = self.events.lock().unwrap().drain(..).collect();
        stream::iter(events).boxed()
    }

    async fn get(&self, name: &str, namespace: &str) -> Result<Option<K>, ReconcileError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .objects
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn patch_status(&self, obj: &K, status: &K::Status) -> Result<(), ReconcileError> {
        self.status_patches.fetch_add(1, Ordering::SeqCst);
        self.update(obj, serde_json::json!({ "status": status }))
    }

    async fn replace_finalizers(
        &self,
        obj: &K,
        finalizers: Vec<String>,
    ) -> Result<(), ReconcileError> {
        self.finalizer_writes.fetch_add(1, Ordering::SeqCst);
        self.update(
            obj,
            serde_json::json!({ "metadata": { "finalizers": finalizers } }),
        )
    }
}

// ---------------------------------------------------------------------------
// Secret store
// ---------------------------------------------------------------------------

/// Secret store keeping secrets in memory and recording every call
#[derive(Default)]
pub struct MemorySecretStore {
    namespaces: Mutex<HashSet<String>>,
    secrets: Mutex<BTreeMap<(String, String), CredentialSecret>>,
    operations: Mutex<Vec<String>>,
    fail_create: Mutex<Option<String>>,
}

impl MemorySecretStore {
    pub fn with_namespace(namespace: &str) -> Arc<Self> {
        let store = Self::default();
        store.namespaces.lock().unwrap().insert(namespace.to_string());
        Arc::new(store)
    }

    pub fn secret(&self, name: &str) -> Option<CredentialSecret> {
        self.secrets
            .lock()
            .unwrap()
            .get(&(NAMESPACE.to_string(), name.to_string()))
            .cloned()
    }

    pub fn insert_secret(&self, secret: CredentialSecret) {
        self.secrets
            .lock()
            .unwrap()
            .insert((secret.namespace.clone(), secret.name.clone()), secret);
    }

    pub fn operations(&self) -> Vec<String> {
        self.operations.lock().unwrap().clone()
    }

    /// Make `create_secret` fail with a non-HTTP error
    pub fn fail_create(&self, detail: &str) {
        *self.fail_create.lock().unwrap() = Some(detail.to_string());
    }

    fn record(&self, operation: String) {
        self.operations.lock().unwrap().push(operation);
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn read_namespace(&self, namespace: &str) -> Result<(), SecretStoreError> {
        self.record(format!("read_namespace {namespace}"));
        if self.namespaces.lock().unwrap().contains(namespace) {
            Ok(())
        } else {
            Err(SecretStoreError::Http {
                status: 404,
                reason: "Not Found".to_string(),
            })
        }
    }

    async fn secret_exists(&self, name: &str, namespace: &str) -> Result<bool, SecretStoreError> {
        self.record(format!("secret_exists {namespace}/{name}"));
        Ok(self
            .secrets
            .lock()
            .unwrap()
            .contains_key(&(namespace.to_string(), name.to_string())))
    }

    async fn delete_secret(&self, name: &str, namespace: &str) -> Result<(), SecretStoreError> {
        self.record(format!("delete {namespace}/{name}"));
        self.secrets
            .lock()
            .unwrap()
            .remove(&(namespace.to_string(), name.to_string()));
        Ok(())
    }

    async fn create_secret(&self, secret: &CredentialSecret) -> Result<(), SecretStoreError> {
        self.record(format!("create {}/{}", secret.namespace, secret.name));
        if let Some(detail) = self.fail_create.lock().unwrap().clone() {
            return Err(SecretStoreError::Other(detail));
        }
        self.insert_secret(secret.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Bunny CDN stand-in recording every call
pub struct MockProvider {
    pub pull_zones: Mutex<Vec<PullZoneResource>>,
    pub storage_zones: Mutex<Vec<StorageZoneResource>>,
    calls: Mutex<Vec<String>>,
    pub created_pull_zones: Mutex<Vec<CreatePullZoneRequest>>,
    pub created_storage_zones: Mutex<Vec<CreateStorageZoneRequest>>,
    pub pull_zone_updates: Mutex<Vec<(i64, UpdatePullZoneRequest)>>,
    pub storage_zone_updates: Mutex<Vec<(i64, UpdateStorageZoneRequest)>>,
    pub edge_rule_upserts: Mutex<Vec<(i64, EdgeRuleRequest)>>,
    error_message: Mutex<Option<String>>,
    next_id: AtomicI64,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            pull_zones: Mutex::new(Vec::new()),
            storage_zones: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            created_pull_zones: Mutex::new(Vec::new()),
            created_storage_zones: Mutex::new(Vec::new()),
            pull_zone_updates: Mutex::new(Vec::new()),
            storage_zone_updates: Mutex::new(Vec::new()),
            edge_rule_upserts: Mutex::new(Vec::new()),
            error_message: Mutex::new(None),
            next_id: AtomicI64::new(100),
        }
    }
}

impl MockProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Make every following call fail with an API error payload
    pub fn fail_with(&self, message: &str) {
        *self.error_message.lock().unwrap() = Some(message.to_string());
    }

    pub fn add_pull_zone(&self, id: i64, name: &str) {
        self.pull_zones.lock().unwrap().push(pull_zone_resource(id, name));
    }

    pub fn add_storage_zone(&self, id: i64, name: &str, deleted: bool) {
        self.storage_zones.lock().unwrap().push(StorageZoneResource {
            id,
            name: name.to_string(),
            password: Some(format!("password-{id}")),
            read_only_password: Some(format!("ro-password-{id}")),
            storage_hostname: Some("storage.bunnycdn.com".to_string()),
            deleted,
        });
    }

    fn call(&self, name: String) -> Result<(), ProviderError> {
        self.calls.lock().unwrap().push(name);
        match self.error_message.lock().unwrap().clone() {
            Some(message) => Err(ProviderError::Api {
                status: 400,
                error_key: "validation".to_string(),
                field: String::new(),
                message,
            }),
            None => Ok(()),
        }
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

fn pull_zone_resource(id: i64, name: &str) -> PullZoneResource {
    PullZoneResource {
        id,
        name: name.to_string(),
        origin_url: None,
        storage_zone_id: None,
        hostnames: vec![Hostname {
            id: 1,
            value: format!("{name}.b-cdn.net"),
            is_system_hostname: true,
        }],
        zone_security_key: Some(format!("security-key-{id}")),
    }
}

#[async_trait]
impl CdnProvider for MockProvider {
    async fn list_pull_zones(&self) -> Result<Vec<PullZoneResource>, ProviderError> {
        self.call("list_pull_zones".to_string())?;
        Ok(self.pull_zones.lock().unwrap().clone())
    }

    async fn create_pull_zone(
        &self,
        request: &CreatePullZoneRequest,
    ) -> Result<PullZoneResource, ProviderError> {
        self.call(format!("create_pull_zone {}", request.name))?;
        self.created_pull_zones.lock().unwrap().push(request.clone());
        let zone = pull_zone_resource(self.next_id(), &request.name);
        self.pull_zones.lock().unwrap().push(zone.clone());
        Ok(zone)
    }

    async fn update_pull_zone(
        &self,
        id: i64,
        request: &UpdatePullZoneRequest,
    ) -> Result<PullZoneResource, ProviderError> {
        self.call(format!("update_pull_zone {id}"))?;
        self.pull_zone_updates
            .lock()
            .unwrap()
            .push((id, request.clone()));
        self.pull_zones
            .lock()
            .unwrap()
            .iter()
            .find(|zone| zone.id == id)
            .cloned()
            .ok_or(ProviderError::Status { status: 404 })
    }

    async fn delete_pull_zone(&self, id: i64) -> Result<(), ProviderError> {
        self.call(format!("delete_pull_zone {id}"))
    }

    async fn list_storage_zones(&self) -> Result<Vec<StorageZoneResource>, ProviderError> {
        self.call("list_storage_zones".to_string())?;
        Ok(self.storage_zones.lock().unwrap().clone())
    }

    async fn create_storage_zone(
        &self,
        request: &CreateStorageZoneRequest,
    ) -> Result<StorageZoneResource, ProviderError> {
        self.call(format!("create_storage_zone {}", request.name))?;
        self.created_storage_zones
            .lock()
            .unwrap()
            .push(request.clone());
        let id = self.next_id();
        self.add_storage_zone(id, &request.name, false);
        Ok(self
            .storage_zones
            .lock()
            .unwrap()
            .last()
            .cloned()
            .unwrap())
    }

    async fn update_storage_zone(
        &self,
        id: i64,
        request: &UpdateStorageZoneRequest,
    ) -> Result<(), ProviderError> {
        self.call(format!("update_storage_zone {id}"))?;
        self.storage_zone_updates
            .lock()
            .unwrap()
            .push((id, request.clone()));
        Ok(())
    }

    async fn delete_storage_zone(&self, id: i64) -> Result<(), ProviderError> {
        self.call(format!("delete_storage_zone {id}"))
    }

    async fn upsert_edge_rule(
        &self,
        zone_id: i64,
        rule: &EdgeRuleRequest,
    ) -> Result<EdgeRuleResource, ProviderError> {
        self.call(format!("upsert_edge_rule {zone_id}"))?;
        self.edge_rule_upserts
            .lock()
            .unwrap()
            .push((zone_id, rule.clone()));
        let guid = rule
            .guid
            .clone()
            .unwrap_or_else(|| format!("rule-{}", self.next_id()));
        Ok(EdgeRuleResource { guid })
    }

    async fn delete_edge_rule(&self, zone_id: i64, guid: &str) -> Result<(), ProviderError> {
        self.call(format!("delete_edge_rule {zone_id} {guid}"))
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Test harness wiring the in-memory doubles into a [`Reconciler`]
pub struct Harness {
    pub provider: Arc<MockProvider>,
    pub secrets: Arc<MemorySecretStore>,
    pub pull_zones: Arc<MemoryStore<PullZone>>,
    pub storage_zones: Arc<MemoryStore<StorageZone>>,
    pub edge_rules: Arc<MemoryStore<EdgeRule>>,
    pub ctx: Arc<Reconciler>,
}

impl Harness {
    pub fn new(
        pull_zones: Vec<PullZone>,
        storage_zones: Vec<StorageZone>,
        edge_rules: Vec<EdgeRule>,
    ) -> Self {
        let provider = MockProvider::new();
        let secrets = MemorySecretStore::with_namespace(NAMESPACE);
        let pull_zones = MemoryStore::with(pull_zones);
        let storage_zones = MemoryStore::with(storage_zones);
        let edge_rules = MemoryStore::with(edge_rules);

        let ctx = Arc::new(Reconciler {
            provider: Arc::clone(&provider) as Arc<dyn CdnProvider>,
            secrets: Arc::clone(&secrets) as Arc<dyn SecretStore>,
            pull_zones: Arc::clone(&pull_zones) as Arc<dyn ObjectStore<PullZone>>,
            storage_zones: Arc::clone(&storage_zones) as Arc<dyn ObjectStore<StorageZone>>,
            edge_rules: Arc::clone(&edge_rules) as Arc<dyn ObjectStore<EdgeRule>>,
            dependency_backoff: fast_backoff(),
        });

        Self {
            provider,
            secrets,
            pull_zones,
            storage_zones,
            edge_rules,
            ctx,
        }
    }
}

/// Five attempts with millisecond delays
pub fn fast_backoff() -> BackoffSettings {
    BackoffSettings::new(1, 2, 5)
}

fn with_metadata<K: ManagedResource>(mut obj: K, generation: i64) -> K {
    let meta = obj.meta_mut();
    meta.namespace = Some(NAMESPACE.to_string());
    meta.generation = Some(generation);
    meta.uid = Some(format!("uid-{}", meta.name.clone().unwrap_or_default()));
    obj
}

pub fn pull_zone(name: &str, spec: serde_json::Value) -> PullZone {
    let spec: PullZoneSpec = serde_json::from_value(spec).unwrap();
    with_metadata(PullZone::new(name, spec), 1)
}

pub fn storage_zone(name: &str, spec: serde_json::Value) -> StorageZone {
    let spec: StorageZoneSpec = serde_json::from_value(spec).unwrap();
    with_metadata(StorageZone::new(name, spec), 1)
}

pub fn edge_rule(name: &str, spec: serde_json::Value) -> EdgeRule {
    let spec: EdgeRuleSpec = serde_json::from_value(spec).unwrap();
    with_metadata(EdgeRule::new(name, spec), 1)
}

/// Storage zone that has been provisioned as `provider_id`
pub fn ready_storage_zone(name: &str, provider_id: i64) -> StorageZone {
    let mut zone = storage_zone(name, serde_json::json!({}));
    zone.status = Some(ZoneStatus::succeeded(provider_id, Some(1)));
    zone
}

/// Storage zone whose last reconciliation failed
pub fn pending_storage_zone(name: &str) -> StorageZone {
    let mut zone = storage_zone(name, serde_json::json!({}));
    zone.status = Some(ZoneStatus::failed("still provisioning", Some(1)));
    zone
}

pub fn ready_pull_zone(name: &str, provider_id: i64) -> PullZone {
    let mut zone = pull_zone(name, serde_json::json!({ "originUrl": "https://origin.example" }));
    zone.status = Some(ZoneStatus::succeeded(provider_id, Some(1)));
    zone
}

pub fn edge_rule_spec(zone: &str) -> serde_json::Value {
    serde_json::json!({
        "zoneRef": { "name": zone },
        "actionType": 1,
        "actionParameter1": "https://example.com/moved",
        "triggers": [{ "type": 0, "patternMatches": ["*/old/*"], "patternMatchingType": 0 }],
        "triggerMatchingType": 0,
        "description": "Redirect old paths"
    })
}

/// Mark `obj` as being deleted while holding `finalizer`
pub fn deleting<K: ManagedResource>(mut obj: K) -> K {
    let meta = obj.meta_mut();
    meta.deletion_timestamp =
        Some(serde_json::from_value(serde_json::json!("2024-01-01T00:00:00Z")).unwrap());
    meta.finalizers = Some(vec![K::FINALIZER.to_string()]);
    obj
}

/// Give `obj` the finalizer it gets on its first reconciliation
pub fn finalized<K: ManagedResource>(mut obj: K) -> K {
    obj.meta_mut().finalizers = Some(vec![K::FINALIZER.to_string()]);
    obj
}

pub fn edge_rule_status(guid: &str, zone_id: i64) -> EdgeRuleStatus {
    EdgeRuleStatus::succeeded(guid.to_string(), zone_id, Some(1))
}
