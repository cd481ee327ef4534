//! Bunny CDN REST Client
//!
//! Native REST implementation of [`CdnProvider`] for the Bunny CDN API.
//! Uses reqwest with rustls; authentication is the `AccessKey` header.
//!
//! Listings are fetched as a single page of [`PROVIDER_PAGE_SIZE`] items. A
//! full page is reported as [`ProviderError::TooManyItems`] since pagination
//! is not implemented.
//!
//! References:
//! - [Bunny CDN API](https://docs.bunny.net/reference/bunnynet-api-overview)

pub mod requests;
pub mod responses;

use crate::config::ProviderCredentials;
use crate::constants::PROVIDER_PAGE_SIZE;
use crate::observability::metrics;
use crate::provider::{CdnProvider, ProviderError};
use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info_span, Instrument};

use requests::{
    CreatePullZoneRequest, CreateStorageZoneRequest, EdgeRuleRequest, UpdatePullZoneRequest,
    UpdateStorageZoneRequest,
};
use responses::{
    EdgeRuleResource, ErrorPayload, ListResponse, PullZoneResource, StorageZoneResource,
};

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Bunny CDN REST client
pub struct BunnyClient {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for BunnyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BunnyClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .finish_non_exhaustive()
    }
}

impl BunnyClient {
    /// Create a client from explicit credentials
    pub fn new(credentials: &ProviderCredentials) -> Result<Self, ProviderError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: credentials.api_url.trim_end_matches('/').to_string(),
            api_key: credentials.api_key.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http_client
            .request(method, format!("{}{}", self.base_url, path))
            .header("AccessKey", &self.api_key)
            .header(header::ACCEPT, "application/json")
    }

    /// Send a request and decode the JSON body
    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, ProviderError> {
        let span = info_span!("bunny.api", operation = operation);
        async move {
            let response = self.execute(operation, request).await?;
            response.json::<T>().await.map_err(|e| {
                metrics::increment_provider_operation_errors(operation);
                ProviderError::Decode(e.to_string())
            })
        }
        .instrument(span)
        .await
    }

    /// Send a request whose response body is irrelevant
    async fn send_empty(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<(), ProviderError> {
        let span = info_span!("bunny.api", operation = operation);
        self.execute(operation, request).instrument(span).await?;
        Ok(())
    }

    async fn execute(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<reqwest::Response, ProviderError> {
        metrics::increment_provider_operations(operation);

        let response = request.send().await.map_err(|e| {
            metrics::increment_provider_operation_errors(operation);
            ProviderError::Transport(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            debug!("Bunny CDN {} succeeded ({})", operation, status.as_u16());
            return Ok(response);
        }

        metrics::increment_provider_operation_errors(operation);
        let error_text = response.text().await.unwrap_or_default();
        Err(error_from_response(status.as_u16(), &error_text))
    }

    /// Fetch a single page and reject truncated listings
    async fn list<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        what: &'static str,
    ) -> Result<Vec<T>, ProviderError> {
        let per_page = PROVIDER_PAGE_SIZE.to_string();
        let request = self
            .request(Method::GET, path)
            .query(&[("page", "1"), ("perPage", per_page.as_str())]);
        let listing: ListResponse<T> = self.send(operation, request).await?;
        page_items(listing, what)
    }
}

/// Items of a single listing page. A full page means the listing was truncated.
fn page_items<T>(listing: ListResponse<T>, what: &'static str) -> Result<Vec<T>, ProviderError> {
    let items = listing.items.ok_or(ProviderError::MissingItems(what))?;
    if items.len() >= PROVIDER_PAGE_SIZE {
        return Err(ProviderError::TooManyItems(what));
    }
    Ok(items)
}

/// Map an error response to the structured error payload when it has one
fn error_from_response(status: u16, body: &str) -> ProviderError {
    match serde_json::from_str::<ErrorPayload>(body) {
        Ok(payload) => ProviderError::Api {
            status,
            error_key: payload.error_key,
            field: payload.field,
            message: payload.message,
        },
        Err(_) => ProviderError::Status { status },
    }
}

/// Deletes that hit a missing resource are already done
fn ignore_not_found(result: Result<(), ProviderError>, what: &str) -> Result<(), ProviderError> {
    match result {
        Err(e) if e.is_not_found() => {
            debug!("{} already absent from Bunny CDN", what);
            Ok(())
        }
        other => other,
    }
}

#[async_trait]
impl CdnProvider for BunnyClient {
    async fn list_pull_zones(&self) -> Result<Vec<PullZoneResource>, ProviderError> {
        self.list("pullzone.list", "/pullzone", "pull zones").await
    }

    async fn create_pull_zone(
        &self,
        request: &CreatePullZoneRequest,
    ) -> Result<PullZoneResource, ProviderError> {
        let builder = self.request(Method::POST, "/pullzone").json(request);
        self.send("pullzone.create", builder).await
    }

    async fn update_pull_zone(
        &self,
        id: i64,
        request: &UpdatePullZoneRequest,
    ) -> Result<PullZoneResource, ProviderError> {
        let builder = self
            .request(Method::POST, &format!("/pullzone/{id}"))
            .json(request);
        self.send("pullzone.update", builder).await
    }

    async fn delete_pull_zone(&self, id: i64) -> Result<(), ProviderError> {
        let builder = self.request(Method::DELETE, &format!("/pullzone/{id}"));
        ignore_not_found(
            self.send_empty("pullzone.delete", builder).await,
            &format!("pull zone {id}"),
        )
    }

    async fn list_storage_zones(&self) -> Result<Vec<StorageZoneResource>, ProviderError> {
        self.list("storagezone.list", "/storagezone", "storage zones")
            .await
    }

    async fn create_storage_zone(
        &self,
        request: &CreateStorageZoneRequest,
    ) -> Result<StorageZoneResource, ProviderError> {
        let builder = self.request(Method::POST, "/storagezone").json(request);
        self.send("storagezone.create", builder).await
    }

    async fn update_storage_zone(
        &self,
        id: i64,
        request: &UpdateStorageZoneRequest,
    ) -> Result<(), ProviderError> {
        let builder = self
            .request(Method::POST, &format!("/storagezone/{id}"))
            .json(request);
        self.send_empty("storagezone.update", builder).await
    }

    async fn delete_storage_zone(&self, id: i64) -> Result<(), ProviderError> {
        let builder = self.request(Method::DELETE, &format!("/storagezone/{id}"));
        ignore_not_found(
            self.send_empty("storagezone.delete", builder).await,
            &format!("storage zone {id}"),
        )
    }

    async fn upsert_edge_rule(
        &self,
        zone_id: i64,
        rule: &EdgeRuleRequest,
    ) -> Result<EdgeRuleResource, ProviderError> {
        let builder = self
            .request(
                Method::POST,
                &format!("/pullzone/{zone_id}/edgerules/addOrUpdate"),
            )
            .json(rule);
        self.send("edgerule.upsert", builder).await
    }

    async fn delete_edge_rule(&self, zone_id: i64, guid: &str) -> Result<(), ProviderError> {
        let builder = self.request(
            Method::DELETE,
            &format!("/pullzone/{zone_id}/edgerules/{guid}"),
        );
        ignore_not_found(
            self.send_empty("edgerule.delete", builder).await,
            &format!("edge rule {guid}"),
        )
    }
}
