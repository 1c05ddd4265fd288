//! HTTP client implementation for the storefront REST API.
//!
//! This module provides a reqwest-based implementation of the [`StorefrontClient`](crate::StorefrontClient) trait.

use crate::account::{AuthRequest, OrderSummary, Subscription, deserialize_string_id};
use crate::admin::{AdminRequest, AdminRequestStatus};
use crate::cart::OrderRequest;
use crate::catalog::{self, VariantRow};
use crate::config::Config;
use crate::observability::{Outcome, record_api_request};
use crate::retry::RetryPolicy;
use crate::session::UserSession;
use crate::{CycleEntry, Flow, PadPalsError, Product, StorefrontClient, TrackerRow};
use async_trait::async_trait;
use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client for the storefront API using reqwest.
#[derive(Clone, Debug)]
pub struct ReqwestStorefrontClient {
    base_url: String,
    api_token: Option<SecretString>,
    client: reqwest::Client,
    retry: RetryPolicy,
}

/// Wire shape of `POST /tracker`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TrackerEntryRequest<'a> {
    user_id: &'a str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    flow: Flow,
}

/// Reply of `POST /auth/login` and `POST /auth/signup`.
#[derive(Deserialize)]
struct AuthResponse {
    user: UserSession,
}

#[derive(Deserialize)]
struct CreatedResponse {
    #[serde(deserialize_with = "deserialize_string_id")]
    id: String,
}

impl ReqwestStorefrontClient {
    /// Create a new client instance.
    ///
    /// # Arguments
    /// * `base_url` - API root, e.g. "http://localhost:3000/api"
    /// * `api_token` - Optional bearer token sent with every request
    /// * `timeout` - Per-request timeout
    pub fn new(
        base_url: &str,
        api_token: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, PadPalsError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
            client,
            retry: RetryPolicy::default(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, PadPalsError> {
        Self::new(&config.base_url, config.api_token.clone(), config.timeout)
    }

    /// Replace the retry policy used for idempotent requests.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// URL for `segments` under the base, each segment percent-encoded.
    fn url_for(&self, segments: &[&str]) -> Result<String, PadPalsError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| PadPalsError::Config(format!("invalid base url {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| PadPalsError::Config(format!("base url cannot hold a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.into())
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    /// Admin endpoints identify the acting user with `x-user-id`.
    fn acting_as(request: reqwest::RequestBuilder, actor: Option<&str>) -> reqwest::RequestBuilder {
        match actor {
            Some(id) => request.header("x-user-id", id),
            None => request,
        }
    }

    /// GET with retries on transient failures.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: &str,
        query: &[(&str, &str)],
        actor: Option<&str>,
    ) -> Result<T, PadPalsError> {
        self.retry
            .retry_async_if(
                || async move {
                    let request = Self::acting_as(self.authorize(self.client.get(url)), actor)
                        .query(query);
                    let resp = self.send(endpoint, request).await?;
                    Ok(resp.json::<T>().await?)
                },
                PadPalsError::is_retryable,
            )
            .await
    }

    /// Send a JSON body once and decode the JSON reply.
    async fn send_json<B, T>(
        &self,
        endpoint: &'static str,
        request: reqwest::RequestBuilder,
        body: &B,
    ) -> Result<T, PadPalsError>
    where
        B: Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let resp = self.send(endpoint, self.authorize(request).json(body)).await?;
        Ok(resp.json::<T>().await?)
    }

    /// Send a JSON body once; the response body is ignored.
    async fn send_empty<B: Serialize + ?Sized>(
        &self,
        endpoint: &'static str,
        request: reqwest::RequestBuilder,
        body: &B,
    ) -> Result<(), PadPalsError> {
        self.send(endpoint, self.authorize(request).json(body))
            .await
            .map(|_| ())
    }

    /// Send a request, count it, and turn error statuses into errors.
    async fn send(
        &self,
        endpoint: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, PadPalsError> {
        let resp = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                record_api_request(endpoint, Outcome::Transport);
                tracing::warn!(endpoint, error = %e, "storefront request failed");
                return Err(e.into());
            }
        };
        let status = resp.status();
        record_api_request(endpoint, Outcome::from_status(status.as_u16()));
        if !status.is_success() {
            return Err(self.error_from_response(resp).await);
        }
        Ok(resp)
    }

    /// Extract error information from a failed response.
    async fn error_from_response(&self, resp: reqwest::Response) -> PadPalsError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let body_snippet: String = body.chars().take(256).collect();

        match status {
            404 => PadPalsError::NotFound(body_snippet),
            401 | 403 => PadPalsError::Auth(body_snippet),
            422 => PadPalsError::InvalidInput(body_snippet),
            _ => PadPalsError::from_status(status, body_snippet),
        }
    }
}

#[async_trait]
impl StorefrontClient for ReqwestStorefrontClient {
    async fn get_tracker_entries(&self, user_id: &str) -> Result<Vec<CycleEntry>, PadPalsError> {
        let rows: Vec<TrackerRow> = self
            .get_json("tracker.list", &self.url("tracker"), &[("userId", user_id)], None)
            .await?;
        let fetched = rows.len();
        let entries: Vec<CycleEntry> = rows
            .into_iter()
            .filter_map(|row| match CycleEntry::try_from(row) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(user_id, error = %e, "skipping tracker row");
                    None
                }
            })
            .collect();
        tracing::debug!(user_id, fetched, kept = entries.len(), "fetched tracker entries");
        Ok(entries)
    }

    async fn log_tracker_entry(
        &self,
        user_id: &str,
        entry: &CycleEntry,
    ) -> Result<(), PadPalsError> {
        let body = TrackerEntryRequest {
            user_id,
            start_date: entry.start_date,
            end_date: entry.end(),
            flow: entry.flow,
        };
        self.send_empty("tracker.create", self.client.post(self.url("tracker")), &body)
            .await
    }

    async fn list_products(&self) -> Result<Vec<Product>, PadPalsError> {
        let rows: Vec<VariantRow> = self
            .get_json("products.list", &self.url("products"), &[], None)
            .await?;
        Ok(catalog::group_variant_rows(rows))
    }

    async fn create_order(&self, order: &OrderRequest) -> Result<(), PadPalsError> {
        self.send_empty("orders.create", self.client.post(self.url("orders")), order)
            .await
    }

    async fn authenticate(&self, request: &AuthRequest) -> Result<UserSession, PadPalsError> {
        let (endpoint, path, body) = match request {
            AuthRequest::Login {
                identifier,
                password,
            } => (
                "auth.login",
                "auth/login",
                serde_json::json!({
                    "identifier": identifier,
                    "password": password.expose_secret(),
                }),
            ),
            AuthRequest::Signup {
                name,
                email,
                password,
            } => (
                "auth.signup",
                "auth/signup",
                serde_json::json!({
                    "name": name,
                    "email": email,
                    "password": password.expose_secret(),
                }),
            ),
        };
        let resp: AuthResponse = self
            .send_json(endpoint, self.client.post(self.url(path)), &body)
            .await?;
        Ok(resp.user)
    }

    async fn list_orders(&self, user_id: &str) -> Result<Vec<OrderSummary>, PadPalsError> {
        self.get_json("orders.list", &self.url("orders"), &[("userId", user_id)], None)
            .await
    }

    async fn list_subscriptions(&self, user_id: &str) -> Result<Vec<Subscription>, PadPalsError> {
        self.get_json(
            "subscriptions.list",
            &self.url("subscriptions"),
            &[("userId", user_id)],
            None,
        )
        .await
    }

    async fn get_admin_request(&self, user_id: &str) -> Result<Option<AdminRequest>, PadPalsError> {
        let url = self.url_for(&["admin-requests", "user", user_id])?;
        match self
            .get_json::<Option<AdminRequest>>("admin_requests.get", &url, &[], None)
            .await
        {
            Err(PadPalsError::NotFound(_)) => Ok(None),
            other => other,
        }
    }

    async fn submit_admin_request(&self, user_id: &str, reason: &str) -> Result<(), PadPalsError> {
        let body = serde_json::json!({ "userId": user_id, "reason": reason });
        self.send_empty(
            "admin_requests.create",
            self.client.post(self.url("admin-requests")),
            &body,
        )
        .await
    }

    async fn list_admin_requests(
        &self,
        reviewer_id: &str,
        status: Option<AdminRequestStatus>,
    ) -> Result<Vec<AdminRequest>, PadPalsError> {
        let query: Vec<(&str, &str)> = status.map(|s| ("status", s.as_str())).into_iter().collect();
        self.get_json(
            "admin_requests.list",
            &self.url("admin-requests"),
            &query,
            Some(reviewer_id),
        )
        .await
    }

    async fn review_admin_request(
        &self,
        reviewer_id: &str,
        request_id: &str,
        decision: AdminRequestStatus,
    ) -> Result<(), PadPalsError> {
        let url = self.url_for(&["admin-requests", request_id])?;
        let body = serde_json::json!({ "status": decision, "reviewerId": reviewer_id });
        let request = Self::acting_as(self.client.put(url), Some(reviewer_id));
        self.send_empty("admin_requests.review", request, &body).await
    }

    async fn update_product(&self, actor_id: &str, product: &Product) -> Result<(), PadPalsError> {
        let url = self.url_for(&["products", &product.id])?;
        let request = Self::acting_as(self.client.put(url), Some(actor_id));
        self.send_empty("products.update", request, product).await
    }

    async fn create_product(&self, actor_id: &str, product: &Product) -> Result<String, PadPalsError> {
        let request = Self::acting_as(self.client.post(self.url("products")), Some(actor_id));
        let created: CreatedResponse = self.send_json("products.create", request, product).await?;
        Ok(created.id)
    }
}
