//! Storefront core for the PadPals delivery service: cycle tracking, catalogue,
//! cart and the `StorefrontClient` trait with its reqwest-based implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub mod account;
pub mod admin;
pub mod calendar;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod http_client;
pub mod navigation;
pub mod observability;
pub mod retry;
pub mod session;
pub mod stats;
pub mod store;
mod test_utils;
pub mod utils;

pub use calendar::{CalendarDay, DayState, MonthCalendar};
pub use catalog::{Product, ProductCategory, ProductVariant};
pub use stats::CycleStatistics;

#[derive(Debug, Error)]
pub enum PadPalsError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("session storage error: {0}")]
    Session(String),
    #[error(transparent)]
    Forbidden(#[from] navigation::NavigationError),
}

impl PadPalsError {
    pub fn from_status(status: u16, body: String) -> Self {
        PadPalsError::Status { status, body }
    }

    /// Whether a failed request may succeed when sent again unchanged.
    pub fn is_retryable(&self) -> bool {
        match self {
            PadPalsError::Http(e) => e.is_timeout() || e.is_connect(),
            PadPalsError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Flow intensity of a logged cycle.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
pub enum Flow {
    Light,
    Medium,
    Heavy,
}

impl std::fmt::Display for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Flow::Light => "Light",
            Flow::Medium => "Medium",
            Flow::Heavy => "Heavy",
        };
        f.write_str(s)
    }
}

/// One logged cycle. `end_date` of `None` means a single-day span.
///
/// Deserialising goes through [`TrackerRow`], so a decoded entry never ends
/// before it starts.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", try_from = "TrackerRow")]
pub struct CycleEntry {
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub flow: Flow,
}

/// A tracker record as the API returns it, dates parsed but not checked.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerRow {
    #[serde(deserialize_with = "deserialize_api_date")]
    pub start_date: NaiveDate,
    #[serde(default, deserialize_with = "deserialize_opt_api_date")]
    pub end_date: Option<NaiveDate>,
    pub flow: Flow,
}

impl TryFrom<TrackerRow> for CycleEntry {
    type Error = PadPalsError;

    fn try_from(row: TrackerRow) -> Result<Self, Self::Error> {
        CycleEntry::checked(row.start_date, row.end_date, row.flow)
    }
}

impl CycleEntry {
    pub fn new(start_date: NaiveDate, end_date: Option<NaiveDate>, flow: Flow) -> Self {
        Self {
            start_date,
            end_date,
            flow,
        }
    }

    /// Like [`CycleEntry::new`] but rejects `end_date < start_date`.
    pub fn checked(
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        flow: Flow,
    ) -> Result<Self, PadPalsError> {
        if let Some(end) = end_date.filter(|e| *e < start_date) {
            return Err(PadPalsError::InvalidInput(format!(
                "endDate {} is before startDate {}",
                end, start_date
            )));
        }
        Ok(Self::new(start_date, end_date, flow))
    }

    /// Last day of flow, falling back to the start date.
    pub fn end(&self) -> NaiveDate {
        self.end_date.unwrap_or(self.start_date)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end()
    }
}

/// An entry as submitted by a user, before date validation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewCycleEntry {
    /// First day of flow (YYYY-MM-DD or RFC 3339)
    pub start_date: String,
    /// Last day of flow; defaults to the start date
    pub end_date: Option<String>,
    pub flow: Flow,
}

impl NewCycleEntry {
    /// Parse both dates and enforce `end >= start`.
    pub fn validate(&self) -> Result<CycleEntry, PadPalsError> {
        let start = utils::parse_api_date(&self.start_date).ok_or_else(|| {
            PadPalsError::InvalidInput(format!("invalid startDate: {}", self.start_date))
        })?;
        let end = match self.end_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(utils::parse_api_date(raw).ok_or_else(|| {
                PadPalsError::InvalidInput(format!("invalid endDate: {}", raw))
            })?),
        };
        CycleEntry::checked(start, end, self.flow)
    }
}

pub(crate) fn deserialize_api_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let raw = String::deserialize(deserializer)?;
    utils::parse_api_date(&raw).ok_or_else(|| D::Error::custom(format!("invalid date: {raw}")))
}

pub(crate) fn deserialize_opt_api_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let value: Option<String> = Option::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => utils::parse_api_date(&s)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid date: {s}"))),
    }
}

#[async_trait]
pub trait StorefrontClient: Send + Sync + 'static {
    /// Fetch every cycle entry logged by `user_id`, in server order.
    async fn get_tracker_entries(&self, user_id: &str) -> Result<Vec<CycleEntry>, PadPalsError>;

    /// Append one cycle entry for `user_id`.
    async fn log_tracker_entry(
        &self,
        user_id: &str,
        entry: &CycleEntry,
    ) -> Result<(), PadPalsError>;

    /// Fetch the catalogue, grouped into products with their variants.
    async fn list_products(&self) -> Result<Vec<Product>, PadPalsError>;

    /// Submit an order built from the cart.
    async fn create_order(&self, order: &cart::OrderRequest) -> Result<(), PadPalsError>;

    /// Sign in or sign up; the returned user carries the server-assigned roles.
    async fn authenticate(
        &self,
        request: &account::AuthRequest,
    ) -> Result<session::UserSession, PadPalsError>;

    async fn list_orders(&self, user_id: &str) -> Result<Vec<account::OrderSummary>, PadPalsError>;

    async fn list_subscriptions(
        &self,
        user_id: &str,
    ) -> Result<Vec<account::Subscription>, PadPalsError>;

    /// The user's admin access request, if they ever filed one.
    async fn get_admin_request(
        &self,
        user_id: &str,
    ) -> Result<Option<admin::AdminRequest>, PadPalsError>;

    async fn submit_admin_request(&self, user_id: &str, reason: &str) -> Result<(), PadPalsError>;

    /// Admin requests visible to `reviewer_id`, optionally filtered by status.
    async fn list_admin_requests(
        &self,
        reviewer_id: &str,
        status: Option<admin::AdminRequestStatus>,
    ) -> Result<Vec<admin::AdminRequest>, PadPalsError>;

    async fn review_admin_request(
        &self,
        reviewer_id: &str,
        request_id: &str,
        decision: admin::AdminRequestStatus,
    ) -> Result<(), PadPalsError>;

    async fn update_product(&self, actor_id: &str, product: &Product) -> Result<(), PadPalsError>;

    /// Create a product and return the id the server assigned.
    async fn create_product(&self, actor_id: &str, product: &Product) -> Result<String, PadPalsError>;
}
