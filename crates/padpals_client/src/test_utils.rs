//! In-memory `StorefrontClient` shared by the unit tests of this crate.
#![cfg(test)]

use async_trait::async_trait;
use std::sync::Mutex;

use crate::account::{AuthRequest, OrderSummary, Subscription};
use crate::admin::{AdminRequest, AdminRequestStatus};
use crate::cart::OrderRequest;
use crate::session::UserSession;
use crate::{CycleEntry, PadPalsError, Product, StorefrontClient};

/// Records every write so tests can inspect what reached the "server".
#[derive(Default)]
pub struct FakeStorefront {
    pub remote: Mutex<Vec<CycleEntry>>,
    pub fail_reads: bool,
    pub orders: Mutex<Vec<OrderRequest>>,
    pub request: Mutex<Option<AdminRequest>>,
    pub reviews: Mutex<Vec<(String, String, AdminRequestStatus)>>,
    pub updated: Mutex<Vec<Product>>,
}

#[async_trait]
impl StorefrontClient for FakeStorefront {
    async fn get_tracker_entries(&self, _user_id: &str) -> Result<Vec<CycleEntry>, PadPalsError> {
        if self.fail_reads {
            return Err(PadPalsError::from_status(500, "boom".into()));
        }
        Ok(self.remote.lock().unwrap().clone())
    }

    async fn log_tracker_entry(&self, _user_id: &str, entry: &CycleEntry) -> Result<(), PadPalsError> {
        self.remote.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn list_products(&self) -> Result<Vec<Product>, PadPalsError> {
        Ok(vec![])
    }

    async fn create_order(&self, order: &OrderRequest) -> Result<(), PadPalsError> {
        self.orders.lock().unwrap().push(order.clone());
        Ok(())
    }

    async fn authenticate(&self, _request: &AuthRequest) -> Result<UserSession, PadPalsError> {
        Err(PadPalsError::Auth("invalid credentials".into()))
    }

    async fn list_orders(&self, _user_id: &str) -> Result<Vec<OrderSummary>, PadPalsError> {
        Ok(vec![])
    }

    async fn list_subscriptions(&self, _user_id: &str) -> Result<Vec<Subscription>, PadPalsError> {
        Ok(vec![])
    }

    async fn get_admin_request(&self, _user_id: &str) -> Result<Option<AdminRequest>, PadPalsError> {
        Ok(self.request.lock().unwrap().clone())
    }

    async fn submit_admin_request(&self, _user_id: &str, reason: &str) -> Result<(), PadPalsError> {
        *self.request.lock().unwrap() = Some(AdminRequest {
            id: "r1".into(),
            user_name: "A".into(),
            user_email: "a@example.com".into(),
            reason: reason.into(),
            status: AdminRequestStatus::Pending,
            created_at: chrono::NaiveDate::from_ymd_opt(2025, 5, 1),
            reviewed_at: None,
        });
        Ok(())
    }

    async fn list_admin_requests(
        &self,
        _reviewer_id: &str,
        status: Option<AdminRequestStatus>,
    ) -> Result<Vec<AdminRequest>, PadPalsError> {
        Ok(self
            .request
            .lock()
            .unwrap()
            .iter()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect())
    }

    async fn review_admin_request(
        &self,
        reviewer_id: &str,
        request_id: &str,
        decision: AdminRequestStatus,
    ) -> Result<(), PadPalsError> {
        self.reviews
            .lock()
            .unwrap()
            .push((reviewer_id.into(), request_id.into(), decision));
        Ok(())
    }

    async fn update_product(&self, _actor_id: &str, product: &Product) -> Result<(), PadPalsError> {
        self.updated.lock().unwrap().push(product.clone());
        Ok(())
    }

    async fn create_product(&self, _actor_id: &str, _product: &Product) -> Result<String, PadPalsError> {
        Ok("p9".into())
    }
}
