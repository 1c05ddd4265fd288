//! In-memory `StorefrontClient` used by the handler unit tests.
#![cfg(test)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use padpals_client::account::{AuthRequest, OrderSummary, Subscription};
use padpals_client::admin::{AdminRequest, AdminRequestStatus};
use padpals_client::cart::OrderRequest;
use padpals_client::session::UserSession;
use padpals_client::{
    CycleEntry, PadPalsError, Product, ProductCategory, ProductVariant, StorefrontClient,
};

use crate::LoginParams;

pub const PASSWORD: &str = "correct horse";

/// Holds writes until the test releases them.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

/// Keeps posted tracker entries, orders and admin requests so tests can inspect them.
#[derive(Default)]
pub struct MockClient {
    entries: Mutex<Vec<CycleEntry>>,
    products: Vec<Product>,
    orders: Mutex<Vec<OrderRequest>>,
    users: Vec<UserSession>,
    admin_requests: Mutex<Vec<(String, AdminRequest)>>,
    created: Mutex<Vec<Product>>,
    gate: Option<Arc<Gate>>,
    catalogue_down: bool,
}

impl MockClient {
    pub fn with_entries(entries: Vec<CycleEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
            users: sample_users(),
            ..Default::default()
        }
    }

    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            products,
            users: sample_users(),
            ..Default::default()
        }
    }

    /// Tracker and order writes wait on `gate.release`.
    pub fn gated(gate: Arc<Gate>) -> Self {
        Self {
            products: sample_products(),
            users: sample_users(),
            gate: Some(gate),
            ..Default::default()
        }
    }

    /// `GET /products` answers 503.
    pub fn catalogue_down() -> Self {
        Self {
            catalogue_down: true,
            ..Default::default()
        }
    }

    pub fn logged_count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn order_count(&self) -> usize {
        self.orders.lock().unwrap().len()
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    async fn wait_for_release(&self) {
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
    }
}

#[async_trait]
impl StorefrontClient for MockClient {
    async fn get_tracker_entries(&self, _user_id: &str) -> Result<Vec<CycleEntry>, PadPalsError> {
        Ok(self.entries.lock().unwrap().clone())
    }

    async fn log_tracker_entry(&self, _user_id: &str, entry: &CycleEntry) -> Result<(), PadPalsError> {
        self.wait_for_release().await;
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn list_products(&self) -> Result<Vec<Product>, PadPalsError> {
        if self.catalogue_down {
            return Err(PadPalsError::from_status(503, "maintenance".into()));
        }
        Ok(self.products.clone())
    }

    async fn create_order(&self, order: &OrderRequest) -> Result<(), PadPalsError> {
        self.wait_for_release().await;
        self.orders.lock().unwrap().push(order.clone());
        Ok(())
    }

    async fn authenticate(&self, request: &AuthRequest) -> Result<UserSession, PadPalsError> {
        use secrecy::ExposeSecret;
        match request {
            AuthRequest::Login {
                identifier,
                password,
            } => self
                .users
                .iter()
                .find(|u| &u.email == identifier || &u.name == identifier)
                .filter(|_| password.expose_secret() == PASSWORD)
                .cloned()
                .ok_or_else(|| PadPalsError::Auth("invalid credentials".into())),
            AuthRequest::Signup { name, email, .. } => Ok(UserSession {
                id: "new-user".into(),
                name: name.clone(),
                email: email.clone(),
                is_admin: false,
                is_super_admin: false,
            }),
        }
    }

    async fn list_orders(&self, user_id: &str) -> Result<Vec<OrderSummary>, PadPalsError> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .iter()
            .enumerate()
            .filter(|(_, o)| o.user_id == user_id)
            .map(|(i, o)| OrderSummary {
                id: (i + 1).to_string(),
                date: None,
                total: o.total,
                status: o.status,
                order_type: o.order_type,
            })
            .collect())
    }

    async fn list_subscriptions(&self, _user_id: &str) -> Result<Vec<Subscription>, PadPalsError> {
        Ok(vec![])
    }

    async fn get_admin_request(&self, user_id: &str) -> Result<Option<AdminRequest>, PadPalsError> {
        Ok(self
            .admin_requests
            .lock()
            .unwrap()
            .iter()
            .find(|(owner, _)| owner == user_id)
            .map(|(_, r)| r.clone()))
    }

    async fn submit_admin_request(&self, user_id: &str, reason: &str) -> Result<(), PadPalsError> {
        let mut requests = self.admin_requests.lock().unwrap();
        let id = format!("r{}", requests.len() + 1);
        requests.retain(|(owner, _)| owner != user_id);
        requests.push((
            user_id.to_string(),
            AdminRequest {
                id,
                user_name: user_id.to_string(),
                user_email: format!("{user_id}@example.com"),
                reason: reason.to_string(),
                status: AdminRequestStatus::Pending,
                created_at: None,
                reviewed_at: None,
            },
        ));
        Ok(())
    }

    async fn list_admin_requests(
        &self,
        _reviewer_id: &str,
        status: Option<AdminRequestStatus>,
    ) -> Result<Vec<AdminRequest>, PadPalsError> {
        Ok(self
            .admin_requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, r)| r)
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect())
    }

    async fn review_admin_request(
        &self,
        _reviewer_id: &str,
        request_id: &str,
        decision: AdminRequestStatus,
    ) -> Result<(), PadPalsError> {
        let mut requests = self.admin_requests.lock().unwrap();
        let (_, request) = requests
            .iter_mut()
            .find(|(_, r)| r.id == request_id)
            .ok_or_else(|| PadPalsError::NotFound(format!("admin request {request_id}")))?;
        request.status = decision;
        Ok(())
    }

    async fn update_product(&self, _actor_id: &str, product: &Product) -> Result<(), PadPalsError> {
        if self.products.iter().any(|p| p.id == product.id) {
            Ok(())
        } else {
            Err(PadPalsError::NotFound(format!("product {}", product.id)))
        }
    }

    async fn create_product(&self, _actor_id: &str, product: &Product) -> Result<String, PadPalsError> {
        let mut created = self.created.lock().unwrap();
        created.push(product.clone());
        Ok(format!("new-{}", created.len()))
    }
}

pub fn sample_products() -> Vec<Product> {
    vec![Product {
        id: "p1".into(),
        name: "Overnight Pads".into(),
        description: "Extra long".into(),
        category: ProductCategory::Overnight,
        stock: 12,
        variants: vec![
            ProductVariant {
                id: "v1-1".into(),
                size: "Regular".into(),
                price: 40.0,
                image: "pads-regular.png".into(),
            },
            ProductVariant {
                id: "v1-2".into(),
                size: "Long".into(),
                price: 45.0,
                image: "pads-long.png".into(),
            },
        ],
    }]
}

/// `u1` is a shopper, `boss` an admin and `root` a super admin.
pub fn sample_users() -> Vec<UserSession> {
    let user = |id: &str, is_admin: bool, is_super_admin: bool| UserSession {
        id: id.into(),
        name: id.into(),
        email: format!("{id}@example.com"),
        is_admin,
        is_super_admin,
    };
    vec![
        user("u1", false, false),
        user("u7", false, false),
        user("boss", true, false),
        user("root", false, true),
    ]
}

pub fn credentials(identifier: &str) -> LoginParams {
    LoginParams {
        identifier: identifier.into(),
        password: PASSWORD.into(),
    }
}
