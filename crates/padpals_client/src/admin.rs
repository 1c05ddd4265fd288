//! Admin access requests and catalogue maintenance.
//!
//! Signed-in users apply for admin access with a reason; super admins approve
//! or deny. Admins edit and add products.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::account::deserialize_string_id;
use crate::navigation::{NavigationError, Role};
use crate::session::SessionContext;
use crate::{PadPalsError, Product, StorefrontClient, deserialize_opt_api_date};

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, JsonSchema)]
pub enum AdminRequestStatus {
    Pending,
    Approved,
    Denied,
}

impl AdminRequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AdminRequestStatus::Pending => "Pending",
            AdminRequestStatus::Approved => "Approved",
            AdminRequestStatus::Denied => "Denied",
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminRequest {
    #[serde(deserialize_with = "deserialize_string_id")]
    #[schemars(with = "String")]
    pub id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub user_email: String,
    pub reason: String,
    pub status: AdminRequestStatus,
    #[serde(default, deserialize_with = "deserialize_opt_api_date")]
    #[schemars(with = "Option<String>")]
    pub created_at: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_opt_api_date")]
    #[schemars(with = "Option<String>")]
    pub reviewed_at: Option<NaiveDate>,
}

/// File an admin access request. Only one open request per user: a new one
/// is accepted when none exists or the last was denied.
pub async fn apply(
    client: &dyn StorefrontClient,
    session: &SessionContext,
    reason: &str,
) -> Result<AdminRequest, PadPalsError> {
    let user_id = session.user_id().ok_or(NavigationError::SignInRequired)?;
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(PadPalsError::InvalidInput(
            "a reason for the request is required".into(),
        ));
    }
    let existing = client.get_admin_request(user_id).await?;
    if let Some(existing) = existing.filter(|r| r.status != AdminRequestStatus::Denied) {
        return Err(PadPalsError::InvalidInput(format!(
            "an admin request is already {}",
            existing.status.as_str()
        )));
    }
    client.submit_admin_request(user_id, reason).await?;
    tracing::info!(user_id, "admin access requested");
    client
        .get_admin_request(user_id)
        .await?
        .ok_or_else(|| PadPalsError::NotFound("submitted admin request".into()))
}

pub async fn my_request(
    client: &dyn StorefrontClient,
    session: &SessionContext,
) -> Result<Option<AdminRequest>, PadPalsError> {
    let user_id = session.user_id().ok_or(NavigationError::SignInRequired)?;
    client.get_admin_request(user_id).await
}

pub async fn list_requests(
    client: &dyn StorefrontClient,
    session: &SessionContext,
    status: Option<AdminRequestStatus>,
) -> Result<Vec<AdminRequest>, PadPalsError> {
    let reviewer = super_admin_id(session)?;
    client.list_admin_requests(reviewer, status).await
}

/// Approve or deny a request. `Pending` is not a decision.
pub async fn review(
    client: &dyn StorefrontClient,
    session: &SessionContext,
    request_id: &str,
    decision: AdminRequestStatus,
) -> Result<(), PadPalsError> {
    let reviewer = super_admin_id(session)?;
    if decision == AdminRequestStatus::Pending {
        return Err(PadPalsError::InvalidInput(
            "decision must be Approved or Denied".into(),
        ));
    }
    client
        .review_admin_request(reviewer, request_id, decision)
        .await?;
    tracing::info!(reviewer, request_id, decision = decision.as_str(), "admin request reviewed");
    Ok(())
}

pub async fn update_product(
    client: &dyn StorefrontClient,
    session: &SessionContext,
    product: &Product,
) -> Result<(), PadPalsError> {
    let actor = admin_id(session)?;
    check_product(product)?;
    if product.id.trim().is_empty() {
        return Err(PadPalsError::InvalidInput("product id is required".into()));
    }
    client.update_product(actor, product).await
}

/// Create a product; the returned copy carries the server-assigned id.
pub async fn create_product(
    client: &dyn StorefrontClient,
    session: &SessionContext,
    product: &Product,
) -> Result<Product, PadPalsError> {
    let actor = admin_id(session)?;
    check_product(product)?;
    let id = client.create_product(actor, product).await?;
    Ok(Product {
        id,
        ..product.clone()
    })
}

fn check_product(product: &Product) -> Result<(), PadPalsError> {
    if product.name.trim().is_empty() {
        return Err(PadPalsError::InvalidInput("product name is required".into()));
    }
    if product.stock < 0 {
        return Err(PadPalsError::InvalidInput("stock cannot be negative".into()));
    }
    if let Some(v) = product
        .variants
        .iter()
        .find(|v| !v.price.is_finite() || v.price < 0.0)
    {
        return Err(PadPalsError::InvalidInput(format!(
            "variant {} has an invalid price",
            v.id
        )));
    }
    Ok(())
}

fn admin_id(session: &SessionContext) -> Result<&str, PadPalsError> {
    Role::Admin.require(session)?;
    session
        .user_id()
        .ok_or_else(|| NavigationError::SignInRequired.into())
}

fn super_admin_id(session: &SessionContext) -> Result<&str, PadPalsError> {
    Role::SuperAdmin.require(session)?;
    session
        .user_id()
        .ok_or_else(|| NavigationError::SignInRequired.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::UserSession;
    use crate::test_utils::FakeStorefront;
    use crate::{ProductCategory, ProductVariant};

    fn session(is_admin: bool, is_super_admin: bool) -> SessionContext {
        SessionContext::signed_in(UserSession {
            id: "u1".into(),
            name: "A".into(),
            email: "a@example.com".into(),
            is_admin,
            is_super_admin,
        })
    }

    fn product() -> Product {
        Product {
            id: "p1".into(),
            name: "Liners".into(),
            description: String::new(),
            category: ProductCategory::Liner,
            stock: 3,
            variants: vec![ProductVariant {
                id: "v1".into(),
                size: "Small".into(),
                price: 20.0,
                image: String::new(),
            }],
        }
    }

    #[tokio::test]
    async fn apply_requires_sign_in_and_reason() {
        let fake = FakeStorefront::default();
        let guest = apply(&fake, &SessionContext::guest(), "help out").await;
        assert!(matches!(
            guest,
            Err(PadPalsError::Forbidden(NavigationError::SignInRequired))
        ));
        let blank = apply(&fake, &session(false, false), "   ").await;
        assert!(matches!(blank, Err(PadPalsError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn apply_once_until_denied() {
        let fake = FakeStorefront::default();
        let req = apply(&fake, &session(false, false), " I run the campus drive ")
            .await
            .expect("filed");
        assert_eq!(req.reason, "I run the campus drive");
        assert_eq!(req.status, AdminRequestStatus::Pending);

        let again = apply(&fake, &session(false, false), "please").await;
        assert!(matches!(again, Err(PadPalsError::InvalidInput(ref m)) if m.contains("Pending")));

        if let Some(r) = fake.request.lock().unwrap().as_mut() {
            r.status = AdminRequestStatus::Denied;
        }
        assert!(apply(&fake, &session(false, false), "second try").await.is_ok());
    }

    #[tokio::test]
    async fn review_needs_super_admin_and_a_decision() {
        let fake = FakeStorefront::default();
        let plain_admin = review(&fake, &session(true, false), "r1", AdminRequestStatus::Approved).await;
        assert!(matches!(
            plain_admin,
            Err(PadPalsError::Forbidden(NavigationError::RoleRequired(Role::SuperAdmin)))
        ));
        let pending = review(&fake, &session(false, true), "r1", AdminRequestStatus::Pending).await;
        assert!(matches!(pending, Err(PadPalsError::InvalidInput(_))));

        review(&fake, &session(false, true), "r1", AdminRequestStatus::Approved)
            .await
            .expect("reviewed");
        assert_eq!(
            fake.reviews.lock().unwrap().as_slice(),
            &[("u1".to_string(), "r1".to_string(), AdminRequestStatus::Approved)]
        );
    }

    #[tokio::test]
    async fn product_edits_need_admin() {
        let fake = FakeStorefront::default();
        let denied = update_product(&fake, &session(false, false), &product()).await;
        assert!(matches!(denied, Err(PadPalsError::Forbidden(_))));

        update_product(&fake, &session(true, false), &product())
            .await
            .expect("updated");
        assert_eq!(fake.updated.lock().unwrap().len(), 1);

        let mut draft = product();
        draft.id.clear();
        let created = create_product(&fake, &session(true, false), &draft)
            .await
            .expect("created");
        assert_eq!(created.id, "p9");

        draft.stock = -1;
        let bad = create_product(&fake, &session(true, false), &draft).await;
        assert!(matches!(bad, Err(PadPalsError::InvalidInput(_))));
    }

    #[test]
    fn admin_request_from_wire() {
        let r: AdminRequest = serde_json::from_value(serde_json::json!({
            "id": 3, "userName": "Lee", "userEmail": "lee@example.com",
            "reason": "volunteer", "status": "Approved",
            "createdAt": "2025-05-01T10:00:00.000Z", "reviewedAt": null
        }))
        .unwrap();
        assert_eq!(r.id, "3");
        assert_eq!(r.status, AdminRequestStatus::Approved);
        assert_eq!(r.reviewed_at, None);
    }
}
