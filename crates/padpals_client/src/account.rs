//! Sign-in and the signed-in user's order history and subscriptions.

use chrono::NaiveDate;
use schemars::JsonSchema;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};

use crate::cart::{OrderStatus, OrderType};
use crate::catalog::deserialize_price;
use crate::navigation::NavigationError;
use crate::session::{SessionContext, UserSession};
use crate::{PadPalsError, StorefrontClient, deserialize_opt_api_date};

/// Credentials for `POST /auth/login` or `POST /auth/signup`.
#[derive(Debug)]
pub enum AuthRequest {
    /// `identifier` is an email address or user name.
    Login {
        identifier: String,
        password: SecretString,
    },
    Signup {
        name: String,
        email: String,
        password: SecretString,
    },
}

impl AuthRequest {
    pub fn login(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        AuthRequest::Login {
            identifier: identifier.into(),
            password: SecretString::from(password.into()),
        }
    }

    pub fn signup(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        AuthRequest::Signup {
            name: name.into(),
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }

    fn validate(&self) -> Result<(), PadPalsError> {
        let (who, password) = match self {
            AuthRequest::Login {
                identifier,
                password,
            } => (identifier, password),
            AuthRequest::Signup {
                email, password, ..
            } => (email, password),
        };
        if who.trim().is_empty() || password.expose_secret().is_empty() {
            return Err(PadPalsError::InvalidInput(
                "identifier and password are required".into(),
            ));
        }
        Ok(())
    }
}

/// Authenticate against the storefront and return the user it reports.
///
/// Roles always come from the auth service, never from the caller.
pub async fn sign_in(
    client: &dyn StorefrontClient,
    request: &AuthRequest,
) -> Result<UserSession, PadPalsError> {
    request.validate()?;
    let user = client.authenticate(request).await?;
    if user.id.trim().is_empty() {
        return Err(PadPalsError::Auth("auth service returned no user id".into()));
    }
    tracing::info!(user_id = %user.id, admin = user.is_admin, "authenticated");
    Ok(user)
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    #[serde(deserialize_with = "deserialize_string_id")]
    #[schemars(with = "String")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_opt_api_date")]
    #[schemars(with = "Option<String>")]
    pub date: Option<NaiveDate>,
    #[serde(deserialize_with = "deserialize_price")]
    #[schemars(with = "f64")]
    pub total: f64,
    pub status: OrderStatus,
    #[serde(rename = "type")]
    pub order_type: OrderType,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, JsonSchema)]
pub enum SubscriptionStatus {
    Active,
    Paused,
    Cancelled,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, JsonSchema)]
pub enum DeliveryFrequency {
    Monthly,
    #[serde(rename = "Every 2 Months")]
    EveryTwoMonths,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(deserialize_with = "deserialize_string_id")]
    #[schemars(with = "String")]
    pub id: String,
    pub product_id: String,
    pub variant_id: String,
    pub product_name: String,
    pub selected_size: String,
    #[serde(deserialize_with = "deserialize_price")]
    #[schemars(with = "f64")]
    pub price: f64,
    pub status: SubscriptionStatus,
    pub frequency: DeliveryFrequency,
    #[serde(default, deserialize_with = "deserialize_opt_api_date")]
    #[schemars(with = "Option<String>")]
    pub next_delivery: Option<NaiveDate>,
}

/// Orders and subscriptions shown on the profile page.
#[derive(Clone, Debug, Serialize, PartialEq, JsonSchema)]
pub struct AccountOverview {
    pub orders: Vec<OrderSummary>,
    pub subscriptions: Vec<Subscription>,
}

pub async fn overview(
    client: &dyn StorefrontClient,
    session: &SessionContext,
) -> Result<AccountOverview, PadPalsError> {
    let user_id = session.user_id().ok_or(NavigationError::SignInRequired)?;
    let (orders, subscriptions) = tokio::try_join!(
        client.list_orders(user_id),
        client.list_subscriptions(user_id)
    )?;
    Ok(AccountOverview {
        orders,
        subscriptions,
    })
}

pub(crate) fn deserialize_string_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!("expected string or number id, got {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn order_summary_from_wire() {
        let o: OrderSummary = serde_json::from_value(json!({
            "id": 7, "date": "2025-03-04T09:15:00.000Z", "total": "84.15",
            "status": "Shipped", "type": "Pick-up"
        }))
        .unwrap();
        assert_eq!(o.id, "7");
        assert_eq!(o.date, NaiveDate::from_ymd_opt(2025, 3, 4));
        assert_eq!(o.total, 84.15);
        assert_eq!(o.order_type, OrderType::PickUp);
    }

    #[test]
    fn subscription_frequency_wire_names() {
        let s: Subscription = serde_json::from_value(json!({
            "id": "s1", "productId": "p1", "variantId": "v1-1",
            "productName": "Day Pads", "selectedSize": "Regular", "price": 38.25,
            "status": "Active", "frequency": "Every 2 Months", "nextDelivery": "2025-04-01"
        }))
        .unwrap();
        assert_eq!(s.frequency, DeliveryFrequency::EveryTwoMonths);
        assert_eq!(s.next_delivery, NaiveDate::from_ymd_opt(2025, 4, 1));
    }

    #[test]
    fn blank_credentials_are_rejected() {
        let req = AuthRequest::Login {
            identifier: " ".into(),
            password: SecretString::new("pw".into()),
        };
        assert!(matches!(req.validate(), Err(PadPalsError::InvalidInput(_))));
    }
}
