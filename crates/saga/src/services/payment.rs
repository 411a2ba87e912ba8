//! Payment gateway trait, HTTP client, and in-memory test double.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::{OrderId, TenantId};
use domain::{BuyerId, Money};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by a payment gateway implementation.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The remote payment actor could not be reached.
    #[error("Payment gateway transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Transport(err.to_string())
    }
}

/// Status of a payment as reported by the payment actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Authorized,
    Canceled,
    Failed,
}

/// Response of an authorize or cancel call.
///
/// The payment service answers in camelCase; extra fields in its body
/// (order, buyer, amount, provider) are ignored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentAuthorization {
    /// Payment record ID assigned by the payment actor.
    pub payment_id: String,
    /// Outcome of the call.
    pub status: PaymentStatus,
}

/// Trait for the external payment actor.
///
/// `cancel` is the saga's single compensating action; its failure is
/// logged by the caller, never re-thrown into the saga.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Requests authorization to hold `amount` for an order.
    async fn authorize(
        &self,
        tenant_id: &TenantId,
        order_id: OrderId,
        buyer_id: BuyerId,
        amount: Money,
    ) -> Result<PaymentAuthorization, GatewayError>;

    /// Cancels a previously granted authorization.
    async fn cancel(
        &self,
        tenant_id: &TenantId,
        order_id: OrderId,
    ) -> Result<PaymentAuthorization, GatewayError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizeRequest {
    order_id: OrderId,
    user_id: BuyerId,
    /// Decimal dollar amount; the payment service expects `10.00`,
    /// not cents.
    amount: f64,
}

impl AuthorizeRequest {
    fn new(order_id: OrderId, user_id: BuyerId, amount: Money) -> Self {
        Self {
            order_id,
            user_id,
            amount: amount.cents() as f64 / 100.0,
        }
    }
}

/// HTTP client for a remote payment service.
///
/// Posts JSON to `{base}/payment/payments/authorize` and
/// `{base}/payment/payments/cancel/{order_id}`, carrying the tenant in
/// an `X-Tenant-Id` header. The underlying client carries a request
/// timeout so a hung payment actor surfaces as a transport error.
#[derive(Debug, Clone)]
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPaymentGateway {
    /// Creates a gateway client against the given base URL.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn authorize(
        &self,
        tenant_id: &TenantId,
        order_id: OrderId,
        buyer_id: BuyerId,
        amount: Money,
    ) -> Result<PaymentAuthorization, GatewayError> {
        let response = self
            .client
            .post(format!("{}/payment/payments/authorize", self.base_url))
            .header("X-Tenant-Id", tenant_id.as_str())
            .json(&AuthorizeRequest::new(order_id, buyer_id, amount))
            .send()
            .await?;

        // A 402 from the payment service is a decline, not a transport
        // fault; it still carries a payment body.
        Ok(response.json::<PaymentAuthorization>().await?)
    }

    async fn cancel(
        &self,
        tenant_id: &TenantId,
        order_id: OrderId,
    ) -> Result<PaymentAuthorization, GatewayError> {
        let response = self
            .client
            .post(format!(
                "{}/payment/payments/cancel/{order_id}",
                self.base_url
            ))
            .header("X-Tenant-Id", tenant_id.as_str())
            .send()
            .await?;

        Ok(response.json::<PaymentAuthorization>().await?)
    }
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    authorizations: HashMap<String, (OrderId, BuyerId, Money)>,
    next_id: u32,
    authorize_calls: u32,
    cancel_calls: u32,
    fail_on_authorize: bool,
    decline_on_authorize: bool,
    fail_on_cancel: bool,
    authorize_delay: Option<Duration>,
}

/// In-memory payment gateway for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a new in-memory gateway that authorizes everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes authorize calls fail with a transport error.
    pub fn set_fail_on_authorize(&self, fail: bool) {
        self.state.write().unwrap().fail_on_authorize = fail;
    }

    /// Makes authorize calls return a Failed status.
    pub fn set_decline_on_authorize(&self, decline: bool) {
        self.state.write().unwrap().decline_on_authorize = decline;
    }

    /// Makes cancel calls fail with a transport error.
    pub fn set_fail_on_cancel(&self, fail: bool) {
        self.state.write().unwrap().fail_on_cancel = fail;
    }

    /// Delays authorize calls, for exercising the saga's timeout.
    pub fn set_authorize_delay(&self, delay: Duration) {
        self.state.write().unwrap().authorize_delay = Some(delay);
    }

    /// Returns the number of active (non-canceled) authorizations.
    pub fn authorization_count(&self) -> usize {
        self.state.read().unwrap().authorizations.len()
    }

    /// Returns how many times authorize was called.
    pub fn authorize_calls(&self) -> u32 {
        self.state.read().unwrap().authorize_calls
    }

    /// Returns how many times cancel was called.
    pub fn cancel_calls(&self) -> u32 {
        self.state.read().unwrap().cancel_calls
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn authorize(
        &self,
        _tenant_id: &TenantId,
        order_id: OrderId,
        buyer_id: BuyerId,
        amount: Money,
    ) -> Result<PaymentAuthorization, GatewayError> {
        let delay = {
            let mut state = self.state.write().unwrap();
            state.authorize_calls += 1;
            state.authorize_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.write().unwrap();
        if state.fail_on_authorize {
            return Err(GatewayError::Transport(
                "connection refused".to_string(),
            ));
        }
        if state.decline_on_authorize {
            return Ok(PaymentAuthorization {
                payment_id: String::new(),
                status: PaymentStatus::Failed,
            });
        }

        state.next_id += 1;
        let payment_id = format!("PAY-{:04}", state.next_id);
        state
            .authorizations
            .insert(payment_id.clone(), (order_id, buyer_id, amount));

        Ok(PaymentAuthorization {
            payment_id,
            status: PaymentStatus::Authorized,
        })
    }

    async fn cancel(
        &self,
        _tenant_id: &TenantId,
        order_id: OrderId,
    ) -> Result<PaymentAuthorization, GatewayError> {
        let mut state = self.state.write().unwrap();
        state.cancel_calls += 1;

        if state.fail_on_cancel {
            return Err(GatewayError::Transport(
                "connection refused".to_string(),
            ));
        }

        let payment_id = state
            .authorizations
            .iter()
            .find(|(_, (oid, _, _))| *oid == order_id)
            .map(|(pid, _)| pid.clone())
            .unwrap_or_default();
        state.authorizations.remove(&payment_id);

        Ok(PaymentAuthorization {
            payment_id,
            status: PaymentStatus::Canceled,
        })
    }
}
