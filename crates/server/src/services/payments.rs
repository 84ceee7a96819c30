//! Payment confirmation simulator.
//!
//! Stands in for the real M-Pesa/card gateway round trip: `initiate`
//! synchronously mints a correlation id and schedules an asynchronous
//! completion that feeds [`OrderService::record_payment_result`]. A
//! production deployment replaces this with real gateway calls plus
//! signature-verified webhook handling; the webhook callback endpoint
//! already speaks the gateway's callback shape.

use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::AppError;
use crate::services::orders::OrderService;
use crate::store::OrderStore;

/// How the simulator settles payments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimulatedOutcome {
    /// Every payment completes.
    AlwaysSucceed,
    /// Every payment fails.
    AlwaysFail,
    /// Payments complete with the given probability.
    SuccessRate(f64),
}

impl SimulatedOutcome {
    /// Decide one payment's fate.
    #[must_use]
    pub fn decide(self) -> bool {
        match self {
            Self::AlwaysSucceed => true,
            Self::AlwaysFail => false,
            Self::SuccessRate(rate) => rand::rng().random_bool(rate.clamp(0.0, 1.0)),
        }
    }
}

/// Simulator configuration.
#[derive(Debug, Clone, Copy)]
pub struct PaymentSimConfig {
    /// Delay before the simulated callback fires.
    pub delay: Duration,
    /// Outcome policy.
    pub outcome: SimulatedOutcome,
}

impl Default for PaymentSimConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(3),
            outcome: SimulatedOutcome::AlwaysSucceed,
        }
    }
}

/// Response to an STK push initiation, mirroring the gateway's shape.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StkPushResponse {
    pub success: bool,
    pub message: String,
    pub checkout_request_id: String,
    pub merchant_request_id: String,
    pub response_code: String,
    pub response_description: String,
    pub customer_message: String,
}

/// Gateway callback body (`Body.stkCallback` envelope).
#[derive(Debug, Deserialize)]
pub struct CallbackEnvelope {
    #[serde(rename = "Body")]
    pub body: CallbackBody,
}

#[derive(Debug, Deserialize)]
pub struct CallbackBody {
    #[serde(rename = "stkCallback")]
    pub stk_callback: StkCallback,
}

#[derive(Debug, Deserialize)]
pub struct StkCallback {
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    #[serde(rename = "ResultCode")]
    pub result_code: i64,
    #[serde(rename = "ResultDesc", default)]
    pub result_desc: String,
    #[serde(rename = "CallbackMetadata", default)]
    pub callback_metadata: Option<CallbackMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackMetadata {
    #[serde(rename = "Item", default)]
    pub items: Vec<CallbackItem>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackItem {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value", default)]
    pub value: Option<serde_json::Value>,
}

impl StkCallback {
    /// Whether the gateway reports success (result code 0).
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.result_code == 0
    }

    /// Pull the receipt number out of the callback metadata, if present.
    #[must_use]
    pub fn receipt_number(&self) -> Option<String> {
        let metadata = self.callback_metadata.as_ref()?;
        metadata
            .items
            .iter()
            .find(|item| item.name == "MpesaReceiptNumber")
            .and_then(|item| item.value.as_ref())
            .and_then(|value| value.as_str().map(ToOwned::to_owned))
    }
}

/// The mocked payment gateway.
pub struct PaymentSimulator<S> {
    orders: OrderService<S>,
    config: PaymentSimConfig,
}

impl<S: Clone> Clone for PaymentSimulator<S> {
    fn clone(&self) -> Self {
        Self {
            orders: self.orders.clone(),
            config: self.config,
        }
    }
}

impl<S: OrderStore + Clone + Send + Sync + 'static> PaymentSimulator<S> {
    /// Create a new simulator.
    pub const fn new(orders: OrderService<S>, config: PaymentSimConfig) -> Self {
        Self { orders, config }
    }

    /// Initiate a simulated STK push for an order.
    ///
    /// Returns synchronously with a fresh correlation id after stamping it
    /// onto the order, then schedules the asynchronous settlement. No lock
    /// is held during the wait; the delayed task re-enters through the
    /// idempotent payment path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for an unusable phone number and
    /// `AppError::NotFound` for an unknown order number.
    pub async fn initiate(
        &self,
        order_number: &str,
        phone_number: &str,
    ) -> Result<StkPushResponse, AppError> {
        let phone = normalize_phone(phone_number)
            .ok_or_else(|| AppError::Validation("Invalid phone number".to_owned()))?;

        let order = self
            .orders
            .get_by_number(order_number)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))?;

        let correlation_id = generate_correlation_id();
        let merchant_request_id = generate_merchant_request_id();

        self.orders
            .begin_payment(order_number, &correlation_id, "mpesa")
            .await
            .map_err(AppError::from)?;

        info!(
            order_number = %order_number,
            phone = %phone,
            amount = %order.total,
            checkout_request_id = %correlation_id,
            "simulated STK push initiated"
        );

        self.schedule_settlement(correlation_id.clone());

        Ok(StkPushResponse {
            success: true,
            message: "STK push sent successfully".to_owned(),
            checkout_request_id: correlation_id,
            merchant_request_id,
            response_code: "0".to_owned(),
            response_description: "Success. Request accepted for processing".to_owned(),
            customer_message: "Success. Request accepted for processing".to_owned(),
        })
    }

    /// Spawn the delayed settlement task (the "user entering their PIN").
    fn schedule_settlement(&self, correlation_id: String) {
        let orders = self.orders.clone();
        let delay = self.config.delay;
        let outcome = self.config.outcome;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let succeeded = outcome.decide();
            let receipt = succeeded.then(generate_receipt_number);

            match orders
                .record_payment_result(&correlation_id, succeeded, receipt)
                .await
            {
                Ok(_) => info!(
                    checkout_request_id = %correlation_id,
                    succeeded,
                    "simulated payment callback delivered"
                ),
                Err(e) => error!(
                    checkout_request_id = %correlation_id,
                    error = %e,
                    "simulated payment callback failed"
                ),
            }
        });
    }
}

/// Normalize a Kenyan phone number to the `254XXXXXXXXX` wire format.
///
/// Accepts `07XX...`, `+254...`, `254...`, and bare subscriber numbers;
/// returns `None` when the input isn't a plausible phone number.
#[must_use]
pub fn normalize_phone(input: &str) -> Option<String> {
    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();

    let cleaned = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let normalized = if let Some(rest) = cleaned.strip_prefix('0') {
        format!("254{rest}")
    } else if cleaned.starts_with("254") {
        cleaned.to_owned()
    } else {
        format!("254{cleaned}")
    };

    (normalized.len() == 12).then_some(normalized)
}

/// Mint a gateway-style checkout request id.
fn generate_correlation_id() -> String {
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!("ws_CO_{}{}", Utc::now().format("%Y%m%d%H%M%S"), suffix)
}

/// Mint a gateway-style merchant request id.
fn generate_merchant_request_id() -> String {
    let prefix: u32 = rand::rng().random_range(10_000..100_000);
    format!("{}-{}-1", prefix, Utc::now().timestamp_millis())
}

/// Mint a receipt number in the gateway's format.
fn generate_receipt_number() -> String {
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(7)
        .map(char::from)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    format!("OGH{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal::Decimal;

    use ecoshop_core::{Email, OrderStatus, PaymentStatus, ProductId, UserId, UserRole};

    use crate::models::order::{Order, OrderItem};
    use crate::models::product::Product;
    use crate::models::user::User;
    use crate::services::notify::OrderNotifier;
    use crate::services::orders::{CreateOrder, OrderLine};
    use crate::store::memory::MemoryOrderStore;

    struct NullNotifier;

    #[async_trait]
    impl OrderNotifier for NullNotifier {
        async fn order_created(&self, _order: &Order, _items: &[OrderItem]) {}
        async fn order_status_changed(&self, _order: &Order) {}
        async fn payment_settled(&self, _order: &Order) {}
    }

    fn setup() -> (MemoryOrderStore, OrderService<MemoryOrderStore>) {
        let store = MemoryOrderStore::new();
        let now = Utc::now();
        store.insert_product(Product {
            id: ProductId::new(1),
            name: "Bamboo Toothbrush".to_owned(),
            description: "desc".to_owned(),
            price: Decimal::from(25),
            category: "eco".to_owned(),
            stock: 10,
            image: None,
            created_at: now,
            updated_at: now,
        });
        let orders = OrderService::new(store.clone(), Arc::new(NullNotifier));
        (store, orders)
    }

    async fn place_order(orders: &OrderService<MemoryOrderStore>) -> Order {
        let now = Utc::now();
        let customer = User {
            id: UserId::new(1),
            name: "Jane".to_owned(),
            email: Email::parse("jane@example.com").expect("valid"),
            role: UserRole::User,
            created_at: now,
            updated_at: now,
        };
        orders
            .create_order(
                &customer,
                CreateOrder {
                    items: vec![OrderLine {
                        product_id: ProductId::new(1),
                        quantity: 1,
                    }],
                    shipping_address: "12 Moss Lane".to_owned(),
                    payment_method: "mpesa".to_owned(),
                    coupon_code: None,
                },
            )
            .await
            .expect("order created")
            .order
    }

    #[test]
    fn test_normalize_phone_variants() {
        assert_eq!(
            normalize_phone("0712 345 678").as_deref(),
            Some("254712345678")
        );
        assert_eq!(
            normalize_phone("+254712345678").as_deref(),
            Some("254712345678")
        );
        assert_eq!(
            normalize_phone("712345678").as_deref(),
            Some("254712345678")
        );
        assert_eq!(
            normalize_phone("254712345678").as_deref(),
            Some("254712345678")
        );
        assert!(normalize_phone("not-a-phone").is_none());
        assert!(normalize_phone("").is_none());
        assert!(normalize_phone("07123").is_none());
    }

    #[test]
    fn test_outcome_policies() {
        assert!(SimulatedOutcome::AlwaysSucceed.decide());
        assert!(!SimulatedOutcome::AlwaysFail.decide());
        assert!(SimulatedOutcome::SuccessRate(1.0).decide());
        assert!(!SimulatedOutcome::SuccessRate(0.0).decide());
    }

    #[test]
    fn test_id_formats() {
        let correlation = generate_correlation_id();
        assert!(correlation.starts_with("ws_CO_"));
        assert_eq!(correlation.len(), "ws_CO_".len() + 14 + 8);

        let receipt = generate_receipt_number();
        assert!(receipt.starts_with("OGH"));
        assert_eq!(receipt.len(), 10);
        assert!(receipt.chars().all(|c| !c.is_ascii_lowercase()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_initiate_settles_after_delay() {
        let (store, orders) = setup();
        let order = place_order(&orders).await;

        let simulator = PaymentSimulator::new(
            orders,
            PaymentSimConfig {
                delay: Duration::from_secs(3),
                outcome: SimulatedOutcome::AlwaysSucceed,
            },
        );

        let response = simulator
            .initiate(order.order_number.as_str(), "0712345678")
            .await
            .expect("initiated");
        assert!(response.success);
        assert_eq!(response.response_code, "0");

        // Correlation id is stamped synchronously.
        let pending = store.order(order.id).expect("order");
        assert_eq!(
            pending.checkout_request_id.as_deref(),
            Some(response.checkout_request_id.as_str())
        );
        assert_eq!(pending.payment_status, PaymentStatus::Pending);

        // After the simulated delay the payment settles.
        tokio::time::sleep(Duration::from_secs(4)).await;
        let settled = store.order(order.id).expect("order");
        assert_eq!(settled.payment_status, PaymentStatus::Completed);
        assert_eq!(settled.status, OrderStatus::Confirmed);
        assert!(
            settled
                .receipt_number
                .as_deref()
                .is_some_and(|r| r.starts_with("OGH"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_initiate_failure_policy_cancels_order() {
        let (store, orders) = setup();
        let order = place_order(&orders).await;

        let simulator = PaymentSimulator::new(
            orders,
            PaymentSimConfig {
                delay: Duration::from_millis(500),
                outcome: SimulatedOutcome::AlwaysFail,
            },
        );

        simulator
            .initiate(order.order_number.as_str(), "0712345678")
            .await
            .expect("initiated");

        tokio::time::sleep(Duration::from_secs(1)).await;
        let settled = store.order(order.id).expect("order");
        assert_eq!(settled.payment_status, PaymentStatus::Failed);
        assert_eq!(settled.status, OrderStatus::Cancelled);
        assert!(settled.receipt_number.is_none());
    }

    #[tokio::test]
    async fn test_initiate_unknown_order() {
        let (_store, orders) = setup();
        let simulator = PaymentSimulator::new(orders, PaymentSimConfig::default());

        let err = simulator
            .initiate("ORD-MISSING", "0712345678")
            .await
            .expect_err("must fail");
        assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_callback_parsing() {
        let json = serde_json::json!({
            "Body": {
                "stkCallback": {
                    "MerchantRequestID": "29115-34620561-1",
                    "CheckoutRequestID": "ws_CO_20260807103000AbCd1234",
                    "ResultCode": 0,
                    "ResultDesc": "The service request is processed successfully.",
                    "CallbackMetadata": {
                        "Item": [
                            { "Name": "Amount", "Value": 50.0 },
                            { "Name": "MpesaReceiptNumber", "Value": "OGH7Q2XKLM" },
                            { "Name": "PhoneNumber", "Value": 254712345678_i64 }
                        ]
                    }
                }
            }
        });

        let envelope: CallbackEnvelope = serde_json::from_value(json).expect("parse");
        let callback = envelope.body.stk_callback;
        assert!(callback.succeeded());
        assert_eq!(callback.receipt_number().as_deref(), Some("OGH7Q2XKLM"));
    }

    #[test]
    fn test_callback_failure_has_no_receipt() {
        let json = serde_json::json!({
            "Body": {
                "stkCallback": {
                    "CheckoutRequestID": "ws_CO_x",
                    "ResultCode": 1032,
                    "ResultDesc": "Request cancelled by user"
                }
            }
        });

        let envelope: CallbackEnvelope = serde_json::from_value(json).expect("parse");
        let callback = envelope.body.stk_callback;
        assert!(!callback.succeeded());
        assert!(callback.receipt_number().is_none());
    }
}
