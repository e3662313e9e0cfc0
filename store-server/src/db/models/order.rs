//! Order Model
//!
//! 订单状态机：Pending → Delivering → Delivered
//! 删除是管理员动作，不属于状态转换。

use super::serde_helpers;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use validator::Validate;

use super::product::ProductId;

/// Order ID type
pub type OrderId = RecordId;

/// Default checkout payment method
pub const DEFAULT_PAYMENT_METHOD: &str = "Cash on Delivery";

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Delivering,
    Delivered,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Delivering => "DELIVERING",
            OrderStatus::Delivered => "DELIVERED",
        }
    }

    /// Forward-only transition check
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Delivering)
                | (OrderStatus::Delivering, OrderStatus::Delivered)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Line item captured at order time
///
/// Name and unit price are snapshots; later product edits do not touch them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(with = "serde_helpers::record_id")]
    pub product: ProductId,
    pub name: String,
    pub price: f64,
    pub quantity: i32,
}

/// Order model matching SurrealDB schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<OrderId>,
    pub name: String,
    pub address: String,
    pub contact: String,
    pub payment_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rider_latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rider_longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Checkout line item reference: which product, how many
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub product: String,
    pub quantity: i32,
}

/// Checkout payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderCreate {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 500, message = "Address must be 1-500 characters"))]
    pub address: String,
    #[validate(length(min = 1, max = 100, message = "Contact must be 1-100 characters"))]
    pub contact: String,
    pub payment_method: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    pub items: Vec<OrderItemInput>,
    pub total_amount: f64,
}
