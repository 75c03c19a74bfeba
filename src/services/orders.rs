//! Order status tracker and order details.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AppError, Result};
use crate::interfaces::{OrderDetailsRecord, OrderStore};

/// Fulfilment stage of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    OutForDelivery,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            OrderStatus::Delivered => "DELIVERED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = OrderStatus::ALL.iter().map(OrderStatus::as_str).collect();
                AppError::validation(format!(
                    "Invalid status '{s}'. Valid values: {}",
                    valid.join(", ")
                ))
            })
    }
}

/// Decide whether an order may move from `from` to `to`.
///
/// Every move is accepted, skips and repeats included.
pub fn check_transition(_from: OrderStatus, _to: OrderStatus) -> Result<()> {
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderItemView {
    pub name: String,
    pub quantity: i64,
    pub price: i64,
    pub subtotal: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    pub order_id: i64,
    pub status: String,
    pub restaurant_name: String,
    pub total_amount: i64,
    pub payment_method: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub delivery_address: String,
    pub delivery_instructions: String,
    pub created_at: String,
    pub items: Vec<OrderItemView>,
}

fn or_fallback(value: Option<String>, fallback: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

impl TryFrom<OrderDetailsRecord> for OrderDetails {
    type Error = AppError;

    /// Fails only when a stored line's subtotal does not fit in an `i64`.
    fn try_from(record: OrderDetailsRecord) -> Result<Self> {
        let order_id = record.order_id;
        let items = record
            .items
            .into_iter()
            .map(|item| {
                let subtotal = item.price.checked_mul(item.quantity).ok_or_else(|| {
                    AppError::Internal(format!("order {order_id} has a line subtotal overflow"))
                })?;
                Ok(OrderItemView {
                    subtotal,
                    name: item.name,
                    quantity: item.quantity,
                    price: item.price,
                })
            })
            .collect::<Result<Vec<OrderItemView>>>()?;

        let customer_name = format!(
            "{} {}",
            record.first_name.unwrap_or_default(),
            record.last_name.unwrap_or_default()
        )
        .trim()
        .to_string();

        Ok(Self {
            order_id,
            status: record.status,
            restaurant_name: or_fallback(record.restaurant_name, "Unknown Restaurant"),
            total_amount: record.total_amount,
            payment_method: or_fallback(record.payment_method, "Unknown"),
            customer_name,
            customer_phone: or_fallback(record.phone_number, "Not provided"),
            delivery_address: or_fallback(record.delivery_address, "Not provided"),
            delivery_instructions: or_fallback(record.delivery_instructions, "None"),
            created_at: record.created_at,
            items,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusUpdate {
    pub order_id: i64,
    pub status: OrderStatus,
    pub updated_at: String,
}

pub struct OrderService {
    orders: Arc<dyn OrderStore>,
}

impl OrderService {
    pub fn new(orders: Arc<dyn OrderStore>) -> Self {
        Self { orders }
    }

    /// Details of an order owned by `user_id`; other users' orders are
    /// reported as missing.
    pub async fn get_order_details(&self, order_id: i64, user_id: i64) -> Result<OrderDetails> {
        match self.orders.details(order_id).await? {
            Some(record) if record.user_id == user_id => record.try_into(),
            _ => Err(AppError::not_found("Order not found")),
        }
    }

    /// Overwrite the status of any order. Callers are not checked for
    /// ownership.
    pub async fn update_order_status(&self, order_id: i64, status: &str) -> Result<OrderStatusUpdate> {
        let next: OrderStatus = status.parse()?;

        let current = self
            .orders
            .status(order_id)
            .await?
            .ok_or_else(|| AppError::not_found("Order not found"))?;
        let current: OrderStatus = current
            .parse()
            .map_err(|_| AppError::Internal(format!("order {order_id} has unknown status {current}")))?;
        check_transition(current, next)?;

        let updated_at = chrono::Utc::now().to_rfc3339();
        let record = self
            .orders
            .update_status(order_id, next.as_str(), &updated_at)
            .await?;

        info!(order_id, from = %current, to = %next, "order status changed");

        Ok(OrderStatusUpdate {
            order_id: record.order_id,
            status: next,
            updated_at: record.updated_at,
        })
    }
}
