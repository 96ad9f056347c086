use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::money::Money;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
pub enum PaymentStatus {
    #[default]
    #[serde(rename = "pending")]
    #[sqlx(rename = "P")]
    Pending,
    #[serde(rename = "complete")]
    #[sqlx(rename = "C")]
    Complete,
    #[serde(rename = "canceled")]
    #[sqlx(rename = "X")]
    Canceled,
}

impl PaymentStatus {
    /// Pending may settle to Complete or Canceled; both are terminal.
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Pending, PaymentStatus::Complete)
                | (PaymentStatus::Pending, PaymentStatus::Canceled)
        )
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Complete => write!(f, "complete"),
            PaymentStatus::Canceled => write!(f, "canceled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub placed_at: DateTime<Utc>,
    pub payment_status: PaymentStatus,
}

/// Order item as persisted: `price` is the unit price captured at placement.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderLine {
    pub id: i64,
    pub product_id: i64,
    pub product_title: String,
    pub quantity: i64,
    pub price: Money,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    pub id: i64,
    pub customer_id: i64,
    pub placed_at: DateTime<Utc>,
    pub payment_status: PaymentStatus,
    pub items: Vec<OrderLine>,
}

impl OrderDetail {
    pub fn new(order: Order, items: Vec<OrderLine>) -> Self {
        Self {
            id: order.id,
            customer_id: order.customer_id,
            placed_at: order.placed_at,
            payment_status: order.payment_status,
            items,
        }
    }

    pub fn total_price(&self) -> Money {
        self.items.iter().map(|item| item.price.times(item.quantity)).sum()
    }
}
