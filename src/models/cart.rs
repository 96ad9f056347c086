use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::money::Money;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Cart {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

impl Cart {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
        }
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

/// Cart item joined with the live title and price of its product.
#[derive(Debug, Clone, FromRow)]
pub struct CartLine {
    pub id: i64,
    pub cart_id: String,
    pub product_id: i64,
    pub quantity: i64,
    pub product_title: String,
    pub product_price: Money,
}

impl CartLine {
    pub fn total_price(&self) -> Money {
        self.product_price.times(self.quantity)
    }
}
