use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::money::Money;

/// Stock level under which a product is reported as running low.
pub const LOW_INVENTORY_THRESHOLD: i64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub price: Money,
    pub inventory: i64,
    pub last_updated: DateTime<Utc>,
    pub collection_id: i64,
}

impl Product {
    pub fn inventory_status(&self) -> InventoryStatus {
        if self.inventory < LOW_INVENTORY_THRESHOLD {
            InventoryStatus::Low
        } else {
            InventoryStatus::Ok
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InventoryStatus {
    Low,
    Ok,
}

/// Product joined with the title of its collection.
#[derive(Debug, Clone, FromRow)]
pub struct ProductWithCollection {
    #[sqlx(flatten)]
    pub product: Product,
    pub collection_title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProductImage {
    pub id: i64,
    pub product_id: i64,
    pub image: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn product(inventory: i64) -> Product {
        Product {
            id: 1,
            title: "Mug".to_string(),
            description: None,
            price: Money::new(Decimal::new(1000, 2)),
            inventory,
            last_updated: Utc::now(),
            collection_id: 1,
        }
    }

    #[test]
    fn inventory_status_threshold() {
        assert_eq!(product(9).inventory_status(), InventoryStatus::Low);
        assert_eq!(product(10).inventory_status(), InventoryStatus::Ok);
    }
}
