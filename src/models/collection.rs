use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Collection {
    pub id: i64,
    pub title: String,
    pub featured_product_id: Option<i64>,
}

/// Collection annotated with the number of products it owns.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CollectionWithCount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub collection: Collection,
    pub products_count: i64,
}
