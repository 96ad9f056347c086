use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use validator::{Validate, ValidationError};

use crate::auth::AdminUser;
use crate::error::AppError;
use crate::models::{InventoryStatus, ProductImage, ProductWithCollection};
use crate::money::{Money, MAX_PRICE};
use crate::AppState;

use super::{nullable, validate_title};

#[derive(Serialize)]
pub struct ProductView {
    id: i64,
    title: String,
    description: Option<String>,
    price: Money,
    price_with_tax: Money,
    inventory: i64,
    inventory_status: InventoryStatus,
    collection_id: i64,
    collection: String,
    images: Vec<ProductImage>,
}

impl ProductView {
    fn new(row: ProductWithCollection, images: Vec<ProductImage>) -> Self {
        let inventory_status = row.product.inventory_status();
        let product = row.product;
        Self {
            id: product.id,
            title: product.title,
            description: product.description,
            price: product.price,
            price_with_tax: product.price.with_tax(),
            inventory: product.inventory,
            inventory_status,
            collection_id: product.collection_id,
            collection: row.collection_title,
            images,
        }
    }
}

fn validate_price(price: &Money) -> Result<(), ValidationError> {
    let mut err = ValidationError::new("price");
    if price.amount() < rust_decimal::Decimal::ONE {
        err.message = Some("price must be at least 1.00".into());
        return Err(err);
    }
    if price.amount() > MAX_PRICE {
        err.message = Some("price must be at most 9999.99".into());
        return Err(err);
    }
    if price.fractional_digits() > 2 {
        err.message = Some("price must have at most 2 decimal places".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Deserialize, Validate)]
pub struct CreateProduct {
    #[validate(custom(function = "validate_title"))]
    title: String,
    description: Option<String>,
    #[validate(custom(function = "validate_price"))]
    price: Money,
    #[validate(range(min = 1, message = "inventory must be at least 1"))]
    inventory: i64,
    collection_id: i64,
}

#[derive(Deserialize, Validate)]
pub struct UpdateProduct {
    #[validate(custom(function = "validate_title"))]
    title: Option<String>,
    /// `null` clears the description.
    #[serde(default, deserialize_with = "nullable")]
    description: Option<Option<String>>,
    #[validate(custom(function = "validate_price"))]
    price: Option<Money>,
    #[validate(range(min = 1, message = "inventory must be at least 1"))]
    inventory: Option<i64>,
    collection_id: Option<i64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(show_product).patch(update_product).delete(delete_product),
        )
}

pub(crate) async fn ensure_product_exists(db: &SqlitePool, id: i64) -> Result<(), AppError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE id = ?")
        .bind(id)
        .fetch_one(db)
        .await?;
    if count == 0 {
        return Err(AppError::NotFound("product not found"));
    }
    Ok(())
}

async fn ensure_collection_exists(db: &SqlitePool, id: i64) -> Result<(), AppError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM collections WHERE id = ?")
        .bind(id)
        .fetch_one(db)
        .await?;
    if count == 0 {
        return Err(AppError::NotFound("collection not found"));
    }
    Ok(())
}

async fn fetch_product(db: &SqlitePool, id: i64) -> Result<ProductView, AppError> {
    let row: Option<ProductWithCollection> = sqlx::query_as(
        r#"
        SELECT p.*, c.title AS collection_title
        FROM products p
        JOIN collections c ON c.id = p.collection_id
        WHERE p.id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;

    let Some(row) = row else {
        return Err(AppError::NotFound("product not found"));
    };

    let images: Vec<ProductImage> =
        sqlx::query_as("SELECT * FROM product_images WHERE product_id = ? ORDER BY id")
            .bind(id)
            .fetch_all(db)
            .await?;

    Ok(ProductView::new(row, images))
}

async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<ProductView>>, AppError> {
    let rows: Vec<ProductWithCollection> = sqlx::query_as(
        r#"
        SELECT p.*, c.title AS collection_title
        FROM products p
        JOIN collections c ON c.id = p.collection_id
        ORDER BY p.id
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    let images: Vec<ProductImage> = sqlx::query_as("SELECT * FROM product_images ORDER BY id")
        .fetch_all(&state.db)
        .await?;

    let views = rows
        .into_iter()
        .map(|row| {
            let own = images
                .iter()
                .filter(|image| image.product_id == row.product.id)
                .cloned()
                .collect();
            ProductView::new(row, own)
        })
        .collect();

    Ok(Json(views))
}

async fn show_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProductView>, AppError> {
    Ok(Json(fetch_product(&state.db, id).await?))
}

async fn create_product(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(body): Json<CreateProduct>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    ensure_collection_exists(&state.db, body.collection_id).await?;

    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO products (title, description, price, inventory, last_updated, collection_id)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(body.title.trim())
    .bind(&body.description)
    .bind(body.price)
    .bind(body.inventory)
    .bind(Utc::now())
    .bind(body.collection_id)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(product_id = id, price = %body.price, "product created");
    Ok((StatusCode::CREATED, Json(fetch_product(&state.db, id).await?)))
}

async fn update_product(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateProduct>,
) -> Result<Json<ProductView>, AppError> {
    body.validate()?;
    ensure_product_exists(&state.db, id).await?;
    if let Some(collection_id) = body.collection_id {
        ensure_collection_exists(&state.db, collection_id).await?;
    }

    sqlx::query(
        r#"
        UPDATE products
        SET title = COALESCE(?, title),
            description = CASE WHEN ? THEN ? ELSE description END,
            price = COALESCE(?, price),
            inventory = COALESCE(?, inventory),
            collection_id = COALESCE(?, collection_id),
            last_updated = ?
        WHERE id = ?
        "#,
    )
    .bind(body.title.as_deref().map(str::trim))
    .bind(body.description.is_some())
    .bind(body.description.flatten())
    .bind(body.price)
    .bind(body.inventory)
    .bind(body.collection_id)
    .bind(Utc::now())
    .bind(id)
    .execute(&state.db)
    .await?;

    Ok(Json(fetch_product(&state.db, id).await?))
}

async fn delete_product(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    ensure_product_exists(&state.db, id).await?;

    let (ordered,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM order_items WHERE product_id = ?")
        .bind(id)
        .fetch_one(&state.db)
        .await?;
    if ordered > 0 {
        return Err(AppError::Conflict(
            "product cannot be deleted because it is associated with an order item".to_string(),
        ));
    }

    let (in_carts,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cart_items WHERE product_id = ?")
        .bind(id)
        .fetch_one(&state.db)
        .await?;
    if in_carts > 0 {
        return Err(AppError::Conflict(
            "product cannot be deleted because it is in a shopping cart".to_string(),
        ));
    }

    sqlx::query("DELETE FROM products WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;

    tracing::info!(product_id = id, "product deleted");
    Ok(StatusCode::NO_CONTENT)
}
