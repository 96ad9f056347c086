use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use validator::Validate;

use crate::error::AppError;
use crate::models::{Cart, CartLine};
use crate::money::Money;
use crate::AppState;

use super::products::ensure_product_exists;

#[derive(Serialize)]
pub struct SimpleProduct {
    id: i64,
    title: String,
    price: Money,
}

#[derive(Serialize)]
pub struct CartItemView {
    id: i64,
    product: SimpleProduct,
    quantity: i64,
    total_price: Money,
}

impl From<CartLine> for CartItemView {
    fn from(line: CartLine) -> Self {
        let total_price = line.total_price();
        Self {
            id: line.id,
            product: SimpleProduct {
                id: line.product_id,
                title: line.product_title,
                price: line.product_price,
            },
            quantity: line.quantity,
            total_price,
        }
    }
}

/// A cart with its items priced at the current catalog price.
#[derive(Serialize)]
pub struct CartView {
    id: String,
    items: Vec<CartItemView>,
    total_price: Money,
}

impl CartView {
    fn new(id: String, lines: Vec<CartLine>) -> Self {
        let total_price = lines.iter().map(CartLine::total_price).sum();
        Self {
            id,
            items: lines.into_iter().map(CartItemView::from).collect(),
            total_price,
        }
    }
}

/// Largest quantity a single cart line may hold.
pub const MAX_QUANTITY: i64 = 2_147_483_647;

#[derive(Deserialize, Validate)]
pub struct AddCartItem {
    product_id: i64,
    #[validate(range(min = 1, max = 2_147_483_647, message = "quantity must be 1 to 2147483647"))]
    quantity: i64,
}

#[derive(Deserialize, Validate)]
pub struct UpdateCartItem {
    #[validate(range(min = 1, max = 2_147_483_647, message = "quantity must be 1 to 2147483647"))]
    quantity: i64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/carts", post(create_cart))
        .route("/carts/{id}", get(show_cart).delete(delete_cart))
        .route("/carts/{id}/items", get(list_items).post(add_item))
        .route(
            "/carts/{id}/items/{item_id}",
            get(show_item).patch(update_item).delete(remove_item),
        )
}

const CART_LINES: &str = r#"
    SELECT ci.id, ci.cart_id, ci.product_id, ci.quantity,
           p.title AS product_title, p.price AS product_price
    FROM cart_items ci
    JOIN products p ON p.id = ci.product_id
"#;

async fn ensure_cart_exists(db: &SqlitePool, cart_id: &str) -> Result<(), AppError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM carts WHERE id = ?")
        .bind(cart_id)
        .fetch_one(db)
        .await?;
    if count == 0 {
        return Err(AppError::NotFound("cart not found"));
    }
    Ok(())
}

async fn fetch_lines(db: &SqlitePool, cart_id: &str) -> Result<Vec<CartLine>, AppError> {
    let sql = format!("{CART_LINES} WHERE ci.cart_id = ? ORDER BY ci.id");
    let lines: Vec<CartLine> = sqlx::query_as(&sql).bind(cart_id).fetch_all(db).await?;
    Ok(lines)
}

async fn fetch_line(db: &SqlitePool, cart_id: &str, item_id: i64) -> Result<CartLine, AppError> {
    let line: Option<CartLine> =
        sqlx::query_as(&format!("{CART_LINES} WHERE ci.cart_id = ? AND ci.id = ?"))
            .bind(cart_id)
            .bind(item_id)
            .fetch_optional(db)
            .await?;

    line.ok_or(AppError::NotFound("cart item not found"))
}

async fn create_cart(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let cart = Cart::new();

    sqlx::query("INSERT INTO carts (id, created_at) VALUES (?, ?)")
        .bind(&cart.id)
        .bind(cart.created_at)
        .execute(&state.db)
        .await?;

    Ok((StatusCode::CREATED, Json(CartView::new(cart.id, Vec::new()))))
}

async fn show_cart(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CartView>, AppError> {
    ensure_cart_exists(&state.db, &id).await?;
    let lines = fetch_lines(&state.db, &id).await?;
    Ok(Json(CartView::new(id, lines)))
}

async fn delete_cart(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM carts WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("cart not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_items(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<CartItemView>>, AppError> {
    ensure_cart_exists(&state.db, &id).await?;
    let lines = fetch_lines(&state.db, &id).await?;
    Ok(Json(lines.into_iter().map(CartItemView::from).collect()))
}

async fn show_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(String, i64)>,
) -> Result<Json<CartItemView>, AppError> {
    Ok(Json(fetch_line(&state.db, &id, item_id).await?.into()))
}

/// Adds `quantity` of a product, accumulating onto an existing line for the
/// same product in a single upsert.
async fn add_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<AddCartItem>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    ensure_cart_exists(&state.db, &id).await?;
    ensure_product_exists(&state.db, body.product_id).await?;

    // The conflict branch only fires while the summed quantity stays in range;
    // otherwise no row is returned and the line is left untouched.
    let upserted: Option<(i64,)> = sqlx::query_as(
        r#"
        INSERT INTO cart_items (cart_id, product_id, quantity)
        VALUES (?, ?, ?)
        ON CONFLICT (cart_id, product_id)
        DO UPDATE SET quantity = cart_items.quantity + excluded.quantity
        WHERE cart_items.quantity + excluded.quantity <= ?
        RETURNING id
        "#,
    )
    .bind(&id)
    .bind(body.product_id)
    .bind(body.quantity)
    .bind(MAX_QUANTITY)
    .fetch_optional(&state.db)
    .await?;

    let Some((item_id,)) = upserted else {
        return Err(AppError::Invalid(format!("quantity in cart cannot exceed {MAX_QUANTITY}")));
    };

    let line = fetch_line(&state.db, &id, item_id).await?;
    Ok((StatusCode::CREATED, Json(CartItemView::from(line))))
}

async fn update_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(String, i64)>,
    Json(body): Json<UpdateCartItem>,
) -> Result<Json<CartItemView>, AppError> {
    body.validate()?;

    let result = sqlx::query("UPDATE cart_items SET quantity = ? WHERE id = ? AND cart_id = ?")
        .bind(body.quantity)
        .bind(item_id)
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("cart item not found"));
    }

    Ok(Json(fetch_line(&state.db, &id, item_id).await?.into()))
}

async fn remove_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(String, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM cart_items WHERE id = ? AND cart_id = ?")
        .bind(item_id)
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("cart item not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
