use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::auth::{AdminUser, AuthUser};
use crate::checkout::{fetch_order_lines, place_order};
use crate::error::AppError;
use crate::models::{Order, OrderDetail, PaymentStatus, User};
use crate::AppState;

#[derive(Deserialize)]
pub struct CreateOrder {
    cart_id: String,
}

#[derive(Deserialize)]
pub struct UpdateOrder {
    payment_status: PaymentStatus,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route(
            "/orders/{id}",
            get(show_order).patch(update_order).delete(delete_order),
        )
}

async fn load_detail(db: &SqlitePool, order: Order) -> Result<OrderDetail, AppError> {
    let lines = fetch_order_lines(db, order.id).await?;
    Ok(OrderDetail::new(order, lines))
}

/// Fetch an order the user may see: staff see every order, customers only their own.
async fn fetch_visible_order(db: &SqlitePool, user: &User, id: i64) -> Result<Order, AppError> {
    let order: Option<Order> = if user.is_staff {
        sqlx::query_as("SELECT * FROM orders WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await?
    } else {
        sqlx::query_as(
            r#"
            SELECT o.* FROM orders o
            JOIN customers c ON c.id = o.customer_id
            WHERE o.id = ? AND c.user_id = ?
            "#,
        )
        .bind(id)
        .bind(&user.id)
        .fetch_optional(db)
        .await?
    };

    order.ok_or(AppError::NotFound("order not found"))
}

async fn list_orders(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<OrderDetail>>, AppError> {
    let orders: Vec<Order> = if user.is_staff {
        sqlx::query_as("SELECT * FROM orders ORDER BY id")
            .fetch_all(&state.db)
            .await?
    } else {
        sqlx::query_as(
            r#"
            SELECT o.* FROM orders o
            JOIN customers c ON c.id = o.customer_id
            WHERE c.user_id = ?
            ORDER BY o.id
            "#,
        )
        .bind(&user.id)
        .fetch_all(&state.db)
        .await?
    };

    let mut details = Vec::with_capacity(orders.len());
    for order in orders {
        details.push(load_detail(&state.db, order).await?);
    }

    Ok(Json(details))
}

async fn show_order(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<OrderDetail>, AppError> {
    let order = fetch_visible_order(&state.db, &user, id).await?;
    Ok(Json(load_detail(&state.db, order).await?))
}

async fn create_order(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<CreateOrder>,
) -> Result<impl IntoResponse, AppError> {
    let order = place_order(&state.db, &state.hooks, &user, &body.cart_id).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Settles a pending order. Performed out-of-band by staff or a payment callback.
async fn update_order(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateOrder>,
) -> Result<Json<OrderDetail>, AppError> {
    let order = fetch_visible_order(&state.db, &admin, id).await?;

    if !order.payment_status.can_transition_to(body.payment_status) {
        return Err(AppError::Invalid(format!(
            "cannot change payment status from {} to {}",
            order.payment_status, body.payment_status
        )));
    }

    // Matches only while the status is still the one checked above.
    let updated: Option<Order> = sqlx::query_as(
        "UPDATE orders SET payment_status = ? WHERE id = ? AND payment_status = ? RETURNING *",
    )
    .bind(body.payment_status)
    .bind(id)
    .bind(order.payment_status)
    .fetch_optional(&state.db)
    .await?;

    let Some(updated) = updated else {
        return Err(AppError::Conflict("order was modified concurrently".to_string()));
    };

    tracing::info!(order_id = id, status = %updated.payment_status, "order payment status changed");
    Ok(Json(load_detail(&state.db, updated).await?))
}

async fn delete_order(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    fetch_visible_order(&state.db, &admin, id).await?;

    let mut tx = state.db.begin().await?;
    sqlx::query("DELETE FROM order_items WHERE order_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM orders WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!(order_id = id, "order deleted");
    Ok(StatusCode::NO_CONTENT)
}
