use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use validator::{Validate, ValidationError};

use crate::auth::AdminUser;
use crate::error::AppError;
use crate::models::Address;
use crate::AppState;

use super::trimmed_length;

fn validate_street(value: &str) -> Result<(), ValidationError> {
    trimmed_length(value, "street must be 1 to 255 characters")
}

fn validate_city(value: &str) -> Result<(), ValidationError> {
    trimmed_length(value, "city must be 1 to 255 characters")
}

#[derive(Deserialize, Validate)]
pub struct CreateAddress {
    #[validate(custom(function = "validate_street"))]
    street: String,
    #[validate(custom(function = "validate_city"))]
    city: String,
}

#[derive(Deserialize, Validate)]
pub struct UpdateAddress {
    #[validate(custom(function = "validate_street"))]
    street: Option<String>,
    #[validate(custom(function = "validate_city"))]
    city: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/customers/{id}/addresses",
            get(list_addresses).post(create_address),
        )
        .route(
            "/customers/{id}/addresses/{address_id}",
            get(show_address)
                .patch(update_address)
                .delete(delete_address),
        )
}

async fn ensure_customer_exists(db: &SqlitePool, id: i64) -> Result<(), AppError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM customers WHERE id = ?")
        .bind(id)
        .fetch_one(db)
        .await?;
    if count == 0 {
        return Err(AppError::NotFound("customer not found"));
    }
    Ok(())
}

async fn fetch_address(db: &SqlitePool, customer_id: i64, id: i64) -> Result<Address, AppError> {
    let address: Option<Address> =
        sqlx::query_as("SELECT * FROM addresses WHERE id = ? AND customer_id = ?")
            .bind(id)
            .bind(customer_id)
            .fetch_optional(db)
            .await?;

    address.ok_or(AppError::NotFound("address not found"))
}

async fn list_addresses(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(customer_id): Path<i64>,
) -> Result<Json<Vec<Address>>, AppError> {
    ensure_customer_exists(&state.db, customer_id).await?;

    let addresses: Vec<Address> =
        sqlx::query_as("SELECT * FROM addresses WHERE customer_id = ? ORDER BY id")
            .bind(customer_id)
            .fetch_all(&state.db)
            .await?;

    Ok(Json(addresses))
}

async fn show_address(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path((customer_id, id)): Path<(i64, i64)>,
) -> Result<Json<Address>, AppError> {
    Ok(Json(fetch_address(&state.db, customer_id, id).await?))
}

async fn create_address(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(customer_id): Path<i64>,
    Json(body): Json<CreateAddress>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    ensure_customer_exists(&state.db, customer_id).await?;

    let address: Address = sqlx::query_as(
        "INSERT INTO addresses (customer_id, street, city) VALUES (?, ?, ?) RETURNING *",
    )
    .bind(customer_id)
    .bind(body.street.trim())
    .bind(body.city.trim())
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(address)))
}

async fn update_address(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path((customer_id, id)): Path<(i64, i64)>,
    Json(body): Json<UpdateAddress>,
) -> Result<Json<Address>, AppError> {
    body.validate()?;
    fetch_address(&state.db, customer_id, id).await?;

    sqlx::query(
        "UPDATE addresses SET street = COALESCE(?, street), city = COALESCE(?, city) WHERE id = ?",
    )
    .bind(body.street.as_deref().map(str::trim))
    .bind(body.city.as_deref().map(str::trim))
    .bind(id)
    .execute(&state.db)
    .await?;

    Ok(Json(fetch_address(&state.db, customer_id, id).await?))
}

async fn delete_address(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path((customer_id, id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    fetch_address(&state.db, customer_id, id).await?;

    sqlx::query("DELETE FROM addresses WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
