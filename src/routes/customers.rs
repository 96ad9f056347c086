use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};
use validator::Validate;

use crate::auth::{AdminUser, AuthUser};
use crate::error::AppError;
use crate::models::{Customer, Membership};
use crate::AppState;

#[derive(Deserialize, Validate)]
pub struct CreateCustomer {
    user_id: String,
    #[validate(length(max = 20, message = "phone must be at most 20 characters"))]
    #[serde(default)]
    phone: String,
    birth_date: Option<NaiveDate>,
    #[serde(default)]
    membership: Membership,
}

#[derive(Deserialize, Validate)]
pub struct UpdateCustomer {
    #[validate(length(max = 20, message = "phone must be at most 20 characters"))]
    phone: Option<String>,
    birth_date: Option<NaiveDate>,
    membership: Option<Membership>,
}

/// Full replacement of the caller's own profile.
#[derive(Deserialize, Validate)]
pub struct ReplaceProfile {
    #[validate(length(max = 20, message = "phone must be at most 20 characters"))]
    phone: String,
    birth_date: Option<NaiveDate>,
    #[serde(default)]
    membership: Membership,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route("/customers/me", get(show_me).put(replace_me))
        .route(
            "/customers/{id}",
            get(show_customer)
                .patch(update_customer)
                .delete(delete_customer),
        )
}

/// Look up the customer bound to `user_id`, creating an empty profile the
/// first time an identity is seen.
pub async fn customer_for_user(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Customer, sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO customers (user_id, phone, membership)
        VALUES (?, '', ?)
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(Membership::default())
    .execute(&mut *conn)
    .await?;

    sqlx::query_as("SELECT * FROM customers WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await
}

async fn fetch_customer(db: &SqlitePool, id: i64) -> Result<Customer, AppError> {
    let customer: Option<Customer> = sqlx::query_as("SELECT * FROM customers WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;

    customer.ok_or(AppError::NotFound("customer not found"))
}

async fn list_customers(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<Customer>>, AppError> {
    let customers: Vec<Customer> = sqlx::query_as("SELECT * FROM customers ORDER BY id")
        .fetch_all(&state.db)
        .await?;

    Ok(Json(customers))
}

async fn show_customer(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<Customer>, AppError> {
    Ok(Json(fetch_customer(&state.db, id).await?))
}

async fn create_customer(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(body): Json<CreateCustomer>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;

    let (users,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE id = ?")
        .bind(&body.user_id)
        .fetch_one(&state.db)
        .await?;
    if users == 0 {
        return Err(AppError::NotFound("user not found"));
    }

    let (existing,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM customers WHERE user_id = ?")
        .bind(&body.user_id)
        .fetch_one(&state.db)
        .await?;
    if existing > 0 {
        return Err(AppError::Conflict("user already has a customer profile".to_string()));
    }

    let customer: Customer = sqlx::query_as(
        r#"
        INSERT INTO customers (user_id, phone, birth_date, membership)
        VALUES (?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&body.user_id)
    .bind(&body.phone)
    .bind(body.birth_date)
    .bind(body.membership)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(customer)))
}

async fn update_customer(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateCustomer>,
) -> Result<Json<Customer>, AppError> {
    body.validate()?;
    fetch_customer(&state.db, id).await?;

    sqlx::query(
        r#"
        UPDATE customers
        SET phone = COALESCE(?, phone),
            birth_date = COALESCE(?, birth_date),
            membership = COALESCE(?, membership)
        WHERE id = ?
        "#,
    )
    .bind(&body.phone)
    .bind(body.birth_date)
    .bind(body.membership)
    .bind(id)
    .execute(&state.db)
    .await?;

    Ok(Json(fetch_customer(&state.db, id).await?))
}

async fn delete_customer(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    fetch_customer(&state.db, id).await?;

    let (orders,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE customer_id = ?")
        .bind(id)
        .fetch_one(&state.db)
        .await?;
    if orders > 0 {
        return Err(AppError::Conflict(
            "customer cannot be deleted because they have placed orders".to_string(),
        ));
    }

    sqlx::query("DELETE FROM customers WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn show_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Customer>, AppError> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(customer_for_user(&mut *conn, &user.id).await?))
}

async fn replace_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<ReplaceProfile>,
) -> Result<Json<Customer>, AppError> {
    body.validate()?;

    let mut conn = state.db.acquire().await?;
    let customer = customer_for_user(&mut *conn, &user.id).await?;

    let updated: Customer = sqlx::query_as(
        "UPDATE customers SET phone = ?, birth_date = ?, membership = ? WHERE id = ? RETURNING *",
    )
    .bind(&body.phone)
    .bind(body.birth_date)
    .bind(body.membership)
    .bind(customer.id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(Json(updated))
}
