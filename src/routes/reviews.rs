use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use validator::Validate;

use crate::error::AppError;
use crate::models::Review;
use crate::AppState;

use super::products::ensure_product_exists;
use super::validate_name;

#[derive(Deserialize, Validate)]
pub struct CreateReview {
    #[validate(custom(function = "validate_name"))]
    name: String,
    #[validate(length(min = 1, message = "description is required"))]
    description: String,
}

#[derive(Deserialize, Validate)]
pub struct UpdateReview {
    #[validate(custom(function = "validate_name"))]
    name: Option<String>,
    #[validate(length(min = 1, message = "description is required"))]
    description: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/products/{id}/reviews",
            get(list_reviews).post(create_review),
        )
        .route(
            "/products/{id}/reviews/{review_id}",
            get(show_review).patch(update_review).delete(delete_review),
        )
}

async fn fetch_review(db: &sqlx::SqlitePool, product_id: i64, id: i64) -> Result<Review, AppError> {
    let review: Option<Review> =
        sqlx::query_as("SELECT * FROM reviews WHERE id = ? AND product_id = ?")
            .bind(id)
            .bind(product_id)
            .fetch_optional(db)
            .await?;

    review.ok_or(AppError::NotFound("review not found"))
}

async fn list_reviews(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> Result<Json<Vec<Review>>, AppError> {
    ensure_product_exists(&state.db, product_id).await?;

    let reviews: Vec<Review> =
        sqlx::query_as("SELECT * FROM reviews WHERE product_id = ? ORDER BY id")
            .bind(product_id)
            .fetch_all(&state.db)
            .await?;

    Ok(Json(reviews))
}

async fn show_review(
    State(state): State<AppState>,
    Path((product_id, id)): Path<(i64, i64)>,
) -> Result<Json<Review>, AppError> {
    Ok(Json(fetch_review(&state.db, product_id, id).await?))
}

async fn create_review(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
    Json(body): Json<CreateReview>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    ensure_product_exists(&state.db, product_id).await?;

    let review: Review = sqlx::query_as(
        "INSERT INTO reviews (product_id, name, description, date) VALUES (?, ?, ?, ?) RETURNING *",
    )
    .bind(product_id)
    .bind(body.name.trim())
    .bind(&body.description)
    .bind(Utc::now().date_naive())
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(review)))
}

async fn update_review(
    State(state): State<AppState>,
    Path((product_id, id)): Path<(i64, i64)>,
    Json(body): Json<UpdateReview>,
) -> Result<Json<Review>, AppError> {
    body.validate()?;
    fetch_review(&state.db, product_id, id).await?;

    sqlx::query(
        r#"
        UPDATE reviews
        SET name = COALESCE(?, name),
            description = COALESCE(?, description)
        WHERE id = ?
        "#,
    )
    .bind(body.name.as_deref().map(str::trim))
    .bind(&body.description)
    .bind(id)
    .execute(&state.db)
    .await?;

    Ok(Json(fetch_review(&state.db, product_id, id).await?))
}

async fn delete_review(
    State(state): State<AppState>,
    Path((product_id, id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    fetch_review(&state.db, product_id, id).await?;

    sqlx::query("DELETE FROM reviews WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
