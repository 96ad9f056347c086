use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use validator::Validate;

use crate::auth::AdminUser;
use crate::error::AppError;
use crate::models::ProductImage;
use crate::AppState;

use super::products::ensure_product_exists;

/// Image bytes live in external storage; only the stored path is recorded here.
#[derive(Deserialize, Validate)]
pub struct CreateImage {
    #[validate(length(min = 1, max = 1024, message = "image path is required"))]
    image: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/products/{id}/images",
            get(list_images).post(create_image),
        )
        .route(
            "/products/{id}/images/{image_id}",
            get(show_image).delete(delete_image),
        )
}

async fn fetch_image(
    db: &sqlx::SqlitePool,
    product_id: i64,
    id: i64,
) -> Result<ProductImage, AppError> {
    let image: Option<ProductImage> =
        sqlx::query_as("SELECT * FROM product_images WHERE id = ? AND product_id = ?")
            .bind(id)
            .bind(product_id)
            .fetch_optional(db)
            .await?;

    image.ok_or(AppError::NotFound("image not found"))
}

async fn list_images(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> Result<Json<Vec<ProductImage>>, AppError> {
    ensure_product_exists(&state.db, product_id).await?;

    let images: Vec<ProductImage> =
        sqlx::query_as("SELECT * FROM product_images WHERE product_id = ? ORDER BY id")
            .bind(product_id)
            .fetch_all(&state.db)
            .await?;

    Ok(Json(images))
}

async fn show_image(
    State(state): State<AppState>,
    Path((product_id, id)): Path<(i64, i64)>,
) -> Result<Json<ProductImage>, AppError> {
    Ok(Json(fetch_image(&state.db, product_id, id).await?))
}

async fn create_image(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(product_id): Path<i64>,
    Json(body): Json<CreateImage>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    ensure_product_exists(&state.db, product_id).await?;

    let image: ProductImage = sqlx::query_as(
        "INSERT INTO product_images (product_id, image) VALUES (?, ?) RETURNING *",
    )
    .bind(product_id)
    .bind(body.image.trim())
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(image)))
}

async fn delete_image(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path((product_id, id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    fetch_image(&state.db, product_id, id).await?;

    sqlx::query("DELETE FROM product_images WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
