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
use crate::models::{Collection, CollectionWithCount};
use crate::AppState;

use super::products::ensure_product_exists;
use super::{nullable, validate_title};

#[derive(Deserialize, Validate)]
pub struct CreateCollection {
    #[validate(custom(function = "validate_title"))]
    title: String,
    featured_product_id: Option<i64>,
}

#[derive(Deserialize, Validate)]
pub struct UpdateCollection {
    #[validate(custom(function = "validate_title"))]
    title: Option<String>,
    /// `null` clears the featured product.
    #[serde(default, deserialize_with = "nullable")]
    featured_product_id: Option<Option<i64>>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/collections", get(list_collections).post(create_collection))
        .route(
            "/collections/{id}",
            get(show_collection)
                .patch(update_collection)
                .delete(delete_collection),
        )
}

async fn fetch_collection(db: &sqlx::SqlitePool, id: i64) -> Result<CollectionWithCount, AppError> {
    let collection: Option<CollectionWithCount> = sqlx::query_as(
        r#"
        SELECT c.*, COUNT(p.id) AS products_count
        FROM collections c
        LEFT JOIN products p ON p.collection_id = c.id
        WHERE c.id = ?
        GROUP BY c.id
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;

    collection.ok_or(AppError::NotFound("collection not found"))
}

async fn list_collections(
    State(state): State<AppState>,
) -> Result<Json<Vec<CollectionWithCount>>, AppError> {
    let collections: Vec<CollectionWithCount> = sqlx::query_as(
        r#"
        SELECT c.*, COUNT(p.id) AS products_count
        FROM collections c
        LEFT JOIN products p ON p.collection_id = c.id
        GROUP BY c.id
        ORDER BY c.id
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(collections))
}

async fn show_collection(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CollectionWithCount>, AppError> {
    Ok(Json(fetch_collection(&state.db, id).await?))
}

async fn create_collection(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(body): Json<CreateCollection>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    if let Some(product_id) = body.featured_product_id {
        ensure_product_exists(&state.db, product_id).await?;
    }

    let collection: Collection = sqlx::query_as(
        "INSERT INTO collections (title, featured_product_id) VALUES (?, ?) RETURNING *",
    )
    .bind(body.title.trim())
    .bind(body.featured_product_id)
    .fetch_one(&state.db)
    .await?;

    let created = CollectionWithCount {
        collection,
        products_count: 0,
    };
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_collection(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateCollection>,
) -> Result<Json<CollectionWithCount>, AppError> {
    body.validate()?;
    fetch_collection(&state.db, id).await?;
    if let Some(Some(product_id)) = body.featured_product_id {
        ensure_product_exists(&state.db, product_id).await?;
    }

    sqlx::query(
        r#"
        UPDATE collections
        SET title = COALESCE(?, title),
            featured_product_id = CASE WHEN ? THEN ? ELSE featured_product_id END
        WHERE id = ?
        "#,
    )
    .bind(body.title.as_deref().map(str::trim))
    .bind(body.featured_product_id.is_some())
    .bind(body.featured_product_id.flatten())
    .bind(id)
    .execute(&state.db)
    .await?;

    Ok(Json(fetch_collection(&state.db, id).await?))
}

async fn delete_collection(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let collection = fetch_collection(&state.db, id).await?;

    if collection.products_count > 0 {
        return Err(AppError::Conflict(
            "collection cannot be deleted because it contains products".to_string(),
        ));
    }

    sqlx::query("DELETE FROM collections WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;

    tracing::info!(collection_id = id, "collection deleted");
    Ok(StatusCode::NO_CONTENT)
}
