pub mod auth;
pub mod checkout;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod money;
pub mod notify;
pub mod routes;

use axum::{routing::get, Router};
use sqlx::SqlitePool;
use time::Duration;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tower_sessions::{cookie::SameSite, Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;
use tracing::Level;

use crate::notify::OrderHooks;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub hooks: OrderHooks,
}

async fn health() -> &'static str {
    "ok"
}

/// Assemble the storefront router over an already-migrated `pool`.
///
/// Creates the session table if needed. Every order placed through the
/// returned router is announced to `hooks` once committed.
pub async fn build_app(
    pool: SqlitePool,
    secure_cookies: bool,
    hooks: OrderHooks,
) -> Result<Router, sqlx::Error> {
    let session_store = SqliteStore::new(pool.clone());
    session_store.migrate().await?;

    let session_layer = SessionManagerLayer::new(session_store)
        .with_expiry(Expiry::OnInactivity(Duration::days(30)))
        .with_secure(secure_cookies)
        .with_http_only(true)
        .with_same_site(SameSite::Lax);

    let state = AppState { db: pool, hooks };

    let router = Router::new()
        .route("/health", get(health))
        .merge(routes::auth::router())
        .merge(routes::collections::router())
        .merge(routes::products::router())
        .merge(routes::reviews::router())
        .merge(routes::images::router())
        .merge(routes::carts::router())
        .merge(routes::customers::router())
        .merge(routes::addresses::router())
        .merge(routes::orders::router())
        .layer(session_layer)
        .layer(
            TraceLayer::new_for_http()
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state);

    Ok(router)
}
