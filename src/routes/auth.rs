use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::auth::{login_user, logout_user, AuthUser};
use crate::error::AppError;
use crate::models::User;
use crate::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    invite_code: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<User>, AppError> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE invite_code = ?")
        .bind(&body.invite_code)
        .fetch_optional(&state.db)
        .await?;

    let Some(user) = user else {
        return Err(AppError::Unauthorized);
    };

    login_user(&session, &user).await?;
    tracing::info!(user_id = %user.id, "user logged in");
    Ok(Json(user))
}

async fn logout(session: Session) -> Result<impl IntoResponse, AppError> {
    logout_user(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn me(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}
