use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use super::extract::{AppJson, AuthUser};
use super::AppState;
use crate::error::Result;
use crate::services::auth::{AccessToken, LoginRequest, SignupRequest, UserView};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/profile", get(profile))
}

async fn signup(
    State(state): State<AppState>,
    AppJson(request): AppJson<SignupRequest>,
) -> Result<(StatusCode, Json<UserView>)> {
    let user = state.auth.signup(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<Json<AccessToken>> {
    Ok(Json(state.auth.login(request).await?))
}

async fn profile(State(state): State<AppState>, AuthUser(user_id): AuthUser) -> Result<Json<UserView>> {
    Ok(Json(state.auth.profile(user_id).await?))
}
