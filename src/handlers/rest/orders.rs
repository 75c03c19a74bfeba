use axum::extract::State;
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::Deserialize;

use super::extract::{AppJson, AppPath, AuthUser};
use super::AppState;
use crate::error::Result;
use crate::services::orders::{OrderDetails, OrderStatusUpdate};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders/:order_id", get(order_details))
        .route("/orders/:order_id/status", patch(update_status))
}

#[derive(Debug, Deserialize)]
struct StatusRequest {
    #[serde(default)]
    status: String,
}

async fn order_details(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(order_id): AppPath<i64>,
) -> Result<Json<OrderDetails>> {
    Ok(Json(state.orders.get_order_details(order_id, user_id).await?))
}

/// Any authenticated caller may move any order.
async fn update_status(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    AppPath(order_id): AppPath<i64>,
    AppJson(request): AppJson<StatusRequest>,
) -> Result<Json<OrderStatusUpdate>> {
    Ok(Json(
        state
            .orders
            .update_order_status(order_id, &request.status)
            .await?,
    ))
}
