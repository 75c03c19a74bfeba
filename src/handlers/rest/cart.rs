use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;

use super::extract::{AppJson, AppPath, AuthUser};
use super::AppState;
use crate::error::{AppError, Result};
use crate::services::cart::{CartCleared, CartView};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(get_cart).delete(clear_cart))
        .route("/cart/add", post(add_to_cart))
        .route("/cart/update", put(update_cart_item))
        .route("/cart/:menu_item_id", delete(remove_from_cart))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartItemRequest {
    menu_item_id: Option<i64>,
    quantity: Option<i64>,
}

impl CartItemRequest {
    fn into_parts(self) -> Result<(i64, i64)> {
        let menu_item_id = self
            .menu_item_id
            .ok_or_else(|| AppError::validation("menuItemId is required"))?;
        let quantity = self
            .quantity
            .ok_or_else(|| AppError::validation("quantity is required"))?;
        Ok((menu_item_id, quantity))
    }
}

async fn get_cart(State(state): State<AppState>, AuthUser(user_id): AuthUser) -> Result<Json<CartView>> {
    Ok(Json(state.carts.get_cart(user_id).await?))
}

async fn add_to_cart(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(request): AppJson<CartItemRequest>,
) -> Result<(StatusCode, Json<CartView>)> {
    let (menu_item_id, quantity) = request.into_parts()?;
    let cart = state.carts.add_to_cart(user_id, menu_item_id, quantity).await?;
    Ok((StatusCode::CREATED, Json(cart)))
}

async fn update_cart_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(request): AppJson<CartItemRequest>,
) -> Result<Json<CartView>> {
    let (menu_item_id, quantity) = request.into_parts()?;
    Ok(Json(
        state
            .carts
            .update_cart_item(user_id, menu_item_id, quantity)
            .await?,
    ))
}

async fn remove_from_cart(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(menu_item_id): AppPath<i64>,
) -> Result<Json<CartView>> {
    Ok(Json(state.carts.remove_from_cart(user_id, menu_item_id).await?))
}

async fn clear_cart(State(state): State<AppState>, AuthUser(user_id): AuthUser) -> Result<Json<CartCleared>> {
    Ok(Json(state.carts.clear_cart(user_id).await?))
}
