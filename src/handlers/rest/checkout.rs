use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use super::extract::{AppJson, AuthUser};
use super::AppState;
use crate::error::{AppError, Result};
use crate::services::checkout::{DeliveryOptions, OrderConfirmation, OrderSummary, PaymentMethods};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/checkout/order-summary", get(order_summary))
        .route("/checkout/delivery-address", post(set_delivery_address))
        .route("/checkout/apply-voucher", post(apply_voucher))
        .route("/checkout/remove-voucher", post(remove_voucher))
        .route("/checkout/delivery-options", get(delivery_options))
        .route("/checkout/set-delivery-option", post(set_delivery_option))
        .route("/checkout/payment-methods", get(payment_methods))
        .route("/checkout/place-order", post(place_order))
}

#[derive(Debug, Deserialize)]
struct DeliveryAddressRequest {
    #[serde(default)]
    address: String,
    #[serde(default)]
    phone_number: String,
}

#[derive(Debug, Deserialize)]
struct VoucherRequest {
    #[serde(default)]
    code: String,
}

#[derive(Debug, Deserialize)]
struct DeliveryOptionRequest {
    #[serde(default)]
    option_id: String,
}

#[derive(Debug, Deserialize)]
struct PlaceOrderRequest {
    payment_method_id: Option<i64>,
    delivery_instructions: Option<String>,
}

async fn order_summary(State(state): State<AppState>, AuthUser(user_id): AuthUser) -> Result<Json<OrderSummary>> {
    Ok(Json(state.checkout.get_order_summary(user_id).await?))
}

async fn set_delivery_address(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(request): AppJson<DeliveryAddressRequest>,
) -> Result<StatusCode> {
    state
        .checkout
        .set_delivery_address(user_id, &request.address, &request.phone_number)
        .await?;
    Ok(StatusCode::OK)
}

async fn apply_voucher(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(request): AppJson<VoucherRequest>,
) -> Result<Json<OrderSummary>> {
    Ok(Json(state.checkout.apply_voucher(user_id, &request.code).await?))
}

async fn remove_voucher(State(state): State<AppState>, AuthUser(user_id): AuthUser) -> Result<Json<OrderSummary>> {
    Ok(Json(state.checkout.remove_voucher(user_id).await?))
}

async fn delivery_options(State(state): State<AppState>, AuthUser(_): AuthUser) -> Json<DeliveryOptions> {
    Json(state.checkout.delivery_options())
}

async fn set_delivery_option(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(request): AppJson<DeliveryOptionRequest>,
) -> Result<Json<OrderSummary>> {
    Ok(Json(
        state
            .checkout
            .set_delivery_option(user_id, &request.option_id)
            .await?,
    ))
}

async fn payment_methods(State(state): State<AppState>, AuthUser(_): AuthUser) -> Result<Json<PaymentMethods>> {
    Ok(Json(state.checkout.payment_methods().await?))
}

async fn place_order(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(request): AppJson<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderConfirmation>)> {
    let payment_method_id = request
        .payment_method_id
        .ok_or_else(|| AppError::validation("payment_method_id is required"))?;

    let confirmation = state
        .checkout
        .place_order(user_id, payment_method_id, request.delivery_instructions)
        .await?;
    Ok((StatusCode::CREATED, Json(confirmation)))
}
