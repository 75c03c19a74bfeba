use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::*;
use crate::test_utils::{bearer, memory_app_state, seed_catalog, seed_user, Fixture, PRICE_A};

async fn send(app: &Router, method: &str, uri: &str, auth: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    let req = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn app_with_user() -> (Router, String, Fixture) {
    let (pool, state) = memory_app_state().await;
    let fixture = seed_catalog(&pool).await;
    let user_id = seed_user(&pool, "minh@example.com").await;
    let auth = bearer(&state, user_id, "minh@example.com");
    (router(state), auth, fixture)
}

#[tokio::test]
async fn test_health() {
    let (_pool, state) = memory_app_state().await;
    let (status, _) = send(&router(state), "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let (app, _, _) = app_with_user().await;

    let (status, body) = send(&app, "GET", "/cart", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["statusCode"], 401);
    assert_eq!(body["error"], "Unauthorized");

    let (status, _) = send(&app, "GET", "/checkout/order-summary", Some("Bearer junk"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/orders/1", Some("Basic abc"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signup_then_login_then_profile() {
    let (_pool, state) = memory_app_state().await;
    let app = router(state);

    let signup = json!({
        "email": "lan@example.com",
        "password": "secret123",
        "phone_number": "0908765432",
        "address": "45 Le Loi, District 1",
        "first_name": "Lan",
        "last_name": "Tran",
    });
    let (status, user) = send(&app, "POST", "/auth/signup", None, Some(signup.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["email"], "lan@example.com");
    assert!(user.get("password").is_none());
    assert!(user.get("password_hash").is_none());

    let (status, body) = send(&app, "POST", "/auth/signup", None, Some(signup)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Email already exists");

    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "lan@example.com", "password": "secret123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, profile) = send(&app, "GET", "/auth/profile", Some(&format!("Bearer {token}")), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["user_id"], user["user_id"]);

    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "lan@example.com", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_cart_endpoints() {
    let (app, auth, fixture) = app_with_user().await;

    let (status, cart) = send(&app, "GET", "/cart", Some(&auth), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart, json!({"items": [], "total": 0}));

    let (status, cart) = send(
        &app,
        "POST",
        "/cart/add",
        Some(&auth),
        Some(json!({"menuItemId": fixture.item_a, "quantity": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(cart["total"], 2 * PRICE_A);
    assert_eq!(cart["items"][0]["image_url"], "pho.jpg");

    let (status, cart) = send(
        &app,
        "PUT",
        "/cart/update",
        Some(&auth),
        Some(json!({"menuItemId": fixture.item_a, "quantity": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"][0]["quantity"], 1);

    let (status, cart) = send(&app, "DELETE", &format!("/cart/{}", fixture.item_a), Some(&auth), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["total"], 0);

    let (status, body) = send(&app, "DELETE", "/cart", Some(&auth), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Cart cleared successfully");
}

#[tokio::test]
async fn test_bad_input_is_a_validation_error() {
    let (app, auth, _) = app_with_user().await;

    let (status, body) = send(
        &app,
        "POST",
        "/cart/add",
        Some(&auth),
        Some(json!({"menuItemId": "one", "quantity": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["statusCode"], 400);

    let (status, _) = send(&app, "POST", "/cart/add", Some(&auth), Some(json!({"quantity": 1}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "DELETE", "/cart/abc", Some(&auth), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "GET", "/restaurants/featured-content?page=abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid page or limit parameter");

    let (status, _) = send(
        &app,
        "POST",
        "/checkout/set-delivery-option",
        Some(&auth),
        Some(json!({"option_id": "drone"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_catalog_endpoints() {
    let (app, _, fixture) = app_with_user().await;

    let (status, banners) = send(&app, "GET", "/banners", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(banners[0]["title"], "First");
    assert_eq!(banners[0]["linkUrl"], "/deals");

    let (status, categories) = send(&app, "GET", "/food-categories", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(categories[0]["name"], "Rice");

    let (status, featured) = send(&app, "GET", "/restaurants/featured-content?limit=1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(featured["featuredRestaurants"]["totalPages"], 2);
    assert_eq!(featured["specialDeals"]["items"][0]["name"], "Pho Thin");

    let (status, far) = send(
        &app,
        "GET",
        "/restaurants/featured-content?page=9223372036854775807",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(far["featuredRestaurants"]["items"], json!([]));
    assert_eq!(far["featuredRestaurants"]["total"], 2);

    let (status, hits) = send(&app, "GET", "/restaurants/search?query=pho", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hits["total"], 1);
    assert_eq!(hits["items"][0]["cuisineType"], "Vietnamese");

    let uri = format!("/restaurants/{}", fixture.restaurant_id);
    let (status, details) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["price_range"], "30.000 - 50.000");

    let uri = format!("/restaurants/{}/menu?submenuId={}", fixture.restaurant_id, fixture.drinks_submenu_id);
    let (status, menu) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(menu.as_array().unwrap().len(), 1);
    assert_eq!(menu[0]["name"], "Tra Da");

    let uri = format!("/food-categories/{}/restaurants", fixture.category_id);
    let (status, by_category) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_category["categoryName"], "Noodles");
    assert_eq!(by_category["totalCount"], 1);

    let (status, body) = send(&app, "GET", "/restaurants/9999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Restaurant with ID 9999 not found");
    assert_eq!(body["error"], "Not Found");
}
