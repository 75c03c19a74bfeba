//! Test utilities and fixtures.
//!
//! In-memory SQLite pools with the schema applied, plus a small seeded
//! catalog shared by store, service and HTTP tests.

use sqlx::SqlitePool;

use crate::config::Config;
use crate::handlers::rest::AppState;
use crate::storage::{self, StorageConfig, Stores};

/// Price of the first fixture item.
pub const PRICE_A: i64 = 50_000;
/// Price of the second fixture item.
pub const PRICE_B: i64 = 30_000;
/// Price of the item sold by the second restaurant.
pub const PRICE_OTHER: i64 = 45_000;

/// Ids of the seeded catalog rows.
#[derive(Debug, Clone, Copy)]
pub struct Fixture {
    pub restaurant_id: i64,
    pub other_restaurant_id: i64,
    pub submenu_id: i64,
    pub drinks_submenu_id: i64,
    pub category_id: i64,
    pub empty_category_id: i64,
    pub item_a: i64,
    pub item_b: i64,
    pub item_other: i64,
}

/// Open a migrated single-connection in-memory pool.
pub async fn memory_pool() -> SqlitePool {
    let config = StorageConfig {
        path: ":memory:".to_string(),
        ..StorageConfig::default()
    };
    let pool = storage::connect(&config)
        .await
        .expect("in-memory pool should open");
    storage::migrate(&pool)
        .await
        .expect("migrations should apply");
    pool
}

/// Migrated pool plus the SQLite stores over it.
pub async fn memory_stores() -> (SqlitePool, Stores) {
    let pool = memory_pool().await;
    let stores = Stores::sqlite(pool.clone());
    (pool, stores)
}

async fn insert(pool: &SqlitePool, sql: &str) -> i64 {
    sqlx::query(sql)
        .execute(pool)
        .await
        .unwrap_or_else(|e| panic!("fixture insert failed: {e}: {sql}"))
        .last_insert_rowid()
}

/// Insert a user directly, bypassing password hashing.
pub async fn seed_user(pool: &SqlitePool, email: &str) -> i64 {
    sqlx::query(
        "INSERT INTO users (email, password, first_name, last_name, phone_number, address, created_at) \
         VALUES (?, 'not-a-hash', 'Minh', 'Nguyen', '0901234567', '12 Nguyen Hue, District 1', ?)",
    )
    .bind(email)
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(pool)
    .await
    .expect("fixture user insert")
    .last_insert_rowid()
}

/// Seed two restaurants, their submenus and items, categories, banners and
/// a review.
pub async fn seed_catalog(pool: &SqlitePool) -> Fixture {
    let now = chrono::Utc::now().to_rfc3339();

    let restaurant_id = insert(
        pool,
        &format!(
            "INSERT INTO restaurants (name, address, rating, cuisine_type, opening_hours, created_at) \
             VALUES ('Pho Thin', '13 Lo Duc, Hai Ba Trung', 4.2, 'Vietnamese', '06:00 - 21:00', '{now}')"
        ),
    )
    .await;
    let other_restaurant_id = insert(
        pool,
        &format!(
            "INSERT INTO restaurants (name, address, rating, cuisine_type, opening_hours, created_at) \
             VALUES ('Banh Mi 100%_Real', '5 Hang Ca, Hoan Kiem', 4.8, NULL, NULL, '{now}')"
        ),
    )
    .await;

    let category_id = insert(
        pool,
        "INSERT INTO food_categories (name, icon_url, display_order) VALUES ('Noodles', 'noodles.png', 2)",
    )
    .await;
    insert(
        pool,
        "INSERT INTO food_categories (name, icon_url, display_order) VALUES ('Rice', 'rice.png', 1)",
    )
    .await;
    let empty_category_id = insert(
        pool,
        "INSERT INTO food_categories (name, icon_url, display_order) VALUES ('Desserts', NULL, 3)",
    )
    .await;

    let submenu_id = insert(
        pool,
        &format!(
            "INSERT INTO restaurant_submenus (restaurant_id, name, display_order) \
             VALUES ({restaurant_id}, 'Mains', 1)"
        ),
    )
    .await;
    let drinks_submenu_id = insert(
        pool,
        &format!(
            "INSERT INTO restaurant_submenus (restaurant_id, name, display_order) \
             VALUES ({restaurant_id}, 'Drinks', 2)"
        ),
    )
    .await;

    let item_a = insert(
        pool,
        &format!(
            "INSERT INTO menu_items (restaurant_id, submenu_id, category_id, name, description, price, image_url) \
             VALUES ({restaurant_id}, {submenu_id}, {category_id}, 'Pho Bo', 'Beef noodle soup', {PRICE_A}, 'pho.jpg')"
        ),
    )
    .await;
    let item_b = insert(
        pool,
        &format!(
            "INSERT INTO menu_items (restaurant_id, submenu_id, category_id, name, description, price, image_url) \
             VALUES ({restaurant_id}, {drinks_submenu_id}, NULL, 'Tra Da', 'Iced tea', {PRICE_B}, NULL)"
        ),
    )
    .await;
    let item_other = insert(
        pool,
        &format!(
            "INSERT INTO menu_items (restaurant_id, submenu_id, category_id, name, description, price, image_url) \
             VALUES ({other_restaurant_id}, NULL, NULL, 'Banh Mi Thit', NULL, {PRICE_OTHER}, 'banhmi.jpg')"
        ),
    )
    .await;

    insert(
        pool,
        "INSERT INTO banners (image_url, title, description, link_url, display_order) \
         VALUES ('second.jpg', 'Second', NULL, NULL, 2), ('first.jpg', 'First', 'Top deal', '/deals', 1)",
    )
    .await;

    Fixture {
        restaurant_id,
        other_restaurant_id,
        submenu_id,
        drinks_submenu_id,
        category_id,
        empty_category_id,
        item_a,
        item_b,
        item_other,
    }
}

/// Insert a review with an explicit timestamp.
pub async fn seed_review(
    pool: &SqlitePool,
    restaurant_id: i64,
    user_id: i64,
    rating: i64,
    created_at: &str,
) -> i64 {
    sqlx::query(
        "INSERT INTO reviews (restaurant_id, user_id, rating, comment, created_at) VALUES (?, ?, ?, 'Ngon', ?)",
    )
    .bind(restaurant_id)
    .bind(user_id)
    .bind(rating)
    .bind(created_at)
    .execute(pool)
    .await
    .expect("fixture review insert")
    .last_insert_rowid()
}

/// Count rows of a table.
pub async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .expect("count query")
}

/// Application state over a fresh in-memory database.
pub async fn memory_app_state() -> (SqlitePool, AppState) {
    let (pool, stores) = memory_stores().await;
    (pool, AppState::new(stores, &Config::for_test()))
}

/// `Authorization` header value for a user.
pub fn bearer(state: &AppState, user_id: i64, email: &str) -> String {
    let token = state
        .auth
        .signer()
        .issue(user_id, email)
        .expect("token should sign");
    format!("Bearer {token}")
}
