//! Catalog storage interface.
//!
//! Read-only access to restaurants, menus, categories, banners, reviews and
//! payment methods. Paged queries return the page rows plus the total count
//! of matching rows.

use async_trait::async_trait;

use super::Result;

/// Restaurant row with the image of its first menu item.
#[derive(Debug, Clone)]
pub struct Restaurant {
    pub restaurant_id: i64,
    pub name: String,
    pub address: String,
    pub rating: f64,
    pub cuisine_type: Option<String>,
    pub opening_hours: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Submenu {
    pub submenu_id: i64,
    pub restaurant_id: i64,
    pub name: String,
    pub display_order: i64,
}

#[derive(Debug, Clone)]
pub struct MenuItem {
    pub item_id: i64,
    pub restaurant_id: Option<i64>,
    pub submenu_id: Option<i64>,
    pub submenu_name: Option<String>,
    pub category_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FoodCategory {
    pub category_id: i64,
    pub name: String,
    pub icon_url: Option<String>,
    pub display_order: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct Banner {
    pub banner_id: i64,
    pub image_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub link_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReviewRecord {
    pub review_id: i64,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: String,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone)]
pub struct PaymentMethod {
    pub payment_method_id: i64,
    pub name: String,
}

/// Which restaurants a paged listing should include, and in what order.
#[derive(Debug, Clone, Default)]
pub enum RestaurantFilter {
    /// Every restaurant, best rated first.
    #[default]
    TopRated,
    /// Every restaurant, in insertion order.
    All,
    /// Case-insensitive substring match on the name, best rated first.
    NameContains(String),
    /// Restaurants offering at least one item of the category.
    Category(i64),
}

/// Interface for catalog reads.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn banners(&self) -> Result<Vec<Banner>>;

    async fn food_categories(&self) -> Result<Vec<FoodCategory>>;

    async fn food_category(&self, category_id: i64) -> Result<Option<FoodCategory>>;

    async fn restaurants(
        &self,
        filter: &RestaurantFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Restaurant>, u64)>;

    async fn restaurant(&self, restaurant_id: i64) -> Result<Option<Restaurant>>;

    /// Submenus of a restaurant ordered by display order.
    async fn submenus(&self, restaurant_id: i64) -> Result<Vec<Submenu>>;

    async fn menu_items(
        &self,
        restaurant_id: i64,
        submenu_id: Option<i64>,
    ) -> Result<Vec<MenuItem>>;

    async fn menu_item(&self, item_id: i64) -> Result<Option<MenuItem>>;

    /// Cheapest and most expensive menu price of a restaurant.
    async fn price_range(&self, restaurant_id: i64) -> Result<Option<(i64, i64)>>;

    /// Reviews of a restaurant, newest first.
    async fn reviews(
        &self,
        restaurant_id: i64,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<ReviewRecord>, u64)>;

    async fn payment_methods(&self) -> Result<Vec<PaymentMethod>>;
}
