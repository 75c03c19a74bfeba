use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use super::extract::AppPath;
use super::AppState;
use crate::error::{AppError, Result};
use crate::services::catalog::{
    BannerView, FeaturedContent, FoodCategoryView, MenuItemView, RestaurantCard, RestaurantDetails,
    RestaurantsByCategory, ReviewView, SubmenuView,
};
use crate::utils::{PageQuery, Paginated};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/banners", get(banners))
        .route("/food-categories", get(food_categories))
        .route("/food-categories/:id/restaurants", get(restaurants_by_category))
        .route("/restaurants/featured-content", get(featured_content))
        .route("/restaurants/search", get(search))
        .route("/restaurants/:id", get(restaurant_details))
        .route("/restaurants/:id/submenus", get(submenus))
        .route("/restaurants/:id/menu", get(menu))
        .route("/restaurants/:id/reviews", get(reviews))
}

#[derive(Debug, Default, Deserialize)]
struct SearchQuery {
    query: Option<String>,
    #[serde(flatten)]
    paging: PageQuery,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MenuQuery {
    submenu_id: Option<String>,
}

impl MenuQuery {
    fn submenu_id(&self) -> Result<Option<i64>> {
        match self.submenu_id.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| AppError::validation("submenuId must be an integer")),
        }
    }
}

async fn banners(State(state): State<AppState>) -> Result<Json<Vec<BannerView>>> {
    Ok(Json(state.catalog.banners().await?))
}

async fn food_categories(State(state): State<AppState>) -> Result<Json<Vec<FoodCategoryView>>> {
    Ok(Json(state.catalog.food_categories().await?))
}

async fn restaurants_by_category(
    State(state): State<AppState>,
    AppPath(category_id): AppPath<i64>,
    Query(paging): Query<PageQuery>,
) -> Result<Json<RestaurantsByCategory>> {
    Ok(Json(
        state
            .catalog
            .restaurants_by_category(category_id, &paging)
            .await?,
    ))
}

async fn featured_content(
    State(state): State<AppState>,
    Query(paging): Query<PageQuery>,
) -> Result<Json<FeaturedContent>> {
    Ok(Json(state.catalog.featured_content(&paging).await?))
}

async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Paginated<RestaurantCard>>> {
    Ok(Json(
        state
            .catalog
            .search(query.query.as_deref(), &query.paging)
            .await?,
    ))
}

async fn restaurant_details(
    State(state): State<AppState>,
    AppPath(restaurant_id): AppPath<i64>,
) -> Result<Json<RestaurantDetails>> {
    Ok(Json(state.catalog.restaurant_details(restaurant_id).await?))
}

async fn submenus(
    State(state): State<AppState>,
    AppPath(restaurant_id): AppPath<i64>,
) -> Result<Json<Vec<SubmenuView>>> {
    Ok(Json(state.catalog.submenus(restaurant_id).await?))
}

async fn menu(
    State(state): State<AppState>,
    AppPath(restaurant_id): AppPath<i64>,
    Query(query): Query<MenuQuery>,
) -> Result<Json<Vec<MenuItemView>>> {
    let submenu_id = query.submenu_id()?;
    Ok(Json(state.catalog.menu(restaurant_id, submenu_id).await?))
}

async fn reviews(
    State(state): State<AppState>,
    AppPath(restaurant_id): AppPath<i64>,
    Query(paging): Query<PageQuery>,
) -> Result<Json<Paginated<ReviewView>>> {
    Ok(Json(state.catalog.reviews(restaurant_id, &paging).await?))
}
