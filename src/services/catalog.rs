//! Public catalog reads: restaurants, menus, categories, banners, reviews.

use std::sync::Arc;

use serde::Serialize;

use crate::config::CatalogConfig;
use crate::error::{AppError, Result};
use crate::interfaces::{CatalogStore, Restaurant, RestaurantFilter};
use crate::utils::{PageParams, PageQuery, Paginated};

/// Restaurant as listed on cards.
#[derive(Debug, Clone, Serialize)]
pub struct RestaurantCard {
    pub restaurant_id: i64,
    pub name: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    pub address: String,
    pub rating: f64,
    #[serde(rename = "cuisineType")]
    pub cuisine_type: Option<String>,
}

impl From<Restaurant> for RestaurantCard {
    fn from(restaurant: Restaurant) -> Self {
        Self {
            restaurant_id: restaurant.restaurant_id,
            name: restaurant.name,
            image_url: restaurant.image_url.unwrap_or_default(),
            address: restaurant.address,
            rating: restaurant.rating,
            cuisine_type: restaurant.cuisine_type,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedContent {
    pub featured_restaurants: Paginated<RestaurantCard>,
    pub special_deals: Paginated<RestaurantCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RestaurantDetails {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub rating: f64,
    pub opening_hours: Option<String>,
    pub price_range: String,
    pub service_charge: f64,
    /// Submenu names.
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmenuView {
    pub submenu_id: i64,
    pub name: String,
    #[serde(rename = "displayOrder")]
    pub display_order: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MenuItemView {
    pub item_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    pub submenu_id: Option<i64>,
    pub submenu_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewAuthor {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    pub id: i64,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: String,
    pub user: ReviewAuthor,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantsByCategory {
    pub category_name: String,
    pub restaurants: Vec<RestaurantCard>,
    pub total_count: u64,
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodCategoryView {
    pub id: i64,
    pub name: String,
    pub icon_url: Option<String>,
    pub display_order: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerView {
    pub id: i64,
    pub image_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub link_url: Option<String>,
}

/// Format a VND amount with "." thousands separators: 99000 -> "99.000".
pub fn format_vnd(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

pub struct CatalogService {
    catalog: Arc<dyn CatalogStore>,
    service_charge: f64,
    max_page_size: u64,
}

impl CatalogService {
    pub fn new(catalog: Arc<dyn CatalogStore>, config: &CatalogConfig) -> Self {
        Self {
            catalog,
            service_charge: config.service_charge,
            max_page_size: config.max_page_size,
        }
    }

    fn page_params(&self, query: &PageQuery) -> Result<PageParams> {
        PageParams::parse(query, self.max_page_size)
    }

    async fn restaurant_page(
        &self,
        filter: &RestaurantFilter,
        params: PageParams,
    ) -> Result<Paginated<RestaurantCard>> {
        let (restaurants, total) = self
            .catalog
            .restaurants(filter, params.offset(), params.limit)
            .await?;
        let cards = restaurants.into_iter().map(RestaurantCard::from).collect();
        Ok(Paginated::new(cards, total, params))
    }

    /// Best rated restaurants alongside the special deals listing.
    pub async fn featured_content(&self, query: &PageQuery) -> Result<FeaturedContent> {
        let params = self.page_params(query)?;

        Ok(FeaturedContent {
            featured_restaurants: self
                .restaurant_page(&RestaurantFilter::TopRated, params)
                .await?,
            special_deals: self.restaurant_page(&RestaurantFilter::All, params).await?,
        })
    }

    /// Case-insensitive name search. An empty needle lists everything.
    pub async fn search(&self, needle: Option<&str>, query: &PageQuery) -> Result<Paginated<RestaurantCard>> {
        let params = self.page_params(query)?;
        let filter = match needle.map(str::trim) {
            Some(needle) if !needle.is_empty() => RestaurantFilter::NameContains(needle.to_string()),
            _ => RestaurantFilter::TopRated,
        };
        self.restaurant_page(&filter, params).await
    }

    pub async fn restaurant_details(&self, restaurant_id: i64) -> Result<RestaurantDetails> {
        let restaurant = self
            .catalog
            .restaurant(restaurant_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Restaurant with ID {restaurant_id} not found")))?;

        let categories = self
            .catalog
            .submenus(restaurant_id)
            .await?
            .into_iter()
            .map(|submenu| submenu.name)
            .collect();

        let price_range = match self.catalog.price_range(restaurant_id).await? {
            Some((min, max)) => format!("{} - {}", format_vnd(min), format_vnd(max)),
            None => String::new(),
        };

        Ok(RestaurantDetails {
            id: restaurant.restaurant_id,
            name: restaurant.name,
            address: restaurant.address,
            rating: restaurant.rating,
            opening_hours: restaurant.opening_hours,
            price_range,
            service_charge: self.service_charge,
            categories,
        })
    }

    pub async fn submenus(&self, restaurant_id: i64) -> Result<Vec<SubmenuView>> {
        let submenus = self.catalog.submenus(restaurant_id).await?;
        if submenus.is_empty() {
            return Err(AppError::not_found(format!(
                "Sub-menus not found for restaurant with ID {restaurant_id}"
            )));
        }

        Ok(submenus
            .into_iter()
            .map(|submenu| SubmenuView {
                submenu_id: submenu.submenu_id,
                name: submenu.name,
                display_order: submenu.display_order,
            })
            .collect())
    }

    pub async fn menu(&self, restaurant_id: i64, submenu_id: Option<i64>) -> Result<Vec<MenuItemView>> {
        let items = self.catalog.menu_items(restaurant_id, submenu_id).await?;
        if items.is_empty() {
            return Err(AppError::not_found(format!(
                "Menu items not found for restaurant with ID {restaurant_id}"
            )));
        }

        Ok(items
            .into_iter()
            .map(|item| MenuItemView {
                item_id: item.item_id,
                name: item.name,
                description: item.description,
                price: item.price,
                image_url: item.image_url,
                submenu_id: item.submenu_id,
                submenu_name: item.submenu_name,
            })
            .collect())
    }

    /// Reviews of a restaurant, newest first.
    pub async fn reviews(&self, restaurant_id: i64, query: &PageQuery) -> Result<Paginated<ReviewView>> {
        let params = self.page_params(query)?;
        let (reviews, total) = self
            .catalog
            .reviews(restaurant_id, params.offset(), params.limit)
            .await?;

        let items = reviews
            .into_iter()
            .map(|review| ReviewView {
                id: review.review_id,
                rating: review.rating,
                comment: review.comment,
                created_at: review.created_at,
                user: ReviewAuthor {
                    id: review.user_id,
                    name: format!("{} {}", review.first_name, review.last_name)
                        .trim()
                        .to_string(),
                },
            })
            .collect();

        Ok(Paginated::new(items, total, params))
    }

    pub async fn restaurants_by_category(
        &self,
        category_id: i64,
        query: &PageQuery,
    ) -> Result<RestaurantsByCategory> {
        let params = self.page_params(query)?;
        let (restaurants, total_count) = self
            .catalog
            .restaurants(
                &RestaurantFilter::Category(category_id),
                params.offset(),
                params.limit,
            )
            .await?;

        if restaurants.is_empty() {
            return Err(AppError::not_found(format!(
                "No restaurants found for category ID {category_id}"
            )));
        }

        let category = self
            .catalog
            .food_category(category_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Category with ID {category_id} not found")))?;

        Ok(RestaurantsByCategory {
            category_name: category.name,
            restaurants: restaurants.into_iter().map(RestaurantCard::from).collect(),
            total_count,
            page: params.page,
            limit: params.limit,
        })
    }

    pub async fn food_categories(&self) -> Result<Vec<FoodCategoryView>> {
        Ok(self
            .catalog
            .food_categories()
            .await?
            .into_iter()
            .map(|category| FoodCategoryView {
                id: category.category_id,
                name: category.name,
                icon_url: category.icon_url,
                display_order: category.display_order,
            })
            .collect())
    }

    pub async fn banners(&self) -> Result<Vec<BannerView>> {
        Ok(self
            .catalog
            .banners()
            .await?
            .into_iter()
            .map(|banner| BannerView {
                id: banner.banner_id,
                image_url: banner.image_url,
                title: banner.title,
                description: banner.description,
                link_url: banner.link_url,
            })
            .collect())
    }
}
