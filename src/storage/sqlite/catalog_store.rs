//! SQLite implementation of CatalogStore.

use async_trait::async_trait;
use sea_query::{
    Alias, Asterisk, Expr, Func, LikeExpr, Order, Query, SelectStatement, SimpleExpr,
    SqliteQueryBuilder, SubQueryStatement,
};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::interfaces::{
    Banner, CatalogStore, FoodCategory, MenuItem, PaymentMethod, RestaurantFilter, Restaurant,
    Result, ReviewRecord, Submenu,
};
use crate::storage::schema::{
    Banners, FoodCategories, MenuItems, PaymentMethods, RestaurantSubmenus, Restaurants, Reviews,
    Users,
};

const LIKE_ESCAPE: char = '!';

/// SQLite-backed catalog store.
pub struct SqliteCatalogStore {
    pool: SqlitePool,
}

impl SqliteCatalogStore {
    /// Create a new SQLite catalog store.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Restaurant columns plus the image of its lowest-numbered menu item.
    fn select_restaurant() -> SelectStatement {
        let first_image = Query::select()
            .column((MenuItems::Table, MenuItems::ImageUrl))
            .from(MenuItems::Table)
            .and_where(
                Expr::col((MenuItems::Table, MenuItems::RestaurantId))
                    .equals((Restaurants::Table, Restaurants::RestaurantId)),
            )
            .order_by((MenuItems::Table, MenuItems::ItemId), Order::Asc)
            .limit(1)
            .to_owned();

        Query::select()
            .columns([
                (Restaurants::Table, Restaurants::RestaurantId),
                (Restaurants::Table, Restaurants::Name),
                (Restaurants::Table, Restaurants::Address),
                (Restaurants::Table, Restaurants::Rating),
                (Restaurants::Table, Restaurants::CuisineType),
                (Restaurants::Table, Restaurants::OpeningHours),
            ])
            .expr_as(
                SimpleExpr::SubQuery(
                    None,
                    Box::new(SubQueryStatement::SelectStatement(first_image)),
                ),
                Alias::new("image_url"),
            )
            .from(Restaurants::Table)
            .to_owned()
    }

    fn restaurant_from_row(row: &SqliteRow) -> Restaurant {
        Restaurant {
            restaurant_id: row.get("restaurant_id"),
            name: row.get("name"),
            address: row.get("address"),
            rating: row.get("rating"),
            cuisine_type: row.get("cuisine_type"),
            opening_hours: row.get("opening_hours"),
            image_url: row.get("image_url"),
        }
    }

    fn apply_filter(select: &mut SelectStatement, filter: &RestaurantFilter) {
        match filter {
            RestaurantFilter::TopRated | RestaurantFilter::All => {}
            RestaurantFilter::NameContains(needle) => {
                let pattern = format!("%{}%", escape_like(needle));
                select.and_where(
                    Expr::col((Restaurants::Table, Restaurants::Name))
                        .like(LikeExpr::new(pattern).escape(LIKE_ESCAPE)),
                );
            }
            RestaurantFilter::Category(category_id) => {
                select.and_where(
                    Expr::col((Restaurants::Table, Restaurants::RestaurantId)).in_subquery(
                        Query::select()
                            .column(MenuItems::RestaurantId)
                            .from(MenuItems::Table)
                            .and_where(Expr::col(MenuItems::CategoryId).eq(*category_id))
                            .to_owned(),
                    ),
                );
            }
        }
    }

    fn apply_order(select: &mut SelectStatement, filter: &RestaurantFilter) {
        if !matches!(filter, RestaurantFilter::All) {
            select.order_by((Restaurants::Table, Restaurants::Rating), Order::Desc);
        }
        select.order_by((Restaurants::Table, Restaurants::RestaurantId), Order::Asc);
    }

    /// Run a rendered `COUNT(*)` query.
    async fn count(&self, query: &str) -> Result<u64> {
        let total: i64 = sqlx::query(query).fetch_one(&self.pool).await?.get(0);
        Ok(total.max(0) as u64)
    }

    fn menu_item_from_row(row: &SqliteRow) -> MenuItem {
        MenuItem {
            item_id: row.get("item_id"),
            restaurant_id: row.get("restaurant_id"),
            submenu_id: row.get("submenu_id"),
            submenu_name: row.get("submenu_name"),
            category_id: row.get("category_id"),
            name: row.get("name"),
            description: row.get("description"),
            price: row.get("price"),
            image_url: row.get("image_url"),
        }
    }

    fn select_menu_item() -> SelectStatement {
        Query::select()
            .columns([
                (MenuItems::Table, MenuItems::ItemId),
                (MenuItems::Table, MenuItems::RestaurantId),
                (MenuItems::Table, MenuItems::SubmenuId),
                (MenuItems::Table, MenuItems::CategoryId),
                (MenuItems::Table, MenuItems::Name),
                (MenuItems::Table, MenuItems::Description),
                (MenuItems::Table, MenuItems::Price),
                (MenuItems::Table, MenuItems::ImageUrl),
            ])
            .expr_as(
                Expr::col((RestaurantSubmenus::Table, RestaurantSubmenus::Name)),
                Alias::new("submenu_name"),
            )
            .from(MenuItems::Table)
            .left_join(
                RestaurantSubmenus::Table,
                Expr::col((RestaurantSubmenus::Table, RestaurantSubmenus::SubmenuId))
                    .equals((MenuItems::Table, MenuItems::SubmenuId)),
            )
            .to_owned()
    }

    fn category_from_row(row: &SqliteRow) -> FoodCategory {
        FoodCategory {
            category_id: row.get("category_id"),
            name: row.get("name"),
            icon_url: row.get("icon_url"),
            display_order: row.get("display_order"),
        }
    }
}

/// Escape LIKE wildcards so the needle matches literally.
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if c == '%' || c == '_' || c == LIKE_ESCAPE {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl CatalogStore for SqliteCatalogStore {
    async fn banners(&self) -> Result<Vec<Banner>> {
        let query = Query::select()
            .columns([
                Banners::BannerId,
                Banners::ImageUrl,
                Banners::Title,
                Banners::Description,
                Banners::LinkUrl,
            ])
            .from(Banners::Table)
            .order_by(Banners::DisplayOrder, Order::Asc)
            .order_by(Banners::BannerId, Order::Asc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        Ok(rows
            .iter()
            .map(|row| Banner {
                banner_id: row.get("banner_id"),
                image_url: row.get("image_url"),
                title: row.get("title"),
                description: row.get("description"),
                link_url: row.get("link_url"),
            })
            .collect())
    }

    async fn food_categories(&self) -> Result<Vec<FoodCategory>> {
        let query = Query::select()
            .columns([
                FoodCategories::CategoryId,
                FoodCategories::Name,
                FoodCategories::IconUrl,
                FoodCategories::DisplayOrder,
            ])
            .from(FoodCategories::Table)
            .order_by(FoodCategories::DisplayOrder, Order::Asc)
            .order_by(FoodCategories::CategoryId, Order::Asc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(Self::category_from_row).collect())
    }

    async fn food_category(&self, category_id: i64) -> Result<Option<FoodCategory>> {
        let query = Query::select()
            .columns([
                FoodCategories::CategoryId,
                FoodCategories::Name,
                FoodCategories::IconUrl,
                FoodCategories::DisplayOrder,
            ])
            .from(FoodCategories::Table)
            .and_where(Expr::col(FoodCategories::CategoryId).eq(category_id))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;
        Ok(row.as_ref().map(Self::category_from_row))
    }

    async fn restaurants(
        &self,
        filter: &RestaurantFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Restaurant>, u64)> {
        // Statements are rendered before awaiting; they are not Send.
        let count = {
            let mut count = Query::select()
                .expr_as(Func::count(Expr::col(Asterisk)), Alias::new("total"))
                .from(Restaurants::Table)
                .to_owned();
            Self::apply_filter(&mut count, filter);
            count.to_string(SqliteQueryBuilder)
        };
        let query = {
            let mut select = Self::select_restaurant();
            Self::apply_filter(&mut select, filter);
            Self::apply_order(&mut select, filter);
            select
                .limit(limit)
                .offset(offset)
                .to_string(SqliteQueryBuilder)
        };

        let total = self.count(&count).await?;

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        Ok((rows.iter().map(Self::restaurant_from_row).collect(), total))
    }

    async fn restaurant(&self, restaurant_id: i64) -> Result<Option<Restaurant>> {
        let query = Self::select_restaurant()
            .and_where(Expr::col((Restaurants::Table, Restaurants::RestaurantId)).eq(restaurant_id))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;
        Ok(row.as_ref().map(Self::restaurant_from_row))
    }

    async fn submenus(&self, restaurant_id: i64) -> Result<Vec<Submenu>> {
        let query = Query::select()
            .columns([
                RestaurantSubmenus::SubmenuId,
                RestaurantSubmenus::RestaurantId,
                RestaurantSubmenus::Name,
                RestaurantSubmenus::DisplayOrder,
            ])
            .from(RestaurantSubmenus::Table)
            .and_where(Expr::col(RestaurantSubmenus::RestaurantId).eq(restaurant_id))
            .order_by(RestaurantSubmenus::DisplayOrder, Order::Asc)
            .order_by(RestaurantSubmenus::SubmenuId, Order::Asc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        Ok(rows
            .iter()
            .map(|row| Submenu {
                submenu_id: row.get("submenu_id"),
                restaurant_id: row.get("restaurant_id"),
                name: row.get("name"),
                display_order: row.get("display_order"),
            })
            .collect())
    }

    async fn menu_items(
        &self,
        restaurant_id: i64,
        submenu_id: Option<i64>,
    ) -> Result<Vec<MenuItem>> {
        let query = {
            let mut select = Self::select_menu_item();
            select.and_where(Expr::col((MenuItems::Table, MenuItems::RestaurantId)).eq(restaurant_id));
            if let Some(submenu_id) = submenu_id {
                select.and_where(Expr::col((MenuItems::Table, MenuItems::SubmenuId)).eq(submenu_id));
            }
            select
                .order_by((MenuItems::Table, MenuItems::ItemId), Order::Asc)
                .to_string(SqliteQueryBuilder)
        };

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(Self::menu_item_from_row).collect())
    }

    async fn menu_item(&self, item_id: i64) -> Result<Option<MenuItem>> {
        let query = Self::select_menu_item()
            .and_where(Expr::col((MenuItems::Table, MenuItems::ItemId)).eq(item_id))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;
        Ok(row.as_ref().map(Self::menu_item_from_row))
    }

    async fn price_range(&self, restaurant_id: i64) -> Result<Option<(i64, i64)>> {
        let query = Query::select()
            .expr_as(Func::min(Expr::col(MenuItems::Price)), Alias::new("min_price"))
            .expr_as(Func::max(Expr::col(MenuItems::Price)), Alias::new("max_price"))
            .from(MenuItems::Table)
            .and_where(Expr::col(MenuItems::RestaurantId).eq(restaurant_id))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_one(&self.pool).await?;
        let min: Option<i64> = row.get("min_price");
        let max: Option<i64> = row.get("max_price");

        Ok(min.zip(max))
    }

    async fn reviews(
        &self,
        restaurant_id: i64,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<ReviewRecord>, u64)> {
        let count = Query::select()
            .expr_as(Func::count(Expr::col(Asterisk)), Alias::new("total"))
            .from(Reviews::Table)
            .and_where(Expr::col(Reviews::RestaurantId).eq(restaurant_id))
            .to_string(SqliteQueryBuilder);
        let total = self.count(&count).await?;

        let query = Query::select()
            .columns([
                (Reviews::Table, Reviews::ReviewId),
                (Reviews::Table, Reviews::Rating),
                (Reviews::Table, Reviews::Comment),
                (Reviews::Table, Reviews::CreatedAt),
                (Reviews::Table, Reviews::UserId),
            ])
            .columns([
                (Users::Table, Users::FirstName),
                (Users::Table, Users::LastName),
            ])
            .from(Reviews::Table)
            .inner_join(
                Users::Table,
                Expr::col((Users::Table, Users::UserId)).equals((Reviews::Table, Reviews::UserId)),
            )
            .and_where(Expr::col((Reviews::Table, Reviews::RestaurantId)).eq(restaurant_id))
            .order_by((Reviews::Table, Reviews::CreatedAt), Order::Desc)
            .order_by((Reviews::Table, Reviews::ReviewId), Order::Desc)
            .limit(limit)
            .offset(offset)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        let reviews = rows
            .iter()
            .map(|row| ReviewRecord {
                review_id: row.get("review_id"),
                rating: row.get("rating"),
                comment: row.get("comment"),
                created_at: row.get("created_at"),
                user_id: row.get("user_id"),
                first_name: row.get("first_name"),
                last_name: row.get("last_name"),
            })
            .collect();

        Ok((reviews, total))
    }

    async fn payment_methods(&self) -> Result<Vec<PaymentMethod>> {
        let query = Query::select()
            .columns([PaymentMethods::PaymentMethodId, PaymentMethods::Name])
            .from(PaymentMethods::Table)
            .order_by(PaymentMethods::PaymentMethodId, Order::Asc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        Ok(rows
            .iter()
            .map(|row| PaymentMethod {
                payment_method_id: row.get("payment_method_id"),
                name: row.get("name"),
            })
            .collect())
    }
}
