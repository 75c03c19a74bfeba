//! SQLite implementation of CartStore.

use async_trait::async_trait;
use sea_query::{Expr, OnConflict, Query, SqliteQueryBuilder};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::{cart_id, cart_lines};
use crate::interfaces::{CartLine, CartStore, Result, StorageError, MAX_LINE_QUANTITY};
use crate::storage::schema::{CartItems, Carts, MenuItems};

const CART_NOT_FOUND: &str = "Cart not found";

fn quantity_too_large() -> StorageError {
    StorageError::Invalid(format!("Quantity must not exceed {MAX_LINE_QUANTITY}"))
}

/// SQLite-backed cart store.
pub struct SqliteCartStore {
    pool: SqlitePool,
}

impl SqliteCartStore {
    /// Create a new SQLite cart store.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Bump `updated_at` of the user's cart.
    ///
    /// Issued as the first statement of every mutating transaction so the
    /// write lock is taken up front. Returns false when there is no cart.
    async fn touch_cart(conn: &mut SqliteConnection, user_id: i64, now: &str) -> Result<bool> {
        let query = Query::update()
            .table(Carts::Table)
            .value(Carts::UpdatedAt, now)
            .and_where(Expr::col(Carts::UserId).eq(user_id))
            .to_string(SqliteQueryBuilder);

        let result = sqlx::query(&query).execute(&mut *conn).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Create the user's cart if missing and return its id.
    async fn ensure_cart(conn: &mut SqliteConnection, user_id: i64, now: &str) -> Result<i64> {
        let query = Query::insert()
            .into_table(Carts::Table)
            .columns([Carts::UserId, Carts::CreatedAt, Carts::UpdatedAt])
            .values_panic([user_id.into(), now.into(), now.into()])
            .on_conflict(
                OnConflict::column(Carts::UserId)
                    .update_column(Carts::UpdatedAt)
                    .to_owned(),
            )
            .to_string(SqliteQueryBuilder);

        sqlx::query(&query).execute(&mut *conn).await?;

        cart_id(conn, user_id)
            .await?
            .ok_or_else(|| StorageError::Corrupt(format!("cart for user {user_id} vanished")))
    }

    async fn ensure_menu_item(conn: &mut SqliteConnection, menu_item_id: i64) -> Result<()> {
        let query = Query::select()
            .column(MenuItems::ItemId)
            .from(MenuItems::Table)
            .and_where(Expr::col(MenuItems::ItemId).eq(menu_item_id))
            .to_string(SqliteQueryBuilder);

        match sqlx::query(&query).fetch_optional(&mut *conn).await? {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(format!(
                "Menu item with ID {menu_item_id} not found"
            ))),
        }
    }

    async fn delete_line(conn: &mut SqliteConnection, cart_id: i64, menu_item_id: i64) -> Result<u64> {
        let query = Query::delete()
            .from_table(CartItems::Table)
            .and_where(Expr::col(CartItems::CartId).eq(cart_id))
            .and_where(Expr::col(CartItems::MenuItemId).eq(menu_item_id))
            .to_string(SqliteQueryBuilder);

        let result = sqlx::query(&query).execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl CartStore for SqliteCartStore {
    async fn lines(&self, user_id: i64) -> Result<Option<Vec<CartLine>>> {
        let mut tx = self.pool.begin().await?;

        let Some(cart_id) = cart_id(&mut tx, user_id).await? else {
            return Ok(None);
        };

        let lines = cart_lines(&mut tx, cart_id).await?;
        tx.commit().await?;

        Ok(Some(lines))
    }

    async fn add_item(&self, user_id: i64, menu_item_id: i64, quantity: i64) -> Result<()> {
        if !(1..=MAX_LINE_QUANTITY).contains(&quantity) {
            return Err(quantity_too_large());
        }

        let now = chrono::Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        let cart_id = Self::ensure_cart(&mut tx, user_id, &now).await?;
        Self::ensure_menu_item(&mut tx, menu_item_id).await?;

        // Increment happens in the database, never read-modify-write.
        // The guard skips the update when the line would pass the cap.
        let query = Query::insert()
            .into_table(CartItems::Table)
            .columns([CartItems::CartId, CartItems::MenuItemId, CartItems::Quantity])
            .values_panic([cart_id.into(), menu_item_id.into(), quantity.into()])
            .on_conflict(
                OnConflict::columns([CartItems::CartId, CartItems::MenuItemId])
                    .value(
                        CartItems::Quantity,
                        Expr::col((CartItems::Table, CartItems::Quantity)).add(quantity),
                    )
                    .action_and_where(
                        Expr::col((CartItems::Table, CartItems::Quantity))
                            .lte(MAX_LINE_QUANTITY - quantity),
                    )
                    .to_owned(),
            )
            .to_string(SqliteQueryBuilder);

        let result = sqlx::query(&query).execute(&mut *tx).await?;
        if result.rows_affected() == 0 {
            return Err(quantity_too_large());
        }
        tx.commit().await?;

        debug!(user_id, menu_item_id, quantity, "cart item added");
        Ok(())
    }

    async fn set_quantity(&self, user_id: i64, menu_item_id: i64, quantity: i64) -> Result<()> {
        if quantity > MAX_LINE_QUANTITY {
            return Err(quantity_too_large());
        }

        let now = chrono::Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        if !Self::touch_cart(&mut tx, user_id, &now).await? {
            return Err(StorageError::NotFound(CART_NOT_FOUND.to_string()));
        }
        let cart_id = cart_id(&mut tx, user_id)
            .await?
            .ok_or_else(|| StorageError::NotFound(CART_NOT_FOUND.to_string()))?;

        if quantity > 0 {
            Self::ensure_menu_item(&mut tx, menu_item_id).await?;

            let query = Query::insert()
                .into_table(CartItems::Table)
                .columns([CartItems::CartId, CartItems::MenuItemId, CartItems::Quantity])
                .values_panic([cart_id.into(), menu_item_id.into(), quantity.into()])
                .on_conflict(
                    OnConflict::columns([CartItems::CartId, CartItems::MenuItemId])
                        .update_column(CartItems::Quantity)
                        .to_owned(),
                )
                .to_string(SqliteQueryBuilder);

            sqlx::query(&query).execute(&mut *tx).await?;
        } else {
            Self::delete_line(&mut tx, cart_id, menu_item_id).await?;
        }

        tx.commit().await?;

        debug!(user_id, menu_item_id, quantity, "cart item quantity set");
        Ok(())
    }

    async fn remove_item(&self, user_id: i64, menu_item_id: i64) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        if !Self::touch_cart(&mut tx, user_id, &now).await? {
            return Err(StorageError::NotFound(CART_NOT_FOUND.to_string()));
        }
        let cart_id = cart_id(&mut tx, user_id)
            .await?
            .ok_or_else(|| StorageError::NotFound(CART_NOT_FOUND.to_string()))?;

        let removed = Self::delete_line(&mut tx, cart_id, menu_item_id).await?;
        tx.commit().await?;

        debug!(user_id, menu_item_id, removed, "cart item removed");
        Ok(())
    }

    async fn clear(&self, user_id: i64) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        if !Self::touch_cart(&mut tx, user_id, &now).await? {
            return Ok(());
        }

        let query = Query::delete()
            .from_table(CartItems::Table)
            .and_where(
                Expr::col(CartItems::CartId).in_subquery(
                    Query::select()
                        .column(Carts::Id)
                        .from(Carts::Table)
                        .and_where(Expr::col(Carts::UserId).eq(user_id))
                        .to_owned(),
                ),
            )
            .to_string(SqliteQueryBuilder);

        let result = sqlx::query(&query).execute(&mut *tx).await?;
        tx.commit().await?;

        debug!(user_id, removed = result.rows_affected(), "cart cleared");
        Ok(())
    }
}
