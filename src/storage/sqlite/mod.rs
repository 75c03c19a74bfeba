//! SQLite implementations of storage interfaces.

mod cart_store;
mod catalog_store;
mod order_store;
mod user_store;


pub use cart_store::SqliteCartStore;
pub use catalog_store::SqliteCatalogStore;
pub use order_store::SqliteOrderStore;
pub use user_store::SqliteUserStore;

use sea_query::{Expr, Order, Query, SqliteQueryBuilder};
use sqlx::{Row, SqliteConnection};

use crate::interfaces::CartLine;
use crate::storage::schema::{CartItems, Carts, MenuItems};

/// Look up the cart id of a user inside an open transaction.
async fn cart_id(conn: &mut SqliteConnection, user_id: i64) -> sqlx::Result<Option<i64>> {
    let query = Query::select()
        .column(Carts::Id)
        .from(Carts::Table)
        .and_where(Expr::col(Carts::UserId).eq(user_id))
        .to_string(SqliteQueryBuilder);

    let row = sqlx::query(&query).fetch_optional(&mut *conn).await?;
    Ok(row.map(|r| r.get(0)))
}

/// Lines of a cart joined with their menu items, oldest line first.
async fn cart_lines(conn: &mut SqliteConnection, cart_id: i64) -> sqlx::Result<Vec<CartLine>> {
    let query = Query::select()
        .column((CartItems::Table, CartItems::MenuItemId))
        .column((CartItems::Table, CartItems::Quantity))
        .columns([
            (MenuItems::Table, MenuItems::Name),
            (MenuItems::Table, MenuItems::Price),
            (MenuItems::Table, MenuItems::ImageUrl),
            (MenuItems::Table, MenuItems::RestaurantId),
        ])
        .from(CartItems::Table)
        .inner_join(
            MenuItems::Table,
            Expr::col((MenuItems::Table, MenuItems::ItemId))
                .equals((CartItems::Table, CartItems::MenuItemId)),
        )
        .and_where(Expr::col((CartItems::Table, CartItems::CartId)).eq(cart_id))
        .order_by((CartItems::Table, CartItems::Id), Order::Asc)
        .to_string(SqliteQueryBuilder);

    let rows = sqlx::query(&query).fetch_all(&mut *conn).await?;

    rows.iter()
        .map(|row| {
            Ok::<_, sqlx::Error>(CartLine {
                menu_item_id: row.try_get("menu_item_id")?,
                name: row.try_get("name")?,
                price: row.try_get("price")?,
                quantity: row.try_get("quantity")?,
                image_url: row.try_get("image_url")?,
                restaurant_id: row.try_get("restaurant_id")?,
            })
        })
        .collect()
}

/// True when the error is a UNIQUE constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
