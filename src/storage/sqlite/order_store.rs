//! SQLite implementation of OrderStore.

use async_trait::async_trait;
use sea_query::{Alias, Expr, Order, Query, SqliteQueryBuilder};
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::info;

use super::{cart_id, cart_lines};
use crate::interfaces::{
    CartLine, NewOrder, NewOrderLine, OrderDetailsRecord, OrderLineRecord, OrderStatusRecord,
    OrderStore, PlacedOrder, Result, StorageError,
};
use crate::storage::schema::{
    CartItems, Carts, MenuItems, OrderItems, OrderPayments, Orders, PaymentMethods, Restaurants,
    Users,
};

const CART_CHANGED: &str = "Cart changed during checkout";

/// Same items, quantities and prices, in cart order.
fn matches_snapshot(current: &[CartLine], snapshot: &[NewOrderLine]) -> bool {
    current.len() == snapshot.len()
        && current.iter().zip(snapshot).all(|(line, ordered)| {
            line.menu_item_id == ordered.item_id
                && line.quantity == ordered.quantity
                && line.price == ordered.price
        })
}

/// SQLite-backed order store.
pub struct SqliteOrderStore {
    pool: SqlitePool,
}

impl SqliteOrderStore {
    /// Create a new SQLite order store.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Check the cart against the snapshot, empty it, then write order,
    /// lines and payment on an open transaction.
    async fn write_order(conn: &mut SqliteConnection, order: &NewOrder) -> Result<i64> {
        // Touching the cart first takes the write lock before any read.
        let touch_cart = Query::update()
            .table(Carts::Table)
            .value(Carts::UpdatedAt, order.created_at.as_str())
            .and_where(Expr::col(Carts::UserId).eq(order.user_id))
            .to_string(SqliteQueryBuilder);

        sqlx::query(&touch_cart).execute(&mut *conn).await?;

        let cart_id = cart_id(conn, order.user_id)
            .await?
            .ok_or_else(|| StorageError::NotFound("Cart not found".to_string()))?;

        let current = cart_lines(conn, cart_id).await?;
        if !matches_snapshot(&current, &order.lines) {
            return Err(StorageError::Conflict(CART_CHANGED.to_string()));
        }

        let clear_cart = Query::delete()
            .from_table(CartItems::Table)
            .and_where(Expr::col(CartItems::CartId).eq(cart_id))
            .to_string(SqliteQueryBuilder);

        sqlx::query(&clear_cart).execute(&mut *conn).await?;

        // The user's current address becomes the delivery address.
        let address_query = Query::select()
            .column(Users::Address)
            .from(Users::Table)
            .and_where(Expr::col(Users::UserId).eq(order.user_id))
            .to_string(SqliteQueryBuilder);

        let delivery_address: Option<String> = sqlx::query(&address_query)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| StorageError::NotFound("User not found".to_string()))?
            .get(0);

        let insert_order = Query::insert()
            .into_table(Orders::Table)
            .columns([
                Orders::UserId,
                Orders::RestaurantId,
                Orders::TotalAmount,
                Orders::Status,
                Orders::DeliveryAddress,
                Orders::DeliveryInstructions,
                Orders::CreatedAt,
                Orders::UpdatedAt,
            ])
            .values_panic([
                order.user_id.into(),
                order.restaurant_id.into(),
                order.total_amount.into(),
                order.status.as_str().into(),
                delivery_address.into(),
                order.delivery_instructions.clone().into(),
                order.created_at.as_str().into(),
                order.created_at.as_str().into(),
            ])
            .to_string(SqliteQueryBuilder);

        let order_id = sqlx::query(&insert_order)
            .execute(&mut *conn)
            .await?
            .last_insert_rowid();

        if !order.lines.is_empty() {
            let insert_items = {
                let mut insert = Query::insert();
                insert.into_table(OrderItems::Table).columns([
                    OrderItems::OrderId,
                    OrderItems::ItemId,
                    OrderItems::Quantity,
                    OrderItems::Price,
                ]);
                for line in &order.lines {
                    insert.values_panic([
                        order_id.into(),
                        line.item_id.into(),
                        line.quantity.into(),
                        line.price.into(),
                    ]);
                }
                insert.to_string(SqliteQueryBuilder)
            };
            sqlx::query(&insert_items).execute(&mut *conn).await?;
        }

        let insert_payment = Query::insert()
            .into_table(OrderPayments::Table)
            .columns([
                OrderPayments::OrderId,
                OrderPayments::PaymentMethodId,
                OrderPayments::Amount,
                OrderPayments::Status,
                OrderPayments::CreatedAt,
            ])
            .values_panic([
                order_id.into(),
                order.payment_method_id.into(),
                order.total_amount.into(),
                order.payment_status.as_str().into(),
                order.created_at.as_str().into(),
            ])
            .to_string(SqliteQueryBuilder);

        sqlx::query(&insert_payment).execute(&mut *conn).await?;

        Ok(order_id)
    }

    async fn order_lines(conn: &mut SqliteConnection, order_id: i64) -> Result<Vec<OrderLineRecord>> {
        let query = Query::select()
            .columns([
                (OrderItems::Table, OrderItems::ItemId),
                (OrderItems::Table, OrderItems::Quantity),
                (OrderItems::Table, OrderItems::Price),
            ])
            .column((MenuItems::Table, MenuItems::Name))
            .from(OrderItems::Table)
            .inner_join(
                MenuItems::Table,
                Expr::col((MenuItems::Table, MenuItems::ItemId))
                    .equals((OrderItems::Table, OrderItems::ItemId)),
            )
            .and_where(Expr::col((OrderItems::Table, OrderItems::OrderId)).eq(order_id))
            .order_by((OrderItems::Table, OrderItems::OrderItemId), Order::Asc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&mut *conn).await?;

        Ok(rows
            .iter()
            .map(|row| OrderLineRecord {
                item_id: row.get("item_id"),
                name: row.get("name"),
                quantity: row.get("quantity"),
                price: row.get("price"),
            })
            .collect())
    }

    /// Name of the payment method of the first payment of an order.
    async fn payment_method_name(conn: &mut SqliteConnection, order_id: i64) -> Result<Option<String>> {
        let query = Query::select()
            .column((PaymentMethods::Table, PaymentMethods::Name))
            .from(OrderPayments::Table)
            .inner_join(
                PaymentMethods::Table,
                Expr::col((PaymentMethods::Table, PaymentMethods::PaymentMethodId))
                    .equals((OrderPayments::Table, OrderPayments::PaymentMethodId)),
            )
            .and_where(Expr::col((OrderPayments::Table, OrderPayments::OrderId)).eq(order_id))
            .order_by((OrderPayments::Table, OrderPayments::PaymentId), Order::Asc)
            .limit(1)
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&mut *conn).await?;
        Ok(row.map(|r| r.get(0)))
    }
}

#[async_trait]
impl OrderStore for SqliteOrderStore {
    async fn place_order(&self, order: NewOrder) -> Result<PlacedOrder> {
        let mut tx = self.pool.begin().await?;

        // Dropping the transaction on error rolls back every write,
        // including the cart deletion.
        let order_id = Self::write_order(&mut tx, &order).await?;
        tx.commit().await?;

        info!(
            order_id,
            user_id = order.user_id,
            restaurant_id = order.restaurant_id,
            total_amount = order.total_amount,
            lines = order.lines.len(),
            "order placed"
        );

        Ok(PlacedOrder {
            order_id,
            status: order.status,
            total_amount: order.total_amount,
            created_at: order.created_at,
            restaurant_id: order.restaurant_id,
        })
    }

    async fn details(&self, order_id: i64) -> Result<Option<OrderDetailsRecord>> {
        let mut tx = self.pool.begin().await?;

        let query = Query::select()
            .columns([
                (Orders::Table, Orders::OrderId),
                (Orders::Table, Orders::UserId),
                (Orders::Table, Orders::Status),
                (Orders::Table, Orders::TotalAmount),
                (Orders::Table, Orders::DeliveryAddress),
                (Orders::Table, Orders::DeliveryInstructions),
                (Orders::Table, Orders::CreatedAt),
            ])
            .expr_as(
                Expr::col((Restaurants::Table, Restaurants::Name)),
                Alias::new("restaurant_name"),
            )
            .columns([
                (Users::Table, Users::FirstName),
                (Users::Table, Users::LastName),
                (Users::Table, Users::PhoneNumber),
            ])
            .from(Orders::Table)
            .left_join(
                Restaurants::Table,
                Expr::col((Restaurants::Table, Restaurants::RestaurantId))
                    .equals((Orders::Table, Orders::RestaurantId)),
            )
            .left_join(
                Users::Table,
                Expr::col((Users::Table, Users::UserId)).equals((Orders::Table, Orders::UserId)),
            )
            .and_where(Expr::col((Orders::Table, Orders::OrderId)).eq(order_id))
            .to_string(SqliteQueryBuilder);

        let Some(row) = sqlx::query(&query).fetch_optional(&mut *tx).await? else {
            return Ok(None);
        };

        let items = Self::order_lines(&mut tx, order_id).await?;
        let payment_method = Self::payment_method_name(&mut tx, order_id).await?;
        tx.commit().await?;

        Ok(Some(OrderDetailsRecord {
            order_id: row.get("order_id"),
            user_id: row.get("user_id"),
            status: row.get("status"),
            restaurant_name: row.get("restaurant_name"),
            total_amount: row.get("total_amount"),
            payment_method,
            first_name: row.get("first_name"),
            last_name: row.get("last_name"),
            phone_number: row.get("phone_number"),
            delivery_address: row.get("delivery_address"),
            delivery_instructions: row.get("delivery_instructions"),
            created_at: row.get("created_at"),
            items,
        }))
    }

    async fn status(&self, order_id: i64) -> Result<Option<String>> {
        let query = Query::select()
            .column(Orders::Status)
            .from(Orders::Table)
            .and_where(Expr::col(Orders::OrderId).eq(order_id))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;
        Ok(row.map(|r| r.get(0)))
    }

    async fn update_status(
        &self,
        order_id: i64,
        status: &str,
        updated_at: &str,
    ) -> Result<OrderStatusRecord> {
        let query = Query::update()
            .table(Orders::Table)
            .values([
                (Orders::Status, status.into()),
                (Orders::UpdatedAt, updated_at.into()),
            ])
            .and_where(Expr::col(Orders::OrderId).eq(order_id))
            .to_string(SqliteQueryBuilder);

        let result = sqlx::query(&query).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound("Order not found".to_string()));
        }

        info!(order_id, status, "order status updated");

        Ok(OrderStatusRecord {
            order_id,
            status: status.to_string(),
            updated_at: updated_at.to_string(),
        })
    }
}
