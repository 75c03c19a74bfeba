//! Checkout orchestrator.
//!
//! Projects the cart into an order summary and turns it into a persisted
//! order. The order write, its lines, its payment and the cart clear commit
//! together or not at all. The cart is only cleared when it still holds
//! exactly the lines that were ordered.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::cart::{checked_sum, line_subtotal};
use super::orders::OrderStatus;
use crate::error::{AppError, Result};
use crate::interfaces::{
    CartLine, CartStore, CatalogStore, NewOrder, NewOrderLine, OrderStore, PaymentMethod,
    StorageError, UserStore,
};

/// Status of a payment row at creation.
pub const PAYMENT_PENDING: &str = "PENDING";

/// Times a checkout is tried when the cart keeps changing underneath it.
pub const CHECKOUT_ATTEMPTS: u32 = 3;

/// Computes the discount for a cart subtotal.
///
/// Applying or removing a voucher goes through this seam; only
/// [`NoDiscount`] exists today.
pub trait VoucherPolicy: Send + Sync {
    fn discount(&self, subtotal: i64) -> i64;
}

/// Never discounts anything.
pub struct NoDiscount;

impl VoucherPolicy for NoDiscount {
    fn discount(&self, _subtotal: i64) -> i64 {
        0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeliveryOption {
    pub option_id: &'static str,
    pub name: &'static str,
}

pub const DELIVERY_OPTIONS: [DeliveryOption; 2] = [
    DeliveryOption {
        option_id: "standard",
        name: "Standard Delivery (15-30 minutes)",
    },
    DeliveryOption {
        option_id: "express",
        name: "Express Delivery (10-15 minutes)",
    },
];

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryOptions {
    pub options: Vec<DeliveryOption>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentMethods {
    pub methods: Vec<PaymentMethodView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentMethodView {
    pub payment_method_id: i64,
    pub name: String,
}

impl From<PaymentMethod> for PaymentMethodView {
    fn from(method: PaymentMethod) -> Self {
        Self {
            payment_method_id: method.payment_method_id,
            name: method.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryItem {
    pub item_id: i64,
    pub name: String,
    pub price: i64,
    pub quantity: i64,
    pub subtotal: i64,
    pub image_url: String,
}

/// Recomputed-on-read projection of the cart plus fee and discount.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderSummary {
    pub items: Vec<SummaryItem>,
    pub subtotal: i64,
    pub delivery_fee: i64,
    pub voucher_discount: i64,
    pub total_amount: i64,
}

/// Returned by a successful checkout.
#[derive(Debug, Clone, Serialize)]
pub struct OrderConfirmation {
    pub order_id: i64,
    pub status: String,
    pub total_amount: i64,
    pub created_at: String,
    pub restaurant_id: i64,
}

pub struct CheckoutService {
    carts: Arc<dyn CartStore>,
    orders: Arc<dyn OrderStore>,
    users: Arc<dyn UserStore>,
    catalog: Arc<dyn CatalogStore>,
    voucher_policy: Arc<dyn VoucherPolicy>,
    delivery_fee: i64,
}

impl CheckoutService {
    pub fn new(
        carts: Arc<dyn CartStore>,
        orders: Arc<dyn OrderStore>,
        users: Arc<dyn UserStore>,
        catalog: Arc<dyn CatalogStore>,
        delivery_fee: i64,
    ) -> Self {
        Self::with_voucher_policy(carts, orders, users, catalog, delivery_fee, Arc::new(NoDiscount))
    }

    pub fn with_voucher_policy(
        carts: Arc<dyn CartStore>,
        orders: Arc<dyn OrderStore>,
        users: Arc<dyn UserStore>,
        catalog: Arc<dyn CatalogStore>,
        delivery_fee: i64,
        voucher_policy: Arc<dyn VoucherPolicy>,
    ) -> Self {
        Self {
            carts,
            orders,
            users,
            catalog,
            voucher_policy,
            delivery_fee,
        }
    }

    fn summarize(&self, lines: &[CartLine]) -> Result<OrderSummary> {
        let items = lines
            .iter()
            .map(|line| {
                Ok(SummaryItem {
                    item_id: line.menu_item_id,
                    name: line.name.clone(),
                    price: line.price,
                    quantity: line.quantity,
                    subtotal: line_subtotal(line.price, line.quantity)?,
                    image_url: line.image_url.clone().unwrap_or_default(),
                })
            })
            .collect::<Result<Vec<SummaryItem>>>()?;

        let subtotal = checked_sum(items.iter().map(|item| item.subtotal))?;
        let voucher_discount = self.voucher_policy.discount(subtotal);
        let total_amount = checked_sum([subtotal, self.delivery_fee])?
            .checked_sub(voucher_discount)
            .ok_or_else(|| AppError::validation("Cart amount is too large"))?;

        Ok(OrderSummary {
            items,
            subtotal,
            delivery_fee: self.delivery_fee,
            voucher_discount,
            total_amount,
        })
    }

    async fn cart_lines(&self, user_id: i64) -> Result<Vec<CartLine>> {
        self.carts
            .lines(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Cart not found"))
    }

    pub async fn get_order_summary(&self, user_id: i64) -> Result<OrderSummary> {
        let lines = self.cart_lines(user_id).await?;
        self.summarize(&lines)
    }

    /// Overwrite the user's stored address and phone.
    pub async fn set_delivery_address(&self, user_id: i64, address: &str, phone_number: &str) -> Result<()> {
        let address = address.trim();
        let phone_number = phone_number.trim();
        if address.is_empty() {
            return Err(AppError::validation("Address is required"));
        }
        if phone_number.is_empty() {
            return Err(AppError::validation("Phone number is required"));
        }

        self.users
            .update_contact(user_id, address, phone_number)
            .await?;
        info!(user_id, "delivery address set");
        Ok(())
    }

    pub async fn apply_voucher(&self, user_id: i64, code: &str) -> Result<OrderSummary> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AppError::validation("Voucher code is required"));
        }

        info!(user_id, code, "voucher application requested");
        self.get_order_summary(user_id).await
    }

    pub async fn remove_voucher(&self, user_id: i64) -> Result<OrderSummary> {
        info!(user_id, "voucher removal requested");
        self.get_order_summary(user_id).await
    }

    pub fn delivery_options(&self) -> DeliveryOptions {
        DeliveryOptions {
            options: DELIVERY_OPTIONS.to_vec(),
        }
    }

    pub async fn set_delivery_option(&self, user_id: i64, option_id: &str) -> Result<OrderSummary> {
        let option = DELIVERY_OPTIONS
            .iter()
            .find(|option| option.option_id == option_id)
            .ok_or_else(|| AppError::validation(format!("Unknown delivery option: {option_id}")))?;

        info!(user_id, option_id = option.option_id, "delivery option selected");
        self.get_order_summary(user_id).await
    }

    pub async fn payment_methods(&self) -> Result<PaymentMethods> {
        let methods = self.catalog.payment_methods().await?;
        Ok(PaymentMethods {
            methods: methods.into_iter().map(PaymentMethodView::from).collect(),
        })
    }

    /// Turn the cart into an order.
    ///
    /// The order belongs to the restaurant of the first cart line. When the
    /// cart changes between the read and the write, the cart is read again
    /// and the order rebuilt, up to [`CHECKOUT_ATTEMPTS`] times.
    pub async fn place_order(
        &self,
        user_id: i64,
        payment_method_id: i64,
        delivery_instructions: Option<String>,
    ) -> Result<OrderConfirmation> {
        if payment_method_id < 1 {
            return Err(AppError::validation("payment_method_id must be a positive integer"));
        }

        let delivery_instructions = delivery_instructions
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        let mut attempt = 1;
        let placed = loop {
            let order = self
                .build_order(user_id, payment_method_id, delivery_instructions.clone())
                .await?;

            match self.orders.place_order(order).await {
                Ok(placed) => break placed,
                Err(StorageError::Conflict(reason)) if attempt < CHECKOUT_ATTEMPTS => {
                    warn!(user_id, attempt, %reason, "retrying checkout");
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        };

        Ok(OrderConfirmation {
            order_id: placed.order_id,
            status: placed.status,
            total_amount: placed.total_amount,
            created_at: placed.created_at,
            restaurant_id: placed.restaurant_id,
        })
    }

    /// Snapshot the current cart into an order ready to write.
    async fn build_order(
        &self,
        user_id: i64,
        payment_method_id: i64,
        delivery_instructions: Option<String>,
    ) -> Result<NewOrder> {
        let lines = self.cart_lines(user_id).await?;
        if lines.is_empty() {
            return Err(AppError::not_found("Cart is empty"));
        }

        let restaurant_id = lines[0]
            .restaurant_id
            .ok_or_else(|| AppError::not_found("Restaurant not found for cart items"))?;

        if lines.iter().any(|line| line.restaurant_id != Some(restaurant_id)) {
            warn!(
                user_id,
                restaurant_id, "cart spans several restaurants, attributing order to the first"
            );
        }

        let summary = self.summarize(&lines)?;

        Ok(NewOrder {
            user_id,
            restaurant_id,
            total_amount: summary.total_amount,
            status: OrderStatus::Pending.as_str().to_string(),
            payment_method_id,
            payment_status: PAYMENT_PENDING.to_string(),
            delivery_instructions,
            lines: lines
                .iter()
                .map(|line| NewOrderLine {
                    item_id: line.menu_item_id,
                    quantity: line.quantity,
                    price: line.price,
                })
                .collect(),
            created_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::interfaces::{
        OrderDetailsRecord, OrderStatusRecord, PlacedOrder, Result as StoreResult,
    };
    use crate::storage::Stores;
    use crate::test_utils::{count_rows, memory_stores, seed_catalog, seed_user, Fixture};

    fn service(stores: &Stores) -> CheckoutService {
        CheckoutService::new(
            stores.carts.clone(),
            stores.orders.clone(),
            stores.users.clone(),
            stores.catalog.clone(),
            38_000,
        )
    }

    async fn fill_cart(stores: &Stores, user_id: i64, fixture: &Fixture) {
        stores.carts.add_item(user_id, fixture.item_a, 2).await.unwrap();
        stores.carts.add_item(user_id, fixture.item_b, 1).await.unwrap();
    }

    #[tokio::test]
    async fn test_summary_totals() {
        let (pool, stores) = memory_stores().await;
        let fixture = seed_catalog(&pool).await;
        let user_id = seed_user(&pool, "a@example.com").await;
        fill_cart(&stores, user_id, &fixture).await;

        let summary = service(&stores).get_order_summary(user_id).await.unwrap();
        assert_eq!(summary.subtotal, 130_000);
        assert_eq!(summary.delivery_fee, 38_000);
        assert_eq!(summary.voucher_discount, 0);
        assert_eq!(summary.total_amount, 168_000);
        assert_eq!(summary.items.len(), 2);
        assert_eq!(summary.items[0].subtotal, 100_000);
    }

    #[tokio::test]
    async fn test_summary_fails_instead_of_overflowing() {
        let (_pool, stores) = memory_stores().await;
        let line = CartLine {
            menu_item_id: 1,
            name: "Gold Leaf Pho".to_string(),
            price: i64::MAX - 10_000,
            quantity: 1,
            image_url: None,
            restaurant_id: Some(1),
        };

        // Subtotal fits but the delivery fee pushes the total over.
        assert!(matches!(
            service(&stores).summarize(&[line]),
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_summary_without_cart_is_not_found() {
        let (pool, stores) = memory_stores().await;
        let user_id = seed_user(&pool, "a@example.com").await;

        assert!(matches!(
            service(&stores).get_order_summary(user_id).await,
            Err(AppError::NotFound(_))
        ));
    }

    struct TenPercent;

    impl VoucherPolicy for TenPercent {
        fn discount(&self, subtotal: i64) -> i64 {
            subtotal / 10
        }
    }

    #[tokio::test]
    async fn test_voucher_policy_is_pluggable() {
        let (pool, stores) = memory_stores().await;
        let fixture = seed_catalog(&pool).await;
        let user_id = seed_user(&pool, "a@example.com").await;
        fill_cart(&stores, user_id, &fixture).await;

        let service = CheckoutService::with_voucher_policy(
            stores.carts.clone(),
            stores.orders.clone(),
            stores.users.clone(),
            stores.catalog.clone(),
            38_000,
            Arc::new(TenPercent),
        );
        let summary = service.get_order_summary(user_id).await.unwrap();
        assert_eq!(summary.voucher_discount, 13_000);
        assert_eq!(summary.total_amount, 155_000);
    }

    #[tokio::test]
    async fn test_voucher_and_delivery_option_leave_summary_unchanged() {
        let (pool, stores) = memory_stores().await;
        let fixture = seed_catalog(&pool).await;
        let user_id = seed_user(&pool, "a@example.com").await;
        fill_cart(&stores, user_id, &fixture).await;
        let service = service(&stores);

        let before = service.get_order_summary(user_id).await.unwrap();
        assert_eq!(service.apply_voucher(user_id, "FREESHIP").await.unwrap(), before);
        assert_eq!(service.remove_voucher(user_id).await.unwrap(), before);
        assert_eq!(service.set_delivery_option(user_id, "express").await.unwrap(), before);

        assert!(matches!(
            service.set_delivery_option(user_id, "drone").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.apply_voucher(user_id, "  ").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_place_order_snapshots_cart() {
        let (pool, stores) = memory_stores().await;
        let fixture = seed_catalog(&pool).await;
        let user_id = seed_user(&pool, "a@example.com").await;
        fill_cart(&stores, user_id, &fixture).await;
        let service = service(&stores);

        let confirmation = service
            .place_order(user_id, 1, Some("  Leave at the door ".to_string()))
            .await
            .unwrap();
        assert_eq!(confirmation.status, "PENDING");
        assert_eq!(confirmation.total_amount, 168_000);
        assert_eq!(confirmation.restaurant_id, fixture.restaurant_id);

        let details = stores
            .orders
            .details(confirmation.order_id)
            .await
            .unwrap()
            .unwrap();
        let snapshot: Vec<_> = details
            .items
            .iter()
            .map(|item| (item.item_id, item.quantity, item.price))
            .collect();
        assert_eq!(
            snapshot,
            [(fixture.item_a, 2, 50_000), (fixture.item_b, 1, 30_000)]
        );
        assert_eq!(details.delivery_instructions.as_deref(), Some("Leave at the door"));

        let cart = stores.carts.lines(user_id).await.unwrap().unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_two_checkouts_create_two_orders() {
        let (pool, stores) = memory_stores().await;
        let fixture = seed_catalog(&pool).await;
        let user_id = seed_user(&pool, "a@example.com").await;
        let service = service(&stores);

        fill_cart(&stores, user_id, &fixture).await;
        let first = service.place_order(user_id, 1, None).await.unwrap();

        stores.carts.add_item(user_id, fixture.item_b, 3).await.unwrap();
        let second = service.place_order(user_id, 2, None).await.unwrap();

        assert_ne!(first.order_id, second.order_id);
        assert_eq!(second.total_amount, 3 * 30_000 + 38_000);
        assert_eq!(count_rows(&pool, "orders").await, 2);
        assert_eq!(count_rows(&pool, "order_items").await, 3);
        assert_eq!(count_rows(&pool, "order_payments").await, 2);

        let details = stores.orders.details(second.order_id).await.unwrap().unwrap();
        assert_eq!(details.items.len(), 1);
        assert_eq!(details.items[0].quantity, 3);
        assert!(stores.carts.lines(user_id).await.unwrap().unwrap().is_empty());
    }

    /// Adds one unit of an item to the cart before each of the first
    /// `remaining` writes, as a concurrent request would.
    struct CartChangesBeforeWrite {
        inner: Arc<dyn OrderStore>,
        carts: Arc<dyn CartStore>,
        item_id: i64,
        remaining: AtomicU32,
    }

    #[async_trait]
    impl OrderStore for CartChangesBeforeWrite {
        async fn place_order(&self, order: NewOrder) -> StoreResult<PlacedOrder> {
            let left = self.remaining.load(Ordering::SeqCst);
            if left > 0 {
                self.remaining.store(left - 1, Ordering::SeqCst);
                self.carts.add_item(order.user_id, self.item_id, 1).await?;
            }
            self.inner.place_order(order).await
        }

        async fn details(&self, order_id: i64) -> StoreResult<Option<OrderDetailsRecord>> {
            self.inner.details(order_id).await
        }

        async fn status(&self, order_id: i64) -> StoreResult<Option<String>> {
            self.inner.status(order_id).await
        }

        async fn update_status(
            &self,
            order_id: i64,
            status: &str,
            updated_at: &str,
        ) -> StoreResult<OrderStatusRecord> {
            self.inner.update_status(order_id, status, updated_at).await
        }
    }

    fn racing_service(stores: &Stores, item_id: i64, changes: u32) -> CheckoutService {
        let orders = CartChangesBeforeWrite {
            inner: stores.orders.clone(),
            carts: stores.carts.clone(),
            item_id,
            remaining: AtomicU32::new(changes),
        };
        CheckoutService::new(
            stores.carts.clone(),
            Arc::new(orders),
            stores.users.clone(),
            stores.catalog.clone(),
            38_000,
        )
    }

    #[tokio::test]
    async fn test_item_added_during_checkout_is_not_lost() {
        let (pool, stores) = memory_stores().await;
        let fixture = seed_catalog(&pool).await;
        let user_id = seed_user(&pool, "a@example.com").await;
        stores.carts.add_item(user_id, fixture.item_a, 2).await.unwrap();

        let service = racing_service(&stores, fixture.item_b, 1);
        let confirmation = service.place_order(user_id, 1, None).await.unwrap();

        // The retry picked up the late line instead of deleting it unordered.
        assert_eq!(confirmation.total_amount, 168_000);
        let details = stores
            .orders
            .details(confirmation.order_id)
            .await
            .unwrap()
            .unwrap();
        let ordered: Vec<_> = details.items.iter().map(|i| (i.item_id, i.quantity)).collect();
        assert_eq!(ordered, [(fixture.item_a, 2), (fixture.item_b, 1)]);
        assert_eq!(count_rows(&pool, "orders").await, 1);
        assert!(stores.carts.lines(user_id).await.unwrap().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cart_that_keeps_changing_is_a_conflict() {
        let (pool, stores) = memory_stores().await;
        let fixture = seed_catalog(&pool).await;
        let user_id = seed_user(&pool, "a@example.com").await;
        stores.carts.add_item(user_id, fixture.item_a, 2).await.unwrap();

        let service = racing_service(&stores, fixture.item_a, CHECKOUT_ATTEMPTS);
        assert!(matches!(
            service.place_order(user_id, 1, None).await,
            Err(AppError::Conflict(_))
        ));

        assert_eq!(count_rows(&pool, "orders").await, 0);
        let lines = stores.carts.lines(user_id).await.unwrap().unwrap();
        assert_eq!(lines[0].quantity, 2 + CHECKOUT_ATTEMPTS as i64);
    }

    #[tokio::test]
    async fn test_place_order_on_empty_or_missing_cart() {
        let (pool, stores) = memory_stores().await;
        let fixture = seed_catalog(&pool).await;
        let user_id = seed_user(&pool, "a@example.com").await;
        let service = service(&stores);

        assert!(matches!(
            service.place_order(user_id, 1, None).await,
            Err(AppError::NotFound(_))
        ));

        stores.carts.add_item(user_id, fixture.item_a, 1).await.unwrap();
        stores.carts.clear(user_id).await.unwrap();
        assert!(matches!(
            service.place_order(user_id, 1, None).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(count_rows(&pool, "orders").await, 0);
    }

    #[tokio::test]
    async fn test_failed_order_write_is_internal_and_keeps_cart() {
        let (pool, stores) = memory_stores().await;
        let fixture = seed_catalog(&pool).await;
        let user_id = seed_user(&pool, "a@example.com").await;
        fill_cart(&stores, user_id, &fixture).await;
        let service = service(&stores);

        assert!(matches!(
            service.place_order(user_id, 999, None).await,
            Err(AppError::Internal(_))
        ));
        assert_eq!(count_rows(&pool, "orders").await, 0);
        assert_eq!(count_rows(&pool, "order_payments").await, 0);
        assert_eq!(service.get_order_summary(user_id).await.unwrap().subtotal, 130_000);
    }

    #[tokio::test]
    async fn test_mixed_cart_goes_to_first_restaurant() {
        let (pool, stores) = memory_stores().await;
        let fixture = seed_catalog(&pool).await;
        let user_id = seed_user(&pool, "a@example.com").await;
        stores.carts.add_item(user_id, fixture.item_other, 1).await.unwrap();
        stores.carts.add_item(user_id, fixture.item_a, 1).await.unwrap();

        let confirmation = service(&stores).place_order(user_id, 3, None).await.unwrap();
        assert_eq!(confirmation.restaurant_id, fixture.other_restaurant_id);
    }

    #[tokio::test]
    async fn test_set_delivery_address_updates_profile() {
        let (pool, stores) = memory_stores().await;
        let user_id = seed_user(&pool, "a@example.com").await;
        let service = service(&stores);

        service
            .set_delivery_address(user_id, "7 Tran Hung Dao, District 5", "0900000000")
            .await
            .unwrap();
        let user = stores.users.find_by_id(user_id).await.unwrap().unwrap();
        assert_eq!(user.address.as_deref(), Some("7 Tran Hung Dao, District 5"));

        assert!(matches!(
            service.set_delivery_address(999, "somewhere far", "0900000000").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.set_delivery_address(user_id, "", "0900000000").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_payment_methods_and_delivery_options() {
        let (_pool, stores) = memory_stores().await;
        let service = service(&stores);

        let methods = service.payment_methods().await.unwrap();
        assert_eq!(methods.methods.len(), 3);
        assert_eq!(methods.methods[0].name, "Cash");

        let options = service.delivery_options();
        assert_eq!(options.options[0].option_id, "standard");
        assert_eq!(options.options[1].name, "Express Delivery (10-15 minutes)");
    }
}
