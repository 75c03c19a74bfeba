//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building.
//! Identifiers derive their SQL names in snake_case (`CartItems::MenuItemId`
//! is `cart_items.menu_item_id`); the tables themselves are created by the
//! migrations under `migrations/sqlite`.

use sea_query::Iden;

/// Users table schema.
#[derive(Iden)]
pub enum Users {
    Table,
    UserId,
    Email,
    Password,
    FirstName,
    LastName,
    PhoneNumber,
    Address,
    CreatedAt,
}

/// Restaurants table schema.
#[derive(Iden)]
pub enum Restaurants {
    Table,
    RestaurantId,
    Name,
    Address,
    Rating,
    CuisineType,
    OpeningHours,
    CreatedAt,
}

/// Restaurant submenus table schema.
#[derive(Iden)]
pub enum RestaurantSubmenus {
    Table,
    SubmenuId,
    RestaurantId,
    Name,
    DisplayOrder,
}

/// Food categories table schema.
#[derive(Iden)]
pub enum FoodCategories {
    Table,
    CategoryId,
    Name,
    IconUrl,
    DisplayOrder,
}

/// Menu items table schema.
#[derive(Iden)]
pub enum MenuItems {
    Table,
    ItemId,
    RestaurantId,
    SubmenuId,
    CategoryId,
    Name,
    Description,
    Price,
    ImageUrl,
}

/// Carts table schema. One row per user.
#[derive(Iden)]
pub enum Carts {
    Table,
    Id,
    UserId,
    CreatedAt,
    UpdatedAt,
}

/// Cart items table schema. Unique on (cart_id, menu_item_id).
#[derive(Iden)]
pub enum CartItems {
    Table,
    Id,
    CartId,
    MenuItemId,
    Quantity,
}

/// Payment methods table schema.
#[derive(Iden)]
pub enum PaymentMethods {
    Table,
    PaymentMethodId,
    Name,
}

/// Orders table schema.
#[derive(Iden)]
pub enum Orders {
    Table,
    OrderId,
    UserId,
    RestaurantId,
    TotalAmount,
    Status,
    DeliveryAddress,
    DeliveryInstructions,
    CreatedAt,
    UpdatedAt,
}

/// Order items table schema. Frozen copy of cart lines.
#[derive(Iden)]
pub enum OrderItems {
    Table,
    OrderItemId,
    OrderId,
    ItemId,
    Quantity,
    Price,
}

/// Order payments table schema.
#[derive(Iden)]
pub enum OrderPayments {
    Table,
    PaymentId,
    OrderId,
    PaymentMethodId,
    Amount,
    Status,
    CreatedAt,
}

/// Reviews table schema.
#[derive(Iden)]
pub enum Reviews {
    Table,
    ReviewId,
    RestaurantId,
    UserId,
    Rating,
    Comment,
    CreatedAt,
}

/// Banner carousel table schema.
#[derive(Iden)]
pub enum Banners {
    Table,
    BannerId,
    ImageUrl,
    Title,
    Description,
    LinkUrl,
    DisplayOrder,
}
