pub mod inventory;
pub mod menu;
pub mod oven;
pub mod pricing;
pub mod product;

pub use inventory::{
    Ingredient, IngredientRequirement, Inventory, InventoryError, KitchenInventory, Requirements,
    ReservationToken, Shortage,
};
pub use menu::Menu;
pub use oven::{DeckOven, Oven, OvenError};
pub use pricing::{
    BuyNGetMFree, DiscountScope, FirstOrderCoupon, NoDiscount, OrderItemView, OrderView,
    PercentOff, PricingError, PricingResult, PricingStrategy,
};
pub use product::{Pizza, PizzaSize, ProductKind, Topping};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("duplicate SKU in catalog: {0}")]
    DuplicateSku(String),

    #[error("menu item not found: {0}")]
    MenuItemNotFound(String),

    #[error("invalid product definition: {0}")]
    InvalidProduct(String),
}
