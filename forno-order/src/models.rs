use crate::dispatch::{AssignmentResult, Coordinates, DispatchError, Dispatcher};
use chrono::{DateTime, Utc};
use forno_catalog::{
    CatalogError, Inventory, InventoryError, Menu, NoDiscount, OrderItemView, OrderView, Oven,
    OvenError, Pizza, PizzaSize, PricingError, PricingResult, PricingStrategy, ProductKind,
    Requirements, Topping,
};
use forno_core::Money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Order status in the lifecycle.
///
/// NEW -> ACCEPTED -> BAKING -> BOXED -> DISPATCHED -> DELIVERED, with
/// cancellation allowed from NEW and ACCEPTED only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    Accepted,
    Baking,
    Boxed,
    Dispatched,
    Delivered,
    Canceled,
}

impl OrderStatus {
    /// DELIVERED and CANCELED permit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Canceled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OrderStatus::New => "NEW",
            OrderStatus::Accepted => "ACCEPTED",
            OrderStatus::Baking => "BAKING",
            OrderStatus::Boxed => "BOXED",
            OrderStatus::Dispatched => "DISPATCHED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Canceled => "CANCELED",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("invalid quantity {0}: must be greater than zero")]
    InvalidQuantity(i64),

    #[error("no order item at index {index} (item count {len})")]
    InvalidOrderItem { index: usize, len: usize },

    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("order already finalized as {0}")]
    AlreadyFinalized(OrderStatus),

    #[error("pricing strategy can only change in NEW or ACCEPTED, not {0}")]
    InvalidPricingOperation(OrderStatus),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error(transparent)]
    Oven(#[from] OvenError),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Single order line: one pizza at a size, with toppings, times qty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub pizza: Pizza,
    pub size: PizzaSize,
    pub qty: u32,
    pub toppings: Vec<Topping>,
}

impl OrderItem {
    /// Sized pizza price plus toppings, quantized.
    pub fn unit_price(&self) -> Money {
        self.pizza.unit_price(self.size)
            + self.toppings.iter().map(|t| t.unit_price).sum::<Money>()
    }

    pub fn line_total(&self) -> Money {
        self.unit_price() * i64::from(self.qty)
    }

    /// Ingredients for one unit: the size-scaled recipe plus per-portion
    /// topping requirements.
    pub fn unit_requirements(&self) -> Requirements {
        let mut requirements = Requirements::new();
        for line in self.pizza.requirements(self.size) {
            *requirements.entry(line.ingredient).or_insert(Decimal::ZERO) += line.amount;
        }
        for topping in &self.toppings {
            for line in &topping.requirements {
                *requirements
                    .entry(line.ingredient.clone())
                    .or_insert(Decimal::ZERO) += line.amount;
            }
        }
        requirements
    }
}

fn default_strategy() -> Arc<dyn PricingStrategy> {
    Arc::new(NoDiscount)
}

/// Order entity: item composition, pricing, state transitions, and the
/// coordination of inventory, oven, payment, and dispatch collaborators.
/// The order is the sole orchestrator; collaborators never call back in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    id: Uuid,
    pub customer: String,
    pub delivery_address: Coordinates,
    items: Vec<OrderItem>,
    status: OrderStatus,
    #[serde(skip, default = "default_strategy")]
    strategy: Arc<dyn PricingStrategy>,
    metadata: serde_json::Value,
    courier_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(customer: impl Into<String>, delivery_address: Coordinates) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            customer: customer.into(),
            delivery_address,
            items: Vec::new(),
            status: OrderStatus::New,
            strategy: default_strategy(),
            metadata: serde_json::json!({}),
            courier_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn courier_id(&self) -> Option<&str> {
        self.courier_id.as_deref()
    }

    pub fn metadata(&self) -> &serde_json::Value {
        &self.metadata
    }

    /// Replace order metadata (first-order flag, coupon code, ...).
    pub fn set_metadata(&mut self, metadata: serde_json::Value) -> Result<(), OrderError> {
        self.ensure_not_finalized()?;
        self.metadata = metadata;
        self.touch();
        Ok(())
    }

    /// Items in insertion order.
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn ensure_not_finalized(&self) -> Result<(), OrderError> {
        if self.status.is_terminal() {
            return Err(OrderError::AlreadyFinalized(self.status));
        }
        Ok(())
    }

    /// Add a pizza with toppings, validated against the menu. On any
    /// error the item sequence is left unchanged.
    pub fn add_item(
        &mut self,
        menu: &Menu,
        sku: &str,
        size: PizzaSize,
        qty: i64,
        topping_skus: &[&str],
    ) -> Result<(), OrderError> {
        self.ensure_not_finalized()?;
        if qty <= 0 {
            return Err(OrderError::InvalidQuantity(qty));
        }
        let pizza = menu.find_pizza_sku(sku)?.clone();
        let mut toppings = Vec::with_capacity(topping_skus.len());
        for topping_sku in topping_skus {
            toppings.push(menu.find_topping_sku(topping_sku)?.clone());
        }
        self.items.push(OrderItem {
            pizza,
            size,
            qty: qty as u32,
            toppings,
        });
        self.touch();
        Ok(())
    }

    /// Remove the item at `index`, preserving the order of the rest.
    pub fn remove_item(&mut self, index: usize) -> Result<OrderItem, OrderError> {
        self.ensure_not_finalized()?;
        if index >= self.items.len() {
            return Err(OrderError::InvalidOrderItem {
                index,
                len: self.items.len(),
            });
        }
        let removed = self.items.remove(index);
        self.touch();
        Ok(removed)
    }

    /// Remove all items.
    pub fn clear(&mut self) -> Result<(), OrderError> {
        self.ensure_not_finalized()?;
        self.items.clear();
        self.touch();
        Ok(())
    }

    /// Raw sum of line totals, before any discount.
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(OrderItem::line_total).sum()
    }

    /// Total number of bakeable units across all items.
    pub fn unit_count(&self) -> usize {
        self.items.iter().map(|item| item.qty as usize).sum()
    }

    /// Read-only snapshot handed to pricing strategies; one entry per
    /// unit, priced after size and toppings.
    pub fn as_view(&self) -> OrderView {
        let mut items = Vec::with_capacity(self.unit_count());
        for item in &self.items {
            let unit_price = item.unit_price();
            for _ in 0..item.qty {
                items.push(OrderItemView {
                    sku: item.pizza.sku.clone(),
                    name: item.pizza.name.clone(),
                    unit_price,
                    kind: ProductKind::Pizza,
                });
            }
        }
        OrderView {
            subtotal: self.subtotal(),
            items,
            metadata: self.metadata.clone(),
        }
    }

    /// Swap the pricing strategy; legal only in NEW or ACCEPTED.
    pub fn set_pricing_strategy(
        &mut self,
        strategy: Arc<dyn PricingStrategy>,
    ) -> Result<(), OrderError> {
        self.ensure_not_finalized()?;
        if !matches!(self.status, OrderStatus::New | OrderStatus::Accepted) {
            return Err(OrderError::InvalidPricingOperation(self.status));
        }
        self.strategy = strategy;
        self.touch();
        Ok(())
    }

    /// Full pricing result for the current item set. Never cached: the
    /// strategy is re-applied to a fresh view on every call.
    pub fn pricing(&self) -> Result<PricingResult, OrderError> {
        Ok(self.strategy.apply(&self.as_view())?)
    }

    /// Total after the current pricing strategy.
    pub fn final_total(&self) -> Result<Money, OrderError> {
        Ok(self.pricing()?.final_total)
    }

    /// Per-ingredient requirements aggregated across every item
    /// (qty x size-scaled per-unit amounts).
    pub fn compute_total_requirements(&self) -> Requirements {
        let mut total = Requirements::new();
        for item in &self.items {
            let qty = Decimal::from(item.qty);
            for (ingredient, amount) in item.unit_requirements() {
                *total.entry(ingredient).or_insert(Decimal::ZERO) += amount * qty;
            }
        }
        total
    }

    fn transition(&mut self, to: OrderStatus) {
        tracing::info!(order_id = %self.id, from = %self.status, to = %to, "order transition");
        self.status = to;
        self.touch();
    }

    fn guard(&self, from: OrderStatus, to: OrderStatus) -> Result<(), OrderError> {
        self.ensure_not_finalized()?;
        if self.status != from {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        Ok(())
    }

    /// NEW -> ACCEPTED; requires at least one item.
    pub fn accept(&mut self) -> Result<(), OrderError> {
        self.guard(OrderStatus::New, OrderStatus::Accepted)?;
        if self.items.is_empty() {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: OrderStatus::Accepted,
            });
        }
        self.transition(OrderStatus::Accepted);
        Ok(())
    }

    /// ACCEPTED -> BAKING. Reserves aggregated ingredients, admits the
    /// batch to the oven, then commits the reservation. If the oven
    /// refuses, the reservation is released before the error surfaces;
    /// a failed call leaves status and committed stock untouched.
    pub fn bake(&mut self, inventory: &dyn Inventory, oven: &mut dyn Oven) -> Result<(), OrderError> {
        self.guard(OrderStatus::Accepted, OrderStatus::Baking)?;

        let requirements = self.compute_total_requirements();
        let token = inventory.reserve(&requirements)?;

        if let Err(oven_err) = oven.bake_batch(self.unit_count()) {
            tracing::warn!(order_id = %self.id, error = %oven_err, "oven refused batch, releasing reservation");
            inventory.release(&token)?;
            return Err(oven_err.into());
        }

        inventory.commit(&token)?;
        self.transition(OrderStatus::Baking);
        Ok(())
    }

    /// BAKING -> BOXED; all units baked.
    pub fn box_up(&mut self) -> Result<(), OrderError> {
        self.guard(OrderStatus::Baking, OrderStatus::Boxed)?;
        self.transition(OrderStatus::Boxed);
        Ok(())
    }

    /// BOXED -> DISPATCHED. A dispatcher failure is retryable: the order
    /// stays BOXED and no courier is linked.
    pub fn dispatch(&mut self, dispatcher: &mut Dispatcher) -> Result<AssignmentResult, OrderError> {
        self.guard(OrderStatus::Boxed, OrderStatus::Dispatched)?;
        let assignment = dispatcher.assign(self.id, self.delivery_address)?;
        self.courier_id = Some(assignment.courier_id.clone());
        self.transition(OrderStatus::Dispatched);
        Ok(assignment)
    }

    /// DISPATCHED -> DELIVERED (terminal).
    pub fn deliver(&mut self) -> Result<(), OrderError> {
        self.guard(OrderStatus::Dispatched, OrderStatus::Delivered)?;
        self.transition(OrderStatus::Delivered);
        Ok(())
    }

    /// NEW/ACCEPTED -> CANCELED (terminal). No cancellation once baking
    /// has started.
    pub fn cancel(&mut self) -> Result<(), OrderError> {
        self.ensure_not_finalized()?;
        if !matches!(self.status, OrderStatus::New | OrderStatus::Accepted) {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: OrderStatus::Canceled,
            });
        }
        self.transition(OrderStatus::Canceled);
        Ok(())
    }
}
