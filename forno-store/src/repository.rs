use forno_core::PaymentRecord;
use forno_order::{Order, OrderStatus};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("order not found: {0}")]
    OrderNotFound(Uuid),
}

/// Repository contract for orders (in-memory, synchronous).
pub trait OrderRepository {
    /// Upsert: create if the ID is unseen, otherwise overwrite.
    fn save(&mut self, order: &Order) -> Uuid;

    fn get(&self, order_id: Uuid) -> Result<Order, StoreError>;

    fn find_by_status(&self, status: OrderStatus) -> Vec<Order>;

    /// All stored orders, unspecified order.
    fn list_all(&self) -> Vec<Order>;

    /// Associate an order with a courier (overwrites a previous link).
    fn link_courier(&mut self, order_id: Uuid, courier_id: &str) -> Result<(), StoreError>;

    fn record_payment(&mut self, order_id: Uuid, record: PaymentRecord) -> Result<(), StoreError>;

    fn payment_record(&self, order_id: Uuid) -> Option<PaymentRecord>;
}

/// Simple in-memory repository for development and tests. No persistence,
/// single-process use.
#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    orders: HashMap<Uuid, Order>,
    courier_links: HashMap<Uuid, String>,
    payments: HashMap<Uuid, PaymentRecord>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn courier_for(&self, order_id: Uuid) -> Option<&str> {
        self.courier_links.get(&order_id).map(String::as_str)
    }
}

impl OrderRepository for InMemoryOrderRepository {
    fn save(&mut self, order: &Order) -> Uuid {
        let id = order.id();
        tracing::info!(order_id = %id, status = ?order.status(), "order saved");
        self.orders.insert(id, order.clone());
        id
    }

    fn get(&self, order_id: Uuid) -> Result<Order, StoreError> {
        self.orders
            .get(&order_id)
            .cloned()
            .ok_or(StoreError::OrderNotFound(order_id))
    }

    fn find_by_status(&self, status: OrderStatus) -> Vec<Order> {
        self.orders
            .values()
            .filter(|order| order.status() == status)
            .cloned()
            .collect()
    }

    fn list_all(&self) -> Vec<Order> {
        self.orders.values().cloned().collect()
    }

    fn link_courier(&mut self, order_id: Uuid, courier_id: &str) -> Result<(), StoreError> {
        if !self.orders.contains_key(&order_id) {
            return Err(StoreError::OrderNotFound(order_id));
        }
        self.courier_links.insert(order_id, courier_id.to_string());
        Ok(())
    }

    fn record_payment(&mut self, order_id: Uuid, record: PaymentRecord) -> Result<(), StoreError> {
        if !self.orders.contains_key(&order_id) {
            return Err(StoreError::OrderNotFound(order_id));
        }
        self.payments.insert(order_id, record);
        Ok(())
    }

    fn payment_record(&self, order_id: Uuid) -> Option<PaymentRecord> {
        self.payments.get(&order_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forno_catalog::{Ingredient, IngredientRequirement, Menu, Pizza, PizzaSize};
    use forno_core::{CashPayment, Money, Payment};
    use forno_order::Coordinates;
    use rust_decimal_macros::dec;

    fn menu_basic() -> Menu {
        let dough = Ingredient::new("Dough", "kg");
        let pizzas = vec![Pizza::new(
            "Margherita",
            "pz-mar",
            Money::new(dec!(10.00)),
            vec![IngredientRequirement::new(dough, dec!(1.0))],
        )
        .unwrap()];
        Menu::new(pizzas, vec![]).unwrap()
    }

    fn sample_order() -> Order {
        let menu = menu_basic();
        let mut order = Order::new("test-user", Coordinates::new(0.0, 0.0));
        order
            .add_item(&menu, "pz-mar", PizzaSize::Medium, 1, &[])
            .unwrap();
        order
    }

    #[test]
    fn test_save_is_upsert() {
        let mut repo = InMemoryOrderRepository::new();
        let mut order = sample_order();

        let id = repo.save(&order);
        assert_eq!(repo.list_all().len(), 1);

        order.accept().unwrap();
        let same_id = repo.save(&order);
        assert_eq!(id, same_id);
        assert_eq!(repo.list_all().len(), 1);
        assert_eq!(
            repo.get(id).unwrap().status(),
            forno_order::OrderStatus::Accepted
        );
    }

    #[test]
    fn test_get_unknown_order() {
        let repo = InMemoryOrderRepository::new();
        let err = repo.get(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, StoreError::OrderNotFound(_)));
    }

    #[test]
    fn test_find_by_status() {
        let mut repo = InMemoryOrderRepository::new();
        let new_order = sample_order();
        let mut accepted = sample_order();
        accepted.accept().unwrap();

        repo.save(&new_order);
        repo.save(&accepted);

        let found = repo.find_by_status(forno_order::OrderStatus::Accepted);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), accepted.id());
    }

    #[test]
    fn test_link_courier_requires_known_order() {
        let mut repo = InMemoryOrderRepository::new();
        let order = sample_order();

        let err = repo.link_courier(order.id(), "c-1").unwrap_err();
        assert!(matches!(err, StoreError::OrderNotFound(_)));

        repo.save(&order);
        repo.link_courier(order.id(), "c-1").unwrap();
        assert_eq!(repo.courier_for(order.id()), Some("c-1"));
    }

    #[test]
    fn test_payment_record_roundtrip() {
        let mut repo = InMemoryOrderRepository::new();
        let order = sample_order();
        repo.save(&order);

        assert!(repo.payment_record(order.id()).is_none());

        let mut payment = CashPayment::new();
        let total = order.final_total().unwrap();
        payment.capture(total, total).unwrap();
        repo.record_payment(order.id(), payment.record()).unwrap();

        let record = repo.payment_record(order.id()).unwrap();
        assert_eq!(record.captured_amount, total);
    }
}
