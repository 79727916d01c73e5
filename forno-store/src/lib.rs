pub mod repository;

pub use repository::{InMemoryOrderRepository, OrderRepository, StoreError};
