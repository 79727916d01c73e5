pub mod dispatch;
pub mod models;

pub use dispatch::{
    AssignmentResult, AssignmentStrategy, Coordinates, Courier, DispatchError, Dispatcher,
    NearestCourier, Vehicle, VehicleKind,
};
pub use models::{Order, OrderError, OrderItem, OrderStatus};
