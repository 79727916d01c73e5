use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Simple 2D coordinates for delivery addresses and couriers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
}

impl Coordinates {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Coordinates) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleKind {
    Bike,
    Scooter,
    Car,
}

/// Courier's vehicle type and speed factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub kind: VehicleKind,
    pub speed_coef: f64,
}

/// Courier entity with location, vehicle, and availability flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Courier {
    pub id: String,
    pub location: Coordinates,
    pub vehicle: Vehicle,
    pub available: bool,
    pub current_load: Option<u32>,
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("no couriers available")]
    NoCouriersAvailable,

    #[error("courier {0} became unavailable before confirmation")]
    CourierUnavailable(String),

    #[error("unknown courier: {0}")]
    UnknownCourier(String),
}

/// Picks one courier for a destination. The returned courier must be
/// available at selection time; with none available the strategy reports
/// NoCouriersAvailable rather than an arbitrary pick.
pub trait AssignmentStrategy: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn choose(
        &self,
        order_address: Coordinates,
        couriers: &[Courier],
    ) -> Result<String, DispatchError>;
}

/// Default strategy: nearest available courier by straight-line distance,
/// ties broken by roster order.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestCourier;

impl AssignmentStrategy for NearestCourier {
    fn name(&self) -> &str {
        "nearest_courier"
    }

    fn choose(
        &self,
        order_address: Coordinates,
        couriers: &[Courier],
    ) -> Result<String, DispatchError> {
        let mut best: Option<(&Courier, f64)> = None;
        for courier in couriers.iter().filter(|c| c.available) {
            let distance = courier.location.distance_to(order_address);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((courier, distance));
            }
        }
        best.map(|(courier, _)| courier.id.clone())
            .ok_or(DispatchError::NoCouriersAvailable)
    }
}

/// Result of assigning a courier to an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentResult {
    pub order_id: Uuid,
    pub courier_id: String,
    pub strategy_name: String,
    pub eta: Option<f64>,
    pub notes: Vec<String>,
}

/// Dispatcher managing a courier roster and an assignment strategy.
#[derive(Debug)]
pub struct Dispatcher {
    couriers: Vec<Courier>,
    strategy: Box<dyn AssignmentStrategy>,
}

impl Dispatcher {
    pub fn new(couriers: Vec<Courier>) -> Self {
        Self {
            couriers,
            strategy: Box::new(NearestCourier),
        }
    }

    pub fn with_strategy(couriers: Vec<Courier>, strategy: Box<dyn AssignmentStrategy>) -> Self {
        Self { couriers, strategy }
    }

    /// Change assignment strategy; past assignments are unaffected.
    pub fn set_strategy(&mut self, strategy: Box<dyn AssignmentStrategy>) {
        self.strategy = strategy;
    }

    pub fn couriers(&self) -> &[Courier] {
        &self.couriers
    }

    /// Assign a courier for the given destination. Availability is
    /// re-checked at confirmation; a stale pick fails retryably without
    /// changing any courier state.
    pub fn assign(
        &mut self,
        order_id: Uuid,
        address: Coordinates,
    ) -> Result<AssignmentResult, DispatchError> {
        let chosen = self.strategy.choose(address, &self.couriers)?;
        let strategy_name = self.strategy.name().to_string();

        let courier = self
            .couriers
            .iter_mut()
            .find(|c| c.id == chosen)
            .ok_or_else(|| DispatchError::UnknownCourier(chosen.clone()))?;
        if !courier.available {
            return Err(DispatchError::CourierUnavailable(chosen));
        }

        courier.available = false;
        courier.current_load = Some(courier.current_load.unwrap_or(0) + 1);

        let distance = courier.location.distance_to(address);
        let eta = (courier.vehicle.speed_coef > 0.0).then(|| distance / courier.vehicle.speed_coef);

        tracing::info!(%order_id, courier_id = %courier.id, strategy = %strategy_name, "courier assigned");
        Ok(AssignmentResult {
            order_id,
            courier_id: courier.id.clone(),
            strategy_name,
            eta,
            notes: Vec::new(),
        })
    }

    /// Mark a courier available again after the drop-off.
    pub fn complete_delivery(&mut self, courier_id: &str) -> Result<(), DispatchError> {
        let courier = self
            .couriers
            .iter_mut()
            .find(|c| c.id == courier_id)
            .ok_or_else(|| DispatchError::UnknownCourier(courier_id.to_string()))?;
        courier.available = true;
        courier.current_load = courier.current_load.map(|load| load.saturating_sub(1));
        Ok(())
    }

    pub fn update_courier_location(
        &mut self,
        courier_id: &str,
        location: Coordinates,
    ) -> Result<(), DispatchError> {
        let courier = self
            .couriers
            .iter_mut()
            .find(|c| c.id == courier_id)
            .ok_or_else(|| DispatchError::UnknownCourier(courier_id.to_string()))?;
        courier.location = location;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn courier(id: &str, x: f64, y: f64) -> Courier {
        Courier {
            id: id.to_string(),
            location: Coordinates::new(x, y),
            vehicle: Vehicle {
                kind: VehicleKind::Bike,
                speed_coef: 1.0,
            },
            available: true,
            current_load: None,
        }
    }

    #[test]
    fn test_nearest_available_courier_wins() {
        let mut dispatcher = Dispatcher::new(vec![
            courier("c-far", 10.0, 10.0),
            courier("c-near", 1.0, 1.0),
        ]);

        let result = dispatcher
            .assign(Uuid::new_v4(), Coordinates::new(0.0, 0.0))
            .unwrap();
        assert_eq!(result.courier_id, "c-near");
        assert_eq!(result.strategy_name, "nearest_courier");
        assert!(!dispatcher.couriers()[1].available);
    }

    #[test]
    fn test_ties_keep_roster_order() {
        let mut dispatcher =
            Dispatcher::new(vec![courier("c-first", 2.0, 0.0), courier("c-second", 0.0, 2.0)]);

        let result = dispatcher
            .assign(Uuid::new_v4(), Coordinates::new(0.0, 0.0))
            .unwrap();
        assert_eq!(result.courier_id, "c-first");
    }

    #[test]
    fn test_no_couriers_available() {
        let mut busy = courier("c-1", 0.0, 0.0);
        busy.available = false;
        let mut dispatcher = Dispatcher::new(vec![busy]);

        let err = dispatcher
            .assign(Uuid::new_v4(), Coordinates::new(0.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, DispatchError::NoCouriersAvailable));
    }

    #[test]
    fn test_stale_strategy_pick_fails_retryably() {
        #[derive(Debug)]
        struct PinnedPick;

        impl AssignmentStrategy for PinnedPick {
            fn name(&self) -> &str {
                "pinned"
            }

            fn choose(&self, _: Coordinates, _: &[Courier]) -> Result<String, DispatchError> {
                Ok("c-busy".to_string())
            }
        }

        let mut busy = courier("c-busy", 0.0, 0.0);
        busy.available = false;
        let mut dispatcher = Dispatcher::with_strategy(vec![busy], Box::new(PinnedPick));

        let err = dispatcher
            .assign(Uuid::new_v4(), Coordinates::new(0.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, DispatchError::CourierUnavailable(_)));
    }

    #[test]
    fn test_complete_delivery_frees_courier() {
        let mut dispatcher = Dispatcher::new(vec![courier("c-1", 0.0, 0.0)]);
        dispatcher
            .assign(Uuid::new_v4(), Coordinates::new(3.0, 4.0))
            .unwrap();
        assert!(!dispatcher.couriers()[0].available);

        dispatcher.complete_delivery("c-1").unwrap();
        assert!(dispatcher.couriers()[0].available);
        assert_eq!(dispatcher.couriers()[0].current_load, Some(0));
    }

    #[test]
    fn test_eta_scales_with_speed() {
        let mut fast = courier("c-fast", 0.0, 0.0);
        fast.vehicle = Vehicle {
            kind: VehicleKind::Car,
            speed_coef: 2.0,
        };
        let mut dispatcher = Dispatcher::new(vec![fast]);

        let result = dispatcher
            .assign(Uuid::new_v4(), Coordinates::new(3.0, 4.0))
            .unwrap();
        assert_eq!(result.eta, Some(2.5));
    }
}
