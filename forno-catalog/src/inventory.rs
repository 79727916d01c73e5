use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use uuid::Uuid;

/// Named unit-of-measure resource, e.g. ("Dough", "kg").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub unit: String,
    pub sku: Option<String>,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            sku: None,
        }
    }
}

/// An ingredient bound to a positive amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientRequirement {
    pub ingredient: Ingredient,
    pub amount: Decimal,
}

impl IngredientRequirement {
    pub fn new(ingredient: Ingredient, amount: Decimal) -> Self {
        Self { ingredient, amount }
    }
}

/// Aggregated per-ingredient amounts.
pub type Requirements = HashMap<Ingredient, Decimal>;

/// Single-use claim on a quantity of stock. Exchanged for either a commit
/// (permanent deduction) or a release (return to pool), exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationToken {
    pub id: Uuid,
    pub requirements: Requirements,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReservationState {
    Issued,
    Committed,
    Released,
}

impl fmt::Display for ReservationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReservationState::Issued => "issued",
            ReservationState::Committed => "committed",
            ReservationState::Released => "released",
        };
        write!(f, "{label}")
    }
}

/// One ingredient the stock could not cover.
#[derive(Debug, Clone, PartialEq)]
pub struct Shortage {
    pub ingredient: String,
    pub needed: Decimal,
    pub available: Decimal,
}

impl fmt::Display for Shortage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: needed {}, available {}",
            self.ingredient, self.needed, self.available
        )
    }
}

fn format_shortages(shortages: &[Shortage]) -> String {
    shortages
        .iter()
        .map(Shortage::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("insufficient ingredients: {}", format_shortages(.shortages))]
    InsufficientIngredients { shortages: Vec<Shortage> },

    #[error("unknown reservation: {0}")]
    UnknownReservation(Uuid),

    #[error("reservation {id} was already {state}")]
    ReservationConsumed { id: Uuid, state: String },
}

/// Shared ingredient stock. Reservation is atomic with respect to the
/// availability check; concurrent reservations cannot both claim the same
/// unit of stock.
pub trait Inventory: Send + Sync {
    /// True iff current stock covers every requirement. Never mutates.
    fn availability(&self, requirements: &Requirements) -> bool;

    /// Check and earmark in one step. No mutation on failure.
    fn reserve(&self, requirements: &Requirements) -> Result<ReservationToken, InventoryError>;

    /// Permanently deduct the earmarked amounts.
    fn commit(&self, token: &ReservationToken) -> Result<(), InventoryError>;

    /// Return the earmarked amounts to available stock.
    fn release(&self, token: &ReservationToken) -> Result<(), InventoryError>;

    /// Snapshot of available (unearmarked) stock.
    fn current_stock(&self) -> Requirements;
}

#[derive(Debug)]
struct Reservation {
    requirements: Requirements,
    state: ReservationState,
}

#[derive(Debug, Default)]
struct StockState {
    available: Requirements,
    reservations: HashMap<Uuid, Reservation>,
}

/// In-memory kitchen stock; reserve/commit/release serialize through one
/// mutex so the check-and-earmark step is atomic across orders.
#[derive(Debug, Default)]
pub struct KitchenInventory {
    state: Mutex<StockState>,
}

impl KitchenInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stock(initial: Requirements) -> Self {
        Self {
            state: Mutex::new(StockState {
                available: initial,
                reservations: HashMap::new(),
            }),
        }
    }

    pub fn restock(&self, ingredient: Ingredient, amount: Decimal) {
        let mut state = self.state.lock().expect("inventory lock poisoned");
        *state.available.entry(ingredient).or_insert(Decimal::ZERO) += amount;
    }
}

fn shortages_for(available: &Requirements, requirements: &Requirements) -> Vec<Shortage> {
    let mut shortages: Vec<Shortage> = requirements
        .iter()
        .filter_map(|(ingredient, needed)| {
            let on_hand = available
                .get(ingredient)
                .copied()
                .unwrap_or(Decimal::ZERO);
            (on_hand < *needed).then(|| Shortage {
                ingredient: ingredient.name.clone(),
                needed: *needed,
                available: on_hand,
            })
        })
        .collect();
    shortages.sort_by(|a, b| a.ingredient.cmp(&b.ingredient));
    shortages
}

impl Inventory for KitchenInventory {
    fn availability(&self, requirements: &Requirements) -> bool {
        let state = self.state.lock().expect("inventory lock poisoned");
        shortages_for(&state.available, requirements).is_empty()
    }

    fn reserve(&self, requirements: &Requirements) -> Result<ReservationToken, InventoryError> {
        let mut state = self.state.lock().expect("inventory lock poisoned");

        let shortages = shortages_for(&state.available, requirements);
        if !shortages.is_empty() {
            return Err(InventoryError::InsufficientIngredients { shortages });
        }

        for (ingredient, needed) in requirements {
            if let Some(on_hand) = state.available.get_mut(ingredient) {
                *on_hand -= *needed;
            }
        }

        let token = ReservationToken {
            id: Uuid::new_v4(),
            requirements: requirements.clone(),
        };
        state.reservations.insert(
            token.id,
            Reservation {
                requirements: requirements.clone(),
                state: ReservationState::Issued,
            },
        );
        tracing::info!(reservation_id = %token.id, lines = requirements.len(), "stock reserved");
        Ok(token)
    }

    fn commit(&self, token: &ReservationToken) -> Result<(), InventoryError> {
        let mut state = self.state.lock().expect("inventory lock poisoned");
        let reservation = state
            .reservations
            .get_mut(&token.id)
            .ok_or(InventoryError::UnknownReservation(token.id))?;

        if reservation.state != ReservationState::Issued {
            return Err(InventoryError::ReservationConsumed {
                id: token.id,
                state: reservation.state.to_string(),
            });
        }
        reservation.state = ReservationState::Committed;
        tracing::info!(reservation_id = %token.id, "reservation committed");
        Ok(())
    }

    fn release(&self, token: &ReservationToken) -> Result<(), InventoryError> {
        let mut state = self.state.lock().expect("inventory lock poisoned");
        let reservation = state
            .reservations
            .get_mut(&token.id)
            .ok_or(InventoryError::UnknownReservation(token.id))?;

        if reservation.state != ReservationState::Issued {
            return Err(InventoryError::ReservationConsumed {
                id: token.id,
                state: reservation.state.to_string(),
            });
        }
        reservation.state = ReservationState::Released;

        let earmarked = reservation.requirements.clone();
        for (ingredient, amount) in earmarked {
            *state.available.entry(ingredient).or_insert(Decimal::ZERO) += amount;
        }
        tracing::info!(reservation_id = %token.id, "reservation released");
        Ok(())
    }

    fn current_stock(&self) -> Requirements {
        let state = self.state.lock().expect("inventory lock poisoned");
        state.available.clone()
    }
}
