use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum OvenError {
    #[error("oven is offline")]
    Unavailable,

    #[error("oven capacity exceeded: requested {requested}, capacity {capacity}")]
    CapacityExceeded { requested: usize, capacity: usize },
}

/// Admission control on batch size before baking.
pub trait Oven {
    /// True iff the oven would accept a batch of this many units.
    fn can_bake(&self, units: usize) -> bool;

    /// Checked admission: accept the batch or explain why not.
    fn bake_batch(&mut self, units: usize) -> Result<(), OvenError>;
}

/// Fixed-capacity deck oven; one batch at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckOven {
    capacity: usize,
    online: bool,
}

impl DeckOven {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            online: true,
        }
    }

    pub fn set_online(&mut self, online: bool) {
        self.online = online;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Oven for DeckOven {
    fn can_bake(&self, units: usize) -> bool {
        self.online && units <= self.capacity
    }

    fn bake_batch(&mut self, units: usize) -> Result<(), OvenError> {
        if !self.online {
            return Err(OvenError::Unavailable);
        }
        if units > self.capacity {
            return Err(OvenError::CapacityExceeded {
                requested: units,
                capacity: self.capacity,
            });
        }
        tracing::info!(units, capacity = self.capacity, "batch admitted to oven");
        Ok(())
    }
}
