//! Office space: what a company owns and what it can buy.

use crate::{ensure_finite, ValidationError};
use serde::{Deserialize, Serialize};

/// Capacity value used for campuses without a headcount limit.
pub const UNLIMITED_CAPACITY: u32 = u32::MAX;

/// An owned campus.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Campus {
    /// Campus type name, e.g. "Small Office".
    pub name: String,
    /// Book value; counts toward net assets.
    pub cost: f64,
    /// Fraction added on top of base employee cost, e.g. 0.04.
    pub overhead: f64,
    /// Maximum headcount housed here.
    pub capacity: u32,
}

impl Campus {
    pub fn new(name: impl Into<String>, cost: f64, overhead: f64, capacity: u32) -> Self {
        Self {
            name: name.into(),
            cost,
            overhead,
            capacity,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName("campus"));
        }
        ensure_finite("campus.cost", self.cost)?;
        ensure_finite("campus.overhead", self.overhead)?;
        if self.cost < 0.0 {
            return Err(ValidationError::NegativeMoney("campus.cost"));
        }
        Ok(())
    }
}

/// A purchasable campus type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CampusSpec {
    pub name: &'static str,
    pub cost: f64,
    pub overhead: f64,
    pub capacity: u32,
}

impl CampusSpec {
    /// Instantiate at catalog price.
    pub fn build(&self) -> Campus {
        Campus::new(self.name, self.cost, self.overhead, self.capacity)
    }
}

/// Every campus type on the market, cheapest first.
pub static CAMPUS_CATALOG: [CampusSpec; 7] = [
    CampusSpec { name: "Garage", cost: 100_000.0, overhead: 0.0, capacity: 10 },
    CampusSpec { name: "Small Office", cost: 400_000.0, overhead: 0.02, capacity: 50 },
    CampusSpec { name: "Large Office", cost: 1_000_000.0, overhead: 0.04, capacity: 150 },
    CampusSpec { name: "Large Building", cost: 1_600_000.0, overhead: 0.08, capacity: 275 },
    CampusSpec { name: "Small HQ Campus", cost: 2_750_000.0, overhead: 0.10, capacity: 500 },
    CampusSpec { name: "Large HQ Campus", cost: 5_500_000.0, overhead: 0.12, capacity: 1000 },
    CampusSpec {
        name: "Large Campus Park",
        cost: 25_000_000.0,
        overhead: 0.15,
        capacity: UNLIMITED_CAPACITY,
    },
];

/// Look up a catalog entry by exact name.
pub fn campus_spec(name: &str) -> Option<&'static CampusSpec> {
    CAMPUS_CATALOG.iter().find(|c| c.name == name)
}
