//! Products and the staffing model that drives their effectiveness.

use crate::window::RollingWindow;
use crate::{ensure_finite, ValidationError, EMPLOYEE_QUARTERLY_COST};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of quarter-over-quarter growth figures kept per product.
pub const GROWTH_HISTORY: usize = 4;

/// A product function that headcount can be assigned to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Department {
    #[serde(rename = "r&d")]
    Rnd,
    #[serde(rename = "qa")]
    Qa,
    #[serde(rename = "marketing")]
    Marketing,
}

impl Department {
    pub const ALL: [Department; 3] = [Department::Rnd, Department::Qa, Department::Marketing];

    /// Smoothing constant: how many quarters spend takes to take effect.
    pub const fn delay(self) -> f64 {
        match self {
            Department::Rnd => 5.0,
            Department::Qa => 3.0,
            Department::Marketing => 1.0,
        }
    }

    /// Contribution of effective spend to effectiveness.
    pub const fn weight(self) -> f64 {
        match self {
            Department::Rnd => 0.5,
            Department::Qa => 0.3,
            Department::Marketing => 0.2,
        }
    }

    /// Lowercase key used in saves and news items.
    pub const fn key(self) -> &'static str {
        match self {
            Department::Rnd => "r&d",
            Department::Qa => "qa",
            Department::Marketing => "marketing",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Department::Rnd => "R&D",
            Department::Qa => "QA",
            Department::Marketing => "Marketing",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One value per [`Department`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PerDepartment<T> {
    #[serde(rename = "r&d")]
    pub rnd: T,
    pub qa: T,
    pub marketing: T,
}

impl<T> PerDepartment<T> {
    pub const fn new(rnd: T, qa: T, marketing: T) -> Self {
        Self { rnd, qa, marketing }
    }

    pub fn get(&self, dept: Department) -> &T {
        match dept {
            Department::Rnd => &self.rnd,
            Department::Qa => &self.qa,
            Department::Marketing => &self.marketing,
        }
    }

    pub fn get_mut(&mut self, dept: Department) -> &mut T {
        match dept {
            Department::Rnd => &mut self.rnd,
            Department::Qa => &mut self.qa,
            Department::Marketing => &mut self.marketing,
        }
    }
}

/// Assigned headcount per function.
pub type Staffing = PerDepartment<u32>;

/// Smoothed spend per function.
pub type EffectiveSpend = PerDepartment<f64>;

impl Staffing {
    pub fn total(&self) -> u32 {
        self.rnd
            .saturating_add(self.qa)
            .saturating_add(self.marketing)
    }
}

/// A company's offering in one market.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Owning company name.
    pub owner: String,
    /// Market the product competes in.
    pub market: String,
    pub staffing: Staffing,
    /// Spend as perceived by customers; lags actual spend.
    pub effective_spend: EffectiveSpend,
    /// Weighted effective spend per unit of revenue.
    pub effectiveness: f64,
    /// Revenue for the current quarter.
    pub revenue: f64,
    /// Recent quarter-over-quarter revenue growth, in percent.
    pub recent_growth: RollingWindow<f64, GROWTH_HISTORY>,
}

impl Product {
    pub fn new(owner: impl Into<String>, market: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            market: market.into(),
            staffing: Staffing::default(),
            effective_spend: EffectiveSpend::default(),
            effectiveness: 0.0,
            revenue: 0.0,
            recent_growth: RollingWindow::new(),
        }
    }

    pub fn with_staffing(mut self, staffing: Staffing) -> Self {
        self.staffing = staffing;
        self
    }

    pub fn with_revenue(mut self, revenue: f64) -> Self {
        self.revenue = revenue;
        self
    }

    /// Actual spend this quarter for one function.
    pub fn actual_spend(&self, dept: Department) -> f64 {
        f64::from(*self.staffing.get(dept)) * EMPLOYEE_QUARTERLY_COST
    }

    /// Actual spend this quarter across all functions.
    pub fn quarterly_spend(&self) -> f64 {
        f64::from(self.staffing.total()) * EMPLOYEE_QUARTERLY_COST
    }

    /// Move each function's effective spend `1/delay` of the way toward
    /// its actual spend.
    pub fn update_effective_spend(&mut self) {
        for dept in Department::ALL {
            let actual = self.actual_spend(dept);
            let prev = *self.effective_spend.get(dept);
            *self.effective_spend.get_mut(dept) = prev + (actual - prev) / dept.delay();
        }
    }

    /// Recompute effectiveness from the current effective spend and revenue.
    pub fn update_effectiveness(&mut self) {
        let weighted: f64 = Department::ALL
            .iter()
            .map(|d| d.weight() * self.effective_spend.get(*d))
            .sum();
        self.effectiveness = weighted / self.revenue.max(1.0);
    }

    /// Record growth against `previous_revenue`; skipped when there is no
    /// positive baseline to compare with.
    pub fn record_growth(&mut self, previous_revenue: f64) -> Option<f64> {
        if previous_revenue <= 0.0 {
            return None;
        }
        let pct = (self.revenue - previous_revenue) / previous_revenue * 100.0;
        self.recent_growth.push(pct);
        Some(pct)
    }

    /// Growth posted in the most recent quarter, in percent.
    pub fn last_growth(&self) -> Option<f64> {
        self.recent_growth.latest().copied()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.owner.trim().is_empty() || self.market.trim().is_empty() {
            return Err(ValidationError::EmptyName("product"));
        }
        ensure_finite("product.revenue", self.revenue)?;
        ensure_finite("product.effectiveness", self.effectiveness)?;
        for dept in Department::ALL {
            ensure_finite("product.effective_spend", *self.effective_spend.get(dept))?;
        }
        for g in self.recent_growth.iter() {
            ensure_finite("product.recent_growth", *g)?;
        }
        if self.revenue < 0.0 {
            return Err(ValidationError::NegativeMoney("product.revenue"));
        }
        Ok(())
    }
}
