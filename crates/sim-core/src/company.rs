//! Companies: the player's and the AI roster's.

use crate::campus::Campus;
use crate::finance::{Bond, Loan};
use crate::product::Product;
use crate::window::RollingWindow;
use crate::{ensure_finite, ValidationError, EMPLOYEE_QUARTERLY_COST};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Quarters of negative cash after which a company is bankrupt.
pub const BANKRUPTCY_QUARTERS: u32 = 4;

/// Initial `last_acquisition_turn`, far enough back that the acquisition
/// cooldown never blocks an opening move.
pub const NEVER_ACQUIRED: i64 = -100;

/// Number of past quarters kept for profit and revenue.
pub const FINANCIAL_HISTORY: usize = 3;

/// Liquidity reported for a company without revenue.
pub const NO_REVENUE_LIQUIDITY: f64 = 10.0;

/// AI company size class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Startup,
    Medium,
    Large,
    #[serde(rename = "Big Tech")]
    BigTech,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Startup, Tier::Medium, Tier::Large, Tier::BigTech];

    pub const fn label(self) -> &'static str {
        match self {
            Tier::Startup => "Startup",
            Tier::Medium => "Medium",
            Tier::Large => "Large",
            Tier::BigTech => "Big Tech",
        }
    }

    /// Relative weight when a market's opening revenue is split between
    /// incumbents.
    pub const fn opening_share_weight(self) -> f64 {
        match self {
            Tier::Startup => 1.0,
            Tier::Medium => 2.0,
            Tier::Large => 4.0,
            Tier::BigTech => 8.0,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A company. `tier` is `None` for the human player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    pub tier: Option<Tier>,
    pub cash: f64,
    pub employees: u32,
    pub market_cap: f64,
    /// Debt service outside the loan book, charged as an operating cost.
    #[serde(default)]
    pub debt_monthly_payment: f64,
    pub campuses: Vec<Campus>,
    pub loans: Vec<Loan>,
    pub bonds: Vec<Bond>,
    pub products: BTreeMap<String, Product>,
    pub past_profits: RollingWindow<f64, FINANCIAL_HISTORY>,
    pub past_revenues: RollingWindow<f64, FINANCIAL_HISTORY>,
    negative_cash_quarters: u32,
    /// Turn of the last acquisition this company started.
    pub last_acquisition_turn: i64,
}

impl Company {
    pub fn new(name: impl Into<String>, tier: Option<Tier>) -> Self {
        Self {
            name: name.into(),
            tier,
            cash: 0.0,
            employees: 0,
            market_cap: 0.0,
            debt_monthly_payment: 0.0,
            campuses: Vec::new(),
            loans: Vec::new(),
            bonds: Vec::new(),
            products: BTreeMap::new(),
            past_profits: RollingWindow::new(),
            past_revenues: RollingWindow::new(),
            negative_cash_quarters: 0,
            last_acquisition_turn: NEVER_ACQUIRED,
        }
    }

    pub fn is_player(&self) -> bool {
        self.tier.is_none()
    }

    /// Total headcount all campuses can hold.
    pub fn employee_capacity(&self) -> u32 {
        self.campuses
            .iter()
            .fold(0u32, |acc, c| acc.saturating_add(c.capacity))
    }

    /// Seats still free across all campuses.
    pub fn free_capacity(&self) -> u32 {
        self.employee_capacity().saturating_sub(self.employees)
    }

    /// Highest overhead fraction among owned campuses, 0 with none.
    pub fn overhead_fraction(&self) -> f64 {
        self.campuses
            .iter()
            .map(|c| c.overhead)
            .fold(0.0, f64::max)
    }

    pub fn total_revenue(&self) -> f64 {
        self.products.values().map(|p| p.revenue).sum()
    }

    /// Quarterly operating cost: salaries, campus overhead and off-book
    /// debt service.
    pub fn total_spending(&self) -> f64 {
        let base = f64::from(self.employees) * EMPLOYEE_QUARTERLY_COST;
        base + base * self.overhead_fraction() + self.debt_monthly_payment * 3.0
    }

    pub fn quarterly_profit(&self) -> f64 {
        self.total_revenue() - self.total_spending()
    }

    /// Cash over this quarter's revenue.
    pub fn liquidity_ratio(&self) -> f64 {
        let revenue = self.total_revenue();
        if revenue > 0.0 {
            self.cash / revenue
        } else {
            NO_REVENUE_LIQUIDITY
        }
    }

    pub fn campus_value(&self) -> f64 {
        self.campuses.iter().map(|c| c.cost).sum()
    }

    pub fn bond_value(&self) -> f64 {
        self.bonds.iter().map(|b| b.principal).sum()
    }

    pub fn loan_balance(&self) -> f64 {
        self.loans.iter().map(|l| l.principal).sum()
    }

    /// Cash plus campuses and bonds, less outstanding loans, floored at 0.
    pub fn net_assets(&self) -> f64 {
        (self.cash + self.campus_value() + self.bond_value() - self.loan_balance()).max(0.0)
    }

    /// Four times the average of the retained quarterly revenues, or of this
    /// quarter's revenue when no history exists yet.
    pub fn annualized_revenue(&self) -> f64 {
        let avg = self
            .past_revenues
            .mean()
            .unwrap_or_else(|| self.total_revenue());
        avg * 4.0
    }

    pub fn negative_cash_quarters(&self) -> u32 {
        self.negative_cash_quarters
    }

    /// Count another negative-cash quarter, or reset the streak.
    pub fn update_negative_cash_quarters(&mut self) {
        if self.cash < 0.0 {
            self.negative_cash_quarters = self.negative_cash_quarters.saturating_add(1);
        } else {
            self.negative_cash_quarters = 0;
        }
    }

    pub fn is_bankrupt(&self) -> bool {
        self.negative_cash_quarters >= BANKRUPTCY_QUARTERS
    }

    pub fn has_product_in(&self, market: &str) -> bool {
        self.products.values().any(|p| p.market == market)
    }

    pub fn owns_campus(&self, name: &str) -> bool {
        self.campuses.iter().any(|c| c.name == name)
    }

    /// Headcount currently assigned to products.
    pub fn assigned_employees(&self) -> u32 {
        self.products
            .values()
            .fold(0u32, |acc, p| acc.saturating_add(p.staffing.total()))
    }

    /// Clear everything a company owns after it has been absorbed.
    pub fn strip_assets(&mut self) {
        self.cash = 0.0;
        self.employees = 0;
        self.campuses.clear();
        self.products.clear();
        self.loans.clear();
        self.bonds.clear();
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName("company"));
        }
        ensure_finite("company.cash", self.cash)?;
        ensure_finite("company.market_cap", self.market_cap)?;
        ensure_finite("company.debt_monthly_payment", self.debt_monthly_payment)?;
        for v in self.past_profits.iter().chain(self.past_revenues.iter()) {
            ensure_finite("company.history", *v)?;
        }
        for c in &self.campuses {
            c.validate()?;
        }
        for b in &self.bonds {
            b.validate()?;
        }
        for (name, p) in &self.products {
            if name.trim().is_empty() {
                return Err(ValidationError::EmptyName("product"));
            }
            p.validate()?;
        }
        Ok(())
    }
}
