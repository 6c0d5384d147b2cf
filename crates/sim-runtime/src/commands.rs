//! Player commands.
//!
//! Every command checks all of its preconditions before touching the
//! world, so an `Err` always leaves the game exactly as it was.

use crate::acquisitions::is_growth_protected;
use crate::Game;
use serde::{Deserialize, Serialize};
use sim_ai::unassign_weakest_first;
use sim_core::{
    amortized_monthly_payment, campus_spec, format_money, Bond, Loan, PendingAcquisition,
    PerDepartment, Product, Staffing,
};
use sim_econ::acquisition_price;
use thiserror::Error;
use tracing::info;

/// Price of launching a product.
pub const LAUNCH_COST: f64 = 50_000.0;
/// Recruiting cost per hire.
pub const HIRE_COST: f64 = 10_000.0;
/// Severance per employee fired.
pub const SEVERANCE: f64 = 7_500.0;
pub const MIN_LOAN: f64 = 10_000.0;
pub const MAX_LOAN: f64 = 10_000_000.0;
/// A new loan's monthly payment may not exceed this share of cash.
pub const MAX_PAYMENT_CASH_SHARE: f64 = 0.10;
pub const MIN_BOND: f64 = 5_000.0;
pub const MAX_BOND: f64 = 5_000_000.0;
/// Staffing of the product a company is founded with.
pub const FOUNDING_STAFFING: Staffing = Staffing::new(2, 1, 2);

fn money(v: &f64) -> String {
    format_money(*v)
}

/// Why a player command was refused.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("company {0} already exists")]
    CompanyExists(String),
    #[error("company has already been founded")]
    AlreadyFounded,
    #[error("product name {0} already exists")]
    ProductExists(String),
    #[error("you already have a product in the {0} market")]
    MarketPresence(String),
    #[error("market {0} does not exist")]
    UnknownMarket(String),
    #[error("product {0} does not exist")]
    UnknownProduct(String),
    #[error("insufficient funds: need {}, have {}", money(.needed), money(.available))]
    InsufficientFunds { needed: f64, available: f64 },
    #[error("cannot assign {requested} employees; {available} are free")]
    OverAllocation { requested: u32, available: u32 },
    #[error("employee counts must not be negative")]
    NegativeCount,
    #[error("count must be positive")]
    InvalidCount,
    #[error("campus capacity exceeded: {requested} requested, {free} seats free")]
    OverCapacity { requested: u32, free: u32 },
    #[error("cannot fire {requested} of {employees} employees")]
    OverFiring { requested: u32, employees: u32 },
    #[error("unknown campus type {0}")]
    UnknownCampus(String),
    #[error("already own a {0}")]
    CampusOwned(String),
    #[error("invalid terms")]
    InvalidTerms,
    #[error("amount {} outside {}..={}", money(.amount), money(.min), money(.max))]
    AmountOutOfRange { amount: f64, min: f64, max: f64 },
    #[error("monthly payment {} exceeds {} (10% of cash)", money(.payment), money(.limit))]
    PaymentTooHigh { payment: f64, limit: f64 },
    #[error("company {0} does not exist")]
    UnknownCompany(String),
    #[error("an acquisition of {0} is already pending")]
    AlreadyPending(String),
    #[error("{0} is protected by its recent growth")]
    GrowthProtected(String),
}

impl CommandError {
    /// Stable classification string for external callers.
    pub const fn code(&self) -> &'static str {
        match self {
            CommandError::EmptyName => "invalid_name",
            CommandError::CompanyExists(_) => "name_taken",
            CommandError::AlreadyFounded => "already_founded",
            CommandError::ProductExists(_) => "duplicate_product",
            CommandError::MarketPresence(_) => "market_presence",
            CommandError::UnknownMarket(_) => "unknown_market",
            CommandError::UnknownProduct(_) => "unknown_product",
            CommandError::InsufficientFunds { .. } => "insufficient_funds",
            CommandError::OverAllocation { .. } => "over_allocation",
            CommandError::NegativeCount => "negative_count",
            CommandError::InvalidCount => "invalid_count",
            CommandError::OverCapacity { .. } => "over_capacity",
            CommandError::OverFiring { .. } => "over_firing",
            CommandError::UnknownCampus(_) => "unknown_campus",
            CommandError::CampusOwned(_) => "duplicate_campus",
            CommandError::InvalidTerms => "invalid_terms",
            CommandError::AmountOutOfRange { .. } => "amount_out_of_range",
            CommandError::PaymentTooHigh { .. } => "payment_too_high",
            CommandError::UnknownCompany(_) => "unknown_company",
            CommandError::AlreadyPending(_) => "already_pending",
            CommandError::GrowthProtected(_) => "growth_protected",
        }
    }
}

/// Flat result record handed to UIs and scripts.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub success: bool,
    /// Classification from [`CommandError::code`].
    pub error: Option<String>,
    /// Human-readable reason.
    pub message: Option<String>,
    pub severance_paid: Option<f64>,
}

impl CommandOutcome {
    fn failure(err: &CommandError) -> Self {
        Self {
            success: false,
            error: Some(err.code().to_string()),
            message: Some(err.to_string()),
            severance_paid: None,
        }
    }

    /// Outcome of [`Game::fire_employees`].
    pub fn from_firing(result: Result<f64, CommandError>) -> Self {
        match result {
            Ok(paid) => Self {
                success: true,
                severance_paid: Some(paid),
                ..Self::default()
            },
            Err(err) => Self::failure(&err),
        }
    }
}

impl From<Result<(), CommandError>> for CommandOutcome {
    fn from(result: Result<(), CommandError>) -> Self {
        match result {
            Ok(()) => Self {
                success: true,
                ..Self::default()
            },
            Err(err) => Self::failure(&err),
        }
    }
}

fn ensure_funds(cash: f64, needed: f64) -> Result<(), CommandError> {
    if cash < needed {
        Err(CommandError::InsufficientFunds {
            needed,
            available: cash,
        })
    } else {
        Ok(())
    }
}

fn ensure_range(amount: f64, min: f64, max: f64) -> Result<(), CommandError> {
    if amount < min || amount > max {
        Err(CommandError::AmountOutOfRange { amount, min, max })
    } else {
        Ok(())
    }
}

fn non_empty(name: &str) -> Result<&str, CommandError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(CommandError::EmptyName)
    } else {
        Ok(trimmed)
    }
}

impl Game {
    /// Name the player's company and open its first product, then re-split
    /// opening revenue with the player counted in.
    pub fn found_company(
        &mut self,
        company: &str,
        market: &str,
        product: &str,
    ) -> Result<(), CommandError> {
        let company = non_empty(company)?;
        let product = non_empty(product)?;
        if !self.player.products.is_empty() {
            return Err(CommandError::AlreadyFounded);
        }
        if company != self.player.name && self.used_company_names.contains(company) {
            return Err(CommandError::CompanyExists(company.to_string()));
        }
        if self.market(market).is_none() {
            return Err(CommandError::UnknownMarket(market.to_string()));
        }
        if self.used_product_names.contains(product) {
            return Err(CommandError::ProductExists(product.to_string()));
        }

        self.used_company_names.remove(&self.player.name);
        self.player.name = company.to_string();
        self.used_company_names.insert(company.to_string());
        self.used_product_names.insert(product.to_string());
        self.player.products.insert(
            product.to_string(),
            Product::new(company, market).with_staffing(FOUNDING_STAFFING),
        );
        self.allocate_opening_shares();
        info!(%company, %market, %product, "player company founded");
        Ok(())
    }

    pub fn launch_product(&mut self, market: &str, product: &str) -> Result<(), CommandError> {
        let market = non_empty(market)?;
        let product = non_empty(product)?;
        if self.player.products.contains_key(product) || self.used_product_names.contains(product)
        {
            return Err(CommandError::ProductExists(product.to_string()));
        }
        if self.player.has_product_in(market) {
            return Err(CommandError::MarketPresence(market.to_string()));
        }
        if self.market(market).is_none() {
            return Err(CommandError::UnknownMarket(market.to_string()));
        }
        ensure_funds(self.player.cash, LAUNCH_COST)?;

        self.player.cash -= LAUNCH_COST;
        self.used_product_names.insert(product.to_string());
        self.player.products.insert(
            product.to_string(),
            Product::new(self.player.name.clone(), market),
        );
        self.news.push(format!(
            "{} launched {product} in the {market} market!",
            self.player.name
        ));
        Ok(())
    }

    /// Set a product's staffing. Headcount across all products may not
    /// exceed employees.
    pub fn assign_employees(
        &mut self,
        product: &str,
        requested: PerDepartment<i64>,
    ) -> Result<(), CommandError> {
        let current = self
            .player
            .products
            .get(product)
            .ok_or_else(|| CommandError::UnknownProduct(product.to_string()))?;
        let counts = [requested.rnd, requested.qa, requested.marketing];
        if counts.iter().any(|n| *n < 0) {
            return Err(CommandError::NegativeCount);
        }
        let [rnd, qa, marketing] =
            counts.map(|n| u32::try_from(n).unwrap_or(u32::MAX));
        let staffing = Staffing::new(rnd, qa, marketing);
        let elsewhere = self
            .player
            .assigned_employees()
            .saturating_sub(current.staffing.total());
        let available = self.player.employees.saturating_sub(elsewhere);
        if staffing.total() > available {
            return Err(CommandError::OverAllocation {
                requested: staffing.total(),
                available,
            });
        }
        if let Some(p) = self.player.products.get_mut(product) {
            p.staffing = staffing;
        }
        Ok(())
    }

    pub fn hire_employees(&mut self, count: u32) -> Result<(), CommandError> {
        if count == 0 {
            return Err(CommandError::InvalidCount);
        }
        let cost = f64::from(count) * HIRE_COST;
        ensure_funds(self.player.cash, cost)?;
        let free = self.player.free_capacity();
        if count > free {
            return Err(CommandError::OverCapacity {
                requested: count,
                free,
            });
        }
        self.player.cash -= cost;
        self.player.employees += count;
        self.news.push(format!(
            "{} hired {count} new employee(s)!",
            self.player.name
        ));
        Ok(())
    }

    /// Lay off `count` employees, trimming product assignments to fit.
    /// Returns the severance paid.
    pub fn fire_employees(&mut self, count: u32) -> Result<f64, CommandError> {
        if count == 0 {
            return Err(CommandError::InvalidCount);
        }
        if count > self.player.employees {
            return Err(CommandError::OverFiring {
                requested: count,
                employees: self.player.employees,
            });
        }
        let severance = f64::from(count) * SEVERANCE;
        ensure_funds(self.player.cash, severance)?;

        self.player.cash -= severance;
        self.player.employees -= count;
        let excess = self
            .player
            .assigned_employees()
            .saturating_sub(self.player.employees);
        unassign_weakest_first(&mut self.player, excess);
        self.news.push(format!(
            "{} laid off {count} employee(s).",
            self.player.name
        ));
        Ok(severance)
    }

    pub fn buy_campus(&mut self, campus: &str) -> Result<(), CommandError> {
        let spec =
            campus_spec(campus).ok_or_else(|| CommandError::UnknownCampus(campus.to_string()))?;
        if self.player.owns_campus(spec.name) {
            return Err(CommandError::CampusOwned(spec.name.to_string()));
        }
        ensure_funds(self.player.cash, spec.cost)?;
        self.player.cash -= spec.cost;
        self.player.campuses.push(spec.build());
        self.news.push(format!(
            "{} purchased a {} campus!",
            self.player.name, spec.name
        ));
        Ok(())
    }

    pub fn take_loan(
        &mut self,
        amount: f64,
        term_months: i32,
        annual_rate: f64,
    ) -> Result<(), CommandError> {
        if !amount.is_finite() || !annual_rate.is_finite() || annual_rate < 0.0 || term_months <= 0
        {
            return Err(CommandError::InvalidTerms);
        }
        ensure_range(amount, MIN_LOAN, MAX_LOAN)?;
        let payment = amortized_monthly_payment(amount, annual_rate, term_months);
        let limit = self.player.cash * MAX_PAYMENT_CASH_SHARE;
        if payment > limit {
            return Err(CommandError::PaymentTooHigh { payment, limit });
        }
        self.player.cash += amount;
        self.player.loans.push(Loan::new(amount, annual_rate, term_months));
        self.news.push(format!(
            "{} secured a {} loan at {:.1}% APR.",
            self.player.name,
            format_money(amount),
            annual_rate * 100.0
        ));
        Ok(())
    }

    pub fn buy_bond(
        &mut self,
        amount: f64,
        term_quarters: u32,
        annual_rate: f64,
    ) -> Result<(), CommandError> {
        if !amount.is_finite()
            || !annual_rate.is_finite()
            || annual_rate < 0.0
            || term_quarters == 0
        {
            return Err(CommandError::InvalidTerms);
        }
        ensure_range(amount, MIN_BOND, MAX_BOND)?;
        ensure_funds(self.player.cash, amount)?;
        self.player.cash -= amount;
        self.player.bonds.push(Bond::new(amount, annual_rate, term_quarters));
        self.news.push(format!(
            "{} invested {} in bonds yielding {:.1}% annually.",
            self.player.name,
            format_money(amount),
            annual_rate * 100.0
        ));
        Ok(())
    }

    /// Offer `price` for an AI company; the deal resolves next turn.
    pub fn initiate_acquisition(&mut self, target: &str, price: f64) -> Result<(), CommandError> {
        if !price.is_finite() || price <= 0.0 {
            return Err(CommandError::InvalidTerms);
        }
        let company = self
            .ai
            .iter()
            .find(|c| c.name == target)
            .ok_or_else(|| CommandError::UnknownCompany(target.to_string()))?;
        if self.pending.iter().any(|a| a.target == target) {
            return Err(CommandError::AlreadyPending(target.to_string()));
        }
        ensure_funds(self.player.cash, price)?;
        if is_growth_protected(company) {
            return Err(CommandError::GrowthProtected(target.to_string()));
        }
        self.pending.push(PendingAcquisition {
            buyer: self.player.name.clone(),
            target: target.to_string(),
            price,
            turn_submitted: self.turn,
        });
        self.news.push(format!(
            "{} submitted acquisition offer for {target} at {}.",
            self.player.name,
            format_money(price)
        ));
        Ok(())
    }

    /// Asking price for an AI company.
    pub fn quote_acquisition(&self, target: &str) -> Result<f64, CommandError> {
        self.ai
            .iter()
            .find(|c| c.name == target)
            .map(acquisition_price)
            .ok_or_else(|| CommandError::UnknownCompany(target.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimConfig;

    fn game() -> Game {
        Game::new(SimConfig::default().with_seed(21))
    }

    fn founded() -> Game {
        let mut g = game();
        g.found_company("Acme", "FinTech", "Ledgerly").unwrap();
        g
    }

    fn staff(rnd: i64, qa: i64, marketing: i64) -> PerDepartment<i64> {
        PerDepartment::new(rnd, qa, marketing)
    }

    #[test]
    fn founding_joins_the_opening_split() {
        let g = founded();
        assert_eq!(g.player().name, "Acme");
        let p = &g.player().products["Ledgerly"];
        assert_eq!(p.staffing, FOUNDING_STAFFING);
        assert_eq!(p.owner, "Acme");
        assert!(p.revenue > 0.0);
        let fintech = g.market("FinTech").unwrap();
        let total: f64 = std::iter::once(g.player())
            .chain(g.ai_companies())
            .flat_map(|c| c.products.values())
            .filter(|p| p.market == "FinTech")
            .map(|p| p.revenue)
            .sum();
        assert!((total - fintech.size / 4.0).abs() < 1e-3);
    }

    #[test]
    fn founding_validates_everything_first() {
        let mut g = game();
        let rival = g.ai_companies()[0].name.clone();
        assert_eq!(
            g.found_company(" ", "FinTech", "X").unwrap_err().code(),
            "invalid_name"
        );
        assert_eq!(
            g.found_company(&rival, "FinTech", "X").unwrap_err(),
            CommandError::CompanyExists(rival)
        );
        assert_eq!(
            g.found_company("Acme", "Mars", "X").unwrap_err().code(),
            "unknown_market"
        );
        assert_eq!(g.player().name, "Player Co");
        g.found_company("Acme", "FinTech", "X").unwrap();
        assert_eq!(
            g.found_company("Acme", "FinTech", "Y").unwrap_err(),
            CommandError::AlreadyFounded
        );
    }

    #[test]
    fn launch_checks_in_order_and_charges() {
        let mut g = founded();
        assert_eq!(
            g.launch_product("Cybersecurity", "Ledgerly").unwrap_err().code(),
            "duplicate_product"
        );
        assert_eq!(
            g.launch_product("FinTech", "Vaultify").unwrap_err().code(),
            "market_presence"
        );
        assert_eq!(
            g.launch_product("Moon Mining", "Vaultify").unwrap_err().code(),
            "unknown_market"
        );
        let cash = g.player().cash;
        g.launch_product("Cybersecurity", "Vaultify").unwrap();
        assert_eq!(g.player().cash, cash - LAUNCH_COST);
        let p = &g.player().products["Vaultify"];
        assert_eq!(p.staffing.total(), 0);
        assert_eq!(
            g.news().latest().map(String::as_str),
            Some("Acme launched Vaultify in the Cybersecurity market!")
        );

        g.player.cash = 10.0;
        let err = g.launch_product("Social Media", "Chirp").unwrap_err();
        assert_eq!(err.code(), "insufficient_funds");
        assert!(!g.player().products.contains_key("Chirp"));
    }

    #[test]
    fn assignment_respects_total_headcount() {
        let mut g = founded();
        g.launch_product("Cybersecurity", "Vaultify").unwrap();
        assert_eq!(
            g.assign_employees("Vaultify", staff(1, 0, 0)).unwrap_err(),
            CommandError::OverAllocation {
                requested: 1,
                available: 0
            }
        );
        assert_eq!(
            g.assign_employees("Ledgerly", staff(-1, 3, 3)).unwrap_err(),
            CommandError::NegativeCount
        );
        assert_eq!(
            g.assign_employees("Nope", staff(0, 0, 0)).unwrap_err().code(),
            "unknown_product"
        );
        g.assign_employees("Ledgerly", staff(1, 1, 1)).unwrap();
        g.assign_employees("Vaultify", staff(2, 0, 0)).unwrap();
        assert_eq!(g.player().assigned_employees(), 5);
    }

    #[test]
    fn hiring_costs_and_capacity() {
        let mut g = founded();
        let cash = g.player().cash;
        g.hire_employees(5).unwrap();
        assert_eq!(g.player().employees, 10);
        assert_eq!(g.player().cash, cash - 50_000.0);
        assert_eq!(
            g.hire_employees(1).unwrap_err(),
            CommandError::OverCapacity {
                requested: 1,
                free: 0
            }
        );
        assert_eq!(g.hire_employees(0).unwrap_err().code(), "invalid_count");
        g.player.cash = 0.0;
        assert_eq!(g.hire_employees(1).unwrap_err().code(), "insufficient_funds");
    }

    #[test]
    fn firing_pays_severance_and_trims_assignments() {
        let mut g = founded();
        let cash = g.player().cash;
        assert_eq!(g.fire_employees(6).unwrap_err().code(), "over_firing");
        let paid = g.fire_employees(2).unwrap();
        assert_eq!(paid, 15_000.0);
        assert_eq!(g.player().cash, cash - 15_000.0);
        assert_eq!(g.player().employees, 3);
        assert_eq!(g.player().assigned_employees(), 3);
        assert_eq!(g.player().products["Ledgerly"].staffing.marketing, 0);

        let outcome = CommandOutcome::from_firing(g.fire_employees(10));
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("over_firing"));
        let outcome = CommandOutcome::from_firing(g.fire_employees(1));
        assert_eq!(outcome.severance_paid, Some(SEVERANCE));
    }

    #[test]
    fn campus_purchase() {
        let mut g = founded();
        assert_eq!(
            g.buy_campus("Treehouse").unwrap_err().code(),
            "unknown_campus"
        );
        assert_eq!(g.buy_campus("Garage").unwrap_err().code(), "duplicate_campus");
        g.buy_campus("Small Office").unwrap();
        assert_eq!(g.player().employee_capacity(), 60);
        assert_eq!(g.player().cash, 600_000.0);
        assert_eq!(
            g.buy_campus("Large Campus Park").unwrap_err().code(),
            "insufficient_funds"
        );
    }

    #[test]
    fn loans_are_bounded_by_amount_and_payment() {
        let mut g = founded();
        assert_eq!(
            g.take_loan(5_000.0, 60, 0.09).unwrap_err().code(),
            "amount_out_of_range"
        );
        assert_eq!(
            g.take_loan(20_000_000.0, 60, 0.09).unwrap_err().code(),
            "amount_out_of_range"
        );
        assert_eq!(g.take_loan(100_000.0, 0, 0.09).unwrap_err().code(), "invalid_terms");
        // ~$41.5k a month on $2M over 5 years, against a $100k limit.
        g.take_loan(2_000_000.0, 60, 0.09).unwrap();
        assert_eq!(g.player().cash, 3_000_000.0);
        assert_eq!(g.player().loans.len(), 1);
        assert_eq!(
            g.news().latest().map(String::as_str),
            Some("Acme secured a $2.00M loan at 9.0% APR.")
        );
        assert_eq!(
            g.take_loan(10_000_000.0, 12, 0.09).unwrap_err().code(),
            "payment_too_high"
        );
    }

    #[test]
    fn bonds_are_bounded() {
        let mut g = founded();
        assert_eq!(
            g.buy_bond(1_000.0, 4, 0.05).unwrap_err().code(),
            "amount_out_of_range"
        );
        assert_eq!(g.buy_bond(10_000.0, 0, 0.05).unwrap_err().code(), "invalid_terms");
        g.buy_bond(100_000.0, 4, 0.06).unwrap();
        assert_eq!(g.player().cash, 900_000.0);
        assert_eq!(
            g.news().latest().map(String::as_str),
            Some("Acme invested $100.00K in bonds yielding 6.0% annually.")
        );
        g.player.cash = 4_000.0;
        assert_eq!(g.buy_bond(5_000.0, 4, 0.05).unwrap_err().code(), "insufficient_funds");
    }

    #[test]
    fn acquisition_offers() {
        let mut g = founded();
        let target = g.ai_companies()[0].name.clone();
        let quote = g.quote_acquisition(&target).unwrap();
        assert!(quote > 0.0);
        assert_eq!(g.quote_acquisition("Nobody").unwrap_err().code(), "unknown_company");
        assert_eq!(
            g.initiate_acquisition("Nobody", 1.0).unwrap_err().code(),
            "unknown_company"
        );
        assert_eq!(
            g.initiate_acquisition(&target, 1e15).unwrap_err().code(),
            "insufficient_funds"
        );
        g.initiate_acquisition(&target, 500_000.0).unwrap();
        assert_eq!(g.pending_acquisitions().len(), 1);
        assert_eq!(g.pending_acquisitions()[0].buyer, "Acme");
        assert_eq!(
            g.initiate_acquisition(&target, 500_000.0).unwrap_err().code(),
            "already_pending"
        );

        let other = g.ai_companies()[1].name.clone();
        let p = g.ai[1].products.values_mut().next().unwrap();
        p.revenue = 140.0;
        p.record_growth(100.0);
        assert_eq!(
            g.initiate_acquisition(&other, 1.0).unwrap_err(),
            CommandError::GrowthProtected(other)
        );
    }

    #[test]
    fn target_already_bid_on_by_a_rival_is_refused() {
        let mut g = founded();
        let buyer = g.ai_companies()[1].name.clone();
        let target = g.ai_companies()[0].name.clone();
        g.pending.push(PendingAcquisition {
            buyer,
            target: target.clone(),
            price: 1_000_000.0,
            turn_submitted: 0,
        });
        let cash = g.player().cash;
        assert_eq!(
            g.initiate_acquisition(&target, 500_000.0).unwrap_err(),
            CommandError::AlreadyPending(target)
        );
        assert_eq!(g.pending_acquisitions().len(), 1);
        assert_eq!(g.player().cash, cash);
    }

    #[test]
    fn outcome_record_carries_code_and_message() {
        let mut g = founded();
        let outcome = CommandOutcome::from(g.hire_employees(0));
        assert_eq!(
            outcome,
            CommandOutcome {
                success: false,
                error: Some("invalid_count".into()),
                message: Some("count must be positive".into()),
                severance_paid: None,
            }
        );
        assert!(CommandOutcome::from(g.hire_employees(1)).success);
    }
}
