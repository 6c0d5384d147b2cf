#![deny(warnings)]

//! Core domain models and invariants for the Technopoly simulation.
//!
//! This crate defines the serializable entities the quarterly simulation
//! mutates (markets, products, companies and their financial instruments)
//! together with validation helpers used when restoring a snapshot.

pub mod calendar;
pub mod campus;
pub mod company;
pub mod finance;
pub mod market;
pub mod money;
pub mod names;
pub mod product;
pub mod window;

pub use calendar::QuarterDate;
pub use campus::{campus_spec, Campus, CampusSpec, CAMPUS_CATALOG, UNLIMITED_CAPACITY};
pub use company::{
    Company, Tier, BANKRUPTCY_QUARTERS, FINANCIAL_HISTORY, NEVER_ACQUIRED, NO_REVENUE_LIQUIDITY,
};
pub use finance::{amortized_monthly_payment, Bond, Loan, LoanQuarter};
pub use market::{
    EventKind, GameEvent, Market, PendingAcquisition, QualityRank, DEMAND_SHOCK,
    IMAGINARY_OWNER, RECESSION_QUARTERS, RECESSION_SHRINK,
};
pub use money::{format_money, format_whole_dollars};
pub use names::{NameGenerator, SyllableNames};
pub use product::{
    Department, EffectiveSpend, PerDepartment, Product, Staffing, GROWTH_HISTORY,
};
pub use window::RollingWindow;

use std::collections::BTreeSet;
use thiserror::Error;

/// Salary cost of one employee for one quarter, in USD.
pub const EMPLOYEE_QUARTERLY_COST: f64 = 25_000.0;

/// Items kept in each news feed.
pub const NEWS_CAPACITY: usize = 100;

/// Bounded news feed, oldest item first.
pub type NewsFeed = RollingWindow<String, NEWS_CAPACITY>;

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Numeric field must be finite.
    #[error("non-finite value in {0}")]
    NonFinite(&'static str),
    /// Monetary value must be non-negative.
    #[error("negative value in {0}")]
    NegativeMoney(&'static str),
    /// Names must not be blank.
    #[error("empty {0} name")]
    EmptyName(&'static str),
    /// A bounded history holds more entries than it may.
    #[error("history of {len} entries exceeds capacity {capacity}")]
    WindowOverflow { capacity: usize, len: usize },
    /// A product references a market that does not exist.
    #[error("unknown market: {0}")]
    UnknownMarket(String),
    /// A product's owner field disagrees with the company holding it.
    #[error("product {product} is held by {holder} but owned by {owner}")]
    OwnerMismatch {
        product: String,
        holder: String,
        owner: String,
    },
    /// Two entities share a name that must be unique.
    #[error("duplicate name: {0}")]
    DuplicateName(String),
}

pub(crate) fn ensure_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFinite(field))
    }
}

/// Validate markets and companies together, including cross-references:
/// unique names, products pointing at existing markets and owned by the
/// company that holds them.
pub fn validate_world<'a>(
    markets: &[Market],
    companies: impl IntoIterator<Item = &'a Company>,
) -> Result<(), ValidationError> {
    let mut market_names = BTreeSet::new();
    for m in markets {
        m.validate()?;
        if !market_names.insert(m.name.as_str()) {
            return Err(ValidationError::DuplicateName(m.name.clone()));
        }
    }
    let mut company_names = BTreeSet::new();
    for c in companies {
        c.validate()?;
        if !company_names.insert(c.name.as_str()) {
            return Err(ValidationError::DuplicateName(c.name.clone()));
        }
        for (name, p) in &c.products {
            if !market_names.contains(p.market.as_str()) {
                return Err(ValidationError::UnknownMarket(p.market.clone()));
            }
            if p.owner != c.name {
                return Err(ValidationError::OwnerMismatch {
                    product: name.clone(),
                    holder: c.name.clone(),
                    owner: p.owner.clone(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> (Vec<Market>, Vec<Company>) {
        let markets = vec![
            Market::new("Cloud Computing", 30_000_000.0, 0.1),
            Market::new("FinTech", 40_000_000.0, 0.07),
        ];
        let mut c = Company::new("ByteWorks", Some(Tier::Medium));
        c.cash = 3_000_000.0;
        c.products.insert(
            "SkyFlow".to_string(),
            Product::new("ByteWorks", "FinTech").with_revenue(1_000_000.0),
        );
        (markets, vec![c])
    }

    #[test]
    fn valid_world_passes() {
        let (markets, companies) = world();
        assert_eq!(validate_world(&markets, &companies), Ok(()));
    }

    #[test]
    fn product_in_unknown_market_is_rejected() {
        let (markets, mut companies) = world();
        companies[0]
            .products
            .insert("Ghost".into(), Product::new("ByteWorks", "Mars Tourism"));
        assert_eq!(
            validate_world(&markets, &companies),
            Err(ValidationError::UnknownMarket("Mars Tourism".into()))
        );
    }

    #[test]
    fn owner_mismatch_is_rejected() {
        let (markets, mut companies) = world();
        companies[0]
            .products
            .insert("Stray".into(), Product::new("Someone Else", "FinTech"));
        assert!(matches!(
            validate_world(&markets, &companies),
            Err(ValidationError::OwnerMismatch { .. })
        ));
    }

    #[test]
    fn corrupt_market_is_rejected() {
        let (mut markets, companies) = world();
        markets[0].size = f64::NAN;
        assert_eq!(
            validate_world(&markets, &companies),
            Err(ValidationError::NonFinite("market.size"))
        );
    }

    #[test]
    fn duplicate_company_names_are_rejected() {
        let (markets, mut companies) = world();
        companies.push(companies[0].clone());
        assert_eq!(
            validate_world(&markets, &companies),
            Err(ValidationError::DuplicateName("ByteWorks".into()))
        );
    }
}
