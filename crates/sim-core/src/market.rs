//! Markets, quality ranks and the events that perturb them.

use crate::product::Product;
use crate::{ensure_finite, ValidationError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Owner name carried by a market's synthetic opening-revenue product.
pub const IMAGINARY_OWNER: &str = "Initial Market Revenue";

/// Per-quarter shrink factor applied to a market in recession.
pub const RECESSION_SHRINK: f64 = 0.95;

/// Growth-rate delta applied by a demand event.
pub const DEMAND_SHOCK: f64 = 0.05;

/// Length of a global recession, in quarters.
pub const RECESSION_QUARTERS: u32 = 3;

/// A product market.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub name: String,
    /// Quarterly revenue pool proxy.
    pub size: f64,
    pub base_growth_rate: f64,
    /// `base_growth_rate` plus this quarter's event modifier.
    pub growth_rate: f64,
    pub in_recession: bool,
    pub recession_quarters_left: u32,
    pub last_quarter_total_revenue: f64,
    /// Revenue not yet attributable to any company (spawned markets only).
    #[serde(default)]
    pub imaginary_product: Option<Product>,
}

impl Market {
    pub fn new(name: impl Into<String>, size: f64, base_growth_rate: f64) -> Self {
        Self {
            name: name.into(),
            size,
            base_growth_rate,
            growth_rate: base_growth_rate,
            in_recession: false,
            recession_quarters_left: 0,
            last_quarter_total_revenue: 0.0,
            imaginary_product: None,
        }
    }

    /// An opening market: size in [$25M, $50M], base growth in [5%, 15%).
    pub fn generate<R: Rng + ?Sized>(name: impl Into<String>, rng: &mut R) -> Self {
        let size = f64::from(rng.gen_range(25_000_000u32..=50_000_000));
        let growth = rng.gen_range(0.05..0.15);
        Self::new(name, size, growth)
    }

    /// A late-game market whose first quarter of revenue is held by an
    /// imaginary product until real competitors take it over.
    pub fn spawned(name: impl Into<String>, initial_revenue: f64, growth_rate: f64) -> Self {
        let name = name.into();
        let mut market = Self::new(name.clone(), initial_revenue, growth_rate);
        market.imaginary_product =
            Some(Product::new(IMAGINARY_OWNER, name).with_revenue(initial_revenue));
        market
    }

    /// Start a recession lasting `quarters`.
    pub fn enter_recession(&mut self, quarters: u32) {
        self.in_recession = true;
        self.recession_quarters_left = quarters;
    }

    pub fn clear_recession(&mut self) {
        self.in_recession = false;
        self.recession_quarters_left = 0;
    }

    /// Shrink for one recession quarter; clears itself when the countdown
    /// runs out.
    pub fn apply_recession(&mut self) {
        if self.in_recession && self.recession_quarters_left > 0 {
            self.size *= RECESSION_SHRINK;
            self.recession_quarters_left -= 1;
            if self.recession_quarters_left == 0 {
                self.in_recession = false;
            }
        }
    }

    /// Drop any event modifier.
    pub fn reset_growth(&mut self) {
        self.growth_rate = self.base_growth_rate;
    }

    /// Shift growth by `delta`, never below zero.
    pub fn adjust_growth(&mut self, delta: f64) {
        self.growth_rate = (self.growth_rate + delta).max(0.0);
    }

    /// Revenue the market adds this quarter: zero in recession.
    pub fn growth_revenue(&self) -> f64 {
        if self.in_recession {
            0.0
        } else {
            self.size * self.growth_rate / 4.0
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName("market"));
        }
        ensure_finite("market.size", self.size)?;
        ensure_finite("market.base_growth_rate", self.base_growth_rate)?;
        ensure_finite("market.growth_rate", self.growth_rate)?;
        ensure_finite(
            "market.last_quarter_total_revenue",
            self.last_quarter_total_revenue,
        )?;
        if self.size < 0.0 {
            return Err(ValidationError::NegativeMoney("market.size"));
        }
        if let Some(p) = &self.imaginary_product {
            p.validate()?;
            if p.market != self.name {
                return Err(ValidationError::UnknownMarket(p.market.clone()));
            }
        }
        Ok(())
    }
}

/// Market-relative product quality, worst to best.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QualityRank {
    VeryBad,
    Bad,
    Moderate,
    Good,
    VeryGood,
}

impl QualityRank {
    /// Rank of the product at `position` (0 = most effective) among
    /// `total` products.
    pub fn from_position(position: usize, total: usize) -> Self {
        if position == 0 {
            QualityRank::VeryGood
        } else if position + 1 == total {
            QualityRank::VeryBad
        } else if position <= total / 4 {
            QualityRank::Good
        } else if position >= (3 * total) / 4 {
            QualityRank::Bad
        } else {
            QualityRank::Moderate
        }
    }

    pub const fn is_strong(self) -> bool {
        matches!(self, QualityRank::Good | QualityRank::VeryGood)
    }

    pub const fn label(self) -> &'static str {
        match self {
            QualityRank::VeryBad => "Very Bad",
            QualityRank::Bad => "Bad",
            QualityRank::Moderate => "Moderate",
            QualityRank::Good => "Good",
            QualityRank::VeryGood => "Very Good",
        }
    }
}

impl fmt::Display for QualityRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What an event does when applied.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    /// Temporary growth modifier for one market.
    Demand { market: String, delta: f64 },
    /// All markets freeze growth and shrink.
    GlobalRecession,
}

/// A quarterly news event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    pub name: String,
    pub description: String,
    /// True only for the global recession.
    pub breaking: bool,
    pub kind: EventKind,
    /// Turn the event last fired, if ever.
    pub turn_happened: Option<u32>,
}

impl GameEvent {
    pub fn strong_demand(market: &str) -> Self {
        Self {
            name: format!("Strong demand for {market}"),
            description: format!("+5% growth this quarter in {market}"),
            breaking: false,
            kind: EventKind::Demand {
                market: market.to_string(),
                delta: DEMAND_SHOCK,
            },
            turn_happened: None,
        }
    }

    pub fn weak_demand(market: &str) -> Self {
        Self {
            name: format!("Weak demand for {market}"),
            description: format!("-5% growth this quarter in {market}"),
            breaking: false,
            kind: EventKind::Demand {
                market: market.to_string(),
                delta: -DEMAND_SHOCK,
            },
            turn_happened: None,
        }
    }

    pub fn global_recession() -> Self {
        Self {
            name: "Global Recession".to_string(),
            description: "All markets freeze growth and shrink 5% each quarter for 3 quarters"
                .to_string(),
            breaking: true,
            kind: EventKind::GlobalRecession,
            turn_happened: None,
        }
    }
}

/// A takeover waiting one turn for resolution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingAcquisition {
    /// Buyer company name.
    pub buyer: String,
    /// Target company name.
    pub target: String,
    /// Agreed price.
    pub price: f64,
    pub turn_submitted: u32,
}

impl PendingAcquisition {
    /// Resolution happens on the turn after submission.
    pub fn is_due(&self, turn: u32) -> bool {
        turn > self.turn_submitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn generated_markets_are_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for i in 0..50 {
            let m = Market::generate(format!("M{i}"), &mut rng);
            assert!((25_000_000.0..=50_000_000.0).contains(&m.size));
            assert!((0.05..0.15).contains(&m.base_growth_rate));
            assert_eq!(m.growth_rate, m.base_growth_rate);
            assert!(m.validate().is_ok());
        }
    }

    #[test]
    fn recession_shrinks_then_self_clears() {
        let mut m = Market::new("Cloud", 1000.0, 0.1);
        m.enter_recession(RECESSION_QUARTERS);
        assert_eq!(m.growth_revenue(), 0.0);
        for _ in 0..3 {
            m.apply_recession();
        }
        assert!(!m.in_recession);
        assert!((m.size - 1000.0 * 0.95f64.powi(3)).abs() < 1e-9);
        m.apply_recession();
        assert!((m.size - 1000.0 * 0.95f64.powi(3)).abs() < 1e-9);
        assert!((m.growth_revenue() - m.size * 0.1 / 4.0).abs() < 1e-9);
    }

    #[test]
    fn growth_modifier_is_floored() {
        let mut m = Market::new("Cloud", 1000.0, 0.03);
        m.adjust_growth(-DEMAND_SHOCK);
        assert_eq!(m.growth_rate, 0.0);
        m.reset_growth();
        m.adjust_growth(DEMAND_SHOCK);
        assert!((m.growth_rate - 0.08).abs() < 1e-12);
    }

    #[test]
    fn spawned_market_holds_imaginary_revenue() {
        let m = Market::spawned("Wearables", 2_000_000.0, 0.12);
        let p = m.imaginary_product.as_ref().unwrap();
        assert_eq!(p.owner, IMAGINARY_OWNER);
        assert_eq!(p.revenue, 2_000_000.0);
        assert!(m.validate().is_ok());
    }

    #[test]
    fn quality_rank_positions() {
        let ranks: Vec<QualityRank> = (0..8).map(|i| QualityRank::from_position(i, 8)).collect();
        assert_eq!(
            ranks,
            vec![
                QualityRank::VeryGood,
                QualityRank::Good,
                QualityRank::Good,
                QualityRank::Moderate,
                QualityRank::Moderate,
                QualityRank::Moderate,
                QualityRank::Bad,
                QualityRank::VeryBad,
            ]
        );
        assert_eq!(QualityRank::from_position(0, 1), QualityRank::VeryGood);
        assert_eq!(QualityRank::from_position(1, 2), QualityRank::VeryBad);
    }

    #[test]
    fn pending_acquisition_waits_one_turn() {
        let p = PendingAcquisition {
            buyer: "A".into(),
            target: "B".into(),
            price: 1.0,
            turn_submitted: 5,
        };
        assert!(!p.is_due(5));
        assert!(p.is_due(6));
    }

    proptest! {
        #[test]
        fn extremes_are_fixed(total in 2usize..200) {
            prop_assert_eq!(QualityRank::from_position(0, total), QualityRank::VeryGood);
            prop_assert_eq!(QualityRank::from_position(total - 1, total), QualityRank::VeryBad);
        }
    }
}
