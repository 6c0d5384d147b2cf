//! Per-tier strategy constants.
//!
//! All four tiers run the same decision routine; everything that differs
//! between them lives in a [`TierPolicy`] row. A [`PolicyTable`] can be
//! loaded from YAML, and any row left out keeps its default.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use sim_core::{Company, QualityRank, Tier};

/// Which campus of the affordable catalog (sorted by cost) to buy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampusPick {
    SecondCheapest,
    SecondMostExpensive,
    MostExpensive,
}

impl CampusPick {
    /// Index into a cost-sorted list of `len` candidates (`len > 0`).
    pub fn index(self, len: usize) -> usize {
        let last = len.saturating_sub(1);
        match self {
            CampusPick::SecondCheapest => last.min(1),
            CampusPick::SecondMostExpensive => last.saturating_sub(1),
            CampusPick::MostExpensive => last,
        }
    }
}

/// When a company reaches for a loan.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoanTrigger {
    /// Liquidity below a threshold. An emergency loan borrows the full
    /// limit, otherwise half.
    LowLiquidity { below: f64, emergency: bool },
    /// Cash already negative, or liquidity low after a streak of negative
    /// quarters.
    Distressed {
        liquidity_below: f64,
        negative_quarters: u32,
    },
    /// Cash small relative to market cap while liquidity is low.
    CashBelowMarketCap {
        fraction: f64,
        liquidity_below: f64,
    },
}

impl LoanTrigger {
    /// `Some(emergency)` when `c` should borrow this quarter.
    pub fn check(&self, c: &Company, liquidity: f64) -> Option<bool> {
        let fire = match *self {
            LoanTrigger::LowLiquidity { below, emergency } => {
                return (liquidity < below).then_some(emergency);
            }
            LoanTrigger::Distressed {
                liquidity_below,
                negative_quarters,
            } => {
                c.cash < 0.0
                    || (liquidity < liquidity_below
                        && c.negative_cash_quarters() >= negative_quarters)
            }
            LoanTrigger::CashBelowMarketCap {
                fraction,
                liquidity_below,
            } => c.cash < c.market_cap * fraction && liquidity < liquidity_below,
        };
        fire.then_some(false)
    }
}

/// Acquisition appetite.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionPolicy {
    /// Own products ranked at or below this look for a takeover.
    pub max_rank: QualityRank,
    /// First turn acquisitions are considered.
    pub min_turn: u32,
    /// Turns between two acquisitions.
    pub cooldown: i64,
}

/// Bond purchases from surplus cash.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BondPolicy {
    /// Cash must exceed this multiple of quarterly revenue.
    pub revenue_multiple: f64,
    pub cash_floor: f64,
    /// Chance of investing in a quarter where the conditions hold.
    pub probability: f64,
    pub term_quarters: u32,
    pub annual_rate: f64,
}

/// One tier's constants.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TierPolicy {
    /// Target employee cost as a fraction of quarterly revenue.
    pub target_cost_ratio: f64,
    /// Hiring needs cash above this multiple of quarterly revenue.
    pub hire_cash_buffer: f64,
    /// Loss-making companies fire once headcount exceeds target by this
    /// factor.
    pub fire_trigger: f64,
    /// Expand when free seats drop below this share of capacity.
    pub campus_slack: f64,
    pub campus_cash_floor: f64,
    pub campus_pick: CampusPick,
    pub loan: LoanTrigger,
    /// Enter a market when cash exceeds this multiple of its entry cost.
    pub entry_cash_multiple: f64,
    /// Entry cost must stay below this share of cash.
    pub entry_cost_fraction: f64,
    pub acquisition: Option<AcquisitionPolicy>,
    pub bond: BondPolicy,
}

const ACQUIRE_WEAK: AcquisitionPolicy = AcquisitionPolicy {
    max_rank: QualityRank::Bad,
    min_turn: 12,
    cooldown: 5,
};

impl TierPolicy {
    pub const STARTUP: TierPolicy = TierPolicy {
        target_cost_ratio: 0.80,
        hire_cash_buffer: 1.0,
        fire_trigger: 1.20,
        campus_slack: 0.15,
        campus_cash_floor: 250_000.0,
        campus_pick: CampusPick::SecondCheapest,
        loan: LoanTrigger::LowLiquidity {
            below: 0.5,
            emergency: true,
        },
        entry_cash_multiple: 1.75,
        entry_cost_fraction: 0.25,
        acquisition: None,
        bond: BondPolicy {
            revenue_multiple: 1.5,
            cash_floor: 500_000.0,
            probability: 0.05,
            term_quarters: 2,
            annual_rate: 0.06,
        },
    };

    pub const MEDIUM: TierPolicy = TierPolicy {
        target_cost_ratio: 0.60,
        hire_cash_buffer: 2.0,
        fire_trigger: 1.15,
        campus_slack: 0.20,
        campus_cash_floor: 1_000_000.0,
        campus_pick: CampusPick::SecondCheapest,
        loan: LoanTrigger::LowLiquidity {
            below: 0.6,
            emergency: false,
        },
        entry_cash_multiple: 2.0,
        entry_cost_fraction: 0.25,
        acquisition: Some(ACQUIRE_WEAK),
        bond: BondPolicy {
            revenue_multiple: 1.5,
            cash_floor: 1_000_000.0,
            probability: 0.15,
            term_quarters: 4,
            annual_rate: 0.07,
        },
    };

    pub const LARGE: TierPolicy = TierPolicy {
        target_cost_ratio: 0.50,
        hire_cash_buffer: 3.0,
        fire_trigger: 1.10,
        campus_slack: 0.25,
        campus_cash_floor: 5_000_000.0,
        campus_pick: CampusPick::SecondMostExpensive,
        loan: LoanTrigger::Distressed {
            liquidity_below: 0.7,
            negative_quarters: 2,
        },
        entry_cash_multiple: 3.0,
        entry_cost_fraction: 0.20,
        acquisition: Some(ACQUIRE_WEAK),
        bond: BondPolicy {
            revenue_multiple: 2.0,
            cash_floor: 5_000_000.0,
            probability: 0.20,
            term_quarters: 4,
            annual_rate: 0.07,
        },
    };

    pub const BIG_TECH: TierPolicy = TierPolicy {
        target_cost_ratio: 0.40,
        hire_cash_buffer: 4.0,
        fire_trigger: 1.05,
        campus_slack: 0.30,
        campus_cash_floor: 10_000_000.0,
        campus_pick: CampusPick::MostExpensive,
        loan: LoanTrigger::CashBelowMarketCap {
            fraction: 0.1,
            liquidity_below: 0.8,
        },
        entry_cash_multiple: 4.0,
        entry_cost_fraction: 0.30,
        acquisition: Some(AcquisitionPolicy {
            max_rank: QualityRank::Moderate,
            ..ACQUIRE_WEAK
        }),
        bond: BondPolicy {
            revenue_multiple: 2.5,
            cash_floor: 10_000_000.0,
            probability: 0.15,
            term_quarters: 8,
            annual_rate: 0.08,
        },
    };
}

/// Policy rows for every tier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyTable {
    pub startup: TierPolicy,
    pub medium: TierPolicy,
    pub large: TierPolicy,
    pub big_tech: TierPolicy,
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self {
            startup: TierPolicy::STARTUP,
            medium: TierPolicy::MEDIUM,
            large: TierPolicy::LARGE,
            big_tech: TierPolicy::BIG_TECH,
        }
    }
}

impl PolicyTable {
    pub fn get(&self, tier: Tier) -> &TierPolicy {
        match tier {
            Tier::Startup => &self.startup,
            Tier::Medium => &self.medium,
            Tier::Large => &self.large,
            Tier::BigTech => &self.big_tech,
        }
    }

    /// Parse a YAML document; rows it omits keep their defaults.
    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(text).context("parsing tier policy table")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn campus_pick_indices() {
        assert_eq!(CampusPick::SecondCheapest.index(1), 0);
        assert_eq!(CampusPick::SecondCheapest.index(5), 1);
        assert_eq!(CampusPick::SecondMostExpensive.index(1), 0);
        assert_eq!(CampusPick::SecondMostExpensive.index(5), 3);
        assert_eq!(CampusPick::MostExpensive.index(5), 4);
    }

    #[test]
    fn loan_triggers() {
        let mut c = Company::new("C", Some(Tier::Large));
        c.cash = -1.0;
        assert_eq!(TierPolicy::LARGE.loan.check(&c, 5.0), Some(false));
        c.cash = 1.0;
        assert_eq!(TierPolicy::LARGE.loan.check(&c, 0.1), None);
        assert_eq!(TierPolicy::STARTUP.loan.check(&c, 0.4), Some(true));
        assert_eq!(TierPolicy::MEDIUM.loan.check(&c, 0.59), Some(false));
        c.market_cap = 100.0;
        assert_eq!(TierPolicy::BIG_TECH.loan.check(&c, 0.5), Some(false));
        assert_eq!(TierPolicy::BIG_TECH.loan.check(&c, 0.9), None);
    }

    #[test]
    fn yaml_overrides_single_row() {
        let defaults = PolicyTable::default();
        let mut startup = defaults.startup;
        startup.target_cost_ratio = 0.9;
        startup.loan = LoanTrigger::LowLiquidity {
            below: 0.3,
            emergency: false,
        };
        let yaml = serde_yaml::to_string(&serde_yaml::Mapping::from_iter([(
            serde_yaml::Value::from("startup"),
            serde_yaml::to_value(startup).unwrap(),
        )]))
        .unwrap();
        let table = PolicyTable::from_yaml(&yaml).unwrap();
        assert_eq!(table.get(Tier::Startup).target_cost_ratio, 0.9);
        assert_eq!(table.medium, defaults.medium);
        assert_eq!(table.big_tech, defaults.big_tech);
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        assert!(PolicyTable::from_yaml("startup: [1, 2").is_err());
    }

    #[test]
    fn big_tech_hunts_wider() {
        let t = PolicyTable::default();
        let big = t.get(Tier::BigTech).acquisition.unwrap();
        assert_eq!(big.max_rank, QualityRank::Moderate);
        assert!(t.get(Tier::Startup).acquisition.is_none());
    }
}
