//! Rolling per-quarter records of the world, kept for charts and review.

use serde::{Deserialize, Serialize};
use sim_core::{Bond, Company, Market, QuarterDate, RollingWindow, Tier};

/// Quarters retained by [`QuarterHistory`].
pub const HISTORY_QUARTERS: usize = 10;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: String,
    pub market: String,
    pub revenue: f64,
    pub effectiveness: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub name: String,
    pub tier: Option<Tier>,
    pub cash: f64,
    pub market_cap: f64,
    pub employees: u32,
    pub revenue: f64,
    pub profit: f64,
    pub products: Vec<ProductRecord>,
    pub bonds: Vec<Bond>,
}

impl From<&Company> for CompanyRecord {
    fn from(c: &Company) -> Self {
        Self {
            name: c.name.clone(),
            tier: c.tier,
            cash: c.cash,
            market_cap: c.market_cap,
            employees: c.employees,
            revenue: c.total_revenue(),
            profit: c.past_profits.latest().copied().unwrap_or(0.0),
            products: c
                .products
                .iter()
                .map(|(name, p)| ProductRecord {
                    name: name.clone(),
                    market: p.market.clone(),
                    revenue: p.revenue,
                    effectiveness: p.effectiveness,
                })
                .collect(),
            bonds: c.bonds.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketRecord {
    pub name: String,
    pub size: f64,
    pub growth_rate: f64,
    pub in_recession: bool,
}

impl From<&Market> for MarketRecord {
    fn from(m: &Market) -> Self {
        Self {
            name: m.name.clone(),
            size: m.size,
            growth_rate: m.growth_rate,
            in_recession: m.in_recession,
        }
    }
}

/// The world at the end of one quarter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuarterRecord {
    pub turn: u32,
    pub date: QuarterDate,
    pub companies: Vec<CompanyRecord>,
    pub markets: Vec<MarketRecord>,
}

/// The last [`HISTORY_QUARTERS`] quarter records, oldest first.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuarterHistory {
    records: RollingWindow<QuarterRecord, HISTORY_QUARTERS>,
}

impl QuarterHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the state after `turn`, evicting the oldest quarter if full.
    pub fn record<'a>(
        &mut self,
        turn: u32,
        start_year: i32,
        markets: &[Market],
        companies: impl IntoIterator<Item = &'a Company>,
    ) {
        self.records.push(QuarterRecord {
            turn,
            date: QuarterDate::from_turn(start_year, turn),
            companies: companies.into_iter().map(CompanyRecord::from).collect(),
            markets: markets.iter().map(MarketRecord::from).collect(),
        });
    }

    pub fn latest(&self) -> Option<&QuarterRecord> {
        self.records.latest()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &QuarterRecord> + '_ {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// One company's cash across the retained quarters, oldest first.
    pub fn cash_series(&self, company: &str) -> Vec<f64> {
        self.records
            .iter()
            .filter_map(|r| r.companies.iter().find(|c| c.name == company))
            .map(|c| c.cash)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sim_core::Product;

    fn world(cash: f64) -> (Vec<Market>, Vec<Company>) {
        let mut c = Company::new("Player Co", None);
        c.cash = cash;
        c.products
            .insert("Ember".into(), Product::new("Player Co", "AI").with_revenue(10.0));
        (vec![Market::new("AI", 1e7, 0.1)], vec![c])
    }

    #[test]
    fn record_captures_company_and_market() {
        let (markets, companies) = world(5.0);
        let mut h = QuarterHistory::new();
        h.record(5, 2000, &markets, &companies);
        let r = h.latest().unwrap();
        assert_eq!(r.date, QuarterDate::from_turn(2000, 5));
        assert_eq!(r.companies[0].revenue, 10.0);
        assert_eq!(r.companies[0].products[0].name, "Ember");
        assert_eq!(r.markets[0].name, "AI");
    }

    proptest! {
        #[test]
        fn keeps_only_the_latest_quarters(n in 0u32..40) {
            let mut h = QuarterHistory::new();
            for turn in 0..n {
                let (markets, companies) = world(f64::from(turn));
                h.record(turn, 2000, &markets, &companies);
            }
            prop_assert_eq!(h.len(), (n as usize).min(HISTORY_QUARTERS));
            let series = h.cash_series("Player Co");
            let first = n.saturating_sub(HISTORY_QUARTERS as u32);
            let expected: Vec<f64> = (first..n).map(f64::from).collect();
            prop_assert_eq!(series, expected);
        }
    }
}
