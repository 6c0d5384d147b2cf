//! Per-market revenue redistribution.
//!
//! Each quarter a market takes back a fixed slice of last quarter's revenue
//! as churn and hands it out again, together with the quarter's growth,
//! in proportion to each product's effectiveness.

use sim_core::{Market, Product};
use tracing::trace;

/// Share of last quarter's market revenue that changes hands each quarter.
pub const CHURN_RATE: f64 = 0.08;

/// A product taking part in a market's redistribution.
///
/// A frozen participant keeps its revenue untouched; it still counts
/// toward the market's total.
#[derive(Debug)]
pub struct Participant<'a> {
    pub product: &'a mut Product,
    pub frozen: bool,
}

impl<'a> Participant<'a> {
    pub fn new(product: &'a mut Product) -> Self {
        Self {
            product,
            frozen: false,
        }
    }

    pub fn frozen(product: &'a mut Product) -> Self {
        Self {
            product,
            frozen: true,
        }
    }
}

/// Pools and flows of one market's redistribution.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DistributionReport {
    pub participants: usize,
    /// Churn computed from last quarter's total.
    pub churn_pool: f64,
    /// New revenue from market growth; zero in recession.
    pub growth_pool: f64,
    /// Churn actually taken from eligible products.
    pub churn_deducted: f64,
    /// Revenue handed back out of both pools.
    pub redistributed: f64,
    /// Market revenue after the step.
    pub total_revenue: f64,
}

/// Run one quarter of redistribution over `participants` in `market`.
pub fn distribute_revenue(
    market: &mut Market,
    participants: &mut [Participant<'_>],
) -> DistributionReport {
    market.apply_recession();

    if participants.is_empty() {
        market.last_quarter_total_revenue = 0.0;
        return DistributionReport::default();
    }

    if market.last_quarter_total_revenue <= 0.0 {
        market.last_quarter_total_revenue = participants.iter().map(|p| p.product.revenue).sum();
    }

    let mut report = DistributionReport {
        participants: participants.len(),
        churn_pool: CHURN_RATE * market.last_quarter_total_revenue,
        growth_pool: market.growth_revenue(),
        ..DistributionReport::default()
    };

    let previous: Vec<f64> = participants.iter().map(|p| p.product.revenue).collect();

    for p in participants.iter_mut().filter(|p| !p.frozen) {
        p.product.update_effective_spend();
        p.product.update_effectiveness();
    }

    let mut total_effectiveness: f64 = participants
        .iter()
        .filter(|p| !p.frozen)
        .map(|p| p.product.effectiveness)
        .sum();
    if total_effectiveness <= 0.0 {
        total_effectiveness = 1.0;
    }

    let pool = report.churn_pool + report.growth_pool;
    for (p, before) in participants.iter_mut().zip(previous) {
        if p.frozen {
            continue;
        }
        let lost = p.product.revenue * CHURN_RATE;
        p.product.revenue -= lost;
        report.churn_deducted += lost;

        let gained = pool * p.product.effectiveness / total_effectiveness;
        p.product.revenue += gained;
        report.redistributed += gained;

        p.product.record_growth(before);
    }

    report.total_revenue = participants.iter().map(|p| p.product.revenue).sum();
    market.last_quarter_total_revenue = report.total_revenue;
    if !market.in_recession {
        market.size = report.total_revenue;
    }

    trace!(
        market = %market.name,
        churn = report.churn_pool,
        growth = report.growth_pool,
        total = report.total_revenue,
        "redistributed market revenue"
    );
    report
}
