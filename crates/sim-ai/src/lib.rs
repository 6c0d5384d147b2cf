#![deny(warnings)]

//! Rule-based strategy for AI-run companies.
//!
//! One decision routine serves all four tiers; the differences between
//! them are data in a [`PolicyTable`]. Each pass borrows the world through
//! a [`StrategyContext`] handed out by the turn orchestrator.

pub mod actions;
pub mod board;
pub mod context;
pub mod policy;
pub mod staffing;

pub use actions::Figures;
pub use board::{BoardEntry, Holder, MarketBoard};
pub use context::StrategyContext;
pub use policy::{AcquisitionPolicy, BondPolicy, CampusPick, LoanTrigger, PolicyTable, TierPolicy};
pub use staffing::{
    fire_excess_employees, reassign_employees, target_headcount, unassign_weakest_first,
    AssignmentChange, FiringReport, SEVERANCE_PER_HEAD,
};

use rand::Rng;
use sim_core::{QualityRank, Tier};
use std::collections::BTreeMap;
use tracing::debug;

/// What became of an AI company this turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    Acted,
    /// Four quarters of negative cash; the caller must run the bankruptcy
    /// procedure.
    Bankrupt,
}

/// Run one quarter of decisions for the AI company at `idx`.
pub fn run_company_turn<R: Rng>(ctx: &mut StrategyContext<'_, R>, idx: usize) -> TurnOutcome {
    let c = &mut ctx.ai[idx];
    c.update_negative_cash_quarters();
    if c.is_bankrupt() {
        debug!(company = %c.name, cash = c.cash, "bankrupt, skipping turn");
        return TurnOutcome::Bankrupt;
    }
    let policy = *ctx.policies.get(c.tier.unwrap_or(Tier::Startup));
    let figures = Figures::of(c);

    actions::adjust_headcount(ctx, idx, &policy, figures);
    actions::expand_campus(ctx, idx, &policy);
    actions::manage_liquidity(ctx, idx, &policy, figures);
    actions::consider_new_product(ctx, idx, &policy, figures);
    if !actions::seek_acquisition(ctx, idx, &policy) {
        actions::invest_in_bond(ctx, idx, &policy, figures);
    }

    ctx.ai[idx].update_negative_cash_quarters();
    reassign_staff(ctx, idx);
    TurnOutcome::Acted
}

/// Re-partition staff by market rank and report every change as news.
fn reassign_staff<R: Rng>(ctx: &mut StrategyContext<'_, R>, idx: usize) {
    let c = &ctx.ai[idx];
    let ranks: BTreeMap<String, QualityRank> = c
        .products
        .iter()
        .map(|(name, p)| {
            let rank = ctx
                .market_index(&p.market)
                .and_then(|m| ctx.board(m).rank_of(&c.name, name))
                .unwrap_or(QualityRank::Moderate);
            (name.clone(), rank)
        })
        .collect();
    let changes = reassign_employees(&mut ctx.ai[idx], |name| {
        ranks.get(name).copied().unwrap_or(QualityRank::Moderate)
    });
    let company = ctx.ai[idx].name.clone();
    for ch in changes {
        let item = if ch.delta > 0 {
            format!(
                "{company} assigned {} additional employees to {} for product '{}'.",
                ch.delta,
                ch.department.key(),
                ch.product
            )
        } else {
            format!(
                "{company} removed {} employees from {} for product '{}'.",
                -ch.delta,
                ch.department.key(),
                ch.product
            )
        };
        ctx.push_news(item);
    }
}
