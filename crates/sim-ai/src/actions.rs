//! Individual AI moves. Each checks its own preconditions and does nothing
//! when they do not hold.

use crate::board::Holder;
use crate::context::StrategyContext;
use crate::policy::{CampusPick, TierPolicy};
use crate::staffing::{fire_excess_employees, target_headcount};
use rand::Rng;
use sim_core::{
    format_money, Bond, CampusSpec, Company, Loan, PendingAcquisition, Product, Staffing,
    CAMPUS_CATALOG,
};
use sim_econ::acquisition_price;
use std::cmp::Ordering;
use tracing::debug;

/// Loans are capped at this multiple of quarterly revenue.
pub const LOAN_REVENUE_MULTIPLE: f64 = 4.0;
pub const MIN_LOAN: f64 = 100_000.0;
pub const LOAN_BASE_RATE: f64 = 0.09;
/// Added to the rate for every loan already on the books.
pub const LOAN_RATE_STEP: f64 = 0.01;
pub const LOAN_TERM_MONTHS: i32 = 60;
/// Share of cash put into a bond.
pub const BOND_CASH_SHARE: f64 = 0.25;
pub const MIN_BOND: f64 = 100_000.0;
/// Entry cost as a multiple of market size.
pub const ENTRY_COST_FACTOR: f64 = 0.05 * 4.0;
/// New products start this far below the weakest incumbent.
pub const ENTRY_SEED_DISCOUNT: f64 = 0.4;
/// Revenue a new product takes over from the market's top earner.
pub const ENTRY_SIPHON: f64 = 10_000.0;
pub const ENTRY_STAFFING: Staffing = Staffing::new(2, 1, 2);

/// A company's figures read once, before it makes any move.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Figures {
    pub revenue: f64,
    pub profit: f64,
    pub liquidity: f64,
}

impl Figures {
    pub fn of(c: &Company) -> Self {
        Self {
            revenue: c.total_revenue(),
            profit: c.quarterly_profit(),
            liquidity: c.liquidity_ratio(),
        }
    }
}

pub fn entry_cost(market_size: f64) -> f64 {
    market_size * ENTRY_COST_FACTOR
}

/// Hire toward the target headcount, or lay off when losing money with too
/// many staff.
pub fn adjust_headcount<R: Rng>(
    ctx: &mut StrategyContext<'_, R>,
    idx: usize,
    policy: &TierPolicy,
    f: Figures,
) {
    let target = target_headcount(policy.target_cost_ratio, f.revenue);
    let c = &mut ctx.ai[idx];
    if c.employees < target {
        let hires = (target - c.employees).min(c.free_capacity());
        if c.cash > f.revenue * policy.hire_cash_buffer && hires > 0 {
            c.employees += hires;
            debug!(company = %c.name, hires, target, "hiring");
            let item = format!("{} hires {hires} new employees.", c.name);
            ctx.push_news(item);
        }
    } else if f.profit < 0.0
        && f64::from(c.employees) > (f64::from(target) * policy.fire_trigger).floor()
    {
        let report = fire_excess_employees(c, target);
        let name = c.name.clone();
        debug!(company = %name, ?report, target, "layoff");
        if report.fired > 0 {
            ctx.push_news(format!(
                "{name} fired {} employees, incurring {} in severance costs.",
                report.fired,
                format_money(report.severance)
            ));
        }
        if report.released > 0 {
            ctx.push_news(format!(
                "{name} released {} employees due to campus capacity limits.",
                report.released
            ));
        }
    }
}

/// Buy a campus when seats run short and cash allows.
pub fn expand_campus<R: Rng>(ctx: &mut StrategyContext<'_, R>, idx: usize, policy: &TierPolicy) {
    let c = &ctx.ai[idx];
    let capacity = f64::from(c.employee_capacity());
    let remaining = capacity - f64::from(c.employees);
    if capacity > 0.0
        && remaining < policy.campus_slack * capacity
        && c.cash > policy.campus_cash_floor
    {
        build_campus(ctx, idx, policy.campus_pick);
    }
}

/// Buy the `pick` entry of the catalog campuses cheaper than current cash.
pub fn build_campus<R: Rng>(
    ctx: &mut StrategyContext<'_, R>,
    idx: usize,
    pick: CampusPick,
) -> Option<&'static CampusSpec> {
    let c = &mut ctx.ai[idx];
    let mut affordable: Vec<&'static CampusSpec> =
        CAMPUS_CATALOG.iter().filter(|s| s.cost < c.cash).collect();
    if affordable.is_empty() {
        return None;
    }
    affordable.sort_by(|a, b| a.cost.partial_cmp(&b.cost).unwrap_or(Ordering::Equal));
    let spec = affordable[pick.index(affordable.len())];
    c.cash -= spec.cost;
    c.campuses.push(spec.build());
    let item = format!(
        "{} built a new campus: {} for {}.",
        c.name,
        spec.name,
        format_money(spec.cost)
    );
    ctx.push_news(item);
    Some(spec)
}

pub fn manage_liquidity<R: Rng>(
    ctx: &mut StrategyContext<'_, R>,
    idx: usize,
    policy: &TierPolicy,
    f: Figures,
) {
    if let Some(emergency) = policy.loan.check(&ctx.ai[idx], f.liquidity) {
        take_loan(ctx, idx, emergency);
    }
}

/// Borrow against quarterly revenue. Returns the amount borrowed.
pub fn take_loan<R: Rng>(
    ctx: &mut StrategyContext<'_, R>,
    idx: usize,
    emergency: bool,
) -> Option<f64> {
    let c = &mut ctx.ai[idx];
    let limit = c.total_revenue() * LOAN_REVENUE_MULTIPLE;
    if limit < MIN_LOAN {
        return None;
    }
    let amount = if emergency { limit } else { limit * 0.5 };
    let rate = LOAN_BASE_RATE + LOAN_RATE_STEP * c.loans.len() as f64;
    c.loans.push(Loan::new(amount, rate, LOAN_TERM_MONTHS));
    c.cash += amount;
    let item = format!(
        "{} took a loan of {} at {:.1}% interest.",
        c.name,
        format_money(amount),
        rate * 100.0
    );
    ctx.push_news(item);
    Some(amount)
}

/// Markets the company has no product in.
fn open_markets<R: Rng>(ctx: &StrategyContext<'_, R>, idx: usize) -> Vec<usize> {
    let c = &ctx.ai[idx];
    ctx.markets
        .iter()
        .enumerate()
        .filter(|(_, m)| !c.has_product_in(&m.name))
        .map(|(i, _)| i)
        .collect()
}

/// Look at one random market the company is not in and enter a market if
/// the company is profitable and rich enough.
pub fn consider_new_product<R: Rng>(
    ctx: &mut StrategyContext<'_, R>,
    idx: usize,
    policy: &TierPolicy,
    f: Figures,
) {
    let candidates = open_markets(ctx, idx);
    if candidates.is_empty() {
        return;
    }
    let sampled = candidates[ctx.rng.gen_range(0..candidates.len())];
    let cost = entry_cost(ctx.markets[sampled].size);
    if ctx.ai[idx].cash > cost * policy.entry_cash_multiple && f.profit > 0.0 {
        open_new_product(ctx, idx, policy.entry_cost_fraction);
    }
}

/// Launch a product in a random market the company is not in, provided the
/// entry cost stays below `cost_fraction` of cash. Returns the product name.
pub fn open_new_product<R: Rng>(
    ctx: &mut StrategyContext<'_, R>,
    idx: usize,
    cost_fraction: f64,
) -> Option<String> {
    let candidates = open_markets(ctx, idx);
    if candidates.is_empty() {
        return None;
    }
    let m = candidates[ctx.rng.gen_range(0..candidates.len())];
    let cost = entry_cost(ctx.markets[m].size);
    let cash = ctx.ai[idx].cash;
    if !(cost < cash * cost_fraction && cash >= cost) {
        return None;
    }

    ctx.ai[idx].cash -= cost;
    let owner = ctx.ai[idx].name.clone();
    let market = ctx.markets[m].name.clone();
    let mut product = Product::new(owner.clone(), market.clone()).with_staffing(ENTRY_STAFFING);

    let board = ctx.board(m);
    if let Some(weakest) = board.weakest_effectiveness() {
        product.effectiveness = (weakest * (1.0 - ENTRY_SEED_DISCOUNT)).max(0.0);
        if let Some(top) = board.top_earner(|_| true) {
            if top.revenue > ENTRY_SIPHON {
                if let Some(p) = ctx.product_mut(m, top.holder, &top.product) {
                    p.revenue -= ENTRY_SIPHON;
                    product.revenue = ENTRY_SIPHON;
                }
            }
        }
    }

    let name = ctx.fresh_product_name();
    ctx.ai[idx].products.insert(name.clone(), product);
    debug!(company = %owner, product = %name, %market, cost, "entered market");
    ctx.push_news(format!(
        "{owner} opened a new product in {market} for {}.",
        format_money(cost)
    ));
    Some(name)
}

/// Submit at most one takeover of a competitor whose product outranks one
/// of ours. Returns whether an acquisition was submitted.
pub fn seek_acquisition<R: Rng>(
    ctx: &mut StrategyContext<'_, R>,
    idx: usize,
    policy: &TierPolicy,
) -> bool {
    let Some(acq) = policy.acquisition else {
        return false;
    };
    let turn = ctx.turn;
    let c = &ctx.ai[idx];
    if turn < acq.min_turn || i64::from(turn) - c.last_acquisition_turn < acq.cooldown {
        return false;
    }
    let buyer = c.name.clone();
    let owned: Vec<(String, String)> = c
        .products
        .iter()
        .map(|(name, p)| (name.clone(), p.market.clone()))
        .collect();

    for (product, market) in owned {
        let Some(m) = ctx.market_index(&market) else {
            continue;
        };
        let board = ctx.board(m);
        match board.rank_of(&buyer, &product) {
            Some(rank) if rank <= acq.max_rank => {}
            _ => continue,
        }
        for entry in board.entries() {
            if entry.owner == buyer || !entry.rank.is_strong() {
                continue;
            }
            let Holder::Ai(t) = entry.holder else {
                continue;
            };
            let price = acquisition_price(&ctx.ai[t]);
            if ctx.ai[idx].cash < price {
                continue;
            }
            let target = ctx.ai[t].name.clone();
            ctx.ai[idx].last_acquisition_turn = i64::from(turn);
            ctx.pending.push(PendingAcquisition {
                buyer: buyer.clone(),
                target: target.clone(),
                price,
                turn_submitted: turn,
            });
            debug!(%buyer, %target, price, "acquisition submitted");
            ctx.push_news(format!("{buyer} initiates acquisition of {target}!"));
            return true;
        }
    }
    false
}

/// Occasionally park surplus cash in a bond.
pub fn invest_in_bond<R: Rng>(
    ctx: &mut StrategyContext<'_, R>,
    idx: usize,
    policy: &TierPolicy,
    f: Figures,
) {
    let bond = policy.bond;
    let cash = ctx.ai[idx].cash;
    if cash > f.revenue * bond.revenue_multiple
        && cash > bond.cash_floor
        && ctx.rng.gen::<f64>() < bond.probability
    {
        buy_bond(ctx, idx, bond.term_quarters, bond.annual_rate);
    }
}

/// Put a quarter of cash into a bond. Returns the amount invested.
pub fn buy_bond<R: Rng>(
    ctx: &mut StrategyContext<'_, R>,
    idx: usize,
    term_quarters: u32,
    annual_rate: f64,
) -> Option<f64> {
    let c = &mut ctx.ai[idx];
    let invest = c.cash * BOND_CASH_SHARE;
    if invest < MIN_BOND {
        return None;
    }
    c.cash -= invest;
    c.bonds.push(Bond::new(invest, annual_rate, term_quarters));
    let item = format!(
        "{} purchased a {term_quarters}-quarter bond at {:.1}% for {}.",
        c.name,
        annual_rate * 100.0,
        format_money(invest)
    );
    ctx.push_news(item);
    Some(invest)
}
