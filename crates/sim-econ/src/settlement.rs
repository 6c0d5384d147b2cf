//! Quarterly financial settlement.

use sim_core::Company;
use tracing::debug;

/// Figures produced by settling one company for one quarter.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Settlement {
    pub bond_interest: f64,
    pub bonds_matured: usize,
    pub principal_returned: f64,
    pub revenue: f64,
    pub profit: f64,
    pub market_cap: f64,
    pub loan_payment: f64,
    pub loans_retired: usize,
}

/// Settle one company's quarter.
///
/// Fixed order: bond coupons and maturities, profit, market cap, then loan
/// amortization. The market cap therefore reflects pre-amortization assets.
pub fn settle_company(c: &mut Company) -> Settlement {
    let mut s = Settlement::default();

    c.bonds.retain_mut(|b| {
        s.bond_interest += b.quarterly_interest();
        b.term_remaining = b.term_remaining.saturating_sub(1);
        if b.term_remaining == 0 {
            s.principal_returned += b.principal;
            s.bonds_matured += 1;
            false
        } else {
            true
        }
    });
    c.cash += s.bond_interest + s.principal_returned;

    s.revenue = c.total_revenue();
    s.profit = c.quarterly_profit();
    c.cash += s.profit;
    c.past_profits.push(s.profit);
    c.past_revenues.push(s.revenue);

    s.market_cap = (c.net_assets() + c.annualized_revenue()).max(0.0);
    c.market_cap = s.market_cap;

    for loan in &mut c.loans {
        s.loan_payment += loan.amortize_quarter().payment;
    }
    let before = c.loans.len();
    c.loans.retain(|l| !l.is_retired());
    s.loans_retired = before - c.loans.len();
    c.cash -= s.loan_payment;

    debug!(
        company = %c.name,
        profit = s.profit,
        market_cap = s.market_cap,
        cash = c.cash,
        "settled quarter"
    );
    s
}

/// Settle every company in iteration order.
pub fn settle_all<'a>(companies: impl IntoIterator<Item = &'a mut Company>) -> usize {
    let mut settled = 0;
    for c in companies {
        settle_company(c);
        settled += 1;
    }
    settled
}
