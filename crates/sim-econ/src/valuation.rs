use sim_core::Company;

/// Premium over annualized revenue plus net assets paid for a takeover.
pub const ACQUISITION_PREMIUM: f64 = 1.3;

/// Price to acquire `target`: the premium over annualized revenue and net
/// assets, never below its current market cap.
///
/// Example:
/// a target with no history, $100k revenue this quarter, $1M cash and a
/// $2M market cap is quoted `max(1.3 × (400k + 1M), 2M) = 2M`.
pub fn acquisition_price(target: &Company) -> f64 {
    let fundamentals = target.annualized_revenue() + target.net_assets();
    (ACQUISITION_PREMIUM * fundamentals).max(target.market_cap)
}
