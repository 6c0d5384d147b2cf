use sim_core::Product;

/// A company's products in one market, weighted by its size class.
pub struct Incumbent<'a> {
    pub weight: f64,
    pub products: Vec<&'a mut Product>,
}

/// Split a market's first quarter of revenue (`market_size / 4`) between
/// incumbents by weight, evenly across each incumbent's products.
///
/// Existing revenue is replaced, so re-running the split after a new
/// incumbent joins reproduces a fresh opening allocation.
pub fn allocate_opening_revenue(market_size: f64, incumbents: Vec<Incumbent<'_>>) {
    let total_weight: f64 = incumbents
        .iter()
        .filter(|i| !i.products.is_empty())
        .map(|i| i.weight)
        .sum();
    if total_weight <= 0.0 {
        return;
    }
    let first_quarter = market_size / 4.0;
    for incumbent in incumbents {
        if incumbent.products.is_empty() {
            continue;
        }
        let share = first_quarter * incumbent.weight / total_weight;
        let each = share / incumbent.products.len() as f64;
        for p in incumbent.products {
            p.revenue = each;
        }
    }
}
