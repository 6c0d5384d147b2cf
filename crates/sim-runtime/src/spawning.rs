//! Populating the world: the opening roster, opening market shares, and
//! the competitors and markets that appear as the game goes on.

use crate::config::Span;
use crate::Game;
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use sim_core::{format_whole_dollars, Company, Market, Product, Staffing, Tier};
use sim_econ::{allocate_opening_revenue, Incumbent};
use tracing::{info, warn};

/// Staff per function on each opening-roster product.
const OPENING_STAFF: Span<u32> = Span::new(1, 3);

/// Staffing of every product a spawned company starts with.
pub const SPAWN_STAFFING: Staffing = Staffing::new(1, 1, 1);

/// Revenue of every product a spawned company starts with.
pub const SPAWN_REVENUE: f64 = 1_000.0;

/// Revenue taken from a market's leader for each spawned product.
pub const SPAWN_SIPHON: f64 = 1_000.0;

const SPAWN_MARKET_SIZE: Span<f64> = Span::new(500_000.0, 5_000_000.0);
const SPAWN_MARKET_GROWTH: Span<f64> = Span::new(0.10, 0.15);

/// How a new market's growth is announced.
pub fn growth_label(growth: f64) -> &'static str {
    if growth <= 0.11 {
        "Moderate"
    } else if growth <= 0.13 {
        "Good"
    } else {
        "Very Good"
    }
}

impl Game {
    /// Create the opening AI roster described by the config.
    pub(crate) fn populate_roster(&mut self) {
        let roster = self.config.roster.clone();
        for entry in &roster {
            for _ in 0..entry.count {
                let name = self.fresh_company_name();
                let mut c = Company::new(name.clone(), Some(entry.tier));
                c.campuses.push(entry.campus.clone());
                c.employees = entry.employees.sample(&mut self.rng);
                c.cash = entry.cash.sample(&mut self.rng);
                for market in self.sample_opening_markets(entry.markets) {
                    let staffing = Staffing::new(
                        OPENING_STAFF.sample(&mut self.rng),
                        OPENING_STAFF.sample(&mut self.rng),
                        OPENING_STAFF.sample(&mut self.rng),
                    );
                    let product = self.fresh_product_name();
                    c.products.insert(
                        product,
                        Product::new(name.clone(), market).with_staffing(staffing),
                    );
                }
                self.ai.push(c);
            }
        }
    }

    /// Split each market's first quarter of revenue between everyone
    /// present, the player weighted as a startup.
    pub(crate) fn allocate_opening_shares(&mut self) {
        let player_weight = Tier::Startup.opening_share_weight();
        for market in &self.markets {
            let mut incumbents = Vec::with_capacity(self.ai.len() + 1);
            incumbents.push(Incumbent {
                weight: player_weight,
                products: self
                    .player
                    .products
                    .values_mut()
                    .filter(|p| p.market == market.name)
                    .collect(),
            });
            for c in self.ai.iter_mut() {
                let weight = c.tier.unwrap_or(Tier::Startup).opening_share_weight();
                let products = c
                    .products
                    .values_mut()
                    .filter(|p| p.market == market.name)
                    .collect();
                incumbents.push(Incumbent { weight, products });
            }
            allocate_opening_revenue(market.size, incumbents);
        }
    }

    /// Up to `count` distinct opening markets, drawn without replacement.
    fn sample_opening_markets(&mut self, count: usize) -> Vec<String> {
        let opening = self.config.initial_markets.len().min(self.markets.len());
        self.markets[..opening]
            .choose_multiple(&mut self.rng, count)
            .map(|m| m.name.clone())
            .collect()
    }

    /// Take up to `amount` of revenue from the highest-earning product in
    /// `market`. AI products are searched before the player's and the first
    /// of equal earners is hit.
    fn siphon_leader(&mut self, market: &str, amount: f64) {
        let mut leader: Option<&mut Product> = None;
        let products = self
            .ai
            .iter_mut()
            .flat_map(|c| c.products.values_mut())
            .chain(self.player.products.values_mut());
        for p in products {
            let best = leader.as_ref().map_or(0.0, |l| l.revenue);
            if p.market == market && p.revenue > best {
                leader = Some(p);
            }
        }
        if let Some(p) = leader {
            p.revenue -= p.revenue.min(amount);
        }
    }

    /// Spawn this cadence's competitors. Returns how many arrived.
    pub(crate) fn spawn_companies(&mut self) -> u32 {
        let profiles = self.config.spawn.profiles.clone();
        let dist = match WeightedIndex::new(profiles.iter().map(|p| p.weight)) {
            Ok(d) => d,
            Err(err) => {
                warn!(%err, "no usable spawn profiles");
                return 0;
            }
        };
        let mut spawned = 0;
        for _ in 0..self.config.spawn.companies {
            if self.spawned_ai >= self.config.spawn.cap {
                break;
            }
            let profile = &profiles[dist.sample(&mut self.rng)];
            let name = self.fresh_company_name();
            let mut c = Company::new(name.clone(), Some(profile.tier));
            c.campuses.push(profile.campus.clone());
            c.employees = profile.employees.sample(&mut self.rng);
            c.cash = profile.cash.sample(&mut self.rng);
            for market in self.sample_opening_markets(profile.products) {
                self.siphon_leader(&market, SPAWN_SIPHON);
                c.employees = c.employees.saturating_add(SPAWN_STAFFING.total());
                let product = self.fresh_product_name();
                c.products.insert(
                    product,
                    Product::new(name.clone(), market)
                        .with_staffing(SPAWN_STAFFING)
                        .with_revenue(SPAWN_REVENUE),
                );
            }
            info!(company = %name, tier = %profile.tier, turn = self.turn, "competitor spawned");
            self.news.push(format!(
                "NEW COMPETITOR ALERT! {name} COMPANY SIZE: {}",
                profile.tier
            ));
            self.ai.push(c);
            self.spawned_ai += 1;
            spawned += 1;
        }
        spawned
    }

    /// Introduce the next configured market, if any are left.
    pub(crate) fn spawn_market(&mut self) -> Option<String> {
        let idx = usize::try_from(self.spawned_markets).ok()?;
        let name = self.config.spawn_markets.get(idx)?.clone();
        self.spawned_markets += 1;
        if self.markets.iter().any(|m| m.name == name) {
            warn!(market = %name, "spawn market already exists, skipping");
            return None;
        }
        let size = SPAWN_MARKET_SIZE.sample(&mut self.rng);
        let growth = SPAWN_MARKET_GROWTH.sample(&mut self.rng);
        self.markets.push(Market::spawned(name.clone(), size, growth));
        info!(market = %name, size, growth, "market spawned");
        self.news.push(format!(
            "NEW PRODUCT MARKET! {name} SIZE: ~{} GROWTH: {}",
            format_whole_dollars(size),
            growth_label(growth)
        ));
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimConfig;
    use sim_core::IMAGINARY_OWNER;

    fn game() -> Game {
        Game::new(SimConfig::default().with_seed(5))
    }

    #[test]
    fn growth_labels() {
        assert_eq!(growth_label(0.10), "Moderate");
        assert_eq!(growth_label(0.12), "Good");
        assert_eq!(growth_label(0.149), "Very Good");
    }

    #[test]
    fn opening_products_are_staffed_one_to_three() {
        let g = game();
        for c in g.ai_companies() {
            for p in c.products.values() {
                for n in [p.staffing.rnd, p.staffing.qa, p.staffing.marketing] {
                    assert!((1..=3).contains(&n));
                }
                assert_eq!(p.owner, c.name);
            }
            let markets: std::collections::BTreeSet<_> =
                c.products.values().map(|p| p.market.as_str()).collect();
            assert_eq!(markets.len(), c.products.len(), "{} doubled up", c.name);
        }
    }

    #[test]
    fn spawned_company_siphons_market_leaders() {
        let mut g = game();
        let before: f64 = g
            .ai_companies()
            .iter()
            .flat_map(|c| c.products.values())
            .map(|p| p.revenue)
            .sum();
        let spawned = g.spawn_companies();
        assert_eq!(spawned, 3);
        assert_eq!(g.ai_companies().len(), 23);
        let newcomers = &g.ai_companies()[20..];
        let new_products: usize = newcomers.iter().map(|c| c.products.len()).sum();
        let after: f64 = g.ai_companies()[..20]
            .iter()
            .flat_map(|c| c.products.values())
            .map(|p| p.revenue)
            .sum();
        assert!((before - after - SPAWN_SIPHON * new_products as f64).abs() < 1e-6);
        for c in newcomers {
            assert!(c.products.values().all(|p| p.revenue == SPAWN_REVENUE));
            assert!(g
                .news()
                .iter()
                .any(|n| n.starts_with(&format!("NEW COMPETITOR ALERT! {}", c.name))));
        }
    }

    #[test]
    fn spawn_cap_is_respected() {
        let mut g = game();
        g.config.spawn.cap = 4;
        assert_eq!(g.spawn_companies(), 3);
        assert_eq!(g.spawn_companies(), 1);
        assert_eq!(g.spawn_companies(), 0);
        assert_eq!(g.spawned_companies(), 4);
    }

    #[test]
    fn markets_spawn_in_order_until_exhausted() {
        let mut g = game();
        g.config.spawn_markets = vec!["Wearables".into(), "Blockchain".into()];
        assert_eq!(g.spawn_market().as_deref(), Some("Wearables"));
        assert_eq!(g.spawn_market().as_deref(), Some("Blockchain"));
        assert_eq!(g.spawn_market(), None);
        let m = g.market("Wearables").unwrap();
        assert!((500_000.0..5_000_000.0).contains(&m.size));
        assert!((0.10..0.15).contains(&m.base_growth_rate));
        let imaginary = m.imaginary_product.as_ref().unwrap();
        assert_eq!(imaginary.owner, IMAGINARY_OWNER);
        assert_eq!(imaginary.revenue, m.size);
        assert!(g.news().iter().any(|n| n.starts_with("NEW PRODUCT MARKET! Wearables SIZE: ~$")));
    }
}
