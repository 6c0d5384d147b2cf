use crate::board::{Holder, MarketBoard};
use crate::policy::PolicyTable;
use rand::Rng;
use sim_core::{Company, Market, NameGenerator, NewsFeed, PendingAcquisition, Product};
use std::collections::BTreeSet;

/// Everything one AI pass may read or mutate, lent out by the turn
/// orchestrator for the duration of the pass.
pub struct StrategyContext<'a, R: Rng> {
    pub turn: u32,
    pub markets: &'a mut [Market],
    pub player: &'a mut Company,
    pub ai: &'a mut [Company],
    pub pending: &'a mut Vec<PendingAcquisition>,
    pub used_product_names: &'a mut BTreeSet<String>,
    pub names: &'a mut dyn NameGenerator,
    pub news: &'a mut NewsFeed,
    pub rng: &'a mut R,
    pub policies: &'a PolicyTable,
}

impl<'a, R: Rng> StrategyContext<'a, R> {
    pub fn push_news(&mut self, item: String) {
        self.news.push(item);
    }

    pub fn board(&self, market: usize) -> MarketBoard {
        MarketBoard::collect(&self.markets[market], &*self.player, &*self.ai)
    }

    pub fn market_index(&self, name: &str) -> Option<usize> {
        self.markets.iter().position(|m| m.name == name)
    }

    /// Mutable access to a product found on a market board.
    pub fn product_mut(
        &mut self,
        market: usize,
        holder: Holder,
        product: &str,
    ) -> Option<&mut Product> {
        match holder {
            Holder::Player => self.player.products.get_mut(product),
            Holder::Ai(i) => self.ai.get_mut(i)?.products.get_mut(product),
            Holder::Imaginary => self.markets.get_mut(market)?.imaginary_product.as_mut(),
        }
    }

    /// Fresh product name, recorded as used.
    pub fn fresh_product_name(&mut self) -> String {
        let name = self.names.product_name(self.used_product_names, &mut *self.rng);
        self.used_product_names.insert(name.clone());
        name
    }
}
