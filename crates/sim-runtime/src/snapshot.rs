//! Full-state snapshots and restoring a game from one.

use crate::events::EventEngine;
use crate::{Game, GameOutcome, SimConfig};
use persistence::QuarterHistory;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use sim_core::{
    validate_world, Company, Market, NameGenerator, NewsFeed, PendingAcquisition, SyllableNames,
    ValidationError,
};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{info, warn};

/// Everything needed to resume a game. Derived values (loan payments) are
/// recomputed on load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub turn: u32,
    pub start_year: i32,
    pub game_over: bool,
    pub outcome: Option<GameOutcome>,
    pub player: Company,
    pub ai_companies: Vec<Company>,
    pub markets: Vec<Market>,
    pub events: EventEngine,
    pub spawned_ai: u32,
    pub spawned_markets: u32,
    pub used_company_names: BTreeSet<String>,
    pub used_product_names: BTreeSet<String>,
    pub pending_acquisitions: Vec<PendingAcquisition>,
    pub news: NewsFeed,
    pub competitor_news: NewsFeed,
    pub history: QuarterHistory,
}

#[derive(Debug, Error, PartialEq)]
pub enum SnapshotError {
    #[error("invalid snapshot: {0}")]
    Invalid(#[from] ValidationError),
    #[error("the player company is recorded with a tier")]
    PlayerHasTier,
    #[error("{spawned} markets spawned but only {available} are configured")]
    SpawnOverrun { spawned: u32, available: usize },
}

impl Game {
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            turn: self.turn,
            start_year: self.config.start_year,
            game_over: self.game_over,
            outcome: self.outcome,
            player: self.player.clone(),
            ai_companies: self.ai.clone(),
            markets: self.markets.clone(),
            events: self.events.clone(),
            spawned_ai: self.spawned_ai,
            spawned_markets: self.spawned_markets,
            used_company_names: self.used_company_names.clone(),
            used_product_names: self.used_product_names.clone(),
            pending_acquisitions: self.pending.clone(),
            news: self.news.clone(),
            competitor_news: self.competitor_news.clone(),
            history: self.history.clone(),
        }
    }

    /// Resume from `snapshot`. The random stream restarts from the
    /// configured seed mixed with the saved turn.
    pub fn restore(config: SimConfig, snapshot: GameSnapshot) -> Result<Self, SnapshotError> {
        Self::restore_with_names(config, snapshot, Box::new(SyllableNames))
    }

    pub fn restore_with_names(
        mut config: SimConfig,
        snapshot: GameSnapshot,
        names: Box<dyn NameGenerator>,
    ) -> Result<Self, SnapshotError> {
        if snapshot.player.tier.is_some() {
            return Err(SnapshotError::PlayerHasTier);
        }
        validate_world(
            &snapshot.markets,
            std::iter::once(&snapshot.player).chain(snapshot.ai_companies.iter()),
        )?;
        let available = config.spawn_markets.len();
        if usize::try_from(snapshot.spawned_markets).map_or(true, |n| n > available) {
            return Err(SnapshotError::SpawnOverrun {
                spawned: snapshot.spawned_markets,
                available,
            });
        }

        let known: BTreeSet<&str> = std::iter::once(snapshot.player.name.as_str())
            .chain(snapshot.ai_companies.iter().map(|c| c.name.as_str()))
            .collect();
        let (pending, orphaned): (Vec<_>, Vec<_>) = snapshot
            .pending_acquisitions
            .into_iter()
            .partition(|a| known.contains(a.buyer.as_str()));
        for a in &orphaned {
            warn!(buyer = %a.buyer, target = %a.target, "dropping acquisition with missing buyer");
        }

        config.start_year = snapshot.start_year;
        let seed = config.rng_seed.wrapping_add(u64::from(snapshot.turn));
        let game = Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            names,
            turn: snapshot.turn,
            game_over: snapshot.game_over,
            outcome: snapshot.outcome,
            player: snapshot.player,
            ai: snapshot.ai_companies,
            markets: snapshot.markets,
            events: snapshot.events,
            pending,
            used_company_names: snapshot.used_company_names,
            used_product_names: snapshot.used_product_names,
            news: snapshot.news,
            competitor_news: snapshot.competitor_news,
            spawned_ai: snapshot.spawned_ai,
            spawned_markets: snapshot.spawned_markets,
            history: snapshot.history,
            config,
        };
        info!(turn = game.turn, companies = game.ai.len(), "game restored");
        Ok(game)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn played(quarters: u32) -> Game {
        let mut g = Game::new(SimConfig::default().with_seed(77));
        g.found_company("Acme", "Cybersecurity", "Shieldr").unwrap();
        g.take_loan(250_000.0, 60, 0.11).unwrap();
        g.buy_bond(50_000.0, 8, 0.05).unwrap();
        g.run(quarters);
        g
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let g = played(5);
        let snap = g.snapshot();
        let json = serde_json::to_string(&snap).unwrap();
        let back: GameSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);

        let restored = Game::restore(SimConfig::default().with_seed(77), back).unwrap();
        assert_eq!(restored.snapshot(), snap);
        assert_eq!(
            restored.player().loans[0].monthly_payment(),
            g.player().loans[0].monthly_payment()
        );
    }

    #[test]
    fn orphaned_acquisitions_are_dropped() {
        let g = played(1);
        let mut snap = g.snapshot();
        let target = snap.ai_companies[0].name.clone();
        snap.pending_acquisitions.push(PendingAcquisition {
            buyer: "Long Gone Inc".into(),
            target: target.clone(),
            price: 1.0,
            turn_submitted: 0,
        });
        snap.pending_acquisitions.push(PendingAcquisition {
            buyer: "Acme".into(),
            target,
            price: 1.0,
            turn_submitted: 0,
        });
        let before = snap.pending_acquisitions.len();
        let restored = Game::restore(SimConfig::default(), snap).unwrap();
        assert_eq!(restored.pending_acquisitions().len(), before - 1);
        assert!(restored
            .pending_acquisitions()
            .iter()
            .all(|a| a.buyer != "Long Gone Inc"));
    }

    #[test]
    fn corrupt_market_fails_loudly() {
        let mut snap = played(1).snapshot();
        snap.markets[0].size = f64::NAN;
        let err = Game::restore(SimConfig::default(), snap).unwrap_err();
        assert_eq!(
            err,
            SnapshotError::Invalid(ValidationError::NonFinite("market.size"))
        );
    }

    #[test]
    fn product_in_missing_market_fails() {
        let mut snap = played(1).snapshot();
        let name = snap.markets[0].name.clone();
        snap.markets.retain(|m| m.name != name);
        let has_orphan = snap
            .ai_companies
            .iter()
            .chain(std::iter::once(&snap.player))
            .any(|c| c.has_product_in(&name));
        let result = Game::restore(SimConfig::default(), snap);
        if has_orphan {
            assert!(matches!(result, Err(SnapshotError::Invalid(_))));
        }
    }

    #[test]
    fn spawn_counter_must_fit_config() {
        let mut snap = played(1).snapshot();
        snap.spawned_markets = 13;
        assert_eq!(
            Game::restore(SimConfig::default(), snap).unwrap_err(),
            SnapshotError::SpawnOverrun {
                spawned: 13,
                available: 12
            }
        );
    }

    #[test]
    fn restored_game_keeps_playing() {
        let g = played(3);
        let mut restored = Game::restore(SimConfig::default().with_seed(77), g.snapshot()).unwrap();
        let summary = restored.step();
        assert_eq!(summary.turn, 3);
        assert_eq!(restored.turn(), 4);
        assert_eq!(restored.history().len(), 4);
    }
}
