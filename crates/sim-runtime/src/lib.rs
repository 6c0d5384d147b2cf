#![deny(warnings)]

//! Turn orchestration for the Technopoly simulation.
//!
//! A [`Game`] owns the whole world (player, AI roster, markets, event
//! engine, pending acquisitions, news feeds) and advances it one quarter
//! per [`Game::step`]. Player commands live in [`commands`]; snapshots in
//! [`snapshot`].

pub mod acquisitions;
pub mod commands;
pub mod config;
pub mod events;
pub mod snapshot;
pub mod spawning;

pub use acquisitions::{BankruptcyOutcome, Party, ResolutionReport, Roster};
pub use commands::{CommandError, CommandOutcome};
pub use config::{PlayerConfig, RosterEntry, SimConfig, Span, SpawnConfig, SpawnProfile};
pub use events::EventEngine;
pub use snapshot::{GameSnapshot, SnapshotError};

use persistence::QuarterHistory;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use sim_ai::{StrategyContext, TurnOutcome};
use sim_core::{
    Company, Market, NameGenerator, NewsFeed, PendingAcquisition, QuarterDate, SyllableNames,
};
use sim_econ::{distribute_revenue, Participant};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info};

/// Market-cap share above which the player wins outright.
pub const DOMINANCE_SHARE: f64 = 0.7;

/// How a game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    /// Four straight quarters of negative cash.
    PlayerBankrupt,
    /// No AI company is left.
    Monopoly,
    /// The player holds more than [`DOMINANCE_SHARE`] of all market cap.
    MarketDominance,
}

impl GameOutcome {
    pub const fn is_win(self) -> bool {
        !matches!(self, GameOutcome::PlayerBankrupt)
    }

    pub const fn message(self) -> &'static str {
        match self {
            GameOutcome::PlayerBankrupt => {
                "You lost! Your investors shut you down because your cash was \
                 negative 4 consecutive quarters."
            }
            GameOutcome::Monopoly => "You acquired all of your competitors. Technopoly!",
            GameOutcome::MarketDominance => {
                "You got 70 percent of the market's total market capitalization. Technopoly!"
            }
        }
    }
}

/// What happened during one call to [`Game::step`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnSummary {
    /// Turn that was played.
    pub turn: u32,
    pub event: Option<String>,
    pub acquisitions: u32,
    pub failed_acquisitions: u32,
    pub bankruptcies: u32,
    pub spawned_companies: u32,
    pub spawned_market: Option<String>,
    pub outcome: Option<GameOutcome>,
}

/// A running game.
pub struct Game {
    pub(crate) config: SimConfig,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) names: Box<dyn NameGenerator>,
    pub(crate) turn: u32,
    pub(crate) game_over: bool,
    pub(crate) outcome: Option<GameOutcome>,
    pub(crate) player: Company,
    pub(crate) ai: Vec<Company>,
    pub(crate) markets: Vec<Market>,
    pub(crate) events: EventEngine,
    pub(crate) pending: Vec<PendingAcquisition>,
    pub(crate) used_company_names: BTreeSet<String>,
    pub(crate) used_product_names: BTreeSet<String>,
    pub(crate) news: NewsFeed,
    pub(crate) competitor_news: NewsFeed,
    pub(crate) spawned_ai: u32,
    pub(crate) spawned_markets: u32,
    pub(crate) history: QuarterHistory,
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("turn", &self.turn)
            .field("game_over", &self.game_over)
            .field("player", &self.player.name)
            .field("ai", &self.ai.len())
            .field("markets", &self.markets.len())
            .finish_non_exhaustive()
    }
}

impl Game {
    /// Set up a new game: opening markets, the AI roster and their first
    /// quarter of revenue.
    pub fn new(config: SimConfig) -> Self {
        Self::with_names(config, Box::new(SyllableNames))
    }

    pub fn with_names(config: SimConfig, names: Box<dyn NameGenerator>) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.rng_seed);
        let markets: Vec<Market> = config
            .initial_markets
            .iter()
            .map(|name| Market::generate(name.clone(), &mut rng))
            .collect();
        let events = EventEngine::new(&markets);

        let mut player = Company::new(config.player.name.clone(), None);
        player.cash = config.player.cash;
        player.employees = config.player.employees;
        player.campuses.push(config.player.campus.clone());
        let mut used_company_names = BTreeSet::new();
        used_company_names.insert(player.name.clone());

        let mut game = Self {
            config,
            rng,
            names,
            turn: 0,
            game_over: false,
            outcome: None,
            player,
            ai: Vec::new(),
            markets,
            events,
            pending: Vec::new(),
            used_company_names,
            used_product_names: BTreeSet::new(),
            news: NewsFeed::new(),
            competitor_news: NewsFeed::new(),
            spawned_ai: 0,
            spawned_markets: 0,
            history: QuarterHistory::new(),
        };
        game.populate_roster();
        game.allocate_opening_shares();
        info!(
            seed = game.config.rng_seed,
            companies = game.ai.len(),
            markets = game.markets.len(),
            "game created"
        );
        game
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Index of the next quarter to play.
    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn date(&self) -> QuarterDate {
        QuarterDate::from_turn(self.config.start_year, self.turn)
    }

    pub fn is_over(&self) -> bool {
        self.game_over
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    pub fn player(&self) -> &Company {
        &self.player
    }

    pub fn ai_companies(&self) -> &[Company] {
        &self.ai
    }

    pub fn company(&self, name: &str) -> Option<&Company> {
        std::iter::once(&self.player)
            .chain(self.ai.iter())
            .find(|c| c.name == name)
    }

    pub fn markets(&self) -> &[Market] {
        &self.markets
    }

    pub fn market(&self, name: &str) -> Option<&Market> {
        self.markets.iter().find(|m| m.name == name)
    }

    pub fn pending_acquisitions(&self) -> &[PendingAcquisition] {
        &self.pending
    }

    /// Public news, oldest first.
    pub fn news(&self) -> &NewsFeed {
        &self.news
    }

    /// AI moves and failed deals, oldest first.
    pub fn competitor_news(&self) -> &NewsFeed {
        &self.competitor_news
    }

    pub fn events(&self) -> &EventEngine {
        &self.events
    }

    /// Recent events, newest first, labelled with their quarter.
    pub fn event_feed(&self) -> Vec<String> {
        self.events.feed(self.config.start_year, self.turn)
    }

    pub fn history(&self) -> &QuarterHistory {
        &self.history
    }

    pub fn spawned_companies(&self) -> u32 {
        self.spawned_ai
    }

    pub fn spawned_markets(&self) -> u32 {
        self.spawned_markets
    }

    /// The player's fraction of the combined market cap of every company.
    pub fn player_market_share(&self) -> f64 {
        let total: f64 =
            self.player.market_cap + self.ai.iter().map(|c| c.market_cap).sum::<f64>();
        if total > 0.0 {
            self.player.market_cap / total
        } else {
            0.0
        }
    }

    /// Play one quarter. Does nothing once the game is over.
    pub fn step(&mut self) -> TurnSummary {
        let turn = self.turn;
        if self.game_over {
            return TurnSummary {
                turn,
                outcome: self.outcome,
                ..TurnSummary::default()
            };
        }
        let mut summary = TurnSummary {
            turn,
            ..TurnSummary::default()
        };

        summary.bankruptcies = self.run_ai_phase();

        summary.event = self
            .events
            .run_quarter(turn, &mut self.markets, &mut self.rng)
            .map(|e| e.name);

        self.distribute_markets();

        let mut roster = Roster {
            player: &mut self.player,
            ai: &mut self.ai,
            used_product_names: &mut self.used_product_names,
        };
        let resolved = acquisitions::resolve_due(
            turn,
            &mut roster,
            &mut self.pending,
            &mut self.news,
            &mut self.competitor_news,
        );
        summary.acquisitions = resolved.completed;
        summary.failed_acquisitions = resolved.failed;

        sim_econ::settle_all(std::iter::once(&mut self.player).chain(self.ai.iter_mut()));
        self.player.update_negative_cash_quarters();

        self.history.record(
            turn,
            self.config.start_year,
            &self.markets,
            std::iter::once(&self.player).chain(self.ai.iter()),
        );

        summary.outcome = self.check_endgame();

        self.turn += 1;
        let spawn_every = self.config.spawn.every_turns;
        if spawn_every > 0 && self.turn % spawn_every == 0 {
            summary.spawned_companies = self.spawn_companies();
        }
        let market_every = self.config.market_every_turns;
        if market_every > 0 && self.turn % market_every == 0 {
            summary.spawned_market = self.spawn_market();
        }

        info!(
            turn,
            date = %QuarterDate::from_turn(self.config.start_year, turn),
            cash = self.player.cash,
            market_cap = self.player.market_cap,
            competitors = self.ai.len(),
            "quarter complete"
        );
        summary
    }

    /// Play up to `quarters` turns, stopping early if the game ends.
    pub fn run(&mut self, quarters: u32) -> Vec<TurnSummary> {
        let mut played = Vec::new();
        for _ in 0..quarters {
            if self.game_over {
                break;
            }
            played.push(self.step());
        }
        played
    }

    /// One decision pass per AI company, in roster order. A company removed
    /// by bankruptcy does not advance the index, so its successor still
    /// gets a turn.
    fn run_ai_phase(&mut self) -> u32 {
        let mut bankruptcies = 0;
        let mut idx = 0;
        while idx < self.ai.len() {
            let outcome = {
                let mut ctx = StrategyContext {
                    turn: self.turn,
                    markets: &mut self.markets,
                    player: &mut self.player,
                    ai: &mut self.ai,
                    pending: &mut self.pending,
                    used_product_names: &mut self.used_product_names,
                    names: &mut *self.names,
                    news: &mut self.competitor_news,
                    rng: &mut self.rng,
                    policies: &self.config.policies,
                };
                sim_ai::run_company_turn(&mut ctx, idx)
            };
            if outcome == TurnOutcome::Bankrupt {
                let mut roster = Roster {
                    player: &mut self.player,
                    ai: &mut self.ai,
                    used_product_names: &mut self.used_product_names,
                };
                let result =
                    acquisitions::handle_bankruptcy(&mut roster, idx, &mut self.competitor_news);
                if let Some(BankruptcyOutcome::Absorbed { .. }) = result {
                    bankruptcies += 1;
                    continue;
                }
            }
            idx += 1;
        }
        bankruptcies
    }

    /// Revenue distribution for every market. On the opening quarter the
    /// player's products keep the revenue they were allocated.
    fn distribute_markets(&mut self) {
        let opening_quarter = self.turn == 0;
        for market in self.markets.iter_mut() {
            let mut imaginary = market.imaginary_product.take();
            let mut participants: Vec<Participant<'_>> = Vec::new();
            for p in self
                .player
                .products
                .values_mut()
                .filter(|p| p.market == market.name)
            {
                participants.push(if opening_quarter {
                    Participant::frozen(p)
                } else {
                    Participant::new(p)
                });
            }
            for c in self.ai.iter_mut() {
                participants.extend(
                    c.products
                        .values_mut()
                        .filter(|p| p.market == market.name)
                        .map(Participant::new),
                );
            }
            if let Some(p) = imaginary.as_mut() {
                participants.push(Participant::new(p));
            }
            let report = distribute_revenue(market, &mut participants);
            drop(participants);
            market.imaginary_product = imaginary;
            debug!(
                market = %market.name,
                total = report.total_revenue,
                size = market.size,
                "revenue distributed"
            );
        }
    }

    fn check_endgame(&mut self) -> Option<GameOutcome> {
        let outcome = if self.player.is_bankrupt() {
            GameOutcome::PlayerBankrupt
        } else if self.ai.is_empty() {
            GameOutcome::Monopoly
        } else if self.player_market_share() > DOMINANCE_SHARE {
            GameOutcome::MarketDominance
        } else {
            return None;
        };
        self.game_over = true;
        self.outcome = Some(outcome);
        self.news.push(outcome.message().to_string());
        info!(turn = self.turn, ?outcome, "game over");
        Some(outcome)
    }

    pub(crate) fn fresh_company_name(&mut self) -> String {
        let name = self
            .names
            .company_name(&self.used_company_names, &mut self.rng);
        self.used_company_names.insert(name.clone());
        name
    }

    pub(crate) fn fresh_product_name(&mut self) -> String {
        let name = self
            .names
            .product_name(&self.used_product_names, &mut self.rng);
        self.used_product_names.insert(name.clone());
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::{Product, Staffing, Tier};

    fn game() -> Game {
        Game::new(SimConfig::default().with_seed(11))
    }

    #[test]
    fn new_game_matches_opening_setup() {
        let g = game();
        assert_eq!(g.turn(), 0);
        assert_eq!(g.markets().len(), 8);
        assert_eq!(g.ai_companies().len(), 20);
        assert_eq!(g.player().name, "Player Co");
        assert_eq!(g.player().cash, 1_000_000.0);
        assert_eq!(g.player().employee_capacity(), 10);
        let big_tech = g
            .ai_companies()
            .iter()
            .filter(|c| c.tier == Some(Tier::BigTech))
            .count();
        assert_eq!(big_tech, 3);
        for c in g.ai_companies() {
            let expected = match c.tier {
                Some(Tier::Startup) => 1,
                Some(Tier::Medium) => 2,
                Some(Tier::Large) => 4,
                _ => 5,
            };
            assert_eq!(c.products.len(), expected, "{}", c.name);
        }
    }

    #[test]
    fn opening_revenue_is_a_quarter_of_each_market() {
        let g = game();
        for m in g.markets() {
            let total: f64 = g
                .ai_companies()
                .iter()
                .flat_map(|c| c.products.values())
                .filter(|p| p.market == m.name)
                .map(|p| p.revenue)
                .sum();
            if total > 0.0 {
                assert!((total - m.size / 4.0).abs() < 1e-3, "{}", m.name);
            }
        }
    }

    #[test]
    fn step_advances_one_quarter() {
        let mut g = game();
        let summary = g.step();
        assert_eq!(summary.turn, 0);
        assert_eq!(g.turn(), 1);
        assert_eq!(g.date().to_string(), "2000, Q2");
        assert_eq!(g.history().len(), 1);
        for c in std::iter::once(g.player()).chain(g.ai_companies()) {
            assert!(c.market_cap >= 0.0);
        }
    }

    #[test]
    fn monopoly_ends_the_game() {
        let mut g = game();
        g.ai.clear();
        let summary = g.step();
        assert_eq!(summary.outcome, Some(GameOutcome::Monopoly));
        assert!(g.is_over());
        assert_eq!(
            g.news().latest().map(String::as_str),
            Some("You acquired all of your competitors. Technopoly!")
        );
        let after = g.step();
        assert_eq!(after.turn, 1);
        assert_eq!(g.turn(), 1);
        assert_eq!(after.outcome, Some(GameOutcome::Monopoly));
    }

    #[test]
    fn negative_cash_for_four_quarters_loses() {
        let mut g = game();
        g.player.cash = -10_000_000.0;
        let mut outcomes = Vec::new();
        for _ in 0..4 {
            outcomes.push(g.step().outcome);
        }
        assert_eq!(outcomes[..3], [None, None, None]);
        assert_eq!(outcomes[3], Some(GameOutcome::PlayerBankrupt));
        assert!(!GameOutcome::PlayerBankrupt.is_win());
    }

    #[test]
    fn dominant_market_cap_wins() {
        let mut g = game();
        let mut p = Product::new(g.player.name.clone(), g.markets[0].name.clone())
            .with_staffing(Staffing::new(2, 1, 2));
        p.revenue = 10_000_000_000.0;
        g.player.products.insert("Juggernaut".into(), p);
        g.player.cash = 50_000_000_000.0;
        let summary = g.step();
        assert_eq!(summary.outcome, Some(GameOutcome::MarketDominance));
        assert!(g.player_market_share() > DOMINANCE_SHARE);
    }

    #[test]
    fn spawns_follow_cadence() {
        let mut g = game();
        let played = g.run(12);
        let spawned: u32 = played.iter().map(|s| s.spawned_companies).sum();
        // the player never founded, so nothing can end the game this early
        assert!(!g.is_over());
        assert_eq!(played.len(), 12);
        assert_eq!(played[7].spawned_companies, 3);
        assert_eq!(spawned, 3);
        assert_eq!(played[11].spawned_market.as_deref(), Some("Semiconductors"));
        assert_eq!(g.markets().len(), 9);
        assert!(g.market("Semiconductors").is_some());
    }

    #[test]
    fn same_seed_same_game() {
        let mut a = game();
        let mut b = game();
        a.run(6);
        b.run(6);
        assert_eq!(a.snapshot(), b.snapshot());
    }
}
