//! Quarterly events and the global recession countdown.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sim_core::{EventKind, GameEvent, Market, QuarterDate, RollingWindow, RECESSION_QUARTERS};
use tracing::{debug, info};

/// Recent events kept for the event feed.
pub const RECENT_EVENTS: usize = 5;

/// A draw from `1..=RECESSION_ODDS` equal to `RECESSION_ODDS` triggers a
/// recession.
pub const RECESSION_ODDS: u32 = 17;

/// Draws one event per quarter and runs the recession countdown.
///
/// Demand events exist for the opening markets only; markets introduced
/// later are still hit by recessions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventEngine {
    normal: Vec<GameEvent>,
    recent: RollingWindow<GameEvent, RECENT_EVENTS>,
    recession_active: bool,
    recession_quarters_left: u32,
}

impl EventEngine {
    pub fn new(markets: &[Market]) -> Self {
        let normal = markets
            .iter()
            .flat_map(|m| {
                [
                    GameEvent::strong_demand(&m.name),
                    GameEvent::weak_demand(&m.name),
                ]
            })
            .collect();
        Self {
            normal,
            recent: RollingWindow::new(),
            recession_active: false,
            recession_quarters_left: 0,
        }
    }

    pub fn recession_active(&self) -> bool {
        self.recession_active
    }

    pub fn recession_quarters_left(&self) -> u32 {
        self.recession_quarters_left
    }

    /// Applied events, oldest first.
    pub fn recent(&self) -> impl DoubleEndedIterator<Item = &GameEvent> + '_ {
        self.recent.iter()
    }

    /// Pick this quarter's event; nothing fires while a recession runs.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<GameEvent> {
        if self.recession_active {
            return None;
        }
        if rng.gen_range(1..=RECESSION_ODDS) == RECESSION_ODDS {
            return Some(GameEvent::global_recession());
        }
        self.normal.choose(rng).cloned()
    }

    /// Apply `event` to the markets and remember it.
    pub fn apply(&mut self, mut event: GameEvent, turn: u32, markets: &mut [Market]) {
        event.turn_happened = Some(turn);
        match &event.kind {
            EventKind::GlobalRecession => {
                self.recession_active = true;
                self.recession_quarters_left = RECESSION_QUARTERS;
                for m in markets.iter_mut() {
                    m.enter_recession(RECESSION_QUARTERS);
                }
                info!(turn, quarters = RECESSION_QUARTERS, "global recession");
            }
            EventKind::Demand { market, delta } => {
                for m in markets.iter_mut() {
                    m.reset_growth();
                }
                if let Some(m) = markets.iter_mut().find(|m| &m.name == market) {
                    m.adjust_growth(*delta);
                }
                debug!(turn, event = %event.name, "demand event");
            }
        }
        self.recent.push(event);
    }

    /// Count down an active recession, clearing every market when it ends.
    pub fn update_recession(&mut self, markets: &mut [Market]) {
        if !self.recession_active {
            return;
        }
        self.recession_quarters_left = self.recession_quarters_left.saturating_sub(1);
        if self.recession_quarters_left == 0 {
            self.recession_active = false;
            for m in markets.iter_mut() {
                m.clear_recession();
            }
            info!("global recession over");
        }
    }

    /// Draw, apply and count down: the whole event phase of a turn.
    pub fn run_quarter<R: Rng + ?Sized>(
        &mut self,
        turn: u32,
        markets: &mut [Market],
        rng: &mut R,
    ) -> Option<GameEvent> {
        let mut event = self.draw(rng);
        if let Some(e) = event.as_mut() {
            e.turn_happened = Some(turn);
            self.apply(e.clone(), turn, markets);
        }
        self.update_recession(markets);
        event
    }

    /// Human-readable event lines, newest first.
    pub fn feed(&self, start_year: i32, current_turn: u32) -> Vec<String> {
        self.recent
            .iter()
            .rev()
            .map(|e| {
                let turn = e.turn_happened.unwrap_or(current_turn);
                let date = QuarterDate::from_turn(start_year, turn);
                if e.breaking {
                    format!(
                        "{date} - {} (remaining {} quarters)",
                        e.name, self.recession_quarters_left
                    )
                } else {
                    format!("{date}: {}, {}", e.name, e.description)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use sim_core::DEMAND_SHOCK;

    fn markets() -> Vec<Market> {
        vec![
            Market::new("Cloud Computing", 30_000_000.0, 0.10),
            Market::new("FinTech", 40_000_000.0, 0.03),
        ]
    }

    #[test]
    fn two_events_per_opening_market() {
        let engine = EventEngine::new(&markets());
        assert_eq!(engine.normal.len(), 4);
        assert_eq!(engine.normal[0].name, "Strong demand for Cloud Computing");
        assert_eq!(engine.normal[3].name, "Weak demand for FinTech");
    }

    #[test]
    fn demand_modifiers_never_stack() {
        let mut ms = markets();
        let mut engine = EventEngine::new(&ms);
        let strong = GameEvent::strong_demand("Cloud Computing");
        engine.apply(strong.clone(), 0, &mut ms);
        engine.apply(strong, 1, &mut ms);
        assert!((ms[0].growth_rate - (0.10 + DEMAND_SHOCK)).abs() < 1e-12);

        engine.apply(GameEvent::weak_demand("FinTech"), 2, &mut ms);
        assert_eq!(ms[0].growth_rate, ms[0].base_growth_rate);
        assert_eq!(ms[1].growth_rate, 0.0);
    }

    #[test]
    fn recession_blocks_draws_for_three_turns() {
        let mut ms = markets();
        let mut engine = EventEngine::new(&ms);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        engine.apply(GameEvent::global_recession(), 0, &mut ms);
        engine.update_recession(&mut ms);
        assert!(ms.iter().all(|m| m.in_recession));

        for turn in 1..=2 {
            assert_eq!(engine.run_quarter(turn, &mut ms, &mut rng), None);
        }
        assert!(!engine.recession_active());
        assert!(ms.iter().all(|m| !m.in_recession && m.recession_quarters_left == 0));

        // Turn 4 of the episode draws again.
        assert!(engine.draw(&mut rng).is_some());
    }

    #[test]
    fn history_keeps_last_five_events() {
        let mut ms = markets();
        let mut engine = EventEngine::new(&ms);
        for turn in 0..7 {
            engine.apply(GameEvent::strong_demand("FinTech"), turn, &mut ms);
        }
        let turns: Vec<_> = engine.recent().map(|e| e.turn_happened).collect();
        assert_eq!(turns, vec![Some(2), Some(3), Some(4), Some(5), Some(6)]);
    }

    #[test]
    fn feed_is_newest_first_with_quarter_labels() {
        let mut ms = markets();
        let mut engine = EventEngine::new(&ms);
        engine.apply(GameEvent::strong_demand("FinTech"), 4, &mut ms);
        engine.apply(GameEvent::global_recession(), 5, &mut ms);
        let feed = engine.feed(2000, 6);
        assert_eq!(
            feed,
            vec![
                "2001, Q2 - Global Recession (remaining 3 quarters)".to_string(),
                "2001, Q1: Strong demand for FinTech, +5% growth this quarter in FinTech"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn draws_cover_recession_and_normal_events() {
        let engine = EventEngine::new(&markets());
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let draws: Vec<GameEvent> = (0..500).filter_map(|_| engine.draw(&mut rng)).collect();
        assert_eq!(draws.len(), 500);
        let recessions = draws.iter().filter(|e| e.breaking).count();
        assert!(recessions > 5 && recessions < 80, "recessions {recessions}");
    }
}
