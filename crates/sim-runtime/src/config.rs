//! Game configuration: world seed, roster profiles and spawn cadence.

use rand::Rng;
use serde::{Deserialize, Serialize};
use sim_ai::PolicyTable;
use sim_core::{Campus, Tier};

/// Inclusive bounds for a random draw.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Span<T> {
    pub min: T,
    pub max: T,
}

impl<T> Span<T> {
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl Span<u32> {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        rng.gen_range(self.min..=self.max.max(self.min))
    }
}

impl Span<f64> {
    /// Uniform in `[min, max)`; a degenerate span yields `min`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.max > self.min {
            rng.gen_range(self.min..self.max)
        } else {
            self.min
        }
    }
}

/// One tier of the opening AI roster.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub tier: Tier,
    pub count: u32,
    /// Distinct opening markets each company enters.
    pub markets: usize,
    pub campus: Campus,
    pub employees: Span<u32>,
    pub cash: Span<f64>,
}

/// How a company spawned mid-game is built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnProfile {
    pub tier: Tier,
    /// Relative draw weight.
    pub weight: f64,
    pub campus: Campus,
    pub employees: Span<u32>,
    pub cash: Span<f64>,
    pub products: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Turns between company spawns.
    pub every_turns: u32,
    /// Companies per spawn.
    pub companies: u32,
    /// Lifetime cap on spawned companies.
    pub cap: u32,
    pub profiles: Vec<SpawnProfile>,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            every_turns: 8,
            companies: 3,
            cap: 100,
            profiles: vec![
                SpawnProfile {
                    tier: Tier::Startup,
                    weight: 0.5,
                    campus: Campus::new("Garage", 0.0, 0.0, 10),
                    employees: Span::new(5, 10),
                    cash: Span::new(500_000.0, 2_000_000.0),
                    products: 1,
                },
                SpawnProfile {
                    tier: Tier::Medium,
                    weight: 0.25,
                    campus: Campus::new("Small Office", 400_000.0, 0.02, 50),
                    employees: Span::new(15, 35),
                    cash: Span::new(3_000_000.0, 5_000_000.0),
                    products: 2,
                },
                SpawnProfile {
                    tier: Tier::Large,
                    weight: 0.15,
                    campus: Campus::new("Large Office", 1_000_000.0, 0.04, 150),
                    employees: Span::new(60, 100),
                    cash: Span::new(12_000_000.0, 20_000_000.0),
                    products: 3,
                },
                SpawnProfile {
                    tier: Tier::BigTech,
                    weight: 0.05,
                    campus: Campus::new("Large Building", 1_600_000.0, 0.08, 275),
                    employees: Span::new(120, 200),
                    cash: Span::new(25_000_000.0, 40_000_000.0),
                    products: 4,
                },
            ],
        }
    }
}

/// The human player's starting position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub name: String,
    pub cash: f64,
    pub employees: u32,
    pub campus: Campus,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            name: "Player Co".to_string(),
            cash: 1_000_000.0,
            employees: 5,
            campus: Campus::new("Garage", 0.0, 0.0, 10),
        }
    }
}

/// Everything needed to set up a new game. Every field has a default, so a
/// YAML file only names what it overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub rng_seed: u64,
    pub start_year: i32,
    pub initial_markets: Vec<String>,
    /// Markets introduced later, in order.
    pub spawn_markets: Vec<String>,
    /// Turns between market introductions.
    pub market_every_turns: u32,
    pub roster: Vec<RosterEntry>,
    pub spawn: SpawnConfig,
    pub player: PlayerConfig,
    pub policies: PolicyTable,
}

impl Default for SimConfig {
    fn default() -> Self {
        let names = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            rng_seed: 42,
            start_year: 2000,
            initial_markets: names(&[
                "Artificial Intelligence",
                "Cloud Computing",
                "Cybersecurity",
                "Enterprise SaaS",
                "E-Commerce",
                "Consumer Hardware",
                "FinTech",
                "Social Media",
            ]),
            spawn_markets: names(&[
                "Semiconductors",
                "Autonomous Vehicles",
                "Blockchain",
                "Telecommunications",
                "VR Software",
                "Cloud Gaming",
                "Quantum Computing",
                "Smart Home",
                "Streaming Platforms",
                "GreenTech",
                "Wearables",
                "Video Games",
            ]),
            market_every_turns: 12,
            roster: vec![
                RosterEntry {
                    tier: Tier::Startup,
                    count: 5,
                    markets: 1,
                    campus: Campus::new("Garage", 0.0, 0.0, 10),
                    employees: Span::new(10, 20),
                    cash: Span::new(500_000.0, 2_000_000.0),
                },
                RosterEntry {
                    tier: Tier::Medium,
                    count: 7,
                    markets: 2,
                    campus: Campus::new("Small Office", 250_000.0, 0.02, 50),
                    employees: Span::new(35, 70),
                    cash: Span::new(3_000_000.0, 6_000_000.0),
                },
                RosterEntry {
                    tier: Tier::Large,
                    count: 5,
                    markets: 4,
                    campus: Campus::new("Large Office", 2_500_000.0, 0.04, 125),
                    employees: Span::new(80, 140),
                    cash: Span::new(12_000_000.0, 18_000_000.0),
                },
                RosterEntry {
                    tier: Tier::BigTech,
                    count: 3,
                    markets: 5,
                    campus: Campus::new("Large Building", 5_000_000.0, 0.08, 250),
                    employees: Span::new(180, 300),
                    cash: Span::new(25_000_000.0, 40_000_000.0),
                },
            ],
            spawn: SpawnConfig::default(),
            player: PlayerConfig::default(),
            policies: PolicyTable::default(),
        }
    }
}

impl SimConfig {
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }
}
