//! Company and product naming.

use rand::seq::SliceRandom;
use rand::RngCore;
use std::collections::BTreeSet;

/// Source of fresh company and product names.
///
/// Implementations must return a name not contained in `used`; the caller
/// records it.
pub trait NameGenerator {
    fn company_name(&mut self, used: &BTreeSet<String>, rng: &mut dyn RngCore) -> String;
    fn product_name(&mut self, used: &BTreeSet<String>, rng: &mut dyn RngCore) -> String;
}

const COMPANY_PREFIXES: &[&str] = &[
    "Neuro", "Quantum", "Cyber", "Hyper", "Vertex", "Nexus", "Strato", "Zenith", "Titan", "Echo",
    "Horizon", "Aether", "Aurora", "Byte", "Nano", "Synth", "Vortex", "Sigma", "Flux", "Velox",
    "Nova", "Helix", "Apollo", "Omni", "Axion", "Sentinel", "Neon", "Arc", "Sol", "Lyric",
];

const COMPANY_SUFFIXES: &[&str] = &[
    "Tech", "AI", "Soft", "Dynamics", "Labs", "Industries", "Solutions", "Cloud", "Systems",
    "Logic", "Robotics", "Analytics", "Works", "Data", "Networks", "Ventures", "Ops", "Forge",
    "Matrix", "Core", "Stream", "Node", "Sphere", "Hub", "X",
];

const PRODUCT_PREFIXES: &[&str] = &[
    "Sky", "Neo", "Prime", "Nova", "Aero", "Delta", "Zeta", "Omega", "Quantum", "Hyper", "Green",
    "Cyber", "Mono", "Alpha", "Aqua",
];

const PRODUCT_SUFFIXES: &[&str] = &[
    "Flow", "Boost", "Hub", "Core", "Link", "Edge", "Sphere", "Guard", "Gate", "Layer", "Matrix",
    "Flash", "Pulse", "Logic", "Sense",
];

/// Prefix + suffix combinations, falling back to numbered variants once the
/// random draws keep colliding.
#[derive(Clone, Debug, Default)]
pub struct SyllableNames;

impl SyllableNames {
    const ATTEMPTS: usize = 64;

    fn pick(
        prefixes: &[&str],
        suffixes: &[&str],
        used: &BTreeSet<String>,
        rng: &mut dyn RngCore,
    ) -> String {
        let mut base = String::from("Company");
        for _ in 0..Self::ATTEMPTS {
            let pre = prefixes.choose(&mut *rng).copied().unwrap_or("Nova");
            let suf = suffixes.choose(&mut *rng).copied().unwrap_or("Core");
            base = format!("{pre}{suf}");
            if !used.contains(&base) {
                return base;
            }
        }
        (2u32..)
            .map(|n| format!("{base} {n}"))
            .find(|candidate| !used.contains(candidate))
            .unwrap_or(base)
    }
}

impl NameGenerator for SyllableNames {
    fn company_name(&mut self, used: &BTreeSet<String>, rng: &mut dyn RngCore) -> String {
        Self::pick(COMPANY_PREFIXES, COMPANY_SUFFIXES, used, rng)
    }

    fn product_name(&mut self, used: &BTreeSet<String>, rng: &mut dyn RngCore) -> String {
        Self::pick(PRODUCT_PREFIXES, PRODUCT_SUFFIXES, used, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn names_are_unique_even_when_exhausted() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut names = SyllableNames;
        let mut used = BTreeSet::new();
        // More draws than there are prefix/suffix combinations.
        for _ in 0..300 {
            let name = names.product_name(&used, &mut rng);
            assert!(used.insert(name));
        }
    }
}
