//! Market-wide view of competing products and their quality ranks.

use sim_core::{Company, Market, QualityRank};
use std::cmp::Ordering;

/// Who holds a product on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Holder {
    Player,
    /// Index into the AI roster.
    Ai(usize),
    /// The market's own unattributed revenue.
    Imaginary,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoardEntry {
    pub holder: Holder,
    pub owner: String,
    pub product: String,
    pub effectiveness: f64,
    pub revenue: f64,
    pub rank: QualityRank,
}

/// Every product competing in one market, in roster order: the player's
/// products, then each AI company's, then the imaginary product.
#[derive(Clone, Debug, Default)]
pub struct MarketBoard {
    entries: Vec<BoardEntry>,
}

impl MarketBoard {
    pub fn collect(market: &Market, player: &Company, ai: &[Company]) -> Self {
        let market_name = market.name.as_str();
        let owned = std::iter::once((Holder::Player, player))
            .chain(ai.iter().enumerate().map(|(i, c)| (Holder::Ai(i), c)));
        let mut entries: Vec<BoardEntry> = owned
            .flat_map(move |(holder, c)| {
                c.products
                    .iter()
                    .filter(move |(_, p)| p.market == market_name)
                    .map(move |(name, p)| BoardEntry {
                        holder,
                        owner: c.name.clone(),
                        product: name.clone(),
                        effectiveness: p.effectiveness,
                        revenue: p.revenue,
                        rank: QualityRank::Moderate,
                    })
            })
            .collect();
        if let Some(p) = &market.imaginary_product {
            entries.push(BoardEntry {
                holder: Holder::Imaginary,
                owner: p.owner.clone(),
                product: market.name.clone(),
                effectiveness: p.effectiveness,
                revenue: p.revenue,
                rank: QualityRank::Moderate,
            });
        }

        let mut order: Vec<usize> = (0..entries.len()).collect();
        order.sort_by(|&a, &b| {
            entries[b]
                .effectiveness
                .partial_cmp(&entries[a].effectiveness)
                .unwrap_or(Ordering::Equal)
        });
        let total = entries.len();
        for (position, idx) in order.into_iter().enumerate() {
            entries[idx].rank = QualityRank::from_position(position, total);
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[BoardEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn rank_of(&self, owner: &str, product: &str) -> Option<QualityRank> {
        self.entries
            .iter()
            .find(|e| e.owner == owner && e.product == product)
            .map(|e| e.rank)
    }

    /// Lowest effectiveness on the board.
    pub fn weakest_effectiveness(&self) -> Option<f64> {
        self.entries.iter().map(|e| e.effectiveness).reduce(f64::min)
    }

    /// Highest-revenue entry among those accepted by `filter`; the first
    /// one in roster order wins ties.
    pub fn top_earner(&self, filter: impl Fn(&BoardEntry) -> bool) -> Option<&BoardEntry> {
        self.entries
            .iter()
            .filter(|e| filter(e))
            .fold(None, |best: Option<&BoardEntry>, e| match best {
                Some(b) if b.revenue >= e.revenue => Some(b),
                _ => Some(e),
            })
    }
}
