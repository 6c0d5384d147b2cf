//! Takeovers: pending-acquisition resolution, merging and bankruptcy.

use sim_core::{format_money, Company, NewsFeed, PendingAcquisition};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info};

/// Growth, in percent, above which a product shields its owner from
/// takeover.
pub const PROTECTED_GROWTH_PCT: f64 = 30.0;

/// Suffix appended to a product name that collides during a merge.
pub const MERGED_SUFFIX: &str = "_acq";

/// Whether any product of `c` grew more than [`PROTECTED_GROWTH_PCT`] last
/// quarter.
pub fn is_growth_protected(c: &Company) -> bool {
    c.products
        .values()
        .any(|p| p.last_growth().is_some_and(|g| g > PROTECTED_GROWTH_PCT))
}

/// Move everything `target` owns into `buyer` and leave `target` empty.
///
/// Negative cash is not inherited. Returns the names the absorbed products
/// were filed under.
pub fn merge_into(buyer: &mut Company, target: &mut Company) -> Vec<String> {
    buyer.cash += target.cash.max(0.0);
    buyer.employees = buyer.employees.saturating_add(target.employees);
    buyer.campuses.append(&mut target.campuses);
    buyer.loans.append(&mut target.loans);
    buyer.bonds.append(&mut target.bonds);
    let mut filed = Vec::with_capacity(target.products.len());
    for (name, mut product) in std::mem::take(&mut target.products) {
        product.owner = buyer.name.clone();
        let mut key = name;
        while buyer.products.contains_key(&key) {
            key.push_str(MERGED_SUFFIX);
        }
        buyer.products.insert(key.clone(), product);
        filed.push(key);
    }
    target.strip_assets();
    filed
}

/// A company on the roster.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Party {
    Player,
    Ai(usize),
}

impl Party {
    /// Where this party sits after AI company `removed` leaves the roster.
    fn after_removal(self, removed: usize) -> Self {
        match self {
            Party::Ai(i) if i > removed => Party::Ai(i - 1),
            other => other,
        }
    }
}

/// Mutable view of every company, lent out for roster changes.
pub struct Roster<'a> {
    pub player: &'a mut Company,
    pub ai: &'a mut Vec<Company>,
    pub used_product_names: &'a mut BTreeSet<String>,
}

impl<'a> Roster<'a> {
    pub fn find(&self, name: &str) -> Option<Party> {
        if self.player.name == name {
            return Some(Party::Player);
        }
        self.ai.iter().position(|c| c.name == name).map(Party::Ai)
    }

    pub fn get(&self, party: Party) -> Option<&Company> {
        match party {
            Party::Player => Some(&*self.player),
            Party::Ai(i) => self.ai.get(i),
        }
    }

    pub fn get_mut(&mut self, party: Party) -> Option<&mut Company> {
        match party {
            Party::Player => Some(&mut *self.player),
            Party::Ai(i) => self.ai.get_mut(i),
        }
    }

    /// Take AI company `idx` off the roster and fold it into `into`.
    /// Returns the absorbing company's name.
    fn absorb(&mut self, idx: usize, into: Party) -> Option<String> {
        if into == Party::Ai(idx) || idx >= self.ai.len() {
            return None;
        }
        let mut gone = self.ai.remove(idx);
        let heir = self.get_mut(into.after_removal(idx))?;
        let filed = merge_into(heir, &mut gone);
        let heir_name = heir.name.clone();
        self.used_product_names.extend(filed);
        Some(heir_name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Failure {
    Vanished,
    Funds,
    Protected,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Failure::Vanished => "no longer exists",
            Failure::Funds => "insufficient funds",
            Failure::Protected => "top-2 growth",
        })
    }
}

/// Counts from one resolution pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolutionReport {
    pub completed: u32,
    pub failed: u32,
}

/// Resolve every acquisition submitted before `turn`, in submission order.
/// Later submissions stay queued.
pub fn resolve_due(
    turn: u32,
    roster: &mut Roster<'_>,
    pending: &mut Vec<PendingAcquisition>,
    news: &mut NewsFeed,
    competitor_news: &mut NewsFeed,
) -> ResolutionReport {
    let (due, waiting): (Vec<_>, Vec<_>) = pending.drain(..).partition(|a| a.is_due(turn));
    *pending = waiting;
    let mut report = ResolutionReport::default();
    for acq in due {
        match resolve_one(roster, &acq) {
            Ok(()) => {
                report.completed += 1;
                info!(
                    buyer = %acq.buyer,
                    target = %acq.target,
                    price = acq.price,
                    "acquisition completed"
                );
                news.push(format!(
                    "{} acquired {} for {}!",
                    acq.buyer,
                    acq.target,
                    format_money(acq.price)
                ));
            }
            Err(why) => {
                report.failed += 1;
                debug!(
                    buyer = %acq.buyer,
                    target = %acq.target,
                    reason = %why,
                    "acquisition failed"
                );
                competitor_news.push(format!("Acquisition of {} failed; {why}.", acq.target));
            }
        }
    }
    report
}

fn resolve_one(roster: &mut Roster<'_>, acq: &PendingAcquisition) -> Result<(), Failure> {
    let target = roster
        .ai
        .iter()
        .position(|c| c.name == acq.target)
        .ok_or(Failure::Vanished)?;
    // A buyer that has itself been absorbed can no longer pay.
    let buyer = roster.find(&acq.buyer).ok_or(Failure::Funds)?;
    if buyer == Party::Ai(target) {
        return Err(Failure::Vanished);
    }
    if roster.get(buyer).map_or(true, |b| b.cash < acq.price) {
        return Err(Failure::Funds);
    }
    if is_growth_protected(&roster.ai[target]) {
        return Err(Failure::Protected);
    }
    if let Some(b) = roster.get_mut(buyer) {
        b.cash -= acq.price;
    }
    roster.absorb(target, buyer).map(|_| ()).ok_or(Failure::Vanished)
}

/// What became of a bankrupt AI company.
#[derive(Clone, Debug, PartialEq)]
pub enum BankruptcyOutcome {
    /// Selling bonds brought cash back to zero or above.
    Survived { raised: f64 },
    /// Folded into the company with the largest market cap.
    Absorbed { by: String },
}

/// Run the bankruptcy procedure for AI company `idx`: sell bonds as a last
/// resort, otherwise hand everything to the largest company by market cap
/// (the player included) and drop it from the roster.
pub fn handle_bankruptcy(
    roster: &mut Roster<'_>,
    idx: usize,
    competitor_news: &mut NewsFeed,
) -> Option<BankruptcyOutcome> {
    let c = roster.ai.get_mut(idx)?;
    let name = c.name.clone();
    if c.cash < 0.0 && !c.bonds.is_empty() {
        let raised = c.bond_value();
        c.cash += raised;
        c.bonds.clear();
        competitor_news.push(format!(
            "{name} sold all bonds for {} to raise emergency funds.",
            format_money(raised)
        ));
        if c.cash >= 0.0 {
            info!(company = %name, raised, "bankruptcy averted by bond sale");
            competitor_news.push(format!("{name} avoided bankruptcy after liquidating bonds!"));
            return Some(BankruptcyOutcome::Survived { raised });
        }
    }

    let mut heir = Party::Player;
    let mut largest = roster.player.market_cap;
    for (i, other) in roster.ai.iter().enumerate() {
        if i != idx && other.market_cap > largest {
            heir = Party::Ai(i);
            largest = other.market_cap;
        }
    }
    let by = roster.absorb(idx, heir)?;
    info!(company = %name, heir = %by, "bankruptcy");
    competitor_news.push(format!("{name} has gone BANKRUPT! All assets given to {by}."));
    Some(BankruptcyOutcome::Absorbed { by })
}
