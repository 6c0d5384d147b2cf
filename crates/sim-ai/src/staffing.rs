//! Headcount targets, layoffs and assignment of staff to products.

use sim_core::{Company, Department, QualityRank, Staffing, EMPLOYEE_QUARTERLY_COST};
use std::cmp::Ordering;

/// Severance paid per employee an AI company lets go.
pub const SEVERANCE_PER_HEAD: f64 = 20_000.0;

/// Headcount whose salaries make up `ratio` of `revenue`.
pub fn target_headcount(ratio: f64, revenue: f64) -> u32 {
    (ratio * revenue / EMPLOYEE_QUARTERLY_COST).floor().max(0.0) as u32
}

/// Product names ordered by effectiveness, weakest first.
fn weakest_first(c: &Company) -> Vec<String> {
    let mut order: Vec<(&String, f64)> = c
        .products
        .iter()
        .map(|(name, p)| (name, p.effectiveness))
        .collect();
    order.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    order.into_iter().map(|(name, _)| name.clone()).collect()
}

/// Remove up to `count` product assignments, taking Marketing, then QA,
/// then R&D from the weakest products first. Returns how many were removed.
pub fn unassign_weakest_first(c: &mut Company, count: u32) -> u32 {
    let mut left = count;
    for name in weakest_first(c) {
        if left == 0 {
            break;
        }
        let Some(p) = c.products.get_mut(&name) else {
            continue;
        };
        for dept in [Department::Marketing, Department::Qa, Department::Rnd] {
            let slot = p.staffing.get_mut(dept);
            let take = (*slot).min(left);
            *slot -= take;
            left -= take;
        }
    }
    count - left
}

/// What a layoff did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FiringReport {
    pub unassigned: u32,
    pub fired: u32,
    pub severance: f64,
    /// Staff beyond campus capacity let go without severance because cash
    /// ran out.
    pub released: u32,
}

/// Cut headcount down to `target`.
///
/// Assignments are stripped first. Severance is paid per head; when cash
/// cannot cover all of it, as many as are affordable are fired and anyone
/// still over campus capacity is released for free.
pub fn fire_excess_employees(c: &mut Company, target: u32) -> FiringReport {
    let mut report = FiringReport::default();
    let excess = c.employees.saturating_sub(target);
    if excess == 0 {
        return report;
    }
    report.unassigned = unassign_weakest_first(c, excess);

    let full = f64::from(excess) * SEVERANCE_PER_HEAD;
    if c.cash >= full {
        c.cash -= full;
        c.employees -= excess;
        report.fired = excess;
        report.severance = full;
        return report;
    }

    let affordable = (c.cash / SEVERANCE_PER_HEAD).floor();
    if affordable > 0.0 {
        let n = (affordable as u32).min(excess);
        report.fired = n;
        report.severance = f64::from(n) * SEVERANCE_PER_HEAD;
        c.cash -= report.severance;
        c.employees -= n;
    }
    report.released = c.employees.saturating_sub(c.employee_capacity());
    c.employees -= report.released;
    report
}

/// (R&D, QA) shares of a product's staff for its quality rank; Marketing
/// takes the rest.
pub fn department_split(rank: QualityRank) -> (f64, f64) {
    match rank {
        QualityRank::VeryBad | QualityRank::Bad => (0.6, 0.1),
        QualityRank::Moderate => (0.4, 0.3),
        QualityRank::Good | QualityRank::VeryGood => (0.2, 0.4),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssignmentChange {
    pub product: String,
    pub department: Department,
    pub delta: i64,
}

/// Re-partition every employee across the company's products.
///
/// Each product gets an even share; the remainder goes one each to the most
/// effective products. Within a product staff is split by `rank_of`.
pub fn reassign_employees(
    c: &mut Company,
    rank_of: impl Fn(&str) -> QualityRank,
) -> Vec<AssignmentChange> {
    let count = c.products.len() as u32;
    if count == 0 {
        return Vec::new();
    }
    let base = c.employees / count;
    let mut extra = c.employees % count;

    let mut order: Vec<(String, f64)> = c
        .products
        .iter()
        .map(|(name, p)| (name.clone(), p.effectiveness))
        .collect();
    order.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let mut changes = Vec::new();
    for (name, _) in order {
        let mut total = base;
        if extra > 0 {
            total += 1;
            extra -= 1;
        }
        let (rnd_pct, qa_pct) = department_split(rank_of(&name));
        let rnd = (f64::from(total) * rnd_pct).floor() as u32;
        let qa = (f64::from(total) * qa_pct).floor() as u32;
        let staffing = Staffing::new(rnd, qa, total - rnd - qa);

        let Some(p) = c.products.get_mut(&name) else {
            continue;
        };
        for dept in Department::ALL {
            let delta = i64::from(*staffing.get(dept)) - i64::from(*p.staffing.get(dept));
            if delta != 0 {
                changes.push(AssignmentChange {
                    product: name.clone(),
                    department: dept,
                    delta,
                });
            }
        }
        p.staffing = staffing;
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sim_core::{Campus, Product, Tier};

    fn startup(cash: f64, employees: u32) -> Company {
        let mut c = Company::new("Spark", Some(Tier::Startup));
        c.cash = cash;
        c.employees = employees;
        c.campuses.push(Campus::new("Small Office", 400_000.0, 0.02, 50));
        c
    }

    fn with_product(mut c: Company, name: &str, eff: f64, staff: (u32, u32, u32)) -> Company {
        let mut p = Product::new(c.name.clone(), "AI")
            .with_staffing(Staffing::new(staff.0, staff.1, staff.2));
        p.effectiveness = eff;
        c.products.insert(name.to_string(), p);
        c
    }

    #[test]
    fn target_headcount_floors() {
        assert_eq!(target_headcount(0.8, 100_000.0), 3);
        assert_eq!(target_headcount(0.4, 0.0), 0);
    }

    #[test]
    fn unassigns_marketing_then_qa_then_rnd_from_weakest() {
        let c = startup(0.0, 12);
        let c = with_product(c, "Strong", 0.9, (2, 2, 2));
        let mut c = with_product(c, "Weak", 0.1, (2, 2, 2));
        assert_eq!(unassign_weakest_first(&mut c, 5), 5);
        assert_eq!(c.products["Weak"].staffing, Staffing::new(1, 0, 0));
        assert_eq!(c.products["Strong"].staffing, Staffing::new(2, 2, 2));
        assert_eq!(unassign_weakest_first(&mut c, 100), 7);
    }

    #[test]
    fn firing_pays_severance_when_affordable() {
        let mut c = with_product(startup(2_000_000.0, 15), "P", 0.1, (5, 5, 5));
        let r = fire_excess_employees(&mut c, 3);
        assert_eq!(r.fired, 12);
        assert_eq!(c.employees, 3);
        assert!((c.cash - (2_000_000.0 - 240_000.0)).abs() < 1e-6);
        assert_eq!(c.products["P"].staffing.total(), 3);
    }

    #[test]
    fn firing_is_partial_when_cash_is_short() {
        let mut c = startup(50_000.0, 60);
        let r = fire_excess_employees(&mut c, 10);
        assert_eq!(r.fired, 2);
        assert_eq!(r.released, 8);
        assert_eq!(c.employees, 50);
        assert!((c.cash - 10_000.0).abs() < 1e-6);
    }

    #[test]
    fn nothing_to_fire() {
        let mut c = startup(0.0, 3);
        assert_eq!(fire_excess_employees(&mut c, 5), FiringReport::default());
    }

    #[test]
    fn reassignment_splits_by_rank_and_reports_deltas() {
        let c = startup(0.0, 11);
        let c = with_product(c, "Alpha", 0.2, (0, 0, 0));
        let mut c = with_product(c, "Beta", 0.8, (1, 1, 1));
        let changes = reassign_employees(&mut c, |name| {
            if name == "Beta" {
                QualityRank::VeryGood
            } else {
                QualityRank::Bad
            }
        });
        // Beta is more effective and takes the odd employee.
        assert_eq!(c.products["Beta"].staffing, Staffing::new(1, 2, 3));
        assert_eq!(c.products["Alpha"].staffing, Staffing::new(3, 0, 2));
        assert!(changes.contains(&AssignmentChange {
            product: "Beta".into(),
            department: Department::Marketing,
            delta: 2,
        }));
        assert!(!changes
            .iter()
            .any(|ch| ch.product == "Beta" && ch.department == Department::Rnd));
    }

    proptest! {
        #[test]
        fn reassignment_uses_every_employee(
            employees in 0u32..500,
            effs in prop::collection::vec(0f64..5.0, 1..6),
        ) {
            let mut c = startup(0.0, employees);
            for (i, e) in effs.iter().enumerate() {
                c = with_product(c, &format!("P{i}"), *e, (0, 0, 0));
            }
            reassign_employees(&mut c, |_| QualityRank::Moderate);
            prop_assert_eq!(c.assigned_employees(), employees);
        }
    }
}
