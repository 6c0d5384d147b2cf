//! Debt and fixed-income instruments held by companies.

use crate::{ensure_finite, ValidationError};
use serde::{Deserialize, Serialize};

/// Monthly payment of a fully amortizing loan.
///
/// Standard annuity formula `r·P / (1 − (1 + r)^−n)` with `r` the monthly
/// rate. A zero rate degenerates to straight-line repayment and a
/// non-positive term yields no payment.
pub fn amortized_monthly_payment(principal: f64, annual_rate: f64, months: i32) -> f64 {
    if months <= 0 {
        return 0.0;
    }
    let r = annual_rate / 12.0;
    if r.abs() < f64::EPSILON {
        return principal / f64::from(months);
    }
    (r * principal) / (1.0 - (1.0 + r).powi(-months))
}

/// Cash movements produced by one quarter of loan servicing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LoanQuarter {
    /// Interest portion (three months).
    pub interest: f64,
    /// Principal actually retired (three months, capped at the balance).
    pub principal: f64,
    /// Cash leaving the company: three fixed monthly payments.
    pub payment: f64,
}

/// An amortizing loan with a payment fixed at origination.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LoanRecord", into = "LoanRecord")]
pub struct Loan {
    /// Outstanding balance.
    pub principal: f64,
    /// Annual interest rate, e.g. 0.09.
    pub annual_rate: f64,
    /// Months left on the schedule; may go negative on the final quarter.
    pub term_remaining_months: i32,
    original_principal: f64,
    original_term_months: i32,
    monthly_payment: f64,
}

/// Persisted form of a [`Loan`]; the monthly payment is derived on load.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct LoanRecord {
    principal: f64,
    annual_rate: f64,
    term_remaining_months: i32,
    original_principal: f64,
    original_term_months: i32,
}

impl Loan {
    /// Originate a loan; the monthly payment is fixed from here on.
    pub fn new(principal: f64, annual_rate: f64, term_months: i32) -> Self {
        Self {
            principal,
            annual_rate,
            term_remaining_months: term_months,
            original_principal: principal,
            original_term_months: term_months,
            monthly_payment: amortized_monthly_payment(principal, annual_rate, term_months),
        }
    }

    pub fn monthly_payment(&self) -> f64 {
        self.monthly_payment
    }

    pub fn original_principal(&self) -> f64 {
        self.original_principal
    }

    pub fn original_term_months(&self) -> i32 {
        self.original_term_months
    }

    /// Service three months of the schedule.
    ///
    /// Interest accrues on the balance at the start of the quarter; the
    /// principal portion of each payment is floored at zero and the balance
    /// never goes negative.
    pub fn amortize_quarter(&mut self) -> LoanQuarter {
        let monthly_interest = self.principal * self.annual_rate / 12.0;
        let monthly_principal = (self.monthly_payment - monthly_interest).max(0.0);
        let before = self.principal;
        self.principal = (self.principal - monthly_principal * 3.0).max(0.0);
        self.term_remaining_months -= 3;
        LoanQuarter {
            interest: monthly_interest * 3.0,
            principal: before - self.principal,
            payment: self.monthly_payment * 3.0,
        }
    }

    /// Whether the schedule has run out or the balance is repaid.
    pub fn is_retired(&self) -> bool {
        self.term_remaining_months <= 0 || self.principal <= 0.0
    }
}

impl TryFrom<LoanRecord> for Loan {
    type Error = ValidationError;

    fn try_from(r: LoanRecord) -> Result<Self, Self::Error> {
        ensure_finite("loan.principal", r.principal)?;
        ensure_finite("loan.annual_rate", r.annual_rate)?;
        ensure_finite("loan.original_principal", r.original_principal)?;
        if r.principal < 0.0 || r.original_principal < 0.0 {
            return Err(ValidationError::NegativeMoney("loan.principal"));
        }
        Ok(Self {
            principal: r.principal,
            annual_rate: r.annual_rate,
            term_remaining_months: r.term_remaining_months,
            original_principal: r.original_principal,
            original_term_months: r.original_term_months,
            monthly_payment: amortized_monthly_payment(
                r.original_principal,
                r.annual_rate,
                r.original_term_months,
            ),
        })
    }
}

impl From<Loan> for LoanRecord {
    fn from(l: Loan) -> Self {
        Self {
            principal: l.principal,
            annual_rate: l.annual_rate,
            term_remaining_months: l.term_remaining_months,
            original_principal: l.original_principal,
            original_term_months: l.original_term_months,
        }
    }
}

/// A bond paying quarterly interest and returning principal at maturity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bond {
    pub principal: f64,
    pub annual_rate: f64,
    /// Quarters until maturity.
    pub term_remaining: u32,
    pub original_term: u32,
}

impl Bond {
    pub fn new(principal: f64, annual_rate: f64, term_quarters: u32) -> Self {
        Self {
            principal,
            annual_rate,
            term_remaining: term_quarters,
            original_term: term_quarters,
        }
    }

    pub fn quarterly_interest(&self) -> f64 {
        self.principal * (self.annual_rate / 4.0)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_finite("bond.principal", self.principal)?;
        ensure_finite("bond.annual_rate", self.annual_rate)?;
        if self.principal < 0.0 {
            return Err(ValidationError::NegativeMoney("bond.principal"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_matches_annuity_formula() {
        let p = amortized_monthly_payment(120_000.0, 0.09, 60);
        // 120k over 5 years at 9%: ~2491.00
        assert!((p - 2491.0).abs() < 1.0, "payment {p}");
        assert_eq!(amortized_monthly_payment(1000.0, 0.09, 0), 0.0);
        assert!((amortized_monthly_payment(1200.0, 0.0, 12) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn one_quarter_of_amortization() {
        let mut loan = Loan::new(120_000.0, 0.09, 60);
        let payment = loan.monthly_payment();
        let q = loan.amortize_quarter();
        let expected = 120_000.0 - 3.0 * (payment - 120_000.0 * 0.0075);
        assert!((loan.principal - expected).abs() < 1e-6);
        assert!((q.payment - 3.0 * payment).abs() < 1e-9);
        assert!((q.interest - 2700.0).abs() < 1e-9);
        assert_eq!(loan.term_remaining_months, 57);
        assert!(!loan.is_retired());
    }

    #[test]
    fn loan_is_retired_at_end_of_term() {
        let mut loan = Loan::new(30_000.0, 0.06, 3);
        let q = loan.amortize_quarter();
        assert!(loan.is_retired());
        assert!(q.principal > 0.0);
        assert_eq!(loan.term_remaining_months, 0);
    }

    #[test]
    fn restored_loan_recomputes_payment_identically() {
        let mut loan = Loan::new(250_000.0, 0.11, 60);
        loan.amortize_quarter();
        loan.amortize_quarter();
        let json = serde_json::to_string(&loan).unwrap();
        assert!(!json.contains("monthly_payment"));
        let back: Loan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, loan);
        assert_eq!(back.monthly_payment(), loan.monthly_payment());
    }

    #[test]
    fn corrupt_loan_fails_to_restore() {
        let json = r#"{"principal":-5.0,"annual_rate":0.1,"term_remaining_months":3,
            "original_principal":10.0,"original_term_months":12}"#;
        assert!(serde_json::from_str::<Loan>(json).is_err());
    }

    #[test]
    fn bond_pays_quarter_of_annual_rate() {
        let b = Bond::new(100_000.0, 0.06, 4);
        assert!((b.quarterly_interest() - 1500.0).abs() < 1e-9);
        assert_eq!(b.original_term, 4);
    }
}
