//! Amortization calculator
//!
//! Closed-form EMI (equated monthly instalment) formulas and their inverse.
//! Everything here is a pure function of its inputs.

pub mod history;

pub use history::{CalculationHistory, CalculationRecord, HISTORY_CAPACITY};

use serde::{Deserialize, Serialize};

use crate::error::TrackerError;
use crate::validation::{require_non_negative, require_positive, Validate};
use crate::Result;

/// EMI above this share of monthly salary is flagged as unaffordable.
pub const AFFORDABILITY_RATIO: f64 = 0.4;

fn monthly_rate(annual_rate_percent: f64) -> f64 {
    annual_rate_percent / 12.0 / 100.0
}

/// Returns `1 - (1+r)^-n`, which stays in (0, 1] for any `r > 0` and `n > 0`.
///
/// Working with the decaying factor keeps long terms and large rates from
/// overflowing, and `exp_m1` avoids cancellation for small `r`.
fn discount(r: f64, n: f64) -> f64 {
    -(-n * r.ln_1p()).exp_m1()
}

fn require_representable(value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(TrackerError::invalid("inputs are out of range"));
    }
    Ok(value)
}

fn validate_terms(amount_field: &str, amount: f64, annual_rate_percent: f64, term_months: i32) -> Result<()> {
    if term_months <= 0 {
        return Err(TrackerError::invalid("term_months must be positive"));
    }
    require_non_negative(amount_field, amount)?;
    require_non_negative("annual_rate", annual_rate_percent)
}

/// Monthly instalment for `principal` borrowed at `annual_rate_percent` over `term_months`.
///
/// A zero rate degenerates to straight division of the principal.
pub fn compute_emi(principal: f64, annual_rate_percent: f64, term_months: i32) -> Result<f64> {
    validate_terms("principal", principal, annual_rate_percent, term_months)?;

    let r = monthly_rate(annual_rate_percent);
    let n = f64::from(term_months);
    if r == 0.0 {
        return Ok(principal / n);
    }

    require_representable(principal * r / discount(r, n))
}

/// Largest principal whose EMI equals `desired_emi`. Inverse of [`compute_emi`].
pub fn compute_max_loan(desired_emi: f64, annual_rate_percent: f64, term_months: i32) -> Result<f64> {
    validate_terms("desired_emi", desired_emi, annual_rate_percent, term_months)?;

    let r = monthly_rate(annual_rate_percent);
    let n = f64::from(term_months);
    if r == 0.0 {
        return Ok(desired_emi * n);
    }

    require_representable(desired_emi * discount(r, n) / r)
}

/// Two-decimal rounding used for display values.
pub fn round_currency(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn exceeds_affordability(emi: f64, monthly_salary: f64) -> bool {
    emi > AFFORDABILITY_RATIO * monthly_salary
}

//
// ================= Requests / Quotes =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmiRequest {
    pub principal: f64,
    pub annual_rate: f64,
    pub term_months: i32,
    #[serde(default)]
    pub monthly_salary: Option<f64>,
}

impl Validate for EmiRequest {
    fn validate(&self) -> Result<()> {
        validate_terms("principal", self.principal, self.annual_rate, self.term_months)?;
        if let Some(salary) = self.monthly_salary {
            require_positive("monthly_salary", salary)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmiQuote {
    pub emi: f64,
    pub emi_rounded: f64,
    pub total_payment: f64,
    pub total_interest: f64,
    /// Present only when a salary was supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exceeds_affordability: Option<bool>,
}

impl EmiRequest {
    pub fn quote(&self) -> Result<EmiQuote> {
        self.validate()?;
        let emi = compute_emi(self.principal, self.annual_rate, self.term_months)?;
        let total_payment = emi * f64::from(self.term_months);

        Ok(EmiQuote {
            emi,
            emi_rounded: round_currency(emi),
            total_payment: round_currency(total_payment),
            total_interest: round_currency(total_payment - self.principal),
            exceeds_affordability: self
                .monthly_salary
                .map(|salary| exceeds_affordability(emi, salary)),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaxLoanRequest {
    pub desired_emi: f64,
    pub annual_rate: f64,
    pub term_months: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaxLoanQuote {
    pub max_loan: f64,
    pub max_loan_rounded: f64,
}

impl MaxLoanRequest {
    pub fn quote(&self) -> Result<MaxLoanQuote> {
        let max_loan = compute_max_loan(self.desired_emi, self.annual_rate, self.term_months)?;
        Ok(MaxLoanQuote {
            max_loan,
            max_loan_rounded: round_currency(max_loan),
        })
    }
}
