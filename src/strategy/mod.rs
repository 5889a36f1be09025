//! Debt strategy ranker
//!
//! Produces repayment orderings over a user's active loans:
//! - snowball: smallest outstanding balance first
//! - avalanche: highest interest rate first
//!
//! Both sorts are stable, so ties keep retrieval order. Nothing is persisted.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{Loan, LoanId};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DebtStrategy {
    Snowball,
    Avalanche,
}

impl DebtStrategy {
    pub fn description(&self) -> &'static str {
        match self {
            DebtStrategy::Snowball => {
                "Pay smallest outstanding balances first to build momentum."
            }
            DebtStrategy::Avalanche => {
                "Pay highest-interest balances first to minimize total interest."
            }
        }
    }

    /// Loans in repayment order for this strategy.
    pub fn order<'a>(&self, loans: &'a [Loan]) -> Vec<&'a Loan> {
        match self {
            DebtStrategy::Snowball => snowball_order(loans),
            DebtStrategy::Avalanche => avalanche_order(loans),
        }
    }
}

impl fmt::Display for DebtStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DebtStrategy::Snowball => "Snowball",
            DebtStrategy::Avalanche => "Avalanche",
        };
        write!(f, "{}", s)
    }
}

/// Ascending by outstanding balance.
pub fn snowball_order(loans: &[Loan]) -> Vec<&Loan> {
    let mut ordered: Vec<&Loan> = loans.iter().collect();
    ordered.sort_by(|a, b| a.outstanding_balance.total_cmp(&b.outstanding_balance));
    ordered
}

/// Descending by interest rate.
pub fn avalanche_order(loans: &[Loan]) -> Vec<&Loan> {
    let mut ordered: Vec<&Loan> = loans.iter().collect();
    ordered.sort_by(|a, b| b.interest_rate.total_cmp(&a.interest_rate));
    ordered
}

pub fn rank_by_snowball(loans: &[Loan]) -> Vec<LoanId> {
    snowball_order(loans).into_iter().map(|l| l.loan_id).collect()
}

pub fn rank_by_avalanche(loans: &[Loan]) -> Vec<LoanId> {
    avalanche_order(loans).into_iter().map(|l| l.loan_id).collect()
}

//
// ================= Chart =================
//

/// One slice of the proportional balance chart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartSlice {
    pub loan_id: LoanId,
    pub loan_type: String,
    pub outstanding_balance: f64,
    /// Fraction of the total outstanding balance, 0.0..=1.0
    pub share: f64,
}

pub fn chart_breakdown(ordered: &[&Loan]) -> Vec<ChartSlice> {
    let total: f64 = ordered.iter().map(|l| l.outstanding_balance).sum();

    ordered
        .iter()
        .map(|loan| ChartSlice {
            loan_id: loan.loan_id,
            loan_type: loan.loan_type.clone(),
            outstanding_balance: loan.outstanding_balance,
            share: if total > 0.0 {
                loan.outstanding_balance / total
            } else {
                0.0
            },
        })
        .collect()
}

//
// ================= Plan =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtOrdering {
    pub strategy: DebtStrategy,
    pub description: String,
    pub loan_ids: Vec<LoanId>,
    pub chart: Vec<ChartSlice>,
}

impl DebtOrdering {
    pub fn build(strategy: DebtStrategy, loans: &[Loan]) -> Self {
        let ordered = strategy.order(loans);
        Self {
            strategy,
            description: strategy.description().to_string(),
            loan_ids: ordered.iter().map(|l| l.loan_id).collect(),
            chart: chart_breakdown(&ordered),
        }
    }
}

/// Both orderings over the active subset of a user's loans
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtPlan {
    pub loans: Vec<Loan>,
    pub snowball: DebtOrdering,
    pub avalanche: DebtOrdering,
    pub total_outstanding: f64,
}

impl DebtPlan {
    /// Non-active loans are dropped; the rest keep retrieval order.
    pub fn from_loans(loans: Vec<Loan>) -> Self {
        let active: Vec<Loan> = loans.into_iter().filter(Loan::is_active).collect();

        Self {
            snowball: DebtOrdering::build(DebtStrategy::Snowball, &active),
            avalanche: DebtOrdering::build(DebtStrategy::Avalanche, &active),
            total_outstanding: active.iter().map(|l| l.outstanding_balance).sum(),
            loans: active,
        }
    }
}
