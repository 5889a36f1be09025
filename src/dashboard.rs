//! Dashboard summary
//!
//! Pure aggregation over a user's loans, payments and goals.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{FinancialGoal, GoalId, Loan, LoanId, LoanStatus, Payment};

/// Active loans ending within this many days are surfaced as reminders.
pub const REMINDER_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoanReminder {
    pub loan_id: LoanId,
    pub loan_type: String,
    pub end_date: NaiveDate,
    pub days_remaining: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoanProgress {
    pub loan_id: LoanId,
    pub loan_type: String,
    pub paid: f64,
    pub total: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoalProgress {
    pub goal_id: GoalId,
    pub goal_name: String,
    pub current: f64,
    pub target: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_spend: f64,
    pub total_goal_target: f64,
    pub loan_count_by_type: BTreeMap<String, usize>,
    pub paid_off_loans: usize,
    pub upcoming_due: Vec<LoanReminder>,
    pub loan_progress: Vec<LoanProgress>,
    pub goal_progress: Vec<GoalProgress>,
}

/// `part / whole` as a percentage clamped to 0..=100; zero when `whole` is not positive.
pub fn progress_percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        (part / whole * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    }
}

pub fn upcoming_reminders(loans: &[Loan], today: NaiveDate) -> Vec<LoanReminder> {
    loans
        .iter()
        .filter(|l| l.status == LoanStatus::Active)
        .filter_map(|l| {
            let days_remaining = (l.end_date - today).num_days();
            (0..=REMINDER_WINDOW_DAYS)
                .contains(&days_remaining)
                .then(|| LoanReminder {
                    loan_id: l.loan_id,
                    loan_type: l.loan_type.clone(),
                    end_date: l.end_date,
                    days_remaining,
                })
        })
        .collect()
}

pub fn summarize(
    loans: &[Loan],
    payments: &[Payment],
    goals: &[FinancialGoal],
    today: NaiveDate,
) -> DashboardSummary {
    let mut loan_count_by_type = BTreeMap::new();
    for loan in loans {
        *loan_count_by_type.entry(loan.loan_type.clone()).or_insert(0) += 1;
    }

    let loan_progress = loans
        .iter()
        .map(|l| {
            let paid = l.principal_amount - l.outstanding_balance;
            LoanProgress {
                loan_id: l.loan_id,
                loan_type: l.loan_type.clone(),
                paid,
                total: l.principal_amount,
                percent: progress_percent(paid, l.principal_amount),
            }
        })
        .collect();

    let goal_progress = goals
        .iter()
        .map(|g| GoalProgress {
            goal_id: g.goal_id,
            goal_name: g.goal_name.clone(),
            current: g.current_amount,
            target: g.target_amount,
            percent: progress_percent(g.current_amount, g.target_amount),
        })
        .collect();

    DashboardSummary {
        total_spend: payments.iter().map(|p| p.amount).sum(),
        total_goal_target: goals.iter().map(|g| g.target_amount).sum(),
        loan_count_by_type,
        paid_off_loans: loans
            .iter()
            .filter(|l| l.status == LoanStatus::PaidOff)
            .count(),
        upcoming_due: upcoming_reminders(loans, today),
        loan_progress,
        goal_progress,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{date, loan};
    use approx::assert_relative_eq;
    use chrono::Utc;

    fn payment(amount: f64) -> Payment {
        Payment {
            payment_id: 1,
            payment_date: date(2024, 5, 1),
            amount,
            category: "Food".to_string(),
            payment_method: None,
            is_recurring: false,
            notes: None,
            created_at: Utc::now(),
        }
    }

    fn goal(target: f64, current: f64) -> FinancialGoal {
        FinancialGoal {
            goal_id: 1,
            goal_name: "Vacation".to_string(),
            target_amount: target,
            current_amount: current,
            target_date: None,
            priority: None,
            status: "In Progress".to_string(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_progress_percent_is_clamped() {
        assert_eq!(progress_percent(50.0, 200.0), 25.0);
        assert_eq!(progress_percent(500.0, 200.0), 100.0);
        assert_eq!(progress_percent(-10.0, 200.0), 0.0);
        assert_eq!(progress_percent(10.0, 0.0), 0.0);
    }

    #[test]
    fn test_reminder_window() {
        let today = date(2024, 6, 1);
        let mut due_today = loan(1, 100.0, 5.0);
        due_today.end_date = today;
        let mut due_in_week = loan(2, 100.0, 5.0);
        due_in_week.end_date = date(2024, 6, 8);
        let mut too_late = loan(3, 100.0, 5.0);
        too_late.end_date = date(2024, 6, 9);
        let mut overdue = loan(4, 100.0, 5.0);
        overdue.end_date = date(2024, 5, 31);
        let mut paid = loan(5, 0.0, 5.0);
        paid.end_date = date(2024, 6, 3);
        paid.status = LoanStatus::PaidOff;

        let reminders = upcoming_reminders(&[due_today, due_in_week, too_late, overdue, paid], today);
        let ids: Vec<LoanId> = reminders.iter().map(|r| r.loan_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(reminders[1].days_remaining, 7);
    }

    #[test]
    fn test_summary_totals() {
        let mut car = loan(1, 6000.0, 9.0);
        car.loan_type = "Car".to_string();
        car.principal_amount = 8000.0;
        let mut paid = loan(2, 0.0, 5.0);
        paid.loan_type = "Car".to_string();
        paid.status = LoanStatus::PaidOff;
        let home = loan(3, 10_000.0, 7.0);

        let summary = summarize(
            &[car, paid, home],
            &[payment(120.5), payment(79.5)],
            &[goal(1000.0, 250.0), goal(500.0, 0.0)],
            date(2024, 1, 1),
        );

        assert_relative_eq!(summary.total_spend, 200.0);
        assert_relative_eq!(summary.total_goal_target, 1500.0);
        assert_eq!(summary.loan_count_by_type.get("Car"), Some(&2));
        assert_eq!(summary.loan_count_by_type.get("Personal"), Some(&1));
        assert_eq!(summary.paid_off_loans, 1);
        assert_relative_eq!(summary.loan_progress[0].percent, 25.0);
        assert_relative_eq!(summary.goal_progress[0].percent, 25.0);
        assert!(summary.upcoming_due.is_empty());
    }
}
