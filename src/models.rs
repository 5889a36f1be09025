//! Core data models for the finance tracker

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TrackerError;
use crate::validation::{
    require_date_order, require_max_chars, require_non_blank, require_non_negative,
    require_positive, Validate,
};
use crate::Result;

pub type UserId = i64;
pub type LoanId = i64;
pub type BudgetId = i64;
pub type PaymentId = i64;
pub type GoalId = i64;
pub type NoteId = i64;

pub const NOTE_MAX_CHARS: usize = 500;
pub const DEFAULT_GOAL_STATUS: &str = "In Progress";

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LoanStatus {
    Active,
    #[serde(rename = "Paid Off")]
    PaidOff,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Active => "Active",
            LoanStatus::PaidOff => "Paid Off",
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LoanStatus {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(LoanStatus::Active),
            "paid off" | "paid_off" | "paidoff" => Ok(LoanStatus::PaidOff),
            other => Err(TrackerError::invalid(format!(
                "Unknown loan status: {}",
                other
            ))),
        }
    }
}

//
// ================= Users =================
//

/// Public profile of a user, joined with the e-mail held in the auth table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub user_id: UserId,
    pub user_name: String,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
    pub email: String,
}

/// Editable profile fields. Also used for signup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileDetails {
    pub user_name: String,
    pub full_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl Validate for ProfileDetails {
    fn validate(&self) -> Result<()> {
        require_non_blank("user_name", &self.user_name)?;
        require_non_blank("full_name", &self.full_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(flatten)]
    pub details: ProfileDetails,
    /// New e-mail; unchanged when absent
    #[serde(default)]
    pub email: Option<String>,
}

/// Credentials row as stored by the persistence gateway
#[derive(Debug, Clone)]
pub struct AuthRecord {
    pub user_id: UserId,
    pub user_name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginAttempt {
    pub user_id: Option<UserId>,
    pub email: String,
    pub is_successful: bool,
    pub attempted_at: DateTime<Utc>,
}

//
// ================= Loans =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Loan {
    pub loan_id: LoanId,
    pub loan_type: String,
    pub principal_amount: f64,
    /// Annual rate in percent
    pub interest_rate: f64,
    pub term_months: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub monthly_payment: f64,
    pub outstanding_balance: f64,
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    pub fn is_active(&self) -> bool {
        self.status == LoanStatus::Active
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLoan {
    pub loan_type: String,
    pub principal_amount: f64,
    pub interest_rate: f64,
    pub term_months: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub monthly_payment: f64,
    pub outstanding_balance: f64,
    pub status: LoanStatus,
}

impl Validate for NewLoan {
    fn validate(&self) -> Result<()> {
        require_non_blank("loan_type", &self.loan_type)?;
        require_non_negative("principal_amount", self.principal_amount)?;
        require_non_negative("interest_rate", self.interest_rate)?;
        require_non_negative("monthly_payment", self.monthly_payment)?;
        require_non_negative("outstanding_balance", self.outstanding_balance)?;

        if self.term_months <= 0 {
            return Err(TrackerError::invalid("term_months must be positive"));
        }
        if self.outstanding_balance > self.principal_amount {
            return Err(TrackerError::invalid(
                "outstanding_balance must not exceed principal_amount",
            ));
        }
        if self.status == LoanStatus::Active && self.monthly_payment <= 0.0 {
            return Err(TrackerError::invalid(
                "monthly_payment must be positive for an active loan",
            ));
        }
        require_date_order("start_date", self.start_date, "end_date", self.end_date)
    }
}

//
// ================= Budgets =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Budget {
    pub budget_id: BudgetId,
    pub budget_name: String,
    pub total_amount: f64,
    pub category: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBudget {
    pub budget_name: String,
    pub total_amount: f64,
    #[serde(default)]
    pub category: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Validate for NewBudget {
    fn validate(&self) -> Result<()> {
        require_non_blank("budget_name", &self.budget_name)?;
        require_positive("total_amount", self.total_amount)?;
        require_date_order("start_date", self.start_date, "end_date", self.end_date)
    }
}

//
// ================= Payments =================
//

/// A spending record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub payment_id: PaymentId,
    pub payment_date: NaiveDate,
    pub amount: f64,
    pub category: String,
    pub payment_method: Option<String>,
    pub is_recurring: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPayment {
    pub payment_date: NaiveDate,
    pub amount: f64,
    pub category: String,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Validate for NewPayment {
    fn validate(&self) -> Result<()> {
        require_positive("amount", self.amount)?;
        require_non_blank("category", &self.category)
    }
}

//
// ================= Financial Goals =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinancialGoal {
    pub goal_id: GoalId,
    pub goal_name: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub target_date: Option<NaiveDate>,
    pub priority: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGoal {
    pub goal_name: String,
    pub target_amount: f64,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Option<String>,
}

impl Validate for NewGoal {
    fn validate(&self) -> Result<()> {
        require_non_blank("goal_name", &self.goal_name)?;
        require_positive("target_amount", self.target_amount)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalUpdate {
    pub goal_name: String,
    pub target_amount: f64,
    #[serde(default)]
    pub current_amount: f64,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl GoalUpdate {
    pub fn status_or_default(&self) -> String {
        self.status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_GOAL_STATUS)
            .to_string()
    }
}

impl Validate for GoalUpdate {
    fn validate(&self) -> Result<()> {
        require_non_blank("goal_name", &self.goal_name)?;
        require_positive("target_amount", self.target_amount)?;
        require_non_negative("current_amount", self.current_amount)
    }
}

//
// ================= Notes =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Note {
    pub note_id: NoteId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNote {
    pub content: String,
}

impl Validate for NewNote {
    fn validate(&self) -> Result<()> {
        require_non_blank("content", &self.content)?;
        require_max_chars("content", &self.content, NOTE_MAX_CHARS)
    }
}
