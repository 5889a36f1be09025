//! Persistence gateway
//!
//! CRUD access to users, loans, budgets, payments, goals and notes.
//! Every record operation is scoped to the owning user; touching another
//! user's row behaves exactly like touching a missing one.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryFinanceStore;
pub use postgres::PostgresFinanceStore;

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::models::{
    AuthRecord, Budget, BudgetId, FinancialGoal, GoalId, GoalUpdate, Loan, LoanId, LoginAttempt,
    NewBudget, NewGoal, NewLoan, NewNote, NewPayment, Note, NoteId, Payment, PaymentId,
    ProfileDetails, ProfileUpdate, UserId, UserProfile,
};
use crate::Result;

/// Trait for finance record persistence
#[async_trait::async_trait]
pub trait FinanceStore: Send + Sync {
    // Users & auth
    async fn create_user(&self, details: &ProfileDetails, email: &str, password_hash: &str) -> Result<UserId>;
    async fn find_auth_by_email(&self, email: &str) -> Result<Option<AuthRecord>>;
    async fn record_login_attempt(&self, attempt: LoginAttempt) -> Result<()>;
    async fn login_attempts(&self, email: &str) -> Result<Vec<LoginAttempt>>;
    async fn get_profile(&self, user_id: UserId) -> Result<Option<UserProfile>>;
    async fn update_profile(&self, user_id: UserId, update: &ProfileUpdate) -> Result<UserProfile>;

    // Loans, in retrieval order (id ascending)
    async fn list_loans(&self, user_id: UserId) -> Result<Vec<Loan>>;
    async fn active_loans(&self, user_id: UserId) -> Result<Vec<Loan>>;
    async fn create_loan(&self, user_id: UserId, loan: &NewLoan) -> Result<Loan>;
    async fn update_loan(&self, user_id: UserId, loan_id: LoanId, loan: &NewLoan) -> Result<Loan>;
    async fn delete_loan(&self, user_id: UserId, loan_id: LoanId) -> Result<()>;

    // Budgets, newest first
    async fn list_budgets(&self, user_id: UserId) -> Result<Vec<Budget>>;
    async fn create_budget(&self, user_id: UserId, budget: &NewBudget) -> Result<Budget>;
    async fn update_budget(&self, user_id: UserId, budget_id: BudgetId, budget: &NewBudget) -> Result<Budget>;
    async fn delete_budget(&self, user_id: UserId, budget_id: BudgetId) -> Result<()>;

    // Payments, latest payment date first
    async fn list_payments(&self, user_id: UserId) -> Result<Vec<Payment>>;
    async fn create_payment(&self, user_id: UserId, payment: &NewPayment) -> Result<Payment>;
    async fn update_payment(&self, user_id: UserId, payment_id: PaymentId, payment: &NewPayment) -> Result<Payment>;
    async fn delete_payment(&self, user_id: UserId, payment_id: PaymentId) -> Result<()>;

    // Financial goals, newest first
    async fn list_goals(&self, user_id: UserId) -> Result<Vec<FinancialGoal>>;
    async fn create_goal(&self, user_id: UserId, goal: &NewGoal) -> Result<FinancialGoal>;
    async fn update_goal(&self, user_id: UserId, goal_id: GoalId, goal: &GoalUpdate) -> Result<FinancialGoal>;
    async fn delete_goal(&self, user_id: UserId, goal_id: GoalId) -> Result<()>;

    // Notes, newest first
    async fn list_notes(&self, user_id: UserId) -> Result<Vec<Note>>;
    async fn create_note(&self, user_id: UserId, note: &NewNote) -> Result<Note>;
    async fn delete_note(&self, user_id: UserId, note_id: NoteId) -> Result<()>;
}

/// Pick the backend from configuration: Postgres when a database URL is set, in-memory otherwise.
pub fn build_store(config: &AppConfig) -> Arc<dyn FinanceStore> {
    if let Some(url) = config.database_url.as_deref() {
        match PostgresFinanceStore::connect_lazy(url, config.max_connections) {
            Ok(store) => {
                info!("Finance store backend: postgres");
                return Arc::new(store);
            }
            Err(error) => {
                warn!(
                    "Failed to initialize postgres store, falling back to in-memory: {}",
                    error
                );
            }
        }
    }

    info!("Finance store backend: in-memory");
    Arc::new(InMemoryFinanceStore::new())
}
