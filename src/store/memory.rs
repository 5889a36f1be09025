//! In-memory finance store for development and tests

use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::FinanceStore;
use crate::error::TrackerError;
use crate::models::{
    AuthRecord, Budget, BudgetId, FinancialGoal, GoalId, GoalUpdate, Loan, LoanId, LoanStatus,
    LoginAttempt, NewBudget, NewGoal, NewLoan, NewNote, NewPayment, Note, NoteId, Payment,
    PaymentId, ProfileDetails, ProfileUpdate, UserId, UserProfile, DEFAULT_GOAL_STATUS,
};
use crate::Result;

struct StoredUser {
    details: ProfileDetails,
    email: String,
    password_hash: String,
}

impl StoredUser {
    fn profile(&self, user_id: UserId) -> UserProfile {
        let d = &self.details;
        UserProfile {
            user_id,
            user_name: d.user_name.clone(),
            full_name: d.full_name.clone(),
            phone_number: d.phone_number.clone(),
            gender: d.gender.clone(),
            date_of_birth: d.date_of_birth,
            address: d.address.clone(),
            city: d.city.clone(),
            state: d.state.clone(),
            zip_code: d.zip_code.clone(),
            country: d.country.clone(),
            email: self.email.clone(),
        }
    }
}

/// A row tagged with the user that owns it
struct Owned<T> {
    user_id: UserId,
    row: T,
}

type Table<T> = BTreeMap<i64, Owned<T>>;

#[derive(Default)]
struct Tables {
    last_id: i64,
    users: BTreeMap<UserId, StoredUser>,
    login_info: Vec<LoginAttempt>,
    loans: Table<Loan>,
    budgets: Table<Budget>,
    payments: Table<Payment>,
    goals: Table<FinancialGoal>,
    notes: Table<Note>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        self.users
            .iter()
            .any(|(id, u)| Some(*id) != except && u.email == email)
    }

    fn user_name_taken(&self, user_name: &str, except: Option<UserId>) -> bool {
        self.users
            .iter()
            .any(|(id, u)| Some(*id) != except && u.details.user_name == user_name)
    }
}

fn rows_for<T: Clone>(table: &Table<T>, user_id: UserId) -> Vec<T> {
    table
        .values()
        .filter(|owned| owned.user_id == user_id)
        .map(|owned| owned.row.clone())
        .collect()
}

fn owned_mut<'a, T>(table: &'a mut Table<T>, user_id: UserId, id: i64, what: &str) -> Result<&'a mut T> {
    match table.get_mut(&id) {
        Some(owned) if owned.user_id == user_id => Ok(&mut owned.row),
        _ => Err(TrackerError::not_found(format!("{} {}", what, id))),
    }
}

fn remove_owned<T>(table: &mut Table<T>, user_id: UserId, id: i64, what: &str) -> Result<()> {
    match table.get(&id) {
        Some(owned) if owned.user_id == user_id => {
            table.remove(&id);
            Ok(())
        }
        _ => Err(TrackerError::not_found(format!("{} {}", what, id))),
    }
}

fn apply_loan(target: &mut Loan, loan: &NewLoan) {
    target.loan_type = loan.loan_type.clone();
    target.principal_amount = loan.principal_amount;
    target.interest_rate = loan.interest_rate;
    target.term_months = loan.term_months;
    target.start_date = loan.start_date;
    target.end_date = loan.end_date;
    target.monthly_payment = loan.monthly_payment;
    target.outstanding_balance = loan.outstanding_balance;
    target.status = loan.status;
    target.updated_at = Utc::now();
}

fn apply_budget(target: &mut Budget, budget: &NewBudget) {
    target.budget_name = budget.budget_name.clone();
    target.total_amount = budget.total_amount;
    target.category = budget.category.clone();
    target.start_date = budget.start_date;
    target.end_date = budget.end_date;
    target.notes = budget.notes.clone();
}

fn apply_payment(target: &mut Payment, payment: &NewPayment) {
    target.payment_date = payment.payment_date;
    target.amount = payment.amount;
    target.category = payment.category.clone();
    target.payment_method = payment.payment_method.clone();
    target.is_recurring = payment.is_recurring;
    target.notes = payment.notes.clone();
}

/// In-memory store guarded by a single lock
pub struct InMemoryFinanceStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryFinanceStore {
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
        }
    }
}

impl Default for InMemoryFinanceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl FinanceStore for InMemoryFinanceStore {

    async fn create_user(&self, details: &ProfileDetails, email: &str, password_hash: &str) -> Result<UserId> {
        let mut tables = self.tables.write().await;

        if tables.user_name_taken(&details.user_name, None) {
            return Err(TrackerError::Conflict("Username already exists".to_string()));
        }
        if tables.email_taken(email, None) {
            return Err(TrackerError::Conflict("Email already registered".to_string()));
        }

        let user_id = tables.next_id();
        tables.users.insert(
            user_id,
            StoredUser {
                details: details.clone(),
                email: email.to_string(),
                password_hash: password_hash.to_string(),
            },
        );
        Ok(user_id)
    }

    async fn find_auth_by_email(&self, email: &str) -> Result<Option<AuthRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|(_, u)| u.email == email)
            .map(|(id, u)| AuthRecord {
                user_id: *id,
                user_name: u.details.user_name.clone(),
                email: u.email.clone(),
                password_hash: u.password_hash.clone(),
            }))
    }

    async fn record_login_attempt(&self, attempt: LoginAttempt) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.login_info.push(attempt);
        Ok(())
    }

    async fn login_attempts(&self, email: &str) -> Result<Vec<LoginAttempt>> {
        let tables = self.tables.read().await;
        Ok(tables
            .login_info
            .iter()
            .filter(|a| a.email == email)
            .cloned()
            .collect())
    }

    async fn get_profile(&self, user_id: UserId) -> Result<Option<UserProfile>> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&user_id).map(|u| u.profile(user_id)))
    }

    async fn update_profile(&self, user_id: UserId, update: &ProfileUpdate) -> Result<UserProfile> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&user_id) {
            return Err(TrackerError::not_found("User not found"));
        }
        if tables.user_name_taken(&update.details.user_name, Some(user_id)) {
            return Err(TrackerError::Conflict("Username already exists".to_string()));
        }
        if let Some(email) = update.email.as_deref() {
            if tables.email_taken(email, Some(user_id)) {
                return Err(TrackerError::Conflict("Email already registered".to_string()));
            }
        }

        let user = tables
            .users
            .get_mut(&user_id)
            .ok_or_else(|| TrackerError::not_found("User not found"))?;
        user.details = update.details.clone();
        if let Some(email) = update.email.as_deref() {
            user.email = email.to_string();
        }
        Ok(user.profile(user_id))
    }

    // =============================
    // Loans
    // =============================

    async fn list_loans(&self, user_id: UserId) -> Result<Vec<Loan>> {
        let tables = self.tables.read().await;
        Ok(rows_for(&tables.loans, user_id))
    }

    async fn active_loans(&self, user_id: UserId) -> Result<Vec<Loan>> {
        let tables = self.tables.read().await;
        Ok(rows_for(&tables.loans, user_id)
            .into_iter()
            .filter(|l| l.status == LoanStatus::Active)
            .collect())
    }

    async fn create_loan(&self, user_id: UserId, loan: &NewLoan) -> Result<Loan> {
        let mut tables = self.tables.write().await;
        let loan_id = tables.next_id();
        let now = Utc::now();

        let row = Loan {
            loan_id,
            loan_type: loan.loan_type.clone(),
            principal_amount: loan.principal_amount,
            interest_rate: loan.interest_rate,
            term_months: loan.term_months,
            start_date: loan.start_date,
            end_date: loan.end_date,
            monthly_payment: loan.monthly_payment,
            outstanding_balance: loan.outstanding_balance,
            status: loan.status,
            created_at: now,
            updated_at: now,
        };
        tables.loans.insert(loan_id, Owned { user_id, row: row.clone() });
        Ok(row)
    }

    async fn update_loan(&self, user_id: UserId, loan_id: LoanId, loan: &NewLoan) -> Result<Loan> {
        let mut tables = self.tables.write().await;
        let row = owned_mut(&mut tables.loans, user_id, loan_id, "Loan")?;
        apply_loan(row, loan);
        Ok(row.clone())
    }

    async fn delete_loan(&self, user_id: UserId, loan_id: LoanId) -> Result<()> {
        let mut tables = self.tables.write().await;
        remove_owned(&mut tables.loans, user_id, loan_id, "Loan")
    }

    // =============================
    // Budgets
    // =============================

    async fn list_budgets(&self, user_id: UserId) -> Result<Vec<Budget>> {
        let tables = self.tables.read().await;
        let mut budgets = rows_for(&tables.budgets, user_id);
        budgets.reverse();
        Ok(budgets)
    }

    async fn create_budget(&self, user_id: UserId, budget: &NewBudget) -> Result<Budget> {
        let mut tables = self.tables.write().await;
        let budget_id = tables.next_id();

        let row = Budget {
            budget_id,
            budget_name: budget.budget_name.clone(),
            total_amount: budget.total_amount,
            category: budget.category.clone(),
            start_date: budget.start_date,
            end_date: budget.end_date,
            notes: budget.notes.clone(),
            created_at: Utc::now(),
            updated_at: None,
        };
        tables.budgets.insert(budget_id, Owned { user_id, row: row.clone() });
        Ok(row)
    }

    async fn update_budget(&self, user_id: UserId, budget_id: BudgetId, budget: &NewBudget) -> Result<Budget> {
        let mut tables = self.tables.write().await;
        let row = owned_mut(&mut tables.budgets, user_id, budget_id, "Budget")?;
        apply_budget(row, budget);
        row.updated_at = Some(Utc::now());
        Ok(row.clone())
    }

    async fn delete_budget(&self, user_id: UserId, budget_id: BudgetId) -> Result<()> {
        let mut tables = self.tables.write().await;
        remove_owned(&mut tables.budgets, user_id, budget_id, "Budget")
    }

    // =============================
    // Payments
    // =============================

    async fn list_payments(&self, user_id: UserId) -> Result<Vec<Payment>> {
        let tables = self.tables.read().await;
        let mut payments = rows_for(&tables.payments, user_id);
        payments.sort_by(|a, b| {
            b.payment_date
                .cmp(&a.payment_date)
                .then(b.payment_id.cmp(&a.payment_id))
        });
        Ok(payments)
    }

    async fn create_payment(&self, user_id: UserId, payment: &NewPayment) -> Result<Payment> {
        let mut tables = self.tables.write().await;
        let payment_id = tables.next_id();

        let row = Payment {
            payment_id,
            payment_date: payment.payment_date,
            amount: payment.amount,
            category: payment.category.clone(),
            payment_method: payment.payment_method.clone(),
            is_recurring: payment.is_recurring,
            notes: payment.notes.clone(),
            created_at: Utc::now(),
        };
        tables.payments.insert(payment_id, Owned { user_id, row: row.clone() });
        Ok(row)
    }

    async fn update_payment(&self, user_id: UserId, payment_id: PaymentId, payment: &NewPayment) -> Result<Payment> {
        let mut tables = self.tables.write().await;
        let row = owned_mut(&mut tables.payments, user_id, payment_id, "Payment")?;
        apply_payment(row, payment);
        Ok(row.clone())
    }

    async fn delete_payment(&self, user_id: UserId, payment_id: PaymentId) -> Result<()> {
        let mut tables = self.tables.write().await;
        remove_owned(&mut tables.payments, user_id, payment_id, "Payment")
    }

    // =============================
    // Goals
    // =============================

    async fn list_goals(&self, user_id: UserId) -> Result<Vec<FinancialGoal>> {
        let tables = self.tables.read().await;
        let mut goals = rows_for(&tables.goals, user_id);
        goals.reverse();
        Ok(goals)
    }

    async fn create_goal(&self, user_id: UserId, goal: &NewGoal) -> Result<FinancialGoal> {
        let mut tables = self.tables.write().await;
        let goal_id = tables.next_id();

        let row = FinancialGoal {
            goal_id,
            goal_name: goal.goal_name.clone(),
            target_amount: goal.target_amount,
            current_amount: 0.0,
            target_date: goal.target_date,
            priority: goal.priority.clone(),
            status: DEFAULT_GOAL_STATUS.to_string(),
            created_at: Utc::now(),
            updated_at: None,
        };
        tables.goals.insert(goal_id, Owned { user_id, row: row.clone() });
        Ok(row)
    }

    async fn update_goal(&self, user_id: UserId, goal_id: GoalId, goal: &GoalUpdate) -> Result<FinancialGoal> {
        let mut tables = self.tables.write().await;
        let row = owned_mut(&mut tables.goals, user_id, goal_id, "Goal")?;
        row.goal_name = goal.goal_name.clone();
        row.target_amount = goal.target_amount;
        row.current_amount = goal.current_amount;
        row.target_date = goal.target_date;
        row.priority = goal.priority.clone();
        row.status = goal.status_or_default();
        row.updated_at = Some(Utc::now());
        Ok(row.clone())
    }

    async fn delete_goal(&self, user_id: UserId, goal_id: GoalId) -> Result<()> {
        let mut tables = self.tables.write().await;
        remove_owned(&mut tables.goals, user_id, goal_id, "Goal")
    }

    // =============================
    // Notes
    // =============================

    async fn list_notes(&self, user_id: UserId) -> Result<Vec<Note>> {
        let tables = self.tables.read().await;
        let mut notes = rows_for(&tables.notes, user_id);
        notes.reverse();
        Ok(notes)
    }

    async fn create_note(&self, user_id: UserId, note: &NewNote) -> Result<Note> {
        let mut tables = self.tables.write().await;
        let note_id = tables.next_id();

        let row = Note {
            note_id,
            content: note.content.clone(),
            created_at: Utc::now(),
            updated_at: None,
        };
        tables.notes.insert(note_id, Owned { user_id, row: row.clone() });
        Ok(row)
    }

    async fn delete_note(&self, user_id: UserId, note_id: NoteId) -> Result<()> {
        let mut tables = self.tables.write().await;
        remove_owned(&mut tables.notes, user_id, note_id, "Note")
    }
}
