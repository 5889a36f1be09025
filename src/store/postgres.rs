//! Postgres-backed finance store
//!
//! Uses runtime-checked queries so the crate builds without a live database.
//! The schema is created on first use.

use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::FinanceStore;
use crate::error::TrackerError;
use crate::models::{
    AuthRecord, Budget, BudgetId, FinancialGoal, GoalId, GoalUpdate, Loan, LoanId, LoanStatus,
    LoginAttempt, NewBudget, NewGoal, NewLoan, NewNote, NewPayment, Note, NoteId, Payment,
    PaymentId, ProfileDetails, ProfileUpdate, UserId, UserProfile, DEFAULT_GOAL_STATUS,
};
use crate::Result;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
      user_id BIGSERIAL PRIMARY KEY,
      user_name TEXT NOT NULL UNIQUE,
      full_name TEXT NOT NULL,
      phone_number TEXT,
      gender TEXT,
      date_of_birth DATE,
      address TEXT,
      city TEXT,
      state TEXT,
      zip_code TEXT,
      country TEXT,
      created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS auth (
      auth_id BIGSERIAL PRIMARY KEY,
      user_id BIGINT NOT NULL REFERENCES users (user_id) ON DELETE CASCADE,
      email TEXT NOT NULL UNIQUE,
      password_hash TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS login_info (
      login_id BIGSERIAL PRIMARY KEY,
      user_id BIGINT REFERENCES users (user_id) ON DELETE SET NULL,
      email TEXT NOT NULL,
      is_successful BOOLEAN NOT NULL,
      attempted_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS loans (
      loan_id BIGSERIAL PRIMARY KEY,
      user_id BIGINT NOT NULL REFERENCES users (user_id) ON DELETE CASCADE,
      loan_type TEXT NOT NULL,
      principal_amount DOUBLE PRECISION NOT NULL,
      interest_rate DOUBLE PRECISION NOT NULL,
      term_months INTEGER NOT NULL,
      start_date DATE NOT NULL,
      end_date DATE NOT NULL,
      monthly_payment DOUBLE PRECISION NOT NULL,
      outstanding_balance DOUBLE PRECISION NOT NULL,
      status TEXT NOT NULL,
      created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
      updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS budgets (
      budget_id BIGSERIAL PRIMARY KEY,
      user_id BIGINT NOT NULL REFERENCES users (user_id) ON DELETE CASCADE,
      budget_name TEXT NOT NULL,
      total_amount DOUBLE PRECISION NOT NULL,
      category TEXT,
      start_date DATE NOT NULL,
      end_date DATE NOT NULL,
      notes TEXT,
      created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
      updated_at TIMESTAMPTZ
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS payment_tracker (
      payment_id BIGSERIAL PRIMARY KEY,
      user_id BIGINT NOT NULL REFERENCES users (user_id) ON DELETE CASCADE,
      payment_date DATE NOT NULL,
      amount DOUBLE PRECISION NOT NULL,
      category TEXT NOT NULL,
      payment_method TEXT,
      is_recurring BOOLEAN NOT NULL DEFAULT FALSE,
      notes TEXT,
      created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS financial_goals (
      goal_id BIGSERIAL PRIMARY KEY,
      user_id BIGINT NOT NULL REFERENCES users (user_id) ON DELETE CASCADE,
      goal_name TEXT NOT NULL,
      target_amount DOUBLE PRECISION NOT NULL,
      current_amount DOUBLE PRECISION NOT NULL DEFAULT 0,
      target_date DATE,
      priority TEXT,
      status TEXT NOT NULL DEFAULT 'In Progress',
      created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
      updated_at TIMESTAMPTZ
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS todo_notes (
      note_id BIGSERIAL PRIMARY KEY,
      user_id BIGINT NOT NULL REFERENCES users (user_id) ON DELETE CASCADE,
      content VARCHAR(500) NOT NULL,
      created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
      updated_at TIMESTAMPTZ
    );
    "#,
    "CREATE INDEX IF NOT EXISTS idx_loans_user ON loans (user_id, loan_id);",
    "CREATE INDEX IF NOT EXISTS idx_payments_user_date ON payment_tracker (user_id, payment_date);",
];

const PROFILE_COLUMNS: &str = "u.user_id, u.user_name, u.full_name, u.phone_number, u.gender, \
     u.date_of_birth, u.address, u.city, u.state, u.zip_code, u.country, a.email";
const LOAN_COLUMNS: &str = "loan_id, loan_type, principal_amount, interest_rate, term_months, \
     start_date, end_date, monthly_payment, outstanding_balance, status, created_at, updated_at";
const BUDGET_COLUMNS: &str = "budget_id, budget_name, total_amount, category, start_date, end_date, \
     notes, created_at, updated_at";
const PAYMENT_COLUMNS: &str = "payment_id, payment_date, amount, category, payment_method, \
     is_recurring, notes, created_at";
const GOAL_COLUMNS: &str = "goal_id, goal_name, target_amount, current_amount, target_date, \
     priority, status, created_at, updated_at";
const NOTE_COLUMNS: &str = "note_id, content, created_at, updated_at";

/// Postgres SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> TrackerError {
    move |e| TrackerError::DatabaseError(format!("{}: {}", context, e))
}

/// Map unique-constraint failures on users/auth to a conflict.
fn conflict_or_db_error(context: &'static str) -> impl Fn(sqlx::Error) -> TrackerError {
    move |e| {
        if let Some(db) = e.as_database_error() {
            if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
                let on_email = db.constraint().map_or(false, |c| c.contains("email"));
                return TrackerError::Conflict(if on_email {
                    "Email already registered".to_string()
                } else {
                    "Username already exists".to_string()
                });
            }
        }
        TrackerError::DatabaseError(format!("{}: {}", context, e))
    }
}

fn missing(what: &str, id: i64) -> TrackerError {
    TrackerError::not_found(format!("{} {}", what, id))
}

//
// ================= Row Mapping =================
//

fn profile_from_row(row: &PgRow) -> Result<UserProfile> {
    Ok(UserProfile {
        user_id: row.try_get("user_id")?,
        user_name: row.try_get("user_name")?,
        full_name: row.try_get("full_name")?,
        phone_number: row.try_get("phone_number")?,
        gender: row.try_get("gender")?,
        date_of_birth: row.try_get("date_of_birth")?,
        address: row.try_get("address")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        zip_code: row.try_get("zip_code")?,
        country: row.try_get("country")?,
        email: row.try_get("email")?,
    })
}

fn loan_from_row(row: &PgRow) -> Result<Loan> {
    let status: String = row.try_get("status")?;
    Ok(Loan {
        loan_id: row.try_get("loan_id")?,
        loan_type: row.try_get("loan_type")?,
        principal_amount: row.try_get("principal_amount")?,
        interest_rate: row.try_get("interest_rate")?,
        term_months: row.try_get("term_months")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        monthly_payment: row.try_get("monthly_payment")?,
        outstanding_balance: row.try_get("outstanding_balance")?,
        status: status.parse()?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn budget_from_row(row: &PgRow) -> Result<Budget> {
    Ok(Budget {
        budget_id: row.try_get("budget_id")?,
        budget_name: row.try_get("budget_name")?,
        total_amount: row.try_get("total_amount")?,
        category: row.try_get("category")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        notes: row.try_get("notes")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn payment_from_row(row: &PgRow) -> Result<Payment> {
    Ok(Payment {
        payment_id: row.try_get("payment_id")?,
        payment_date: row.try_get("payment_date")?,
        amount: row.try_get("amount")?,
        category: row.try_get("category")?,
        payment_method: row.try_get("payment_method")?,
        is_recurring: row.try_get("is_recurring")?,
        notes: row.try_get("notes")?,
        created_at: row.try_get("created_at")?,
    })
}

fn goal_from_row(row: &PgRow) -> Result<FinancialGoal> {
    Ok(FinancialGoal {
        goal_id: row.try_get("goal_id")?,
        goal_name: row.try_get("goal_name")?,
        target_amount: row.try_get("target_amount")?,
        current_amount: row.try_get("current_amount")?,
        target_date: row.try_get("target_date")?,
        priority: row.try_get("priority")?,
        status: row.try_get("status")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn note_from_row(row: &PgRow) -> Result<Note> {
    Ok(Note {
        note_id: row.try_get("note_id")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn map_rows<T>(rows: Vec<PgRow>, f: fn(&PgRow) -> Result<T>) -> Result<Vec<T>> {
    rows.iter().map(f).collect()
}

pub struct PostgresFinanceStore {
    pool: PgPool,
    schema_ready: Arc<OnceCell<()>>,
}

impl PostgresFinanceStore {
    /// Build a pool without connecting; the first query opens the connection.
    pub fn connect_lazy(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_lazy(url)?;
        Ok(Self::with_pool(pool))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self {
            pool,
            schema_ready: Arc::new(OnceCell::new()),
        }
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.schema_ready
            .get_or_try_init(|| async {
                for statement in SCHEMA {
                    sqlx::query(statement).execute(&self.pool).await?;
                }
                info!("Finance schema ready");
                Ok::<(), sqlx::Error>(())
            })
            .await
            .map_err(db_error("Failed to initialize finance schema"))?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl FinanceStore for PostgresFinanceStore {

    async fn create_user(&self, details: &ProfileDetails, email: &str, password_hash: &str) -> Result<UserId> {
        self.ensure_schema().await?;

        let mut tx = self.pool.begin().await.map_err(db_error("Failed to begin signup"))?;

        let user_id: UserId = sqlx::query(
            r#"
            INSERT INTO users (user_name, full_name, phone_number, gender, date_of_birth,
                               address, city, state, zip_code, country)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING user_id
            "#,
        )
        .bind(&details.user_name)
        .bind(&details.full_name)
        .bind(&details.phone_number)
        .bind(&details.gender)
        .bind(details.date_of_birth)
        .bind(&details.address)
        .bind(&details.city)
        .bind(&details.state)
        .bind(&details.zip_code)
        .bind(&details.country)
        .fetch_one(&mut *tx)
        .await
        .map_err(conflict_or_db_error("Failed to insert user"))?
        .try_get("user_id")?;

        sqlx::query("INSERT INTO auth (user_id, email, password_hash) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(email)
            .bind(password_hash)
            .execute(&mut *tx)
            .await
            .map_err(conflict_or_db_error("Failed to insert credentials"))?;

        tx.commit().await.map_err(db_error("Failed to commit signup"))?;

        debug!(user_id, "User created");
        Ok(user_id)
    }

    async fn find_auth_by_email(&self, email: &str) -> Result<Option<AuthRecord>> {
        self.ensure_schema().await?;

        let row = sqlx::query(
            r#"
            SELECT a.user_id, a.email, a.password_hash, u.user_name
            FROM auth a
            JOIN users u ON a.user_id = u.user_id
            WHERE a.email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to look up credentials"))?;

        row.map(|row| {
            Ok(AuthRecord {
                user_id: row.try_get("user_id")?,
                user_name: row.try_get("user_name")?,
                email: row.try_get("email")?,
                password_hash: row.try_get("password_hash")?,
            })
        })
        .transpose()
    }

    async fn record_login_attempt(&self, attempt: LoginAttempt) -> Result<()> {
        self.ensure_schema().await?;

        sqlx::query(
            "INSERT INTO login_info (user_id, email, is_successful, attempted_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(attempt.user_id)
        .bind(&attempt.email)
        .bind(attempt.is_successful)
        .bind(attempt.attempted_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to record login attempt"))?;

        Ok(())
    }

    async fn login_attempts(&self, email: &str) -> Result<Vec<LoginAttempt>> {
        self.ensure_schema().await?;

        let rows = sqlx::query(
            "SELECT user_id, email, is_successful, attempted_at FROM login_info WHERE email = $1 ORDER BY login_id ASC",
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to load login attempts"))?;

        rows.iter()
            .map(|row| {
                Ok(LoginAttempt {
                    user_id: row.try_get("user_id")?,
                    email: row.try_get("email")?,
                    is_successful: row.try_get("is_successful")?,
                    attempted_at: row.try_get("attempted_at")?,
                })
            })
            .collect()
    }

    async fn get_profile(&self, user_id: UserId) -> Result<Option<UserProfile>> {
        self.ensure_schema().await?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM users u JOIN auth a ON u.user_id = a.user_id WHERE u.user_id = $1",
            PROFILE_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to load profile"))?;

        row.as_ref().map(profile_from_row).transpose()
    }

    async fn update_profile(&self, user_id: UserId, update: &ProfileUpdate) -> Result<UserProfile> {
        self.ensure_schema().await?;

        let details = &update.details;
        let mut tx = self.pool.begin().await.map_err(db_error("Failed to begin profile update"))?;

        let updated = sqlx::query(
            r#"
            UPDATE users
            SET user_name = $2, full_name = $3, phone_number = $4, gender = $5,
                date_of_birth = $6, address = $7, city = $8, state = $9,
                zip_code = $10, country = $11
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(&details.user_name)
        .bind(&details.full_name)
        .bind(&details.phone_number)
        .bind(&details.gender)
        .bind(details.date_of_birth)
        .bind(&details.address)
        .bind(&details.city)
        .bind(&details.state)
        .bind(&details.zip_code)
        .bind(&details.country)
        .execute(&mut *tx)
        .await
        .map_err(conflict_or_db_error("Failed to update profile"))?;

        if updated.rows_affected() == 0 {
            return Err(TrackerError::not_found("User not found"));
        }

        if let Some(email) = update.email.as_deref() {
            sqlx::query("UPDATE auth SET email = $2 WHERE user_id = $1")
                .bind(user_id)
                .bind(email)
                .execute(&mut *tx)
                .await
                .map_err(conflict_or_db_error("Failed to update email"))?;
        }

        tx.commit().await.map_err(db_error("Failed to commit profile update"))?;

        self.get_profile(user_id)
            .await?
            .ok_or_else(|| TrackerError::not_found("User not found"))
    }

    // =============================
    // Loans
    // =============================

    async fn list_loans(&self, user_id: UserId) -> Result<Vec<Loan>> {
        self.ensure_schema().await?;

        let rows = sqlx::query(&format!(
            "SELECT {} FROM loans WHERE user_id = $1 ORDER BY loan_id ASC",
            LOAN_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to fetch loans"))?;

        map_rows(rows, loan_from_row)
    }

    async fn active_loans(&self, user_id: UserId) -> Result<Vec<Loan>> {
        self.ensure_schema().await?;

        let rows = sqlx::query(&format!(
            "SELECT {} FROM loans WHERE user_id = $1 AND status = $2 ORDER BY loan_id ASC",
            LOAN_COLUMNS
        ))
        .bind(user_id)
        .bind(LoanStatus::Active.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to fetch active loans"))?;

        map_rows(rows, loan_from_row)
    }

    async fn create_loan(&self, user_id: UserId, loan: &NewLoan) -> Result<Loan> {
        self.ensure_schema().await?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO loans (user_id, loan_type, principal_amount, interest_rate, term_months,
                               start_date, end_date, monthly_payment, outstanding_balance, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            LOAN_COLUMNS
        ))
        .bind(user_id)
        .bind(&loan.loan_type)
        .bind(loan.principal_amount)
        .bind(loan.interest_rate)
        .bind(loan.term_months)
        .bind(loan.start_date)
        .bind(loan.end_date)
        .bind(loan.monthly_payment)
        .bind(loan.outstanding_balance)
        .bind(loan.status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to add loan"))?;

        loan_from_row(&row)
    }

    async fn update_loan(&self, user_id: UserId, loan_id: LoanId, loan: &NewLoan) -> Result<Loan> {
        self.ensure_schema().await?;

        let row = sqlx::query(&format!(
            r#"
            UPDATE loans
            SET loan_type = $3, principal_amount = $4, interest_rate = $5, term_months = $6,
                start_date = $7, end_date = $8, monthly_payment = $9,
                outstanding_balance = $10, status = $11, updated_at = NOW()
            WHERE loan_id = $1 AND user_id = $2
            RETURNING {}
            "#,
            LOAN_COLUMNS
        ))
        .bind(loan_id)
        .bind(user_id)
        .bind(&loan.loan_type)
        .bind(loan.principal_amount)
        .bind(loan.interest_rate)
        .bind(loan.term_months)
        .bind(loan.start_date)
        .bind(loan.end_date)
        .bind(loan.monthly_payment)
        .bind(loan.outstanding_balance)
        .bind(loan.status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to update loan"))?;

        row.as_ref()
            .map(loan_from_row)
            .transpose()?
            .ok_or_else(|| missing("Loan", loan_id))
    }

    async fn delete_loan(&self, user_id: UserId, loan_id: LoanId) -> Result<()> {
        self.ensure_schema().await?;

        let result = sqlx::query("DELETE FROM loans WHERE loan_id = $1 AND user_id = $2")
            .bind(loan_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to delete loan"))?;

        if result.rows_affected() == 0 {
            return Err(missing("Loan", loan_id));
        }
        Ok(())
    }

    // =============================
    // Budgets
    // =============================

    async fn list_budgets(&self, user_id: UserId) -> Result<Vec<Budget>> {
        self.ensure_schema().await?;

        let rows = sqlx::query(&format!(
            "SELECT {} FROM budgets WHERE user_id = $1 ORDER BY created_at DESC, budget_id DESC",
            BUDGET_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to fetch budgets"))?;

        map_rows(rows, budget_from_row)
    }

    async fn create_budget(&self, user_id: UserId, budget: &NewBudget) -> Result<Budget> {
        self.ensure_schema().await?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO budgets (user_id, budget_name, total_amount, category, start_date, end_date, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            BUDGET_COLUMNS
        ))
        .bind(user_id)
        .bind(&budget.budget_name)
        .bind(budget.total_amount)
        .bind(&budget.category)
        .bind(budget.start_date)
        .bind(budget.end_date)
        .bind(&budget.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to add budget"))?;

        budget_from_row(&row)
    }

    async fn update_budget(&self, user_id: UserId, budget_id: BudgetId, budget: &NewBudget) -> Result<Budget> {
        self.ensure_schema().await?;

        let row = sqlx::query(&format!(
            r#"
            UPDATE budgets
            SET budget_name = $3, total_amount = $4, category = $5, start_date = $6,
                end_date = $7, notes = $8, updated_at = NOW()
            WHERE budget_id = $1 AND user_id = $2
            RETURNING {}
            "#,
            BUDGET_COLUMNS
        ))
        .bind(budget_id)
        .bind(user_id)
        .bind(&budget.budget_name)
        .bind(budget.total_amount)
        .bind(&budget.category)
        .bind(budget.start_date)
        .bind(budget.end_date)
        .bind(&budget.notes)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to update budget"))?;

        row.as_ref()
            .map(budget_from_row)
            .transpose()?
            .ok_or_else(|| missing("Budget", budget_id))
    }

    async fn delete_budget(&self, user_id: UserId, budget_id: BudgetId) -> Result<()> {
        self.ensure_schema().await?;

        let result = sqlx::query("DELETE FROM budgets WHERE budget_id = $1 AND user_id = $2")
            .bind(budget_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to delete budget"))?;

        if result.rows_affected() == 0 {
            return Err(missing("Budget", budget_id));
        }
        Ok(())
    }

    // =============================
    // Payments
    // =============================

    async fn list_payments(&self, user_id: UserId) -> Result<Vec<Payment>> {
        self.ensure_schema().await?;

        let rows = sqlx::query(&format!(
            "SELECT {} FROM payment_tracker WHERE user_id = $1 ORDER BY payment_date DESC, payment_id DESC",
            PAYMENT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to fetch payments"))?;

        map_rows(rows, payment_from_row)
    }

    async fn create_payment(&self, user_id: UserId, payment: &NewPayment) -> Result<Payment> {
        self.ensure_schema().await?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO payment_tracker (user_id, payment_date, amount, category, payment_method, is_recurring, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(user_id)
        .bind(payment.payment_date)
        .bind(payment.amount)
        .bind(&payment.category)
        .bind(&payment.payment_method)
        .bind(payment.is_recurring)
        .bind(&payment.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to create payment"))?;

        payment_from_row(&row)
    }

    async fn update_payment(&self, user_id: UserId, payment_id: PaymentId, payment: &NewPayment) -> Result<Payment> {
        self.ensure_schema().await?;

        let row = sqlx::query(&format!(
            r#"
            UPDATE payment_tracker
            SET payment_date = $3, amount = $4, category = $5, payment_method = $6,
                is_recurring = $7, notes = $8
            WHERE payment_id = $1 AND user_id = $2
            RETURNING {}
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(payment_id)
        .bind(user_id)
        .bind(payment.payment_date)
        .bind(payment.amount)
        .bind(&payment.category)
        .bind(&payment.payment_method)
        .bind(payment.is_recurring)
        .bind(&payment.notes)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to update payment"))?;

        row.as_ref()
            .map(payment_from_row)
            .transpose()?
            .ok_or_else(|| missing("Payment", payment_id))
    }

    async fn delete_payment(&self, user_id: UserId, payment_id: PaymentId) -> Result<()> {
        self.ensure_schema().await?;

        let result = sqlx::query("DELETE FROM payment_tracker WHERE payment_id = $1 AND user_id = $2")
            .bind(payment_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to delete payment"))?;

        if result.rows_affected() == 0 {
            return Err(missing("Payment", payment_id));
        }
        Ok(())
    }

    // =============================
    // Goals
    // =============================

    async fn list_goals(&self, user_id: UserId) -> Result<Vec<FinancialGoal>> {
        self.ensure_schema().await?;

        let rows = sqlx::query(&format!(
            "SELECT {} FROM financial_goals WHERE user_id = $1 ORDER BY created_at DESC, goal_id DESC",
            GOAL_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to fetch goals"))?;

        map_rows(rows, goal_from_row)
    }

    async fn create_goal(&self, user_id: UserId, goal: &NewGoal) -> Result<FinancialGoal> {
        self.ensure_schema().await?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO financial_goals (user_id, goal_name, target_amount, target_date, priority, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            GOAL_COLUMNS
        ))
        .bind(user_id)
        .bind(&goal.goal_name)
        .bind(goal.target_amount)
        .bind(goal.target_date)
        .bind(&goal.priority)
        .bind(DEFAULT_GOAL_STATUS)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Could not create goal"))?;

        goal_from_row(&row)
    }

    async fn update_goal(&self, user_id: UserId, goal_id: GoalId, goal: &GoalUpdate) -> Result<FinancialGoal> {
        self.ensure_schema().await?;

        let row = sqlx::query(&format!(
            r#"
            UPDATE financial_goals
            SET goal_name = $3, target_amount = $4, current_amount = $5, target_date = $6,
                priority = $7, status = $8, updated_at = NOW()
            WHERE goal_id = $1 AND user_id = $2
            RETURNING {}
            "#,
            GOAL_COLUMNS
        ))
        .bind(goal_id)
        .bind(user_id)
        .bind(&goal.goal_name)
        .bind(goal.target_amount)
        .bind(goal.current_amount)
        .bind(goal.target_date)
        .bind(&goal.priority)
        .bind(goal.status_or_default())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Could not update goal"))?;

        row.as_ref()
            .map(goal_from_row)
            .transpose()?
            .ok_or_else(|| missing("Goal", goal_id))
    }

    async fn delete_goal(&self, user_id: UserId, goal_id: GoalId) -> Result<()> {
        self.ensure_schema().await?;

        let result = sqlx::query("DELETE FROM financial_goals WHERE goal_id = $1 AND user_id = $2")
            .bind(goal_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Could not delete goal"))?;

        if result.rows_affected() == 0 {
            return Err(missing("Goal", goal_id));
        }
        Ok(())
    }

    // =============================
    // Notes
    // =============================

    async fn list_notes(&self, user_id: UserId) -> Result<Vec<Note>> {
        self.ensure_schema().await?;

        let rows = sqlx::query(&format!(
            "SELECT {} FROM todo_notes WHERE user_id = $1 ORDER BY created_at DESC, note_id DESC",
            NOTE_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Error fetching notes"))?;

        map_rows(rows, note_from_row)
    }

    async fn create_note(&self, user_id: UserId, note: &NewNote) -> Result<Note> {
        self.ensure_schema().await?;

        let row = sqlx::query(&format!(
            "INSERT INTO todo_notes (user_id, content) VALUES ($1, $2) RETURNING {}",
            NOTE_COLUMNS
        ))
        .bind(user_id)
        .bind(&note.content)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Error adding note"))?;

        note_from_row(&row)
    }

    async fn delete_note(&self, user_id: UserId, note_id: NoteId) -> Result<()> {
        self.ensure_schema().await?;

        let result = sqlx::query("DELETE FROM todo_notes WHERE note_id = $1 AND user_id = $2")
            .bind(note_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Error deleting note"))?;

        if result.rows_affected() == 0 {
            return Err(missing("Note", note_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lazy_pool_does_not_connect() {
        // No server is listening here; a lazy pool must still build.
        let store = PostgresFinanceStore::connect_lazy("postgres://finance@127.0.0.1:1/finance", 1);
        assert!(store.is_ok());
    }

    #[test]
    fn test_rejects_malformed_url() {
        assert!(PostgresFinanceStore::connect_lazy("not a url", 1).is_err());
    }
}
