//! REST API Server for the finance tracker
//!
//! Every `/api` route requires a bearer session; signup and login are open.
//! Responses use the `{success, data, error, timestamp}` envelope.

use axum::{
    async_trait,
    extract::{FromRef, FromRequest, Path, Request, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info};

use crate::amortization::{CalculationRecord, EmiQuote, EmiRequest, MaxLoanRequest};
use crate::auth::{self, LoginRequest, Session, SessionStore, SignupRequest};
use crate::config::AppConfig;
use crate::dashboard;
use crate::error::TrackerError;
use crate::models::{
    BudgetId, GoalId, GoalUpdate, LoanId, NewBudget, NewGoal, NewLoan, NewNote, NewPayment,
    NoteId, PaymentId, ProfileUpdate,
};
use crate::store::{build_store, FinanceStore};
use crate::strategy::DebtPlan;
use crate::validation::Validate;
use crate::Result;

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

type ApiResult = Result<Json<ApiResponse>>;
type CreatedResult = Result<(StatusCode, Json<ApiResponse>)>;

fn ok<T: Serialize>(data: T) -> ApiResult {
    Ok(Json(ApiResponse::success(data)))
}

fn created<T: Serialize>(data: T) -> CreatedResult {
    Ok((StatusCode::CREATED, Json(ApiResponse::success(data))))
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<dyn FinanceStore>,
    pub sessions: Arc<SessionStore>,
}

impl ApiState {
    pub fn new(store: Arc<dyn FinanceStore>, sessions: Arc<SessionStore>) -> Self {
        Self { store, sessions }
    }
}

impl FromRef<ApiState> for Arc<SessionStore> {
    fn from_ref(state: &ApiState) -> Self {
        state.sessions.clone()
    }
}

/// =============================
/// JSON Body Extractor
/// =============================

/// `Json` whose rejections use the tracker's error envelope.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = TrackerError;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| ApiJson(value))
            .map_err(|rejection| TrackerError::invalid(rejection.body_text()))
    }
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Auth Endpoints
/// =============================

async fn signup(State(state): State<ApiState>, ApiJson(req): ApiJson<SignupRequest>) -> CreatedResult {
    let user_id = auth::signup(state.store.as_ref(), &req).await?;
    created(serde_json::json!({
        "message": "Signup successful",
        "user_id": user_id,
    }))
}

async fn login(State(state): State<ApiState>, ApiJson(req): ApiJson<LoginRequest>) -> ApiResult {
    let response = auth::login(state.store.as_ref(), &state.sessions, &req).await?;
    ok(response)
}

async fn logout(State(state): State<ApiState>, session: Session) -> ApiResult {
    state.sessions.remove(session.token).await;
    info!(user_id = session.user_id, "Logged out");
    ok(serde_json::json!({ "message": "Logged out" }))
}

/// =============================
/// Profile
/// =============================

async fn get_profile(State(state): State<ApiState>, session: Session) -> ApiResult {
    let profile = state
        .store
        .get_profile(session.user_id)
        .await?
        .ok_or_else(|| TrackerError::not_found("User not found"))?;
    ok(profile)
}

async fn update_profile(
    State(state): State<ApiState>,
    session: Session,
    ApiJson(mut update): ApiJson<ProfileUpdate>,
) -> ApiResult {
    update.details.validate()?;

    update.email = match update.email.as_deref() {
        Some(email) if !email.trim().is_empty() => {
            auth::require_email("email", email)?;
            Some(auth::normalize_email(email)).filter(|e| *e != session.email)
        }
        _ => None,
    };

    let profile = state.store.update_profile(session.user_id, &update).await?;
    state
        .sessions
        .refresh_identity(session.token, &profile.user_name, &profile.email)
        .await?;

    info!(user_id = session.user_id, "Profile updated");
    ok(profile)
}

/// =============================
/// Loans
/// =============================

async fn list_loans(State(state): State<ApiState>, session: Session) -> ApiResult {
    ok(state.store.list_loans(session.user_id).await?)
}

async fn create_loan(
    State(state): State<ApiState>,
    session: Session,
    ApiJson(loan): ApiJson<NewLoan>,
) -> CreatedResult {
    loan.validate()?;
    let loan = state.store.create_loan(session.user_id, &loan).await?;
    info!(user_id = session.user_id, loan_id = loan.loan_id, "Loan added");
    created(loan)
}

async fn update_loan(
    State(state): State<ApiState>,
    session: Session,
    Path(loan_id): Path<LoanId>,
    ApiJson(loan): ApiJson<NewLoan>,
) -> ApiResult {
    loan.validate()?;
    ok(state.store.update_loan(session.user_id, loan_id, &loan).await?)
}

async fn delete_loan(
    State(state): State<ApiState>,
    session: Session,
    Path(loan_id): Path<LoanId>,
) -> ApiResult {
    state.store.delete_loan(session.user_id, loan_id).await?;
    ok(serde_json::json!({ "deleted": loan_id }))
}

async fn debt_strategy(State(state): State<ApiState>, session: Session) -> ApiResult {
    let loans = state.store.active_loans(session.user_id).await?;
    let plan = DebtPlan::from_loans(loans);
    debug!(
        user_id = session.user_id,
        loans = plan.loans.len(),
        "Debt strategy computed"
    );
    ok(plan)
}

/// =============================
/// Budgets
/// =============================

async fn list_budgets(State(state): State<ApiState>, session: Session) -> ApiResult {
    ok(state.store.list_budgets(session.user_id).await?)
}

async fn create_budget(
    State(state): State<ApiState>,
    session: Session,
    ApiJson(budget): ApiJson<NewBudget>,
) -> CreatedResult {
    budget.validate()?;
    created(state.store.create_budget(session.user_id, &budget).await?)
}

async fn update_budget(
    State(state): State<ApiState>,
    session: Session,
    Path(budget_id): Path<BudgetId>,
    ApiJson(budget): ApiJson<NewBudget>,
) -> ApiResult {
    budget.validate()?;
    ok(state.store.update_budget(session.user_id, budget_id, &budget).await?)
}

async fn delete_budget(
    State(state): State<ApiState>,
    session: Session,
    Path(budget_id): Path<BudgetId>,
) -> ApiResult {
    state.store.delete_budget(session.user_id, budget_id).await?;
    ok(serde_json::json!({ "deleted": budget_id }))
}

/// =============================
/// Payments
/// =============================

async fn list_payments(State(state): State<ApiState>, session: Session) -> ApiResult {
    ok(state.store.list_payments(session.user_id).await?)
}

async fn create_payment(
    State(state): State<ApiState>,
    session: Session,
    ApiJson(payment): ApiJson<NewPayment>,
) -> CreatedResult {
    payment.validate()?;
    created(state.store.create_payment(session.user_id, &payment).await?)
}

async fn update_payment(
    State(state): State<ApiState>,
    session: Session,
    Path(payment_id): Path<PaymentId>,
    ApiJson(payment): ApiJson<NewPayment>,
) -> ApiResult {
    payment.validate()?;
    ok(state.store.update_payment(session.user_id, payment_id, &payment).await?)
}

async fn delete_payment(
    State(state): State<ApiState>,
    session: Session,
    Path(payment_id): Path<PaymentId>,
) -> ApiResult {
    state.store.delete_payment(session.user_id, payment_id).await?;
    ok(serde_json::json!({ "deleted": payment_id }))
}

/// =============================
/// Financial Goals
/// =============================

async fn list_goals(State(state): State<ApiState>, session: Session) -> ApiResult {
    ok(state.store.list_goals(session.user_id).await?)
}

async fn create_goal(
    State(state): State<ApiState>,
    session: Session,
    ApiJson(goal): ApiJson<NewGoal>,
) -> CreatedResult {
    goal.validate()?;
    created(state.store.create_goal(session.user_id, &goal).await?)
}

async fn update_goal(
    State(state): State<ApiState>,
    session: Session,
    Path(goal_id): Path<GoalId>,
    ApiJson(goal): ApiJson<GoalUpdate>,
) -> ApiResult {
    goal.validate()?;
    ok(state.store.update_goal(session.user_id, goal_id, &goal).await?)
}

async fn delete_goal(
    State(state): State<ApiState>,
    session: Session,
    Path(goal_id): Path<GoalId>,
) -> ApiResult {
    state.store.delete_goal(session.user_id, goal_id).await?;
    ok(serde_json::json!({ "deleted": goal_id }))
}

/// =============================
/// Notes
/// =============================

async fn list_notes(State(state): State<ApiState>, session: Session) -> ApiResult {
    ok(state.store.list_notes(session.user_id).await?)
}

async fn create_note(
    State(state): State<ApiState>,
    session: Session,
    ApiJson(note): ApiJson<NewNote>,
) -> CreatedResult {
    note.validate()?;
    created(state.store.create_note(session.user_id, &note).await?)
}

async fn delete_note(
    State(state): State<ApiState>,
    session: Session,
    Path(note_id): Path<NoteId>,
) -> Result<StatusCode> {
    state.store.delete_note(session.user_id, note_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// =============================
/// Calculator
/// =============================

#[derive(Debug, Serialize)]
struct EmiResponse {
    #[serde(flatten)]
    quote: EmiQuote,
    history: Vec<CalculationRecord>,
}

async fn calculate_emi(
    State(state): State<ApiState>,
    session: Session,
    ApiJson(req): ApiJson<EmiRequest>,
) -> ApiResult {
    let quote = req.quote()?;
    let record = CalculationRecord::new(req.principal, req.annual_rate, req.term_months, quote.emi);
    let history = state.sessions.record_calculation(session.token, record).await?;
    ok(EmiResponse { quote, history })
}

async fn calculate_max_loan(_session: Session, ApiJson(req): ApiJson<MaxLoanRequest>) -> ApiResult {
    ok(req.quote()?)
}

async fn calculation_history(session: Session) -> ApiResult {
    ok(session.history.to_vec())
}

async fn delete_calculation(
    State(state): State<ApiState>,
    session: Session,
    Path(index): Path<usize>,
) -> ApiResult {
    ok(state.sessions.remove_calculation(session.token, index).await?)
}

/// =============================
/// Dashboard
/// =============================

async fn get_dashboard(State(state): State<ApiState>, session: Session) -> ApiResult {
    let loans = state.store.list_loans(session.user_id).await?;
    let payments = state.store.list_payments(session.user_id).await?;
    let goals = state.store.list_goals(session.user_id).await?;

    let today = chrono::Utc::now().date_naive();
    ok(dashboard::summarize(&loans, &payments, &goals, today))
}

/// =============================
/// Router
/// =============================

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/api/profile", get(get_profile).put(update_profile))
        .route("/api/loans", get(list_loans).post(create_loan))
        .route("/api/loans/:id", put(update_loan).delete(delete_loan))
        .route("/api/budgets", get(list_budgets).post(create_budget))
        .route("/api/budgets/:id", put(update_budget).delete(delete_budget))
        .route("/api/payments", get(list_payments).post(create_payment))
        .route("/api/payments/:id", put(update_payment).delete(delete_payment))
        .route("/api/goals", get(list_goals).post(create_goal))
        .route("/api/goals/:id", put(update_goal).delete(delete_goal))
        .route("/api/notes", get(list_notes).post(create_note))
        .route("/api/notes/:id", delete(delete_note))
        .route("/api/debt-strategy", get(debt_strategy))
        .route("/api/calculator/emi", post(calculate_emi))
        .route("/api/calculator/max-loan", post(calculate_max_loan))
        .route("/api/calculator/history", get(calculation_history))
        .route("/api/calculator/history/:index", delete(delete_calculation))
        .route("/api/dashboard", get(get_dashboard))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);

pub async fn start_server(config: AppConfig) -> Result<()> {
    let state = ApiState::new(
        build_store(&config),
        Arc::new(SessionStore::with_ttl_hours(config.session_ttl_hours)),
    );

    let sessions = state.sessions.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let purged = sessions.purge_expired().await;
            if purged > 0 {
                debug!(purged, "Expired sessions removed");
            }
        }
    });

    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", config.port);
    info!("Local: http://127.0.0.1:{}", config.port);

    axum::serve(listener, router).await?;

    Ok(())
}
