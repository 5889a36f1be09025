//! Account signup, login and sessions

pub mod password;
pub mod session;

pub use password::{hash_password, hash_password_async, verify_password, verify_password_async};
pub use session::{Session, SessionStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::TrackerError;
use crate::models::{LoginAttempt, ProfileDetails, UserId};
use crate::store::FinanceStore;
use crate::validation::{require_non_blank, Validate};
use crate::Result;

/// E-mail addresses are matched case-insensitively.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn require_email(field: &str, value: &str) -> Result<()> {
    require_non_blank(field, value)?;
    let valid = value
        .trim()
        .split_once('@')
        .map_or(false, |(local, domain)| !local.is_empty() && !domain.is_empty());
    if !valid {
        return Err(TrackerError::invalid(format!("{} must be an e-mail address", field)));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    #[serde(flatten)]
    pub details: ProfileDetails,
    pub email: String,
    pub password: String,
}

impl Validate for SignupRequest {
    fn validate(&self) -> Result<()> {
        self.details.validate()?;
        require_email("email", &self.email)?;
        require_non_blank("password", &self.password)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<()> {
        require_non_blank("email", &self.email)?;
        require_non_blank("password", &self.password)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: Uuid,
    pub user_id: UserId,
    pub user_name: String,
    pub expires_at: DateTime<Utc>,
}

fn invalid_credentials() -> TrackerError {
    TrackerError::Unauthorized("Invalid credentials".to_string())
}

/// Create the user and its credentials, then log the signup as a successful login.
///
/// The account exists once `create_user` returns; a failure to write the login
/// record afterwards is logged and does not fail the signup.
pub async fn signup(store: &dyn FinanceStore, request: &SignupRequest) -> Result<UserId> {
    request.validate()?;

    let email = normalize_email(&request.email);
    let password_hash = hash_password_async(request.password.clone()).await?;
    let user_id = store
        .create_user(&request.details, &email, &password_hash)
        .await?;

    let attempt = LoginAttempt {
        user_id: Some(user_id),
        email,
        is_successful: true,
        attempted_at: Utc::now(),
    };
    if let Err(error) = store.record_login_attempt(attempt).await {
        warn!(user_id, error = %error, "Failed to record signup login");
    }

    info!(user_id, user_name = %request.details.user_name, "Signup successful");
    Ok(user_id)
}

/// Check credentials and open a session. Every attempt is recorded.
pub async fn login(
    store: &dyn FinanceStore,
    sessions: &SessionStore,
    request: &LoginRequest,
) -> Result<LoginResponse> {
    request.validate()?;

    let email = normalize_email(&request.email);
    let record = store.find_auth_by_email(&email).await?;

    // Unknown e-mails are checked against a dummy hash so both paths take as long.
    let password_ok = verify_password_async(
        request.password.clone(),
        record.as_ref().map(|auth| auth.password_hash.clone()),
    )
    .await?;
    let verified = record.as_ref().filter(|_| password_ok);

    store
        .record_login_attempt(LoginAttempt {
            user_id: record.as_ref().map(|auth| auth.user_id),
            email: email.clone(),
            is_successful: verified.is_some(),
            attempted_at: Utc::now(),
        })
        .await?;

    let Some(auth) = verified else {
        warn!(email = %email, "Login failed");
        return Err(invalid_credentials());
    };

    let session = sessions.create(auth.user_id, &auth.user_name, &auth.email).await;
    info!(user_id = auth.user_id, "Login successful");

    Ok(LoginResponse {
        token: session.token,
        user_id: auth.user_id,
        user_name: auth.user_name.clone(),
        expires_at: session.expires_at,
    })
}
