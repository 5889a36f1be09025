//! Integration tests for the finance tracker HTTP API, run against the in-memory store.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use finance_tracker::api::{create_router, ApiState};
use finance_tracker::auth::SessionStore;
use finance_tracker::store::InMemoryFinanceStore;

fn create_test_app() -> axum::Router {
    let state = ApiState::new(
        Arc::new(InMemoryFinanceStore::new()),
        Arc::new(SessionStore::with_ttl_hours(24)),
    );
    create_router(state)
}

async fn send(
    app: &axum::Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap_or(json!({}));
    (status, json)
}

/// Sign up and log in, returning the bearer token.
async fn register(app: &axum::Router, user_name: &str, email: &str) -> String {
    let (status, _) = send(
        app,
        Method::POST,
        "/signup",
        None,
        Some(json!({
            "user_name": user_name,
            "full_name": "Test User",
            "email": email,
            "password": "correct horse"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = send(
        app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "email": email, "password": "correct horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    json["data"]["token"].as_str().unwrap().to_string()
}

fn loan_body(loan_type: &str, balance: f64, rate: f64) -> Value {
    json!({
        "loan_type": loan_type,
        "principal_amount": 20000.0,
        "interest_rate": rate,
        "term_months": 36,
        "start_date": "2024-01-01",
        "end_date": "2027-01-01",
        "monthly_payment": 650.0,
        "outstanding_balance": balance,
        "status": "Active"
    })
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();
    let (status, json) = send(&app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let app = create_test_app();

    let (status, json) = send(&app, Method::GET, "/api/loans", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["success"], false);

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/loans",
        Some("00000000-0000-4000-8000-000000000000"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = create_test_app();
    register(&app, "asha", "asha@example.com").await;

    let (status, json) = send(
        &app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "email": "asha@example.com", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Unauthorized: Invalid credentials");
}

#[tokio::test]
async fn test_duplicate_signup_conflicts() {
    let app = create_test_app();
    register(&app, "asha", "asha@example.com").await;

    let (status, json) = send(
        &app,
        Method::POST,
        "/signup",
        None,
        Some(json!({
            "user_name": "asha",
            "full_name": "Someone Else",
            "email": "other@example.com",
            "password": "pw"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_logout_invalidates_token() {
    let app = create_test_app();
    let token = register(&app, "asha", "asha@example.com").await;

    let (status, _) = send(&app, Method::POST, "/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, "/api/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_update_changes_login_email() {
    let app = create_test_app();
    let token = register(&app, "asha", "asha@example.com").await;

    let (status, json) = send(
        &app,
        Method::PUT,
        "/api/profile",
        Some(&token),
        Some(json!({
            "user_name": "asha",
            "full_name": "Asha Rao",
            "city": "Pune",
            "email": "Asha.Rao@Example.com"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["full_name"], "Asha Rao");
    assert_eq!(json["data"]["email"], "asha.rao@example.com");

    let (status, _) = send(
        &app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "email": "asha.rao@example.com", "password": "correct horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_loan_crud_and_debt_strategy() {
    let app = create_test_app();
    let token = register(&app, "asha", "asha@example.com").await;

    let (status, first) = send(
        &app,
        Method::POST,
        "/api/loans",
        Some(&token),
        Some(loan_body("Car", 5000.0, 10.0)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, second) = send(
        &app,
        Method::POST,
        "/api/loans",
        Some(&token),
        Some(loan_body("Card", 2000.0, 18.0)),
    )
    .await;

    let first_id = first["data"]["loan_id"].as_i64().unwrap();
    let second_id = second["data"]["loan_id"].as_i64().unwrap();

    let (status, json) = send(&app, Method::GET, "/api/debt-strategy", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["snowball"]["loan_ids"], json!([second_id, first_id]));
    assert_eq!(json["data"]["avalanche"]["loan_ids"], json!([second_id, first_id]));

    // Paying off the card drops it from both orderings
    let mut paid = loan_body("Card", 0.0, 18.0);
    paid["status"] = json!("Paid Off");
    let (status, json) = send(
        &app,
        Method::PUT,
        &format!("/api/loans/{}", second_id),
        Some(&token),
        Some(paid),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "Paid Off");

    let (_, json) = send(&app, Method::GET, "/api/debt-strategy", Some(&token), None).await;
    assert_eq!(json["data"]["snowball"]["loan_ids"], json!([first_id]));

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/loans/{}", first_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = send(&app, Method::GET, "/api/loans", Some(&token), None).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_loan_rejected() {
    let app = create_test_app();
    let token = register(&app, "asha", "asha@example.com").await;

    // Balance above principal
    let (status, json) = send(
        &app,
        Method::POST,
        "/api/loans",
        Some(&token),
        Some(loan_body("Car", 25000.0, 10.0)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/loans",
        Some(&token),
        Some(json!({ "loan_type": "Car" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_users_cannot_see_each_other() {
    let app = create_test_app();
    let asha = register(&app, "asha", "asha@example.com").await;
    let ravi = register(&app, "ravi", "ravi@example.com").await;

    let (_, created) = send(
        &app,
        Method::POST,
        "/api/notes",
        Some(&asha),
        Some(json!({ "content": "Pay rent" })),
    )
    .await;
    let note_id = created["data"]["note_id"].as_i64().unwrap();

    let (_, json) = send(&app, Method::GET, "/api/notes", Some(&ravi), None).await;
    assert!(json["data"].as_array().unwrap().is_empty());

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/notes/{}", note_id),
        Some(&ravi),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/notes/{}", note_id),
        Some(&asha),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_note_length_limit() {
    let app = create_test_app();
    let token = register(&app, "asha", "asha@example.com").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/notes",
        Some(&token),
        Some(json!({ "content": "x".repeat(501) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_goal_update_missing_is_reported() {
    let app = create_test_app();
    let token = register(&app, "asha", "asha@example.com").await;

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/goals",
        Some(&token),
        Some(json!({ "goal_name": "Emergency fund", "target_amount": 5000.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["status"], "In Progress");
    let goal_id = created["data"]["goal_id"].as_i64().unwrap();

    let update = json!({
        "goal_name": "Emergency fund",
        "target_amount": 5000.0,
        "current_amount": 1250.0
    });
    let (status, json) = send(
        &app,
        Method::PUT,
        &format!("/api/goals/{}", goal_id),
        Some(&token),
        Some(update.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["current_amount"], 1250.0);

    let (status, json) = send(
        &app,
        Method::PUT,
        "/api/goals/9999",
        Some(&token),
        Some(update),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_emi_calculator_and_history() {
    let app = create_test_app();
    let token = register(&app, "asha", "asha@example.com").await;

    let (status, json) = send(
        &app,
        Method::POST,
        "/api/calculator/emi",
        Some(&token),
        Some(json!({ "principal": 100000.0, "annual_rate": 12.0, "term_months": 12 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["emi_rounded"], 8884.88);
    assert_eq!(json["data"]["history"].as_array().unwrap().len(), 1);

    for principal in [1000.0, 2000.0, 3000.0, 4000.0, 5000.0] {
        send(
            &app,
            Method::POST,
            "/api/calculator/emi",
            Some(&token),
            Some(json!({ "principal": principal, "annual_rate": 0.0, "term_months": 10 })),
        )
        .await;
    }

    let (status, json) = send(&app, Method::GET, "/api/calculator/history", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let history = json["data"].as_array().unwrap();
    assert_eq!(history.len(), 5);
    assert_eq!(history[0]["principal"], 5000.0);
    assert_eq!(history[0]["emi"], 500.0);
    assert_eq!(history[4]["principal"], 1000.0);

    let (status, json) = send(
        &app,
        Method::DELETE,
        "/api/calculator/history/0",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"][0]["principal"], 4000.0);

    let (status, _) = send(
        &app,
        Method::DELETE,
        "/api/calculator/history/7",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_calculator_rejects_bad_terms() {
    let app = create_test_app();
    let token = register(&app, "asha", "asha@example.com").await;

    let (status, json) = send(
        &app,
        Method::POST,
        "/api/calculator/emi",
        Some(&token),
        Some(json!({ "principal": 1000.0, "annual_rate": 10.0, "term_months": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);

    let (status, json) = send(
        &app,
        Method::POST,
        "/api/calculator/max-loan",
        Some(&token),
        Some(json!({ "desired_emi": 500.0, "annual_rate": 0.0, "term_months": 12 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["max_loan"], 6000.0);

    // Rejected calculations leave the log untouched
    let (_, json) = send(&app, Method::GET, "/api/calculator/history", Some(&token), None).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_dashboard_summary() {
    let app = create_test_app();
    let token = register(&app, "asha", "asha@example.com").await;

    send(
        &app,
        Method::POST,
        "/api/loans",
        Some(&token),
        Some(loan_body("Car", 15000.0, 9.0)),
    )
    .await;
    for amount in [120.0, 80.0] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/payments",
            Some(&token),
            Some(json!({ "payment_date": "2024-05-01", "amount": amount, "category": "Food" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, json) = send(&app, Method::GET, "/api/dashboard", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["total_spend"], 200.0);
    assert_eq!(json["data"]["loan_count_by_type"]["Car"], 1);
    assert_eq!(json["data"]["loan_progress"][0]["percent"], 25.0);
}

#[tokio::test]
async fn test_budget_update_returns_record() {
    let app = create_test_app();
    let token = register(&app, "asha", "asha@example.com").await;

    let body = json!({
        "budget_name": "Groceries",
        "total_amount": 400.0,
        "start_date": "2024-06-01",
        "end_date": "2024-06-30"
    });
    let (status, created) = send(&app, Method::POST, "/api/budgets", Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    let budget_id = created["data"]["budget_id"].as_i64().unwrap();

    let (status, json) = send(
        &app,
        Method::PUT,
        &format!("/api/budgets/{}", budget_id),
        Some(&token),
        Some(json!({
            "budget_name": "Groceries",
            "total_amount": 450.0,
            "start_date": "2024-06-01",
            "end_date": "2024-06-30"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["total_amount"], 450.0);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/budgets",
        Some(&token),
        Some(json!({
            "budget_name": "Backwards",
            "total_amount": 10.0,
            "start_date": "2024-07-01",
            "end_date": "2024-06-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
