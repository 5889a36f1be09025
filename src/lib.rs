//! Personal Finance Tracker
//!
//! A small HTTP service that keeps a user's loans, budgets, payments,
//! goals and notes, and offers:
//! - an EMI calculator with its inverse (maximum affordable loan)
//! - snowball / avalanche debt repayment orderings
//! - a dashboard summary over the user's records
//!
//! Storage is Postgres when configured, in-memory otherwise.

pub mod amortization;
pub mod api;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod models;
pub mod store;
pub mod strategy;
pub mod validation;

pub use error::{Result, TrackerError};

// Re-export common types
pub use models::*;
pub use strategy::{rank_by_avalanche, rank_by_snowball, DebtStrategy};
pub use amortization::{compute_emi, compute_max_loan};
