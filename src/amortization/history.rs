//! Recent calculation log
//!
//! Keeps the last few EMI computations of a session, most recent first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const HISTORY_CAPACITY: usize = 5;

/// One EMI computation as shown back to the user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalculationRecord {
    pub principal: f64,
    pub annual_rate: f64,
    pub term_months: i32,
    pub emi: f64,
    pub computed_at: DateTime<Utc>,
}

impl CalculationRecord {
    pub fn new(principal: f64, annual_rate: f64, term_months: i32, emi: f64) -> Self {
        Self {
            principal,
            annual_rate,
            term_months,
            emi,
            computed_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationHistory {
    /// Front is the most recent entry
    entries: VecDeque<CalculationRecord>,
    capacity: usize,
}

impl CalculationHistory {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a computation, evicting the oldest once over capacity.
    pub fn record(&mut self, record: CalculationRecord) {
        self.entries.push_front(record);
        self.entries.truncate(self.capacity);
    }

    /// Iterate most-recent-first
    pub fn entries(&self) -> impl Iterator<Item = &CalculationRecord> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<CalculationRecord> {
        self.entries.iter().cloned().collect()
    }

    /// Remove the entry at `index` (0 = most recent)
    pub fn remove(&mut self, index: usize) -> Option<CalculationRecord> {
        self.entries.remove(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for CalculationHistory {
    fn default() -> Self {
        Self::new()
    }
}
