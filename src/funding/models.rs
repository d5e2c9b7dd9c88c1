use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::api::models::DepositInit;

/// Backend-observed status of a deposit
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn from_backend(status: &str) -> Self {
        if status.eq_ignore_ascii_case("completed") {
            PaymentStatus::Completed
        } else if status.eq_ignore_ascii_case("failed") {
            PaymentStatus::Failed
        } else {
            PaymentStatus::Pending
        }
    }
}

/// One wallet funding attempt, from deposit initialization to a known outcome
#[derive(Debug, Clone, Serialize)]
pub struct PaymentAttempt {
    pub id: Uuid,
    pub reference: String,
    pub amount_requested: Decimal,
    pub authorization_url: String,
    pub access_code: String,
    /// Last status seen from the backend; `None` until a check succeeds
    pub status: Option<PaymentStatus>,
    pub created_at: DateTime<Utc>,
}

impl PaymentAttempt {
    pub fn new(init: DepositInit, amount_requested: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            reference: init.reference,
            amount_requested,
            authorization_url: init.authorization_url,
            access_code: init.access_code,
            status: None,
            created_at: Utc::now(),
        }
    }
}

/// Result of one status check that actually reached the backend
#[derive(Debug, Clone, PartialEq)]
pub enum StatusResult {
    Completed { payload: Value },
    Failed { message: String, payload: Value },
    Pending,
    /// Transport or decode trouble; treated like `Pending`
    Error { detail: String },
}

impl StatusResult {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StatusResult::Completed { .. } | StatusResult::Failed { .. })
    }

    pub fn observed_status(&self) -> Option<PaymentStatus> {
        match self {
            StatusResult::Completed { .. } => Some(PaymentStatus::Completed),
            StatusResult::Failed { .. } => Some(PaymentStatus::Failed),
            StatusResult::Pending => Some(PaymentStatus::Pending),
            StatusResult::Error { .. } => None,
        }
    }
}

/// Where a status result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckSource {
    Poller,
    Navigation,
}

/// Events fed to the reconciler arbiter
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Status { result: StatusResult, source: CheckSource },
    NavigatedAway { url: String },
    PollExhausted,
    HardTimeout,
    Cancel,
}

impl Signal {
    pub fn kind(&self) -> &'static str {
        match self {
            Signal::Status { .. } => "status",
            Signal::NavigatedAway { .. } => "navigated_away",
            Signal::PollExhausted => "poll_exhausted",
            Signal::HardTimeout => "hard_timeout",
            Signal::Cancel => "cancel",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Outcome {
    Pending,
    Success,
    Failed,
    TimedOut,
    Cancelled,
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::Pending)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Outcome::Pending => "pending",
            Outcome::Success => "success",
            Outcome::Failed => "failed",
            Outcome::TimedOut => "timed_out",
            Outcome::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// State transition published to subscribers
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationEvent {
    pub outcome: Outcome,
    pub message: String,
    pub payload: Option<Value>,
}

impl ReconciliationEvent {
    pub fn pending() -> Self {
        Self {
            outcome: Outcome::Pending,
            message: "Verifying payment...".to_string(),
            payload: None,
        }
    }
}

/// Final account of one attempt, returned once the arbiter stops
#[derive(Debug, Clone)]
pub struct ReconciliationReport {
    pub attempt: PaymentAttempt,
    pub event: ReconciliationEvent,
    pub check_count: u32,
    /// Tasks still tracked after teardown; always zero
    pub active_timers: usize,
}
