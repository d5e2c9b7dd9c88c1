use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::api::PaymentApi;
use crate::funding::models::{PaymentStatus, StatusResult};

/// Answer to a status check request
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    Checked(StatusResult),
    /// Gate still closed; nothing was sent
    Skipped { retry_in: Duration },
}

#[derive(Debug, Default)]
struct Gate {
    last_call_at: Option<Instant>,
    check_count: u32,
}

/// Payment status lookup gated to one backend call per `min_interval`.
///
/// One instance belongs to one funding attempt and is shared by every signal
/// source of that attempt.
pub struct RateLimitedStatusChecker {
    api: Arc<dyn PaymentApi>,
    min_interval: Duration,
    gate: Mutex<Gate>,
}

impl RateLimitedStatusChecker {
    pub fn new(api: Arc<dyn PaymentApi>, min_interval: Duration) -> Self {
        Self {
            api,
            min_interval,
            gate: Mutex::new(Gate::default()),
        }
    }

    pub fn check_count(&self) -> u32 {
        self.gate.lock().check_count
    }

    pub fn last_call_at(&self) -> Option<Instant> {
        self.gate.lock().last_call_at
    }

    /// Ask the backend for the status of `reference`, unless the gate is closed.
    ///
    /// The gate is stamped before the request is awaited, so a second caller
    /// arriving while the first is in flight is skipped. Errors never escape:
    /// they come back as `StatusResult::Error`.
    pub async fn request_check(&self, reference: &str) -> CheckOutcome {
        let now = Instant::now();
        {
            let mut gate = self.gate.lock();
            if let Some(last) = gate.last_call_at {
                let elapsed = now.saturating_duration_since(last);
                if elapsed < self.min_interval {
                    let retry_in = self.min_interval - elapsed;
                    debug!(
                        reference,
                        retry_in_secs = retry_in.as_secs(),
                        "⏳ Status check skipped, cooling down"
                    );
                    return CheckOutcome::Skipped { retry_in };
                }
            }
            gate.last_call_at = Some(now);
            gate.check_count += 1;
        }

        CheckOutcome::Checked(self.fetch_status(reference).await)
    }

    async fn fetch_status(&self, reference: &str) -> StatusResult {
        let response = match self.api.check_payment_status(reference).await {
            Ok(response) => response,
            Err(e) => {
                warn!(reference, "⚠️ Status check failed, will retry: {}", e);
                return StatusResult::Error {
                    detail: e.to_string(),
                };
            }
        };

        if !response.ok {
            warn!(reference, "⚠️ Status check rejected, will retry: {}", response.message);
            return StatusResult::Error {
                detail: response.message,
            };
        }

        let Some(data) = response.data else {
            return StatusResult::Error {
                detail: "status response carried no data".to_string(),
            };
        };

        let status = PaymentStatus::from_backend(&data.transaction.status);
        debug!(reference, backend_status = %data.transaction.status, "🔎 Status check answered");

        match status {
            PaymentStatus::Completed => StatusResult::Completed {
                payload: serde_json::to_value(&data).unwrap_or_default(),
            },
            PaymentStatus::Failed => {
                let message = if response.message.trim().is_empty() {
                    "Payment failed".to_string()
                } else {
                    response.message
                };
                StatusResult::Failed {
                    message,
                    payload: serde_json::to_value(&data).unwrap_or_default(),
                }
            }
            PaymentStatus::Pending => StatusResult::Pending,
        }
    }
}
