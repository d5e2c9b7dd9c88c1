use crate::funding::models::{
    Outcome, PaymentStatus, ReconciliationEvent, Signal, StatusResult,
};

pub const SUCCESS_MESSAGE: &str = "Payment successful! Your wallet has been funded.";
pub const VERIFICATION_TIMEOUT_MESSAGE: &str =
    "Payment verification timed out. Please check your wallet balance before trying again.";
pub const SESSION_EXPIRED_MESSAGE: &str =
    "Payment session expired. If you completed the payment, please check your wallet balance.";
pub const CANCELLED_MESSAGE: &str =
    "Payment cancelled. If you already paid, please check your wallet balance.";

/// What the arbiter must do after a signal
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Outcome already final; signal dropped
    Ignore,
    /// Still pending; nothing to do
    Wait,
    /// Run one out-of-band check through the shared checker
    CheckNow,
    /// Outcome just became final
    Resolve(ReconciliationEvent),
}

/// Write-once reconciliation state for one attempt
#[derive(Debug, Clone)]
pub struct ReconciliationState {
    outcome: Outcome,
    last_status: Option<PaymentStatus>,
}

impl Default for ReconciliationState {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconciliationState {
    pub fn new() -> Self {
        Self {
            outcome: Outcome::Pending,
            last_status: None,
        }
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn last_status(&self) -> Option<PaymentStatus> {
        self.last_status
    }

    pub fn apply(&mut self, signal: &Signal) -> Decision {
        if self.outcome.is_terminal() {
            return Decision::Ignore;
        }

        match signal {
            Signal::Status { result, .. } => {
                if let Some(status) = result.observed_status() {
                    self.last_status = Some(status);
                }
                match result {
                    StatusResult::Completed { payload } => {
                        self.resolve(Outcome::Success, SUCCESS_MESSAGE, Some(payload.clone()))
                    }
                    StatusResult::Failed { message, payload } => {
                        self.resolve(Outcome::Failed, message, Some(payload.clone()))
                    }
                    StatusResult::Pending | StatusResult::Error { .. } => Decision::Wait,
                }
            }
            Signal::NavigatedAway { .. } => Decision::CheckNow,
            Signal::PollExhausted => {
                self.resolve(Outcome::TimedOut, VERIFICATION_TIMEOUT_MESSAGE, None)
            }
            Signal::HardTimeout => self.resolve(Outcome::TimedOut, SESSION_EXPIRED_MESSAGE, None),
            Signal::Cancel => self.resolve(Outcome::Cancelled, CANCELLED_MESSAGE, None),
        }
    }

    fn resolve(
        &mut self,
        outcome: Outcome,
        message: &str,
        payload: Option<serde_json::Value>,
    ) -> Decision {
        self.outcome = outcome;
        Decision::Resolve(ReconciliationEvent {
            outcome,
            message: message.to_string(),
            payload,
        })
    }
}
