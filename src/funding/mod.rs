// Wallet funding: deposit initialization and payment reconciliation
pub mod flow;
pub mod models;
pub mod reconciler;
pub mod signals;
pub mod state;
pub mod status_checker;

#[cfg(test)]
pub(crate) mod testing;

pub use flow::{AddFundsFlow, FundingSession};
pub use models::{Outcome, PaymentAttempt, PaymentStatus, ReconciliationEvent, ReconciliationReport};
pub use reconciler::{PaymentReconciler, ReconcilerConfig, ReconciliationHandle};
pub use status_checker::{CheckOutcome, RateLimitedStatusChecker};
