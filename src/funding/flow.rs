use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};
use validator::Validate;

use crate::api::models::{ChargeBreakdown, DepositRequest};
use crate::api::PaymentApi;
use crate::error::{AppError, AppResult, FundingError};
use crate::funding::models::PaymentAttempt;
use crate::funding::reconciler::{PaymentReconciler, ReconcilerConfig, ReconciliationHandle};

/// A started funding attempt: what to show the user plus the running reconciler
pub struct FundingSession {
    pub attempt: PaymentAttempt,
    pub charge: ChargeBreakdown,
    pub handle: ReconciliationHandle,
}

/// Wallet "Add Funds" orchestration
pub struct AddFundsFlow {
    api: Arc<dyn PaymentApi>,
    reconciler: PaymentReconciler,
    min_deposit: Decimal,
}

impl AddFundsFlow {
    pub fn new(api: Arc<dyn PaymentApi>, config: ReconcilerConfig, min_deposit: Decimal) -> Self {
        Self {
            reconciler: PaymentReconciler::new(api.clone(), config),
            api,
            min_deposit,
        }
    }

    fn check_minimum(&self, amount: Decimal) -> AppResult<()> {
        if amount < self.min_deposit {
            return Err(FundingError::AmountBelowMinimum {
                amount: amount.to_string(),
                minimum: self.min_deposit.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Fee breakdown for crediting `amount` to the wallet
    pub async fn quote(&self, amount: Decimal) -> AppResult<ChargeBreakdown> {
        self.check_minimum(amount)?;

        let response = self.api.calculate_charge(amount).await?;
        let (data, message) = response.into_result().map_err(|e| match e {
            AppError::Rejected { message } => FundingError::ChargeUnavailable(message).into(),
            other => other,
        })?;

        data.ok_or_else(|| {
            FundingError::ChargeUnavailable(if message.is_empty() {
                "no charge data returned".to_string()
            } else {
                message
            })
            .into()
        })
    }

    /// Quote, initialize the deposit and start reconciling it
    pub async fn begin(&self, email: &str, amount: Decimal) -> AppResult<FundingSession> {
        let charge = self.quote(amount).await?;

        let request = DepositRequest {
            email: email.trim().to_string(),
            amount: charge.total_to_pay,
            charge_info: Some(charge.clone()),
        };
        request.validate()?;

        let response = self.api.initialize_deposit(&request).await?;
        let (init, _) = response.into_result().map_err(|e| match e {
            AppError::Rejected { message } => {
                warn!("❌ Deposit initialization rejected: {}", message);
                FundingError::InitializationFailed(message).into()
            }
            other => other,
        })?;

        let init = init.ok_or(FundingError::MissingCheckoutUrl)?;
        if init.authorization_url.trim().is_empty() {
            return Err(FundingError::MissingCheckoutUrl.into());
        }

        let attempt = PaymentAttempt::new(init, charge.total_to_pay);
        info!(
            attempt_id = %attempt.id,
            reference = %attempt.reference,
            total_to_pay = %charge.total_to_pay,
            "✅ Deposit initialized, checkout ready"
        );

        let handle = self.reconciler.start(attempt.clone());
        Ok(FundingSession {
            attempt,
            charge,
            handle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::funding::models::Outcome;
    use crate::funding::testing::{Scripted, ScriptedApi};
    use rust_decimal_macros::dec;

    fn flow(api: &Arc<ScriptedApi>) -> AddFundsFlow {
        AddFundsFlow::new(api.clone(), ReconcilerConfig::default(), dec!(100))
    }

    #[tokio::test(start_paused = true)]
    async fn test_begin_starts_reconciliation() {
        let api = Arc::new(ScriptedApi::new(Scripted::Status("Completed")));
        let session = flow(&api).begin("ada@example.com", dec!(1000)).await.unwrap();

        assert_eq!(session.charge.total_to_pay, dec!(1015));
        assert_eq!(session.attempt.amount_requested, dec!(1015));
        assert_eq!(session.attempt.reference, "ref_1015");
        assert!(session.attempt.status.is_none());
        assert_eq!(session.handle.attempt_id(), session.attempt.id);

        let report = session.handle.finished().await.unwrap();
        assert_eq!(report.event.outcome, Outcome::Success);
    }

    #[tokio::test]
    async fn test_amount_below_minimum_rejected() {
        let api = Arc::new(ScriptedApi::new(Scripted::Status("Pending")));
        let result = flow(&api).begin("ada@example.com", dec!(50)).await;

        assert!(matches!(
            result,
            Err(AppError::Funding(FundingError::AmountBelowMinimum { .. }))
        ));
    }

    #[tokio::test]
    async fn test_invalid_email_rejected() {
        let api = Arc::new(ScriptedApi::new(Scripted::Status("Pending")));
        let result = flow(&api).begin("not-an-email", dec!(500)).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_rejected_initialization_keeps_backend_message() {
        let api = Arc::new(ScriptedApi::new(Scripted::Status("Pending")));
        api.fail_deposit(Scripted::Rejected("Wallet is suspended"));

        match flow(&api).begin("ada@example.com", dec!(500)).await {
            Err(AppError::Funding(FundingError::InitializationFailed(message))) => {
                assert_eq!(message, "Wallet is suspended")
            }
            Err(other) => panic!("unexpected error: {:?}", other),
            Ok(_) => panic!("expected initialization failure"),
        }
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let api = Arc::new(ScriptedApi::new(Scripted::Status("Pending")));
        api.fail_deposit(Scripted::TransportError);

        let result = flow(&api).begin("ada@example.com", dec!(500)).await;
        assert!(matches!(result, Err(AppError::ExternalError(_))));
    }
}
