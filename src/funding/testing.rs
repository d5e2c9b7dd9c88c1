// In-memory PaymentApi double for reconciliation tests

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde_json::{json, Map};
use tokio::time::Instant;

use crate::api::models::*;
use crate::api::{ApiResponse, PaymentApi};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy)]
pub enum Scripted {
    /// Ok envelope whose transaction has this status
    Status(&'static str),
    /// Ok envelope with a "Failed" transaction and this message
    FailedWithMessage(&'static str),
    /// Non-ok envelope with this message
    Rejected(&'static str),
    TransportError,
}

pub struct ScriptedApi {
    script: Mutex<VecDeque<Scripted>>,
    fallback: Scripted,
    latency: Duration,
    calls: Mutex<Vec<Instant>>,
    deposit: Mutex<Option<Scripted>>,
}

impl ScriptedApi {
    pub fn new(fallback: Scripted) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback,
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            deposit: Mutex::new(None),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queue the answer for the next status check
    pub fn push(&self, answer: Scripted) {
        self.script.lock().push_back(answer);
    }

    /// Make `initialize_deposit` answer with a rejection or transport error
    pub fn fail_deposit(&self, answer: Scripted) {
        *self.deposit.lock() = Some(answer);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().clone()
    }

    fn status_envelope(status: &str, message: &str) -> ApiResponse<PaymentStatusData> {
        let mut details = Map::new();
        details.insert("reference".to_string(), json!("ref_test"));
        ApiResponse {
            ok: true,
            data: Some(PaymentStatusData {
                transaction: TransactionRecord {
                    status: status.to_string(),
                    details,
                },
            }),
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl PaymentApi for ScriptedApi {
    async fn initialize_deposit(&self, request: &DepositRequest) -> AppResult<ApiResponse<DepositInit>> {
        let failure = *self.deposit.lock();
        match failure {
            Some(Scripted::Rejected(message)) => Ok(ApiResponse {
                ok: false,
                data: None,
                message: message.to_string(),
            }),
            Some(_) => Err(AppError::ExternalError("connection reset".to_string())),
            None => Ok(ApiResponse {
                ok: true,
                data: Some(DepositInit {
                    authorization_url: "https://checkout.paystack.com/abc123".to_string(),
                    access_code: "abc123".to_string(),
                    reference: format!("ref_{}", request.amount),
                }),
                message: "Authorization URL created".to_string(),
            }),
        }
    }

    async fn check_payment_status(&self, _reference: &str) -> AppResult<ApiResponse<PaymentStatusData>> {
        self.calls.lock().push(Instant::now());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let answer = self.script.lock().pop_front().unwrap_or(self.fallback);
        match answer {
            Scripted::Status(status) => Ok(Self::status_envelope(status, "Payment status retrieved")),
            Scripted::FailedWithMessage(message) => Ok(Self::status_envelope("Failed", message)),
            Scripted::Rejected(message) => Ok(ApiResponse {
                ok: false,
                data: None,
                message: message.to_string(),
            }),
            Scripted::TransportError => Err(AppError::ExternalError("connection reset".to_string())),
        }
    }

    async fn calculate_charge(&self, amount: Decimal) -> AppResult<ApiResponse<ChargeBreakdown>> {
        let fee = Decimal::from(15);
        let mut fees = Map::new();
        fees.insert("paystack_fee".to_string(), json!(15));
        Ok(ApiResponse {
            ok: true,
            data: Some(ChargeBreakdown {
                amount,
                total_to_pay: amount + fee,
                fees,
            }),
            message: String::new(),
        })
    }
}
