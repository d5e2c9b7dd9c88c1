use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::{clock::DefaultClock, state::InMemoryState, state::NotKeyed, Quota, RateLimiter};
use reqwest::{Client, RequestBuilder};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use validator::Validate;

use crate::api::envelope::{normalize, ApiResponse};
use crate::api::models::*;
use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Backend surface used by the wallet funding flow
#[async_trait]
pub trait PaymentApi: Send + Sync {
    async fn initialize_deposit(&self, request: &DepositRequest) -> AppResult<ApiResponse<DepositInit>>;

    async fn check_payment_status(&self, reference: &str) -> AppResult<ApiResponse<PaymentStatusData>>;

    async fn calculate_charge(&self, amount: Decimal) -> AppResult<ApiResponse<ChargeBreakdown>>;
}

/// HTTP client for the top-up backend
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl ApiClient {
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let per_second = NonZeroU32::new(config.max_requests_per_second).ok_or_else(|| {
            AppError::Config("max_requests_per_second must be greater than zero".to_string())
        })?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(per_second))),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and normalize whatever envelope comes back.
    ///
    /// Non-2xx replies still carry an envelope with a message, so the body is
    /// decoded regardless of status; only an undecodable body is an error.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> AppResult<ApiResponse<T>> {
        self.limiter.until_ready().await;

        let response = self.authorize(request).send().await?;
        let status = response.status();
        let body: Value = response.json().await?;

        if !status.is_success() {
            warn!("⚠️ Backend answered {} : {}", status, body);
        } else {
            debug!("✓ Backend answered {}", status);
        }

        normalize(body)
    }

    pub async fn buy_airtime(&self, request: &AirtimeRequest) -> AppResult<ApiResponse<PurchaseReceipt>> {
        request.validate()?;
        self.send(self.client.post(self.url("vtu/airtime")).json(request)).await
    }

    pub async fn buy_data(&self, request: &DataRequest) -> AppResult<ApiResponse<PurchaseReceipt>> {
        request.validate()?;
        self.send(self.client.post(self.url("vtu/data")).json(request)).await
    }

    pub async fn subscribe_cable(&self, request: &CableRequest) -> AppResult<ApiResponse<PurchaseReceipt>> {
        request.validate()?;
        self.send(self.client.post(self.url("vtu/cable")).json(request)).await
    }

    /// Generic GET used by dashboard loaders
    pub async fn get_json(&self, path: &str) -> AppResult<ApiResponse<Value>> {
        self.send(self.client.get(self.url(path))).await
    }
}

#[async_trait]
impl PaymentApi for ApiClient {
    async fn initialize_deposit(&self, request: &DepositRequest) -> AppResult<ApiResponse<DepositInit>> {
        request.validate()?;
        self.send(self.client.post(self.url("wallet/deposit/initialize")).json(request))
            .await
    }

    async fn check_payment_status(&self, reference: &str) -> AppResult<ApiResponse<PaymentStatusData>> {
        if reference.trim().is_empty() {
            return Err(AppError::InvalidInput("payment reference is empty".to_string()));
        }
        self.send(self.client.get(self.url(&format!("wallet/deposit/status/{}", reference))))
            .await
    }

    async fn calculate_charge(&self, amount: Decimal) -> AppResult<ApiResponse<ChargeBreakdown>> {
        self.send(
            self.client
                .post(self.url("wallet/deposit/charge"))
                .json(&ChargeRequest { amount }),
        )
        .await
    }
}
