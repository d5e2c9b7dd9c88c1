use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::Value;
use tracing::info;

use crate::api::{ApiClient, PaymentApi};
use crate::cache::DashboardCache;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::funding::{AddFundsFlow, ReconcilerConfig};

/// App-level context, built once at startup and shared by every screen
pub struct AppContext {
    pub config: Config,
    pub api: Arc<ApiClient>,
    pub dashboard: DashboardCache<Value>,
    pub funding: AddFundsFlow,
}

impl AppContext {
    /// Dashboard data for `path`, cached per path
    pub async fn load_dashboard(&self, path: &str) -> AppResult<Value> {
        let api = self.api.clone();
        self.dashboard
            .get_or_load(path, || async move { Self::load(&api, path).await })
            .await
    }

    /// Bypass the cache and reload `path`
    pub async fn refresh_dashboard(&self, path: &str) -> AppResult<Value> {
        let api = self.api.clone();
        self.dashboard
            .refresh(path, || async move { Self::load(&api, path).await })
            .await
    }

    async fn load(api: &ApiClient, path: &str) -> AppResult<Value> {
        let (data, _) = api.get_json(path).await?.into_result()?;
        data.ok_or_else(|| AppError::Decode(format!("No dashboard data at {}", path)))
    }

    /// Drop everything cached for the signed-in user
    pub async fn logout(&self) {
        self.dashboard.clear().await;
        info!("👋 Session cleared");
    }
}

pub fn initialize_app_context(config: Config) -> AppResult<AppContext> {
    info!("Initializing application components ...");

    let api = Arc::new(ApiClient::new(&config)?);
    info!("✅ API client ready for {}", config.api_base_url);

    let dashboard = DashboardCache::new(config.dashboard_cache_ttl_secs.saturating_mul(1000));

    let payment_api: Arc<dyn PaymentApi> = api.clone();
    let funding = AddFundsFlow::new(
        payment_api,
        ReconcilerConfig::from(&config),
        Decimal::from(config.min_deposit_amount),
    );
    info!(
        status_min_interval_secs = config.status_min_interval_secs,
        poll_interval_secs = config.poll_interval_secs,
        hard_timeout_secs = config.hard_timeout_secs,
        "✅ Wallet funding flow ready"
    );

    Ok(AppContext {
        config,
        api,
        dashboard,
        funding,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            api_base_url: "http://localhost:8000/api".to_string(),
            api_token: None,
            request_timeout_secs: 5,
            max_requests_per_second: 5,
            status_min_interval_secs: 50,
            poll_interval_secs: 3,
            max_poll_ticks: 100,
            hard_timeout_secs: 210,
            checkout_hosts: vec!["checkout.paystack.com".to_string()],
            dashboard_cache_ttl_secs: 300,
            min_deposit_amount: 100,
        }
    }

    #[tokio::test]
    async fn test_logout_clears_dashboard_cache() {
        let context = initialize_app_context(config()).unwrap();
        context
            .dashboard
            .set("admin/dashboard", serde_json::json!({"users": 10}))
            .await;

        let cached = context.load_dashboard("admin/dashboard").await.unwrap();
        assert_eq!(cached["users"], 10);

        context.logout().await;
        assert_eq!(context.dashboard.size().await, 0);
    }

    #[test]
    fn test_reconciler_config_follows_app_config() {
        let mut config = config();
        config.hard_timeout_secs = 120;
        let reconciler = ReconcilerConfig::from(&config);
        assert_eq!(reconciler.hard_timeout.as_secs(), 120);
        assert_eq!(reconciler.status_min_interval.as_secs(), 50);
    }
}
