use serde::Deserialize;

const ENV_PREFIX: &str = "TOPUP";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub request_timeout_secs: u64,
    /// Client-wide ceiling on outgoing API requests
    pub max_requests_per_second: u32,
    /// Minimum spacing between two payment status checks for one attempt
    pub status_min_interval_secs: u64,
    pub poll_interval_secs: u64,
    pub max_poll_ticks: u32,
    /// Absolute lifetime of a funding attempt before it is declared expired
    pub hard_timeout_secs: u64,
    /// Hosts that belong to the hosted checkout page
    pub checkout_hosts: Vec<String>,
    pub dashboard_cache_ttl_secs: u64,
    pub min_deposit_amount: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let builder = Self::defaults()?.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("checkout_hosts"),
        );

        Self::from_builder(builder)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        config::Config::builder()
            .set_default("api_base_url", "http://localhost:8000/api")?
            .set_default("request_timeout_secs", 30)?
            .set_default("max_requests_per_second", 5)?
            .set_default("status_min_interval_secs", 50)?
            .set_default("poll_interval_secs", 3)?
            .set_default("max_poll_ticks", 100)?
            .set_default("hard_timeout_secs", 210)?
            .set_default("checkout_hosts", vec!["checkout.paystack.com"])?
            .set_default("dashboard_cache_ttl_secs", 300)?
            .set_default("min_deposit_amount", 100)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, config::ConfigError> {
        let config: Self = builder.build()?.try_deserialize()?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), config::ConfigError> {
        if self.max_requests_per_second == 0 {
            return Err(config::ConfigError::Message(
                "max_requests_per_second must be greater than zero".to_string(),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(config::ConfigError::Message(
                "poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.checkout_hosts.is_empty() {
            return Err(config::ConfigError::Message(
                "checkout_hosts must name at least one host".to_string(),
            ));
        }
        Ok(())
    }
}
