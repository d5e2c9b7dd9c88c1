use thiserror::Error;

/// Top-level error type for the entire client
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External error: {0}")]
    ExternalError(String),

    #[error("API rejected request: {message}")]
    Rejected { message: String },

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Funding error: {0}")]
    Funding(#[from] FundingError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors raised while setting up a wallet funding attempt
#[derive(Error, Debug)]
pub enum FundingError {
    #[error("Amount {amount} is below the minimum deposit of {minimum}")]
    AmountBelowMinimum { amount: String, minimum: String },

    #[error("Charge calculation failed: {0}")]
    ChargeUnavailable(String),

    #[error("Deposit initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Checkout URL missing from deposit response")]
    MissingCheckoutUrl,

    #[error("Reconciliation task stopped unexpectedly: {0}")]
    ReconcilerStopped(String),
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            AppError::Decode(format!("HTTP body decode error: {:?}", error))
        } else {
            AppError::ExternalError(format!("HTTP request error: {:?}", error))
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        AppError::Decode(format!("JSON error: {}", error))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(error: config::ConfigError) -> Self {
        AppError::Config(error.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .into_iter()
            .map(|(field, errors)| {
                let messages: Vec<String> = errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|s| s.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                format!("{}: {}", field, messages.join(", "))
            })
            .collect::<Vec<String>>()
            .join("; ");

        AppError::InvalidInput(format!("Validation failed: {}", details))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal(format!("Error converting: {:?}", error))
    }
}

impl From<rust_decimal::Error> for AppError {
    fn from(error: rust_decimal::Error) -> Self {
        AppError::InvalidInput(format!("Decimal conversion error: {:?}", error))
    }
}

/// Result type alias for the client
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(email(message = "must be a valid email"))]
        email: String,
    }

    #[test]
    fn test_validation_errors_name_the_field() {
        let probe = Probe {
            email: "not-an-email".to_string(),
        };

        let err: AppError = probe.validate().unwrap_err().into();
        let text = err.to_string();
        assert!(text.contains("email"));
        assert!(text.contains("must be a valid email"));
    }

    #[test]
    fn test_funding_error_wraps_into_app_error() {
        let err: AppError = FundingError::MissingCheckoutUrl.into();
        assert!(matches!(err, AppError::Funding(FundingError::MissingCheckoutUrl)));
    }
}
