use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::{Validate, ValidationError};

// ========== REQUEST MODELS ==========

/// Request to start a wallet deposit through the hosted checkout
#[derive(Debug, Clone, Serialize, Validate)]
pub struct DepositRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,

    #[validate(custom = "validate_positive_amount")]
    pub amount: Decimal,

    /// Charge breakdown previously returned by `calculate_charge`
    #[serde(rename = "chargeInfo", skip_serializing_if = "Option::is_none")]
    pub charge_info: Option<ChargeBreakdown>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChargeRequest {
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct AirtimeRequest {
    #[validate(length(min = 1, message = "network is required"))]
    pub network: String,

    #[validate(custom = "validate_phone_number")]
    pub phone: String,

    #[validate(custom = "validate_positive_amount")]
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct DataRequest {
    #[validate(length(min = 1, message = "network is required"))]
    pub network: String,

    #[validate(custom = "validate_phone_number")]
    pub phone: String,

    #[validate(length(min = 1, message = "plan is required"))]
    pub plan_id: String,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct CableRequest {
    #[validate(length(min = 1, message = "provider is required"))]
    pub provider: String,

    #[validate(custom = "validate_smartcard_number")]
    pub smartcard_number: String,

    #[validate(length(min = 1, message = "plan is required"))]
    pub plan_id: String,
}

// ========== RESPONSE MODELS ==========

/// Data returned by a successful deposit initialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositInit {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

/// Fee breakdown for a deposit amount
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeBreakdown {
    pub amount: Decimal,
    pub total_to_pay: Decimal,
    /// Provider and service fees, passed through untouched
    #[serde(flatten)]
    pub fees: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentStatusData {
    pub transaction: TransactionRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// "Completed", "Failed" or any in-progress value
    pub status: String,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// Receipt for airtime, data and cable purchases
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

// ========== VALIDATORS ==========

fn validate_positive_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_negative() || amount.is_zero() {
        let mut error = ValidationError::new("positive_amount");
        error.message = Some("amount must be greater than zero".into());
        return Err(error);
    }
    Ok(())
}

/// Local (0803...) or international (234803...) mobile numbers
fn validate_phone_number(phone: &str) -> Result<(), ValidationError> {
    let digits_only = !phone.is_empty() && phone.chars().all(|c| c.is_ascii_digit());
    let valid = digits_only
        && ((phone.len() == 11 && phone.starts_with('0'))
            || (phone.len() == 13 && phone.starts_with("234")));

    if !valid {
        let mut error = ValidationError::new("phone_number");
        error.message = Some("phone must be 11 digits starting with 0 or 13 starting with 234".into());
        return Err(error);
    }
    Ok(())
}

fn validate_smartcard_number(number: &str) -> Result<(), ValidationError> {
    let valid = (10..=11).contains(&number.len()) && number.chars().all(|c| c.is_ascii_digit());
    if !valid {
        let mut error = ValidationError::new("smartcard_number");
        error.message = Some("smartcard number must be 10 or 11 digits".into());
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_deposit_request_validation() {
        let valid = DepositRequest {
            email: "ada@example.com".to_string(),
            amount: dec!(1000),
            charge_info: None,
        };
        assert!(valid.validate().is_ok());

        let bad_email = DepositRequest {
            email: "ada".to_string(),
            ..valid.clone()
        };
        assert!(bad_email.validate().is_err());

        let zero = DepositRequest {
            amount: Decimal::ZERO,
            ..valid
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_phone_number_formats() {
        assert!(validate_phone_number("08031234567").is_ok());
        assert!(validate_phone_number("2348031234567").is_ok());
        assert!(validate_phone_number("8031234567").is_err());
        assert!(validate_phone_number("0803123456a").is_err());
        assert!(validate_phone_number("").is_err());
    }

    #[test]
    fn test_cable_request_validation() {
        let request = CableRequest {
            provider: "dstv".to_string(),
            smartcard_number: "7023456789".to_string(),
            plan_id: "compact".to_string(),
        };
        assert!(request.validate().is_ok());

        let short = CableRequest {
            smartcard_number: "12345".to_string(),
            ..request
        };
        assert!(short.validate().is_err());
    }

    #[test]
    fn test_charge_breakdown_keeps_fees() {
        let breakdown: ChargeBreakdown = serde_json::from_value(json!({
            "amount": 1000,
            "total_to_pay": 1015,
            "paystack_fee": 15,
            "service_fee": 0
        }))
        .unwrap();

        assert_eq!(breakdown.total_to_pay, dec!(1015));
        assert_eq!(breakdown.fees.get("paystack_fee"), Some(&json!(15)));
    }

    #[test]
    fn test_deposit_request_serializes_charge_info_key() {
        let request = DepositRequest {
            email: "ada@example.com".to_string(),
            amount: dec!(1015),
            charge_info: None,
        };
        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("chargeInfo").is_none());
        assert_eq!(body["email"], "ada@example.com");
    }
}
