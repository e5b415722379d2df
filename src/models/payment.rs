use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest charge Stripe accepts for USD, in cents.
pub const MIN_AMOUNT_CENTS: i64 = 50;
/// Largest amount Stripe accepts for a single PaymentIntent, in cents.
pub const MAX_AMOUNT_CENTS: i64 = 99_999_999;

pub const METADATA_USER_ID: &str = "user_id";
pub const METADATA_BUNDLES: &str = "bundles";
pub const METADATA_WORKSPACE_NAME: &str = "workspace_name";
pub const METADATA_REFERRAL_CODE: &str = "referral_code";

fn default_currency() -> String {
    "usd".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentIntentPayload {
    /// Kept as a raw JSON number so floats and out-of-range integers reach
    /// validation instead of failing deserialization.
    pub amount: serde_json::Number,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub bundles: Vec<String>,
    #[serde(default)]
    pub workspace_name: String,
    #[serde(default)]
    pub referral_code: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaymentValidationError {
    #[error("amount must be between 50 and 99999999 cents")]
    AmountOutOfRange,
    #[error("currency must be a three-letter ISO code")]
    InvalidCurrency,
    #[error("workspace_name is required")]
    MissingWorkspaceName,
    #[error("invalid bundle name: {0:?}")]
    InvalidBundle(String),
}

impl PaymentValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            PaymentValidationError::AmountOutOfRange => "amount_out_of_range",
            PaymentValidationError::InvalidCurrency => "invalid_currency",
            PaymentValidationError::MissingWorkspaceName => "missing_workspace_name",
            PaymentValidationError::InvalidBundle(_) => "invalid_bundle",
        }
    }
}

/// A payment request that passed validation and is safe to send to Stripe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPaymentIntent {
    pub amount: i64,
    pub currency: String,
    pub bundles: Vec<String>,
    pub workspace_name: String,
    pub referral_code: Option<String>,
}

impl CreatePaymentIntentPayload {
    pub fn validate(self) -> Result<ValidatedPaymentIntent, PaymentValidationError> {
        let amount = self
            .amount
            .as_i64()
            .filter(|a| (MIN_AMOUNT_CENTS..=MAX_AMOUNT_CENTS).contains(a))
            .ok_or(PaymentValidationError::AmountOutOfRange)?;

        let currency = self.currency.trim().to_ascii_lowercase();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(PaymentValidationError::InvalidCurrency);
        }

        let workspace_name = self.workspace_name.trim().to_string();
        if workspace_name.is_empty() {
            return Err(PaymentValidationError::MissingWorkspaceName);
        }

        let mut seen = BTreeSet::new();
        let mut bundles = Vec::with_capacity(self.bundles.len());
        for raw in self.bundles {
            let name = raw.trim().to_ascii_lowercase();
            if name.is_empty() || name.contains(',') {
                return Err(PaymentValidationError::InvalidBundle(raw));
            }
            if seen.insert(name.clone()) {
                bundles.push(name);
            }
        }

        let referral_code = self
            .referral_code
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        Ok(ValidatedPaymentIntent {
            amount,
            currency,
            bundles,
            workspace_name,
            referral_code,
        })
    }
}

/// Bundles travel through Stripe metadata as a comma-joined string.
pub fn encode_bundles(bundles: &[String]) -> String {
    bundles.join(",")
}

/// Accepts the comma-joined form and, for older intents, a JSON array string.
pub fn decode_bundles(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        if let Ok(list) = serde_json::from_str::<Vec<String>>(trimmed) {
            return list
                .into_iter()
                .map(|b| b.trim().to_string())
                .filter(|b| !b.is_empty())
                .collect();
        }
    }
    trimmed
        .split(',')
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
    #[serde(other)]
    Unknown,
}

impl PaymentIntentStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "requires_payment_method" => Self::RequiresPaymentMethod,
            "requires_confirmation" => Self::RequiresConfirmation,
            "requires_action" => Self::RequiresAction,
            "processing" => Self::Processing,
            "requires_capture" => Self::RequiresCapture,
            "canceled" => Self::Canceled,
            "succeeded" => Self::Succeeded,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequiresPaymentMethod => "requires_payment_method",
            Self::RequiresConfirmation => "requires_confirmation",
            Self::RequiresAction => "requires_action",
            Self::Processing => "processing",
            Self::RequiresCapture => "requires_capture",
            Self::Canceled => "canceled",
            Self::Succeeded => "succeeded",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PaymentIntentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntentResponse {
    pub client_secret: Option<String>,
    pub payment_intent_id: String,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentIntentStatus,
}
