//! # Billing Configuration
//!
//! Configuration for the billing flow.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. TOML config file (path chosen by the host application)             │
//! │     billing.toml                                                        │
//! │                                                                         │
//! │  2. Default values                                                     │
//! │     merchant name "Kirana POS", QR expiry 300s                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # billing.toml
//! [merchant]
//! name = "Sharma Network Services"
//! branch_id = "branch-jaipur-01"
//!
//! [qr]
//! expiry_secs = 300
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{BillingError, BillingResult};

// =============================================================================
// Billing Config
// =============================================================================

/// Merchant identity used on QR settlement sessions and bill notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantConfig {
    /// Display name shown to the paying customer.
    #[serde(default = "default_merchant_name")]
    pub name: String,

    /// Branch whose inventory this terminal sells from.
    #[serde(default)]
    pub branch_id: String,
}

fn default_merchant_name() -> String {
    "Kirana POS".to_string()
}

impl Default for MerchantConfig {
    fn default() -> Self {
        MerchantConfig {
            name: default_merchant_name(),
            branch_id: String::new(),
        }
    }
}

/// QR settlement session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrConfig {
    /// Seconds the settlement countdown runs for.
    ///
    /// Advisory display only - expiry never invalidates the session
    /// server-side.
    #[serde(default = "default_qr_expiry_secs")]
    pub expiry_secs: u64,
}

fn default_qr_expiry_secs() -> u64 {
    300
}

impl Default for QrConfig {
    fn default() -> Self {
        QrConfig {
            expiry_secs: default_qr_expiry_secs(),
        }
    }
}

/// Top-level billing configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillingConfig {
    #[serde(default)]
    pub merchant: MerchantConfig,

    #[serde(default)]
    pub qr: QrConfig,
}

impl BillingConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> BillingResult<Self> {
        let config: BillingConfig =
            toml::from_str(text).map_err(|e| BillingError::ConfigLoadFailed(e.to_string()))?;
        Ok(config)
    }

    /// Loads the configuration from a file, falling back to defaults when
    /// the file does not exist.
    pub fn load(path: &Path) -> BillingResult<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "Billing config not found, using defaults");
            return Ok(BillingConfig::default());
        }

        let text = std::fs::read_to_string(path)
            .map_err(|e| BillingError::ConfigLoadFailed(e.to_string()))?;

        let config = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), merchant = %config.merchant.name, "Billing config loaded");
        Ok(config)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BillingConfig::default();
        assert_eq!(config.merchant.name, "Kirana POS");
        assert_eq!(config.qr.expiry_secs, 300);
    }

    #[test]
    fn test_parse_full_config() {
        let config = BillingConfig::from_toml_str(
            r#"
            [merchant]
            name = "Sharma Network Services"
            branch_id = "branch-jaipur-01"

            [qr]
            expiry_secs = 120
            "#,
        )
        .unwrap();

        assert_eq!(config.merchant.name, "Sharma Network Services");
        assert_eq!(config.merchant.branch_id, "branch-jaipur-01");
        assert_eq!(config.qr.expiry_secs, 120);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config = BillingConfig::from_toml_str(
            r#"
            [merchant]
            name = "Corner Store"
            "#,
        )
        .unwrap();

        assert_eq!(config.merchant.name, "Corner Store");
        assert_eq!(config.qr.expiry_secs, 300);
    }

    #[test]
    fn test_invalid_toml_rejected() {
        assert!(BillingConfig::from_toml_str("merchant = not toml").is_err());
    }
}
