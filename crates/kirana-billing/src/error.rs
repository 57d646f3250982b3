//! # Billing Error Types
//!
//! Error types for billing orchestration.
//!
//! ## Error Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Billing Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │   Validation    │  │  Availability   │  │       Remote            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  EmptyCart      │  │  InsufficientStock  │  Remote{op, message}   │ │
//! │  │  MissingField   │  │  NoFreeSerial   │  │  (server text when      │ │
//! │  │  PaidAmountLocked  │  SerialsRejected │  │  available, generic    │ │
//! │  │  AmountExceedsTotal│                 │  │  fallback otherwise)    │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Validation and availability errors block BEFORE any network call.     │
//! │  Remote errors abandon the operation at the failure point without      │
//! │  rolling back side effects already applied server-side.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use kirana_core::{CoreError, Money};

use crate::services::RemoteError;
use crate::stock_addition::SerialProblem;

/// Result type alias for billing operations.
pub type BillingResult<T> = Result<T, BillingError>;

/// Billing orchestration error type.
///
/// ## Design Principles
/// - Each variant includes enough context for an inline warning
/// - Errors are categorized so the UI can decide placement and tone
/// - All errors are `Send + Sync` for async compatibility
#[derive(Debug, Error)]
pub enum BillingError {
    // =========================================================================
    // Local Errors (core rules)
    // =========================================================================
    /// A cart/pricing/availability rule was violated.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A bill cannot be assembled from an empty cart.
    #[error("Cart is empty; add at least one item before billing")]
    EmptyCart,

    /// The item id is not in the session's catalog snapshot.
    ///
    /// ## When This Occurs
    /// - The item list was refetched and the item is gone
    /// - The UI passed a stale id after a branch/type switch
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    // =========================================================================
    // Stock Addition Errors
    // =========================================================================
    /// One or more serials in a staged batch failed verification.
    /// The batch was NOT staged; nothing reached the stock-write endpoint.
    #[error("{} serial number(s) rejected", problems.len())]
    SerialsRejected { problems: Vec<SerialProblem> },

    /// The wrong stock form was used for the item's tracking kind
    /// (e.g. the quantity form against a serial-tracked item).
    #[error("{item_name} is {kind}-tracked; use the matching stock form")]
    StockFormMismatch {
        item_name: String,
        kind: kirana_core::ItemKind,
    },

    // =========================================================================
    // Payment Flow Errors
    // =========================================================================
    /// The requested action is not legal in the current stage.
    #[error("Cannot {action} from the {stage} stage")]
    InvalidTransition {
        stage: &'static str,
        action: &'static str,
    },

    /// A method-specific required field is missing.
    #[error("{field} is required")]
    MissingField { field: &'static str },

    /// UPI payments are full-payment-only; the paid amount cannot be edited.
    #[error("Paid amount is fixed to the bill total for UPI payments")]
    PaidAmountLocked,

    /// For bank transfer and cheque the paid amount comes from the
    /// method-specific amount field, not the generic one.
    #[error("Paid amount for {method} is derived from the {field} field")]
    PaidAmountDerived {
        method: kirana_core::PaymentMethod,
        field: &'static str,
    },

    /// The paid amount may not exceed the bill total.
    #[error("Paid amount {amount} exceeds bill total {total}")]
    AmountExceedsTotal { amount: Money, total: Money },

    /// UPI requires a receiving bank account to be chosen first.
    #[error("Select a receiving bank account first")]
    NoAccountSelected,

    /// Settlement cannot be confirmed before the QR session is generated.
    #[error("Generate the QR settlement session first")]
    QrNotLoaded,

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Failed to load or parse the billing config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    // =========================================================================
    // Remote Errors
    // =========================================================================
    /// A service call failed; `message` is the server-provided text when
    /// available, a generic fallback otherwise.
    #[error("{operation} failed: {message}")]
    Remote { operation: &'static str, message: String },
}

impl BillingError {
    /// Wraps a service failure with the operation that was attempted.
    pub fn remote(operation: &'static str, err: RemoteError) -> Self {
        BillingError::Remote {
            operation,
            message: err.user_message().to_string(),
        }
    }

    /// True for errors the operator fixes by editing input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            BillingError::Core(CoreError::Validation(_))
                | BillingError::Core(CoreError::ItemNotAddable { .. })
                | BillingError::Core(CoreError::SerialRequired { .. })
                | BillingError::Core(CoreError::SerialNotAllowed { .. })
                | BillingError::EmptyCart
                | BillingError::StockFormMismatch { .. }
                | BillingError::InvalidTransition { .. }
                | BillingError::MissingField { .. }
                | BillingError::PaidAmountLocked
                | BillingError::PaidAmountDerived { .. }
                | BillingError::AmountExceedsTotal { .. }
                | BillingError::NoAccountSelected
                | BillingError::QrNotLoaded
        )
    }

    /// True for stock/serial availability violations.
    pub fn is_availability(&self) -> bool {
        matches!(
            self,
            BillingError::Core(CoreError::InsufficientStock { .. })
                | BillingError::Core(CoreError::NoFreeSerial { .. })
                | BillingError::Core(CoreError::SerialNotInStock { .. })
                | BillingError::Core(CoreError::DuplicateSerialInCart { .. })
                | BillingError::SerialsRejected { .. }
        )
    }

    /// True for network/server failures. Always recoverable by operator
    /// retry; never fatal to the session.
    pub fn is_remote(&self) -> bool {
        matches!(self, BillingError::Remote { .. })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorization() {
        let err = BillingError::MissingField { field: "UTR number" };
        assert!(err.is_validation());
        assert!(!err.is_remote());

        let err = BillingError::Core(CoreError::InsufficientStock {
            item_name: "CAT6 Cable".into(),
            available: 5,
            requested: 6,
        });
        assert!(err.is_availability());
        assert!(!err.is_validation());

        let err = BillingError::remote("Bill creation", RemoteError::server("duplicate bill"));
        assert!(err.is_remote());
        assert_eq!(err.to_string(), "Bill creation failed: duplicate bill");
    }

    #[test]
    fn test_remote_fallback_message() {
        let err = BillingError::remote("QR generation", RemoteError::unreachable());
        assert!(err.to_string().starts_with("QR generation failed:"));
    }
}
