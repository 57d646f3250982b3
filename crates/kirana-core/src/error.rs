//! # Error Types
//!
//! Domain-specific error types for kirana-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kirana-core errors (this file)                                        │
//! │  ├── CoreError        - Cart / pricing / availability violations       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  kirana-billing errors (separate crate)                                │
//! │  ├── BillingError     - Orchestration and remote failures              │
//! │  └── RemoteError      - Opaque service-call failures                   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → BillingError → UI shell           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (item name, serial, amounts)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Availability violations are *reported* through these variants, never
/// panicked: the cart is left untouched when one comes back.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Neither a price table column nor a legacy flat price resolved.
    ///
    /// ## When This Occurs
    /// The catalog entry predates tiered pricing and never had a flat sale
    /// price filled in. The item cannot be added - billing zero silently
    /// is exactly the bug this variant exists to prevent.
    #[error("No price configured for {item_name}; item cannot be added")]
    ItemNotAddable { item_name: String },

    /// Insufficient stock for the requested quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Add to cart (qty: 6)
    ///      │
    ///      ▼
    /// Stock gate: available = 5
    ///      │
    ///      ▼
    /// InsufficientStock { item_name: "CAT6 Cable", available: 5, requested: 6 }
    ///      │
    ///      ▼
    /// UI shows: "Only 5 CAT6 Cable in stock"
    /// ```
    #[error("Insufficient stock for {item_name}: available {available}, requested {requested}")]
    InsufficientStock {
        item_name: String,
        available: i64,
        requested: i64,
    },

    /// No free serial number remains for a serialized item.
    #[error("No free serial number available for {item_name}")]
    NoFreeSerial { item_name: String },

    /// A serialized item was added without a serial number.
    #[error("{item_name} is serial-tracked; a serial number is required")]
    SerialRequired { item_name: String },

    /// A serial number was supplied for a non-serialized item.
    #[error("{item_name} is not serial-tracked; serial numbers do not apply")]
    SerialNotAllowed { item_name: String },

    /// The requested serial number is not among the item's free stock.
    #[error("Serial {serial} is not in stock for {item_name}")]
    SerialNotInStock { item_name: String, serial: String },

    /// The (item, serial) pair is already in the cart.
    #[error("Serial {serial} is already in the cart")]
    DuplicateSerialInCart { serial: String },

    /// Serialized cart lines always carry quantity 1.
    #[error("Quantity of serial-tracked line is fixed at 1")]
    SerializedQuantityFixed,

    /// Line index does not exist in the cart.
    #[error("No cart line at index {index}")]
    LineNotFound { index: usize },

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when operator input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., non-numeric cheque number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate serial in a batch).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            item_name: "CAT6 Cable".to_string(),
            available: 5,
            requested: 6,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for CAT6 Cable: available 5, requested 6"
        );

        let err = CoreError::DuplicateSerialInCart {
            serial: "SN-001".to_string(),
        };
        assert_eq!(err.to_string(), "Serial SN-001 is already in the cart");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "serial number".to_string(),
        };
        assert_eq!(err.to_string(), "serial number is required");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "serial number".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
