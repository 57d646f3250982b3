//! # Validation Module
//!
//! Input validation utilities for Kirana POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: UI shell                                                     │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate operator feedback                                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                       │
//! │  ├── Blocks bad input before any network call                          │
//! │  └── Field-named, typed errors                                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Inventory / billing services (server-side)                   │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kirana_core::validation::{validate_serial_number, validate_quantity};
//!
//! validate_serial_number("ONU-2024-00193").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a serial number.
///
/// ## Rules
/// - Must not be empty (after trimming)
/// - Must be between 1 and 64 characters
/// - Should contain only alphanumeric characters, hyphens, underscores
pub fn validate_serial_number(serial: &str) -> ValidationResult<()> {
    let serial = serial.trim();

    if serial.is_empty() {
        return Err(ValidationError::Required {
            field: "serial number".to_string(),
        });
    }

    if serial.len() > 64 {
        return Err(ValidationError::TooLong {
            field: "serial number".to_string(),
            max: 64,
        });
    }

    if !serial
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "serial number".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a UTR (Unique Transaction Reference) number for bank transfers.
///
/// ## Rules
/// - Must not be empty
/// - 10 to 22 alphanumeric characters (NEFT references are 16, RTGS 22,
///   IMPS 12; we accept the whole family)
pub fn validate_utr_number(utr: &str) -> ValidationResult<()> {
    let utr = utr.trim();

    if utr.is_empty() {
        return Err(ValidationError::Required {
            field: "UTR number".to_string(),
        });
    }

    if utr.len() < 10 {
        return Err(ValidationError::TooShort {
            field: "UTR number".to_string(),
            min: 10,
        });
    }

    if utr.len() > 22 {
        return Err(ValidationError::TooLong {
            field: "UTR number".to_string(),
            max: 22,
        });
    }

    if !utr.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "UTR number".to_string(),
            reason: "must contain only letters and numbers".to_string(),
        });
    }

    Ok(())
}

/// Validates a cheque number.
///
/// ## Rules
/// - Must not be empty
/// - 6 to 12 digits
pub fn validate_cheque_number(number: &str) -> ValidationResult<()> {
    let number = number.trim();

    if number.is_empty() {
        return Err(ValidationError::Required {
            field: "cheque number".to_string(),
        });
    }

    if number.len() < 6 {
        return Err(ValidationError::TooShort {
            field: "cheque number".to_string(),
            min: 6,
        });
    }

    if number.len() > 12 {
        return Err(ValidationError::TooLong {
            field: "cheque number".to_string(),
            max: 12,
        });
    }

    if !number.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "cheque number".to_string(),
            reason: "must contain only digits".to_string(),
        });
    }

    Ok(())
}

/// Validates a free-text remark.
///
/// ## Rules
/// - Can be empty (remarks are optional)
/// - Maximum 500 characters
///
/// ## Returns
/// The trimmed remark string.
pub fn validate_remark(remark: &str) -> ValidationResult<String> {
    let remark = remark.trim();

    if remark.len() > 500 {
        return Err(ValidationError::TooLong {
            field: "remark".to_string(),
            max: 500,
        });
    }

    Ok(remark.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Cart: Add Item                                                         │
/// │                                                                         │
/// │  Operator enters quantity: 5                                           │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"               │
/// │       │                                                                 │
/// │       ├── qty > 9999? → Error: "quantity must be between 1 and 9999"   │
/// │       │                                                                 │
/// │       └── OK → proceed to the stock gate                               │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a monetary amount in paise.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (nothing paid yet)
pub fn validate_amount_paise(paise: i64) -> ValidationResult<()> {
    if paise < 0 {
        return Err(ValidationError::OutOfRange {
            field: "amount".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates cart size (number of lines).
///
/// ## Rules
/// - Must not exceed MAX_CART_LINES
pub fn validate_cart_size(current_lines: usize) -> ValidationResult<()> {
    if current_lines >= MAX_CART_LINES {
        return Err(ValidationError::OutOfRange {
            field: "cart lines".to_string(),
            min: 0,
            max: MAX_CART_LINES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
