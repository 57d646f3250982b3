//! # kirana-core: Pure Business Logic for Kirana POS
//!
//! This crate is the **heart** of Kirana POS. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Kirana POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      UI Shell (excluded)                        │   │
//! │  │    Item Picker ──► Cart Panel ──► Payment Modal ──► Success    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ UI-level calls                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 kirana-billing (async layer)                    │   │
//! │  │    CartSession, StagedBatch, BillAssembler, PaymentFlow        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kirana-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   cart    │  │   stock   │  │   │
//! │  │   │ CatalogItem│ │   Money   │  │   Cart    │  │   gate    │  │   │
//! │  │   │   Bill    │  │  (paise)  │  │ CartLine  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • PURE FUNCTIONS                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (CatalogItem, Bill, PaymentMethod, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - Per-tier unit price resolution
//! - [`cart`] - The cart engine (lines, merge rules, totals)
//! - [`stock`] - The stock reconciliation gate
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Network, file system, database access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in paise (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use kirana_core::cart::Cart;
//! use kirana_core::types::{BuyerTier, CatalogItem, PriceTable, StockLedger, QuantityLot};
//!
//! let item = CatalogItem {
//!     id: "cable".into(),
//!     name: "CAT6 Cable".into(),
//!     unit_label: "mtr".into(),
//!     price_table: Some(PriceTable {
//!         customer_paise: 2500,
//!         dealer_paise: 2200,
//!         distributor_paise: 2000,
//!     }),
//!     legacy_sale_price_paise: None,
//!     stock: StockLedger::Generic {
//!         lots: vec![QuantityLot {
//!             quantity: 100,
//!             added_date: chrono::NaiveDate::from_ymd_opt(2024, 8, 5).unwrap(),
//!             remark: None,
//!         }],
//!     },
//! };
//!
//! let mut cart = Cart::new();
//! cart.add_line(&item, BuyerTier::Dealer, None, 4).unwrap();
//!
//! // Dealer column, frozen at add time: 4 × ₹22.00
//! assert_eq!(cart.totals().total.paise(), 8800);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod pricing;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use kirana_core::Money` instead of
// `use kirana_core::money::Money`

pub use cart::{Cart, CartLine, CartTotals};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use stock::Availability;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart
///
/// ## Business Reason
/// Prevents runaway carts and ensures reasonable bill sizes.
/// Can be made configurable per-branch in future versions.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single generic line
///
/// ## Business Reason
/// Prevents accidental over-billing (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 9_999;
