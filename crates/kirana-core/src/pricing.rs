//! # Pricing Resolver
//!
//! Resolves the unit price applicable to a catalog item for a buyer tier.
//!
//! ## Resolution Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Price Resolution                                    │
//! │                                                                         │
//! │  resolve_unit_price(item, tier)                                        │
//! │       │                                                                 │
//! │       ├── item.price_table present?                                    │
//! │       │        └── YES → tier column (customer/dealer/distributor)     │
//! │       │                                                                 │
//! │       ├── item.legacy_sale_price_paise present?                        │
//! │       │        └── YES → flat price, same for every tier               │
//! │       │                                                                 │
//! │       └── neither → None (item is NOT addable)                         │
//! │                                                                         │
//! │  An unresolved price is an explicit None, never a silent zero:         │
//! │  "no tiered pricing configured" and "free item" must stay distinct.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::money::Money;
use crate::types::{BuyerTier, CatalogItem};

/// Resolves the unit price for `item` when sold to a buyer of `tier`.
///
/// Returns `None` when neither a price table nor a legacy flat sale price
/// is configured. Callers must treat `None` as "item not addable" - the
/// cart engine converts it into [`CoreError::ItemNotAddable`].
///
/// [`CoreError::ItemNotAddable`]: crate::error::CoreError::ItemNotAddable
pub fn resolve_unit_price(item: &CatalogItem, tier: BuyerTier) -> Option<Money> {
    if let Some(table) = &item.price_table {
        return Some(table.for_tier(tier));
    }

    item.legacy_sale_price_paise.map(Money::from_paise)
}

// =============================================================================
// Unit Tests
// =============================================================================
