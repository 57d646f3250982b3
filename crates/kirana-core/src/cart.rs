//! # Cart Engine
//!
//! Owns the set of line items for the active billing session.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Engine Operations                               │
//! │                                                                         │
//! │  Operator Action            Engine Call             Cart Change        │
//! │  ───────────────            ───────────             ───────────        │
//! │                                                                         │
//! │  Pick serialized unit ────► add_line(serial) ─────► push new line      │
//! │                                                                         │
//! │  Pick generic item ───────► add_line(no serial) ──► merge or push      │
//! │                                                                         │
//! │  Change quantity ─────────► update_quantity() ────► recompute total    │
//! │                                                                         │
//! │  Remove line ─────────────► remove_line() ────────► lines.remove(i)    │
//! │                                                                         │
//! │  Bill summary ────────────► totals() ─────────────► recomputed fresh   │
//! │                                                                         │
//! │  NOTE: every mutation is local and synchronous; the stock gate is      │
//! │        consulted by the session layer BEFORE the engine is touched.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - At most one line per (item, serial) pair for serialized items
//! - At most one line per item for generic/service items (adds merge)
//! - Serialized lines always carry quantity 1
//! - `totals()` is recomputed from the lines on every call - no cached
//!   running total that could drift

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::resolve_unit_price;
use crate::types::{BuyerTier, CatalogItem, ItemKind};
use crate::validation::{validate_quantity, validate_serial_number};
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// One line in the sales cart.
///
/// ## Design Notes
/// - `unit_price` is resolved once when the line is created and frozen:
///   a catalog price change after the add must not reprice the cart.
/// - The display fields (`item_name`, `unit_label`) are snapshots for the
///   same reason.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Catalog item this line sells.
    pub item_id: String,

    /// Item name at add time (frozen).
    pub item_name: String,

    /// Unit label at add time (frozen).
    pub unit_label: String,

    /// Tracking kind of the item.
    pub kind: ItemKind,

    /// Serial number; present iff the item is serial-tracked.
    pub serial_number: Option<String>,

    /// Quantity; always 1 when a serial number is present.
    pub quantity: i64,

    /// Unit price resolved at add time (frozen).
    pub unit_price: Money,

    /// When this line was added.
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Line total: unit price × quantity.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Cart Totals
// =============================================================================

/// Totals derived from the current cart lines.
///
/// Recomputed from scratch on every `totals()` call; tax and discount
/// hooks are reserved, so for now `total == subtotal`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub line_count: usize,
    pub subtotal: Money,
    pub total: Money,
}

// =============================================================================
// Cart
// =============================================================================

/// The sales cart: an ordered sequence of lines.
///
/// Order is display-relevant (the operator sees lines in add order) but
/// carries no other meaning. Owned exclusively by the active billing
/// session; destroyed on success or cancellation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Lines in display order.
    pub lines: Vec<CartLine>,

    /// When the cart was created/last cleared.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds an item to the cart.
    ///
    /// ## Behavior
    /// - Serialized item: requires a serial number, creates exactly one new
    ///   line with quantity 1. The same (item, serial) pair twice is
    ///   rejected here even though the stock gate should have caught it -
    ///   defense in depth against a stale availability snapshot.
    /// - Generic/service item: serial numbers are rejected; an existing
    ///   line for the same item absorbs the quantity, otherwise a new line
    ///   is pushed.
    ///
    /// The unit price is resolved once, here, and frozen on the line.
    /// An unresolvable price makes the item *not addable*.
    pub fn add_line(
        &mut self,
        item: &CatalogItem,
        tier: BuyerTier,
        serial_number: Option<&str>,
        quantity: i64,
    ) -> CoreResult<()> {
        validate_quantity(quantity)?;

        let unit_price =
            resolve_unit_price(item, tier).ok_or_else(|| CoreError::ItemNotAddable {
                item_name: item.name.clone(),
            })?;

        match item.kind() {
            ItemKind::Serialized => {
                let serial = serial_number.ok_or_else(|| CoreError::SerialRequired {
                    item_name: item.name.clone(),
                })?;
                validate_serial_number(serial)?;

                if quantity != 1 {
                    return Err(CoreError::SerializedQuantityFixed);
                }

                let serial = serial.trim();
                if self
                    .lines
                    .iter()
                    .any(|l| l.item_id == item.id && l.serial_number.as_deref() == Some(serial))
                {
                    return Err(CoreError::DuplicateSerialInCart {
                        serial: serial.to_string(),
                    });
                }

                if self.lines.len() >= MAX_CART_LINES {
                    return Err(CoreError::CartTooLarge { max: MAX_CART_LINES });
                }

                self.lines.push(CartLine {
                    item_id: item.id.clone(),
                    item_name: item.name.clone(),
                    unit_label: item.unit_label.clone(),
                    kind: ItemKind::Serialized,
                    serial_number: Some(serial.to_string()),
                    quantity: 1,
                    unit_price,
                    added_at: Utc::now(),
                });
                Ok(())
            }

            kind @ (ItemKind::Generic | ItemKind::Service) => {
                if serial_number.is_some() {
                    return Err(CoreError::SerialNotAllowed {
                        item_name: item.name.clone(),
                    });
                }

                // Merge into an existing line for the same item
                if let Some(line) = self.lines.iter_mut().find(|l| l.item_id == item.id) {
                    let new_qty = line.quantity + quantity;
                    if new_qty > MAX_LINE_QUANTITY {
                        return Err(CoreError::QuantityTooLarge {
                            requested: new_qty,
                            max: MAX_LINE_QUANTITY,
                        });
                    }
                    line.quantity = new_qty;
                    return Ok(());
                }

                if self.lines.len() >= MAX_CART_LINES {
                    return Err(CoreError::CartTooLarge { max: MAX_CART_LINES });
                }

                self.lines.push(CartLine {
                    item_id: item.id.clone(),
                    item_name: item.name.clone(),
                    unit_label: item.unit_label.clone(),
                    kind,
                    serial_number: None,
                    quantity,
                    unit_price,
                    added_at: Utc::now(),
                });
                Ok(())
            }
        }
    }

    /// Updates the quantity of a line.
    ///
    /// ## Behavior
    /// - `new_quantity <= 0` is equivalent to removal
    /// - Serialized lines are fixed at quantity 1
    /// - The line total is implicitly recomputed (it is derived, not stored)
    ///
    /// Availability re-validation for an increase is the session layer's
    /// job and must happen before this call.
    pub fn update_quantity(&mut self, index: usize, new_quantity: i64) -> CoreResult<()> {
        if new_quantity <= 0 {
            return self.remove_line(index);
        }

        let line = self
            .lines
            .get_mut(index)
            .ok_or(CoreError::LineNotFound { index })?;

        if line.kind == ItemKind::Serialized && new_quantity != 1 {
            return Err(CoreError::SerializedQuantityFixed);
        }

        validate_quantity(new_quantity)?;
        line.quantity = new_quantity;
        Ok(())
    }

    /// Removes a line by index.
    pub fn remove_line(&mut self, index: usize) -> CoreResult<()> {
        if index >= self.lines.len() {
            return Err(CoreError::LineNotFound { index });
        }
        self.lines.remove(index);
        Ok(())
    }

    /// Clears all lines.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.created_at = Utc::now();
    }

    /// Returns the number of lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Serial numbers this cart already consumes for `item_id`.
    ///
    /// Feeds the stock gate: a ledger serial sitting in the cart is not
    /// free anymore, even though the server still reports it in stock.
    pub fn serials_in_cart(&self, item_id: &str) -> HashSet<&str> {
        self.lines
            .iter()
            .filter(|l| l.item_id == item_id)
            .filter_map(|l| l.serial_number.as_deref())
            .collect()
    }

    /// Total quantity of `item_id` already in the cart.
    ///
    /// Skips the line at `exclude_index` when given, so a quantity edit
    /// does not count the line being edited against itself.
    pub fn quantity_in_cart(&self, item_id: &str, exclude_index: Option<usize>) -> i64 {
        self.lines
            .iter()
            .enumerate()
            .filter(|(i, l)| l.item_id == item_id && Some(*i) != exclude_index)
            .map(|(_, l)| l.quantity)
            .sum()
    }

    /// Computes the cart totals from the current lines.
    ///
    /// Always recomputed in full - an incrementally-maintained total can
    /// drift; a recomputed one cannot.
    pub fn totals(&self) -> CartTotals {
        let subtotal = self
            .lines
            .iter()
            .fold(Money::zero(), |acc, l| acc + l.line_total());

        CartTotals {
            line_count: self.lines.len(),
            subtotal,
            // Tax/discount hooks reserved; identity for now.
            total: subtotal,
        }
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PriceTable, QuantityLot, SerialUnit, StockLedger};
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, 5).unwrap()
    }

    fn generic_item(id: &str, price_paise: i64) -> CatalogItem {
        CatalogItem {
            id: id.to_string(),
            name: format!("Item {}", id),
            unit_label: "pcs".into(),
            price_table: Some(PriceTable {
                customer_paise: price_paise,
                dealer_paise: price_paise - 100,
                distributor_paise: price_paise - 200,
            }),
            legacy_sale_price_paise: None,
            stock: StockLedger::Generic {
                lots: vec![QuantityLot {
                    quantity: 100,
                    added_date: date(),
                    remark: None,
                }],
            },
        }
    }

    fn serialized_item(id: &str, serials: &[&str]) -> CatalogItem {
        CatalogItem {
            id: id.to_string(),
            name: format!("Item {}", id),
            unit_label: "pcs".into(),
            price_table: None,
            legacy_sale_price_paise: Some(120_000),
            stock: StockLedger::Serialized {
                units: serials
                    .iter()
                    .map(|s| SerialUnit {
                        serial_number: s.to_string(),
                        added_date: date(),
                        remark: None,
                    })
                    .collect(),
            },
        }
    }

    #[test]
    fn test_add_generic_line() {
        let mut cart = Cart::new();
        let item = generic_item("cable", 999);

        cart.add_line(&item, BuyerTier::Customer, None, 2).unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.totals().subtotal.paise(), 1998);
    }

    #[test]
    fn test_generic_adds_merge_into_one_line() {
        let mut cart = Cart::new();
        let item = generic_item("cable", 999);

        cart.add_line(&item, BuyerTier::Customer, None, 2).unwrap();
        cart.add_line(&item, BuyerTier::Customer, None, 3).unwrap();

        assert_eq!(cart.line_count(), 1); // still one line
        assert_eq!(cart.lines[0].quantity, 5);
    }

    #[test]
    fn test_tier_price_frozen_at_add_time() {
        let mut cart = Cart::new();
        let item = generic_item("cable", 1000);

        cart.add_line(&item, BuyerTier::Dealer, None, 1).unwrap();
        assert_eq!(cart.lines[0].unit_price.paise(), 900); // dealer column

        // Catalog reprice after the add must not touch the line
        let repriced = generic_item("cable", 5000);
        drop(repriced);
        assert_eq!(cart.lines[0].unit_price.paise(), 900);
    }

    #[test]
    fn test_serialized_requires_serial_and_unique() {
        let mut cart = Cart::new();
        let item = serialized_item("onu", &["SN-A", "SN-B"]);

        // Missing serial rejected
        assert!(matches!(
            cart.add_line(&item, BuyerTier::Customer, None, 1),
            Err(CoreError::SerialRequired { .. })
        ));

        cart.add_line(&item, BuyerTier::Customer, Some("SN-A"), 1)
            .unwrap();

        // Same serial twice rejected
        assert!(matches!(
            cart.add_line(&item, BuyerTier::Customer, Some("SN-A"), 1),
            Err(CoreError::DuplicateSerialInCart { .. })
        ));

        // A different serial is a separate line
        cart.add_line(&item, BuyerTier::Customer, Some("SN-B"), 1)
            .unwrap();
        assert_eq!(cart.line_count(), 2);
    }

    #[test]
    fn test_serial_on_generic_rejected() {
        let mut cart = Cart::new();
        let item = generic_item("cable", 999);

        assert!(matches!(
            cart.add_line(&item, BuyerTier::Customer, Some("SN-X"), 1),
            Err(CoreError::SerialNotAllowed { .. })
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_unpriced_item_not_addable() {
        let mut cart = Cart::new();
        let mut item = generic_item("mystery", 0);
        item.price_table = None;
        item.legacy_sale_price_paise = None;

        assert!(matches!(
            cart.add_line(&item, BuyerTier::Customer, None, 1),
            Err(CoreError::ItemNotAddable { .. })
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_and_removal_semantics() {
        let mut cart = Cart::new();
        let item = generic_item("cable", 1000);

        cart.add_line(&item, BuyerTier::Customer, None, 2).unwrap();
        cart.update_quantity(0, 7).unwrap();
        assert_eq!(cart.lines[0].quantity, 7);
        assert_eq!(cart.totals().total.paise(), 7000);

        // Zero (or below) removes the line
        cart.update_quantity(0, 0).unwrap();
        assert!(cart.is_empty());

        assert!(matches!(
            cart.update_quantity(0, 1),
            Err(CoreError::LineNotFound { .. })
        ));
    }

    #[test]
    fn test_serialized_quantity_fixed_at_one() {
        let mut cart = Cart::new();
        let item = serialized_item("onu", &["SN-A"]);

        cart.add_line(&item, BuyerTier::Customer, Some("SN-A"), 1)
            .unwrap();
        assert!(matches!(
            cart.update_quantity(0, 2),
            Err(CoreError::SerializedQuantityFixed)
        ));
        assert_eq!(cart.lines[0].quantity, 1);
    }

    /// Property from the design brief: across any sequence of
    /// add/update/remove, the total always equals the sum of the
    /// current line totals.
    #[test]
    fn test_totals_never_drift() {
        let mut cart = Cart::new();
        let cable = generic_item("cable", 999);
        let onu = serialized_item("onu", &["SN-A", "SN-B"]);

        cart.add_line(&cable, BuyerTier::Customer, None, 2).unwrap();
        cart.add_line(&onu, BuyerTier::Customer, Some("SN-A"), 1).unwrap();
        cart.add_line(&cable, BuyerTier::Customer, None, 4).unwrap();
        cart.update_quantity(0, 3).unwrap();
        cart.add_line(&onu, BuyerTier::Customer, Some("SN-B"), 1).unwrap();
        cart.remove_line(1).unwrap();

        let expected: i64 = cart.lines.iter().map(|l| l.line_total().paise()).sum();
        assert_eq!(cart.totals().subtotal.paise(), expected);
        assert_eq!(cart.totals().total.paise(), expected);
    }

    #[test]
    fn test_serials_and_quantity_helpers() {
        let mut cart = Cart::new();
        let onu = serialized_item("onu", &["SN-A", "SN-B"]);
        let cable = generic_item("cable", 999);

        cart.add_line(&onu, BuyerTier::Customer, Some("SN-A"), 1).unwrap();
        cart.add_line(&cable, BuyerTier::Customer, None, 5).unwrap();

        let serials = cart.serials_in_cart("onu");
        assert!(serials.contains("SN-A"));
        assert_eq!(serials.len(), 1);

        assert_eq!(cart.quantity_in_cart("cable", None), 5);
        assert_eq!(cart.quantity_in_cart("cable", Some(1)), 0);
    }
}
