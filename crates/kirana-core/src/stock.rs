//! # Stock Reconciliation Gate
//!
//! Reconciles a proposed cart mutation against the stock the inventory
//! service last reported.
//!
//! ## Gate Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Stock Reconciliation Gate                               │
//! │                                                                         │
//! │  Operator picks item/quantity                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  check_add(item, qty, cart) ← THIS MODULE                              │
//! │       │                                                                 │
//! │       ├── serialized → a free serial left? (ledger minus cart)         │
//! │       ├── generic    → qty ≤ lots total minus cart quantity            │
//! │       └── service    → always available                                │
//! │       │                                                                 │
//! │       ├── Ok  → Cart Engine mutation proceeds                          │
//! │       └── Err → warning shown inline, cart untouched                   │
//! │                                                                         │
//! │  Violations are REPORTED, never thrown: the typed error is the         │
//! │  user-facing warning, and no partial state is ever mutated.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Accounting Model
//! Availability is computed from the server-reported ledger minus what the
//! current cart already holds (serials consumed by cart lines; generic
//! quantity already carted). The server is not re-queried per add; a fresh
//! ledger arrives whenever the item list is refetched.

use crate::cart::Cart;
use crate::error::{CoreError, CoreResult};
use crate::types::{CatalogItem, StockLedger};

// =============================================================================
// Availability
// =============================================================================

/// How much of an item can still be added to the current cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// At most this many more units.
    Limited(i64),
    /// Not stock-constrained (service items).
    Unlimited,
}

impl Availability {
    /// True when at least `requested` more units fit.
    pub fn accommodates(&self, requested: i64) -> bool {
        match self {
            Availability::Limited(n) => requested <= *n,
            Availability::Unlimited => true,
        }
    }
}

// =============================================================================
// Gate Queries
// =============================================================================

/// Current available quantity of `item`, net of the cart's holdings.
///
/// - Serialized: count of ledger serials not already consumed by a cart line
/// - Generic: sum of quantity lots minus quantity already in the cart
/// - Service: unconstrained
pub fn available_quantity(item: &CatalogItem, cart: &Cart) -> Availability {
    match &item.stock {
        StockLedger::Serialized { units } => {
            let consumed = cart.serials_in_cart(&item.id);
            let free = units
                .iter()
                .filter(|u| !consumed.contains(u.serial_number.as_str()))
                .count() as i64;
            Availability::Limited(free)
        }
        StockLedger::Generic { lots } => {
            let on_hand: i64 = lots.iter().map(|l| l.quantity).sum();
            let carted = cart.quantity_in_cart(&item.id, None);
            Availability::Limited((on_hand - carted).max(0))
        }
        StockLedger::Service => Availability::Unlimited,
    }
}

/// Serial numbers of `item` still free for this cart, in ledger order.
pub fn free_serials<'a>(item: &'a CatalogItem, cart: &Cart) -> Vec<&'a str> {
    match &item.stock {
        StockLedger::Serialized { units } => {
            let consumed = cart.serials_in_cart(&item.id);
            units
                .iter()
                .map(|u| u.serial_number.as_str())
                .filter(|s| !consumed.contains(s))
                .collect()
        }
        StockLedger::Generic { .. } | StockLedger::Service => Vec::new(),
    }
}

// =============================================================================
// Gate Checks
// =============================================================================

/// Validates a proposed add of `requested` units against available stock.
///
/// For serialized items `requested` is always 1 - the question is whether
/// any free serial remains. The error is the user-facing warning; the cart
/// has not been touched when it comes back.
pub fn check_add(item: &CatalogItem, requested: i64, cart: &Cart) -> CoreResult<()> {
    match &item.stock {
        StockLedger::Service => Ok(()),

        StockLedger::Serialized { .. } => {
            if free_serials(item, cart).is_empty() {
                Err(CoreError::NoFreeSerial {
                    item_name: item.name.clone(),
                })
            } else {
                Ok(())
            }
        }

        StockLedger::Generic { lots } => {
            let on_hand: i64 = lots.iter().map(|l| l.quantity).sum();
            let carted = cart.quantity_in_cart(&item.id, None);
            let available = (on_hand - carted).max(0);
            if requested <= available {
                Ok(())
            } else {
                Err(CoreError::InsufficientStock {
                    item_name: item.name.clone(),
                    available,
                    requested,
                })
            }
        }
    }
}

/// Validates that a specific serial is free: present in the item's ledger
/// and not already consumed by the cart.
pub fn check_serial_free(item: &CatalogItem, serial: &str, cart: &Cart) -> CoreResult<()> {
    match &item.stock {
        StockLedger::Serialized { units } => {
            if !units.iter().any(|u| u.serial_number == serial) {
                return Err(CoreError::SerialNotInStock {
                    item_name: item.name.clone(),
                    serial: serial.to_string(),
                });
            }
            if cart.serials_in_cart(&item.id).contains(serial) {
                return Err(CoreError::DuplicateSerialInCart {
                    serial: serial.to_string(),
                });
            }
            Ok(())
        }
        StockLedger::Generic { .. } | StockLedger::Service => Err(CoreError::SerialNotAllowed {
            item_name: item.name.clone(),
        }),
    }
}

/// Validates setting an existing line's quantity to `new_quantity`.
///
/// The line being edited is excluded from the consumed count, so raising
/// 3 → 5 against 8 on hand passes even though 5 + 3 would not.
pub fn check_set_quantity(
    item: &CatalogItem,
    line_index: usize,
    new_quantity: i64,
    cart: &Cart,
) -> CoreResult<()> {
    match &item.stock {
        StockLedger::Service => Ok(()),

        // A serialized line never changes quantity; nothing to reconcile.
        StockLedger::Serialized { .. } => Ok(()),

        StockLedger::Generic { lots } => {
            let on_hand: i64 = lots.iter().map(|l| l.quantity).sum();
            let carted_elsewhere = cart.quantity_in_cart(&item.id, Some(line_index));
            let available = (on_hand - carted_elsewhere).max(0);
            if new_quantity <= available {
                Ok(())
            } else {
                Err(CoreError::InsufficientStock {
                    item_name: item.name.clone(),
                    available,
                    requested: new_quantity,
                })
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BuyerTier, PriceTable, QuantityLot, SerialUnit};
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, 5).unwrap()
    }

    fn generic_item(lots: &[i64]) -> CatalogItem {
        CatalogItem {
            id: "cable".into(),
            name: "CAT6 Cable".into(),
            unit_label: "mtr".into(),
            price_table: Some(PriceTable {
                customer_paise: 2500,
                dealer_paise: 2200,
                distributor_paise: 2000,
            }),
            legacy_sale_price_paise: None,
            stock: StockLedger::Generic {
                lots: lots
                    .iter()
                    .map(|&q| QuantityLot {
                        quantity: q,
                        added_date: date(),
                        remark: None,
                    })
                    .collect(),
            },
        }
    }

    fn serialized_item(serials: &[&str]) -> CatalogItem {
        CatalogItem {
            id: "onu".into(),
            name: "ONU Router".into(),
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

    fn service_item() -> CatalogItem {
        CatalogItem {
            id: "install".into(),
            name: "Installation Visit".into(),
            unit_label: "visit".into(),
            price_table: None,
            legacy_sale_price_paise: Some(50_000),
            stock: StockLedger::Service,
        }
    }

    #[test]
    fn test_generic_availability_sums_lots() {
        let item = generic_item(&[5, 3]);
        let cart = Cart::new();

        assert_eq!(available_quantity(&item, &cart), Availability::Limited(8));
    }

    #[test]
    fn test_generic_availability_nets_out_cart() {
        let item = generic_item(&[5, 3]);
        let mut cart = Cart::new();
        cart.add_line(&item, BuyerTier::Customer, None, 3).unwrap();

        // 8 on hand, 3 already carted: 5 remain
        assert_eq!(available_quantity(&item, &cart), Availability::Limited(5));
        assert!(check_add(&item, 5, &cart).is_ok());
        assert!(matches!(
            check_add(&item, 6, &cart),
            Err(CoreError::InsufficientStock {
                available: 5,
                requested: 6,
                ..
            })
        ));
    }

    #[test]
    fn test_serialized_availability_excludes_carted_serials() {
        let item = serialized_item(&["SN-A", "SN-B"]);
        let mut cart = Cart::new();

        assert_eq!(available_quantity(&item, &cart), Availability::Limited(2));

        cart.add_line(&item, BuyerTier::Customer, Some("SN-A"), 1)
            .unwrap();
        assert_eq!(available_quantity(&item, &cart), Availability::Limited(1));
        assert_eq!(free_serials(&item, &cart), vec!["SN-B"]);

        cart.add_line(&item, BuyerTier::Customer, Some("SN-B"), 1)
            .unwrap();
        assert!(matches!(
            check_add(&item, 1, &cart),
            Err(CoreError::NoFreeSerial { .. })
        ));
    }

    #[test]
    fn test_check_serial_free() {
        let item = serialized_item(&["SN-A"]);
        let mut cart = Cart::new();

        assert!(check_serial_free(&item, "SN-A", &cart).is_ok());
        assert!(matches!(
            check_serial_free(&item, "SN-X", &cart),
            Err(CoreError::SerialNotInStock { .. })
        ));

        cart.add_line(&item, BuyerTier::Customer, Some("SN-A"), 1)
            .unwrap();
        assert!(matches!(
            check_serial_free(&item, "SN-A", &cart),
            Err(CoreError::DuplicateSerialInCart { .. })
        ));
    }

    #[test]
    fn test_service_items_always_available() {
        let item = service_item();
        let cart = Cart::new();

        assert_eq!(available_quantity(&item, &cart), Availability::Unlimited);
        assert!(check_add(&item, 1_000_000, &cart).is_ok());
    }

    #[test]
    fn test_set_quantity_excludes_own_line() {
        let item = generic_item(&[5, 3]);
        let mut cart = Cart::new();
        cart.add_line(&item, BuyerTier::Customer, None, 3).unwrap();

        // Raising the same line 3 → 8 is fine (8 on hand, nothing else carted)
        assert!(check_set_quantity(&item, 0, 8, &cart).is_ok());
        assert!(matches!(
            check_set_quantity(&item, 0, 9, &cart),
            Err(CoreError::InsufficientStock { available: 8, .. })
        ));
    }
}
