//! # Cart Session
//!
//! The "select items" step: a cart plus the catalog snapshot it is being
//! built against, with every mutation routed through the stock
//! reconciliation gate first.
//!
//! ## Session Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cart Session                                      │
//! │                                                                         │
//! │  refresh_catalog ──► inventory lookup by type/branch                   │
//! │       │              (also after stock-addition invalidation)          │
//! │       ▼                                                                 │
//! │  add_item / update_quantity / remove_item                              │
//! │       │                                                                 │
//! │       ├── stock gate check ── violation → warning, cart UNTOUCHED      │
//! │       │                                                                 │
//! │       └── cart engine mutation → fresh totals                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  proceed_to_payment ──► cart snapshotted into a PaymentFlow            │
//! │                                                                         │
//! │  Dropping the session at any point is cancellation: the cart is        │
//! │  discarded. In-flight server effects are never cancelled.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::debug;
use uuid::Uuid;

use kirana_core::stock::{available_quantity, check_add, check_serial_free, check_set_quantity};
use kirana_core::{Availability, BuyerTier, Cart, CartTotals, CatalogItem, ItemKind};

use crate::bill::BillRecipient;
use crate::config::BillingConfig;
use crate::error::{BillingError, BillingResult};
use crate::payment::{PaymentFlow, PaymentServices};
use crate::services::InventoryService;

// =============================================================================
// Cart Session
// =============================================================================

/// One billing session on the select-items step.
pub struct CartSession {
    session_id: Uuid,
    tier: BuyerTier,
    cart: Cart,
    catalog: Vec<CatalogItem>,
}

impl CartSession {
    /// Opens a session for a buyer of `tier` with an empty cart and an
    /// empty catalog snapshot.
    pub fn new(tier: BuyerTier) -> Self {
        let session_id = Uuid::new_v4();
        debug!(session_id = %session_id, ?tier, "Billing session opened");
        CartSession {
            session_id,
            tier,
            cart: Cart::new(),
            catalog: Vec::new(),
        }
    }

    // =========================================================================
    // Catalog Snapshot
    // =========================================================================

    /// Refetches the catalog snapshot from the inventory service.
    ///
    /// Call this on entry and again whenever a stock-addition report
    /// invalidates cart availability.
    pub async fn refresh_catalog(
        &mut self,
        inventory: &dyn InventoryService,
        item_type: &str,
        branch_id: &str,
    ) -> BillingResult<&[CatalogItem]> {
        let items = inventory
            .items_by_type(item_type, branch_id)
            .await
            .map_err(|e| BillingError::remote("Inventory lookup", e))?;
        debug!(session_id = %self.session_id, items = items.len(), "Catalog snapshot refreshed");
        self.catalog = items;
        Ok(&self.catalog)
    }

    /// Replaces the catalog snapshot with host-provided items (e.g. from
    /// the host's own list cache).
    pub fn set_catalog(&mut self, items: Vec<CatalogItem>) {
        self.catalog = items;
    }

    pub fn catalog(&self) -> &[CatalogItem] {
        &self.catalog
    }

    /// Availability of an item for display next to the picker, net of the
    /// current cart.
    pub fn item_availability(&self, item_id: &str) -> BillingResult<Availability> {
        let item = self
            .catalog
            .iter()
            .find(|i| i.id == item_id)
            .ok_or_else(|| BillingError::ItemNotFound(item_id.to_string()))?;
        Ok(available_quantity(item, &self.cart))
    }

    // =========================================================================
    // Cart Mutations (gate first, engine second)
    // =========================================================================

    /// Adds an item to the cart after the stock gate clears it.
    ///
    /// A gate violation comes back as the typed warning and leaves the
    /// cart untouched.
    pub fn add_item(
        &mut self,
        item_id: &str,
        serial_number: Option<&str>,
        quantity: i64,
    ) -> BillingResult<CartTotals> {
        let item = self
            .catalog
            .iter()
            .find(|i| i.id == item_id)
            .ok_or_else(|| BillingError::ItemNotFound(item_id.to_string()))?;

        match (item.kind(), serial_number) {
            (ItemKind::Serialized, Some(serial)) => {
                check_serial_free(item, serial.trim(), &self.cart)?
            }
            // Missing serial for a serialized item falls through to the
            // engine, which names the violation precisely.
            (ItemKind::Serialized, None) => {}
            _ => check_add(item, quantity, &self.cart)?,
        }

        self.cart.add_line(item, self.tier, serial_number, quantity)?;
        Ok(self.cart.totals())
    }

    /// Changes a line's quantity; increases re-validate against the gate
    /// before the engine applies them.
    pub fn update_quantity(&mut self, index: usize, new_quantity: i64) -> BillingResult<CartTotals> {
        let line = self
            .cart
            .lines
            .get(index)
            .ok_or(kirana_core::CoreError::LineNotFound { index })?;

        if new_quantity > line.quantity {
            let item = self
                .catalog
                .iter()
                .find(|i| i.id == line.item_id)
                .ok_or_else(|| BillingError::ItemNotFound(line.item_id.clone()))?;
            check_set_quantity(item, index, new_quantity, &self.cart)?;
        }

        self.cart.update_quantity(index, new_quantity)?;
        Ok(self.cart.totals())
    }

    /// Removes a line. Never gated - freeing stock cannot violate it.
    pub fn remove_item(&mut self, index: usize) -> BillingResult<CartTotals> {
        self.cart.remove_line(index)?;
        Ok(self.cart.totals())
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn totals(&self) -> CartTotals {
        self.cart.totals()
    }

    // =========================================================================
    // Handover to Payment
    // =========================================================================

    /// Leaves the select-items step: the cart is snapshotted into a
    /// [`PaymentFlow`] and this session is consumed.
    pub fn proceed_to_payment(
        self,
        recipient: BillRecipient,
        notes: Option<String>,
        config: BillingConfig,
        services: PaymentServices,
    ) -> BillingResult<PaymentFlow> {
        debug!(session_id = %self.session_id, total = %self.cart.totals().total, "Proceeding to payment");
        PaymentFlow::new(self.cart, recipient, notes, config, services)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use kirana_core::types::{PriceTable, QuantityLot, SerialUnit, StockLedger};
    use kirana_core::CoreError;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, 5).unwrap()
    }

    fn catalog() -> Vec<CatalogItem> {
        vec![
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
                    lots: vec![
                        QuantityLot {
                            quantity: 5,
                            added_date: date(),
                            remark: None,
                        },
                        QuantityLot {
                            quantity: 3,
                            added_date: date(),
                            remark: None,
                        },
                    ],
                },
            },
            CatalogItem {
                id: "onu".into(),
                name: "ONU Router".into(),
                unit_label: "pcs".into(),
                price_table: None,
                legacy_sale_price_paise: Some(120_000),
                stock: StockLedger::Serialized {
                    units: vec![SerialUnit {
                        serial_number: "SN-A".into(),
                        added_date: date(),
                        remark: None,
                    }],
                },
            },
        ]
    }

    fn session() -> CartSession {
        let mut session = CartSession::new(BuyerTier::Customer);
        session.set_catalog(catalog());
        session
    }

    #[test]
    fn test_add_item_through_gate() {
        let mut session = session();

        let totals = session.add_item("cable", None, 3).unwrap();
        assert_eq!(totals.total.paise(), 7500);

        // 8 on hand, 3 carted: 5 remain
        assert_eq!(
            session.item_availability("cable").unwrap(),
            Availability::Limited(5)
        );
    }

    #[test]
    fn test_gate_violation_leaves_cart_untouched() {
        let mut session = session();
        session.add_item("cable", None, 3).unwrap();

        let err = session.add_item("cable", None, 6).unwrap_err();
        assert!(err.is_availability());

        // The failed add changed nothing
        assert_eq!(session.cart().lines.len(), 1);
        assert_eq!(session.cart().lines[0].quantity, 3);
    }

    #[test]
    fn test_serialized_add_checks_serial() {
        let mut session = session();

        assert!(matches!(
            session.add_item("onu", Some("SN-MISSING"), 1).unwrap_err(),
            BillingError::Core(CoreError::SerialNotInStock { .. })
        ));

        session.add_item("onu", Some("SN-A"), 1).unwrap();

        // The only serial is now consumed by the cart
        assert!(matches!(
            session.add_item("onu", Some("SN-A"), 1).unwrap_err(),
            BillingError::Core(CoreError::DuplicateSerialInCart { .. })
        ));
        assert_eq!(
            session.item_availability("onu").unwrap(),
            Availability::Limited(0)
        );
    }

    #[test]
    fn test_missing_serial_reported_by_engine() {
        let mut session = session();
        assert!(matches!(
            session.add_item("onu", None, 1).unwrap_err(),
            BillingError::Core(CoreError::SerialRequired { .. })
        ));
    }

    #[test]
    fn test_quantity_increase_revalidates() {
        let mut session = session();
        session.add_item("cable", None, 3).unwrap();

        // 3 → 8 is exactly the stock on hand
        session.update_quantity(0, 8).unwrap();

        let err = session.update_quantity(0, 9).unwrap_err();
        assert!(err.is_availability());
        assert_eq!(session.cart().lines[0].quantity, 8);

        // Decreases are never gated
        session.update_quantity(0, 1).unwrap();
        assert_eq!(session.cart().lines[0].quantity, 1);
    }

    #[test]
    fn test_unknown_item_rejected() {
        let mut session = session();
        assert!(matches!(
            session.add_item("ghost", None, 1).unwrap_err(),
            BillingError::ItemNotFound(_)
        ));
    }

    #[test]
    fn test_remove_and_totals() {
        let mut session = session();
        session.add_item("cable", None, 2).unwrap();
        session.add_item("onu", Some("SN-A"), 1).unwrap();

        let totals = session.remove_item(0).unwrap();
        assert_eq!(totals.line_count, 1);
        assert_eq!(totals.total.paise(), 120_000);
    }
}
