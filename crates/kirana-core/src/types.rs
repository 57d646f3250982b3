//! # Domain Types
//!
//! Core domain types used throughout Kirana POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  CatalogItem    │   │      Bill       │   │  BankAccount    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  bill_number    │   │  bank_name      │       │
//! │  │  price_table    │   │  total/paid/due │   │  upi_id         │       │
//! │  │  stock (ledger) │   │  status         │   │  is_primary     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   ItemKind      │   │ PaymentMethod   │   │ PaymentStatus   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Serialized     │   │  Cash           │   │  Completed      │       │
//! │  │  Generic        │   │  Upi            │   │  Partial        │       │
//! │  │  Service        │   │  BankTransfer   │   │  Pending        │       │
//! │  └─────────────────┘   │  Cheque         │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Item Kind as a Sum Type
//! Serialized vs generic vs service dispatch recurs across the cart engine,
//! the stock gate and the stock addition protocol. The kind lives in the
//! `StockLedger` enum so a new kind cannot silently fall through a match,
//! and the kind can never disagree with the shape of the stock records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Buyer Tier
// =============================================================================

/// Classification of the buying party, determining which price column applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BuyerTier {
    /// Retail customer - pays the customer price.
    Customer,
    /// Dealer - pays the dealer price.
    Dealer,
    /// Distributor - pays the distributor price.
    Distributor,
}

// =============================================================================
// Item Kind
// =============================================================================

/// How an item's stock is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Each unit tracked individually by a unique serial number.
    /// Quantity is always 1 per cart line.
    Serialized,
    /// Units tracked only by aggregate quantity.
    Generic,
    /// Not stock-tracked at all (installation charges, visits, etc.).
    Service,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKind::Serialized => write!(f, "serialized"),
            ItemKind::Generic => write!(f, "generic"),
            ItemKind::Service => write!(f, "service"),
        }
    }
}

// =============================================================================
// Price Table
// =============================================================================

/// Per-tier price columns, in paise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceTable {
    /// Price charged to retail customers.
    pub customer_paise: i64,
    /// Price charged to dealers.
    pub dealer_paise: i64,
    /// Price charged to distributors.
    pub distributor_paise: i64,
}

impl PriceTable {
    /// Returns the price column for the given tier.
    pub fn for_tier(&self, tier: BuyerTier) -> Money {
        match tier {
            BuyerTier::Customer => Money::from_paise(self.customer_paise),
            BuyerTier::Dealer => Money::from_paise(self.dealer_paise),
            BuyerTier::Distributor => Money::from_paise(self.distributor_paise),
        }
    }
}

// =============================================================================
// Stock Records
// =============================================================================

/// One individually-tracked unit in a serialized item's ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SerialUnit {
    /// The unit's unique serial number.
    pub serial_number: String,
    /// The date the unit was added to stock.
    #[ts(as = "String")]
    pub added_date: NaiveDate,
    /// Free-text remark recorded at addition time.
    pub remark: Option<String>,
}

/// One quantity record in a generic item's ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct QuantityLot {
    /// Units added by this record.
    pub quantity: i64,
    /// The date the stock was added.
    #[ts(as = "String")]
    pub added_date: NaiveDate,
    /// Free-text remark recorded at addition time.
    pub remark: Option<String>,
}

/// An item's stock records, tagged by tracking kind.
///
/// ## Why an Enum?
/// A serialized item can only carry serial units and a generic item can
/// only carry quantity lots. Keeping both lists on one struct would let
/// them drift; the enum makes the illegal states unrepresentable and
/// forces exhaustive matching wherever kind matters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StockLedger {
    /// Individually-tracked units.
    Serialized { units: Vec<SerialUnit> },
    /// Aggregate quantity records.
    Generic { lots: Vec<QuantityLot> },
    /// No stock tracking - always available.
    Service,
}

// =============================================================================
// Catalog Item
// =============================================================================

/// A sellable inventory entry.
///
/// Owned by the inventory service; read-only to this core except through
/// the stock addition protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    /// Unique identifier assigned by the inventory service.
    pub id: String,

    /// Display name shown to the operator and on the bill.
    pub name: String,

    /// Unit label for display ("pcs", "mtr", "roll").
    pub unit_label: String,

    /// Per-tier pricing, when the item carries a price table.
    pub price_table: Option<PriceTable>,

    /// Legacy flat sale price in paise, used when no price table exists.
    pub legacy_sale_price_paise: Option<i64>,

    /// Stock records, tagged by tracking kind.
    pub stock: StockLedger,
}

impl CatalogItem {
    /// Returns the item's tracking kind, derived from its stock ledger.
    pub fn kind(&self) -> ItemKind {
        match self.stock {
            StockLedger::Serialized { .. } => ItemKind::Serialized,
            StockLedger::Generic { .. } => ItemKind::Generic,
            StockLedger::Service => ItemKind::Service,
        }
    }
}

// =============================================================================
// Bank Account
// =============================================================================

/// A receiving bank account, as listed by the bank directory service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    pub bank_name: String,
    pub account_holder_name: String,
    pub account_number: String,
    /// UPI virtual payment address, when the account accepts UPI.
    pub upi_id: Option<String>,
    /// Marks the preferred receiving account; auto-preselected for UPI.
    pub is_primary: bool,
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a bill is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash, full or partial.
    Cash,
    /// UPI settlement against a receiving account (full payment only).
    Upi,
    /// NEFT/RTGS/IMPS transfer, identified by UTR number.
    BankTransfer,
    /// Cheque, identified by cheque number.
    Cheque,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Upi => write!(f, "upi"),
            PaymentMethod::BankTransfer => write!(f, "bank_transfer"),
            PaymentMethod::Cheque => write!(f, "cheque"),
        }
    }
}

// =============================================================================
// Payment Status
// =============================================================================

/// Settlement state of a bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Paid in full.
    Completed,
    /// Partially paid, remainder due.
    Partial,
    /// Nothing paid yet.
    Pending,
}

impl PaymentStatus {
    /// Resolves the status from the billed total and the amount paid.
    ///
    /// ## Resolution Rules
    /// ```text
    /// paid ≥ total          → Completed
    /// paid = 0, total > 0   → Pending
    /// otherwise             → Partial
    /// ```
    pub fn from_amounts(total: Money, paid: Money) -> Self {
        if paid >= total {
            PaymentStatus::Completed
        } else if paid.is_zero() {
            PaymentStatus::Pending
        } else {
            PaymentStatus::Partial
        }
    }
}

// =============================================================================
// Payment Proof
// =============================================================================

/// Method-specific proof-of-payment fields, tagged by method.
///
/// Matching on this enum is how bill assembly guarantees that cheque
/// details never ride along on a cash payment and vice versa.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PaymentProof {
    /// Cash needs no proof beyond the amount itself.
    Cash,
    /// UPI reference, captured after the customer completes the transfer.
    #[serde(rename_all = "camelCase")]
    Upi {
        /// UPI transaction id; absent until the QR has been settled.
        transaction_id: Option<String>,
    },
    /// Bank transfer reference.
    #[serde(rename_all = "camelCase")]
    BankTransfer {
        /// Unique Transaction Reference from the receiving bank.
        utr_number: String,
        /// Amount actually credited; bank fees can make this less than
        /// the amount the buyer paid.
        received_paise: i64,
    },
    /// Cheque reference.
    #[serde(rename_all = "camelCase")]
    Cheque {
        cheque_number: String,
        /// Face value of the cheque.
        cheque_paise: i64,
    },
}

impl PaymentProof {
    /// The payment method this proof belongs to.
    pub fn method(&self) -> PaymentMethod {
        match self {
            PaymentProof::Cash => PaymentMethod::Cash,
            PaymentProof::Upi { .. } => PaymentMethod::Upi,
            PaymentProof::BankTransfer { .. } => PaymentMethod::BankTransfer,
            PaymentProof::Cheque { .. } => PaymentMethod::Cheque,
        }
    }
}

// =============================================================================
// Bill
// =============================================================================

/// One line item on a bill.
/// Uses snapshot pattern to freeze item data at billing time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BillLine {
    pub item_id: String,
    /// Item name at billing time (frozen).
    pub item_name: String,
    /// Serial number for serialized items.
    pub serial_number: Option<String>,
    pub quantity: i64,
    /// Unit price in paise at billing time (frozen).
    pub unit_price_paise: i64,
    /// unit_price × quantity.
    pub line_total_paise: i64,
}

impl BillLine {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_paise(self.unit_price_paise)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_paise(self.line_total_paise)
    }
}

/// A settled or partially-settled bill.
///
/// Created exactly once per successful bill submission; immutable
/// thereafter from this core's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    /// Server-assigned identifier, used for QR settlement sessions.
    pub id: String,
    /// Server-assigned human-readable bill number.
    pub bill_number: String,
    pub total_paise: i64,
    pub paid_paise: i64,
    pub due_paise: i64,
    pub payment_status: PaymentStatus,
    pub lines: Vec<BillLine>,
    pub payment_method: PaymentMethod,
    pub proof: PaymentProof,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Bill {
    /// Returns the bill total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_paise(self.total_paise)
    }

    /// Returns the amount paid as Money.
    #[inline]
    pub fn paid(&self) -> Money {
        Money::from_paise(self.paid_paise)
    }

    /// Returns the amount still due as Money.
    #[inline]
    pub fn due(&self) -> Money {
        Money::from_paise(self.due_paise)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_table_for_tier() {
        let table = PriceTable {
            customer_paise: 1000,
            dealer_paise: 900,
            distributor_paise: 800,
        };
        assert_eq!(table.for_tier(BuyerTier::Customer).paise(), 1000);
        assert_eq!(table.for_tier(BuyerTier::Dealer).paise(), 900);
        assert_eq!(table.for_tier(BuyerTier::Distributor).paise(), 800);
    }

    #[test]
    fn test_item_kind_from_ledger() {
        let serialized = StockLedger::Serialized { units: vec![] };
        let generic = StockLedger::Generic { lots: vec![] };

        let item = CatalogItem {
            id: "item-1".into(),
            name: "ONU Router".into(),
            unit_label: "pcs".into(),
            price_table: None,
            legacy_sale_price_paise: Some(120_000),
            stock: serialized,
        };
        assert_eq!(item.kind(), ItemKind::Serialized);

        let item = CatalogItem { stock: generic, ..item };
        assert_eq!(item.kind(), ItemKind::Generic);

        let item = CatalogItem {
            stock: StockLedger::Service,
            ..item
        };
        assert_eq!(item.kind(), ItemKind::Service);
    }

    #[test]
    fn test_payment_status_resolution() {
        let total = Money::from_paise(100_000);

        assert_eq!(
            PaymentStatus::from_amounts(total, Money::from_paise(100_000)),
            PaymentStatus::Completed
        );
        assert_eq!(
            PaymentStatus::from_amounts(total, Money::from_paise(60_000)),
            PaymentStatus::Partial
        );
        assert_eq!(
            PaymentStatus::from_amounts(total, Money::zero()),
            PaymentStatus::Pending
        );

        // Overpayment is still completed
        assert_eq!(
            PaymentStatus::from_amounts(total, Money::from_paise(150_000)),
            PaymentStatus::Completed
        );
    }

    #[test]
    fn test_proof_method_agreement() {
        let proof = PaymentProof::BankTransfer {
            utr_number: "UTR123456789012".into(),
            received_paise: 98_000,
        };
        assert_eq!(proof.method(), PaymentMethod::BankTransfer);

        let proof = PaymentProof::Upi { transaction_id: None };
        assert_eq!(proof.method(), PaymentMethod::Upi);
    }
}
