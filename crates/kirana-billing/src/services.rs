//! # Service Contracts
//!
//! The external collaborators this core consumes, as opaque
//! request/response contracts. The exact wire format is owned by the
//! surrounding application; these traits pin down only the shape this
//! core depends on.
//!
//! ## Contract Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Service Contracts                                  │
//! │                                                                         │
//! │  InventoryService        items by type/branch, serial lookup,          │
//! │                          stock-addition writes                          │
//! │                                                                         │
//! │  BillingApi              bill creation (generic sales bill and         │
//! │                          customer-specific bill)                        │
//! │                                                                         │
//! │  BankDirectory           receiving bank accounts                        │
//! │                                                                         │
//! │  SettlementGateway       UPI QR generation for a bill id + amount      │
//! │                                                                         │
//! │  All methods are async and return Result<_, RemoteError>.              │
//! │  The host implements these over HTTP/IPC/whatever it already uses.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why `async_trait`?
//! The orchestration types hold these as `Arc<dyn Trait>` so tests can
//! substitute in-memory fakes and the host can swap transports freely.
//! Native `async fn` in traits is not dyn-compatible, so the contracts use
//! the `async_trait` macro.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use kirana_core::{BankAccount, Bill, CatalogItem, Money};

use crate::bill::BillPayload;

// =============================================================================
// Remote Error
// =============================================================================

/// Failure of a single service call.
///
/// Carries the server-provided message when one was available. The
/// operation is abandoned at the point of failure; side effects already
/// applied server-side persist (no rollback).
#[derive(Debug, Clone, Error)]
#[error("{}", self.user_message())]
pub struct RemoteError {
    message: Option<String>,
}

impl RemoteError {
    /// A failure with server-provided text.
    pub fn server(message: impl Into<String>) -> Self {
        RemoteError {
            message: Some(message.into()),
        }
    }

    /// A failure with no usable server text (network down, timeout).
    pub fn unreachable() -> Self {
        RemoteError { message: None }
    }

    /// The text to surface to the operator: server text when available,
    /// a generic fallback otherwise.
    pub fn user_message(&self) -> &str {
        self.message
            .as_deref()
            .unwrap_or("The server could not be reached. Please try again.")
    }
}

// =============================================================================
// Serial Lookup
// =============================================================================

/// Result of checking a serial number across the inventory, billing and
/// technician-assignment systems.
///
/// A serial is free to add only when it is [`SerialLookup::Unused`] -
/// unused across all three systems.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SerialLookup {
    /// Unknown everywhere; free to add.
    Unused,
    /// Currently assigned to a field technician.
    #[serde(rename_all = "camelCase")]
    AssignedToTechnician { technician_name: String },
    /// Already sold on a bill.
    #[serde(rename_all = "camelCase")]
    UsedInBill { billed_to: String },
    /// Already sitting in inventory under some item.
    #[serde(rename_all = "camelCase")]
    InInventory { item_id: String, item_name: String },
}

// =============================================================================
// Stock Addition Wire Types
// =============================================================================

/// The unit being added: one serial, or a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StockEntryPayload {
    #[serde(rename_all = "camelCase")]
    Serial { serial_number: String },
    Quantity { quantity: i64 },
}

/// One stock-addition call to the inventory service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockAdditionRequest {
    pub item_id: String,
    pub entry: StockEntryPayload,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub remark: Option<String>,
}

/// The inventory service's answer to a stock-addition call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockWriteAck {
    pub success: bool,
    pub message: Option<String>,
}

// =============================================================================
// QR Settlement Wire Type
// =============================================================================

/// Settlement metadata returned by QR generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct QrSettlement {
    /// The raw `upi://pay?...` link encoded in the QR.
    pub upi_url: String,
    /// Merchant UPI identifier shown next to the code.
    pub merchant_upi_id: Option<String>,
    /// Gateway-side reference for the settlement request.
    pub reference: Option<String>,
}

// =============================================================================
// Service Traits
// =============================================================================

/// Inventory lookups and stock-addition writes.
#[async_trait]
pub trait InventoryService: Send + Sync {
    /// Lists catalog items of `item_type` stocked at `branch_id`.
    async fn items_by_type(
        &self,
        item_type: &str,
        branch_id: &str,
    ) -> Result<Vec<CatalogItem>, RemoteError>;

    /// Checks whether a serial number is known to inventory, billing or
    /// technician assignment.
    async fn lookup_serial(&self, serial_number: &str) -> Result<SerialLookup, RemoteError>;

    /// Persists one stock-addition entry.
    ///
    /// Called only by the stock addition protocol's confirm phase - no
    /// entry reaches this endpoint without passing the confirmation gate.
    async fn add_stock(&self, request: &StockAdditionRequest) -> Result<StockWriteAck, RemoteError>;
}

/// Bill creation, in its two variants.
#[async_trait]
pub trait BillingApi: Send + Sync {
    /// Creates a generic sales bill (walk-in party).
    async fn create_sales_bill(&self, payload: &BillPayload) -> Result<Bill, RemoteError>;

    /// Creates a bill against a known customer.
    async fn create_customer_bill(
        &self,
        customer_id: &str,
        customer_type: &str,
        payload: &BillPayload,
    ) -> Result<Bill, RemoteError>;
}

/// Receiving bank accounts for UPI settlement.
#[async_trait]
pub trait BankDirectory: Send + Sync {
    async fn receiving_accounts(&self) -> Result<Vec<BankAccount>, RemoteError>;
}

/// UPI QR generation for a bill id and amount.
#[async_trait]
pub trait SettlementGateway: Send + Sync {
    async fn generate_qr(&self, bill_id: &str, amount: Money) -> Result<QrSettlement, RemoteError>;
}

// =============================================================================
// Unit Tests
// =============================================================================
