//! # Bill Assembler
//!
//! Converts the committed cart into a bill submission payload and invokes
//! bill creation.
//!
//! ## Assembly Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Bill Assembly                                      │
//! │                                                                         │
//! │  Cart (snapshotted on leaving the select-items step)                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  build_payload ──► items[{itemId, quantity, serialNumber?}]            │
//! │                    + paymentMethod + paidAmount + receivedAmount       │
//! │                    + method-specific proof + notes                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BillAssembler::submit ──► ONE network call                            │
//! │       │                                                                 │
//! │       ├── Ok(Bill)  → immutable bill record                            │
//! │       └── Err       → server message surfaced; cart and payment        │
//! │                       session untouched, operator retries or           │
//! │                       switches method                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ts_rs::TS;

use kirana_core::{Bill, Cart, Money, PaymentMethod, PaymentProof};

use crate::error::{BillingError, BillingResult};
use crate::services::BillingApi;

// =============================================================================
// Payload Types
// =============================================================================

/// Who the bill is raised against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BillRecipient {
    /// Generic sales bill with no customer record.
    WalkIn,
    /// Bill against a known customer.
    #[serde(rename_all = "camelCase")]
    Customer {
        customer_id: String,
        customer_type: String,
    },
}

/// One cart line, reduced to what bill creation needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BillItemPayload {
    pub item_id: String,
    pub quantity: i64,
    pub serial_number: Option<String>,
}

/// The bill submission payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BillPayload {
    pub items: Vec<BillItemPayload>,
    pub payment_method: PaymentMethod,
    /// Amount the buyer paid, in paise.
    pub paid_paise: i64,
    /// Amount actually credited, in paise. Differs from `paid_paise` for
    /// bank transfers, where bank fees can reduce the credited amount.
    pub received_paise: i64,
    /// Method-specific proof fields.
    pub proof: PaymentProof,
    /// Free-text notes for the bill.
    pub notes: Option<String>,
}

/// Maps the cart into a submission payload.
///
/// The cart itself is not consumed - it stays intact so a failed
/// submission can be retried without re-entering the select-items step.
pub fn build_payload(
    cart: &Cart,
    payment_method: PaymentMethod,
    paid: Money,
    received: Money,
    proof: PaymentProof,
    notes: Option<String>,
) -> BillingResult<BillPayload> {
    if cart.is_empty() {
        return Err(BillingError::EmptyCart);
    }

    Ok(BillPayload {
        items: cart
            .lines
            .iter()
            .map(|line| BillItemPayload {
                item_id: line.item_id.clone(),
                quantity: line.quantity,
                serial_number: line.serial_number.clone(),
            })
            .collect(),
        payment_method,
        paid_paise: paid.paise(),
        received_paise: received.paise(),
        proof,
        notes,
    })
}

// =============================================================================
// Bill Assembler
// =============================================================================

/// Submits bill payloads through the billing API.
#[derive(Clone)]
pub struct BillAssembler {
    api: Arc<dyn BillingApi>,
}

impl BillAssembler {
    pub fn new(api: Arc<dyn BillingApi>) -> Self {
        BillAssembler { api }
    }

    /// Creates the bill: exactly one network call, routed by recipient.
    ///
    /// On failure the server-provided message is surfaced and nothing else
    /// changes; the operation is retryable as-is.
    pub async fn submit(
        &self,
        recipient: &BillRecipient,
        payload: &BillPayload,
    ) -> BillingResult<Bill> {
        let result = match recipient {
            BillRecipient::WalkIn => self.api.create_sales_bill(payload).await,
            BillRecipient::Customer {
                customer_id,
                customer_type,
            } => {
                self.api
                    .create_customer_bill(customer_id, customer_type, payload)
                    .await
            }
        };

        match result {
            Ok(bill) => {
                info!(
                    bill_number = %bill.bill_number,
                    total = %bill.total(),
                    paid = %bill.paid(),
                    status = ?bill.payment_status,
                    "Bill created"
                );
                Ok(bill)
            }
            Err(err) => {
                warn!(message = %err.user_message(), "Bill creation failed");
                Err(BillingError::remote("Bill creation", err))
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
