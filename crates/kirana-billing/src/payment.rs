//! # Payment Orchestrator
//!
//! The nested payment state machine: method selection → bank account
//! selection → payment-detail capture → QR settlement → success.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Payment Flow States                                  │
//! │                                                                         │
//! │                        ┌──────────┐                                     │
//! │                        │  method  │                                     │
//! │                        └────┬─────┘                                     │
//! │        cash ┌───────────────┼────────────────┐ bank_transfer/cheque    │
//! │             │               │ upi            │                          │
//! │             │               ▼                │                          │
//! │             │        ┌──────────────┐        │                          │
//! │             │        │bank-selection│        │                          │
//! │             │        └──────┬───────┘        │                          │
//! │             │               │ account chosen │                          │
//! │             ▼               ▼   ▲ back (upi) ▼                          │
//! │        ┌────────────────────────┴───────────────┐                      │
//! │        │                details                  │                      │
//! │        └────────────────────┬───────────────────┘                      │
//! │                             │ submit → bill created                    │
//! │              upi, due > 0   │          otherwise                        │
//! │             ┌───────────────┴───────────┐                              │
//! │             ▼                           ▼                              │
//! │        ┌─────────┐  payment done   ┌─────────┐                         │
//! │        │   qr    │────────────────►│ success │ (terminal)              │
//! │        └─────────┘                 └─────────┘                         │
//! │                                                                         │
//! │  Numeric invariants, maintained throughout:                            │
//! │    due = max(0, total − paid)                                          │
//! │    is_full_payment ⇔ paid ≥ total                                      │
//! │    upi ⇒ paid fixed = total (full-payment-only)                        │
//! │                                                                         │
//! │  Failure semantics: a remote failure at submit or inside the qr        │
//! │  stage is reported in place; the machine does NOT auto-retry and       │
//! │  does NOT regress state.                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ts_rs::TS;
use uuid::Uuid;

use kirana_core::validation::{validate_cheque_number, validate_utr_number};
use kirana_core::{BankAccount, Bill, Cart, CoreError, Money, PaymentMethod, PaymentProof};

use crate::bill::{build_payload, BillAssembler, BillRecipient};
use crate::config::BillingConfig;
use crate::error::{BillingError, BillingResult};
use crate::qr::QrSession;
use crate::services::{BankDirectory, BillingApi, SettlementGateway};

// =============================================================================
// Stages
// =============================================================================

/// The payment flow's current stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStage {
    /// Operator picks cash / upi / bank_transfer / cheque.
    Method,
    /// UPI only: pick the receiving bank account.
    BankSelection,
    /// Capture method-specific proof fields; submit creates the bill.
    Details,
    /// UPI with residual due: QR settlement session.
    Qr,
    /// Terminal; the bill exists.
    Success,
}

impl PaymentStage {
    fn name(&self) -> &'static str {
        match self {
            PaymentStage::Method => "method",
            PaymentStage::BankSelection => "bank-selection",
            PaymentStage::Details => "details",
            PaymentStage::Qr => "qr",
            PaymentStage::Success => "success",
        }
    }
}

// =============================================================================
// Close Handling
// =============================================================================

/// How the payment window was closed. Both paths behave identically -
/// overlay dismissal must not lose the bill notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Explicit close/done action.
    Done,
    /// Click on the background overlay.
    OverlayDismissed,
}

/// What the caller learns when the flow is closed.
#[derive(Debug)]
pub struct CloseOutcome {
    /// The bill, when one was created in this flow. Yielded exactly once
    /// per successful bill - `close` consumes the flow, so there is no
    /// second chance to observe it.
    pub created_bill: Option<Bill>,
}

// =============================================================================
// Services Bundle
// =============================================================================

/// The collaborators the payment flow talks to.
#[derive(Clone)]
pub struct PaymentServices {
    pub billing: Arc<dyn BillingApi>,
    pub banks: Arc<dyn BankDirectory>,
    pub settlement: Arc<dyn SettlementGateway>,
}

// =============================================================================
// Payment Flow
// =============================================================================

/// One payment session over a snapshotted cart.
///
/// Created when the operator leaves the select-items step; destroyed on
/// close. Dropping the flow without closing is plain cancellation - the
/// cart and session state are discarded, and any bill already created
/// server-side persists (in-flight effects are never cancelled).
pub struct PaymentFlow {
    session_id: Uuid,
    cart: Cart,
    recipient: BillRecipient,
    notes: Option<String>,
    config: BillingConfig,
    assembler: BillAssembler,
    services: PaymentServices,

    stage: PaymentStage,
    method: Option<PaymentMethod>,
    total: Money,
    paid: Money,

    // Method-specific detail fields
    transaction_id: Option<String>,
    utr_number: Option<String>,
    received: Option<Money>,
    cheque_number: Option<String>,
    cheque_amount: Option<Money>,

    // UPI bank selection
    accounts: Vec<BankAccount>,
    selected_account: Option<usize>,

    // QR settlement
    qr: Option<QrSession>,

    bill: Option<Bill>,
}

impl std::fmt::Debug for PaymentFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentFlow")
            .field("session_id", &self.session_id)
            .field("recipient", &self.recipient)
            .field("notes", &self.notes)
            .field("stage", &self.stage)
            .field("method", &self.method)
            .field("total", &self.total)
            .field("paid", &self.paid)
            .field("transaction_id", &self.transaction_id)
            .field("utr_number", &self.utr_number)
            .field("received", &self.received)
            .field("cheque_number", &self.cheque_number)
            .field("cheque_amount", &self.cheque_amount)
            .field("selected_account", &self.selected_account)
            .field("bill", &self.bill)
            .finish_non_exhaustive()
    }
}

impl PaymentFlow {
    /// Starts a payment session by snapshotting the cart.
    ///
    /// The cart is moved in: it now belongs to this session and is
    /// destroyed with it.
    pub fn new(
        cart: Cart,
        recipient: BillRecipient,
        notes: Option<String>,
        config: BillingConfig,
        services: PaymentServices,
    ) -> BillingResult<Self> {
        if cart.is_empty() {
            return Err(BillingError::EmptyCart);
        }

        let total = cart.totals().total;
        let session_id = Uuid::new_v4();
        debug!(session_id = %session_id, total = %total, lines = cart.line_count(), "Payment session opened");

        Ok(PaymentFlow {
            session_id,
            cart,
            recipient,
            notes,
            config,
            assembler: BillAssembler::new(services.billing.clone()),
            services,
            stage: PaymentStage::Method,
            method: None,
            total,
            paid: Money::zero(),
            transaction_id: None,
            utr_number: None,
            received: None,
            cheque_number: None,
            cheque_amount: None,
            accounts: Vec::new(),
            selected_account: None,
            qr: None,
            bill: None,
        })
    }

    // =========================================================================
    // Read Accessors
    // =========================================================================

    pub fn stage(&self) -> PaymentStage {
        self.stage
    }

    pub fn method(&self) -> Option<PaymentMethod> {
        self.method
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn paid_amount(&self) -> Money {
        self.paid
    }

    /// `max(0, total − paid)`, recomputed on every call.
    pub fn due_amount(&self) -> Money {
        self.total.due_after(self.paid)
    }

    pub fn is_full_payment(&self) -> bool {
        self.paid >= self.total
    }

    /// Receiving accounts fetched for UPI.
    pub fn accounts(&self) -> &[BankAccount] {
        &self.accounts
    }

    pub fn selected_account(&self) -> Option<&BankAccount> {
        self.selected_account.and_then(|i| self.accounts.get(i))
    }

    /// The active QR settlement session, once generated.
    pub fn qr_session(&self) -> Option<&QrSession> {
        self.qr.as_ref()
    }

    /// The created bill. Present from the moment submission succeeds.
    pub fn bill(&self) -> Option<&Bill> {
        self.bill.as_ref()
    }

    fn invalid(&self, action: &'static str) -> BillingError {
        BillingError::InvalidTransition {
            stage: self.stage.name(),
            action,
        }
    }

    // =========================================================================
    // method → ...
    // =========================================================================

    /// Picks the payment method.
    ///
    /// - cash: paid defaults to the full total, editable down for partial
    ///   payment; → details
    /// - upi: fetches receiving accounts and auto-preselects the account
    ///   flagged primary; paid is fixed to the total; → bank-selection
    /// - bank_transfer / cheque: paid starts at 0 and is derived from the
    ///   method-specific amount field; → details
    pub async fn choose_method(&mut self, method: PaymentMethod) -> BillingResult<()> {
        if self.stage != PaymentStage::Method {
            return Err(self.invalid("choose a payment method"));
        }

        match method {
            PaymentMethod::Cash => {
                self.paid = self.total;
                self.stage = PaymentStage::Details;
            }
            PaymentMethod::Upi => {
                let accounts = self
                    .services
                    .banks
                    .receiving_accounts()
                    .await
                    .map_err(|e| BillingError::remote("Bank account listing", e))?;

                self.selected_account = accounts.iter().position(|a| a.is_primary);
                self.accounts = accounts;
                // UPI is full-payment-only: fixed, not editable.
                self.paid = self.total;
                self.stage = PaymentStage::BankSelection;
            }
            PaymentMethod::BankTransfer | PaymentMethod::Cheque => {
                self.paid = Money::zero();
                self.stage = PaymentStage::Details;
            }
        }

        self.method = Some(method);
        debug!(session_id = %self.session_id, %method, stage = self.stage.name(), "Payment method chosen");
        Ok(())
    }

    // =========================================================================
    // bank-selection ↔ details
    // =========================================================================

    /// Chooses the receiving account; → details.
    pub fn select_bank_account(&mut self, index: usize) -> BillingResult<()> {
        if self.stage != PaymentStage::BankSelection {
            return Err(self.invalid("select a bank account"));
        }
        if index >= self.accounts.len() {
            return Err(BillingError::NoAccountSelected);
        }

        self.selected_account = Some(index);
        self.stage = PaymentStage::Details;
        Ok(())
    }

    /// "Back" from details to bank selection. Only reachable for UPI.
    pub fn back_to_bank_selection(&mut self) -> BillingResult<()> {
        if self.stage != PaymentStage::Details || self.method != Some(PaymentMethod::Upi) {
            return Err(self.invalid("go back to bank selection"));
        }
        self.stage = PaymentStage::BankSelection;
        Ok(())
    }

    // =========================================================================
    // details: field capture
    // =========================================================================

    /// Edits the paid amount. Cash only: UPI is locked to the total, and
    /// bank transfer / cheque derive it from their own amount fields.
    pub fn set_paid_amount(&mut self, amount: Money) -> BillingResult<()> {
        if self.stage != PaymentStage::Details {
            return Err(self.invalid("edit the paid amount"));
        }
        match self.method {
            Some(PaymentMethod::Cash) => {}
            Some(PaymentMethod::Upi) => return Err(BillingError::PaidAmountLocked),
            Some(PaymentMethod::BankTransfer) => {
                return Err(BillingError::PaidAmountDerived {
                    method: PaymentMethod::BankTransfer,
                    field: "received amount",
                })
            }
            Some(PaymentMethod::Cheque) => {
                return Err(BillingError::PaidAmountDerived {
                    method: PaymentMethod::Cheque,
                    field: "cheque amount",
                })
            }
            None => return Err(self.invalid("edit the paid amount")),
        }

        if amount.is_negative() {
            return Err(CoreError::from(kirana_core::ValidationError::MustBePositive {
                field: "paid amount".to_string(),
            })
            .into());
        }
        if amount > self.total {
            return Err(BillingError::AmountExceedsTotal {
                amount,
                total: self.total,
            });
        }

        self.paid = amount;
        Ok(())
    }

    /// Records the UPI transaction id. Legal in details and in the qr
    /// stage (the id usually arrives after the customer scans).
    pub fn set_transaction_id(&mut self, transaction_id: &str) -> BillingResult<()> {
        if !matches!(self.stage, PaymentStage::Details | PaymentStage::Qr)
            || self.method != Some(PaymentMethod::Upi)
        {
            return Err(self.invalid("record a transaction id"));
        }

        let trimmed = transaction_id.trim();
        self.transaction_id = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        Ok(())
    }

    /// Records the UTR number for a bank transfer.
    pub fn set_utr_number(&mut self, utr: &str) -> BillingResult<()> {
        if self.stage != PaymentStage::Details || self.method != Some(PaymentMethod::BankTransfer) {
            return Err(self.invalid("record a UTR number"));
        }
        validate_utr_number(utr).map_err(CoreError::from)?;
        self.utr_number = Some(utr.trim().to_string());
        Ok(())
    }

    /// Records the credited amount for a bank transfer. The paid amount
    /// is derived from this field.
    pub fn set_received_amount(&mut self, amount: Money) -> BillingResult<()> {
        if self.stage != PaymentStage::Details || self.method != Some(PaymentMethod::BankTransfer) {
            return Err(self.invalid("record a received amount"));
        }
        if !amount.is_positive() {
            return Err(CoreError::from(kirana_core::ValidationError::MustBePositive {
                field: "received amount".to_string(),
            })
            .into());
        }

        self.received = Some(amount);
        self.paid = amount;
        Ok(())
    }

    /// Records the cheque number.
    pub fn set_cheque_number(&mut self, number: &str) -> BillingResult<()> {
        if self.stage != PaymentStage::Details || self.method != Some(PaymentMethod::Cheque) {
            return Err(self.invalid("record a cheque number"));
        }
        validate_cheque_number(number).map_err(CoreError::from)?;
        self.cheque_number = Some(number.trim().to_string());
        Ok(())
    }

    /// Records the cheque amount. The paid amount is derived from this
    /// field.
    pub fn set_cheque_amount(&mut self, amount: Money) -> BillingResult<()> {
        if self.stage != PaymentStage::Details || self.method != Some(PaymentMethod::Cheque) {
            return Err(self.invalid("record a cheque amount"));
        }
        if !amount.is_positive() {
            return Err(CoreError::from(kirana_core::ValidationError::MustBePositive {
                field: "cheque amount".to_string(),
            })
            .into());
        }

        self.cheque_amount = Some(amount);
        self.paid = amount;
        Ok(())
    }

    // =========================================================================
    // details → qr / success
    // =========================================================================

    /// Validates the method-specific required fields and creates the bill.
    ///
    /// On success: upi with residual due goes to the qr stage (a valid but
    /// rare branch - a settlement adjustment can leave due > 0 even though
    /// the session initialized paid = total); everything else lands on
    /// success.
    ///
    /// On failure the error is reported in place: no retry is attempted
    /// and the stage does not change, so the operator can correct input
    /// and resubmit without re-entering the cart step.
    pub async fn submit(&mut self) -> BillingResult<()> {
        if self.stage != PaymentStage::Details {
            return Err(self.invalid("submit payment details"));
        }
        let method = self.method.ok_or_else(|| self.invalid("submit payment details"))?;

        let (proof, received) = match method {
            PaymentMethod::Cash => (PaymentProof::Cash, self.paid),

            PaymentMethod::Upi => {
                if self.selected_account.is_none() {
                    return Err(BillingError::NoAccountSelected);
                }
                // The transaction id is required only after QR display;
                // at this point it may legitimately be absent.
                (
                    PaymentProof::Upi {
                        transaction_id: self.transaction_id.clone(),
                    },
                    self.paid,
                )
            }

            PaymentMethod::BankTransfer => {
                let utr = self
                    .utr_number
                    .clone()
                    .ok_or(BillingError::MissingField { field: "UTR number" })?;
                let received = self.received.ok_or(BillingError::MissingField {
                    field: "received amount",
                })?;
                (
                    PaymentProof::BankTransfer {
                        utr_number: utr,
                        received_paise: received.paise(),
                    },
                    received,
                )
            }

            PaymentMethod::Cheque => {
                let number = self.cheque_number.clone().ok_or(BillingError::MissingField {
                    field: "cheque number",
                })?;
                let amount = self.cheque_amount.ok_or(BillingError::MissingField {
                    field: "cheque amount",
                })?;
                (
                    PaymentProof::Cheque {
                        cheque_number: number,
                        cheque_paise: amount.paise(),
                    },
                    amount,
                )
            }
        };

        let payload = build_payload(
            &self.cart,
            method,
            self.paid,
            received,
            proof,
            self.notes.clone(),
        )?;

        let bill = self.assembler.submit(&self.recipient, &payload).await?;

        let due = bill.due();
        info!(
            session_id = %self.session_id,
            bill_number = %bill.bill_number,
            due = %due,
            "Payment submitted"
        );
        self.bill = Some(bill);

        if method == PaymentMethod::Upi && due.is_positive() {
            self.stage = PaymentStage::Qr;
        } else {
            self.stage = PaymentStage::Success;
        }
        Ok(())
    }

    // =========================================================================
    // qr stage
    // =========================================================================

    /// Generates the QR settlement session for the bill's due amount.
    ///
    /// Retryable in place: a gateway failure leaves the stage unchanged.
    pub async fn load_qr(&mut self) -> BillingResult<&QrSession> {
        if self.stage != PaymentStage::Qr {
            return Err(self.invalid("generate a QR session"));
        }
        let bill = self.bill.as_ref().ok_or_else(|| self.invalid("generate a QR session"))?;
        let amount = bill.due();

        let settlement = self
            .services
            .settlement
            .generate_qr(&bill.id, amount)
            .await
            .map_err(|e| BillingError::remote("QR generation", e))?;

        let session = QrSession::new(settlement, amount, self.config.qr.expiry_secs);
        debug!(session_id = %self.session_id, amount = %amount, "QR settlement session generated");
        Ok(&*self.qr.insert(session))
    }

    /// Operator-asserted "payment done" - the only mechanism that advances
    /// the qr stage. There is no automatic polling against any payment
    /// network.
    ///
    /// Once the QR has been displayed, a transaction id is required.
    pub fn confirm_settlement(&mut self) -> BillingResult<()> {
        if self.stage != PaymentStage::Qr {
            return Err(self.invalid("confirm the settlement"));
        }
        if self.qr.is_none() {
            return Err(BillingError::QrNotLoaded);
        }
        if self.transaction_id.is_none() {
            return Err(BillingError::MissingField {
                field: "transaction id",
            });
        }

        info!(session_id = %self.session_id, "Settlement confirmed by operator");
        self.stage = PaymentStage::Success;
        Ok(())
    }

    // =========================================================================
    // close
    // =========================================================================

    /// Closes the payment window, consuming the flow.
    ///
    /// If a bill was created in this flow the outcome carries it -
    /// regardless of how the window was dismissed. Because `close` takes
    /// the flow by value, the caller is informed exactly once per
    /// successful bill; there is no way to observe it twice.
    pub fn close(self, reason: CloseReason) -> CloseOutcome {
        if let Some(bill) = &self.bill {
            info!(
                session_id = %self.session_id,
                bill_number = %bill.bill_number,
                ?reason,
                "Payment window closed with bill"
            );
        } else {
            warn!(session_id = %self.session_id, ?reason, "Payment window closed without a bill");
        }

        CloseOutcome {
            created_bill: self.bill,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
