//! # kirana-billing: Billing & Payment Orchestration for Kirana POS
//!
//! Everything between the pure core and the surrounding application: the
//! service contracts, the stock addition protocol, bill assembly and the
//! payment state machine.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Kirana POS Billing Layer                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 kirana-billing (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────────┐  ┌──────────────┐  ┌────────────────────────┐ │   │
//! │  │  │ CartSession │  │ StagedBatch  │  │ PaymentFlow           │ │   │
//! │  │  │ (session.rs)│  │ (stock_      │  │ (payment.rs)          │ │   │
//! │  │  │             │  │  addition.rs)│  │                       │ │   │
//! │  │  │ gate-checked│  │ prepare ──►  │  │ method ► bank ►       │ │   │
//! │  │  │ cart builds │  │ confirm      │  │ details ► qr ►        │ │   │
//! │  │  │             │  │ (sequential) │  │ success               │ │   │
//! │  │  └──────┬──────┘  └──────┬───────┘  └───────────┬───────────┘ │   │
//! │  │         │                │                       │             │   │
//! │  │  ┌──────┴────────────────┴───────────────────────┴──────────┐ │   │
//! │  │  │              services.rs (async contracts)              │ │   │
//! │  │  │  InventoryService │ BillingApi │ BankDirectory │        │ │   │
//! │  │  │  SettlementGateway                                       │ │   │
//! │  │  └──────────────────────────────────────────────────────────┘ │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  DEPENDENCIES:                                                         │
//! │  • kirana-core: Money, Cart, stock gate, domain types                  │
//! │  • The host application implements the service traits                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`services`] - The external collaborators, as async trait contracts
//! - [`session`] - The select-items step (gate-checked cart building)
//! - [`stock_addition`] - Two-phase prepare/confirm stock protocol
//! - [`bill`] - Bill payload assembly and submission
//! - [`payment`] - The payment state machine
//! - [`qr`] - UPI QR settlement sessions
//! - [`config`] - Billing configuration (TOML)
//! - [`error`] - Billing error taxonomy
//!
//! ## Concurrency Model
//!
//! Single logical mutator: UI callbacks and network completions interleave
//! on one task, so the session types take `&mut self` and need no locking.
//! All network operations are async and non-blocking, but the stock
//! confirm phase deliberately serializes its per-entry calls - each
//! completion gates the next - for an ordered audit trail and early stop
//! on first failure. Dropping a session or flow cancels nothing already
//! in flight server-side; those effects persist.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bill;
pub mod config;
pub mod error;
pub mod payment;
pub mod qr;
pub mod services;
pub mod session;
pub mod stock_addition;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use bill::{build_payload, BillAssembler, BillItemPayload, BillPayload, BillRecipient};
pub use config::BillingConfig;
pub use error::{BillingError, BillingResult};
pub use payment::{CloseOutcome, CloseReason, PaymentFlow, PaymentServices, PaymentStage};
pub use qr::{compose_upi_link, QrSession};
pub use services::{
    BankDirectory, BillingApi, InventoryService, QrSettlement, RemoteError, SerialLookup,
    SettlementGateway, StockAdditionRequest, StockEntryPayload, StockWriteAck,
};
pub use session::CartSession;
pub use stock_addition::{
    prepare_generic, prepare_serialized, ConfirmFailure, ConfirmReport, DependentView,
    GenericEntryInput, SerialIssue, SerialProblem, StagedBatch, StagedStockEntry,
};
