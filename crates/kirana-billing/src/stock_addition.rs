//! # Stock Addition Protocol
//!
//! Two-phase, two-actor flow for increasing stock: callers **prepare** a
//! batch of entries, the UI shows a human-readable confirmation prompt,
//! and only an explicit **confirm** persists the entries against the
//! inventory service.
//!
//! ## Protocol Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Addition Protocol                              │
//! │                                                                         │
//! │  PREPARE (no stock writes, ever)                                       │
//! │  ───────────────────────────────                                       │
//! │  serialized form: serials + one shared remark + date                   │
//! │       │                                                                 │
//! │       ├── local duplicate check (earliest occurrence canonical,        │
//! │       │   later duplicates flagged) ── rejects BEFORE any remote call  │
//! │       │                                                                 │
//! │       └── per-serial async verification: valid only if unused across   │
//! │           inventory / billing / technician assignment                   │
//! │                                                                         │
//! │  generic form: per-entry quantity + date + remark, all local           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StagedBatch ──► summary() ──► confirmation prompt                     │
//! │                                                                         │
//! │  CONFIRM (sequential, stop on first failure)                           │
//! │  ───────────────────────────────────────────                           │
//! │  entry 1 ──► add_stock ──► ok                                          │
//! │  entry 2 ──► add_stock ──► FAILS ──► stop; entry 1 STAYS committed     │
//! │  entry 3 ──► never submitted (reported as skipped)                     │
//! │                                                                         │
//! │  No compensating rollback. At-least-once, non-atomic batch write.      │
//! │  On any outcome the staging buffer is consumed and discarded.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use tracing::{debug, info, warn};
use uuid::Uuid;

use kirana_core::types::{CatalogItem, ItemKind};
use kirana_core::validation::{validate_quantity, validate_remark, validate_serial_number};

use crate::error::{BillingError, BillingResult};
use crate::services::{
    InventoryService, SerialLookup, StockAdditionRequest, StockEntryPayload,
};

// =============================================================================
// Serial Problems
// =============================================================================

/// Why a serial number cannot be staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerialIssue {
    /// A duplicate of an earlier entry in the same batch. The earliest
    /// occurrence is treated as canonical; this one is flagged.
    DuplicateInBatch,
    /// Currently assigned to a field technician.
    AssignedToTechnician { technician_name: String },
    /// Already sold on a bill.
    UsedInBill { billed_to: String },
    /// Already sitting in inventory under some item.
    AlreadyInInventory { item_name: String },
    /// Failed format validation before any lookup ran.
    Invalid { reason: String },
}

impl std::fmt::Display for SerialIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SerialIssue::DuplicateInBatch => write!(f, "duplicate within this batch"),
            SerialIssue::AssignedToTechnician { technician_name } => {
                write!(f, "assigned to technician {}", technician_name)
            }
            SerialIssue::UsedInBill { billed_to } => {
                write!(f, "already billed to {}", billed_to)
            }
            SerialIssue::AlreadyInInventory { item_name } => {
                write!(f, "already in stock under {}", item_name)
            }
            SerialIssue::Invalid { reason } => write!(f, "{}", reason),
        }
    }
}

/// One rejected serial with its reason, for the inline problem list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialProblem {
    pub serial: String,
    pub issue: SerialIssue,
}

impl std::fmt::Display for SerialProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.serial, self.issue)
    }
}

// =============================================================================
// Staged Entries
// =============================================================================

/// One entry awaiting confirmation.
///
/// Exists only between prepare and confirm. Not persisted state - purely
/// an in-session staging buffer guarded by the confirmation gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedStockEntry {
    pub payload: StockEntryPayload,
    pub date: NaiveDate,
    pub remark: Option<String>,
}

impl StagedStockEntry {
    /// Short label naming this entry in prompts and failure reports.
    fn label(&self, unit_label: &str) -> String {
        match &self.payload {
            StockEntryPayload::Serial { serial_number } => serial_number.clone(),
            StockEntryPayload::Quantity { quantity } => format!("{} {}", quantity, unit_label),
        }
    }
}

/// Operator input for one generic stock entry.
#[derive(Debug, Clone)]
pub struct GenericEntryInput {
    pub quantity: i64,
    pub date: NaiveDate,
    pub remark: String,
}

// =============================================================================
// Staged Batch
// =============================================================================

/// A prepared batch awaiting operator confirmation.
///
/// Consumed by [`StagedBatch::confirm`]; dropping it is the cancel path.
/// Either way the buffer is gone - there is no way to re-confirm.
#[derive(Debug, Clone)]
pub struct StagedBatch {
    /// Identity for the audit trail.
    pub batch_id: Uuid,
    pub item_id: String,
    pub item_name: String,
    pub unit_label: String,
    pub kind: ItemKind,
    pub entries: Vec<StagedStockEntry>,
}

impl StagedBatch {
    /// Human-readable count/sum line for the confirmation prompt.
    ///
    /// ## Examples
    /// ```text
    /// Add 3 serialized units of ONU Router?
    /// Add 2 entries totalling 14 mtr of CAT6 Cable?
    /// ```
    pub fn summary(&self) -> String {
        match self.kind {
            ItemKind::Serialized => format!(
                "Add {} serialized unit{} of {}?",
                self.entries.len(),
                if self.entries.len() == 1 { "" } else { "s" },
                self.item_name
            ),
            ItemKind::Generic | ItemKind::Service => {
                let total: i64 = self
                    .entries
                    .iter()
                    .map(|e| match &e.payload {
                        StockEntryPayload::Quantity { quantity } => *quantity,
                        StockEntryPayload::Serial { .. } => 0,
                    })
                    .sum();
                format!(
                    "Add {} entr{} totalling {} {} of {}?",
                    self.entries.len(),
                    if self.entries.len() == 1 { "y" } else { "ies" },
                    total,
                    self.unit_label,
                    self.item_name
                )
            }
        }
    }

    /// Confirms the batch: submits every entry to the inventory service,
    /// **sequentially**, stopping at the first failure.
    ///
    /// Each call's completion gates the next - the ordered audit trail and
    /// the early stop both depend on this. Entries committed before a
    /// failure stay committed; there is no compensating rollback, and the
    /// report says exactly which entry failed and how many never ran.
    pub async fn confirm(self, inventory: &dyn InventoryService) -> ConfirmReport {
        let total = self.entries.len();
        info!(batch_id = %self.batch_id, item = %self.item_name, entries = total, "Confirming stock addition batch");

        let mut committed = Vec::with_capacity(total);
        let mut failure: Option<ConfirmFailure> = None;
        let mut skipped = 0;

        for entry in self.entries {
            // Early stop: once an entry has failed, the rest are only
            // counted, never submitted.
            if failure.is_some() {
                skipped += 1;
                continue;
            }

            let label = entry.label(&self.unit_label);
            let request = StockAdditionRequest {
                item_id: self.item_id.clone(),
                entry: entry.payload.clone(),
                date: entry.date,
                remark: entry.remark.clone(),
            };

            match inventory.add_stock(&request).await {
                Ok(ack) if ack.success => {
                    debug!(batch_id = %self.batch_id, entry = %label, "Stock entry committed");
                    committed.push(entry);
                }
                Ok(ack) => {
                    let message = ack
                        .message
                        .unwrap_or_else(|| "The stock entry was rejected.".to_string());
                    warn!(batch_id = %self.batch_id, entry = %label, %message, "Stock entry rejected; stopping batch");
                    failure = Some(ConfirmFailure {
                        entry_label: label,
                        message,
                    });
                }
                Err(err) => {
                    let message = err.user_message().to_string();
                    warn!(batch_id = %self.batch_id, entry = %label, %message, "Stock write failed; stopping batch");
                    failure = Some(ConfirmFailure {
                        entry_label: label,
                        message,
                    });
                }
            }
        }

        if failure.is_none() {
            info!(batch_id = %self.batch_id, committed = committed.len(), "Stock addition batch complete");
        }

        ConfirmReport {
            batch_id: self.batch_id,
            committed,
            failure,
            skipped,
        }
    }
}

// =============================================================================
// Confirm Report
// =============================================================================

/// Views that must be refetched after stock landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependentView {
    CurrentStock,
    StockHistory,
    CartAvailability,
}

/// The entry that stopped a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmFailure {
    /// Serial number, or "qty unit" label, of the failing entry.
    pub entry_label: String,
    /// Server-provided text when available.
    pub message: String,
}

/// Outcome of a confirm run.
///
/// A partial batch is a legal outcome: `committed` entries landed
/// server-side and stay landed even when `failure` is set.
#[derive(Debug, Clone)]
pub struct ConfirmReport {
    pub batch_id: Uuid,
    /// Entries the inventory service accepted, in submission order.
    pub committed: Vec<StagedStockEntry>,
    /// The first failure, if any; everything after it was skipped.
    pub failure: Option<ConfirmFailure>,
    /// Entries never submitted because of the early stop.
    pub skipped: usize,
}

impl ConfirmReport {
    /// True when every entry landed.
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    /// Dependent views invalidated by this run. Empty when nothing landed.
    pub fn invalidated(&self) -> &'static [DependentView] {
        if self.committed.is_empty() {
            &[]
        } else {
            &[
                DependentView::CurrentStock,
                DependentView::StockHistory,
                DependentView::CartAvailability,
            ]
        }
    }
}

// =============================================================================
// Prepare Phase
// =============================================================================

/// Stages a batch of serialized stock entries.
///
/// Duplicates within the batch are rejected locally before the remote
/// check even runs. Each remaining serial is then verified against the
/// inventory / billing / technician-assignment systems; a serial is valid
/// only if unused across all three. One `remark` applies to the whole
/// batch.
///
/// Never contacts the stock-write endpoint.
pub async fn prepare_serialized(
    item: &CatalogItem,
    serials: &[String],
    date: NaiveDate,
    remark: &str,
    inventory: &dyn InventoryService,
) -> BillingResult<StagedBatch> {
    if item.kind() != ItemKind::Serialized {
        return Err(BillingError::StockFormMismatch {
            item_name: item.name.clone(),
            kind: item.kind(),
        });
    }
    if serials.is_empty() {
        return Err(BillingError::MissingField {
            field: "serial numbers",
        });
    }
    let remark = validate_remark(remark).map_err(kirana_core::CoreError::from)?;

    // Pass 1: format checks and in-batch duplicate detection, all local.
    // The earliest occurrence of a serial is canonical; later ones are
    // flagged. Nothing remote runs if this pass finds problems.
    let mut problems = Vec::new();
    let mut cleaned: Vec<String> = Vec::with_capacity(serials.len());
    for raw in serials {
        let serial = raw.trim().to_string();
        if let Err(e) = validate_serial_number(&serial) {
            problems.push(SerialProblem {
                serial,
                issue: SerialIssue::Invalid {
                    reason: e.to_string(),
                },
            });
            continue;
        }
        if cleaned.contains(&serial) {
            problems.push(SerialProblem {
                serial,
                issue: SerialIssue::DuplicateInBatch,
            });
            continue;
        }
        cleaned.push(serial);
    }
    if !problems.is_empty() {
        debug!(item = %item.name, rejected = problems.len(), "Serial batch rejected locally");
        return Err(BillingError::SerialsRejected { problems });
    }

    // Pass 2: remote verification, one serial at a time so the problem
    // list comes back in entry order.
    for serial in &cleaned {
        let lookup = inventory
            .lookup_serial(serial)
            .await
            .map_err(|e| BillingError::remote("Serial verification", e))?;

        match lookup {
            SerialLookup::Unused => {}
            SerialLookup::AssignedToTechnician { technician_name } => problems.push(SerialProblem {
                serial: serial.clone(),
                issue: SerialIssue::AssignedToTechnician { technician_name },
            }),
            SerialLookup::UsedInBill { billed_to } => problems.push(SerialProblem {
                serial: serial.clone(),
                issue: SerialIssue::UsedInBill { billed_to },
            }),
            SerialLookup::InInventory { item_name, .. } => problems.push(SerialProblem {
                serial: serial.clone(),
                issue: SerialIssue::AlreadyInInventory { item_name },
            }),
        }
    }
    if !problems.is_empty() {
        debug!(item = %item.name, rejected = problems.len(), "Serial batch rejected by verification");
        return Err(BillingError::SerialsRejected { problems });
    }

    let shared_remark = if remark.is_empty() { None } else { Some(remark) };
    let batch = StagedBatch {
        batch_id: Uuid::new_v4(),
        item_id: item.id.clone(),
        item_name: item.name.clone(),
        unit_label: item.unit_label.clone(),
        kind: ItemKind::Serialized,
        entries: cleaned
            .into_iter()
            .map(|serial_number| StagedStockEntry {
                payload: StockEntryPayload::Serial { serial_number },
                date,
                remark: shared_remark.clone(),
            })
            .collect(),
    };
    debug!(batch_id = %batch.batch_id, entries = batch.entries.len(), "Serialized batch staged");
    Ok(batch)
}

/// Stages a batch of generic stock entries. Purely local: each entry
/// carries its own quantity, date and remark, and quantity must be a
/// positive integer.
pub fn prepare_generic(
    item: &CatalogItem,
    entries: Vec<GenericEntryInput>,
) -> BillingResult<StagedBatch> {
    if item.kind() != ItemKind::Generic {
        return Err(BillingError::StockFormMismatch {
            item_name: item.name.clone(),
            kind: item.kind(),
        });
    }
    if entries.is_empty() {
        return Err(BillingError::MissingField {
            field: "stock entries",
        });
    }

    let mut staged = Vec::with_capacity(entries.len());
    for entry in entries {
        validate_quantity(entry.quantity).map_err(kirana_core::CoreError::from)?;
        let remark = validate_remark(&entry.remark).map_err(kirana_core::CoreError::from)?;
        staged.push(StagedStockEntry {
            payload: StockEntryPayload::Quantity {
                quantity: entry.quantity,
            },
            date: entry.date,
            remark: if remark.is_empty() { None } else { Some(remark) },
        });
    }

    let batch = StagedBatch {
        batch_id: Uuid::new_v4(),
        item_id: item.id.clone(),
        item_name: item.name.clone(),
        unit_label: item.unit_label.clone(),
        kind: ItemKind::Generic,
        entries: staged,
    };
    debug!(batch_id = %batch.batch_id, entries = batch.entries.len(), "Generic batch staged");
    Ok(batch)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use kirana_core::types::{QuantityLot, SerialUnit, StockLedger};
    use kirana_core::CatalogItem;

    use crate::services::{RemoteError, StockWriteAck};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, 5).unwrap()
    }

    fn serialized_item() -> CatalogItem {
        CatalogItem {
            id: "onu".into(),
            name: "ONU Router".into(),
            unit_label: "pcs".into(),
            price_table: None,
            legacy_sale_price_paise: Some(120_000),
            stock: StockLedger::Serialized {
                units: vec![SerialUnit {
                    serial_number: "SN-EXISTING".into(),
                    added_date: date(),
                    remark: None,
                }],
            },
        }
    }

    fn generic_item() -> CatalogItem {
        CatalogItem {
            id: "cable".into(),
            name: "CAT6 Cable".into(),
            unit_label: "mtr".into(),
            price_table: None,
            legacy_sale_price_paise: Some(2500),
            stock: StockLedger::Generic {
                lots: vec![QuantityLot {
                    quantity: 10,
                    added_date: date(),
                    remark: None,
                }],
            },
        }
    }

    /// In-memory inventory fake recording call order.
    #[derive(Default)]
    struct FakeInventory {
        lookups: HashMap<String, SerialLookup>,
        /// Entry label whose add_stock call is rejected.
        reject_serial: Option<String>,
        lookup_calls: Mutex<Vec<String>>,
        write_calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl InventoryService for FakeInventory {
        async fn items_by_type(
            &self,
            _item_type: &str,
            _branch_id: &str,
        ) -> Result<Vec<CatalogItem>, RemoteError> {
            Ok(vec![])
        }

        async fn lookup_serial(&self, serial: &str) -> Result<SerialLookup, RemoteError> {
            self.lookup_calls.lock().unwrap().push(serial.to_string());
            Ok(self
                .lookups
                .get(serial)
                .cloned()
                .unwrap_or(SerialLookup::Unused))
        }

        async fn add_stock(
            &self,
            request: &StockAdditionRequest,
        ) -> Result<StockWriteAck, RemoteError> {
            let label = match &request.entry {
                StockEntryPayload::Serial { serial_number } => serial_number.clone(),
                StockEntryPayload::Quantity { quantity } => quantity.to_string(),
            };
            self.write_calls.lock().unwrap().push(label.clone());

            if self.reject_serial.as_deref() == Some(label.as_str()) {
                return Ok(StockWriteAck {
                    success: false,
                    message: Some(format!("Serial {} already registered", label)),
                });
            }
            Ok(StockWriteAck {
                success: true,
                message: None,
            })
        }
    }

    #[tokio::test]
    async fn test_duplicate_serials_rejected_before_any_remote_call() {
        let inventory = FakeInventory::default();
        let item = serialized_item();

        let err = prepare_serialized(
            &item,
            &["SN-A".to_string(), "SN-A".to_string()],
            date(),
            "",
            &inventory,
        )
        .await
        .unwrap_err();

        match err {
            BillingError::SerialsRejected { problems } => {
                // The earliest SN-A is canonical; the later one is flagged
                assert_eq!(problems.len(), 1);
                assert_eq!(problems[0].serial, "SN-A");
                assert_eq!(problems[0].issue, SerialIssue::DuplicateInBatch);
            }
            other => panic!("unexpected error: {other}"),
        }

        // The remote check never ran
        assert!(inventory.lookup_calls.lock().unwrap().is_empty());
        assert!(inventory.write_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_verification_reports_every_conflicting_system() {
        let mut inventory = FakeInventory::default();
        inventory.lookups.insert(
            "SN-TECH".into(),
            SerialLookup::AssignedToTechnician {
                technician_name: "Ravi".into(),
            },
        );
        inventory.lookups.insert(
            "SN-BILLED".into(),
            SerialLookup::UsedInBill {
                billed_to: "Gupta Traders".into(),
            },
        );
        let item = serialized_item();

        let err = prepare_serialized(
            &item,
            &["SN-TECH".to_string(), "SN-OK".to_string(), "SN-BILLED".to_string()],
            date(),
            "",
            &inventory,
        )
        .await
        .unwrap_err();

        match err {
            BillingError::SerialsRejected { problems } => {
                assert_eq!(problems.len(), 2);
                assert!(matches!(
                    problems[0].issue,
                    SerialIssue::AssignedToTechnician { .. }
                ));
                assert!(matches!(problems[1].issue, SerialIssue::UsedInBill { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }

        // Prepare never touches the stock-write endpoint
        assert!(inventory.write_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_prepare_then_confirm_full_success() {
        let inventory = FakeInventory::default();
        let item = serialized_item();

        let batch = prepare_serialized(
            &item,
            &["SN-A".to_string(), "SN-B".to_string(), "SN-C".to_string()],
            date(),
            "  new shipment  ",
            &inventory,
        )
        .await
        .unwrap();

        assert_eq!(batch.summary(), "Add 3 serialized units of ONU Router?");
        // The shared remark is trimmed and applied to every entry
        assert!(batch
            .entries
            .iter()
            .all(|e| e.remark.as_deref() == Some("new shipment")));

        let report = batch.confirm(&inventory).await;
        assert!(report.is_complete());
        assert_eq!(report.committed.len(), 3);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.invalidated().len(), 3);

        // Submitted sequentially, in entry order
        assert_eq!(
            *inventory.write_calls.lock().unwrap(),
            vec!["SN-A", "SN-B", "SN-C"]
        );
    }

    #[tokio::test]
    async fn test_confirm_stops_at_first_failure_and_keeps_earlier_commits() {
        let inventory = FakeInventory {
            reject_serial: Some("SN-B".into()),
            ..FakeInventory::default()
        };
        let item = serialized_item();

        let batch = prepare_serialized(
            &item,
            &["SN-A".to_string(), "SN-B".to_string(), "SN-C".to_string()],
            date(),
            "",
            &inventory,
        )
        .await
        .unwrap();

        let report = batch.confirm(&inventory).await;

        // A stays committed, B failed by name, C never submitted
        assert!(!report.is_complete());
        assert_eq!(report.committed.len(), 1);
        let failure = report.failure.as_ref().unwrap();
        assert_eq!(failure.entry_label, "SN-B");
        assert!(failure.message.contains("SN-B"));
        assert_eq!(report.skipped, 1);
        assert_eq!(*inventory.write_calls.lock().unwrap(), vec!["SN-A", "SN-B"]);

        // A partial landing still invalidates the dependent views
        assert_eq!(report.invalidated().len(), 3);
    }

    #[tokio::test]
    async fn test_confirm_with_nothing_committed_invalidates_nothing() {
        let inventory = FakeInventory {
            reject_serial: Some("SN-A".into()),
            ..FakeInventory::default()
        };
        let item = serialized_item();

        let batch = prepare_serialized(&item, &["SN-A".to_string()], date(), "", &inventory)
            .await
            .unwrap();
        let report = batch.confirm(&inventory).await;

        assert!(report.committed.is_empty());
        assert!(report.invalidated().is_empty());
    }

    #[tokio::test]
    async fn test_prepare_generic_validates_quantities() {
        let item = generic_item();

        let err = prepare_generic(
            &item,
            vec![GenericEntryInput {
                quantity: 0,
                date: date(),
                remark: String::new(),
            }],
        )
        .unwrap_err();
        assert!(err.is_validation());

        let batch = prepare_generic(
            &item,
            vec![
                GenericEntryInput {
                    quantity: 10,
                    date: date(),
                    remark: "roll 1".into(),
                },
                GenericEntryInput {
                    quantity: 4,
                    date: date(),
                    remark: String::new(),
                },
            ],
        )
        .unwrap();

        assert_eq!(batch.summary(), "Add 2 entries totalling 14 mtr of CAT6 Cable?");
        assert_eq!(batch.entries[0].remark.as_deref(), Some("roll 1"));
        assert_eq!(batch.entries[1].remark, None);
    }

    #[tokio::test]
    async fn test_stock_form_mismatch() {
        let inventory = FakeInventory::default();

        let err = prepare_serialized(
            &generic_item(),
            &["SN-A".to_string()],
            date(),
            "",
            &inventory,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, BillingError::StockFormMismatch { .. }));

        let err = prepare_generic(
            &serialized_item(),
            vec![GenericEntryInput {
                quantity: 1,
                date: date(),
                remark: String::new(),
            }],
        )
        .unwrap_err();
        assert!(matches!(err, BillingError::StockFormMismatch { .. }));
    }
}
