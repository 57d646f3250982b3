//! # QR Settlement Sessions
//!
//! A settlement session is a time-boxed UPI payment request rendered as a
//! scannable code plus the raw payment link.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   QR Settlement Session                                 │
//! │                                                                         │
//! │  SettlementGateway.generate_qr(bill_id, amount)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  QrSession { upi_url, merchant id, amount, expiry countdown }          │
//! │       │                                                                 │
//! │       ├── payment_link() → copy-to-clipboard                           │
//! │       ├── remaining_at(now) → countdown display                        │
//! │       │                                                                 │
//! │       └── operator asserts "payment done" → success                    │
//! │                                                                         │
//! │  The countdown is ADVISORY DISPLAY ONLY: expiry does not invalidate    │
//! │  the session server-side, and there is no automatic polling against    │
//! │  any payment network.                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use kirana_core::Money;

use crate::services::QrSettlement;

// =============================================================================
// QR Session
// =============================================================================

/// An active UPI settlement session for one bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct QrSession {
    /// The raw `upi://pay?...` link encoded in the QR.
    pub upi_url: String,
    /// Merchant UPI identifier shown next to the code.
    pub merchant_upi_id: Option<String>,
    /// Gateway-side reference for the settlement request.
    pub reference: Option<String>,
    /// Amount being settled.
    pub amount: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// End of the display countdown. Advisory only.
    #[ts(as = "String")]
    pub expires_at: DateTime<Utc>,
}

impl QrSession {
    /// Wraps a gateway settlement in a session with a display countdown of
    /// `expiry_secs`.
    pub fn new(settlement: QrSettlement, amount: Money, expiry_secs: u64) -> Self {
        let created_at = Utc::now();
        QrSession {
            upi_url: settlement.upi_url,
            merchant_upi_id: settlement.merchant_upi_id,
            reference: settlement.reference,
            amount,
            created_at,
            expires_at: created_at + Duration::seconds(expiry_secs as i64),
        }
    }

    /// The raw payment link, for copy-to-clipboard.
    pub fn payment_link(&self) -> &str {
        &self.upi_url
    }

    /// Countdown remaining at `now`, floored at zero.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }

    /// Whether the countdown has run out at `now`.
    ///
    /// Display state only - an expired countdown does not block the
    /// operator from confirming the settlement.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

// =============================================================================
// UPI Link Composition
// =============================================================================

/// Composes a `upi://pay` deep link for hosts that render the QR locally
/// from a receiving account's UPI id.
///
/// ## Example
/// ```rust
/// use kirana_billing::qr::compose_upi_link;
/// use kirana_core::Money;
///
/// let link = compose_upi_link(
///     "store@okhdfc",
///     "Sharma Network Services",
///     Money::from_paise(45_000),
///     Some("Bill KB-2024-0042"),
/// );
/// assert!(link.starts_with("upi://pay?pa=store%40okhdfc"));
/// assert!(link.contains("am=450.00"));
/// ```
pub fn compose_upi_link(
    payee_vpa: &str,
    payee_name: &str,
    amount: Money,
    note: Option<&str>,
) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query.append_pair("pa", payee_vpa);
    query.append_pair("pn", payee_name);
    query.append_pair("am", &format!("{}.{:02}", amount.rupees(), amount.paise_part()));
    query.append_pair("cu", "INR");
    if let Some(note) = note {
        query.append_pair("tn", note);
    }
    format!("upi://pay?{}", query.finish())
}

// =============================================================================
// Unit Tests
// =============================================================================
