//! Lifecycle statuses of the records the notification core touches.
//!
//! Orders and invoices are owned by the storefront; this service only moves
//! them along the edges listed on each `*_from` slice, and only when the
//! stored status still matches (compare-and-set).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Transition guard
// ---------------------------------------------------------------------------

/// Outcome of checking a requested transition against the current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionCheck {
    /// Current status is a valid prior state; the update should be applied.
    Apply,
    /// The record is already in the target state. Nothing to do.
    AlreadyApplied,
    /// The transition is not allowed from the current status.
    Invalid,
}

// ---------------------------------------------------------------------------
// OrderStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Statuses from which an order may be completed.
    pub const COMPLETABLE_FROM: &'static [OrderStatus] =
        &[OrderStatus::Pending, OrderStatus::Processing];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Human-facing label used in customer messages.
    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Pending => "⏳ Menunggu",
            OrderStatus::Processing => "🔄 Sedang Diproses",
            OrderStatus::Completed => "✅ Selesai",
            OrderStatus::Cancelled => "❌ Dibatalkan",
        }
    }

    pub fn check_complete(self) -> TransitionCheck {
        match self {
            OrderStatus::Completed => TransitionCheck::AlreadyApplied,
            s if Self::COMPLETABLE_FROM.contains(&s) => TransitionCheck::Apply,
            _ => TransitionCheck::Invalid,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(CoreError::Validation(format!("unknown order status '{other}'"))),
        }
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// InvoiceStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Unpaid,
    /// A payment proof has been uploaded and awaits verification.
    Pending,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    /// Statuses from which a payment may be verified.
    pub const VERIFIABLE_FROM: &'static [InvoiceStatus] =
        &[InvoiceStatus::Unpaid, InvoiceStatus::Pending];

    /// Statuses from which a payment may be rejected.
    pub const REJECTABLE_FROM: &'static [InvoiceStatus] = &[InvoiceStatus::Pending];

    pub fn as_str(self) -> &'static str {
        match self {
            InvoiceStatus::Unpaid => "unpaid",
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }

    pub fn check_verify(self) -> TransitionCheck {
        match self {
            InvoiceStatus::Paid => TransitionCheck::AlreadyApplied,
            s if Self::VERIFIABLE_FROM.contains(&s) => TransitionCheck::Apply,
            _ => TransitionCheck::Invalid,
        }
    }

    pub fn check_reject(self) -> TransitionCheck {
        match self {
            InvoiceStatus::Unpaid => TransitionCheck::AlreadyApplied,
            s if Self::REJECTABLE_FROM.contains(&s) => TransitionCheck::Apply,
            _ => TransitionCheck::Invalid,
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(InvoiceStatus::Unpaid),
            "pending" => Ok(InvoiceStatus::Pending),
            "paid" => Ok(InvoiceStatus::Paid),
            "cancelled" => Ok(InvoiceStatus::Cancelled),
            other => Err(CoreError::Validation(format!(
                "unknown invoice status '{other}'"
            ))),
        }
    }
}

impl TryFrom<String> for InvoiceStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// DeliveryStatus
// ---------------------------------------------------------------------------

/// Status of one row in the notification log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DeliveryStatus::Pending),
            "sent" => Ok(DeliveryStatus::Sent),
            "failed" => Ok(DeliveryStatus::Failed),
            other => Err(CoreError::Validation(format!(
                "unknown delivery status '{other}'"
            ))),
        }
    }
}

impl TryFrom<String> for DeliveryStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
