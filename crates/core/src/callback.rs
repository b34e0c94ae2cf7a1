//! Inline keyboard callback actions.
//!
//! Buttons attached to admin notifications carry a `callback_data` string of
//! the form `<verb>_<entity>_<id>`. [`CallbackAction::parse`] is the only
//! place that reads that format and [`CallbackAction::encode`] the only place
//! that writes it.

use std::fmt;

use crate::types::RecordId;

const VERIFY_PAYMENT: &str = "verify_payment_";
const REJECT_PAYMENT: &str = "reject_payment_";
const COMPLETE_ORDER: &str = "complete_order_";
const CREATE_INVOICE: &str = "create_invoice_";

/// An admin action requested by pressing an inline keyboard button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    VerifyPayment { invoice_id: RecordId },
    RejectPayment { invoice_id: RecordId },
    CompleteOrder { order_id: RecordId },
    CreateInvoice { order_id: RecordId },
}

/// Why a `callback_data` string could not be turned into an action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallbackParseError {
    #[error("unknown callback action '{0}'")]
    UnknownVerb(String),

    #[error("invalid record id '{0}' in callback data")]
    InvalidId(String),
}

impl CallbackAction {
    pub fn parse(data: &str) -> Result<Self, CallbackParseError> {
        let data = data.trim();

        if let Some(raw) = data.strip_prefix(VERIFY_PAYMENT) {
            Ok(CallbackAction::VerifyPayment { invoice_id: parse_id(raw)? })
        } else if let Some(raw) = data.strip_prefix(REJECT_PAYMENT) {
            Ok(CallbackAction::RejectPayment { invoice_id: parse_id(raw)? })
        } else if let Some(raw) = data.strip_prefix(COMPLETE_ORDER) {
            Ok(CallbackAction::CompleteOrder { order_id: parse_id(raw)? })
        } else if let Some(raw) = data.strip_prefix(CREATE_INVOICE) {
            Ok(CallbackAction::CreateInvoice { order_id: parse_id(raw)? })
        } else {
            Err(CallbackParseError::UnknownVerb(data.to_string()))
        }
    }

    /// Serialize back into `callback_data` form.
    pub fn encode(&self) -> String {
        match self {
            CallbackAction::VerifyPayment { invoice_id } => format!("{VERIFY_PAYMENT}{invoice_id}"),
            CallbackAction::RejectPayment { invoice_id } => format!("{REJECT_PAYMENT}{invoice_id}"),
            CallbackAction::CompleteOrder { order_id } => format!("{COMPLETE_ORDER}{order_id}"),
            CallbackAction::CreateInvoice { order_id } => format!("{CREATE_INVOICE}{order_id}"),
        }
    }

    /// Short name of the verb, for logs.
    pub fn verb(&self) -> &'static str {
        match self {
            CallbackAction::VerifyPayment { .. } => "verify_payment",
            CallbackAction::RejectPayment { .. } => "reject_payment",
            CallbackAction::CompleteOrder { .. } => "complete_order",
            CallbackAction::CreateInvoice { .. } => "create_invoice",
        }
    }
}

fn parse_id(raw: &str) -> Result<RecordId, CallbackParseError> {
    raw.parse()
        .map_err(|_| CallbackParseError::InvalidId(raw.to_string()))
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
