//! Locale formatting for message templates (Indonesian conventions).

use chrono::{FixedOffset, Offset, Utc};

use crate::types::Timestamp;

/// Format an amount of rupiah as `Rp 1.250.000` (zero decimals, `.` grouping).
pub fn format_idr(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if amount < 0 {
        format!("-Rp {grouped}")
    } else {
        format!("Rp {grouped}")
    }
}

/// Render a timestamp as `19/10/2026, 14.05` in the given UTC offset.
///
/// Offsets outside chrono's valid range fall back to UTC.
pub fn format_timestamp(ts: Timestamp, utc_offset_hours: i32) -> String {
    let offset = utc_offset_hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix());
    ts.with_timezone(&offset).format("%d/%m/%Y, %H.%M").to_string()
}
