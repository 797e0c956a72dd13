//! Notification text for deals.

use crate::Deal;
use chrono::{FixedOffset, Local, TimeZone};

/// Layout of the timestamp line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Insert `,` between groups of three digits, counting from the right.
pub fn group_digits(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Zone used to render deal timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DisplayZone {
    /// The process's local time zone.
    Local,
    /// A fixed UTC offset.
    Fixed(FixedOffset),
}

/// Renders deals as two-line notification strings:
///
/// ```text
/// ✅ Buy	 $ 1,200,000
/// 2023-11-14 22:13:20
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DealFormatter {
    zone: DisplayZone,
}

impl Default for DealFormatter {
    fn default() -> Self {
        Self::local()
    }
}

impl DealFormatter {
    /// Formatter using the local time zone.
    pub fn local() -> Self {
        Self {
            zone: DisplayZone::Local,
        }
    }

    /// Formatter using a fixed offset from UTC.
    pub fn with_offset(offset: FixedOffset) -> Self {
        Self {
            zone: DisplayZone::Fixed(offset),
        }
    }

    pub fn format(&self, deal: &Deal) -> String {
        format!(
            "{} {}\t $ {}\n{}",
            deal.side.marker(),
            deal.side,
            group_digits(deal.whole_value()),
            self.format_timestamp(deal.timestamp)
        )
    }

    /// Render a unix timestamp; falls back to the raw number when it is out
    /// of chrono's range.
    pub fn format_timestamp(&self, timestamp: i64) -> String {
        let rendered = match self.zone {
            DisplayZone::Local => Local
                .timestamp_opt(timestamp, 0)
                .single()
                .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string()),
            DisplayZone::Fixed(offset) => offset
                .timestamp_opt(timestamp, 0)
                .single()
                .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string()),
        };
        rendered.unwrap_or_else(|| timestamp.to_string())
    }
}
