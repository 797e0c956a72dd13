//! Large trade events ("big deals") reported by the exchange feed.

use compact_str::CompactString;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while turning raw feed fields into a [`Deal`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseDealError {
    #[error("Unknown side: {0:?}")]
    UnknownSide(String),

    #[error("Invalid timestamp: {0:?}")]
    InvalidTimestamp(String),

    #[error("Invalid value: {0:?}")]
    InvalidValue(String),
}

/// Taker side of a deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "Buy",
            Side::Sell => "Sell",
        }
    }

    /// Visual marker shown in front of the side in notifications.
    pub fn marker(self) -> &'static str {
        match self {
            Side::Buy => "✅",
            Side::Sell => "❌",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = ParseDealError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Buy" => Ok(Side::Buy),
            "Sell" => Ok(Side::Sell),
            other => Err(ParseDealError::UnknownSide(other.to_string())),
        }
    }
}

/// A single large trade. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    /// Instrument symbol (e.g., "BTCUSDT")
    pub symbol: CompactString,
    /// Taker side
    pub side: Side,
    /// Unix timestamp in seconds
    pub timestamp: i64,
    /// Notional value in quote currency
    pub value: Decimal,
}

/// One fetch worth of deals, newest first. Order comes from the feed and is
/// never re-sorted locally.
pub type Batch = Vec<Deal>;

impl Deal {
    pub fn new(symbol: &str, side: Side, timestamp: i64, value: Decimal) -> Self {
        Self {
            symbol: CompactString::new(symbol),
            side,
            timestamp,
            value,
        }
    }

    /// Build a deal from the string-encoded fields of the feed.
    pub fn from_raw(
        symbol: &str,
        side: &str,
        timestamp: &str,
        value: &str,
    ) -> Result<Self, ParseDealError> {
        Ok(Self {
            symbol: CompactString::new(symbol),
            side: side.parse()?,
            timestamp: parse_timestamp(timestamp)?,
            value: parse_value(value)?,
        })
    }

    /// Integer part of the value, saturating at the `i64` bounds.
    ///
    /// This is the number that is displayed and compared against thresholds.
    pub fn whole_value(&self) -> i64 {
        self.value.trunc().to_i64().unwrap_or(if self.value.is_sign_negative() {
            i64::MIN
        } else {
            i64::MAX
        })
    }
}

/// Parse a string-encoded integer timestamp in seconds.
pub fn parse_timestamp(raw: &str) -> Result<i64, ParseDealError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ParseDealError::InvalidTimestamp(raw.to_string()))
}

/// Parse a string-encoded decimal, ignoring `,` grouping separators.
pub fn parse_value(raw: &str) -> Result<Decimal, ParseDealError> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map_err(|_| ParseDealError::InvalidValue(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_side_from_str() {
        assert_eq!("Buy".parse::<Side>(), Ok(Side::Buy));
        assert_eq!("Sell".parse::<Side>(), Ok(Side::Sell));
        assert_eq!(
            "Hold".parse::<Side>(),
            Err(ParseDealError::UnknownSide("Hold".to_string()))
        );
    }

    #[test]
    fn test_side_marker() {
        assert_eq!(Side::Buy.marker(), "✅");
        assert_eq!(Side::Sell.marker(), "❌");
        assert_eq!(Side::Sell.to_string(), "Sell");
    }

    #[test]
    fn test_parse_value_strips_grouping() {
        assert_eq!(parse_value("1,200,000").unwrap(), Decimal::from(1_200_000));
        assert_eq!(parse_value("300000").unwrap(), Decimal::from(300_000));
        assert_eq!(
            parse_value("1,234.56").unwrap(),
            Decimal::from_str("1234.56").unwrap()
        );
    }

    #[test]
    fn test_parse_value_scientific() {
        assert_eq!(parse_value("1.5e6").unwrap(), Decimal::from(1_500_000));
    }

    #[test]
    fn test_parse_value_rejects_garbage() {
        assert!(matches!(
            parse_value("12abc"),
            Err(ParseDealError::InvalidValue(_))
        ));
        assert!(parse_value("").is_err());
        assert!(parse_value(",,,").is_err());
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("1700000000").unwrap(), 1_700_000_000);
        assert_eq!(parse_timestamp(" 42 ").unwrap(), 42);
        assert!(matches!(
            parse_timestamp("17.5"),
            Err(ParseDealError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_deal_from_raw() {
        let deal = Deal::from_raw("BTCUSDT", "Buy", "1000", "1,200,000").unwrap();
        assert_eq!(deal.symbol, "BTCUSDT");
        assert_eq!(deal.side, Side::Buy);
        assert_eq!(deal.timestamp, 1000);
        assert_eq!(deal.whole_value(), 1_200_000);
    }

    #[test]
    fn test_deal_from_raw_bad_field() {
        let err = Deal::from_raw("BTCUSDT", "Buy", "1000", "lots").unwrap_err();
        assert_eq!(err, ParseDealError::InvalidValue("lots".to_string()));
    }

    #[test]
    fn test_whole_value_truncates() {
        let deal = Deal::new("BTCUSDT", Side::Sell, 1, Decimal::from_str("500000.99").unwrap());
        assert_eq!(deal.whole_value(), 500_000);

        let huge = Deal::new("BTCUSDT", Side::Buy, 1, Decimal::MAX);
        assert_eq!(huge.whole_value(), i64::MAX);
    }
}
