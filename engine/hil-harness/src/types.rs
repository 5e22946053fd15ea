//! Market event data model

use core::fmt;
use serde::{Deserialize, Serialize};

/// Fixed-point prices carry six decimal places
pub const PRICE_SCALE: f64 = 1_000_000.0;

/// Classification of a market event. Discriminants are the stable wire codes.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    Add = 0x41,
    Execute = 0x45,
    Cancel = 0x58,
    Delete = 0x44,
}

impl MessageKind {
    pub const ALL: [MessageKind; 4] =
        [MessageKind::Add, MessageKind::Execute, MessageKind::Cancel, MessageKind::Delete];

    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x41 => Some(MessageKind::Add),
            0x45 => Some(MessageKind::Execute),
            0x58 => Some(MessageKind::Cancel),
            0x44 => Some(MessageKind::Delete),
            _ => None,
        }
    }
}

/// Pack up to four ASCII bytes of `symbol` into a big-endian word. Shorter symbols are
/// zero-padded on the right; anything past the fourth byte is ignored.
pub fn entity_code(symbol: &str) -> u32 {
    symbol
        .bytes()
        .take(4)
        .enumerate()
        .fold(0u32, |code, (i, b)| code | (u32::from(b) << (24 - i * 8)))
}

/// Inverse of [`entity_code`] for display. Padding bytes are dropped.
pub fn entity_symbol(code: u32) -> String {
    code.to_be_bytes().iter().filter(|&&b| b != 0).map(|&b| b as char).collect()
}

/// Convert a decimal price to the device's fixed-point representation
pub fn fixed_point(price: f64) -> u32 {
    (price * PRICE_SCALE).round().clamp(0.0, u32::MAX as f64) as u32
}

/// Convert a fixed-point price back to decimal
pub fn to_decimal(price: u32) -> f64 {
    f64::from(price) / PRICE_SCALE
}

/// One logical market event as injected into the device
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketEvent {
    pub entity_code: u32,
    /// Fixed-point, scale 1e-6
    pub price: u32,
    pub volume: u32,
    pub kind: MessageKind,
    /// Wall-clock stamp from the generator; never used for timing decisions
    pub timestamp_micros: u64,
}

impl MarketEvent {
    pub fn new(entity_code: u32, price: u32, volume: u32, kind: MessageKind) -> Self {
        Self { entity_code, price, volume, kind, timestamp_micros: 0 }
    }

    /// Input word layout: entity code in bits 63..32, price in bits 31..0
    #[inline]
    pub fn packed_word(&self) -> u64 {
        (u64::from(self.entity_code) << 32) | u64::from(self.price)
    }
}

impl fmt::Display for MarketEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:?} {:.6} x {}",
            entity_symbol(self.entity_code),
            self.kind,
            to_decimal(self.price),
            self.volume
        )
    }
}

/// An execution observed on the device outputs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionEvent {
    pub entity_code: u32,
    pub price: u32,
    pub volume: u32,
    /// Cycles between the start of the wait and the execution appearing
    pub latency_cycles: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_codes_pack_big_endian() {
        assert_eq!(entity_code("AAPL"), 0x4141_504C);
        assert_eq!(entity_code("GOOGL"), 0x474F_4F47);
        assert_eq!(entity_code("MSFT"), 0x4D53_4654);
        assert_eq!(entity_code("TSLA"), 0x5453_4C41);
        assert_eq!(entity_code("NVDA"), 0x4E56_4441);
        assert_eq!(entity_code("GE"), 0x4745_0000);
        assert_eq!(entity_code(""), 0);
    }

    #[test]
    fn entity_symbol_reverses_packing() {
        assert_eq!(entity_symbol(entity_code("AAPL")), "AAPL");
        assert_eq!(entity_symbol(entity_code("GOOGL")), "GOOG");
        assert_eq!(entity_symbol(entity_code("GE")), "GE");
    }

    #[test]
    fn message_kind_codes_are_stable() {
        assert_eq!(MessageKind::Add.code(), 0x41);
        assert_eq!(MessageKind::Execute.code(), 0x45);
        assert_eq!(MessageKind::Cancel.code(), 0x58);
        assert_eq!(MessageKind::Delete.code(), 0x44);
        for kind in MessageKind::ALL {
            assert_eq!(MessageKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(MessageKind::from_code(0x00), None);
    }

    #[test]
    fn packed_word_layout() {
        let ev = MarketEvent::new(0x4141_5054, 150_000_000, 100, MessageKind::Add);
        assert_eq!(ev.packed_word(), 0x4141_5054_08F0_D180);
    }

    #[test]
    fn fixed_point_conversion() {
        assert_eq!(fixed_point(150.0), 150_000_000);
        assert_eq!(fixed_point(0.000001), 1);
        assert_eq!(fixed_point(-3.0), 0);
        assert!((to_decimal(150_250_000) - 150.25).abs() < 1e-12);
    }
}
