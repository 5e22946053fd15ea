//! Host float <-> device bit-pattern conversion
//!
//! The device carries doubles as raw IEEE-754 words. Both directions are bit-exact:
//! signed zero and NaN payloads survive the trip.

#[inline]
pub fn f64_to_bits(value: f64) -> u64 {
    value.to_bits()
}

#[inline]
pub fn bits_to_f64(bits: u64) -> f64 {
    f64::from_bits(bits)
}

/// Two's-complement word for a signed 32-bit device input
#[inline]
pub fn i32_to_word(value: i32) -> u64 {
    u64::from(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_special_values_keep_their_bits() {
        for value in [0.0, -0.0, f64::INFINITY, f64::NEG_INFINITY, f64::MIN_POSITIVE, 150.0] {
            assert_eq!(bits_to_f64(f64_to_bits(value)).to_bits(), value.to_bits());
        }
        let payload_nan = f64::from_bits(0x7FF8_0000_0000_BEEF);
        assert_eq!(f64_to_bits(payload_nan), 0x7FF8_0000_0000_BEEF);
    }

    #[test]
    fn test_inventory_word_is_twos_complement() {
        assert_eq!(i32_to_word(0), 0);
        assert_eq!(i32_to_word(-1), 0xFFFF_FFFF);
        assert_eq!(i32_to_word(i32::MIN), 0x8000_0000);
    }

    proptest! {
        #[test]
        fn bit_patterns_round_trip(bits in any::<u64>()) {
            prop_assert_eq!(f64_to_bits(bits_to_f64(bits)), bits);
        }

        #[test]
        fn values_round_trip(value in any::<f64>()) {
            prop_assert_eq!(bits_to_f64(f64_to_bits(value)).to_bits(), value.to_bits());
        }
    }
}
