//! Compact target encoding ("nBits")
//!
//! A 256-bit target is stored in block headers as a 32-bit floating point
//! like value: the high byte is the size in bytes, the low three bytes are
//! the mantissa. Bit `0x0080_0000` is a sign flag inherited from the OpenSSL
//! bignum encoding; a negative target is never valid.
//!
//! ```text
//! bits   = size << 24 | mantissa
//! target = mantissa * 256^(size - 3)
//! ```
//!
//! Decoding never fails. Negative and overflowing encodings are reported
//! through [`DecodedTarget`] so the caller decides how to reject them.

use alloy_primitives::U256;

/// Sign bit of the compact mantissa
pub const COMPACT_SIGN_BIT: u32 = 0x0080_0000;

/// Mantissa bits of a compact value (sign excluded)
pub const COMPACT_MANTISSA_MASK: u32 = 0x007f_ffff;

/// Result of decoding a compact target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedTarget {
    /// Decoded magnitude (truncated to 256 bits when `overflow` is set)
    pub target: U256,
    /// Sign flag was set on a non-zero mantissa
    pub negative: bool,
    /// Magnitude does not fit in 256 bits
    pub overflow: bool,
}

impl DecodedTarget {
    /// Target is usable for proof-of-work: non-negative, in range and non-zero
    pub fn is_valid(&self) -> bool {
        !self.negative && !self.overflow && !self.target.is_zero()
    }
}

/// Decode a compact target.
pub fn decode_compact(bits: u32) -> DecodedTarget {
    let size = bits >> 24;
    let mut word = bits & COMPACT_MANTISSA_MASK;

    let target = if size <= 3 {
        word >>= 8 * (3 - size);
        U256::from(word)
    } else {
        let shift = 8 * (size as usize - 3);
        if shift >= 256 { U256::ZERO } else { U256::from(word) << shift }
    };

    let negative = word != 0 && (bits & COMPACT_SIGN_BIT) != 0;
    let overflow = word != 0
        && (size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32));

    DecodedTarget { target, negative, overflow }
}

/// Encode a target as compact bits.
///
/// Lossy: only the three most significant bytes survive. The result never has
/// the sign bit set.
pub fn encode_compact(target: U256) -> u32 {
    let mut size = target.bit_len().div_ceil(8) as u32;
    let mut compact = if size <= 3 {
        (target.as_limbs()[0] << (8 * (3 - size))) as u32
    } else {
        (target >> (8 * (size as usize - 3))).as_limbs()[0] as u32
    };

    // The mantissa is signed; keep it positive by moving a byte into the size.
    if compact & COMPACT_SIGN_BIT != 0 {
        compact >>= 8;
        size += 1;
    }

    compact | (size << 24)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn decoded(bits: u32) -> (U256, bool, bool) {
        let d = decode_compact(bits);
        (d.target, d.negative, d.overflow)
    }

    #[test]
    fn test_decode_vectors() {
        assert_eq!(decoded(0), (U256::ZERO, false, false));
        assert_eq!(decoded(0x0012_3456), (U256::ZERO, false, false));
        assert_eq!(decoded(0x0100_3456), (U256::ZERO, false, false));
        assert_eq!(decoded(0x0112_3456), (U256::from(0x12u64), false, false));
        assert_eq!(decoded(0x0200_8000), (U256::from(0x80u64), false, false));
        assert_eq!(decoded(0x0500_9234), (U256::from(0x9234_0000u64), false, false));
        assert_eq!(decoded(0x0412_3456), (U256::from(0x1234_5600u64), false, false));
        assert_eq!(decoded(0x2012_3456).0, U256::from(0x12_3456u64) << 232usize);
        assert_eq!(decoded(0x1d00_ffff).0, U256::from(0xffffu64) << 208usize);
    }

    #[test]
    fn test_decode_flags() {
        // sign bit with a non-zero mantissa
        let d = decode_compact(0x0492_3456);
        assert!(d.negative);
        assert!(!d.is_valid());

        // sign bit with an empty mantissa is just zero
        let d = decode_compact(0x0180_0000);
        assert!(!d.negative);
        assert!(d.target.is_zero());

        // too large for 256 bits
        assert!(decode_compact(0xff12_3456).overflow);
        assert!(decode_compact(0x2301_0000).overflow);
        assert!(!decode_compact(0x2200_0001).overflow);
        assert!(decode_compact(0x2300_0100).overflow);
        assert!(!decode_compact(0x2100_ffff).overflow);
        assert!(decode_compact(0x2101_0000).overflow);
    }

    #[test]
    fn test_encode_vectors() {
        assert_eq!(encode_compact(U256::ZERO), 0);
        assert_eq!(encode_compact(U256::from(0x12u64)), 0x0112_0000);
        assert_eq!(encode_compact(U256::from(0x80u64)), 0x0200_8000);
        assert_eq!(encode_compact(U256::from(0x9234_0000u64)), 0x0500_9234);
        assert_eq!(encode_compact(U256::from(0x1234_5600u64)), 0x0412_3456);
        assert_eq!(encode_compact(U256::from(0xffffu64) << 208usize), 0x1d00_ffff);
        assert_eq!(encode_compact(U256::MAX >> 32usize), 0x1d00_ffff);
        assert_eq!(encode_compact(U256::MAX >> 1usize), 0x207f_ffff);
    }

    #[test]
    fn test_encode_truncates() {
        let target = U256::from(0x1234_5678u64);
        assert_eq!(encode_compact(target), 0x0412_3456);
    }

    proptest! {
        #[test]
        fn compact_round_trip(size in 1u32..=32, word in 1u32..=COMPACT_MANTISSA_MASK) {
            let d = decode_compact(size << 24 | word);
            prop_assume!(d.is_valid());
            let again = decode_compact(encode_compact(d.target));
            prop_assert_eq!(again, DecodedTarget { target: d.target, negative: false, overflow: false });
        }

        #[test]
        fn encoding_never_sets_sign_bit(limbs in any::<[u64; 4]>()) {
            let bits = encode_compact(U256::from_limbs(limbs));
            prop_assert_eq!(bits & COMPACT_SIGN_BIT, 0);
        }
    }
}
