//! Chain work accounting (heaviest-chain selection).

use crate::compact::decode_compact;
use alloy_primitives::U256;

/// Expected number of hashes needed to meet the compact target `bits`.
///
/// Work is `floor(2^256 / (target + 1))`. `2^256` does not fit in a `U256`,
/// but since it is at least `target + 1` it equals
/// `((2^256 - target - 1) / (target + 1)) + 1`, i.e.
/// `!target / (target + 1) + 1`.
///
/// Negative, overflowing and zero targets carry no work.
pub fn work_of(bits: u32) -> U256 {
    let decoded = decode_compact(bits);
    if !decoded.is_valid() {
        return U256::ZERO;
    }
    let target = decoded.target;
    (!target / (target + U256::from(1u64))) + U256::from(1u64)
}

/// Total work of a sequence of blocks given their compact targets.
pub fn chain_work<I>(bits: I) -> U256
where
    I: IntoIterator<Item = u32>,
{
    bits.into_iter().fold(U256::ZERO, |acc, bits| acc.saturating_add(work_of(bits)))
}
