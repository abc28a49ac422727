//! Difficulty adjustment for Devcoin
//!
//! Two retarget algorithms are in consensus, selected by the height of the
//! last block:
//!
//! - [`RetargetAlgorithm::Legacy`] below [`CURRENT_ALGORITHM_HEIGHT`]. It
//!   retargets every two weeks until [`SMOOTH_RETARGET_HEIGHT`], then on every
//!   block over a one day window. Above [`MEDIAN_RETARGET_HEIGHT`] the window's
//!   average target and a trimmed-median timespan replace the last target and
//!   the plain first-to-last timespan.
//! - [`RetargetAlgorithm::Current`] from [`CURRENT_ALGORITHM_HEIGHT`] on: the
//!   classic once-per-interval retarget.
//!
//! Historical blocks are validated with the rule that was active at their
//! height, so neither algorithm may change.

use crate::{
    compact::{decode_compact, encode_compact},
    index::BlockRef,
    RetargetError,
};
use alloy_primitives::{U256, U512};
use devcoin_chainspec::ChainParams;
use tracing::{debug, trace};

/// First last-block height retargeted with [`RetargetAlgorithm::Current`]
pub const CURRENT_ALGORITHM_HEIGHT: u64 = 150_000;

/// Legacy: from this height the target changes on every block
pub const SMOOTH_RETARGET_HEIGHT: u64 = 10_700;

/// Legacy: above this height the median timespan and average target are used
pub const MEDIAN_RETARGET_HEIGHT: u64 = 10_800;

/// Legacy: blocks below this height keep their predecessor's target
pub const BOOTSTRAP_HEIGHT: u64 = 10;

/// Legacy: retarget period multiplier before [`SMOOTH_RETARGET_HEIGHT`]
const LEGACY_TIMESPAN_FACTOR: i64 = 14;

/// Timestamps dropped at each end of the sorted legacy window
const MEDIAN_TRIM: usize = 6;

/// Retarget rule in force for a block height
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetargetAlgorithm {
    /// Two-week, then smoothed per-block retargeting
    Legacy,
    /// Once-per-interval retargeting
    Current,
}

impl RetargetAlgorithm {
    /// Algorithm used to compute the successor of a block at `height`
    pub const fn for_height(height: u64) -> Self {
        if height >= CURRENT_ALGORITHM_HEIGHT { Self::Current } else { Self::Legacy }
    }

    /// Compact target required for the block following `last`
    pub fn next_bits(
        self,
        last: BlockRef<'_>,
        candidate_time: u32,
        params: &ChainParams,
    ) -> Result<u32, RetargetError> {
        match self {
            Self::Legacy => next_bits_legacy(last, i64::from(candidate_time), params),
            Self::Current => next_bits_current(last, i64::from(candidate_time), params),
        }
    }
}

/// Compact target required for the block following `last`.
///
/// `last` is `None` only for the genesis block, which gets the network's
/// proof-of-work limit.
pub fn next_required_bits(
    last: Option<BlockRef<'_>>,
    candidate_time: u32,
    params: &ChainParams,
) -> Result<u32, RetargetError> {
    let Some(last) = last else { return Ok(encode_compact(params.proof_of_work_limit)) };
    RetargetAlgorithm::for_height(last.height).next_bits(last, candidate_time, params)
}

fn next_bits_current(
    last: BlockRef<'_>,
    candidate_time: i64,
    params: &ChainParams,
) -> Result<u32, RetargetError> {
    let interval = interval(params.target_timespan, params.target_spacing)?;

    // Only change once per interval
    if (last.height + 1) % interval != 0 {
        return Ok(between_retargets(last, candidate_time, interval, params))
    }

    // Go back by what we want to be one interval worth of blocks
    let first = last
        .ancestors()
        .nth(interval as usize - 1)
        .ok_or(RetargetError::MissingAncestors { height: last.height, needed: interval as i64 - 1 })?;

    let actual_timespan = last.block_time() - first.block_time();
    let target = widen(decode_compact(last.bits).target);
    Ok(retarget(last.bits, target, actual_timespan, params.target_timespan, params))
}

fn next_bits_legacy(
    last: BlockRef<'_>,
    candidate_time: i64,
    params: &ChainParams,
) -> Result<u32, RetargetError> {
    let target_timespan = if last.height < SMOOTH_RETARGET_HEIGHT {
        params.target_timespan * LEGACY_TIMESPAN_FACTOR
    } else {
        params.target_timespan
    };
    let interval = interval(target_timespan, params.target_spacing)?;

    if last.height < BOOTSTRAP_HEIGHT {
        return Ok(last.bits)
    }

    // Change at each block after the smoothing height
    if last.height < SMOOTH_RETARGET_HEIGHT && (last.height + 1) % interval != 0 {
        return Ok(between_retargets(last, candidate_time, interval, params))
    }

    let window = interval as usize - 1;
    let mut first = last;
    let mut times = Vec::with_capacity(window);
    let mut sum = U512::ZERO;
    for _ in 0..window {
        sum += widen(decode_compact(first.bits).target);
        times.push(first.block_time());
        first = first.prev().ok_or(RetargetError::MissingAncestors {
            height: last.height,
            needed: window as i64,
        })?;
    }

    let (actual_timespan, target) = if last.height > MEDIAN_RETARGET_HEIGHT {
        let average = sum / U512::from(window as u64);
        (median_timespan(times, window)?, average)
    } else {
        (last.block_time() - first.block_time(), widen(decode_compact(last.bits).target))
    };

    Ok(retarget(last.bits, target, actual_timespan, target_timespan, params))
}

/// Bits for a block that is not on a retarget boundary.
///
/// On networks allowing minimum-difficulty blocks, a block arriving more than
/// two spacings after its predecessor may use the proof-of-work limit.
/// Otherwise the last target not set by that exception applies.
fn between_retargets(
    last: BlockRef<'_>,
    candidate_time: i64,
    interval: u64,
    params: &ChainParams,
) -> u32 {
    if !params.allow_min_difficulty_blocks {
        return last.bits
    }

    let limit_bits = encode_compact(params.proof_of_work_limit);
    if candidate_time > last.block_time() + params.target_spacing * 2 {
        trace!(target: "devcoin::retarget", height = last.height + 1, "min-difficulty block allowed");
        return limit_bits
    }

    let mut block = last;
    while let Some(prev) = block.prev() &&
        block.height % interval != 0 &&
        block.bits == limit_bits
    {
        block = prev;
    }
    block.bits
}

/// Time between the 6th lowest and 6th highest timestamp of the window,
/// scaled back up to the window length
fn median_timespan(mut times: Vec<i64>, window: usize) -> Result<i64, RetargetError> {
    let len = times.len();
    if len <= 2 * MEDIAN_TRIM {
        return Err(RetargetError::WindowTooSmall { len })
    }
    let end = len - MEDIAN_TRIM;
    times.sort_unstable();

    // integer factor, applied after the subtraction
    let factor = (window / (end - MEDIAN_TRIM)) as i64;
    Ok((times[end] - times[MEDIAN_TRIM]) * factor)
}

/// Scale `target` by `actual / target_timespan`, bounded to a factor of four
/// either way and to the network's proof-of-work limit
fn retarget(
    last_bits: u32,
    target: U512,
    actual_timespan: i64,
    target_timespan: i64,
    params: &ChainParams,
) -> u32 {
    let bounded = actual_timespan.clamp(target_timespan / 4, target_timespan * 4);

    let mut new_target = target * U512::from(bounded as u64) / U512::from(target_timespan as u64);
    if new_target > widen(params.proof_of_work_limit) {
        new_target = widen(params.proof_of_work_limit);
    }
    let new_bits = encode_compact(narrow(new_target));

    debug!(
        target: "devcoin::retarget",
        target_timespan,
        actual_timespan,
        bounded,
        before = format!("{last_bits:08x}"),
        after = format!("{new_bits:08x}"),
        "retarget"
    );
    new_bits
}

fn interval(target_timespan: i64, target_spacing: i64) -> Result<u64, RetargetError> {
    let interval = if target_spacing > 0 { target_timespan / target_spacing } else { 0 };
    // the window walks back interval - 1 blocks
    if interval < 2 {
        return Err(RetargetError::InvalidInterval { interval })
    }
    Ok(interval as u64)
}

fn widen(value: U256) -> U512 {
    let mut limbs = [0u64; 8];
    limbs[..4].copy_from_slice(value.as_limbs());
    U512::from_limbs(limbs)
}

// Callers only narrow values already bounded by a 256-bit limit.
fn narrow(value: U512) -> U256 {
    let limbs = value.as_limbs();
    U256::from_limbs([limbs[0], limbs[1], limbs[2], limbs[3]])
}
