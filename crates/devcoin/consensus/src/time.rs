//! Block timestamps for mining
//!
//! Node time is the local clock corrected by the median offset reported by
//! peers. Block templates are stamped with it, but never earlier than one
//! second past the parent's median time past.

use crate::{difficulty::next_required_bits, header::BlockHeader, index::BlockRef, RetargetError};
use devcoin_chainspec::ChainParams;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::trace;

/// Source of network-adjusted time
pub trait AdjustedTime {
    /// Seconds since the Unix epoch, corrected for peer clock offsets
    fn adjusted_time(&self) -> i64;
}

/// Local clock plus a peer-derived offset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemAdjustedTime {
    offset: i64,
}

impl SystemAdjustedTime {
    /// Clock with the given offset in seconds
    pub const fn new(offset: i64) -> Self {
        Self { offset }
    }

    /// Current offset in seconds
    pub const fn offset(&self) -> i64 {
        self.offset
    }

    /// Replace the offset, e.g. after a new peer sample
    pub const fn set_offset(&mut self, offset: i64) {
        self.offset = offset;
    }
}

impl AdjustedTime for SystemAdjustedTime {
    fn adjusted_time(&self) -> i64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs() as i64)
            .unwrap_or_default();
        now + self.offset
    }
}

/// Clock that always reads the same instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedTime(pub i64);

impl AdjustedTime for FixedTime {
    fn adjusted_time(&self) -> i64 {
        self.0
    }
}

/// Refresh the timestamp of a candidate block built on `prev`.
///
/// On networks allowing minimum-difficulty blocks the new timestamp can change
/// the required target, so `bits` is recomputed as well.
pub fn update_time(
    candidate: &mut BlockHeader,
    prev: BlockRef<'_>,
    clock: &impl AdjustedTime,
    params: &ChainParams,
) -> Result<(), RetargetError> {
    let time = (prev.median_time_past() + 1).max(clock.adjusted_time());
    candidate.time = time.clamp(0, i64::from(u32::MAX)) as u32;

    if params.allow_min_difficulty_blocks {
        candidate.bits = next_required_bits(Some(prev), candidate.time, params)?;
    }
    trace!(
        target: "devcoin::miner",
        time = candidate.time,
        bits = format!("{:08x}", candidate.bits),
        "updated candidate time"
    );
    Ok(())
}
