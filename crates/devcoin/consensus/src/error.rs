//! Devcoin proof-of-work error types

use alloy_primitives::{B256, U256};
use thiserror::Error;

/// Reasons a block's proof-of-work is rejected.
///
/// These are routine consensus outcomes, not programming errors: the
/// candidate block is invalid and the caller drops it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PowError {
    /// Compact target is negative, overflowed, zero or above the network limit
    #[error("nBits {bits:#010x} below minimum work")]
    InvalidTarget {
        /// Claimed compact target
        bits: u32,
    },

    /// Hash does not meet the claimed target
    #[error("hash {hash} doesn't match nBits {bits:#010x} (target {target})")]
    InsufficientWork {
        /// Proof-of-work hash as an integer
        hash: U256,
        /// Claimed compact target
        bits: u32,
        /// Decoded target
        target: U256,
    },

    /// Merge-mined header carries another chain's identifier
    #[error("block does not have our chain ID: expected {expected:#06x}, got {actual:#06x}")]
    WrongChainId {
        /// This network's chain identifier
        expected: u32,
        /// Identifier found in the header version
        actual: u32,
    },

    /// Merge-mining proof attached below the activation height
    #[error("AUX POW is not allowed at height {height} (starts at {start})")]
    UnexpectedMergeProof {
        /// Height being validated
        height: u64,
        /// Activation height of merge-mining
        start: u64,
    },

    /// Merge-mining proof failed its own verification
    #[error("AUX POW is not valid for block {block_hash}")]
    InvalidMergeProof {
        /// Identity hash of the merge-mined header
        block_hash: B256,
    },

    /// Parent chain block hash does not meet the claimed target
    #[error("AUX proof of work failed: parent block {parent_hash} vs nBits {bits:#010x}")]
    InsufficientParentWork {
        /// Parent chain block hash
        parent_hash: B256,
        /// Claimed compact target
        bits: u32,
    },

    /// Version flag and attached proof disagree
    #[error("AUX POW version flag is {flag} but proof attached is {proof}")]
    InconsistentProofFlag {
        /// Value of the version flag
        flag: bool,
        /// Whether a proof is attached
        proof: bool,
    },
}

/// Malformed chain index encountered while computing the next target.
///
/// A correctly built index never produces these; they guard against reading
/// past the start of the chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetargetError {
    /// Lookback window reaches past the first indexed block
    #[error("block {height} has fewer than {needed} ancestors for retargeting")]
    MissingAncestors {
        /// Height of the last block
        height: u64,
        /// Number of ancestors the window needs
        needed: i64,
    },

    /// Window too short for the trimmed median
    #[error("retarget window of {len} blocks is too small for the median timespan")]
    WindowTooSmall {
        /// Number of timestamps collected
        len: usize,
    },

    /// Parameters produce an empty retarget interval
    #[error("invalid retarget interval {interval}")]
    InvalidInterval {
        /// Computed interval
        interval: i64,
    },
}
