//! Devcoin Proof-of-Work Consensus
//!
//! This crate provides the proof-of-work rules of the Devcoin networks:
//! - Compact target (`nBits`) encoding and per-block work
//! - Difficulty retargeting (legacy smoothed algorithm, then per-interval)
//! - Merge-mining (AuxPoW) acceptance and chain ID binding
//! - Block timestamp refresh and a nonce search for test networks
//!
//! # Architecture
//!
//! ```text
//!   ChainParams ──────────────┐
//!                             ▼
//!   ChainIndex ──► difficulty::next_required_bits ──► nBits
//!                             │
//!   BlockHeader ─► auxpow::check_header_proof_of_work ─► pow::check_proof_of_work
//! ```
//!
//! All checks are pure functions of their inputs and the parameter set.
//! [`DevcoinPow`] bundles them behind a shared parameter set.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod auxpow;
pub mod compact;
pub mod difficulty;
mod error;
pub mod header;
pub mod index;
pub mod miner;
pub mod pow;
pub mod time;
pub mod work;

pub use auxpow::{check_header_proof_of_work, AuxProof, ValidationHeight};
pub use compact::{decode_compact, encode_compact, DecodedTarget};
pub use difficulty::{next_required_bits, RetargetAlgorithm};
pub use error::{PowError, RetargetError};
pub use header::BlockHeader;
pub use index::{BlockIndex, BlockRef, ChainIndex, IndexId};
pub use miner::{solve_header, MiningError};
pub use pow::check_proof_of_work;
pub use time::{update_time, AdjustedTime, SystemAdjustedTime};
pub use work::{chain_work, work_of};

use alloy_primitives::U256;
use devcoin_chainspec::ChainParams;
use std::sync::Arc;

/// Devcoin proof-of-work rules bound to one network
#[derive(Debug, Clone)]
pub struct DevcoinPow {
    params: Arc<ChainParams>,
}

impl DevcoinPow {
    /// Create rules for the given parameter set
    pub const fn new(params: Arc<ChainParams>) -> Self {
        Self { params }
    }

    /// Parameter set in use
    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    /// Compact target required for the block following `last`
    pub fn next_required_bits(
        &self,
        last: Option<BlockRef<'_>>,
        candidate_time: u32,
    ) -> Result<u32, RetargetError> {
        next_required_bits(last, candidate_time, &self.params)
    }

    /// Check a proof-of-work hash against a compact target
    pub fn check_proof_of_work(&self, hash: U256, bits: u32) -> Result<(), PowError> {
        check_proof_of_work(hash, bits, &self.params)
    }

    /// Check a header's own or merge-mined proof-of-work
    pub fn check_header(
        &self,
        header: &BlockHeader,
        height: impl Into<ValidationHeight>,
    ) -> Result<(), PowError> {
        check_header_proof_of_work(header, height.into(), &self.params)
    }

    /// Refresh the timestamp (and on test networks the target) of a candidate
    pub fn update_time(
        &self,
        candidate: &mut BlockHeader,
        prev: BlockRef<'_>,
        clock: &impl AdjustedTime,
    ) -> Result<(), RetargetError> {
        update_time(candidate, prev, clock, &self.params)
    }

    /// Work represented by a compact target
    pub fn work_of(&self, bits: u32) -> U256 {
        work_of(bits)
    }
}

impl From<&ChainParams> for DevcoinPow {
    fn from(params: &ChainParams) -> Self {
        Self::new(Arc::new(params.clone()))
    }
}
