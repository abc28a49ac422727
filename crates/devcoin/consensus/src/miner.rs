//! Nonce search for test networks and the command line miner
//!
//! Only directly mined headers are searched. Merge-mined blocks are solved by
//! the parent chain's miner.

use crate::{header::BlockHeader, pow::check_hash};
use devcoin_chainspec::ChainParams;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

/// Mining errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MiningError {
    /// No solution found within nonce range
    #[error("no solution found in nonce range {start}..{end}")]
    NoSolution {
        /// First nonce tried
        start: u32,
        /// Nonce after the last one tried
        end: u32,
    },
}

/// Search nonces from `header.nonce` on until the block hash meets
/// `header.bits`, trying at most `max_tries` values.
///
/// On success the header holds the winning nonce, which is also returned.
pub fn solve_header(
    header: &mut BlockHeader,
    params: &ChainParams,
    max_tries: u64,
) -> Result<u32, MiningError> {
    let start = Instant::now();
    let start_nonce = header.nonce;

    debug!(
        target: "devcoin::miner",
        bits = format!("{:08x}", header.bits),
        start_nonce,
        "starting nonce search"
    );

    for tries in 1..=max_tries {
        let hash = header.pow_hash();
        if check_hash(hash, header.bits, params).is_ok() {
            info!(
                target: "devcoin::miner",
                nonce = header.nonce,
                %hash,
                hashes = tries,
                duration_ms = start.elapsed().as_millis(),
                "block solved"
            );
            return Ok(header.nonce)
        }
        header.nonce = header.nonce.wrapping_add(1);
    }

    Err(MiningError::NoSolution { start: start_nonce, end: header.nonce })
}
