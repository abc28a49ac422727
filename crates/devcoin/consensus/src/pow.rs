//! Proof-of-work range and hash checks

use crate::{compact::decode_compact, header::hash_to_u256, PowError};
use alloy_primitives::{B256, U256};
use devcoin_chainspec::ChainParams;
use tracing::debug;

/// Check that `hash` satisfies the compact target `bits`.
///
/// The target must decode to a positive value no higher than the network's
/// proof-of-work limit. When the parameter set skips proof-of-work checks
/// (unit tests only) every input is accepted.
pub fn check_proof_of_work(hash: U256, bits: u32, params: &ChainParams) -> Result<(), PowError> {
    if params.skip_proof_of_work_check {
        return Ok(())
    }

    let decoded = decode_compact(bits);

    // Check range
    if !decoded.is_valid() || decoded.target > params.proof_of_work_limit {
        debug!(
            target: "devcoin::pow",
            bits = format!("{bits:#010x}"),
            negative = decoded.negative,
            overflow = decoded.overflow,
            "nBits below minimum work"
        );
        return Err(PowError::InvalidTarget { bits })
    }

    // Check proof of work matches claimed amount
    if hash > decoded.target {
        debug!(
            target: "devcoin::pow",
            %hash,
            target_value = %decoded.target,
            "hash doesn't match nBits"
        );
        return Err(PowError::InsufficientWork { hash, bits, target: decoded.target })
    }

    Ok(())
}

/// [`check_proof_of_work`] for a display-order block hash
pub fn check_hash(hash: B256, bits: u32, params: &ChainParams) -> Result<(), PowError> {
    check_proof_of_work(hash_to_u256(hash), bits, params)
}
