//! Merge-mining (AuxPoW) gate
//!
//! From the network's activation height a block may be secured by the
//! proof-of-work of a parent chain block instead of its own hash. The proof
//! structure itself (coinbase merkle branches, chain merkle tree) is verified
//! by the [`AuxProof`] implementation; this module decides which hash has to
//! meet the target and binds merge-mined headers to our chain identifier.
//!
//! Replay of one parent block's work across chains is prevented in layers.
//! The gate enforces our chain ID in the header version on mainnet. The proof
//! rejects a parent carrying that same ID and fixes our slot in the chain
//! merkle tree.

use crate::{header::BlockHeader, pow::check_hash, PowError};
use alloy_primitives::B256;
use devcoin_chainspec::ChainParams;
use std::fmt::Debug;
use tracing::debug;

/// Merge-mining proof linking a header to a parent chain block
pub trait AuxProof: Debug + Send + Sync {
    /// Verify that the proof commits to `block_hash` for chain `chain_id`
    fn check(&self, block_hash: B256, chain_id: u32) -> bool;

    /// Hash of the parent chain block whose work secures this header
    fn parent_block_hash(&self) -> B256;
}

/// Height a header is validated at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationHeight {
    /// Known position in the chain
    At(u64),
    /// Position not yet known (block templates, unconnected headers).
    ///
    /// Treated as above every activation height, without chain ID binding.
    Any,
}

impl From<u64> for ValidationHeight {
    fn from(height: u64) -> Self {
        Self::At(height)
    }
}

/// Check a header's proof-of-work, directly or through its merge-mining proof.
pub fn check_header_proof_of_work(
    header: &BlockHeader,
    height: ValidationHeight,
    params: &ChainParams,
) -> Result<(), PowError> {
    if !header.is_aux_pow_consistent() {
        debug!(
            target: "devcoin::auxpow",
            flag = header.has_aux_pow_flag(),
            proof = header.aux_pow().is_some(),
            "AUX POW flag does not match proof"
        );
        return Err(PowError::InconsistentProofFlag {
            flag: header.has_aux_pow_flag(),
            proof: header.aux_pow().is_some(),
        })
    }

    if let ValidationHeight::At(height) = height &&
        height < params.aux_pow_start_height
    {
        if header.aux_pow().is_some() {
            debug!(target: "devcoin::auxpow", height, "AUX POW is not allowed at this block");
            return Err(PowError::UnexpectedMergeProof {
                height,
                start: params.aux_pow_start_height,
            })
        }
        return check_hash(header.pow_hash(), header.bits, params)
    }

    if !params.is_test_network() &&
        height != ValidationHeight::Any &&
        header.chain_id() != params.aux_pow_chain_id
    {
        debug!(
            target: "devcoin::auxpow",
            chain_id = header.chain_id(),
            expected = params.aux_pow_chain_id,
            "block does not have our chain ID"
        );
        return Err(PowError::WrongChainId {
            expected: params.aux_pow_chain_id,
            actual: header.chain_id(),
        })
    }

    let Some(aux_pow) = header.aux_pow() else {
        return check_hash(header.pow_hash(), header.bits, params)
    };

    let block_hash = header.block_hash();
    if !aux_pow.check(block_hash, header.chain_id()) {
        debug!(target: "devcoin::auxpow", %block_hash, "AUX POW is not valid");
        return Err(PowError::InvalidMergeProof { block_hash })
    }

    let parent_hash = aux_pow.parent_block_hash();
    check_hash(parent_hash, header.bits, params).map_err(|err| {
        debug!(target: "devcoin::auxpow", %parent_hash, %err, "AUX proof of work failed");
        PowError::InsufficientParentWork { parent_hash, bits: header.bits }
    })
}
