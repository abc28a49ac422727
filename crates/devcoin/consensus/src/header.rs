//! Block header view used by proof-of-work validation
//!
//! Only the fields consensus needs here are modelled. The version field
//! doubles as merge-mining metadata:
//!
//! ```text
//! bits 31..16  chain identifier
//! bit  8       merge-mining proof attached
//! bits 7..0    block version
//! ```

use crate::auxpow::AuxProof;
use alloy_primitives::{B256, U256};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Version flag marking a header that carries a merge-mining proof
pub const VERSION_AUXPOW: u32 = 1 << 8;

/// Multiplier of the chain identifier inside the version field
pub const VERSION_CHAIN_START: u32 = 1 << 16;

/// Size of the serialized header in bytes
pub const HEADER_SIZE: usize = 80;

/// Devcoin block header.
///
/// Hashes (`prev_block`, `merkle_root` and the values returned by
/// [`BlockHeader::block_hash`]) are kept in display byte order, so they read
/// the same as in RPC output and compare as big-endian integers.
#[derive(Debug, Clone, Default)]
pub struct BlockHeader {
    /// Version with merge-mining flag and chain identifier
    pub version: u32,
    /// Hash of the previous block
    pub prev_block: B256,
    /// Merkle root of the block's transactions
    pub merkle_root: B256,
    /// Block timestamp (seconds since the Unix epoch)
    pub time: u32,
    /// Compact proof-of-work target
    pub bits: u32,
    /// Nonce
    pub nonce: u32,
    /// Merge-mining proof, kept in step with [`VERSION_AUXPOW`]
    aux_pow: Option<Arc<dyn AuxProof>>,
}

impl BlockHeader {
    /// Create a header without a merge-mining proof.
    ///
    /// `version` is taken as-is; a header parsed from the wire may claim the
    /// merge-mining flag before its proof has been attached.
    pub const fn new(
        version: u32,
        prev_block: B256,
        merkle_root: B256,
        time: u32,
        bits: u32,
        nonce: u32,
    ) -> Self {
        Self { version, prev_block, merkle_root, time, bits, nonce, aux_pow: None }
    }

    /// Chain identifier encoded in the version
    pub const fn chain_id(&self) -> u32 {
        self.version / VERSION_CHAIN_START
    }

    /// Replace the chain identifier, keeping the low version bits
    pub const fn set_chain_id(&mut self, chain_id: u32) {
        self.version = (self.version % VERSION_CHAIN_START) | chain_id.wrapping_mul(VERSION_CHAIN_START);
    }

    /// Base version without flags or chain identifier
    pub const fn base_version(&self) -> u32 {
        self.version % VERSION_AUXPOW
    }

    /// Whether the version claims a merge-mining proof
    pub const fn has_aux_pow_flag(&self) -> bool {
        self.version & VERSION_AUXPOW != 0
    }

    /// Attached merge-mining proof
    pub fn aux_pow(&self) -> Option<&Arc<dyn AuxProof>> {
        self.aux_pow.as_ref()
    }

    /// Attach or remove the merge-mining proof, updating the version flag to match
    pub fn set_aux_pow(&mut self, aux_pow: Option<Arc<dyn AuxProof>>) {
        if aux_pow.is_some() {
            self.version |= VERSION_AUXPOW;
        } else {
            self.version &= !VERSION_AUXPOW;
        }
        self.aux_pow = aux_pow;
    }

    /// Attach a proof without touching the version flag.
    ///
    /// Deserializers fill the slot from the wire independently of the flag.
    pub fn set_aux_pow_unchecked(&mut self, aux_pow: Option<Arc<dyn AuxProof>>) {
        self.aux_pow = aux_pow;
    }

    /// Version flag and proof slot agree
    pub const fn is_aux_pow_consistent(&self) -> bool {
        self.has_aux_pow_flag() == self.aux_pow.is_some()
    }

    /// Consensus serialization of the 80-byte header
    pub fn serialize(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&self.version.to_le_bytes());
        out[4..36].copy_from_slice(&reversed(&self.prev_block));
        out[36..68].copy_from_slice(&reversed(&self.merkle_root));
        out[68..72].copy_from_slice(&self.time.to_le_bytes());
        out[72..76].copy_from_slice(&self.bits.to_le_bytes());
        out[76..80].copy_from_slice(&self.nonce.to_le_bytes());
        out
    }

    /// Block identity hash
    pub fn block_hash(&self) -> B256 {
        double_sha256(&self.serialize())
    }

    /// Hash compared against the target when the block is mined directly
    pub fn pow_hash(&self) -> B256 {
        self.block_hash()
    }
}

/// Double SHA-256, returned in display byte order
pub fn double_sha256(data: &[u8]) -> B256 {
    let digest = Sha256::digest(Sha256::digest(data));
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out.reverse();
    B256::from(out)
}

/// Interpret a display-order hash as a 256-bit integer
pub fn hash_to_u256(hash: B256) -> U256 {
    U256::from_be_bytes(hash.0)
}

fn reversed(hash: &B256) -> [u8; 32] {
    let mut bytes = hash.0;
    bytes.reverse();
    bytes
}
