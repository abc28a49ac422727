//! Mining command for Devcoin
//!
//! Mines a chain of empty headers from scratch on the selected network. Only
//! practical on networks with an easy proof-of-work limit.

use clap::Args;
use devcoin_chainspec::ChainParams;
use devcoin_consensus::{
    header::double_sha256, solve_header, AdjustedTime, BlockHeader, ChainIndex, DevcoinPow,
    SystemAdjustedTime,
};
use std::sync::Arc;
use tracing::info;

/// Mining command arguments
#[derive(Debug, Args)]
pub(crate) struct MineArgs {
    /// Number of blocks to mine
    #[arg(long, short = 'n', default_value_t = 1)]
    blocks: u64,

    /// Nonces to try per block before giving up
    #[arg(long, default_value_t = 10_000_000)]
    max_tries: u64,

    /// Block version before the chain identifier is applied
    #[arg(long, default_value_t = 1)]
    version: u32,
}

impl MineArgs {
    pub(crate) fn run(&self, params: Arc<ChainParams>) -> eyre::Result<()> {
        let pow = DevcoinPow::new(params);
        let clock = SystemAdjustedTime::default();
        let mut index = ChainIndex::new();

        info!(
            target: "devcoin::mine",
            network = %pow.params().network,
            blocks = self.blocks,
            "Starting Devcoin CPU miner"
        );

        for height in 0..self.blocks {
            let header = self.mine_block(&pow, &index, &clock, height)?;
            pow.check_header(&header, height)?;
            index.push_header(&header);

            println!("{height} {} {:#010x}", header.block_hash(), header.bits);
        }

        info!(target: "devcoin::mine", blocks = index.len(), "Mining complete");
        Ok(())
    }

    fn mine_block(
        &self,
        pow: &DevcoinPow,
        index: &ChainIndex,
        clock: &SystemAdjustedTime,
        height: u64,
    ) -> eyre::Result<BlockHeader> {
        let prev_block = index.tip().map(|tip| tip.hash).unwrap_or_default();
        let merkle_root = double_sha256(&height.to_le_bytes());
        let mut header = BlockHeader::new(self.version, prev_block, merkle_root, 0, 0, 0);
        header.set_chain_id(pow.params().aux_pow_chain_id);

        match index.tip() {
            Some(tip) => pow.update_time(&mut header, tip, clock)?,
            None => header.time = clock.adjusted_time().clamp(0, u32::MAX.into()) as u32,
        }
        header.bits = pow.next_required_bits(index.tip(), header.time)?;

        solve_header(&mut header, pow.params(), self.max_tries)?;
        Ok(header)
    }
}
