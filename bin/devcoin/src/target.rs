//! Compact target inspection commands

use alloy_primitives::{B256, U256};
use clap::Args;
use devcoin_chainspec::ChainParams;
use devcoin_consensus::{decode_compact, encode_compact, pow::check_hash, work_of};
use eyre::{eyre, WrapErr};

/// Parse compact bits given in hex, with or without a `0x` prefix
pub(crate) fn parse_bits(s: &str) -> eyre::Result<u32> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    u32::from_str_radix(digits, 16).wrap_err_with(|| format!("invalid compact bits `{s}`"))
}

#[derive(Debug, Args)]
pub(crate) struct DecodeArgs {
    /// Compact bits in hex
    #[arg(value_parser = parse_bits)]
    bits: u32,
}

impl DecodeArgs {
    pub(crate) fn run(&self) -> eyre::Result<()> {
        let decoded = decode_compact(self.bits);
        println!("bits:     {:#010x}", self.bits);
        println!("target:   {:#x}", decoded.target);
        println!("negative: {}", decoded.negative);
        println!("overflow: {}", decoded.overflow);
        println!("work:     {}", work_of(self.bits));
        Ok(())
    }
}

#[derive(Debug, Args)]
pub(crate) struct EncodeArgs {
    /// Target as a `0x`-prefixed hex or decimal integer
    target: U256,
}

impl EncodeArgs {
    pub(crate) fn run(&self) -> eyre::Result<()> {
        let bits = encode_compact(self.target);
        println!("{bits:#010x}");
        Ok(())
    }
}

#[derive(Debug, Args)]
pub(crate) struct CheckArgs {
    /// Block hash in display byte order
    hash: B256,

    /// Compact bits in hex
    #[arg(value_parser = parse_bits)]
    bits: u32,
}

impl CheckArgs {
    pub(crate) fn run(&self, params: &ChainParams) -> eyre::Result<()> {
        check_hash(self.hash, self.bits, params)
            .map_err(|err| eyre!("{} on {}: {err}", self.hash, params.network))?;
        println!("ok");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devcoin_chainspec::DEVCOIN_MAINNET;

    #[test]
    fn parse_bits_with_and_without_prefix() {
        assert_eq!(parse_bits("0x1d00ffff").unwrap(), 0x1d00_ffff);
        assert_eq!(parse_bits("207fffff").unwrap(), 0x207f_ffff);
        assert!(parse_bits("0x1d00ffff00").is_err());
        assert!(parse_bits("zz").is_err());
    }

    #[test]
    fn check_reports_failures() {
        let args = CheckArgs { hash: B256::repeat_byte(0xff), bits: 0x1d00_ffff };
        let err = args.run(&DEVCOIN_MAINNET).unwrap_err();
        assert!(err.to_string().contains("doesn't match nBits"));

        let args = CheckArgs { hash: B256::ZERO, bits: 0x1d00_ffff };
        assert!(args.run(&DEVCOIN_MAINNET).is_ok());
    }
}
