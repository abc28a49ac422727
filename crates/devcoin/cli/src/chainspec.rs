//! Devcoin chain parameter parser

use devcoin_chainspec::{ChainParams, Network};
use eyre::WrapErr;
use std::sync::Arc;

/// Chains supported by Devcoin
pub const SUPPORTED_CHAINS: &[&str] =
    &["main", "mainnet", "devcoin", "test", "testnet", "regtest", "unittest"];

/// Parse a network name, or the path of a JSON parameter file, into chain parameters
pub fn chain_value_parser(s: &str) -> eyre::Result<Arc<ChainParams>, eyre::Error> {
    if let Some(network) = Network::from_name(&s.to_lowercase()) {
        return Ok(Arc::new(network.params().clone()))
    }
    let params = ChainParams::from_json_file(s)
        .wrap_err_with(|| format!("`{s}` is neither a known network nor a parameter file"))?;
    Ok(Arc::new(params))
}

/// Devcoin chain parameter parser
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct DevcoinChainSpecParser;

impl DevcoinChainSpecParser {
    /// Chains accepted by name
    pub const SUPPORTED_CHAINS: &'static [&'static str] = SUPPORTED_CHAINS;

    /// Default chain for the command line
    pub const fn default_value() -> &'static str {
        Self::SUPPORTED_CHAINS[0]
    }

    /// Parse chain parameters from a name or file path
    pub fn parse(s: &str) -> eyre::Result<Arc<ChainParams>> {
        chain_value_parser(s)
    }
}
