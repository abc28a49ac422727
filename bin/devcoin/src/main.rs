//! Devcoin proof-of-work tools
//!
//! Inspect compact targets, check hashes against them and mine short chains
//! on a selected network.
//!
//! Usage:
//!   devcoin-pow decode 0x1d00ffff
//!   devcoin-pow --chain regtest mine --blocks 5

#![allow(missing_docs)]

mod mine;
mod target;

use clap::{Parser, Subcommand};
use devcoin_chainspec::ChainParams;
use devcoin_cli::{chain_value_parser, DevcoinChainSpecParser};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Devcoin proof-of-work tools
#[derive(Debug, Parser)]
#[command(name = "devcoin-pow", version, about)]
struct Cli {
    /// Network name (main, test, regtest, unittest) or path to a JSON parameter file
    #[arg(
        long,
        global = true,
        env = "DEVCOIN_CHAIN",
        default_value = DevcoinChainSpecParser::default_value(),
        value_parser = chain_value_parser
    )]
    chain: Arc<ChainParams>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Decode compact bits into a target
    Decode(target::DecodeArgs),
    /// Encode a target into compact bits
    Encode(target::EncodeArgs),
    /// Check a block hash against compact bits
    Check(target::CheckArgs),
    /// Print the selected network's parameters as JSON
    Params,
    /// Mine a chain of empty headers
    Mine(mine::MineArgs),
}

fn main() {
    // RUST_LOG overrides the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();

    if let Err(err) = run(Cli::parse()) {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> eyre::Result<()> {
    debug!(target: "devcoin::cli", network = %cli.chain.network, "selected chain parameters");
    match cli.command {
        Commands::Decode(args) => args.run(),
        Commands::Encode(args) => args.run(),
        Commands::Check(args) => args.run(&cli.chain),
        Commands::Params => {
            println!("{}", cli.chain.to_json_string()?);
            Ok(())
        }
        Commands::Mine(args) => args.run(cli.chain),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use devcoin_chainspec::Network;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_chain_and_subcommand() {
        let cli = Cli::try_parse_from(["devcoin-pow", "--chain", "regtest", "decode", "0x207fffff"])
            .unwrap();
        assert_eq!(cli.chain.network, Network::Regtest);
        assert!(matches!(cli.command, Commands::Decode(_)));

        let cli = Cli::try_parse_from(["devcoin-pow", "params"]).unwrap();
        assert_eq!(cli.chain.network, Network::Main);
    }

    #[test]
    fn reject_unknown_chain() {
        assert!(Cli::try_parse_from(["devcoin-pow", "--chain", "nope", "params"]).is_err());
    }
}
