//! Devcoin CLI utilities
//!
//! Provides network selection for the Devcoin command line tools.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod chainspec;

pub use chainspec::{chain_value_parser, DevcoinChainSpecParser, SUPPORTED_CHAINS};
