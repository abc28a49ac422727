//! Devcoin Chain Specifications
//!
//! Defines the consensus parameters for the Devcoin networks:
//! - Mainnet (`main`)
//! - Testnet (`test`)
//! - Regression test (`regtest`)
//! - Unit test (`unittest`), the only set whose flags may be changed
//!
//! A parameter set is selected once at startup and then passed by reference
//! into every proof-of-work and retarget call. Nothing in this crate holds
//! process-wide mutable state.

use alloy_primitives::{b256, B256, U256};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, path::Path, str::FromStr};

/// Merge-mining chain identifier embedded in every Devcoin block version
pub const DEVCOIN_CHAIN_ID: u32 = 0x0004;

/// One day, in seconds
pub const ONE_DAY: i64 = 24 * 60 * 60;

/// Nominal block spacing, in seconds
pub const TARGET_SPACING: i64 = 10 * 60;

/// Mainnet height at which merge-mined blocks are accepted
pub const MAINNET_AUX_POW_START_HEIGHT: u64 = 25_000;

/// Devcoin mainnet parameters
pub static DEVCOIN_MAINNET: Lazy<ChainParams> = Lazy::new(|| ChainParams {
    network: Network::Main,
    message_start: *b"DEV:",
    default_port: 52333,
    proof_of_work_limit: U256::MAX >> 32usize,
    target_timespan: ONE_DAY,
    target_spacing: TARGET_SPACING,
    subsidy_halving_interval: 210_000,
    allow_min_difficulty_blocks: false,
    skip_proof_of_work_check: false,
    mine_blocks_on_demand: false,
    aux_pow_start_height: MAINNET_AUX_POW_START_HEIGHT,
    aux_pow_chain_id: DEVCOIN_CHAIN_ID,
    checkpoints: mainnet_checkpoints(),
    checkpoint_data: CheckpointData {
        last_checkpoint_time: 1_354_231_672,
        transactions_at_last_checkpoint: 936_858,
        transactions_per_day: 1_000,
    },
    block_upgrade_majority: UpgradeMajority { enforce: 750, reject_outdated: 950, window: 1_000 },
});

/// Devcoin testnet parameters
pub static DEVCOIN_TESTNET: Lazy<ChainParams> = Lazy::new(|| ChainParams {
    network: Network::Test,
    message_start: *b"dev-",
    default_port: 62333,
    proof_of_work_limit: U256::MAX >> 28usize,
    allow_min_difficulty_blocks: true,
    mine_blocks_on_demand: true,
    aux_pow_start_height: 0,
    checkpoints: BTreeMap::from([(
        0,
        b256!("00000000fc09a99bd5116e9cedcad35d2145962799e58bbfd66ebdeb4e95235f"),
    )]),
    checkpoint_data: CheckpointData {
        last_checkpoint_time: 1_387_426_393,
        transactions_at_last_checkpoint: 1,
        transactions_per_day: 1,
    },
    block_upgrade_majority: UpgradeMajority { enforce: 51, reject_outdated: 75, window: 100 },
    ..DEVCOIN_MAINNET.clone()
});

/// Devcoin regression test parameters
pub static DEVCOIN_REGTEST: Lazy<ChainParams> = Lazy::new(|| ChainParams {
    network: Network::Regtest,
    message_start: *b"devr",
    default_port: 52444,
    proof_of_work_limit: U256::MAX >> 1usize,
    // two weeks
    target_timespan: 14 * ONE_DAY,
    subsidy_halving_interval: 150,
    checkpoints: BTreeMap::from([(
        0,
        b256!("0f9188f13cb7b2c71f2a335e3a4fc328bf5beb436012afca590b1a11466e2206"),
    )]),
    checkpoint_data: CheckpointData::default(),
    block_upgrade_majority: DEVCOIN_MAINNET.block_upgrade_majority,
    ..DEVCOIN_TESTNET.clone()
});

/// Devcoin unit test parameters
///
/// Shares the mainnet constants and checkpoints. Use the `with_*` builders to
/// derive a modified copy for a test case.
pub static DEVCOIN_UNITTEST: Lazy<ChainParams> = Lazy::new(|| ChainParams {
    network: Network::Unittest,
    default_port: 52445,
    mine_blocks_on_demand: true,
    ..DEVCOIN_MAINNET.clone()
});

/// Transaction statistics as of the last checkpoint, for sync progress estimates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointData {
    /// Unix time of the last checkpointed block
    pub last_checkpoint_time: u64,
    /// Total transactions up to and including the last checkpoint
    pub transactions_at_last_checkpoint: u64,
    /// Estimated transactions per day after the last checkpoint
    pub transactions_per_day: u64,
}

impl CheckpointData {
    /// Estimated total transaction count of the chain at `time`
    pub fn estimated_transactions(&self, time: u64) -> u64 {
        let elapsed = time.saturating_sub(self.last_checkpoint_time);
        let since = elapsed.saturating_mul(self.transactions_per_day) / ONE_DAY as u64;
        self.transactions_at_last_checkpoint.saturating_add(since)
    }
}

/// Block version upgrade thresholds, counted over the last `window` blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeMajority {
    /// Upgraded blocks needed before new rules are enforced on upgraded blocks
    pub enforce: u32,
    /// Upgraded blocks needed before outdated blocks are rejected
    pub reject_outdated: u32,
    /// Number of recent blocks inspected
    pub window: u32,
}

impl UpgradeMajority {
    const fn is_valid(&self) -> bool {
        self.window > 0 && self.enforce <= self.window && self.reject_outdated <= self.window
    }
}

/// Network variant a parameter set belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Production network
    Main,
    /// Public test network
    Test,
    /// Local regression test network
    Regtest,
    /// In-process unit test network
    Unittest,
}

impl Network {
    /// All known networks
    pub const ALL: [Self; 4] = [Self::Main, Self::Test, Self::Regtest, Self::Unittest];

    /// Canonical network name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Test => "test",
            Self::Regtest => "regtest",
            Self::Unittest => "unittest",
        }
    }

    /// Look up a network by name, accepting the usual aliases
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "main" | "mainnet" | "devcoin" => Some(Self::Main),
            "test" | "testnet" => Some(Self::Test),
            "regtest" => Some(Self::Regtest),
            "unittest" => Some(Self::Unittest),
            _ => None,
        }
    }

    /// Whether this is one of the public/local test networks.
    ///
    /// Merge-mining is active from genesis on test networks and the chain ID
    /// of merge-mined headers is not enforced.
    pub const fn is_test_network(self) -> bool {
        matches!(self, Self::Test | Self::Regtest)
    }

    /// Built-in parameters for this network
    pub fn params(self) -> &'static ChainParams {
        match self {
            Self::Main => &DEVCOIN_MAINNET,
            Self::Test => &DEVCOIN_TESTNET,
            Self::Regtest => &DEVCOIN_REGTEST,
            Self::Unittest => &DEVCOIN_UNITTEST,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = ChainSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ChainSpecError::UnknownNetwork(s.to_string()))
    }
}

/// Errors raised while selecting or loading a parameter set
#[derive(Debug, thiserror::Error)]
pub enum ChainSpecError {
    /// Name does not match any built-in network
    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    /// Flag may only be changed on the unit test network
    #[error("{field} can only be modified on the unittest network, not {network}")]
    NotModifiable {
        /// Name of the flag that was being set
        field: &'static str,
        /// Network of the parameter set
        network: Network,
    },

    /// Parameter file could not be read
    #[error("failed to read chain parameters: {0}")]
    Io(#[from] std::io::Error),

    /// Parameter file is not valid JSON for [`ChainParams`]
    #[error("invalid chain parameters: {0}")]
    Json(#[from] serde_json::Error),

    /// Parameters parsed but are not usable
    #[error("invalid chain parameters: {0}")]
    Invalid(&'static str),
}

/// Devcoin consensus parameters for one network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainParams {
    /// Network variant
    pub network: Network,
    /// P2P message start bytes
    pub message_start: [u8; 4],
    /// Default P2P port
    pub default_port: u16,
    /// Highest (easiest) target a block may claim
    pub proof_of_work_limit: U256,
    /// Nominal retarget period in seconds
    pub target_timespan: i64,
    /// Nominal seconds between blocks
    pub target_spacing: i64,
    /// Blocks between subsidy halvings
    pub subsidy_halving_interval: u64,
    /// Allow minimum-difficulty blocks after a long gap (testnet rule)
    pub allow_min_difficulty_blocks: bool,
    /// Accept any proof-of-work (unit tests only)
    pub skip_proof_of_work_check: bool,
    /// Blocks are mined on request (regtest/unittest)
    pub mine_blocks_on_demand: bool,
    /// First height at which merge-mined blocks are accepted
    pub aux_pow_start_height: u64,
    /// Chain identifier required in merge-mined block versions
    pub aux_pow_chain_id: u32,
    /// Known-good block hashes by height, in display byte order
    pub checkpoints: BTreeMap<u64, B256>,
    /// Transaction statistics at the last checkpoint
    pub checkpoint_data: CheckpointData,
    /// Block version upgrade thresholds
    pub block_upgrade_majority: UpgradeMajority,
}

impl ChainParams {
    /// Get parameters by network name
    pub fn from_name(name: &str) -> Option<&'static Self> {
        Network::from_name(name).map(Network::params)
    }

    /// Load a custom parameter set from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ChainSpecError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Parse a custom parameter set from JSON
    pub fn from_json_str(json: &str) -> Result<Self, ChainSpecError> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Pretty-printed JSON form, readable by [`ChainParams::from_json_str`]
    pub fn to_json_string(&self) -> Result<String, ChainSpecError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject parameter sets the retarget engine cannot work with
    pub fn validate(&self) -> Result<(), ChainSpecError> {
        if self.target_spacing <= 0 {
            return Err(ChainSpecError::Invalid("target_spacing must be positive"));
        }
        if self.target_timespan / self.target_spacing < 2 {
            return Err(ChainSpecError::Invalid("target_timespan must cover at least two blocks"));
        }
        if self.proof_of_work_limit.is_zero() {
            return Err(ChainSpecError::Invalid("proof_of_work_limit must be non-zero"));
        }
        if !self.block_upgrade_majority.is_valid() {
            return Err(ChainSpecError::Invalid("block upgrade majorities must fit their window"));
        }
        if self.skip_proof_of_work_check && self.network != Network::Unittest {
            return Err(ChainSpecError::NotModifiable {
                field: "skip_proof_of_work_check",
                network: self.network,
            });
        }
        Ok(())
    }

    /// Blocks per nominal retarget period
    pub const fn interval(&self) -> i64 {
        self.target_timespan / self.target_spacing
    }

    /// Whether this parameter set belongs to a test network
    pub const fn is_test_network(&self) -> bool {
        self.network.is_test_network()
    }

    /// Checkpointed hash at `height`, if any
    pub fn checkpoint(&self, height: u64) -> Option<B256> {
        self.checkpoints.get(&height).copied()
    }

    /// Height of the highest checkpoint
    pub fn last_checkpoint_height(&self) -> Option<u64> {
        self.checkpoints.keys().next_back().copied()
    }

    /// Returns false only if a checkpoint exists at `height` and `hash` differs
    pub fn check_checkpoint(&self, height: u64, hash: B256) -> bool {
        self.checkpoint(height).is_none_or(|expected| expected == hash)
    }

    /// Copy of these parameters with the minimum-difficulty rule toggled
    pub fn with_allow_min_difficulty_blocks(mut self, allow: bool) -> Result<Self, ChainSpecError> {
        if self.network != Network::Unittest {
            return Err(ChainSpecError::NotModifiable {
                field: "allow_min_difficulty_blocks",
                network: self.network,
            });
        }
        self.allow_min_difficulty_blocks = allow;
        Ok(self)
    }

    /// Copy of these parameters with proof-of-work checking toggled
    pub fn with_skip_proof_of_work_check(mut self, skip: bool) -> Result<Self, ChainSpecError> {
        if self.network != Network::Unittest {
            return Err(ChainSpecError::NotModifiable {
                field: "skip_proof_of_work_check",
                network: self.network,
            });
        }
        self.skip_proof_of_work_check = skip;
        Ok(self)
    }

    /// Copy of these parameters with different block upgrade thresholds
    pub fn with_block_upgrade_majority(
        mut self,
        majority: UpgradeMajority,
    ) -> Result<Self, ChainSpecError> {
        if self.network != Network::Unittest {
            return Err(ChainSpecError::NotModifiable {
                field: "block_upgrade_majority",
                network: self.network,
            });
        }
        if !majority.is_valid() {
            return Err(ChainSpecError::Invalid("block upgrade majorities must fit their window"));
        }
        self.block_upgrade_majority = majority;
        Ok(self)
    }

    /// Copy of these parameters with a different subsidy halving interval
    pub fn with_subsidy_halving_interval(mut self, interval: u64) -> Result<Self, ChainSpecError> {
        if self.network != Network::Unittest {
            return Err(ChainSpecError::NotModifiable {
                field: "subsidy_halving_interval",
                network: self.network,
            });
        }
        self.subsidy_halving_interval = interval;
        Ok(self)
    }
}

// Before block 14640 the retarget period was one week; a checkpoint below
// that height must not be added without accounting for it.
fn mainnet_checkpoints() -> BTreeMap<u64, B256> {
    BTreeMap::from([
        (2500, b256!("000000001871a2314936d39b85174cc911bf6fd58d3877412ee7b69a48e7e29e")),
        (4500, b256!("000000000967cc95711f66f804e3f431298686d681d2d5760f61856954d08faf")),
        (5250, b256!("00000000085702bfbf27daffb638be65aceb78a5f464b12539b51c1b9c548421")),
        (8900, b256!("00000000001bb8090630fcabb82ad0ab75df3eb5b008956b3ae2a352a4324f19")),
        (23500, b256!("000000000b83c3c9753d2440b91121cb0ff220bb23c136c6d09a539207e292fb")),
        (54800, b256!("04e8dcc91ff2aa0f1197f88551b4cb24ccef02ea51081b4d05ab4e3a38554137")),
        (67720, b256!("0a111b265d89f77b4c86fa6f44e3e2ad876547b1eccf19319cde922b42c1161e")),
    ])
}
