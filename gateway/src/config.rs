//! Gateway configuration.
//!
//! Contract addresses come from `CYBERFI_*` environment variables. Any
//! address that is unset or zero falls back to the JSON manifest written by
//! the local deployment (`deployments/addresses.json` unless
//! `CYBERFI_ADDRESS_MANIFEST` says otherwise).

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::schema::InterfaceVersion;
use crate::transport::GasParams;
use crate::types::Address;
use crate::wallet::NetworkParams;

pub const DEFAULT_MANIFEST_PATH: &str = "deployments/addresses.json";
pub const DEFAULT_CHAIN_ID: u64 = 1337;
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// The five CyberFi contracts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContractKind {
    BudgetManager,
    MicroInvestor,
    TestToken,
    MicroLending,
    CommunitySavings,
}

impl ContractKind {
    pub const ALL: [ContractKind; 5] = [
        ContractKind::BudgetManager,
        ContractKind::MicroInvestor,
        ContractKind::TestToken,
        ContractKind::MicroLending,
        ContractKind::CommunitySavings,
    ];

    pub fn env_var(self) -> &'static str {
        match self {
            ContractKind::BudgetManager => "CYBERFI_BUDGET_MANAGER_ADDRESS",
            ContractKind::MicroInvestor => "CYBERFI_MICRO_INVESTOR_ADDRESS",
            ContractKind::TestToken => "CYBERFI_TEST_TOKEN_ADDRESS",
            ContractKind::MicroLending => "CYBERFI_MICRO_LENDING_ADDRESS",
            ContractKind::CommunitySavings => "CYBERFI_COMMUNITY_SAVINGS_ADDRESS",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ContractKind::BudgetManager => "budgetManager",
            ContractKind::MicroInvestor => "microInvestor",
            ContractKind::TestToken => "testToken",
            ContractKind::MicroLending => "microLending",
            ContractKind::CommunitySavings => "communitySavings",
        }
    }
}

/// Deployed contract addresses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractAddresses {
    pub budget_manager: Address,
    pub micro_investor: Address,
    pub test_token: Address,
    pub micro_lending: Address,
    pub community_savings: Address,
}

impl ContractAddresses {
    pub fn get(&self, kind: ContractKind) -> &Address {
        match kind {
            ContractKind::BudgetManager => &self.budget_manager,
            ContractKind::MicroInvestor => &self.micro_investor,
            ContractKind::TestToken => &self.test_token,
            ContractKind::MicroLending => &self.micro_lending,
            ContractKind::CommunitySavings => &self.community_savings,
        }
    }
}

/// On-disk address manifest. Every entry is optional so a partial
/// deployment still loads.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<u64>,
    #[serde(default)]
    pub budget_manager: Option<Address>,
    #[serde(default)]
    pub micro_investor: Option<Address>,
    #[serde(default)]
    pub test_token: Option<Address>,
    #[serde(default)]
    pub micro_lending: Option<Address>,
    #[serde(default)]
    pub community_savings: Option<Address>,
}

impl AddressManifest {
    pub fn from_addresses(addresses: &ContractAddresses, network_id: u64) -> Self {
        AddressManifest {
            network_id: Some(network_id),
            budget_manager: Some(addresses.budget_manager.clone()),
            micro_investor: Some(addresses.micro_investor.clone()),
            test_token: Some(addresses.test_token.clone()),
            micro_lending: Some(addresses.micro_lending.clone()),
            community_savings: Some(addresses.community_savings.clone()),
        }
    }

    /// Reads the manifest; a missing file is `Ok(None)`.
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            debug!("no address manifest at {}", path.display());
            return Ok(None);
        }
        let raw = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    pub fn write(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("wrote address manifest to {}", path.display());
        Ok(())
    }

    pub fn get(&self, kind: ContractKind) -> Option<&Address> {
        match kind {
            ContractKind::BudgetManager => self.budget_manager.as_ref(),
            ContractKind::MicroInvestor => self.micro_investor.as_ref(),
            ContractKind::TestToken => self.test_token.as_ref(),
            ContractKind::MicroLending => self.micro_lending.as_ref(),
            ContractKind::CommunitySavings => self.community_savings.as_ref(),
        }
    }
}

/// Everything the gateway needs to run.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub addresses: ContractAddresses,
    pub network: NetworkParams,
    pub interface: InterfaceVersion,
    /// Try alternate count accessor names when the canonical one fails
    pub probe_counts: bool,
    pub gas: GasParams,
    /// Wait between a confirmed faucet call and the balance re-read
    pub settle_delay: Duration,
    pub faucet_cooldown: Duration,
}

impl GatewayConfig {
    pub fn new(addresses: ContractAddresses, chain_id: u64) -> Self {
        GatewayConfig {
            addresses,
            network: NetworkParams::local(chain_id),
            interface: InterfaceVersion::default(),
            probe_counts: false,
            gas: GasParams::default(),
            settle_delay: DEFAULT_SETTLE_DELAY,
            faucet_cooldown: Duration::from_secs(60 * 60),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let manifest_path = lookup("CYBERFI_ADDRESS_MANIFEST")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST_PATH));
        let manifest = AddressManifest::load(&manifest_path)?;

        let resolve = |kind: ContractKind| -> Result<Address, ConfigError> {
            if let Some(raw) = lookup(kind.env_var()).filter(|v| !v.trim().is_empty()) {
                let address = Address::parse(raw.trim()).ok_or_else(|| ConfigError::InvalidValue {
                    key: kind.env_var().to_string(),
                    reason: format!("'{}' is not an address", raw),
                })?;
                if !address.is_zero() {
                    return Ok(address);
                }
            }
            manifest
                .as_ref()
                .and_then(|m| m.get(kind))
                .filter(|a| !a.is_zero())
                .cloned()
                .ok_or(ConfigError::MissingAddress(kind.label()))
        };

        let addresses = ContractAddresses {
            budget_manager: resolve(ContractKind::BudgetManager)?,
            micro_investor: resolve(ContractKind::MicroInvestor)?,
            test_token: resolve(ContractKind::TestToken)?,
            micro_lending: resolve(ContractKind::MicroLending)?,
            community_savings: resolve(ContractKind::CommunitySavings)?,
        };

        let chain_id = parse_var(&lookup, "CYBERFI_NETWORK_ID", DEFAULT_CHAIN_ID)?;
        let mut config = GatewayConfig::new(addresses, chain_id);

        if let Some(name) = lookup("CYBERFI_NETWORK_NAME") {
            config.network.chain_name = name;
        }
        if let Some(url) = lookup("CYBERFI_RPC_URL") {
            config.network.rpc_url = url;
        }
        config.interface = parse_var(&lookup, "CYBERFI_INTERFACE_VERSION", config.interface)?;
        config.probe_counts = parse_var(&lookup, "CYBERFI_PROBE_COUNTS", config.probe_counts)?;
        config.gas.gas_limit = parse_var(&lookup, "CYBERFI_GAS_LIMIT", config.gas.gas_limit)?;
        config.gas.gas_price = parse_var(&lookup, "CYBERFI_GAS_PRICE", config.gas.gas_price)?;
        let settle_ms = parse_var(
            &lookup,
            "CYBERFI_SETTLE_DELAY_MS",
            config.settle_delay.as_millis() as u64,
        )?;
        config.settle_delay = Duration::from_millis(settle_ms);

        debug!(?config, "loaded gateway configuration");
        Ok(config)
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    key: key.to_string(),
                    reason: e.to_string(),
                })
        }
        _ => Ok(default),
    }
}
