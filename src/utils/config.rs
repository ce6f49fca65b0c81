use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use config::{Config as ConfigLib, ConfigError, Environment, File};
use crate::utils::error::{Result, VerifyError};

pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
/// Local Hardhat network.
pub const DEFAULT_CHAIN_ID: &str = "0x7a69";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub ledger: LedgerConfig,
    pub workflow: WorkflowConfig,
    pub export: ExportConfig,
    pub analysis: AnalysisConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint of the provider. Unset means no provider is available.
    pub rpc_url: Option<String>,
    pub contract_address: String,
    pub chain_id: String,
    pub request_timeout_secs: u64,
}

impl LedgerConfig {
    pub fn get_request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowConfig {
    pub scan_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub fallback_to_demo: bool,
    pub request_timeout_secs: u64,
}

impl AnalysisConfig {
    pub fn get_request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    /// Loads `config/default` and `config/local` (both optional) and then
    /// `DOCVERIFY_*` environment overrides, e.g. `DOCVERIFY_LEDGER__RPC_URL`.
    pub fn new() -> Result<Self> {
        Self::load(None)
    }

    /// Same as [`Config::new`] with an extra, required, file layered on top.
    pub fn load(extra_file: Option<&Path>) -> Result<Self> {
        let mut builder = Self::with_defaults(ConfigLib::builder())?
            // Load from config files
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = extra_file {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            // Override with environment variables (e.g., DOCVERIFY_WORKFLOW__SCAN_DELAY_MS)
            .add_source(
                Environment::with_prefix("DOCVERIFY")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Built-in defaults only, without touching files or the environment.
    pub fn defaults() -> Result<Self> {
        let config: Self = Self::with_defaults(ConfigLib::builder())?
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn with_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(builder
            .set_default("ledger.contract_address", DEFAULT_CONTRACT_ADDRESS)?
            .set_default("ledger.chain_id", DEFAULT_CHAIN_ID)?
            .set_default("ledger.request_timeout_secs", 30)?
            .set_default("workflow.scan_delay_ms", 1500)?
            .set_default("export.output_dir", ".")?
            .set_default(
                "analysis.endpoint",
                "https://generativelanguage.googleapis.com/v1beta",
            )?
            .set_default("analysis.model", "gemini-flash-latest")?
            .set_default("analysis.fallback_to_demo", false)?
            .set_default("analysis.request_timeout_secs", 60)?
            .set_default("logging.level", "info")?)
    }

    fn validate(&self) -> Result<()> {
        if !is_hex_quantity(&self.ledger.contract_address, 40) {
            return Err(VerifyError::Config(format!(
                "contract_address must be 0x followed by 40 hex digits, got {}",
                self.ledger.contract_address
            )));
        }

        let chain_id = self.ledger.chain_id.trim_start_matches("0x");
        if !self.ledger.chain_id.starts_with("0x")
            || chain_id.is_empty()
            || u64::from_str_radix(chain_id, 16).is_err()
        {
            return Err(VerifyError::Config(format!(
                "chain_id must be a 0x-prefixed hex quantity, got {}",
                self.ledger.chain_id
            )));
        }

        if let Some(url) = &self.ledger.rpc_url {
            if url.trim().is_empty() {
                return Err(VerifyError::Config("rpc_url must not be blank when set".into()));
            }
        }

        if self.ledger.request_timeout_secs == 0 {
            return Err(VerifyError::Config("request_timeout_secs must be greater than 0".into()));
        }

        if self.export.output_dir.as_os_str().is_empty() {
            return Err(VerifyError::Config("export.output_dir must be set".into()));
        }

        Ok(())
    }

    pub fn get_scan_delay(&self) -> Duration {
        Duration::from_millis(self.workflow.scan_delay_ms)
    }
}

fn is_hex_quantity(value: &str, digits: usize) -> bool {
    value
        .strip_prefix("0x")
        .map(|rest| rest.len() == digits && rest.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false)
}

impl From<ConfigError> for VerifyError {
    fn from(error: ConfigError) -> Self {
        VerifyError::Config(error.to_string())
    }
}
