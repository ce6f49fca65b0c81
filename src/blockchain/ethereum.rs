use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, info};

use super::{abi, LedgerClient, LedgerError};
use crate::{
    core::identity::{Fingerprint, RecordFields},
    utils::config::LedgerConfig,
};

/// Reads the document registry contract through an Ethereum JSON-RPC provider.
pub struct EthereumLedgerClient {
    http: reqwest::Client,
    rpc_url: Option<String>,
    contract_address: String,
    expected_chain_id: u64,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

impl EthereumLedgerClient {
    pub fn new(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let http = reqwest::Client::builder()
            .timeout(config.get_request_timeout())
            .build()
            .map_err(|e| LedgerError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            rpc_url: config.rpc_url.clone(),
            contract_address: config.contract_address.to_lowercase(),
            expected_chain_id: parse_quantity(&config.chain_id)?,
            next_id: AtomicU64::new(1),
        })
    }

    fn endpoint(&self) -> Result<&str, LedgerError> {
        self.rpc_url.as_deref().ok_or(LedgerError::NoProvider)
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, LedgerError> {
        let url = self.endpoint()?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!(method, id, "Sending JSON-RPC request");
        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("JSON-RPC request {} failed: {}", method, e);
                LedgerError::Transport(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(LedgerError::Transport(format!(
                "provider returned HTTP {}",
                status
            )));
        }

        let response: RpcResponse = response
            .json()
            .await
            .map_err(|e| LedgerError::Decode(format!("invalid JSON-RPC response: {}", e)))?;
        unwrap_response(response)
    }

    /// Fails unless the provider is on the configured chain.
    async fn ensure_network(&self) -> Result<(), LedgerError> {
        let result = self.request("eth_chainId", json!([])).await?;
        let actual = result
            .as_str()
            .ok_or_else(|| LedgerError::Decode("eth_chainId result is not a string".into()))?;

        if parse_quantity(actual)? != self.expected_chain_id {
            return Err(LedgerError::WrongNetwork {
                expected: format!("{:#x}", self.expected_chain_id),
                actual: actual.to_string(),
            });
        }
        Ok(())
    }

    async fn call(&self, data: Vec<u8>) -> Result<Vec<u8>, LedgerError> {
        let params = json!([
            {
                "to": self.contract_address,
                "data": format!("0x{}", hex::encode(data)),
            },
            "latest"
        ]);
        let result = self.request("eth_call", params).await?;
        let encoded = result
            .as_str()
            .ok_or_else(|| LedgerError::Decode("eth_call result is not a string".into()))?;
        decode_hex_data(encoded)
    }
}

#[async_trait]
impl LedgerClient for EthereumLedgerClient {
    async fn lookup(&self, fingerprint: &Fingerprint) -> Result<bool, LedgerError> {
        self.ensure_network().await?;

        let data = abi::encode_bytes32_call(abi::VERIFY_DOCUMENT, &fingerprint.to_bytes());
        let valid = abi::decode_bool(&self.call(data).await?)?;
        info!(%fingerprint, valid, "Ledger lookup complete");
        Ok(valid)
    }

    async fn fetch_record(&self, fingerprint: &Fingerprint) -> Result<RecordFields, LedgerError> {
        let data = abi::encode_bytes32_call(abi::GET_DETAILS, &fingerprint.to_bytes());
        let fields = abi::decode_record(&self.call(data).await?)?;
        debug!(%fingerprint, "Fetched ledger record");
        Ok(fields)
    }
}

fn unwrap_response(response: RpcResponse) -> Result<Value, LedgerError> {
    if let Some(err) = response.error {
        return Err(LedgerError::Rpc {
            code: err.code,
            message: err.message,
        });
    }
    response
        .result
        .ok_or_else(|| LedgerError::Decode("JSON-RPC response has neither result nor error".into()))
}

fn parse_quantity(value: &str) -> Result<u64, LedgerError> {
    let digits = value
        .strip_prefix("0x")
        .ok_or_else(|| LedgerError::Decode(format!("quantity {} lacks 0x prefix", value)))?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| LedgerError::Decode(format!("invalid quantity {}: {}", value, e)))
}

fn decode_hex_data(value: &str) -> Result<Vec<u8>, LedgerError> {
    let digits = value
        .strip_prefix("0x")
        .ok_or_else(|| LedgerError::Decode("call result lacks 0x prefix".into()))?;
    hex::decode(digits).map_err(|e| LedgerError::Decode(format!("call result is not hex: {}", e)))
}
