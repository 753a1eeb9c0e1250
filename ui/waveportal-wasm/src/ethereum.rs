//! EIP-1193 host: `window.ethereum` as wallet provider and contract transport.
//!
//! Every call goes through `ethereum.request({ method, params })`. Reads use
//! `eth_call`; a wave is `eth_sendTransaction` followed by receipt polling;
//! `NewWave` is followed by polling `eth_getLogs` on new blocks.

use std::cell::Cell;
use std::rc::Rc;

use async_trait::async_trait;
use gloo_timers::future::TimeoutFuture;
use js_sys::{Function, Object, Promise, Reflect};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use wp_abi::{
    decode_all_waves, decode_new_wave_log, decode_quantity, decode_total_waves, encode_get_all_waves_call,
    encode_get_total_waves_call, encode_quantity, encode_wave_call, from_hex_prefixed, new_wave_topic,
    to_hex_prefixed, word_from_hex,
};
use wp_api_types::{Account, NewWaveEvent, RawWave, TxHash, TxReceipt};
use wp_chain_client::{
    ChainError, ChainResult, Host, Subscription, WalletProvider, WavePortalContract, WaveSink,
};

use crate::config::ContractSettings;

/// Fallback code when a rejected request carries none (JSON-RPC internal error).
const INTERNAL_ERROR_CODE: i64 = -32603;

/// Handle on the injected `window.ethereum` object.
#[derive(Clone, Debug)]
pub struct Eip1193 {
    inner: Object,
}

impl Eip1193 {
    /// Look the provider up on `window`. Wallet extensions may inject late,
    /// so this is re-run for every operation.
    pub fn detect() -> Option<Self> {
        let window = web_sys::window()?;
        let value = Reflect::get(&window, &JsValue::from_str("ethereum")).ok()?;
        if value.is_undefined() || value.is_null() {
            return None;
        }
        value.dyn_into::<Object>().ok().map(|inner| Self { inner })
    }

    pub async fn request(&self, method: &str, params: Value) -> ChainResult<Value> {
        let args = json!({ "method": method, "params": params })
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| ChainError::Malformed(e.to_string()))?;

        let request = Reflect::get(&self.inner, &JsValue::from_str("request"))
            .map_err(rpc_error)?
            .dyn_into::<Function>()
            .map_err(|_| ChainError::Malformed("ethereum.request is not a function".to_owned()))?;

        let promise = request
            .call1(&self.inner, &args)
            .map_err(rpc_error)?
            .dyn_into::<Promise>()
            .map_err(|_| ChainError::Malformed(format!("{method} did not return a promise")))?;

        let result = JsFuture::from(promise).await.map_err(rpc_error)?;
        if result.is_undefined() || result.is_null() {
            return Ok(Value::Null);
        }
        serde_wasm_bindgen::from_value(result).map_err(|e| ChainError::Malformed(e.to_string()))
    }

    async fn accounts(&self, method: &str) -> ChainResult<Vec<Account>> {
        let value = self.request(method, json!([])).await?;
        let accounts: Vec<String> = serde_json::from_value(value).map_err(malformed)?;
        Ok(accounts.into_iter().map(Account).collect())
    }
}

/// Turn a rejected provider promise (`{ code, message }`) into a [`ChainError`].
fn rpc_error(err: JsValue) -> ChainError {
    let code = Reflect::get(&err, &JsValue::from_str("code"))
        .ok()
        .and_then(|c| c.as_f64())
        .map_or(INTERNAL_ERROR_CODE, |c| c as i64);
    let message = Reflect::get(&err, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| format!("{err:?}"));
    ChainError::from_rpc(code, message)
}

fn malformed(err: impl std::fmt::Display) -> ChainError {
    ChainError::Malformed(err.to_string())
}

fn expect_str(value: &Value, what: &str) -> ChainResult<String> {
    value
        .as_str()
        .map(ToOwned::to_owned)
        .ok_or_else(|| ChainError::Malformed(format!("{what} is not a string: {value}")))
}

#[async_trait(?Send)]
impl WalletProvider for Eip1193 {
    async fn request_accounts(&self) -> ChainResult<Vec<Account>> {
        self.accounts("eth_requestAccounts").await
    }

    async fn authorized_accounts(&self) -> ChainResult<Vec<Account>> {
        self.accounts("eth_accounts").await
    }
}

// ── JSON-RPC payloads ──

#[derive(Debug, Serialize)]
struct CallRequest<'a> {
    to: &'a str,
    data: String,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    data: String,
    gas: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LogFilter<'a> {
    address: &'a str,
    topics: [&'a str; 1],
    from_block: String,
    to_block: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    block_number: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RpcLog {
    topics: Vec<String>,
    data: String,
    #[serde(default)]
    removed: bool,
}

impl RpcLog {
    fn decode(&self) -> ChainResult<NewWaveEvent> {
        let topics = self
            .topics
            .iter()
            .map(|t| word_from_hex(t))
            .collect::<Result<Vec<_>, _>>()?;
        let data = from_hex_prefixed(&self.data)?;
        Ok(decode_new_wave_log(&topics, &data)?)
    }
}

// ── Contract ──

/// WavePortal bound to the current provider. Cheap to build; one per operation.
pub struct BrowserContract {
    provider: Eip1193,
    settings: Rc<ContractSettings>,
}

impl BrowserContract {
    async fn call(&self, data: Vec<u8>) -> ChainResult<Vec<u8>> {
        let request = CallRequest {
            to: &self.settings.address,
            data: to_hex_prefixed(&data),
        };
        let params = json!([serde_json::to_value(request).map_err(malformed)?, "latest"]);
        let result = self.provider.request("eth_call", params).await?;
        Ok(from_hex_prefixed(&expect_str(&result, "eth_call result")?)?)
    }
}

#[async_trait(?Send)]
impl WavePortalContract for BrowserContract {
    async fn send_wave(&self, message: &str, gas_limit: u64) -> ChainResult<TxHash> {
        let signer = self
            .provider
            .accounts("eth_accounts")
            .await?
            .into_iter()
            .next()
            .ok_or(ChainError::NoAccount)?;

        let request = SendRequest {
            from: signer.as_str(),
            to: &self.settings.address,
            data: to_hex_prefixed(&encode_wave_call(message)),
            gas: encode_quantity(gas_limit),
        };
        let params = json!([serde_json::to_value(request).map_err(malformed)?]);
        let hash = self.provider.request("eth_sendTransaction", params).await?;
        Ok(TxHash(expect_str(&hash, "transaction hash")?))
    }

    async fn wait_for_inclusion(&self, tx_hash: &TxHash) -> ChainResult<TxReceipt> {
        let started = js_sys::Date::now();
        loop {
            let value = self
                .provider
                .request("eth_getTransactionReceipt", json!([tx_hash.0]))
                .await?;

            if !value.is_null() {
                let receipt: RpcReceipt = serde_json::from_value(value).map_err(malformed)?;
                if let Some(block) = receipt.block_number.as_deref() {
                    // pre-Byzantium receipts carry no status
                    let success = match receipt.status.as_deref() {
                        Some(status) => decode_quantity(status)? == 1,
                        None => true,
                    };
                    if !success {
                        return Err(ChainError::Reverted(tx_hash.clone()));
                    }
                    return Ok(TxReceipt {
                        tx_hash: tx_hash.clone(),
                        block_number: decode_quantity(block)?,
                        success,
                    });
                }
            }

            if let Some(timeout) = self.settings.confirmation_timeout_ms {
                if js_sys::Date::now() - started >= f64::from(timeout) {
                    return Err(ChainError::InclusionTimeout(tx_hash.clone()));
                }
            }
            TimeoutFuture::new(self.settings.poll_interval_ms).await;
        }
    }

    async fn get_all_waves(&self) -> ChainResult<Vec<RawWave>> {
        let data = self.call(encode_get_all_waves_call()).await?;
        Ok(decode_all_waves(&data)?)
    }

    async fn get_total_waves(&self) -> ChainResult<u64> {
        let data = self.call(encode_get_total_waves_call()).await?;
        Ok(decode_total_waves(&data)?)
    }

    fn subscribe_new_waves(&self, sink: WaveSink) -> ChainResult<Subscription> {
        let cancelled = Rc::new(Cell::new(false));
        let poller = LogPoller {
            provider: self.provider.clone(),
            settings: Rc::clone(&self.settings),
            cancelled: Rc::clone(&cancelled),
        };
        wasm_bindgen_futures::spawn_local(poller.run(sink));
        Ok(Subscription::new(move || cancelled.set(true)))
    }
}

/// Background task delivering `NewWave` logs from blocks mined after it starts.
struct LogPoller {
    provider: Eip1193,
    settings: Rc<ContractSettings>,
    cancelled: Rc<Cell<bool>>,
}

impl LogPoller {
    async fn run(self, mut sink: WaveSink) {
        let topic = to_hex_prefixed(&new_wave_topic());
        let mut next_block = None;

        while !self.cancelled.get() {
            match self.poll_once(&topic, &mut next_block).await {
                Ok(events) => {
                    for event in events {
                        if self.cancelled.get() {
                            break;
                        }
                        sink(event);
                    }
                }
                Err(err) => warn!(error = %err, "NewWave poll failed"),
            }
            TimeoutFuture::new(self.settings.poll_interval_ms).await;
        }
        debug!("NewWave poller stopped");
    }

    async fn poll_once(&self, topic: &str, next_block: &mut Option<u64>) -> ChainResult<Vec<NewWaveEvent>> {
        let latest = self.provider.request("eth_blockNumber", json!([])).await?;
        let latest = decode_quantity(&expect_str(&latest, "block number")?)?;

        let Some(from) = *next_block else {
            *next_block = Some(latest.saturating_add(1));
            return Ok(Vec::new());
        };
        if latest < from {
            return Ok(Vec::new());
        }

        let filter = LogFilter {
            address: &self.settings.address,
            topics: [topic],
            from_block: encode_quantity(from),
            to_block: encode_quantity(latest),
        };
        let params = json!([serde_json::to_value(filter).map_err(malformed)?]);
        let logs: Vec<RpcLog> =
            serde_json::from_value(self.provider.request("eth_getLogs", params).await?).map_err(malformed)?;
        *next_block = Some(latest.saturating_add(1));

        let mut events = Vec::with_capacity(logs.len());
        for log in logs.iter().filter(|l| !l.removed) {
            match log.decode() {
                Ok(event) => events.push(event),
                Err(err) => warn!(error = %err, "skipping undecodable NewWave log"),
            }
        }
        Ok(events)
    }
}

// ── Host ──

pub struct BrowserHost {
    settings: Rc<ContractSettings>,
}

impl BrowserHost {
    pub fn new(settings: ContractSettings) -> Self {
        Self {
            settings: Rc::new(settings),
        }
    }
}

impl Host for BrowserHost {
    type Provider = Eip1193;
    type Contract = BrowserContract;

    fn provider(&self) -> Option<Eip1193> {
        Eip1193::detect()
    }

    fn contract(&self, provider: &Eip1193) -> BrowserContract {
        BrowserContract {
            provider: provider.clone(),
            settings: Rc::clone(&self.settings),
        }
    }
}
