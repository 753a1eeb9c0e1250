//! Runtime configuration.
//!
//! The contract address is fixed at build time (`WAVEPORTAL_CONTRACT_ADDRESS`).
//! Tunables can be overridden per browser through `localStorage`:
//!
//! | key                          | default  |
//! |------------------------------|----------|
//! | `wp_gas_limit`               | 300000   |
//! | `wp_poll_interval_ms`        | 4000     |
//! | `wp_confirmation_timeout_ms` | 600000 (`0` waits forever) |
//! | `wp_log_filter`              | `info`   |

use std::str::FromStr;
use wp_session::{DEFAULT_GAS_LIMIT, SessionConfig};

pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x68d8C524D5F49E216EF64e8478b1a6E693543352";
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 4_000;
pub const DEFAULT_CONFIRMATION_TIMEOUT_MS: u32 = 600_000;
pub const DEFAULT_LOG_FILTER: &str = "info";

/// How the browser host reaches the contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractSettings {
    pub address: String,
    pub poll_interval_ms: u32,
    /// `None` keeps waiting for a receipt indefinitely.
    pub confirmation_timeout_ms: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub contract: ContractSettings,
    pub session: SessionConfig,
    pub log_filter: String,
}

impl AppConfig {
    pub fn load() -> Self {
        let address = option_env!("WAVEPORTAL_CONTRACT_ADDRESS").unwrap_or(DEFAULT_CONTRACT_ADDRESS);
        Self::from_lookup(address, local_get)
    }

    pub fn from_lookup(address: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parse = |key: &str| lookup(key).and_then(|v| parse_trimmed::<u64>(&v));

        let gas_limit = parse("wp_gas_limit")
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_GAS_LIMIT);
        let poll_interval_ms = parse("wp_poll_interval_ms")
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);
        let confirmation_timeout_ms = match parse("wp_confirmation_timeout_ms") {
            Some(0) => None,
            Some(ms) => Some(u32::try_from(ms).unwrap_or(u32::MAX)),
            None => Some(DEFAULT_CONFIRMATION_TIMEOUT_MS),
        };
        let log_filter = lookup("wp_log_filter")
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_owned());

        Self {
            contract: ContractSettings {
                address: address.to_owned(),
                poll_interval_ms,
                confirmation_timeout_ms,
            },
            session: SessionConfig::default().with_gas_limit(gas_limit),
            log_filter,
        }
    }
}

fn parse_trimmed<T: FromStr>(raw: &str) -> Option<T> {
    raw.trim().parse().ok()
}

// ── localStorage helpers ──

fn storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok()?
}

pub fn local_get(key: &str) -> Option<String> {
    storage()?.get_item(key).ok()?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        AppConfig::from_lookup(DEFAULT_CONTRACT_ADDRESS, |key| map.get(key).cloned())
    }

    #[test]
    fn defaults_without_overrides() {
        let cfg = config(&[]);
        assert_eq!(cfg.contract.address, DEFAULT_CONTRACT_ADDRESS);
        assert_eq!(cfg.contract.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        assert_eq!(cfg.contract.confirmation_timeout_ms, Some(DEFAULT_CONFIRMATION_TIMEOUT_MS));
        assert_eq!(cfg.session.gas_limit, 300_000);
        assert_eq!(cfg.log_filter, "info");
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = config(&[
            ("wp_gas_limit", " 500000 "),
            ("wp_poll_interval_ms", "1000"),
            ("wp_confirmation_timeout_ms", "30000"),
            ("wp_log_filter", "wp_session=debug"),
        ]);
        assert_eq!(cfg.session.gas_limit, 500_000);
        assert_eq!(cfg.contract.poll_interval_ms, 1000);
        assert_eq!(cfg.contract.confirmation_timeout_ms, Some(30_000));
        assert_eq!(cfg.log_filter, "wp_session=debug");
    }

    #[test]
    fn zero_timeout_waits_forever() {
        let cfg = config(&[("wp_confirmation_timeout_ms", "0")]);
        assert_eq!(cfg.contract.confirmation_timeout_ms, None);
    }

    #[test]
    fn garbage_falls_back_to_defaults() {
        let cfg = config(&[
            ("wp_gas_limit", "lots"),
            ("wp_poll_interval_ms", "0"),
            ("wp_log_filter", "   "),
        ]);
        assert_eq!(cfg.session.gas_limit, 300_000);
        assert_eq!(cfg.contract.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        assert_eq!(cfg.log_filter, "info");
    }
}
