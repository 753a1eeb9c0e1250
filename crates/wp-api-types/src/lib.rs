use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Public address of a wallet, as reported by the provider or decoded from the chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Account(pub String);

impl Account {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TxHash(pub String);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Receipt of a mined transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub success: bool,
}

/// A wave record exactly as `getAllWaves()` returns it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawWave {
    pub waver: Account,
    pub timestamp_secs: u64,
    pub message: String,
}

/// Payload of one `NewWave(from, timestamp, message)` notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewWaveEvent {
    pub from: Account,
    pub timestamp_secs: u64,
    pub message: String,
}

/// A wave as the client holds it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Wave {
    pub address: Account,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl Wave {
    pub fn new(address: Account, timestamp_secs: u64, message: String) -> Self {
        Self {
            address,
            timestamp: timestamp_from_secs(timestamp_secs),
            message,
        }
    }
}

impl From<RawWave> for Wave {
    fn from(raw: RawWave) -> Self {
        Wave::new(raw.waver, raw.timestamp_secs, raw.message)
    }
}

impl From<NewWaveEvent> for Wave {
    fn from(event: NewWaveEvent) -> Self {
        Wave::new(event.from, event.timestamp_secs, event.message)
    }
}

/// Contract timestamps are whole seconds; the client keeps milliseconds.
///
/// Values past chrono's range saturate to `DateTime::<Utc>::MAX_UTC`.
pub fn timestamp_from_secs(secs: u64) -> DateTime<Utc> {
    i64::try_from(secs)
        .ok()
        .and_then(|s| s.checked_mul(1000))
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_wave_timestamp_is_scaled_to_millis() {
        let wave = Wave::from(RawWave {
            waver: Account::new("0xA"),
            timestamp_secs: 1000,
            message: "hi".to_owned(),
        });

        assert_eq!(wave.address.as_str(), "0xA");
        assert_eq!(wave.timestamp.timestamp_millis(), 1_000_000);
        assert_eq!(wave.message, "hi");
    }

    #[test]
    fn event_wave_timestamp_is_scaled_to_millis() {
        let wave = Wave::from(NewWaveEvent {
            from: Account::new("0xB"),
            timestamp_secs: 2000,
            message: "yo".to_owned(),
        });

        assert_eq!(wave.timestamp.timestamp_millis(), 2_000_000);
    }

    #[test]
    fn oversized_timestamp_saturates() {
        assert_eq!(timestamp_from_secs(u64::MAX), DateTime::<Utc>::MAX_UTC);
    }
}
