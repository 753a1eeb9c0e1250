//! Solidity ABI codec for the WavePortal contract.
//!
//! Only the fixed interface the client talks to is covered:
//!
//! ```text
//! function wave(string _message)
//! function getAllWaves() view returns (tuple(address waver, string message, uint256 timestamp)[])
//! function getTotalWaves() view returns (uint256)
//! event NewWave(address indexed from, uint256 timestamp, string message)
//! ```
//!
//! All decoders are bounds-checked and never panic on hostile input.

use sha3::{Digest, Keccak256};
use thiserror::Error;
use wp_api_types::{Account, NewWaveEvent, RawWave};

pub const WAVE_SIGNATURE: &str = "wave(string)";
pub const GET_ALL_WAVES_SIGNATURE: &str = "getAllWaves()";
pub const GET_TOTAL_WAVES_SIGNATURE: &str = "getTotalWaves()";
pub const NEW_WAVE_EVENT_SIGNATURE: &str = "NewWave(address,uint256,string)";

const WORD: usize = 32;

pub type Word = [u8; WORD];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error("abi data truncated: need {needed} bytes at offset {offset}, have {len}")]
    Truncated {
        offset: usize,
        needed: usize,
        len: usize,
    },
    #[error("abi integer does not fit in u64")]
    Overflow,
    #[error("abi string is not valid utf-8")]
    InvalidUtf8,
    #[error("invalid hex '{0}'")]
    InvalidHex(String),
    #[error("log is missing topic {0}")]
    MissingTopic(usize),
    #[error("log topic is not NewWave")]
    UnexpectedTopic,
}

pub type Result<T> = std::result::Result<T, AbiError>;

pub fn keccak256(data: &[u8]) -> Word {
    let mut out = [0u8; WORD];
    out.copy_from_slice(&Keccak256::digest(data));
    out
}

/// First four bytes of the keccak hash of a function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

pub fn new_wave_topic() -> Word {
    keccak256(NEW_WAVE_EVENT_SIGNATURE.as_bytes())
}

// ── Calls ──

pub fn encode_wave_call(message: &str) -> Vec<u8> {
    let bytes = message.as_bytes();
    let padded = bytes.len().div_ceil(WORD) * WORD;
    let total = 4 + 2 * WORD + padded;

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&selector(WAVE_SIGNATURE));
    out.extend_from_slice(&uint_word(WORD as u64));
    out.extend_from_slice(&uint_word(bytes.len() as u64));
    out.extend_from_slice(bytes);
    out.resize(total, 0);
    out
}

pub fn encode_get_all_waves_call() -> Vec<u8> {
    selector(GET_ALL_WAVES_SIGNATURE).to_vec()
}

pub fn encode_get_total_waves_call() -> Vec<u8> {
    selector(GET_TOTAL_WAVES_SIGNATURE).to_vec()
}

fn uint_word(value: u64) -> Word {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&value.to_be_bytes());
    word
}

// ── Return data ──

pub fn decode_total_waves(data: &[u8]) -> Result<u64> {
    Reader::new(data).u64_at(0)
}

pub fn decode_all_waves(data: &[u8]) -> Result<Vec<RawWave>> {
    let reader = Reader::new(data);
    let array = reader.offset_at(0)?;
    let len = reader.offset_at(array)?;
    let elems = checked(array, WORD)?;

    // each element costs at least one head word, so a sane length is bounded by the data
    let mut waves = Vec::with_capacity(len.min(data.len() / WORD));
    for i in 0..len {
        let head = checked(elems, i.checked_mul(WORD).ok_or(AbiError::Overflow)?)?;
        let tuple = checked(elems, reader.offset_at(head)?)?;

        let waver = reader.address_at(tuple)?;
        let message_offset = reader.offset_at(checked(tuple, WORD)?)?;
        let message = reader.string_at(checked(tuple, message_offset)?)?;
        let timestamp_secs = reader.u64_at(checked(tuple, 2 * WORD)?)?;

        waves.push(RawWave {
            waver,
            timestamp_secs,
            message,
        });
    }
    Ok(waves)
}

/// Decode a `NewWave` log. `from` is indexed, so it arrives as `topics[1]`.
pub fn decode_new_wave_log(topics: &[Word], data: &[u8]) -> Result<NewWaveEvent> {
    let signature = topics.first().ok_or(AbiError::MissingTopic(0))?;
    if *signature != new_wave_topic() {
        return Err(AbiError::UnexpectedTopic);
    }
    let from = topics.get(1).ok_or(AbiError::MissingTopic(1))?;

    let reader = Reader::new(data);
    let timestamp_secs = reader.u64_at(0)?;
    let message_offset = reader.offset_at(WORD)?;
    let message = reader.string_at(message_offset)?;

    Ok(NewWaveEvent {
        from: address_from_word(from),
        timestamp_secs,
        message,
    })
}

fn address_from_word(word: &Word) -> Account {
    Account(to_hex_prefixed(&word[12..]))
}

fn checked(base: usize, add: usize) -> Result<usize> {
    base.checked_add(add).ok_or(AbiError::Overflow)
}

struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn slice(&self, offset: usize, needed: usize) -> Result<&'a [u8]> {
        let end = checked(offset, needed)?;
        self.data.get(offset..end).ok_or(AbiError::Truncated {
            offset,
            needed,
            len: self.data.len(),
        })
    }

    fn word(&self, offset: usize) -> Result<&'a [u8]> {
        self.slice(offset, WORD)
    }

    fn u64_at(&self, offset: usize) -> Result<u64> {
        let word = self.word(offset)?;
        let (high, low) = word.split_at(WORD - 8);
        if high.iter().any(|b| *b != 0) {
            return Err(AbiError::Overflow);
        }
        let mut buf = [0u8; 8];
        buf.copy_from_slice(low);
        Ok(u64::from_be_bytes(buf))
    }

    fn offset_at(&self, offset: usize) -> Result<usize> {
        usize::try_from(self.u64_at(offset)?).map_err(|_| AbiError::Overflow)
    }

    fn address_at(&self, offset: usize) -> Result<Account> {
        let word = self.word(offset)?;
        Ok(Account(to_hex_prefixed(&word[12..])))
    }

    fn string_at(&self, offset: usize) -> Result<String> {
        let len = self.offset_at(offset)?;
        let bytes = self.slice(checked(offset, WORD)?, len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| AbiError::InvalidUtf8)
    }
}

// ── Hex helpers ──

pub fn to_hex_prefixed(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

pub fn from_hex_prefixed(s: &str) -> Result<Vec<u8>> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(digits).map_err(|_| AbiError::InvalidHex(s.to_owned()))
}

pub fn word_from_hex(s: &str) -> Result<Word> {
    let bytes = from_hex_prefixed(s)?;
    bytes
        .try_into()
        .map_err(|_| AbiError::InvalidHex(s.to_owned()))
}

/// JSON-RPC quantity: minimal hex with `0x` prefix.
pub fn encode_quantity(value: u64) -> String {
    format!("{value:#x}")
}

pub fn decode_quantity(s: &str) -> Result<u64> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.is_empty() {
        return Err(AbiError::InvalidHex(s.to_owned()));
    }
    u64::from_str_radix(digits, 16).map_err(|_| AbiError::InvalidHex(s.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(value: u64) -> Vec<u8> {
        uint_word(value).to_vec()
    }

    fn address_word(byte: u8) -> Vec<u8> {
        let mut w = vec![0u8; 12];
        w.extend_from_slice(&[byte; 20]);
        w
    }

    fn string_tail(s: &str) -> Vec<u8> {
        let mut out = word(s.len() as u64);
        out.extend_from_slice(s.as_bytes());
        out.resize(WORD + s.len().div_ceil(WORD) * WORD, 0);
        out
    }

    /// Encode `(address,string,uint256)[]` the way solc does.
    fn encode_waves(waves: &[(u8, &str, u64)]) -> Vec<u8> {
        let tuples: Vec<Vec<u8>> = waves
            .iter()
            .map(|(addr, msg, ts)| {
                let mut t = address_word(*addr);
                t.extend(word(3 * WORD as u64));
                t.extend(word(*ts));
                t.extend(string_tail(msg));
                t
            })
            .collect();

        let mut out = word(WORD as u64);
        out.extend(word(waves.len() as u64));
        let mut offset = (waves.len() * WORD) as u64;
        for t in &tuples {
            out.extend(word(offset));
            offset += t.len() as u64;
        }
        for t in tuples {
            out.extend(t);
        }
        out
    }

    #[test]
    fn selectors_match_known_values() {
        assert_eq!(selector("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(selector(WAVE_SIGNATURE), [0x44, 0x9d, 0x46, 0xc0]);
        assert_eq!(selector(GET_ALL_WAVES_SIGNATURE), [0xbd, 0x43, 0xa9, 0x08]);
        assert_eq!(selector(GET_TOTAL_WAVES_SIGNATURE), [0x9a, 0x2c, 0xdc, 0x08]);
        assert_eq!(
            to_hex_prefixed(&new_wave_topic()),
            "0x5f7e16dc676677766a70e9c5628aa6c54ddb8b6e5188e2ae1e1f17f1ffbea716"
        );
    }

    #[test]
    fn wave_call_layout() {
        let data = encode_wave_call("hello");
        assert_eq!(data.len(), 4 + 3 * WORD);
        assert_eq!(&data[..4], &[0x44, 0x9d, 0x46, 0xc0]);
        assert_eq!(&data[4..36], word(32).as_slice());
        assert_eq!(&data[36..68], word(5).as_slice());
        assert_eq!(&data[68..73], b"hello");
        assert!(data[73..].iter().all(|b| *b == 0));
    }

    #[test]
    fn wave_call_with_empty_message_has_no_tail() {
        let data = encode_wave_call("");
        assert_eq!(data.len(), 4 + 2 * WORD);
    }

    #[test]
    fn decodes_total_waves() {
        assert_eq!(decode_total_waves(&word(42)), Ok(42));
    }

    #[test]
    fn total_waves_above_u64_is_overflow() {
        let mut data = word(1);
        data[0] = 1;
        assert_eq!(decode_total_waves(&data), Err(AbiError::Overflow));
    }

    #[test]
    fn decodes_all_waves_in_order() {
        let data = encode_waves(&[(0xaa, "hi", 1000), (0xbb, "a longer message that spans two words", 2000)]);
        let waves = decode_all_waves(&data).expect("decode");

        assert_eq!(waves.len(), 2);
        assert_eq!(waves[0].waver.as_str(), format!("0x{}", "aa".repeat(20)));
        assert_eq!(waves[0].message, "hi");
        assert_eq!(waves[0].timestamp_secs, 1000);
        assert_eq!(waves[1].waver.as_str(), format!("0x{}", "bb".repeat(20)));
        assert_eq!(waves[1].message, "a longer message that spans two words");
        assert_eq!(waves[1].timestamp_secs, 2000);
    }

    #[test]
    fn decodes_empty_wave_list() {
        let data = encode_waves(&[]);
        assert_eq!(decode_all_waves(&data), Ok(Vec::new()));
    }

    #[test]
    fn truncated_wave_list_is_rejected() {
        let data = encode_waves(&[(0xaa, "hi", 1000)]);
        let cut = &data[..data.len() - WORD];
        assert!(matches!(decode_all_waves(cut), Err(AbiError::Truncated { .. })));
    }

    #[test]
    fn huge_array_length_does_not_allocate_or_panic() {
        let mut data = word(WORD as u64);
        data.extend(word(u64::MAX >> 8));
        assert!(decode_all_waves(&data).is_err());
    }

    #[test]
    fn decodes_new_wave_log() {
        let mut from = [0u8; WORD];
        from[12..].copy_from_slice(&[0xcc; 20]);
        let mut data = word(2000);
        data.extend(word(2 * WORD as u64));
        data.extend(string_tail("yo"));

        let event = decode_new_wave_log(&[new_wave_topic(), from], &data).expect("decode");
        assert_eq!(event.from.as_str(), format!("0x{}", "cc".repeat(20)));
        assert_eq!(event.timestamp_secs, 2000);
        assert_eq!(event.message, "yo");
    }

    #[test]
    fn log_with_foreign_topic_is_rejected() {
        let data = word(0);
        assert_eq!(
            decode_new_wave_log(&[[0u8; WORD], [0u8; WORD]], &data),
            Err(AbiError::UnexpectedTopic)
        );
        assert_eq!(
            decode_new_wave_log(&[new_wave_topic()], &data),
            Err(AbiError::MissingTopic(1))
        );
    }

    #[test]
    fn invalid_utf8_message_is_rejected() {
        let mut data = word(1);
        data.extend(word(2 * WORD as u64));
        data.extend(word(2));
        data.extend_from_slice(&[0xff, 0xfe]);
        data.resize(data.len() + 30, 0);
        let from = [0u8; WORD];
        assert_eq!(
            decode_new_wave_log(&[new_wave_topic(), from], &data),
            Err(AbiError::InvalidUtf8)
        );
    }

    #[test]
    fn quantities() {
        assert_eq!(encode_quantity(300_000), "0x493e0");
        assert_eq!(encode_quantity(0), "0x0");
        assert_eq!(decode_quantity("0x1b4"), Ok(436));
        assert!(decode_quantity("0x").is_err());
        assert!(decode_quantity("0xzz").is_err());
    }

    #[test]
    fn hex_words() {
        let topic = to_hex_prefixed(&new_wave_topic());
        assert_eq!(word_from_hex(&topic), Ok(new_wave_topic()));
        assert!(word_from_hex("0x1234").is_err());
    }
}
