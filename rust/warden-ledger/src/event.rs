//! Transaction receipts and the minted-key event.
//!
//! # Minted-key event, wire contract v1
//!
//! The key registry announces every new key pair with a log entry whose first
//! topic is [`MINTED_KEY_TOPIC`] and whose data is a single ABI-encoded
//! `bytes` value:
//!
//! | offset | length | content                                     |
//! |-------:|-------:|---------------------------------------------|
//! |      0 |     32 | offset of the value, always `0x20`          |
//! |     32 |     32 | byte length of the value, always `65`       |
//! |     64 |     65 | SEC1 uncompressed public key                |
//! |    129 |     31 | zero padding to the 32-byte word boundary   |
//!
//! Anything else under this topic is a decode error rather than a guess.

use crate::LedgerError;
use serde::{Deserialize, Serialize};
use warden_common::{HexBytes, Keccak256Hash};
use warden_credentials::{PUBLIC_KEY_SIZE, PublicKey};

/// First topic of the minted-key event.
pub const MINTED_KEY_TOPIC: [u8; 32] = [
    0x3b, 0x2c, 0xc0, 0x65, 0x7d, 0x03, 0x87, 0xa7,
    0x36, 0x29, 0x3d, 0x66, 0x38, 0x9f, 0x78, 0xe4,
    0xc8, 0x02, 0x5e, 0x41, 0x3c, 0x7a, 0x1e, 0xe6,
    0x7b, 0x77, 0x07, 0xd4, 0x41, 0x8c, 0x46, 0xb8,
];

const WORD: usize = 32;
const KEY_OFFSET: usize = 2 * WORD;
const PADDED_KEY_LENGTH: usize = PUBLIC_KEY_SIZE.div_ceil(WORD) * WORD;
const EVENT_DATA_LENGTH: usize = KEY_OFFSET + PADDED_KEY_LENGTH;

/// One log entry emitted by a finalized transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Indexed topics; the first identifies the event.
    pub topics: Vec<Keccak256Hash>,
    /// Non-indexed payload.
    pub data: HexBytes,
}

/// The finalized outcome of a ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    /// Transaction hash.
    pub transaction_hash: Keccak256Hash,
    /// Log entries in emission order.
    pub logs: Vec<LogEntry>,
}

/// The decoded minted-key event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintedKeyEvent {
    /// The newly minted key's public half.
    pub public_key: PublicKey,
}

fn minted_key_topic() -> Keccak256Hash {
    Keccak256Hash::from(MINTED_KEY_TOPIC)
}

fn word(value: usize) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&(value as u64).to_be_bytes());
    word
}

impl MintedKeyEvent {
    /// Whether `entry` is a minted-key event at all.
    pub fn is_minted_key(entry: &LogEntry) -> bool {
        entry.topics.first() == Some(&minted_key_topic())
    }

    /// Decode `entry` under wire contract v1.
    pub fn decode(entry: &LogEntry) -> Result<Self, LedgerError> {
        if !Self::is_minted_key(entry) {
            return Err(LedgerError::EventDecode("not a minted-key event".into()));
        }

        let data = entry.data.as_slice();
        if data.len() != EVENT_DATA_LENGTH {
            return Err(LedgerError::EventDecode(format!(
                "expected {EVENT_DATA_LENGTH} bytes of event data, got {}",
                data.len()
            )));
        }
        if data[..WORD] != word(WORD) {
            return Err(LedgerError::EventDecode("unexpected value offset".into()));
        }
        if data[WORD..KEY_OFFSET] != word(PUBLIC_KEY_SIZE) {
            return Err(LedgerError::EventDecode("unexpected key length".into()));
        }

        let (key, padding) = data[KEY_OFFSET..].split_at(PUBLIC_KEY_SIZE);
        if padding.iter().any(|byte| *byte != 0) {
            return Err(LedgerError::EventDecode("non-zero padding".into()));
        }

        let public_key = PublicKey::from_sec1_bytes(key)
            .map_err(|error| LedgerError::EventDecode(error.to_string()))?;

        Ok(Self { public_key })
    }

    /// Find and decode the minted-key event of `receipt`.
    ///
    /// A receipt without one is [`LedgerError::MintEventNotFound`]; no record
    /// is ever fabricated from other data.
    pub fn find(receipt: &TransactionReceipt) -> Result<Self, LedgerError> {
        let entry = receipt
            .logs
            .iter()
            .find(|entry| Self::is_minted_key(entry))
            .ok_or_else(|| LedgerError::MintEventNotFound {
                transaction: receipt.transaction_hash.to_string(),
            })?;
        Self::decode(entry)
    }

    /// Encode as a log entry, the way the key registry emits it.
    pub fn to_log_entry(&self) -> LogEntry {
        let mut data = Vec::with_capacity(EVENT_DATA_LENGTH);
        data.extend_from_slice(&word(WORD));
        data.extend_from_slice(&word(PUBLIC_KEY_SIZE));
        data.extend_from_slice(self.public_key.as_bytes());
        data.resize(EVENT_DATA_LENGTH, 0);

        LogEntry {
            topics: vec![minted_key_topic(), self.public_key.keccak256()],
            data: data.into(),
        }
    }
}
