//! Ledger block records
//!
//! Raw units returned by the ledger client. Byte fields travel as lowercase
//! hex in every serialized form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry (transaction) inside a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Transaction identifier
    pub entry_id: String,
    /// Entry type tag, e.g. ENDORSER_TRANSACTION
    pub entry_type: String,
    /// Entry timestamp, if the ledger recorded one
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// One block as fetched from the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerBlock {
    #[serde(with = "hex_bytes")]
    pub previous_hash: Vec<u8>,
    #[serde(with = "hex_bytes")]
    pub data_hash: Vec<u8>,
    #[serde(with = "hex_bytes", default)]
    pub transactions_metadata: Vec<u8>,
    /// Envelope count reported by the ledger
    pub transaction_count: u32,
    pub block_number: u64,
    pub channel_id: String,
    #[serde(default)]
    pub entries: Vec<LedgerEntry>,
}

impl LedgerBlock {
    /// Previous hash as lowercase hex; the key used to combine filter results
    pub fn previous_hash_hex(&self) -> String {
        hex::encode(&self.previous_hash)
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_block_json_roundtrip_uses_hex() {
        let block: LedgerBlock = serde_json::from_value(json!({
            "previous_hash": "deadbeef",
            "data_hash": "00ff",
            "transaction_count": 1,
            "block_number": 4,
            "channel_id": "mychannel",
            "entries": [
                {"entry_id": "tx1", "entry_type": "ENDORSER_TRANSACTION",
                 "timestamp": "2018-07-25T16:45:00Z"}
            ]
        }))
        .unwrap();

        assert_eq!(block.previous_hash, vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(block.previous_hash_hex(), "deadbeef");
        assert!(block.transactions_metadata.is_empty());
        assert!(block.entries[0].timestamp.is_some());

        let back = serde_json::to_value(&block).unwrap();
        assert_eq!(back["data_hash"], "00ff");
    }

    #[test]
    fn test_bad_hex_rejected() {
        let result: Result<LedgerBlock, _> = serde_json::from_value(json!({
            "previous_hash": "xyz",
            "data_hash": "",
            "transaction_count": 0,
            "block_number": 1,
            "channel_id": "c"
        }));
        assert!(result.is_err());
    }
}
