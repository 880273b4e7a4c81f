//! Compiled ledger access paths
//!
//! A WHERE tree is validated and compiled into an `AccessPath` before any
//! ledger call is made. Leaves are concrete fetches; inner nodes are binary
//! set operations keyed by previous-hash.

use std::fmt;

use serde::Serialize;

/// One targeted ledger fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockAccess {
    /// Fetch the block with this number
    ByNumber(u64),
    /// Fetch the block whose previous-hash is these bytes
    #[serde(serialize_with = "serialize_hex")]
    ByPreviousHash(Vec<u8>),
    /// Fetch the block containing this entry
    ByEntryId(String),
}

impl BlockAccess {
    /// Returns the operation name for explain output
    pub fn op_name(&self) -> &'static str {
        match self {
            BlockAccess::ByNumber(_) => "BLOCK_BY_NUMBER",
            BlockAccess::ByPreviousHash(_) => "BLOCK_BY_HASH",
            BlockAccess::ByEntryId(_) => "BLOCK_BY_ENTRY_ID",
        }
    }
}

impl fmt::Display for BlockAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockAccess::ByNumber(n) => write!(f, "{}({})", self.op_name(), n),
            BlockAccess::ByPreviousHash(h) => write!(f, "{}({})", self.op_name(), hex::encode(h)),
            BlockAccess::ByEntryId(id) => write!(f, "{}({})", self.op_name(), id),
        }
    }
}

fn serialize_hex<S: serde::Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(bytes))
}

/// How the ledger will be read for a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessPath {
    /// Every block from 1 to height - 1
    FullScan,
    /// A single targeted fetch
    Fetch(BlockAccess),
    /// Intersection by previous-hash
    And(Box<AccessPath>, Box<AccessPath>),
    /// Union by previous-hash
    Or(Box<AccessPath>, Box<AccessPath>),
}

impl AccessPath {
    /// Number of targeted fetches this path issues (0 for a full scan)
    pub fn fetch_count(&self) -> usize {
        match self {
            AccessPath::FullScan => 0,
            AccessPath::Fetch(_) => 1,
            AccessPath::And(l, r) | AccessPath::Or(l, r) => l.fetch_count() + r.fetch_count(),
        }
    }

    pub fn is_full_scan(&self) -> bool {
        matches!(self, AccessPath::FullScan)
    }
}

impl fmt::Display for AccessPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessPath::FullScan => write!(f, "FULL_SCAN"),
            AccessPath::Fetch(access) => write!(f, "{}", access),
            AccessPath::And(l, r) => write!(f, "({} AND {})", l, r),
            AccessPath::Or(l, r) => write!(f, "({} OR {})", l, r),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_tree() {
        let path = AccessPath::And(
            Box::new(AccessPath::Fetch(BlockAccess::ByNumber(5))),
            Box::new(AccessPath::Or(
                Box::new(AccessPath::Fetch(BlockAccess::ByPreviousHash(vec![0xde, 0xad]))),
                Box::new(AccessPath::Fetch(BlockAccess::ByEntryId("tx1".into()))),
            )),
        );

        assert_eq!(
            path.to_string(),
            "(BLOCK_BY_NUMBER(5) AND (BLOCK_BY_HASH(dead) OR BLOCK_BY_ENTRY_ID(tx1)))"
        );
        assert_eq!(path.fetch_count(), 3);
    }

    #[test]
    fn test_full_scan() {
        assert!(AccessPath::FullScan.is_full_scan());
        assert_eq!(AccessPath::FullScan.fetch_count(), 0);
    }

    #[test]
    fn test_hash_serializes_as_hex() {
        let json = serde_json::to_value(BlockAccess::ByPreviousHash(vec![0xbe, 0xef])).unwrap();
        assert_eq!(json, serde_json::json!({"by_previous_hash": "beef"}));
    }
}
