//! Alias bookkeeping
//!
//! Maps user-assigned select aliases to the real column they rename. Built
//! once per plan from the select list; filters, order items and cursor
//! lookups consult it before falling back to literal column names.

use std::collections::BTreeMap;

use super::ast::{SelectExpr, SelectItem};
use super::errors::{PlanError, PlanResult};

/// alias -> real column name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    aliases: BTreeMap<String, String>,
}

impl AliasMap {
    /// Creates an empty alias map
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the alias map from `column AS alias` select items.
    ///
    /// Fails with an ambiguous alias error when the same alias is used twice.
    pub fn from_select(items: &[SelectItem]) -> PlanResult<Self> {
        let mut map = Self::new();
        for item in items {
            if let (SelectExpr::Column(column), Some(alias)) = (&item.expr, &item.alias) {
                map.insert(alias, column)?;
            }
        }
        Ok(map)
    }

    /// Registers an alias, rejecting duplicates
    pub fn insert(&mut self, alias: impl Into<String>, column: impl Into<String>) -> PlanResult<()> {
        let alias = alias.into();
        if self.aliases.contains_key(&alias) {
            return Err(PlanError::ambiguous_alias(alias));
        }
        self.aliases.insert(alias, column.into());
        Ok(())
    }

    /// Returns the real column behind an alias
    pub fn resolve(&self, alias: &str) -> Option<&str> {
        self.aliases.get(alias).map(String::as_str)
    }

    /// Returns the first alias (in alias order) given to a real column
    pub fn alias_for(&self, column: &str) -> Option<&str> {
        self.aliases
            .iter()
            .find(|(_, real)| real.as_str() == column)
            .map(|(alias, _)| alias.as_str())
    }

    /// Returns true if `name` is a known alias
    pub fn contains(&self, name: &str) -> bool {
        self.aliases.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// Iterates (alias, column) pairs in alias order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(a, c)| (a.as_str(), c.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{AggregateFunction, PlanErrorCode};

    #[test]
    fn test_from_select() {
        let items = vec![
            SelectItem::aliased("entryId", "tid"),
            SelectItem::column("blockNo"),
            SelectItem::aggregate(AggregateFunction::Count, None).with_alias("n"),
        ];
        let map = AliasMap::from_select(&items).unwrap();

        assert_eq!(map.len(), 1);
        assert_eq!(map.resolve("tid"), Some("entryId"));
        assert_eq!(map.alias_for("entryId"), Some("tid"));
        // aggregate aliases name output columns only
        assert!(!map.contains("n"));
    }

    #[test]
    fn test_duplicate_alias_rejected() {
        let items = vec![
            SelectItem::aliased("entryId", "x"),
            SelectItem::aliased("blockNo", "x"),
        ];
        let err = AliasMap::from_select(&items).unwrap_err();
        assert_eq!(err.code(), PlanErrorCode::AmbiguousAlias);
        assert_eq!(err.column(), Some("x"));
    }

    #[test]
    fn test_unknown_alias() {
        let map = AliasMap::new();
        assert!(map.is_empty());
        assert_eq!(map.resolve("tid"), None);
    }
}
