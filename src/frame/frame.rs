//! Tabular frame
//!
//! Named columns, rows as fixed-width tuples, and the alias map of the
//! query that produced it. Relational steps never mutate a frame in place;
//! each returns a new one.

use std::collections::HashSet;

use crate::plan::{AliasMap, PlanError, PlanResult, SelectExpr, SelectItem};

use super::grouped::GroupedFrame;
use super::value::Value;

/// One row; always exactly as wide as the frame's column list
pub type Row = Vec<Value>;

/// Row store
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Row>,
    aliases: AliasMap,
}

impl Frame {
    /// Creates a frame, checking that column names are unique and every
    /// row matches the column count.
    pub fn new(columns: Vec<String>, rows: Vec<Row>, aliases: AliasMap) -> PlanResult<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(PlanError::ambiguous_column(column));
            }
        }

        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(PlanError::frame_shape(i, columns.len(), row.len()));
        }

        Ok(Self {
            columns,
            rows,
            aliases,
        })
    }

    /// Returns the column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns all rows in order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Returns the row at `index`
    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Returns the alias map carried by this frame
    pub fn aliases(&self) -> &AliasMap {
        &self.aliases
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Exact, case-sensitive column lookup
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Resolves a column reference that may be an alias.
    ///
    /// Order: alias map (when the aliased column is present), exact name,
    /// case-insensitive name, then the alias of a real column.
    pub fn resolve_column(&self, name: &str) -> PlanResult<usize> {
        resolve_in(&self.columns, &self.aliases, name)
    }

    /// Same columns and aliases, different rows
    pub(crate) fn with_rows(&self, rows: Vec<Row>) -> Frame {
        Frame {
            columns: self.columns.clone(),
            rows,
            aliases: self.aliases.clone(),
        }
    }

    /// Keeps the first `n` rows
    pub fn limit(&self, n: u64) -> Frame {
        let n = usize::try_from(n).unwrap_or(usize::MAX);
        self.with_rows(self.rows.iter().take(n).cloned().collect())
    }

    /// Partitions rows by the tuple of the named columns
    pub fn group(&self, columns: &[String]) -> PlanResult<GroupedFrame> {
        let key_columns = columns
            .iter()
            .map(|c| self.resolve_column(c))
            .collect::<PlanResult<Vec<_>>>()?;
        Ok(GroupedFrame::build(self, key_columns))
    }

    /// Applies the select list.
    ///
    /// A select list containing aggregates treats the whole frame as one
    /// group.
    pub fn select(&self, items: &[SelectItem]) -> PlanResult<Frame> {
        if items.iter().any(SelectItem::is_aggregate) {
            return GroupedFrame::whole(self).select(items);
        }

        let mut columns = Vec::new();
        let mut indices = Vec::new();
        for item in items {
            match &item.expr {
                SelectExpr::Star => {
                    columns.extend(self.columns.iter().cloned());
                    indices.extend(0..self.columns.len());
                }
                SelectExpr::Column(name) => {
                    let idx = self.resolve_column(name)?;
                    columns.push(item.alias.clone().unwrap_or_else(|| self.columns[idx].clone()));
                    indices.push(idx);
                }
                SelectExpr::Aggregate { .. } => return GroupedFrame::whole(self).select(items),
            }
        }

        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();

        Frame::new(columns, rows, self.aliases.clone())
    }

    /// Consumes the frame, returning its rows
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

pub(crate) fn resolve_in(columns: &[String], aliases: &AliasMap, name: &str) -> PlanResult<usize> {
    if let Some(real) = aliases.resolve(name) {
        if let Some(i) = columns.iter().position(|c| c == real) {
            return Ok(i);
        }
    }
    if let Some(i) = columns.iter().position(|c| c == name) {
        return Ok(i);
    }
    if let Some(i) = columns.iter().position(|c| c.eq_ignore_ascii_case(name)) {
        return Ok(i);
    }
    // A real column that was projected under its alias
    aliases
        .alias_for(name)
        .and_then(|alias| columns.iter().position(|c| c == alias))
        .ok_or_else(|| PlanError::unknown_column(name))
}
