//! Grouped frame and aggregate evaluation
//!
//! Exists only between GROUP BY and the projection that follows it.
//! Groups keep first-seen order so output is deterministic.

use std::collections::HashMap;

use crate::plan::{AggregateFunction, AliasMap, PlanError, PlanResult, SelectExpr, SelectItem};

use super::frame::{resolve_in, Frame, Row};
use super::value::Value;

/// Rows sharing one group key
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    key: Vec<Value>,
    rows: Vec<Row>,
}

impl Group {
    /// Group key tuple, in group-by column order
    pub fn key(&self) -> &[Value] {
        &self.key
    }

    /// Member rows in original order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }
}

/// Frame rows partitioned by group key
#[derive(Debug, Clone)]
pub struct GroupedFrame {
    columns: Vec<String>,
    groups: Vec<Group>,
    aliases: AliasMap,
}

impl GroupedFrame {
    pub(crate) fn build(frame: &Frame, key_columns: Vec<usize>) -> Self {
        let mut index: HashMap<Vec<Value>, usize> = HashMap::new();
        let mut groups: Vec<Group> = Vec::new();

        for row in frame.rows() {
            let key: Vec<Value> = key_columns.iter().map(|&i| row[i].clone()).collect();
            match index.get(&key) {
                Some(&g) => groups[g].rows.push(row.clone()),
                None => {
                    index.insert(key.clone(), groups.len());
                    groups.push(Group {
                        key,
                        rows: vec![row.clone()],
                    });
                }
            }
        }

        Self {
            columns: frame.columns().to_vec(),
            groups,
            aliases: frame.aliases().clone(),
        }
    }

    /// The whole frame as a single group, even when it has no rows
    pub(crate) fn whole(frame: &Frame) -> Self {
        Self {
            columns: frame.columns().to_vec(),
            groups: vec![Group {
                key: Vec::new(),
                rows: frame.rows().to_vec(),
            }],
            aliases: frame.aliases().clone(),
        }
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Resolves a column reference against the underlying columns
    pub fn resolve_column(&self, name: &str) -> PlanResult<usize> {
        resolve_in(&self.columns, &self.aliases, name)
    }

    /// Keeps the groups for which `keep` returns true
    pub fn filter<F>(&self, mut keep: F) -> PlanResult<GroupedFrame>
    where
        F: FnMut(&GroupedFrame, &Group) -> PlanResult<bool>,
    {
        let mut groups = Vec::new();
        for group in &self.groups {
            if keep(self, group)? {
                groups.push(group.clone());
            }
        }
        Ok(Self {
            columns: self.columns.clone(),
            groups,
            aliases: self.aliases.clone(),
        })
    }

    /// Value of a plain column within a group (first member row)
    pub fn column_value(&self, group: &Group, column: &str) -> PlanResult<Value> {
        let idx = self.resolve_column(column)?;
        Ok(group
            .rows
            .first()
            .map(|row| row[idx].clone())
            .unwrap_or(Value::Null))
    }

    /// Evaluates an aggregate over one group
    pub fn aggregate(
        &self,
        group: &Group,
        function: AggregateFunction,
        column: Option<&str>,
    ) -> PlanResult<Value> {
        let idx = match column {
            Some(c) => Some(self.resolve_column(c)?),
            None => None,
        };

        let mut acc = Accumulator::new(function, idx.is_some())?;
        for row in &group.rows {
            match idx {
                Some(i) => acc.accumulate(&row[i], column.unwrap_or("*"))?,
                None => acc.accumulate(&Value::Integer(1), "*")?,
            }
        }
        Ok(acc.finish())
    }

    /// Projects the select list over each group, one output row per group
    pub fn select(&self, items: &[SelectItem]) -> PlanResult<Frame> {
        let mut columns = Vec::with_capacity(items.len());
        for item in items {
            let label = match &item.expr {
                SelectExpr::Star => {
                    return Err(PlanError::invalid_aggregate(
                        "'*' cannot be projected over grouped rows",
                    ))
                }
                SelectExpr::Column(name) => {
                    let idx = self.resolve_column(name)?;
                    self.columns[idx].clone()
                }
                SelectExpr::Aggregate { function, column } => function.label(column.as_deref()),
            };
            columns.push(item.alias.clone().unwrap_or(label));
        }

        let mut rows = Vec::with_capacity(self.groups.len());
        for group in &self.groups {
            let mut row = Vec::with_capacity(items.len());
            for item in items {
                let value = match &item.expr {
                    SelectExpr::Column(name) => self.column_value(group, name)?,
                    SelectExpr::Aggregate { function, column } => {
                        self.aggregate(group, *function, column.as_deref())?
                    }
                    SelectExpr::Star => Value::Null,
                };
                row.push(value);
            }
            rows.push(row);
        }

        Frame::new(columns, rows, self.aliases.clone())
    }
}

/// Running state of one aggregate
enum Accumulator {
    Count(i64),
    Sum { int: Option<i64>, float: Option<f64> },
    Avg { sum: f64, count: i64 },
    Min(Option<Value>),
    Max(Option<Value>),
}

impl Accumulator {
    fn new(function: AggregateFunction, has_column: bool) -> PlanResult<Self> {
        if !has_column && function != AggregateFunction::Count {
            return Err(PlanError::invalid_aggregate(format!(
                "{} requires a column argument",
                function.name()
            )));
        }
        Ok(match function {
            AggregateFunction::Count => Accumulator::Count(0),
            AggregateFunction::Sum => Accumulator::Sum {
                int: None,
                float: None,
            },
            AggregateFunction::Avg => Accumulator::Avg { sum: 0.0, count: 0 },
            AggregateFunction::Min => Accumulator::Min(None),
            AggregateFunction::Max => Accumulator::Max(None),
        })
    }

    /// Nulls are skipped by every aggregate
    fn accumulate(&mut self, value: &Value, column: &str) -> PlanResult<()> {
        if value.is_null() {
            return Ok(());
        }
        match self {
            Accumulator::Count(n) => *n += 1,
            Accumulator::Sum { int, float } => match value {
                Value::Integer(i) => {
                    if float.is_some() {
                        *float = float.map(|f| f + *i as f64);
                    } else {
                        match int.unwrap_or(0).checked_add(*i) {
                            Some(total) => *int = Some(total),
                            None => {
                                *float = Some(int.unwrap_or(0) as f64 + *i as f64);
                                *int = None;
                            }
                        }
                    }
                }
                Value::Float(f) => {
                    let base = float.unwrap_or_else(|| int.unwrap_or(0) as f64);
                    *float = Some(base + f);
                    *int = None;
                }
                other => return Err(non_numeric("SUM", column, other)),
            },
            Accumulator::Avg { sum, count } => match value.as_f64() {
                Some(f) => {
                    *sum += f;
                    *count += 1;
                }
                None => return Err(non_numeric("AVG", column, value)),
            },
            Accumulator::Min(current) => {
                if current.as_ref().map_or(true, |c| value.sort_cmp(c).is_lt()) {
                    *current = Some(value.clone());
                }
            }
            Accumulator::Max(current) => {
                if current.as_ref().map_or(true, |c| value.sort_cmp(c).is_gt()) {
                    *current = Some(value.clone());
                }
            }
        }
        Ok(())
    }

    fn finish(self) -> Value {
        match self {
            Accumulator::Count(n) => Value::Integer(n),
            Accumulator::Sum { int, float } => match (int, float) {
                (_, Some(f)) => Value::Float(f),
                (Some(i), None) => Value::Integer(i),
                (None, None) => Value::Null,
            },
            Accumulator::Avg { sum, count } => {
                if count == 0 {
                    Value::Null
                } else {
                    Value::Float(sum / count as f64)
                }
            }
            Accumulator::Min(v) | Accumulator::Max(v) => v.unwrap_or(Value::Null),
        }
    }
}

fn non_numeric(function: &str, column: &str, value: &Value) -> PlanError {
    PlanError::invalid_aggregate(format!(
        "{} requires numeric values, column '{}' holds {}",
        function,
        column,
        value.value_type()
    ))
}
