//! Row sorting for query execution
//!
//! Multi-key, stable, deterministic.

use std::cmp::Ordering;

use crate::frame::{Frame, Row};
use crate::plan::{OrderItem, PlanResult, SortDirection};

/// Sorts frame rows by ORDER BY items
pub struct RowSorter;

impl RowSorter {
    /// Returns a new frame with rows sorted by `order`.
    ///
    /// Keys are compared in order; each key has its own direction. Ties on
    /// every key keep their input order. Nulls sort lowest, so they come
    /// last under DESC.
    pub fn sort(frame: &Frame, order: &[OrderItem]) -> PlanResult<Frame> {
        let keys = order
            .iter()
            .map(|item| Ok((frame.resolve_column(&item.column)?, item.direction)))
            .collect::<PlanResult<Vec<_>>>()?;

        let mut rows: Vec<Row> = frame.rows().to_vec();
        rows.sort_by(|a, b| Self::compare_rows(a, b, &keys));

        Ok(frame.with_rows(rows))
    }

    fn compare_rows(a: &Row, b: &Row, keys: &[(usize, SortDirection)]) -> Ordering {
        for &(idx, direction) in keys {
            let ordering = a[idx].sort_cmp(&b[idx]);
            let ordering = match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Value;
    use crate::plan::{AliasMap, PlanErrorCode};

    fn frame() -> Frame {
        let mut aliases = AliasMap::new();
        aliases.insert("n", "blockNo").unwrap();
        Frame::new(
            vec!["blockNo".into(), "entryId".into()],
            vec![
                vec![Value::Integer(2), Value::from("c")],
                vec![Value::Null, Value::from("z")],
                vec![Value::Integer(1), Value::from("b")],
                vec![Value::Integer(2), Value::from("a")],
            ],
            aliases,
        )
        .unwrap()
    }

    fn ids(frame: &Frame) -> Vec<String> {
        frame.rows().iter().map(|r| r[1].to_string()).collect()
    }

    #[test]
    fn test_sort_ascending_nulls_first() {
        let sorted = RowSorter::sort(&frame(), &[OrderItem::asc("blockNo")]).unwrap();
        assert_eq!(ids(&sorted), vec!["z", "b", "c", "a"]);
    }

    #[test]
    fn test_sort_descending_nulls_last() {
        let sorted = RowSorter::sort(&frame(), &[OrderItem::desc("blockNo")]).unwrap();
        assert_eq!(ids(&sorted), vec!["c", "a", "b", "z"]);
    }

    #[test]
    fn test_sort_multi_key() {
        let sorted = RowSorter::sort(
            &frame(),
            &[OrderItem::desc("blockNo"), OrderItem::asc("entryId")],
        )
        .unwrap();
        assert_eq!(ids(&sorted), vec!["a", "c", "b", "z"]);
    }

    #[test]
    fn test_sort_by_alias_matches_column() {
        let by_alias = RowSorter::sort(&frame(), &[OrderItem::asc("n")]).unwrap();
        let by_column = RowSorter::sort(&frame(), &[OrderItem::asc("blockNo")]).unwrap();
        assert_eq!(by_alias, by_column);
    }

    #[test]
    fn test_sort_does_not_touch_input() {
        let input = frame();
        let _ = RowSorter::sort(&input, &[OrderItem::asc("entryId")]).unwrap();
        assert_eq!(input, frame());
    }

    #[test]
    fn test_unknown_column() {
        let err = RowSorter::sort(&frame(), &[OrderItem::asc("missing")]).unwrap_err();
        assert_eq!(err.code(), PlanErrorCode::UnknownColumn);
    }
}
