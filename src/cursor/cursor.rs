//! Forward-only result cursor
//!
//! States: BeforeFirst -> OnRow(0) -> ... -> OnRow(n-1) -> AfterLast.
//! `close()` moves any state to Closed. A cursor whose session has been
//! closed behaves as closed.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::frame::{Frame, Value};
use crate::observability::{log_event_with_fields, Event};
use crate::session::SessionHandle;

use super::convert::FromValue;
use super::errors::{CursorError, CursorResult};
use super::metadata::ColumnMetadata;

/// Cursor position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    BeforeFirst,
    /// On the row with this 0-based index
    OnRow(usize),
    AfterLast,
    Closed,
}

/// A way to address a result column
pub trait ColumnIndex {
    /// 0-based position in the cursor's columns
    fn position(&self, cursor: &ResultCursor) -> CursorResult<usize>;
}

/// 1-based column number
impl ColumnIndex for usize {
    fn position(&self, cursor: &ResultCursor) -> CursorResult<usize> {
        if *self == 0 || *self > cursor.frame.width() {
            return Err(CursorError::IndexNotPresent(*self));
        }
        Ok(self - 1)
    }
}

/// Column label, alias, or the real name of an aliased column
impl ColumnIndex for &str {
    fn position(&self, cursor: &ResultCursor) -> CursorResult<usize> {
        cursor.find_column(self).map(|i| i - 1)
    }
}

impl ColumnIndex for String {
    fn position(&self, cursor: &ResultCursor) -> CursorResult<usize> {
        self.as_str().position(cursor)
    }
}

/// Forward-only, single-pass cursor over a finalized frame
#[derive(Debug)]
pub struct ResultCursor {
    frame: Frame,
    state: CursorState,
    session: Option<SessionHandle>,
    metadata: Vec<ColumnMetadata>,
}

impl ResultCursor {
    /// Creates a cursor positioned before the first row
    pub fn new(frame: Frame) -> Self {
        let metadata = ColumnMetadata::describe(&frame);
        Self {
            frame,
            state: CursorState::BeforeFirst,
            session: None,
            metadata,
        }
    }

    /// Attaches the session this cursor belongs to
    pub(crate) fn with_session(mut self, session: SessionHandle) -> Self {
        self.session = Some(session);
        self
    }

    /// Current state, reporting Closed once the owning session has closed
    pub fn state(&self) -> CursorState {
        if self.session_closed() {
            CursorState::Closed
        } else {
            self.state
        }
    }

    /// Moves to the next row.
    ///
    /// Returns `Ok(false)` once the rows are exhausted, and on every call
    /// after that.
    pub fn advance(&mut self) -> CursorResult<bool> {
        self.ensure_open()?;

        let next = match self.state {
            CursorState::BeforeFirst => 0,
            CursorState::OnRow(i) => i + 1,
            CursorState::AfterLast => return Ok(false),
            CursorState::Closed => return Err(CursorError::Closed),
        };

        if next < self.frame.len() {
            self.state = CursorState::OnRow(next);
            Ok(true)
        } else {
            self.state = CursorState::AfterLast;
            Ok(false)
        }
    }

    /// Closes the cursor and releases the session reference. Idempotent.
    pub fn close(&mut self) {
        if self.state == CursorState::Closed {
            return;
        }
        self.state = CursorState::Closed;
        let session = self
            .session
            .take()
            .map(|s| s.id().to_string())
            .unwrap_or_default();
        log_event_with_fields(Event::CursorClosed, &[("session_id", session.as_str())]);
    }

    pub fn is_closed(&self) -> bool {
        self.state() == CursorState::Closed
    }

    pub fn is_before_first(&self) -> bool {
        self.state() == CursorState::BeforeFirst
    }

    pub fn is_first(&self) -> bool {
        self.state() == CursorState::OnRow(0)
    }

    pub fn is_last(&self) -> bool {
        matches!(self.state(), CursorState::OnRow(i) if i + 1 == self.frame.len())
    }

    pub fn is_after_last(&self) -> bool {
        self.state() == CursorState::AfterLast
    }

    /// 1-based number of the current row
    pub fn row_number(&self) -> Option<usize> {
        match self.state() {
            CursorState::OnRow(i) => Some(i + 1),
            _ => None,
        }
    }

    /// Total number of rows in the result
    pub fn row_count(&self) -> usize {
        self.frame.len()
    }

    /// Output column labels in order
    pub fn columns(&self) -> &[String] {
        self.frame.columns()
    }

    /// Ordered column metadata
    pub fn metadata(&self) -> &[ColumnMetadata] {
        &self.metadata
    }

    /// 1-based position of a column by label, alias or aliased real column
    pub fn find_column(&self, label: &str) -> CursorResult<usize> {
        self.frame
            .resolve_column(label)
            .map(|i| i + 1)
            .map_err(|_| CursorError::ColumnNotPresent(label.to_string()))
    }

    /// Reads the current row's value at `column` as `T`
    pub fn get<T: FromValue, C: ColumnIndex>(&self, column: C) -> CursorResult<T> {
        let value = self.cell(column)?;
        Ok(T::from_value(value)?)
    }

    pub fn get_value<C: ColumnIndex>(&self, column: C) -> CursorResult<Option<Value>> {
        self.get(column)
    }

    pub fn get_string<C: ColumnIndex>(&self, column: C) -> CursorResult<String> {
        self.get(column)
    }

    pub fn get_i8<C: ColumnIndex>(&self, column: C) -> CursorResult<i8> {
        self.get(column)
    }

    pub fn get_i16<C: ColumnIndex>(&self, column: C) -> CursorResult<i16> {
        self.get(column)
    }

    pub fn get_i32<C: ColumnIndex>(&self, column: C) -> CursorResult<i32> {
        self.get(column)
    }

    pub fn get_i64<C: ColumnIndex>(&self, column: C) -> CursorResult<i64> {
        self.get(column)
    }

    pub fn get_f32<C: ColumnIndex>(&self, column: C) -> CursorResult<f32> {
        self.get(column)
    }

    pub fn get_f64<C: ColumnIndex>(&self, column: C) -> CursorResult<f64> {
        self.get(column)
    }

    pub fn get_decimal<C: ColumnIndex>(&self, column: C) -> CursorResult<Decimal> {
        self.get(column)
    }

    /// Decimal rounded half away from zero to `scale` fractional digits
    pub fn get_decimal_scaled<C: ColumnIndex>(
        &self,
        column: C,
        scale: u32,
    ) -> CursorResult<Decimal> {
        let value: Decimal = self.get(column)?;
        Ok(value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero))
    }

    pub fn get_bool<C: ColumnIndex>(&self, column: C) -> CursorResult<bool> {
        self.get(column)
    }

    pub fn get_timestamp<C: ColumnIndex>(&self, column: C) -> CursorResult<Option<DateTime<Utc>>> {
        self.get(column)
    }

    pub fn get_date<C: ColumnIndex>(&self, column: C) -> CursorResult<Option<NaiveDate>> {
        self.get(column)
    }

    /// The underlying frame; readable in any state
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    fn cell<C: ColumnIndex>(&self, column: C) -> CursorResult<&Value> {
        let row = match self.state() {
            CursorState::Closed => return Err(CursorError::Closed),
            CursorState::OnRow(i) => i,
            CursorState::BeforeFirst | CursorState::AfterLast => {
                return Err(CursorError::NoCurrentRow)
            }
        };
        let idx = column.position(self)?;
        self.frame
            .row(row)
            .map(|r| &r[idx])
            .ok_or(CursorError::NoCurrentRow)
    }

    fn ensure_open(&mut self) -> CursorResult<()> {
        if self.session_closed() {
            self.close();
        }
        if self.state == CursorState::Closed {
            return Err(CursorError::Closed);
        }
        Ok(())
    }

    fn session_closed(&self) -> bool {
        self.session.as_ref().map_or(false, SessionHandle::is_closed)
    }
}
