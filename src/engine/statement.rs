use crate::client::{BindSlot, ClientStatement, Column, Fetch};
use crate::error::{DriverError, Result};
use crate::protocol::{build_row, HostValue, Row};
use log::{debug, warn};

use super::rows::Rows;

/// One prepared SQL command bound to one connection.
///
/// Drives the lifecycle prepare -> bind-and-execute ->
/// describe-and-bind-results -> fetch. The prepared handle is owned and
/// released exactly once; the result schema and receive buffers are
/// owned as one `Vec<Column>`, so descriptors and slots can never
/// disagree in count and a partially-built schema tears down through
/// the same path as a complete one.
pub struct Statement<'conn> {
    stmt: Option<Box<dyn ClientStatement + 'conn>>,
    columns: Vec<Column>,
}

impl<'conn> Statement<'conn> {
    pub(crate) fn new(stmt: Box<dyn ClientStatement + 'conn>) -> Self {
        Self {
            stmt: Some(stmt),
            columns: Vec::new(),
        }
    }

    /// Number of result columns from the last execute; zero for DML and
    /// for closed or never-executed statements.
    pub fn num_result_columns(&self) -> usize {
        self.columns.len()
    }

    /// Whether the last execute produced a result set. Distinguishes
    /// "never had rows" from a result set that has been read to the end.
    pub fn has_result_set(&self) -> bool {
        !self.columns.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.stmt.is_none()
    }

    /// The result schema and receive slots from the last execute.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Binds `params` positionally and executes the prepared command.
    ///
    /// Any bind failure aborts the call before execute is invoked. On
    /// success with a result-producing command, the result schema is
    /// described and a receive buffer of `declared size + 1` bytes is
    /// bound per column; a mid-loop failure leaves the schema partially
    /// built, which [`close`](Self::close) releases like any other.
    pub fn execute(&mut self, params: &[HostValue]) -> Result<()> {
        let stmt = self.stmt.as_mut().ok_or(DriverError::InvalidStatement)?;

        // Previous result state ends here, success or failure.
        self.columns.clear();

        for (index, value) in params.iter().enumerate() {
            let position = (index + 1) as u16;
            stmt.bind_parameter(position, &value.binding())
                .map_err(DriverError::BindParameter)?;
        }

        stmt.execute().map_err(DriverError::Execute)?;

        let count = stmt.num_result_columns().map_err(DriverError::Execute)?;
        debug!("statement executed, {} result column(s)", count);

        for position in 1..=count {
            let descriptor = stmt
                .describe_column(position)
                .map_err(DriverError::DescribeResult)?;
            let capacity = descriptor.size + 1;
            stmt.bind_result_column(position, capacity)
                .map_err(DriverError::BindResult)?;
            self.columns.push(Column {
                slot: BindSlot::new(capacity),
                descriptor,
            });
        }

        Ok(())
    }

    /// Advances the cursor one row and converts it. Returns `Ok(None)`
    /// at end of data (and keeps returning it), or immediately when
    /// the statement has no result set.
    pub fn fetch(&mut self, named: bool) -> Result<Option<Row>> {
        if self.columns.is_empty() {
            return Ok(None);
        }
        let Some(stmt) = self.stmt.as_mut() else {
            return Ok(None);
        };

        match stmt.fetch(&mut self.columns).map_err(DriverError::Fetch)? {
            Fetch::NoData => Ok(None),
            Fetch::Row => Ok(Some(build_row(&self.columns, named))),
        }
    }

    /// A lazy, single-pass iterator over the remaining rows.
    pub fn rows(&mut self, named: bool) -> Rows<'_, 'conn> {
        Rows::new(self, named)
    }

    /// Releases the prepared handle and all result state. Safe to call
    /// any number of times; also runs at drop. A native release failure
    /// is logged and otherwise discarded; close always succeeds.
    pub fn close(&mut self) {
        if let Some(mut stmt) = self.stmt.take() {
            if let Err(diagnostic) = stmt.free() {
                warn!("statement handle release failed: {}", diagnostic);
            }
        }
        self.columns.clear();
    }
}

impl Drop for Statement<'_> {
    fn drop(&mut self) {
        self.close();
    }
}
