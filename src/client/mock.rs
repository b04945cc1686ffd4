//! Scripted in-memory client. Statements are described up front
//! (result schema, row data, and any diagnostics to inject per phase)
//! and every call is recorded in an event log so tests can assert call
//! order, marshalled type tags, and exactly-once release.

use super::{
    ClientConnection, ClientResult, ClientStatement, Column, ColumnDescriptor, CType, Fetch,
    ParamBinding, TypeCode,
};
use crate::error::Diagnostic;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum MockEvent {
    Prepare(String),
    BindParameter {
        position: u16,
        value_type: CType,
        sql_type: TypeCode,
        octet_length: usize,
        null: bool,
    },
    Execute,
    DescribeColumn(u16),
    BindColumn {
        position: u16,
        capacity: usize,
    },
    Fetch,
    Free,
}

/// Behavior of one prepared statement: its result schema, row data, and
/// diagnostics to inject. Failure injections fire once, so a statement
/// stays usable for a follow-up execute after a scripted failure.
#[derive(Debug, Clone, Default)]
pub struct MockScript {
    columns: Vec<ColumnDescriptor>,
    rows: Vec<Vec<Option<String>>>,
    placeholders: Option<usize>,
    fail_bind_at: Option<(u16, Diagnostic)>,
    fail_execute: Option<Diagnostic>,
    fail_describe_at: Option<(u16, Diagnostic)>,
    fail_bind_column_at: Option<(u16, Diagnostic)>,
    fail_free: Option<Diagnostic>,
}

impl MockScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, name: &str, type_code: TypeCode, size: usize, scale: i16) -> Self {
        self.columns
            .push(ColumnDescriptor::new(name, type_code, size, scale));
        self
    }

    pub fn row(mut self, cells: Vec<Option<&str>>) -> Self {
        self.rows
            .push(cells.into_iter().map(|c| c.map(str::to_owned)).collect());
        self
    }

    /// Declares the placeholder count; binding past it fails with a
    /// descriptor-index diagnostic.
    pub fn placeholders(mut self, count: usize) -> Self {
        self.placeholders = Some(count);
        self
    }

    pub fn fail_bind_at(mut self, position: u16, diagnostic: Diagnostic) -> Self {
        self.fail_bind_at = Some((position, diagnostic));
        self
    }

    pub fn fail_execute(mut self, diagnostic: Diagnostic) -> Self {
        self.fail_execute = Some(diagnostic);
        self
    }

    pub fn fail_describe_at(mut self, position: u16, diagnostic: Diagnostic) -> Self {
        self.fail_describe_at = Some((position, diagnostic));
        self
    }

    pub fn fail_bind_column_at(mut self, position: u16, diagnostic: Diagnostic) -> Self {
        self.fail_bind_column_at = Some((position, diagnostic));
        self
    }

    pub fn fail_free(mut self, diagnostic: Diagnostic) -> Self {
        self.fail_free = Some(diagnostic);
        self
    }
}

#[derive(Default)]
pub struct MockConnection {
    scripts: HashMap<String, MockScript>,
    events: Arc<Mutex<Vec<MockEvent>>>,
    freed: Arc<AtomicUsize>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&mut self, sql: &str, script: MockScript) {
        self.scripts.insert(sql.to_string(), script);
    }

    pub fn events(&self) -> Vec<MockEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// How many statement handles have been released so far.
    pub fn free_count(&self) -> usize {
        self.freed.load(Ordering::SeqCst)
    }

    fn record(&self, event: MockEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl ClientConnection for MockConnection {
    fn prepare<'conn>(&'conn self, sql: &str) -> ClientResult<Box<dyn ClientStatement + 'conn>> {
        self.record(MockEvent::Prepare(sql.to_string()));
        let script = self.scripts.get(sql).cloned().ok_or_else(|| {
            Diagnostic::new("42704", -204, format!("\"{}\" is an undefined name", sql))
        })?;
        Ok(Box::new(MockStatement {
            script,
            events: Arc::clone(&self.events),
            freed: Arc::clone(&self.freed),
            executed: false,
            cursor: 0,
        }))
    }
}

struct MockStatement {
    script: MockScript,
    events: Arc<Mutex<Vec<MockEvent>>>,
    freed: Arc<AtomicUsize>,
    executed: bool,
    cursor: usize,
}

impl MockStatement {
    fn record(&self, event: MockEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl ClientStatement for MockStatement {
    fn bind_parameter(&mut self, position: u16, binding: &ParamBinding<'_>) -> ClientResult<()> {
        self.record(MockEvent::BindParameter {
            position,
            value_type: binding.value_type(),
            sql_type: binding.sql_type(),
            octet_length: binding.octet_length(),
            null: binding.is_null(),
        });

        if let Some((at, diagnostic)) = self.script.fail_bind_at.clone() {
            if at == position {
                self.script.fail_bind_at = None;
                return Err(diagnostic);
            }
        }

        if let Some(count) = self.script.placeholders {
            if usize::from(position) > count {
                return Err(Diagnostic::new(
                    "07009",
                    -313,
                    format!("parameter marker {} out of range", position),
                ));
            }
        }

        Ok(())
    }

    fn execute(&mut self) -> ClientResult<()> {
        self.record(MockEvent::Execute);
        if let Some(diagnostic) = self.script.fail_execute.take() {
            return Err(diagnostic);
        }
        self.executed = true;
        self.cursor = 0;
        Ok(())
    }

    fn num_result_columns(&mut self) -> ClientResult<u16> {
        Ok(self.script.columns.len() as u16)
    }

    fn describe_column(&mut self, position: u16) -> ClientResult<ColumnDescriptor> {
        self.record(MockEvent::DescribeColumn(position));
        if let Some((at, diagnostic)) = self.script.fail_describe_at.clone() {
            if at == position {
                self.script.fail_describe_at = None;
                return Err(diagnostic);
            }
        }
        self.script
            .columns
            .get(usize::from(position).wrapping_sub(1))
            .cloned()
            .ok_or_else(|| {
                Diagnostic::new("07009", -313, format!("column {} out of range", position))
            })
    }

    fn bind_result_column(&mut self, position: u16, capacity: usize) -> ClientResult<()> {
        self.record(MockEvent::BindColumn { position, capacity });
        if let Some((at, diagnostic)) = self.script.fail_bind_column_at.clone() {
            if at == position {
                self.script.fail_bind_column_at = None;
                return Err(diagnostic);
            }
        }
        if capacity == 0 {
            return Err(Diagnostic::new("HY090", -99999, "invalid buffer length"));
        }
        Ok(())
    }

    fn fetch(&mut self, columns: &mut [Column]) -> ClientResult<Fetch> {
        self.record(MockEvent::Fetch);
        if !self.executed {
            return Err(Diagnostic::new("HY010", -99999, "function sequence error"));
        }
        let Some(row) = self.script.rows.get(self.cursor) else {
            return Ok(Fetch::NoData);
        };
        for (column, cell) in columns.iter_mut().zip(row.iter()) {
            column.slot.write(cell.as_deref().map(str::as_bytes));
        }
        self.cursor += 1;
        Ok(Fetch::Row)
    }

    fn free(&mut self) -> ClientResult<()> {
        self.record(MockEvent::Free);
        self.freed.fetch_add(1, Ordering::SeqCst);
        if let Some(diagnostic) = self.script.fail_free.take() {
            return Err(diagnostic);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::BindSlot;

    fn two_column_script() -> MockScript {
        MockScript::new()
            .column("ID", TypeCode::Integer, 10, 0)
            .column("NAME", TypeCode::Varchar, 32, 0)
            .row(vec![Some("42"), Some("zaphod")])
    }

    #[test]
    fn test_prepare_unknown_sql_is_a_diagnostic() {
        let conn = MockConnection::new();
        let err = conn.prepare("SELECT 1").err().expect("must fail");
        assert_eq!(err.sqlstate_str(), "42704");
        assert_eq!(err.native_code, -204);
    }

    #[test]
    fn test_fetch_before_execute_is_a_sequence_error() {
        let mut conn = MockConnection::new();
        conn.script("SELECT 1", MockScript::new());
        let mut stmt = conn.prepare("SELECT 1").unwrap();
        let err = stmt.fetch(&mut []).err().expect("must fail");
        assert_eq!(err.sqlstate_str(), "HY010");
    }

    #[test]
    fn test_fetch_walks_rows_then_reports_no_data() {
        let mut conn = MockConnection::new();
        conn.script("q", two_column_script());
        let mut stmt = conn.prepare("q").unwrap();
        stmt.execute().unwrap();

        let mut columns: Vec<Column> = (1..=2)
            .map(|i| {
                let descriptor = stmt.describe_column(i).unwrap();
                let slot = BindSlot::new(descriptor.size + 1);
                Column { descriptor, slot }
            })
            .collect();

        assert_eq!(stmt.fetch(&mut columns).unwrap(), Fetch::Row);
        assert_eq!(columns[0].slot.text_bytes(), Some(&b"42"[..]));
        assert_eq!(columns[1].slot.text_bytes(), Some(&b"zaphod"[..]));
        assert_eq!(stmt.fetch(&mut columns).unwrap(), Fetch::NoData);
        assert_eq!(stmt.fetch(&mut columns).unwrap(), Fetch::NoData);
    }

    #[test]
    fn test_bind_past_placeholder_count_fails() {
        let mut conn = MockConnection::new();
        conn.script("q", MockScript::new().placeholders(1));
        let mut stmt = conn.prepare("q").unwrap();
        assert!(stmt.bind_parameter(1, &ParamBinding::Int(1)).is_ok());
        let err = stmt
            .bind_parameter(2, &ParamBinding::Int(2))
            .err()
            .expect("must fail");
        assert_eq!(err.sqlstate_str(), "07009");
    }

    #[test]
    fn test_injected_failures_fire_once() {
        let mut conn = MockConnection::new();
        conn.script(
            "q",
            MockScript::new().fail_execute(Diagnostic::new("40001", -911, "deadlock")),
        );
        let mut stmt = conn.prepare("q").unwrap();
        assert!(stmt.execute().is_err());
        assert!(stmt.execute().is_ok());
    }

    #[test]
    fn test_free_is_counted() {
        let mut conn = MockConnection::new();
        conn.script("q", MockScript::new());
        let mut stmt = conn.prepare("q").unwrap();
        stmt.free().unwrap();
        assert_eq!(conn.free_count(), 1);
    }

    #[test]
    fn test_events_record_marshalling_detail() {
        let mut conn = MockConnection::new();
        conn.script("q", MockScript::new());
        let mut stmt = conn.prepare("q").unwrap();
        stmt.bind_parameter(1, &ParamBinding::Text(b"abc")).unwrap();
        drop(stmt);

        let events = conn.events();
        assert_eq!(events[0], MockEvent::Prepare("q".to_string()));
        assert_eq!(
            events[1],
            MockEvent::BindParameter {
                position: 1,
                value_type: CType::Char,
                sql_type: TypeCode::Varchar,
                octet_length: 3,
                null: false,
            }
        );
    }
}
