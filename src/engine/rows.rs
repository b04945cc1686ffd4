use super::statement::Statement;
use crate::error::Result;
use crate::protocol::Row;

/// Single-pass row iterator over a statement's current result set.
///
/// Holds nothing beyond the statement borrow and the named-columns
/// flag; each step is one fetch. Not restartable: exhausting it leaves
/// the statement in the exhausted-result state, safe to close.
pub struct Rows<'a, 'conn> {
    statement: &'a mut Statement<'conn>,
    named: bool,
}

impl<'a, 'conn> Rows<'a, 'conn> {
    pub(crate) fn new(statement: &'a mut Statement<'conn>, named: bool) -> Self {
        Self { statement, named }
    }
}

impl Iterator for Rows<'_, '_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.statement.fetch(self.named).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::{MockConnection, MockScript};
    use crate::client::{ClientConnection, TypeCode};
    use crate::protocol::HostValue;

    fn three_row_connection() -> MockConnection {
        let mut conn = MockConnection::new();
        conn.script(
            "q",
            MockScript::new()
                .column("N", TypeCode::Integer, 10, 0)
                .row(vec![Some("1")])
                .row(vec![Some("2")])
                .row(vec![Some("3")]),
        );
        conn
    }

    #[test]
    fn test_rows_yields_every_row_then_ends() {
        let conn = three_row_connection();
        let mut stmt = Statement::new(conn.prepare("q").unwrap());
        stmt.execute(&[]).unwrap();

        let values: Vec<i64> = stmt
            .rows(false)
            .map(|row| row.unwrap().get(1).and_then(HostValue::as_integer).unwrap())
            .collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_exhausted_iterator_leaves_statement_at_end_of_data() {
        let conn = three_row_connection();
        let mut stmt = Statement::new(conn.prepare("q").unwrap());
        stmt.execute(&[]).unwrap();

        assert_eq!(stmt.rows(false).count(), 3);
        assert_eq!(stmt.fetch(false).unwrap(), None);
        stmt.close();
    }

    #[test]
    fn test_rows_named_flag_flows_through() {
        let conn = three_row_connection();
        let mut stmt = Statement::new(conn.prepare("q").unwrap());
        stmt.execute(&[]).unwrap();

        let first = stmt.rows(true).next().unwrap().unwrap();
        assert!(first.is_named());
        assert_eq!(first.get_named("n"), Some(&HostValue::Integer(1)));
    }
}
