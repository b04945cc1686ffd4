use super::statement::Statement;
use crate::client::ClientConnection;
use crate::error::{DriverError, Result};
use log::debug;

/// A live connection to the database, generic over the native client
/// behind it. Read-only from the statements' perspective; the borrow on
/// `prepare` keeps every statement within the connection's lifetime.
pub struct Connection<C: ClientConnection> {
    client: C,
}

impl<C: ClientConnection> Connection<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Allocates and prepares a statement for `sql`. Prepare-time
    /// errors (syntax, undefined names) surface here rather than at
    /// execute time.
    pub fn prepare(&self, sql: &str) -> Result<Statement<'_>> {
        debug!("preparing statement: {}", sql);
        let stmt = self.client.prepare(sql).map_err(DriverError::Prepare)?;
        Ok(Statement::new(stmt))
    }
}
