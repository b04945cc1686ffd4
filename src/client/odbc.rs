//! ODBC-backed native client (DB2 CLI speaks ODBC).
//!
//! Parameters are bound as text and the cursor is drained eagerly at
//! execute time; describe and fetch then serve from the drained result.
//! That keeps the statement handle free of borrow cycles at the cost of
//! buffering one result set, which is acceptable on this path; result
//! sets here are not bulk-throughput traffic.

use super::{
    ClientConnection, ClientResult, ClientStatement, Column, ColumnDescriptor, Fetch,
    ParamBinding, TypeCode,
};
use crate::error::Diagnostic;
use odbc_api::handles::AsStatementRef;
use odbc_api::{
    Connection, ConnectionOptions, Cursor, DataType, Environment, IntoParameter, Prepared,
    ResultSetMetadata,
};

/// Receive-area size for types whose declared length the driver does
/// not report.
const DEFAULT_DECLARED_SIZE: usize = 255;

pub struct OdbcClient {
    connection: Connection<'static>,
}

impl OdbcClient {
    /// Connects through the ODBC driver manager.
    ///
    /// The environment is leaked to obtain the `'static` reference the
    /// connection type requires. One environment per connection is
    /// initialised once for the process lifetime in practice, and the
    /// operating system reclaims it at termination; the alternative is
    /// unsafe lifetime extension against the driver manager's handle
    /// rules.
    pub fn connect(connection_string: &str) -> ClientResult<Self> {
        if connection_string.is_empty() {
            return Err(Diagnostic::new("08001", 0, "connection string is empty"));
        }
        let env = Environment::new().map_err(diagnostic_from)?;
        let env: &'static Environment = Box::leak(Box::new(env));
        let connection = env
            .connect_with_connection_string(connection_string, ConnectionOptions::default())
            .map_err(diagnostic_from)?;
        Ok(Self { connection })
    }
}

impl ClientConnection for OdbcClient {
    fn prepare<'conn>(&'conn self, sql: &str) -> ClientResult<Box<dyn ClientStatement + 'conn>> {
        let prepared = self.connection.prepare(sql).map_err(diagnostic_from)?;
        Ok(Box::new(OdbcStatement {
            prepared,
            params: Vec::new(),
            result: None,
        }))
    }
}

struct DrainedResult {
    columns: Vec<ColumnDescriptor>,
    rows: Vec<Vec<Option<Vec<u8>>>>,
    cursor: usize,
}

pub struct OdbcStatement<S> {
    prepared: Prepared<S>,
    params: Vec<String>,
    result: Option<DrainedResult>,
}

impl<S> ClientStatement for OdbcStatement<S>
where
    S: AsStatementRef,
{
    fn bind_parameter(&mut self, position: u16, binding: &ParamBinding<'_>) -> ClientResult<()> {
        let text = parameter_text(binding)?;
        let index = usize::from(position);
        if index == 0 {
            return Err(Diagnostic::new("07009", 0, "parameter positions are 1-based"));
        }
        if self.params.len() < index {
            self.params.resize(index, String::new());
        }
        self.params[index - 1] = text;
        Ok(())
    }

    fn execute(&mut self) -> ClientResult<()> {
        let cursor = match self.params.len() {
            0 => self.prepared.execute(()).map_err(diagnostic_from)?,
            1 => {
                let p0 = self.params[0].as_str().into_parameter();
                self.prepared.execute((&p0,)).map_err(diagnostic_from)?
            }
            2 => {
                let p0 = self.params[0].as_str().into_parameter();
                let p1 = self.params[1].as_str().into_parameter();
                self.prepared
                    .execute((&p0, &p1))
                    .map_err(diagnostic_from)?
            }
            3 => {
                let p0 = self.params[0].as_str().into_parameter();
                let p1 = self.params[1].as_str().into_parameter();
                let p2 = self.params[2].as_str().into_parameter();
                self.prepared
                    .execute((&p0, &p1, &p2))
                    .map_err(diagnostic_from)?
            }
            4 => {
                let p0 = self.params[0].as_str().into_parameter();
                let p1 = self.params[1].as_str().into_parameter();
                let p2 = self.params[2].as_str().into_parameter();
                let p3 = self.params[3].as_str().into_parameter();
                self.prepared
                    .execute((&p0, &p1, &p2, &p3))
                    .map_err(diagnostic_from)?
            }
            5 => {
                let p0 = self.params[0].as_str().into_parameter();
                let p1 = self.params[1].as_str().into_parameter();
                let p2 = self.params[2].as_str().into_parameter();
                let p3 = self.params[3].as_str().into_parameter();
                let p4 = self.params[4].as_str().into_parameter();
                self.prepared
                    .execute((&p0, &p1, &p2, &p3, &p4))
                    .map_err(diagnostic_from)?
            }
            n => {
                return Err(Diagnostic::new(
                    "HYC00",
                    0,
                    format!("at most 5 parameters supported, got {}", n),
                ))
            }
        };

        let mut drained = DrainedResult {
            columns: Vec::new(),
            rows: Vec::new(),
            cursor: 0,
        };

        if let Some(mut cursor) = cursor {
            let cols_i16 = cursor.num_result_cols().map_err(diagnostic_from)?;
            let cols: u16 = cols_i16
                .try_into()
                .map_err(|_| Diagnostic::new("HY000", 0, "invalid column count"))?;

            for index in 1..=cols {
                let name = cursor.col_name(index).map_err(diagnostic_from)?;
                let data_type = cursor.col_data_type(index).map_err(diagnostic_from)?;
                drained.columns.push(ColumnDescriptor::new(
                    name,
                    type_code(&data_type),
                    declared_size(&data_type),
                    declared_scale(&data_type),
                ));
            }

            while let Some(mut row) = cursor.next_row().map_err(diagnostic_from)? {
                let mut cells = Vec::with_capacity(usize::from(cols));
                for index in 1..=cols {
                    let mut buf = Vec::new();
                    let has_value = row.get_text(index, &mut buf).map_err(diagnostic_from)?;
                    cells.push(has_value.then_some(buf));
                }
                drained.rows.push(cells);
            }
        }

        self.result = Some(drained);
        self.params.clear();
        Ok(())
    }

    fn num_result_columns(&mut self) -> ClientResult<u16> {
        let result = self.result.as_ref().ok_or_else(sequence_error)?;
        Ok(result.columns.len() as u16)
    }

    fn describe_column(&mut self, position: u16) -> ClientResult<ColumnDescriptor> {
        let result = self.result.as_ref().ok_or_else(sequence_error)?;
        result
            .columns
            .get(usize::from(position).wrapping_sub(1))
            .cloned()
            .ok_or_else(|| {
                Diagnostic::new("07009", 0, format!("column {} out of range", position))
            })
    }

    fn bind_result_column(&mut self, position: u16, capacity: usize) -> ClientResult<()> {
        let result = self.result.as_ref().ok_or_else(sequence_error)?;
        if usize::from(position).wrapping_sub(1) >= result.columns.len() {
            return Err(Diagnostic::new(
                "07009",
                0,
                format!("column {} out of range", position),
            ));
        }
        if capacity == 0 {
            return Err(Diagnostic::new("HY090", 0, "invalid buffer length"));
        }
        Ok(())
    }

    fn fetch(&mut self, columns: &mut [Column]) -> ClientResult<Fetch> {
        let result = self.result.as_mut().ok_or_else(sequence_error)?;
        let Some(row) = result.rows.get(result.cursor) else {
            return Ok(Fetch::NoData);
        };
        for (column, cell) in columns.iter_mut().zip(row.iter()) {
            column.slot.write(cell.as_deref());
        }
        result.cursor += 1;
        Ok(Fetch::Row)
    }

    fn free(&mut self) -> ClientResult<()> {
        // The driver-manager handle itself is released when the
        // statement is dropped; this releases the buffered result.
        self.result = None;
        self.params.clear();
        Ok(())
    }
}

fn sequence_error() -> Diagnostic {
    Diagnostic::new("HY010", 0, "function sequence error")
}

/// Text form of one bound parameter. Nulls have no text representation
/// on this client and are rejected; the scripted client and the seam
/// itself support them.
fn parameter_text(binding: &ParamBinding<'_>) -> ClientResult<String> {
    match binding {
        ParamBinding::Null => Err(Diagnostic::new(
            "HYC00",
            0,
            "NULL parameters are not supported by the ODBC client",
        )),
        ParamBinding::Double(n) => Ok(n.to_string()),
        ParamBinding::Int(n) => Ok(n.to_string()),
        ParamBinding::BigInt(n) => Ok(n.to_string()),
        ParamBinding::Text(bytes) => std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| Diagnostic::new("22021", 0, "parameter text is not valid UTF-8")),
    }
}

fn type_code(data_type: &DataType) -> TypeCode {
    match data_type {
        DataType::SmallInt | DataType::TinyInt | DataType::Bit => TypeCode::SmallInt,
        DataType::Integer => TypeCode::Integer,
        DataType::BigInt => TypeCode::BigInt,
        DataType::Decimal { .. } => TypeCode::Decimal,
        DataType::Numeric { .. } => TypeCode::Numeric,
        DataType::Real => TypeCode::Real,
        DataType::Double => TypeCode::Double,
        DataType::Float { .. } => TypeCode::Float,
        DataType::Date => TypeCode::Date,
        DataType::Time { .. } => TypeCode::Time,
        DataType::Timestamp { .. } => TypeCode::Timestamp,
        DataType::Char { .. } => TypeCode::Char,
        DataType::Binary { .. } | DataType::Varbinary { .. } | DataType::LongVarbinary { .. } => {
            TypeCode::Binary
        }
        _ => TypeCode::Varchar,
    }
}

fn declared_size(data_type: &DataType) -> usize {
    match data_type {
        DataType::Char { length }
        | DataType::Varchar { length }
        | DataType::Binary { length }
        | DataType::Varbinary { length }
        | DataType::LongVarbinary { length } => {
            (*length).map(|l| l.get()).unwrap_or(DEFAULT_DECLARED_SIZE)
        }
        // Sign and decimal point on top of the declared precision.
        DataType::Decimal { precision, .. } | DataType::Numeric { precision, .. } => precision + 2,
        DataType::SmallInt | DataType::TinyInt | DataType::Bit => 6,
        DataType::Integer => 11,
        DataType::BigInt => 20,
        DataType::Real | DataType::Double | DataType::Float { .. } => 24,
        DataType::Date => 10,
        DataType::Time { .. } => 8,
        DataType::Timestamp { .. } => 26,
        _ => DEFAULT_DECLARED_SIZE,
    }
}

fn declared_scale(data_type: &DataType) -> i16 {
    match data_type {
        DataType::Decimal { scale, .. } | DataType::Numeric { scale, .. } => *scale,
        _ => 0,
    }
}

fn diagnostic_from(error: odbc_api::Error) -> Diagnostic {
    use odbc_api::Error as OdbcErr;

    let record = match &error {
        OdbcErr::Diagnostics { record, .. } => Some(record),
        OdbcErr::UnsupportedOdbcApiVersion(record) => Some(record),
        OdbcErr::InvalidRowArraySize { record, .. } => Some(record),
        OdbcErr::UnableToRepresentNull(record) => Some(record),
        OdbcErr::OracleOdbcDriverDoesNotSupport64Bit(record) => Some(record),
        _ => None,
    };

    match record {
        Some(record) => Diagnostic {
            sqlstate: record.state.0,
            native_code: record.native_error,
            message: record.to_string(),
        },
        None => Diagnostic::new("HY000", 0, error.to_string()),
    }
}
