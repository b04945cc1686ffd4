//! The native-client seam: the CLI verb set the statement layer drives.
//!
//! DB2's call-level interface is handle-based and phase-ordered: bind
//! parameters, execute, count and describe result columns, bind a
//! fixed-width character receive area per column, then fetch row by
//! row. The traits here mirror those verbs so the engine can be driven
//! against the real client or the scripted in-memory one. Receive
//! buffers stay owned by the engine ([`BindSlot`]); `fetch` writes into
//! them instead of retaining pointers, which keeps the contract
//! expressible in safe Rust.

use crate::error::Diagnostic;

pub mod mock;
#[cfg(feature = "odbc")]
pub mod odbc;

/// Length sentinel reported for a fetched column whose value is null.
pub const NULL_DATA: isize = -1;

/// Upper bound on stored column names; the CLI reports names into a
/// fixed-size area and longer names arrive truncated.
pub const MAX_COLUMN_NAME: usize = 128;

pub type ClientResult<T> = std::result::Result<T, Diagnostic>;

/// Server-side type codes, as the CLI reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCode {
    Char,
    Varchar,
    SmallInt,
    Integer,
    BigInt,
    Decimal,
    Numeric,
    Double,
    Float,
    Real,
    Date,
    Time,
    Timestamp,
    Binary,
    Other(i16),
}

impl TypeCode {
    pub fn from_code(code: i16) -> Self {
        match code {
            1 => Self::Char,
            12 => Self::Varchar,
            5 => Self::SmallInt,
            4 => Self::Integer,
            -5 => Self::BigInt,
            3 => Self::Decimal,
            2 => Self::Numeric,
            8 => Self::Double,
            6 => Self::Float,
            7 => Self::Real,
            91 => Self::Date,
            92 => Self::Time,
            93 => Self::Timestamp,
            -2 => Self::Binary,
            other => Self::Other(other),
        }
    }

    pub fn code(&self) -> i16 {
        match self {
            Self::Char => 1,
            Self::Varchar => 12,
            Self::SmallInt => 5,
            Self::Integer => 4,
            Self::BigInt => -5,
            Self::Decimal => 3,
            Self::Numeric => 2,
            Self::Double => 8,
            Self::Float => 6,
            Self::Real => 7,
            Self::Date => 91,
            Self::Time => 92,
            Self::Timestamp => 93,
            Self::Binary => -2,
            Self::Other(code) => *code,
        }
    }
}

/// C buffer tag for a bound parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CType {
    Char,
    Long,
    Double,
    SBigInt,
}

/// One marshalled input parameter. Text borrows the caller's bytes and
/// is bound with its exact byte length; scalars are owned by the
/// variant, so every payload lives until the bind call returns and is
/// dropped unconditionally afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamBinding<'a> {
    /// Type-tagged null: an integer slot with the null length sentinel.
    Null,
    /// 8-byte float bound as a decimal parameter.
    Double(f64),
    /// Variable-length character data, exact byte length, no copy.
    Text(&'a [u8]),
    /// 4-byte integer; also the representation for booleans (0/1).
    Int(i32),
    /// 8-byte integer.
    BigInt(i64),
}

impl ParamBinding<'_> {
    pub fn value_type(&self) -> CType {
        match self {
            ParamBinding::Null | ParamBinding::Int(_) => CType::Long,
            ParamBinding::Double(_) => CType::Double,
            ParamBinding::Text(_) => CType::Char,
            ParamBinding::BigInt(_) => CType::SBigInt,
        }
    }

    pub fn sql_type(&self) -> TypeCode {
        match self {
            ParamBinding::Null | ParamBinding::Int(_) => TypeCode::Integer,
            ParamBinding::Double(_) => TypeCode::Decimal,
            ParamBinding::Text(_) => TypeCode::Varchar,
            ParamBinding::BigInt(_) => TypeCode::BigInt,
        }
    }

    pub fn octet_length(&self) -> usize {
        match self {
            ParamBinding::Null => 0,
            ParamBinding::Double(_) | ParamBinding::BigInt(_) => 8,
            ParamBinding::Text(bytes) => bytes.len(),
            ParamBinding::Int(_) => 4,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ParamBinding::Null)
    }
}

/// Server-reported metadata for one result column. Populated once per
/// execute, immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub type_code: TypeCode,
    pub size: usize,
    pub scale: i16,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, type_code: TypeCode, size: usize, scale: i16) -> Self {
        let mut name = name.into();
        if name.len() > MAX_COLUMN_NAME {
            let mut cut = MAX_COLUMN_NAME;
            while !name.is_char_boundary(cut) {
                cut -= 1;
            }
            name.truncate(cut);
        }
        Self {
            name,
            type_code,
            size,
            scale,
        }
    }
}

/// Receive buffer for one result column: owned storage, its capacity,
/// and the length written by the last fetch ([`NULL_DATA`] for null).
#[derive(Debug, Clone)]
pub struct BindSlot {
    buffer: Vec<u8>,
    capacity: usize,
    len: isize,
}

impl BindSlot {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0u8; capacity],
            capacity,
            len: NULL_DATA,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> isize {
        self.len
    }

    pub fn is_null(&self) -> bool {
        self.len == NULL_DATA
    }

    /// Stores one fetched value. Text longer than the receive area is
    /// truncated to `capacity - 1` bytes, leaving room for the
    /// terminator a fixed-width character area carries.
    pub fn write(&mut self, value: Option<&[u8]>) {
        match value {
            None => self.len = NULL_DATA,
            Some(bytes) => {
                let n = bytes.len().min(self.capacity.saturating_sub(1));
                self.buffer[..n].copy_from_slice(&bytes[..n]);
                self.len = n as isize;
            }
        }
    }

    /// The bytes written by the last fetch, or `None` when the column
    /// was null.
    pub fn text_bytes(&self) -> Option<&[u8]> {
        if self.len < 0 {
            None
        } else {
            Some(&self.buffer[..self.len as usize])
        }
    }
}

/// Descriptor and receive slot for one result column, owned as a unit
/// so the two can never disagree in count.
#[derive(Debug, Clone)]
pub struct Column {
    pub descriptor: ColumnDescriptor,
    pub slot: BindSlot,
}

/// Outcome of one cursor advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fetch {
    Row,
    NoData,
}

pub trait ClientConnection {
    /// Allocates and prepares a statement handle for `sql`. Syntax and
    /// name-resolution errors must surface here, not at execute time
    /// (deferred prepare is off).
    fn prepare<'conn>(&'conn self, sql: &str) -> ClientResult<Box<dyn ClientStatement + 'conn>>;
}

/// One prepared statement handle. Positions are 1-based, as in the CLI.
pub trait ClientStatement {
    fn bind_parameter(&mut self, position: u16, binding: &ParamBinding<'_>) -> ClientResult<()>;

    fn execute(&mut self) -> ClientResult<()>;

    fn num_result_columns(&mut self) -> ClientResult<u16>;

    fn describe_column(&mut self, position: u16) -> ClientResult<ColumnDescriptor>;

    /// Registers a fixed-width character receive area of `capacity`
    /// bytes for the column; subsequent fetches write into the matching
    /// [`BindSlot`].
    fn bind_result_column(&mut self, position: u16, capacity: usize) -> ClientResult<()>;

    /// Advances the cursor one row, writing each column's text
    /// representation (or the null sentinel) into its slot.
    fn fetch(&mut self, columns: &mut [Column]) -> ClientResult<Fetch>;

    /// Releases the underlying handle. Called at most once.
    fn free(&mut self) -> ClientResult<()>;
}
