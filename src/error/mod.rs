use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Failure-path classification for the statement lifecycle. Embedding
/// layers use this to decide which host-side failure channel a
/// [`DriverError`] maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Operating on a statement without a live prepared handle.
    InvalidState,
    /// A parameter could not be bound; remaining binds were skipped.
    Binding,
    /// The native execute (or prepare) call failed.
    Execution,
    /// Describe/bind-column failed mid-loop; result state is partial.
    Schema,
    /// The cursor advance failed with something other than end-of-data.
    Fetch,
}

/// One diagnostic record from the native client: SQLSTATE, native error
/// code, and the human-readable message text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    #[serde(serialize_with = "serialize_sqlstate")]
    pub sqlstate: [u8; 5],
    pub native_code: i32,
    pub message: String,
}

fn serialize_sqlstate<S>(state: &[u8; 5], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&String::from_utf8_lossy(state))
}

impl Diagnostic {
    pub fn new(sqlstate: &str, native_code: i32, message: impl Into<String>) -> Self {
        let mut state = [b' '; 5];
        for (dst, src) in state.iter_mut().zip(sqlstate.bytes()) {
            *dst = src;
        }
        Self {
            sqlstate: state,
            native_code,
            message: message.into(),
        }
    }

    pub fn sqlstate_str(&self) -> String {
        String::from_utf8_lossy(&self.sqlstate).into_owned()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] ({}) {}",
            self.sqlstate_str(),
            self.native_code,
            self.message
        )
    }
}

#[derive(Error, Debug, Clone)]
pub enum DriverError {
    #[error("execute called on a closed or invalid statement")]
    InvalidStatement,

    #[error("error preparing statement: {0}")]
    Prepare(Diagnostic),

    #[error("error binding statement parameters: {0}")]
    BindParameter(Diagnostic),

    #[error("unknown or unsupported parameter type `{0}'")]
    UnsupportedBinding(String),

    #[error("error executing statement: {0}")]
    Execute(Diagnostic),

    #[error("error describing result set: {0}")]
    DescribeResult(Diagnostic),

    #[error("error allocating result buffers: {0}")]
    BindResult(Diagnostic),

    #[error("error fetching row: {0}")]
    Fetch(Diagnostic),
}

impl DriverError {
    /// The native diagnostic behind this error, when one exists. The
    /// locally-synthesized variants carry none.
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            DriverError::Prepare(d)
            | DriverError::BindParameter(d)
            | DriverError::Execute(d)
            | DriverError::DescribeResult(d)
            | DriverError::BindResult(d)
            | DriverError::Fetch(d) => Some(d),
            DriverError::InvalidStatement | DriverError::UnsupportedBinding(_) => None,
        }
    }

    pub fn sqlstate(&self) -> [u8; 5] {
        self.diagnostic().map(|d| d.sqlstate).unwrap_or([0u8; 5])
    }

    pub fn native_code(&self) -> i32 {
        self.diagnostic().map(|d| d.native_code).unwrap_or(0)
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            DriverError::InvalidStatement => ErrorCategory::InvalidState,
            DriverError::BindParameter(_) | DriverError::UnsupportedBinding(_) => {
                ErrorCategory::Binding
            }
            DriverError::Prepare(_) | DriverError::Execute(_) => ErrorCategory::Execution,
            DriverError::DescribeResult(_) | DriverError::BindResult(_) => ErrorCategory::Schema,
            DriverError::Fetch(_) => ErrorCategory::Fetch,
        }
    }
}

pub type Result<T> = std::result::Result<T, DriverError>;
