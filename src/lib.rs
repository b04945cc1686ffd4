pub mod client;
pub mod engine;
mod error;
pub mod protocol;

pub use engine::{Connection, Rows, Statement};
pub use error::{Diagnostic, DriverError, ErrorCategory, Result};
pub use protocol::{HostKind, HostValue, Row};
