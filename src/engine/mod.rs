pub mod connection;
pub mod rows;
pub mod statement;

pub use connection::Connection;
pub use rows::Rows;
pub use statement::Statement;
