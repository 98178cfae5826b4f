pub mod connection;
pub mod lead_query;
pub mod leads;
pub mod users;

pub use connection::Database;
