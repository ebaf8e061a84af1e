//! In-memory implementations for testing and dry runs
pub mod transport;

pub use transport::InMemoryTransport;
