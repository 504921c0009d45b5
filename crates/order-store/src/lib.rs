//! Order and cart persistence for the order service.
//!
//! Defines the repository contracts (`OrderStore`, `CartStore`) plus two
//! implementations: an in-memory store for tests and single-node use, and
//! a PostgreSQL store. Mutations that race on the same order rely on the
//! conditional `update_status` match-and-set rather than read-modify-write.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use query::{OrderFilter, OrderQuery, SalesSummary, SortDirection, SortField};
pub use store::{CartStore, OrderStore};
