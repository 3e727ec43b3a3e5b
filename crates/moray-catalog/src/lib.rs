//! Moray Catalog — schema management for MorayDB
//!
//! Persists table and sequence descriptors through the store's
//! `Get`/`Put`/`Scan` contract under two reserved system namespaces,
//! bootstraps them from an empty store, and serves the in-memory
//! `Schema` the query layer resolves names against.
//!
//! # Lifecycle
//!
//! - **Construct**: scan the system ranges; an empty result triggers
//!   bootstrap, anything else must contain the four system objects
//! - **Create**: allocate an id from the matching system sequence,
//!   register in memory, persist; a failed persist rolls the
//!   registration back
//! - **Reload**: `load_schema` rebuilds a schema from any store,
//!   independent of a live manager

pub mod desc;
pub mod error;
pub mod manager;
pub mod schema;
pub mod sys;

// Re-export key types for convenience
pub use desc::{Column, DataType, Descriptor, Sequence, Table};
pub use error::{CatalogError, CatalogResult};
pub use manager::{load_schema, Manager};
pub use schema::{Collection, Schema};
pub use sys::SystemCatalog;
