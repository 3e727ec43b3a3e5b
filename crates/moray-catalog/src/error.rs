//! Error types for catalog operations
//!
//! Everything the catalog can fail with is a CatalogError variant.
//! Duplicate registrations are recoverable (pick another name);
//! missing system objects on a non-empty store mean the catalog is
//! corrupted and construction must stop.

use std::error::Error;
use std::fmt;

use moray_store::StoreError;

/// Catalog error types with contextual detail
#[derive(Debug)]
pub enum CatalogError {
    /// A descriptor with this id is already registered
    DuplicateId {
        /// Descriptor kind ("table" or "sequence")
        kind: &'static str,
        id: u64,
    },

    /// A descriptor with this name is already registered
    DuplicateName {
        kind: &'static str,
        name: String,
    },

    /// No descriptor with this id is registered
    UnknownId {
        kind: &'static str,
        id: u64,
    },

    /// A sequence was used before being registered
    UnknownSequence {
        name: String,
    },

    /// A non-empty store is missing one of the system objects
    MissingSystemObject {
        name: String,
    },

    /// The table already has a primary key
    PrimaryKeyExists {
        table: String,
    },

    /// A primary-key column is not part of the table
    UnknownKeyColumn {
        table: String,
        column: String,
    },

    /// The table already has a column with this name
    DuplicateColumn {
        table: String,
        column: String,
    },

    /// A descriptor was registered in memory but could not be
    /// persisted; the in-memory entry has been rolled back
    NotSaved {
        kind: &'static str,
        name: String,
        source: Box<CatalogError>,
    },

    /// The underlying store failed
    Store(StoreError),

    /// A descriptor payload could not be encoded or decoded
    Encoding(serde_json::Error),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::DuplicateId { kind, id } => {
                write!(f, "{} with id '{}' already exists", kind, id)
            }

            CatalogError::DuplicateName { kind, name } => {
                write!(f, "{} with name '{}' already exists", kind, name)
            }

            CatalogError::UnknownId { kind, id } => {
                write!(f, "no {} with id '{}'", kind, id)
            }

            CatalogError::UnknownSequence { name } => {
                write!(f, "sequence '{}' does not exist", name)
            }

            CatalogError::MissingSystemObject { name } => {
                write!(f, "system object '{}' missing from a non-empty catalog", name)
            }

            CatalogError::PrimaryKeyExists { table } => {
                write!(f, "table '{}' already has a primary key", table)
            }

            CatalogError::UnknownKeyColumn { table, column } => {
                write!(
                    f,
                    "key column '{}' is not a column of table '{}'",
                    column, table
                )
            }

            CatalogError::DuplicateColumn { table, column } => {
                write!(
                    f,
                    "a column named '{}' already exists on table '{}'",
                    column, table
                )
            }

            CatalogError::NotSaved { kind, name, source } => {
                write!(f, "could not persist {} '{}': {}", kind, name, source)
            }

            CatalogError::Store(err) => {
                write!(f, "store error: {}", err)
            }

            CatalogError::Encoding(err) => {
                write!(f, "descriptor encoding failed: {}", err)
            }
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CatalogError::NotSaved { source, .. } => Some(source.as_ref()),
            CatalogError::Store(err) => Some(err),
            CatalogError::Encoding(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        CatalogError::Store(err)
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Encoding(err)
    }
}

/// Result type alias for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;
