//! System catalog objects.
//!
//! The catalog stores its own metadata in two reserved tables: the
//! tables table and the sequences table, each with an id-allocating
//! sequence of its own. Their ids and names are fixed so that a
//! manager can find them before anything has been read from the
//! store. The `init_*` constructors build the bootstrap images; a
//! loaded store must contain objects matching them by name.

use crate::desc::{default_sequence_name, Column, DataType, Sequence, Table};
use crate::error::{CatalogError, CatalogResult};
use crate::schema::Schema;

/// Reserved id of the tables table and of its sequence.
pub const TABLES_ID: u64 = 1;

/// Reserved id of the sequences table and of its sequence.
pub const SEQUENCES_ID: u64 = 2;

pub const TABLES_NAME: &str = "__tables__";
pub const SEQUENCES_NAME: &str = "__sequences__";

/// System sequences start past the reserved ids, so the first user
/// object gets id 3.
const SEQUENCE_START: u64 = 2;

const ID_COLUMN: &str = "id";
const NAME_COLUMN: &str = "name";

fn system_table(id: u64, name: &str) -> Table {
    Table {
        id,
        name: name.to_string(),
        columns: vec![
            Column::with_sequence(ID_COLUMN, default_sequence_name(name)),
            Column::new(NAME_COLUMN, DataType::String),
        ],
        primary_key: vec![ID_COLUMN.to_string()],
    }
}

/// Bootstrap image of the tables table.
pub fn init_tables_table() -> Table {
    system_table(TABLES_ID, TABLES_NAME)
}

/// Bootstrap image of the sequences table.
pub fn init_sequences_table() -> Table {
    system_table(SEQUENCES_ID, SEQUENCES_NAME)
}

/// Bootstrap image of the sequence allocating table ids.
pub fn init_tables_sequence() -> Sequence {
    Sequence {
        id: TABLES_ID,
        name: default_sequence_name(TABLES_NAME),
        value: SEQUENCE_START,
    }
}

/// Bootstrap image of the sequence allocating sequence ids.
pub fn init_sequences_sequence() -> Sequence {
    Sequence {
        id: SEQUENCES_ID,
        name: default_sequence_name(SEQUENCES_NAME),
        value: SEQUENCE_START,
    }
}

/// Fixed handles on the system objects.
///
/// Holds the two system table descriptors (immutable once created)
/// and the names of their id-allocating sequences; the schema stays
/// the single owner of mutable sequence state.
#[derive(Debug, Clone)]
pub struct SystemCatalog {
    /// Descriptor of the table that stores table descriptors
    pub tables: Table,
    /// Descriptor of the table that stores sequence descriptors
    pub sequences: Table,
    /// Name of the sequence allocating table ids
    pub tables_sequence: String,
    /// Name of the sequence allocating sequence ids
    pub sequences_sequence: String,
}

impl SystemCatalog {
    /// The bootstrap image, usable before anything exists in the
    /// store. The system tables' key spans come from here, which is
    /// what lets the manager read the schema that defines them.
    pub fn init() -> Self {
        Self {
            tables: init_tables_table(),
            sequences: init_sequences_table(),
            tables_sequence: default_sequence_name(TABLES_NAME),
            sequences_sequence: default_sequence_name(SEQUENCES_NAME),
        }
    }

    /// Resolve the system objects out of a loaded schema, failing
    /// with a corrupted-catalog error on the first one missing.
    pub fn from_schema(schema: &Schema) -> CatalogResult<Self> {
        let tables_sequence = default_sequence_name(TABLES_NAME);
        let sequences_sequence = default_sequence_name(SEQUENCES_NAME);

        let tables = resolve_table(schema, TABLES_NAME)?;
        let sequences = resolve_table(schema, SEQUENCES_NAME)?;
        resolve_sequence(schema, &tables_sequence)?;
        resolve_sequence(schema, &sequences_sequence)?;

        Ok(Self {
            tables,
            sequences,
            tables_sequence,
            sequences_sequence,
        })
    }
}

fn resolve_table(schema: &Schema, name: &str) -> CatalogResult<Table> {
    schema
        .get_table(name)
        .cloned()
        .ok_or_else(|| CatalogError::MissingSystemObject { name: name.to_string() })
}

fn resolve_sequence(schema: &Schema, name: &str) -> CatalogResult<Sequence> {
    schema
        .get_sequence(name)
        .cloned()
        .ok_or_else(|| CatalogError::MissingSystemObject { name: name.to_string() })
}
