//! Catalog manager: loads, bootstraps and mutates the schema.
//!
//! The manager is the only writer of the system key ranges. It keeps
//! the in-memory schema and the store in agreement: every create
//! registers in memory first and persists second, and a failed
//! persist backs the registration out again.

use std::fmt;

use tracing::{debug, info};

use moray_store::{Cursor, Key, Span, Store};

use crate::desc::{Descriptor, Sequence, Table};
use crate::error::{CatalogError, CatalogResult};
use crate::schema::{Collection, Schema};
use crate::sys::{self, SystemCatalog};

/// Owns the schema, the store it persists through, and fixed handles
/// on the system objects. One manager per database instance.
pub struct Manager<S: Store> {
    schema: Schema,
    store: S,
    sys: SystemCatalog,
}

impl<S: Store> Manager<S> {
    /// Construct a manager over a store, bootstrapping the system
    /// catalog when the store is empty and reloading it otherwise.
    ///
    /// Reading the schema requires the system tables' key spans, and
    /// the system tables are themselves part of that schema. The
    /// bootstrap image in `sys` breaks the circle: its spans are
    /// fixed, so they can drive the initial scan.
    pub fn new(store: S) -> CatalogResult<Self> {
        let schema = load_schema(&store)?;
        let mut manager = Self {
            schema,
            store,
            sys: SystemCatalog::init(),
        };

        if manager.schema.is_empty() {
            info!("store is empty, bootstrapping system catalog");
            manager.bootstrap()?;
        }

        // Resolve the live system objects, whether just bootstrapped
        // or loaded; a non-empty store missing any of them is corrupt.
        manager.sys = SystemCatalog::from_schema(&manager.schema)?;
        Ok(manager)
    }

    /// Populate a fresh database with the system tables and their id
    /// sequences.
    ///
    /// The normal create paths allocate ids from the system
    /// sequences, which do not exist yet when this runs, so the
    /// system objects are registered and persisted directly. Against
    /// an already-populated schema the first duplicate registration
    /// fails and nothing changes.
    pub fn bootstrap(&mut self) -> CatalogResult<()> {
        for table in [sys::init_tables_table(), sys::init_sequences_table()] {
            self.schema.add_table(table.clone())?;
            self.save_table(&table)?;
        }
        for sequence in [sys::init_tables_sequence(), sys::init_sequences_sequence()] {
            self.schema.add_sequence(sequence.clone())?;
            self.save_sequence(&sequence)?;
        }
        info!("bootstrapped system catalog");
        Ok(())
    }

    /// Register a new table: allocate its id, synthesize a primary
    /// key when the descriptor has none, persist the result. Returns
    /// the completed descriptor.
    pub fn create_table(&mut self, mut table: Table) -> CatalogResult<Table> {
        let tables_sequence = self.sys.tables_sequence.clone();
        table.id = self.sequence_next(&tables_sequence)?;

        if table.primary_key.is_empty() {
            let sequence = table.add_internal_primary_key()?;
            self.create_sequence(sequence)?;
        }

        self.schema.add_table(table.clone())?;
        if let Err(err) = self.save_table(&table) {
            // The schema and the store must not diverge on a failed
            // write; back the entry out before surfacing.
            self.schema
                .remove_table(table.id)
                .expect("just-added table missing during rollback");
            return Err(CatalogError::NotSaved {
                kind: Table::KIND,
                name: table.name,
                source: Box::new(err),
            });
        }

        debug!(table = %table.name, id = table.id, "created table");
        Ok(table)
    }

    /// Register a new sequence, allocating its id from the sequences
    /// sequence. Returns the completed descriptor.
    pub fn create_sequence(&mut self, mut sequence: Sequence) -> CatalogResult<Sequence> {
        let sequences_sequence = self.sys.sequences_sequence.clone();
        sequence.id = self.sequence_next(&sequences_sequence)?;

        self.schema.add_sequence(sequence.clone())?;
        self.save_sequence(&sequence)?;

        debug!(sequence = %sequence.name, id = sequence.id, "created sequence");
        Ok(sequence)
    }

    /// Advance a sequence and persist the new value before returning
    /// it, so a reloaded schema never observes a value lower than one
    /// already handed out. Handing a value out and using it are not
    /// atomic with each other.
    pub fn sequence_next(&mut self, name: &str) -> CatalogResult<u64> {
        let sequence = match self.schema.sequence_mut(name) {
            Some(sequence) => sequence,
            None => {
                return Err(CatalogError::UnknownSequence {
                    name: name.to_string(),
                })
            }
        };
        let value = sequence.next();
        let snapshot = sequence.clone();
        self.save_sequence(&snapshot)?;
        Ok(value)
    }

    /// Exact store key a table descriptor persists under.
    pub fn table_key(&self, table: &Table) -> Key {
        self.sys.tables.prefix().with_id(table.store_key())
    }

    /// Exact store key a sequence descriptor persists under.
    pub fn sequence_key(&self, sequence: &Sequence) -> Key {
        self.sys.sequences.prefix().with_id(sequence.store_key())
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn system(&self) -> &SystemCatalog {
        &self.sys
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Give the store back, e.g. to construct a fresh manager over it.
    pub fn into_store(self) -> S {
        self.store
    }

    fn save_table(&mut self, table: &Table) -> CatalogResult<()> {
        let key = self.table_key(table);
        self.put_descriptor(&key, table)
    }

    fn save_sequence(&mut self, sequence: &Sequence) -> CatalogResult<()> {
        let key = self.sequence_key(sequence);
        self.put_descriptor(&key, sequence)
    }

    fn put_descriptor<V: Descriptor>(&mut self, key: &Key, v: &V) -> CatalogResult<()> {
        let bytes = v.to_bytes()?;
        self.store.put(&key.encode(), &bytes)?;
        Ok(())
    }
}

impl<S: Store> fmt::Debug for Manager<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("tables", &self.schema.tables().len())
            .field("sequences", &self.schema.sequences().len())
            .finish()
    }
}

/// Build a fresh schema by scanning the two system-table ranges.
/// Works against a bare store, with or without a live manager.
pub fn load_schema<S: Store>(store: &S) -> CatalogResult<Schema> {
    let tables = load_collection::<Table, S>(store, &sys::init_tables_table().span())?;
    let sequences =
        load_collection::<Sequence, S>(store, &sys::init_sequences_table().span())?;
    Ok(Schema::from_parts(tables, sequences))
}

fn load_collection<V: Descriptor, S: Store>(
    store: &S,
    span: &Span,
) -> CatalogResult<Collection<V>> {
    let mut cursor = store.scan(&span.start.encode(), &span.end.encode())?;
    let mut collection = Collection::new();
    for bytes in cursor.read_all()? {
        collection.add(V::from_bytes(&bytes)?)?;
    }
    Ok(collection)
}
