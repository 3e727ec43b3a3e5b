//! In-memory schema: the descriptor collections the query layer reads.
//!
//! The schema is repopulated wholesale on load and kept consistent
//! with the store by the manager; nothing here touches storage.

use hashbrown::HashMap;

use crate::desc::{Descriptor, Sequence, Table};
use crate::error::{CatalogError, CatalogResult};

/// Descriptors of one kind, unique by id and by name.
///
/// Each descriptor is stored once under its id; the name index holds
/// the id, which stays valid because descriptor names never change
/// after registration.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<V: Descriptor> {
    by_id: HashMap<u64, V>,
    by_name: HashMap<String, u64>,
}

impl<V: Descriptor> Collection<V> {
    pub fn new() -> Self {
        Self {
            by_id: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Register a descriptor. Both its id and its name must be free.
    pub fn add(&mut self, v: V) -> CatalogResult<()> {
        if self.by_id.contains_key(&v.id()) {
            return Err(CatalogError::DuplicateId {
                kind: V::KIND,
                id: v.id(),
            });
        }
        if self.by_name.contains_key(v.name()) {
            return Err(CatalogError::DuplicateName {
                kind: V::KIND,
                name: v.name().to_string(),
            });
        }
        self.by_name.insert(v.name().to_string(), v.id());
        self.by_id.insert(v.id(), v);
        Ok(())
    }

    pub fn get(&self, id: u64) -> Option<&V> {
        self.by_id.get(&id)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&V> {
        self.by_name.get(name).and_then(|id| self.by_id.get(id))
    }

    pub(crate) fn get_by_name_mut(&mut self, name: &str) -> Option<&mut V> {
        let id = *self.by_name.get(name)?;
        self.by_id.get_mut(&id)
    }

    /// Unregister by id, returning the descriptor.
    pub fn remove(&mut self, id: u64) -> CatalogResult<V> {
        let v = self.by_id.remove(&id).ok_or(CatalogError::UnknownId {
            kind: V::KIND,
            id,
        })?;
        self.by_name.remove(v.name());
        Ok(v)
    }

    pub fn iter(&self) -> impl Iterator<Item = &V> {
        self.by_id.values()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl<V: Descriptor> Default for Collection<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// The database's in-memory schema: one collection of tables, one of
/// sequences.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    tables: Collection<Table>,
    sequences: Collection<Sequence>,
}

impl Schema {
    pub fn new() -> Self {
        Self {
            tables: Collection::new(),
            sequences: Collection::new(),
        }
    }

    pub(crate) fn from_parts(
        tables: Collection<Table>,
        sequences: Collection<Sequence>,
    ) -> Self {
        Self { tables, sequences }
    }

    pub fn add_table(&mut self, table: Table) -> CatalogResult<()> {
        self.tables.add(table)
    }

    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.get_by_name(name)
    }

    pub fn get_table_by_id(&self, id: u64) -> Option<&Table> {
        self.tables.get(id)
    }

    pub fn remove_table(&mut self, id: u64) -> CatalogResult<Table> {
        self.tables.remove(id)
    }

    pub fn add_sequence(&mut self, sequence: Sequence) -> CatalogResult<()> {
        self.sequences.add(sequence)
    }

    pub fn get_sequence(&self, name: &str) -> Option<&Sequence> {
        self.sequences.get_by_name(name)
    }

    pub fn get_sequence_by_id(&self, id: u64) -> Option<&Sequence> {
        self.sequences.get(id)
    }

    pub fn remove_sequence(&mut self, id: u64) -> CatalogResult<Sequence> {
        self.sequences.remove(id)
    }

    pub(crate) fn sequence_mut(&mut self, name: &str) -> Option<&mut Sequence> {
        self.sequences.get_by_name_mut(name)
    }

    pub fn tables(&self) -> &Collection<Table> {
        &self.tables
    }

    pub fn sequences(&self) -> &Collection<Sequence> {
        &self.sequences
    }

    /// Whether the schema holds no descriptors at all, the signal
    /// that a store needs bootstrapping.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.sequences.is_empty()
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}
