//! Descriptors — the metadata records the catalog persists.
//!
//! A descriptor is an immutable value once stored, except for a
//! sequence's current value, which only ever advances. Tables and
//! sequences both implement `Descriptor`, which is what lets the
//! schema collections and the manager treat them uniformly.

use serde::{Deserialize, Serialize};

use moray_store::{Key, Span};

use crate::error::{CatalogError, CatalogResult};

/// Column name reserved for synthesized primary keys.
pub const RESERVED_KEY_COLUMN: &str = "__key";

/// Name of the sequence that allocates ids for a table's rows.
pub fn default_sequence_name(table: &str) -> String {
    format!("{}_sequence", table)
}

/// Primitive column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    String,
    Number,
    Boolean,
}

/// A single column: name, type, and optionally the name of a sequence
/// providing default values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            sequence: None,
        }
    }

    /// A number column whose default values come from a sequence.
    pub fn with_sequence(name: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: DataType::Number,
            sequence: Some(sequence.into()),
        }
    }
}

/// Table descriptor: id, name, ordered columns, primary-key columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub id: u64,
    pub name: String,
    pub columns: Vec<Column>,
    pub primary_key: Vec<String>,
}

impl Table {
    /// Build a table descriptor, checking that every primary-key
    /// column is one of the table's columns.
    pub fn new(
        id: u64,
        name: impl Into<String>,
        columns: Vec<Column>,
        primary_key: Vec<String>,
    ) -> CatalogResult<Self> {
        let name = name.into();
        for key in &primary_key {
            if !columns.iter().any(|c| c.name == *key) {
                return Err(CatalogError::UnknownKeyColumn {
                    table: name,
                    column: key.clone(),
                });
            }
        }
        Ok(Self {
            id,
            name,
            columns,
            primary_key,
        })
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn add_column(&mut self, column: Column) -> CatalogResult<()> {
        if self.column(&column.name).is_some() {
            return Err(CatalogError::DuplicateColumn {
                table: self.name.clone(),
                column: column.name,
            });
        }
        self.columns.push(column);
        Ok(())
    }

    /// Start of this table's namespace in the keyspace; all of the
    /// table's rows live under it.
    pub fn prefix(&self) -> Key {
        Key::new(self.name.clone())
    }

    /// The table's full scan range, `[prefix, prefix.next())`.
    pub fn span(&self) -> Span {
        let prefix = self.prefix();
        let end = prefix.next();
        Span::new(prefix, end)
    }

    /// Give a keyless table a synthesized primary key: an integer
    /// column backed by a dedicated sequence named after the table.
    /// Returns the sequence descriptor, which still has to be
    /// registered through the catalog.
    pub fn add_internal_primary_key(&mut self) -> CatalogResult<Sequence> {
        if !self.primary_key.is_empty() {
            return Err(CatalogError::PrimaryKeyExists {
                table: self.name.clone(),
            });
        }
        let sequence = Sequence::new(default_sequence_name(&self.name));
        self.columns
            .push(Column::with_sequence(RESERVED_KEY_COLUMN, sequence.name.clone()));
        self.primary_key = vec![RESERVED_KEY_COLUMN.to_string()];
        Ok(sequence)
    }
}

/// Sequence descriptor: a persisted monotonic counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    pub id: u64,
    pub name: String,
    pub value: u64,
}

impl Sequence {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            value: 0,
        }
    }

    /// Advance the counter and return the new value.
    pub fn next(&mut self) -> u64 {
        self.value += 1;
        self.value
    }
}

/// Uniform surface over the persistable descriptor kinds.
pub trait Descriptor: Clone + PartialEq + Sized {
    /// Kind label used in error messages.
    const KIND: &'static str;

    fn id(&self) -> u64;

    fn name(&self) -> &str;

    /// Record id this descriptor persists under within its system
    /// table's namespace.
    fn store_key(&self) -> String {
        self.id().to_string()
    }

    fn to_bytes(&self) -> CatalogResult<Vec<u8>>;

    fn from_bytes(bytes: &[u8]) -> CatalogResult<Self>;
}

impl Descriptor for Table {
    const KIND: &'static str = "table";

    fn id(&self) -> u64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn to_bytes(&self) -> CatalogResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    fn from_bytes(bytes: &[u8]) -> CatalogResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl Descriptor for Sequence {
    const KIND: &'static str = "sequence";

    fn id(&self) -> u64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn to_bytes(&self) -> CatalogResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    fn from_bytes(bytes: &[u8]) -> CatalogResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn columns() -> Vec<Column> {
        vec![
            Column::new("id", DataType::Number),
            Column::new("name", DataType::String),
            Column::new("active", DataType::Boolean),
        ]
    }

    #[test]
    fn test_new_validates_primary_key() {
        assert!(Table::new(1, "users", columns(), vec!["id".into()]).is_ok());
        assert!(matches!(
            Table::new(1, "users", columns(), vec!["missing".into()]),
            Err(CatalogError::UnknownKeyColumn { .. })
        ));
    }

    #[test]
    fn test_add_column_rejects_duplicates() {
        let mut table = Table::new(1, "users", columns(), vec![]).unwrap();
        table.add_column(Column::new("email", DataType::String)).unwrap();
        assert!(matches!(
            table.add_column(Column::new("email", DataType::String)),
            Err(CatalogError::DuplicateColumn { .. })
        ));
    }

    #[test]
    fn test_span_covers_namespace() {
        let table = Table::new(7, "users", columns(), vec!["id".into()]).unwrap();
        let span = table.span();
        assert_eq!(span.start.encode(), "users/");
        assert_eq!(span.end.encode(), "users0");
    }

    #[test]
    fn test_add_internal_primary_key() {
        let mut table = Table::new(1, "events", columns(), vec![]).unwrap();
        let sequence = table.add_internal_primary_key().unwrap();

        assert_eq!(sequence.name, "events_sequence");
        assert_eq!(table.primary_key, vec![RESERVED_KEY_COLUMN.to_string()]);
        let column = table.column(RESERVED_KEY_COLUMN).unwrap();
        assert_eq!(column.data_type, DataType::Number);
        assert_eq!(column.sequence.as_deref(), Some("events_sequence"));

        // a second synthesized key is rejected
        assert!(matches!(
            table.add_internal_primary_key(),
            Err(CatalogError::PrimaryKeyExists { .. })
        ));
    }

    #[test]
    fn test_sequence_next() {
        let mut sequence = Sequence::new("s");
        assert_eq!(sequence.next(), 1);
        assert_eq!(sequence.next(), 2);
        assert_eq!(sequence.value, 2);
    }

    #[test]
    fn test_descriptor_round_trip() {
        let table = Table::new(3, "users", columns(), vec!["id".into()]).unwrap();
        let decoded = Table::from_bytes(&table.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, table);
        assert_eq!(decoded.store_key(), "3");

        let sequence = Sequence { id: 4, name: "s".into(), value: 9 };
        let decoded = Sequence::from_bytes(&sequence.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, sequence);
    }
}
