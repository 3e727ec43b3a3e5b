//! Integration tests: the catalog manager over the in-memory store.
//!
//! These exercise the full construct -> bootstrap -> create -> reload
//! pipeline, checking both the in-memory schema and the raw payloads
//! the store ends up holding.

use moray_catalog::desc::RESERVED_KEY_COLUMN;
use moray_catalog::{
    load_schema, sys, CatalogError, Column, DataType, Descriptor, Manager, Sequence, Table,
};
use moray_store::{Config, Cursor, Key, MemStore, Store};
use pretty_assertions::assert_eq;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn user_table(name: &str) -> Table {
    Table::new(
        0,
        name,
        vec![
            Column::new("id", DataType::Number),
            Column::new("name", DataType::String),
        ],
        vec!["id".into()],
    )
    .unwrap()
}

/// The descriptor must be in the schema and its payload in the store.
fn assert_table_persisted(manager: &Manager<MemStore>, table: &Table) {
    let in_schema = manager
        .schema()
        .get_table(&table.name)
        .expect("table missing from schema");
    assert_eq!(in_schema, table);

    let bytes = manager
        .store()
        .get(&manager.table_key(table).encode())
        .unwrap()
        .expect("table missing from store");
    assert_eq!(Table::from_bytes(&bytes).unwrap(), *table);
}

fn assert_sequence_persisted(manager: &Manager<MemStore>, sequence: &Sequence) {
    let in_schema = manager
        .schema()
        .get_sequence(&sequence.name)
        .expect("sequence missing from schema");
    assert_eq!(in_schema, sequence);

    let bytes = manager
        .store()
        .get(&manager.sequence_key(sequence).encode())
        .unwrap()
        .expect("sequence missing from store");
    assert_eq!(Sequence::from_bytes(&bytes).unwrap(), *sequence);
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

#[test]
fn test_bootstrap_populates_schema_and_store() {
    let manager = Manager::new(MemStore::new()).unwrap();

    assert_table_persisted(&manager, &sys::init_tables_table());
    assert_table_persisted(&manager, &sys::init_sequences_table());
    assert_sequence_persisted(&manager, &sys::init_tables_sequence());
    assert_sequence_persisted(&manager, &sys::init_sequences_sequence());
}

#[test]
fn test_bootstrap_twice_fails_and_changes_nothing() {
    let mut manager = Manager::new(MemStore::new()).unwrap();
    let before = manager.schema().clone();

    let err = manager.bootstrap().unwrap_err();
    assert!(
        matches!(err, CatalogError::DuplicateId { kind: "table", id: 1 }),
        "unexpected error: {err}"
    );
    assert_eq!(*manager.schema(), before);
}

#[test]
fn test_reload_reproduces_bootstrap() {
    let manager = Manager::new(MemStore::new()).unwrap();
    let reloaded = Manager::new(manager.into_store()).unwrap();

    assert_table_persisted(&reloaded, &sys::init_tables_table());
    assert_sequence_persisted(&reloaded, &sys::init_tables_sequence());
    assert_sequence_persisted(&reloaded, &sys::init_sequences_sequence());
}

// ---------------------------------------------------------------------------
// Table creation
// ---------------------------------------------------------------------------

#[test]
fn test_create_table() {
    let mut manager = Manager::new(MemStore::new()).unwrap();
    let created = manager.create_table(user_table("users")).unwrap();

    // first id past the reserved system ids
    assert_eq!(created.id, 3);
    assert_table_persisted(&manager, &created);

    // the allocation was flushed with it
    let tables_sequence = manager
        .schema()
        .get_sequence(&manager.system().tables_sequence)
        .unwrap();
    assert_eq!(tables_sequence.value, 3);
}

#[test]
fn test_keyless_table_gets_synthesized_key() {
    let mut manager = Manager::new(MemStore::new()).unwrap();
    let table = Table::new(
        0,
        "events",
        vec![Column::new("kind", DataType::String)],
        vec![],
    )
    .unwrap();
    let created = manager.create_table(table).unwrap();

    assert_eq!(created.primary_key, vec![RESERVED_KEY_COLUMN.to_string()]);
    let column = created.column(RESERVED_KEY_COLUMN).unwrap();
    assert_eq!(column.data_type, DataType::Number);
    assert_eq!(column.sequence.as_deref(), Some("events_sequence"));

    // the backing sequence was created through the normal path
    let sequence = manager.schema().get_sequence("events_sequence").unwrap();
    assert_eq!(sequence.id, 3);
    assert_eq!(sequence.value, 0);
    assert_table_persisted(&manager, &created);
}

#[test]
fn test_table_ids_increase_across_failures() {
    let mut manager = Manager::new(MemStore::new()).unwrap();

    let first = manager.create_table(user_table("t1")).unwrap();

    // duplicate name: rejected, but its id allocation already happened
    let err = manager.create_table(user_table("t1")).unwrap_err();
    assert!(matches!(err, CatalogError::DuplicateName { kind: "table", .. }));

    let second = manager.create_table(user_table("t2")).unwrap();
    let third = manager.create_table(user_table("t3")).unwrap();

    let ids = [first.id, second.id, third.id];
    assert_eq!(ids, [3, 5, 6]);
    for pair in ids.windows(2) {
        assert!(pair[0] < pair[1]);
    }

    // the failed attempt left neither schema entry nor payload behind
    assert_eq!(manager.schema().get_table("t1").unwrap().id, first.id);
    let orphan_key = Key::new(sys::TABLES_NAME).with_id("4");
    assert_eq!(manager.store().get(&orphan_key.encode()).unwrap(), None);
}

#[test]
fn test_failed_persist_rolls_back_schema() {
    // value limit sized so the system payloads fit but a wide user
    // table's descriptor does not
    let config = Config { max_key_size: 4096, max_value_size: 400 };
    let store = MemStore::with_config(config).unwrap();
    let mut manager = Manager::new(store).unwrap();

    let columns: Vec<Column> = (0..24)
        .map(|i| Column::new(format!("col{}", i), DataType::Number))
        .collect();
    let wide = Table::new(0, "wide", columns, vec!["col0".into()]).unwrap();

    let err = manager.create_table(wide).unwrap_err();
    assert!(matches!(err, CatalogError::NotSaved { kind: "table", .. }));

    // the entry was backed out of the schema, not left dangling
    assert!(manager.schema().get_table("wide").is_none());

    // the consumed id is never reused
    let next = manager.create_table(user_table("after")).unwrap();
    assert_eq!(next.id, 4);
}

// ---------------------------------------------------------------------------
// Sequences
// ---------------------------------------------------------------------------

#[test]
fn test_create_sequence_and_advance() {
    let mut manager = Manager::new(MemStore::new()).unwrap();
    let visits = manager.create_sequence(Sequence::new("visits")).unwrap();
    assert_eq!(visits.id, 3);
    assert_sequence_persisted(&manager, &visits);

    assert_eq!(manager.sequence_next("visits").unwrap(), 1);
    assert_eq!(manager.sequence_next("visits").unwrap(), 2);
    assert_eq!(manager.sequence_next("visits").unwrap(), 3);

    // every increment was flushed through the store
    let bytes = manager
        .store()
        .get(&manager.sequence_key(&visits).encode())
        .unwrap()
        .unwrap();
    assert_eq!(Sequence::from_bytes(&bytes).unwrap().value, 3);
}

#[test]
fn test_sequence_next_requires_registration() {
    let mut manager = Manager::new(MemStore::new()).unwrap();
    let err = manager.sequence_next("ghost").unwrap_err();
    assert!(matches!(err, CatalogError::UnknownSequence { name } if name == "ghost"));
}

// ---------------------------------------------------------------------------
// Durability within the process
// ---------------------------------------------------------------------------

#[test]
fn test_catalog_survives_reload() {
    let mut manager = Manager::new(MemStore::new()).unwrap();
    let table = manager.create_table(user_table("users")).unwrap();
    manager.create_sequence(Sequence::new("visits")).unwrap();
    manager.sequence_next("visits").unwrap();
    manager.sequence_next("visits").unwrap();

    let reloaded = Manager::new(manager.into_store()).unwrap();

    assert_eq!(reloaded.schema().get_table("users"), Some(&table));
    assert_eq!(reloaded.schema().get_sequence("visits").unwrap().value, 2);

    // id allocation picks up where the previous manager stopped
    let mut reloaded = reloaded;
    let next = reloaded.create_table(user_table("orders")).unwrap();
    assert_eq!(next.id, 4);
}

// ---------------------------------------------------------------------------
// Loading without a manager
// ---------------------------------------------------------------------------

#[test]
fn test_load_schema_empty_store() {
    let store = MemStore::new();
    let schema = load_schema(&store).unwrap();
    assert!(schema.is_empty());
}

#[test]
fn test_load_schema_sees_user_and_system_data() {
    let mut manager = Manager::new(MemStore::new()).unwrap();
    manager.create_table(user_table("users")).unwrap();

    let schema = load_schema(manager.store()).unwrap();
    assert!(schema.get_table(sys::TABLES_NAME).is_some());
    assert!(schema.get_table("users").is_some());
}

#[test]
fn test_user_data_without_system_objects_is_corrupt() {
    let mut store = MemStore::new();
    let mut orphan = user_table("orphan");
    orphan.id = 9;
    let key = sys::init_tables_table().prefix().with_id(orphan.store_key());
    store.put(&key.encode(), &orphan.to_bytes().unwrap()).unwrap();

    // loading is fine on its own
    let schema = load_schema(&store).unwrap();
    assert!(schema.get_table("orphan").is_some());
    assert!(schema.get_table(sys::TABLES_NAME).is_none());

    // a manager over a non-empty store missing the system objects
    // must refuse to construct
    let err = Manager::new(store).unwrap_err();
    assert!(matches!(err, CatalogError::MissingSystemObject { .. }));
}

// ---------------------------------------------------------------------------
// The executor-facing span contract
// ---------------------------------------------------------------------------

#[test]
fn test_table_span_drives_row_scans() {
    let mut manager = Manager::new(MemStore::new()).unwrap();
    let table = manager.create_table(user_table("rows")).unwrap();

    let mut store = manager.into_store();
    for id in ["1", "2", "3"] {
        let key = table.prefix().with_id(id);
        store.put(&key.encode(), id.as_bytes()).unwrap();
    }
    // a neighboring namespace must stay invisible to the scan
    store
        .put(&Key::new("rowsx").with_id("1").encode(), b"other")
        .unwrap();

    let span = table.span();
    let mut cursor = store
        .scan(&span.start.encode(), &span.end.encode())
        .unwrap();
    assert_eq!(
        cursor.read_all().unwrap(),
        vec![b"1".to_vec(), b"2".to_vec(), b"3".to_vec()]
    );

    // user rows never pollute the system ranges
    assert!(Manager::new(store).is_ok());
}
