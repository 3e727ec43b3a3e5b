//! Key-value store and range-scan cursor over the skip-list index.
//!
//! The `Store` trait is the whole contract the rest of the system is
//! written against: point get, full-overwrite put, and a half-open
//! range scan that hands back a cursor. `MemStore` is the in-memory
//! implementation; durability across restarts is out of scope.

use std::fmt;

use crate::config::Config;
use crate::error::{StoreError, StoreResult};
use crate::skiplist::SkipList;

/// Three-operation storage contract consumed by the catalog and the
/// query layer.
///
/// Writers take `&mut self`; a cursor borrows the store, so the borrow
/// checker enforces the rule that scans never interleave with writes.
pub trait Store {
    type Cursor<'a>: Cursor
    where
        Self: 'a;

    /// Point lookup. Absent keys are `None`, not an error.
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Insert or fully overwrite the value under `key`.
    fn put(&mut self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Cursor over `[start, end)` in key order.
    fn scan(&self, start: &str, end: &str) -> StoreResult<Self::Cursor<'_>>;
}

/// Single-use reader over one scanned range.
pub trait Cursor {
    /// Read up to `n` values, advancing past each. A short read means
    /// the range is exhausted; it is never an error.
    fn read(&mut self, n: usize) -> StoreResult<Vec<Vec<u8>>>;

    /// Drain the remainder of the range.
    fn read_all(&mut self) -> StoreResult<Vec<Vec<u8>>> {
        self.read(usize::MAX)
    }

    /// Whether the next read would return nothing. Forward looking:
    /// re-check after every read rather than counting items.
    fn is_at_end(&self) -> bool;
}

/// In-memory store backed by the skip-list index.
#[derive(Debug)]
pub struct MemStore {
    list: SkipList<String, Vec<u8>>,
    config: Config,
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            list: SkipList::new(),
            config: Config::default(),
        }
    }

    /// A store with explicit entry-size limits.
    pub fn with_config(config: Config) -> StoreResult<Self> {
        config.validate()?;
        Ok(Self {
            list: SkipList::new(),
            config,
        })
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemStore {
    type Cursor<'a> = MemCursor<'a>
    where
        Self: 'a;

    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.list.get(key).map(|node| node.value().clone()))
    }

    fn put(&mut self, key: &str, value: &[u8]) -> StoreResult<()> {
        if key.len() > self.config.max_key_size {
            return Err(StoreError::OversizedKey {
                size: key.len(),
                limit: self.config.max_key_size,
            });
        }
        if value.len() > self.config.max_value_size {
            return Err(StoreError::OversizedValue {
                size: value.len(),
                limit: self.config.max_value_size,
            });
        }
        self.list.put(key.to_owned(), value.to_vec())?;
        Ok(())
    }

    fn scan(&self, start: &str, end: &str) -> StoreResult<MemCursor<'_>> {
        let (found, prevs) = self.list.search(start);
        let node = match found {
            Some(id) => Some(id),
            // The first node >= start is the level-0 successor of the
            // last node before it. No predecessor at all means start
            // precedes the entire index, so begin at the head.
            None => match prevs[0] {
                Some(prev) => self.list.node(prev).successor(),
                None => self.list.head(),
            },
        };
        Ok(MemCursor {
            list: &self.list,
            node,
            end: end.to_owned(),
        })
    }
}

/// Cursor over a `MemStore` range: a current position in the index
/// plus the exclusive end key.
pub struct MemCursor<'a> {
    list: &'a SkipList<String, Vec<u8>>,
    node: Option<usize>,
    end: String,
}

impl Cursor for MemCursor<'_> {
    fn read(&mut self, n: usize) -> StoreResult<Vec<Vec<u8>>> {
        let mut values = Vec::new();
        for _ in 0..n {
            let id = match self.node {
                Some(id) => id,
                None => break,
            };
            let node = self.list.node(id);
            if node.key().as_str() >= self.end.as_str() {
                break;
            }
            values.push(node.value().clone());
            self.node = node.successor();
        }
        Ok(values)
    }

    fn is_at_end(&self) -> bool {
        match self.node {
            None => true,
            Some(id) => self.end.as_str() <= self.list.node(id).key().as_str(),
        }
    }
}

impl fmt::Debug for MemCursor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemCursor")
            .field("end", &self.end)
            .field("at_end", &self.is_at_end())
            .finish()
    }
}
