//! Traced store wrapper.
//!
//! `TracedStore` forwards every operation to an inner store and emits
//! a `tracing` event for it, so a misbehaving key range can be watched
//! without touching the call sites. Wrap any `Store` with it and pass
//! the wrapper wherever the plain store would go.

use tracing::debug;

use crate::error::StoreResult;
use crate::store::{Cursor, Store};

/// Store wrapper that logs every get, put, scan and read.
#[derive(Debug)]
pub struct TracedStore<S> {
    inner: S,
}

impl<S> TracedStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Store> Store for TracedStore<S> {
    type Cursor<'a> = TracedCursor<S::Cursor<'a>>
    where
        Self: 'a;

    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let result = self.inner.get(key);
        match &result {
            Ok(Some(value)) => debug!(key, len = value.len(), "store get"),
            Ok(None) => debug!(key, "store get: absent"),
            Err(err) => debug!(key, error = %err, "store get failed"),
        }
        result
    }

    fn put(&mut self, key: &str, value: &[u8]) -> StoreResult<()> {
        let result = self.inner.put(key, value);
        match &result {
            Ok(()) => debug!(key, len = value.len(), "store put"),
            Err(err) => debug!(key, error = %err, "store put failed"),
        }
        result
    }

    fn scan(&self, start: &str, end: &str) -> StoreResult<Self::Cursor<'_>> {
        let result = self.inner.scan(start, end);
        match &result {
            Ok(_) => debug!(start, end, "store scan"),
            Err(err) => debug!(start, end, error = %err, "store scan failed"),
        }
        result.map(|inner| TracedCursor {
            inner,
            start: start.to_owned(),
            end: end.to_owned(),
        })
    }
}

/// Cursor wrapper that logs how much each read returned.
#[derive(Debug)]
pub struct TracedCursor<C> {
    inner: C,
    start: String,
    end: String,
}

impl<C: Cursor> Cursor for TracedCursor<C> {
    fn read(&mut self, n: usize) -> StoreResult<Vec<Vec<u8>>> {
        let result = self.inner.read(n);
        match &result {
            Ok(values) => debug!(
                start = %self.start,
                end = %self.end,
                requested = n,
                returned = values.len(),
                "cursor read"
            ),
            Err(err) => debug!(
                start = %self.start,
                end = %self.end,
                error = %err,
                "cursor read failed"
            ),
        }
        result
    }

    fn is_at_end(&self) -> bool {
        self.inner.is_at_end()
    }
}
