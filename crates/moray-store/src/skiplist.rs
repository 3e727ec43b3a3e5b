//! Probabilistic ordered index — the skip list backing the store.
//!
//! A skip list keeps its elements sorted with the expected performance
//! of a balanced tree while staying simple to reason about: every
//! element sits in a sorted singly-linked list at level 0, and each
//! higher level threads a random subset of the nodes below it, so a
//! search can skip ahead before dropping down.
//!
//! Nodes live in an arena and are addressed by stable indices rather
//! than references, which keeps the multi-level splicing free of
//! aliasing problems. Slots vacated by deletes are reused.
//!
//! Structural invariants:
//! - `heads[i]` is occupied only if `heads[i - 1]` is occupied
//! - the key sequence along level `i` is strictly increasing and is a
//!   subsequence of level `i - 1`'s sequence
//! - live links never reference a vacant arena slot

use std::borrow::Borrow;
use std::fmt;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::error::{StoreError, StoreResult};

/// Maximum number of levels a node may participate in.
pub const MAX_HEIGHT: usize = 32;

/// A single element of the index.
///
/// Owns its key, its value, and one forward link per level it
/// participates in (the node's height). Link `i` holds the arena index
/// of the next node at level `i`.
#[derive(Debug)]
pub struct Node<K, V> {
    key: K,
    value: V,
    next: Vec<Option<usize>>,
}

impl<K, V> Node<K, V> {
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    /// Number of levels this node participates in.
    pub fn height(&self) -> usize {
        self.next.len()
    }

    /// Arena index of the level-0 successor.
    pub(crate) fn successor(&self) -> Option<usize> {
        self.next[0]
    }
}

/// Sorted mapping from key to value with expected O(log n) operations.
///
/// Writers require `&mut self` and readers `&self`, so interleaving a
/// scan with a mutation is rejected at compile time; sharing across
/// threads is the caller's responsibility.
pub struct SkipList<K, V> {
    arena: Vec<Option<Node<K, V>>>,
    free: Vec<usize>,
    heads: [Option<usize>; MAX_HEIGHT],
    len: u32,
    rng: Box<dyn RngCore + Send>,
}

impl<K: Ord, V> SkipList<K, V> {
    pub fn new() -> Self {
        Self::with_rng(Box::new(StdRng::from_entropy()))
    }

    /// Build an index with an explicit randomness source, so that node
    /// heights are reproducible in tests.
    pub fn with_rng(rng: Box<dyn RngCore + Send>) -> Self {
        Self {
            arena: Vec::new(),
            free: Vec::new(),
            heads: [None; MAX_HEIGHT],
            len: 0,
            rng,
        }
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Arena index of the first node at level 0, if any.
    pub(crate) fn head(&self) -> Option<usize> {
        self.heads[0]
    }

    pub(crate) fn node(&self, id: usize) -> &Node<K, V> {
        // Delete unlinks a node from every level before vacating its
        // slot, so a live link always points at an occupied slot.
        self.arena[id].as_ref().expect("link to vacant arena slot")
    }

    fn node_mut(&mut self, id: usize) -> &mut Node<K, V> {
        self.arena[id].as_mut().expect("link to vacant arena slot")
    }

    /// Insert a key-value pair, overwriting the value in place if the
    /// key already exists. Returns true iff the key was new.
    pub fn put(&mut self, key: K, value: V) -> StoreResult<bool> {
        if self.len == u32::MAX {
            return Err(StoreError::IndexFull { size: self.len });
        }

        let (found, prevs) = self.search(&key);
        if let Some(id) = found {
            self.node_mut(id).value = value;
            return Ok(false);
        }

        let height = self.random_height();
        let id = self.alloc(Node {
            key,
            value,
            next: vec![None; height],
        });

        for level in 0..height {
            match self.heads[level] {
                // level is empty, the node starts it
                None => self.heads[level] = Some(id),
                Some(head) => match prevs[level] {
                    // nothing precedes the node at this level, it
                    // becomes the new head
                    None => {
                        self.node_mut(id).next[level] = Some(head);
                        self.heads[level] = Some(id);
                    }
                    Some(prev) => {
                        let succ = self.node(prev).next[level];
                        self.node_mut(id).next[level] = succ;
                        self.node_mut(prev).next[level] = Some(id);
                    }
                },
            }
        }

        self.len += 1;
        Ok(true)
    }

    /// Find the node for a key, or None if the key is absent.
    pub fn get<Q>(&self, key: &Q) -> Option<&Node<K, V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let (found, _) = self.search(key);
        found.map(|id| self.node(id))
    }

    /// Remove a key, returning the owned entry. Absent keys are a
    /// no-op, so deleting twice in a row is safe.
    pub fn delete<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let (found, prevs) = self.search(key);
        let id = found?;

        let height = self.node(id).height();
        for level in 0..height {
            let succ = self.node(id).next[level];
            match prevs[level] {
                None => self.heads[level] = succ,
                Some(prev) => self.node_mut(prev).next[level] = succ,
            }
        }

        self.len -= 1;
        self.free.push(id);
        let node = self.arena[id].take().expect("deleting vacant arena slot");
        Some((node.key, node.value))
    }

    /// Walk the index for a key, recording at every level the last
    /// node whose key precedes it. Returns the matching node (if any)
    /// alongside the predecessor array, which Put, Delete and the
    /// store's range scan all splice with.
    pub(crate) fn search<Q>(&self, key: &Q) -> (Option<usize>, [Option<usize>; MAX_HEIGHT])
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut prevs = [None; MAX_HEIGHT];

        // The level-0 head is the one node with no predecessor at any
        // level it participates in, so an exact match there short
        // circuits with an empty predecessor array.
        if let Some(head) = self.heads[0] {
            if self.node(head).key.borrow() == key {
                return (Some(head), prevs);
            }
        }

        // Start at the highest level whose head precedes the target.
        let mut level = MAX_HEIGHT;
        let mut current = None;
        while level > 0 {
            level -= 1;
            if let Some(head) = self.heads[level] {
                if self.node(head).key.borrow() < key {
                    current = Some(head);
                    break;
                }
            }
        }

        // Advance along the current level until the next node would
        // overshoot, then drop a level and resume from the same node.
        // Reusing the partial walk across levels is what makes the
        // search logarithmic.
        while let Some(id) = current {
            let next = self.node(id).next[level];
            let overshoot = match next {
                None => true,
                Some(n) => self.node(n).key.borrow() >= key,
            };
            if !overshoot {
                current = next;
                continue;
            }

            prevs[level] = Some(id);
            if level > 0 {
                level -= 1;
                continue;
            }

            // Bottom level: only report a match here, once every
            // predecessor above has been recorded.
            if let Some(n) = next {
                if self.node(n).key.borrow() == key {
                    return (Some(n), prevs);
                }
            }
            break;
        }

        (None, prevs)
    }

    /// Iterate the level-0 list in key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            list: self,
            node: self.heads[0],
        }
    }

    /// Keys threaded at the given level, in order. None if the level
    /// is out of range.
    pub fn debug_row(&self, level: usize) -> Option<Vec<K>>
    where
        K: Clone,
    {
        if level >= MAX_HEIGHT {
            return None;
        }
        let mut keys = Vec::new();
        let mut current = self.heads[level];
        while let Some(id) = current {
            let node = self.node(id);
            keys.push(node.key.clone());
            current = node.next[level];
        }
        Some(keys)
    }

    fn alloc(&mut self, node: Node<K, V>) -> usize {
        match self.free.pop() {
            Some(id) => {
                self.arena[id] = Some(node);
                id
            }
            None => {
                self.arena.push(Some(node));
                self.arena.len() - 1
            }
        }
    }

    /// Repeated fair-coin draws: start at 1, grow while the coin comes
    /// up heads, cap at MAX_HEIGHT. Expected height is 2, which keeps
    /// expected work per operation logarithmic.
    fn random_height(&mut self) -> usize {
        let mut height = 1;
        while height < MAX_HEIGHT && self.rng.next_u32() & 1 == 1 {
            height += 1;
        }
        height
    }
}

impl<K: Ord, V> Default for SkipList<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V> fmt::Debug for SkipList<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkipList")
            .field("len", &self.len)
            .field("arena_slots", &self.arena.len())
            .finish()
    }
}

/// Level-0 iterator over (key, value) pairs in key order.
pub struct Iter<'a, K, V> {
    list: &'a SkipList<K, V>,
    node: Option<usize>,
}

impl<'a, K: Ord, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.node?;
        let node = self.list.node(id);
        self.node = node.next[0];
        Some((&node.key, &node.value))
    }
}
