//! Fixed-capacity map with least-recently-used eviction.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// A slot in the recency list. Links are indices into the slot vector.
struct Node<T> {
  key: String,
  value: T,
  prev: Option<usize>,
  next: Option<usize>,
}

/// Recency-ordered state behind the cache's mutex.
///
/// A doubly-linked list threaded through a slot vector, plus a key index.
/// `head` is the most recently used entry, `tail` the least. When an insert
/// exceeds capacity, the tail's slot is overwritten in place by the incoming
/// entry, so the vector never grows past `capacity`.
struct Lru<T> {
  capacity: usize,
  slots: Vec<Node<T>>,
  index: HashMap<String, usize>,
  head: Option<usize>,
  tail: Option<usize>,
}

impl<T: Clone> Lru<T> {
  fn new(capacity: usize) -> Self {
    Lru {
      capacity,
      slots: Vec::with_capacity(capacity),
      index: HashMap::with_capacity(capacity),
      head: None,
      tail: None,
    }
  }

  /// Unlink a slot from the recency list.
  fn detach(&mut self, idx: usize) {
    let (prev, next) = (self.slots[idx].prev, self.slots[idx].next);
    match prev {
      Some(p) => self.slots[p].next = next,
      None => self.head = next,
    }
    match next {
      Some(n) => self.slots[n].prev = prev,
      None => self.tail = prev,
    }
    self.slots[idx].prev = None;
    self.slots[idx].next = None;
  }

  /// Link a slot in as the most recently used entry.
  fn push_front(&mut self, idx: usize) {
    let old_head = self.head;
    self.slots[idx].prev = None;
    self.slots[idx].next = old_head;
    if let Some(h) = old_head {
      self.slots[h].prev = Some(idx);
    }
    self.head = Some(idx);
    if self.tail.is_none() {
      self.tail = Some(idx);
    }
  }

  fn get(&mut self, key: &str) -> Option<T> {
    let idx = *self.index.get(key)?;
    self.detach(idx);
    self.push_front(idx);
    Some(self.slots[idx].value.clone())
  }

  fn put(&mut self, key: String, value: T) {
    if self.capacity == 0 {
      return;
    }

    if let Some(&idx) = self.index.get(&key) {
      self.slots[idx].value = value;
      self.detach(idx);
      self.push_front(idx);
      return;
    }

    let idx = if self.slots.len() < self.capacity {
      self.slots.push(Node {
        key: key.clone(),
        value,
        prev: None,
        next: None,
      });
      self.slots.len() - 1
    } else {
      // At capacity: evict the least recently used entry and reuse its slot
      let Some(tail) = self.tail else { return };
      self.detach(tail);
      self.index.remove(&self.slots[tail].key);
      self.slots[tail] = Node {
        key: key.clone(),
        value,
        prev: None,
        next: None,
      };
      tail
    };

    self.index.insert(key, idx);
    self.push_front(idx);
  }
}

/// Fixed-capacity, key-addressable, least-recently-used cache.
///
/// `get` and `put` are synchronous, non-blocking, and safe to call from any
/// task; the recency state is guarded by an internal mutex. Eviction is
/// silent: the cache holds no unique ownership of persisted state, so a
/// dropped entry is simply reloaded from the durable store on the next miss.
pub struct BoundedCache<T> {
  inner: Mutex<Lru<T>>,
}

impl<T: Clone> BoundedCache<T> {
  /// Create a cache holding at most `capacity` entries.
  pub fn new(capacity: usize) -> Self {
    BoundedCache {
      inner: Mutex::new(Lru::new(capacity)),
    }
  }

  /// Look up an entry, refreshing its recency on a hit.
  pub fn get(&self, key: &str) -> Option<T> {
    self.lock().get(key)
  }

  /// Insert or replace an entry, refreshing its recency. Inserting beyond
  /// capacity evicts the least recently used entry.
  pub fn put(&self, key: impl Into<String>, value: T) {
    self.lock().put(key.into(), value);
  }

  /// Whether a key is currently cached, without touching its recency.
  pub fn contains(&self, key: &str) -> bool {
    self.lock().index.contains_key(key)
  }

  pub fn len(&self) -> usize {
    self.lock().index.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn capacity(&self) -> usize {
    self.lock().capacity
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, Lru<T>> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }
}
