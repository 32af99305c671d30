//! Recency Ledger Module
//!
//! Orders cache entries from most recently used to least recently used.
//!
//! Entries live in an arena of slots linked by explicit prev/next indices, so
//! every ledger operation is O(1) and the structure holds no reference cycles.
//! Vacated slots are recycled through a free list.

use crate::cache::Entry;

// == Node ==
/// An arena slot's contents: the entry plus its neighbours.
///
/// `prev` points towards the most recently used end, `next` towards the
/// least recently used end.
#[derive(Debug)]
struct Node<K, V> {
    entry: Entry<K, V>,
    prev: Option<usize>,
    next: Option<usize>,
}

// == Recency Ledger ==
/// Doubly linked recency list over an arena of entries.
///
/// - Front (head) = Most recently used
/// - Back (tail) = Least recently used
#[derive(Debug)]
pub(crate) struct RecencyLedger<K, V> {
    /// Arena of slots, `None` for vacant ones
    slots: Vec<Option<Node<K, V>>>,
    /// Vacant slot indices available for reuse
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<K, V> RecencyLedger<K, V> {
    // == Constructor ==
    /// Creates a new empty ledger.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    // == Push Front ==
    /// Inserts an entry at the most recently used end.
    ///
    /// Returns the slot the entry now occupies.
    pub fn push_front(&mut self, entry: Entry<K, V>) -> usize {
        let node = Node {
            entry,
            prev: None,
            next: None,
        };

        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                slot
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };

        self.link_front(slot);
        self.len += 1;
        slot
    }

    // == Move To Front ==
    /// Marks the entry in `slot` as most recently used.
    ///
    /// Does nothing if the slot is vacant or already at the front.
    pub fn move_to_front(&mut self, slot: usize) {
        if self.head == Some(slot) || self.node(slot).is_none() {
            return;
        }
        self.unlink(slot);
        self.link_front(slot);
    }

    // == Remove ==
    /// Removes the entry in `slot` from any position in the ledger.
    ///
    /// Returns None if the slot is vacant.
    pub fn remove(&mut self, slot: usize) -> Option<Entry<K, V>> {
        self.node(slot)?;
        self.unlink(slot);

        let node = self.slots[slot].take()?;
        self.free.push(slot);
        self.len -= 1;
        Some(node.entry)
    }

    // == Accessors ==
    /// Returns the entry stored in `slot`.
    pub fn get(&self, slot: usize) -> Option<&Entry<K, V>> {
        self.node(slot).map(|node| &node.entry)
    }

    /// Returns the slot of the least recently used entry.
    pub fn back(&self) -> Option<usize> {
        self.tail
    }

    /// Returns the slot one step closer to the most recently used end.
    ///
    /// Used to walk the ledger from the back while removing entries.
    pub fn newer(&self, slot: usize) -> Option<usize> {
        self.node(slot).and_then(|node| node.prev)
    }

    // == Length ==
    /// Returns the number of entries in the ledger.
    pub fn len(&self) -> usize {
        self.len
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // == Clear ==
    /// Drops every entry and releases the arena.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    // == Iteration ==
    /// Iterates entries from most recently used to least recently used.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: &self.slots,
            current: self.head,
            remaining: self.len,
        }
    }

    // --- Internal linked-list operations ---

    fn node(&self, slot: usize) -> Option<&Node<K, V>> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, slot: usize) -> Option<&mut Node<K, V>> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    /// Detaches `slot` from its neighbours without vacating it.
    fn unlink(&mut self, slot: usize) {
        let (prev, next) = match self.node(slot) {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        match prev.and_then(|p| self.node_mut(p)) {
            Some(prev_node) => prev_node.next = next,
            None => self.head = next,
        }

        match next.and_then(|n| self.node_mut(n)) {
            Some(next_node) => next_node.prev = prev,
            None => self.tail = prev,
        }

        if let Some(node) = self.node_mut(slot) {
            node.prev = None;
            node.next = None;
        }
    }

    /// Links a detached `slot` in at the head.
    fn link_front(&mut self, slot: usize) {
        let old_head = self.head;

        if let Some(node) = self.node_mut(slot) {
            node.prev = None;
            node.next = old_head;
        }

        if let Some(head_node) = old_head.and_then(|h| self.node_mut(h)) {
            head_node.prev = Some(slot);
        }

        self.head = Some(slot);
        if self.tail.is_none() {
            self.tail = Some(slot);
        }
    }
}

impl<K, V> Default for RecencyLedger<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

// == Iterator ==
/// Iterator over ledger entries from most to least recently used.
pub(crate) struct Iter<'a, K, V> {
    slots: &'a [Option<Node<K, V>>],
    current: Option<usize>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = &'a Entry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.slots.get(self.current?)?.as_ref()?;
        self.current = node.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some(&node.entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &'static str) -> Entry<&'static str, ()> {
        Entry::new(key, (), 1, None)
    }

    fn keys(ledger: &RecencyLedger<&'static str, ()>) -> Vec<&'static str> {
        ledger.iter().map(|e| e.key).collect()
    }

    fn back_key(ledger: &RecencyLedger<&'static str, ()>) -> Option<&'static str> {
        ledger.back().and_then(|slot| ledger.get(slot)).map(|e| e.key)
    }

    #[test]
    fn test_ledger_new() {
        let ledger: RecencyLedger<&str, ()> = RecencyLedger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.len(), 0);
        assert_eq!(ledger.back(), None);
    }

    #[test]
    fn test_ledger_push_front_orders_newest_first() {
        let mut ledger = RecencyLedger::new();

        ledger.push_front(entry("key1"));
        ledger.push_front(entry("key2"));
        ledger.push_front(entry("key3"));

        assert_eq!(ledger.len(), 3);
        assert_eq!(keys(&ledger), vec!["key3", "key2", "key1"]);
        // key1 is oldest (added first)
        assert_eq!(back_key(&ledger), Some("key1"));
    }

    #[test]
    fn test_ledger_move_to_front() {
        let mut ledger = RecencyLedger::new();

        let a = ledger.push_front(entry("a"));
        ledger.push_front(entry("b"));
        ledger.push_front(entry("c"));

        ledger.move_to_front(a);

        assert_eq!(ledger.len(), 3);
        assert_eq!(keys(&ledger), vec!["a", "c", "b"]);
        assert_eq!(back_key(&ledger), Some("b"));
    }

    #[test]
    fn test_ledger_move_head_to_front_is_noop() {
        let mut ledger = RecencyLedger::new();

        ledger.push_front(entry("a"));
        let b = ledger.push_front(entry("b"));

        ledger.move_to_front(b);
        assert_eq!(keys(&ledger), vec!["b", "a"]);
    }

    #[test]
    fn test_ledger_remove_middle() {
        let mut ledger = RecencyLedger::new();

        ledger.push_front(entry("key1"));
        let key2 = ledger.push_front(entry("key2"));
        ledger.push_front(entry("key3"));

        let removed = ledger.remove(key2).unwrap();

        assert_eq!(removed.key, "key2");
        assert_eq!(ledger.len(), 2);
        assert_eq!(keys(&ledger), vec!["key3", "key1"]);
    }

    #[test]
    fn test_ledger_remove_back_until_empty() {
        let mut ledger = RecencyLedger::new();

        ledger.push_front(entry("key1"));
        ledger.push_front(entry("key2"));

        let oldest = ledger.back().unwrap();
        assert_eq!(ledger.remove(oldest).unwrap().key, "key1");
        let oldest = ledger.back().unwrap();
        assert_eq!(ledger.remove(oldest).unwrap().key, "key2");

        assert!(ledger.is_empty());
        assert_eq!(ledger.back(), None);
    }

    #[test]
    fn test_ledger_remove_vacant_slot() {
        let mut ledger = RecencyLedger::new();

        let slot = ledger.push_front(entry("key1"));
        assert!(ledger.remove(slot).is_some());

        // Removing twice or removing an unknown slot must not disturb anything
        assert!(ledger.remove(slot).is_none());
        assert!(ledger.remove(42).is_none());
        assert!(ledger.is_empty());

        ledger.push_front(entry("key2"));
        ledger.move_to_front(slot + 7);
        assert_eq!(keys(&ledger), vec!["key2"]);
    }

    #[test]
    fn test_ledger_reuses_vacated_slots() {
        let mut ledger = RecencyLedger::new();

        let first = ledger.push_front(entry("a"));
        ledger.push_front(entry("b"));
        ledger.remove(first);

        let reused = ledger.push_front(entry("c"));
        assert_eq!(reused, first);
        assert_eq!(keys(&ledger), vec!["c", "b"]);
    }

    #[test]
    fn test_ledger_walk_from_back() {
        let mut ledger = RecencyLedger::new();

        ledger.push_front(entry("a"));
        ledger.push_front(entry("b"));
        ledger.push_front(entry("c"));

        let mut walked = Vec::new();
        let mut cursor = ledger.back();
        while let Some(slot) = cursor {
            walked.push(ledger.get(slot).unwrap().key);
            cursor = ledger.newer(slot);
        }

        assert_eq!(walked, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_ledger_order_after_multiple_touches() {
        let mut ledger = RecencyLedger::new();

        let a = ledger.push_front(entry("a"));
        let b = ledger.push_front(entry("b"));
        let c = ledger.push_front(entry("c"));

        ledger.move_to_front(a);
        ledger.move_to_front(c);
        ledger.move_to_front(b);

        // front=[b, c, a]=back
        assert_eq!(keys(&ledger), vec!["b", "c", "a"]);
        assert_eq!(ledger.iter().size_hint(), (3, Some(3)));
    }

    #[test]
    fn test_ledger_clear() {
        let mut ledger = RecencyLedger::new();

        ledger.push_front(entry("a"));
        ledger.push_front(entry("b"));
        ledger.clear();

        assert!(ledger.is_empty());
        assert_eq!(ledger.iter().count(), 0);
        ledger.push_front(entry("c"));
        assert_eq!(keys(&ledger), vec!["c"]);
    }
}
