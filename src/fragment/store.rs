//! Shared fragment store
//!
//! A sparse table from position to fragment bytes, filled concurrently
//! by the walker threads and drained in order by the reassembler.
//!
//! Every mutation (growth and slot write) happens under one lock, so a
//! reader never sees a half-grown table and a slot always holds one
//! complete buffer. Freezing is enforced by ownership: draining consumes
//! the store, so no insert can race with the drain.
//!
//! Positions above [`POSITION_LIMIT`] are refused, so the slot count
//! always fits in a `usize` and one stray name cannot size the table.

use super::name::POSITION_LIMIT;
use crate::error::StoreError;
use parking_lot::Mutex;

/// Position-indexed fragment table
#[derive(Debug, Default)]
pub struct FragmentStore {
    slots: Mutex<Vec<Option<Vec<u8>>>>,
}

impl FragmentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` at `position`, growing the table if needed.
    ///
    /// Returns the previous buffer if the slot was already occupied
    /// (last writer wins). A refused insert leaves the store unchanged.
    pub fn insert(&self, position: usize, data: Vec<u8>) -> Result<Option<Vec<u8>>, StoreError> {
        if position > POSITION_LIMIT {
            return Err(StoreError::PositionTooLarge {
                position,
                limit: POSITION_LIMIT,
            });
        }

        let mut slots = self.slots.lock();
        if position >= slots.len() {
            let slot_count = position + 1;
            let current_len = slots.len();
            slots
                .try_reserve(slot_count - current_len)
                .map_err(|e| StoreError::GrowFailed {
                    position,
                    reason: e.to_string(),
                })?;
            slots.resize_with(slot_count, || None);
        }
        Ok(slots[position].replace(data))
    }

    /// Slot count: highest position seen plus one
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// Number of occupied slots
    pub fn fragment_count(&self) -> usize {
        self.slots.lock().iter().filter(|s| s.is_some()).count()
    }

    /// Sum of all stored fragment sizes
    pub fn total_bytes(&self) -> u64 {
        self.slots
            .lock()
            .iter()
            .flatten()
            .map(|d| d.len() as u64)
            .sum()
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, position: usize) -> bool {
        matches!(self.slots.lock().get(position), Some(Some(_)))
    }

    #[cfg(test)]
    pub(crate) fn get(&self, position: usize) -> Option<Vec<u8>> {
        self.slots.lock().get(position).cloned().flatten()
    }

    /// Positions in `[0, len)` that were never filled, ascending
    pub fn missing_positions(&self) -> Vec<usize> {
        self.slots
            .lock()
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    /// Consume the store and yield every slot in ascending position order.
    ///
    /// Each buffer is owned by the caller once yielded and freed when the
    /// caller drops it.
    pub fn drain_ordered(self) -> OrderedDrain {
        OrderedDrain {
            inner: self.slots.into_inner().into_iter().enumerate(),
        }
    }
}

/// Lazy in-order iterator over a frozen store
#[derive(Debug)]
pub struct OrderedDrain {
    inner: std::iter::Enumerate<std::vec::IntoIter<Option<Vec<u8>>>>,
}

impl Iterator for OrderedDrain {
    type Item = (usize, Option<Vec<u8>>);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for OrderedDrain {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_insert_grows_to_position() {
        let store = FragmentStore::new();
        assert!(store.is_empty());

        store.insert(4, b"four".to_vec()).unwrap();
        assert_eq!(store.len(), 5);
        assert_eq!(store.fragment_count(), 1);
        assert_eq!(store.missing_positions(), vec![0, 1, 2, 3]);

        // Never shrinks
        store.insert(1, b"one".to_vec()).unwrap();
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn test_absent_differs_from_empty() {
        let store = FragmentStore::new();
        store.insert(1, Vec::new()).unwrap();

        assert!(!store.contains(0));
        assert!(store.contains(1));
        assert_eq!(store.get(0), None);
        assert_eq!(store.get(1), Some(Vec::new()));
        assert_eq!(store.missing_positions(), vec![0]);
    }

    #[test]
    fn test_last_writer_wins() {
        let store = FragmentStore::new();
        assert_eq!(store.insert(0, b"first".to_vec()), Ok(None));
        assert_eq!(store.insert(0, b"second".to_vec()), Ok(Some(b"first".to_vec())));
        assert_eq!(store.get(0), Some(b"second".to_vec()));
        assert_eq!(store.fragment_count(), 1);
    }

    #[test]
    fn test_position_beyond_limit_is_refused() {
        let store = FragmentStore::new();
        store.insert(2, b"kept".to_vec()).unwrap();

        assert_eq!(
            store.insert(usize::MAX, b"x".to_vec()),
            Err(StoreError::PositionTooLarge {
                position: usize::MAX,
                limit: POSITION_LIMIT,
            })
        );
        assert!(matches!(
            store.insert(POSITION_LIMIT + 1, b"x".to_vec()),
            Err(StoreError::PositionTooLarge { .. })
        ));

        // Earlier fragments survive a refused insert
        assert_eq!(store.len(), 3);
        assert_eq!(store.get(2), Some(b"kept".to_vec()));
    }

    #[test]
    fn test_drain_is_ordered() {
        let store = FragmentStore::new();
        store.insert(2, b"c".to_vec()).unwrap();
        store.insert(0, b"a".to_vec()).unwrap();
        store.insert(1, b"b".to_vec()).unwrap();
        assert_eq!(store.total_bytes(), 3);

        let drained: Vec<_> = store.drain_ordered().collect();
        assert_eq!(
            drained,
            vec![
                (0, Some(b"a".to_vec())),
                (1, Some(b"b".to_vec())),
                (2, Some(b"c".to_vec())),
            ]
        );
    }

    #[test]
    fn test_drain_reports_gaps() {
        let store = FragmentStore::new();
        store.insert(0, b"a".to_vec()).unwrap();
        store.insert(3, b"d".to_vec()).unwrap();

        let drain = store.drain_ordered();
        assert_eq!(drain.len(), 4);
        let gaps: Vec<usize> = drain.filter(|(_, d)| d.is_none()).map(|(p, _)| p).collect();
        assert_eq!(gaps, vec![1, 2]);
    }

    #[test]
    fn test_concurrent_inserts_distinct_positions() {
        let store = Arc::new(FragmentStore::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..250 {
                        let pos = i * 8 + t;
                        store.insert(pos, pos.to_le_bytes().to_vec()).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let store = Arc::try_unwrap(store).unwrap();
        assert_eq!(store.len(), 2000);
        assert!(store.missing_positions().is_empty());
        for (pos, data) in store.drain_ordered() {
            assert_eq!(data, Some(pos.to_le_bytes().to_vec()));
        }
    }

    #[test]
    fn test_concurrent_same_position_one_payload_wins() {
        for _ in 0..50 {
            let store = Arc::new(FragmentStore::new());
            let a = vec![0xAA; 64 * 1024];
            let b = vec![0xBB; 64 * 1024];

            let ha = {
                let store = Arc::clone(&store);
                let a = a.clone();
                thread::spawn(move || {
                    store.insert(7, a).unwrap();
                })
            };
            let hb = {
                let store = Arc::clone(&store);
                let b = b.clone();
                thread::spawn(move || {
                    store.insert(7, b).unwrap();
                })
            };
            ha.join().unwrap();
            hb.join().unwrap();

            let held = store.get(7).unwrap();
            assert!(held == a || held == b, "slot holds a mixed payload");
        }
    }
}
