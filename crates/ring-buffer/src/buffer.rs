//! Sample Ring Implementation

use crate::{RingError, SampleRecord};
use metrics::counter;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Default number of slots (10 samples = 10 s of history at 1 Hz)
pub const DEFAULT_CAPACITY: usize = 10;

/// Slot storage and production counter guarded by the store lock
struct RingState {
    /// Pre-allocated slots, never resized
    slots: Box<[SampleRecord]>,
    /// Samples produced so far; also the sequence number of the next sample
    produced: u64,
}

impl RingState {
    fn capacity(&self) -> u64 {
        self.slots.len() as u64
    }

    /// Sequence number of the oldest sample still held by the ring
    fn oldest_seq(&self) -> u64 {
        self.produced.saturating_sub(self.capacity())
    }

    fn slot_of(&self, seq: u64) -> usize {
        (seq % self.capacity()) as usize
    }

    fn active(&self) -> Option<SampleRecord> {
        let seq = self.produced.checked_sub(1)?;
        Some(self.slots[self.slot_of(seq)])
    }
}

/// Session-local progress through an oldest-to-newest walk of the ring.
///
/// Obtained from [`RingStore::begin_traversal`]. The token names the sequence
/// number of the next sample to hand out, so several walks never interfere
/// with each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalToken {
    next_seq: u64,
    delivered: u64,
    skipped: u64,
}

impl TraversalToken {
    /// Samples returned through this token so far
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Samples overwritten by the producer before this walk reached them
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Whether the producer overtook this walk at least once
    pub fn is_stale(&self) -> bool {
        self.skipped > 0
    }
}

/// Fixed-capacity ring of samples with overwrite-when-full semantics.
///
/// Every operation holds the single store lock for its whole critical section
/// and copies samples in or out, so callers never observe a partially
/// written sample.
pub struct RingStore {
    state: Mutex<RingState>,
    capacity: usize,
}

impl RingStore {
    /// Create a ring with `capacity` slots
    pub fn new(capacity: usize) -> Result<Self, RingError> {
        if capacity == 0 {
            return Err(RingError::ConfigurationError(capacity));
        }
        Ok(Self::allocate(capacity))
    }

    /// Create a ring with [`DEFAULT_CAPACITY`] slots
    pub fn with_default_capacity() -> Self {
        Self::allocate(DEFAULT_CAPACITY)
    }

    fn allocate(capacity: usize) -> Self {
        let slots: Vec<SampleRecord> = vec![SampleRecord::default(); capacity];
        info!("Creating sample ring with {} slots", capacity);
        Self {
            state: Mutex::new(RingState {
                slots: slots.into_boxed_slice(),
                produced: 0,
            }),
            capacity,
        }
    }

    // Critical sections only copy plain data, so a panic elsewhere cannot
    // leave the state half-updated and the poison flag can be ignored.
    fn lock(&self) -> MutexGuard<'_, RingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a sample, overwriting the oldest one once every slot is in use
    pub fn produce(&self, record: SampleRecord) {
        let (slot, produced) = {
            let mut state = self.lock();
            let slot = state.slot_of(state.produced);
            state.slots[slot] = record;
            state.produced += 1;
            (slot, state.produced)
        };

        counter!("ring_store_produced_total").increment(1);
        debug!(
            "Stored sample {} (ts {} ms) in slot {}",
            produced, record.timestamp_ms, slot
        );
    }

    /// Copy of the most recently produced sample
    pub fn peek_active(&self) -> Option<SampleRecord> {
        self.lock().active()
    }

    /// Start a walk at the oldest sample currently held
    pub fn begin_traversal(&self) -> TraversalToken {
        let state = self.lock();
        TraversalToken {
            next_seq: state.oldest_seq(),
            delivered: 0,
            skipped: 0,
        }
    }

    /// Next sample of the walk, or `None` once the active sample was returned.
    ///
    /// If the producer overwrote the sample the token was about to return,
    /// the walk resumes at the oldest surviving sample and the token counts
    /// the lost samples. Samples are never returned twice.
    pub fn advance_traversal(&self, token: &mut TraversalToken) -> Option<SampleRecord> {
        let (record, lost) = {
            let state = self.lock();
            if token.next_seq >= state.produced {
                return None;
            }

            let oldest = state.oldest_seq();
            let lost = oldest.saturating_sub(token.next_seq);
            token.next_seq = token.next_seq.max(oldest);

            let record = state.slots[state.slot_of(token.next_seq)];
            token.next_seq += 1;
            (record, lost)
        };

        token.delivered += 1;
        if lost > 0 {
            token.skipped += lost;
            counter!("ring_store_traversal_stale_total").increment(1);
            warn!("Traversal overtaken by producer, {} samples skipped", lost);
        }
        Some(record)
    }

    /// Whether the walk has already returned the active sample.
    ///
    /// Always true for an empty ring.
    pub fn is_traversal_complete(&self, token: &TraversalToken) -> bool {
        token.next_seq >= self.lock().produced
    }

    /// All surviving samples, oldest first
    pub fn snapshot(&self) -> Vec<SampleRecord> {
        let state = self.lock();
        (state.oldest_seq()..state.produced)
            .map(|seq| state.slots[state.slot_of(seq)])
            .collect()
    }

    /// Number of samples currently held (at most the capacity)
    pub fn len(&self) -> usize {
        let state = self.lock();
        (state.produced - state.oldest_seq()) as usize
    }

    /// Check if nothing was produced yet
    pub fn is_empty(&self) -> bool {
        self.lock().produced == 0
    }

    /// Get the ring capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total samples produced since construction
    pub fn total_produced(&self) -> u64 {
        self.lock().produced
    }
}

impl Default for RingStore {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample(ts: u64) -> SampleRecord {
        SampleRecord {
            timestamp_ms: ts,
            accel_x: ts as i32,
            gyro_z: -(ts as i32),
            ..Default::default()
        }
    }

    fn drain(store: &RingStore) -> Vec<u64> {
        let mut token = store.begin_traversal();
        let mut out = Vec::new();
        while let Some(record) = store.advance_traversal(&mut token) {
            out.push(record.timestamp_ms);
        }
        out
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(
            RingStore::new(0).err(),
            Some(RingError::ConfigurationError(0))
        );
    }

    #[test]
    fn test_empty_store() {
        let store = RingStore::new(5).unwrap();
        assert!(store.peek_active().is_none());
        assert!(store.is_empty());

        let mut token = store.begin_traversal();
        assert!(store.is_traversal_complete(&token));
        assert!(store.advance_traversal(&mut token).is_none());
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_overwrite_oldest() {
        let store = RingStore::new(3).unwrap();
        for ts in 1..=4 {
            store.produce(sample(ts));
        }

        assert_eq!(store.peek_active().unwrap().timestamp_ms, 4);
        assert_eq!(store.len(), 3);
        assert_eq!(drain(&store), vec![2, 3, 4]);
        assert_eq!(store.total_produced(), 4);
    }

    #[test]
    fn test_partial_fill() {
        let store = RingStore::new(10).unwrap();
        store.produce(sample(1));
        store.produce(sample(2));

        assert_eq!(store.len(), 2);
        assert_eq!(drain(&store), vec![1, 2]);
    }

    #[test]
    fn test_completion_on_last_sample() {
        let store = RingStore::new(4).unwrap();
        for ts in 1..=4 {
            store.produce(sample(ts));
        }

        let mut token = store.begin_traversal();
        for expected in 1..=4 {
            assert!(!store.is_traversal_complete(&token));
            let record = store.advance_traversal(&mut token).unwrap();
            assert_eq!(record.timestamp_ms, expected);
        }
        assert!(store.is_traversal_complete(&token));
        assert!(store.advance_traversal(&mut token).is_none());
        assert_eq!(token.delivered(), 4);
    }

    #[test]
    fn test_traversal_follows_new_samples() {
        let store = RingStore::new(4).unwrap();
        store.produce(sample(1));

        let mut token = store.begin_traversal();
        assert_eq!(store.advance_traversal(&mut token).unwrap().timestamp_ms, 1);
        assert!(store.is_traversal_complete(&token));

        store.produce(sample(2));
        assert!(!store.is_traversal_complete(&token));
        assert_eq!(store.advance_traversal(&mut token).unwrap().timestamp_ms, 2);
    }

    #[test]
    fn test_stale_traversal_skips_overwritten() {
        let store = RingStore::new(3).unwrap();
        for ts in 1..=3 {
            store.produce(sample(ts));
        }

        let mut token = store.begin_traversal();
        assert_eq!(store.advance_traversal(&mut token).unwrap().timestamp_ms, 1);

        // Samples 2 and 3 get overwritten before the walk reaches them
        for ts in 4..=6 {
            store.produce(sample(ts));
        }

        assert_eq!(store.advance_traversal(&mut token).unwrap().timestamp_ms, 4);
        assert!(token.is_stale());
        assert_eq!(token.skipped(), 2);
        assert_eq!(store.advance_traversal(&mut token).unwrap().timestamp_ms, 5);
        assert_eq!(store.advance_traversal(&mut token).unwrap().timestamp_ms, 6);
        assert!(store.advance_traversal(&mut token).is_none());
    }

    #[test]
    fn test_independent_tokens() {
        let store = RingStore::new(5).unwrap();
        for ts in 1..=3 {
            store.produce(sample(ts));
        }

        let mut a = store.begin_traversal();
        let mut b = store.begin_traversal();
        assert_eq!(store.advance_traversal(&mut a).unwrap().timestamp_ms, 1);
        assert_eq!(store.advance_traversal(&mut a).unwrap().timestamp_ms, 2);
        assert_eq!(store.advance_traversal(&mut b).unwrap().timestamp_ms, 1);
    }

    #[test]
    fn test_peek_returns_copy() {
        let store = RingStore::new(1).unwrap();
        store.produce(sample(1));
        let before = store.peek_active().unwrap();
        store.produce(sample(2));
        assert_eq!(before.timestamp_ms, 1);
        assert_eq!(store.peek_active().unwrap().timestamp_ms, 2);
    }

    proptest! {
        #[test]
        fn prop_active_is_last_produced(capacity in 1usize..64, extra in 0u64..64) {
            let store = RingStore::new(capacity).unwrap();
            let total = capacity as u64 + extra;
            for ts in 1..=total {
                store.produce(sample(ts));
            }
            prop_assert_eq!(store.peek_active().unwrap().timestamp_ms, total);
        }

        #[test]
        fn prop_drain_yields_surviving_window(capacity in 1usize..64, total in 0u64..200) {
            let store = RingStore::new(capacity).unwrap();
            for ts in 1..=total {
                store.produce(sample(ts));
            }

            let first = total.saturating_sub(capacity as u64) + 1;
            let expected: Vec<u64> = (first..=total).collect();
            prop_assert_eq!(drain(&store), expected.clone());
            let snapshot: Vec<u64> = store.snapshot().iter().map(|r| r.timestamp_ms).collect();
            prop_assert_eq!(snapshot, expected);
        }
    }
}
