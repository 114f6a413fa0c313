use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap, VecDeque};

use thiserror::Error;

use crate::common::types::{AccessType, FrameId};

#[derive(Error, Debug)]
pub enum ReplacerError {
    #[error("Frame {0} is out of range for a replacer over {1} frames")]
    FrameOutOfRange(FrameId, usize),
    #[error("Cannot remove frame {0}: it is not evictable")]
    NotEvictable(FrameId),
}

/// Per-frame access bookkeeping. The history keeps at most `k` timestamps;
/// only the k-th most recent matters once a frame turns hot, and the
/// earliest access orders cold frames before that.
struct LRUKNode {
    history: VecDeque<u64>,
    is_evictable: bool,
}

impl LRUKNode {
    fn new(timestamp: u64) -> Self {
        let mut history = VecDeque::new();
        history.push_back(timestamp);
        Self {
            history,
            is_evictable: false,
        }
    }

    fn record(&mut self, timestamp: u64, k: usize) {
        self.history.push_back(timestamp);
        if self.history.len() > k {
            self.history.pop_front();
        }
    }

    fn first_access(&self) -> u64 {
        self.history.front().copied().unwrap_or(u64::MAX)
    }

    /// K-th most recent access timestamp, present only for hot frames.
    fn kth_recent(&self, k: usize) -> Option<u64> {
        if self.history.len() >= k {
            self.history.front().copied()
        } else {
            None
        }
    }

    /// Which queue this frame belongs to and under which key.
    /// `true` selects the hot queue.
    fn queue_entry(&self, frame_id: FrameId, k: usize) -> (bool, (u64, FrameId)) {
        match self.kth_recent(k) {
            Some(ts) => (true, (ts, frame_id)),
            None => (false, (self.first_access(), frame_id)),
        }
    }
}

/// LRU-K page replacement policy.
///
/// Frames with fewer than K recorded accesses have infinite backward
/// K-distance and are evicted first, oldest first access first. Among frames
/// with at least K accesses, the one whose K-th most recent access is oldest
/// goes first. Ties break on frame ID.
///
/// Both queues are ordered sets keyed by `(timestamp, frame_id)`, with the
/// node store as the side index; membership is exactly the set of evictable
/// frames.
pub struct LRUKReplacer {
    node_store: HashMap<FrameId, LRUKNode>,
    inf_queue: BTreeSet<(u64, FrameId)>,
    k_queue: BTreeSet<(u64, FrameId)>,
    current_timestamp: u64,
    num_frames: usize,
    k: usize,
}

impl LRUKReplacer {
    pub fn new(num_frames: usize, k: usize) -> Self {
        Self {
            node_store: HashMap::new(),
            inf_queue: BTreeSet::new(),
            k_queue: BTreeSet::new(),
            current_timestamp: 0,
            num_frames,
            k,
        }
    }

    /// Record an access to a frame at the current timestamp.
    ///
    /// An evictable frame is re-keyed so both queues stay sorted: crossing
    /// the K-access threshold moves it from the cold queue to the hot one,
    /// and further accesses to a hot frame refresh its K-th timestamp.
    pub fn record_access(
        &mut self,
        frame_id: FrameId,
        _access_type: AccessType,
    ) -> Result<(), ReplacerError> {
        self.check_frame(frame_id)?;
        let timestamp = self.current_timestamp;
        self.current_timestamp += 1;
        let k = self.k;

        let (old_entry, new_entry) = match self.node_store.entry(frame_id) {
            Entry::Vacant(slot) => {
                slot.insert(LRUKNode::new(timestamp));
                return Ok(());
            }
            Entry::Occupied(mut slot) => {
                let node = slot.get_mut();
                let old = node.is_evictable.then(|| node.queue_entry(frame_id, k));
                node.record(timestamp, k);
                let new = node.is_evictable.then(|| node.queue_entry(frame_id, k));
                (old, new)
            }
        };

        if let Some(entry) = old_entry {
            self.queue_remove(entry);
        }
        if let Some(entry) = new_entry {
            self.queue_insert(entry);
        }
        Ok(())
    }

    /// Toggle a frame's evictability. No-op for untracked frames or when the
    /// flag already matches.
    pub fn set_evictable(
        &mut self,
        frame_id: FrameId,
        evictable: bool,
    ) -> Result<(), ReplacerError> {
        self.check_frame(frame_id)?;
        let k = self.k;

        let entry = match self.node_store.get_mut(&frame_id) {
            None => return Ok(()),
            Some(node) if node.is_evictable == evictable => return Ok(()),
            Some(node) => {
                node.is_evictable = evictable;
                node.queue_entry(frame_id, k)
            }
        };

        if evictable {
            self.queue_insert(entry);
        } else {
            self.queue_remove(entry);
        }
        Ok(())
    }

    /// Choose and remove the eviction victim: any cold frame before any hot
    /// frame. Returns `None` when nothing is evictable.
    pub fn evict(&mut self) -> Option<FrameId> {
        let (_, frame_id) = self
            .inf_queue
            .pop_first()
            .or_else(|| self.k_queue.pop_first())?;
        self.node_store.remove(&frame_id);
        Some(frame_id)
    }

    /// Drop a frame's tracking entirely, e.g. when its page is deleted.
    /// No-op for untracked frames.
    pub fn remove(&mut self, frame_id: FrameId) -> Result<(), ReplacerError> {
        let entry = match self.node_store.get(&frame_id) {
            None => return Ok(()),
            Some(node) if !node.is_evictable => {
                return Err(ReplacerError::NotEvictable(frame_id));
            }
            Some(node) => node.queue_entry(frame_id, self.k),
        };
        self.queue_remove(entry);
        self.node_store.remove(&frame_id);
        Ok(())
    }

    /// Number of currently evictable frames.
    pub fn size(&self) -> usize {
        self.inf_queue.len() + self.k_queue.len()
    }

    fn check_frame(&self, frame_id: FrameId) -> Result<(), ReplacerError> {
        if frame_id as usize >= self.num_frames {
            return Err(ReplacerError::FrameOutOfRange(frame_id, self.num_frames));
        }
        Ok(())
    }

    fn queue_insert(&mut self, (hot, key): (bool, (u64, FrameId))) {
        if hot {
            self.k_queue.insert(key);
        } else {
            self.inf_queue.insert(key);
        }
    }

    fn queue_remove(&mut self, (hot, key): (bool, (u64, FrameId))) {
        if hot {
            self.k_queue.remove(&key);
        } else {
            self.inf_queue.remove(&key);
        }
    }
}
