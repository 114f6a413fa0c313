use std::sync::Arc;

use parking_lot::{ArcRwLockReadGuard, ArcRwLockWriteGuard, RawRwLock};

use crate::common::types::{AccessType, FramePtr, Page, PageId, PagePtr, PAGE_SIZE};
use crate::storage::buffer::BufferPoolManager;

/// Scoped handle over a pinned page. Dropping the guard unpins the page
/// with the frame's current dirty flag, so a write latched through
/// [`WritePageGuard`] is flushed back eventually without the caller
/// remembering to unpin.
///
/// Guards move like any Rust value; ownership rules make double-unpin
/// unrepresentable.
pub struct BasicPageGuard {
    bpm: Arc<BufferPoolManager>,
    frame: FramePtr,
    page_id: PageId,
}

impl BasicPageGuard {
    pub(crate) fn new(bpm: Arc<BufferPoolManager>, page_id: PageId, frame: FramePtr) -> Self {
        Self { bpm, frame, page_id }
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// The guarded page. Callers writing through this handle must either
    /// call [`mark_dirty`](Self::mark_dirty) or unpin with the dirty flag
    /// themselves.
    pub fn page(&self) -> &PagePtr {
        &self.frame.page
    }

    pub fn is_dirty(&self) -> bool {
        self.frame.is_dirty()
    }

    pub fn mark_dirty(&self) {
        self.frame.mark_dirty();
    }

    /// Take the page's read latch, consuming this guard.
    pub fn upgrade_read(self) -> ReadPageGuard {
        let latch = self.frame.page.read_arc();
        ReadPageGuard { latch, guard: self }
    }

    /// Take the page's write latch, consuming this guard.
    pub fn upgrade_write(self) -> WritePageGuard {
        let latch = self.frame.page.write_arc();
        WritePageGuard { latch, guard: self }
    }
}

impl Drop for BasicPageGuard {
    fn drop(&mut self) {
        // The page may already have been deleted from the pool; a failed
        // unpin has nothing left to release.
        let _ = self
            .bpm
            .unpin_page(self.page_id, self.frame.is_dirty(), AccessType::Unknown);
    }
}

/// A [`BasicPageGuard`] that also holds the page's read latch.
///
/// Field order is load-bearing: the latch must release before the unpin in
/// `guard` runs, keeping the page-latch-then-pool-latch order out of drop.
pub struct ReadPageGuard {
    latch: ArcRwLockReadGuard<RawRwLock, Page>,
    guard: BasicPageGuard,
}

impl ReadPageGuard {
    pub(crate) fn new(guard: BasicPageGuard, latch: ArcRwLockReadGuard<RawRwLock, Page>) -> Self {
        Self { latch, guard }
    }

    pub fn page_id(&self) -> PageId {
        self.guard.page_id()
    }

    pub fn data(&self) -> &[u8; PAGE_SIZE] {
        &self.latch.data
    }
}

/// A [`BasicPageGuard`] that also holds the page's write latch. Mutable
/// access marks the frame dirty.
///
/// Same field-order constraint as [`ReadPageGuard`].
pub struct WritePageGuard {
    latch: ArcRwLockWriteGuard<RawRwLock, Page>,
    guard: BasicPageGuard,
}

impl WritePageGuard {
    pub(crate) fn new(guard: BasicPageGuard, latch: ArcRwLockWriteGuard<RawRwLock, Page>) -> Self {
        Self { latch, guard }
    }

    pub fn page_id(&self) -> PageId {
        self.guard.page_id()
    }

    pub fn data(&self) -> &[u8; PAGE_SIZE] {
        &self.latch.data
    }

    pub fn data_mut(&mut self) -> &mut [u8; PAGE_SIZE] {
        self.guard.frame.mark_dirty();
        &mut self.latch.data
    }
}
