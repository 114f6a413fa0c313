use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use parking_lot::RwLock;

/// Page size in bytes (4KB)
pub const PAGE_SIZE: usize = 4096;

/// Page ID type
pub type PageId = u32;

/// Buffer pool frame ID type
pub type FrameId = u32;

/// Reserved sentinel; real page IDs start at 1
pub const INVALID_PAGE_ID: PageId = 0;

/// How a caller touched a page. The current replacement policy treats all
/// variants alike; the distinction is kept for policies that weight scans
/// differently from point lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessType {
    Unknown,
    Lookup,
    Scan,
    Index,
}

/// Page structure
#[derive(Debug)]
pub struct Page {
    pub data: [u8; PAGE_SIZE],
    pub page_id: PageId,
}

impl Page {
    pub fn new(page_id: PageId) -> Self {
        Self {
            data: [0; PAGE_SIZE],
            page_id,
        }
    }

    /// Zero the contents and drop the page binding.
    pub fn reset(&mut self) {
        self.data.fill(0);
        self.page_id = INVALID_PAGE_ID;
    }
}

/// Smart pointer to a page; the RwLock is the per-page latch.
pub type PagePtr = Arc<RwLock<Page>>;

/// Buffer pool frame structure. The page contents sit behind the per-page
/// latch; pin count and dirty flag are atomics so guards can read them
/// without taking the pool latch. All pin-count mutation happens under the
/// pool latch.
#[derive(Debug)]
pub struct Frame {
    pub frame_id: FrameId,
    pub page: PagePtr,
    pin_count: AtomicU32,
    is_dirty: AtomicBool,
}

impl Frame {
    pub fn new(frame_id: FrameId, page: PagePtr) -> Self {
        Self {
            frame_id,
            page,
            pin_count: AtomicU32::new(0),
            is_dirty: AtomicBool::new(false),
        }
    }

    pub fn pin_count(&self) -> u32 {
        self.pin_count.load(Ordering::Acquire)
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty.load(Ordering::Acquire)
    }

    /// Mark the in-memory contents as newer than disk. Safe to call from a
    /// write guard without the pool latch.
    pub fn mark_dirty(&self) {
        self.is_dirty.store(true, Ordering::Release);
    }

    pub(crate) fn set_dirty(&self, dirty: bool) {
        self.is_dirty.store(dirty, Ordering::Release);
    }

    pub(crate) fn pin(&self) -> u32 {
        self.pin_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn unpin(&self) -> u32 {
        self.pin_count.fetch_sub(1, Ordering::AcqRel) - 1
    }
}

/// Smart pointer to a frame
pub type FramePtr = Arc<Frame>;
