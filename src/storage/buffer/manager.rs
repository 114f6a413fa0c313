use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;
use log::debug;
use parking_lot::{Mutex, RwLock};

use crate::common::types::{
    AccessType, Frame, FrameId, FramePtr, Page, PageId, PagePtr, INVALID_PAGE_ID,
};
use crate::storage::buffer::error::BufferPoolError;
use crate::storage::buffer::replacer::LRUKReplacer;
use crate::storage::disk::DiskManager;
use crate::storage::page::{BasicPageGuard, ReadPageGuard, WritePageGuard};

/// Bookkeeping shared by every pool operation: the page table, the free
/// list, the replacement policy, and the page ID allocator. One latch
/// serializes all of it; victim write-back happens while it is held.
struct PoolState {
    page_table: HashMap<PageId, FrameId>,
    free_list: VecDeque<FrameId>,
    replacer: LRUKReplacer,
    next_page_id: PageId,
}

pub struct BufferPoolManager {
    pool_size: usize,
    frames: Vec<FramePtr>,
    state: Mutex<PoolState>,
    disk_manager: Arc<DiskManager>,
}

impl BufferPoolManager {
    pub fn new(
        pool_size: usize,
        replacer_k: usize,
        db_path: impl AsRef<Path>,
    ) -> Result<Self, BufferPoolError> {
        let disk_manager = Arc::new(DiskManager::new(db_path)?);
        let mut frames = Vec::with_capacity(pool_size);
        let mut free_list = VecDeque::with_capacity(pool_size);

        for i in 0..pool_size {
            let frame_id = i as FrameId;
            let page = Arc::new(RwLock::new(Page::new(INVALID_PAGE_ID)));
            frames.push(Arc::new(Frame::new(frame_id, page)));
            free_list.push_back(frame_id);
        }

        Ok(Self {
            pool_size,
            frames,
            state: Mutex::new(PoolState {
                page_table: HashMap::new(),
                free_list,
                replacer: LRUKReplacer::new(pool_size, replacer_k),
                next_page_id: 1,
            }),
            disk_manager,
        })
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Create a new page, pinned into a frame
    pub fn new_page(&self) -> Result<(PagePtr, PageId), BufferPoolError> {
        let (page_id, frame) = self.new_frame()?;
        Ok((Arc::clone(&frame.page), page_id))
    }

    /// Fetch a page from the buffer pool or disk
    pub fn fetch_page(&self, page_id: PageId) -> Result<PagePtr, BufferPoolError> {
        let frame = self.fetch_frame(page_id, AccessType::Unknown)?;
        Ok(Arc::clone(&frame.page))
    }

    /// Fetch a page, recording how the caller intends to use it
    pub fn fetch_page_with(
        &self,
        page_id: PageId,
        access_type: AccessType,
    ) -> Result<PagePtr, BufferPoolError> {
        let frame = self.fetch_frame(page_id, access_type)?;
        Ok(Arc::clone(&frame.page))
    }

    /// Unpin a page, potentially marking it as dirty.
    ///
    /// The dirty flag is sticky: unpinning with `is_dirty = false` never
    /// clears a previously dirtied page. The access type is accepted for
    /// symmetry with the fetch path; no current policy consumes it here.
    pub fn unpin_page(
        &self,
        page_id: PageId,
        is_dirty: bool,
        _access_type: AccessType,
    ) -> Result<(), BufferPoolError> {
        let mut state = self.state.lock();

        let frame_id = match state.page_table.get(&page_id) {
            Some(&id) => id,
            None => return Err(BufferPoolError::PageNotFound(page_id)),
        };

        let frame = &self.frames[frame_id as usize];
        if frame.pin_count() == 0 {
            return Err(BufferPoolError::PageNotPinned(page_id));
        }

        if frame.unpin() == 0 {
            state.replacer.set_evictable(frame_id, true)?;
        }
        if is_dirty {
            frame.mark_dirty();
        }

        Ok(())
    }

    /// Write a page through to disk and clear its dirty flag. Pin state is
    /// untouched; flushing a pinned page is allowed.
    pub fn flush_page(&self, page_id: PageId) -> Result<(), BufferPoolError> {
        let state = self.state.lock();

        let frame_id = match state.page_table.get(&page_id) {
            Some(&id) => id,
            None => return Err(BufferPoolError::PageNotFound(page_id)),
        };

        let frame = &self.frames[frame_id as usize];
        {
            let page = frame.page.read();
            self.disk_manager.write_page(page.page_id, &page.data)?;
        }
        frame.set_dirty(false);

        Ok(())
    }

    /// Flush every resident page to disk
    pub fn flush_all_pages(&self) -> Result<(), BufferPoolError> {
        let state = self.state.lock();

        for (&page_id, &frame_id) in state.page_table.iter() {
            let frame = &self.frames[frame_id as usize];
            {
                let page = frame.page.read();
                self.disk_manager.write_page(page_id, &page.data)?;
            }
            frame.set_dirty(false);
        }

        Ok(())
    }

    /// Delete a page from the buffer pool, returning its frame to the free
    /// list. Deleting a non-resident page succeeds trivially; deleting a
    /// pinned page fails.
    pub fn delete_page(&self, page_id: PageId) -> Result<(), BufferPoolError> {
        let mut state = self.state.lock();

        let frame_id = match state.page_table.get(&page_id) {
            Some(&id) => id,
            None => return Ok(()),
        };

        let frame = &self.frames[frame_id as usize];
        if frame.pin_count() > 0 {
            return Err(BufferPoolError::PagePinned(page_id));
        }

        state.page_table.remove(&page_id);
        state.replacer.remove(frame_id)?;
        state.free_list.push_back(frame_id);

        frame.page.write().reset();
        frame.set_dirty(false);

        self.disk_manager.deallocate_page(page_id);
        Ok(())
    }

    /// Pin count of a resident page; `None` when the page is not in the pool
    pub fn get_pin_count(&self, page_id: PageId) -> Option<u32> {
        let state = self.state.lock();
        let &frame_id = state.page_table.get(&page_id)?;
        Some(self.frames[frame_id as usize].pin_count())
    }

    /// Fetch a page behind a guard that unpins on drop
    pub fn fetch_page_basic(
        self: &Arc<Self>,
        page_id: PageId,
    ) -> Result<BasicPageGuard, BufferPoolError> {
        let frame = self.fetch_frame(page_id, AccessType::Unknown)?;
        Ok(BasicPageGuard::new(Arc::clone(self), page_id, frame))
    }

    /// Fetch a page and take its read latch
    pub fn fetch_page_read(
        self: &Arc<Self>,
        page_id: PageId,
    ) -> Result<ReadPageGuard, BufferPoolError> {
        let frame = self.fetch_frame(page_id, AccessType::Lookup)?;
        let latch = frame.page.read_arc();
        let guard = BasicPageGuard::new(Arc::clone(self), page_id, frame);
        Ok(ReadPageGuard::new(guard, latch))
    }

    /// Fetch a page and take its write latch
    pub fn fetch_page_write(
        self: &Arc<Self>,
        page_id: PageId,
    ) -> Result<WritePageGuard, BufferPoolError> {
        let frame = self.fetch_frame(page_id, AccessType::Lookup)?;
        let latch = frame.page.write_arc();
        let guard = BasicPageGuard::new(Arc::clone(self), page_id, frame);
        Ok(WritePageGuard::new(guard, latch))
    }

    /// Create a new page behind a guard that unpins on drop
    pub fn new_page_guarded(
        self: &Arc<Self>,
    ) -> Result<(PageId, BasicPageGuard), BufferPoolError> {
        let (page_id, frame) = self.new_frame()?;
        Ok((page_id, BasicPageGuard::new(Arc::clone(self), page_id, frame)))
    }

    fn new_frame(&self) -> Result<(PageId, FramePtr), BufferPoolError> {
        let mut state = self.state.lock();

        let frame_id = self.obtain_frame(&mut state)?;
        let page_id = Self::allocate_page(&mut state);

        let frame = &self.frames[frame_id as usize];
        {
            let mut page = frame.page.write();
            page.reset();
            page.page_id = page_id;
        }

        state.page_table.insert(page_id, frame_id);
        frame.set_dirty(false);
        frame.pin();
        state.replacer.record_access(frame_id, AccessType::Unknown)?;
        state.replacer.set_evictable(frame_id, false)?;

        Ok((page_id, Arc::clone(frame)))
    }

    fn fetch_frame(
        &self,
        page_id: PageId,
        access_type: AccessType,
    ) -> Result<FramePtr, BufferPoolError> {
        if page_id == INVALID_PAGE_ID {
            return Err(BufferPoolError::InvalidOperation(
                "cannot fetch the invalid page ID".to_string(),
            ));
        }

        let mut state = self.state.lock();

        // Already resident: pin it and refresh its access history.
        if let Some(&frame_id) = state.page_table.get(&page_id) {
            let frame = &self.frames[frame_id as usize];
            frame.pin();
            state.replacer.record_access(frame_id, access_type)?;
            state.replacer.set_evictable(frame_id, false)?;
            return Ok(Arc::clone(frame));
        }

        let frame_id = self.obtain_frame(&mut state)?;
        let frame = &self.frames[frame_id as usize];

        {
            let mut page = frame.page.write();
            if let Err(e) = self.disk_manager.read_page(page_id, &mut page) {
                // Put the frame back so a failed read does not leak it.
                drop(page);
                state.free_list.push_back(frame_id);
                return Err(e.into());
            }
        }

        state.page_table.insert(page_id, frame_id);
        frame.set_dirty(false);
        frame.pin();
        state.replacer.record_access(frame_id, access_type)?;
        state.replacer.set_evictable(frame_id, false)?;

        Ok(Arc::clone(frame))
    }

    /// Select a frame for a new binding: free list first, then the
    /// replacer. A dirty victim is written back before its frame is reused.
    fn obtain_frame(&self, state: &mut PoolState) -> Result<FrameId, BufferPoolError> {
        if let Some(frame_id) = state.free_list.pop_front() {
            return Ok(frame_id);
        }

        let frame_id = match state.replacer.evict() {
            Some(id) => id,
            None => return Err(BufferPoolError::PoolExhausted),
        };

        let frame = &self.frames[frame_id as usize];
        let old_page_id = {
            let page = frame.page.read();
            if frame.is_dirty() {
                debug!("writing back dirty page {} before eviction", page.page_id);
                self.disk_manager.write_page(page.page_id, &page.data)?;
            }
            page.page_id
        };

        if old_page_id != INVALID_PAGE_ID {
            state.page_table.remove(&old_page_id);
        }
        frame.set_dirty(false);

        Ok(frame_id)
    }

    fn allocate_page(state: &mut PoolState) -> PageId {
        let page_id = state.next_page_id;
        state.next_page_id += 1;
        page_id
    }
}
