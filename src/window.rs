//! A single live `mmap` region.

use std::ptr::NonNull;

use slotmap::new_key_type;

use crate::fdhandle::FileId;

new_key_type! {
    /// Stable handle to a [`Window`], standing in for a raw pointer or
    /// small integer handle into the window arena.
    pub struct WindowId;
}

/// One `mmap`ed range over some file, at a page-aligned offset and length.
pub(crate) struct Window {
    pub file: FileId,
    pub ptr: NonNull<libc::c_void>,
    /// Page-aligned file offset.
    pub offset: usize,
    /// Page-aligned length in bytes.
    pub size: usize,

    /// Replaced by an anonymous mapping after a SIGBUS.
    pub invalidated: bool,
    /// Pinned: never evicted, never placed on the unused LRU.
    pub keep_always: bool,
    /// Currently linked into the cache's unused LRU list.
    pub in_unused: bool,

    /// Intrusive doubly linked list of windows belonging to the same file
    /// handle.
    pub fd_prev: Option<WindowId>,
    pub fd_next: Option<WindowId>,

    /// Intrusive doubly linked list for the cache-wide unused LRU.
    pub unused_prev: Option<WindowId>,
    pub unused_next: Option<WindowId>,

    /// Context ids currently attached to this window. Kept as a small
    /// `Vec` rather than an intrusive list, since contexts are plain array
    /// slots, not arena entries with their own link fields.
    pub contexts: Vec<usize>,
}

impl Window {
    /// Whether `[offset, offset + size)` is fully contained in this window.
    pub fn contains(&self, offset: usize, size: usize) -> bool {
        offset >= self.offset && offset + size <= self.offset + self.size
    }

    /// The pointer a caller should see for a request at `offset`:
    /// `window.ptr + (offset - window.offset)`.
    ///
    /// # Safety
    ///
    /// The caller must have already checked `self.contains(offset, size)`.
    pub unsafe fn adjusted_ptr(&self, offset: usize) -> *const u8 {
        (self.ptr.as_ptr() as *const u8).add(offset - self.offset)
    }

    pub fn is_unreferenced(&self) -> bool {
        self.contexts.is_empty() && !self.keep_always
    }
}
