//! The root cache type.
//!
//! A [`Cache`] is **not** `Send`/`Sync`: it is meant for single-threaded
//! cooperative use and keeps no internal locks, and the raw pointers stored
//! in its windows mean the compiler won't let you share one across threads
//! without `unsafe`. Callers that need shared ownership should wrap a
//! `Cache` in `Rc<RefCell<_>>`; `Rc::clone` and dropping the `Rc` play the
//! role manual reference counting would, and this module's [`Drop`] impl
//! tears everything down once the last reference goes away.

use std::array;
use std::collections::HashMap;

use slotmap::SlotMap;

#[cfg(feature = "small-windows")]
use crate::align::PAGE_SIZE;
use crate::align::{align_down, align_up};
use crate::error::{classify_mmap_error, CacheError, Result};
use crate::fdhandle::{FileHandle, FileId};
use crate::sigbus::SigbusQueue;
use crate::sys;
use crate::window::{Window, WindowId};

/// Default window size: 8 MiB.
#[cfg(not(feature = "small-windows"))]
const WINDOW_SIZE: usize = 8 * 1024 * 1024;

/// Returns the size new windows are created with. Normally the fixed 8 MiB
/// constant; with the `small-windows` feature, one page, to stress window
/// reuse, eviction, and LRU correctness without needing huge test files.
/// This is a Cargo feature rather than tied to `cfg(debug_assertions)` so
/// that an ordinary debug build still exercises realistic window sizes.
pub fn window_size() -> usize {
    #[cfg(feature = "small-windows")]
    {
        *PAGE_SIZE
    }
    #[cfg(not(feature = "small-windows"))]
    {
        WINDOW_SIZE
    }
}

/// Soft floor below which the allocator always grows instead of reusing the
/// unused LRU tail.
pub const MIN_WINDOWS: usize = 64;

/// Monotone counters. They have no semantic effect on cache behavior; they
/// exist purely for diagnosis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served by the requesting context's own last-used window.
    pub context_cache_hits: u64,
    /// Lookups served by scanning the target file's window list.
    pub window_list_hits: u64,
    /// Lookups that required mapping a brand new window.
    pub misses: u64,
}

struct ContextSlot {
    window: Option<WindowId>,
}

/// The root of the windowed mmap cache.
///
/// `MAX_CONTEXTS` is the compile-time bound on context ids, expressed as a
/// const generic defaulting to 32, backing a fixed-size array of context
/// slots.
pub struct Cache<const MAX_CONTEXTS: usize = 32> {
    files: SlotMap<FileId, FileHandle>,
    windows: SlotMap<WindowId, Window>,
    fd_index: HashMap<libc::c_int, FileId>,
    contexts: [Option<ContextSlot>; MAX_CONTEXTS],

    /// Head of the unused LRU, most-recently-unused-at-head.
    unused_head: Option<WindowId>,
    /// Tail of the unused LRU: the eviction victim.
    unused_tail: Option<WindowId>,

    stats: CacheStats,
}

impl<const N: usize> Cache<N> {
    /// Creates a fresh, empty cache.
    pub fn new() -> Self {
        Self {
            files: SlotMap::with_key(),
            windows: SlotMap::with_key(),
            fd_index: HashMap::new(),
            contexts: array::from_fn(|_| None),
            unused_head: None,
            unused_tail: None,
            stats: CacheStats::default(),
        }
    }

    /// A snapshot of the hit/miss counters.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Emits the current counters at debug level.
    pub fn stats_log_debug(&self) {
        log::debug!(
            "mmap cache: {} context hits, {} window-list hits, {} misses, {} live windows, {} registered files",
            self.stats.context_cache_hits,
            self.stats.window_list_hits,
            self.stats.misses,
            self.windows.len(),
            self.files.len(),
        );
    }

    /// Registers `raw_fd` with the cache.
    ///
    /// If `raw_fd` is already registered, returns the existing handle;
    /// `prot` is then ignored, since the protection flags of the existing
    /// registration are authoritative (first writer wins).
    pub fn add_fd(&mut self, raw_fd: libc::c_int, prot: libc::c_int) -> FileId {
        if let Some(&id) = self.fd_index.get(&raw_fd) {
            return id;
        }

        let id = self.files.insert(FileHandle::new(raw_fd, prot));
        self.fd_index.insert(raw_fd, id);
        id
    }

    /// Unregisters a file handle, unmapping every window still attached to
    /// it. Drains `queue` first, so that no queued address can outlive the
    /// window that produced it.
    pub fn free_fd(&mut self, file: FileId, queue: &dyn SigbusQueue) -> Result<()> {
        self.process_sigbus(queue)?;

        let mut cursor = self.files[file].windows;
        while let Some(window_id) = cursor {
            cursor = self.windows[window_id].fd_next;
            self.destroy_window(window_id);
        }

        let raw_fd = self.files[file].fd;
        self.fd_index.remove(&raw_fd);
        self.files.remove(file);

        Ok(())
    }

    /// Looks up a byte range within `file`, checking the requesting
    /// context's own last-used window first, then scanning the file's
    /// window list, then mapping a brand new window on a miss.
    ///
    /// `context_id` must be `< MAX_CONTEXTS` and `size` must be non-zero;
    /// violating either panics rather than returning a `Result`, since both
    /// are caller programming errors, not recoverable runtime conditions.
    pub fn get(
        &mut self,
        file: FileId,
        context_id: usize,
        keep_always: bool,
        offset: usize,
        size: usize,
        file_size: Option<u64>,
    ) -> Result<*const u8> {
        assert!(
            context_id < N,
            "context_id {} out of range (MAX_CONTEXTS = {})",
            context_id,
            N
        );
        assert!(size > 0, "size must be greater than zero");

        // 1. Context fast path.
        if let Some(window_id) = self.contexts[context_id].as_ref().and_then(|s| s.window) {
            let matches = {
                let w = &self.windows[window_id];
                w.file == file && w.contains(offset, size)
            };

            if matches {
                if self.files[file].sigbus {
                    return Err(CacheError::Io);
                }
                if keep_always {
                    self.windows[window_id].keep_always = true;
                }
                self.stats.context_cache_hits += 1;
                let w = &self.windows[window_id];
                // SAFETY: `contains` was just checked above.
                return Ok(unsafe { w.adjusted_ptr(offset) });
            }

            self.detach_context(context_id);
        }

        // 2. Per-file linear scan.
        if self.files[file].sigbus {
            return Err(CacheError::Io);
        }

        let mut cursor = self.files[file].windows;
        while let Some(window_id) = cursor {
            cursor = self.windows[window_id].fd_next;

            if self.windows[window_id].contains(offset, size) {
                self.attach_context(window_id, context_id);
                if keep_always {
                    self.windows[window_id].keep_always = true;
                }
                self.stats.window_list_hits += 1;
                let w = &self.windows[window_id];
                // SAFETY: `contains` was just checked above.
                return Ok(unsafe { w.adjusted_ptr(offset) });
            }
        }

        // 3. Miss: create.
        self.stats.misses += 1;
        let (woffset, wsize) = window_bounds(offset, size, file_size)?;
        let window_id = self.allocate_window(file, woffset, wsize)?;
        self.attach_context(window_id, context_id);
        if keep_always {
            self.windows[window_id].keep_always = true;
        }
        let w = &self.windows[window_id];
        // SAFETY: the newly created window covers [woffset, woffset+wsize)
        // which contains [offset, offset+size) by construction of
        // `window_bounds`.
        Ok(unsafe { w.adjusted_ptr(offset) })
    }

    /// Drains the SIGBUS queue, poisoning and invalidating any file whose
    /// window contains a reported address.
    ///
    /// Aborts the process if a reported address falls within no window
    /// known to this cache: that is an unrecoverable condition, and
    /// continuing would risk silent corruption.
    pub fn process_sigbus(&mut self, queue: &dyn SigbusQueue) -> Result<()> {
        let mut any_match = false;

        loop {
            let addr = match queue.pop()? {
                Some(addr) => addr,
                None => break,
            };

            let mut matched: Option<FileId> = None;
            'outer: for (file_id, file) in self.files.iter() {
                let mut cursor = file.windows;
                while let Some(window_id) = cursor {
                    let w = &self.windows[window_id];
                    let base = w.ptr.as_ptr() as usize;
                    if addr >= base && addr < base + w.size {
                        matched = Some(file_id);
                        break 'outer;
                    }
                    cursor = w.fd_next;
                }
            }

            match matched {
                Some(file_id) => {
                    self.files[file_id].sigbus = true;
                    any_match = true;
                }
                None => {
                    log::error!(
                        "SIGBUS at {:#x} is inside no window known to this cache; aborting",
                        addr
                    );
                    std::process::abort();
                }
            }
        }

        if any_match {
            let poisoned: Vec<FileId> = self
                .files
                .iter()
                .filter(|(_, f)| f.sigbus)
                .map(|(id, _)| id)
                .collect();

            for file_id in poisoned {
                self.invalidate_file_windows(file_id)?;
            }
        }

        Ok(())
    }

    /// Convenience: drains `queue`, then reports whether `file` is poisoned.
    pub fn fd_got_sigbus(&mut self, file: FileId, queue: &dyn SigbusQueue) -> Result<bool> {
        self.process_sigbus(queue)?;
        Ok(self.files[file].sigbus)
    }

    /// Like [`get`](Self::get), but returns a slice-view guard instead of a
    /// raw pointer. Borrowing `&mut self` for the returned guard's lifetime
    /// means the borrow checker, not just discipline, enforces the rule
    /// that callers must not persist pointers across later `get` calls
    /// unless `keep_always` was set.
    pub fn get_slice(
        &mut self,
        file: FileId,
        context_id: usize,
        keep_always: bool,
        offset: usize,
        size: usize,
        file_size: Option<u64>,
    ) -> Result<WindowSlice<'_>> {
        let ptr = self.get(file, context_id, keep_always, offset, size, file_size)?;
        Ok(WindowSlice {
            ptr,
            len: size,
            _marker: std::marker::PhantomData,
        })
    }

    // --- internal helpers -------------------------------------------------

    fn ensure_context_slot(&mut self, ctx: usize) {
        if self.contexts[ctx].is_none() {
            self.contexts[ctx] = Some(ContextSlot { window: None });
        }
    }

    fn attach_context(&mut self, window_id: WindowId, ctx: usize) {
        self.ensure_context_slot(ctx);

        if self.windows[window_id].in_unused {
            self.unlink_unused(window_id);
        }

        let w = &mut self.windows[window_id];
        if !w.contexts.contains(&ctx) {
            w.contexts.push(ctx);
        }

        self.contexts[ctx].as_mut().unwrap().window = Some(window_id);
    }

    /// Detaches `ctx` from whatever window it currently references, if any.
    /// Once the last context detaches, the window moves to the unused LRU,
    /// unless `keep_always` is set.
    fn detach_context(&mut self, ctx: usize) {
        let window_id = match self.contexts.get_mut(ctx) {
            Some(Some(slot)) => slot.window.take(),
            _ => None,
        };

        let Some(window_id) = window_id else {
            return;
        };

        self.windows[window_id].contexts.retain(|&c| c != ctx);

        if self.windows[window_id].is_unreferenced() {
            if cfg!(feature = "small-windows") {
                // Destroy the window and its mapping immediately instead of
                // parking it on the LRU, so a stale pointer segfaults
                // synchronously instead of silently reading evicted memory.
                self.destroy_window(window_id);
            } else {
                self.link_unused_at_head(window_id);
            }
        }
    }

    fn link_unused_at_head(&mut self, id: WindowId) {
        let old_head = self.unused_head;

        {
            let w = &mut self.windows[id];
            w.unused_prev = None;
            w.unused_next = old_head;
            w.in_unused = true;
        }

        if let Some(head) = old_head {
            self.windows[head].unused_prev = Some(id);
        }
        self.unused_head = Some(id);
        if self.unused_tail.is_none() {
            self.unused_tail = Some(id);
        }
    }

    fn unlink_unused(&mut self, id: WindowId) {
        let (prev, next, in_unused) = {
            let w = &self.windows[id];
            (w.unused_prev, w.unused_next, w.in_unused)
        };

        if !in_unused {
            return;
        }

        match prev {
            Some(p) => self.windows[p].unused_next = next,
            None => self.unused_head = next,
        }
        match next {
            Some(n) => self.windows[n].unused_prev = prev,
            None => self.unused_tail = prev,
        }

        let w = &mut self.windows[id];
        w.unused_prev = None;
        w.unused_next = None;
        w.in_unused = false;
    }

    fn link_fd(&mut self, file: FileId, window_id: WindowId) {
        let old_head = self.files[file].windows;

        {
            let w = &mut self.windows[window_id];
            w.fd_prev = None;
            w.fd_next = old_head;
        }

        if let Some(head) = old_head {
            self.windows[head].fd_prev = Some(window_id);
        }
        self.files[file].windows = Some(window_id);
    }

    fn unlink_fd(&mut self, window_id: WindowId) {
        let (file, prev, next) = {
            let w = &self.windows[window_id];
            (w.file, w.fd_prev, w.fd_next)
        };

        match prev {
            Some(p) => self.windows[p].fd_next = next,
            None => self.files[file].windows = next,
        }
        if let Some(n) = next {
            self.windows[n].fd_prev = prev;
        }
    }

    /// Evicts the unused LRU tail, if any. Returns whether a victim was
    /// found and reclaimed.
    fn evict_one(&mut self) -> bool {
        let Some(victim) = self.unused_tail else {
            return false;
        };

        self.unlink_unused(victim);
        self.unlink_fd(victim);
        let old = self.windows.remove(victim).expect("victim must exist");

        // SAFETY: the window was just unlinked from both lists and had no
        // attached contexts (it was on the unused LRU), so nothing else
        // references this mapping.
        unsafe {
            let _ = sys::munmap(old.ptr, old.size);
        }

        true
    }

    /// Tears down a window unconditionally: detaches every context still
    /// pointing at it, unlinks it from both lists, unmaps it, and drops its
    /// storage.
    fn destroy_window(&mut self, id: WindowId) {
        let attached = std::mem::take(&mut self.windows[id].contexts);
        for ctx in attached {
            if let Some(Some(slot)) = self.contexts.get_mut(ctx) {
                if slot.window == Some(id) {
                    slot.window = None;
                }
            }
        }

        self.unlink_unused(id);
        self.unlink_fd(id);

        let window = self.windows.remove(id).expect("window must exist");
        // SAFETY: every context was just detached above and the window was
        // unlinked from both lists, so this is the only reference to the
        // mapping left.
        unsafe {
            let _ = sys::munmap(window.ptr, window.size);
        }
    }

    /// Allocation policy: grow while at or below `MIN_WINDOWS` or while
    /// nothing is evictable, otherwise reuse the LRU tail first.
    fn allocate_window(&mut self, file: FileId, woffset: usize, wsize: usize) -> Result<WindowId> {
        let should_grow = self.unused_tail.is_none() || self.windows.len() <= MIN_WINDOWS;
        if !should_grow {
            self.evict_one();
        }

        self.map_with_retry(file, woffset, wsize)
    }

    /// Maps a window, retrying once after evicting the unused tail if the
    /// first attempt fails with `ENOMEM`. Any other failure, or no tail to
    /// evict, is returned verbatim.
    fn map_with_retry(&mut self, file: FileId, woffset: usize, wsize: usize) -> Result<WindowId> {
        let (fd, prot) = {
            let f = &self.files[file];
            (f.fd, f.prot)
        };

        let ptr = match unsafe { sys::mmap_file(fd, woffset as libc::off_t, wsize, prot) } {
            Ok(ptr) => ptr,
            Err(err) => {
                let classified = classify_mmap_error(err);
                if classified != CacheError::OutOfMemory || !self.evict_one() {
                    return Err(classified);
                }
                unsafe { sys::mmap_file(fd, woffset as libc::off_t, wsize, prot) }
                    .map_err(classify_mmap_error)?
            }
        };

        let window = Window {
            file,
            ptr,
            offset: woffset,
            size: wsize,
            invalidated: false,
            keep_always: false,
            in_unused: false,
            fd_prev: None,
            fd_next: None,
            unused_prev: None,
            unused_next: None,
            contexts: Vec::new(),
        };

        let window_id = self.windows.insert(window);
        self.link_fd(file, window_id);
        log::trace!("mapped window fd={} off={} size={}", fd, woffset, wsize);
        Ok(window_id)
    }

    /// Replaces every un-invalidated window of a poisoned file with an
    /// anonymous, zeroed, `MAP_FIXED` mapping at the same address.
    fn invalidate_file_windows(&mut self, file_id: FileId) -> Result<()> {
        let prot = self.files[file_id].prot;
        let raw_fd = self.files[file_id].fd;
        let mut cursor = self.files[file_id].windows;

        while let Some(window_id) = cursor {
            cursor = self.windows[window_id].fd_next;
            let w = &mut self.windows[window_id];

            if !w.invalidated {
                // SAFETY: `w.ptr`/`w.size` describe a still-live mapping
                // created by `mmap_file`; `MAP_FIXED` keeps the address
                // stable for any caller already holding a pointer into it.
                unsafe { sys::mmap_fixed_anon(w.ptr, w.size, prot) }
                    .map_err(classify_mmap_error)?;
                w.invalidated = true;
                log::trace!("invalidated window fd={} off={}", raw_fd, w.offset);
            }
        }

        Ok(())
    }
}

impl<const N: usize> Default for Cache<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Drop for Cache<N> {
    fn drop(&mut self) {
        // Dropping a non-empty cache must not leak mappings: unmap every
        // remaining window before it disappears. Contexts and file handles
        // hold no OS resources of their own, so this is sufficient.
        for (_, w) in self.windows.iter() {
            unsafe {
                let _ = sys::munmap(w.ptr, w.size);
            }
        }
    }
}

/// Computes the page-aligned `(offset, length)` a new window should be
/// created with for a `(offset, size)` request.
fn window_bounds(offset: usize, size: usize, file_size: Option<u64>) -> Result<(usize, usize)> {
    if let Some(file_size) = file_size {
        if offset >= file_size as usize {
            return Err(CacheError::AddrNotAvailable);
        }
    }

    let target = window_size();

    let mut woffset = align_down(offset);
    let mut wsize = align_up(size + (offset - woffset));

    if wsize < target {
        let delta = align_up((target - wsize) / 2);
        woffset = woffset.saturating_sub(delta);
        wsize = target;
    }

    if let Some(file_size) = file_size {
        let file_size = file_size as usize;
        if woffset + wsize > file_size {
            wsize = align_up(file_size - woffset);
        }
    }

    Ok((woffset, wsize))
}

/// A read-only view into a window, returned by [`Cache::get_slice`].
pub struct WindowSlice<'a> {
    ptr: *const u8,
    len: usize,
    _marker: std::marker::PhantomData<&'a [u8]>,
}

impl<'a> WindowSlice<'a> {
    /// Borrows the underlying window as a byte slice.
    pub fn as_slice(&self) -> &'a [u8] {
        // SAFETY: `ptr`/`len` were produced by a successful `Cache::get`
        // call, and the borrow of `Cache` for `'a` prevents the backing
        // window from being evicted or reused for the lifetime of this
        // guard.
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }
}

impl std::ops::Deref for WindowSlice<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl AsRef<[u8]> for WindowSlice<'_> {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sigbus::{AtomicRingQueue, EmptyQueue};
    use std::io::Write;
    use std::os::fd::AsRawFd;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn temp_file(bytes: &[u8]) -> tempfile::NamedTempFile {
        init_logging();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    /// A sparse temp file of `len` bytes, for tests that only need a file
    /// of a given size, not actual content (avoids materializing huge
    /// in-memory buffers for the eviction-bound test).
    fn sparse_temp_file(len: u64) -> tempfile::NamedTempFile {
        init_logging();
        let file = tempfile::NamedTempFile::new().unwrap();
        file.as_file().set_len(len).unwrap();
        file
    }

    fn mb(n: usize) -> usize {
        n * 1024 * 1024
    }

    #[test]
    fn basic_hit() {
        let file = temp_file(&vec![0u8; mb(1)]);
        let mut cache: Cache = Cache::new();
        let fh = cache.add_fd(file.as_file().as_raw_fd(), libc::PROT_READ);

        let p1 = cache
            .get(fh, 0, false, 100, 200, Some(mb(1) as u64))
            .unwrap();
        let p2 = cache
            .get(fh, 0, false, 100, 200, Some(mb(1) as u64))
            .unwrap();

        assert_eq!(p1, p2);
        assert_eq!(cache.stats().context_cache_hits, 1);
    }

    #[test]
    fn windowing_clamps_to_file_start() {
        let file = temp_file(&vec![0u8; mb(100)]);
        let mut cache: Cache = Cache::new();
        let fh = cache.add_fd(file.as_file().as_raw_fd(), libc::PROT_READ);

        cache.get(fh, 0, false, 0, 16, Some(mb(100) as u64)).unwrap();

        let (_, window) = cache.windows.iter().next().unwrap();
        assert_eq!(window.offset, 0);
        assert_eq!(window.size, mb(8));
    }

    #[test]
    fn cross_context_sharing() {
        let file = temp_file(&vec![0u8; mb(1)]);
        let mut cache: Cache = Cache::new();
        let fh = cache.add_fd(file.as_file().as_raw_fd(), libc::PROT_READ);

        let p0 = cache.get(fh, 0, false, 50, 50, None).unwrap();
        let p1 = cache.get(fh, 1, false, 50, 50, None).unwrap();

        assert_eq!(p0, p1);
        assert_eq!(cache.stats().window_list_hits, 1);
        assert_eq!(cache.stats().context_cache_hits, 0);
    }

    #[test]
    fn past_eof_rejected() {
        let file = temp_file(&vec![0u8; 4096]);
        let mut cache: Cache = Cache::new();
        let fh = cache.add_fd(file.as_file().as_raw_fd(), libc::PROT_READ);

        let result = cache.get(fh, 0, false, 8192, 16, Some(4096));
        assert_eq!(result.unwrap_err(), CacheError::AddrNotAvailable);
    }

    #[test]
    fn eviction_keeps_window_count_bounded() {
        let total_size = mb(8) * (MIN_WINDOWS + 4);
        let file = sparse_temp_file(total_size as u64);
        let mut cache: Cache = Cache::new();
        let fh = cache.add_fd(file.as_file().as_raw_fd(), libc::PROT_READ);

        for i in 0..(MIN_WINDOWS + 4) {
            let offset = i * mb(8);
            cache
                .get(fh, 0, false, offset, 1, Some(total_size as u64))
                .unwrap();
            // Detach the context immediately so the window becomes
            // unreferenced and eligible for the unused LRU / eviction.
            cache.detach_context(0);
        }

        assert!(cache.windows.len() <= MIN_WINDOWS + 1);
    }

    #[test]
    fn truncation_poisons_and_invalidates() {
        let file = temp_file(&vec![0u8; mb(1)]);
        let mut cache: Cache = Cache::new();
        let fh = cache.add_fd(file.as_file().as_raw_fd(), libc::PROT_READ);

        let ptr = cache.get(fh, 0, false, 0, 1, None).unwrap();
        let addr = ptr as usize;

        let queue: AtomicRingQueue<8> = AtomicRingQueue::new();
        queue.push(addr);

        cache.process_sigbus(&queue).unwrap();
        assert!(cache.fd_got_sigbus(fh, &queue).unwrap());

        let result = cache.get(fh, 0, false, 0, 1, None);
        assert_eq!(result.unwrap_err(), CacheError::Io);

        // A second drain of the queue (now empty) must not raise any
        // further fault.
        cache.process_sigbus(&EmptyQueue).unwrap();
    }

    #[test]
    fn keep_always_survives_detach() {
        let file = temp_file(&vec![0u8; mb(1)]);
        let mut cache: Cache = Cache::new();
        let fh = cache.add_fd(file.as_file().as_raw_fd(), libc::PROT_READ);

        cache.get(fh, 0, true, 0, 1, None).unwrap();
        cache.detach_context(0);

        let (_, window) = cache.windows.iter().next().unwrap();
        assert!(window.keep_always);
        assert!(!window.in_unused);
    }

    #[test]
    fn idempotent_registration() {
        let file = temp_file(&vec![0u8; 4096]);
        let mut cache: Cache = Cache::new();
        let fd = file.as_file().as_raw_fd();

        let first = cache.add_fd(fd, libc::PROT_READ);
        let second = cache.add_fd(fd, libc::PROT_READ | libc::PROT_WRITE);

        assert_eq!(first, second);
        // first-writer-wins: prot is unchanged by the second call.
        assert_eq!(cache.files[first].prot, libc::PROT_READ);
    }
}
