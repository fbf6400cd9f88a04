//! A bounded cache of `mmap` windows over file-backed storage, with
//! asynchronous SIGBUS fault recovery.
//!
//! *wmcache* does not open, create, resize, or close files; it only maps
//! and unmaps page-aligned ranges of file descriptors the caller already
//! owns. A [`Cache`] keeps a pool of such mappings ("windows"), evicting the
//! least-recently-used one when the pool grows past [`MIN_WINDOWS`] and
//! nothing smaller will do. Each of a fixed number of small-integer
//! "contexts" remembers the window it last touched, so that repeat lookups
//! from the same call site (a parser walking a single struct field, say)
//! cost an array read, not a scan.
//!
//! # Why windows, not pages
//!
//! Mapping a single requested byte range exactly would thrash: a second
//! access six bytes later would need its own `mmap`/`munmap` pair. Instead
//! every miss maps a window around the request (the 8 MiB default, padded
//! symmetrically, clamped to the file's extent), so that nearby requests
//! land inside an already-live mapping.
//!
//! # Fault recovery
//!
//! If the backing file is truncated out from under a mapping, the next
//! access raises `SIGBUS`. Installing the signal handler itself is out of
//! scope for this crate; instead, [`Cache::process_sigbus`] drains a
//! [`SigbusQueue`] of faulting addresses an external handler pushed into
//! (see [`AtomicRingQueue`]), finds which registered file each address
//! belongs to, marks it poisoned, and replaces its windows' backing pages
//! with anonymous zeroed memory at the same address, so that any pointer
//! already handed out keeps pointing at *something*, just not the file
//! anymore.
//!
//! # Example
//!
//! ```no_run
//! use std::os::fd::AsRawFd;
//! use wmcache::{Cache, EmptyQueue};
//!
//! let file = std::fs::File::open("data.bin")?;
//! let file_size = file.metadata()?.len();
//!
//! let mut cache: Cache = Cache::new();
//! let handle = cache.add_fd(file.as_raw_fd(), libc::PROT_READ);
//!
//! let ptr = cache.get(handle, /* context_id */ 0, false, 0, 64, Some(file_size))?;
//! // SAFETY: `ptr` is valid for 64 bytes until the next `get` call on a
//! // different context/window evicts it, since `keep_always` was false.
//! let bytes = unsafe { std::slice::from_raw_parts(ptr, 64) };
//! assert_eq!(bytes.len(), 64);
//!
//! cache.free_fd(handle, &EmptyQueue)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Concurrency
//!
//! `Cache` keeps no internal locks and is not `Send`/`Sync`: it is meant for
//! a single-threaded cooperative scheduler (callbacks, an event loop, a
//! single io_uring-style reactor), not for sharing across OS threads. Share
//! one across cooperative tasks on the same thread with `Rc<RefCell<_>>`.

#![deny(missing_docs)]

mod align;
mod cache;
mod error;
mod fdhandle;
mod sigbus;
mod sys;
mod window;

pub use cache::{CacheStats, WindowSlice, MIN_WINDOWS};
pub use error::CacheError;
pub use fdhandle::FileId;
pub use sigbus::{AtomicRingQueue, EmptyQueue, SigbusQueue};
pub use window::WindowId;

/// The bounded pool of mmap windows. See the [crate-level docs](crate) for
/// an overview and [`cache::Cache`] for the full method listing.
pub use cache::Cache;

/// Returns the page size (or allocation granularity) new windows are
/// aligned to on this platform.
pub fn page_size() -> usize {
    *align::PAGE_SIZE
}
