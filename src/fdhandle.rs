//! One registered file descriptor.

use slotmap::new_key_type;

use crate::window::WindowId;

new_key_type! {
    /// Stable handle to a [`FileHandle`].
    pub struct FileId;
}

/// A file registered with the cache via [`crate::Cache::add_fd`].
///
/// Opening, creating, and closing the underlying descriptor is the caller's
/// responsibility; the cache only ever uses `fd` as the argument to `mmap`.
pub(crate) struct FileHandle {
    pub fd: libc::c_int,
    /// Authoritative protection flags for every window mapped against this
    /// file, fixed at first registration. A later `add_fd` call for the same
    /// descriptor with a different `prot` is ignored; first writer wins.
    pub prot: libc::c_int,
    /// Set once this file has seen a SIGBUS; every further lookup fails
    /// with `Io` until the handle is freed and re-registered.
    pub sigbus: bool,
    /// Head of the intrusive doubly linked list of windows mapped against
    /// this file (order is unspecified; it's a set, not a queue).
    pub windows: Option<WindowId>,
}

impl FileHandle {
    pub fn new(fd: libc::c_int, prot: libc::c_int) -> Self {
        Self {
            fd,
            prot,
            sigbus: false,
            windows: None,
        }
    }
}
