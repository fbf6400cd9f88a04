//! Thin wrapper around the raw `mmap`/`munmap`/`sysconf` syscalls used to
//! back a single window.
//!
//! File I/O (opening, truncating, locking) is not this crate's job: callers
//! hand the cache an already-open raw file descriptor via
//! [`crate::Cache::add_fd`], and the cache only ever maps and unmaps ranges
//! of it.

use std::io;
use std::ptr::NonNull;

/// Returns the page size (or allocation granularity) of the current
/// platform. Windows are always sized and offset to a multiple of this.
pub fn get_page_size() -> usize {
    // SAFETY: a simple call to the function with a valid option name.
    let result = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };

    if result <= 0 {
        // Unlikely: PAGESIZE is a mandatory POSIX.1 variable. Fall back to
        // the overwhelmingly common value rather than panicking.
        4096
    } else {
        result as usize
    }
}

/// Maps `len` bytes of `fd` at file offset `off`, shared, with the given
/// protection flags.
///
/// # Safety
///
/// `fd` must be a valid, open file descriptor and `off`/`len` must already
/// be page-aligned.
pub unsafe fn mmap_file(
    fd: libc::c_int,
    off: libc::off_t,
    len: usize,
    prot: libc::c_int,
) -> io::Result<NonNull<libc::c_void>> {
    let ptr = libc::mmap(
        std::ptr::null_mut(),
        len,
        prot,
        libc::MAP_SHARED,
        fd,
        off,
    );

    if ptr == libc::MAP_FAILED {
        Err(io::Error::last_os_error())
    } else {
        NonNull::new(ptr).ok_or_else(io::Error::last_os_error)
    }
}

/// Replaces the backing pages of an existing mapping with anonymous,
/// zeroed, private pages at the exact same address. `MAP_FIXED` keeps the
/// virtual address, and thus every outstanding pointer into it, stable.
///
/// # Safety
///
/// `ptr`/`len` must describe a mapping previously created by [`mmap_file`]
/// that has not yet been unmapped.
pub unsafe fn mmap_fixed_anon(
    ptr: NonNull<libc::c_void>,
    len: usize,
    prot: libc::c_int,
) -> io::Result<()> {
    let result = libc::mmap(
        ptr.as_ptr(),
        len,
        prot,
        libc::MAP_PRIVATE | libc::MAP_ANONYMOUS | libc::MAP_FIXED,
        -1,
        0,
    );

    if result == libc::MAP_FAILED {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Unmaps `len` bytes starting at `ptr`.
///
/// # Safety
///
/// `ptr`/`len` must describe a live mapping and no outstanding reference
/// into it may be used afterwards.
pub unsafe fn munmap(ptr: NonNull<libc::c_void>, len: usize) -> io::Result<()> {
    if libc::munmap(ptr.as_ptr(), len) == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_is_sane() {
        let page = get_page_size();
        assert!(page > 0);
        assert_eq!(page & (page - 1), 0, "page size must be a power of two");
    }
}
