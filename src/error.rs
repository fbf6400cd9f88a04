//! Error taxonomy for the cache.

use std::fmt;
use std::io;

/// Failure modes a [`crate::Cache`] operation can return.
///
/// This intentionally does not cover the "unattributable SIGBUS" case (see
/// [`crate::Cache::process_sigbus`]): that one is not recoverable and is
/// handled by logging and aborting the process rather than by returning a
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheError {
    /// Structure allocation failed, or `mmap` failed with `ENOMEM` even
    /// after evicting the unused LRU tail.
    OutOfMemory,
    /// The request starts at or past the end of the file, per a `stat`
    /// passed in by the caller.
    AddrNotAvailable,
    /// The file handle is poisoned: it has seen a SIGBUS and every further
    /// lookup fails until it is freed and re-registered.
    Io,
    /// Any other `mmap` failure, returned verbatim as its raw `errno`.
    Errno(i32),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::OutOfMemory => write!(f, "out of memory"),
            CacheError::AddrNotAvailable => write!(f, "address not available"),
            CacheError::Io => write!(f, "file is poisoned by a prior SIGBUS"),
            CacheError::Errno(errno) => {
                write!(f, "mmap failed: {}", io::Error::from_raw_os_error(*errno))
            }
        }
    }
}

impl std::error::Error for CacheError {}

impl From<CacheError> for io::Error {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::OutOfMemory => io::Error::new(io::ErrorKind::OutOfMemory, err.to_string()),
            CacheError::AddrNotAvailable => {
                io::Error::new(io::ErrorKind::InvalidInput, err.to_string())
            }
            CacheError::Io => io::Error::new(io::ErrorKind::Other, err.to_string()),
            CacheError::Errno(errno) => io::Error::from_raw_os_error(errno),
        }
    }
}

/// Classifies a failed `mmap`/`munmap`/`mprotect` call: `ENOMEM` is treated
/// as recoverable resource exhaustion, anything else is returned verbatim.
pub(crate) fn classify_mmap_error(err: io::Error) -> CacheError {
    match err.raw_os_error() {
        Some(libc::ENOMEM) => CacheError::OutOfMemory,
        Some(errno) => CacheError::Errno(errno),
        None => CacheError::Errno(libc::EIO),
    }
}

pub(crate) type Result<T> = std::result::Result<T, CacheError>;
