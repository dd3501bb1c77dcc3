//! Page cache eviction
//!
//! Drops a file's cached pages before a timed read so that repeated runs
//! measure cold reads. Only Linux exposes this per file; elsewhere eviction
//! is a no-op and the caller is told nothing was evicted.

use std::io;
use std::path::Path;

/// Evict the page cache of `path`. Returns `true` when the kernel was asked
/// to drop the pages.
#[cfg(target_os = "linux")]
pub fn evict(path: &Path) -> io::Result<bool> {
    use std::fs::File;
    use std::os::unix::io::AsRawFd;

    let file = File::open(path)?;
    // Dirty pages are not dropped by DONTNEED
    file.sync_data()?;

    let ret = unsafe { libc::posix_fadvise(file.as_raw_fd(), 0, 0, libc::POSIX_FADV_DONTNEED) };
    if ret != 0 {
        return Err(io::Error::from_raw_os_error(ret));
    }
    Ok(true)
}

#[cfg(not(target_os = "linux"))]
pub fn evict(path: &Path) -> io::Result<bool> {
    std::fs::metadata(path)?;
    Ok(false)
}
