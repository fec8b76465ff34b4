//! Best-effort sparse file allocation.
//!
//! [`create_sparse`] creates a file that reports a given length while using
//! almost no disk until data is written, on volumes that support sparse
//! files. It never reports failure: callers check what ended up on disk and
//! create the file the ordinary way if needed.
//!
//! ```no_run
//! sparse_alloc::create_sparse("disk.img", 100 * 1024 * 1024);
//! ```

use std::path::Path;

mod allocator;
mod error;
pub mod platform;
mod range;
mod volume;

#[cfg(test)]
mod tests;

pub use allocator::SparseAllocator;
pub use error::{Error, Result};
pub use platform::{ControlRequest, NativePlatform, Platform, VolumeFlags};
pub use range::ZeroRange;

static NATIVE: SparseAllocator<NativePlatform> = SparseAllocator::new(NativePlatform);

/// Create a new sparse file of `length` bytes at `path` using the process-wide
/// allocator. See [`SparseAllocator::create_sparse`].
pub fn create_sparse(path: impl AsRef<Path>, length: u64) {
    NATIVE.create_sparse(path, length)
}

/// Whether the process-wide allocator is still trying to create sparse files.
pub fn sparse_supported() -> bool {
    NATIVE.is_enabled()
}
