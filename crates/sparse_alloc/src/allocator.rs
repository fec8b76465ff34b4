use std::{
    path::Path,
    sync::atomic::{AtomicBool, Ordering},
};

use tracing::{debug, trace};

use crate::{
    error::{Error, Result},
    platform::{ControlRequest, Platform},
    range::ZeroRange,
    volume,
};

/// How far a successful call got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Allocation {
    /// Marked sparse and sized to the requested length.
    Sparse,
    /// Marked sparse, zero length requested so nothing to declare.
    Empty,
    /// Marked sparse, but declaring the zero range failed. The file may be
    /// shorter than requested.
    ZeroRangeFailed,
}

/// Creates files that report a logical length without allocating it.
///
/// Owns the capability flag: once the platform says the sparse facility
/// doesn't exist at all, every later call returns immediately. The flag
/// never goes back to enabled.
pub struct SparseAllocator<P> {
    platform: P,
    supports_sparse: AtomicBool,
}

impl<P> SparseAllocator<P> {
    pub const fn new(platform: P) -> Self {
        Self {
            platform,
            supports_sparse: AtomicBool::new(true),
        }
    }

    /// False once the platform facility was found to be missing.
    pub fn is_enabled(&self) -> bool {
        self.supports_sparse.load(Ordering::Relaxed)
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    fn disable(&self) {
        // Racing callers may each probe once more before seeing this; that's fine.
        if self.supports_sparse.swap(false, Ordering::Relaxed) {
            debug!("sparse file facility unavailable, disabling sparse allocation");
        }
    }
}

impl<P: Platform> SparseAllocator<P> {
    /// Create a new file at `path` that reports `length` bytes while
    /// occupying as little disk as the volume allows.
    ///
    /// Best effort and silent. Afterwards there is either a sparse file of
    /// `length` bytes, a file the volume wouldn't fully sparsify, or no new
    /// file at all. An existing file is never touched. Callers must check
    /// the result on disk and fall back to ordinary creation.
    pub fn create_sparse(&self, path: impl AsRef<Path>, length: u64) {
        if !self.is_enabled() {
            return;
        }
        let path = path.as_ref();
        match self.try_create_sparse(path, length) {
            Ok(allocation) => debug!(?path, length, ?allocation, "created sparse file"),
            Err(e) if e.is_facility_absent() => self.disable(),
            Err(e) => trace!(?path, length, "skipping sparse allocation: {e:#}"),
        }
    }

    pub(crate) fn try_create_sparse(&self, path: &Path, length: u64) -> Result<Allocation> {
        let path = volume::absolute(path)?;
        let range = ZeroRange::from_start(length)?;

        let root = volume::volume_root(&path)?;
        if !self.volume_supports_sparse(&root)? {
            return Err(Error::VolumeLacksSparse(root));
        }

        // The handle is dropped, and so released, on every return below.
        let mut handle = self.platform.create_exclusive(&path)?;

        self.platform
            .control(&mut handle, ControlRequest::SetSparse)?;

        if range.is_empty() {
            return Ok(Allocation::Empty);
        }
        match self
            .platform
            .control(&mut handle, ControlRequest::SetZeroData(range))
        {
            Ok(()) => Ok(Allocation::Sparse),
            Err(e) if e.is_facility_absent() => Err(e),
            Err(e) => {
                trace!(?path, "error declaring zero range: {e:#}");
                Ok(Allocation::ZeroRangeFailed)
            }
        }
    }

    /// A failed query counts as "no support"; only a missing facility is an error.
    fn volume_supports_sparse(&self, root: &Path) -> Result<bool> {
        match self.platform.volume_flags(root) {
            Ok(flags) => Ok(flags.supports_sparse()),
            Err(e) if e.is_facility_absent() => Err(e),
            Err(e) => {
                trace!(?root, "error querying volume flags: {e:#}");
                Ok(false)
            }
        }
    }
}
