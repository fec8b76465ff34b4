//! The OS primitives the allocator is built on.
//!
//! Everything platform specific lives behind [`Platform`], so the allocation
//! pipeline can be driven by a fake in tests.

use std::path::Path;

use crate::{error::Result, range::ZeroRange};

#[cfg(target_os = "linux")]
mod linux;
#[cfg(windows)]
mod windows;

#[cfg(not(any(target_os = "linux", windows)))]
mod fallback;

#[cfg(target_os = "linux")]
pub use self::linux::LinuxPlatform as NativePlatform;
#[cfg(windows)]
pub use self::windows::WindowsPlatform as NativePlatform;

#[cfg(not(any(target_os = "linux", windows)))]
pub use self::fallback::FallbackPlatform as NativePlatform;

/// Feature bits reported by a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VolumeFlags(pub u32);

impl VolumeFlags {
    /// Same value as Win32 FILE_SUPPORTS_SPARSE_FILES.
    pub const SUPPORTS_SPARSE_FILES: u32 = 0x0000_0040;

    pub fn supports_sparse(&self) -> bool {
        self.0 & Self::SUPPORTS_SPARSE_FILES == Self::SUPPORTS_SPARSE_FILES
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRequest {
    /// Mark the file as sparse-capable.
    SetSparse,
    /// Declare a byte range as zero without writing it.
    SetZeroData(ZeroRange),
}

pub trait Platform {
    /// Open handle to a freshly created file. Dropping it releases the OS handle.
    type Handle;

    /// Query the feature flags of the volume identified by `root`.
    fn volume_flags(&self, root: &Path) -> Result<VolumeFlags>;

    /// Create `path` for writing, failing if it already exists. No other
    /// opener may share the handle.
    fn create_exclusive(&self, path: &Path) -> Result<Self::Handle>;

    fn control(&self, handle: &mut Self::Handle, request: ControlRequest) -> Result<()>;
}

impl<P: Platform + ?Sized> Platform for &P {
    type Handle = P::Handle;

    fn volume_flags(&self, root: &Path) -> Result<VolumeFlags> {
        (**self).volume_flags(root)
    }

    fn create_exclusive(&self, path: &Path) -> Result<Self::Handle> {
        (**self).create_exclusive(path)
    }

    fn control(&self, handle: &mut Self::Handle, request: ControlRequest) -> Result<()> {
        (**self).control(handle, request)
    }
}
