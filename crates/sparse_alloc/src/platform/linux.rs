use std::{
    ffi::CString,
    fs::{File, OpenOptions},
    io,
    os::unix::{ffi::OsStrExt, io::AsRawFd},
    path::Path,
};

use tracing::trace;

use crate::{
    error::{Error, Result},
    range::ZeroRange,
};

use super::{ControlRequest, Platform, VolumeFlags};

// statfs(2) f_type values of filesystems that can't store holes.
const MSDOS_SUPER_MAGIC: u32 = 0x4d44;
const EXFAT_SUPER_MAGIC: u32 = 0x2011_bab0;
const ISOFS_SUPER_MAGIC: u32 = 0x9660;
const HFS_SUPER_MAGIC: u32 = 0x4244;
const HFSPLUS_SUPER_MAGIC: u32 = 0x482b;
const UDF_SUPER_MAGIC: u32 = 0x1501_3346;
const SQUASHFS_MAGIC: u32 = 0x7371_7368;
const ROMFS_MAGIC: u32 = 0x7275;
const CRAMFS_MAGIC: u32 = 0x28cd_3d45;

const NON_SPARSE_FILESYSTEMS: &[u32] = &[
    MSDOS_SUPER_MAGIC,
    EXFAT_SUPER_MAGIC,
    ISOFS_SUPER_MAGIC,
    HFS_SUPER_MAGIC,
    HFSPLUS_SUPER_MAGIC,
    UDF_SUPER_MAGIC,
    SQUASHFS_MAGIC,
    ROMFS_MAGIC,
    CRAMFS_MAGIC,
];

fn classify(err: io::Error) -> Error {
    match err.raw_os_error() {
        Some(libc::ENOSYS) => Error::FacilityUnavailable,
        Some(libc::EOPNOTSUPP) => Error::Unsupported,
        _ => Error::Io(err),
    }
}

pub(crate) fn flags_for_fs_type(fs_type: u32) -> VolumeFlags {
    if NON_SPARSE_FILESYSTEMS.contains(&fs_type) {
        VolumeFlags(0)
    } else {
        VolumeFlags(VolumeFlags::SUPPORTS_SPARSE_FILES)
    }
}

/// Sparse files on Linux: holes come for free from ftruncate, and
/// fallocate(PUNCH_HOLE) releases ranges that already hold data.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinuxPlatform;

impl LinuxPlatform {
    fn set_zero_data(&self, file: &File, range: ZeroRange) -> Result<()> {
        if range.is_empty() {
            return Ok(());
        }
        let old_len = file.metadata().map_err(classify)?.len();
        let end = range.end as u64;
        if end > old_len {
            file.set_len(end).map_err(classify)?;
        }

        // Everything past old_len is already a hole, only punch what was there before.
        let punch_end = end.min(old_len) as i64;
        if range.offset >= punch_end {
            return Ok(());
        }
        trace!(offset = range.offset, end = punch_end, "punching hole");
        let rc = unsafe {
            // SAFETY: plain syscall on a descriptor owned by `file`, which outlives the call.
            libc::fallocate(
                file.as_raw_fd(),
                libc::FALLOC_FL_PUNCH_HOLE | libc::FALLOC_FL_KEEP_SIZE,
                range.offset as libc::off_t,
                (punch_end - range.offset) as libc::off_t,
            )
        };
        if rc == -1 {
            return Err(classify(io::Error::last_os_error()));
        }
        Ok(())
    }
}

impl Platform for LinuxPlatform {
    type Handle = File;

    fn volume_flags(&self, root: &Path) -> Result<VolumeFlags> {
        let c_root = CString::new(root.as_os_str().as_bytes())
            .map_err(|e| Error::Io(io::Error::new(io::ErrorKind::InvalidInput, e)))?;
        let fs_type = unsafe {
            // SAFETY: c_root is a valid NUL-terminated string and stat is
            // fully written by statfs on success.
            let mut stat: libc::statfs = std::mem::zeroed();
            if libc::statfs(c_root.as_ptr(), &mut stat) == -1 {
                return Err(classify(io::Error::last_os_error()));
            }
            stat.f_type as u32
        };
        trace!(?root, fs_type, "queried volume");
        Ok(flags_for_fs_type(fs_type))
    }

    fn create_exclusive(&self, path: &Path) -> Result<File> {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(classify)
    }

    fn control(&self, handle: &mut File, request: ControlRequest) -> Result<()> {
        match request {
            // Every regular file on a hole-capable filesystem is already sparse.
            ControlRequest::SetSparse => Ok(()),
            ControlRequest::SetZeroData(range) => self.set_zero_data(handle, range),
        }
    }
}
