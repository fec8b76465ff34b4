use std::{
    ffi::c_void,
    fs::{File, OpenOptions},
    io,
    os::windows::{ffi::OsStrExt, fs::OpenOptionsExt, io::AsRawHandle},
    path::Path,
};

use tracing::trace;
use windows::{
    Win32::Foundation::{
        ERROR_CALL_NOT_IMPLEMENTED, ERROR_INVALID_FUNCTION, ERROR_NOT_SUPPORTED, HANDLE,
    },
    Win32::Storage::FileSystem::{FILE_ATTRIBUTE_NORMAL, GetVolumeInformationW},
    Win32::System::IO::DeviceIoControl,
    Win32::System::Ioctl::{FILE_ZERO_DATA_INFORMATION, FSCTL_SET_SPARSE, FSCTL_SET_ZERO_DATA},
    core::PCWSTR,
};

use crate::{
    error::{Error, Result},
    range::ZeroRange,
};

use super::{ControlRequest, Platform, VolumeFlags};

fn classify(err: windows::core::Error) -> Error {
    let code = err.code();
    if code == ERROR_CALL_NOT_IMPLEMENTED.to_hresult() {
        Error::FacilityUnavailable
    } else if code == ERROR_INVALID_FUNCTION.to_hresult()
        || code == ERROR_NOT_SUPPORTED.to_hresult()
    {
        Error::Unsupported
    } else {
        Error::Io(io::Error::from(err))
    }
}

fn classify_io(err: io::Error) -> Error {
    match err.raw_os_error() {
        Some(code) if code == ERROR_CALL_NOT_IMPLEMENTED.0 as i32 => Error::FacilityUnavailable,
        Some(code)
            if code == ERROR_INVALID_FUNCTION.0 as i32 || code == ERROR_NOT_SUPPORTED.0 as i32 =>
        {
            Error::Unsupported
        }
        _ => Error::Io(err),
    }
}

fn device_io_control(file: &File, code: u32, input: Option<(*const c_void, u32)>) -> Result<()> {
    let handle = HANDLE(file.as_raw_handle());
    let (in_ptr, in_len) = match input {
        Some((ptr, len)) => (Some(ptr), len),
        None => (None, 0),
    };
    let mut returned = 0u32;
    unsafe {
        DeviceIoControl(
            handle,
            code,
            in_ptr,
            in_len,
            None,
            0,
            Some(&mut returned as *mut u32),
            None,
        )
    }
    .map_err(classify)
}

/// NTFS-style sparse files through FSCTL_SET_SPARSE and FSCTL_SET_ZERO_DATA.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsPlatform;

impl WindowsPlatform {
    fn set_zero_data(&self, file: &File, range: ZeroRange) -> Result<()> {
        if range.is_empty() {
            return Ok(());
        }
        // FSCTL_SET_ZERO_DATA doesn't move end of file. On a sparse file
        // extending it allocates nothing.
        let end = range.end as u64;
        if file.metadata().map_err(classify_io)?.len() < end {
            file.set_len(end).map_err(classify_io)?;
        }

        let info = FILE_ZERO_DATA_INFORMATION {
            FileOffset: range.offset,
            BeyondFinalZero: range.end,
        };
        trace!(offset = range.offset, end = range.end, "FSCTL_SET_ZERO_DATA");
        device_io_control(
            file,
            FSCTL_SET_ZERO_DATA,
            Some((
                &info as *const _ as *const c_void,
                std::mem::size_of_val(&info) as u32,
            )),
        )
    }
}

impl Platform for WindowsPlatform {
    type Handle = File;

    fn volume_flags(&self, root: &Path) -> Result<VolumeFlags> {
        let wide: Vec<u16> = root
            .as_os_str()
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();
        let mut flags = 0u32;
        unsafe {
            GetVolumeInformationW(
                PCWSTR(wide.as_ptr()),
                None,
                None,
                None,
                Some(&mut flags as *mut u32),
                None,
            )
        }
        .map_err(classify)?;
        trace!(?root, flags, "queried volume");
        Ok(VolumeFlags(flags))
    }

    fn create_exclusive(&self, path: &Path) -> Result<File> {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .share_mode(0)
            .attributes(FILE_ATTRIBUTE_NORMAL.0)
            .open(path)
            .map_err(classify_io)
    }

    fn control(&self, handle: &mut File, request: ControlRequest) -> Result<()> {
        match request {
            ControlRequest::SetSparse => device_io_control(handle, FSCTL_SET_SPARSE, None),
            ControlRequest::SetZeroData(range) => self.set_zero_data(handle, range),
        }
    }
}
