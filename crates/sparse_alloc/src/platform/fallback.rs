use std::{fs::File, path::Path};

use crate::error::{Error, Result};

use super::{ControlRequest, Platform, VolumeFlags};

/// Targets without a supported sparse file facility. The first call reports
/// it as absent, which turns the allocator off for the rest of the process.
#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackPlatform;

impl Platform for FallbackPlatform {
    type Handle = File;

    fn volume_flags(&self, _root: &Path) -> Result<VolumeFlags> {
        Err(Error::FacilityUnavailable)
    }

    fn create_exclusive(&self, _path: &Path) -> Result<File> {
        Err(Error::FacilityUnavailable)
    }

    fn control(&self, _handle: &mut File, _request: ControlRequest) -> Result<()> {
        Err(Error::FacilityUnavailable)
    }
}
