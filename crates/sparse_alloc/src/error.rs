use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("sparse file facility is not available on this platform")]
    FacilityUnavailable,

    #[error("operation not supported by this volume or file")]
    Unsupported,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("error resolving absolute path for {path:?}: {source:#}")]
    AbsolutePath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("can't determine the volume containing {0:?}")]
    NoVolumeRoot(PathBuf),

    #[error("volume {0:?} does not support sparse files")]
    VolumeLacksSparse(PathBuf),

    #[error("length {0} does not fit a signed 64-bit range")]
    LengthTooLarge(u64),

    #[error("invalid zero range: offset={offset} end={end}")]
    BadZeroRange { offset: i64, end: i64 },
}

impl Error {
    /// True if the OS facility itself is missing, as opposed to this one
    /// volume, file or call failing. Only these errors disable the allocator.
    pub fn is_facility_absent(&self) -> bool {
        matches!(self, Error::FacilityUnavailable)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_facility_unavailable_is_absent() {
        assert!(Error::FacilityUnavailable.is_facility_absent());
        assert!(!Error::Unsupported.is_facility_absent());
        assert!(!Error::LengthTooLarge(u64::MAX).is_facility_absent());
        assert!(!Error::VolumeLacksSparse("/".into()).is_facility_absent());
        assert!(
            !Error::Io(std::io::Error::from(std::io::ErrorKind::PermissionDenied))
                .is_facility_absent()
        );
    }
}
