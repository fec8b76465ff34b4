use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Resolve `path` against the current directory. The file doesn't need to exist.
pub fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|source| Error::AbsolutePath {
        path: path.to_owned(),
        source,
    })
}

/// The path identifying the volume that will hold `path`, which must be absolute.
///
/// On Windows this is the drive or share root with a trailing separator
/// (`C:\`, `\\server\share\`), which is what GetVolumeInformationW expects.
#[cfg(windows)]
pub fn volume_root(path: &Path) -> Result<PathBuf> {
    use std::path::Component;

    let mut root = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => root.push(component),
            _ => break,
        }
    }
    if !root.has_root() {
        return Err(Error::NoVolumeRoot(path.to_owned()));
    }
    Ok(root)
}

/// The path identifying the volume that will hold `path`, which must be absolute.
///
/// Mount points can appear anywhere in a unix tree, so the containing
/// directory is used: querying it reaches whatever filesystem the new file
/// would be created on.
#[cfg(not(windows))]
pub fn volume_root(path: &Path) -> Result<PathBuf> {
    match path.parent() {
        Some(parent) if path.is_absolute() && parent.has_root() => Ok(parent.to_owned()),
        _ => Err(Error::NoVolumeRoot(path.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_resolves_relative() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(absolute(Path::new("rel.img")).unwrap(), cwd.join("rel.img"));
    }

    #[test]
    fn test_absolute_keeps_absolute() {
        let p = std::env::temp_dir().join("abs.img");
        assert_eq!(absolute(&p).unwrap(), p);
    }

    #[test]
    fn test_absolute_empty_path() {
        assert!(matches!(
            absolute(Path::new("")),
            Err(Error::AbsolutePath { .. })
        ));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_volume_root_unix() {
        assert_eq!(
            volume_root(Path::new("/home/u/rel.img")).unwrap(),
            Path::new("/home/u")
        );
        assert_eq!(volume_root(Path::new("/rel.img")).unwrap(), Path::new("/"));
        assert!(volume_root(Path::new("/")).is_err());
        assert!(volume_root(Path::new("rel.img")).is_err());
    }

    #[cfg(windows)]
    #[test]
    fn test_volume_root_windows() {
        assert_eq!(
            volume_root(Path::new(r"C:\data\disk.img")).unwrap(),
            Path::new(r"C:\")
        );
        assert_eq!(
            volume_root(Path::new(r"\\server\share\dir\disk.img")).unwrap(),
            Path::new(r"\\server\share\")
        );
        assert!(volume_root(Path::new(r"data\disk.img")).is_err());
    }
}
