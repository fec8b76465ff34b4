use tempfile::TempDir;

use crate::{allocator::SparseAllocator, platform::NativePlatform};

use super::test_util::setup_test_logging;

fn tempdir() -> TempDir {
    setup_test_logging();
    TempDir::with_prefix("sparse_alloc_test").unwrap()
}

#[test]
fn test_existing_file_untouched() -> anyhow::Result<()> {
    let dir = tempdir();
    let path = dir.path().join("existing.img");
    let content: Vec<u8> = (0..512u32).map(|i| (i % 251) as u8).collect();
    std::fs::write(&path, &content)?;

    let a = SparseAllocator::new(NativePlatform);
    a.create_sparse(&path, 1024);
    a.create_sparse(&path, 1024);

    assert_eq!(std::fs::read(&path)?, content);
    Ok(())
}

#[test]
fn test_missing_parent_creates_nothing() {
    let dir = tempdir();
    let path = dir.path().join("no").join("such").join("dir.img");

    SparseAllocator::new(NativePlatform).create_sparse(&path, 4096);

    assert!(!path.exists());
}

#[cfg(target_os = "linux")]
mod linux {
    use std::os::unix::fs::MetadataExt;

    use super::*;

    const MIB: u64 = 1024 * 1024;

    #[test]
    fn test_large_file_is_sparse() -> anyhow::Result<()> {
        let dir = tempdir();
        let path = dir.path().join("new.img");

        let a = SparseAllocator::new(NativePlatform);
        a.create_sparse(&path, 100 * MIB);

        let meta = std::fs::metadata(&path)?;
        assert_eq!(meta.len(), 100 * MIB);
        // st_blocks is in 512-byte units regardless of the filesystem block size.
        assert!(meta.blocks() * 512 < 100 * MIB, "blocks={}", meta.blocks());
        assert!(a.is_enabled());
        Ok(())
    }

    #[test]
    fn test_zero_length_file() -> anyhow::Result<()> {
        let dir = tempdir();
        let path = dir.path().join("empty.img");

        SparseAllocator::new(NativePlatform).create_sparse(&path, 0);

        assert_eq!(std::fs::metadata(&path)?.len(), 0);
        Ok(())
    }

    #[test]
    fn test_reads_back_zeros_and_accepts_writes() -> anyhow::Result<()> {
        use std::io::{Read, Seek, SeekFrom, Write};

        let dir = tempdir();
        let path = dir.path().join("rw.img");
        crate::create_sparse(&path, 8 * MIB);

        let mut f = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)?;
        f.seek(SeekFrom::Start(4 * MIB))?;
        f.write_all(b"data")?;

        let mut buf = vec![0xffu8; 4096];
        f.seek(SeekFrom::Start(MIB))?;
        f.read_exact(&mut buf)?;
        assert!(buf.iter().all(|b| *b == 0));
        assert_eq!(f.metadata()?.len(), 8 * MIB);
        assert!(crate::sparse_supported());
        Ok(())
    }
}
