//! Mapped view of the named shared region.
//!
//! The region is a plain file under a well-known path, memory-mapped shared
//! by the producer (read-write) and any consumers (read-only). Whichever side
//! opened a `MappedRegion` owns that mapping exclusively; teardown is an
//! explicit `unmap` or a drop.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapMut};
use tracing::debug;

use crate::error::{Error, Result};
use crate::transport::header::{region_size, HEADER_SIZE};

#[derive(Debug)]
enum Mapping {
    ReadWrite(MmapMut),
    ReadOnly(Mmap),
}

#[derive(Debug)]
pub struct MappedRegion {
    file: File,
    path: PathBuf,
    map: Option<Mapping>,
}

impl MappedRegion {
    /// Producer side: create the backing file sized for `width`x`height`,
    /// or adopt an existing one, truncating only if the size is wrong.
    ///
    /// Safe to call repeatedly with the same dimensions.
    pub fn create_or_resize(path: impl AsRef<Path>, width: i32, height: i32) -> Result<Self> {
        let path = path.as_ref();
        let total = region_size(width, height)? as u64;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        if file.metadata()?.len() != total {
            file.set_len(total)?;
        }

        // SAFETY: other processes map this file too; the transport's
        // write-then-verify protocol is what makes concurrent access sound.
        let map = unsafe { MmapMut::map_mut(&file)? };
        debug!(path = %path.display(), total, "shared region mapped read-write");

        Ok(Self {
            file,
            path: path.to_path_buf(),
            map: Some(Mapping::ReadWrite(map)),
        })
    }

    /// Consumer side: map the existing backing file at its current size.
    pub fn open_readonly(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().read(true).open(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                Error::RegionNotFound {
                    path: path.to_path_buf(),
                    source,
                }
            } else {
                Error::Io(source)
            }
        })?;

        let len = file.metadata()?.len();
        if len < HEADER_SIZE as u64 {
            return Err(Error::RegionTooSmall { len });
        }

        // SAFETY: see create_or_resize.
        let map = unsafe { Mmap::map(&file)? };
        debug!(path = %path.display(), len, "shared region mapped read-only");

        Ok(Self {
            file,
            path: path.to_path_buf(),
            map: Some(Mapping::ReadOnly(map)),
        })
    }

    /// Writer-side resize: unmap, truncate the backing file, remap.
    ///
    /// No-op when the region already has the right size. Readers caught
    /// mid-resize see a short region and skip that poll.
    pub fn resize(&mut self, width: i32, height: i32) -> Result<()> {
        let total = region_size(width, height)? as u64;
        if self.len() as u64 == total && self.file.metadata()?.len() == total {
            return Ok(());
        }

        // The old mapping must go before the file shrinks under it.
        self.map = None;
        self.file.set_len(total)?;
        // SAFETY: see create_or_resize.
        let map = unsafe { MmapMut::map_mut(&self.file)? };
        self.map = Some(Mapping::ReadWrite(map));
        debug!(path = %self.path.display(), total, "shared region resized");
        Ok(())
    }

    /// Reader-side remap, picking up a backing file whose size changed since
    /// the last mapping. The reported size may change again immediately; the
    /// caller treats any remaining mismatch as transient.
    pub fn refresh(&mut self) -> Result<()> {
        let len = self.file.metadata()?.len();
        if len < HEADER_SIZE as u64 || len == self.len() as u64 {
            return Ok(());
        }
        // SAFETY: see create_or_resize.
        let map = unsafe { Mmap::map(&self.file)? };
        self.map = Some(Mapping::ReadOnly(map));
        debug!(path = %self.path.display(), len, "shared region remapped");
        Ok(())
    }

    /// Currently mapped length in bytes; zero once unmapped.
    pub fn len(&self) -> usize {
        match &self.map {
            Some(Mapping::ReadWrite(m)) => m.len(),
            Some(Mapping::ReadOnly(m)) => m.len(),
            None => 0,
        }
    }

    pub fn as_slice(&self) -> Option<&[u8]> {
        match &self.map {
            Some(Mapping::ReadWrite(m)) => Some(&m[..]),
            Some(Mapping::ReadOnly(m)) => Some(&m[..]),
            None => None,
        }
    }

    pub fn as_mut_slice(&mut self) -> Option<&mut [u8]> {
        match &mut self.map {
            Some(Mapping::ReadWrite(m)) => Some(&mut m[..]),
            _ => None,
        }
    }

    /// Releases the mapping; idempotent. The backing file stays behind.
    pub fn unmap(&mut self) {
        self.map = None;
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("camlink-test-{}-{}", name, std::process::id()))
    }

    #[test]
    fn create_sizes_backing_file() {
        let path = temp_path("create");
        let region = MappedRegion::create_or_resize(&path, 8, 4).unwrap();
        assert_eq!(region.len(), HEADER_SIZE + 8 * 4 * 4);
        assert_eq!(fs::metadata(&path).unwrap().len(), region.len() as u64);
        drop(region);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn create_is_idempotent_for_same_dimensions() {
        let path = temp_path("idempotent");
        {
            let mut region = MappedRegion::create_or_resize(&path, 8, 4).unwrap();
            region.as_mut_slice().unwrap()[HEADER_SIZE] = 0xAB;
        }
        // Reopening with the same dimensions must not truncate the content.
        let region = MappedRegion::create_or_resize(&path, 8, 4).unwrap();
        assert_eq!(region.as_slice().unwrap()[HEADER_SIZE], 0xAB);
        drop(region);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn resize_changes_mapping_and_file() {
        let path = temp_path("resize");
        let mut region = MappedRegion::create_or_resize(&path, 8, 4).unwrap();
        region.resize(2, 2).unwrap();
        assert_eq!(region.len(), HEADER_SIZE + 2 * 2 * 4);
        assert_eq!(fs::metadata(&path).unwrap().len(), region.len() as u64);
        drop(region);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn open_readonly_missing_file() {
        let err = MappedRegion::open_readonly(temp_path("missing")).unwrap_err();
        assert!(matches!(err, Error::RegionNotFound { .. }));
    }

    #[test]
    fn open_readonly_rejects_undersized_file() {
        let path = temp_path("undersized");
        fs::write(&path, [0u8; 7]).unwrap();
        let err = MappedRegion::open_readonly(&path).unwrap_err();
        assert!(matches!(err, Error::RegionTooSmall { len: 7 }));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn readonly_mapping_is_not_writable() {
        let path = temp_path("readonly");
        drop(MappedRegion::create_or_resize(&path, 2, 2).unwrap());
        let mut region = MappedRegion::open_readonly(&path).unwrap();
        assert!(region.as_mut_slice().is_none());
        assert!(region.as_slice().is_some());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn refresh_tracks_grown_file() {
        let path = temp_path("refresh");
        let mut writer = MappedRegion::create_or_resize(&path, 2, 2).unwrap();
        let mut reader = MappedRegion::open_readonly(&path).unwrap();
        let small = reader.len();

        writer.resize(4, 4).unwrap();
        assert_eq!(reader.len(), small);
        reader.refresh().unwrap();
        assert_eq!(reader.len(), HEADER_SIZE + 4 * 4 * 4);

        drop(writer);
        drop(reader);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn unmap_is_idempotent() {
        let path = temp_path("unmap");
        let mut region = MappedRegion::create_or_resize(&path, 2, 2).unwrap();
        region.unmap();
        region.unmap();
        assert_eq!(region.len(), 0);
        assert!(region.as_slice().is_none());
        drop(region);
        fs::remove_file(&path).unwrap();
    }
}
