//! # Directory File Store
//!
//! Shared files are read from one directory, downloads written to another.
//! Chunks are written in place, so a download may arrive out of order.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use shared_types::CHUNK_SIZE;

use crate::domain::{FileError, FileLocation, Result};
use crate::ports::{check_file_name, FileStore};

pub struct FsFileStore {
    shared_dir: PathBuf,
    downloads_dir: PathBuf,
}

impl FsFileStore {
    /// Use `shared_dir` and `downloads_dir`, creating them if needed.
    pub fn open(shared_dir: impl Into<PathBuf>, downloads_dir: impl Into<PathBuf>) -> Result<Self> {
        let store = Self {
            shared_dir: shared_dir.into(),
            downloads_dir: downloads_dir.into(),
        };
        fs::create_dir_all(&store.shared_dir)?;
        fs::create_dir_all(&store.downloads_dir)?;
        Ok(store)
    }

    pub fn shared_dir(&self) -> &Path {
        &self.shared_dir
    }

    pub fn downloads_dir(&self) -> &Path {
        &self.downloads_dir
    }

    fn path(&self, location: FileLocation, name: &str) -> Result<PathBuf> {
        check_file_name(name)?;
        let dir = match location {
            FileLocation::Shared => &self.shared_dir,
            FileLocation::Downloads => &self.downloads_dir,
        };
        Ok(dir.join(name))
    }

    fn open_existing(path: &Path, name: &str) -> Result<File> {
        File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => FileError::NotFound(name.to_owned()),
            _ => FileError::Io(e),
        })
    }
}

fn chunk_offset(index: u64) -> Result<u64> {
    index
        .checked_sub(1)
        .map(|i| i * CHUNK_SIZE as u64)
        .ok_or_else(|| FileError::Io(std::io::Error::new(ErrorKind::InvalidInput, "chunk 0")))
}

impl FileStore for FsFileStore {
    fn read_file(&self, location: FileLocation, name: &str) -> Result<Vec<u8>> {
        let path = self.path(location, name)?;
        let mut content = Vec::new();
        Self::open_existing(&path, name)?.read_to_end(&mut content)?;
        Ok(content)
    }

    fn read_chunk(&self, location: FileLocation, name: &str, index: u64) -> Result<Vec<u8>> {
        let path = self.path(location, name)?;
        let mut file = Self::open_existing(&path, name)?;
        file.seek(SeekFrom::Start(chunk_offset(index)?))?;
        let mut chunk = Vec::with_capacity(CHUNK_SIZE);
        file.take(CHUNK_SIZE as u64).read_to_end(&mut chunk)?;
        Ok(chunk)
    }

    fn create_download(&self, name: &str) -> Result<()> {
        File::create(self.path(FileLocation::Downloads, name)?)?;
        Ok(())
    }

    fn write_chunk(&self, name: &str, index: u64, data: &[u8]) -> Result<()> {
        let path = self.path(FileLocation::Downloads, name)?;
        let mut file = OpenOptions::new().create(true).write(true).truncate(false).open(path)?;
        file.seek(SeekFrom::Start(chunk_offset(index)?))?;
        file.write_all(data)?;
        Ok(())
    }
}
