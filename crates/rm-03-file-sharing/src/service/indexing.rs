use shared_crypto::sha256;
use shared_types::{hash_to_hex, FileRecord, Hash, MAX_FILE_SIZE};
use tracing::{info, warn};

use super::FileService;
use crate::domain::{build_metafile, metahash_of, FileError, FileLocation, Result, SharedFile};
use crate::ports::check_file_name;

impl FileService {
    /// Index `name` from the shared directory and return the record a
    /// transaction can claim.
    pub fn index_local_file(&self, name: &str) -> Result<FileRecord> {
        check_file_name(name)?;
        let content = self.store.read_file(FileLocation::Shared, name)?;
        if content.len() > MAX_FILE_SIZE {
            return Err(FileError::TooLarge {
                size: content.len() as u64,
                limit: MAX_FILE_SIZE as u64,
            });
        }
        let metafile = build_metafile(&content);
        let metahash = metahash_of(&metafile);
        self.index
            .write()
            .insert_complete(SharedFile::local(name, metahash, metafile))?;

        info!("INDEXED file {} metahash {}", name, hash_to_hex(&metahash));
        self.network.frontend().push_indexed_file(name, &metahash);
        Ok(FileRecord::new(name, content.len() as i64, metahash))
    }

    /// Bring back a partial download of `name` described by `metafile`.
    /// Chunks on disk that do not match their hash are treated as missing.
    pub fn restore_download(&self, name: &str, metafile: Vec<u8>) -> Result<Hash> {
        check_file_name(name)?;
        let metahash = metahash_of(&metafile);
        let held: Vec<u64> = metafile
            .chunks(shared_types::HASH_SIZE)
            .zip(1u64..)
            .filter(|(expected, index)| {
                match self.store.read_chunk(FileLocation::Downloads, name, *index) {
                    Ok(chunk) => !chunk.is_empty() && sha256(&chunk) == **expected,
                    Err(e) => {
                        warn!("cannot read chunk {} of {}: {}", index, name, e);
                        false
                    }
                }
            })
            .map(|(_, index)| index)
            .collect();

        let file = SharedFile::restored(name, metafile, &held)?;
        info!(
            "RESTORED file {} with {}/{} chunks",
            name,
            held.len(),
            file.chunk_count()
        );
        self.index.write().insert_complete(file)?;
        Ok(metahash)
    }
}
