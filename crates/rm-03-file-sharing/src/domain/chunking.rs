//! Content addressing: chunks, metafile, metahash.

use shared_crypto::sha256;
use shared_types::{Hash, CHUNK_SIZE, HASH_SIZE, MAX_CHUNKS_PER_FILE};

use super::{FileError, Result};

/// Number of chunks in a file of `size` bytes.
pub fn chunk_count_for_size(size: u64) -> u64 {
    size.div_ceil(CHUNK_SIZE as u64)
}

/// Number of chunk hashes in a metafile of `len` bytes.
pub fn chunk_count_for_metafile(len: usize) -> u64 {
    (len / HASH_SIZE) as u64
}

/// Concatenated SHA-256 hashes of the chunks of `content`. Empty content
/// gives an empty metafile.
pub fn build_metafile(content: &[u8]) -> Vec<u8> {
    content
        .chunks(CHUNK_SIZE)
        .flat_map(|chunk| sha256(chunk))
        .collect()
}

/// SHA-256 of the metafile.
pub fn metahash_of(metafile: &[u8]) -> Hash {
    sha256(metafile)
}

/// Reject metafiles that cannot describe a file.
pub fn check_metafile(metafile: &[u8]) -> Result<()> {
    if metafile.len() % HASH_SIZE != 0 || metafile.len() / HASH_SIZE > MAX_CHUNKS_PER_FILE {
        return Err(FileError::InvalidMetafile(metafile.len()));
    }
    Ok(())
}

/// Hash of chunk `index` (1-based) listed in `metafile`.
pub fn chunk_hash(metafile: &[u8], index: u64) -> Option<Hash> {
    let start = (index.checked_sub(1)? as usize).checked_mul(HASH_SIZE)?;
    let bytes = metafile.get(start..start + HASH_SIZE)?;
    bytes.try_into().ok()
}

/// The bytes of chunk `index` (1-based) of `content`.
pub fn chunk_of(content: &[u8], index: u64) -> Option<&[u8]> {
    content.chunks(CHUNK_SIZE).nth(index.checked_sub(1)? as usize)
}
