//! Streaming content hasher.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use blake3::Hasher;

use tidyfile_core::{ContentFingerprint, FileError};

/// Read size used when streaming a file through the hasher.
pub const HASH_CHUNK_SIZE: usize = 8 * 1024;

/// Compute the fingerprint of a file's full content.
///
/// Memory use is bounded by [`HASH_CHUNK_SIZE`] regardless of file size. A read
/// failure partway through returns an error; a partial digest is never returned.
pub fn hash_file(path: &Path) -> Result<ContentFingerprint, FileError> {
    let file = File::open(path).map_err(|e| FileError::io(path, e))?;
    hash_reader(file).map_err(|e| FileError::io(path, e))
}

/// Compute the fingerprint of everything `reader` yields.
pub fn hash_reader<R: Read>(mut reader: R) -> io::Result<ContentFingerprint> {
    let mut hasher = Hasher::new();
    let mut buffer = [0u8; HASH_CHUNK_SIZE];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(ContentFingerprint::new(*hasher.finalize().as_bytes()))
}

/// Fingerprint of an in-memory buffer. Equal to [`hash_file`] on the same bytes.
pub fn hash_bytes(bytes: &[u8]) -> ContentFingerprint {
    ContentFingerprint::new(*blake3::hash(bytes).as_bytes())
}
