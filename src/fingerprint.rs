// Content fingerprints.
//
// A fingerprint is the lowercase hex SHA-1 of a file's bytes. The server keeps
// the same digest for every file in a document set, so equal fingerprints mean
// "this file is already there". It identifies content; it is not a security
// boundary.

use sha1::{Digest, Sha1};
use std::io::{self, Read};

/// Bytes read per step. Large files are never held in memory.
pub const CHUNK_SIZE: usize = 8192;

/// Hash everything `reader` yields, reading `CHUNK_SIZE` bytes at a time.
///
/// The reader is left at end of stream. Callers that want to send the same
/// bytes afterwards must rewind or reopen it.
pub fn fingerprint<R: Read + ?Sized>(reader: &mut R) -> io::Result<String> {
    fingerprint_chunked(reader, CHUNK_SIZE)
}

/// Same as [`fingerprint`] with an explicit chunk size.
pub fn fingerprint_chunked<R: Read + ?Sized>(
    reader: &mut R,
    chunk_size: usize,
) -> io::Result<String> {
    let mut hasher = Sha1::new();
    let mut buffer = vec![0u8; chunk_size.max(1)];
    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Fingerprint of an in-memory buffer.
pub fn fingerprint_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha1::digest(bytes))
}
