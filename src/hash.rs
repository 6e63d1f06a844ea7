//! Streaming content hash.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::Error;

const BLOCK_SIZE: usize = 64 * 1024;

/// Hex-encoded SHA-256 of the file at `path`, read in fixed-size blocks.
pub fn sha256_file(path: impl AsRef<Path>) -> Result<String, Error> {
    let file = File::open(path.as_ref())?;
    sha256_reader(BufReader::with_capacity(BLOCK_SIZE, file))
}

/// Hex-encoded SHA-256 of everything `reader` yields.
pub fn sha256_reader<R: Read>(mut reader: R) -> Result<String, Error> {
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}
