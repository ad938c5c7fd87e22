use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Hex characters kept from the digest in batch archive names.
pub const BATCH_KEY_LEN: usize = 6;

/// Short content key for a set of input paths. A sorted copy is hashed, so
/// the key does not depend on the order the caller passed the files in.
/// Naming only; not a security digest.
pub fn batch_key<P: AsRef<Path>>(paths: &[P]) -> String {
    let mut sorted: Vec<PathBuf> = paths.iter().map(|p| p.as_ref().to_path_buf()).collect();
    sorted.sort();

    let joined = sorted
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join("\n");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..BATCH_KEY_LEN].to_string()
}
