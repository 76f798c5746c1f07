//! Content hashing and duplicate flagging.
//!
//! The hash covers the original upload bytes, never a processed raster, so a
//! duplicate means "the same file was uploaded twice".

use std::collections::HashSet;

use sha2::{Digest, Sha256};

use crate::models::BatchItem;

/// SHA-256 of `bytes` as lower-case hex.
pub fn compute_content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Duplicate flag per hash, in order: the first occurrence of each hash is
/// unflagged, every later occurrence is flagged.
pub fn duplicate_flags<'a, I>(hashes: I) -> Vec<bool>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    hashes.into_iter().map(|h| !seen.insert(h)).collect()
}

/// Recompute `is_duplicate` over the whole slice.
pub fn flag_duplicates(items: &mut [BatchItem]) {
    let flags = duplicate_flags(items.iter().map(|i| i.content_hash.as_str()));
    for (item, flag) in items.iter_mut().zip(flags) {
        item.is_duplicate = flag;
    }
}
