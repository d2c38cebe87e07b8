use anyhow::Result;
use ethereum_types::H256;
use serde::Serialize;
use sha2::{Digest as _, Sha256};
use tap::Pipe as _;

#[inline]
#[must_use]
pub fn hash_bytes(bytes: impl AsRef<[u8]>) -> H256 {
    H256(Sha256::digest(bytes).into())
}

#[inline]
#[must_use]
pub fn hash_256_64(a: H256, b: u64) -> H256 {
    Sha256::new()
        .chain_update(a)
        .chain_update(b.to_le_bytes())
        .finalize()
        .pipe(|output| H256(output.into()))
}

#[inline]
#[must_use]
pub fn hash_256_256(left: H256, right: H256) -> H256 {
    Sha256::new()
        .chain_update(left)
        .chain_update(right)
        .finalize()
        .pipe(|output| H256(output.into()))
}

/// Hashes the `bincode` encoding of `value`.
///
/// `bincode` writes fields in declaration order with fixed-width integers and length prefixes,
/// so equal values always produce equal roots.
pub fn hash_serialized(value: &impl Serialize) -> Result<H256> {
    let bytes = bincode::serialize(value)?;
    Ok(hash_bytes(bytes))
}
