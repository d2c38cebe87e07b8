use derive_more::From;
use serde::{Deserialize, Serialize};

pub use ethereum_types::H256;

pub type Epoch = u64;
pub type Gwei = u64;
pub type Shard = u64;
pub type Slot = u64;
pub type UnixSeconds = u64;
pub type ValidatorIndex = u64;

/// Opaque signature bytes.
///
/// Signatures are never decompressed or checked here. Verification goes through
/// `helper_functions::verifier::Verifier`.
#[derive(Clone, PartialEq, Eq, Hash, Default, Debug, Deserialize, Serialize, From)]
#[serde(transparent)]
pub struct SignatureBytes(Vec<u8>);

impl SignatureBytes {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for SignatureBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for SignatureBytes {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}
