#![expect(clippy::module_name_repetitions)]

use anyhow::{ensure, Result};
use types::phase0::primitives::{SignatureBytes, ValidatorIndex, H256};

use crate::error::{Error, SignatureKind};

/// Signature checking seam.
///
/// Cryptographic verification is supplied by the embedder. The implementations in this module
/// either skip verification entirely or only check that a signature is present.
pub trait Verifier {
    fn verify_aggregate(
        &self,
        message: H256,
        signature_bytes: &SignatureBytes,
        signers: &[ValidatorIndex],
        signature_kind: SignatureKind,
    ) -> Result<()>;
}

impl<V: Verifier> Verifier for &V {
    #[inline]
    fn verify_aggregate(
        &self,
        message: H256,
        signature_bytes: &SignatureBytes,
        signers: &[ValidatorIndex],
        signature_kind: SignatureKind,
    ) -> Result<()> {
        (*self).verify_aggregate(message, signature_bytes, signers, signature_kind)
    }
}

#[derive(Clone, Copy, Default, Debug)]
pub struct NullVerifier;

impl Verifier for NullVerifier {
    #[inline]
    fn verify_aggregate(
        &self,
        _message: H256,
        _signature_bytes: &SignatureBytes,
        _signers: &[ValidatorIndex],
        _signature_kind: SignatureKind,
    ) -> Result<()> {
        Ok(())
    }
}

/// Rejects empty signatures and signatures without signers.
#[derive(Clone, Copy, Default, Debug)]
pub struct PresenceVerifier;

impl Verifier for PresenceVerifier {
    fn verify_aggregate(
        &self,
        _message: H256,
        signature_bytes: &SignatureBytes,
        signers: &[ValidatorIndex],
        signature_kind: SignatureKind,
    ) -> Result<()> {
        ensure!(
            !signature_bytes.is_empty() && !signers.is_empty(),
            Error::SignatureInvalid { signature_kind },
        );

        Ok(())
    }
}
