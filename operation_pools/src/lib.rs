pub use crate::attestation_pool::AttestationPool;

mod attestation_pool;
