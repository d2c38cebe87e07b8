use std::{collections::BTreeMap, sync::Arc};

use anyhow::Result;
use log::debug;
use parking_lot::Mutex;
use types::{
    config::Config,
    phase0::{
        containers::{Attestation, BeaconBlock},
        primitives::{Slot, H256},
    },
};

/// Attestations waiting to be included in a block.
///
/// Entries are keyed by the slot they attest to and the hash of the whole attestation, so
/// inserting the same attestation twice has no effect.
pub struct AttestationPool {
    config: Arc<Config>,
    attestations: Mutex<BTreeMap<(Slot, H256), Attestation>>,
}

impl AttestationPool {
    #[must_use]
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            attestations: Mutex::default(),
        }
    }

    /// Returns `true` if the attestation was not in the pool already.
    pub fn insert(&self, attestation: Attestation) -> Result<bool> {
        let key = (attestation.data.slot, hashing::hash_serialized(&attestation)?);
        let inserted = self.attestations.lock().insert(key, attestation).is_none();

        if inserted {
            debug!("attestation added to pool (slot: {}, root: {:?})", key.0, key.1);
        }

        Ok(inserted)
    }

    /// Removes every attestation contained in `block`. Returns the number of removed entries.
    pub fn remove_included(&self, block: &BeaconBlock) -> Result<usize> {
        let keys = block
            .body
            .attestations
            .iter()
            .map(|attestation| Ok((attestation.data.slot, hashing::hash_serialized(attestation)?)))
            .collect::<Result<Vec<_>>>()?;

        let mut attestations = self.attestations.lock();

        let removed = keys
            .iter()
            .filter_map(|key| attestations.remove(key))
            .count();

        if removed > 0 {
            debug!(
                "attestations included in block removed from pool (slot: {}, count: {removed})",
                block.slot,
            );
        }

        Ok(removed)
    }

    /// Discards attestations that can no longer be included in a block at `slot` or later.
    pub fn on_slot(&self, slot: Slot) {
        let oldest_includable = slot.saturating_sub(self.config.slots_per_epoch.get() - 1);

        let mut attestations = self.attestations.lock();
        *attestations = attestations.split_off(&(oldest_includable, H256::zero()));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.attestations.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attestations.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use types::phase0::{containers::AttestationData, primitives::SignatureBytes};

    use super::*;

    fn attestation(slot: Slot, shard: u64) -> Attestation {
        Attestation {
            aggregation_bitfield: vec![1],
            data: AttestationData {
                slot,
                shard,
                ..AttestationData::default()
            },
            custody_bitfield: vec![0],
            aggregate_signature: SignatureBytes::from(b"signed".as_slice()),
        }
    }

    fn pool() -> AttestationPool {
        AttestationPool::new(Arc::new(Config::minimal()))
    }

    #[test]
    fn duplicate_attestations_are_stored_once() -> Result<()> {
        let pool = pool();

        assert!(pool.insert(attestation(1, 0))?);
        assert!(!pool.insert(attestation(1, 0))?);
        assert!(pool.insert(attestation(1, 1))?);
        assert_eq!(pool.len(), 2);

        Ok(())
    }

    #[test]
    fn included_attestations_are_removed() -> Result<()> {
        let pool = pool();

        pool.insert(attestation(1, 0))?;
        pool.insert(attestation(2, 0))?;

        let mut block = BeaconBlock {
            slot: 3,
            ..BeaconBlock::default()
        };

        block.body.attestations = vec![attestation(1, 0), attestation(5, 5)];

        assert_eq!(pool.remove_included(&block)?, 1);
        assert_eq!(pool.len(), 1);
        assert!(!pool.insert(attestation(2, 0))?);

        Ok(())
    }

    #[test]
    fn old_attestations_are_discarded_on_slot() -> Result<()> {
        let pool = pool();

        for slot in [1, 4, 9] {
            pool.insert(attestation(slot, 0))?;
        }

        pool.on_slot(11);

        assert_eq!(pool.len(), 2);

        pool.on_slot(20);

        assert!(pool.is_empty());

        Ok(())
    }
}
