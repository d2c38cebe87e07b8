use anyhow::{ensure, Result};
use derive_more::Constructor;
use itertools::Itertools as _;
use types::{
    config::Config,
    nonstandard::CommitteeAssignment,
    phase0::{
        consts::ZERO_HASH,
        containers::BeaconState,
        primitives::{Epoch, Shard, Slot, ValidatorIndex},
    },
};

use crate::{accessors, error::Error, misc};

pub trait CommitteeAssignmentProvider {
    fn assignment_for(
        &self,
        state: &BeaconState,
        slot: Slot,
        validator_index: ValidatorIndex,
    ) -> Result<CommitteeAssignment>;
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CrosslinkCommittee {
    pub shard: Shard,
    pub committee: Vec<ValidatorIndex>,
}

/// Deterministic committee derivation.
///
/// Active validators are ordered by a per-epoch hash of their index and split into
/// `committees_per_slot * SLOTS_PER_EPOCH` committees of nearly equal size. The ordering does
/// not depend on anything in the state except the registry, so replicas with the same registry
/// derive the same committees regardless of the blocks they have seen.
#[derive(Clone, Copy, Constructor)]
pub struct ChainCommittees<'config> {
    config: &'config Config,
}

impl ChainCommittees<'_> {
    #[must_use]
    pub fn committees_per_slot(self, active_validator_count: u64) -> u64 {
        let slots_per_epoch = self.config.slots_per_epoch.get();
        let max_per_slot = (self.config.shard_count.get() / slots_per_epoch).max(1);

        (active_validator_count / slots_per_epoch / self.config.target_committee_size.get())
            .clamp(1, max_per_slot)
    }

    pub fn crosslink_committees_at_slot(
        self,
        state: &BeaconState,
        slot: Slot,
    ) -> Result<Vec<CrosslinkCommittee>> {
        let epoch = misc::compute_epoch_at_slot(self.config, slot);
        let shuffled = Self::shuffled_active_indices(state, epoch);

        ensure!(!shuffled.is_empty(), Error::NoActiveValidators { epoch });

        let committees_per_slot = self.committees_per_slot(shuffled.len().try_into()?);
        let committees_per_epoch = committees_per_slot * self.config.slots_per_epoch.get();
        let first_committee =
            misc::slots_since_epoch_start(self.config, slot) * committees_per_slot;

        (first_committee..first_committee + committees_per_slot)
            .map(|committee_index| {
                let start = split_offset(shuffled.len(), committees_per_epoch, committee_index)?;
                let end = split_offset(shuffled.len(), committees_per_epoch, committee_index + 1)?;

                let shard = epoch
                    .wrapping_mul(committees_per_epoch)
                    .wrapping_add(committee_index)
                    % self.config.shard_count.get();

                Ok(CrosslinkCommittee {
                    shard,
                    committee: shuffled[start..end].to_vec(),
                })
            })
            .collect()
    }

    fn shuffled_active_indices(state: &BeaconState, epoch: Epoch) -> Vec<ValidatorIndex> {
        let seed = hashing::hash_256_64(ZERO_HASH, epoch);

        accessors::get_active_validator_indices(state, epoch)
            .into_iter()
            .sorted_by_cached_key(|validator_index| hashing::hash_256_64(seed, *validator_index))
            .collect()
    }
}

impl CommitteeAssignmentProvider for ChainCommittees<'_> {
    fn assignment_for(
        &self,
        state: &BeaconState,
        slot: Slot,
        validator_index: ValidatorIndex,
    ) -> Result<CommitteeAssignment> {
        let CrosslinkCommittee { shard, committee } = self
            .crosslink_committees_at_slot(state, slot)?
            .into_iter()
            .find(|crosslink_committee| crosslink_committee.committee.contains(&validator_index))
            .ok_or(Error::ValidatorNotAssigned {
                slot,
                validator_index,
            })?;

        Ok(CommitteeAssignment {
            slot,
            shard,
            validator_index,
            committee,
        })
    }
}

fn split_offset(list_size: usize, chunks: u64, index: u64) -> Result<usize> {
    let list_size = u64::try_from(list_size)?;
    Ok(usize::try_from(list_size * index / chunks)?)
}
