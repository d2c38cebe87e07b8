use std::sync::Arc;

use derive_more::Constructor;
use serde::{Deserialize, Serialize};

use crate::phase0::{
    containers::{BeaconBlock, BeaconState},
    primitives::{Shard, Slot, ValidatorIndex, H256},
};

/// The block and post-state a replica currently considers canonical.
///
/// Replaced as a whole. Never mutated in place.
#[derive(Clone, Debug, Constructor)]
pub struct ChainHead {
    pub block_root: H256,
    pub block: Arc<BeaconBlock>,
    pub state: Arc<BeaconState>,
}

impl ChainHead {
    #[must_use]
    pub fn slot(&self) -> Slot {
        self.block.slot
    }
}

#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
pub struct CommitteeAssignment {
    pub slot: Slot,
    pub shard: Shard,
    pub validator_index: ValidatorIndex,
    pub committee: Vec<ValidatorIndex>,
}

impl CommitteeAssignment {
    /// Position of the assigned validator inside its committee.
    #[must_use]
    pub fn committee_position(&self) -> Option<usize> {
        self.committee
            .iter()
            .position(|member| *member == self.validator_index)
    }
}
