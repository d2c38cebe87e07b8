use thiserror::Error;
use types::phase0::{
    containers::Crosslink,
    primitives::{Epoch, Shard, Slot, H256},
};

#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "attestation block root does not match state \
         (in_state: {in_state:?}, in_attestation: {in_attestation:?})"
    )]
    AttestationBlockRootMismatch { in_state: H256, in_attestation: H256 },
    #[error(
        "attestation epoch boundary root does not match state \
         (in_state: {in_state:?}, in_attestation: {in_attestation:?})"
    )]
    AttestationBoundaryRootMismatch { in_state: H256, in_attestation: H256 },
    #[error("attestation crosslink data root is not zero: {crosslink_data_root:?}")]
    AttestationCrosslinkDataRootNonZero { crosslink_data_root: H256 },
    #[error(
        "attestation crosslink for shard {shard} does not match state \
         (in_state: {in_state:?}, in_attestation: {in_attestation:?})"
    )]
    AttestationCrosslinkMismatch {
        shard: Shard,
        in_state: Crosslink,
        in_attestation: Crosslink,
    },
    #[error("attestation has no attesters")]
    AttestationHasNoAttesters,
    #[error(
        "attestation justified checkpoint is neither current nor previous \
         (epoch: {justified_epoch}, root: {justified_block_root:?})"
    )]
    AttestationJustifiedMismatch {
        justified_epoch: Epoch,
        justified_block_root: H256,
    },
    #[error(
        "attestation in slot {attestation_slot} is outside \
         inclusion range for state at slot {state_slot}"
    )]
    AttestationOutsideInclusionRange {
        state_slot: Slot,
        attestation_slot: Slot,
    },
    #[error("attestation custody bitfield is not a zeroed bitfield of committee length {committee_length}")]
    AttestationCustodyBitfieldInvalid { committee_length: usize },
    #[error("block is not newer than state ({block_slot} <= {state_slot})")]
    BlockNotNewerThanState { block_slot: Slot, state_slot: Slot },
    #[error("block slot does not match state ({block_slot} != {state_slot})")]
    BlockSlotMismatch { block_slot: Slot, state_slot: Slot },
    #[error("block roots history is shorter than SLOTS_PER_HISTORICAL_ROOT")]
    BlockRootsTooShort,
    #[error("parent root does not match latest block (in_state: {in_state:?}, in_block: {in_block:?})")]
    ParentRootMismatch { in_state: H256, in_block: H256 },
    #[error("shard {shard} has no crosslink in state")]
    ShardOutOfBounds { shard: Shard },
    #[error("target slot is not later than current slot ({target} <= {current})")]
    SlotNotLater { current: Slot, target: Slot },
    #[error("state root in block does not match state (computed: {computed:?}, in_block: {in_block:?})")]
    StateRootMismatch { computed: H256, in_block: H256 },
    #[error("block contains too many attestations ({count} > {maximum})")]
    TooManyAttestations { count: usize, maximum: u64 },
    #[error("validator balance index {validator_index} is out of bounds")]
    ValidatorIndexOutOfBounds { validator_index: u64 },
}
