use anyhow::Result;
use helper_functions::{accessors, error::Error, misc};
use types::{
    config::Config,
    nonstandard::CommitteeAssignment,
    phase0::{
        consts::{GENESIS_SLOT, ZERO_HASH},
        containers::{Attestation, AttestationData, BeaconState},
        primitives::{SignatureBytes, H256},
    },
};

/// Signature bytes attached to attestations built without a signer.
pub const PLACEHOLDER_SIGNATURE: &[u8] = b"signed";

/// Builds the data a validator attests to at `assignment.slot`.
///
/// `pre_state` is the state immediately preceding the attestation and `parent_root` is the root
/// of the block that produced it. Attestations made on top of the genesis state use
/// [`ZERO_HASH`] as both their epoch boundary root and their justified root.
pub fn attestation_data(
    config: &Config,
    pre_state: &BeaconState,
    parent_root: H256,
    assignment: &CommitteeAssignment,
) -> Result<AttestationData> {
    let slot = assignment.slot;
    let epoch_start =
        misc::compute_start_slot_at_epoch(config, misc::compute_epoch_at_slot(config, slot));

    let (epoch_boundary_root, justified_block_root) = if pre_state.slot == GENESIS_SLOT {
        (ZERO_HASH, ZERO_HASH)
    } else if epoch_start == slot {
        (parent_root, pre_state.justified_root)
    } else {
        (
            accessors::get_block_root_at_slot(config, pre_state, epoch_start)?,
            pre_state.justified_root,
        )
    };

    let latest_crosslink = usize::try_from(assignment.shard)
        .ok()
        .and_then(|shard| pre_state.latest_crosslinks.get(shard))
        .cloned()
        .unwrap_or_default();

    Ok(AttestationData {
        slot,
        shard: assignment.shard,
        beacon_block_root: parent_root,
        epoch_boundary_root,
        crosslink_data_root: ZERO_HASH,
        latest_crosslink,
        justified_epoch: pre_state.justified_epoch,
        justified_block_root,
    })
}

/// Builds an unaggregated attestation by the validator in `assignment`.
pub fn build_attestation(
    config: &Config,
    pre_state: &BeaconState,
    parent_root: H256,
    assignment: &CommitteeAssignment,
) -> Result<Attestation> {
    let position = assignment
        .committee_position()
        .ok_or(Error::ValidatorNotAssigned {
            slot: assignment.slot,
            validator_index: assignment.validator_index,
        })?;

    let mut aggregation_bitfield = misc::zeroed_bitfield(assignment.committee.len())?;
    misc::set_bitfield_bit(&mut aggregation_bitfield, position)?;

    Ok(Attestation {
        aggregation_bitfield,
        data: attestation_data(config, pre_state, parent_root, assignment)?,
        custody_bitfield: misc::zeroed_bitfield(assignment.committee.len())?,
        aggregate_signature: SignatureBytes::from(PLACEHOLDER_SIGNATURE),
    })
}
