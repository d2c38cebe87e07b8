//! Block and state construction for tests.
//!
//! Blocks are produced by running the state transition with the state root check disabled and
//! then filling in the root of the resulting state, so every block built here passes a full
//! transition from its pre-state.

use core::num::NonZeroU64;
use std::sync::Arc;

use anyhow::Result;
use helper_functions::{accessors, misc, verifier::NullVerifier};
use nonzero_ext::nonzero;
use transition_functions::StateRootPolicy;
use types::{
    config::Config,
    phase0::{
        containers::{Attestation, BeaconBlock, BeaconBlockBody, BeaconState},
        primitives::{SignatureBytes, Slot},
    },
};
use validator::{SlotAssignments, PLACEHOLDER_SIGNATURE};

pub const MIN_GENESIS_VALIDATOR_COUNT: NonZeroU64 = nonzero!(16_u64);

pub fn min_genesis_state(config: &Config) -> Result<(Arc<BeaconBlock>, Arc<BeaconState>)> {
    let (block, state) =
        interop::quick_start_beacon_state(config, 0, MIN_GENESIS_VALIDATOR_COUNT)?;

    Ok((Arc::new(block), Arc::new(state)))
}

pub fn empty_block(
    config: &Config,
    pre_state: &BeaconState,
    slot: Slot,
) -> Result<(Arc<BeaconBlock>, Arc<BeaconState>)> {
    block_with_attestations(config, pre_state, slot, [])
}

pub fn block_with_attestations(
    config: &Config,
    pre_state: &BeaconState,
    slot: Slot,
    attestations: impl IntoIterator<Item = Attestation>,
) -> Result<(Arc<BeaconBlock>, Arc<BeaconState>)> {
    let mut block = BeaconBlock {
        slot,
        parent_root: accessors::latest_block_root(pre_state)?,
        randao_reveal: SignatureBytes::from(PLACEHOLDER_SIGNATURE),
        eth1_data: pre_state.latest_eth1_data.clone(),
        body: BeaconBlockBody {
            attestations: attestations.into_iter().collect(),
        },
        signature: SignatureBytes::from(PLACEHOLDER_SIGNATURE),
        ..BeaconBlock::default()
    };

    let mut post_state = pre_state.clone();

    transition_functions::state_transition(
        config,
        &mut post_state,
        &block,
        StateRootPolicy::Trust,
        NullVerifier,
    )?;

    block.state_root = misc::state_root(&post_state)?;

    Ok((Arc::new(block), Arc::new(post_state)))
}

/// Attestation by the validator assigned to `pre_state.slot`, made on top of the latest block
/// in `pre_state`.
pub fn attestation_for_state_slot(
    config: &Config,
    pre_state: &BeaconState,
    assignments: &SlotAssignments,
) -> Result<Option<Attestation>> {
    let Some(assignment) = assignments.get(pre_state.slot) else {
        return Ok(None);
    };

    let parent_root = accessors::latest_block_root(pre_state)?;

    validator::build_attestation(config, pre_state, parent_root, assignment).map(Some)
}

/// Block in the slot after `pre_state` that includes the attestation of the validator assigned
/// to the slot of `pre_state`, if there is one.
pub fn next_block(
    config: &Config,
    pre_state: &BeaconState,
    assignments: &SlotAssignments,
) -> Result<(Arc<BeaconBlock>, Arc<BeaconState>)> {
    let attestation = attestation_for_state_slot(config, pre_state, assignments)?;

    block_with_attestations(config, pre_state, pre_state.slot + 1, attestation)
}
