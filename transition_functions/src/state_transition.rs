use anyhow::{ensure, Result};
use helper_functions::{accessors, error::SignatureKind, misc, verifier::Verifier};
use types::{
    config::Config,
    phase0::containers::{BeaconBlock, BeaconState},
};

use crate::{block_processing, slot_processing, Error};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StateRootPolicy {
    Verify,
    Trust,
}

impl StateRootPolicy {
    pub fn verify(self, state: &BeaconState, block: &BeaconBlock) -> Result<()> {
        match self {
            Self::Verify => {
                let computed = misc::state_root(state)?;
                let in_block = block.state_root;

                ensure!(
                    computed == in_block,
                    Error::StateRootMismatch { computed, in_block },
                );
            }
            Self::Trust => {}
        }

        Ok(())
    }
}

/// Advances `state` to the slot of `block` and applies it.
///
/// `state` is left in an unspecified condition if this fails. Callers that need the pre-state
/// afterwards should pass a clone.
pub fn state_transition(
    config: &Config,
    state: &mut BeaconState,
    block: &BeaconBlock,
    state_root_policy: StateRootPolicy,
    verifier: impl Verifier,
) -> Result<()> {
    // > Process slots (including those with no blocks) since block
    slot_processing::process_slots(config, state, block.slot)?;

    // > Process block
    block_processing::process_block(config, state, block, verifier)?;

    // > Verify state root
    state_root_policy.verify(state, block)
}

/// Checks that `block` can extend the chain ending in `state` without changing anything.
///
/// This covers the block header, attestation inclusion windows and signatures. The rest of
/// attestation contents is checked by [`state_transition`] because it depends on the state
/// advanced to the slot of the block.
pub fn verify_block(
    config: &Config,
    state: &BeaconState,
    block: &BeaconBlock,
    verifier: impl Verifier,
) -> Result<()> {
    ensure!(
        block.slot > state.slot,
        Error::BlockNotNewerThanState {
            block_slot: block.slot,
            state_slot: state.slot,
        },
    );

    let latest_block_root = accessors::latest_block_root(state)?;

    ensure!(
        block.parent_root == latest_block_root,
        Error::ParentRootMismatch {
            in_state: latest_block_root,
            in_block: block.parent_root,
        },
    );

    block_processing::validate_attestation_count(config, block)?;

    for attestation in &block.body.attestations {
        block_processing::validate_inclusion_window(config, block.slot, attestation.data.slot)?;

        let attesters = accessors::get_attesting_indices(
            config,
            state,
            &attestation.data,
            &attestation.aggregation_bitfield,
        )?;

        verifier.verify_aggregate(
            misc::attestation_data_root(&attestation.data)?,
            &attestation.aggregate_signature,
            &attesters,
            SignatureKind::Attestation,
        )?;
    }

    Ok(())
}
