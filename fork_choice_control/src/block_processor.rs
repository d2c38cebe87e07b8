use std::sync::Arc;

use anyhow::Result;
use derive_more::Constructor;
use helper_functions::verifier::{PresenceVerifier, Verifier};
use operation_pools::AttestationPool;
use transition_functions::StateRootPolicy;
use types::{
    config::Config,
    phase0::containers::{BeaconBlock, BeaconState},
};

/// State transition seam used by [`Controller`].
///
/// `apply` must be a pure function of its inputs. Two replicas that apply the same blocks to
/// equal states end up with equal states.
///
/// [`Controller`]: crate::Controller
pub trait StateTransition {
    fn apply(&self, block: &BeaconBlock, state: &BeaconState) -> Result<BeaconState>;

    fn verify(&self, block: &BeaconBlock, state: &BeaconState) -> Result<()>;

    /// Releases resources tied to a block that has been applied.
    fn cleanup(&self, block: &BeaconBlock) -> Result<()>;
}

impl<T: StateTransition> StateTransition for Arc<T> {
    fn apply(&self, block: &BeaconBlock, state: &BeaconState) -> Result<BeaconState> {
        self.as_ref().apply(block, state)
    }

    fn verify(&self, block: &BeaconBlock, state: &BeaconState) -> Result<()> {
        self.as_ref().verify(block, state)
    }

    fn cleanup(&self, block: &BeaconBlock) -> Result<()> {
        self.as_ref().cleanup(block)
    }
}

#[derive(Constructor)]
pub struct BlockProcessor<V = PresenceVerifier> {
    chain_config: Arc<Config>,
    attestation_pool: Arc<AttestationPool>,
    verifier: V,
}

impl<V: Verifier> StateTransition for BlockProcessor<V> {
    fn apply(&self, block: &BeaconBlock, state: &BeaconState) -> Result<BeaconState> {
        let mut state = state.clone();

        transition_functions::state_transition(
            &self.chain_config,
            &mut state,
            block,
            StateRootPolicy::Verify,
            &self.verifier,
        )?;

        Ok(state)
    }

    fn verify(&self, block: &BeaconBlock, state: &BeaconState) -> Result<()> {
        transition_functions::verify_block(&self.chain_config, state, block, &self.verifier)
    }

    fn cleanup(&self, block: &BeaconBlock) -> Result<()> {
        self.attestation_pool.remove_included(block)?;
        self.attestation_pool.on_slot(block.slot);
        Ok(())
    }
}
