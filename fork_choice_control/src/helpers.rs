use std::sync::Arc;

use anyhow::Result;
use helper_functions::{committees::ChainCommittees, misc, verifier::PresenceVerifier};
use operation_pools::AttestationPool;
use tokio_util::sync::CancellationToken;
use types::{
    config::Config,
    nonstandard::ChainHead,
    phase0::{
        containers::{BeaconBlock, BeaconState},
        primitives::{Epoch, Slot, H256},
    },
};
use validator::SlotAssignments;

use crate::{
    block_processor::BlockProcessor, controller::Controller, error::Error, storage::Storage,
};

pub type TestController = Controller<Storage, BlockProcessor>;

pub struct Context {
    config: Arc<Config>,
    controller: TestController,
    genesis_block: Arc<BeaconBlock>,
    genesis_state: Arc<BeaconState>,
    assignments: SlotAssignments,
    cancellation: CancellationToken,
}

impl Context {
    pub fn minimal() -> Result<Self> {
        Self::with_config(Config::minimal())
    }

    pub fn with_config(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let (genesis_block, genesis_state) = factory::min_genesis_state(&config)?;

        let block_processor = BlockProcessor::new(
            Arc::clone(&config),
            Arc::new(AttestationPool::new(Arc::clone(&config))),
            PresenceVerifier,
        );

        let controller = Controller::new(
            Arc::clone(&config),
            Storage::in_memory(),
            block_processor,
            Arc::clone(&genesis_block),
            Arc::clone(&genesis_state),
            None,
        )?;

        Ok(Self {
            config,
            controller,
            genesis_block,
            genesis_state,
            assignments: SlotAssignments::default(),
            cancellation: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub const fn controller(&self) -> &TestController {
        &self.controller
    }

    pub fn genesis(&self) -> (Arc<BeaconBlock>, Arc<BeaconState>) {
        (
            Arc::clone(&self.genesis_block),
            Arc::clone(&self.genesis_state),
        )
    }

    pub fn head(&self) -> Arc<ChainHead> {
        self.controller.head()
    }

    pub fn empty_block(
        &self,
        pre_state: &BeaconState,
        slot: Slot,
    ) -> Result<(Arc<BeaconBlock>, Arc<BeaconState>)> {
        factory::empty_block(&self.config, pre_state, slot)
    }

    /// Block in the next slot that carries the attestation due in the slot of `pre_state`.
    ///
    /// Committee assignments are looked up whenever `pre_state` enters a new epoch. Every
    /// genesis validator is assigned, and later assignments overwrite earlier ones in the same
    /// slot.
    pub fn attested_block(
        &mut self,
        pre_state: &BeaconState,
    ) -> Result<(Arc<BeaconBlock>, Arc<BeaconState>)> {
        let epoch = misc::compute_epoch_at_slot(&self.config, pre_state.slot);

        if misc::is_epoch_start(&self.config, pre_state.slot) {
            self.refresh_assignments(pre_state, epoch);
        }

        factory::next_block(&self.config, pre_state, &self.assignments)
    }

    pub fn commit(&self, block: &Arc<BeaconBlock>) -> Result<(), Error> {
        self.controller
            .validate_and_commit(Arc::clone(block), &self.cancellation)
    }

    pub fn on_valid_block(&self, block: &Arc<BeaconBlock>) -> Result<()> {
        self.commit(block)?;
        self.assert_head(block)
    }

    pub fn on_ignorable_block(&self, block: &Arc<BeaconBlock>) -> Error {
        let error = self
            .commit(block)
            .expect_err("block should be rejected as a benign failure");

        assert!(error.is_benign(), "unexpected error: {error}");

        error
    }

    pub fn on_invalid_block(&self, block: &Arc<BeaconBlock>) -> Error {
        let error = self
            .commit(block)
            .expect_err("block should be rejected as invalid");

        assert!(!error.is_benign(), "unexpected benign error: {error}");

        error
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn assert_head(&self, expected_block: &BeaconBlock) -> Result<()> {
        let head = self.head();

        assert_eq!(head.slot(), expected_block.slot);
        assert_eq!(head.block_root, misc::block_root(expected_block)?);
        assert_eq!(*head.block, *expected_block);

        Ok(())
    }

    pub fn assert_head_root(&self, expected_root: H256) {
        assert_eq!(self.head().block_root, expected_root);
    }

    fn refresh_assignments(&mut self, state: &BeaconState, epoch: Epoch) {
        let validator_count = factory::MIN_GENESIS_VALIDATOR_COUNT.get();

        self.assignments.refresh_epoch(
            &self.config,
            &ChainCommittees::new(&self.config),
            state,
            epoch,
            0..validator_count,
        );
    }
}
