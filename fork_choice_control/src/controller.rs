use std::sync::Arc;

use anyhow::Result;
use arc_swap::ArcSwap;
use helper_functions::misc;
use log::{debug, info};
use parking_lot::Mutex;
use prometheus_metrics::Metrics;
use tokio_util::sync::CancellationToken;
use types::{
    config::Config,
    nonstandard::ChainHead,
    phase0::{
        containers::{AttestationTarget, BeaconBlock, BeaconState},
        primitives::{Slot, H256},
    },
};

use crate::{
    block_processor::StateTransition,
    error::{Error, Rejection},
    fork_choice::{self, Vote},
    storage::{ChainStore, Error as StorageError},
};

/// Sole writer of the chain head.
///
/// Commits and reorganizations run one at a time inside the commit section. The mutex guarding
/// it also owns the slot cursor, so the cursor can only change together with the head. Readers
/// get a consistent [`ChainHead`] snapshot without taking the lock.
pub struct Controller<S, T> {
    chain_config: Arc<Config>,
    store: S,
    transition: T,
    anchor_root: H256,
    head: ArcSwap<ChainHead>,
    current_slot: Mutex<Slot>,
    metrics: Option<Arc<Metrics>>,
}

impl<S: ChainStore, T: StateTransition> Controller<S, T> {
    /// Stores the anchor block and its post-state and makes the anchor the chain head.
    pub fn new(
        chain_config: Arc<Config>,
        store: S,
        transition: T,
        anchor_block: Arc<BeaconBlock>,
        anchor_state: Arc<BeaconState>,
        metrics: Option<Arc<Metrics>>,
    ) -> Result<Self> {
        let anchor_root = misc::block_root(&anchor_block)?;

        store.save_block(anchor_root, &anchor_block)?;

        store.save_attestation_target(AttestationTarget {
            slot: anchor_block.slot,
            block_root: anchor_root,
            parent_root: anchor_block.parent_root,
        })?;

        store.update_chain_head(anchor_root, &anchor_block, &anchor_state)?;

        let anchor_slot = anchor_block.slot;

        if let Some(metrics) = metrics.as_ref() {
            metrics.set_head_slot(anchor_slot);
        }

        Ok(Self {
            chain_config,
            store,
            transition,
            anchor_root,
            head: ArcSwap::from_pointee(ChainHead::new(anchor_root, anchor_block, anchor_state)),
            current_slot: Mutex::new(anchor_slot),
            metrics,
        })
    }

    #[must_use]
    pub fn head(&self) -> Arc<ChainHead> {
        self.head.load_full()
    }

    #[must_use]
    pub const fn anchor_root(&self) -> H256 {
        self.anchor_root
    }

    #[must_use]
    pub fn current_slot(&self) -> Slot {
        *self.current_slot.lock()
    }

    /// Moves the slot cursor without touching the head.
    ///
    /// Used when initial sync reaches its terminal block.
    pub fn set_current_slot(&self, slot: Slot) {
        *self.current_slot.lock() = slot;
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Validates `block` against the current head and makes it the new head.
    ///
    /// The block and its attestation target are stored before the transition is attempted and
    /// are left in place if it fails. Storage writes are idempotent, so delivering the block
    /// again retries the commit.
    pub fn validate_and_commit(
        &self,
        block: Arc<BeaconBlock>,
        cancellation: &CancellationToken,
    ) -> Result<(), Error> {
        let timer = self
            .metrics
            .as_ref()
            .map(|metrics| metrics.block_commit_times.start_timer());

        let result = self.commit(block, cancellation);

        if result.is_ok() {
            prometheus_metrics::stop_and_record(timer);
        } else {
            prometheus_metrics::stop_and_discard(timer);
        }

        result
    }

    fn commit(
        &self,
        block: Arc<BeaconBlock>,
        cancellation: &CancellationToken,
    ) -> Result<(), Error> {
        let block_root = misc::block_root(&block).map_err(Error::invalid)?;

        let snapshot = self.head.load_full();

        let finalized_slot = misc::compute_start_slot_at_epoch(
            &self.chain_config,
            snapshot.state.finalized_epoch,
        );

        if block.slot <= finalized_slot {
            return Err(Error::ValidationFailed {
                source: Rejection::NotAfterFinalizedSlot {
                    block_slot: block.slot,
                    finalized_slot,
                }
                .into(),
                benign: true,
            });
        }

        // A stored post-state at or below the head slot means the block was applied before.
        // Descendants of a reorganization target are above the head slot and may be replayed.
        if block.slot <= snapshot.slot()
            && self
                .store
                .contains_state(block_root)
                .map_err(Error::storage)?
        {
            return Err(Error::ValidationFailed {
                source: Rejection::AlreadyApplied {
                    block_root,
                    slot: block.slot,
                }
                .into(),
                benign: true,
            });
        }

        self.transition
            .verify(&block, &snapshot.state)
            .map_err(Error::invalid)?;

        info!("saving block (block_root: {block_root:?}, slot: {})", block.slot);

        let mut current_slot = self.current_slot.lock();

        ensure_not_cancelled(cancellation)?;

        let state = self.store.head_state().map_err(Error::storage)?;

        if let Err(source) = self.transition.verify(&block, &state) {
            let head_moved = self.head.load().block_root != snapshot.block_root;

            return Err(Error::ValidationFailed {
                source,
                benign: head_moved,
            });
        }

        ensure_not_cancelled(cancellation)?;

        self.store
            .save_block(block_root, &block)
            .map_err(Error::storage)?;

        self.store
            .save_attestation_target(AttestationTarget {
                slot: block.slot,
                block_root,
                parent_root: block.parent_root,
            })
            .map_err(Error::storage)?;

        let new_state = self
            .transition
            .apply(&block, &state)
            .map_err(Error::transition)?;

        self.transition
            .cleanup(&block)
            .map_err(Error::transition)?;

        ensure_not_cancelled(cancellation)?;

        self.store
            .update_chain_head(block_root, &block, &new_state)
            .map_err(Error::storage)?;

        let slot = block.slot;

        self.head.store(Arc::new(ChainHead::new(
            block_root,
            block,
            Arc::new(new_state),
        )));

        *current_slot = (*current_slot).max(slot);

        if let Some(metrics) = self.metrics.as_ref() {
            metrics.set_head_slot(slot);
        }

        debug!("block committed (block_root: {block_root:?}, slot: {slot})");

        Ok(())
    }

    /// Makes a previously applied block the chain head.
    ///
    /// The slot cursor is set to the slot of the block, so blocks after it can be committed
    /// again.
    pub fn reorganize(&self, block_root: H256) -> Result<(), Error> {
        let mut current_slot = self.current_slot.lock();

        let old_head = self.head.load_full();

        if old_head.block_root == block_root {
            return Ok(());
        }

        let (block, state) = self.stored_block_and_state(block_root).map_err(Error::storage)?;

        self.store
            .update_chain_head(block_root, &block, &state)
            .map_err(Error::storage)?;

        let slot = block.slot;

        self.head.store(Arc::new(ChainHead::new(
            block_root,
            Arc::new(block),
            Arc::new(state),
        )));

        *current_slot = slot;

        if let Some(metrics) = self.metrics.as_ref() {
            metrics.beacon_reorgs_total.inc();
            metrics.set_head_slot(slot);
        }

        info!(
            "chain reorganized (old_head: {:?}, old_slot: {}, new_head: {block_root:?}, \
             new_slot: {slot})",
            old_head.block_root,
            old_head.slot(),
        );

        Ok(())
    }

    /// Runs LMD-GHOST from the justified block of the current head and reorganizes onto the
    /// result. Returns the root of the head afterwards.
    pub fn apply_fork_choice(&self, votes: &[Vote]) -> Result<H256, Error> {
        let head = self.head();

        let justified_root = if head.state.justified_root.is_zero() {
            self.anchor_root
        } else {
            head.state.justified_root
        };

        let new_head_root = fork_choice::lmd_ghost_head(&self.store, justified_root, votes)
            .map_err(Error::storage)?;

        if new_head_root != head.block_root {
            self.reorganize(new_head_root)?;
        }

        Ok(new_head_root)
    }

    fn stored_block_and_state(&self, block_root: H256) -> Result<(BeaconBlock, BeaconState)> {
        let block = self
            .store
            .block_by_root(block_root)?
            .ok_or(StorageError::BlockNotFound { block_root })?;

        let state = self
            .store
            .state_by_block_root(block_root)?
            .ok_or(StorageError::StateNotFound { block_root })?;

        Ok((block, state))
    }
}

fn ensure_not_cancelled(cancellation: &CancellationToken) -> Result<(), Error> {
    if cancellation.is_cancelled() {
        return Err(Error::Cancelled);
    }

    Ok(())
}
