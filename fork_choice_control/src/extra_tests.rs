use std::{
    sync::{mpsc, Arc, Barrier},
    thread,
};

use anyhow::Result;
use helper_functions::{committees::ChainCommittees, misc, verifier::PresenceVerifier};
use nonzero_ext::nonzero;
use operation_pools::AttestationPool;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use types::{
    config::Config,
    phase0::{
        containers::{Attestation, AttestationData, BeaconBlock, BeaconState},
        primitives::{SignatureBytes, Slot, H256},
    },
};

use crate::{
    block_processor::{BlockProcessor, StateTransition},
    controller::Controller,
    error::{Error, ErrorKind, Rejection},
    fork_choice::{self, Vote},
    helpers::Context,
    storage::{ChainStore as _, Storage},
};

#[test]
fn commits_blocks_in_order() -> Result<()> {
    let context = Context::minimal()?;

    let (_, state_0) = context.genesis();
    let (block_1, state_1) = context.empty_block(&state_0, 1)?;
    let (block_3, state_3) = context.empty_block(&state_1, 3)?;

    context.on_valid_block(&block_1)?;
    assert_eq!(context.controller().current_slot(), 1);

    context.on_valid_block(&block_3)?;
    assert_eq!(context.controller().current_slot(), 3);

    let store = context.controller().store();

    assert_eq!(store.head_block_root()?, Some(misc::block_root(&block_3)?));
    assert_eq!(store.head_state()?, *state_3);
    assert_eq!(*context.head().state, *state_3);

    Ok(())
}

#[test]
fn block_in_finalized_slot_is_ignored() -> Result<()> {
    let context = Context::minimal()?;

    let (block_0, _) = context.genesis();

    let block = Arc::new(BeaconBlock {
        slot: 0,
        parent_root: misc::block_root(&block_0)?,
        ..BeaconBlock::default()
    });

    context.on_ignorable_block(&block);
    context.assert_head(&block_0)
}

#[test]
fn block_with_unknown_parent_is_invalid() -> Result<()> {
    let context = Context::minimal()?;

    let (block_0, state_0) = context.genesis();
    let (_, state_1) = context.empty_block(&state_0, 1)?;
    let (block_2, _) = context.empty_block(&state_1, 2)?;

    let error = context.on_invalid_block(&block_2);

    assert_eq!(error.kind(), ErrorKind::ValidationFailed);

    context.assert_head(&block_0)
}

#[test]
fn committed_block_is_ignored_when_delivered_again() -> Result<()> {
    let context = Context::minimal()?;

    let (_, state_0) = context.genesis();
    let (block_1, state_1) = context.empty_block(&state_0, 1)?;
    let (block_2, _) = context.empty_block(&state_1, 2)?;

    context.on_valid_block(&block_1)?;
    context.on_valid_block(&block_2)?;

    for block in [&block_2, &block_1] {
        let error = context.on_ignorable_block(block);
        let block_root = misc::block_root(block)?;

        assert!(matches!(
            error,
            Error::ValidationFailed { ref source, benign: true }
                if matches!(
                    source.downcast_ref::<Rejection>(),
                    Some(Rejection::AlreadyApplied { block_root: root, slot })
                        if *root == block_root && *slot == block.slot
                ),
        ));
    }

    context.assert_head(&block_2)?;
    assert_eq!(context.controller().current_slot(), 2);

    Ok(())
}

#[test]
fn attestation_from_far_future_is_invalid() -> Result<()> {
    let context = Context::minimal()?;

    let (block_0, state_0) = context.genesis();
    let (block_1, _) = context.empty_block(&state_0, 1)?;

    let committee = ChainCommittees::new(context.config())
        .crosslink_committees_at_slot(&state_0, u64::MAX)?
        .into_iter()
        .next()
        .expect("every slot has at least one committee");

    let mut aggregation_bitfield = misc::zeroed_bitfield(committee.committee.len())?;
    misc::set_bitfield_bit(&mut aggregation_bitfield, 0)?;

    let mut block = (*block_1).clone();

    block.body.attestations.push(Attestation {
        aggregation_bitfield,
        data: AttestationData {
            slot: u64::MAX,
            shard: committee.shard,
            ..AttestationData::default()
        },
        custody_bitfield: misc::zeroed_bitfield(committee.committee.len())?,
        aggregate_signature: SignatureBytes::from(b"signed".as_slice()),
    });

    let block = Arc::new(block);
    let error = context.on_invalid_block(&block);

    assert_eq!(error.kind(), ErrorKind::ValidationFailed);
    context.assert_head(&block_0)?;
    assert_eq!(context.controller().current_slot(), 0);

    let store = context.controller().store();

    assert!(store.block_by_root(misc::block_root(&block)?)?.is_none());

    Ok(())
}

#[test]
fn failed_transition_keeps_head_and_allows_retry() -> Result<()> {
    let context = Context::minimal()?;

    let (block_0, state_0) = context.genesis();
    let (block_1, _) = context.empty_block(&state_0, 1)?;

    let tampered = Arc::new(BeaconBlock {
        state_root: H256::repeat_byte(0xee),
        ..(*block_1).clone()
    });

    let tampered_root = misc::block_root(&tampered)?;
    let error = context.commit(&tampered).expect_err("state root is wrong");

    assert_eq!(error.kind(), ErrorKind::TransitionFailed);
    assert!(!error.is_benign());
    context.assert_head(&block_0)?;
    assert_eq!(context.controller().current_slot(), 0);

    // The raw block and its target are stored before the transition runs.
    let store = context.controller().store();

    assert!(store.block_by_root(tampered_root)?.is_some());
    assert!(store.attestation_target(tampered_root)?.is_some());
    assert!(!store.contains_state(tampered_root)?);

    context.on_valid_block(&block_1)
}

#[test]
fn cancelled_commit_releases_commit_section() -> Result<()> {
    let context = Context::minimal()?;

    let (block_0, state_0) = context.genesis();
    let (block_1, _) = context.empty_block(&state_0, 1)?;

    context.cancel();

    let error = context.commit(&block_1).expect_err("commit was cancelled");

    assert!(matches!(error, Error::Cancelled));
    assert!(error.is_benign());
    context.assert_head(&block_0)?;

    context
        .controller()
        .validate_and_commit(Arc::clone(&block_1), &CancellationToken::new())?;

    context.assert_head(&block_1)
}

#[test]
fn exactly_one_of_concurrent_siblings_is_committed() -> Result<()> {
    const SIBLINGS: Slot = 4;

    let context = Context::minimal()?;

    let (_, state_0) = context.genesis();

    let blocks = (1..=SIBLINGS)
        .map(|slot| Ok(context.empty_block(&state_0, slot)?.0))
        .collect::<Result<Vec<_>>>()?;

    let barrier = Barrier::new(blocks.len());
    let cancellation = CancellationToken::new();

    let results = thread::scope(|scope| {
        let handles = blocks
            .iter()
            .map(|block| {
                let barrier = &barrier;
                let cancellation = &cancellation;
                let controller = context.controller();

                scope.spawn(move || {
                    barrier.wait();
                    controller.validate_and_commit(Arc::clone(block), cancellation)
                })
            })
            .collect::<Vec<_>>();

        handles
            .into_iter()
            .map(|handle| handle.join().expect("commit thread should not panic"))
            .collect::<Vec<_>>()
    });

    let committed = blocks
        .iter()
        .zip(&results)
        .filter(|(_, result)| result.is_ok())
        .map(|(block, _)| block)
        .collect::<Vec<_>>();

    assert_eq!(committed.len(), 1);

    let winner = committed[0];

    context.assert_head(winner)?;
    assert_eq!(context.controller().current_slot(), winner.slot);

    for result in results {
        if let Err(error) = result {
            assert_eq!(error.kind(), ErrorKind::ValidationFailed);
        }
    }

    Ok(())
}

/// Blocks the first verification of a block at `gated_slot` until released.
struct GatedTransition {
    inner: BlockProcessor,
    gated_slot: Slot,
    gate: Mutex<Option<(mpsc::Sender<()>, mpsc::Receiver<()>)>>,
}

impl StateTransition for GatedTransition {
    fn apply(&self, block: &BeaconBlock, state: &BeaconState) -> Result<BeaconState> {
        self.inner.apply(block, state)
    }

    fn verify(&self, block: &BeaconBlock, state: &BeaconState) -> Result<()> {
        let result = self.inner.verify(block, state);

        if block.slot == self.gated_slot {
            let gate = self.gate.lock().take();

            if let Some((entered_tx, release_rx)) = gate {
                entered_tx.send(())?;
                release_rx.recv()?;
            }
        }

        result
    }

    fn cleanup(&self, block: &BeaconBlock) -> Result<()> {
        self.inner.cleanup(block)
    }
}

#[test]
fn head_advancing_during_validation_is_benign() -> Result<()> {
    let config = Arc::new(Config::minimal());
    let (genesis_block, genesis_state) = factory::min_genesis_state(&config)?;
    let (block_x, _) = factory::empty_block(&config, &genesis_state, 1)?;
    let (block_y, _) = factory::empty_block(&config, &genesis_state, 2)?;

    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();

    let transition = GatedTransition {
        inner: BlockProcessor::new(
            Arc::clone(&config),
            Arc::new(AttestationPool::new(Arc::clone(&config))),
            PresenceVerifier,
        ),
        gated_slot: block_y.slot,
        gate: Mutex::new(Some((entered_tx, release_rx))),
    };

    let controller = Controller::new(
        Arc::clone(&config),
        Storage::in_memory(),
        transition,
        genesis_block,
        genesis_state,
        None,
    )?;

    let cancellation = CancellationToken::new();

    let result_y = thread::scope(|scope| -> Result<_> {
        let handle_y =
            scope.spawn(|| controller.validate_and_commit(Arc::clone(&block_y), &cancellation));

        // Block Y has passed its first check against the genesis head.
        entered_rx.recv()?;

        controller.validate_and_commit(Arc::clone(&block_x), &cancellation)?;

        release_tx.send(())?;

        Ok(handle_y.join().expect("commit thread should not panic"))
    })?;

    let error = result_y.expect_err("head moved after block Y was checked");

    assert_eq!(error.kind(), ErrorKind::ValidationFailed);
    assert!(error.is_benign());
    assert_eq!(controller.head().block_root, misc::block_root(&block_x)?);
    assert_eq!(controller.current_slot(), block_x.slot);

    Ok(())
}

#[test]
fn replicas_converge_after_reorganizing_to_epoch_boundary() -> Result<()> {
    const BOUNDARY_SLOT: Slot = 7;
    const SHARED_HISTORY: Slot = 10;
    const LAST_SLOT: Slot = 14;

    let config = Config {
        slots_per_epoch: nonzero!(7_u64),
        ..Config::minimal()
    };

    let mut builder = Context::with_config(config.clone())?;
    let replica_a = Context::with_config(config.clone())?;
    let replica_b = Context::with_config(config)?;

    let (_, genesis_state) = builder.genesis();

    let mut blocks = vec![];
    let mut state = genesis_state;

    while state.slot < LAST_SLOT {
        let (block, post_state) = builder.attested_block(&state)?;
        blocks.push(block);
        state = post_state;
    }

    let block_at = |slot: Slot| &blocks[usize::try_from(slot - 1).expect("slot fits in usize")];

    assert!(blocks.iter().skip(1).all(|block| block.body.attestations.len() == 1));
    assert!(misc::is_epoch_start(replica_a.config(), BOUNDARY_SLOT));

    for slot in 1..=SHARED_HISTORY {
        replica_a.on_valid_block(block_at(slot))?;
        replica_b.on_valid_block(block_at(slot))?;
    }

    let boundary_root = misc::block_root(block_at(BOUNDARY_SLOT))?;
    let controller_a = replica_a.controller();

    // Replica A abandons its history after the boundary and builds a fork of its own.
    controller_a.reorganize(boundary_root)?;

    replica_a.assert_head(block_at(BOUNDARY_SLOT))?;
    assert_eq!(controller_a.current_slot(), BOUNDARY_SLOT);

    let boundary_state = Arc::clone(&replica_a.head().state);
    let (fork_block, fork_state) = replica_a.empty_block(&boundary_state, SHARED_HISTORY - 1)?;

    replica_a.on_valid_block(&fork_block)?;
    assert_ne!(*fork_state, *replica_b.head().state);

    // Both replicas then adopt the same chain built on the boundary block.
    controller_a.reorganize(boundary_root)?;

    for slot in BOUNDARY_SLOT + 1..=LAST_SLOT {
        replica_a.on_valid_block(block_at(slot))?;
    }

    for slot in SHARED_HISTORY + 1..=LAST_SLOT {
        replica_b.on_valid_block(block_at(slot))?;
    }

    let head_a = replica_a.head();
    let head_b = replica_b.head();

    assert_eq!(head_a.block_root, head_b.block_root);
    assert_eq!(head_a.state.validator_balances, head_b.state.validator_balances);
    assert_eq!(*head_a.state, *head_b.state);
    assert_eq!(misc::state_root(&head_a.state)?, misc::state_root(&head_b.state)?);
    assert_eq!(*head_a.state, *state);

    // Epoch processing has run, so the balances reflect attestation rewards and penalties.
    let (_, genesis_state) = replica_a.genesis();

    assert_ne!(head_a.state.validator_balances, genesis_state.validator_balances);

    Ok(())
}

#[test]
fn reorganizing_to_unknown_block_fails() -> Result<()> {
    let context = Context::minimal()?;

    let (block_0, _) = context.genesis();

    let error = context
        .controller()
        .reorganize(H256::repeat_byte(0x55))
        .expect_err("block is not stored");

    assert_eq!(error.kind(), ErrorKind::StorageFailed);
    assert!(!error.is_benign());

    context.assert_head(&block_0)
}

#[test]
fn fork_choice_moves_head_to_heaviest_branch() -> Result<()> {
    let context = Context::minimal()?;
    let controller = context.controller();

    let (block_0, state_0) = context.genesis();
    let (block_a1, state_a1) = context.empty_block(&state_0, 1)?;
    let (block_a2, _) = context.empty_block(&state_a1, 2)?;
    let (block_b3, _) = context.empty_block(&state_0, 3)?;

    context.on_valid_block(&block_a1)?;
    context.on_valid_block(&block_a2)?;

    controller.reorganize(misc::block_root(&block_0)?)?;
    assert_eq!(controller.current_slot(), 0);

    context.on_valid_block(&block_b3)?;

    let root_a2 = misc::block_root(&block_a2)?;
    let root_b3 = misc::block_root(&block_b3)?;

    let votes = [
        Vote {
            block_root: root_a2,
            weight: 20,
        },
        Vote {
            block_root: root_b3,
            weight: 10,
        },
    ];

    assert_eq!(controller.apply_fork_choice(&votes)?, root_a2);
    context.assert_head(&block_a2)?;
    assert_eq!(controller.current_slot(), 2);

    let votes = [Vote {
        block_root: root_b3,
        weight: 30,
    }];

    assert_eq!(controller.apply_fork_choice(&votes)?, root_b3);
    context.assert_head_root(root_b3);
    assert_eq!(controller.current_slot(), 3);

    Ok(())
}

#[test]
fn fork_choice_keeps_head_of_single_chain() -> Result<()> {
    let mut context = Context::minimal()?;

    let (_, mut state) = context.genesis();

    for _ in 0..3 {
        let (block, post_state) = context.attested_block(&state)?;
        context.on_valid_block(&block)?;
        state = post_state;
    }

    let head = context.head();
    let votes = fork_choice::latest_votes(context.config(), &head.state)?;

    assert!(!votes.is_empty());
    assert!(votes.iter().all(|vote| vote.weight > 0));

    assert_eq!(context.controller().apply_fork_choice(&votes)?, head.block_root);
    context.assert_head_root(head.block_root);

    Ok(())
}
