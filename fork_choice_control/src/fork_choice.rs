use std::collections::BTreeMap;

use anyhow::Result;
use helper_functions::accessors;
use types::{
    config::Config,
    phase0::{
        containers::BeaconState,
        primitives::{Gwei, Slot, ValidatorIndex, H256},
    },
};

use crate::storage::ChainStore;

/// Latest message of a single validator.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Vote {
    pub block_root: H256,
    pub weight: Gwei,
}

/// Latest votes of every validator that has an attestation in `state`.
///
/// A validator's vote is taken from its attestation with the highest slot. Votes are weighted by
/// effective balance.
pub fn latest_votes(config: &Config, state: &BeaconState) -> Result<Vec<Vote>> {
    let mut latest = BTreeMap::<ValidatorIndex, (Slot, H256)>::new();

    for pending in &state.latest_attestations {
        let attesters = accessors::get_attesting_indices(
            config,
            state,
            &pending.data,
            &pending.aggregation_bitfield,
        )?;

        for validator_index in attesters {
            let vote = (pending.data.slot, pending.data.beacon_block_root);

            latest
                .entry(validator_index)
                .and_modify(|existing| *existing = (*existing).max(vote))
                .or_insert(vote);
        }
    }

    latest
        .into_iter()
        .map(|(validator_index, (_, block_root))| {
            Ok(Vote {
                block_root,
                weight: accessors::get_effective_balance(config, state, validator_index)?,
            })
        })
        .collect()
}

/// LMD-GHOST starting at `justified_root`.
///
/// At every fork the child with the most weight behind it is chosen. Ties go to the child with
/// the larger root. Blocks that were stored but never applied are not candidates.
pub fn lmd_ghost_head(
    store: &impl ChainStore,
    justified_root: H256,
    votes: &[Vote],
) -> Result<H256> {
    let mut head = justified_root;

    loop {
        let mut best = None;

        for child in store.children(head)? {
            if !store.contains_state(child)? {
                continue;
            }

            let Some(target) = store.attestation_target(child)? else {
                continue;
            };

            let mut weight: Gwei = 0;

            for vote in votes {
                if ancestor_at_slot(store, vote.block_root, target.slot)? == Some(child) {
                    weight = weight.saturating_add(vote.weight);
                }
            }

            if best < Some((weight, child)) {
                best = Some((weight, child));
            }
        }

        match best {
            Some((_, child)) => head = child,
            None => return Ok(head),
        }
    }
}

fn ancestor_at_slot(
    store: &impl ChainStore,
    block_root: H256,
    slot: Slot,
) -> Result<Option<H256>> {
    let mut root = block_root;

    while let Some(target) = store.attestation_target(root)? {
        if target.slot <= slot {
            return Ok((target.slot == slot).then_some(root));
        }

        root = target.parent_root;
    }

    Ok(None)
}
