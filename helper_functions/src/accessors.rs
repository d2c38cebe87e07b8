use anyhow::{ensure, Result};
use itertools::Itertools as _;
use types::{
    config::Config,
    phase0::{
        containers::{AttestationData, BeaconState},
        primitives::{Epoch, Gwei, Shard, Slot, ValidatorIndex, H256},
    },
};

use crate::{committees::ChainCommittees, error::Error, misc, predicates};

#[must_use]
pub const fn get_current_epoch(config: &Config, state: &BeaconState) -> Epoch {
    misc::compute_epoch_at_slot(config, state.slot)
}

#[must_use]
pub const fn get_previous_epoch(config: &Config, state: &BeaconState) -> Epoch {
    get_current_epoch(config, state).saturating_sub(1)
}

/// Root of the latest block at or before `slot`.
///
/// Only slots strictly before `state.slot` and still inside the historical root window can be
/// looked up.
pub fn get_block_root_at_slot(config: &Config, state: &BeaconState, slot: Slot) -> Result<H256> {
    let history_length = config.slots_per_historical_root.get();

    ensure!(
        slot < state.slot && state.slot <= slot.saturating_add(history_length),
        Error::SlotOutOfRange,
    );

    let index = usize::try_from(slot % history_length)?;

    state
        .latest_block_roots
        .get(index)
        .copied()
        .ok_or_else(|| Error::SlotOutOfRange.into())
}

pub fn get_block_root(config: &Config, state: &BeaconState, epoch: Epoch) -> Result<H256> {
    get_block_root_at_slot(config, state, misc::compute_start_slot_at_epoch(config, epoch))
}

/// Root of the block `state` was produced by.
///
/// The header stored in a post-block state has a zero state root until the next slot is
/// processed, so the root of `state` itself is filled in.
pub fn latest_block_root(state: &BeaconState) -> Result<H256> {
    let mut header = state.latest_block_header;

    if header.state_root.is_zero() {
        header.state_root = misc::state_root(state)?;
    }

    misc::header_root(&header)
}

#[must_use]
pub fn get_active_validator_indices(state: &BeaconState, epoch: Epoch) -> Vec<ValidatorIndex> {
    (0..)
        .zip(&state.validator_registry)
        .filter(|(_, validator)| predicates::is_active_validator(validator, epoch))
        .map(|(index, _)| index)
        .collect()
}

pub fn get_balance(state: &BeaconState, validator_index: ValidatorIndex) -> Result<Gwei> {
    usize::try_from(validator_index)
        .ok()
        .and_then(|index| state.validator_balances.get(index))
        .copied()
        .ok_or_else(|| Error::ValidatorIndexOutOfBounds { validator_index }.into())
}

pub fn get_effective_balance(
    config: &Config,
    state: &BeaconState,
    validator_index: ValidatorIndex,
) -> Result<Gwei> {
    Ok(get_balance(state, validator_index)?.min(config.max_effective_balance))
}

pub fn get_total_balance(
    config: &Config,
    state: &BeaconState,
    validator_indices: impl IntoIterator<Item = ValidatorIndex>,
) -> Result<Gwei> {
    validator_indices
        .into_iter()
        .map(|validator_index| get_effective_balance(config, state, validator_index))
        .fold_ok(0, Gwei::saturating_add)
}

pub fn get_crosslink_committee(
    config: &Config,
    state: &BeaconState,
    slot: Slot,
    shard: Shard,
) -> Result<Vec<ValidatorIndex>> {
    let committee = ChainCommittees::new(config)
        .crosslink_committees_at_slot(state, slot)?
        .into_iter()
        .find(|committee| committee.shard == shard)
        .ok_or(Error::NoCommitteeForShard { slot, shard })?
        .committee;

    Ok(committee)
}

/// Committee members whose bits are set in `bitfield`, in committee order.
pub fn get_attesting_indices(
    config: &Config,
    state: &BeaconState,
    data: &AttestationData,
    bitfield: &[u8],
) -> Result<Vec<ValidatorIndex>> {
    let committee = get_crosslink_committee(config, state, data.slot, data.shard)?;

    ensure!(
        predicates::is_valid_bitfield(bitfield, committee.len()),
        Error::AggregationBitfieldInvalid {
            committee_length: committee.len(),
        },
    );

    let attesters = committee
        .into_iter()
        .enumerate()
        .filter(|(position, _)| misc::get_bitfield_bit(bitfield, *position))
        .map(|(_, validator_index)| validator_index)
        .collect();

    Ok(attesters)
}
