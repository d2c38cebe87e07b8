use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use helper_functions::{accessors, misc};
use itertools::Itertools as _;
use types::{
    config::Config,
    phase0::{
        containers::{AttestationData, BeaconState, Crosslink},
        primitives::{Epoch, Shard, Slot, ValidatorIndex, H256},
    },
};

use crate::Error;

/// Runs on the last slot of every epoch, before the slot counter moves into the next one.
pub fn process_epoch(config: &Config, state: &mut BeaconState) -> Result<()> {
    let current_epoch = accessors::get_current_epoch(config, state);
    let attestations = current_epoch_attestations(config, state, current_epoch)?;

    process_justification_and_finalization(config, state, current_epoch, &attestations)?;
    process_crosslinks(config, state, current_epoch, &attestations)?;
    process_rewards_and_penalties(config, state, current_epoch, &attestations)?;

    // > Clear attestations included during the epoch
    state.latest_attestations.clear();

    Ok(())
}

fn current_epoch_attestations(
    config: &Config,
    state: &BeaconState,
    current_epoch: Epoch,
) -> Result<Vec<(AttestationData, Vec<ValidatorIndex>)>> {
    state
        .latest_attestations
        .iter()
        .filter(|pending| misc::compute_epoch_at_slot(config, pending.data.slot) == current_epoch)
        .map(|pending| {
            let attesters = accessors::get_attesting_indices(
                config,
                state,
                &pending.data,
                &pending.aggregation_bitfield,
            )?;

            Ok((pending.data.clone(), attesters))
        })
        .collect()
}

fn process_justification_and_finalization(
    config: &Config,
    state: &mut BeaconState,
    current_epoch: Epoch,
    attestations: &[(AttestationData, Vec<ValidatorIndex>)],
) -> Result<()> {
    let old_justified_epoch = state.justified_epoch;
    let old_justified_root = state.justified_root;

    state.previous_justified_epoch = old_justified_epoch;
    state.previous_justified_root = old_justified_root;

    // The epoch boundary block of epoch 0 is only reachable once the state has left slot 0.
    let Ok(boundary_root) = accessors::get_block_root(config, state, current_epoch) else {
        return Ok(());
    };

    let boundary_attesters = attestations
        .iter()
        .filter(|(data, _)| data.epoch_boundary_root == boundary_root)
        .flat_map(|(_, attesters)| attesters.iter().copied())
        .unique();

    let total_balance = accessors::get_total_balance(
        config,
        state,
        accessors::get_active_validator_indices(state, current_epoch),
    )?;

    let boundary_balance = accessors::get_total_balance(config, state, boundary_attesters)?;

    if total_balance == 0 || boundary_balance.saturating_mul(3) < total_balance.saturating_mul(2) {
        return Ok(());
    }

    state.justified_epoch = current_epoch;
    state.justified_root = boundary_root;

    // > Finalize the previous justified checkpoint if it is the direct ancestor epoch
    if old_justified_epoch + 1 == current_epoch {
        state.finalized_epoch = old_justified_epoch;
        state.finalized_root = old_justified_root;
    }

    Ok(())
}

fn process_crosslinks(
    config: &Config,
    state: &mut BeaconState,
    current_epoch: Epoch,
    attestations: &[(AttestationData, Vec<ValidatorIndex>)],
) -> Result<()> {
    let mut votes = BTreeMap::<(Slot, Shard, H256), BTreeSet<ValidatorIndex>>::new();

    for (data, attesters) in attestations {
        votes
            .entry((data.slot, data.shard, data.crosslink_data_root))
            .or_default()
            .extend(attesters);
    }

    for ((slot, shard, crosslink_data_root), attesters) in votes {
        let committee = accessors::get_crosslink_committee(config, state, slot, shard)?;
        let committee_balance = accessors::get_total_balance(config, state, committee)?;
        let attesting_balance = accessors::get_total_balance(config, state, attesters)?;

        if attesting_balance.saturating_mul(3) < committee_balance.saturating_mul(2) {
            continue;
        }

        *usize::try_from(shard)
            .ok()
            .and_then(|index| state.latest_crosslinks.get_mut(index))
            .ok_or(Error::ShardOutOfBounds { shard })? = Crosslink {
            epoch: current_epoch,
            crosslink_data_root,
        };
    }

    Ok(())
}

fn process_rewards_and_penalties(
    config: &Config,
    state: &mut BeaconState,
    current_epoch: Epoch,
    attestations: &[(AttestationData, Vec<ValidatorIndex>)],
) -> Result<()> {
    let attesters = attestations
        .iter()
        .flat_map(|(_, attesters)| attesters.iter().copied())
        .collect::<BTreeSet<_>>();

    let base_rewards = accessors::get_active_validator_indices(state, current_epoch)
        .into_iter()
        .map(|validator_index| {
            let effective_balance =
                accessors::get_effective_balance(config, state, validator_index)?;

            Ok((validator_index, effective_balance / config.base_reward_quotient))
        })
        .collect::<Result<Vec<_>>>()?;

    for (validator_index, base_reward) in base_rewards {
        let balance = usize::try_from(validator_index)
            .ok()
            .and_then(|index| state.validator_balances.get_mut(index))
            .ok_or(Error::ValidatorIndexOutOfBounds { validator_index })?;

        if attesters.contains(&validator_index) {
            *balance = balance.saturating_add(base_reward);
        } else {
            *balance = balance.saturating_sub(base_reward);
        }
    }

    Ok(())
}
