use anyhow::{ensure, Result};
use helper_functions::misc;
use types::{
    config::Config,
    phase0::{containers::BeaconState, primitives::Slot},
};

use crate::{epoch_processing, Error};

pub fn process_slots(config: &Config, state: &mut BeaconState, slot: Slot) -> Result<()> {
    ensure!(
        state.slot < slot,
        Error::SlotNotLater {
            current: state.slot,
            target: slot,
        },
    );

    while state.slot < slot {
        process_slot(config, state)?;

        // > Process epoch on the last slot of each epoch
        if misc::is_epoch_start(config, state.slot + 1) {
            epoch_processing::process_epoch(config, state)?;
        }

        state.slot += 1;
    }

    Ok(())
}

pub fn process_slot(config: &Config, state: &mut BeaconState) -> Result<()> {
    // > Cache latest block header state root
    if state.latest_block_header.state_root.is_zero() {
        state.latest_block_header.state_root = misc::state_root(state)?;
    }

    // > Cache block root
    let previous_block_root = misc::header_root(&state.latest_block_header)?;
    let index = usize::try_from(state.slot % config.slots_per_historical_root)?;

    *state
        .latest_block_roots
        .get_mut(index)
        .ok_or(Error::BlockRootsTooShort)? = previous_block_root;

    Ok(())
}
