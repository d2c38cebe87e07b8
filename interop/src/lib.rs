use core::num::NonZeroU64;

use anyhow::Result;
use helper_functions::misc;
use types::{
    config::Config,
    phase0::{
        consts::{GENESIS_EPOCH, GENESIS_SLOT},
        containers::{BeaconBlock, BeaconState, Crosslink, Eth1Data, Validator},
        primitives::{UnixSeconds, H256},
    },
};

/// <https://github.com/ethereum/eth2.0-pm/tree/b7c76e7a9d036ce73ca6aa0b7065db92f7728f41/interop/mocked_start#create-genesis-state>
const QUICK_START_ETH1_BLOCK_HASH: H256 = H256([0x42; 32]);

/// Builds a genesis block and state with `validator_count` validators active from genesis.
///
/// Every validator starts with the maximum effective balance. The returned block commits to the
/// returned state, so the pair can be used as the anchor of a chain.
pub fn quick_start_beacon_state(
    config: &Config,
    genesis_time: UnixSeconds,
    validator_count: NonZeroU64,
) -> Result<(BeaconBlock, BeaconState)> {
    let validator_count = usize::try_from(validator_count.get())?;
    let history_length = usize::try_from(config.slots_per_historical_root.get())?;
    let shard_count = usize::try_from(config.shard_count.get())?;

    let validator = Validator {
        activation_epoch: GENESIS_EPOCH,
        ..Validator::default()
    };

    let eth1_data = Eth1Data {
        deposit_count: u64::try_from(validator_count)?,
        block_hash: QUICK_START_ETH1_BLOCK_HASH,
        ..Eth1Data::default()
    };

    let mut genesis_block = BeaconBlock {
        slot: GENESIS_SLOT,
        eth1_data: eth1_data.clone(),
        ..BeaconBlock::default()
    };

    let mut genesis_state = BeaconState {
        slot: GENESIS_SLOT,
        genesis_time,
        validator_registry: vec![validator; validator_count],
        validator_balances: vec![config.max_effective_balance; validator_count],
        latest_block_roots: vec![H256::zero(); history_length],
        latest_crosslinks: vec![Crosslink::default(); shard_count],
        latest_eth1_data: eth1_data,
        ..BeaconState::default()
    };

    // The header is stored with a zero state root like any other block header.
    // `process_slot` fills it in from the state that contains it.
    genesis_state.latest_block_header = misc::block_header(&genesis_block)?;
    genesis_block.state_root = misc::state_root(&genesis_state)?;

    Ok((genesis_block, genesis_state))
}
