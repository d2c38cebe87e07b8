use anyhow::{ensure, Result};
use types::{
    config::Config,
    phase0::{
        containers::{AttestationData, BeaconBlock, BeaconBlockHeader, BeaconState},
        primitives::{Epoch, Slot, H256},
    },
};

use crate::error::Error;

#[must_use]
pub const fn compute_epoch_at_slot(config: &Config, slot: Slot) -> Epoch {
    slot / config.slots_per_epoch.get()
}

#[must_use]
pub const fn compute_start_slot_at_epoch(config: &Config, epoch: Epoch) -> Slot {
    epoch.saturating_mul(config.slots_per_epoch.get())
}

#[must_use]
pub const fn is_epoch_start(config: &Config, slot: Slot) -> bool {
    slots_since_epoch_start(config, slot) == 0
}

#[must_use]
pub const fn slots_since_epoch_start(config: &Config, slot: Slot) -> u64 {
    slot % config.slots_per_epoch.get()
}

pub fn block_header(block: &BeaconBlock) -> Result<BeaconBlockHeader> {
    let body_root =
        hashing::hash_serialized(&(&block.randao_reveal, &block.eth1_data, &block.body))?;

    Ok(BeaconBlockHeader {
        slot: block.slot,
        parent_root: block.parent_root,
        state_root: block.state_root,
        body_root,
    })
}

pub fn block_root(block: &BeaconBlock) -> Result<H256> {
    header_root(&block_header(block)?)
}

pub fn header_root(header: &BeaconBlockHeader) -> Result<H256> {
    hashing::hash_serialized(header)
}

pub fn state_root(state: &BeaconState) -> Result<H256> {
    hashing::hash_serialized(state)
}

/// The message attesters sign.
pub fn attestation_data_root(data: &AttestationData) -> Result<H256> {
    hashing::hash_serialized(data)
}

#[must_use]
pub const fn bitfield_length(committee_size: usize) -> usize {
    committee_size.div_ceil(8)
}

#[must_use]
pub fn get_bitfield_bit(bitfield: &[u8], index: usize) -> bool {
    bitfield
        .get(index / 8)
        .is_some_and(|byte| (byte >> (index % 8)) & 1 == 1)
}

pub fn set_bitfield_bit(bitfield: &mut [u8], index: usize) -> Result<()> {
    let byte = bitfield
        .get_mut(index / 8)
        .ok_or(Error::BitfieldIndexOutOfBounds { index })?;

    *byte |= 1 << (index % 8);

    Ok(())
}

pub fn zeroed_bitfield(committee_size: usize) -> Result<Vec<u8>> {
    ensure!(
        committee_size > 0,
        Error::AggregationBitfieldInvalid {
            committee_length: committee_size,
        },
    );

    Ok(vec![0; bitfield_length(committee_size)])
}
