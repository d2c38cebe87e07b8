use anyhow::{ensure, Result};
use helper_functions::{accessors, error::SignatureKind, misc, verifier::Verifier};
use types::{
    config::Config,
    phase0::{
        consts::{GENESIS_SLOT, ZERO_HASH},
        containers::{
            Attestation, BeaconBlock, BeaconBlockHeader, BeaconState, Crosslink,
            PendingAttestation,
        },
        primitives::Slot,
    },
};

use crate::Error;

pub fn process_block(
    config: &Config,
    state: &mut BeaconState,
    block: &BeaconBlock,
    verifier: impl Verifier,
) -> Result<()> {
    process_block_header(state, block)?;
    process_eth1_data(state, block);
    process_attestations(config, state, block, verifier)
}

pub fn process_block_header(state: &mut BeaconState, block: &BeaconBlock) -> Result<()> {
    ensure!(
        block.slot == state.slot,
        Error::BlockSlotMismatch {
            block_slot: block.slot,
            state_slot: state.slot,
        },
    );

    let latest_block_root = misc::header_root(&state.latest_block_header)?;

    ensure!(
        block.parent_root == latest_block_root,
        Error::ParentRootMismatch {
            in_state: latest_block_root,
            in_block: block.parent_root,
        },
    );

    // > Cache current block as the new latest block.
    //   The state root is filled in by the next call to `process_slot`.
    state.latest_block_header = BeaconBlockHeader {
        state_root: ZERO_HASH,
        ..misc::block_header(block)?
    };

    Ok(())
}

pub fn process_eth1_data(state: &mut BeaconState, block: &BeaconBlock) {
    state.latest_eth1_data = block.eth1_data.clone();
}

pub fn process_attestations(
    config: &Config,
    state: &mut BeaconState,
    block: &BeaconBlock,
    verifier: impl Verifier,
) -> Result<()> {
    validate_attestation_count(config, block)?;

    for attestation in &block.body.attestations {
        process_attestation(config, state, attestation, &verifier)?;
    }

    Ok(())
}

pub fn validate_attestation_count(config: &Config, block: &BeaconBlock) -> Result<()> {
    let count = block.body.attestations.len();

    ensure!(
        u64::try_from(count)? <= config.max_attestations,
        Error::TooManyAttestations {
            count,
            maximum: config.max_attestations,
        },
    );

    Ok(())
}

pub fn process_attestation(
    config: &Config,
    state: &mut BeaconState,
    attestation: &Attestation,
    verifier: impl Verifier,
) -> Result<()> {
    validate_attestation(config, state, attestation, verifier)?;

    state.latest_attestations.push(PendingAttestation {
        aggregation_bitfield: attestation.aggregation_bitfield.clone(),
        data: attestation.data.clone(),
        custody_bitfield: attestation.custody_bitfield.clone(),
        inclusion_slot: state.slot,
    });

    Ok(())
}

// Attestation slots come from the network and may be anywhere in the `u64` range.
pub fn validate_inclusion_window(
    config: &Config,
    inclusion_slot: Slot,
    attestation_slot: Slot,
) -> Result<()> {
    let earliest = attestation_slot.saturating_add(config.min_attestation_inclusion_delay);
    let end = attestation_slot.saturating_add(config.slots_per_epoch.get());

    ensure!(
        earliest <= inclusion_slot && inclusion_slot < end,
        Error::AttestationOutsideInclusionRange {
            state_slot: inclusion_slot,
            attestation_slot,
        },
    );

    Ok(())
}

pub fn validate_attestation(
    config: &Config,
    state: &BeaconState,
    attestation: &Attestation,
    verifier: impl Verifier,
) -> Result<()> {
    let data = &attestation.data;

    validate_inclusion_window(config, state.slot, data.slot)?;

    // > Justified checkpoint must be the current or the previous one
    let justified = (data.justified_epoch, data.justified_block_root);

    ensure!(
        justified == (state.justified_epoch, state.justified_root)
            || justified == (state.previous_justified_epoch, state.previous_justified_root),
        Error::AttestationJustifiedMismatch {
            justified_epoch: data.justified_epoch,
            justified_block_root: data.justified_block_root,
        },
    );

    // > Head and epoch boundary roots.
    //   Attestations made at the genesis slot carry the zero sentinel as their boundary root.
    let block_root = accessors::get_block_root_at_slot(config, state, data.slot)?;

    ensure!(
        data.beacon_block_root == block_root,
        Error::AttestationBlockRootMismatch {
            in_state: block_root,
            in_attestation: data.beacon_block_root,
        },
    );

    let epoch_boundary_root = if data.slot == GENESIS_SLOT {
        ZERO_HASH
    } else {
        let epoch = misc::compute_epoch_at_slot(config, data.slot);
        accessors::get_block_root(config, state, epoch)?
    };

    ensure!(
        data.epoch_boundary_root == epoch_boundary_root,
        Error::AttestationBoundaryRootMismatch {
            in_state: epoch_boundary_root,
            in_attestation: data.epoch_boundary_root,
        },
    );

    // > Crosslinks
    ensure!(
        data.crosslink_data_root.is_zero(),
        Error::AttestationCrosslinkDataRootNonZero {
            crosslink_data_root: data.crosslink_data_root,
        },
    );

    let state_crosslink = usize::try_from(data.shard)
        .ok()
        .and_then(|shard| state.latest_crosslinks.get(shard))
        .ok_or(Error::ShardOutOfBounds { shard: data.shard })?;

    let new_crosslink = Crosslink {
        epoch: misc::compute_epoch_at_slot(config, data.slot),
        crosslink_data_root: data.crosslink_data_root,
    };

    ensure!(
        *state_crosslink == data.latest_crosslink || *state_crosslink == new_crosslink,
        Error::AttestationCrosslinkMismatch {
            shard: data.shard,
            in_state: state_crosslink.clone(),
            in_attestation: data.latest_crosslink.clone(),
        },
    );

    // > Bitfields and signature
    let committee_length =
        accessors::get_crosslink_committee(config, state, data.slot, data.shard)?.len();

    ensure!(
        attestation.custody_bitfield.len() == misc::bitfield_length(committee_length)
            && attestation.custody_bitfield.iter().all(|byte| *byte == 0),
        Error::AttestationCustodyBitfieldInvalid { committee_length },
    );

    let attesters = accessors::get_attesting_indices(
        config,
        state,
        data,
        &attestation.aggregation_bitfield,
    )?;

    ensure!(!attesters.is_empty(), Error::AttestationHasNoAttesters);

    verifier.verify_aggregate(
        misc::attestation_data_root(data)?,
        &attestation.aggregate_signature,
        &attesters,
        SignatureKind::Attestation,
    )
}
