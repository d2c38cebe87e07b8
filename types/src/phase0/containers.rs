use serde::{Deserialize, Serialize};

use crate::phase0::{
    consts::FAR_FUTURE_EPOCH,
    primitives::{Epoch, Gwei, Shard, SignatureBytes, Slot, UnixSeconds, H256},
};

#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Attestation {
    pub aggregation_bitfield: Vec<u8>,
    pub data: AttestationData,
    pub custody_bitfield: Vec<u8>,
    pub aggregate_signature: SignatureBytes,
}

#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AttestationData {
    pub slot: Slot,
    pub shard: Shard,
    pub beacon_block_root: H256,
    pub epoch_boundary_root: H256,
    pub crosslink_data_root: H256,
    pub latest_crosslink: Crosslink,
    pub justified_epoch: Epoch,
    pub justified_block_root: H256,
}

/// Fork choice index entry written once for every accepted block.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AttestationTarget {
    pub slot: Slot,
    pub block_root: H256,
    pub parent_root: H256,
}

#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BeaconBlock {
    pub slot: Slot,
    pub parent_root: H256,
    pub state_root: H256,
    pub randao_reveal: SignatureBytes,
    pub eth1_data: Eth1Data,
    pub body: BeaconBlockBody,
    pub signature: SignatureBytes,
}

#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BeaconBlockBody {
    pub attestations: Vec<Attestation>,
}

/// Block summary. `body_root` commits to everything in the block except the slot, the roots and
/// the signature. The root of a block is the root of its header.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BeaconBlockHeader {
    pub slot: Slot,
    pub parent_root: H256,
    pub state_root: H256,
    pub body_root: H256,
}

#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BeaconState {
    // Misc
    pub slot: Slot,
    pub genesis_time: UnixSeconds,

    // Registry
    pub validator_registry: Vec<Validator>,
    pub validator_balances: Vec<Gwei>,

    // History
    pub latest_block_header: BeaconBlockHeader,
    pub latest_block_roots: Vec<H256>,

    // Finality
    pub previous_justified_epoch: Epoch,
    pub previous_justified_root: H256,
    pub justified_epoch: Epoch,
    pub justified_root: H256,
    pub finalized_epoch: Epoch,
    pub finalized_root: H256,

    // Crosslinks
    pub latest_crosslinks: Vec<Crosslink>,

    // Attestations included since the last epoch transition
    pub latest_attestations: Vec<PendingAttestation>,

    // Eth1
    pub latest_eth1_data: Eth1Data,
}

#[derive(Clone, PartialEq, Eq, Hash, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Crosslink {
    pub epoch: Epoch,
    pub crosslink_data_root: H256,
}

#[derive(Clone, PartialEq, Eq, Hash, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Eth1Data {
    pub deposit_root: H256,
    pub deposit_count: u64,
    pub block_hash: H256,
}

#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PendingAttestation {
    pub aggregation_bitfield: Vec<u8>,
    pub data: AttestationData,
    pub custody_bitfield: Vec<u8>,
    pub inclusion_slot: Slot,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Validator {
    pub activation_epoch: Epoch,
    pub exit_epoch: Epoch,
    pub slashed: bool,
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            activation_epoch: FAR_FUTURE_EPOCH,
            exit_epoch: FAR_FUTURE_EPOCH,
            slashed: false,
        }
    }
}
