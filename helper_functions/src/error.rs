use derive_more::Display;
use thiserror::Error;
use types::phase0::primitives::{Epoch, Shard, Slot, ValidatorIndex};

#[derive(Debug, Error)]
pub enum Error {
    #[error("aggregation bitfield is invalid for a committee of {committee_length}")]
    AggregationBitfieldInvalid { committee_length: usize },
    #[error("bitfield index {index} is out of bounds")]
    BitfieldIndexOutOfBounds { index: usize },
    #[error("no committee is assigned to shard {shard} at slot {slot}")]
    NoCommitteeForShard { slot: Slot, shard: Shard },
    #[error("no validators are active in epoch {epoch}")]
    NoActiveValidators { epoch: Epoch },
    #[error("{signature_kind} signature is invalid")]
    SignatureInvalid { signature_kind: SignatureKind },
    #[error("slot out of range")]
    SlotOutOfRange,
    #[error("validator {validator_index} is not assigned to any committee at slot {slot}")]
    ValidatorNotAssigned {
        slot: Slot,
        validator_index: ValidatorIndex,
    },
    #[error("validator index {validator_index} is out of bounds")]
    ValidatorIndexOutOfBounds { validator_index: ValidatorIndex },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Display)]
pub enum SignatureKind {
    #[display("attestation")]
    Attestation,
}
