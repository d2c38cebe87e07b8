use crate::phase0::primitives::{Epoch, Slot, H256};

pub const FAR_FUTURE_EPOCH: Epoch = Epoch::MAX;
pub const GENESIS_EPOCH: Epoch = 0;
pub const GENESIS_SLOT: Slot = 0;

/// Stands in for roots that do not exist yet, such as the justified root of a genesis state.
pub const ZERO_HASH: H256 = H256::zero();
