use types::phase0::{containers::Validator, primitives::Epoch};

use crate::misc;

#[must_use]
pub const fn is_active_validator(validator: &Validator, epoch: Epoch) -> bool {
    validator.activation_epoch <= epoch && epoch < validator.exit_epoch
}

/// Checks that `bitfield` has exactly one bit per committee member (rounded up to whole bytes)
/// and that the padding bits are clear.
#[must_use]
pub fn is_valid_bitfield(bitfield: &[u8], committee_size: usize) -> bool {
    if bitfield.len() != misc::bitfield_length(committee_size) {
        return false;
    }

    (committee_size..bitfield.len() * 8).all(|index| !misc::get_bitfield_bit(bitfield, index))
}
