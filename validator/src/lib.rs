pub use crate::{
    assignments::SlotAssignments,
    attestation::{attestation_data, build_attestation, PLACEHOLDER_SIGNATURE},
};

mod assignments;
mod attestation;
