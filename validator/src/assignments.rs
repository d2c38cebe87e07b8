use std::collections::BTreeMap;

use helper_functions::{committees::CommitteeAssignmentProvider, misc};
use log::debug;
use types::{
    config::Config,
    nonstandard::CommitteeAssignment,
    phase0::{
        containers::BeaconState,
        primitives::{Epoch, Slot, ValidatorIndex},
    },
};

/// Attestation duties of local validators keyed by slot.
///
/// Only one assignment is kept per slot. Refreshing an epoch overwrites any entry already present
/// at the same slot.
#[derive(Default, Debug)]
pub struct SlotAssignments {
    assignments: BTreeMap<Slot, CommitteeAssignment>,
}

impl SlotAssignments {
    /// Looks up the duties of `validator_indices` in `epoch` and records them.
    ///
    /// Validators without a committee in `epoch` are skipped.
    pub fn refresh_epoch(
        &mut self,
        config: &Config,
        provider: &impl CommitteeAssignmentProvider,
        state: &BeaconState,
        epoch: Epoch,
        validator_indices: impl IntoIterator<Item = ValidatorIndex>,
    ) {
        let start_slot = misc::compute_start_slot_at_epoch(config, epoch);
        let end_slot = misc::compute_start_slot_at_epoch(config, epoch + 1);

        for validator_index in validator_indices {
            let Some(assignment) = (start_slot..end_slot)
                .find_map(|slot| provider.assignment_for(state, slot, validator_index).ok())
            else {
                debug!(
                    "validator has no committee assignment \
                     (validator_index: {validator_index}, epoch: {epoch})",
                );
                continue;
            };

            if let Some(replaced) = self.assignments.insert(assignment.slot, assignment) {
                debug!(
                    "committee assignment replaced \
                     (slot: {}, replaced_validator_index: {})",
                    replaced.slot, replaced.validator_index,
                );
            }
        }
    }

    #[must_use]
    pub fn get(&self, slot: Slot) -> Option<&CommitteeAssignment> {
        self.assignments.get(&slot)
    }

    /// Forgets assignments for slots before `slot`.
    pub fn prune(&mut self, slot: Slot) {
        self.assignments = self.assignments.split_off(&slot);
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommitteeAssignment> {
        self.assignments.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}
