use derive_more::{Display, From};
use serde::Serialize;
use types::phase0::primitives::Slot;

/// Opaque identity of a connected peer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Display, From, Serialize)]
#[display("peer-{_0}")]
pub struct PeerId(u64);

impl PeerId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Progress of initial sync as seen by [`BlockSyncService`].
///
/// `current_slot` is read from the commit pipeline. The other fields come from sync status
/// updates.
///
/// [`BlockSyncService`]: crate::BlockSyncService
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct SyncCursor {
    pub current_slot: Slot,
    pub highest_observed_slot: Slot,
    pub best_peer: Option<PeerId>,
}
