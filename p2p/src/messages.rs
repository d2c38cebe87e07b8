use std::sync::Arc;

use futures::channel::mpsc::UnboundedSender;
use log::debug;
use strum::IntoStaticStr;
use types::phase0::{
    containers::BeaconBlock,
    primitives::{Slot, H256},
};

use crate::misc::PeerId;

pub enum P2pToSync {
    /// The network layer picked a new peer to sync from.
    SyncStatus {
        best_peer: PeerId,
        highest_observed_slot: Slot,
    },
    Network(NetworkMessage),
}

impl P2pToSync {
    pub fn send(self, tx: &UnboundedSender<Self>) {
        if tx.unbounded_send(self).is_err() {
            debug!("send to block sync service failed because the receiver was dropped");
        }
    }
}

pub struct NetworkMessage {
    pub sender: PeerId,
    pub payload: Payload,
}

#[derive(IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Payload {
    BatchedBeaconBlockRequest(BatchedBeaconBlockRequest),
    BatchedBeaconBlockResponse(BatchedBeaconBlockResponse),
    BeaconBlockResponse(BeaconBlockResponse),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BatchedBeaconBlockRequest {
    pub finalized_root: H256,
    pub canonical_root: H256,
}

#[derive(Clone, Default, Debug)]
pub struct BatchedBeaconBlockResponse {
    pub batched_blocks: Vec<Arc<BeaconBlock>>,
}

#[derive(Clone, Default, Debug)]
pub struct BeaconBlockResponse {
    pub block: Option<Arc<BeaconBlock>>,
}

#[derive(PartialEq, Eq, Debug)]
pub enum SyncToApi {
    SyncStatus(bool),
}

impl SyncToApi {
    pub fn send(self, tx: &UnboundedSender<Self>) {
        if tx.unbounded_send(self).is_err() {
            debug!("send to HTTP API failed because the receiver was dropped");
        }
    }
}

#[derive(PartialEq, Eq, Debug)]
pub enum SyncToP2p {
    RequestBatchedBlocks(PeerId, BatchedBeaconBlockRequest),
}
