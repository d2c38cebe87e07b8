pub use crate::{
    block_sync_service::{BlockSyncService, PeerTransport},
    error::Error,
    messages::{
        BatchedBeaconBlockRequest, BatchedBeaconBlockResponse, BeaconBlockResponse,
        NetworkMessage, P2pToSync, Payload, SyncToApi, SyncToP2p,
    },
    misc::{PeerId, SyncCursor},
};

mod block_sync_service;
mod error;
mod messages;
mod misc;
