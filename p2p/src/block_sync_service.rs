use std::sync::Arc;

use anyhow::{bail, Result};
use fork_choice_control::{ChainStore, Controller, Error as CommitError, StateTransition};
use futures::{
    channel::mpsc::{UnboundedReceiver, UnboundedSender},
    StreamExt as _,
};
use log::{debug, error, info};
use parking_lot::{Mutex, RwLock};
use prometheus_metrics::Metrics;
use tokio_util::sync::CancellationToken;
use types::phase0::{
    containers::BeaconBlock,
    primitives::{Slot, H256},
};

use crate::{
    error::Error,
    messages::{
        BatchedBeaconBlockRequest, BatchedBeaconBlockResponse, BeaconBlockResponse,
        NetworkMessage, P2pToSync, Payload, SyncToApi, SyncToP2p,
    },
    misc::{PeerId, SyncCursor},
};

/// Outbound side of the network used during initial sync.
pub trait PeerTransport {
    fn send(&self, request: BatchedBeaconBlockRequest, peer_id: PeerId) -> Result<()>;
}

impl PeerTransport for UnboundedSender<SyncToP2p> {
    fn send(&self, request: BatchedBeaconBlockRequest, peer_id: PeerId) -> Result<()> {
        self.unbounded_send(SyncToP2p::RequestBatchedBlocks(peer_id, request))?;
        Ok(())
    }
}

#[derive(Clone, Copy, Default)]
struct SyncStatus {
    highest_observed_slot: Slot,
    best_peer: Option<PeerId>,
}

/// Feeds blocks received during initial sync into the commit pipeline.
///
/// All handlers take `&self`. Single blocks and batches may be handled from different threads at
/// the same time. Commits are serialized by [`Controller`].
pub struct BlockSyncService<S, T, N = UnboundedSender<SyncToP2p>> {
    controller: Arc<Controller<S, T>>,
    transport: N,
    metrics: Option<Arc<Metrics>>,
    status: RwLock<SyncStatus>,
    // Held for the whole exit so that the terminal block is committed at most once.
    is_synced: Mutex<bool>,
    cancellation: CancellationToken,
    sync_to_api_tx: UnboundedSender<SyncToApi>,
}

impl<S: ChainStore, T: StateTransition, N: PeerTransport> BlockSyncService<S, T, N> {
    #[must_use]
    pub fn new(
        controller: Arc<Controller<S, T>>,
        transport: N,
        sync_to_api_tx: UnboundedSender<SyncToApi>,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        Self {
            controller,
            transport,
            metrics,
            status: RwLock::default(),
            is_synced: Mutex::new(false),
            cancellation: CancellationToken::new(),
            sync_to_api_tx,
        }
    }

    pub async fn run(&self, mut p2p_to_sync_rx: UnboundedReceiver<P2pToSync>) -> Result<()> {
        while let Some(message) = p2p_to_sync_rx.next().await {
            if let Err(error) = self.handle_network_message(message) {
                debug!("unable to handle network message: {error}");
            }

            if self.is_synced() {
                break;
            }
        }

        Ok(())
    }

    pub fn handle_network_message(&self, message: P2pToSync) -> Result<()> {
        match message {
            P2pToSync::SyncStatus {
                best_peer,
                highest_observed_slot,
            } => {
                debug!(
                    "sync status updated \
                     (best_peer: {best_peer}, highest_observed_slot: {highest_observed_slot})",
                );

                *self.status.write() = SyncStatus {
                    highest_observed_slot,
                    best_peer: Some(best_peer),
                };
            }
            P2pToSync::Network(NetworkMessage { sender, payload }) => match payload {
                Payload::BatchedBeaconBlockResponse(BatchedBeaconBlockResponse {
                    batched_blocks,
                }) => self.handle_batched_blocks(batched_blocks, sender),
                Payload::BeaconBlockResponse(BeaconBlockResponse { block }) => match block {
                    Some(block) => self.handle_block(block),
                    None => report_commit_error(&CommitError::NilBlock),
                },
                payload @ Payload::BatchedBeaconBlockRequest(_) => bail!(Error::UnexpectedMessage {
                    payload: (&payload).into(),
                }),
            },
        }

        Ok(())
    }

    /// Asks the best peer for the blocks between `finalized_root` and `canonical_root`.
    ///
    /// Failures are logged. The request is retried when the next sync status update arrives.
    pub fn request_batched_blocks(&self, finalized_root: H256, canonical_root: H256) {
        if let Some(metrics) = self.metrics.as_ref() {
            metrics.sync_batched_block_requests_sent_total.inc();
        }

        debug!(
            "requesting batched blocks \
             (finalized_root: {finalized_root}, canonical_root: {canonical_root})",
        );

        let request = BatchedBeaconBlockRequest {
            finalized_root,
            canonical_root,
        };

        let best_peer = self.status.read().best_peer;

        let result = match best_peer {
            Some(peer_id) => self.transport.send(request, peer_id),
            None => Err(Error::NoBestPeer.into()),
        };

        if let Err(error) = result {
            error!("unable to request batched blocks: {error}");
        }
    }

    pub fn handle_batched_blocks(&self, mut blocks: Vec<Arc<BeaconBlock>>, sender: PeerId) {
        if let Some(metrics) = self.metrics.as_ref() {
            metrics.sync_batched_block_requests_received_total.inc();
        }

        if blocks.is_empty() {
            return;
        }

        let best_peer = self.status.read().best_peer;

        if best_peer != Some(sender) {
            let error = Error::PeerMismatch {
                expected: best_peer,
                actual: sender,
            };

            debug!("received batch blocks from a different peer (peer_id: {sender}): {error}");

            return;
        }

        debug!(
            "processing batched block response (block_count: {}, peer_id: {sender})",
            blocks.len(),
        );

        blocks.sort_by_key(|block| block.slot);

        for block in blocks {
            self.handle_block(block);
        }

        debug!("finished processing batched blocks");
    }

    pub fn handle_block(&self, block: Arc<BeaconBlock>) {
        if let Some(metrics) = self.metrics.as_ref() {
            metrics.sync_blocks_received_total.inc();
        }

        let highest_observed_slot = self.status.read().highest_observed_slot;

        if block.slot == highest_observed_slot {
            self.exit_initial_sync(block);
            return;
        }

        if block.slot < self.controller.current_slot() {
            return;
        }

        if let Err(error) = self.controller.validate_and_commit(block, &self.cancellation) {
            report_commit_error(&error);
        }
    }

    #[must_use]
    pub fn cursor(&self) -> SyncCursor {
        let SyncStatus {
            highest_observed_slot,
            best_peer,
        } = *self.status.read();

        SyncCursor {
            current_slot: self.controller.current_slot(),
            highest_observed_slot,
            best_peer,
        }
    }

    #[must_use]
    pub fn is_synced(&self) -> bool {
        *self.is_synced.lock()
    }

    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    fn exit_initial_sync(&self, terminal_block: Arc<BeaconBlock>) {
        let mut is_synced = self.is_synced.lock();

        if *is_synced {
            return;
        }

        self.controller.set_current_slot(terminal_block.slot);

        if let Err(error) = self
            .controller
            .validate_and_commit(terminal_block, &self.cancellation)
        {
            error!("could not exit initial sync: {error}");
            return;
        }

        info!(
            "exiting initial sync and starting normal sync (canonical_state_slot: {})",
            self.controller.head().state.slot,
        );

        SyncToApi::SyncStatus(true).send(&self.sync_to_api_tx);

        self.cancellation.cancel();

        *is_synced = true;
    }
}

fn report_commit_error(error: &CommitError) {
    if error.is_benign() {
        debug!("block not saved ({}): {error}", error.kind());
    } else {
        error!("unable to save block ({}): {error}", error.kind());
    }
}
