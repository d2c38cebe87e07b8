use thiserror::Error;

use crate::misc::PeerId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("batch was sent by {actual} instead of the best peer ({expected:?})")]
    PeerMismatch {
        expected: Option<PeerId>,
        actual: PeerId,
    },
    #[error("unexpected message during initial sync: {payload}")]
    UnexpectedMessage { payload: &'static str },
    #[error("no peer to request blocks from")]
    NoBestPeer,
}
