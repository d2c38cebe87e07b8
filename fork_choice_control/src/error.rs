use anyhow::Error as AnyhowError;
use strum::{Display, IntoStaticStr};
use thiserror::Error;
use types::phase0::primitives::{Slot, H256};

/// Failure of a single commit.
///
/// Benign failures are expected under normal operation (races with other commits, blocks that
/// are already finalized, cancellation) and should be logged at low severity. No variant is
/// fatal: the pipeline is idle and retryable after any of them.
#[derive(Debug, Error)]
pub enum Error {
    #[error("block payload is missing")]
    NilBlock,
    #[error("block failed validation: {source}")]
    ValidationFailed { source: AnyhowError, benign: bool },
    #[error("state transition failed: {source}")]
    TransitionFailed { source: AnyhowError },
    #[error("storage operation failed: {source}")]
    StorageFailed { source: AnyhowError },
    #[error("commit was cancelled")]
    Cancelled,
}

impl Error {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NilBlock => ErrorKind::NilBlock,
            Self::ValidationFailed { .. } => ErrorKind::ValidationFailed,
            Self::TransitionFailed { .. } => ErrorKind::TransitionFailed,
            Self::StorageFailed { .. } => ErrorKind::StorageFailed,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    #[must_use]
    pub const fn is_benign(&self) -> bool {
        match self {
            Self::ValidationFailed { benign, .. } => *benign,
            Self::Cancelled => true,
            Self::NilBlock | Self::TransitionFailed { .. } | Self::StorageFailed { .. } => false,
        }
    }

    pub(crate) const fn invalid(source: AnyhowError) -> Self {
        Self::ValidationFailed {
            source,
            benign: false,
        }
    }

    pub(crate) const fn storage(source: AnyhowError) -> Self {
        Self::StorageFailed { source }
    }

    pub(crate) const fn transition(source: AnyhowError) -> Self {
        Self::TransitionFailed { source }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    NilBlock,
    ValidationFailed,
    TransitionFailed,
    StorageFailed,
    Cancelled,
}

#[derive(Debug, Error)]
pub enum Rejection {
    #[error("block has already been applied (block_root: {block_root:?}, slot: {slot})")]
    AlreadyApplied { block_root: H256, slot: Slot },
    #[error("block slot is not after the finalized slot ({block_slot} <= {finalized_slot})")]
    NotAfterFinalizedSlot { block_slot: Slot, finalized_slot: Slot },
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use test_case::test_case;

    use super::*;

    #[test_case(Error::NilBlock => ("nil_block", false))]
    #[test_case(Error::invalid(anyhow!("bad")) => ("validation_failed", false))]
    #[test_case(
        Error::ValidationFailed { source: anyhow!("race"), benign: true }
            => ("validation_failed", true)
    )]
    #[test_case(Error::transition(anyhow!("bad")) => ("transition_failed", false))]
    #[test_case(Error::storage(anyhow!("bad")) => ("storage_failed", false))]
    #[test_case(Error::Cancelled => ("cancelled", true))]
    fn kind_and_benign_flag(error: Error) -> (&'static str, bool) {
        (error.kind().into(), error.is_benign())
    }

    #[test]
    fn kind_displays_in_snake_case() {
        assert_eq!(ErrorKind::ValidationFailed.to_string(), "validation_failed");
    }
}
