use std::sync::Arc;

use anyhow::Result;
use database::{Database, PrefixableKey};
use derive_more::Display;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use types::phase0::{
    containers::{AttestationTarget, BeaconBlock, BeaconState},
    primitives::H256,
};

/// Persistence seam used by [`Controller`].
///
/// Every write is idempotent. Writing the same key twice stores the same bytes, so a commit that
/// was interrupted after some of its writes can be repeated.
///
/// [`Controller`]: crate::Controller
pub trait ChainStore {
    fn head_state(&self) -> Result<BeaconState>;

    fn save_block(&self, block_root: H256, block: &BeaconBlock) -> Result<()>;

    fn save_attestation_target(&self, target: AttestationTarget) -> Result<()>;

    /// Stores `state` as the post-state of `block` and makes `block` the chain head.
    fn update_chain_head(
        &self,
        block_root: H256,
        block: &BeaconBlock,
        state: &BeaconState,
    ) -> Result<()>;

    fn block_by_root(&self, block_root: H256) -> Result<Option<BeaconBlock>>;

    fn state_by_block_root(&self, block_root: H256) -> Result<Option<BeaconState>>;

    fn attestation_target(&self, block_root: H256) -> Result<Option<AttestationTarget>>;

    /// Whether the post-state of `block_root` is stored, i.e. whether the block was applied.
    fn contains_state(&self, block_root: H256) -> Result<bool> {
        Ok(self.state_by_block_root(block_root)?.is_some())
    }

    /// Roots of blocks whose parent is `block_root`, in ascending order.
    fn children(&self, block_root: H256) -> Result<Vec<H256>>;
}

impl<S: ChainStore> ChainStore for Arc<S> {
    fn head_state(&self) -> Result<BeaconState> {
        self.as_ref().head_state()
    }

    fn save_block(&self, block_root: H256, block: &BeaconBlock) -> Result<()> {
        self.as_ref().save_block(block_root, block)
    }

    fn save_attestation_target(&self, target: AttestationTarget) -> Result<()> {
        self.as_ref().save_attestation_target(target)
    }

    fn update_chain_head(
        &self,
        block_root: H256,
        block: &BeaconBlock,
        state: &BeaconState,
    ) -> Result<()> {
        self.as_ref().update_chain_head(block_root, block, state)
    }

    fn block_by_root(&self, block_root: H256) -> Result<Option<BeaconBlock>> {
        self.as_ref().block_by_root(block_root)
    }

    fn state_by_block_root(&self, block_root: H256) -> Result<Option<BeaconState>> {
        self.as_ref().state_by_block_root(block_root)
    }

    fn attestation_target(&self, block_root: H256) -> Result<Option<AttestationTarget>> {
        self.as_ref().attestation_target(block_root)
    }

    fn contains_state(&self, block_root: H256) -> Result<bool> {
        self.as_ref().contains_state(block_root)
    }

    fn children(&self, block_root: H256) -> Result<Vec<H256>> {
        self.as_ref().children(block_root)
    }
}

#[derive(Clone)]
pub struct Storage {
    database: Arc<Database>,
}

impl Storage {
    #[must_use]
    pub fn new(database: Database) -> Self {
        Self {
            database: Arc::new(database),
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Database::in_memory())
    }

    pub fn head_block_root(&self) -> Result<Option<H256>> {
        get(&self.database, HeadBlockRoot)
    }
}

impl ChainStore for Storage {
    fn head_state(&self) -> Result<BeaconState> {
        let block_root = self.head_block_root()?.ok_or(Error::HeadNotFound)?;

        self.state_by_block_root(block_root)?
            .ok_or_else(|| Error::StateNotFound { block_root }.into())
    }

    fn save_block(&self, block_root: H256, block: &BeaconBlock) -> Result<()> {
        save(&self.database, BlockByRoot(block_root), block)
    }

    fn save_attestation_target(&self, target: AttestationTarget) -> Result<()> {
        let AttestationTarget {
            block_root,
            parent_root,
            ..
        } = target;

        self.database.put_batch([
            serialize(AttestationTargetByRoot(block_root), target)?,
            serialize(ChildByParent(parent_root, block_root), block_root)?,
        ])
    }

    fn update_chain_head(
        &self,
        block_root: H256,
        block: &BeaconBlock,
        state: &BeaconState,
    ) -> Result<()> {
        self.database.put_batch([
            serialize(BlockByRoot(block_root), block)?,
            serialize(StateByBlockRoot(block_root), state)?,
            serialize(HeadBlockRoot, block_root)?,
        ])
    }

    fn block_by_root(&self, block_root: H256) -> Result<Option<BeaconBlock>> {
        get(&self.database, BlockByRoot(block_root))
    }

    fn state_by_block_root(&self, block_root: H256) -> Result<Option<BeaconState>> {
        get(&self.database, StateByBlockRoot(block_root))
    }

    fn attestation_target(&self, block_root: H256) -> Result<Option<AttestationTarget>> {
        get(&self.database, AttestationTargetByRoot(block_root))
    }

    fn contains_state(&self, block_root: H256) -> Result<bool> {
        self.database
            .contains_key(StateByBlockRoot(block_root).to_string())
    }

    fn children(&self, block_root: H256) -> Result<Vec<H256>> {
        self.database
            .iterator_prefix(ChildrenOf(block_root).to_string())?
            .map(|result| {
                let (_, value) = result?;
                Ok(bincode::deserialize(&value)?)
            })
            .collect()
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("head block root is not stored")]
    HeadNotFound,
    #[error("block {block_root:?} is not stored")]
    BlockNotFound { block_root: H256 },
    #[error("post-state of block {block_root:?} is not stored")]
    StateNotFound { block_root: H256 },
}

#[derive(Display)]
#[display("{}", Self::PREFIX)]
pub struct HeadBlockRoot;

impl PrefixableKey for HeadBlockRoot {
    const PREFIX: &'static str = "head";
}

#[derive(Display)]
#[display("{}{_0:x}", Self::PREFIX)]
pub struct BlockByRoot(pub H256);

impl PrefixableKey for BlockByRoot {
    const PREFIX: &'static str = "b";
}

#[derive(Display)]
#[display("{}{_0:x}", Self::PREFIX)]
pub struct StateByBlockRoot(pub H256);

impl PrefixableKey for StateByBlockRoot {
    const PREFIX: &'static str = "s";
}

#[derive(Display)]
#[display("{}{_0:x}", Self::PREFIX)]
pub struct AttestationTargetByRoot(pub H256);

impl PrefixableKey for AttestationTargetByRoot {
    const PREFIX: &'static str = "a";
}

#[derive(Display)]
#[display("{}{_0:x}{_1:x}", Self::PREFIX)]
pub struct ChildByParent(pub H256, pub H256);

impl PrefixableKey for ChildByParent {
    const PREFIX: &'static str = "c";
}

#[derive(Display)]
#[display("{}{_0:x}", ChildByParent::PREFIX)]
struct ChildrenOf(H256);

pub fn save(
    database: &Database,
    key: impl core::fmt::Display,
    value: impl Serialize,
) -> Result<()> {
    let (key, value) = serialize(key, value)?;
    database.put(key, value)
}

pub fn get<V: DeserializeOwned>(
    database: &Database,
    key: impl core::fmt::Display,
) -> Result<Option<V>> {
    database
        .get(serialize_key(key))?
        .map(|bytes| bincode::deserialize(&bytes))
        .transpose()
        .map_err(Into::into)
}

fn serialize_key(key: impl core::fmt::Display) -> String {
    key.to_string()
}

fn serialize_value(value: impl Serialize) -> Result<Vec<u8>> {
    bincode::serialize(&value).map_err(Into::into)
}

pub fn serialize(
    key: impl core::fmt::Display,
    value: impl Serialize,
) -> Result<(String, Vec<u8>)> {
    Ok((serialize_key(key), serialize_value(value)?))
}
