pub use crate::{
    error::Error,
    state_transition::{state_transition, verify_block, StateRootPolicy},
};

pub mod block_processing;
pub mod epoch_processing;
pub mod slot_processing;

mod error;
mod state_transition;
