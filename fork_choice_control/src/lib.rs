//! Block commit pipeline and fork choice.
//!
//! This crate handles the following concerns:
//! - [Validating and committing blocks](`Controller::validate_and_commit`) one at a time.
//! - [Persistence](`storage`) of blocks, post-states and the fork choice index.
//! - [Reorganizing](`Controller::reorganize`) onto a previously applied block.
//! - [LMD-GHOST](`fork_choice`) head selection.
//! - Testing.

pub use crate::{
    block_processor::{BlockProcessor, StateTransition},
    controller::Controller,
    error::{Error, ErrorKind, Rejection},
    fork_choice::Vote,
    storage::{ChainStore, Storage},
};

pub mod fork_choice;
pub mod storage;

mod block_processor;
mod controller;
mod error;

#[cfg(test)]
mod extra_tests;
#[cfg(test)]
mod helpers;
