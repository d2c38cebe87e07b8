pub mod accessors;
pub mod committees;
pub mod error;
pub mod misc;
pub mod predicates;
pub mod verifier;
