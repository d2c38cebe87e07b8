pub use crate::{
    helpers::{stop_and_discard, stop_and_record},
    metrics::Metrics,
};

mod helpers;
mod metrics;
