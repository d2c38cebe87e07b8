use anyhow::Result;
use log::warn;
use prometheus::{histogram_opts, Histogram, IntCounter, IntGauge, Registry};
use types::phase0::primitives::Slot;

#[derive(Debug)]
pub struct Metrics {
    // Initial sync
    pub sync_blocks_received_total: IntCounter,
    pub sync_batched_block_requests_received_total: IntCounter,
    pub sync_batched_block_requests_sent_total: IntCounter,

    // Chain head
    pub beacon_head_slot: IntGauge,
    pub beacon_reorgs_total: IntCounter,

    // Commit pipeline
    pub block_commit_times: Histogram,
}

impl Metrics {
    pub fn new() -> Result<Self> {
        Ok(Self {
            // Initial sync
            sync_blocks_received_total: IntCounter::new(
                "sync_blocks_received_total",
                "Number of blocks received during initial sync",
            )?,

            sync_batched_block_requests_received_total: IntCounter::new(
                "sync_batched_block_requests_received_total",
                "Number of batched block responses received during initial sync",
            )?,

            sync_batched_block_requests_sent_total: IntCounter::new(
                "sync_batched_block_requests_sent_total",
                "Number of batched block requests sent during initial sync",
            )?,

            // Chain head
            beacon_head_slot: IntGauge::new("beacon_head_slot", "Head slot")?,

            beacon_reorgs_total: IntCounter::new("beacon_reorgs_total", "Total number of reorgs")?,

            // Commit pipeline
            block_commit_times: Histogram::with_opts(histogram_opts!(
                "BLOCK_COMMIT_TIMES",
                "Time taken to validate and commit a block"
            ))?,
        })
    }

    pub fn register(&self, registry: &Registry) -> Result<()> {
        registry.register(Box::new(self.sync_blocks_received_total.clone()))?;
        registry.register(Box::new(
            self.sync_batched_block_requests_received_total.clone(),
        ))?;
        registry.register(Box::new(
            self.sync_batched_block_requests_sent_total.clone(),
        ))?;
        registry.register(Box::new(self.beacon_head_slot.clone()))?;
        registry.register(Box::new(self.beacon_reorgs_total.clone()))?;
        registry.register(Box::new(self.block_commit_times.clone()))?;

        Ok(())
    }

    pub fn set_head_slot(&self, slot: Slot) {
        match i64::try_from(slot) {
            Ok(slot) => self.beacon_head_slot.set(slot),
            Err(error) => warn!("unable to set beacon_head_slot metric: {error}"),
        }
    }
}
