use core::num::NonZeroU64;
use std::borrow::Cow;

use nonzero_ext::nonzero;
use serde::{Deserialize, Serialize};

use crate::phase0::primitives::Gwei;

/// Configuration variables customizable at runtime.
///
/// Missing fields take their values from [`Config::default`], so a YAML file only needs to list
/// the parameters it changes.
#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Config {
    // Meta
    pub config_name: Cow<'static, str>,

    // Time
    pub slots_per_epoch: NonZeroU64,
    pub min_attestation_inclusion_delay: u64,

    // Committees
    pub shard_count: NonZeroU64,
    pub target_committee_size: NonZeroU64,

    // History
    pub slots_per_historical_root: NonZeroU64,

    // Block contents
    pub max_attestations: u64,

    // Rewards
    pub max_effective_balance: Gwei,
    pub base_reward_quotient: NonZeroU64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // Use `default` as the default `config_name` and override it in `Config::mainnet`.
            config_name: Cow::Borrowed("default"),

            slots_per_epoch: nonzero!(64_u64),
            min_attestation_inclusion_delay: 4,

            shard_count: nonzero!(1024_u64),
            target_committee_size: nonzero!(128_u64),

            slots_per_historical_root: nonzero!(8192_u64),

            max_attestations: 128,

            max_effective_balance: 32_000_000_000,
            base_reward_quotient: nonzero!(32_u64),
        }
    }
}

impl Config {
    #[must_use]
    pub fn mainnet() -> Self {
        Self {
            config_name: Cow::Borrowed("mainnet"),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn minimal() -> Self {
        Self {
            config_name: Cow::Borrowed("minimal"),
            slots_per_epoch: nonzero!(8_u64),
            min_attestation_inclusion_delay: 1,
            shard_count: nonzero!(8_u64),
            target_committee_size: nonzero!(4_u64),
            slots_per_historical_root: nonzero!(64_u64),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(Config::mainnet(), "mainnet", 64)]
    #[test_case(Config::minimal(), "minimal", 8)]
    fn predefined_configs_are_named(config: Config, expected_name: &str, expected_slots: u64) {
        assert_eq!(config.config_name, expected_name);
        assert_eq!(config.slots_per_epoch.get(), expected_slots);
    }

    #[test]
    fn missing_fields_are_filled_from_default() -> Result<(), serde_yaml::Error> {
        let config = serde_yaml::from_str::<Config>(
            "
            CONFIG_NAME: devnet
            SLOTS_PER_EPOCH: 7
            ",
        )?;

        assert_eq!(config.config_name, "devnet");
        assert_eq!(config.slots_per_epoch, nonzero!(7_u64));
        assert_eq!(config.shard_count, Config::default().shard_count);
        assert_eq!(config.base_reward_quotient, Config::default().base_reward_quotient);

        Ok(())
    }

    #[test]
    fn zero_slots_per_epoch_is_rejected() {
        serde_yaml::from_str::<Config>("SLOTS_PER_EPOCH: 0")
            .expect_err("slots per epoch must be nonzero");
    }

    #[test]
    fn config_survives_yaml() -> Result<(), serde_yaml::Error> {
        let config = Config::minimal();
        let yaml = serde_yaml::to_string(&config)?;

        assert_eq!(serde_yaml::from_str::<Config>(&yaml)?, config);

        Ok(())
    }
}
