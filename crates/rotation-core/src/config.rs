//! Engine and scheduler configuration.

use crate::domain::OrphanPolicy;
use rust_decimal::Decimal;
use std::time::Duration;
use thiserror::Error;

/// Default tick interval (5 minutes).
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(300);

/// Default deadline applied to every store and registry call.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(5);

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("retention rate {0} must lie within [0, 1]")]
    RetentionRateOutOfRange(Decimal),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

/// Advancement engine configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RotationConfig {
    /// Fraction of each payout withheld into the ledger.
    pub retention_rate: Decimal,
    /// Handling of entries whose participant or payout is missing.
    pub orphan_policy: OrphanPolicy,
    /// Deadline for each store/registry call.
    pub io_timeout: Duration,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            retention_rate: Decimal::new(10, 2),
            orphan_policy: OrphanPolicy::Drop,
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }
}

impl RotationConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.retention_rate < Decimal::ZERO || self.retention_rate > Decimal::ONE {
            return Err(ConfigValidationError::RetentionRateOutOfRange(
                self.retention_rate,
            ));
        }
        if self.io_timeout.is_zero() {
            return Err(ConfigValidationError::ZeroDuration("io_timeout"));
        }
        Ok(())
    }
}

/// Rotation scheduler configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub tick_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.tick_interval.is_zero() {
            return Err(ConfigValidationError::ZeroDuration("tick_interval"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults() {
        let config = RotationConfig::default();
        assert_eq!(config.retention_rate, dec!(0.10));
        assert_eq!(config.orphan_policy, OrphanPolicy::Drop);
        assert!(config.validate().is_ok());
        assert_eq!(SchedulerConfig::default().tick_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_rate_out_of_range() {
        let config = RotationConfig {
            retention_rate: dec!(1.5),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::RetentionRateOutOfRange(dec!(1.5)))
        );
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = SchedulerConfig {
            tick_interval: Duration::ZERO,
        };
        assert!(config.validate().is_err());
    }
}
