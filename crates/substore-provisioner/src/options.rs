//! Knobs that change how failures and ordering are handled

use std::time::Duration;

/// What to do when package install, service enable or firewall commands fail
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strictness {
    /// Warn with the tool's output and keep going
    #[default]
    BestEffort,
    /// Abort the run
    Strict,
}

/// Order of the ufw commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FirewallOrder {
    /// Enable ufw, then add the allow rules. Historical order; on a host
    /// with a default-deny policy an SSH session can drop in between.
    #[default]
    EnableFirst,
    /// Add the allow rules, then enable ufw
    AllowSshFirst,
}

/// Liveness poll after `docker run`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheckPolicy {
    pub attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for HealthCheckPolicy {
    fn default() -> Self {
        Self {
            attempts: 6,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl HealthCheckPolicy {
    /// Policy that never sleeps, for tests
    pub fn immediate(attempts: u32) -> Self {
        Self {
            attempts,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before the given check (1-based), doubling up to `max_delay`
    pub fn delay_before(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProvisionOptions {
    pub strictness: Strictness,
    pub firewall_order: FirewallOrder,
    pub health_check: HealthCheckPolicy,
}
