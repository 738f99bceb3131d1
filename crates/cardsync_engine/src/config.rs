//! Configuration for the sync engine.

use std::time::Duration;

/// Order in which the collection is kept, by `created_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Most recently created cards first.
    #[default]
    NewestFirst,
    /// Oldest cards first.
    OldestFirst,
}

/// Fault injection knobs for the transport.
///
/// Latency and failure are independent: a request may be delayed, failed,
/// both, or neither.
#[derive(Debug, Clone, PartialEq)]
pub struct FaultConfig {
    /// Whether to delay requests by a random amount.
    pub simulate_latency: bool,
    /// Whether to fail requests at random before they reach the network.
    pub simulate_failure: bool,
    /// Upper bound (exclusive) of the injected delay.
    pub max_latency: Duration,
    /// Probability that a request fails when failure simulation is on.
    pub failure_rate: f64,
}

impl FaultConfig {
    /// Creates a configuration with both knobs turned off.
    pub fn disabled() -> Self {
        Self {
            simulate_latency: false,
            simulate_failure: false,
            max_latency: Duration::from_millis(2000),
            failure_rate: 0.85,
        }
    }

    /// Turns latency simulation on or off.
    pub fn with_latency(mut self, enabled: bool) -> Self {
        self.simulate_latency = enabled;
        self
    }

    /// Turns failure simulation on or off.
    pub fn with_failure(mut self, enabled: bool) -> Self {
        self.simulate_failure = enabled;
        self
    }

    /// Sets the upper bound of the injected delay.
    pub fn with_max_latency(mut self, max: Duration) -> Self {
        self.max_latency = max;
        self
    }

    /// Sets the failure probability, clamped to `[0, 1]`.
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Returns true if neither knob is on.
    pub fn is_disabled(&self) -> bool {
        !self.simulate_latency && !self.simulate_failure
    }
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Configuration for sync operations.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Base URL of the host serving `/flash-cards`.
    pub base_url: String,
    /// Fault injection.
    pub fault: FaultConfig,
    /// Delay between marking a card for deletion and removing it.
    pub delete_grace: Duration,
    /// Collection order.
    pub sort_order: SortOrder,
    /// Request timeout.
    pub timeout: Duration,
}

impl SyncConfig {
    /// Creates a new sync configuration.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            fault: FaultConfig::disabled(),
            delete_grace: Duration::from_millis(300),
            sort_order: SortOrder::NewestFirst,
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the fault injection configuration.
    pub fn with_fault(mut self, fault: FaultConfig) -> Self {
        self.fault = fault;
        self
    }

    /// Sets the delete grace interval.
    pub fn with_delete_grace(mut self, grace: Duration) -> Self {
        self.delete_grace = grace;
        self
    }

    /// Sets the collection order.
    pub fn with_sort_order(mut self, order: SortOrder) -> Self {
        self.sort_order = order;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the collection URL, e.g. `http://localhost:3003/flash-cards`.
    pub fn collection_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            cardsync_protocol::RESOURCE
        )
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new("http://localhost:3003")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_config_builder() {
        let config = SyncConfig::new("https://cards.example.com/")
            .with_delete_grace(Duration::from_millis(500))
            .with_sort_order(SortOrder::OldestFirst)
            .with_timeout(Duration::from_secs(5));

        assert_eq!(config.delete_grace, Duration::from_millis(500));
        assert_eq!(config.sort_order, SortOrder::OldestFirst);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(
            config.collection_url(),
            "https://cards.example.com/flash-cards"
        );
    }

    #[test]
    fn defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.delete_grace, Duration::from_millis(300));
        assert_eq!(config.sort_order, SortOrder::NewestFirst);
        assert!(config.fault.is_disabled());
        assert_eq!(config.fault.max_latency, Duration::from_millis(2000));
        assert!((config.fault.failure_rate - 0.85).abs() < f64::EPSILON);
    }

    #[test]
    fn failure_rate_is_clamped() {
        let fault = FaultConfig::disabled().with_failure_rate(1.5);
        assert!((fault.failure_rate - 1.0).abs() < f64::EPSILON);

        let fault = FaultConfig::disabled().with_failure_rate(-0.2);
        assert_eq!(fault.failure_rate, 0.0);
    }
}
