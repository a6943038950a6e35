//! Bean Lifecycle Tracking
//!
//! Each registered constructor carries an entry recording how often it was
//! used to build beans and how those constructions went.
//!
//! ```text
//! Registered ──create ok──▶ Active
//!     │                      │
//!     └──create err/panic──▶ Failed ──create ok──▶ Active
//! ```

use std::time::{Duration, Instant};

/// Bean constructor state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeanState {
    /// Constructor registered, no bean built yet
    Registered,

    /// Last construction succeeded
    Active,

    /// Last construction failed or panicked
    Failed,
}

impl std::fmt::Display for BeanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BeanState::Registered => write!(f, "registered"),
            BeanState::Active => write!(f, "active"),
            BeanState::Failed => write!(f, "failed"),
        }
    }
}

impl BeanState {
    pub fn is_healthy(&self) -> bool {
        !matches!(self, BeanState::Failed)
    }
}

/// Registry entry of one bean constructor
#[derive(Debug)]
pub struct BeanEntry {
    /// Current state
    pub state: BeanState,

    /// Whether the stored constructor is decorated
    pub decorated: bool,

    /// Time of registration
    pub registered_at: Instant,

    /// Time of the last construction attempt
    pub last_active: Instant,

    /// Number of beans built
    pub call_count: u64,

    /// Number of failed constructions
    pub error_count: u64,

    /// Last error message (if any)
    pub last_error: Option<String>,
}

impl BeanEntry {
    pub fn new(decorated: bool) -> Self {
        let now = Instant::now();
        Self {
            state: BeanState::Registered,
            decorated,
            registered_at: now,
            last_active: now,
            call_count: 0,
            error_count: 0,
            last_error: None,
        }
    }

    /// Record a successful construction
    pub fn record_success(&mut self) {
        self.last_active = Instant::now();
        self.call_count += 1;
        self.transition(BeanState::Active);
    }

    /// Record a failed construction
    pub fn record_error(&mut self, error: impl Into<String>) {
        self.last_active = Instant::now();
        self.error_count += 1;
        self.last_error = Some(error.into());
        self.transition(BeanState::Failed);
    }

    fn transition(&mut self, new_state: BeanState) {
        if self.state != new_state {
            tracing::debug!(
                from = %self.state,
                to = %new_state,
                "Bean state transition"
            );
            self.state = new_state;
        }
    }

    /// Time since registration
    pub fn uptime(&self) -> Duration {
        self.registered_at.elapsed()
    }

    /// Time since the last construction attempt
    pub fn idle_time(&self) -> Duration {
        self.last_active.elapsed()
    }

    /// Snapshot for reporting
    pub fn metrics(&self) -> BeanMetrics {
        let attempts = self.call_count + self.error_count;
        BeanMetrics {
            call_count: self.call_count,
            error_count: self.error_count,
            error_rate: if attempts > 0 {
                self.error_count as f64 / attempts as f64
            } else {
                0.0
            },
            last_error: self.last_error.clone(),
            uptime_seconds: self.uptime().as_secs(),
            idle_seconds: self.idle_time().as_secs(),
            state: self.state.to_string(),
            decorated: self.decorated,
        }
    }
}

/// Constructor metrics for health reporting
#[derive(Debug, Clone, serde::Serialize)]
pub struct BeanMetrics {
    /// Number of beans built
    pub call_count: u64,
    /// Number of failed constructions
    pub error_count: u64,
    /// Failed share of all attempts (0.0 to 1.0)
    pub error_rate: f64,
    pub last_error: Option<String>,
    pub uptime_seconds: u64,
    pub idle_seconds: u64,
    pub state: String,
    pub decorated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bean_state_display() {
        assert_eq!(format!("{}", BeanState::Active), "active");
        assert_eq!(format!("{}", BeanState::Failed), "failed");
        assert!(!BeanState::Failed.is_healthy());
    }

    #[test]
    fn test_bean_entry() {
        let mut entry = BeanEntry::new(true);
        assert_eq!(entry.state, BeanState::Registered);
        assert_eq!(entry.call_count, 0);

        entry.record_error("no backend");
        assert_eq!(entry.state, BeanState::Failed);
        assert_eq!(entry.error_count, 1);

        entry.record_success();
        assert_eq!(entry.state, BeanState::Active);

        let metrics = entry.metrics();
        assert_eq!(metrics.call_count, 1);
        assert!((metrics.error_rate - 0.5).abs() < f64::EPSILON);
        assert!(metrics.last_error.as_ref().unwrap().contains("no backend"));
        assert!(metrics.decorated);
    }
}
