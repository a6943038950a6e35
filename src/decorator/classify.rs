//! Calling-convention detection
//!
//! A method without a declared `methodType` is classified by observation: every call records
//! which convention it exhibited. Once enough evidence accumulates the
//! convention is pinned for the lifetime of the wrapping object.

use parking_lot::Mutex;

use super::texture::MethodType;
pub use crate::config::DEFAULT_PRECISE_THRESHOLD;

/// A probing method is pinned to `callback` once callback hits exceed this
/// share of the leading counter
pub const CALLBACK_DOMINANCE_RATIO: f64 = 0.7;

/// Observation counts per convention
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub promise: u32,
    pub callback: u32,
    pub general: u32,
}

impl Counters {
    fn slot(&mut self, kind: MethodType) -> &mut u32 {
        match kind {
            MethodType::Promise => &mut self.promise,
            MethodType::Callback => &mut self.callback,
            MethodType::General => &mut self.general,
        }
    }

    fn bump(&mut self, kind: MethodType) {
        let slot = self.slot(kind);
        *slot = slot.saturating_add(1);
    }

    fn get(&self, kind: MethodType) -> u32 {
        match kind {
            MethodType::Promise => self.promise,
            MethodType::Callback => self.callback,
            MethodType::General => self.general,
        }
    }

    fn max(&self) -> u32 {
        self.promise.max(self.callback).max(self.general)
    }

    fn total(&self) -> u64 {
        u64::from(self.promise) + u64::from(self.callback) + u64::from(self.general)
    }

    /// Keep only the bucket of `kind`
    fn retain(&mut self, kind: MethodType) {
        let kept = self.get(kind);
        *self = Counters::default();
        *self.slot(kind) = kept;
    }
}

#[derive(Debug)]
enum Phase {
    Probing {
        counters: Counters,
        leader: Option<MethodType>,
    },
    Pinned(MethodType),
}

/// Per-method convention state: `Probing -> Pinned`, nothing else
#[derive(Debug)]
pub struct Classifier {
    threshold: u32,
    phase: Mutex<Phase>,
}

impl Classifier {
    /// Start probing; a zero threshold is raised to 1
    pub fn probing(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            phase: Mutex::new(Phase::Probing {
                counters: Counters::default(),
                leader: None,
            }),
        }
    }

    /// Start pinned (declared `methodType`)
    pub fn pinned(method_type: MethodType) -> Self {
        Self {
            threshold: DEFAULT_PRECISE_THRESHOLD,
            phase: Mutex::new(Phase::Pinned(method_type)),
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// The pinned convention, if any
    pub fn current(&self) -> Option<MethodType> {
        match *self.phase.lock() {
            Phase::Pinned(method_type) => Some(method_type),
            Phase::Probing { .. } => None,
        }
    }

    /// Counters collected so far (zero once pinned)
    pub fn counters(&self) -> Counters {
        match &*self.phase.lock() {
            Phase::Probing { counters, .. } => *counters,
            Phase::Pinned(_) => Counters::default(),
        }
    }

    /// Record one observed call and return the pinned convention, if any
    pub fn observe(&self, kind: MethodType) -> Option<MethodType> {
        let mut phase = self.phase.lock();
        if let Phase::Pinned(method_type) = *phase {
            return Some(method_type);
        }
        let Phase::Probing { counters, leader } = &mut *phase else {
            return None;
        };

        counters.bump(kind);

        let current_leader = match *leader {
            Some(previous) if counters.get(previous) >= counters.get(kind) => previous,
            _ => kind,
        };
        if leader.is_some_and(|previous| previous != current_leader) {
            counters.retain(current_leader);
        }
        *leader = Some(current_leader);

        let max = counters.max();
        if max < self.threshold {
            return None;
        }

        let pinned = if f64::from(counters.callback) > CALLBACK_DOMINANCE_RATIO * f64::from(max) {
            Some(MethodType::Callback)
        } else if counters.total() == u64::from(max) {
            Some(current_leader)
        } else {
            None
        };

        if let Some(method_type) = pinned {
            tracing::debug!(
                method_type = %method_type,
                promise = counters.promise,
                callback = counters.callback,
                general = counters.general,
                "Pinned calling convention"
            );
            *phase = Phase::Pinned(method_type);
        }
        pinned
    }
}
