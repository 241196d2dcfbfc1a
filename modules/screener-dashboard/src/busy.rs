use std::collections::BTreeMap;
use std::sync::Mutex;

/// Loads that count toward the busy indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LoadKind {
    WeekendScan,
    DailyPool,
    Signals,
}

/// Per-kind in-flight counters. Busy means at least one counter is non-zero,
/// so a load finishing never hides another one that is still pending.
#[derive(Debug, Default)]
pub struct InFlight {
    counts: Mutex<BTreeMap<LoadKind, usize>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self, kind: LoadKind) {
        *self.lock().entry(kind).or_insert(0) += 1;
    }

    /// Record a load settling. Returns whether anything is still in flight.
    pub fn finish(&self, kind: LoadKind) -> bool {
        let mut counts = self.lock();
        if let Some(n) = counts.get_mut(&kind) {
            *n = n.saturating_sub(1);
            if *n == 0 {
                counts.remove(&kind);
            }
        }
        !counts.is_empty()
    }

    pub fn is_busy(&self) -> bool {
        !self.lock().is_empty()
    }

    pub fn pending(&self, kind: LoadKind) -> usize {
        self.lock().get(&kind).copied().unwrap_or(0)
    }

    /// Kinds with at least one load in flight, in a stable order.
    pub fn active(&self) -> Vec<LoadKind> {
        self.lock().keys().copied().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<LoadKind, usize>> {
        self.counts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
