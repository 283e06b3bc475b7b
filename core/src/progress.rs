use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// A cooperative stop request shared between a search and its callers.
///
/// The search checks the token before producing each candidate, so a
/// cancellation is observed after at most one digest computation.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the search to stop.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Progress of a search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Overall progress in percent, between 0 and 100.
    pub percent: u8,
    /// The candidate being tested, empty once the search is exhausted.
    pub candidate: String,
}

/// Throttles progress events: one every `interval` tried candidates, and one for the last candidate.
/// The reported percentage never decreases.
#[derive(Clone, Debug)]
pub struct ProgressReporter {
    total: u64,
    interval: u64,
    last_percent: u8,
}

impl ProgressReporter {
    pub fn new(total: u64, interval: u64) -> Self {
        Self {
            total,
            interval: interval.max(1),
            last_percent: 0,
        }
    }

    /// Called when the tried count moves from `previous` to `tried`.
    /// Returns an event if a multiple of the interval was crossed or the last candidate was reached.
    pub fn observe(&mut self, previous: u64, tried: u64, candidate: &str) -> Option<ProgressEvent> {
        let crossed = tried / self.interval > previous / self.interval;
        let last = tried == self.total && previous < tried;

        if !crossed && !last {
            return None;
        }

        Some(self.event(self.percent(tried), candidate))
    }

    /// The final event of a search that matched or was exhausted.
    pub fn complete(&mut self, candidate: &str) -> ProgressEvent {
        self.event(100, candidate)
    }

    fn percent(&self, tried: u64) -> u8 {
        if self.total == 0 {
            return 100;
        }

        (tried as u128 * 100 / self.total as u128).min(100) as u8
    }

    fn event(&mut self, percent: u8, candidate: &str) -> ProgressEvent {
        self.last_percent = self.last_percent.max(percent);

        ProgressEvent {
            percent: self.last_percent,
            candidate: candidate.to_owned(),
        }
    }
}
