use std::{thread::JoinHandle, time::Duration};

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};

use crate::{
    error::{UnhashError, UnhashResult},
    job::JobState,
    progress::{CancellationToken, ProgressEvent},
};

/// A plaintext found for the target digest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchResult {
    pub plaintext: String,
    pub digest: String,
}

/// An event emitted by a running search, in emission order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Throttled progress of the search.
    Progress(ProgressEvent),
    /// The target digest was found. Emitted at most once, right before a 100% progress event.
    Match(MatchResult),
    /// The search reached a terminal state. Always the last event.
    Finished(JobState),
}

/// How a search ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Matched(MatchResult),
    Exhausted,
    Cancelled,
}

impl Outcome {
    /// The terminal state corresponding to this outcome.
    pub fn state(&self) -> JobState {
        match self {
            Self::Matched(_) => JobState::Matched,
            Self::Exhausted => JobState::Exhausted,
            Self::Cancelled => JobState::Cancelled,
        }
    }

    pub fn found(&self) -> Option<&MatchResult> {
        match self {
            Self::Matched(found) => Some(found),
            _ => None,
        }
    }
}

/// Summary of a finished search.
#[derive(Clone, Debug)]
pub struct SearchReport {
    pub outcome: Outcome,
    /// The number of candidates (or lines) tried.
    pub tried: u64,
    /// The number of candidates (or lines) to try.
    pub total: u64,
    pub elapsed: Duration,
}

/// A handle to a search running on its own thread.
pub struct SearchHandle {
    pub(crate) thread_handle: JoinHandle<SearchReport>,
    pub(crate) receiver: Receiver<Event>,
    pub(crate) token: CancellationToken,
}

impl SearchHandle {
    /// Returns the report of the search.
    /// Blocks until the search is finished.
    pub fn join(self) -> UnhashResult<SearchReport> {
        self.thread_handle
            .join()
            .map_err(|_| UnhashError::WorkerPanicked)
    }

    /// Blocks until an event is received.
    /// Returns `None` once the search is finished and every event was received.
    pub fn recv(&self) -> Option<Event> {
        self.receiver.recv().ok()
    }

    /// Returns an event if one is pending.
    pub fn try_recv(&self) -> Result<Event, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Waits at most `timeout` for an event.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Event, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Requests the search to stop.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_finished(&self) -> bool {
        self.thread_handle.is_finished()
    }
}
