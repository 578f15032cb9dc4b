//! Connection status tracking and stale-response gating

use crate::api::models::ConnectionInfo;
use crate::error::ApiError;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Untested,
    Testing,
    Success,
    Failed(String),
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Untested => write!(f, "untested"),
            ConnectionStatus::Testing => write!(f, "testing"),
            ConnectionStatus::Success => write!(f, "success"),
            ConnectionStatus::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Connection status for one session; never persisted.
///
/// `Untested -> Testing -> {Success, Failed}`, and `Success | Failed -> Testing`
/// on an explicit retry.
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    status: ConnectionStatus,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    pub fn begin(&mut self) -> Result<(), ApiError> {
        if self.status == ConnectionStatus::Testing {
            return Err(self.invalid(ConnectionStatus::Testing));
        }
        self.status = ConnectionStatus::Testing;
        Ok(())
    }

    pub fn complete(&mut self, result: &Result<ConnectionInfo, ApiError>) -> Result<(), ApiError> {
        let next = match result {
            Ok(_) => ConnectionStatus::Success,
            Err(e) => ConnectionStatus::Failed(e.to_string()),
        };
        if self.status != ConnectionStatus::Testing {
            return Err(self.invalid(next));
        }
        self.status = next;
        Ok(())
    }

    /// Begin a test whose outcome is recorded through the returned guard.
    ///
    /// Dropping the guard without [`TestAttempt::finish`] (the test future was
    /// cancelled) leaves the tracker in `Failed("cancelled")`, so a later
    /// retry can begin again.
    pub fn attempt(&mut self) -> Result<TestAttempt<'_>, ApiError> {
        self.begin()?;
        Ok(TestAttempt {
            tracker: self,
            finished: false,
        })
    }

    fn invalid(&self, to: ConnectionStatus) -> ApiError {
        ApiError::InvalidTransition {
            from: self.status.to_string(),
            to: to.to_string(),
        }
    }
}

pub const CANCELLED_REASON: &str = "cancelled";

/// An in-flight connection test; see [`ConnectionTracker::attempt`]
#[derive(Debug)]
pub struct TestAttempt<'a> {
    tracker: &'a mut ConnectionTracker,
    finished: bool,
}

impl TestAttempt<'_> {
    pub fn finish(mut self, result: &Result<ConnectionInfo, ApiError>) -> Result<(), ApiError> {
        self.finished = true;
        self.tracker.complete(result)
    }
}

impl Drop for TestAttempt<'_> {
    fn drop(&mut self) {
        if !self.finished && self.tracker.status == ConnectionStatus::Testing {
            log::debug!("connection test dropped before completing");
            self.tracker.status = ConnectionStatus::Failed(CANCELLED_REASON.to_string());
        }
    }
}

#[derive(Debug, Default)]
struct GateState {
    latest: AtomicU64,
    closed: AtomicBool,
}

/// Issues request tickets so callers can drop responses that were superseded
/// by a newer request, or that belong to something already torn down.
#[derive(Debug, Clone, Default)]
pub struct RequestGate {
    state: Arc<GateState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    generation: u64,
}

impl RequestGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> RequestTicket {
        let generation = self.state.latest.fetch_add(1, Ordering::SeqCst) + 1;
        RequestTicket { generation }
    }

    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        !self.is_closed() && self.state.latest.load(Ordering::SeqCst) == ticket.generation
    }

    /// Invalidate every outstanding ticket, now and in the future.
    pub fn close(&self) {
        self.state.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::SeqCst)
    }
}
