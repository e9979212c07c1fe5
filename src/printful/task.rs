//! Mockup task polling state machine
//!
//! Tracks how many status reads a generation task has consumed and decides,
//! for each observed status, whether to keep polling or stop. The machine is
//! pure; the client drives it and owns the actual status reads and the
//! sleeps between them.

// ============================================================================
// Poll Outcomes
// ============================================================================

/// Decision after one status read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Task still pending, read again after the poll interval
    Continue,
    /// Task finished and produced mockups
    Completed,
    /// The generator reported the task as failed
    Failed,
    /// Attempt budget exhausted without a terminal status
    TimedOut,
}

// ============================================================================
// Task Poller
// ============================================================================

/// Attempt accounting for one generation task
///
/// Every observed status consumes one attempt, including statuses that could
/// not be read at all. A terminal status always wins over exhaustion, so a
/// task that completes on the final read still reports `Completed`.
#[derive(Debug)]
pub struct TaskPoller {
    max_attempts: u32,
    attempts: u32,
}

impl TaskPoller {
    pub fn new(max_attempts: u32) -> Self {
        TaskPoller {
            max_attempts,
            attempts: 0,
        }
    }

    /// Status reads consumed so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Record one status read and decide what to do next
    pub fn observe(&mut self, status: Option<&str>) -> PollOutcome {
        self.attempts += 1;
        match status {
            Some("completed") => PollOutcome::Completed,
            Some("failed") => PollOutcome::Failed,
            _ => {
                if self.attempts >= self.max_attempts {
                    PollOutcome::TimedOut
                } else {
                    PollOutcome::Continue
                }
            }
        }
    }
}
