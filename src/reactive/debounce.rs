use std::time::Duration;

use log::debug;
use tokio::time::Instant;

/// Work a quiet period ends in. A rebuild repositions too, so it wins
/// over a pending reposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PendingAction {
    Reposition,
    Rebuild,
}

/// One timer shared by every trigger of a page.
///
/// Each trigger restarts the quiet period with its own delay; the action
/// that fires is the strongest one requested since the last firing.
#[derive(Debug, Default)]
pub struct Debouncer {
    deadline: Option<Instant>,
    action: Option<PendingAction>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, action: PendingAction, delay: Duration) {
        self.schedule_at(action, Instant::now() + delay);
    }

    pub fn schedule_at(&mut self, action: PendingAction, deadline: Instant) {
        self.deadline = Some(deadline);
        self.action = Some(match self.action {
            Some(pending) => pending.max(action),
            None => action,
        });
        debug!("Scheduled {:?}", self.action);
    }

    /// When the pending action is due, if one is pending
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn pending(&self) -> Option<PendingAction> {
        self.action
    }

    /// Take the pending action once its quiet period has passed
    pub fn take_due(&mut self, now: Instant) -> Option<PendingAction> {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                self.action.take()
            }
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
        self.action = None;
    }
}
