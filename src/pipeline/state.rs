use std::fmt;
use thiserror::Error;

use crate::models::{SecurityTask, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskEvent {
    Rejected,
    Dispatched,
    Succeeded,
    Retry,
    GaveUp,
}

impl fmt::Display for TaskEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskEvent::Rejected => "rejected",
            TaskEvent::Dispatched => "dispatched",
            TaskEvent::Succeeded => "succeeded",
            TaskEvent::Retry => "retry",
            TaskEvent::GaveUp => "gave-up",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no transition from {from} on {event}")]
pub struct TransitionError {
    pub from: TaskStatus,
    pub event: TaskEvent,
}

pub fn next_status(from: TaskStatus, event: TaskEvent) -> Option<TaskStatus> {
    use TaskEvent::*;
    use TaskStatus::*;

    match (from, event) {
        (Pending, Rejected) => Some(Failed),
        (Pending, Dispatched) => Some(Running),
        (Running, Succeeded) => Some(Completed),
        (Running, Retry) => Some(Pending),
        (Running, GaveUp) => Some(Failed),
        _ => None,
    }
}

impl SecurityTask {
    pub fn advance(&mut self, event: TaskEvent) -> Result<TaskStatus, TransitionError> {
        let next = next_status(self.status, event).ok_or(TransitionError {
            from: self.status,
            event,
        })?;
        self.status = next;
        Ok(next)
    }
}
