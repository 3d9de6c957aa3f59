// Worker Domain Model

use serde::{Deserialize, Serialize};

/// Worker role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerRole {
    Producer,
    Consumer,
}

impl std::fmt::Display for WorkerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerRole::Producer => write!(f, "PRODUCER"),
            WorkerRole::Consumer => write!(f, "CONSUMER"),
        }
    }
}

/// Terminal state of a worker (Running is implicit while `run` executes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerOutcome {
    /// Quota fully processed
    Completed,
    /// Stopped early by a cancellation request
    Cancelled,
    /// Never reported back within the grace period and was detached
    Lost,
}

impl std::fmt::Display for WorkerOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerOutcome::Completed => write!(f, "COMPLETED"),
            WorkerOutcome::Cancelled => write!(f, "CANCELLED"),
            WorkerOutcome::Lost => write!(f, "LOST"),
        }
    }
}

/// What a worker did before terminating
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerReport {
    pub worker: String,
    pub role: WorkerRole,
    pub quota: usize,
    pub completed: usize,
    pub outcome: WorkerOutcome,
}

impl WorkerReport {
    pub fn is_complete(&self) -> bool {
        self.outcome == WorkerOutcome::Completed && self.completed == self.quota
    }
}

/// Action carried by an observability event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventAction {
    Produced,
    Consumed,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventAction::Produced => write!(f, "produced"),
            EventAction::Consumed => write!(f, "consumed"),
        }
    }
}

/// Advisory trace event: actor identity, action, item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerEvent {
    pub actor: String,
    pub action: EventAction,
    pub item: String,
}

impl std::fmt::Display for WorkerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}", self.actor, self.action, self.item)
    }
}
