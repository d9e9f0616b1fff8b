//! Activity event bus — trait for emitting wizard and campaign activity.
//!
//! The wizard and submission orchestrator accept an `Arc<dyn EventSink>` so
//! the hosting service can route activity into its audit log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::types::WizardStep;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    WizardStarted,
    StepAdvanced,
    StepRejected,
    PreviewGenerated,
    PreviewFailed,
    CampaignSubmitted,
    SubmissionFailed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub event_id: Uuid,
    pub activity: ActivityType,
    pub session_id: Uuid,
    pub step: Option<WizardStep>,
    pub campaign_id: Option<i64>,
    pub detail: Option<String>,
    pub timestamp: DateTime<Utc>,
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: ActivityEvent);
}

/// No-op sink for tests and hosts that don't record activity.
pub struct NoOpSink;

impl EventSink for NoOpSink {
    fn emit(&self, _event: ActivityEvent) {}
}

/// In-memory sink that captures events for testing.
#[derive(Default)]
pub struct CaptureSink {
    events: Mutex<Vec<ActivityEvent>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<ActivityEvent> {
        self.events.lock().expect("event bus mutex poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().expect("event bus mutex poisoned").len()
    }

    pub fn count_type(&self, activity: ActivityType) -> usize {
        self.events
            .lock()
            .expect("event bus mutex poisoned")
            .iter()
            .filter(|e| e.activity == activity)
            .count()
    }
}

impl EventSink for CaptureSink {
    fn emit(&self, event: ActivityEvent) {
        self.events.lock().expect("event bus mutex poisoned").push(event);
    }
}

/// Convenience builder for an `ActivityEvent` with minimal boilerplate.
pub fn make_event(
    activity: ActivityType,
    session_id: Uuid,
    step: Option<WizardStep>,
    detail: Option<String>,
) -> ActivityEvent {
    ActivityEvent {
        event_id: Uuid::new_v4(),
        activity,
        session_id,
        step,
        campaign_id: None,
        detail,
        timestamp: Utc::now(),
    }
}

pub fn noop_sink() -> Arc<dyn EventSink> {
    Arc::new(NoOpSink)
}

pub fn capture_sink() -> Arc<CaptureSink> {
    Arc::new(CaptureSink::new())
}
