//! Wizard session registry.
//!
//! Each session owns one `CampaignWizard` behind a tokio mutex, so calls
//! for the same session run one at a time while sessions proceed in
//! parallel.

use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::info;
use uuid::Uuid;

use campaign_core::event_bus::{make_event, ActivityType, EventSink};
use campaign_core::types::{CampaignDraft, DraftUpdate, WizardStep};
use campaign_core::{CampaignError, CampaignResult};
use campaign_wizard::CampaignWizard;

pub type SharedWizard = Arc<Mutex<CampaignWizard>>;

struct SessionEntry {
    wizard: SharedWizard,
    last_touched: Instant,
}

/// Registry of open wizards. A session that has not been touched for
/// `ttl` is treated as abandoned and evicted.
pub struct WizardSessions {
    sessions: DashMap<Uuid, SessionEntry>,
    /// Slots taken, including sessions still being opened. Never exceeds
    /// `max_sessions`.
    reserved: AtomicUsize,
    max_sessions: usize,
    ttl: Duration,
    sink: Arc<dyn EventSink>,
}

impl WizardSessions {
    pub fn new(max_sessions: usize, ttl: Duration, sink: Arc<dyn EventSink>) -> Self {
        Self {
            sessions: DashMap::new(),
            reserved: AtomicUsize::new(0),
            max_sessions,
            ttl,
            sink,
        }
    }

    /// Opens a session. With a `step` the wizard is restored from a deep
    /// link and lands on the first step the draft cannot pass.
    pub fn open(
        &self,
        step: Option<WizardStep>,
        draft: Option<DraftUpdate>,
    ) -> CampaignResult<(Uuid, SharedWizard)> {
        if self.reserved.load(Ordering::SeqCst) >= self.max_sessions {
            self.evict_expired();
        }
        self.reserve_slot()?;

        let draft = CampaignDraft::new().with_update(draft.unwrap_or_default());
        let wizard = CampaignWizard::resume(step.unwrap_or(WizardStep::Recipients), draft)
            .with_event_sink(self.sink.clone());

        let session_id = wizard.session_id();
        let current = wizard.current_step();
        self.sink.emit(make_event(
            ActivityType::WizardStarted,
            session_id,
            Some(current),
            None,
        ));
        info!(%session_id, step = %current, "Wizard session opened");

        let shared = Arc::new(Mutex::new(wizard));
        self.sessions.insert(
            session_id,
            SessionEntry {
                wizard: shared.clone(),
                last_touched: Instant::now(),
            },
        );
        Ok((session_id, shared))
    }

    fn reserve_slot(&self) -> CampaignResult<()> {
        self.reserved
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |taken| {
                (taken < self.max_sessions).then_some(taken + 1)
            })
            .map(|_| ())
            .map_err(|_| CampaignError::SessionLimit(self.max_sessions))
    }

    /// Looks up a session and marks it as used.
    pub fn get(&self, id: Uuid) -> CampaignResult<SharedWizard> {
        let mut entry = self
            .sessions
            .get_mut(&id)
            .ok_or(CampaignError::SessionNotFound(id))?;
        entry.last_touched = Instant::now();
        Ok(entry.wizard.clone())
    }

    pub fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.remove(&id).is_some();
        if removed {
            self.reserved.fetch_sub(1, Ordering::SeqCst);
            info!(session_id = %id, "Wizard session closed");
        }
        removed
    }

    /// Drops every session idle for longer than the TTL. Returns how many
    /// were evicted.
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let mut expired = 0;
        self.sessions.retain(|id, entry| {
            let alive = now.duration_since(entry.last_touched) < self.ttl;
            if !alive {
                expired += 1;
                info!(session_id = %id, "Wizard session expired");
            }
            alive
        });
        if expired > 0 {
            self.reserved.fetch_sub(expired, Ordering::SeqCst);
            metrics::counter!("wizard.sessions.expired").increment(expired as u64);
        }
        expired
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
