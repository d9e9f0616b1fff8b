//! In-memory collaborators for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use campaign_core::config::HandwritingConfig;
use campaign_core::event_bus::{capture_sink, CaptureSink};
use campaign_core::stores::{CampaignStore, RecipientStore, TemplateStore};
use campaign_core::types::{Campaign, CampaignPayload, DraftUpdate, Recipient, ScheduleChoice, Template};
use campaign_core::{CampaignError, CampaignResult};
use campaign_personalization::{MockHandwritingService, PreviewImage, PreviewRequest, PreviewService};

use crate::orchestrator::SubmissionOrchestrator;

pub(crate) struct MemoryRecipients(HashMap<i64, Recipient>);

#[async_trait]
impl RecipientStore for MemoryRecipients {
    async fn list(&self) -> CampaignResult<Vec<Recipient>> {
        let mut all: Vec<Recipient> = self.0.values().cloned().collect();
        all.sort_by_key(|r| r.id);
        Ok(all)
    }

    async fn get(&self, id: i64) -> CampaignResult<Option<Recipient>> {
        Ok(self.0.get(&id).cloned())
    }
}

pub(crate) struct MemoryTemplates(HashMap<i64, Template>);

#[async_trait]
impl TemplateStore for MemoryTemplates {
    async fn get(&self, id: i64) -> CampaignResult<Option<Template>> {
        Ok(self.0.get(&id).cloned())
    }
}

/// Campaign store that counts `create` calls and can be told to fail once.
#[derive(Default)]
pub(crate) struct RecordingCampaigns {
    calls: AtomicUsize,
    next_id: AtomicI64,
    fail_next: Mutex<Option<String>>,
}

impl RecordingCampaigns {
    pub(crate) fn create_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_next(&self, message: &str) {
        *self.fail_next.lock().unwrap() = Some(message.to_string());
    }
}

#[async_trait]
impl CampaignStore for RecordingCampaigns {
    async fn create(&self, payload: CampaignPayload) -> CampaignResult<Campaign> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.fail_next.lock().unwrap().take() {
            return Err(CampaignError::Submission(message));
        }
        Ok(Campaign {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            name: payload.name,
            description: payload.description,
            status: payload.status,
            template_id: payload.template_id,
            recipient_ids: payload.recipient_ids,
            start_date: payload.start_date,
            handwriting: payload.handwriting,
            created_at: Utc::now(),
        })
    }
}

pub(crate) struct FailingPreviews;

#[async_trait]
impl PreviewService for FailingPreviews {
    async fn generate_preview(&self, _request: &PreviewRequest) -> CampaignResult<PreviewImage> {
        Err(CampaignError::PreviewGeneration("renderer unavailable".to_string()))
    }
}

pub(crate) struct Fixture {
    pub recipients: Arc<MemoryRecipients>,
    pub templates: Arc<MemoryTemplates>,
    pub campaigns: Arc<RecordingCampaigns>,
    pub sink: Arc<CaptureSink>,
    pub orchestrator: SubmissionOrchestrator,
}

fn recipient(id: i64, first: &str, last: &str, company: &str) -> Recipient {
    Recipient {
        id,
        first_name: first.to_string(),
        last_name: last.to_string(),
        company: Some(company.to_string()),
        email: None,
        phone: None,
        address_line1: None,
        address_line2: None,
        city: None,
        state: None,
        postal_code: None,
        country: None,
        notes: None,
        attributes: HashMap::new(),
        created_at: Utc::now(),
    }
}

/// Recipients 1 (John / Widgets Inc) and 2 (Jane / Acme), template 5.
pub(crate) fn fixture() -> Fixture {
    let recipients = Arc::new(MemoryRecipients(HashMap::from([
        (1, recipient(1, "John", "Smith", "Widgets Inc")),
        (2, recipient(2, "Jane", "Doe", "Acme")),
    ])));
    let now = Utc::now();
    let templates = Arc::new(MemoryTemplates(HashMap::from([(
        5,
        Template {
            id: 5,
            name: "Welcome".to_string(),
            content: "Dear {{firstName}}, welcome to {{company}}.".to_string(),
            merge_fields: vec!["firstName".to_string(), "company".to_string()],
            created_at: now,
            updated_at: now,
        },
    )])));
    let campaigns = Arc::new(RecordingCampaigns::default());
    let previews = MockHandwritingService::new(&HandwritingConfig::default())
        .unwrap()
        .with_delay(Duration::ZERO);

    let orchestrator = SubmissionOrchestrator::new(
        recipients.clone(),
        templates.clone(),
        campaigns.clone(),
        Arc::new(previews),
    );

    Fixture {
        recipients,
        templates,
        campaigns,
        sink: capture_sink(),
        orchestrator,
    }
}

/// Draft answers for every step of the Q4 Outreach scenario.
pub(crate) fn complete_update() -> DraftUpdate {
    DraftUpdate {
        name: Some("Q4 Outreach".to_string()),
        recipient_ids: Some([1, 2].into_iter().collect()),
        template_id: Some(5),
        schedule: Some(ScheduleChoice::Date {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        }),
        ..Default::default()
    }
}
