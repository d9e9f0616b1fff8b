//! In-memory management store backed by DashMap.
//!
//! Implements the recipient, template and campaign collaborator traits the
//! wizard consumes, and doubles as the activity sink that records wizard
//! events next to entity changes.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::info;

use campaign_core::event_bus::{ActivityEvent, ActivityType, EventSink};
use campaign_core::stores::{CampaignStore, RecipientStore, TemplateStore};
use campaign_core::types::{Campaign, CampaignPayload, Letter, Recipient, Template};
use campaign_core::{CampaignError, CampaignResult};
use campaign_personalization::extract_merge_fields;

use crate::models::*;

const DEMO_USER: &str = "demo";

/// Thread-safe in-memory store for recipients, templates, campaigns and the
/// activity log.
pub struct ManagementStore {
    recipients: DashMap<i64, Recipient>,
    templates: DashMap<i64, Template>,
    campaigns: DashMap<i64, Campaign>,
    letters: DashMap<i64, StoredLetter>,
    activity_log: DashMap<i64, ActivityLogEntry>,
    next_recipient_id: AtomicI64,
    next_template_id: AtomicI64,
    next_campaign_id: AtomicI64,
    next_letter_id: AtomicI64,
    next_activity_id: AtomicI64,
}

impl ManagementStore {
    pub fn new() -> Self {
        info!("Management store initialized (in-memory)");
        Self {
            recipients: DashMap::new(),
            templates: DashMap::new(),
            campaigns: DashMap::new(),
            letters: DashMap::new(),
            activity_log: DashMap::new(),
            next_recipient_id: AtomicI64::new(1),
            next_template_id: AtomicI64::new(1),
            next_campaign_id: AtomicI64::new(1),
            next_letter_id: AtomicI64::new(1),
            next_activity_id: AtomicI64::new(1),
        }
    }

    /// A store pre-loaded with two recipients and the welcome template.
    pub fn seeded() -> Self {
        let store = Self::new();
        store.seed_demo_data();
        store
    }

    // ─── Recipients ────────────────────────────────────────────────────────

    pub fn list_recipients(&self) -> Vec<Recipient> {
        let mut recipients: Vec<Recipient> = self.recipients.iter().map(|r| r.value().clone()).collect();
        recipients.sort_by_key(|r| r.id);
        recipients
    }

    pub fn get_recipient(&self, id: i64) -> Option<Recipient> {
        self.recipients.get(&id).map(|r| r.value().clone())
    }

    pub fn create_recipient(&self, req: CreateRecipientRequest, user: &str) -> CampaignResult<Recipient> {
        self.insert_recipient(req, user, false)
    }

    /// Imports a list of recipients. Invalid rows are skipped and reported;
    /// the call fails only when nothing could be created.
    pub fn create_recipients_batch(
        &self,
        reqs: Vec<CreateRecipientRequest>,
        user: &str,
    ) -> CampaignResult<BatchRecipientsResponse> {
        if reqs.is_empty() {
            return Err(CampaignError::InvalidInput("No recipients provided".to_string()));
        }
        let mut response = BatchRecipientsResponse {
            recipients: Vec::with_capacity(reqs.len()),
            errors: Vec::new(),
        };
        for (index, req) in reqs.into_iter().enumerate() {
            match self.insert_recipient(req, user, true) {
                Ok(recipient) => response.recipients.push(recipient),
                Err(e) => response.errors.push(BatchRowError {
                    index,
                    message: e.to_string(),
                }),
            }
        }
        if response.recipients.is_empty() {
            return Err(CampaignError::InvalidInput(format!(
                "Failed to create any of {} recipients",
                response.errors.len()
            )));
        }
        info!(
            created = response.recipients.len(),
            rejected = response.errors.len(),
            "Recipient batch imported"
        );
        Ok(response)
    }

    fn insert_recipient(
        &self,
        req: CreateRecipientRequest,
        user: &str,
        batch_import: bool,
    ) -> CampaignResult<Recipient> {
        if req.first_name.trim().is_empty() || req.last_name.trim().is_empty() {
            return Err(CampaignError::InvalidInput(
                "Recipient first and last name are required".to_string(),
            ));
        }
        let recipient = Recipient {
            id: self.next_recipient_id.fetch_add(1, Ordering::SeqCst),
            first_name: req.first_name,
            last_name: req.last_name,
            company: req.company,
            email: req.email,
            phone: req.phone,
            address_line1: req.address_line1,
            address_line2: req.address_line2,
            city: req.city,
            state: req.state,
            postal_code: req.postal_code,
            country: req.country,
            notes: req.notes,
            attributes: req.attributes,
            created_at: Utc::now(),
        };
        self.recipients.insert(recipient.id, recipient.clone());
        let mut metadata = serde_json::json!({"recipientName": recipient.full_name()});
        if batch_import {
            metadata["batchImport"] = serde_json::Value::Bool(true);
        }
        self.log_activity(user, AuditAction::Create, "recipient", Some(recipient.id), metadata);
        Ok(recipient)
    }

    // ─── Templates ─────────────────────────────────────────────────────────

    pub fn list_templates(&self) -> Vec<Template> {
        let mut templates: Vec<Template> = self.templates.iter().map(|r| r.value().clone()).collect();
        templates.sort_by_key(|t| t.id);
        templates
    }

    pub fn get_template(&self, id: i64) -> Option<Template> {
        self.templates.get(&id).map(|r| r.value().clone())
    }

    pub fn create_template(&self, req: CreateTemplateRequest, user: &str) -> CampaignResult<Template> {
        if req.name.trim().is_empty() {
            return Err(CampaignError::InvalidInput("Template name is required".to_string()));
        }
        if req.content.trim().is_empty() {
            return Err(CampaignError::InvalidInput("Template content is required".to_string()));
        }
        let now = Utc::now();
        let merge_fields = req
            .merge_fields
            .unwrap_or_else(|| extract_merge_fields(&req.content));
        let template = Template {
            id: self.next_template_id.fetch_add(1, Ordering::SeqCst),
            name: req.name,
            content: req.content,
            merge_fields,
            created_at: now,
            updated_at: now,
        };
        self.templates.insert(template.id, template.clone());
        self.log_activity(
            user,
            AuditAction::Create,
            "template",
            Some(template.id),
            serde_json::json!({"templateName": &template.name}),
        );
        Ok(template)
    }

    // ─── Campaigns ─────────────────────────────────────────────────────────

    /// Newest first.
    pub fn list_campaigns(&self) -> Vec<Campaign> {
        let mut campaigns: Vec<Campaign> = self.campaigns.iter().map(|r| r.value().clone()).collect();
        campaigns.sort_by(|a, b| b.id.cmp(&a.id));
        campaigns
    }

    pub fn get_campaign(&self, id: i64) -> Option<Campaign> {
        self.campaigns.get(&id).map(|r| r.value().clone())
    }

    /// Applies a partial update. Status changes must follow the campaign
    /// lifecycle.
    pub fn update_campaign(
        &self,
        id: i64,
        req: UpdateCampaignRequest,
        user: &str,
    ) -> CampaignResult<Campaign> {
        let updated = {
            let mut campaign = self
                .campaigns
                .get_mut(&id)
                .ok_or_else(|| CampaignError::not_found("Campaign", id))?;
            if let Some(name) = &req.name {
                if name.trim().is_empty() {
                    return Err(CampaignError::InvalidInput("Campaign name is required".to_string()));
                }
            }
            if let Some(status) = req.status {
                if !campaign.status.can_transition_to(status) {
                    return Err(CampaignError::InvalidTransition(format!(
                        "campaign {id} cannot move from {} to {status}",
                        campaign.status
                    )));
                }
                campaign.status = status;
            }
            if let Some(name) = req.name {
                campaign.name = name;
            }
            if let Some(description) = req.description {
                campaign.description = if description.trim().is_empty() {
                    None
                } else {
                    Some(description)
                };
            }
            campaign.clone()
        };
        info!(campaign_id = id, status = %updated.status, "Campaign updated");
        self.log_activity(
            user,
            AuditAction::Update,
            "campaign",
            Some(id),
            serde_json::json!({"campaignName": &updated.name, "status": updated.status}),
        );
        Ok(updated)
    }

    fn insert_campaign(&self, payload: CampaignPayload, user: &str) -> Campaign {
        let campaign = Campaign {
            id: self.next_campaign_id.fetch_add(1, Ordering::SeqCst),
            name: payload.name,
            description: payload.description,
            status: payload.status,
            template_id: payload.template_id,
            recipient_ids: payload.recipient_ids,
            start_date: payload.start_date,
            handwriting: payload.handwriting,
            created_at: Utc::now(),
        };
        self.campaigns.insert(campaign.id, campaign.clone());
        self.log_activity(
            user,
            AuditAction::Create,
            "campaign",
            Some(campaign.id),
            serde_json::json!({"campaignName": &campaign.name}),
        );
        campaign
    }

    // ─── Letters ───────────────────────────────────────────────────────────

    /// Keeps the letters rendered for a submitted campaign.
    pub fn save_letters(&self, letters: &[Letter]) -> Vec<StoredLetter> {
        let created_at = Utc::now();
        letters
            .iter()
            .map(|letter| {
                let stored = StoredLetter {
                    id: self.next_letter_id.fetch_add(1, Ordering::SeqCst),
                    letter: letter.clone(),
                    created_at,
                };
                self.letters.insert(stored.id, stored.clone());
                stored
            })
            .collect()
    }

    /// All letters, or those of one campaign, in creation order.
    pub fn list_letters(&self, campaign_id: Option<i64>) -> CampaignResult<Vec<StoredLetter>> {
        if let Some(id) = campaign_id {
            if !self.campaigns.contains_key(&id) {
                return Err(CampaignError::not_found("Campaign", id));
            }
        }
        let mut letters: Vec<StoredLetter> = self
            .letters
            .iter()
            .filter(|r| campaign_id.map_or(true, |id| r.letter.campaign_id == id))
            .map(|r| r.value().clone())
            .collect();
        letters.sort_by_key(|l| l.id);
        Ok(letters)
    }

    // ─── Activity log ──────────────────────────────────────────────────────

    /// Newest first.
    pub fn activity_log(&self) -> Vec<ActivityLogEntry> {
        let mut entries: Vec<ActivityLogEntry> = self.activity_log.iter().map(|r| r.value().clone()).collect();
        entries.sort_by(|a, b| b.id.cmp(&a.id));
        entries
    }

    fn log_activity(
        &self,
        user: &str,
        action: AuditAction,
        entity_type: &str,
        entity_id: Option<i64>,
        metadata: serde_json::Value,
    ) {
        self.push_activity(ActivityLogEntry {
            id: self.next_activity_id.fetch_add(1, Ordering::SeqCst),
            user: user.to_string(),
            action,
            entity_type: entity_type.to_string(),
            entity_id,
            session_id: None,
            metadata,
            created_at: Utc::now(),
        });
    }

    fn push_activity(&self, entry: ActivityLogEntry) {
        self.activity_log.insert(entry.id, entry);
    }

    // ─── Seed Data ─────────────────────────────────────────────────────────

    fn seed_demo_data(&self) {
        let recipients = [
            ("John", "Smith", "Acme Corp", "john@example.com", "123 Main St", "New York", "NY", "10001"),
            ("Jane", "Doe", "Widgets Inc", "jane@example.com", "456 Broad St", "San Francisco", "CA", "94107"),
        ];
        for (first, last, company, email, street, city, state, zip) in recipients {
            let req = CreateRecipientRequest {
                first_name: first.to_string(),
                last_name: last.to_string(),
                company: Some(company.to_string()),
                email: Some(email.to_string()),
                address_line1: Some(street.to_string()),
                city: Some(city.to_string()),
                state: Some(state.to_string()),
                postal_code: Some(zip.to_string()),
                country: Some("USA".to_string()),
                ..Default::default()
            };
            if let Err(e) = self.create_recipient(req, DEMO_USER) {
                tracing::warn!(error = %e, "Skipping demo recipient");
            }
        }

        let welcome = CreateTemplateRequest {
            name: "Welcome Letter".to_string(),
            content: "Dear {{firstName}},\n\nThank you for your interest in our services. We're excited to work with you and {{company}}.\n\nBest regards,\nDemo User".to_string(),
            merge_fields: None,
        };
        if let Err(e) = self.create_template(welcome, DEMO_USER) {
            tracing::warn!(error = %e, "Skipping demo template");
        }

        info!(
            recipients = self.recipients.len(),
            templates = self.templates.len(),
            "Seeded demo data"
        );
    }
}

impl Default for ManagementStore {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Collaborator traits ───────────────────────────────────────────────────

#[async_trait]
impl RecipientStore for ManagementStore {
    async fn list(&self) -> CampaignResult<Vec<Recipient>> {
        Ok(self.list_recipients())
    }

    async fn get(&self, id: i64) -> CampaignResult<Option<Recipient>> {
        Ok(self.get_recipient(id))
    }
}

#[async_trait]
impl TemplateStore for ManagementStore {
    async fn get(&self, id: i64) -> CampaignResult<Option<Template>> {
        Ok(self.get_template(id))
    }
}

#[async_trait]
impl CampaignStore for ManagementStore {
    async fn create(&self, payload: CampaignPayload) -> CampaignResult<Campaign> {
        if payload.name.trim().is_empty() {
            return Err(CampaignError::Submission("campaign name is required".to_string()));
        }
        if !self.templates.contains_key(&payload.template_id) {
            return Err(CampaignError::Submission(format!(
                "template {} does not exist",
                payload.template_id
            )));
        }
        Ok(self.insert_campaign(payload, DEMO_USER))
    }
}

/// Wizard activity lands in the activity log and the metrics registry.
impl EventSink for ManagementStore {
    fn emit(&self, event: ActivityEvent) {
        match event.activity {
            ActivityType::WizardStarted => metrics::counter!("wizard.sessions.created").increment(1),
            ActivityType::StepAdvanced => metrics::counter!("wizard.steps.advanced").increment(1),
            ActivityType::StepRejected => metrics::counter!("wizard.steps.rejected").increment(1),
            ActivityType::PreviewGenerated => metrics::counter!("wizard.previews.generated").increment(1),
            ActivityType::PreviewFailed => metrics::counter!("wizard.previews.failed").increment(1),
            ActivityType::CampaignSubmitted => metrics::counter!("campaigns.submitted").increment(1),
            ActivityType::SubmissionFailed => metrics::counter!("campaigns.submission_failed").increment(1),
        }
        self.push_activity(ActivityLogEntry {
            id: self.next_activity_id.fetch_add(1, Ordering::SeqCst),
            user: DEMO_USER.to_string(),
            action: event.activity.into(),
            entity_type: "wizard_session".to_string(),
            entity_id: event.campaign_id,
            session_id: Some(event.session_id),
            metadata: serde_json::json!({
                "eventId": event.event_id,
                "step": event.step,
                "detail": event.detail,
            }),
            created_at: event.timestamp,
        });
    }
}
