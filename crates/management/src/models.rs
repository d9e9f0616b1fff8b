//! Management API types — entity create requests, wizard session requests,
//! the activity log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use campaign_core::event_bus::ActivityType;
use campaign_core::types::{CampaignStatus, DraftUpdate, Letter, Recipient};
use campaign_wizard::ReviewSection;

// ─── Recipients ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecipientRequest {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address_line1: Option<String>,
    #[serde(default)]
    pub address_line2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchRecipientsRequest {
    pub recipients: Vec<CreateRecipientRequest>,
}

/// Rows that failed validation are reported by position; the rest are
/// created.
#[derive(Debug, Clone, Serialize)]
pub struct BatchRecipientsResponse {
    pub recipients: Vec<Recipient>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<BatchRowError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchRowError {
    pub index: usize,
    pub message: String,
}

// ─── Templates ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplateRequest {
    pub name: String,
    pub content: String,
    /// Extracted from `content` when omitted.
    #[serde(default)]
    pub merge_fields: Option<Vec<String>>,
}

// ─── Campaigns ─────────────────────────────────────────────────────────────

/// Body of `PUT /api/campaigns/:id`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCampaignRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<CampaignStatus>,
}

// ─── Letters ───────────────────────────────────────────────────────────────

/// A rendered letter as kept after its campaign was submitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredLetter {
    pub id: i64,
    #[serde(flatten)]
    pub letter: Letter,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LettersQuery {
    #[serde(default)]
    pub campaign_id: Option<i64>,
}

// ─── Wizard sessions ───────────────────────────────────────────────────────

/// Body of `POST /api/wizard/sessions`. Both fields are optional; together
/// they form a deep link into a partially completed wizard.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub step: Option<String>,
    #[serde(default)]
    pub draft: Option<DraftUpdate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JumpRequest {
    pub step: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditRequest {
    pub section: ReviewSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewLetterRequest {
    pub recipient_id: i64,
}

// ─── Activity log ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogEntry {
    pub id: i64,
    pub user: String,
    pub action: AuditAction,
    pub entity_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    WizardStarted,
    StepAdvanced,
    StepRejected,
    PreviewGenerated,
    PreviewFailed,
    CampaignSubmitted,
    SubmissionFailed,
}

impl From<ActivityType> for AuditAction {
    fn from(activity: ActivityType) -> Self {
        match activity {
            ActivityType::WizardStarted => AuditAction::WizardStarted,
            ActivityType::StepAdvanced => AuditAction::StepAdvanced,
            ActivityType::StepRejected => AuditAction::StepRejected,
            ActivityType::PreviewGenerated => AuditAction::PreviewGenerated,
            ActivityType::PreviewFailed => AuditAction::PreviewFailed,
            ActivityType::CampaignSubmitted => AuditAction::CampaignSubmitted,
            ActivityType::SubmissionFailed => AuditAction::SubmissionFailed,
        }
    }
}

// ─── API Response types ────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
