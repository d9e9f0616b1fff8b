//! Axum REST handlers for recipients, templates, campaigns and wizard
//! sessions.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use campaign_core::config::AppConfig;
use campaign_core::types::{Campaign, DraftUpdate, Recipient, Template, WizardStep};
use campaign_core::{CampaignError, CampaignResult};
use campaign_personalization::MockHandwritingService;
use campaign_wizard::{LetterPreview, SubmissionOrchestrator, SubmittedCampaign, WizardSummary};

use crate::models::*;
use crate::sessions::WizardSessions;
use crate::store::ManagementStore;

const API_USER: &str = "admin";

/// Shared management state.
#[derive(Clone)]
pub struct ManagementState {
    pub store: Arc<ManagementStore>,
    pub sessions: Arc<WizardSessions>,
    pub orchestrator: SubmissionOrchestrator,
}

impl ManagementState {
    /// Wires the in-memory store, the session registry and the submission
    /// orchestrator from configuration.
    pub fn from_config(config: &AppConfig) -> CampaignResult<Self> {
        let store = Arc::new(if config.store.seed_demo_data {
            ManagementStore::seeded()
        } else {
            ManagementStore::new()
        });
        let previews = Arc::new(MockHandwritingService::new(&config.handwriting)?);
        let orchestrator =
            SubmissionOrchestrator::new(store.clone(), store.clone(), store.clone(), previews)
                .with_timeouts(&config.wizard);
        let sessions = Arc::new(WizardSessions::new(
            config.wizard.max_sessions,
            Duration::from_secs(config.wizard.session_ttl_secs),
            store.clone(),
        ));
        Ok(Self {
            store,
            sessions,
            orchestrator,
        })
    }
}

/// Maps domain errors onto HTTP responses.
#[derive(Debug)]
pub struct ApiError(pub CampaignError);

impl From<CampaignError> for ApiError {
    fn from(err: CampaignError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            CampaignError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            CampaignError::PreviewGeneration(_) | CampaignError::Submission(_) => StatusCode::BAD_GATEWAY,
            CampaignError::NotFound { .. } | CampaignError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            CampaignError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            CampaignError::InvalidTransition(_) => StatusCode::CONFLICT,
            CampaignError::WizardClosed => StatusCode::GONE,
            CampaignError::SessionLimit(_) => StatusCode::SERVICE_UNAVAILABLE,
            CampaignError::Config(_) | CampaignError::Serialization(_) | CampaignError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }
        let body = ErrorResponse {
            error: self.0.code().to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ─── Recipients ────────────────────────────────────────────────────────────

pub async fn list_recipients(State(state): State<ManagementState>) -> Json<Vec<Recipient>> {
    Json(state.store.list_recipients())
}

pub async fn get_recipient(
    State(state): State<ManagementState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Recipient>> {
    state
        .store
        .get_recipient(id)
        .map(Json)
        .ok_or_else(|| CampaignError::not_found("Recipient", id).into())
}

pub async fn create_recipient(
    State(state): State<ManagementState>,
    Json(req): Json<CreateRecipientRequest>,
) -> ApiResult<(StatusCode, Json<Recipient>)> {
    let recipient = state.store.create_recipient(req, API_USER)?;
    metrics::counter!("management.recipients.created").increment(1);
    Ok((StatusCode::CREATED, Json(recipient)))
}

pub async fn create_recipients_batch(
    State(state): State<ManagementState>,
    Json(req): Json<BatchRecipientsRequest>,
) -> ApiResult<(StatusCode, Json<BatchRecipientsResponse>)> {
    let response = state.store.create_recipients_batch(req.recipients, API_USER)?;
    metrics::counter!("management.recipients.created").increment(response.recipients.len() as u64);
    Ok((StatusCode::CREATED, Json(response)))
}

// ─── Templates ─────────────────────────────────────────────────────────────

pub async fn list_templates(State(state): State<ManagementState>) -> Json<Vec<Template>> {
    Json(state.store.list_templates())
}

pub async fn get_template(
    State(state): State<ManagementState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Template>> {
    state
        .store
        .get_template(id)
        .map(Json)
        .ok_or_else(|| CampaignError::not_found("Template", id).into())
}

pub async fn create_template(
    State(state): State<ManagementState>,
    Json(req): Json<CreateTemplateRequest>,
) -> ApiResult<(StatusCode, Json<Template>)> {
    let template = state.store.create_template(req, API_USER)?;
    metrics::counter!("management.templates.created").increment(1);
    Ok((StatusCode::CREATED, Json(template)))
}

// ─── Campaigns ─────────────────────────────────────────────────────────────

pub async fn list_campaigns(State(state): State<ManagementState>) -> Json<Vec<Campaign>> {
    Json(state.store.list_campaigns())
}

pub async fn get_campaign(
    State(state): State<ManagementState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Campaign>> {
    state
        .store
        .get_campaign(id)
        .map(Json)
        .ok_or_else(|| CampaignError::not_found("Campaign", id).into())
}

pub async fn update_campaign(
    State(state): State<ManagementState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCampaignRequest>,
) -> ApiResult<Json<Campaign>> {
    Ok(Json(state.store.update_campaign(id, req, API_USER)?))
}

// ─── Letters ───────────────────────────────────────────────────────────────

pub async fn list_letters(
    State(state): State<ManagementState>,
    Query(query): Query<LettersQuery>,
) -> ApiResult<Json<Vec<StoredLetter>>> {
    Ok(Json(state.store.list_letters(query.campaign_id)?))
}

// ─── Activity log ──────────────────────────────────────────────────────────

pub async fn activity_log(State(state): State<ManagementState>) -> Json<Vec<ActivityLogEntry>> {
    Json(state.store.activity_log())
}

// ─── Wizard sessions ───────────────────────────────────────────────────────

/// Opens a wizard session. An empty body starts a blank wizard; a body that
/// does not parse is rejected rather than ignored.
pub async fn create_session(
    State(state): State<ManagementState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<WizardSummary>)> {
    let req: CreateSessionRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CreateSessionRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| CampaignError::InvalidInput(format!("invalid session request: {e}")))?
    };
    let step = req.step.as_deref().map(str::parse::<WizardStep>).transpose()?;
    let (_, wizard) = state.sessions.open(step, req.draft)?;
    let summary = wizard.lock().await.summary();
    Ok((StatusCode::CREATED, Json(summary)))
}

pub async fn get_session(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<WizardSummary>> {
    let wizard = state.sessions.get(id)?;
    let summary = wizard.lock().await.summary();
    Ok(Json(summary))
}

pub async fn delete_session(State(state): State<ManagementState>, Path(id): Path<Uuid>) -> StatusCode {
    if state.sessions.remove(id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

pub async fn update_draft(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
    Json(update): Json<DraftUpdate>,
) -> ApiResult<Json<WizardSummary>> {
    let wizard = state.sessions.get(id)?;
    let mut wizard = wizard.lock().await;
    wizard.update_draft(update)?;
    Ok(Json(wizard.summary()))
}

pub async fn next_step(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<WizardSummary>> {
    let wizard = state.sessions.get(id)?;
    let mut wizard = wizard.lock().await;
    wizard.next()?;
    Ok(Json(wizard.summary()))
}

pub async fn previous_step(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<WizardSummary>> {
    let wizard = state.sessions.get(id)?;
    let mut wizard = wizard.lock().await;
    wizard.previous()?;
    Ok(Json(wizard.summary()))
}

pub async fn jump_to_step(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
    Json(req): Json<JumpRequest>,
) -> ApiResult<Json<WizardSummary>> {
    let step: WizardStep = req.step.parse()?;
    let wizard = state.sessions.get(id)?;
    let mut wizard = wizard.lock().await;
    wizard.jump_to(step)?;
    Ok(Json(wizard.summary()))
}

pub async fn edit_section(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
    Json(req): Json<EditRequest>,
) -> ApiResult<Json<WizardSummary>> {
    let wizard = state.sessions.get(id)?;
    let mut wizard = wizard.lock().await;
    wizard.edit_section(req.section)?;
    Ok(Json(wizard.summary()))
}

pub async fn preview_letter(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
    Json(req): Json<PreviewLetterRequest>,
) -> ApiResult<Json<LetterPreview>> {
    let wizard = state.sessions.get(id)?;
    let wizard = wizard.lock().await;
    let preview = state.orchestrator.preview(&wizard, req.recipient_id).await?;
    Ok(Json(preview))
}

/// Submits the session's draft. Once the campaign exists the session is
/// discarded and its letters are kept; on failure it stays open for another
/// attempt.
pub async fn submit_session(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<SubmittedCampaign>)> {
    let wizard = state.sessions.get(id)?;
    let submitted = {
        let mut wizard = wizard.lock().await;
        state.orchestrator.submit(&mut wizard).await?
    };
    state.sessions.remove(id);
    state.store.save_letters(&submitted.letters);
    Ok((StatusCode::CREATED, Json(submitted)))
}
