use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use campaign_core::config::WizardConfig;
use campaign_core::event_bus::{make_event, ActivityType};
use campaign_core::stores::{CampaignStore, RecipientStore, TemplateStore};
use campaign_core::types::{
    Campaign, CampaignDraft, CampaignPayload, CampaignStatus, Letter, LetterStatus, Recipient,
    Template, WizardStep,
};
use campaign_core::{CampaignError, CampaignResult};
use campaign_personalization::{missing_fields, resolve, PreviewRequest, PreviewService};

use crate::state_machine::CampaignWizard;
use crate::types::{LetterPreview, SubmittedCampaign};
use crate::validators::validate_for_submission;

/// Performs the two external calls of the wizard: the personalize-step
/// preview and the final, single campaign creation.
#[derive(Clone)]
pub struct SubmissionOrchestrator {
    recipients: Arc<dyn RecipientStore>,
    templates: Arc<dyn TemplateStore>,
    campaigns: Arc<dyn CampaignStore>,
    previews: Arc<dyn PreviewService>,
    preview_timeout: Duration,
    submit_timeout: Duration,
}

impl std::fmt::Debug for SubmissionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionOrchestrator")
            .field("preview_timeout", &self.preview_timeout)
            .field("submit_timeout", &self.submit_timeout)
            .finish()
    }
}

impl SubmissionOrchestrator {
    pub fn new(
        recipients: Arc<dyn RecipientStore>,
        templates: Arc<dyn TemplateStore>,
        campaigns: Arc<dyn CampaignStore>,
        previews: Arc<dyn PreviewService>,
    ) -> Self {
        let defaults = WizardConfig::default();
        Self {
            recipients,
            templates,
            campaigns,
            previews,
            preview_timeout: Duration::from_millis(defaults.preview_timeout_ms),
            submit_timeout: Duration::from_millis(defaults.submit_timeout_ms),
        }
    }

    /// Apply the configured call budgets.
    pub fn with_timeouts(mut self, config: &WizardConfig) -> Self {
        self.preview_timeout = Duration::from_millis(config.preview_timeout_ms);
        self.submit_timeout = Duration::from_millis(config.submit_timeout_ms);
        self
    }

    // ------------------------------------------------------------------
    // Preview
    // ------------------------------------------------------------------

    /// Resolves the draft's template for one selected recipient and renders
    /// it through the handwriting preview service. Only available on the
    /// personalize step; failures never touch the draft.
    pub async fn preview(
        &self,
        wizard: &CampaignWizard,
        recipient_id: i64,
    ) -> CampaignResult<LetterPreview> {
        wizard.ensure_open()?;
        if wizard.current_step() != WizardStep::Personalize {
            return Err(CampaignError::InvalidTransition(format!(
                "previews are only available on the personalize step, not '{}'",
                wizard.current_step()
            )));
        }
        let draft = wizard.draft();
        if !draft.recipient_ids.contains(&recipient_id) {
            return Err(CampaignError::validation(
                WizardStep::Personalize,
                format!("Recipient {recipient_id} is not selected for this campaign."),
            ));
        }

        let result = with_budget(
            self.preview_timeout,
            self.render_preview(draft, recipient_id),
            CampaignError::PreviewGeneration,
        )
        .await
        .map_err(|e| match e {
            CampaignError::NotFound { .. }
            | CampaignError::Validation { .. }
            | CampaignError::PreviewGeneration(_) => e,
            other => CampaignError::PreviewGeneration(other.to_string()),
        });

        match &result {
            Ok(preview) => {
                info!(
                    session_id = %wizard.session_id(),
                    recipient_id,
                    missing = preview.missing_fields.len(),
                    "Preview generated"
                );
                wizard.emit(ActivityType::PreviewGenerated, None);
            }
            Err(e) => {
                warn!(session_id = %wizard.session_id(), recipient_id, error = %e, "Preview failed");
                wizard.emit(ActivityType::PreviewFailed, Some(e.to_string()));
            }
        }
        result
    }

    async fn render_preview(
        &self,
        draft: &CampaignDraft,
        recipient_id: i64,
    ) -> CampaignResult<LetterPreview> {
        let template = self.load_template(draft).await?;
        let recipient = self
            .recipients
            .get(recipient_id)
            .await?
            .ok_or_else(|| CampaignError::not_found("Recipient", recipient_id))?;

        let record = recipient.merge_record();
        let text = resolve(&template.content, &record);
        let image = self
            .previews
            .generate_preview(&PreviewRequest {
                text: text.clone(),
                style: draft.handwriting_style,
                paper: draft.paper_type,
            })
            .await?;

        Ok(LetterPreview {
            recipient_id,
            missing_fields: missing_fields(&template.content, &record),
            text,
            image_url: image.preview_url,
            style: draft.handwriting_style,
            paper: draft.paper_type,
        })
    }

    // ------------------------------------------------------------------
    // Submission
    // ------------------------------------------------------------------

    /// Submits the wizard's draft from the review step. On success the
    /// wizard is closed; on failure the draft is left exactly as it was.
    pub async fn submit(&self, wizard: &mut CampaignWizard) -> CampaignResult<SubmittedCampaign> {
        wizard.ensure_open()?;
        if wizard.current_step() != WizardStep::Review {
            return Err(CampaignError::InvalidTransition(format!(
                "campaigns can only be submitted from the review step, not '{}'",
                wizard.current_step()
            )));
        }

        match self.submit_draft(wizard.draft()).await {
            Ok(submitted) => {
                info!(
                    session_id = %wizard.session_id(),
                    campaign_id = submitted.campaign.id,
                    letters = submitted.letters.len(),
                    "Campaign submitted"
                );
                let mut event = make_event(
                    ActivityType::CampaignSubmitted,
                    wizard.session_id(),
                    Some(WizardStep::Review),
                    Some(submitted.campaign.name.clone()),
                );
                event.campaign_id = Some(submitted.campaign.id);
                wizard.emit_event(event);
                wizard.close();
                Ok(submitted)
            }
            Err(e) => {
                error!(session_id = %wizard.session_id(), error = %e, "Campaign submission failed");
                wizard.emit(ActivityType::SubmissionFailed, Some(e.to_string()));
                Err(e)
            }
        }
    }

    /// Re-validates `draft`, confirms its template and recipients still
    /// exist, and creates the campaign with a single store call.
    pub async fn submit_draft(&self, draft: &CampaignDraft) -> CampaignResult<SubmittedCampaign> {
        let payload = build_payload(draft)?;

        let submission = async {
            let template = self.load_template(draft).await?;
            let recipients = self.load_recipients(draft).await?;

            let campaign = self.campaigns.create(payload).await.map_err(|e| match e {
                CampaignError::Submission(_) => e,
                other => CampaignError::Submission(other.to_string()),
            })?;

            let letters = render_letters(&campaign, &template, &recipients);
            Ok::<_, CampaignError>(SubmittedCampaign { campaign, letters })
        };
        with_budget(self.submit_timeout, submission, CampaignError::Submission).await
    }

    async fn load_template(&self, draft: &CampaignDraft) -> CampaignResult<Template> {
        let template_id = draft.template_id.ok_or_else(|| {
            CampaignError::validation(
                WizardStep::Template,
                "Please select a template for your campaign.",
            )
        })?;
        self.templates
            .get(template_id)
            .await?
            .ok_or_else(|| CampaignError::not_found("Template", template_id))
    }

    /// Returns the selected recipients in id order, failing on the first id
    /// that no longer exists.
    async fn load_recipients(&self, draft: &CampaignDraft) -> CampaignResult<Vec<Recipient>> {
        let mut by_id: HashMap<i64, Recipient> = self
            .recipients
            .list()
            .await?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();
        draft
            .recipient_ids
            .iter()
            .map(|id| {
                by_id
                    .remove(id)
                    .ok_or_else(|| CampaignError::not_found("Recipient", *id))
            })
            .collect()
    }
}

/// Builds the store payload for a draft that passes the submission gates.
pub fn build_payload(draft: &CampaignDraft) -> CampaignResult<CampaignPayload> {
    validate_for_submission(draft)?;
    let template_id = draft.template_id.ok_or_else(|| {
        CampaignError::validation(WizardStep::Template, "Please select a template for your campaign.")
    })?;
    let status = if draft.start_date.is_some() {
        CampaignStatus::Scheduled
    } else {
        CampaignStatus::InProgress
    };

    Ok(CampaignPayload {
        name: draft.name.trim().to_string(),
        description: draft.description.clone(),
        status,
        template_id,
        recipient_ids: draft.recipient_ids.iter().map(|id| id.to_string()).collect(),
        start_date: draft.start_date,
        handwriting: draft.handwriting(),
    })
}

/// Personalizes the template for every recipient of a created campaign.
pub fn render_letters(campaign: &Campaign, template: &Template, recipients: &[Recipient]) -> Vec<Letter> {
    let status = match campaign.status {
        CampaignStatus::Scheduled => LetterStatus::Scheduled,
        _ => LetterStatus::Draft,
    };
    recipients
        .iter()
        .map(|recipient| Letter {
            campaign_id: campaign.id,
            recipient_id: recipient.id,
            recipient_name: recipient.full_name(),
            content: resolve(&template.content, &recipient.merge_record()),
            status,
            scheduled_for: campaign.start_date,
        })
        .collect()
}

/// Runs `fut` under `budget`, reporting an elapsed budget through
/// `on_timeout`.
async fn with_budget<T>(
    budget: Duration,
    fut: impl Future<Output = CampaignResult<T>>,
    on_timeout: fn(String) -> CampaignError,
) -> CampaignResult<T> {
    tokio::time::timeout(budget, fut)
        .await
        .unwrap_or_else(|_| Err(on_timeout(format!("timed out after {} ms", budget.as_millis()))))
}
