use serde::{Deserialize, Serialize};
use uuid::Uuid;

use campaign_core::types::{
    Campaign, CampaignDraft, HandwritingStyle, Letter, PaperType, WizardStep,
};

use crate::validators::StepValidation;

/// Sections of the review screen that carry an "edit" link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewSection {
    Details,
    Recipients,
    Template,
    Personalize,
    Schedule,
}

impl ReviewSection {
    /// Step the edit link navigates to. Campaign name and description are
    /// captured on the personalize step.
    pub fn target_step(self) -> WizardStep {
        match self {
            ReviewSection::Details => WizardStep::Personalize,
            ReviewSection::Recipients => WizardStep::Recipients,
            ReviewSection::Template => WizardStep::Template,
            ReviewSection::Personalize => WizardStep::Personalize,
            ReviewSection::Schedule => WizardStep::Schedule,
        }
    }
}

/// Per-step readiness shown on the review screen and in the session view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepStatus {
    pub step: WizardStep,
    pub label: String,
    pub visited: bool,
    pub validation: StepValidation,
}

/// Snapshot of a wizard session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardSummary {
    pub session_id: Uuid,
    pub current_step: WizardStep,
    pub draft: CampaignDraft,
    pub steps: Vec<StepStatus>,
    pub can_submit: bool,
    pub closed: bool,
}

/// Resolved letter text plus the rendered handwriting image for one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterPreview {
    pub recipient_id: i64,
    pub text: String,
    pub missing_fields: Vec<String>,
    pub image_url: String,
    pub style: HandwritingStyle,
    pub paper: PaperType,
}

/// Outcome of a successful submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedCampaign {
    pub campaign: Campaign,
    pub letters: Vec<Letter>,
}
