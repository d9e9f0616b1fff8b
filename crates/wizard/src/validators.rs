use serde::{Deserialize, Serialize};

use campaign_core::types::{CampaignDraft, WizardStep};
use campaign_core::{CampaignError, CampaignResult};

/// Steps whose gates are re-checked when the campaign is submitted.
pub const SUBMISSION_GATES: [WizardStep; 3] = [
    WizardStep::Recipients,
    WizardStep::Template,
    WizardStep::Personalize,
];

/// Result of running a step gate against a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepValidation {
    pub step: WizardStep,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl StepValidation {
    fn pass(step: WizardStep) -> Self {
        Self {
            step,
            valid: true,
            reason: None,
        }
    }

    fn fail(step: WizardStep, reason: &str) -> Self {
        Self {
            step,
            valid: false,
            reason: Some(reason.to_string()),
        }
    }

    pub fn into_result(self) -> CampaignResult<()> {
        if self.valid {
            Ok(())
        } else {
            Err(CampaignError::validation(
                self.step,
                self.reason.unwrap_or_default(),
            ))
        }
    }
}

/// Runs the gate for `step`. Gates only look at the draft; they never
/// consult stores.
pub fn validate_step(step: WizardStep, draft: &CampaignDraft) -> StepValidation {
    match step {
        WizardStep::Recipients if draft.recipient_ids.is_empty() => StepValidation::fail(
            step,
            "Please select at least one recipient for your campaign.",
        ),
        WizardStep::Template if draft.template_id.is_none() => {
            StepValidation::fail(step, "Please select a template for your campaign.")
        }
        WizardStep::Personalize if draft.name.trim().is_empty() => {
            StepValidation::fail(step, "Please provide a name for your campaign.")
        }
        WizardStep::Schedule if draft.start_date.is_none() && !draft.send_now => {
            StepValidation::fail(
                step,
                "Please select a start date for your campaign or choose to send it now.",
            )
        }
        _ => StepValidation::pass(step),
    }
}

/// Re-runs the submission gates in step order and returns the first failure.
pub fn validate_for_submission(draft: &CampaignDraft) -> CampaignResult<()> {
    SUBMISSION_GATES
        .iter()
        .try_for_each(|step| validate_step(*step, draft).into_result())
}
