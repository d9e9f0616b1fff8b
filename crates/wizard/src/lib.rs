//! Campaign composition wizard — the ordered step machine that accumulates a
//! campaign draft, gates each step, previews personalized letters and
//! submits the finished campaign.

pub mod orchestrator;
pub mod state_machine;
pub mod types;
pub mod validators;

#[cfg(test)]
mod testing;

pub use orchestrator::SubmissionOrchestrator;
pub use state_machine::CampaignWizard;
pub use types::{LetterPreview, ReviewSection, SubmittedCampaign, WizardSummary};
pub use validators::{validate_step, StepValidation};
