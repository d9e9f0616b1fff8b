use thiserror::Error;
use uuid::Uuid;

use crate::types::WizardStep;

pub type CampaignResult<T> = Result<T, CampaignError>;

#[derive(Error, Debug)]
pub enum CampaignError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// A wizard step gate rejected the draft. Blocks forward navigation only.
    #[error("Step '{step}' is incomplete: {reason}")]
    Validation { step: WizardStep, reason: String },

    #[error("Preview generation failed: {0}")]
    PreviewGeneration(String),

    #[error("Campaign submission failed: {0}")]
    Submission(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Wizard session {0} not found")]
    SessionNotFound(Uuid),

    /// Malformed request input, such as an unknown step id or a blank name.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Session limit of {0} reached")]
    SessionLimit(usize),

    #[error("Invalid wizard transition: {0}")]
    InvalidTransition(String),

    #[error("Wizard session has already been submitted")]
    WizardClosed,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl CampaignError {
    pub fn validation(step: WizardStep, reason: impl Into<String>) -> Self {
        Self::Validation {
            step,
            reason: reason.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Stable machine-readable code used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_error",
            Self::Validation { .. } => "validation_failed",
            Self::PreviewGeneration(_) => "preview_failed",
            Self::Submission(_) => "submission_failed",
            Self::NotFound { .. } | Self::SessionNotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::SessionLimit(_) => "session_limit",
            Self::InvalidTransition(_) => "invalid_transition",
            Self::WizardClosed => "wizard_closed",
            Self::Serialization(_) => "serialization_error",
            Self::Internal(_) => "internal_error",
        }
    }
}
