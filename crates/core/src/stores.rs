//! Collaborator interfaces consumed by the campaign wizard.
//!
//! The wizard never owns persistence; it reads recipients and templates and
//! performs a single `create` against the campaign store on submission.
//! In-memory implementations live in `campaign-management`.

use async_trait::async_trait;

use crate::error::CampaignResult;
use crate::types::{Campaign, CampaignPayload, Recipient, Template};

#[async_trait]
pub trait RecipientStore: Send + Sync {
    async fn list(&self) -> CampaignResult<Vec<Recipient>>;

    async fn get(&self, id: i64) -> CampaignResult<Option<Recipient>>;
}

#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn get(&self, id: i64) -> CampaignResult<Option<Template>>;
}

#[async_trait]
pub trait CampaignStore: Send + Sync {
    /// Persists a campaign. Called exactly once per submission attempt.
    async fn create(&self, payload: CampaignPayload) -> CampaignResult<Campaign>;
}
