//! Handwriting preview — renders personalized text as a handwritten image.
//!
//! The real generator is an external service; [`MockHandwritingService`]
//! stands in for it by waiting a fixed delay and returning a placeholder
//! image URL describing the requested style and paper.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;
use url::Url;

use campaign_core::config::HandwritingConfig;
use campaign_core::types::{HandwritingStyle, PaperType};
use campaign_core::{CampaignError, CampaignResult};

/// Input to a preview call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub text: String,
    pub style: HandwritingStyle,
    pub paper: PaperType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewImage {
    pub preview_url: String,
    pub generated_at: DateTime<Utc>,
}

#[async_trait]
pub trait PreviewService: Send + Sync {
    async fn generate_preview(&self, request: &PreviewRequest) -> CampaignResult<PreviewImage>;
}

pub struct MockHandwritingService {
    delay: Duration,
    base_url: Url,
}

impl MockHandwritingService {
    pub fn new(config: &HandwritingConfig) -> CampaignResult<Self> {
        let base_url = Url::parse(&config.placeholder_base_url).map_err(|e| {
            CampaignError::Config(format!(
                "invalid handwriting placeholder url '{}': {}",
                config.placeholder_base_url, e
            ))
        })?;
        Ok(Self {
            delay: Duration::from_millis(config.preview_delay_ms),
            base_url,
        })
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn placeholder_url(&self, style: HandwritingStyle, paper: PaperType) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().clear().append_pair(
            "text",
            &format!(
                "Handwritten Preview ({} style on {} paper)",
                style.as_str(),
                paper.as_str()
            ),
        );
        url
    }
}

#[async_trait]
impl PreviewService for MockHandwritingService {
    async fn generate_preview(&self, request: &PreviewRequest) -> CampaignResult<PreviewImage> {
        info!(
            style = request.style.as_str(),
            paper = request.paper.as_str(),
            chars = request.text.chars().count(),
            "Generating handwriting preview"
        );
        tokio::time::sleep(self.delay).await;
        Ok(PreviewImage {
            preview_url: self.placeholder_url(request.style, request.paper).into(),
            generated_at: Utc::now(),
        })
    }
}
