//! Shared domain types, configuration, errors and collaborator interfaces
//! for the handwritten-letter campaign service.

pub mod config;
pub mod error;
pub mod event_bus;
pub mod stores;
pub mod types;

pub use config::AppConfig;
pub use error::{CampaignError, CampaignResult};
