//! Campaign management backend — recipients, templates, campaigns and the
//! HTTP surface of the campaign wizard.
//!
//! Data stored in DashMap (development); the collaborator traits in
//! `campaign-core` are the seam for a persistent store.

pub mod handlers;
pub mod models;
pub mod router;
pub mod sessions;
pub mod store;

pub use handlers::{ApiError, ManagementState};
pub use router::management_router;
pub use sessions::WizardSessions;
pub use store::ManagementStore;
