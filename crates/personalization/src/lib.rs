//! Personalization — merge-field resolution for letter templates and the
//! handwriting preview capability.

pub mod handwriting;
pub mod merge;

pub use handwriting::{MockHandwritingService, PreviewImage, PreviewRequest, PreviewService};
pub use merge::{extract_merge_fields, missing_fields, resolve};
