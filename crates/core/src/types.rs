use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::error::CampaignError;

// ─── Wizard steps ──────────────────────────────────────────────────────────

/// One stage of the linear campaign-creation sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WizardStep {
    Recipients,
    Template,
    Personalize,
    Schedule,
    Review,
}

impl WizardStep {
    /// All steps in navigation order.
    pub const ALL: [WizardStep; 5] = [
        WizardStep::Recipients,
        WizardStep::Template,
        WizardStep::Personalize,
        WizardStep::Schedule,
        WizardStep::Review,
    ];

    pub fn index(self) -> usize {
        match self {
            WizardStep::Recipients => 0,
            WizardStep::Template => 1,
            WizardStep::Personalize => 2,
            WizardStep::Schedule => 3,
            WizardStep::Review => 4,
        }
    }

    /// The following step, or `None` at `Review`.
    pub fn next(self) -> Option<WizardStep> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// The preceding step, or `None` at `Recipients`.
    pub fn previous(self) -> Option<WizardStep> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }

    pub fn id(self) -> &'static str {
        match self {
            WizardStep::Recipients => "recipients",
            WizardStep::Template => "template",
            WizardStep::Personalize => "personalize",
            WizardStep::Schedule => "schedule",
            WizardStep::Review => "review",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WizardStep::Recipients => "Recipients",
            WizardStep::Template => "Template",
            WizardStep::Personalize => "Personalize",
            WizardStep::Schedule => "Schedule",
            WizardStep::Review => "Review",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for WizardStep {
    type Err = CampaignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|step| step.id() == s)
            .ok_or_else(|| CampaignError::InvalidInput(format!("unknown wizard step '{s}'")))
    }
}

// ─── Letter settings ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandwritingStyle {
    #[default]
    Casual,
    Formal,
    Elegant,
    Neat,
    Messy,
}

impl HandwritingStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            HandwritingStyle::Casual => "casual",
            HandwritingStyle::Formal => "formal",
            HandwritingStyle::Elegant => "elegant",
            HandwritingStyle::Neat => "neat",
            HandwritingStyle::Messy => "messy",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperType {
    #[default]
    Plain,
    Lined,
    Aged,
}

impl PaperType {
    pub fn as_str(self) -> &'static str {
        match self {
            PaperType::Plain => "plain",
            PaperType::Lined => "lined",
            PaperType::Aged => "aged",
        }
    }

    /// Human-readable name shown on the review summary.
    pub fn display_name(self) -> &'static str {
        match self {
            PaperType::Plain => "Plain White",
            PaperType::Lined => "Lined",
            PaperType::Aged => "Aged Parchment",
        }
    }
}

/// Handwriting options persisted alongside a submitted campaign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandwritingSettings {
    pub style: HandwritingStyle,
    pub paper: PaperType,
}

// ─── Campaign draft ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    #[default]
    Draft,
    Scheduled,
    InProgress,
    Completed,
    Paused,
}

impl CampaignStatus {
    /// Lifecycle moves allowed once a campaign exists. Setting the current
    /// status again is a no-op and always allowed.
    pub fn can_transition_to(self, next: CampaignStatus) -> bool {
        use CampaignStatus::*;
        self == next
            || matches!(
                (self, next),
                (Draft, Scheduled | InProgress)
                    | (Scheduled, InProgress | Paused | Completed)
                    | (InProgress, Paused | Completed)
                    | (Paused, Scheduled | InProgress | Completed)
            )
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::Scheduled => "scheduled",
            CampaignStatus::InProgress => "in_progress",
            CampaignStatus::Completed => "completed",
            CampaignStatus::Paused => "paused",
        };
        f.write_str(s)
    }
}

/// In-progress campaign configuration owned by a single wizard.
///
/// Drafts are values: [`CampaignDraft::with_update`] returns a new draft and
/// the owner replaces its copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub recipient_ids: BTreeSet<i64>,
    #[serde(default)]
    pub template_id: Option<i64>,
    #[serde(default)]
    pub handwriting_style: HandwritingStyle,
    #[serde(default)]
    pub paper_type: PaperType,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub send_now: bool,
    #[serde(default, skip_deserializing)]
    pub status: CampaignStatus,
}

/// How the schedule step was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ScheduleChoice {
    Date { date: NaiveDate },
    SendNow,
    Unset,
}

/// Partial update merged into a draft. Absent fields leave the draft as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftUpdate {
    #[serde(default)]
    pub name: Option<String>,
    /// An empty string clears the description.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub recipient_ids: Option<BTreeSet<i64>>,
    #[serde(default)]
    pub template_id: Option<i64>,
    #[serde(default)]
    pub handwriting_style: Option<HandwritingStyle>,
    #[serde(default)]
    pub paper_type: Option<PaperType>,
    #[serde(default)]
    pub schedule: Option<ScheduleChoice>,
}

impl CampaignDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new draft with `update` merged in.
    pub fn with_update(&self, update: DraftUpdate) -> CampaignDraft {
        let mut next = self.clone();
        if let Some(name) = update.name {
            next.name = name;
        }
        if let Some(description) = update.description {
            next.description = if description.trim().is_empty() {
                None
            } else {
                Some(description)
            };
        }
        if let Some(ids) = update.recipient_ids {
            next.recipient_ids = ids;
        }
        if let Some(template_id) = update.template_id {
            next.template_id = Some(template_id);
        }
        if let Some(style) = update.handwriting_style {
            next.handwriting_style = style;
        }
        if let Some(paper) = update.paper_type {
            next.paper_type = paper;
        }
        match update.schedule {
            Some(ScheduleChoice::Date { date }) => {
                next.start_date = Some(date);
                next.send_now = false;
            }
            Some(ScheduleChoice::SendNow) => {
                next.start_date = None;
                next.send_now = true;
            }
            Some(ScheduleChoice::Unset) => {
                next.start_date = None;
                next.send_now = false;
            }
            None => {}
        }
        // A fixed start date wins over a stale send-now flag.
        if next.start_date.is_some() {
            next.send_now = false;
        }
        next.status = CampaignStatus::Draft;
        next
    }

    pub fn handwriting(&self) -> HandwritingSettings {
        HandwritingSettings {
            style: self.handwriting_style,
            paper: self.paper_type,
        }
    }
}

// ─── External entities ─────────────────────────────────────────────────────

/// Letter template with `{{field}}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: i64,
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub merge_fields: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address_line1: Option<String>,
    #[serde(default)]
    pub address_line2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Free-form attributes imported from a CRM or CSV.
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
}

impl Recipient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Flattens the recipient into the name → value record used by merge
    /// fields. Named columns take precedence over free-form attributes.
    pub fn merge_record(&self) -> HashMap<String, String> {
        let mut record = self.attributes.clone();
        record.insert("firstName".to_string(), self.first_name.clone());
        record.insert("lastName".to_string(), self.last_name.clone());
        let optional = [
            ("company", &self.company),
            ("email", &self.email),
            ("phone", &self.phone),
            ("addressLine1", &self.address_line1),
            ("addressLine2", &self.address_line2),
            ("city", &self.city),
            ("state", &self.state),
            ("postalCode", &self.postal_code),
            ("country", &self.country),
            ("notes", &self.notes),
        ];
        for (key, value) in optional {
            if let Some(v) = value {
                record.insert(key.to_string(), v.clone());
            }
        }
        record
    }
}

// ─── Submission ────────────────────────────────────────────────────────────

/// Wire contract handed to the campaign store on submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignPayload {
    pub name: String,
    pub description: Option<String>,
    pub status: CampaignStatus,
    pub template_id: i64,
    pub recipient_ids: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub handwriting: HandwritingSettings,
}

/// A persisted campaign as returned by the campaign store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub status: CampaignStatus,
    pub template_id: i64,
    pub recipient_ids: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub handwriting: HandwritingSettings,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LetterStatus {
    Draft,
    Scheduled,
    Sent,
    Delivered,
    Opened,
}

/// One personalized letter rendered for a recipient at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Letter {
    pub campaign_id: i64,
    pub recipient_id: i64,
    pub recipient_name: String,
    pub content: String,
    pub status: LetterStatus,
    pub scheduled_for: Option<NaiveDate>,
}
