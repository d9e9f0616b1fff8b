use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use campaign_core::event_bus::{make_event, noop_sink, ActivityEvent, ActivityType, EventSink};
use campaign_core::types::{CampaignDraft, DraftUpdate, WizardStep};
use campaign_core::{CampaignError, CampaignResult};

use crate::types::{ReviewSection, StepStatus, WizardSummary};
use crate::validators::{validate_for_submission, validate_step, StepValidation};

/// Drives one campaign-creation session through the ordered wizard steps.
///
/// The wizard exclusively owns its draft. `update_draft` is the only way the
/// draft changes; navigation never touches it.
pub struct CampaignWizard {
    session_id: Uuid,
    current: WizardStep,
    draft: CampaignDraft,
    visited: BTreeSet<WizardStep>,
    closed: bool,
    event_sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for CampaignWizard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CampaignWizard")
            .field("session_id", &self.session_id)
            .field("current", &self.current)
            .field("visited", &self.visited)
            .field("closed", &self.closed)
            .finish()
    }
}

impl CampaignWizard {
    /// Starts a wizard at `recipients` with an empty draft.
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            current: WizardStep::Recipients,
            draft: CampaignDraft::new(),
            visited: BTreeSet::from([WizardStep::Recipients]),
            closed: false,
            event_sink: noop_sink(),
        }
    }

    /// Restores a wizard from a deep link. The wizard lands on `step` only if
    /// every earlier step accepts `draft`; otherwise it stops at the first
    /// step whose gate fails.
    pub fn resume(step: WizardStep, draft: CampaignDraft) -> Self {
        let landing = WizardStep::ALL[..step.index()]
            .iter()
            .copied()
            .find(|s| !validate_step(*s, &draft).valid)
            .unwrap_or(step);
        let visited = WizardStep::ALL[..=landing.index()].iter().copied().collect();
        Self {
            draft: draft.with_update(DraftUpdate::default()),
            current: landing,
            visited,
            ..Self::new()
        }
    }

    /// Attach an event sink for activity events.
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn current_step(&self) -> WizardStep {
        self.current
    }

    pub fn draft(&self) -> &CampaignDraft {
        &self.draft
    }

    pub fn visited_steps(&self) -> impl Iterator<Item = WizardStep> + '_ {
        self.visited.iter().copied()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn ensure_open(&self) -> CampaignResult<()> {
        if self.closed {
            Err(CampaignError::WizardClosed)
        } else {
            Ok(())
        }
    }

    /// Validates the current step and, on success, advances one step.
    /// At `review` a successful call is a no-op.
    pub fn next(&mut self) -> CampaignResult<WizardStep> {
        self.ensure_open()?;
        let validation = validate_step(self.current, &self.draft);
        if !validation.valid {
            warn!(
                session_id = %self.session_id,
                step = %self.current,
                reason = validation.reason.as_deref().unwrap_or_default(),
                "Wizard step rejected"
            );
            self.emit(ActivityType::StepRejected, validation.reason.clone());
            return validation.into_result().map(|_| self.current);
        }

        if let Some(next) = self.current.next() {
            info!(session_id = %self.session_id, from = %self.current, to = %next, "Wizard advanced");
            self.current = next;
            self.visited.insert(next);
            self.emit(ActivityType::StepAdvanced, None);
        }
        Ok(self.current)
    }

    /// Moves back one step without validation. No-op at `recipients`.
    pub fn previous(&mut self) -> CampaignResult<WizardStep> {
        self.ensure_open()?;
        if let Some(prev) = self.current.previous() {
            info!(session_id = %self.session_id, from = %self.current, to = %prev, "Wizard moved back");
            self.current = prev;
        }
        Ok(self.current)
    }

    /// Replaces the draft with `update` merged in. Never changes the step.
    pub fn update_draft(&mut self, update: DraftUpdate) -> CampaignResult<&CampaignDraft> {
        self.ensure_open()?;
        self.draft = self.draft.with_update(update);
        Ok(&self.draft)
    }

    /// A step is reachable directly if it was visited before, or if every
    /// step ahead of it currently accepts the draft.
    pub fn can_jump_to(&self, step: WizardStep) -> bool {
        self.visited.contains(&step)
            || WizardStep::ALL[..step.index()]
                .iter()
                .all(|s| validate_step(*s, &self.draft).valid)
    }

    /// Navigates straight to `step`. Steps in between are not re-validated.
    pub fn jump_to(&mut self, step: WizardStep) -> CampaignResult<WizardStep> {
        self.ensure_open()?;
        if !self.can_jump_to(step) {
            return Err(CampaignError::InvalidTransition(format!(
                "cannot jump from '{}' to '{}' before completing the steps in between",
                self.current, step
            )));
        }
        info!(session_id = %self.session_id, from = %self.current, to = %step, "Wizard jumped");
        self.current = step;
        self.visited.insert(step);
        Ok(self.current)
    }

    /// Follows an "edit" link on the review screen.
    pub fn edit_section(&mut self, section: ReviewSection) -> CampaignResult<WizardStep> {
        self.jump_to(section.target_step())
    }

    pub fn validate_current(&self) -> StepValidation {
        validate_step(self.current, &self.draft)
    }

    pub fn summary(&self) -> WizardSummary {
        let steps = WizardStep::ALL
            .iter()
            .map(|step| StepStatus {
                step: *step,
                label: step.label().to_string(),
                visited: self.visited.contains(step),
                validation: validate_step(*step, &self.draft),
            })
            .collect();
        WizardSummary {
            session_id: self.session_id,
            current_step: self.current,
            draft: self.draft.clone(),
            steps,
            can_submit: !self.closed
                && self.current == WizardStep::Review
                && validate_for_submission(&self.draft).is_ok(),
            closed: self.closed,
        }
    }

    /// Ends the session after a successful submission and discards the draft.
    pub(crate) fn close(&mut self) {
        self.closed = true;
        self.draft = CampaignDraft::new();
    }

    pub(crate) fn emit(&self, activity: ActivityType, detail: Option<String>) {
        self.emit_event(make_event(activity, self.session_id, Some(self.current), detail));
    }

    pub(crate) fn emit_event(&self, event: ActivityEvent) {
        self.event_sink.emit(event);
    }
}

impl Default for CampaignWizard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campaign_core::event_bus::capture_sink;
    use campaign_core::types::ScheduleChoice;
    use chrono::NaiveDate;

    fn complete_update() -> DraftUpdate {
        DraftUpdate {
            name: Some("Q4 Outreach".to_string()),
            recipient_ids: Some([1, 2].into_iter().collect()),
            template_id: Some(5),
            schedule: Some(ScheduleChoice::Date {
                date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_starts_at_recipients_with_empty_draft() {
        let wizard = CampaignWizard::new();
        assert_eq!(wizard.current_step(), WizardStep::Recipients);
        assert_eq!(wizard.draft(), &CampaignDraft::new());
        assert_eq!(wizard.visited_steps().collect::<Vec<_>>(), vec![WizardStep::Recipients]);
    }

    #[test]
    fn test_next_blocked_without_recipients() {
        let sink = capture_sink();
        let mut wizard = CampaignWizard::new().with_event_sink(sink.clone());

        let result = wizard.next();
        match result {
            Err(CampaignError::Validation { step, reason }) => {
                assert_eq!(step, WizardStep::Recipients);
                assert!(reason.contains("recipient"));
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
        assert_eq!(wizard.current_step(), WizardStep::Recipients);
        assert_eq!(sink.count_type(ActivityType::StepRejected), 1);
    }

    #[test]
    fn test_forward_progress_stops_at_review() {
        let mut wizard = CampaignWizard::new();
        wizard.update_draft(complete_update()).unwrap();

        let mut reached = Vec::new();
        for _ in 0..5 {
            reached.push(wizard.next().unwrap());
        }
        assert_eq!(
            reached,
            vec![
                WizardStep::Template,
                WizardStep::Personalize,
                WizardStep::Schedule,
                WizardStep::Review,
                WizardStep::Review,
            ]
        );
        assert_eq!(wizard.next().unwrap(), WizardStep::Review);
    }

    #[test]
    fn test_previous_never_blocked() {
        let mut wizard = CampaignWizard::new();
        wizard.update_draft(complete_update()).unwrap();
        for _ in 0..4 {
            wizard.next().unwrap();
        }

        // Wipe the draft; going back must still work from every step.
        wizard
            .update_draft(DraftUpdate {
                name: Some(String::new()),
                recipient_ids: Some(Default::default()),
                schedule: Some(ScheduleChoice::Unset),
                ..Default::default()
            })
            .unwrap();
        for expected in [
            WizardStep::Schedule,
            WizardStep::Personalize,
            WizardStep::Template,
            WizardStep::Recipients,
            WizardStep::Recipients,
        ] {
            assert_eq!(wizard.previous().unwrap(), expected);
        }
    }

    #[test]
    fn test_update_draft_does_not_navigate() {
        let mut wizard = CampaignWizard::new();
        wizard.update_draft(complete_update()).unwrap();
        assert_eq!(wizard.current_step(), WizardStep::Recipients);
        assert_eq!(wizard.draft().template_id, Some(5));
    }

    #[test]
    fn test_jump_requires_visited_or_reachable_step() {
        let mut wizard = CampaignWizard::new();
        assert!(matches!(
            wizard.jump_to(WizardStep::Review),
            Err(CampaignError::InvalidTransition(_))
        ));
        assert_eq!(wizard.current_step(), WizardStep::Recipients);

        wizard
            .update_draft(DraftUpdate {
                recipient_ids: Some([7].into_iter().collect()),
                ..Default::default()
            })
            .unwrap();
        // Template is reachable once recipients validate.
        assert_eq!(wizard.jump_to(WizardStep::Template).unwrap(), WizardStep::Template);
        assert!(wizard.jump_to(WizardStep::Schedule).is_err());
    }

    #[test]
    fn test_edit_links_do_not_revalidate_later_steps() {
        let mut wizard = CampaignWizard::new();
        wizard.update_draft(complete_update()).unwrap();
        for _ in 0..4 {
            wizard.next().unwrap();
        }

        assert_eq!(
            wizard.edit_section(ReviewSection::Recipients).unwrap(),
            WizardStep::Recipients
        );
        wizard
            .update_draft(DraftUpdate {
                recipient_ids: Some(Default::default()),
                ..Default::default()
            })
            .unwrap();

        // Review was visited, so the jump back is allowed even though the
        // recipients gate now fails.
        assert_eq!(wizard.jump_to(WizardStep::Review).unwrap(), WizardStep::Review);
        assert!(!wizard.summary().can_submit);

        assert_eq!(
            wizard.edit_section(ReviewSection::Details).unwrap(),
            WizardStep::Personalize
        );
    }

    #[test]
    fn test_resume_lands_on_first_incomplete_step() {
        let draft = CampaignDraft::new().with_update(DraftUpdate {
            recipient_ids: Some([1].into_iter().collect()),
            template_id: Some(5),
            ..Default::default()
        });
        let wizard = CampaignWizard::resume(WizardStep::Review, draft.clone());
        assert_eq!(wizard.current_step(), WizardStep::Personalize);

        let wizard = CampaignWizard::resume(WizardStep::Template, draft);
        assert_eq!(wizard.current_step(), WizardStep::Template);
        assert!(wizard.can_jump_to(WizardStep::Recipients));
    }

    #[test]
    fn test_summary_reports_step_readiness() {
        let mut wizard = CampaignWizard::new();
        wizard.update_draft(complete_update()).unwrap();
        wizard.jump_to(WizardStep::Review).unwrap();

        let summary = wizard.summary();
        assert_eq!(summary.current_step, WizardStep::Review);
        assert!(summary.can_submit);
        assert!(summary.steps.iter().all(|s| s.validation.valid));
        assert!(!summary.steps[2].visited);
    }

    #[test]
    fn test_closed_wizard_rejects_operations() {
        let mut wizard = CampaignWizard::new();
        wizard.close();
        assert!(matches!(wizard.next(), Err(CampaignError::WizardClosed)));
        assert!(matches!(wizard.previous(), Err(CampaignError::WizardClosed)));
        assert!(matches!(
            wizard.update_draft(DraftUpdate::default()),
            Err(CampaignError::WizardClosed)
        ));
        assert!(wizard.is_closed());
    }
}
