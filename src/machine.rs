//! Submission state machine.
//!
//! Drives one application attempt through `Classifying → Mapping → Filling →
//! Validating → (Advancing | Submitting) → Done`, re-invoking the classifier
//! and mapper on every new page a multi-step wizard reaches. Element
//! references never survive a navigation: each cycle starts from a fresh
//! snapshot.
//!
//! Terminal outcomes are absorbing — an attempt's outcome is set exactly
//! once. Attempt-level failures land in the recorded outcome; only
//! session-fatal pacing conditions surface as `Err` from [`Engine::run_attempt`].

use crate::answers::{AnswerKey, AnswerSet, AnswerValue};
use crate::classify::classify;
use crate::config::EngineConfig;
use crate::content::{ContentGenerator, ContentKind, JobPosting, Profile};
use crate::driver::PageDriver;
use crate::error::EngineError;
use crate::events::{EngineEvent, EventBus};
use crate::mapper::{
    first_unresolved_required, map_fields, BindingValue, FieldBinding, MapperConfig,
};
use crate::pacing::{has_block_signal, ActionKind, GateResult, PacingController};
use crate::record::SessionRecorder;
use crate::snapshot::{FormElement, InputKind, PageSnapshot};
use crate::variants::{profile, SystemVariant, VariantProfile};
use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Confirmation vocabulary that counts as a submission success signal.
const SUCCESS_SIGNALS: &[&str] = &[
    "thank you",
    "application submitted",
    "application received",
    "successfully applied",
    "application complete",
    "confirmation",
];

/// Vocabulary that counts as an explicit submission failure.
const FAILURE_SIGNALS: &[&str] = &[
    "error occurred",
    "application failed",
    "please try again",
    "something went wrong",
    "validation error",
];

/// Poll interval while waiting for a submission success signal.
const CONFIRM_POLL: Duration = Duration::from_millis(500);

/// Terminal outcome of one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Outcome {
    Submitted,
    Aborted(String),
    /// Surfaced distinctly from `Aborted` so a human can complete the
    /// borderline case instead of treating it as a failure.
    RequiresManualReview(String),
}

impl From<EngineError> for Outcome {
    /// Fold an internal failure into the attempt's recorded outcome. Only
    /// the pacing variants stay errors at the `run_attempt` boundary.
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::MappingIncomplete(key) => {
                Outcome::RequiresManualReview(format!("unresolved required field: {key}"))
            }
            EngineError::ElementApply(_) => Outcome::Aborted("field apply failed".into()),
            EngineError::Validation(_) => Outcome::Aborted("validation failed".into()),
            EngineError::NavigationTimeout => {
                Outcome::RequiresManualReview("navigation timeout".into())
            }
            EngineError::SubmissionUnconfirmed => {
                Outcome::RequiresManualReview("submission unconfirmed".into())
            }
            EngineError::PacingThrottled => Outcome::Aborted("session budget exhausted".into()),
            EngineError::PacingBlocked => {
                Outcome::Aborted("restriction signal detected".into())
            }
            EngineError::ContentGeneration(_) => {
                Outcome::Aborted("content generation failed".into())
            }
            EngineError::Driver(reason) => Outcome::Aborted(reason),
        }
    }
}

/// Terminal action taken on one wizard page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    /// Clicked the next-step control.
    Advanced,
    /// Clicked the terminal submit control.
    Submitted,
    /// The attempt stopped on this page.
    Halted,
}

/// One processed wizard page. Append-only within an attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub page_url: String,
    pub variant: SystemVariant,
    pub fields_bound: usize,
    pub fields_synthesized: usize,
    pub fields_unresolved: usize,
    pub action: StepAction,
    pub elapsed_ms: u64,
}

/// One run through the engine for one job posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationAttempt {
    pub attempt_id: String,
    pub job_id: String,
    pub variant: SystemVariant,
    pub steps: Vec<StepResult>,
    pub outcome: Option<Outcome>,
    pub started_at: String,
    pub finished_at: Option<String>,
}

impl ApplicationAttempt {
    pub fn new(job_id: &str) -> Self {
        Self {
            attempt_id: Uuid::new_v4().to_string(),
            job_id: job_id.to_string(),
            variant: SystemVariant::Unknown,
            steps: Vec::new(),
            outcome: None,
            started_at: Utc::now().to_rfc3339(),
            finished_at: None,
        }
    }

    /// Set the terminal outcome. First caller wins; terminal states absorb.
    fn finish(&mut self, outcome: Outcome) {
        if self.outcome.is_none() {
            self.outcome = Some(outcome);
            self.finished_at = Some(Utc::now().to_rfc3339());
        }
    }
}

/// The application flow engine.
pub struct Engine {
    config: EngineConfig,
    mapper_config: MapperConfig,
    pacing: Arc<PacingController>,
    events: EventBus,
    recorder: Option<SessionRecorder>,
    generator: Option<(Arc<dyn ContentGenerator>, Profile)>,
    cancel: Arc<AtomicBool>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let pacing = Arc::new(PacingController::new(&config));
        Self::with_pacing(config, pacing)
    }

    /// Construct with an externally built controller (e.g. seeded for tests).
    pub fn with_pacing(config: EngineConfig, pacing: Arc<PacingController>) -> Self {
        let mapper_config = MapperConfig {
            fuzzy_threshold: config.fuzzy_threshold,
            synthesis_threshold: config.synthesis_threshold,
        };
        Self {
            config,
            mapper_config,
            pacing,
            events: EventBus::new(),
            recorder: None,
            generator: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_recorder(mut self, recorder: SessionRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn with_generator(
        mut self,
        generator: Arc<dyn ContentGenerator>,
        profile: Profile,
    ) -> Self {
        self.generator = Some((generator, profile));
        self
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn pacing(&self) -> &Arc<PacingController> {
        &self.pacing
    }

    /// Shared flag the caller may set to request an abort. Honored at the
    /// next state-transition boundary; in-flight element applies and
    /// navigation waits complete first.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Run one application attempt to a terminal state.
    ///
    /// Returns `Ok` with the recorded attempt for every attempt-level
    /// outcome, including aborts. `Err(PacingThrottled)` means the session
    /// budget refused to start the attempt; `Err(PacingBlocked)` means the
    /// controller has latched on a restriction signal — end the session.
    pub async fn run_attempt(
        &mut self,
        driver: &mut dyn PageDriver,
        job: &JobPosting,
        answers: &AnswerSet,
    ) -> Result<ApplicationAttempt, EngineError> {
        match self.pacing.gate(ActionKind::StartAttempt).await {
            GateResult::Proceed => {}
            GateResult::Throttled => {
                self.events.emit(EngineEvent::Throttled {
                    action: "start_attempt".into(),
                });
                return Err(EngineError::PacingThrottled);
            }
            GateResult::Blocked => return Err(EngineError::PacingBlocked),
        }

        let mut attempt = ApplicationAttempt::new(&job.id);
        self.events.emit(EngineEvent::AttemptStarted {
            attempt_id: attempt.attempt_id.clone(),
            job_id: job.id.clone(),
        });
        tracing::info!(job_id = %job.id, title = %job.title, "starting application attempt");

        let mut cover_letter: Option<String> = None;

        for step in 0..self.config.max_steps as usize {
            if self.cancelled() {
                attempt.finish(Outcome::Aborted("cancelled by caller".into()));
                break;
            }
            let step_start = Instant::now();

            // ── Classifying ──────────────────────────────────────────────
            let snap = match driver.snapshot().await {
                Ok(s) => s,
                Err(e) => {
                    attempt.finish(
                        EngineError::Driver(format!("page snapshot failed: {e}")).into(),
                    );
                    break;
                }
            };

            if has_block_signal(&snap.text) {
                self.pacing.note_block();
                self.events.emit(EngineEvent::SessionBlocked {
                    url: snap.url.clone(),
                });
                tracing::error!(url = %snap.url, "restriction signal detected, session over");
                attempt.finish(Outcome::Aborted("restriction signal detected".into()));
                break;
            }

            let variant = classify(&snap);
            self.events.emit(EngineEvent::PageClassified {
                attempt_id: attempt.attempt_id.clone(),
                url: snap.url.clone(),
                variant,
            });
            if step == 0 {
                attempt.variant = variant;
            } else if variant != attempt.variant {
                // Some ATSs change templates mid-flow; re-derived variant
                // wins but the mismatch is worth a trace.
                tracing::warn!(
                    expected = %attempt.variant,
                    got = %variant,
                    "variant changed mid-flow"
                );
            }

            if variant == SystemVariant::Unknown {
                self.push_step(&mut attempt, &snap, &[], StepAction::Halted, step_start);
                attempt.finish(Outcome::RequiresManualReview(
                    "unrecognized application system".into(),
                ));
                break;
            }

            // ── Mapping ──────────────────────────────────────────────────
            let mut bindings = map_fields(&snap, variant, answers, &self.mapper_config);

            if let Err(err) = self
                .generate_missing_content(&snap, &mut bindings, job, &mut cover_letter)
                .await
            {
                tracing::warn!("content generation failed: {err}");
                self.push_step(&mut attempt, &snap, &bindings, StepAction::Halted, step_start);
                attempt.finish(err.into());
                break;
            }

            self.emit_mapping(&attempt, &bindings);

            if let Some(key) = first_unresolved_required(&bindings, &snap) {
                self.push_step(&mut attempt, &snap, &bindings, StepAction::Halted, step_start);
                attempt.finish(EngineError::MappingIncomplete(key).into());
                break;
            }

            // ── Filling ──────────────────────────────────────────────────
            if self.cancelled() {
                attempt.finish(Outcome::Aborted("cancelled by caller".into()));
                break;
            }
            if let Err(err) = self.fill_page(driver, &snap, &bindings).await {
                self.push_step(&mut attempt, &snap, &bindings, StepAction::Halted, step_start);
                attempt.finish(err.into());
                break;
            }

            // ── Validating ───────────────────────────────────────────────
            // Invariant: submission is unreachable with an unresolved
            // required binding.
            debug_assert!(first_unresolved_required(&bindings, &snap).is_none());

            let validated = match self.validate_page(driver, &bindings).await {
                Ok(s) => s,
                Err(err) => {
                    self.push_step(&mut attempt, &snap, &bindings, StepAction::Halted, step_start);
                    attempt.finish(err.into());
                    break;
                }
            };

            // ── Advancing | Submitting ───────────────────────────────────
            if self.cancelled() {
                attempt.finish(Outcome::Aborted("cancelled by caller".into()));
                break;
            }
            let strategy = profile(variant);

            if let Some(next) = find_next_control(&validated, strategy) {
                match self
                    .advance(driver, &next)
                    .await
                {
                    Ok(()) => {
                        self.push_step(
                            &mut attempt,
                            &validated,
                            &bindings,
                            StepAction::Advanced,
                            step_start,
                        );
                        continue;
                    }
                    Err(err) => {
                        self.push_step(
                            &mut attempt,
                            &validated,
                            &bindings,
                            StepAction::Halted,
                            step_start,
                        );
                        attempt.finish(err.into());
                        break;
                    }
                }
            }

            if let Some(submit) = find_submit_control(&validated, strategy) {
                let outcome = self.submit(driver, &validated, &submit).await;
                let action = if outcome == Outcome::Submitted {
                    StepAction::Submitted
                } else {
                    StepAction::Halted
                };
                self.push_step(&mut attempt, &validated, &bindings, action, step_start);
                attempt.finish(outcome);
                break;
            }

            self.push_step(&mut attempt, &validated, &bindings, StepAction::Halted, step_start);
            attempt.finish(Outcome::RequiresManualReview(
                "no advance or submit control".into(),
            ));
            break;
        }

        if attempt.outcome.is_none() {
            attempt.finish(Outcome::RequiresManualReview("step limit exceeded".into()));
        }

        self.finalize(&mut attempt);
        Ok(attempt)
    }

    /// Generate cover-letter text when an element wants it, the answer set
    /// lacks it, and a generator is installed. Cached per attempt.
    async fn generate_missing_content(
        &self,
        snap: &PageSnapshot,
        bindings: &mut [FieldBinding],
        job: &JobPosting,
        cache: &mut Option<String>,
    ) -> Result<(), EngineError> {
        let Some((generator, profile)) = &self.generator else {
            return Ok(());
        };

        for binding in bindings.iter_mut() {
            if binding.key != Some(AnswerKey::CoverLetterText) || binding.is_resolved() {
                continue;
            }
            let Some(element) = snap.elements.get(binding.element) else {
                continue;
            };
            if !element.kind.is_typable() {
                continue;
            }

            let text = match cache {
                Some(text) => text.clone(),
                None => {
                    let text = generator
                        .generate(ContentKind::CoverLetter, job, profile)
                        .await
                        .map_err(|e| EngineError::ContentGeneration(e.to_string()))?;
                    *cache = Some(text.clone());
                    text
                }
            };
            binding.value = BindingValue::Synthesized {
                value: text,
                confidence: 1.0,
            };
        }
        Ok(())
    }

    /// Apply every resolved binding. Errors abort the attempt.
    async fn fill_page(
        &self,
        driver: &mut dyn PageDriver,
        snap: &PageSnapshot,
        bindings: &[FieldBinding],
    ) -> Result<(), EngineError> {
        for binding in bindings.iter().filter(|b| b.is_resolved()) {
            match self.pacing.gate(gate_kind(snap, binding)).await {
                GateResult::Proceed => {}
                GateResult::Throttled => {
                    self.events.emit(EngineEvent::Throttled {
                        action: "fill".into(),
                    });
                    return Err(EngineError::PacingThrottled);
                }
                GateResult::Blocked => return Err(EngineError::PacingBlocked),
            }

            if let Err(first) = self.apply_binding(driver, snap, binding).await {
                // One retry against a re-extracted snapshot; element
                // references may simply have gone stale.
                tracing::warn!("element apply failed, retrying once: {first}");
                let retried = match driver.snapshot().await {
                    Ok(fresh) => self.apply_binding(driver, &fresh, binding).await,
                    Err(e) => Err(e),
                };
                if let Err(e) = retried {
                    tracing::error!("element apply failed after retry: {e}");
                    return Err(EngineError::ElementApply(e.to_string()));
                }
            }
        }
        Ok(())
    }

    /// Apply one binding to its element.
    async fn apply_binding(
        &self,
        driver: &mut dyn PageDriver,
        snap: &PageSnapshot,
        binding: &FieldBinding,
    ) -> anyhow::Result<()> {
        let element = snap
            .elements
            .get(binding.element)
            .context("element index out of range")?;

        match &binding.value {
            BindingValue::Resolved(value) => match element.kind {
                InputKind::File => {
                    let path = value.as_file().context("file binding without file value")?;
                    driver.attach_file(element, path).await
                }
                InputKind::Select => {
                    let text = value.as_text().context("select binding without text")?;
                    driver.select_option(element, &text).await
                }
                InputKind::Checkbox | InputKind::Radio => match value {
                    AnswerValue::Flag(true) | AnswerValue::Choice(_) => {
                        driver.click(element).await
                    }
                    _ => Ok(()),
                },
                _ => {
                    let text = value.as_text().context("text binding without text")?;
                    self.type_text(driver, element, &text).await
                }
            },
            BindingValue::Synthesized { value, .. } => match element.kind {
                InputKind::Select => driver.select_option(element, value).await,
                kind if kind.is_typable() => self.type_text(driver, element, value).await,
                _ => Ok(()),
            },
            BindingValue::Unresolved => Ok(()),
        }
    }

    async fn type_text(
        &self,
        driver: &mut dyn PageDriver,
        element: &FormElement,
        text: &str,
    ) -> anyhow::Result<()> {
        let delays = self.pacing.typing_delays(text.chars().count());
        driver.fill_text(element, text, &delays).await
    }

    /// Re-extract and check for visible client-side validation errors on
    /// filled fields; one re-fill per offending field, then abort.
    async fn validate_page(
        &self,
        driver: &mut dyn PageDriver,
        bindings: &[FieldBinding],
    ) -> Result<PageSnapshot, EngineError> {
        let validated = driver
            .snapshot()
            .await
            .map_err(|e| EngineError::Driver(format!("page snapshot failed: {e}")))?;

        let mut refilled = false;
        for binding in bindings.iter().filter(|b| b.is_resolved()) {
            let invalid = validated
                .elements
                .get(binding.element)
                .map(|e| e.invalid)
                .unwrap_or(false);
            if invalid {
                tracing::warn!(element = binding.element, "validation error, re-filling");
                if let Err(e) = self.apply_binding(driver, &validated, binding).await {
                    return Err(EngineError::Validation(e.to_string()));
                }
                refilled = true;
            }
        }

        if !refilled {
            return Ok(validated);
        }

        // One re-fill pass only; anything still invalid aborts.
        let rechecked = driver
            .snapshot()
            .await
            .map_err(|e| EngineError::Driver(format!("page snapshot failed: {e}")))?;
        let still_invalid: Vec<usize> = bindings
            .iter()
            .filter(|b| b.is_resolved())
            .filter(|b| {
                rechecked
                    .elements
                    .get(b.element)
                    .map(|e| e.invalid)
                    .unwrap_or(false)
            })
            .map(|b| b.element)
            .collect();
        if !still_invalid.is_empty() {
            return Err(EngineError::Validation(format!(
                "elements still invalid after re-fill: {still_invalid:?}"
            )));
        }
        Ok(rechecked)
    }

    /// Click the next-step control and wait for the new page.
    async fn advance(
        &self,
        driver: &mut dyn PageDriver,
        next: &FormElement,
    ) -> Result<(), EngineError> {
        match self.pacing.gate(ActionKind::Navigate).await {
            GateResult::Proceed => {}
            GateResult::Throttled => return Err(EngineError::PacingThrottled),
            GateResult::Blocked => return Err(EngineError::PacingBlocked),
        }

        driver
            .click(next)
            .await
            .map_err(|e| EngineError::ElementApply(e.to_string()))?;

        let timeout = Duration::from_millis(self.config.navigation_timeout_ms);
        driver
            .wait_settle(timeout)
            .await
            .map_err(|_| EngineError::NavigationTimeout)?;
        Ok(())
    }

    /// Click submit and wait for a bounded success signal.
    async fn submit(
        &self,
        driver: &mut dyn PageDriver,
        page: &PageSnapshot,
        submit: &FormElement,
    ) -> Outcome {
        match self.pacing.gate(ActionKind::Submit).await {
            GateResult::Proceed => {}
            GateResult::Throttled => return EngineError::PacingThrottled.into(),
            GateResult::Blocked => return EngineError::PacingBlocked.into(),
        }

        if let Err(e) = driver.click(submit).await {
            return EngineError::ElementApply(e.to_string()).into();
        }

        let deadline = tokio::time::Instant::now()
            + Duration::from_millis(self.config.submit_confirm_timeout_ms);
        loop {
            tokio::time::sleep(CONFIRM_POLL).await;

            match driver.snapshot().await {
                Ok(after) => {
                    if FAILURE_SIGNALS.iter().any(|s| after.text.contains(s)) {
                        return Outcome::Aborted("submission rejected".into());
                    }
                    if SUCCESS_SIGNALS.iter().any(|s| after.text.contains(s))
                        || (after.url != page.url && after.fillable_count() == 0)
                    {
                        self.pacing.note_submitted();
                        return Outcome::Submitted;
                    }
                }
                Err(e) => tracing::debug!("confirmation poll snapshot failed: {e}"),
            }

            if tokio::time::Instant::now() >= deadline {
                return EngineError::SubmissionUnconfirmed.into();
            }
        }
    }

    fn emit_mapping(&self, attempt: &ApplicationAttempt, bindings: &[FieldBinding]) {
        let (bound, synthesized, unresolved) = binding_counts(bindings);
        self.events.emit(EngineEvent::FieldsMapped {
            attempt_id: attempt.attempt_id.clone(),
            bound,
            synthesized,
            unresolved,
        });
    }

    fn push_step(
        &self,
        attempt: &mut ApplicationAttempt,
        snap: &PageSnapshot,
        bindings: &[FieldBinding],
        action: StepAction,
        started: Instant,
    ) {
        let (bound, synthesized, unresolved) = binding_counts(bindings);
        attempt.steps.push(StepResult {
            page_url: snap.url.clone(),
            variant: attempt.variant,
            fields_bound: bound,
            fields_synthesized: synthesized,
            fields_unresolved: unresolved,
            action,
            elapsed_ms: started.elapsed().as_millis() as u64,
        });
        self.events.emit(EngineEvent::StepCompleted {
            attempt_id: attempt.attempt_id.clone(),
            step: attempt.steps.len() - 1,
            action: format!("{action:?}").to_lowercase(),
        });
    }

    fn finalize(&mut self, attempt: &mut ApplicationAttempt) {
        if attempt.finished_at.is_none() {
            attempt.finished_at = Some(Utc::now().to_rfc3339());
        }
        let outcome = attempt
            .outcome
            .as_ref()
            .map(outcome_label)
            .unwrap_or_else(|| "unknown".to_string());

        if let Some(recorder) = &mut self.recorder {
            if let Err(e) = recorder.record(attempt) {
                tracing::warn!("failed to record attempt: {e}");
            }
        }

        self.events.emit(EngineEvent::AttemptFinished {
            attempt_id: attempt.attempt_id.clone(),
            job_id: attempt.job_id.clone(),
            outcome: outcome.clone(),
        });
        tracing::info!(job_id = %attempt.job_id, %outcome, "attempt finished");
    }
}

/// Which gate an element apply consults.
fn gate_kind(snap: &PageSnapshot, binding: &FieldBinding) -> ActionKind {
    snap.elements
        .get(binding.element)
        .map(|e| {
            if e.kind.is_typable() {
                ActionKind::Type
            } else {
                ActionKind::Click
            }
        })
        .unwrap_or(ActionKind::Click)
}

fn binding_counts(bindings: &[FieldBinding]) -> (usize, usize, usize) {
    let bound = bindings
        .iter()
        .filter(|b| matches!(b.value, BindingValue::Resolved(_)))
        .count();
    let synthesized = bindings
        .iter()
        .filter(|b| matches!(b.value, BindingValue::Synthesized { .. }))
        .count();
    let unresolved = bindings
        .iter()
        .filter(|b| matches!(b.value, BindingValue::Unresolved))
        .count();
    (bound, synthesized, unresolved)
}

fn outcome_label(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Submitted => "submitted".to_string(),
        Outcome::Aborted(reason) => format!("aborted: {reason}"),
        Outcome::RequiresManualReview(reason) => format!("manual review: {reason}"),
    }
}

/// Find the control that advances a multi-step wizard.
fn find_next_control(snap: &PageSnapshot, strategy: &VariantProfile) -> Option<FormElement> {
    find_control(snap, strategy.next_labels)
}

/// Find the terminal submit control.
fn find_submit_control(snap: &PageSnapshot, strategy: &VariantProfile) -> Option<FormElement> {
    find_control(snap, strategy.submit_labels)
}

fn find_control(snap: &PageSnapshot, labels: &[&str]) -> Option<FormElement> {
    snap.elements
        .iter()
        .filter(|e| matches!(e.kind, InputKind::Button | InputKind::Submit))
        .find(|e| {
            let label = e.label.to_lowercase();
            labels.iter().any(|l| label.contains(l))
        })
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::extract;
    use crate::variants::profile;

    fn snap(html: &str) -> PageSnapshot {
        extract("https://careers.acme.com/apply", "jobs.example.com", html)
    }

    #[test]
    fn test_find_next_vs_submit() {
        let two_step = snap(
            r#"<form><input type="text" name="full_name"/>
            <button type="button">Save and Continue</button></form>"#,
        );
        let strategy = profile(SystemVariant::Workday);
        assert!(find_next_control(&two_step, strategy).is_some());
        assert!(find_submit_control(&two_step, strategy).is_none());

        let last_step = snap(
            r#"<form><input type="text" name="full_name"/>
            <button type="submit">Submit Application</button></form>"#,
        );
        assert!(find_next_control(&last_step, strategy).is_none());
        assert!(find_submit_control(&last_step, strategy).is_some());
    }

    #[test]
    fn test_outcome_set_once() {
        let mut attempt = ApplicationAttempt::new("job-1");
        attempt.finish(Outcome::Submitted);
        attempt.finish(Outcome::Aborted("late".into()));
        assert_eq!(attempt.outcome, Some(Outcome::Submitted));
    }

    #[test]
    fn test_outcome_serialization_carries_reason() {
        let json = serde_json::to_string(&Outcome::RequiresManualReview(
            "unresolved required field: email".into(),
        ))
        .unwrap();
        assert!(json.contains("requires_manual_review"));
        assert!(json.contains("unresolved required field: email"));
    }
}
