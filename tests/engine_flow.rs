//! End-to-end engine flows over a scripted in-memory driver.

use applyflow::answers::{AnswerKey, AnswerSet, AnswerValue};
use applyflow::config::EngineConfig;
use applyflow::content::{testing::FixedGenerator, JobPosting, Profile};
use applyflow::driver::PageDriver;
use applyflow::error::EngineError;
use applyflow::events::EngineEvent;
use applyflow::machine::{Engine, Outcome, StepAction};
use applyflow::pacing::PacingController;
use applyflow::record::SessionRecorder;
use applyflow::snapshot::{self, FormElement, InputKind, PageSnapshot};
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Driver over a fixed sequence of pages. Clicking a button or submit
/// control advances to the next page when one exists; everything else is
/// recorded and succeeds.
struct ScriptedDriver {
    pages: Vec<(String, String)>,
    pos: usize,
    origin: String,
    filled: Vec<(usize, String)>,
    attached: Vec<String>,
    clicked: Vec<usize>,
    /// Element index whose text fills always fail.
    fail_fill_on: Option<usize>,
}

impl ScriptedDriver {
    fn new(origin: &str, pages: Vec<(&str, &str)>) -> Self {
        Self {
            pages: pages
                .into_iter()
                .map(|(u, h)| (u.to_string(), h.to_string()))
                .collect(),
            pos: 0,
            origin: origin.to_string(),
            filled: Vec::new(),
            attached: Vec::new(),
            clicked: Vec::new(),
            fail_fill_on: None,
        }
    }
}

#[async_trait]
impl PageDriver for ScriptedDriver {
    async fn snapshot(&mut self) -> Result<PageSnapshot> {
        let (url, html) = &self.pages[self.pos];
        Ok(snapshot::extract(url, &self.origin, html))
    }

    async fn fill_text(
        &mut self,
        element: &FormElement,
        text: &str,
        _delays: &[Duration],
    ) -> Result<()> {
        if self.fail_fill_on == Some(element.index) {
            anyhow::bail!("element detached");
        }
        self.filled.push((element.index, text.to_string()));
        Ok(())
    }

    async fn select_option(&mut self, element: &FormElement, value: &str) -> Result<()> {
        self.filled.push((element.index, value.to_string()));
        Ok(())
    }

    async fn attach_file(&mut self, _element: &FormElement, path: &Path) -> Result<()> {
        self.attached.push(path.display().to_string());
        Ok(())
    }

    async fn click(&mut self, element: &FormElement) -> Result<()> {
        self.clicked.push(element.index);
        if matches!(element.kind, InputKind::Button | InputKind::Submit)
            && self.pos + 1 < self.pages.len()
        {
            self.pos += 1;
        }
        Ok(())
    }

    async fn wait_settle(&mut self, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String> {
        Ok(self.pages[self.pos].0.clone())
    }
}

fn answers_full() -> AnswerSet {
    AnswerSet::new()
        .with(AnswerKey::FullName, AnswerValue::Text("Ada Lovelace".into()))
        .with(AnswerKey::Email, AnswerValue::Text("ada@example.com".into()))
        .with(AnswerKey::Phone, AnswerValue::Text("+1 555 0100".into()))
        .with(
            AnswerKey::ResumeFile,
            AnswerValue::File("/tmp/resume.pdf".into()),
        )
}

fn job() -> JobPosting {
    JobPosting {
        id: "job-42".into(),
        title: "Data Engineer".into(),
        company: "Acme".into(),
        description: "Pipelines.".into(),
        apply_url: "https://careers.acme.com/apply".into(),
    }
}

fn test_config() -> EngineConfig {
    EngineConfig {
        pacing_profile: "aggressive".into(),
        submit_confirm_timeout_ms: 3_000,
        navigation_timeout_ms: 3_000,
        ..EngineConfig::default()
    }
}

fn engine(config: EngineConfig) -> Engine {
    let pacing = Arc::new(PacingController::with_seed(&config, 7));
    Engine::with_pacing(config, pacing)
}

const GENERIC_FORM: &str = r#"
<html><body><form>
    <label for="n">Full Name</label>
    <input type="text" id="n" name="full_name" required />
    <label for="e">Email</label>
    <input type="email" id="e" name="email" required />
    <label for="r">Resume</label>
    <input type="file" id="r" name="resume" required />
    <button type="submit">Submit Application</button>
</form></body></html>
"#;

const CONFIRMATION: &str = r#"
<html><body>
    <h1>Thank you!</h1>
    <p>Application submitted. We will be in touch.</p>
</body></html>
"#;

#[tokio::test(start_paused = true)]
async fn generic_single_page_flow_submits() {
    let mut driver = ScriptedDriver::new(
        "jobs.example.com",
        vec![
            ("https://careers.acme.com/apply", GENERIC_FORM),
            ("https://careers.acme.com/apply/done", CONFIRMATION),
        ],
    );

    let mut engine = engine(test_config());
    let mut events = engine.events().subscribe();

    let attempt = engine
        .run_attempt(&mut driver, &job(), &answers_full())
        .await
        .expect("attempt should reach a terminal outcome");

    assert_eq!(attempt.outcome, Some(Outcome::Submitted));
    assert_eq!(attempt.steps.len(), 1);
    assert_eq!(attempt.steps[0].action, StepAction::Submitted);
    assert_eq!(attempt.steps[0].fields_bound, 3);

    // Text fields typed, the resume attached.
    assert!(driver.filled.iter().any(|(_, v)| v == "Ada Lovelace"));
    assert!(driver.attached.iter().any(|p| p.contains("resume.pdf")));

    // The bus saw the attempt start and finish.
    let mut saw_started = false;
    let mut saw_finished = false;
    while let Ok(event) = events.try_recv() {
        match event {
            EngineEvent::AttemptStarted { job_id, .. } => {
                assert_eq!(job_id, "job-42");
                saw_started = true;
            }
            EngineEvent::AttemptFinished { outcome, .. } => {
                assert_eq!(outcome, "submitted");
                saw_finished = true;
            }
            _ => {}
        }
    }
    assert!(saw_started && saw_finished);
}

#[tokio::test(start_paused = true)]
async fn multi_step_wizard_stops_on_unresolved_required_question() {
    let step_one = r#"
    <html><body><form>
        <label for="n">Full Name</label>
        <input type="text" id="n" name="full_name" required />
        <label for="e">Email</label>
        <input type="email" id="e" name="email" required />
        <button type="button">Next</button>
    </form></body></html>
    "#;
    let step_two = r#"
    <html><body><form>
        <label for="q">Why do you want to join us?</label>
        <textarea id="q" name="why_us" required></textarea>
        <button type="submit">Submit Application</button>
    </form></body></html>
    "#;

    let mut driver = ScriptedDriver::new(
        "jobs.example.com",
        vec![
            ("https://acme.wd5.myworkdayjobs.com/apply/1", step_one),
            ("https://acme.wd5.myworkdayjobs.com/apply/2", step_two),
        ],
    );

    // Raise the synthesis floor so the stock free-text fallback is refused
    // and the custom question stays unresolved.
    let config = EngineConfig {
        synthesis_threshold: 0.6,
        ..test_config()
    };
    let mut engine = engine(config);

    let attempt = engine
        .run_attempt(&mut driver, &job(), &answers_full())
        .await
        .expect("attempt should reach a terminal outcome");

    assert_eq!(attempt.variant, applyflow::variants::SystemVariant::Workday);
    assert_eq!(attempt.steps.len(), 2);
    assert_eq!(attempt.steps[0].action, StepAction::Advanced);
    assert_eq!(attempt.steps[1].action, StepAction::Halted);
    match attempt.outcome {
        Some(Outcome::RequiresManualReview(reason)) => {
            assert!(
                reason.starts_with("unresolved required field:"),
                "unexpected reason: {reason}"
            );
        }
        other => panic!("expected manual review, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn unconfirmed_submission_goes_to_manual_review() {
    // Clicking submit leads to a page that still shows the form and never
    // surfaces a success or failure signal.
    let mut driver = ScriptedDriver::new(
        "jobs.example.com",
        vec![
            ("https://careers.acme.com/apply", GENERIC_FORM),
            ("https://careers.acme.com/apply", GENERIC_FORM),
        ],
    );

    let mut engine = engine(test_config());
    let attempt = engine
        .run_attempt(&mut driver, &job(), &answers_full())
        .await
        .expect("attempt should reach a terminal outcome");

    assert_eq!(
        attempt.outcome,
        Some(Outcome::RequiresManualReview("submission unconfirmed".into()))
    );
}

#[tokio::test(start_paused = true)]
async fn restriction_signal_aborts_and_latches_the_session() {
    let blocked_page = r#"
    <html><body>
        <p>We have detected unusual activity from your account.</p>
        <form><input type="text" name="full_name" /></form>
    </body></html>
    "#;
    let mut driver = ScriptedDriver::new(
        "jobs.example.com",
        vec![("https://careers.acme.com/apply", blocked_page)],
    );

    let mut engine = engine(test_config());
    let attempt = engine
        .run_attempt(&mut driver, &job(), &answers_full())
        .await
        .expect("the blocked attempt itself still records an outcome");

    assert_eq!(
        attempt.outcome,
        Some(Outcome::Aborted("restriction signal detected".into()))
    );
    assert!(engine.pacing().is_blocked());

    // The next attempt must not start.
    let err = engine
        .run_attempt(&mut driver, &job(), &answers_full())
        .await
        .expect_err("latched controller refuses new attempts");
    assert!(matches!(err, EngineError::PacingBlocked));
}

#[tokio::test(start_paused = true)]
async fn exhausted_application_budget_refuses_to_start() {
    let config = EngineConfig {
        max_applications_per_session: 0,
        ..test_config()
    };
    let mut engine = engine(config);
    let mut driver = ScriptedDriver::new(
        "jobs.example.com",
        vec![("https://careers.acme.com/apply", GENERIC_FORM)],
    );

    let err = engine
        .run_attempt(&mut driver, &job(), &answers_full())
        .await
        .expect_err("no budget, no attempt");
    assert!(matches!(err, EngineError::PacingThrottled));
}

#[tokio::test(start_paused = true)]
async fn attempts_land_in_the_session_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("attempts.jsonl");

    let mut driver = ScriptedDriver::new(
        "jobs.example.com",
        vec![
            ("https://careers.acme.com/apply", GENERIC_FORM),
            ("https://careers.acme.com/apply/done", CONFIRMATION),
        ],
    );

    let mut engine = engine(test_config()).with_recorder(SessionRecorder::open(&path).unwrap());
    engine
        .run_attempt(&mut driver, &job(), &answers_full())
        .await
        .unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 1);
    let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(parsed["job_id"], "job-42");
    assert_eq!(parsed["outcome"]["status"], "submitted");
}

#[tokio::test(start_paused = true)]
async fn radio_group_selects_only_the_chosen_option() {
    let radio_form = r#"
    <html><body><form>
        <label for="n">Full Name</label>
        <input type="text" id="n" name="full_name" required />
        <input type="radio" id="wa_yes" name="work_authorization" value="yes" required />
        <label for="wa_yes">Yes</label>
        <input type="radio" id="wa_no" name="work_authorization" value="no" required />
        <label for="wa_no">No</label>
        <button type="submit">Submit Application</button>
    </form></body></html>
    "#;
    let mut driver = ScriptedDriver::new(
        "jobs.example.com",
        vec![
            ("https://careers.acme.com/apply", radio_form),
            ("https://careers.acme.com/apply/done", CONFIRMATION),
        ],
    );

    let answers = answers_full().with(
        AnswerKey::WorkAuthorization,
        AnswerValue::Choice("Yes".into()),
    );
    let mut engine = engine(test_config());
    let attempt = engine
        .run_attempt(&mut driver, &job(), &answers)
        .await
        .unwrap();

    assert_eq!(attempt.outcome, Some(Outcome::Submitted));
    // The "Yes" radio (index 1) is clicked; its "No" sibling (index 2) is
    // never touched.
    assert!(driver.clicked.contains(&1));
    assert!(!driver.clicked.contains(&2));
}

#[tokio::test(start_paused = true)]
async fn element_apply_failure_aborts_after_one_retry() {
    let mut driver = ScriptedDriver::new(
        "jobs.example.com",
        vec![("https://careers.acme.com/apply", GENERIC_FORM)],
    );
    driver.fail_fill_on = Some(0);

    let mut engine = engine(test_config());
    let attempt = engine
        .run_attempt(&mut driver, &job(), &answers_full())
        .await
        .unwrap();

    assert_eq!(
        attempt.outcome,
        Some(Outcome::Aborted("field apply failed".into()))
    );
    assert_eq!(attempt.steps.len(), 1);
    assert_eq!(attempt.steps[0].action, StepAction::Halted);
}

#[tokio::test(start_paused = true)]
async fn persistent_validation_error_aborts_after_one_refill() {
    // aria-invalid never clears, so the single re-fill pass is not enough.
    let invalid_form = r#"
    <html><body><form>
        <label for="e">Email</label>
        <input type="email" id="e" name="email" aria-invalid="true" required />
        <button type="submit">Submit Application</button>
    </form></body></html>
    "#;
    let mut driver = ScriptedDriver::new(
        "jobs.example.com",
        vec![("https://careers.acme.com/apply", invalid_form)],
    );

    let mut engine = engine(test_config());
    let attempt = engine
        .run_attempt(&mut driver, &job(), &answers_full())
        .await
        .unwrap();

    assert_eq!(
        attempt.outcome,
        Some(Outcome::Aborted("validation failed".into()))
    );
    // Original fill plus exactly one re-fill.
    let email_fills = driver.filled.iter().filter(|(i, _)| *i == 0).count();
    assert_eq!(email_fills, 2);
}

const COVER_LETTER_FORM: &str = r#"
<html><body><form>
    <label for="n">Full Name</label>
    <input type="text" id="n" name="full_name" required />
    <label for="cl">Cover Letter</label>
    <textarea id="cl" name="cover_letter" required></textarea>
    <button type="submit">Submit Application</button>
</form></body></html>
"#;

#[tokio::test(start_paused = true)]
async fn missing_cover_letter_is_generated_and_typed() {
    let mut driver = ScriptedDriver::new(
        "jobs.example.com",
        vec![
            ("https://careers.acme.com/apply", COVER_LETTER_FORM),
            ("https://careers.acme.com/apply/done", CONFIRMATION),
        ],
    );

    let generator = FixedGenerator {
        text: "Dear hiring team, I would love to build pipelines at Acme.".into(),
        fail: false,
    };
    let mut engine = engine(test_config())
        .with_generator(Arc::new(generator), Profile::default());

    let attempt = engine
        .run_attempt(&mut driver, &job(), &answers_full())
        .await
        .unwrap();

    assert_eq!(attempt.outcome, Some(Outcome::Submitted));
    assert!(driver
        .filled
        .iter()
        .any(|(_, text)| text.contains("Dear hiring team")));
}

#[tokio::test(start_paused = true)]
async fn generator_failure_aborts_the_attempt() {
    let mut driver = ScriptedDriver::new(
        "jobs.example.com",
        vec![("https://careers.acme.com/apply", COVER_LETTER_FORM)],
    );

    let generator = FixedGenerator {
        text: String::new(),
        fail: true,
    };
    let mut engine = engine(test_config())
        .with_generator(Arc::new(generator), Profile::default());

    let attempt = engine
        .run_attempt(&mut driver, &job(), &answers_full())
        .await
        .unwrap();

    assert_eq!(
        attempt.outcome,
        Some(Outcome::Aborted("content generation failed".into()))
    );
    assert!(driver.filled.is_empty(), "no field is touched after the failure");
}

#[tokio::test(start_paused = true)]
async fn cancellation_is_honored_at_a_transition_boundary() {
    let mut driver = ScriptedDriver::new(
        "jobs.example.com",
        vec![
            ("https://careers.acme.com/apply", GENERIC_FORM),
            ("https://careers.acme.com/apply/done", CONFIRMATION),
        ],
    );

    let mut engine = engine(test_config());
    engine.cancel_flag().store(true, std::sync::atomic::Ordering::Relaxed);

    let attempt = engine
        .run_attempt(&mut driver, &job(), &answers_full())
        .await
        .unwrap();

    assert_eq!(
        attempt.outcome,
        Some(Outcome::Aborted("cancelled by caller".into()))
    );
    assert!(driver.filled.is_empty(), "no element was touched");
}

#[tokio::test(start_paused = true)]
async fn unknown_page_goes_to_manual_review() {
    let not_a_form = r#"
    <html><body><h1>About us</h1><p>We make widgets.</p></body></html>
    "#;
    let mut driver = ScriptedDriver::new(
        "jobs.example.com",
        vec![("https://acme.com/about", not_a_form)],
    );

    let mut engine = engine(test_config());
    let attempt = engine
        .run_attempt(&mut driver, &job(), &answers_full())
        .await
        .unwrap();

    assert_eq!(
        attempt.outcome,
        Some(Outcome::RequiresManualReview(
            "unrecognized application system".into()
        ))
    );
}
