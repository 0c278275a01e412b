//! Run one application attempt against a live page.

use crate::answers::AnswerSet;
use crate::config::EngineConfig;
use crate::content::JobPosting;
use crate::driver::chromium::ChromiumSession;
use crate::error::EngineError;
use crate::machine::{Engine, Outcome};
use crate::record::SessionRecorder;
use anyhow::{Context, Result};
use std::path::Path;
use url::Url;
use uuid::Uuid;

/// Open `url`, drive the application flow with the given answers, and print
/// the terminal outcome. Every attempt lands in the attempt record.
pub async fn run(
    url: &str,
    answers_path: &Path,
    title: Option<&str>,
    company: Option<&str>,
) -> Result<()> {
    let config = EngineConfig::load()?;

    let raw = std::fs::read_to_string(answers_path)
        .with_context(|| format!("failed to read answers: {}", answers_path.display()))?;
    let answers: AnswerSet = serde_json::from_str(&raw)
        .with_context(|| format!("invalid answers file: {}", answers_path.display()))?;

    let parsed = Url::parse(url).context("invalid application URL")?;
    let origin_host = parsed.host_str().unwrap_or_default().to_string();

    let job = JobPosting {
        id: Uuid::new_v4().to_string(),
        title: title.unwrap_or("(unknown)").to_string(),
        company: company.unwrap_or("(unknown)").to_string(),
        description: String::new(),
        apply_url: url.to_string(),
    };

    let session = ChromiumSession::launch().await?;
    let mut driver = session.open(url, &origin_host).await?;

    let mut engine =
        Engine::new(config).with_recorder(SessionRecorder::default_recorder()?);

    match engine.run_attempt(&mut driver, &job, &answers).await {
        Ok(attempt) => {
            match attempt.outcome {
                Some(Outcome::Submitted) => println!("Submitted ({} steps)", attempt.steps.len()),
                Some(Outcome::Aborted(reason)) => println!("Aborted: {reason}"),
                Some(Outcome::RequiresManualReview(reason)) => {
                    println!("Manual review needed: {reason}");
                    println!("  Finish this one yourself: {url}");
                }
                None => println!("Attempt ended without an outcome"),
            }
            let budget = engine.pacing().budget();
            println!(
                "Budget: {} applications, {} actions remaining",
                budget.applications_remaining, budget.actions_remaining
            );
            Ok(())
        }
        Err(EngineError::PacingThrottled) => {
            println!("Session budget exhausted — come back later.");
            Ok(())
        }
        Err(EngineError::PacingBlocked) => {
            anyhow::bail!("restriction signal latched; end the session")
        }
        Err(e) => Err(e.into()),
    }
}
