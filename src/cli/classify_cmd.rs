//! Classify a page and show what the mapper would do with it.

use crate::answers::AnswerSet;
use crate::classify::classify;
use crate::driver::chromium::ChromiumSession;
use crate::driver::PageDriver;
use crate::mapper::{map_fields, BindingValue, MapperConfig};
use crate::snapshot::{self, PageSnapshot};
use anyhow::{Context, Result};
use std::path::Path;
use url::Url;

/// Classify `target` — a local HTML file or a live URL — and print the
/// detected variant plus the field bindings a dry run would produce.
pub async fn run(target: &str, origin: Option<&str>, answers_path: Option<&Path>) -> Result<()> {
    let snap = load_snapshot(target, origin).await?;
    let variant = classify(&snap);

    println!("URL:      {}", snap.url);
    println!("Variant:  {variant}");
    println!("Fillable: {} of {} elements", snap.fillable_count(), snap.elements.len());
    println!();

    let answers = match answers_path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read answers: {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("invalid answers file: {}", path.display()))?
        }
        None => AnswerSet::new(),
    };

    let bindings = map_fields(&snap, variant, &answers, &MapperConfig::default());
    for binding in &bindings {
        let element = &snap.elements[binding.element];
        let key = binding
            .key
            .as_ref()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "-".to_string());
        let state = match &binding.value {
            BindingValue::Resolved(_) => "resolved".to_string(),
            BindingValue::Synthesized { confidence, .. } => {
                format!("synthesized ({confidence:.2})")
            }
            BindingValue::Unresolved => {
                if binding.required {
                    "UNRESOLVED (required)".to_string()
                } else {
                    "unresolved".to_string()
                }
            }
        };
        println!(
            "  [{:>2}] {:<24} {:<20} {}",
            binding.element,
            truncate(&element.label, 24),
            key,
            state
        );
    }
    Ok(())
}

async fn load_snapshot(target: &str, origin: Option<&str>) -> Result<PageSnapshot> {
    let path = Path::new(target);
    if path.exists() {
        let html = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let url = format!("file://{}", path.display());
        let origin = origin.unwrap_or("localhost");
        return Ok(snapshot::extract(&url, origin, &html));
    }

    let parsed = Url::parse(target).context("target is neither a file nor a valid URL")?;
    let host = parsed.host_str().unwrap_or_default().to_string();
    let origin = origin.unwrap_or(&host);

    let session = ChromiumSession::launch().await?;
    let mut driver = session.open(target, origin).await?;
    driver.snapshot().await
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
