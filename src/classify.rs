//! Page classification.
//!
//! `classify` is a pure function of a [`PageSnapshot`]: no I/O, no
//! randomness, stable for identical snapshots. Rules run in a fixed order —
//! native quick-apply first (narrowest signal), then decisive host-pattern
//! matches for each third-party ATS, then structural markers ranked by
//! specificity, then a generic-form heuristic. Anything left is `Unknown`,
//! which is a valid terminal classification rather than an error.

use crate::snapshot::PageSnapshot;
use crate::variants::{ats_profiles, native_profile, SystemVariant};

/// Vocabulary that suggests a page is a job application form at all.
const APPLICATION_VOCAB: &[&str] = &[
    "application",
    "apply",
    "resume",
    "cover letter",
    "upload",
    "submit",
];

/// Minimum vocabulary hits before the generic-form heuristic fires.
const MIN_VOCAB_HITS: usize = 3;

/// Input count above which a page is assumed to be a form even without
/// application vocabulary.
const MIN_INPUT_COUNT: usize = 5;

/// Classify which application system hosts the snapshot's page.
pub fn classify(snapshot: &PageSnapshot) -> SystemVariant {
    let host = snapshot.host().unwrap_or_default();
    let html_lower = snapshot.html.to_lowercase();

    // Quick-apply only applies when the flow never left the origin site.
    if !host.is_empty() && host == snapshot.origin_host {
        let native = native_profile();
        if native.markers.iter().any(|m| html_lower.contains(m)) {
            return SystemVariant::NativeQuickApply;
        }
    }

    // Host-pattern match is decisive and short-circuits everything below.
    for profile in ats_profiles() {
        if profile.host_patterns.iter().any(|p| host.contains(p)) {
            return profile.variant;
        }
    }

    // Structural markers, in table order (most specific first per variant).
    for profile in ats_profiles() {
        if profile.markers.iter().any(|m| html_lower.contains(m)) {
            return profile.variant;
        }
    }

    if looks_like_application_form(snapshot) {
        return SystemVariant::GenericForm;
    }

    SystemVariant::Unknown
}

/// Generic-form heuristic: enough application vocabulary, or an actual
/// `<form>`, or a large cluster of inputs.
fn looks_like_application_form(snapshot: &PageSnapshot) -> bool {
    let vocab_hits = APPLICATION_VOCAB
        .iter()
        .filter(|word| snapshot.text.contains(*word))
        .count();

    vocab_hits >= MIN_VOCAB_HITS
        || snapshot.html.to_lowercase().contains("<form")
        || snapshot.fillable_count() > MIN_INPUT_COUNT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::extract;

    fn snap(url: &str, origin: &str, html: &str) -> PageSnapshot {
        extract(url, origin, html)
    }

    #[test]
    fn test_host_match_workday() {
        let s = snap(
            "https://acme.wd5.myworkdayjobs.com/en-US/careers/apply",
            "jobs.example.com",
            "<html><body></body></html>",
        );
        assert_eq!(classify(&s), SystemVariant::Workday);
    }

    #[test]
    fn test_host_match_lever_and_greenhouse() {
        let lever = snap(
            "https://jobs.lever.co/acme/123/apply",
            "jobs.example.com",
            "<html></html>",
        );
        assert_eq!(classify(&lever), SystemVariant::Lever);

        let greenhouse = snap(
            "https://boards.greenhouse.io/acme/jobs/456",
            "jobs.example.com",
            "<html></html>",
        );
        assert_eq!(classify(&greenhouse), SystemVariant::Greenhouse);
    }

    #[test]
    fn test_native_quick_apply_requires_origin_host() {
        let html = r#"<div class="quick-apply-modal"><form></form></div>"#;

        let on_origin = snap("https://jobs.example.com/posting/1", "jobs.example.com", html);
        assert_eq!(classify(&on_origin), SystemVariant::NativeQuickApply);

        // Same markup after a redirect is not quick-apply.
        let redirected = snap("https://careers.acme.com/posting/1", "jobs.example.com", html);
        assert_ne!(classify(&redirected), SystemVariant::NativeQuickApply);
    }

    #[test]
    fn test_host_outranks_structural_marker() {
        // Greenhouse host but Workday-looking markup: host wins.
        let s = snap(
            "https://boards.greenhouse.io/acme/jobs/9",
            "jobs.example.com",
            r#"<div data-automation-id="jobTitle"></div>"#,
        );
        assert_eq!(classify(&s), SystemVariant::Greenhouse);
    }

    #[test]
    fn test_structural_marker_fallback() {
        let s = snap(
            "https://careers.acme.com/apply",
            "jobs.example.com",
            r#"<div id="grnhse_app"></div>"#,
        );
        assert_eq!(classify(&s), SystemVariant::Greenhouse);
    }

    #[test]
    fn test_generic_form_vocab_heuristic() {
        let s = snap(
            "https://careers.acme.com/apply",
            "jobs.example.com",
            "<html><body><p>Apply for this role. Upload your resume and \
             cover letter, then submit your application.</p></body></html>",
        );
        assert_eq!(classify(&s), SystemVariant::GenericForm);
    }

    #[test]
    fn test_unknown_for_unrelated_page() {
        let s = snap(
            "https://blog.acme.com/post",
            "jobs.example.com",
            "<html><body><h1>My Personal Blog</h1><p>Nothing here.</p></body></html>",
        );
        assert_eq!(classify(&s), SystemVariant::Unknown);
    }

    #[test]
    fn test_deterministic_and_idempotent() {
        let s = snap(
            "https://acme.bamboohr.com/careers/33",
            "jobs.example.com",
            "<html></html>",
        );
        let first = classify(&s);
        for _ in 0..10 {
            assert_eq!(classify(&s), first);
        }
        assert_eq!(first, SystemVariant::BambooHr);
    }
}
