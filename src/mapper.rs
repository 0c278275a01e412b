//! Field catalog matching and binding.
//!
//! `map_fields` pairs every fillable element of a snapshot with either a
//! resolved answer, a confidence-scored synthesized answer, or an explicit
//! `Unresolved` marker. It never returns partial state: one binding per
//! discovered element, in document order, so the state machine can decide
//! fail-fast versus proceed.
//!
//! # Confidence model
//!
//! Exact/normalized catalog matches are certain and carry no score. Fuzzy
//! matches are accepted only above `MapperConfig::fuzzy_threshold`.
//! Synthesized custom-question answers carry a confidence in `[0.0, 1.0]` —
//! narrative answers the caller actually supplied score 0.75, stock fallback
//! phrases score 0.55 and below, and the generic text fallback scores 0.30.
//! `MapperConfig::synthesis_threshold` is the acceptance floor; it is a
//! tunable, not a constant the rest of the engine depends on.

use crate::answers::{AnswerKey, AnswerSet, AnswerValue};
use crate::snapshot::{FormElement, InputKind, PageSnapshot};
use crate::variants::{profile, CatalogEntry, SystemVariant};
use serde::{Deserialize, Serialize};

/// Tunable mapper thresholds.
#[derive(Debug, Clone, Copy)]
pub struct MapperConfig {
    /// Minimum token-overlap confidence for fuzzy catalog matches.
    pub fuzzy_threshold: f32,
    /// Minimum confidence for accepting a synthesized answer.
    pub synthesis_threshold: f32,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 0.5,
            synthesis_threshold: 0.30,
        }
    }
}

/// How one element was bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BindingValue {
    /// Bound directly from the answer set.
    Resolved(AnswerValue),
    /// Best-effort synthesis for an uncataloged custom question.
    Synthesized { value: String, confidence: f32 },
    /// No binding. Fatal for the attempt only when the element is required.
    Unresolved,
}

/// Pairing of one element reference with its binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldBinding {
    /// Index into the snapshot this binding was produced from.
    pub element: usize,
    /// Semantic key when a catalog entry matched.
    pub key: Option<AnswerKey>,
    pub value: BindingValue,
    /// Whether an unresolved binding here aborts the attempt.
    pub required: bool,
}

impl FieldBinding {
    pub fn is_resolved(&self) -> bool {
        !matches!(self.value, BindingValue::Unresolved)
    }
}

/// Bind every fillable element of the snapshot to an answer.
///
/// Deterministic and idempotent: identical inputs yield identical bindings.
pub fn map_fields(
    snapshot: &PageSnapshot,
    variant: SystemVariant,
    answers: &AnswerSet,
    config: &MapperConfig,
) -> Vec<FieldBinding> {
    let catalog = profile(variant).catalog;
    let mut bindings = Vec::new();

    for element in snapshot.elements.iter().filter(|e| e.is_fillable()) {
        bindings.push(bind_element(element, catalog, answers, config));
    }

    bindings
}

/// The semantic key (or element label) of the first required element left
/// unresolved, if any.
pub fn first_unresolved_required(
    bindings: &[FieldBinding],
    snapshot: &PageSnapshot,
) -> Option<String> {
    bindings
        .iter()
        .find(|b| b.required && !b.is_resolved())
        .map(|b| match &b.key {
            Some(key) => key.to_string(),
            None => snapshot
                .elements
                .get(b.element)
                .map(|e| e.label.clone())
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| format!("element #{}", b.element)),
        })
}

fn bind_element(
    element: &FormElement,
    catalog: &[CatalogEntry],
    answers: &AnswerSet,
    config: &MapperConfig,
) -> FieldBinding {
    // Pre-filled fields are left alone and never count as required-missing.
    if is_prefilled(element) {
        return FieldBinding {
            element: element.index,
            key: None,
            value: BindingValue::Unresolved,
            required: false,
        };
    }

    // Pass 1 + 2: exact match, then fuzzy match above threshold.
    if let Some(entry) = match_catalog(element, catalog, config) {
        let value = resolve_from_answers(element, entry, answers);
        // Every radio in a group matches the same catalog entry; only the
        // one carrying the chosen option resolves, and its unresolved
        // siblings must not block the group.
        let required = if element.kind == InputKind::Radio
            && !matches!(value, BindingValue::Resolved(_))
            && answers.contains(&entry.key)
        {
            false
        } else {
            element.required
        };
        return FieldBinding {
            element: element.index,
            key: Some(entry.key.clone()),
            value,
            required,
        };
    }

    // Pass 3: custom-question synthesis.
    if let Some((value, confidence)) = synthesize(element, answers) {
        if confidence >= config.synthesis_threshold {
            return FieldBinding {
                element: element.index,
                key: None,
                value: BindingValue::Synthesized { value, confidence },
                required: element.required,
            };
        }
    }

    // Pass 4: explicitly unresolved.
    FieldBinding {
        element: element.index,
        key: None,
        value: BindingValue::Unresolved,
        required: element.required,
    }
}

fn is_prefilled(element: &FormElement) -> bool {
    !element.current_value.is_empty()
        && !matches!(
            element.kind,
            InputKind::File | InputKind::Checkbox | InputKind::Radio | InputKind::Select
        )
}

// ── Catalog matching ─────────────────────────────────────────────────────────

fn match_catalog<'a>(
    element: &FormElement,
    catalog: &'a [CatalogEntry],
    config: &MapperConfig,
) -> Option<&'a CatalogEntry> {
    let label = normalize(&element.label);
    let name = normalize(&element.name);

    // Exact/normalized match first.
    for entry in catalog {
        if !kind_allowed(element.kind, entry) {
            continue;
        }
        if entry
            .keywords
            .iter()
            .any(|kw| label == *kw || name == *kw)
        {
            return Some(entry);
        }
    }

    // Fuzzy fallback: best-scoring entry above the threshold.
    let haystack = normalize(&element.match_haystack());
    let mut best: Option<(&CatalogEntry, f32)> = None;
    for entry in catalog {
        if !kind_allowed(element.kind, entry) {
            continue;
        }
        let score = entry
            .keywords
            .iter()
            .map(|kw| phrase_score(&haystack, kw))
            .fold(0.0f32, f32::max);
        if score >= config.fuzzy_threshold {
            match best {
                Some((_, s)) if s >= score => {}
                _ => best = Some((entry, score)),
            }
        }
    }
    best.map(|(entry, _)| entry)
}

fn kind_allowed(kind: InputKind, entry: &CatalogEntry) -> bool {
    entry.kinds.contains(&kind)
}

/// Score how well a keyword phrase matches the haystack: full-phrase
/// containment scores 0.9, otherwise the fraction of keyword tokens present
/// scaled to a 0.8 ceiling.
fn phrase_score(haystack: &str, keyword: &str) -> f32 {
    if haystack.contains(keyword) {
        return 0.9;
    }
    let tokens: Vec<&str> = keyword.split_whitespace().collect();
    if tokens.is_empty() {
        return 0.0;
    }
    let hits = tokens.iter().filter(|t| haystack.contains(**t)).count();
    0.8 * hits as f32 / tokens.len() as f32
}

fn normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
        } else {
            out.push(' ');
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ── Answer resolution ────────────────────────────────────────────────────────

fn resolve_from_answers(
    element: &FormElement,
    entry: &CatalogEntry,
    answers: &AnswerSet,
) -> BindingValue {
    let Some(answer) = answers.get(&entry.key) else {
        return BindingValue::Unresolved;
    };

    match element.kind {
        // File inputs bind only from explicit file references. A text answer
        // matched against a file input is a binding error, not a silent skip.
        InputKind::File => {
            if answer.is_file() {
                BindingValue::Resolved(answer.clone())
            } else {
                BindingValue::Unresolved
            }
        }
        InputKind::Select => resolve_select(element, answer),
        // A radio resolves only when it is the group member carrying the
        // chosen option; clicking any other one would submit the wrong
        // answer.
        InputKind::Radio => match answer {
            AnswerValue::Choice(choice) if radio_matches(element, choice) => {
                BindingValue::Resolved(answer.clone())
            }
            AnswerValue::Flag(_) => BindingValue::Resolved(answer.clone()),
            _ => BindingValue::Unresolved,
        },
        InputKind::Checkbox => match answer {
            AnswerValue::Flag(_) | AnswerValue::Choice(_) => {
                BindingValue::Resolved(answer.clone())
            }
            _ => BindingValue::Unresolved,
        },
        _ => match answer.as_text() {
            Some(text) => BindingValue::Resolved(AnswerValue::Text(text)),
            None => BindingValue::Unresolved,
        },
    }
}

/// Whether this radio carries the chosen option, by `value` attribute or
/// label text.
fn radio_matches(element: &FormElement, choice: &str) -> bool {
    let wanted = choice.to_lowercase();
    let value = element.current_value.to_lowercase();
    let label = element.label.to_lowercase();
    (!value.is_empty() && value == wanted)
        || (!label.is_empty() && (label == wanted || label.contains(&wanted)))
}

/// Pick the `<select>` option matching the answer text.
fn resolve_select(element: &FormElement, answer: &AnswerValue) -> BindingValue {
    let Some(wanted) = answer.as_text() else {
        return BindingValue::Unresolved;
    };
    let wanted = wanted.to_lowercase();

    for option in &element.options {
        let label = option.label.to_lowercase();
        if label == wanted || label.contains(&wanted) || wanted.contains(&label) && !label.is_empty()
        {
            return BindingValue::Resolved(AnswerValue::Choice(option.value.clone()));
        }
    }
    BindingValue::Unresolved
}

// ── Custom-question synthesis ────────────────────────────────────────────────

/// Best-effort answer for a free-text custom question with no catalog match,
/// synthesized from the answer set's narrative fields.
fn synthesize(element: &FormElement, answers: &AnswerSet) -> Option<(String, f32)> {
    if element.kind == InputKind::Select {
        return synthesize_select(element);
    }
    if !element.kind.is_typable() {
        return None;
    }

    let haystack = element.match_haystack().to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| haystack.contains(w));

    if has(&["experience", "years"]) {
        if let Some(text) = answers.text(&AnswerKey::YearsExperience) {
            return Some((text, 0.75));
        }
    }
    if has(&["skills", "technologies"]) {
        if let Some(text) = answers.text(&AnswerKey::Skills) {
            return Some((text, 0.75));
        }
    }
    if has(&["education", "degree"]) {
        if let Some(text) = answers.text(&AnswerKey::Education) {
            return Some((text, 0.75));
        }
    }
    if has(&["location", "city"]) {
        if let Some(text) = answers.text(&AnswerKey::Location) {
            return Some((text, 0.75));
        }
    }
    if has(&["salary", "compensation"]) {
        let text = answers
            .text(&AnswerKey::SalaryExpectation)
            .unwrap_or_else(|| "Negotiable".to_string());
        return Some((text, 0.55));
    }
    if has(&["availability", "start date", "notice"]) {
        let text = answers
            .text(&AnswerKey::Availability)
            .unwrap_or_else(|| "Immediate".to_string());
        return Some((text, 0.55));
    }
    if has(&["portfolio", "github", "website"]) {
        if let Some(text) = answers.text(&AnswerKey::PortfolioUrl) {
            return Some((text, 0.75));
        }
    }

    // Generic fallbacks, low confidence.
    match element.kind {
        InputKind::Number => answers
            .text(&AnswerKey::YearsExperience)
            .map(|text| (text, 0.35)),
        InputKind::Text | InputKind::TextArea => {
            Some(("See resume for details".to_string(), 0.30))
        }
        _ => None,
    }
}

/// Dropdown synthesis: prefer an affirmative/availability option, otherwise
/// the second option (the first is usually a "Select..." placeholder).
fn synthesize_select(element: &FormElement) -> Option<(String, f32)> {
    const PREFERRED: &[&str] = &["yes", "available", "immediate", "bachelor", "5+"];

    for option in &element.options {
        let label = option.label.to_lowercase();
        if PREFERRED.iter().any(|p| label.contains(p)) {
            return Some((option.value.clone(), 0.45));
        }
    }
    if element.options.len() > 1 {
        return Some((element.options[1].value.clone(), 0.35));
    }
    None
}
