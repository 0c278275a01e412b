//! Applicant answer sets.
//!
//! An [`AnswerSet`] is the caller-supplied mapping from semantic field keys
//! to typed values. It is immutable for the duration of one application
//! attempt; the mapper reads from it, never writes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Semantic key for an applicant answer.
///
/// Serialized as its snake_case string form so keys work as JSON map keys,
/// `Custom` included.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AnswerKey {
    FullName,
    Email,
    Phone,
    YearsExperience,
    Skills,
    Education,
    Location,
    SalaryExpectation,
    Availability,
    PortfolioUrl,
    WorkAuthorization,
    ResumeFile,
    CoverLetterText,
    /// Free-text custom question key, e.g. a question the caller has a
    /// canned answer for.
    Custom(String),
}

impl fmt::Display for AnswerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnswerKey::FullName => "full_name",
            AnswerKey::Email => "email",
            AnswerKey::Phone => "phone",
            AnswerKey::YearsExperience => "years_experience",
            AnswerKey::Skills => "skills",
            AnswerKey::Education => "education",
            AnswerKey::Location => "location",
            AnswerKey::SalaryExpectation => "salary_expectation",
            AnswerKey::Availability => "availability",
            AnswerKey::PortfolioUrl => "portfolio_url",
            AnswerKey::WorkAuthorization => "work_authorization",
            AnswerKey::ResumeFile => "resume_file",
            AnswerKey::CoverLetterText => "cover_letter_text",
            AnswerKey::Custom(key) => key,
        };
        f.write_str(name)
    }
}

impl From<String> for AnswerKey {
    fn from(s: String) -> Self {
        match s.as_str() {
            "full_name" => AnswerKey::FullName,
            "email" => AnswerKey::Email,
            "phone" => AnswerKey::Phone,
            "years_experience" => AnswerKey::YearsExperience,
            "skills" => AnswerKey::Skills,
            "education" => AnswerKey::Education,
            "location" => AnswerKey::Location,
            "salary_expectation" => AnswerKey::SalaryExpectation,
            "availability" => AnswerKey::Availability,
            "portfolio_url" => AnswerKey::PortfolioUrl,
            "work_authorization" => AnswerKey::WorkAuthorization,
            "resume_file" => AnswerKey::ResumeFile,
            "cover_letter_text" => AnswerKey::CoverLetterText,
            _ => AnswerKey::Custom(s),
        }
    }
}

impl From<AnswerKey> for String {
    fn from(key: AnswerKey) -> Self {
        key.to_string()
    }
}

/// Typed answer value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerValue {
    Text(String),
    /// A choice among enumerated options (dropdowns, radios).
    Choice(String),
    /// Reference to a file on disk (resume, cover letter document).
    File(PathBuf),
    Flag(bool),
}

impl AnswerValue {
    /// Text rendering for typable fields. `None` for file references.
    pub fn as_text(&self) -> Option<String> {
        match self {
            AnswerValue::Text(s) | AnswerValue::Choice(s) => Some(s.clone()),
            AnswerValue::Flag(b) => Some(if *b { "Yes" } else { "No" }.to_string()),
            AnswerValue::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&PathBuf> {
        match self {
            AnswerValue::File(path) => Some(path),
            _ => None,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, AnswerValue::File(_))
    }
}

/// Caller-supplied mapping from semantic keys to answers. Serializes as a
/// flat JSON object keyed by the answer key strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet {
    entries: HashMap<AnswerKey, AnswerValue>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: AnswerKey, value: AnswerValue) -> Self {
        self.entries.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: AnswerKey, value: AnswerValue) {
        self.entries.insert(key, value);
    }

    pub fn get(&self, key: &AnswerKey) -> Option<&AnswerValue> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &AnswerKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn text(&self, key: &AnswerKey) -> Option<String> {
        self.get(key).and_then(|v| v.as_text())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_lookup() {
        let answers = AnswerSet::new()
            .with(AnswerKey::FullName, AnswerValue::Text("Ada Lovelace".into()))
            .with(AnswerKey::ResumeFile, AnswerValue::File("/tmp/resume.pdf".into()));

        assert_eq!(
            answers.text(&AnswerKey::FullName).as_deref(),
            Some("Ada Lovelace")
        );
        assert!(answers.get(&AnswerKey::ResumeFile).unwrap().is_file());
        assert!(answers.text(&AnswerKey::ResumeFile).is_none());
    }

    #[test]
    fn test_flag_renders_as_text() {
        let value = AnswerValue::Flag(true);
        assert_eq!(value.as_text().as_deref(), Some("Yes"));
    }

    #[test]
    fn test_custom_key_display() {
        let key = AnswerKey::Custom("why_this_company".into());
        assert_eq!(key.to_string(), "why_this_company");
        assert_eq!(AnswerKey::YearsExperience.to_string(), "years_experience");
    }

    #[test]
    fn test_answer_file_round_trips() {
        let json = r#"{
            "full_name": { "text": "Ada Lovelace" },
            "resume_file": { "file": "/tmp/resume.pdf" },
            "why_this_company": { "text": "The mission." }
        }"#;
        let answers: AnswerSet = serde_json::from_str(json).unwrap();

        assert_eq!(
            answers.text(&AnswerKey::FullName).as_deref(),
            Some("Ada Lovelace")
        );
        assert!(answers.contains(&AnswerKey::Custom("why_this_company".into())));

        let back = serde_json::to_value(&answers).unwrap();
        assert_eq!(back["full_name"]["text"], "Ada Lovelace");
    }
}
