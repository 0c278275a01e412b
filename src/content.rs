//! Content-generation collaborator boundary.
//!
//! Resume and cover-letter text comes from an external service the engine
//! treats as a black box. Only the trait and its inputs are part of the core
//! contract; failures surface as `Aborted("content generation failed")` on
//! the attempt that needed the content.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// What kind of document to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentKind {
    Resume,
    CoverLetter,
}

/// A job posting, supplied by the discovery collaborator. The engine never
/// searches or scores; it receives postings with an already-loaded page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: String,
    pub title: String,
    pub company: String,
    pub description: String,
    pub apply_url: String,
}

/// Applicant profile passed to the generator for customization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub summary: String,
    pub skills: Vec<String>,
}

/// External content-generation service.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Generate document text for one posting. Plain text out; rendering to
    /// a file format is the caller's concern.
    async fn generate(
        &self,
        kind: ContentKind,
        job: &JobPosting,
        profile: &Profile,
    ) -> Result<String>;
}

/// Test doubles for the generator seam, shared with integration tests.
pub mod testing {
    use super::*;

    /// Canned generator: fixed text, or a forced failure.
    pub struct FixedGenerator {
        pub text: String,
        pub fail: bool,
    }

    #[async_trait]
    impl ContentGenerator for FixedGenerator {
        async fn generate(
            &self,
            _kind: ContentKind,
            _job: &JobPosting,
            _profile: &Profile,
        ) -> Result<String> {
            if self.fail {
                anyhow::bail!("generator unavailable");
            }
            Ok(self.text.clone())
        }
    }
}
