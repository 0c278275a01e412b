//! Page driver abstraction.
//!
//! Defines the [`PageDriver`] trait, the only seam through which the state
//! machine touches a live page. Element references come from the most recent
//! snapshot and are never assumed valid after a navigation — the machine
//! re-snapshots instead.

pub mod chromium;

use crate::snapshot::{FormElement, PageSnapshot};
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// A driver for one live application page.
#[async_trait]
pub trait PageDriver: Send {
    /// Extract a fresh structural snapshot of the current document.
    async fn snapshot(&mut self) -> Result<PageSnapshot>;

    /// Type text into an element, sleeping `delays[i]` before keystroke `i`.
    /// `delays` shorter than the text falls back to no delay for the rest.
    async fn fill_text(
        &mut self,
        element: &FormElement,
        text: &str,
        delays: &[Duration],
    ) -> Result<()>;

    /// Choose an option in a `<select>` by option value.
    async fn select_option(&mut self, element: &FormElement, value: &str) -> Result<()>;

    /// Attach a file to a file input.
    async fn attach_file(&mut self, element: &FormElement, path: &Path) -> Result<()>;

    /// Click an element.
    async fn click(&mut self, element: &FormElement) -> Result<()>;

    /// Wait for a navigation or the page to settle after a click.
    /// Errors when the timeout elapses without the page settling.
    async fn wait_settle(&mut self, timeout: Duration) -> Result<()>;

    /// Current document URL.
    async fn current_url(&mut self) -> Result<String>;
}
