//! Chromium-based page driver using chromiumoxide.
//!
//! Interactions are executed as JavaScript in the page context. Every value
//! injected into a script is escaped for the JS string literal it lands in,
//! so user-supplied answers can never break out into code position.

use super::PageDriver;
use crate::snapshot::{self, FormElement, PageSnapshot, INTERACTIVE_QUERY};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. APPLYFLOW_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("APPLYFLOW_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. ~/.applyflow/chromium/
    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".applyflow/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".applyflow/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".applyflow/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".applyflow/chromium/chrome-linux64/chrome"),
                home.join(".applyflow/chromium/chrome"),
            ]
        };
        for c in candidates {
            if c.exists() {
                return Some(c);
            }
        }
    }

    // 3. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 4. Common macOS location
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Browser handle owning the headless Chromium process.
pub struct ChromiumSession {
    browser: Browser,
}

impl ChromiumSession {
    /// Launch a headless Chromium instance.
    pub async fn launch() -> Result<Self> {
        let chrome_path =
            find_chromium().context("Chromium not found. Run `applyflow doctor`.")?;

        let config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self { browser })
    }

    /// Open an application page and wrap it in a driver. `origin_host` is
    /// the host the attempt started on, used for quick-apply detection.
    pub async fn open(&self, url: &str, origin_host: &str) -> Result<ChromiumDriver> {
        let page = self
            .browser
            .new_page(url)
            .await
            .context("failed to open page")?;
        let _ = page.wait_for_navigation().await;

        Ok(ChromiumDriver {
            page,
            origin_host: origin_host.to_string(),
        })
    }
}

/// [`PageDriver`] over one Chromium page.
pub struct ChromiumDriver {
    page: Page,
    origin_host: String,
}

impl ChromiumDriver {
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .context("JS execution failed")?;
        result
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to convert JS result: {e:?}"))
    }

    /// JS expression locating an element: stable selector when the snapshot
    /// has one, otherwise index into the same interactive query the
    /// extractor used (document order matches).
    fn locator(element: &FormElement) -> String {
        if element.selector.is_empty() {
            format!(
                "document.querySelectorAll('{}')[{}]",
                INTERACTIVE_QUERY, element.index
            )
        } else {
            format!(
                "document.querySelector('{}')",
                sanitize_js_string(&element.selector)
            )
        }
    }

    async fn set_value(&self, element: &FormElement, value: &str) -> Result<()> {
        let script = format!(
            r#"(() => {{
                const el = {};
                if (!el) return {{ success: false }};
                el.value = '{}';
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return {{ success: true }};
            }})()"#,
            Self::locator(element),
            sanitize_js_string(value)
        );
        self.expect_success(&script, "set value").await
    }

    async fn expect_success(&self, script: &str, what: &str) -> Result<()> {
        let result = self.evaluate(script).await?;
        let ok = result
            .as_object()
            .and_then(|o| o.get("success"))
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if !ok {
            bail!("{what} failed: element not found");
        }
        Ok(())
    }
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn snapshot(&mut self) -> Result<PageSnapshot> {
        let html: String = self
            .evaluate("document.documentElement.outerHTML")
            .await
            .context("failed to get HTML")?
            .as_str()
            .map(String::from)
            .context("HTML result was not a string")?;

        let url = self.current_url().await?;
        Ok(snapshot::extract(&url, &self.origin_host, &html))
    }

    async fn fill_text(
        &mut self,
        element: &FormElement,
        text: &str,
        delays: &[Duration],
    ) -> Result<()> {
        // Focus once, then grow the value one keystroke at a time so the
        // page sees a human-shaped input stream.
        let focus = format!(
            r#"(() => {{ const el = {}; if (!el) return {{ success: false }};
                el.focus(); el.value = ''; return {{ success: true }}; }})()"#,
            Self::locator(element)
        );
        self.expect_success(&focus, "focus").await?;

        let mut typed = String::with_capacity(text.len());
        for (i, ch) in text.chars().enumerate() {
            if let Some(delay) = delays.get(i) {
                tokio::time::sleep(*delay).await;
            }
            typed.push(ch);
            self.set_value(element, &typed).await?;
        }
        Ok(())
    }

    async fn select_option(&mut self, element: &FormElement, value: &str) -> Result<()> {
        self.set_value(element, value).await
    }

    async fn attach_file(&mut self, element: &FormElement, path: &Path) -> Result<()> {
        if !path.exists() {
            bail!("file not found: {}", path.display());
        }

        let css = if element.selector.is_empty() {
            bail!("file input has no stable selector");
        } else {
            element.selector.clone()
        };

        let el = self
            .page
            .find_element(&css)
            .await
            .with_context(|| format!("file input not found: {css}"))?;

        let params = SetFileInputFilesParams::builder()
            .files(vec![path.to_string_lossy().to_string()])
            .backend_node_id(el.backend_node_id)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build file params: {e}"))?;
        self.page
            .execute(params)
            .await
            .context("failed to attach file")?;
        Ok(())
    }

    async fn click(&mut self, element: &FormElement) -> Result<()> {
        let script = format!(
            r#"(() => {{ const el = {}; if (!el) return {{ success: false }};
                el.click(); return {{ success: true }}; }})()"#,
            Self::locator(element)
        );
        self.expect_success(&script, "click").await
    }

    async fn wait_settle(&mut self, timeout: Duration) -> Result<()> {
        match tokio::time::timeout(timeout, self.page.wait_for_navigation()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => bail!("navigation failed: {e}"),
            Err(_) => bail!("navigation timed out after {}ms", timeout.as_millis()),
        }
    }

    async fn current_url(&mut self) -> Result<String> {
        let url = self
            .page
            .url()
            .await
            .context("failed to get URL")?
            .map(|u| u.to_string())
            .unwrap_or_default();
        Ok(url)
    }
}

/// Sanitize a string for safe injection into a JavaScript string literal.
///
/// Escapes all characters that could break out of a JS string context:
/// backslashes, quotes, backticks, newlines, angle brackets (to prevent
/// `</script>` injection), and strips null bytes.
fn sanitize_js_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '\\' => result.push_str("\\\\"),
            '\'' => result.push_str("\\'"),
            '"' => result.push_str("\\\""),
            '`' => result.push_str("\\`"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\0' => {}
            '<' => result.push_str("\\x3c"),
            '>' => result.push_str("\\x3e"),
            _ => result.push(ch),
        }
    }
    result
}
