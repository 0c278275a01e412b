//! Structural page snapshots.
//!
//! A [`PageSnapshot`] is an immutable observation of one loaded document:
//! final URL, raw HTML, visible text, and every interactive element with the
//! context needed for classification and field mapping. Element references
//! are indices into one snapshot and are never valid across a navigation
//! boundary — the engine re-extracts after every page change, which sidesteps
//! stale-reference failures entirely.

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The CSS query that defines "interactive element" for a snapshot.
///
/// Live drivers must use the same query so that element indices agree
/// between the parsed snapshot and `querySelectorAll` in the page.
pub const INTERACTIVE_QUERY: &str = "input, select, textarea, button";

/// Kind of input an interactive element accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputKind {
    Text,
    Email,
    Phone,
    Number,
    Url,
    TextArea,
    Select,
    File,
    Checkbox,
    Radio,
    Hidden,
    Button,
    Submit,
}

impl InputKind {
    /// Whether this element takes free text via keystrokes.
    pub fn is_typable(self) -> bool {
        matches!(
            self,
            InputKind::Text
                | InputKind::Email
                | InputKind::Phone
                | InputKind::Number
                | InputKind::Url
                | InputKind::TextArea
        )
    }
}

/// One choice inside a `<select>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectChoice {
    pub value: String,
    pub label: String,
}

/// One interactive element in a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormElement {
    /// Position in document order among `INTERACTIVE_QUERY` matches.
    pub index: usize,
    pub kind: InputKind,
    /// Best label text: `<label for>`, aria-label, placeholder, or nearby text.
    pub label: String,
    /// Text surrounding the element (parent container, truncated).
    pub nearby_text: String,
    /// The `name` or `id` attribute, whichever is present.
    pub name: String,
    pub placeholder: String,
    pub required: bool,
    pub current_value: String,
    /// Options when `kind == Select`.
    pub options: Vec<SelectChoice>,
    /// Stable CSS selector (`#id` or `tag[name=...]`), empty when neither
    /// attribute exists — drivers then fall back to index lookup.
    pub selector: String,
    /// Whether client-side validation marks this element invalid.
    pub invalid: bool,
}

impl FormElement {
    /// Whether the mapper should try to bind this element to an answer.
    pub fn is_fillable(&self) -> bool {
        !matches!(
            self.kind,
            InputKind::Button | InputKind::Submit | InputKind::Hidden
        )
    }

    /// Combined text used for matching: label, name, placeholder, nearby text.
    pub fn match_haystack(&self) -> String {
        format!(
            "{} {} {} {}",
            self.label, self.name, self.placeholder, self.nearby_text
        )
        .to_lowercase()
    }
}

/// Immutable structural snapshot of one loaded application page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSnapshot {
    /// Final URL of the document.
    pub url: String,
    /// Host the application attempt originated on. Used to decide whether
    /// the flow was ever redirected away from the origin site.
    pub origin_host: String,
    /// Raw HTML source (lowercase marker scans run against this).
    pub html: String,
    /// Visible text, whitespace-collapsed and lowercased.
    pub text: String,
    /// Interactive elements in document order.
    pub elements: Vec<FormElement>,
    pub captured_at: DateTime<Utc>,
}

impl PageSnapshot {
    /// Host of the snapshot URL, if parseable.
    pub fn host(&self) -> Option<String> {
        url::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
    }

    /// Number of fillable input elements.
    pub fn fillable_count(&self) -> usize {
        self.elements.iter().filter(|e| e.is_fillable()).count()
    }
}

/// Extract a structural snapshot from raw HTML.
pub fn extract(url: &str, origin_host: &str, html: &str) -> PageSnapshot {
    let document = Html::parse_document(html);

    let label_for = collect_label_map(&document);
    let mut elements = Vec::new();

    if let Ok(sel) = Selector::parse(INTERACTIVE_QUERY) {
        for (index, el) in document.select(&sel).enumerate() {
            elements.push(build_element(index, &el, &label_for));
        }
    }

    let text = collapse_whitespace(
        &document
            .root_element()
            .text()
            .collect::<Vec<_>>()
            .join(" "),
    )
    .to_lowercase();

    PageSnapshot {
        url: url.to_string(),
        origin_host: origin_host.to_lowercase(),
        html: html.to_string(),
        text,
        elements,
        captured_at: Utc::now(),
    }
}

/// Map of `for` attribute → label text for every `<label>` in the document.
fn collect_label_map(document: &Html) -> HashMap<String, String> {
    let mut map = HashMap::new();
    if let Ok(sel) = Selector::parse("label") {
        for label in document.select(&sel) {
            if let Some(target) = label.value().attr("for") {
                map.insert(target.to_string(), element_text(&label));
            }
        }
    }
    map
}

fn build_element(
    index: usize,
    el: &ElementRef<'_>,
    label_for: &HashMap<String, String>,
) -> FormElement {
    let tag = el.value().name();
    let type_attr = el.value().attr("type").unwrap_or("").to_lowercase();
    let kind = classify_kind(tag, &type_attr);

    let id = el.value().attr("id").unwrap_or("");
    let name_attr = el.value().attr("name").unwrap_or("");
    let placeholder = el.value().attr("placeholder").unwrap_or("").to_string();

    let nearby_text = parent_text(el);

    // Label resolution order: <label for>, aria-label, placeholder, nearby text.
    let label = label_for
        .get(id)
        .cloned()
        .or_else(|| el.value().attr("aria-label").map(String::from))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| {
            if matches!(kind, InputKind::Button | InputKind::Submit) {
                let text = element_text(el);
                if text.is_empty() {
                    el.value().attr("value").unwrap_or("").to_string()
                } else {
                    text
                }
            } else if !placeholder.is_empty() {
                placeholder.clone()
            } else {
                truncate(&nearby_text, 80)
            }
        });

    let required = el.value().attr("required").is_some()
        || el.value().attr("aria-required") == Some("true");
    let invalid = el.value().attr("aria-invalid") == Some("true");

    let current_value = if kind == InputKind::TextArea {
        element_text(el)
    } else {
        el.value().attr("value").unwrap_or("").to_string()
    };

    let options = if kind == InputKind::Select {
        collect_options(el)
    } else {
        Vec::new()
    };

    let selector = if !id.is_empty() {
        format!("#{id}")
    } else if !name_attr.is_empty() {
        format!("{tag}[name=\"{name_attr}\"]")
    } else {
        String::new()
    };

    let name = if !name_attr.is_empty() {
        name_attr.to_string()
    } else {
        id.to_string()
    };

    FormElement {
        index,
        kind,
        label: collapse_whitespace(&label),
        nearby_text: truncate(&nearby_text, 160),
        name,
        placeholder,
        required,
        current_value,
        options,
        selector,
        invalid,
    }
}

fn classify_kind(tag: &str, type_attr: &str) -> InputKind {
    match tag {
        "textarea" => InputKind::TextArea,
        "select" => InputKind::Select,
        "button" => {
            if type_attr == "submit" || type_attr.is_empty() {
                InputKind::Submit
            } else {
                InputKind::Button
            }
        }
        _ => match type_attr {
            "email" => InputKind::Email,
            "tel" => InputKind::Phone,
            "number" => InputKind::Number,
            "url" => InputKind::Url,
            "file" => InputKind::File,
            "checkbox" => InputKind::Checkbox,
            "radio" => InputKind::Radio,
            "hidden" => InputKind::Hidden,
            "submit" => InputKind::Submit,
            "button" | "reset" | "image" => InputKind::Button,
            _ => InputKind::Text,
        },
    }
}

fn collect_options(el: &ElementRef<'_>) -> Vec<SelectChoice> {
    let mut options = Vec::new();
    if let Ok(sel) = Selector::parse("option") {
        for option in el.select(&sel) {
            let label = element_text(&option);
            let value = option
                .value()
                .attr("value")
                .map(String::from)
                .unwrap_or_else(|| label.clone());
            options.push(SelectChoice { value, label });
        }
    }
    options
}

/// Text of the element's parent container, whitespace-collapsed.
fn parent_text(el: &ElementRef<'_>) -> String {
    el.parent()
        .and_then(ElementRef::wrap)
        .map(|p| element_text(&p))
        .unwrap_or_default()
}

/// Collect all visible text content from an element, trimmed and
/// whitespace-collapsed.
fn element_text(el: &ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM: &str = r#"
    <html><body>
        <form action="/apply" method="POST">
            <label for="fname">Full Name</label>
            <input type="text" id="fname" name="full_name" required />
            <label for="mail">Email Address</label>
            <input type="email" id="mail" name="email" required />
            <div>Phone number <input type="tel" name="phone" /></div>
            <input type="file" name="resume" accept=".pdf" required />
            <select name="work_auth" aria-required="true">
                <option value="">Select...</option>
                <option value="yes">Yes</option>
                <option value="no">No</option>
            </select>
            <textarea name="cover_letter" placeholder="Cover letter"></textarea>
            <button type="submit">Submit Application</button>
        </form>
    </body></html>
    "#;

    #[test]
    fn test_extract_elements_in_document_order() {
        let snap = extract("https://jobs.example.com/apply", "jobs.example.com", FORM);
        assert_eq!(snap.elements.len(), 7);
        assert_eq!(snap.elements[0].name, "full_name");
        assert_eq!(snap.elements[0].kind, InputKind::Text);
        assert_eq!(snap.elements[1].kind, InputKind::Email);
        assert_eq!(snap.elements[3].kind, InputKind::File);
        assert_eq!(snap.elements[4].kind, InputKind::Select);
        assert_eq!(snap.elements[6].kind, InputKind::Submit);
    }

    #[test]
    fn test_label_resolution() {
        let snap = extract("https://jobs.example.com/apply", "jobs.example.com", FORM);
        assert_eq!(snap.elements[0].label, "Full Name");
        assert_eq!(snap.elements[1].label, "Email Address");
        // No <label>: falls back to nearby text.
        assert!(snap.elements[2].label.to_lowercase().contains("phone"));
        // No label or nearby text: placeholder.
        assert_eq!(snap.elements[5].label, "Cover letter");
    }

    #[test]
    fn test_required_flags() {
        let snap = extract("https://jobs.example.com/apply", "jobs.example.com", FORM);
        assert!(snap.elements[0].required);
        assert!(snap.elements[3].required);
        // aria-required counts too.
        assert!(snap.elements[4].required);
        assert!(!snap.elements[5].required);
    }

    #[test]
    fn test_select_options_collected() {
        let snap = extract("https://jobs.example.com/apply", "jobs.example.com", FORM);
        let select = &snap.elements[4];
        assert_eq!(select.options.len(), 3);
        assert_eq!(select.options[1].value, "yes");
    }

    #[test]
    fn test_stable_selectors() {
        let snap = extract("https://jobs.example.com/apply", "jobs.example.com", FORM);
        assert_eq!(snap.elements[0].selector, "#fname");
        assert_eq!(snap.elements[2].selector, "input[name=\"phone\"]");
    }

    #[test]
    fn test_visible_text_lowercased() {
        let snap = extract("https://jobs.example.com/apply", "jobs.example.com", FORM);
        assert!(snap.text.contains("full name"));
        assert!(snap.text.contains("submit application"));
    }

    #[test]
    fn test_empty_html() {
        let snap = extract("https://example.com", "example.com", "");
        assert!(snap.elements.is_empty());
    }
}
