//! Per-variant strategy table.
//!
//! Each application system variant owns one [`VariantProfile`]: the signals
//! that identify it, the field catalog the mapper matches against, and the
//! labels that distinguish its "next step" control from its terminal submit
//! control. All variant-specific behavior lives here so the state machine
//! stays free of per-system branching.

use crate::answers::AnswerKey;
use crate::snapshot::InputKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of which application system is hosting the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemVariant {
    /// Quick-apply flow hosted on the job board's own site, no redirect.
    NativeQuickApply,
    Workday,
    Lever,
    Greenhouse,
    BambooHr,
    /// Recognizable application form on an unrecognized system.
    GenericForm,
    /// Not classifiable. A valid terminal classification, not an error.
    Unknown,
}

impl fmt::Display for SystemVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SystemVariant::NativeQuickApply => "native_quick_apply",
            SystemVariant::Workday => "workday",
            SystemVariant::Lever => "lever",
            SystemVariant::Greenhouse => "greenhouse",
            SystemVariant::BambooHr => "bamboohr",
            SystemVariant::GenericForm => "generic_form",
            SystemVariant::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// One (semantic key, matcher) catalog row.
///
/// `keywords` are matched against an element's label/name/placeholder text;
/// `kinds` constrains which input kinds the key may bind to.
pub struct CatalogEntry {
    pub key: AnswerKey,
    pub keywords: &'static [&'static str],
    pub kinds: &'static [InputKind],
}

/// Strategy entry for one system variant.
pub struct VariantProfile {
    pub variant: SystemVariant,
    /// URL host substrings that decisively identify this variant.
    pub host_patterns: &'static [&'static str],
    /// Structural markers searched in raw HTML, ordered by specificity.
    pub markers: &'static [&'static str],
    /// Whether this system commonly presents multi-page wizards.
    pub multi_step: bool,
    /// Labels of the control that advances to the next wizard page.
    pub next_labels: &'static [&'static str],
    /// Labels of the terminal submit control.
    pub submit_labels: &'static [&'static str],
    pub catalog: &'static [CatalogEntry],
}

const TEXT_KINDS: &[InputKind] = &[
    InputKind::Text,
    InputKind::TextArea,
];
const NAME_KINDS: &[InputKind] = &[InputKind::Text];
const EMAIL_KINDS: &[InputKind] = &[InputKind::Email, InputKind::Text];
const PHONE_KINDS: &[InputKind] = &[InputKind::Phone, InputKind::Text];
const NUMBER_KINDS: &[InputKind] = &[InputKind::Number, InputKind::Text];
const URL_KINDS: &[InputKind] = &[InputKind::Url, InputKind::Text];
const FILE_KINDS: &[InputKind] = &[InputKind::File];
const CHOICE_KINDS: &[InputKind] = &[
    InputKind::Select,
    InputKind::Radio,
    InputKind::Checkbox,
];
const LETTER_KINDS: &[InputKind] = &[InputKind::TextArea, InputKind::File];

/// Shared field vocabulary. The ATS vendors label these fields nearly
/// identically, so every variant starts from this catalog; per-variant
/// divergence happens through markers and control labels instead.
const BASE_CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        key: AnswerKey::FullName,
        keywords: &["full name", "name", "first and last name", "legal name"],
        kinds: NAME_KINDS,
    },
    CatalogEntry {
        key: AnswerKey::Email,
        keywords: &["email", "email address", "e-mail"],
        kinds: EMAIL_KINDS,
    },
    CatalogEntry {
        key: AnswerKey::Phone,
        keywords: &["phone", "phone number", "mobile", "telephone"],
        kinds: PHONE_KINDS,
    },
    CatalogEntry {
        key: AnswerKey::ResumeFile,
        keywords: &["resume", "cv", "curriculum vitae", "upload resume"],
        kinds: FILE_KINDS,
    },
    CatalogEntry {
        key: AnswerKey::CoverLetterText,
        keywords: &["cover letter", "covering letter", "letter", "message to hiring"],
        kinds: LETTER_KINDS,
    },
    CatalogEntry {
        key: AnswerKey::YearsExperience,
        keywords: &["years of experience", "years experience"],
        kinds: NUMBER_KINDS,
    },
    CatalogEntry {
        key: AnswerKey::Skills,
        keywords: &["skills", "technologies", "tech stack"],
        kinds: TEXT_KINDS,
    },
    CatalogEntry {
        key: AnswerKey::Education,
        keywords: &["education", "degree", "highest education"],
        kinds: TEXT_KINDS,
    },
    CatalogEntry {
        key: AnswerKey::Location,
        keywords: &["location", "city", "current location", "where are you based"],
        kinds: TEXT_KINDS,
    },
    CatalogEntry {
        key: AnswerKey::SalaryExpectation,
        keywords: &["salary", "compensation", "expected salary", "salary expectation"],
        kinds: TEXT_KINDS,
    },
    CatalogEntry {
        key: AnswerKey::Availability,
        keywords: &["availability", "start date", "notice period", "when can you start"],
        kinds: TEXT_KINDS,
    },
    CatalogEntry {
        key: AnswerKey::PortfolioUrl,
        keywords: &["portfolio", "github", "website", "linkedin", "personal site"],
        kinds: URL_KINDS,
    },
    CatalogEntry {
        key: AnswerKey::WorkAuthorization,
        keywords: &[
            "work authorization",
            "authorized to work",
            "legally authorized",
            "require sponsorship",
            "visa",
        ],
        kinds: CHOICE_KINDS,
    },
];

const NEXT_LABELS: &[&str] = &["next", "continue", "save and continue", "review"];
const SUBMIT_LABELS: &[&str] = &[
    "submit application",
    "submit",
    "send application",
    "apply now",
    "apply",
];

static NATIVE_QUICK_APPLY: VariantProfile = VariantProfile {
    variant: SystemVariant::NativeQuickApply,
    host_patterns: &[],
    markers: &["quick-apply", "easy-apply", "jobs-apply", "inline-apply"],
    multi_step: true,
    next_labels: NEXT_LABELS,
    submit_labels: SUBMIT_LABELS,
    catalog: BASE_CATALOG,
};

static WORKDAY: VariantProfile = VariantProfile {
    variant: SystemVariant::Workday,
    host_patterns: &["myworkdayjobs.com", "workday"],
    markers: &["data-automation-id", "workday"],
    multi_step: true,
    next_labels: NEXT_LABELS,
    submit_labels: SUBMIT_LABELS,
    catalog: BASE_CATALOG,
};

static LEVER: VariantProfile = VariantProfile {
    variant: SystemVariant::Lever,
    host_patterns: &["lever.co"],
    markers: &["lever-", "postings-btn"],
    multi_step: false,
    next_labels: NEXT_LABELS,
    submit_labels: SUBMIT_LABELS,
    catalog: BASE_CATALOG,
};

static GREENHOUSE: VariantProfile = VariantProfile {
    variant: SystemVariant::Greenhouse,
    host_patterns: &["greenhouse.io"],
    markers: &["grnhse", "greenhouse"],
    multi_step: true,
    next_labels: NEXT_LABELS,
    submit_labels: SUBMIT_LABELS,
    catalog: BASE_CATALOG,
};

static BAMBOO_HR: VariantProfile = VariantProfile {
    variant: SystemVariant::BambooHr,
    host_patterns: &["bamboohr.com"],
    markers: &["bamboohr"],
    multi_step: false,
    next_labels: NEXT_LABELS,
    submit_labels: SUBMIT_LABELS,
    catalog: BASE_CATALOG,
};

static GENERIC_FORM: VariantProfile = VariantProfile {
    variant: SystemVariant::GenericForm,
    host_patterns: &[],
    markers: &[],
    multi_step: true,
    next_labels: NEXT_LABELS,
    submit_labels: SUBMIT_LABELS,
    catalog: BASE_CATALOG,
};

static ATS_PROFILES: [&VariantProfile; 4] = [&WORKDAY, &LEVER, &GREENHOUSE, &BAMBOO_HR];

/// Third-party ATS profiles in classification order. Host patterns are
/// checked across all of these before any structural marker is consulted,
/// so an exact host match always outranks a heuristic.
pub fn ats_profiles() -> &'static [&'static VariantProfile] {
    &ATS_PROFILES
}

/// Strategy entry for a classified variant. `Unknown` has no profile;
/// callers treat it as terminal before reaching for one.
pub fn profile(variant: SystemVariant) -> &'static VariantProfile {
    match variant {
        SystemVariant::NativeQuickApply => &NATIVE_QUICK_APPLY,
        SystemVariant::Workday => &WORKDAY,
        SystemVariant::Lever => &LEVER,
        SystemVariant::Greenhouse => &GREENHOUSE,
        SystemVariant::BambooHr => &BAMBOO_HR,
        SystemVariant::GenericForm | SystemVariant::Unknown => &GENERIC_FORM,
    }
}

pub fn native_profile() -> &'static VariantProfile {
    &NATIVE_QUICK_APPLY
}
