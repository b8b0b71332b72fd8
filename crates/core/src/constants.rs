//! Constants used throughout the filler core crate.
//!
//! Placeholder names, record keys and literals live here so the mapping table and its
//! tests agree on the exact strings template authors use.

/// Separator used when a list-valued field is rendered into a single text box.
pub const LIST_SEPARATOR: &str = " / ";

/// Fallback for identity, narrative and exam fields.
pub const DASH: &str = "-";

/// "Denies" marker for personal-history fields with no content.
pub const DENIES: &str = "Nega";

/// Prefix added to follow-up visit dates.
pub const FOLLOW_UP_PREFIX: &str = "Retorno ";

/// Shown in place of the next-visit date if it cannot be computed.
pub const NEXT_VISIT_FALLBACK: &str = "__/ __/ 2025";

/// Token identifying the prototype exam slide.
pub const EXAM_PROTOTYPE_MARKER: &str = "{{exame_nome}}";

/// Number of follow-up visits a template has room for.
pub const FOLLOW_UP_SLOTS: usize = 3;

/// Number of neurological exam notes a template has room for.
pub const NEURO_EXAM_SLOTS: usize = 5;

/// Default Google Drive REST base URL.
pub const DEFAULT_DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Default Google Slides REST base URL.
pub const DEFAULT_SLIDES_API_BASE: &str = "https://slides.googleapis.com/v1";

/// Default Gemini REST base URL.
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default Gemini model used for history extraction.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Default timeout applied to outbound HTTP calls, in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
