//! Language data and translation observability.
//!
//! # Architecture
//!
//! - `registry`: Single source of truth for supported languages, display names
//!   and text direction
//! - `language`: Type-safe `Language` validated against the registry
//! - `metrics`: Per-session translation counters
//!
//! # Example
//!
//! ```rust,ignore
//! use lingo_pane::i18n::{Language, LanguageRegistry};
//!
//! let spanish = Language::from_code("es")?;
//! let listing = LanguageRegistry::get().all_codes(&["en", "es", "fr", "de"]);
//! ```

mod language;
mod metrics;
mod registry;

pub use language::Language;
pub use metrics::{MetricsReport, TranslationMetrics};
pub use registry::{LanguageConfig, LanguageListing, LanguageRegistry};
