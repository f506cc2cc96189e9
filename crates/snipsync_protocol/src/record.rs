//! Snippet records and the raw wire-record mapping.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Language classification of a snippet.
///
/// Remote records carry language as free text; [`Language::from_label`]
/// normalizes it by case-insensitive substring match. Anything that is
/// neither Spanish nor English maps to [`Language::All`], the
/// "unclassified" default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Unclassified / applies to every language.
    #[default]
    All,
    /// Spanish.
    Spanish,
    /// English.
    English,
}

impl Language {
    /// Normalizes a free-text language label.
    pub fn from_label(label: &str) -> Self {
        let lower = label.to_lowercase();
        if lower.contains("span") {
            Language::Spanish
        } else if lower.contains("eng") {
            Language::English
        } else {
            Language::All
        }
    }

    /// Returns the canonical label for this language.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::All => "all",
            Language::Spanish => "spanish",
            Language::English => "english",
        }
    }
}

/// A text snippet, the unit of synchronized data.
///
/// Snippets are keyed by `trigger`; the local store holds at most one
/// snippet per trigger. An insert whose trigger already exists replaces
/// the old entry in place, preserving its position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    /// Unique trigger key (non-empty, bounded length).
    pub trigger: String,
    /// Expansion body (non-empty, bounded length).
    pub expansion: String,
    /// Language classification.
    #[serde(default)]
    pub language: Language,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Comma-separated tags.
    #[serde(default)]
    pub tags: Option<String>,
    /// Owning application name.
    #[serde(default)]
    pub application: Option<String>,
    /// Style category.
    #[serde(default)]
    pub style: Option<String>,
    /// Style subcategory.
    #[serde(default)]
    pub substyle: Option<String>,
    /// Target platform.
    #[serde(default)]
    pub platform: Option<String>,
    /// Usage-frequency hint.
    #[serde(default)]
    pub usage: Option<String>,
    /// Last-updated timestamp as reported by the backend (free-form).
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Favorite flag.
    #[serde(default)]
    pub favorite: bool,
}

impl Snippet {
    /// Creates a snippet with only the required fields set.
    pub fn new(trigger: impl Into<String>, expansion: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            expansion: expansion.into(),
            language: Language::All,
            description: None,
            tags: None,
            application: None,
            style: None,
            substyle: None,
            platform: None,
            usage: None,
            updated_at: None,
            favorite: false,
        }
    }

    /// Sets the language.
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Sets the favorite flag.
    pub fn with_favorite(mut self, favorite: bool) -> Self {
        self.favorite = favorite;
        self
    }
}

/// A snippet record exactly as the backend sends it.
///
/// The backend is loose about types: `language` is free text and
/// `favorite` may arrive as a bool, a number, or a string. Missing fields
/// default. [`RawSnippet::into_snippet`] applies the normalization rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSnippet {
    /// Trigger key.
    #[serde(default)]
    pub trigger: String,
    /// Expansion body.
    #[serde(default)]
    pub expansion: String,
    /// Free-text language label.
    #[serde(default)]
    pub language: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Tags.
    #[serde(default)]
    pub tags: Option<String>,
    /// Owning application.
    #[serde(default)]
    pub application: Option<String>,
    /// Style category.
    #[serde(default)]
    pub style: Option<String>,
    /// Style subcategory.
    #[serde(default)]
    pub substyle: Option<String>,
    /// Target platform.
    #[serde(default)]
    pub platform: Option<String>,
    /// Usage-frequency hint.
    #[serde(default)]
    pub usage: Option<String>,
    /// Last-updated timestamp.
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Favorite flag in whatever type the backend chose.
    #[serde(default)]
    pub favorite: Value,
}

impl RawSnippet {
    /// Maps this raw record into a normalized [`Snippet`].
    pub fn into_snippet(self) -> Snippet {
        Snippet {
            trigger: self.trigger,
            expansion: self.expansion,
            language: self
                .language
                .as_deref()
                .map(Language::from_label)
                .unwrap_or_default(),
            description: self.description,
            tags: self.tags,
            application: self.application,
            style: self.style,
            substyle: self.substyle,
            platform: self.platform,
            usage: self.usage,
            updated_at: self.updated_at,
            favorite: coerce_bool(&self.favorite),
        }
    }
}

/// Boolean coercion for loosely-typed wire fields.
///
/// `true`, non-zero numbers, and the strings `"true"`/`"1"` are truthy;
/// everything else (including null) is falsy.
fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => s == "true" || s == "1",
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn language_normalization() {
        assert_eq!(Language::from_label("Spanish"), Language::Spanish);
        assert_eq!(Language::from_label("es-ES (Español/Spanish)"), Language::Spanish);
        assert_eq!(Language::from_label("english"), Language::English);
        assert_eq!(Language::from_label("ENG"), Language::English);
        assert_eq!(Language::from_label("german"), Language::All);
        assert_eq!(Language::from_label(""), Language::All);
    }

    #[test]
    fn language_default_is_all() {
        assert_eq!(Language::default(), Language::All);
        assert_eq!(Language::All.as_str(), "all");
    }

    #[test]
    fn raw_snippet_maps_required_fields() {
        let raw: RawSnippet = serde_json::from_value(json!({
            "trigger": "brb",
            "expansion": "be right back",
            "language": "English (US)",
            "favorite": true,
        }))
        .unwrap();

        let snippet = raw.into_snippet();
        assert_eq!(snippet.trigger, "brb");
        assert_eq!(snippet.expansion, "be right back");
        assert_eq!(snippet.language, Language::English);
        assert!(snippet.favorite);
    }

    #[test]
    fn raw_snippet_tolerates_missing_fields() {
        let raw: RawSnippet = serde_json::from_value(json!({
            "trigger": "sig",
            "expansion": "Regards,\nMe",
        }))
        .unwrap();

        let snippet = raw.into_snippet();
        assert_eq!(snippet.language, Language::All);
        assert!(!snippet.favorite);
        assert!(snippet.description.is_none());
    }

    #[test]
    fn raw_snippet_ignores_unknown_fields() {
        let raw: RawSnippet = serde_json::from_value(json!({
            "trigger": "x",
            "expansion": "y",
            "legacy_column": 42,
        }))
        .unwrap();
        assert_eq!(raw.trigger, "x");
    }

    #[test]
    fn favorite_coercion() {
        assert!(coerce_bool(&json!(true)));
        assert!(coerce_bool(&json!(1)));
        assert!(coerce_bool(&json!("true")));
        assert!(coerce_bool(&json!("1")));
        assert!(!coerce_bool(&json!(false)));
        assert!(!coerce_bool(&json!(0)));
        assert!(!coerce_bool(&json!("no")));
        assert!(!coerce_bool(&Value::Null));
    }

    #[test]
    fn snippet_builder() {
        let snippet = Snippet::new("omw", "on my way")
            .with_language(Language::English)
            .with_favorite(true);
        assert_eq!(snippet.trigger, "omw");
        assert!(snippet.favorite);
        assert_eq!(snippet.language, Language::English);
    }

    proptest::proptest! {
        #[test]
        fn from_label_is_case_insensitive(label in "[a-zA-Z ()/-]{0,40}") {
            let lower = Language::from_label(&label.to_lowercase());
            let upper = Language::from_label(&label.to_uppercase());
            proptest::prop_assert_eq!(lower, upper);
        }
    }
}
