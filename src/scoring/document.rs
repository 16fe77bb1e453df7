//! Loosely-typed view over a generated story document.
//!
//! Generated documents have no enforced schema: any field may be missing,
//! `null`, or of an unexpected JSON type. Every field is therefore kept as
//! an optional raw value and inspected with JavaScript-style truthiness,
//! which is how historical results were scored.

use serde::Deserialize;
use serde_json::Value;

/// Returns whether a value counts as present.
///
/// `null`, `false`, `0`, `""` and missing values are absent; arrays and
/// objects are present even when empty.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// One day of the generated story.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DayEntry {
    #[serde(default)]
    pub weekday: Option<Value>,
    #[serde(default)]
    pub text: Option<Value>,
    #[serde(default)]
    pub mood: Option<Value>,
}

impl DayEntry {
    /// Builds an entry from a raw story element; non-objects become empty entries.
    pub fn from_value(value: &Value) -> Self {
        if value.is_object() {
            serde_json::from_value(value.clone()).unwrap_or_default()
        } else {
            Self::default()
        }
    }

    /// Weekday as a string, if it is one.
    pub fn weekday_str(&self) -> Option<&str> {
        self.weekday.as_ref().and_then(Value::as_str)
    }

    /// Day text as a string, if it is one.
    pub fn text_str(&self) -> Option<&str> {
        self.text.as_ref().and_then(Value::as_str)
    }

    /// Mood as a string, if it is one.
    pub fn mood_str(&self) -> Option<&str> {
        self.mood.as_ref().and_then(Value::as_str)
    }
}

/// Generated story document with every field optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryDocument {
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default)]
    pub story: Option<Value>,
    #[serde(default)]
    pub summary: Option<Value>,
    #[serde(default)]
    pub summary_german: Option<Value>,
    #[serde(default)]
    pub summary_dutch: Option<Value>,
    #[serde(default)]
    pub summary_french: Option<Value>,
    #[serde(default)]
    pub summary_spanish: Option<Value>,
    #[serde(default)]
    pub ending: Option<Value>,
    #[serde(default)]
    pub moral: Option<Value>,
}

impl StoryDocument {
    /// Builds a document view from parsed JSON.
    ///
    /// Anything that is not a JSON object yields an empty document.
    pub fn from_value(value: &Value) -> Self {
        if value.is_object() {
            serde_json::from_value(value.clone()).unwrap_or_default()
        } else {
            Self::default()
        }
    }

    /// Parses raw artifact text.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(&value))
    }

    pub fn has_title(&self) -> bool {
        is_truthy(self.title.as_ref())
    }

    pub fn title_str(&self) -> Option<&str> {
        self.title.as_ref().and_then(Value::as_str)
    }

    pub fn has_story(&self) -> bool {
        is_truthy(self.story.as_ref())
    }

    /// Story entries when `story` is an array.
    pub fn story_entries(&self) -> Option<Vec<DayEntry>> {
        self.story
            .as_ref()
            .and_then(Value::as_array)
            .map(|days| days.iter().map(DayEntry::from_value).collect())
    }

    pub fn has_summary(&self) -> bool {
        is_truthy(self.summary.as_ref())
    }

    pub fn has_ending(&self) -> bool {
        is_truthy(self.ending.as_ref())
    }

    pub fn has_moral(&self) -> bool {
        is_truthy(self.moral.as_ref())
    }
}
