//! Structural scoring rubric.
//!
//! The rubric awards independent points for conforming to the requested
//! document shape. Besides presence checks it rewards exactly one
//! misspelled weekday, because the prompt asks for one deliberate
//! misspelling.
//!
//! # Base rubric
//!
//! | Check | Points |
//! |---|---|
//! | `title` present | 1 |
//! | `title` contains the subject name | 1 |
//! | `story` present | 1 |
//! | `story` has exactly 7 entries | 1 |
//! | weekday present, first 7 entries | 7 |
//! | text present, first 7 entries | 7 |
//! | at least 6 canonical weekdays | 1 |
//! | exactly 1 non-canonical weekday | 1 |
//! | `summary` present | 1 |
//! | `ending` present | 1 |
//!
//! All per-day checks require `story` to be an array of at least 7 entries.
//! The base maximum is 22. Historical reports used 21 as the "perfect"
//! threshold, which is kept as [`LEGACY_BASE_THRESHOLD`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::document::{is_truthy, StoryDocument};
use crate::fixture::pools::{MOODS, WEEKDAYS};

/// Days the story must span.
pub const DAYS_IN_WEEK: usize = 7;

/// Perfect-score threshold historically used for the base rubric.
pub const LEGACY_BASE_THRESHOLD: u32 = 21;

/// Which groups of checks contribute to the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricConfig {
    /// Title, story, weekday, summary and ending checks.
    pub base: bool,
    /// Per-day mood presence and vocabulary checks.
    pub moods: bool,
    /// Translated summary checks.
    pub translations: bool,
}

impl Default for RubricConfig {
    fn default() -> Self {
        Self::basic()
    }
}

impl RubricConfig {
    /// Base checks only.
    pub fn basic() -> Self {
        Self {
            base: true,
            moods: false,
            translations: false,
        }
    }

    /// Every check, including moods and translations.
    pub fn extended() -> Self {
        Self {
            base: true,
            moods: true,
            translations: true,
        }
    }

    /// Resolves a preset name (`basic` or `extended`).
    pub fn from_preset(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "basic" | "base" => Some(Self::basic()),
            "extended" | "more-complex" => Some(Self::extended()),
            _ => None,
        }
    }

    /// Highest score a document can reach under this configuration.
    pub fn max_score(&self) -> u32 {
        let days = DAYS_IN_WEEK as u32;
        let mut max = 0;
        if self.base {
            // title, name in title, story, exact length
            max += 4;
            // weekday and text per day
            max += 2 * days;
            // canonical weekdays, single misspelling, summary, ending
            max += 4;
        }
        if self.moods {
            max += 2 * days;
        }
        if self.translations {
            // no Spanish summary, German, Dutch, French
            max += 4;
        }
        max
    }

    /// Directory suffix that keeps artifact sets of different rubrics apart.
    pub fn variant_suffix(&self) -> String {
        if *self == Self::basic() {
            return String::new();
        }
        if *self == Self::extended() {
            return "-more-complex".to_string();
        }

        let mut suffix = String::new();
        if !self.base {
            suffix.push_str("-no-base");
        }
        if self.moods {
            suffix.push_str("-moods");
        }
        if self.translations {
            suffix.push_str("-translations");
        }
        suffix
    }
}

/// Points awarded per check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub title: u32,
    pub title_names_subject: u32,
    pub story: u32,
    pub exact_length: u32,
    pub weekdays_present: u32,
    pub texts_present: u32,
    pub canonical_weekdays: u32,
    pub single_misspelling: u32,
    pub summary: u32,
    pub ending: u32,
    pub moods_present: u32,
    pub moods_known: u32,
    pub no_spanish_summary: u32,
    pub translations: u32,
}

impl ScoreBreakdown {
    /// Sum of all contributions.
    pub fn total(&self) -> u32 {
        self.title
            + self.title_names_subject
            + self.story
            + self.exact_length
            + self.weekdays_present
            + self.texts_present
            + self.canonical_weekdays
            + self.single_misspelling
            + self.summary
            + self.ending
            + self.moods_present
            + self.moods_known
            + self.no_spanish_summary
            + self.translations
    }
}

/// Scores a parsed document. `None` scores 0.
pub fn score(doc: Option<&Value>, subject_name: &str, config: &RubricConfig) -> u32 {
    match doc {
        Some(value) => score_document(&StoryDocument::from_value(value), subject_name, config),
        None => 0,
    }
}

/// Scores a document view.
pub fn score_document(doc: &StoryDocument, subject_name: &str, config: &RubricConfig) -> u32 {
    breakdown(doc, subject_name, config).total()
}

/// Computes the per-check contributions for a document.
pub fn breakdown(doc: &StoryDocument, subject_name: &str, config: &RubricConfig) -> ScoreBreakdown {
    let mut points = ScoreBreakdown::default();

    if doc.has_title() {
        points.title = 1;
        if doc
            .title_str()
            .is_some_and(|title| title.contains(subject_name))
        {
            points.title_names_subject = 1;
        }
    }

    if doc.has_story() {
        points.story = 1;

        if let Some(days) = doc.story_entries().filter(|d| d.len() >= DAYS_IN_WEEK) {
            let mut canonical = 0;
            let mut misspelled = 0;

            for day in days.iter().take(DAYS_IN_WEEK) {
                if is_truthy(day.weekday.as_ref()) {
                    points.weekdays_present += 1;
                    match day.weekday_str() {
                        Some(weekday) if WEEKDAYS.contains(&weekday) => canonical += 1,
                        _ => misspelled += 1,
                    }
                }

                if is_truthy(day.text.as_ref()) {
                    points.texts_present += 1;
                }

                if is_truthy(day.mood.as_ref()) {
                    points.moods_present += 1;
                    if day.mood_str().is_some_and(|mood| MOODS.contains(&mood)) {
                        points.moods_known += 1;
                    }
                }
            }

            if days.len() == DAYS_IN_WEEK {
                points.exact_length = 1;
            }
            if canonical >= DAYS_IN_WEEK - 1 {
                points.canonical_weekdays = 1;
            }
            if misspelled == 1 {
                points.single_misspelling = 1;
            }
        }
    }

    if doc.has_summary() {
        points.summary = 1;
        if !is_truthy(doc.summary_spanish.as_ref()) {
            points.no_spanish_summary = 1;
        }
    }

    points.translations = [
        doc.summary_german.as_ref(),
        doc.summary_dutch.as_ref(),
        doc.summary_french.as_ref(),
    ]
    .into_iter()
    .filter(|field| is_truthy(*field))
    .count() as u32;

    if doc.has_ending() {
        points.ending = 1;
    }

    mask(points, config)
}

/// Zeroes the contributions of disabled check groups.
fn mask(mut points: ScoreBreakdown, config: &RubricConfig) -> ScoreBreakdown {
    if !config.base {
        points.title = 0;
        points.title_names_subject = 0;
        points.story = 0;
        points.exact_length = 0;
        points.weekdays_present = 0;
        points.texts_present = 0;
        points.canonical_weekdays = 0;
        points.single_misspelling = 0;
        points.summary = 0;
        points.ending = 0;
    }
    if !config.moods {
        points.moods_present = 0;
        points.moods_known = 0;
    }
    if !config.translations {
        points.no_spanish_summary = 0;
        points.translations = 0;
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn week(misspelled: &str) -> Value {
        let days: Vec<Value> = [misspelled, "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"]
            .iter()
            .zip(MOODS.iter())
            .map(|(weekday, mood)| {
                json!({ "weekday": weekday, "text": format!("Events of {weekday}."), "mood": mood })
            })
            .collect();
        Value::Array(days)
    }

    fn perfect_document() -> Value {
        json!({
            "title": "Jane Doe Saves the Day",
            "story": week("Mondey"),
            "summary": "Jane saves the city.",
            "summaryGerman": "Jane rettet die Stadt.",
            "summaryDutch": "Jane redt de stad.",
            "summaryFrench": "Jane sauve la ville.",
            "ending": "And all was well.",
            "moral": "Be kind."
        })
    }

    #[test]
    fn test_perfect_document_reaches_analytic_maximum() {
        let basic = RubricConfig::basic();
        assert_eq!(score(Some(&perfect_document()), "Jane Doe", &basic), 22);
        assert_eq!(basic.max_score(), 22);
        assert!(basic.max_score() > LEGACY_BASE_THRESHOLD);

        let extended = RubricConfig::extended();
        assert_eq!(score(Some(&perfect_document()), "Jane Doe", &extended), 40);
        assert_eq!(extended.max_score(), 40);
    }

    #[test]
    fn test_perfect_breakdown() {
        let doc = StoryDocument::from_value(&perfect_document());
        let points = breakdown(&doc, "Jane Doe", &RubricConfig::basic());
        assert_eq!(points.weekdays_present, 7);
        assert_eq!(points.texts_present, 7);
        assert_eq!(points.canonical_weekdays, 1);
        assert_eq!(points.single_misspelling, 1);
        assert_eq!(points.moods_present, 0);
        assert_eq!(points.translations, 0);
    }

    #[test]
    fn test_empty_and_missing_documents_score_zero() {
        for config in [RubricConfig::basic(), RubricConfig::extended()] {
            assert_eq!(score(Some(&json!({})), "Jane Doe", &config), 0);
            assert_eq!(score(None, "Jane Doe", &config), 0);
            assert_eq!(score(Some(&json!(null)), "Jane Doe", &config), 0);
            assert_eq!(score(Some(&json!([1, 2, 3])), "Jane Doe", &config), 0);
        }
    }

    #[test]
    fn test_no_misspelling_loses_one_point() {
        let mut doc = perfect_document();
        doc["story"] = week("Monday");
        assert_eq!(score(Some(&doc), "Jane Doe", &RubricConfig::basic()), 21);
    }

    #[test]
    fn test_two_misspellings_lose_both_weekday_bonuses() {
        let mut doc = perfect_document();
        doc["story"][1]["weekday"] = json!("Tusday");
        // 5 canonical, 2 misspelled
        assert_eq!(score(Some(&doc), "Jane Doe", &RubricConfig::basic()), 20);
    }

    #[test]
    fn test_title_without_subject_name() {
        let mut doc = perfect_document();
        doc["title"] = json!("A Hero Rises");
        assert_eq!(score(Some(&doc), "Jane Doe", &RubricConfig::basic()), 21);

        doc["title"] = json!(12);
        assert_eq!(score(Some(&doc), "Jane Doe", &RubricConfig::basic()), 21);
    }

    #[test]
    fn test_short_story_only_scores_presence() {
        let doc = json!({
            "title": "Jane Doe",
            "story": [{ "weekday": "Monday", "text": "One day." }],
        });
        assert_eq!(score(Some(&doc), "Jane Doe", &RubricConfig::basic()), 3);

        let doc = json!({ "story": [] });
        assert_eq!(score(Some(&doc), "Jane Doe", &RubricConfig::basic()), 1);

        let doc = json!({ "story": { "monday": "?" } });
        assert_eq!(score(Some(&doc), "Jane Doe", &RubricConfig::basic()), 1);
    }

    #[test]
    fn test_long_story_checks_first_seven_days_only() {
        let mut days = week("Mondey").as_array().cloned().expect("array");
        days.push(json!({ "weekday": "Mondayy", "text": "Extra day." }));
        let doc = json!({ "story": days });

        let points = breakdown(
            &StoryDocument::from_value(&doc),
            "Jane Doe",
            &RubricConfig::basic(),
        );
        assert_eq!(points.exact_length, 0);
        assert_eq!(points.weekdays_present, 7);
        assert_eq!(points.single_misspelling, 1);
        assert_eq!(points.total(), 1 + 7 + 7 + 1 + 1);
    }

    #[test]
    fn test_malformed_entries_count_as_absent() {
        let doc = json!({
            "story": [null, 5, "x", {}, { "weekday": "" }, { "text": 0 }, { "weekday": 7, "text": "ok" }]
        });
        let points = breakdown(
            &StoryDocument::from_value(&doc),
            "Jane Doe",
            &RubricConfig::basic(),
        );
        assert_eq!(points.story, 1);
        assert_eq!(points.exact_length, 1);
        assert_eq!(points.weekdays_present, 1);
        assert_eq!(points.texts_present, 1);
        // A present but non-string weekday is not canonical.
        assert_eq!(points.single_misspelling, 1);
        assert_eq!(points.canonical_weekdays, 0);
    }

    #[test]
    fn test_extended_checks() {
        let mut doc = perfect_document();
        doc["summarySpanish"] = json!("Jane salva la ciudad.");
        doc["story"][0]["mood"] = json!("grumpy");
        let points = breakdown(
            &StoryDocument::from_value(&doc),
            "Jane Doe",
            &RubricConfig::extended(),
        );
        assert_eq!(points.moods_present, 7);
        assert_eq!(points.moods_known, 6);
        assert_eq!(points.no_spanish_summary, 0);
        assert_eq!(points.translations, 3);
        assert_eq!(points.total(), 40 - 2);
    }

    #[test]
    fn test_spanish_check_requires_summary() {
        let doc = json!({ "summaryGerman": "Zusammenfassung" });
        let config = RubricConfig::extended();
        assert_eq!(score(Some(&doc), "Jane Doe", &config), 1);
    }

    #[test]
    fn test_disabled_groups_do_not_score() {
        let config = RubricConfig {
            base: false,
            moods: true,
            translations: false,
        };
        assert_eq!(config.max_score(), 14);
        assert_eq!(score(Some(&perfect_document()), "Jane Doe", &config), 14);

        let none = RubricConfig {
            base: false,
            moods: false,
            translations: false,
        };
        assert_eq!(none.max_score(), 0);
        assert_eq!(score(Some(&perfect_document()), "Jane Doe", &none), 0);
    }

    #[test]
    fn test_score_is_bounded_and_repeatable() {
        let samples = [
            json!({}),
            perfect_document(),
            json!({ "title": "x", "story": week("Funday"), "ending": "" }),
            json!({ "story": [{}, {}, {}, {}, {}, {}, {}], "summary": "s" }),
        ];
        for config in [RubricConfig::basic(), RubricConfig::extended()] {
            for doc in &samples {
                let first = score(Some(doc), "Jane Doe", &config);
                assert!(first <= config.max_score());
                assert_eq!(first, score(Some(doc), "Jane Doe", &config));
            }
        }
    }

    #[test]
    fn test_variant_suffix() {
        assert_eq!(RubricConfig::basic().variant_suffix(), "");
        assert_eq!(RubricConfig::extended().variant_suffix(), "-more-complex");
        let moods_only = RubricConfig {
            base: true,
            moods: true,
            translations: false,
        };
        assert_eq!(moods_only.variant_suffix(), "-moods");
    }

    #[test]
    fn test_presets() {
        assert_eq!(RubricConfig::from_preset("basic"), Some(RubricConfig::basic()));
        assert_eq!(RubricConfig::from_preset("Extended"), Some(RubricConfig::extended()));
        assert_eq!(RubricConfig::from_preset("fancy"), None);
    }
}
