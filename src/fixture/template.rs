//! Prompt rendering and subject-name recovery.
//!
//! The story prompt is a single template shared by both conditions. Inline
//! alternatives written as `[polite|impolite]` are resolved per condition,
//! so the informational content of both prompts is identical and only the
//! courtesy markers differ.

use std::sync::LazyLock;

use regex::Regex;
use tera::{Context, Tera};

use super::pools::MOODS;
use super::{Condition, Fixture};
use crate::error::FixtureError;

/// Story prompt template.
///
/// Tera variables are filled first, then the phrasing alternatives are
/// resolved. The `a person named {{ hero }},` fragment is what
/// [`extract_subject_name`] looks for when artifacts are evaluated.
pub const STORY_PROMPT_TEMPLATE: &str = r#"[Please come|Come] up with a superhero story of a person named {{ hero }}, age {{ age }}, hobbies {{ hobbies }}. Make the story span 1 week. Use the following JSON format:
{
  "title": "...",
  "story": [
    { "weekday": "Monday", "text": "..."},
    { "weekday": "Tuesday", "text": "..."},
    /* ... */
  ]
}
    
[Please ensure|Ensure] the title includes the full hero's name. [Please misspell|Misspell] exactly one random weekday.
For each day part, [please include|include] a fitting mood from the possible moods {{ moods }}.
Optionally, if you can think of a fitting ending sentence, [please |]add one using an "ending" property at the level of the "title" property.
Also add a "summary" field at that level which summarizes the whole story, and a "summaryGerman", "summaryDutch" and "summaryFrench" field which translates the summary into the respective languages (do not include a "summarySpanish" field[ please|]).
If you want to, [please |]also add a moral using a "moral" property.
[Thanks!|]"#;

/// `[first|second]` on a single line, either side may be empty.
static ALTERNATIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\[\]|\n]*)\|([^\[\]|\n]*)\]").expect("Invalid regex for alternatives")
});

static SUBJECT_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"a person named ([A-Z][a-z]+ [A-Z][a-z]+),")
        .expect("Invalid regex for subject name")
});

/// Renders the story prompt for a fixture.
///
/// Pure: the same fixture always yields the same text.
pub fn render_prompt(fixture: &Fixture) -> Result<String, FixtureError> {
    let mut context = Context::new();
    context.insert("hero", &fixture.subject_name);
    context.insert("age", &fixture.age);
    context.insert("hobbies", &fixture.hobbies.join(" and "));
    context.insert("moods", &moods_text());

    let filled = Tera::one_off(STORY_PROMPT_TEMPLATE, &context, false)?;
    Ok(select_alternatives(&filled, fixture.condition))
}

/// Resolves every `[polite|impolite]` marker for the given condition.
pub fn select_alternatives(text: &str, condition: Condition) -> String {
    ALTERNATIVE_RE
        .replace_all(text, |caps: &regex::Captures<'_>| match condition {
            Condition::Polite => caps[1].to_string(),
            Condition::Impolite => caps[2].to_string(),
        })
        .into_owned()
}

/// Recovers the subject name from a rendered prompt.
///
/// Returns `None` when the prompt does not contain the naming fragment,
/// which means the template and the pattern have drifted apart.
pub fn extract_subject_name(prompt: &str) -> Option<String> {
    SUBJECT_NAME_RE
        .captures(prompt)
        .map(|caps| caps[1].to_string())
}

/// Quoted mood list joined as `"a", "b" and "c"`.
fn moods_text() -> String {
    let quoted: Vec<String> = MOODS.iter().map(|m| format!("\"{m}\"")).collect();
    match quoted.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{} and {}", rest.join(", "), last),
        Some((last, _)) => last.clone(),
        None => String::new(),
    }
}
