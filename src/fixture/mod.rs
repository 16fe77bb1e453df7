//! Randomized fixtures and the prompts rendered from them.
//!
//! A [`Fixture`] holds the randomized inputs for one generation request. The
//! [`FixtureGenerator`] draws fixtures from the fixed pools in [`pools`], and
//! [`render_prompt`] turns a fixture into the prompt text for its
//! [`Condition`].

pub mod generator;
pub mod pools;
pub mod template;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use generator::{FixtureGenerator, DEFAULT_HOBBY_COUNT, MAX_AGE, MIN_AGE};
pub use template::{extract_subject_name, render_prompt, select_alternatives, STORY_PROMPT_TEMPLATE};

/// Experimental condition: how the request is phrased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Polite,
    Impolite,
}

impl Condition {
    /// Both conditions, in the order tasks are scheduled.
    pub const ALL: [Condition; 2] = [Condition::Impolite, Condition::Polite];

    /// Name used in logs and artifact paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Polite => "polite",
            Condition::Impolite => "impolite",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Condition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "polite" => Ok(Condition::Polite),
            "impolite" => Ok(Condition::Impolite),
            other => Err(format!("unknown condition '{other}'")),
        }
    }
}

/// Randomized input parameters for one generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    /// 1-based sequence number, unique per condition.
    pub sequence: u32,
    /// Subject name as "First Last".
    pub subject_name: String,
    /// Age in years.
    pub age: u8,
    /// Hobbies in draw order.
    pub hobbies: Vec<String>,
    /// Phrasing condition the prompt is rendered for.
    pub condition: Condition,
}
