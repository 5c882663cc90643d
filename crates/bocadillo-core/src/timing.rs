//! Word and sentence data consumed by the highlight clock.
//!
//! Timestamps are optional. A sentence where at least one word carries a
//! start time is treated as exactly aligned; anything else is highlighted by
//! dividing the clip duration evenly across its words.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Word {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub meaning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub base_form: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub start_time_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub end_time_ms: Option<u64>,
}

impl Word {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            meaning: String::new(),
            base_form: None,
            audio_url: None,
            start_time_ms: None,
            end_time_ms: None,
        }
    }

    pub fn with_timing(mut self, start_ms: u64, end_ms: Option<u64>) -> Self {
        self.start_time_ms = Some(start_ms);
        self.end_time_ms = end_ms;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Sentence {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub translation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub words: Vec<Word>,
}

impl Sentence {
    pub fn timing_mode(&self) -> TimingMode {
        TimingMode::for_words(&self.words)
    }
}

/// How a word list is mapped onto the clip timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingMode {
    Exact,
    Estimated,
}

impl TimingMode {
    pub fn for_words(words: &[Word]) -> Self {
        if has_exact_timing(words) {
            TimingMode::Exact
        } else {
            TimingMode::Estimated
        }
    }
}

pub fn has_exact_timing(words: &[Word]) -> bool {
    words.iter().any(|word| word.start_time_ms.is_some())
}
