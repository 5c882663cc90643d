//! Audio reference addressing.
//!
//! Content refers to clips with prefix-tagged strings:
//! - `local:<key>` narration clip bundled with the app
//! - `word:<form>` pronunciation of a word as it appears in a sentence
//! - `dict:<base>` pronunciation of a dictionary base form
//! - `http://…` / `https://…` remote file
//!
//! The controller never looks inside a reference; it hands the raw string to
//! a [`SourceResolver`], which parses it here and maps it to something the
//! audio output can open.

use crate::error::PlaybackError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::path::PathBuf;
use unicode_normalization::UnicodeNormalization;

const LOCAL_PREFIX: &str = "local:";
const WORD_PREFIX: &str = "word:";
const DICT_PREFIX: &str = "dict:";

static NON_WORD_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-záéíóúüñ]").expect("word form pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AudioReference {
    Bundled(String),
    WordForm(String),
    Dictionary(String),
    Remote(String),
}

impl AudioReference {
    /// Parse a tagged reference. Empty strings and unknown tags yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }
        if let Some(key) = raw.strip_prefix(LOCAL_PREFIX) {
            return Some(AudioReference::Bundled(key.to_string()));
        }
        if let Some(key) = raw.strip_prefix(WORD_PREFIX) {
            return Some(AudioReference::WordForm(key.to_string()));
        }
        if let Some(key) = raw.strip_prefix(DICT_PREFIX) {
            return Some(AudioReference::Dictionary(key.to_string()));
        }
        if raw.starts_with("http") {
            return Some(AudioReference::Remote(raw.to_string()));
        }
        None
    }

    pub fn key(&self) -> &str {
        match self {
            AudioReference::Bundled(key)
            | AudioReference::WordForm(key)
            | AudioReference::Dictionary(key)
            | AudioReference::Remote(key) => key,
        }
    }
}

impl fmt::Display for AudioReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioReference::Bundled(key) => write!(f, "{LOCAL_PREFIX}{key}"),
            AudioReference::WordForm(key) => write!(f, "{WORD_PREFIX}{key}"),
            AudioReference::Dictionary(key) => write!(f, "{DICT_PREFIX}{key}"),
            AudioReference::Remote(url) => write!(f, "{url}"),
        }
    }
}

/// Something an [`AudioOutput`](crate::output::AudioOutput) can open.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AudioSource {
    File(PathBuf),
    Url(String),
}

impl fmt::Display for AudioSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioSource::File(path) => write!(f, "{}", path.display()),
            AudioSource::Url(url) => write!(f, "{url}"),
        }
    }
}

/// Read-only lookup from tagged references to playable sources.
pub trait SourceResolver {
    /// `Ok(None)` means the reference is empty or carries no known tag and
    /// should be ignored. A known tag with an unknown key is a load error.
    fn resolve(&self, raw: &str) -> Result<Option<AudioSource>, PlaybackError>;
}

/// Canonical key for a word as displayed in a bubble: NFC, lowercase and
/// stripped of punctuation, so `"¡Hola!"` becomes `"hola"`.
pub fn normalize_word_form(text: &str) -> String {
    let lowered: String = text.nfc().collect::<String>().to_lowercase();
    NON_WORD_CHARS.replace_all(&lowered, "").into_owned()
}

pub fn word_reference(form: &str) -> String {
    format!("{WORD_PREFIX}{form}")
}
