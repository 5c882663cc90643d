//! Bundled audio lookup.
//!
//! The catalog is the read-only resolver handed to the playback controller.
//! It is built once from the `[assets.*]` config tables; nothing in the app
//! mutates it afterwards.

use crate::config::AppConfig;
use bocadillo_core::PlaybackError;
use bocadillo_core::reference::{
    AudioReference, AudioSource, SourceResolver, normalize_word_form, word_reference,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct AssetCatalog {
    local: BTreeMap<String, PathBuf>,
    word: BTreeMap<String, PathBuf>,
    dict: BTreeMap<String, PathBuf>,
}

impl AssetCatalog {
    pub fn from_config(config: &AppConfig) -> Self {
        let root = Path::new(&config.asset_root);
        let join = |table: &BTreeMap<String, String>, normalize: bool| {
            table
                .iter()
                .map(|(key, rel)| {
                    let key = if normalize {
                        normalize_word_form(key)
                    } else {
                        key.clone()
                    };
                    (key, root.join(rel))
                })
                .collect::<BTreeMap<_, _>>()
        };
        let catalog = Self {
            local: join(&config.assets.local, false),
            word: join(&config.assets.word, true),
            dict: join(&config.assets.dict, false),
        };
        debug!(
            local = catalog.local.len(),
            word = catalog.word.len(),
            dict = catalog.dict.len(),
            root = %root.display(),
            "Built audio catalog"
        );
        catalog
    }

    /// `word:<form>` for a displayed token when a clip exists for its
    /// normalized form.
    pub fn word_audio_reference(&self, text: &str) -> Option<String> {
        let form = normalize_word_form(text);
        self.word.contains_key(&form).then(|| word_reference(&form))
    }

    pub fn has_dictionary_audio(&self, base_form: &str) -> bool {
        self.dict.contains_key(base_form)
    }
}

impl SourceResolver for AssetCatalog {
    fn resolve(&self, raw: &str) -> Result<Option<AudioSource>, PlaybackError> {
        let Some(reference) = AudioReference::parse(raw) else {
            return Ok(None);
        };
        let found = match &reference {
            AudioReference::Remote(url) => return Ok(Some(AudioSource::Url(url.clone()))),
            AudioReference::Bundled(key) => self.local.get(key),
            AudioReference::WordForm(key) => self.word.get(&normalize_word_form(key)),
            AudioReference::Dictionary(key) => self.dict.get(key),
        };
        found
            .map(|path| Some(AudioSource::File(path.clone())))
            .ok_or_else(|| PlaybackError::load(raw, "no clip registered for this key"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> AssetCatalog {
        let mut config = AppConfig::default();
        config.asset_root = "assets".to_string();
        config
            .assets
            .local
            .insert("girona-s1".to_string(), "comics/girona_trip/audio/s1.mp3".to_string());
        config
            .assets
            .word
            .insert("dónde".to_string(), "dictionary/dónde.mp3".to_string());
        config
            .assets
            .dict
            .insert("llegar".to_string(), "dictionary/llegar.mp3".to_string());
        AssetCatalog::from_config(&config)
    }

    #[test]
    fn resolves_each_tag_to_its_table() {
        let catalog = catalog();
        assert_eq!(
            catalog.resolve("local:girona-s1").unwrap(),
            Some(AudioSource::File(PathBuf::from(
                "assets/comics/girona_trip/audio/s1.mp3"
            )))
        );
        assert_eq!(
            catalog.resolve("dict:llegar").unwrap(),
            Some(AudioSource::File(PathBuf::from("assets/dictionary/llegar.mp3")))
        );
        assert_eq!(
            catalog.resolve("https://example.com/audio/s1.mp3").unwrap(),
            Some(AudioSource::Url("https://example.com/audio/s1.mp3".to_string()))
        );
    }

    #[test]
    fn word_forms_are_matched_after_normalization() {
        let catalog = catalog();
        assert!(catalog.resolve("word:¿Dónde").unwrap().is_some());
        assert_eq!(
            catalog.word_audio_reference("¿Dónde"),
            Some("word:dónde".to_string())
        );
        assert_eq!(catalog.word_audio_reference("perro"), None);
    }

    #[test]
    fn unknown_key_is_a_load_error_and_unknown_tag_is_ignored() {
        let catalog = catalog();
        assert!(matches!(
            catalog.resolve("local:girona-s9"),
            Err(PlaybackError::Load { .. })
        ));
        assert_eq!(catalog.resolve("").unwrap(), None);
        assert_eq!(catalog.resolve("s1.mp3").unwrap(), None);
        assert!(catalog.has_dictionary_audio("llegar"));
        assert!(!catalog.has_dictionary_audio("ser"));
    }
}
