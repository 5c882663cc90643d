//! State and events exposed to the UI layer.

use crate::timing::{Sentence, Word};
use serde::Serialize;
use std::fs;
use std::path::Path;
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PlaybackSnapshot {
    pub is_playing: bool,
    pub is_loading: bool,
    pub current_word_index: Option<usize>,
    pub error: Option<String>,
    pub playback_rate: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
#[ts(export)]
pub enum PlaybackEvent {
    LoadStarted { reference: String },
    Started { reference: String },
    Restarted { reference: String },
    HighlightChanged(Option<usize>),
    Finished { reference: String },
    Stopped,
    Failed(String),
}

fn export_single_type<T: TS + 'static>(out_dir: &Path) -> Result<(), String> {
    T::export_all_to(out_dir).map_err(|err| err.to_string())
}

/// Write TypeScript definitions for every type the UI exchanges with the
/// controller, replacing stale `.ts` files in `out_dir`.
pub fn export_ts_bindings(out_dir: &Path) -> Result<(), String> {
    fs::create_dir_all(out_dir)
        .map_err(|err| format!("Failed to create {}: {err}", out_dir.display()))?;

    for entry in
        fs::read_dir(out_dir).map_err(|err| format!("Failed to list {}: {err}", out_dir.display()))?
    {
        let entry = entry.map_err(|err| format!("Failed to read entry: {err}"))?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("ts") {
            fs::remove_file(&path)
                .map_err(|err| format!("Failed to remove {}: {err}", path.display()))?;
        }
    }

    export_single_type::<Word>(out_dir)?;
    export_single_type::<Sentence>(out_dir)?;
    export_single_type::<PlaybackSnapshot>(out_dir)?;
    export_single_type::<PlaybackEvent>(out_dir)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_kind_tags() {
        let highlight = serde_json::to_value(PlaybackEvent::HighlightChanged(Some(2)))
            .expect("event should serialize");
        assert_eq!(
            highlight,
            serde_json::json!({ "kind": "highlightChanged", "value": 2 })
        );
        let stopped =
            serde_json::to_value(PlaybackEvent::Stopped).expect("event should serialize");
        assert_eq!(stopped, serde_json::json!({ "kind": "stopped" }));
    }

    #[test]
    fn snapshot_uses_camel_case_keys() {
        let snapshot = PlaybackSnapshot {
            is_playing: true,
            is_loading: false,
            current_word_index: None,
            error: None,
            playback_rate: 1.0,
        };
        let value = serde_json::to_value(&snapshot).expect("snapshot should serialize");
        assert_eq!(value["isPlaying"], serde_json::json!(true));
        assert_eq!(value["currentWordIndex"], serde_json::Value::Null);
    }

    #[test]
    fn exports_bindings_and_clears_stale_files() {
        let out_dir = std::env::temp_dir().join(format!("bocadillo-bindings-{}", std::process::id()));
        let _ = fs::remove_dir_all(&out_dir);
        fs::create_dir_all(&out_dir).expect("temp dir should be writable");
        fs::write(out_dir.join("Stale.ts"), "export type Stale = never;")
            .expect("stale file should be writable");

        export_ts_bindings(&out_dir).expect("bindings should export");

        assert!(!out_dir.join("Stale.ts").exists());
        assert!(out_dir.join("PlaybackSnapshot.ts").exists());
        assert!(out_dir.join("Word.ts").exists());
        let _ = fs::remove_dir_all(&out_dir);
    }
}
