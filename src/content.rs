//! Comic content as the narrator reads it.
//!
//! Only the fields narration needs are modelled. Layout fields such as image
//! paths and tap zones are skipped when deserializing.

use anyhow::{Context, Result};
use bocadillo_core::Sentence;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comic {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub level: Option<Level>,
    #[serde(default)]
    pub pages: Vec<Page>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub page_number: u32,
    #[serde(default)]
    pub panels: Vec<Panel>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Panel {
    pub panel_order: u32,
    #[serde(default)]
    pub bubbles: Vec<Bubble>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Bubble {
    #[serde(rename = "type")]
    pub kind: BubbleKind,
    #[serde(default)]
    pub sentences: Vec<Sentence>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BubbleKind {
    Speech,
    Narration,
    Thought,
}

/// A sentence together with the kind of bubble it sits in.
#[derive(Debug, Clone, Copy)]
pub struct Line<'a> {
    pub kind: BubbleKind,
    pub sentence: &'a Sentence,
}

/// Restricts narration to one page and optionally one panel on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub page: Option<u32>,
    pub panel: Option<u32>,
}

impl Comic {
    /// Sentences in reading order: pages by number, panels by order, then
    /// bubbles and sentences as they appear in the file.
    pub fn lines(&self, selection: Selection) -> Vec<Line<'_>> {
        let mut pages: Vec<&Page> = self
            .pages
            .iter()
            .filter(|page| selection.page.is_none_or(|n| page.page_number == n))
            .collect();
        pages.sort_by_key(|page| page.page_number);

        let mut out = Vec::new();
        for page in pages {
            let mut panels: Vec<&Panel> = page
                .panels
                .iter()
                .filter(|panel| selection.panel.is_none_or(|n| panel.panel_order == n))
                .collect();
            panels.sort_by_key(|panel| panel.panel_order);
            for panel in panels {
                for bubble in &panel.bubbles {
                    out.extend(bubble.sentences.iter().map(|sentence| Line {
                        kind: bubble.kind,
                        sentence,
                    }));
                }
            }
        }
        out
    }
}

pub fn parse_comic(contents: &str) -> Result<Comic> {
    serde_json::from_str(contents).context("Parsing comic JSON")
}

pub fn load_comic(path: &Path) -> Result<Comic> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Reading comic {}", path.display()))?;
    let comic = parse_comic(&contents).with_context(|| format!("Loading {}", path.display()))?;
    info!(
        id = %comic.id,
        title = %comic.title,
        pages = comic.pages.len(),
        "Loaded comic"
    );
    Ok(comic)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "id": "girona-trip",
        "title": "Un día en Girona",
        "description": "A day trip.",
        "coverImage": "cover.png",
        "level": "beginner",
        "isPremium": false,
        "pages": [
            {
                "id": "page-2",
                "pageNumber": 2,
                "masterImage": "p2.png",
                "panels": [
                    {
                        "id": "panel-2-1",
                        "panelOrder": 1,
                        "bubbles": [
                            {"id": "b3", "type": "thought", "sentences": [
                                {"id": "s4", "text": "¡Qué bonito!", "words": []}
                            ]}
                        ]
                    }
                ]
            },
            {
                "id": "page-1",
                "pageNumber": 1,
                "masterImage": "p1.png",
                "panels": [
                    {
                        "id": "panel-1-2",
                        "panelOrder": 2,
                        "tapZoneX": 0.5,
                        "bubbles": [
                            {"id": "b2", "type": "speech", "positionX": 0.1, "sentences": [
                                {"id": "s3", "text": "Hola.", "audioUrl": "local:girona-s3", "words": [
                                    {"id": "w1", "text": "Hola.", "meaning": "Hello", "startTimeMs": 0, "endTimeMs": 400}
                                ]}
                            ]}
                        ]
                    },
                    {
                        "id": "panel-1-1",
                        "panelOrder": 1,
                        "bubbles": [
                            {"id": "b1", "type": "narration", "sentences": [
                                {"id": "s1", "text": "María llega.", "translation": "María arrives.", "words": [
                                    {"id": "w1", "text": "María", "meaning": "María", "baseForm": "María"},
                                    {"id": "w2", "text": "llega.", "meaning": "arrives", "baseForm": "llegar"}
                                ]},
                                {"id": "s2", "text": "Sonríe.", "words": []}
                            ]}
                        ]
                    }
                ]
            }
        ]
    }"#;

    fn ids(lines: &[Line<'_>]) -> Vec<String> {
        lines.iter().map(|line| line.sentence.id.clone()).collect()
    }

    #[test]
    fn reading_order_sorts_pages_and_panels() {
        let comic = parse_comic(SAMPLE).expect("sample should parse");
        assert_eq!(comic.level, Some(Level::Beginner));
        assert_eq!(
            ids(&comic.lines(Selection::default())),
            vec!["s1", "s2", "s3", "s4"]
        );
    }

    #[test]
    fn selection_filters_pages_and_panels() {
        let comic = parse_comic(SAMPLE).expect("sample should parse");
        let page_one = Selection {
            page: Some(1),
            panel: None,
        };
        assert_eq!(ids(&comic.lines(page_one)), vec!["s1", "s2", "s3"]);

        let single_panel = Selection {
            page: Some(1),
            panel: Some(2),
        };
        assert_eq!(ids(&comic.lines(single_panel)), vec!["s3"]);

        let missing = Selection {
            page: Some(9),
            panel: None,
        };
        assert!(comic.lines(missing).is_empty());
    }

    #[test]
    fn word_timing_and_bubble_kind_are_kept() {
        let comic = parse_comic(SAMPLE).expect("sample should parse");
        let bubble = &comic.pages[1].panels[0].bubbles[0];
        assert_eq!(bubble.kind, BubbleKind::Speech);
        let sentence = &bubble.sentences[0];
        assert_eq!(sentence.audio_url.as_deref(), Some("local:girona-s3"));
        assert_eq!(sentence.words[0].start_time_ms, Some(0));
        assert_eq!(sentence.words[0].end_time_ms, Some(400));
    }

    #[test]
    fn load_comic_reports_missing_file() {
        let err = load_comic(Path::new("/nonexistent/bocadillo/comic.json"))
            .expect_err("missing file should fail");
        assert!(format!("{err:#}").contains("Reading comic"));
    }
}
