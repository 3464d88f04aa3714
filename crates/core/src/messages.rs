//! Messages exchanged between the popup, background and presentation page.

use crate::navigation::SlidePosition;
use crate::types::{SlideBlock, SlideIndex};
use serde::{Deserialize, Serialize};

/// A request sent to (or between) extension contexts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtensionMessage {
    /// Ask the presentation page for all of its slides.
    GetSlidesData,
    /// Tell the presentation page to show a slide. No response.
    ExtensionJumpToSlide { h: u32, v: u32 },
    /// Ask the background context to open the dashboard. No response.
    OpenDashboard,
}

impl ExtensionMessage {
    /// Jump request for a position.
    pub fn jump_to(position: SlidePosition) -> Self {
        ExtensionMessage::ExtensionJumpToSlide {
            h: position.h,
            v: position.v,
        }
    }
}

/// One slide in a [`SlidesDataResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideData {
    pub h: u32,
    pub v: u32,
    pub slide_label: String,
    pub title: String,
    #[serde(default)]
    pub blocks: Vec<SlideBlock>,
    #[serde(default)]
    pub content: String,
}

impl From<&SlideIndex> for SlideData {
    fn from(slide: &SlideIndex) -> Self {
        Self {
            h: slide.h,
            v: slide.v,
            slide_label: slide.slide_label.clone(),
            title: slide.title.clone(),
            blocks: slide.blocks.clone(),
            content: slide.search_content.clone(),
        }
    }
}

/// Response to [`ExtensionMessage::GetSlidesData`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlidesDataResponse {
    /// Page title.
    pub title: String,
    pub slides: Vec<SlideData>,
}

impl SlidesDataResponse {
    pub fn new(title: impl Into<String>, slides: &[SlideIndex]) -> Self {
        Self {
            title: title.into(),
            slides: slides.iter().map(SlideData::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_wire_format() {
        let get = serde_json::to_value(ExtensionMessage::GetSlidesData).unwrap();
        assert_eq!(get, serde_json::json!({"type": "GET_SLIDES_DATA"}));

        let jump = serde_json::to_value(ExtensionMessage::jump_to(SlidePosition::new(3, 1))).unwrap();
        assert_eq!(
            jump,
            serde_json::json!({"type": "EXTENSION_JUMP_TO_SLIDE", "h": 3, "v": 1})
        );
    }

    #[test]
    fn test_message_parses() {
        let msg: ExtensionMessage =
            serde_json::from_str(r#"{"type":"OPEN_DASHBOARD"}"#).unwrap();
        assert_eq!(msg, ExtensionMessage::OpenDashboard);
    }

    #[test]
    fn test_response_from_slides() {
        let slide = SlideIndex::new(
            0,
            0,
            "Hello",
            vec![SlideBlock::Text {
                content: "world".to_string(),
            }],
        );
        let response = SlidesDataResponse::new("Deck", &[slide]);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["title"], "Deck");
        assert_eq!(json["slides"][0]["slideLabel"], "0-0");
        assert_eq!(json["slides"][0]["content"], "world");
        assert_eq!(json["slides"][0]["blocks"][0]["type"], "text");
    }
}
