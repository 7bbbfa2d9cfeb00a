//! Cross-frame message protocol.
//!
//! The embedded document talks to the host with `postMessage`. The payloads
//! this crate understands:
//!
//! ```json
//! { "type": "plugin.resize", "payload": { "height": 512 } }
//! { "type": "plugin.videoFullScreen", "payload": { "open": true } }
//! { "type": "plugin.modal", "payload": { "title": "...", "body": "...", "url": "..." } }
//! { "offset": 240 }
//! ```
//!
//! Anything else is [`FrameMessage::Ignored`]: the host window receives
//! messages from many sources and most of them are not ours.

use crate::error::FrameError;
use crate::modal::ModalRequest;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const RESIZE: &str = "plugin.resize";
const VIDEO_FULL_SCREEN: &str = "plugin.videoFullScreen";
const MODAL: &str = "plugin.modal";

/// A message posted by the embedded document.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameMessage {
    /// The document's content height changed
    Resize {
        /// New height in CSS pixels
        height: u32,
    },
    /// A video inside the document entered or left full-screen mode
    VideoFullScreen {
        /// Whether full-screen was entered
        open: bool,
    },
    /// The document asks the host to scroll to an offset within the frame
    ScrollOffset {
        /// Offset from the top of the frame, in CSS pixels
        offset: f64,
    },
    /// The document asks the host to open the overlay
    Modal(ModalRequest),
    /// Not a message this crate handles
    Ignored,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type", content = "payload")]
enum Envelope {
    #[serde(rename = "plugin.resize")]
    Resize { height: f64 },
    #[serde(rename = "plugin.videoFullScreen")]
    VideoFullScreen { open: bool },
    #[serde(rename = "plugin.modal")]
    Modal(ModalRequest),
}

impl FrameMessage {
    /// Parse a raw JSON message.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::MalformedMessage`] when the text is not JSON or a
    /// known message type carries an unusable payload.
    pub fn parse(raw: &str) -> Result<Self, FrameError> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value(value)
    }

    /// Interpret an already-decoded message value.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::MalformedMessage`] when a known message type
    /// carries an unusable payload.
    pub fn from_value(value: Value) -> Result<Self, FrameError> {
        match value.get("type").and_then(Value::as_str) {
            Some(RESIZE | VIDEO_FULL_SCREEN | MODAL) => {
                let envelope: Envelope = serde_json::from_value(value)?;
                Ok(envelope.into())
            },
            Some(_) => Ok(Self::Ignored),
            None => Ok(value
                .get("offset")
                .and_then(Value::as_f64)
                .filter(|offset| *offset != 0.0)
                .map_or(Self::Ignored, |offset| Self::ScrollOffset { offset })),
        }
    }

    /// Whether this message is for the lifecycle provider.
    #[must_use]
    pub const fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Self::Resize { .. } | Self::VideoFullScreen { .. } | Self::ScrollOffset { .. }
        )
    }
}

impl From<Envelope> for FrameMessage {
    fn from(envelope: Envelope) -> Self {
        match envelope {
            Envelope::Resize { height } => Self::Resize {
                height: pixels(height),
            },
            Envelope::VideoFullScreen { open } => Self::VideoFullScreen { open },
            Envelope::Modal(request) => Self::Modal(request),
        }
    }
}

/// Round a reported height to whole pixels; negative and NaN become 0.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn pixels(height: f64) -> u32 {
    if height.is_nan() || height <= 0.0 {
        0
    } else {
        height.round().min(f64::from(u32::MAX)) as u32
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_resize() {
        let message = FrameMessage::parse(r#"{"type":"plugin.resize","payload":{"height":512.4}}"#)
            .unwrap();
        assert_eq!(message, FrameMessage::Resize { height: 512 });
        assert!(message.is_lifecycle());
    }

    #[test]
    fn test_negative_height_clamps_to_zero() {
        let message =
            FrameMessage::from_value(json!({"type": "plugin.resize", "payload": {"height": -3}}))
                .unwrap();
        assert_eq!(message, FrameMessage::Resize { height: 0 });
    }

    #[test]
    fn test_parse_video_full_screen() {
        let message = FrameMessage::from_value(
            json!({"type": "plugin.videoFullScreen", "payload": {"open": true}}),
        )
        .unwrap();
        assert_eq!(message, FrameMessage::VideoFullScreen { open: true });
    }

    #[test]
    fn test_parse_modal_with_partial_payload() {
        let message = FrameMessage::from_value(
            json!({"type": "plugin.modal", "payload": {"url": "https://lti.example/launch"}}),
        )
        .unwrap();
        assert_eq!(
            message,
            FrameMessage::Modal(ModalRequest {
                title: None,
                body: None,
                url: Some("https://lti.example/launch".to_string()),
            })
        );
        assert!(!message.is_lifecycle());
    }

    #[test]
    fn test_offset_message() {
        assert_eq!(
            FrameMessage::from_value(json!({"offset": 240})).unwrap(),
            FrameMessage::ScrollOffset { offset: 240.0 }
        );
        assert_eq!(
            FrameMessage::from_value(json!({"offset": 0})).unwrap(),
            FrameMessage::Ignored
        );
    }

    #[test]
    fn test_foreign_messages_are_ignored() {
        assert_eq!(
            FrameMessage::from_value(json!({"type": "plugin.unknown", "payload": {}})).unwrap(),
            FrameMessage::Ignored
        );
        assert_eq!(
            FrameMessage::from_value(json!({"event_name": "edx.ui.lms.link_clicked"})).unwrap(),
            FrameMessage::Ignored
        );
        assert_eq!(FrameMessage::from_value(json!("hello")).unwrap(), FrameMessage::Ignored);
    }

    #[test]
    fn test_known_type_with_bad_payload_is_an_error() {
        let result =
            FrameMessage::from_value(json!({"type": "plugin.resize", "payload": {"height": "tall"}}));
        assert!(matches!(result, Err(FrameError::MalformedMessage(_))));
        assert!(FrameMessage::parse("not json").is_err());
    }
}
