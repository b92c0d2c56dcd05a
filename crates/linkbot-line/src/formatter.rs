//! Text command → provider message payloads.
//!
//! The input prefix selects the payload kind, checked in this order:
//! - `image:<url>` → image (the URL is used for both full and preview image)
//! - `sticker:<packageId>,<stickerId>` → sticker
//! - `flex:<json>` → rich card with a fixed alt text
//! - anything else → plain text, verbatim
//!
//! Every input yields exactly one payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// Alt text shown for rich cards in notification previews.
pub const FLEX_ALT_TEXT: &str = "📦 Rich Message";

/// Text sent in place of a flex message whose JSON does not parse.
pub const MALFORMED_FLEX_NOTICE: &str = "⚠️ Malformed flex message";

const IMAGE_PREFIX: &str = "image:";
const STICKER_PREFIX: &str = "sticker:";
const FLEX_PREFIX: &str = "flex:";

/// One message in a push request body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessagePayload {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    Image {
        original_content_url: String,
        preview_image_url: String,
    },
    #[serde(rename_all = "camelCase")]
    Sticker {
        package_id: String,
        sticker_id: String,
    },
    #[serde(rename_all = "camelCase")]
    Flex {
        alt_text: String,
        contents: Value,
    },
}

impl MessagePayload {
    pub fn text(text: impl Into<String>) -> Self {
        MessagePayload::Text { text: text.into() }
    }
}

/// Formatting failures surfaced by [`format_checked`].
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("malformed flex message: {0}")]
    MalformedFlex(#[from] serde_json::Error),
}

/// Format `input`, reporting a malformed `flex:` body as an error.
pub fn format_checked(input: &str) -> Result<Vec<MessagePayload>, FormatError> {
    if let Some(url) = input.strip_prefix(IMAGE_PREFIX) {
        let url = url.trim().to_string();
        return Ok(vec![MessagePayload::Image {
            original_content_url: url.clone(),
            preview_image_url: url,
        }]);
    }

    if let Some(rest) = input.strip_prefix(STICKER_PREFIX) {
        let (package_id, sticker_id) = rest.split_once(',').unwrap_or((rest, ""));
        return Ok(vec![MessagePayload::Sticker {
            package_id: package_id.trim().to_string(),
            sticker_id: sticker_id.trim().to_string(),
        }]);
    }

    if let Some(json) = input.strip_prefix(FLEX_PREFIX) {
        let contents: Value = serde_json::from_str(json)?;
        return Ok(vec![MessagePayload::Flex {
            alt_text: FLEX_ALT_TEXT.to_string(),
            contents,
        }]);
    }

    Ok(vec![MessagePayload::text(input)])
}

/// Format `input` for the push endpoint. Never fails.
///
/// A malformed `flex:` body is replaced by a text notice and logged.
pub fn format(input: &str) -> Vec<MessagePayload> {
    match format_checked(input) {
        Ok(messages) => messages,
        Err(e) => {
            warn!(error = %e, "flex message rejected, sending text notice");
            vec![MessagePayload::text(MALFORMED_FLEX_NOTICE)]
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_text_is_verbatim() {
        let out = format("  hello there  ");
        assert_eq!(out, vec![MessagePayload::text("  hello there  ")]);
    }

    #[test]
    fn test_empty_input_is_empty_text() {
        assert_eq!(format(""), vec![MessagePayload::text("")]);
    }

    #[test]
    fn test_image_uses_url_for_both_fields() {
        let out = format("image: https://cdn.example.com/cat.png ");
        assert_eq!(
            out,
            vec![MessagePayload::Image {
                original_content_url: "https://cdn.example.com/cat.png".into(),
                preview_image_url: "https://cdn.example.com/cat.png".into(),
            }]
        );
    }

    #[test]
    fn test_sticker_splits_on_first_comma() {
        let out = format("sticker:446,1988");
        assert_eq!(
            out,
            vec![MessagePayload::Sticker {
                package_id: "446".into(),
                sticker_id: "1988".into(),
            }]
        );

        let out = format("sticker:1,2,3");
        assert_eq!(
            out,
            vec![MessagePayload::Sticker {
                package_id: "1".into(),
                sticker_id: "2,3".into(),
            }]
        );
    }

    #[test]
    fn test_sticker_without_comma_has_empty_sticker_id() {
        let out = format("sticker:446");
        assert_eq!(
            out,
            vec![MessagePayload::Sticker {
                package_id: "446".into(),
                sticker_id: String::new(),
            }]
        );
    }

    #[test]
    fn test_flex_wraps_parsed_json() {
        let out = format(r#"flex:{"type":"bubble","body":{"type":"box"}}"#);
        assert_eq!(out.len(), 1);
        match &out[0] {
            MessagePayload::Flex { alt_text, contents } => {
                assert_eq!(alt_text, FLEX_ALT_TEXT);
                assert_eq!(contents["type"], "bubble");
            }
            other => panic!("expected flex payload, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_flex_falls_back_to_text() {
        let out = format("flex:{not json");
        assert_eq!(out, vec![MessagePayload::text(MALFORMED_FLEX_NOTICE)]);
        assert!(matches!(
            format_checked("flex:{not json"),
            Err(FormatError::MalformedFlex(_))
        ));
    }

    #[test]
    fn test_prefixed_inputs_yield_exactly_one_payload() {
        for input in [
            "image:",
            "image:x",
            "sticker:",
            "sticker:,",
            "flex:",
            "flex:[]",
            "flex:{",
            "text",
        ] {
            assert_eq!(format(input).len(), 1, "input {input:?}");
        }
    }

    #[test]
    fn test_formatting_is_deterministic() {
        for input in ["hi", "image:u", "sticker:1,2", r#"flex:{"a":1}"#, "flex:?"] {
            assert_eq!(format(input), format(input));
        }
    }

    #[test]
    fn test_prefix_must_be_at_start() {
        assert_eq!(
            format("see image:x"),
            vec![MessagePayload::text("see image:x")]
        );
    }

    #[test]
    fn test_wire_shape() {
        let value = serde_json::to_value(format("image:u")).unwrap();
        assert_eq!(
            value,
            json!([{"type": "image", "originalContentUrl": "u", "previewImageUrl": "u"}])
        );

        let value = serde_json::to_value(format("sticker:1,2")).unwrap();
        assert_eq!(
            value,
            json!([{"type": "sticker", "packageId": "1", "stickerId": "2"}])
        );

        let value = serde_json::to_value(format(r#"flex:{"k":true}"#)).unwrap();
        assert_eq!(value[0]["altText"], FLEX_ALT_TEXT);
        assert_eq!(value[0]["contents"], json!({"k": true}));
    }
}
