use serde::{Deserialize, Serialize};

// Wire types for the hosted completion service (`POST /v1/messages`).
// Only the subset this crate sends and reads.

#[derive(Debug, Serialize)]
pub struct MessagesRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
pub struct Message<'a> {
    pub role: &'static str,
    pub content: Vec<ContentBlock<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock<'a> {
    Image { source: ImageSource<'a> },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
pub struct ImageSource<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub media_type: &'static str,
    pub data: &'a str,
}

/// Response envelope; blocks that are not text decode with `text: None`.
#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub content: Vec<ResponseBlock>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponseBlock {
    #[serde(default)]
    pub text: Option<String>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn image_block_serialises_tagged() {
        let block = ContentBlock::Image {
            source: ImageSource {
                kind: "base64",
                media_type: "image/jpeg",
                data: "AAAA",
            },
        };
        let raw = serde_json::to_string(&block).unwrap();
        assert_eq!(
            raw,
            r#"{"type":"image","source":{"type":"base64","media_type":"image/jpeg","data":"AAAA"}}"#
        );
    }

    #[test]
    fn response_tolerates_non_text_blocks() {
        let raw = r#"{"content":[{"type":"tool_use","id":"t1"},{"type":"text","text":"hi"}]}"#;
        let response: MessagesResponse = serde_json::from_str(raw).unwrap();
        assert!(response.content[0].text.is_none());
        assert_eq!(response.content[1].text.as_deref(), Some("hi"));
    }
}
