use anyhow::Context;
use log::debug;
use reqwest::blocking::Client;
use thiserror::Error;

use crate::config::Config;
use crate::model::anthropic::{
    ContentBlock, ImageSource, Message, MessagesRequest, MessagesResponse,
};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

// Media type is fixed to JPEG regardless of the actual upload.
const IMAGE_MEDIA_TYPE: &str = "image/jpeg";

const ANALYSIS_PROMPT: &str = r#"Analyze this product image and extract the following information. Return ONLY a valid JSON object with these exact keys, no markdown or explanation:
{
  "hersteller": "brand/manufacturer name or empty string if unknown",
  "modell": "product model/name or empty string if unknown",
  "farbe": "main color in German or empty string if unknown",
  "groesse": "size if visible or empty string if unknown"
}

Be concise. For farbe, use German color names like Schwarz, Weiß, Blau, Rot, Grün, Grau, Braun, etc."#;

/// The analysis call failed outright. Parse problems are not this error:
/// they degrade to an all-empty result so autofill never blocks manual
/// entry.
#[derive(Debug, Error)]
#[error("Bildanalyse fehlgeschlagen")]
pub struct AnalysisError;

/// Best-guess field values extracted from a product photo; empty string
/// means unknown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisResult {
    pub hersteller: String,
    pub modell: String,
    pub farbe: String,
    pub groesse: String,
}

pub struct AnalysisClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl AnalysisClient {
    /// `None` when no API key is configured; autofill is then skipped.
    pub fn from_config(config: &Config) -> anyhow::Result<Option<Self>> {
        let api_key = match config
            .anthropic_api_key
            .clone()
            .filter(|key| !key.is_empty())
        {
            Some(key) => key,
            None => return Ok(None),
        };
        let http = Client::builder()
            .user_agent(concat!("marktplatz/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Error building HTTP client for image analysis")?;
        Ok(Some(AnalysisClient {
            http,
            base_url: config.anthropic_base_url.trim_end_matches('/').to_owned(),
            api_key,
            model: config.anthropic_model.clone(),
        }))
    }

    pub fn analyze(&self, image_base64: &str) -> Result<AnalysisResult, AnalysisError> {
        let request = build_request(&self.model, image_base64);
        let url = format!("{}/v1/messages", self.base_url);
        debug!("POST {}", url);
        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .map_err(|e| {
                debug!("Bildanalyse: Transportfehler: {}", e);
                AnalysisError
            })?;
        if !response.status().is_success() {
            debug!("Bildanalyse: Status {}", response.status());
            return Err(AnalysisError);
        }
        let envelope: MessagesResponse = response.json().map_err(|e| {
            debug!("Bildanalyse: Antwort nicht lesbar: {}", e);
            AnalysisError
        })?;
        Ok(parse_result_text(&first_text(&envelope)))
    }
}

fn build_request<'a>(model: &'a str, image_base64: &'a str) -> MessagesRequest<'a> {
    MessagesRequest {
        model,
        max_tokens: MAX_TOKENS,
        messages: vec![Message {
            role: "user",
            content: vec![
                ContentBlock::Image {
                    source: ImageSource {
                        kind: "base64",
                        media_type: IMAGE_MEDIA_TYPE,
                        data: image_base64,
                    },
                },
                ContentBlock::Text {
                    text: ANALYSIS_PROMPT,
                },
            ],
        }],
    }
}

fn first_text(envelope: &MessagesResponse) -> String {
    envelope
        .content
        .get(0)
        .and_then(|block| block.text.clone())
        .unwrap_or_else(|| "{}".to_owned())
}

/// Best-effort extraction: each key read independently, any shape problem
/// yields an empty string instead of an error.
fn parse_result_text(text: &str) -> AnalysisResult {
    let value: serde_json::Value = serde_json::from_str(text).unwrap_or(serde_json::Value::Null);
    let field = |key: &str| value.get(key).and_then(|v| v.as_str()).unwrap_or("").to_owned();
    AnalysisResult {
        hersteller: field("hersteller"),
        modell: field("modell"),
        farbe: field("farbe"),
        groesse: field("groesse"),
    }
}
