use std::time::Duration;

use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

mod error;
pub use error::GeminiApiError;

use crate::payload::SourceImage;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const ASPECT_RATIO: &str = "1:1";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub image_config: ImageConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    pub aspect_ratio: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(
        default,
        alias = "inline_data",
        skip_serializing_if = "Option::is_none"
    )]
    pub inline_data: Option<InlineData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn inline_image(image: &SourceImage) -> Self {
        let encoded = image.encoded();
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: encoded.media_type().to_string(),
                data: encoded.to_base64(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default, alias = "mime_type")]
    pub mime_type: String,
    /// base64, without any data-URL prefix
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Parts of the first candidate, in the order the model produced them
    pub fn parts(&self) -> &[Part] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or_default()
    }

    pub fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
    }
}

/// The image goes first, the instruction second, as the model expects for
/// image editing.
pub fn build_request(image: &SourceImage, prompt: String) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: None,
            parts: vec![Part::inline_image(image), Part::text(prompt)],
        }],
        generation_config: GenerationConfig {
            image_config: ImageConfig {
                aspect_ratio: ASPECT_RATIO.into(),
            },
        },
    }
}

/// Sends one `generateContent` request. There are no retries.
pub async fn query(
    request: &GenerateContentRequest,
    model_id: &str,
    api_key: &str,
    base_url: &str,
    client: &Client,
) -> Result<GenerateContentResponse, GeminiApiError> {
    let url = format!(
        "{}/models/{model_id}:generateContent",
        base_url.trim_end_matches('/')
    );
    debug!("POST {url}");

    let resp = client
        .post(&url)
        .timeout(Duration::from_secs(60 * 3))
        .header("x-goog-api-key", api_key)
        .json(request)
        .send()
        .await?;

    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        debug!("Gemini error body: {body}");
        return Err(GeminiApiError::from_response(status, &body));
    }

    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod test {
    use expect_test::expect;

    use super::*;

    #[test]
    fn request_serialization() {
        let image = SourceImage::new(vec![1u8, 2, 3], "image/jpeg");
        let body = build_request(&image, "Draw it".into());

        let expect = expect![[
            r#"{"contents":[{"parts":[{"inlineData":{"mimeType":"image/jpeg","data":"AQID"}},{"text":"Draw it"}]}],"generationConfig":{"imageConfig":{"aspectRatio":"1:1"}}}"#
        ]];
        expect.assert_eq(&serde_json::to_string(&body).unwrap());
    }

    #[test]
    fn response_parts_keep_order() {
        let body = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "Here is your sketch"},
                    {"inlineData": {"mimeType": "image/png", "data": "AQID"}},
                    {"inline_data": {"mime_type": "image/png", "data": "BAUG"}}
                ]},
                "finishReason": "STOP"
            }]
        }"#;
        let resp: GenerateContentResponse = serde_json::from_str(body).unwrap();
        let parts = resp.parts();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].text.as_deref(), Some("Here is your sketch"));
        assert_eq!(parts[1].inline_data.as_ref().unwrap().data, "AQID");
        assert_eq!(parts[2].inline_data.as_ref().unwrap().data, "BAUG");
        assert!(resp.block_reason().is_none());
    }

    #[test]
    fn blocked_prompt_has_no_parts() {
        let body = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let resp: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert!(resp.parts().is_empty());
        assert_eq!(resp.block_reason(), Some("SAFETY"));
    }
}
