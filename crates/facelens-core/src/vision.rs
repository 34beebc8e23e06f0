//! Vision model client.
//!
//! Sends the image and a fixed structured prompt to the Mistral chat
//! completions API and hands the reply back untouched. Parsing lives in
//! [`crate::extract`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{FaceLensError, FaceLensResult};
use crate::image::EncodedImage;

/// Prompt instructing the model to produce the analysis JSON.
pub const ANALYSIS_PROMPT: &str = r##"Analyze this facial image and provide a JSON response with this exact structure:
{
  "ancestry": [
    {"region": "Region Name", "percentage": number}
  ],
  "origin": [
    {"country": "Country Name", "percentage": number}
  ],
  "emotions": [
    {"emotion": "Emotion Name", "percentage": number}
  ],
  "description": string
}

Instructions:
- For ancestry, list up to 10 (at least 3 where possible) broad ethnic or geographic regions suggested by the facial features (e.g. "East Asian", "Northern European", "West African").
- For origin, list up to 10 (at least 3 where possible) likely countries of origin (e.g. "Malaysian", "Chinese", "Japanese", "German", "American").
- For emotions, list up to 10 (at least 3 where possible) emotions expressed (e.g. "Happy", "Neutral", "Surprised", "Thoughtful", "Confident").
- Every percentage is an independent confidence between 0 and 100 for that item alone; the percentages of a list do not need to sum to 100.
- For description, summarize the facial features that point to the geographic and ethnic aspects and describe the features related to the emotion expressed, in no less than 3 sentences.
- Return ONLY the JSON object, nothing else"##;

/// Raw reply from a vision model.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    /// Free text that should contain a JSON object.
    Text(String),
    /// The provider already returned structured content.
    Structured(Value),
}

/// A hosted vision-capable model.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Model identifier, for logs and health output.
    fn name(&self) -> &str;

    /// Send `prompt` together with `image` and return the model's reply.
    async fn complete(&self, image: &EncodedImage, prompt: &str) -> FaceLensResult<ModelReply>;
}

/// Client for the Mistral chat completions API.
pub struct MistralClient {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    response_format: ResponseFormat,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ContentPart<'a> {
    #[serde(rename = "text")]
    Text { text: &'a str },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: String },
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Value,
}

impl MistralClient {
    /// Create a client. An empty `api_key` is accepted and fails at call time.
    pub fn new(api_key: &str, model: &str, base_url: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn build_request<'a>(&'a self, image: &EncodedImage, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
            messages: vec![Message {
                role: "user",
                content: vec![
                    ContentPart::Text { text: prompt },
                    ContentPart::ImageUrl {
                        image_url: image.to_data_uri(),
                    },
                ],
            }],
        }
    }
}

#[async_trait]
impl VisionModel for MistralClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, image: &EncodedImage, prompt: &str) -> FaceLensResult<ModelReply> {
        let request = self.build_request(image, prompt);

        debug!(model = %self.model, media_type = %image.media_type, "Calling Mistral vision API");
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| FaceLensError::upstream(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Mistral API returned an error");
            return Err(FaceLensError::upstream(format!("Mistral API error (HTTP {})", status)));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| FaceLensError::upstream(format!("undecodable response: {}", e)))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .map(|m| m.content)
            .unwrap_or(Value::Null);

        Ok(reply_from_content(content))
    }
}

/// Interpret a chat message `content` field.
///
/// Strings are text, arrays of chunks have their text chunks joined, objects
/// are already structured. Anything else becomes empty text.
fn reply_from_content(content: Value) -> ModelReply {
    match content {
        Value::String(text) => ModelReply::Text(text),
        Value::Array(chunks) => {
            let text: String = chunks
                .iter()
                .filter(|c| c.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|c| c.get("text").and_then(Value::as_str))
                .collect();
            ModelReply::Text(text)
        }
        obj @ Value::Object(_) => ModelReply::Structured(obj),
        _ => ModelReply::Text(String::new()),
    }
}
