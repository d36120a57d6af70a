use anyhow::{bail, Context, Result};
use deckgen_contracts::payload::Payload;
use deckgen_contracts::prompts::compose;
use deckgen_contracts::providers::{GenerationParams, ProviderAdapter};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::GlmSettings;
use crate::http::HttpTransport;

const LABEL: &str = "GLM";

/// CogView image generation on the GLM open platform.
pub struct GlmAdapter {
    settings: GlmSettings,
    http: HttpTransport,
}

#[derive(Debug, Deserialize)]
struct GlmImageResponse {
    #[serde(default)]
    data: Vec<GlmImageItem>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GlmImageItem {
    Inline { b64_json: String },
    Hosted { url: String },
    Unrecognized(Value),
}

impl GlmAdapter {
    pub fn new(settings: GlmSettings, http: HttpTransport) -> Self {
        Self { settings, http }
    }

    fn request_body(&self, prompt: &str, params: &GenerationParams) -> Value {
        json!({
            "model": self.settings.image_model,
            "prompt": compose(
                prompt,
                &params.aspect_ratio,
                &params.resolution,
                &params.style,
                true,
            ),
            "size": params.size(),
        })
    }

    fn payload_from_response(&self, response: Value) -> Result<Option<Payload>> {
        let parsed: GlmImageResponse =
            serde_json::from_value(response).context("GLM image response has unexpected shape")?;
        for item in parsed.data {
            match item {
                GlmImageItem::Inline { b64_json } => {
                    if let Some(payload) = Payload::from_base64(&b64_json) {
                        return Ok(Some(payload));
                    }
                }
                GlmImageItem::Hosted { url } => {
                    let (bytes, content_type) = self.http.download(LABEL, &url)?;
                    if let Some(payload) = Payload::from_bytes(&bytes, content_type.as_deref()) {
                        return Ok(Some(payload));
                    }
                }
                GlmImageItem::Unrecognized(raw) => {
                    tracing::debug!(provider = "glm", item = %raw, "skipping unrecognized image item");
                }
            }
        }
        Ok(None)
    }
}

impl ProviderAdapter for GlmAdapter {
    fn name(&self) -> &str {
        "glm"
    }

    fn is_available(&self) -> bool {
        self.settings.api_key.is_some()
    }

    fn generate_one(&self, prompt: &str, params: &GenerationParams) -> Result<Option<Payload>> {
        let Some(api_key) = self.settings.api_key.as_deref() else {
            bail!("GLM_API_KEY not set");
        };
        let endpoint = format!("{}/images/generations", self.settings.api_base);
        let body = self.request_body(prompt, params);
        let response = self.http.post_json(LABEL, |client| {
            client
                .post(&endpoint)
                .header(AUTHORIZATION, format!("Bearer {api_key}"))
                .json(&body)
        })?;
        self.payload_from_response(response)
    }
}

/// GLM chat completions, used for deck planning and transition copy.
#[derive(Clone)]
pub struct GlmChat {
    api_key: String,
    api_base: String,
    model: String,
    http: HttpTransport,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl GlmChat {
    /// `None` when no GLM key is configured.
    pub fn from_settings(settings: &GlmSettings, http: HttpTransport) -> Option<Self> {
        let api_key = settings.api_key.clone()?;
        Some(Self {
            api_key,
            api_base: settings.api_base.clone(),
            model: settings.chat_model.clone(),
            http,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn complete(&self, prompt: &str, temperature: f64) -> Result<String> {
        let endpoint = format!("{}/chat/completions", self.api_base);
        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": temperature,
        });
        let response = self.http.post_json("GLM chat", |client| {
            client
                .post(&endpoint)
                .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
                .json(&body)
        })?;
        chat_text(response)
    }
}

fn chat_text(response: Value) -> Result<String> {
    let parsed: ChatResponse =
        serde_json::from_value(response).context("GLM chat response has unexpected shape")?;
    let text = parsed
        .choices
        .into_iter()
        .find_map(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty());
    match text {
        Some(text) => Ok(text),
        None => bail!("GLM chat returned no content"),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{chat_text, GlmAdapter, GlmChat};
    use crate::config::{GlmSettings, HttpSettings};
    use crate::http::HttpTransport;
    use deckgen_contracts::providers::{GenerationParams, ProviderAdapter};

    fn settings(api_key: Option<&str>) -> GlmSettings {
        GlmSettings {
            api_key: api_key.map(str::to_string),
            api_base: "http://127.0.0.1:9".to_string(),
            image_model: "cogview-3".to_string(),
            chat_model: "glm-4-flash".to_string(),
        }
    }

    fn adapter(api_key: Option<&str>) -> anyhow::Result<GlmAdapter> {
        Ok(GlmAdapter::new(
            settings(api_key),
            HttpTransport::new(&HttpSettings::default())?,
        ))
    }

    #[test]
    fn availability_follows_api_key() -> anyhow::Result<()> {
        assert!(!adapter(None)?.is_available());
        assert!(adapter(Some("k"))?.is_available());
        let http = HttpTransport::new(&HttpSettings::default())?;
        assert!(GlmChat::from_settings(&settings(None), http.clone()).is_none());
        assert_eq!(
            GlmChat::from_settings(&settings(Some("k")), http).map(|chat| chat.model().to_string()),
            Some("glm-4-flash".to_string())
        );
        Ok(())
    }

    #[test]
    fn request_body_uses_composed_prompt_and_mapped_size() -> anyhow::Result<()> {
        let body = adapter(Some("k"))?.request_body(
            "Quarterly results",
            &GenerationParams::new("4:3", "2K", "flat"),
        );
        assert_eq!(body["model"], json!("cogview-3"));
        assert_eq!(body["size"], json!("1024x768"));
        let prompt = body["prompt"].as_str().unwrap_or_default();
        assert!(prompt.starts_with("Professional presentation slide: Quarterly results"));
        assert!(prompt.contains("Style: flat"));
        Ok(())
    }

    #[test]
    fn inline_image_items_are_decoded() -> anyhow::Result<()> {
        let glm = adapter(Some("k"))?;
        let payload = glm.payload_from_response(json!({
            "created": 1,
            "data": [{"revised": true}, {"b64_json": "iVBORw0KGgo="}]
        }))?;
        assert_eq!(payload.map(|p| p.as_base64().to_string()), Some("iVBORw0KGgo=".to_string()));

        assert!(glm.payload_from_response(json!({"data": []}))?.is_none());
        assert!(glm.payload_from_response(json!({"data": [{"b64_json": ""}]}))?.is_none());
        assert!(glm.payload_from_response(json!({"data": "bad"})).is_err());
        Ok(())
    }

    #[test]
    fn missing_key_is_an_item_error() -> anyhow::Result<()> {
        let result = adapter(None)?.generate_one("x", &GenerationParams::default());
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn chat_text_takes_first_non_empty_content() -> anyhow::Result<()> {
        let text = chat_text(json!({
            "choices": [
                {"message": {"role": "assistant", "content": "  Plan here  "}}
            ]
        }))?;
        assert_eq!(text, "Plan here");
        assert!(chat_text(json!({"choices": []})).is_err());
        assert!(chat_text(json!({"choices": [{"message": {"content": "   "}}]})).is_err());
        Ok(())
    }
}
