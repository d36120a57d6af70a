use anyhow::{bail, Context, Result};
use deckgen_contracts::payload::Payload;
use deckgen_contracts::prompts::compose_simple;
use deckgen_contracts::providers::{GenerationParams, ProviderAdapter};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::OpenRouterSettings;
use crate::http::HttpTransport;

const LABEL: &str = "OpenRouter";

/// Image-capable chat models behind OpenRouter's `chat/completions`.
pub struct OpenRouterAdapter {
    settings: OpenRouterSettings,
    http: HttpTransport,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    images: Vec<ImagePart>,
    #[serde(default)]
    content: Option<MessageContent>,
}

#[derive(Debug, Deserialize)]
struct ImagePart {
    image_url: ImageUrl,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImageUrl {
    Object { url: String },
    Plain(String),
}

impl ImageUrl {
    fn as_str(&self) -> &str {
        match self {
            Self::Object { url } | Self::Plain(url) => url,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    image_url: Option<ImageUrl>,
}

/// Where the image was found in a completion.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ImageLocation {
    DataUrl(String),
    Remote(String),
}

impl OpenRouterAdapter {
    pub fn new(settings: OpenRouterSettings, http: HttpTransport) -> Self {
        Self { settings, http }
    }

    fn request_body(&self, prompt: &str, params: &GenerationParams) -> Value {
        json!({
            "model": self.settings.image_model,
            "messages": [{"role": "user", "content": compose_simple(prompt)}],
            "modalities": ["image", "text"],
            "image_config": {"aspect_ratio": params.aspect_ratio},
        })
    }

    fn fetch(&self, location: ImageLocation) -> Result<Option<Payload>> {
        match location {
            ImageLocation::DataUrl(url) => Ok(Payload::from_base64(&url)),
            ImageLocation::Remote(url) => {
                let (bytes, content_type) = self.http.download(LABEL, &url)?;
                Ok(Payload::from_bytes(&bytes, content_type.as_deref()))
            }
        }
    }
}

fn classify(raw: &str) -> Option<ImageLocation> {
    let trimmed = raw.trim();
    if trimmed.starts_with("data:image/") {
        return Some(ImageLocation::DataUrl(trimmed.to_string()));
    }
    if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        return Some(ImageLocation::Remote(trimmed.to_string()));
    }
    None
}

/// Attached images first, then image parts of the content, then a bare URL as the text.
fn image_location(response: Value) -> Result<Option<ImageLocation>> {
    let parsed: CompletionResponse =
        serde_json::from_value(response).context("OpenRouter response has unexpected shape")?;
    let Some(choice) = parsed.choices.into_iter().next() else {
        return Ok(None);
    };
    let message = choice.message;

    if let Some(found) = message
        .images
        .iter()
        .find_map(|image| classify(image.image_url.as_str()))
    {
        return Ok(Some(found));
    }

    let found = match message.content {
        Some(MessageContent::Text(text)) => classify(&text),
        Some(MessageContent::Parts(parts)) => parts.iter().find_map(|part| {
            part.image_url
                .as_ref()
                .and_then(|url| classify(url.as_str()))
                .or_else(|| part.text.as_deref().and_then(classify))
        }),
        None => None,
    };
    Ok(found)
}

impl ProviderAdapter for OpenRouterAdapter {
    fn name(&self) -> &str {
        "openrouter"
    }

    fn is_available(&self) -> bool {
        self.settings.api_key.is_some()
    }

    fn generate_one(&self, prompt: &str, params: &GenerationParams) -> Result<Option<Payload>> {
        let Some(api_key) = self.settings.api_key.as_deref() else {
            bail!("OPENROUTER_API_KEY not set");
        };
        let endpoint = format!("{}/chat/completions", self.settings.api_base);
        let body = self.request_body(prompt, params);
        let response = self.http.post_json(LABEL, |client| {
            client
                .post(&endpoint)
                .header(AUTHORIZATION, format!("Bearer {api_key}"))
                .json(&body)
        })?;
        match image_location(response)? {
            Some(location) => self.fetch(location),
            None => Ok(None),
        }
    }
}
