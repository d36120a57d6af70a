use anyhow::{bail, Context, Result};
use deckgen_contracts::payload::Payload;
use deckgen_contracts::prompts::compose;
use deckgen_contracts::providers::{GenerationParams, ProviderAdapter};
use deckgen_contracts::sizing::DEFAULT_ASPECT_RATIO;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::GeminiSettings;
use crate::http::HttpTransport;

const SUPPORTED_ASPECT_RATIOS: [&str; 5] = ["1:1", "3:4", "4:3", "9:16", "16:9"];

/// Imagen `:predict` through the Gemini API.
pub struct GeminiAdapter {
    settings: GeminiSettings,
    http: HttpTransport,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Prediction {
    Inline {
        #[serde(rename = "bytesBase64Encoded")]
        bytes: String,
        #[serde(rename = "mimeType", default)]
        mime_type: Option<String>,
    },
    Nested {
        image: NestedImage,
    },
    Unrecognized(Value),
}

#[derive(Debug, Deserialize)]
struct NestedImage {
    #[serde(rename = "imageBytes")]
    image_bytes: String,
    #[serde(rename = "mimeType", default)]
    mime_type: Option<String>,
}

impl GeminiAdapter {
    pub fn new(settings: GeminiSettings, http: HttpTransport) -> Self {
        Self { settings, http }
    }

    fn model_name(&self) -> &str {
        self.settings.image_model.trim().trim_start_matches("models/")
    }

    fn request_body(prompt: &str, params: &GenerationParams) -> Value {
        json!({
            "instances": [{
                "prompt": compose(
                    prompt,
                    &params.aspect_ratio,
                    &params.resolution,
                    &params.style,
                    true,
                ),
            }],
            "parameters": {
                "sampleCount": 1,
                "aspectRatio": imagen_aspect_ratio(&params.aspect_ratio),
            },
        })
    }
}

fn imagen_aspect_ratio(raw: &str) -> &str {
    let trimmed = raw.trim();
    if SUPPORTED_ASPECT_RATIOS.contains(&trimmed) {
        trimmed
    } else {
        DEFAULT_ASPECT_RATIO
    }
}

fn payload_from_predictions(response: Value) -> Result<Option<Payload>> {
    let parsed: PredictResponse =
        serde_json::from_value(response).context("Imagen response has unexpected shape")?;
    for prediction in parsed.predictions {
        let (data, mime_type) = match prediction {
            Prediction::Inline { bytes, mime_type } => (bytes, mime_type),
            Prediction::Nested { image } => (image.image_bytes, image.mime_type),
            Prediction::Unrecognized(raw) => {
                tracing::debug!(provider = "gemini", prediction = %raw, "skipping prediction without image bytes");
                continue;
            }
        };
        if let Some(payload) = Payload::from_base64(&data) {
            return Ok(Some(match mime_type.as_deref() {
                Some(mime) => payload.with_format(mime),
                None => payload,
            }));
        }
    }
    Ok(None)
}

impl ProviderAdapter for GeminiAdapter {
    fn name(&self) -> &str {
        "gemini"
    }

    fn is_available(&self) -> bool {
        self.settings.api_key.is_some()
    }

    fn generate_one(&self, prompt: &str, params: &GenerationParams) -> Result<Option<Payload>> {
        let Some(api_key) = self.settings.api_key.as_deref() else {
            bail!("GEMINI_API_KEY or GOOGLE_API_KEY not set");
        };
        let endpoint = format!(
            "{}/models/{}:predict",
            self.settings.api_base,
            self.model_name()
        );
        let body = Self::request_body(prompt, params);
        let response = self.http.post_json("Imagen", |client| {
            client
                .post(&endpoint)
                .query(&[("key", api_key)])
                .json(&body)
        })?;
        payload_from_predictions(response)
    }
}
