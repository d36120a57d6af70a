use serde::{Deserialize, Serialize};

use crate::payload::Payload;
use crate::prompts::DEFAULT_STYLE;
use crate::sizing::{size_for, DEFAULT_ASPECT_RATIO, DEFAULT_RESOLUTION};

/// Generation parameters shared by every item of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub aspect_ratio: String,
    pub resolution: String,
    pub style: String,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            aspect_ratio: DEFAULT_ASPECT_RATIO.to_string(),
            resolution: DEFAULT_RESOLUTION.to_string(),
            style: DEFAULT_STYLE.to_string(),
        }
    }
}

impl GenerationParams {
    pub fn new(
        aspect_ratio: impl Into<String>,
        resolution: impl Into<String>,
        style: impl Into<String>,
    ) -> Self {
        Self {
            aspect_ratio: aspect_ratio.into(),
            resolution: resolution.into(),
            style: style.into(),
        }
    }

    pub fn size(&self) -> &'static str {
        size_for(&self.aspect_ratio, &self.resolution)
    }
}

/// Uniform surface over one external image service.
///
/// `generate_one` reports "no image" as `Ok(None)` and transport or decoding trouble as
/// `Err`; neither escapes a batch. `generate_batch` only returns `Err` when the whole call
/// is unusable, and callers treat that as a round with zero successes.
pub trait ProviderAdapter: Send + Sync {
    fn name(&self) -> &str;

    /// Credentials/configuration present. Read once when a chain is assembled.
    fn is_available(&self) -> bool;

    fn generate_one(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> anyhow::Result<Option<Payload>>;

    fn generate_batch(
        &self,
        prompts: &[String],
        params: &GenerationParams,
    ) -> anyhow::Result<Vec<Option<Payload>>> {
        Ok(generate_batch_sequentially(
            self.name(),
            prompts,
            |prompt| self.generate_one(prompt, params),
        ))
    }
}

/// Runs `generate_one` per prompt in order. Failures become `None` at that index, so the
/// output always has one entry per prompt.
pub fn generate_batch_sequentially<F>(
    provider: &str,
    prompts: &[String],
    mut generate_one: F,
) -> Vec<Option<Payload>>
where
    F: FnMut(&str) -> anyhow::Result<Option<Payload>>,
{
    let total = prompts.len();
    let mut results = Vec::with_capacity(total);
    for (idx, prompt) in prompts.iter().enumerate() {
        tracing::info!(provider, item = idx + 1, total, "generating item");
        let outcome = match generate_one(prompt) {
            Ok(Some(payload)) => {
                tracing::info!(provider, item = idx + 1, "item generated");
                Some(payload)
            }
            Ok(None) => {
                tracing::warn!(provider, item = idx + 1, "provider returned no image");
                None
            }
            Err(err) => {
                tracing::warn!(provider, item = idx + 1, "item failed: {err:#}");
                None
            }
        };
        results.push(outcome);
    }
    results
}

pub fn success_count(results: &[Option<Payload>]) -> usize {
    results.iter().filter(|result| result.is_some()).count()
}
