mod dryrun;
mod gemini;
mod glm;
mod openrouter;

use deckgen_contracts::providers::ProviderAdapter;

use crate::config::{EngineConfig, ProviderKind};
use crate::http::HttpTransport;

pub use dryrun::DryrunAdapter;
pub use gemini::GeminiAdapter;
pub use glm::{GlmAdapter, GlmChat};
pub use openrouter::OpenRouterAdapter;

pub fn build_adapter(
    kind: ProviderKind,
    config: &EngineConfig,
    http: &HttpTransport,
) -> Box<dyn ProviderAdapter> {
    match kind {
        ProviderKind::Glm => Box::new(GlmAdapter::new(config.glm.clone(), http.clone())),
        ProviderKind::Gemini => Box::new(GeminiAdapter::new(config.gemini.clone(), http.clone())),
        ProviderKind::OpenRouter => Box::new(OpenRouterAdapter::new(
            config.openrouter.clone(),
            http.clone(),
        )),
        ProviderKind::Dryrun => Box::new(DryrunAdapter),
    }
}

/// Adapters in the configured priority order, available or not.
pub fn build_adapters(config: &EngineConfig, http: &HttpTransport) -> Vec<Box<dyn ProviderAdapter>> {
    config
        .provider_order
        .iter()
        .map(|kind| build_adapter(*kind, config, http))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderStatus {
    pub kind: ProviderKind,
    pub available: bool,
}

pub fn provider_statuses(config: &EngineConfig, http: &HttpTransport) -> Vec<ProviderStatus> {
    config
        .provider_order
        .iter()
        .map(|kind| ProviderStatus {
            kind: *kind,
            available: build_adapter(*kind, config, http).is_available(),
        })
        .collect()
}
