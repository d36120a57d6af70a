use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Result};

use crate::chain::ChainOptions;

pub const DEFAULT_GLM_API_BASE: &str = "https://open.bigmodel.cn/api/paas/v4";
pub const DEFAULT_GLM_IMAGE_MODEL: &str = "cogview-3";
pub const DEFAULT_GLM_CHAT_MODEL: &str = "glm-4-flash";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_IMAGE_MODEL: &str = "imagen-4.0-generate-001";
pub const DEFAULT_OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_OPENROUTER_IMAGE_MODEL: &str = "google/gemini-3-pro-image-preview";
pub const DEFAULT_STYLES_DIR: &str = "config/styles";
pub const MIN_DEADLINE_SECS: f64 = 1.0;
pub const MAX_DEADLINE_SECS: f64 = 86_400.0;
pub const DEFAULT_PROVIDER_ORDER: [ProviderKind; 3] =
    [ProviderKind::Glm, ProviderKind::Gemini, ProviderKind::OpenRouter];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Glm,
    Gemini,
    OpenRouter,
    Dryrun,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::Glm,
        ProviderKind::Gemini,
        ProviderKind::OpenRouter,
        ProviderKind::Dryrun,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Glm => "glm",
            Self::Gemini => "gemini",
            Self::OpenRouter => "openrouter",
            Self::Dryrun => "dryrun",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "glm" | "cogview" | "zhipu" => Ok(Self::Glm),
            "gemini" | "imagen" | "google" => Ok(Self::Gemini),
            "openrouter" => Ok(Self::OpenRouter),
            "dryrun" => Ok(Self::Dryrun),
            other => {
                let valid = Self::ALL
                    .iter()
                    .map(ProviderKind::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                bail!("unknown provider '{other}' (expected one of: {valid})")
            }
        }
    }
}

/// Parses a comma-separated priority list. Blank input yields the default order; duplicates
/// keep their first position.
pub fn parse_provider_order(raw: &str) -> Result<Vec<ProviderKind>> {
    let mut order = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        let kind = part.parse::<ProviderKind>()?;
        if !order.contains(&kind) {
            order.push(kind);
        }
    }
    if order.is_empty() {
        return Ok(DEFAULT_PROVIDER_ORDER.to_vec());
    }
    Ok(order)
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlmSettings {
    pub api_key: Option<String>,
    pub api_base: String,
    pub image_model: String,
    pub chat_model: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeminiSettings {
    pub api_key: Option<String>,
    pub api_base: String,
    pub image_model: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenRouterSettings {
    pub api_key: Option<String>,
    pub api_base: String,
    pub image_model: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpSettings {
    pub request_timeout: Duration,
    pub transport_retries: usize,
    pub retry_backoff: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(60),
            transport_retries: 3,
            retry_backoff: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub glm: GlmSettings,
    pub gemini: GeminiSettings,
    pub openrouter: OpenRouterSettings,
    pub http: HttpSettings,
    pub provider_order: Vec<ProviderKind>,
    pub max_attempts_per_item: Option<usize>,
    pub deadline: Option<Duration>,
    pub styles_dir: PathBuf,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(non_empty_env)
    }

    /// Builds the configuration from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let base = |key: &str, default: &str| {
            get(key)
                .map(|value| value.trim_end_matches('/').to_string())
                .unwrap_or_else(|| default.to_string())
        };

        let provider_order = match get("DECKGEN_PROVIDERS") {
            Some(raw) => parse_provider_order(&raw)?,
            None => DEFAULT_PROVIDER_ORDER.to_vec(),
        };

        Ok(Self {
            glm: GlmSettings {
                api_key: get("GLM_API_KEY"),
                api_base: base("GLM_API_BASE", DEFAULT_GLM_API_BASE),
                image_model: get("GLM_IMAGE_MODEL")
                    .unwrap_or_else(|| DEFAULT_GLM_IMAGE_MODEL.to_string()),
                chat_model: get("GLM_CHAT_MODEL")
                    .unwrap_or_else(|| DEFAULT_GLM_CHAT_MODEL.to_string()),
            },
            gemini: GeminiSettings {
                api_key: get("GEMINI_API_KEY").or_else(|| get("GOOGLE_API_KEY")),
                api_base: base("GEMINI_API_BASE", DEFAULT_GEMINI_API_BASE),
                image_model: get("GEMINI_IMAGE_MODEL")
                    .unwrap_or_else(|| DEFAULT_GEMINI_IMAGE_MODEL.to_string()),
            },
            openrouter: OpenRouterSettings {
                api_key: get("OPENROUTER_API_KEY"),
                api_base: base("OPENROUTER_API_BASE", DEFAULT_OPENROUTER_API_BASE),
                image_model: get("OPENROUTER_IMAGE_MODEL")
                    .unwrap_or_else(|| DEFAULT_OPENROUTER_IMAGE_MODEL.to_string()),
            },
            http: HttpSettings {
                request_timeout: Duration::from_secs_f64(number_in_range(
                    "DECKGEN_REQUEST_TIMEOUT",
                    get("DECKGEN_REQUEST_TIMEOUT"),
                    60.0,
                    1.0,
                    600.0,
                )),
                transport_retries: number_in_range(
                    "DECKGEN_TRANSPORT_RETRIES",
                    get("DECKGEN_TRANSPORT_RETRIES"),
                    3.0,
                    0.0,
                    10.0,
                )
                .round() as usize,
                retry_backoff: Duration::from_secs_f64(number_in_range(
                    "DECKGEN_RETRY_BACKOFF",
                    get("DECKGEN_RETRY_BACKOFF"),
                    1.0,
                    0.0,
                    30.0,
                )),
            },
            provider_order,
            max_attempts_per_item: get("DECKGEN_MAX_ATTEMPTS")
                .map(|raw| number_in_range("DECKGEN_MAX_ATTEMPTS", Some(raw), 1.0, 1.0, 64.0))
                .map(|value| value.round() as usize),
            deadline: get("DECKGEN_DEADLINE")
                .map(|raw| {
                    number_in_range(
                        "DECKGEN_DEADLINE",
                        Some(raw),
                        600.0,
                        MIN_DEADLINE_SECS,
                        MAX_DEADLINE_SECS,
                    )
                })
                .map(Duration::from_secs_f64),
            styles_dir: get("DECKGEN_STYLES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STYLES_DIR)),
        })
    }

    pub fn chain_options(&self) -> ChainOptions {
        ChainOptions {
            max_attempts_per_item: self.max_attempts_per_item,
            deadline: self.deadline,
        }
    }

    pub fn glm_configured(&self) -> bool {
        self.glm.api_key.is_some()
    }
}

pub(crate) fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Run deadline from a user-supplied number of seconds, clamped to
/// `[MIN_DEADLINE_SECS, MAX_DEADLINE_SECS]`.
pub fn deadline_from_secs(seconds: f64) -> Result<Duration> {
    if !seconds.is_finite() || seconds <= 0.0 {
        bail!("deadline must be a positive number of seconds, got {seconds}");
    }
    Ok(Duration::from_secs_f64(
        seconds.clamp(MIN_DEADLINE_SECS, MAX_DEADLINE_SECS),
    ))
}

fn number_in_range(key: &str, raw: Option<String>, default: f64, min: f64, max: f64) -> f64 {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value.clamp(min, max),
        _ => {
            tracing::warn!(key, value = %raw, "ignoring non-numeric setting");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    use super::{deadline_from_secs, parse_provider_order, EngineConfig, ProviderKind};

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<EngineConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        EngineConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_any_variables() -> anyhow::Result<()> {
        let config = config_from(&[])?;
        assert_eq!(
            config.provider_order,
            vec![ProviderKind::Glm, ProviderKind::Gemini, ProviderKind::OpenRouter]
        );
        assert_eq!(config.glm.api_key, None);
        assert_eq!(config.glm.image_model, "cogview-3");
        assert_eq!(config.glm.chat_model, "glm-4-flash");
        assert_eq!(config.gemini.image_model, "imagen-4.0-generate-001");
        assert_eq!(
            config.openrouter.image_model,
            "google/gemini-3-pro-image-preview"
        );
        assert_eq!(config.http.request_timeout, Duration::from_secs(60));
        assert_eq!(config.http.transport_retries, 3);
        assert_eq!(config.max_attempts_per_item, None);
        assert_eq!(config.deadline, None);
        assert_eq!(config.styles_dir, PathBuf::from("config/styles"));
        assert!(!config.glm_configured());
        Ok(())
    }

    #[test]
    fn keys_bases_and_limits_are_read_and_clamped() -> anyhow::Result<()> {
        let config = config_from(&[
            ("GLM_API_KEY", " glm-key "),
            ("GOOGLE_API_KEY", "google-key"),
            ("OPENROUTER_API_BASE", "https://proxy.local/v1/"),
            ("DECKGEN_REQUEST_TIMEOUT", "9000"),
            ("DECKGEN_TRANSPORT_RETRIES", "abc"),
            ("DECKGEN_MAX_ATTEMPTS", "0"),
            ("DECKGEN_DEADLINE", "45"),
        ])?;
        assert_eq!(config.glm.api_key.as_deref(), Some("glm-key"));
        assert_eq!(config.gemini.api_key.as_deref(), Some("google-key"));
        assert_eq!(config.openrouter.api_base, "https://proxy.local/v1");
        assert_eq!(config.http.request_timeout, Duration::from_secs(600));
        assert_eq!(config.http.transport_retries, 3);
        assert_eq!(config.max_attempts_per_item, Some(1));
        assert_eq!(config.deadline, Some(Duration::from_secs(45)));
        let options = config.chain_options();
        assert_eq!(options.max_attempts_per_item, Some(1));
        Ok(())
    }

    #[test]
    fn deadline_seconds_are_clamped_and_validated() -> anyhow::Result<()> {
        assert_eq!(deadline_from_secs(2.5)?, Duration::from_millis(2500));
        assert_eq!(deadline_from_secs(0.2)?, Duration::from_secs(1));
        assert_eq!(deadline_from_secs(1e30)?, Duration::from_secs(86_400));
        assert!(deadline_from_secs(0.0).is_err());
        assert!(deadline_from_secs(-3.0).is_err());
        assert!(deadline_from_secs(f64::NAN).is_err());
        assert!(deadline_from_secs(f64::INFINITY).is_err());
        Ok(())
    }

    #[test]
    fn gemini_key_wins_over_google_key() -> anyhow::Result<()> {
        let config = config_from(&[("GEMINI_API_KEY", "a"), ("GOOGLE_API_KEY", "b")])?;
        assert_eq!(config.gemini.api_key.as_deref(), Some("a"));
        Ok(())
    }

    #[test]
    fn provider_order_parses_aliases_and_rejects_unknown_names() -> anyhow::Result<()> {
        assert_eq!(
            parse_provider_order("openrouter, imagen ,glm,openrouter")?,
            vec![ProviderKind::OpenRouter, ProviderKind::Gemini, ProviderKind::Glm]
        );
        assert_eq!(parse_provider_order(" , ")?.len(), 3);

        let err = match parse_provider_order("glm,midjourney") {
            Ok(order) => anyhow::bail!("expected an error, got {order:?}"),
            Err(err) => err,
        };
        let message = err.to_string();
        assert!(message.contains("midjourney"));
        assert!(message.contains("glm, gemini, openrouter, dryrun"));

        assert!(config_from(&[("DECKGEN_PROVIDERS", "nope")]).is_err());
        Ok(())
    }
}
