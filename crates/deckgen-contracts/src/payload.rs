use anyhow::Context;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

const DATA_URL_PREFIX: &str = "data:";

/// Generated image exchanged as base64 text.
///
/// The stored text never carries a `data:image/...;base64,` marker and is never empty; an
/// absent image is `None` at the call site, not an empty payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    base64: String,
    format: Option<String>,
}

impl Payload {
    /// Accepts raw base64 or a data URL. Returns `None` when nothing remains after the
    /// prefix is stripped.
    pub fn from_base64(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let format = format_from_data_url(trimmed);
        let data = strip_data_url_prefix(trimmed).trim();
        if data.is_empty() {
            return None;
        }
        Some(Self {
            base64: data.to_string(),
            format,
        })
    }

    pub fn from_bytes(bytes: &[u8], format: Option<&str>) -> Option<Self> {
        if bytes.is_empty() {
            return None;
        }
        let format = format
            .map(normalize_format)
            .or_else(|| sniff_format(bytes).map(str::to_string));
        Some(Self {
            base64: BASE64.encode(bytes),
            format,
        })
    }

    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(normalize_format(format));
        self
    }

    pub fn as_base64(&self) -> &str {
        &self.base64
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub fn decode(&self) -> anyhow::Result<Vec<u8>> {
        BASE64
            .decode(self.base64.as_bytes())
            .context("payload is not valid base64")
    }

    pub fn is_valid(&self) -> bool {
        self.decode().is_ok()
    }

    /// Format from magic bytes, independent of what the provider claimed.
    pub fn detected_format(&self) -> Option<&'static str> {
        let bytes = self.decode().ok()?;
        sniff_format(&bytes)
    }

    /// File extension for persisting: declared format, then sniffed, then `png`.
    pub fn extension(&self) -> &'static str {
        let declared = self.format.as_deref().and_then(extension_for_format);
        declared
            .or_else(|| self.detected_format().and_then(extension_for_format))
            .unwrap_or("png")
    }

    pub fn to_data_url(&self) -> String {
        add_data_url_prefix(&self.base64, self.format.as_deref().unwrap_or("png"))
    }
}

pub fn strip_data_url_prefix(raw: &str) -> &str {
    if raw.starts_with(DATA_URL_PREFIX) {
        if let Some((_, data)) = raw.split_once(',') {
            return data;
        }
    }
    raw
}

pub fn add_data_url_prefix(base64: &str, format: &str) -> String {
    if base64.starts_with(DATA_URL_PREFIX) {
        return base64.to_string();
    }
    format!("data:image/{};base64,{base64}", normalize_format(format))
}

/// `data:image/png;base64,...` -> `png`.
pub fn format_from_data_url(raw: &str) -> Option<String> {
    let meta = raw.strip_prefix("data:image/")?;
    let format = meta.split([';', ',']).next()?.trim();
    if format.is_empty() {
        return None;
    }
    Some(normalize_format(format))
}

/// Accepts mime types (`image/jpeg`) or bare names (`JPG`).
pub fn normalize_format(raw: &str) -> String {
    let lowered = raw.trim().to_ascii_lowercase();
    let bare = lowered.strip_prefix("image/").unwrap_or(&lowered);
    match bare {
        "jpg" => "jpeg".to_string(),
        other => other.to_string(),
    }
}

fn extension_for_format(format: &str) -> Option<&'static str> {
    match normalize_format(format).as_str() {
        "png" => Some("png"),
        "jpeg" => Some("jpg"),
        "webp" => Some("webp"),
        "gif" => Some("gif"),
        _ => None,
    }
}

fn sniff_format(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("png");
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("jpeg");
    }
    if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        return Some("webp");
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Some("gif");
    }
    None
}
