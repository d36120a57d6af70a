use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::events::now_utc_iso;
use crate::plan::SlidePlan;
use crate::transitions::Transition;

/// Per-slide outcome as recorded in `generation_log.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideRecord {
    /// 1-based slide number.
    pub number: usize,
    pub page_type: String,
    pub prompt_id: String,
    pub image: Option<String>,
    pub provider: Option<String>,
    pub attempts: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationLog {
    pub run_id: String,
    pub started_at: String,
    pub finished_at: String,
    pub content: String,
    pub page_count: usize,
    pub style: String,
    pub resolution: String,
    pub aspect_ratio: String,
    pub providers: Vec<String>,
    pub plan: SlidePlan,
    pub slides: Vec<SlideRecord>,
    pub images: Vec<String>,
    pub missing_slides: Vec<usize>,
    pub transitions: Vec<Transition>,
}

impl GenerationLog {
    pub fn saved_count(&self) -> usize {
        self.images.len()
    }
}

pub fn write_generation_log(
    path: &Path,
    log: &GenerationLog,
    extra: Option<&Map<String, Value>>,
) -> anyhow::Result<()> {
    let mut payload = match serde_json::to_value(log)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    payload.insert("ts".to_string(), Value::String(now_utc_iso()));
    if let Some(extra) = extra {
        for (key, value) in extra {
            payload.insert(key.clone(), value.clone());
        }
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(&Value::Object(payload))?)?;
    Ok(())
}
