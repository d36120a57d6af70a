use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

pub type EventPayload = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    RunStarted,
    PlanCreated,
    PromptsCreated,
    ChainStarted,
    RoundCompleted,
    RoundFailed,
    ChainFinished,
    SlideSaved,
    SlideMissing,
    TransitionsCreated,
    ViewerWritten,
    RunFinished,
    RunFailed,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RunStarted => "run_started",
            Self::PlanCreated => "plan_created",
            Self::PromptsCreated => "prompts_created",
            Self::ChainStarted => "chain_started",
            Self::RoundCompleted => "round_completed",
            Self::RoundFailed => "round_failed",
            Self::ChainFinished => "chain_finished",
            Self::SlideSaved => "slide_saved",
            Self::SlideMissing => "slide_missing",
            Self::TransitionsCreated => "transitions_created",
            Self::ViewerWritten => "viewer_written",
            Self::RunFinished => "run_finished",
            Self::RunFailed => "run_failed",
        }
    }
}

/// Append-only writer for a run's `events.jsonl`.
///
/// Every line is one compact object with `type`, `run_id` and `ts`; the caller payload is
/// merged last and may override those. Clones share the file and its lock.
#[derive(Debug, Clone)]
pub struct EventWriter {
    inner: Arc<EventWriterInner>,
}

#[derive(Debug)]
struct EventWriterInner {
    path: PathBuf,
    run_id: String,
    lock: Mutex<()>,
}

impl EventWriter {
    pub fn new(path: impl Into<PathBuf>, run_id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(EventWriterInner {
                path: path.into(),
                run_id: run_id.into(),
                lock: Mutex::new(()),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn run_id(&self) -> &str {
        &self.inner.run_id
    }

    pub fn emit(&self, kind: EventKind, payload: EventPayload) -> anyhow::Result<Value> {
        let mut event = Map::new();
        event.insert("type".to_string(), Value::String(kind.as_str().to_string()));
        event.insert(
            "run_id".to_string(),
            Value::String(self.inner.run_id.clone()),
        );
        event.insert("ts".to_string(), Value::String(now_utc_iso()));
        event.extend(payload);

        let line = serde_json::to_string(&event)?;
        let _guard = self
            .inner
            .lock
            .lock()
            .map_err(|_| anyhow::anyhow!("event writer lock poisoned"))?;
        if let Some(parent) = self.inner.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.inner.path)?;
        writeln!(file, "{line}")?;

        Ok(Value::Object(event))
    }

    /// Convenience for `json!({...})` payloads; non-object values are stored under `value`.
    pub fn emit_json(&self, kind: EventKind, payload: Value) -> anyhow::Result<Value> {
        let payload = match payload {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        self.emit(kind, payload)
    }
}

/// Parses an events file, skipping blank or malformed lines.
pub fn read_events(path: &Path) -> anyhow::Result<Vec<Value>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(raw
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .collect())
}

pub fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}
