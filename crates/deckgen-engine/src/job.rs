use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use deckgen_contracts::events::{now_utc_iso, EventKind, EventWriter};
use deckgen_contracts::plan::SlidePlan;
use deckgen_contracts::prompts::slide_prompts;
use deckgen_contracts::providers::{GenerationParams, ProviderAdapter};
use deckgen_contracts::runs::generation_log::{write_generation_log, GenerationLog, SlideRecord};
use deckgen_contracts::sizing::{DEFAULT_ASPECT_RATIO, DEFAULT_RESOLUTION};
use deckgen_contracts::styles::StyleCatalog;
use serde::Serialize;
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

use crate::chain::{BatchRequest, ChainOutcome, FallbackChain, RoundRecord, StopReason};
use crate::config::EngineConfig;
use crate::http::HttpTransport;
use crate::planner::{GlmPlanner, DEFAULT_POINT_MAX_CHARS};
use crate::providers::{build_adapters, GlmChat};
use crate::text::error_chain_text;
use crate::viewer::{render_viewer, ViewerSlide};

pub const DEFAULT_DECK_STYLE: &str = "gradient-glass";
pub const DEFAULT_PAGE_COUNT: usize = 5;

const PLAN_FILE: &str = "slides_plan.json";
const PROMPTS_FILE: &str = "prompts.json";
const VIEWER_FILE: &str = "viewer.html";
const LOG_FILE: &str = "generation_log.json";
const IMAGES_DIR: &str = "images";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckRequest {
    pub content: String,
    pub page_count: usize,
    pub style: String,
    pub resolution: String,
    pub aspect_ratio: String,
    pub transitions: bool,
    /// Let GLM tighten the brief before planning.
    pub optimize_content: bool,
}

impl DeckRequest {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            page_count: DEFAULT_PAGE_COUNT,
            style: DEFAULT_DECK_STYLE.to_string(),
            resolution: DEFAULT_RESOLUTION.to_string(),
            aspect_ratio: DEFAULT_ASPECT_RATIO.to_string(),
            transitions: true,
            optimize_content: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeckOutcome {
    pub out_dir: PathBuf,
    pub plan_path: PathBuf,
    pub prompts_path: PathBuf,
    pub viewer_path: PathBuf,
    pub log_path: PathBuf,
    pub images: Vec<PathBuf>,
    /// 1-based numbers of slides no provider produced.
    pub missing_slides: Vec<usize>,
    pub providers: Vec<String>,
    pub stop: StopReason,
}

impl DeckOutcome {
    pub fn saved_count(&self) -> usize {
        self.images.len()
    }

    pub fn missing_count(&self) -> usize {
        self.missing_slides.len()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_slides.is_empty()
    }
}

#[derive(Debug, Serialize)]
struct PromptEntry<'a> {
    number: usize,
    page_type: &'a str,
    prompt_id: String,
    prompt: &'a str,
}

/// One deck generation run rooted at `out_dir`.
pub struct DeckJob {
    out_dir: PathBuf,
    images_dir: PathBuf,
    events: EventWriter,
    started_at: String,
    styles: StyleCatalog,
    planner: GlmPlanner,
    chain: FallbackChain,
}

impl DeckJob {
    pub fn new(
        out_dir: impl Into<PathBuf>,
        events_path: impl Into<PathBuf>,
        config: EngineConfig,
    ) -> Result<Self> {
        let out_dir = out_dir.into();
        let images_dir = out_dir.join(IMAGES_DIR);
        fs::create_dir_all(&images_dir)
            .with_context(|| format!("failed to create {}", images_dir.display()))?;
        let run_id = out_dir
            .file_name()
            .and_then(|value| value.to_str())
            .filter(|value| !value.is_empty())
            .unwrap_or("deck")
            .to_string();
        let events = EventWriter::new(events_path.into(), run_id);

        let http = HttpTransport::new(&config.http)?;
        let planner = GlmPlanner::new(GlmChat::from_settings(&config.glm, http.clone()));
        let chain =
            FallbackChain::new(build_adapters(&config, &http)).with_options(config.chain_options());
        let styles = StyleCatalog::new(config.styles_dir.clone());

        events.emit_json(
            EventKind::RunStarted,
            json!({
                "out_dir": out_dir.to_string_lossy().to_string(),
                "provider_order": config
                    .provider_order
                    .iter()
                    .map(|kind| kind.as_str())
                    .collect::<Vec<_>>(),
            }),
        )?;

        Ok(Self {
            out_dir,
            images_dir,
            events,
            started_at: now_utc_iso(),
            styles,
            planner,
            chain,
        })
    }

    /// Replaces the configured adapters, keeping the chain options.
    pub fn with_adapters(mut self, adapters: Vec<Box<dyn ProviderAdapter>>) -> Self {
        let options = self.chain.options();
        self.chain = FallbackChain::new(adapters).with_options(options);
        self
    }

    pub fn with_planner(mut self, planner: GlmPlanner) -> Self {
        self.planner = planner;
        self
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn event_writer(&self) -> EventWriter {
        self.events.clone()
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.chain.provider_names()
    }

    pub fn generate(&mut self, request: &DeckRequest) -> Result<DeckOutcome> {
        match self.generate_inner(request) {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                let emitted = self.events.emit_json(
                    EventKind::RunFailed,
                    json!({"error": error_chain_text(&err, 1024)}),
                );
                if let Err(emit_err) = emitted {
                    tracing::warn!("failed to record run failure: {emit_err:#}");
                }
                Err(err)
            }
        }
    }

    fn generate_inner(&mut self, request: &DeckRequest) -> Result<DeckOutcome> {
        tracing::info!(pages = request.page_count, style = %request.style, "generating deck");

        let content = if request.optimize_content {
            self.planner
                .optimize_content(&request.content, DEFAULT_POINT_MAX_CHARS)
        } else {
            request.content.clone()
        };
        let plan = self.planner.plan(&content, request.page_count);
        let planned_by = if self.planner.is_configured() {
            "glm"
        } else {
            "default"
        };
        let plan_path = self.out_dir.join(PLAN_FILE);
        plan.write(&plan_path)
            .with_context(|| format!("failed to write {}", plan_path.display()))?;
        self.events.emit_json(
            EventKind::PlanCreated,
            json!({
                "title": plan.title,
                "slides": plan.len(),
                "planned_by": planned_by,
                "path": plan_path.to_string_lossy().to_string(),
            }),
        )?;

        let style = self.styles.load(&request.style);
        let prompts = slide_prompts(&plan, &style, &request.resolution);
        let prompt_ids: Vec<String> = prompts
            .iter()
            .enumerate()
            .map(|(idx, prompt)| short_id(prompt, idx as u64))
            .collect();
        let prompts_path = self.out_dir.join(PROMPTS_FILE);
        self.write_prompts(&prompts_path, &plan, &prompts, &prompt_ids)?;
        self.events.emit_json(
            EventKind::PromptsCreated,
            json!({
                "count": prompts.len(),
                "style": style.name,
                "path": prompts_path.to_string_lossy().to_string(),
            }),
        )?;

        let providers = self.chain.provider_names();
        self.events.emit_json(
            EventKind::ChainStarted,
            json!({
                "providers": providers,
                "skipped": self.chain.skipped_providers(),
                "items": prompts.len(),
            }),
        )?;
        let batch = BatchRequest::new(
            prompts.clone(),
            GenerationParams::new(
                request.aspect_ratio.clone(),
                request.resolution.clone(),
                request.style.clone(),
            ),
        );
        let outcome = self.chain.run(&batch);
        for round in &outcome.rounds {
            self.emit_round(round)?;
        }
        self.events.emit_json(
            EventKind::ChainFinished,
            json!({
                "stop_reason": outcome.stop.as_str(),
                "succeeded": outcome.success_count(),
                "failed": outcome.failed_indices().iter().map(|idx| idx + 1).collect::<Vec<_>>(),
            }),
        )?;

        let saved = self.save_slides(&plan, &outcome, &prompt_ids)?;

        let saved_specs: Vec<_> = saved
            .iter()
            .filter_map(|record| plan.slides.get(record.number - 1))
            .collect();
        let transitions = if request.transitions && self.planner.is_configured() {
            let transitions = self.planner.transitions(&saved_specs);
            self.events.emit_json(
                EventKind::TransitionsCreated,
                json!({"count": transitions.len()}),
            )?;
            transitions
        } else {
            Vec::new()
        };

        let viewer_slides: Vec<ViewerSlide> = saved
            .iter()
            .filter_map(|record| {
                let image = record.image.clone()?;
                let spec = plan.slides.get(record.number - 1)?;
                Some(ViewerSlide {
                    number: record.number,
                    image,
                    page_type: spec.page_type.as_str().to_string(),
                    content: spec.content.clone(),
                })
            })
            .collect();
        let viewer_path = self.out_dir.join(VIEWER_FILE);
        fs::write(&viewer_path, render_viewer(&plan.title, &viewer_slides)?)
            .with_context(|| format!("failed to write {}", viewer_path.display()))?;
        self.events.emit_json(
            EventKind::ViewerWritten,
            json!({
                "path": viewer_path.to_string_lossy().to_string(),
                "slides": viewer_slides.len(),
            }),
        )?;

        let records = self.slide_records(&plan, &outcome, &prompt_ids, &saved);
        let images: Vec<String> = records.iter().filter_map(|r| r.image.clone()).collect();
        let missing_slides: Vec<usize> = records
            .iter()
            .filter(|record| record.image.is_none())
            .map(|record| record.number)
            .collect();
        let log = GenerationLog {
            run_id: self.events.run_id().to_string(),
            started_at: self.started_at.clone(),
            finished_at: now_utc_iso(),
            content: request.content.clone(),
            page_count: request.page_count,
            style: request.style.clone(),
            resolution: request.resolution.clone(),
            aspect_ratio: request.aspect_ratio.clone(),
            providers: providers.clone(),
            plan: plan.clone(),
            slides: records,
            images: images.clone(),
            missing_slides: missing_slides.clone(),
            transitions,
        };
        let log_path = self.out_dir.join(LOG_FILE);
        let mut extra = Map::new();
        extra.insert("stop_reason".to_string(), json!(outcome.stop.as_str()));
        extra.insert(
            "rounds".to_string(),
            Value::Array(outcome.rounds.iter().map(round_json).collect()),
        );
        write_generation_log(&log_path, &log, Some(&extra))
            .with_context(|| format!("failed to write {}", log_path.display()))?;

        self.events.emit_json(
            EventKind::RunFinished,
            json!({
                "saved": images.len(),
                "missing": missing_slides,
                "viewer": viewer_path.to_string_lossy().to_string(),
            }),
        )?;
        tracing::info!(
            saved = images.len(),
            missing = missing_slides.len(),
            "deck generation finished"
        );

        Ok(DeckOutcome {
            out_dir: self.out_dir.clone(),
            plan_path,
            prompts_path,
            viewer_path,
            log_path,
            images: images.iter().map(|rel| self.out_dir.join(rel)).collect(),
            missing_slides,
            providers,
            stop: outcome.stop,
        })
    }

    fn write_prompts(
        &self,
        path: &Path,
        plan: &SlidePlan,
        prompts: &[String],
        prompt_ids: &[String],
    ) -> Result<()> {
        let entries: Vec<PromptEntry<'_>> = plan
            .slides
            .iter()
            .zip(prompts.iter().zip(prompt_ids))
            .enumerate()
            .map(|(idx, (slide, (prompt, prompt_id)))| PromptEntry {
                number: idx + 1,
                page_type: slide.page_type.as_str(),
                prompt_id: prompt_id.clone(),
                prompt,
            })
            .collect();
        fs::write(path, serde_json::to_string_pretty(&entries)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    fn emit_round(&self, round: &RoundRecord) -> Result<()> {
        let kind = if round.fault.is_some() {
            EventKind::RoundFailed
        } else {
            EventKind::RoundCompleted
        };
        self.events.emit_json(kind, round_json(round))?;
        Ok(())
    }

    /// Writes every produced image. Returns one record per saved slide.
    fn save_slides(
        &self,
        plan: &SlidePlan,
        outcome: &ChainOutcome,
        prompt_ids: &[String],
    ) -> Result<Vec<SlideRecord>> {
        let mut saved = Vec::new();
        for (slot, slide) in outcome.slots.iter().zip(&plan.slides) {
            let number = slot.index + 1;
            let page_type = slide.page_type.as_str();
            let Some(payload) = slot.payload.as_ref() else {
                self.events.emit_json(
                    EventKind::SlideMissing,
                    json!({
                        "number": number,
                        "page_type": page_type,
                        "attempts": slot.attempts,
                    }),
                )?;
                continue;
            };
            let bytes = match payload.decode() {
                Ok(bytes) => bytes,
                Err(err) => {
                    tracing::warn!(slide = number, "discarding undecodable image: {err:#}");
                    self.events.emit_json(
                        EventKind::SlideMissing,
                        json!({
                            "number": number,
                            "page_type": page_type,
                            "attempts": slot.attempts,
                            "reason": error_chain_text(&err, 256),
                        }),
                    )?;
                    continue;
                }
            };

            let file_name = format!(
                "slide_{number:02}_{}.{}",
                file_safe(page_type),
                payload.extension()
            );
            let path = self.images_dir.join(&file_name);
            fs::write(&path, bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            let relative = format!("{IMAGES_DIR}/{file_name}");
            self.events.emit_json(
                EventKind::SlideSaved,
                json!({
                    "number": number,
                    "page_type": page_type,
                    "path": relative,
                    "provider": slot.provider,
                    "attempts": slot.attempts,
                }),
            )?;
            saved.push(SlideRecord {
                number,
                page_type: page_type.to_string(),
                prompt_id: prompt_ids.get(slot.index).cloned().unwrap_or_default(),
                image: Some(relative),
                provider: slot.provider.clone(),
                attempts: slot.attempts,
            });
        }
        Ok(saved)
    }

    fn slide_records(
        &self,
        plan: &SlidePlan,
        outcome: &ChainOutcome,
        prompt_ids: &[String],
        saved: &[SlideRecord],
    ) -> Vec<SlideRecord> {
        outcome
            .slots
            .iter()
            .zip(&plan.slides)
            .map(|(slot, slide)| {
                let number = slot.index + 1;
                saved
                    .iter()
                    .find(|record| record.number == number)
                    .cloned()
                    .unwrap_or_else(|| SlideRecord {
                        number,
                        page_type: slide.page_type.as_str().to_string(),
                        prompt_id: prompt_ids.get(slot.index).cloned().unwrap_or_default(),
                        image: None,
                        provider: None,
                        attempts: slot.attempts,
                    })
            })
            .collect()
    }
}

fn round_json(round: &RoundRecord) -> Value {
    json!({
        "level": round.level,
        "provider": round.provider,
        "requested": round.indices.iter().map(|idx| idx + 1).collect::<Vec<_>>(),
        "succeeded": round.succeeded.iter().map(|idx| idx + 1).collect::<Vec<_>>(),
        "fault": round.fault,
    })
}

fn file_safe(page_type: &str) -> String {
    let cleaned: String = page_type
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "slide".to_string()
    } else {
        cleaned
    }
}

fn short_id(prompt: &str, idx: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    hasher.update(idx.to_be_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..4])
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;

    use anyhow::bail;
    use deckgen_contracts::events::read_events;
    use deckgen_contracts::payload::Payload;
    use deckgen_contracts::providers::{GenerationParams, ProviderAdapter};
    use serde_json::{json, Value};

    use super::{file_safe, short_id, DeckJob, DeckRequest};
    use crate::chain::StopReason;
    use crate::config::EngineConfig;
    use crate::providers::DryrunAdapter;

    fn config(styles_dir: &std::path::Path) -> anyhow::Result<EngineConfig> {
        let vars: HashMap<&str, String> = [
            ("DECKGEN_PROVIDERS", "dryrun".to_string()),
            ("DECKGEN_STYLES_DIR", styles_dir.to_string_lossy().to_string()),
        ]
        .into_iter()
        .collect();
        EngineConfig::from_lookup(|key| vars.get(key).cloned())
    }

    fn small_request(content: &str, pages: usize) -> DeckRequest {
        let mut request = DeckRequest::new(content);
        request.page_count = pages;
        request.aspect_ratio = "1:1".to_string();
        request.resolution = "1080p".to_string();
        request.style = "missing-style".to_string();
        request
    }

    fn event_types(path: &std::path::Path) -> anyhow::Result<Vec<String>> {
        Ok(read_events(path)?
            .iter()
            .filter_map(|event| event["type"].as_str().map(str::to_string))
            .collect())
    }

    /// Refuses summary slides, otherwise renders like dryrun.
    struct NoSummaries;

    impl ProviderAdapter for NoSummaries {
        fn name(&self) -> &str {
            "no-summaries"
        }

        fn is_available(&self) -> bool {
            true
        }

        fn generate_one(
            &self,
            prompt: &str,
            params: &GenerationParams,
        ) -> anyhow::Result<Option<Payload>> {
            if prompt.contains("summary page") {
                return Ok(None);
            }
            DryrunAdapter.generate_one(prompt, params)
        }
    }

    struct Offline;

    impl ProviderAdapter for Offline {
        fn name(&self) -> &str {
            "offline"
        }

        fn is_available(&self) -> bool {
            true
        }

        fn generate_one(
            &self,
            _prompt: &str,
            _params: &GenerationParams,
        ) -> anyhow::Result<Option<Payload>> {
            bail!("unreachable host")
        }

        fn generate_batch(
            &self,
            _prompts: &[String],
            _params: &GenerationParams,
        ) -> anyhow::Result<Vec<Option<Payload>>> {
            bail!("service unavailable")
        }
    }

    #[test]
    fn dryrun_deck_writes_every_artifact() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let out_dir = temp.path().join("deck-001");
        let events_path = out_dir.join("events.jsonl");
        let mut job = DeckJob::new(&out_dir, &events_path, config(temp.path())?)?;
        assert_eq!(job.provider_names(), vec!["dryrun"]);

        let outcome = job.generate(&small_request("Rust in production", 3))?;
        assert!(outcome.is_complete());
        assert_eq!(outcome.saved_count(), 3);
        assert_eq!(outcome.stop, StopReason::AllSucceeded);
        assert!(out_dir.join("images/slide_01_cover.png").is_file());
        assert!(out_dir.join("images/slide_02_content.png").is_file());
        assert!(out_dir.join("images/slide_03_summary.png").is_file());
        assert!(outcome.images.iter().all(|path| path.is_file()));

        let plan: Value = serde_json::from_str(&fs::read_to_string(&outcome.plan_path)?)?;
        assert_eq!(plan["total_slides"], json!(3));
        let prompts: Value = serde_json::from_str(&fs::read_to_string(&outcome.prompts_path)?)?;
        assert_eq!(prompts.as_array().map(Vec::len), Some(3));
        assert_eq!(prompts[1]["page_type"], json!("content"));

        let viewer = fs::read_to_string(&outcome.viewer_path)?;
        assert!(viewer.contains("images/slide_03_summary.png"));

        let log: Value = serde_json::from_str(&fs::read_to_string(&outcome.log_path)?)?;
        assert_eq!(log["run_id"], json!("deck-001"));
        assert_eq!(log["providers"], json!(["dryrun"]));
        assert_eq!(log["missing_slides"], json!([]));
        assert_eq!(log["slides"][0]["provider"], json!("dryrun"));
        assert_eq!(log["stop_reason"], json!("all_succeeded"));
        assert_eq!(log["transitions"], json!([]));

        let types = event_types(&events_path)?;
        assert_eq!(types.first().map(String::as_str), Some("run_started"));
        assert_eq!(types.last().map(String::as_str), Some("run_finished"));
        assert_eq!(types.iter().filter(|kind| *kind == "slide_saved").count(), 3);
        assert!(types.contains(&"round_completed".to_string()));
        assert!(!types.contains(&"transitions_created".to_string()));
        Ok(())
    }

    #[test]
    fn missing_slides_do_not_fail_the_job() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let out_dir = temp.path().join("partial");
        let events_path = out_dir.join("events.jsonl");
        let mut job = DeckJob::new(&out_dir, &events_path, config(temp.path())?)?
            .with_adapters(vec![Box::new(NoSummaries)]);

        let outcome = job.generate(&small_request("Budget", 3))?;
        assert!(!outcome.is_complete());
        assert_eq!(outcome.missing_slides, vec![3]);
        assert_eq!(outcome.saved_count(), 2);
        assert_eq!(outcome.stop, StopReason::ProvidersExhausted);
        assert!(!out_dir.join("images/slide_03_summary.png").exists());

        let viewer = fs::read_to_string(&outcome.viewer_path)?;
        assert!(viewer.contains("slide_02_content.png"));
        assert!(!viewer.contains("slide_03_summary.png"));

        let log: Value = serde_json::from_str(&fs::read_to_string(&outcome.log_path)?)?;
        assert_eq!(log["missing_slides"], json!([3]));
        assert_eq!(log["slides"][2]["image"], Value::Null);
        assert_eq!(log["slides"][2]["attempts"], json!(1));
        assert!(event_types(&events_path)?.contains(&"slide_missing".to_string()));
        Ok(())
    }

    #[test]
    fn faulting_provider_falls_through_to_next() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let out_dir = temp.path().join("fallback");
        let events_path = out_dir.join("events.jsonl");
        let mut job = DeckJob::new(&out_dir, &events_path, config(temp.path())?)?
            .with_adapters(vec![Box::new(Offline), Box::new(DryrunAdapter)]);

        let outcome = job.generate(&small_request("Hiring", 2))?;
        assert!(outcome.is_complete());
        assert_eq!(outcome.providers, vec!["offline", "dryrun"]);

        let events = read_events(&events_path)?;
        let failed = events
            .iter()
            .find(|event| event["type"] == json!("round_failed"))
            .ok_or_else(|| anyhow::anyhow!("round_failed event expected"))?;
        assert_eq!(failed["provider"], json!("offline"));
        assert_eq!(failed["requested"], json!([1, 2]));
        assert!(failed["fault"]
            .as_str()
            .is_some_and(|fault| fault.contains("service unavailable")));

        let log: Value = serde_json::from_str(&fs::read_to_string(&outcome.log_path)?)?;
        assert_eq!(log["slides"][1]["provider"], json!("dryrun"));
        assert_eq!(log["slides"][1]["attempts"], json!(2));
        Ok(())
    }

    #[test]
    fn optimizing_without_glm_plans_from_the_original_brief() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let out_dir = temp.path().join("optimized");
        let mut job = DeckJob::new(&out_dir, out_dir.join("events.jsonl"), config(temp.path())?)?;
        let mut request = small_request("Edge caching", 2);
        request.optimize_content = true;
        let outcome = job.generate(&request)?;
        assert!(outcome.is_complete());

        let plan: Value = serde_json::from_str(&fs::read_to_string(&outcome.plan_path)?)?;
        assert_eq!(plan["title"], json!("Edge caching"));
        Ok(())
    }

    #[test]
    fn zero_pages_produce_an_empty_deck() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let out_dir = temp.path().join("empty");
        let mut job = DeckJob::new(&out_dir, out_dir.join("events.jsonl"), config(temp.path())?)?;
        let outcome = job.generate(&small_request("Nothing", 0))?;
        assert_eq!(outcome.stop, StopReason::EmptyBatch);
        assert!(outcome.images.is_empty());
        assert!(outcome.viewer_path.is_file());
        Ok(())
    }

    #[test]
    fn helpers_produce_stable_names() {
        assert_eq!(file_safe("summary"), "summary");
        assert_eq!(file_safe("case study/2"), "case_study_2");
        assert_eq!(file_safe(""), "slide");
        assert_eq!(short_id("prompt", 0), short_id("prompt", 0));
        assert_ne!(short_id("prompt", 0), short_id("prompt", 1));
        assert_eq!(short_id("prompt", 0).len(), 8);
    }
}
