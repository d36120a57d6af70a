use deckgen_contracts::plan::{SlidePlan, SlideSpec};
use deckgen_contracts::transitions::Transition;

use crate::providers::GlmChat;

const PLAN_TEMPERATURE: f64 = 0.7;
const TRANSITION_TEMPERATURE: f64 = 0.7;
const OPTIMIZE_TEMPERATURE: f64 = 0.3;
pub const DEFAULT_POINT_MAX_CHARS: usize = 50;

/// Deck planning and transition copy via GLM chat. Every failure degrades to a local
/// default, so callers never see an error from here.
#[derive(Clone, Default)]
pub struct GlmPlanner {
    chat: Option<GlmChat>,
}

impl GlmPlanner {
    pub fn new(chat: Option<GlmChat>) -> Self {
        Self { chat }
    }

    pub fn is_configured(&self) -> bool {
        self.chat.is_some()
    }

    pub fn plan(&self, topic: &str, page_count: usize) -> SlidePlan {
        let Some(chat) = self.chat.as_ref() else {
            return SlidePlan::default_for(topic, page_count);
        };
        match chat.complete(&plan_prompt(topic, page_count), PLAN_TEMPERATURE) {
            Ok(text) => {
                let plan = SlidePlan::parse_response(&text).normalized(topic);
                if plan.is_empty() {
                    tracing::warn!("planner answer held no slides, using default plan");
                    return SlidePlan::default_for(topic, page_count);
                }
                tracing::info!(model = chat.model(), slides = plan.len(), "deck plan created");
                plan
            }
            Err(err) => {
                tracing::warn!("planning failed, using default plan: {err:#}");
                SlidePlan::default_for(topic, page_count)
            }
        }
    }

    /// Rewrites a brief into concise, presentation-ready points. Returns `content`
    /// unchanged when GLM is not configured or the call fails.
    pub fn optimize_content(&self, content: &str, max_chars_per_point: usize) -> String {
        let Some(chat) = self.chat.as_ref() else {
            return content.to_string();
        };
        match chat.complete(
            &optimize_prompt(content, max_chars_per_point),
            OPTIMIZE_TEMPERATURE,
        ) {
            Ok(text) => {
                tracing::info!(
                    before = content.chars().count(),
                    after = text.chars().count(),
                    "content optimized"
                );
                text
            }
            Err(err) => {
                tracing::warn!("content optimization failed, keeping original: {err:#}");
                content.to_string()
            }
        }
    }

    /// One transition per consecutive pair in `slides`; empty when GLM is not configured.
    pub fn transitions(&self, slides: &[&SlideSpec]) -> Vec<Transition> {
        let Some(chat) = self.chat.as_ref() else {
            return Vec::new();
        };
        slides
            .windows(2)
            .map(|pair| {
                match chat.complete(&transition_prompt(pair[0], pair[1]), TRANSITION_TEMPERATURE) {
                    Ok(text) => Transition::from_description(&text),
                    Err(err) => {
                        tracing::warn!("transition generation failed, using fade: {err:#}");
                        Transition::fade()
                    }
                }
            })
            .collect()
    }
}

fn plan_prompt(topic: &str, page_count: usize) -> String {
    format!(
        "Plan a presentation of exactly {page_count} slides about the following content:

{topic}

Answer with JSON only, in this shape:
{{
  \"title\": \"deck title\",
  \"total_slides\": {page_count},
  \"slides\": [
    {{\"page_type\": \"cover\", \"content\": \"title and subtitle\"}},
    {{\"page_type\": \"content\", \"content\": \"key point\"}},
    {{\"page_type\": \"summary\", \"content\": \"closing message\"}}
  ]
}}

page_type is one of cover, content, data, summary. Start with a cover and end with a summary."
    )
}

fn optimize_prompt(content: &str, max_chars_per_point: usize) -> String {
    format!(
        "You are a professional presentation content editor. Rewrite this content for slides:

{content}

Requirements:
1. Concise, at most {max_chars_per_point} characters per point
2. Clear hierarchy
3. Keep the core information
4. Suitable for speaking to an audience

Answer with the rewritten content only."
    )
}

fn transition_prompt(from: &SlideSpec, to: &SlideSpec) -> String {
    format!(
        "Describe in two or three sentences a smooth visual transition between two presentation slides.

From ({from_type}): {from_content}
To ({to_type}): {to_content}

Mention the motion, the duration and which visual elements carry over.",
        from_type = from.page_type,
        from_content = from.content,
        to_type = to.page_type,
        to_content = to.content,
    )
}
