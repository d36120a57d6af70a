use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

const TITLE_MAX_CHARS: usize = 50;
const LINE_CONTENT_MAX_CHARS: usize = 100;
const LINE_PLAN_MAX_SLIDES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PageType {
    Cover,
    #[default]
    Content,
    Data,
    Summary,
    Other(String),
}

impl PageType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Cover => "cover",
            Self::Content => "content",
            Self::Data => "data",
            Self::Summary => "summary",
            Self::Other(raw) => raw.as_str(),
        }
    }
}

impl From<String> for PageType {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "cover" => Self::Cover,
            "content" => Self::Content,
            "data" => Self::Data,
            "summary" => Self::Summary,
            "" => Self::Content,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<PageType> for String {
    fn from(value: PageType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideSpec {
    #[serde(default)]
    pub page_type: PageType,
    #[serde(default)]
    pub content: String,
}

impl SlideSpec {
    pub fn new(page_type: PageType, content: impl Into<String>) -> Self {
        Self {
            page_type,
            content: content.into(),
        }
    }
}

/// Ordered content plan for a deck. Slide order is the output slot order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlidePlan {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub total_slides: usize,
    #[serde(default)]
    pub slides: Vec<SlideSpec>,
}

impl SlidePlan {
    /// Cover, `page_count - 2` numbered points, summary.
    pub fn default_for(topic: &str, page_count: usize) -> Self {
        let mut slides = Vec::with_capacity(page_count);
        if page_count > 0 {
            slides.push(SlideSpec::new(PageType::Cover, topic));
        }
        for idx in 0..page_count.saturating_sub(2) {
            slides.push(SlideSpec::new(
                PageType::Content,
                format!("Point {} about {topic}", idx + 1),
            ));
        }
        if page_count >= 2 {
            slides.push(SlideSpec::new(PageType::Summary, format!("{topic} Summary")));
        }
        Self {
            title: truncate_chars(topic, TITLE_MAX_CHARS),
            total_slides: slides.len(),
            slides,
        }
    }

    /// Reads a plan out of free-form model output.
    ///
    /// The first embedded JSON object carrying a `slides` key wins. Without one, non-empty
    /// lines become slides: the first is the cover, the rest content, capped at five.
    pub fn parse_response(text: &str) -> Self {
        if let Some(plan) = first_plan_object(text) {
            return plan.normalized("");
        }

        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let slides = lines
            .iter()
            .take(LINE_PLAN_MAX_SLIDES)
            .enumerate()
            .map(|(idx, line)| {
                let page_type = if idx == 0 {
                    PageType::Cover
                } else {
                    PageType::Content
                };
                SlideSpec::new(page_type, truncate_chars(line, LINE_CONTENT_MAX_CHARS))
            })
            .collect::<Vec<SlideSpec>>();
        let title = lines
            .first()
            .map(|line| truncate_chars(line, TITLE_MAX_CHARS))
            .unwrap_or_else(|| "Presentation".to_string());
        Self {
            title,
            total_slides: slides.len(),
            slides,
        }
    }

    /// Fills a blank title from `topic` and recounts slides.
    pub fn normalized(mut self, topic: &str) -> Self {
        if self.title.trim().is_empty() {
            self.title = if topic.trim().is_empty() {
                "Presentation".to_string()
            } else {
                truncate_chars(topic, TITLE_MAX_CHARS)
            };
        }
        self.total_slides = self.slides.len();
        self
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

fn first_plan_object(text: &str) -> Option<SlidePlan> {
    for (start, _) in text.match_indices('{') {
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        let Some(Ok(value)) = stream.next() else {
            continue;
        };
        if value.get("slides").and_then(Value::as_array).is_none() {
            continue;
        }
        if let Ok(plan) = serde_json::from_value::<SlidePlan>(value) {
            return Some(plan);
        }
    }
    None
}

pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{PageType, SlidePlan, SlideSpec};

    #[test]
    fn default_plan_brackets_points_with_cover_and_summary() {
        let plan = SlidePlan::default_for("Rust adoption", 5);
        assert_eq!(plan.total_slides, 5);
        assert_eq!(plan.slides[0], SlideSpec::new(PageType::Cover, "Rust adoption"));
        assert_eq!(plan.slides[1].content, "Point 1 about Rust adoption");
        assert_eq!(plan.slides[3].content, "Point 3 about Rust adoption");
        assert_eq!(
            plan.slides[4],
            SlideSpec::new(PageType::Summary, "Rust adoption Summary")
        );
    }

    #[test]
    fn default_plan_handles_tiny_page_counts() {
        assert!(SlidePlan::default_for("t", 0).is_empty());
        let single = SlidePlan::default_for("t", 1);
        assert_eq!(single.len(), 1);
        assert_eq!(single.slides[0].page_type, PageType::Cover);
        let pair = SlidePlan::default_for("t", 2);
        assert_eq!(pair.slides[1].page_type, PageType::Summary);
    }

    #[test]
    fn default_plan_truncates_long_titles() {
        let topic = "x".repeat(80);
        assert_eq!(SlidePlan::default_for(&topic, 3).title.chars().count(), 50);
    }

    #[test]
    fn parse_response_extracts_embedded_json() {
        let text = r#"Sure! Here is the plan:
```json
{"title": "Future of AI", "slides": [
  {"page_type": "cover", "content": "Future of AI"},
  {"page_type": "data", "content": "Adoption curve"}
]}
```"#;
        let plan = SlidePlan::parse_response(text);
        assert_eq!(plan.title, "Future of AI");
        assert_eq!(plan.total_slides, 2);
        assert_eq!(plan.slides[1].page_type, PageType::Data);
    }

    #[test]
    fn parse_response_skips_objects_without_slides() {
        let text = r#"{"note": "draft"} then {"title": "T", "slides": [{"content": "only"}]}"#;
        let plan = SlidePlan::parse_response(text);
        assert_eq!(plan.title, "T");
        assert_eq!(plan.slides[0].page_type, PageType::Content);
    }

    #[test]
    fn parse_response_falls_back_to_lines() {
        let text = "Opening line\n\nSecond\nThird\nFourth\nFifth\nSixth";
        let plan = SlidePlan::parse_response(text);
        assert_eq!(plan.len(), 5);
        assert_eq!(plan.title, "Opening line");
        assert_eq!(plan.slides[0].page_type, PageType::Cover);
        assert_eq!(plan.slides[4].content, "Fifth");
    }

    #[test]
    fn unknown_page_types_survive_serde() -> anyhow::Result<()> {
        let spec: SlideSpec =
            serde_json::from_value(json!({"page_type": "Timeline", "content": "c"}))?;
        assert_eq!(spec.page_type, PageType::Other("timeline".to_string()));
        assert_eq!(serde_json::to_value(&spec)?["page_type"], json!("timeline"));
        Ok(())
    }
}
