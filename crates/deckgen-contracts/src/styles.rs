use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const DEFAULT_STYLE_NAME: &str = "default";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub name: String,
    pub description: String,
    /// Page type (lowercased `## Heading`) to prompt template.
    pub templates: IndexMap<String, String>,
}

impl Style {
    pub fn template(&self, page_type: &str) -> Option<&str> {
        self.templates
            .get(&page_type.trim().to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_STYLE_NAME
    }

    pub fn builtin_default() -> Self {
        let mut templates = IndexMap::new();
        templates.insert(
            "cover".to_string(),
            "Create a professional presentation cover with title: {content}. Style: Modern, clean, professional.".to_string(),
        );
        templates.insert(
            "content".to_string(),
            "Create a professional presentation content page with: {content}. Style: Clean, readable, professional.".to_string(),
        );
        templates.insert(
            "data".to_string(),
            "Create a professional presentation data page with: {content}. Style: Clear data visualization.".to_string(),
        );
        templates.insert(
            "summary".to_string(),
            "Create a professional presentation summary page with: {content}. Style: Clean, impactful conclusion.".to_string(),
        );
        Self {
            name: DEFAULT_STYLE_NAME.to_string(),
            description: "Default professional style".to_string(),
            templates,
        }
    }

    /// Parses a style markdown file. Every `## Heading` opens a template keyed by the
    /// lowercased heading; its non-blank lines form the template body.
    pub fn parse(name: &str, markdown: &str) -> Self {
        let mut templates = IndexMap::new();
        let mut description_lines = Vec::new();
        let mut section: Option<String> = None;
        let mut body: Vec<&str> = Vec::new();

        for line in markdown.lines() {
            if let Some(heading) = line.strip_prefix("## ") {
                if let Some(key) = section.take() {
                    if !body.is_empty() {
                        templates.insert(key, body.join("\n"));
                    }
                }
                section = Some(heading.trim().to_ascii_lowercase());
                body.clear();
                continue;
            }
            if line.trim().is_empty() {
                continue;
            }
            if section.is_some() {
                body.push(line);
            } else if !line.starts_with('#') {
                description_lines.push(line.trim());
            }
        }
        if let Some(key) = section {
            if !body.is_empty() {
                templates.insert(key, body.join("\n"));
            }
        }

        Self {
            name: name.to_string(),
            description: description_lines.join(" "),
            templates,
        }
    }
}

/// Loads style files from one directory and keeps parsed styles for the catalog's lifetime.
#[derive(Debug, Clone)]
pub struct StyleCatalog {
    dir: PathBuf,
    cache: HashMap<String, Style>,
}

impl StyleCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: HashMap::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the named style, or the built-in default when `<dir>/<name>.md` is missing or
    /// unreadable. Only successfully parsed files are cached.
    pub fn load(&mut self, name: &str) -> Style {
        if let Some(style) = self.cache.get(name) {
            return style.clone();
        }
        let path = self.dir.join(format!("{name}.md"));
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(
                    style = name,
                    path = %path.display(),
                    "style unavailable, using default: {err}"
                );
                return Style::builtin_default();
            }
        };
        let style = Style::parse(name, &raw);
        self.cache.insert(name.to_string(), style.clone());
        style
    }

    pub fn is_cached(&self, name: &str) -> bool {
        self.cache.contains_key(name)
    }

    pub fn list(&self) -> Vec<String> {
        let mut names = std::fs::read_dir(&self.dir)
            .map(|entries| {
                entries
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.path())
                    .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("md"))
                    .filter_map(|path| {
                        path.file_stem()
                            .and_then(|stem| stem.to_str())
                            .map(str::to_string)
                    })
                    .collect::<Vec<String>>()
            })
            .unwrap_or_default();
        if names.is_empty() {
            return vec![DEFAULT_STYLE_NAME.to_string()];
        }
        names.sort();
        names
    }
}
