use serde::{Deserialize, Serialize};

/// Describes how one slide hands over to the next in the viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub transition_type: String,
    pub duration: String,
    pub description: String,
    #[serde(default)]
    pub key_elements: Vec<String>,
    pub color_consistency: String,
}

impl Transition {
    pub fn fade() -> Self {
        Self {
            transition_type: "fade".to_string(),
            duration: "1.5".to_string(),
            description: "Fade transition effect".to_string(),
            key_elements: vec!["fade out".to_string(), "fade in".to_string()],
            color_consistency: "auto".to_string(),
        }
    }

    /// Wraps a model's free-text answer; the text is kept verbatim as the description.
    pub fn from_description(text: &str) -> Self {
        let description = text.trim();
        if description.is_empty() {
            return Self::fade();
        }
        Self {
            transition_type: "fade".to_string(),
            duration: "2.0".to_string(),
            description: description.to_string(),
            key_elements: Vec::new(),
            color_consistency: "auto".to_string(),
        }
    }
}
