use crate::sizing::{DEFAULT_ASPECT_RATIO, DEFAULT_RESOLUTION};

pub const DEFAULT_STYLE: &str = "realistic";

pub const QUALITY_REQUIREMENTS: &str = "Quality Requirements:
- High resolution, professional quality
- Excellent composition and balance
- Clear, readable text if any
- Appropriate color scheme
- Modern, clean design suitable for business presentation
- Good visual hierarchy and typography";

const SIMPLE_QUALITY_BLOCK: &str = "Create a high-quality, professional presentation slide with:
- Clean, modern design
- Excellent composition and balance
- Clear visual hierarchy
- Professional color scheme
- Suitable for business presentation
- 16:9 aspect ratio

Quality: High resolution, professional design, clean layout.";

/// Builds the structured provider prompt.
///
/// Line order is fixed: framing sentence, blank, style, aspect ratio, resolution, then the
/// quality block when requested. Blank parameters fall back to the crate defaults.
pub fn compose(
    base_text: &str,
    aspect_ratio: &str,
    resolution: &str,
    style: &str,
    include_quality_block: bool,
) -> String {
    let aspect_ratio = or_default(aspect_ratio, DEFAULT_ASPECT_RATIO);
    let resolution = or_default(resolution, DEFAULT_RESOLUTION);
    let style = or_default(style, DEFAULT_STYLE);

    let mut lines = vec![
        framing_line(base_text),
        String::new(),
        format!("Style: {style}"),
        format!("Aspect Ratio: {aspect_ratio}"),
        format!("Resolution: {resolution}"),
    ];
    if include_quality_block {
        lines.push(String::new());
        lines.push(QUALITY_REQUIREMENTS.to_string());
    }
    lines.join("\n")
}

/// Prompt for providers whose prompt channel is a single free-form message. Layout hints
/// are embedded in the quality description instead of separate lines.
pub fn compose_simple(base_text: &str) -> String {
    format!("{}\n\n{SIMPLE_QUALITY_BLOCK}", framing_line(base_text))
}

pub fn enhance_with_style(base_prompt: &str, style_description: &str) -> String {
    format!("{base_prompt}\n\nAdditional Style Requirements:\n{style_description}")
}

fn framing_line(base_text: &str) -> String {
    format!("Professional presentation slide: {base_text}")
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default
    } else {
        trimmed
    }
}
