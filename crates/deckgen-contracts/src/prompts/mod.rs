mod composer;
mod slides;

pub use composer::{
    compose, compose_simple, enhance_with_style, DEFAULT_STYLE, QUALITY_REQUIREMENTS,
};
pub use slides::{slide_prompt, slide_prompts};
