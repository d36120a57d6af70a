use crate::plan::{PageType, SlidePlan, SlideSpec};
use crate::styles::Style;

/// One prompt per slide, in plan order.
pub fn slide_prompts(plan: &SlidePlan, style: &Style, resolution: &str) -> Vec<String> {
    plan.slides
        .iter()
        .map(|slide| slide_prompt(slide, style, resolution))
        .collect()
}

pub fn slide_prompt(slide: &SlideSpec, style: &Style, resolution: &str) -> String {
    match style.template(slide.page_type.as_str()) {
        Some(template) => template
            .replace("{content}", &slide.content)
            .replace("{resolution}", resolution),
        None => default_slide_prompt(&slide.page_type, &slide.content, resolution),
    }
}

fn default_slide_prompt(page_type: &PageType, content: &str, resolution: &str) -> String {
    match page_type {
        PageType::Cover => format!(
            "Create a professional presentation cover page with:

TITLE: {content}

Style Requirements:
- Modern, professional design
- Clean typography with large, bold title
- High-quality visual aesthetic
- 16:9 aspect ratio
- Resolution: {resolution}

Design Elements:
- Centered composition
- Strong visual hierarchy
- Eye-catching but professional
- Suitable for business or academic presentation"
        ),
        PageType::Content => format!(
            "Create a professional presentation content page with:

CONTENT: {content}

Style Requirements:
- Clean, readable layout
- Good visual hierarchy
- Professional design
- 16:9 aspect ratio
- Resolution: {resolution}

Layout:
- Content organized in clear sections
- Good spacing and readability
- Professional typography
- Suitable for presentation"
        ),
        PageType::Summary => format!(
            "Create a professional presentation summary page with:

CONTENT: {content}

Style Requirements:
- Clean, impactful conclusion
- Professional design
- 16:9 aspect ratio
- Resolution: {resolution}

Layout:
- Centered content
- Clear conclusion or call-to-action
- Professional and memorable"
        ),
        PageType::Data | PageType::Other(_) => format!(
            "Create a professional presentation slide with: {content}

Style: Professional, modern, clean design
Aspect Ratio: 16:9
Resolution: {resolution}"
        ),
    }
}
