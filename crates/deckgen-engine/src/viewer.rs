use serde::Serialize;

const VIEWER_TEMPLATE: &str = include_str!("../resources/viewer.html");

/// A saved slide as listed in the viewer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewerSlide {
    pub number: usize,
    /// Path relative to the viewer file.
    pub image: String,
    #[serde(rename = "type")]
    pub page_type: String,
    pub content: String,
}

pub fn render_viewer(title: &str, slides: &[ViewerSlide]) -> anyhow::Result<String> {
    let data = serde_json::to_string(slides)?.replace("</", "<\\/");
    let title = if title.trim().is_empty() {
        "Presentation"
    } else {
        title
    };
    let total = slides.len().to_string();
    let title = escape_html(title);
    Ok(fill_placeholders(VIEWER_TEMPLATE, |name| match name {
        "SLIDES_DATA" => Some(data.as_str()),
        "TOTAL_SLIDES" => Some(total.as_str()),
        "TITLE" => Some(title.as_str()),
        _ => None,
    }))
}

/// Single pass over `template`; inserted values are never scanned again.
fn fill_placeholders<'a>(template: &str, value_for: impl Fn(&str) -> Option<&'a str>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after
            .find("}}")
            .and_then(|end| value_for(&after[..end]).map(|value| (end, value)))
        {
            Some((end, value)) => {
                out.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{render_viewer, ViewerSlide};

    #[test]
    fn placeholders_are_filled() -> anyhow::Result<()> {
        let slides = vec![
            ViewerSlide {
                number: 1,
                image: "images/slide_01_cover.png".to_string(),
                page_type: "cover".to_string(),
                content: "Intro".to_string(),
            },
            ViewerSlide {
                number: 3,
                image: "images/slide_03_summary.png".to_string(),
                page_type: "summary".to_string(),
                content: "</script> wrap-up".to_string(),
            },
        ];
        let html = render_viewer("Q3 <Review>", &slides)?;
        assert!(!html.contains("{{"));
        assert!(html.contains("<title>Q3 &lt;Review&gt;</title>"));
        assert!(html.contains("0 / 2"));
        assert!(html.contains("\"image\":\"images/slide_03_summary.png\""));
        assert!(html.contains("\"type\":\"summary\""));
        assert!(html.contains("<\\/script> wrap-up"));
        Ok(())
    }

    #[test]
    fn placeholder_text_in_slide_content_is_kept_verbatim() -> anyhow::Result<()> {
        let slides = vec![ViewerSlide {
            number: 1,
            image: "images/slide_01_cover.png".to_string(),
            page_type: "cover".to_string(),
            content: "Agenda {{TOTAL_SLIDES}} and {{TITLE}}".to_string(),
        }];
        let html = render_viewer("Deck", &slides)?;
        assert!(html.contains("Agenda {{TOTAL_SLIDES}} and {{TITLE}}"));
        assert!(!html.contains("Agenda 1 and Deck"));
        assert!(html.contains("<title>Deck</title>"));
        Ok(())
    }

    #[test]
    fn empty_deck_still_renders() -> anyhow::Result<()> {
        let html = render_viewer("", &[])?;
        assert!(html.contains("const slides = [];"));
        assert!(html.contains("<title>Presentation</title>"));
        Ok(())
    }
}
