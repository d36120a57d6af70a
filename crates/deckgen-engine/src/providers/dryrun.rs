use std::io::Cursor;

use anyhow::{Context, Result};
use deckgen_contracts::payload::Payload;
use deckgen_contracts::providers::{GenerationParams, ProviderAdapter};
use deckgen_contracts::sizing::parse_dims;
use image::{ImageFormat, Rgb, RgbImage};
use sha2::{Digest, Sha256};

/// Offline adapter: a solid PNG at the mapped size, coloured by the prompt.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryrunAdapter;

impl ProviderAdapter for DryrunAdapter {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn generate_one(&self, prompt: &str, params: &GenerationParams) -> Result<Option<Payload>> {
        let (width, height) = parse_dims(params.size());
        let bytes = render_png(width, height, color_from_prompt(prompt))?;
        Ok(Payload::from_bytes(&bytes, Some("png")))
    }
}

fn render_png(width: u32, height: u32, (r, g, b): (u8, u8, u8)) -> Result<Vec<u8>> {
    let image = RgbImage::from_pixel(width, height, Rgb([r, g, b]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .context("failed to encode dryrun image")?;
    Ok(bytes)
}

fn color_from_prompt(prompt: &str) -> (u8, u8, u8) {
    let digest = Sha256::digest(prompt.as_bytes());
    (digest[0], digest[1], digest[2])
}

#[cfg(test)]
mod tests {
    use deckgen_contracts::providers::{GenerationParams, ProviderAdapter};

    use super::{color_from_prompt, DryrunAdapter};

    #[test]
    fn renders_png_at_mapped_size() -> anyhow::Result<()> {
        let params = GenerationParams::new("1:1", "1080p", "flat");
        let payload = DryrunAdapter
            .generate_one("hello", &params)?
            .ok_or_else(|| anyhow::anyhow!("dryrun must always produce an image"))?;
        assert_eq!(payload.format(), Some("png"));
        assert_eq!(payload.detected_format(), Some("png"));

        let decoded = image::load_from_memory(&payload.decode()?)?.to_rgb8();
        assert_eq!(decoded.dimensions(), (512, 512));
        let (r, g, b) = color_from_prompt("hello");
        assert_eq!(decoded.get_pixel(10, 10).0, [r, g, b]);
        Ok(())
    }

    #[test]
    fn colour_is_stable_per_prompt() {
        assert_eq!(color_from_prompt("same"), color_from_prompt("same"));
        assert_ne!(color_from_prompt("cover"), color_from_prompt("summary"));
    }
}
