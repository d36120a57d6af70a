pub const DEFAULT_ASPECT_RATIO: &str = "16:9";
pub const DEFAULT_RESOLUTION: &str = "2K";
pub const DEFAULT_SIZE: &str = "1344x768";

/// `(aspect_ratio, resolution_tier) -> WIDTHxHEIGHT`.
const SIZE_TABLE: [((&str, &str), &str); 7] = [
    (("16:9", "2K"), "1344x768"),
    (("16:9", "1080p"), "1024x576"),
    (("16:9", "4K"), "2048x1152"),
    (("4:3", "2K"), "1024x768"),
    (("4:3", "1080p"), "768x576"),
    (("1:1", "2K"), "768x768"),
    (("1:1", "1080p"), "512x512"),
];

/// Maps a semantic aspect ratio and resolution tier to a provider-agnostic pixel size.
///
/// Keys are matched exactly. Anything outside the table resolves to [`DEFAULT_SIZE`] so an
/// odd request degrades to a usable size instead of failing the batch.
pub fn size_for(aspect_ratio: &str, resolution: &str) -> &'static str {
    SIZE_TABLE
        .iter()
        .find(|((ratio, tier), _)| *ratio == aspect_ratio && *tier == resolution)
        .map(|(_, size)| *size)
        .unwrap_or(DEFAULT_SIZE)
}

pub fn supported_pairs() -> impl Iterator<Item = (&'static str, &'static str, &'static str)> {
    SIZE_TABLE
        .iter()
        .map(|((ratio, tier), size)| (*ratio, *tier, *size))
}

pub fn parse_dims(size: &str) -> (u32, u32) {
    let raw = size.trim().to_ascii_lowercase();
    if let Some((w, h)) = raw.split_once('x') {
        let width = w.trim().parse::<u32>().unwrap_or(1344);
        let height = h.trim().parse::<u32>().unwrap_or(768);
        return (width.max(1), height.max(1));
    }
    parse_dims(DEFAULT_SIZE)
}
