use std::path::Path;

use ab_glyph::FontVec;

/// Common system locations for a basic sans-serif face, tried in order.
const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Environment variable that overrides font discovery with an explicit path.
const FONT_ENV_VAR: &str = "LENSLAB_FONT";

/// Typeface used for overlay text.
///
/// Discovered from common system locations at startup. When no font can be
/// found, overlay text is skipped and panels render as bare rectangles, so
/// the pipeline never fails over typography.
pub struct OverlayFont {
    font: FontVec,
}

impl OverlayFont {
    /// Tries the `LENSLAB_FONT` override first, then the system path list.
    pub fn discover() -> Option<Self> {
        if let Ok(path) = std::env::var(FONT_ENV_VAR) {
            if let Some(font) = Self::load(Path::new(&path)) {
                log::info!("loaded overlay font from {FONT_ENV_VAR}={path}");
                return Some(font);
            }
            log::warn!("{FONT_ENV_VAR}={path} did not load, falling back to system fonts");
        }
        for path in SYSTEM_FONT_PATHS {
            if let Some(font) = Self::load(Path::new(path)) {
                log::debug!("loaded overlay font from {path}");
                return Some(font);
            }
        }
        log::warn!("no overlay font found, text rendering disabled");
        None
    }

    /// Loads a TTF/OTF file, returning None on read or parse failure.
    pub fn load(path: &Path) -> Option<Self> {
        let data = std::fs::read(path).ok()?;
        let font = FontVec::try_from_vec(data).ok()?;
        Some(Self { font })
    }

    pub(crate) fn as_font(&self) -> &FontVec {
        &self.font
    }
}
