use ab_glyph::FontArc;
use anyhow::Context;
use log::{debug, warn};

// DejaVu faces shipped with the binary so font resolution always succeeds,
// even on hosts with no usable system fonts (e.g. minimal CI images).
const BUILTIN_REGULAR: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");
const BUILTIN_BOLD: &[u8] = include_bytes!("../assets/fonts/DejaVuSans-Bold.ttf");

const REGULAR_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf", // Linux (CI)
    "/System/Library/Fonts/Supplemental/Arial.ttf",    // macOS
];
const BOLD_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
];

pub(crate) struct FontSet {
    pub regular: FontArc,
    pub bold: FontArc,
}

/// Ordered-candidate font lookup: first readable, parseable path wins,
/// otherwise the embedded face. Always yields a usable handle.
fn resolve(candidates: &[&str], builtin: &'static [u8]) -> anyhow::Result<FontArc> {
    for path in candidates {
        let Ok(data) = std::fs::read(path) else {
            continue;
        };
        match FontArc::try_from_vec(data) {
            Ok(font) => {
                debug!("Using font {path}");
                return Ok(font);
            }
            Err(_) => warn!("Unreadable font data in {path}, trying next candidate"),
        }
    }
    debug!("No system font candidate found, using embedded DejaVu");
    FontArc::try_from_slice(builtin).context("embedded fallback font failed to parse")
}

pub(crate) fn load_fonts() -> anyhow::Result<FontSet> {
    Ok(FontSet {
        regular: resolve(REGULAR_CANDIDATES, BUILTIN_REGULAR)?,
        bold: resolve(BOLD_CANDIDATES, BUILTIN_BOLD)?,
    })
}
