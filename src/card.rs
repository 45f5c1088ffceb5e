use std::path::Path;

use ab_glyph::{point, Font, FontArc, GlyphId, PxScale, ScaleFont};
use anyhow::Context;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use log::{debug, warn};

use crate::fonts::FontSet;
use crate::layout::{layout_card, LayoutMetrics};
use crate::metadata::PostMeta;

const ACCENT_BAR_H: u32 = 4;
const PILL_RADIUS: i32 = 4;
const FOOTER_TEXT_GAP: i32 = 16;

/// Branding passed into the renderer explicitly, so tests can swap it out.
/// Defaults mirror the blog stylesheet palette.
#[derive(Debug, Clone)]
pub(crate) struct Brand {
    pub background: Rgb<u8>,
    pub title_color: Rgb<u8>,
    pub desc_color: Rgb<u8>,
    pub accent: Rgb<u8>,
    pub url_color: Rgb<u8>,
    pub author_name: String,
    pub site_url: String,
}

impl Default for Brand {
    fn default() -> Self {
        Self {
            background: Rgb([241, 245, 249]), // --grey-lighter
            title_color: Rgb([30, 41, 59]),   // --black
            desc_color: Rgb([100, 116, 139]), // --grey
            accent: Rgb([59, 130, 246]),      // --blue
            url_color: Rgb([148, 163, 184]),  // muted slate
            author_name: "Vlad Temian".to_string(),
            site_url: "blog.vtemian.com".to_string(),
        }
    }
}

/// Loads and resizes the author avatar. Absence or a decode failure both
/// yield `None`; the caller then renders the card without the footer row.
pub(crate) fn load_avatar(path: &Path, size: u32) -> Option<RgbImage> {
    if !path.exists() {
        debug!("Avatar {} not found, footer row will be omitted", path.display());
        return None;
    }
    match image::open(path) {
        Ok(img) => Some(imageops::resize(&img.to_rgb8(), size, size, FilterType::Lanczos3)),
        Err(e) => {
            warn!("Could not decode avatar {}: {e}", path.display());
            None
        }
    }
}

/// Rasterizes one card and writes it as a PNG to `out_path`.
///
/// The avatar gates the whole footer row (avatar, author name, site URL):
/// when it is `None` none of them are drawn, matching the long-standing
/// behaviour. The reading-time pill sits under the title and is always
/// present.
pub(crate) fn render_card(
    meta: &PostMeta,
    brand: &Brand,
    m: &LayoutMetrics,
    fonts: &FontSet,
    avatar: Option<&RgbImage>,
    out_path: &Path,
) -> anyhow::Result<()> {
    let layout = layout_card(m, &meta.title, &meta.description);
    let mut img = RgbImage::from_pixel(m.canvas_w, m.canvas_h, brand.background);

    // Top-edge accent bar.
    for y in 0..ACCENT_BAR_H.min(m.canvas_h) {
        for x in 0..m.canvas_w {
            img.put_pixel(x, y, brand.accent);
        }
    }

    for (i, line) in layout.title_lines.iter().enumerate() {
        let y = layout.title_y + i as i32 * (m.title_line_h() + m.title_gap);
        draw_text(&mut img, &fonts.bold, m.title_size, m.margin_x, y, brand.title_color, line);
    }

    let pill_text = format!("{} min read", meta.reading_time);
    let pill_w = text_width(&fonts.regular, m.meta_size, &pill_text) + 2 * m.pill_pad_x;
    draw_rounded_rect(
        &mut img,
        m.margin_x,
        layout.pill_y,
        pill_w,
        m.pill_h(),
        PILL_RADIUS,
        brand.accent,
    );
    draw_text(
        &mut img,
        &fonts.regular,
        m.meta_size,
        m.margin_x + m.pill_pad_x,
        layout.pill_y + m.pill_pad_y,
        Rgb([255, 255, 255]),
        &pill_text,
    );

    for (i, line) in layout.desc_lines.iter().enumerate() {
        let y = layout.desc_y + i as i32 * (m.desc_line_h() + m.desc_gap);
        draw_text(&mut img, &fonts.regular, m.desc_size, m.margin_x, y, brand.desc_color, line);
    }

    if let Some(avatar) = avatar {
        paste_circular(&mut img, avatar, m.margin_x, layout.footer_y);

        let avatar_h = m.avatar_size as i32;
        let name_y = layout.footer_y + (avatar_h - m.author_size.ceil() as i32) / 2;
        let url_y = layout.footer_y + (avatar_h - m.meta_line_h()) / 2;
        let mut x = m.margin_x + avatar_h + FOOTER_TEXT_GAP;
        x += draw_text(
            &mut img,
            &fonts.regular,
            m.author_size,
            x,
            name_y,
            brand.title_color,
            &brand.author_name,
        );
        x += draw_text(&mut img, &fonts.regular, m.meta_size, x, url_y, brand.desc_color, "  ·  ");
        draw_text(&mut img, &fonts.regular, m.meta_size, x, url_y, brand.url_color, &brand.site_url);
    }

    img.save(out_path)
        .with_context(|| format!("while writing {}", out_path.display()))?;
    Ok(())
}

/// Draws one line of text with its top edge at `y`, returning the horizontal
/// advance in pixels. Glyph coverage is alpha-blended onto the canvas.
fn draw_text(
    img: &mut RgbImage,
    font: &FontArc,
    size: f32,
    x: i32,
    y: i32,
    color: Rgb<u8>,
    text: &str,
) -> i32 {
    let scale = PxScale::from(size);
    let scaled = font.as_scaled(scale);
    let baseline = y as f32 + scaled.ascent();
    let mut caret = x as f32;
    let mut prev: Option<GlyphId> = None;

    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = prev {
            caret += scaled.kern(prev, id);
        }
        let glyph = id.with_scale_and_position(scale, point(caret, baseline));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px = bounds.min.x as i32 + gx as i32;
                let py = bounds.min.y as i32 + gy as i32;
                if px >= 0 && py >= 0 && (px as u32) < img.width() && (py as u32) < img.height() {
                    let pixel = img.get_pixel_mut(px as u32, py as u32);
                    *pixel = blend(*pixel, color, coverage);
                }
            });
        }
        caret += scaled.h_advance(id);
        prev = Some(id);
    }

    (caret - x as f32).round() as i32
}

/// Horizontal advance of `text` at `size`, including kerning.
fn text_width(font: &FontArc, size: f32, text: &str) -> i32 {
    let scaled = font.as_scaled(PxScale::from(size));
    let mut width = 0.0;
    let mut prev: Option<GlyphId> = None;
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = prev {
            width += scaled.kern(prev, id);
        }
        width += scaled.h_advance(id);
        prev = Some(id);
    }
    width.round() as i32
}

fn blend(under: Rgb<u8>, over: Rgb<u8>, alpha: f32) -> Rgb<u8> {
    let a = alpha.clamp(0.0, 1.0);
    let mix = |u: u8, o: u8| (o as f32 * a + u as f32 * (1.0 - a)).round() as u8;
    Rgb([
        mix(under.0[0], over.0[0]),
        mix(under.0[1], over.0[1]),
        mix(under.0[2], over.0[2]),
    ])
}

fn draw_rounded_rect(img: &mut RgbImage, x: i32, y: i32, w: i32, h: i32, radius: i32, color: Rgb<u8>) {
    for yy in y..y + h {
        for xx in x..x + w {
            if xx < 0 || yy < 0 || xx >= img.width() as i32 || yy >= img.height() as i32 {
                continue;
            }
            let dx = corner_distance(xx, x, w, radius);
            let dy = corner_distance(yy, y, h, radius);
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            img.put_pixel(xx as u32, yy as u32, color);
        }
    }
}

/// Distance from a coordinate to the nearest corner-circle center along one
/// axis; zero inside the straight-edged middle span.
fn corner_distance(v: i32, lo: i32, extent: i32, radius: i32) -> i32 {
    if v < lo + radius {
        lo + radius - v
    } else if v >= lo + extent - radius {
        v - (lo + extent - radius - 1)
    } else {
        0
    }
}

/// Pastes the avatar cropped to a circle; pixels outside the disc keep the
/// canvas background.
fn paste_circular(img: &mut RgbImage, avatar: &RgbImage, x: i32, y: i32) {
    let r = avatar.width() as f32 / 2.0;
    for (ax, ay, px) in avatar.enumerate_pixels() {
        let dx = ax as f32 + 0.5 - r;
        let dy = ay as f32 + 0.5 - r;
        if dx * dx + dy * dy > r * r {
            continue;
        }
        let tx = x + ax as i32;
        let ty = y + ay as i32;
        if tx >= 0 && ty >= 0 && (tx as u32) < img.width() && (ty as u32) < img.height() {
            img.put_pixel(tx as u32, ty as u32, *px);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::load_fonts;

    fn sample_meta() -> PostMeta {
        PostMeta {
            title: "Hello World".to_string(),
            description: "A short post".to_string(),
            reading_time: 2,
        }
    }

    #[test]
    fn renders_a_decodable_canvas_sized_png() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("og.png");
        let brand = Brand::default();
        let m = LayoutMetrics::default();
        let fonts = load_fonts().unwrap();

        render_card(&sample_meta(), &brand, &m, &fonts, None, &out).unwrap();

        let img = image::open(&out).unwrap().to_rgb8();
        assert_eq!((img.width(), img.height()), (m.canvas_w, m.canvas_h));
        // Accent bar along the top edge, plain background in the bottom-right
        // corner.
        assert_eq!(*img.get_pixel(0, 0), brand.accent);
        assert_eq!(
            *img.get_pixel(m.canvas_w - 1, m.canvas_h - 1),
            brand.background
        );
    }

    #[test]
    fn renders_with_avatar_footer() {
        let dir = tempfile::tempdir().unwrap();
        let avatar_path = dir.path().join("avatar.png");
        RgbImage::from_pixel(120, 120, Rgb([200, 60, 60]))
            .save(&avatar_path)
            .unwrap();

        let m = LayoutMetrics::default();
        let avatar = load_avatar(&avatar_path, m.avatar_size).unwrap();
        assert_eq!((avatar.width(), avatar.height()), (m.avatar_size, m.avatar_size));

        let out = dir.path().join("og.png");
        let fonts = load_fonts().unwrap();
        render_card(&sample_meta(), &Brand::default(), &m, &fonts, Some(&avatar), &out).unwrap();
        assert!(out.exists());
    }

    #[test]
    fn missing_avatar_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_avatar(&dir.path().join("nope.png"), 60).is_none());
    }

    #[test]
    fn undecodable_avatar_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("avatar.png");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(load_avatar(&path, 60).is_none());
    }
}
