//! Emitter: page list → flat styled HTML.
//!
//! Each page becomes one fixed-size container holding absolutely positioned
//! layer elements. Pages are joined by [`PAGE_BREAK`]. The output is what the
//! public reader injects as raw HTML, so every user-influenced value is
//! escaped before interpolation.

use crate::model::*;
use std::borrow::Cow;
use std::fmt::Write;

/// Marker element separating pages in emitted content.
pub const PAGE_BREAK: &str = r#"<div class="page-break"></div>"#;

pub const PAGE_CLASS: &str = "mag-page";
pub const LAYER_CLASS: &str = "mag-layer";
pub const IMAGE_CLASS: &str = "mag-image";

/// Emit every page, joined by page-break markers.
#[must_use]
pub fn emit_content(pages: &[Page]) -> String {
    let mut out = String::with_capacity(512 * pages.len().max(1));
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            out.push('\n');
            out.push_str(PAGE_BREAK);
            out.push('\n');
        }
        emit_page(&mut out, page);
    }
    out
}

/// Emit one page container. A page without layers still produces a
/// complete (empty) container so page count survives a round-trip.
pub fn emit_page(out: &mut String, page: &Page) {
    let _ = writeln!(
        out,
        r#"<div class="{PAGE_CLASS}" data-page-id="{}" style="position:relative;width:{}px;height:{}px;overflow:hidden;background-color:{}">"#,
        page.id,
        format_num(PAGE_WIDTH),
        format_num(PAGE_HEIGHT),
        page.background_color.to_hex(),
    );
    for layer in &page.layers {
        emit_layer(out, layer);
    }
    for image in &page.images {
        emit_image(out, image);
    }
    out.push_str("</div>");
}

fn emit_layer(out: &mut String, layer: &TextLayer) {
    let _ = writeln!(
        out,
        r#"  <div class="{LAYER_CLASS}" data-layer-id="{}" style="position:absolute;left:{}px;top:{}px;color:{};font-family:{};font-weight:{};font-style:{};font-size:{}px;text-align:{};white-space:pre-wrap;margin:0">{}</div>"#,
        layer.id,
        format_num(layer.x),
        format_num(layer.y),
        layer.color.to_hex(),
        escape_html(&sanitize_font_family(&layer.font_family)),
        layer.font_weight(),
        if layer.italic { "italic" } else { "normal" },
        format_num(layer.font_size),
        layer.align.as_css(),
        escape_html(&layer.text),
    );
}

fn emit_image(out: &mut String, image: &ImageLayer) {
    let _ = writeln!(
        out,
        r#"  <img class="{IMAGE_CLASS}" data-layer-id="{}" src="{}" alt="" style="position:absolute;left:{}px;top:{}px;width:{}px;height:{}px" />"#,
        image.id,
        escape_html(&image.src),
        format_num(image.x),
        format_num(image.y),
        format_num(image.width),
        format_num(image.height),
    );
}

/// Escape `& < > " '` so the value is safe in both text and quoted
/// attribute position.
pub fn escape_html(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Shortest text that parses back to the same `f32`; whole numbers drop
/// the fractional part.
fn format_num(n: f32) -> String {
    if n == 0.0 {
        // normalizes -0
        return "0".to_string();
    }
    format!("{n}")
}
