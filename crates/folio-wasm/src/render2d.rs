//! Canvas2D overlay renderer.
//!
//! Draws editing aids over one page: the snap grid, center and margin
//! guides, and the footprint of a layer being dragged. The page content
//! itself is DOM; this canvas sits on top of it with pointer events
//! disabled.

use folio_core::{LAYER_MIN_HEIGHT, LAYER_MIN_WIDTH};
use folio_editor::GridLines;
use web_sys::CanvasRenderingContext2d;

/// Theme-dependent colors for the overlay.
pub struct OverlayTheme {
    pub grid: &'static str,
    pub guide: &'static str,
    pub drag_fill: &'static str,
    pub drag_stroke: &'static str,
}

impl OverlayTheme {
    /// Light theme for paper-colored pages.
    pub fn light() -> Self {
        Self {
            grid: "rgba(59, 42, 26, 0.10)",
            guide: "rgba(217, 70, 239, 0.55)",
            drag_fill: "rgba(79, 195, 247, 0.08)",
            drag_stroke: "#4FC3F7",
        }
    }

    /// Dark theme for dark page backgrounds.
    pub fn dark() -> Self {
        Self {
            grid: "rgba(255, 255, 255, 0.08)",
            guide: "rgba(240, 171, 252, 0.6)",
            drag_fill: "rgba(79, 195, 247, 0.12)",
            drag_stroke: "#81D4FA",
        }
    }
}

/// What to draw on top of a page.
pub struct Overlay<'a> {
    pub grid: Option<&'a GridLines>,
    pub guides: bool,
    /// Margin inset for the guide box, in page px.
    pub margin: f32,
    /// Origin of the layer being dragged.
    pub drag_origin: Option<(f32, f32)>,
}

/// Render the overlay for a page of `width` x `height` px.
pub fn render_overlay(
    ctx: &CanvasRenderingContext2d,
    width: f64,
    height: f64,
    overlay: &Overlay<'_>,
    theme: &OverlayTheme,
) {
    ctx.clear_rect(0.0, 0.0, width, height);

    if let Some(lines) = overlay.grid {
        draw_grid(ctx, lines, width, height, theme);
    }
    if overlay.guides {
        draw_guides(ctx, width, height, overlay.margin as f64, theme);
    }
    if let Some((x, y)) = overlay.drag_origin {
        draw_drag_footprint(ctx, x as f64, y as f64, theme);
    }
}

fn draw_grid(
    ctx: &CanvasRenderingContext2d,
    lines: &GridLines,
    width: f64,
    height: f64,
    theme: &OverlayTheme,
) {
    ctx.save();
    ctx.set_stroke_style_str(theme.grid);
    ctx.set_line_width(1.0);
    ctx.begin_path();
    // Half-pixel offset keeps 1px lines crisp.
    for x in &lines.vertical {
        let x = (*x as f64).floor() + 0.5;
        ctx.move_to(x, 0.0);
        ctx.line_to(x, height);
    }
    for y in &lines.horizontal {
        let y = (*y as f64).floor() + 0.5;
        ctx.move_to(0.0, y);
        ctx.line_to(width, y);
    }
    ctx.stroke();
    ctx.restore();
}

fn draw_guides(
    ctx: &CanvasRenderingContext2d,
    width: f64,
    height: f64,
    margin: f64,
    theme: &OverlayTheme,
) {
    ctx.save();
    ctx.set_stroke_style_str(theme.guide);
    ctx.set_line_width(1.0);
    let _ = ctx.set_line_dash(&js_sys::Array::of2(
        &wasm_bindgen::JsValue::from_f64(6.0),
        &wasm_bindgen::JsValue::from_f64(4.0),
    ));

    ctx.begin_path();
    let cx = (width / 2.0).floor() + 0.5;
    let cy = (height / 2.0).floor() + 0.5;
    ctx.move_to(cx, 0.0);
    ctx.line_to(cx, height);
    ctx.move_to(0.0, cy);
    ctx.line_to(width, cy);
    ctx.stroke();

    if margin > 0.0 && margin * 2.0 < width.min(height) {
        ctx.stroke_rect(
            margin + 0.5,
            margin + 0.5,
            width - margin * 2.0 - 1.0,
            height - margin * 2.0 - 1.0,
        );
    }
    ctx.restore();
}

/// Minimum footprint of the dragged layer at its current origin.
fn draw_drag_footprint(ctx: &CanvasRenderingContext2d, x: f64, y: f64, theme: &OverlayTheme) {
    let (w, h) = (LAYER_MIN_WIDTH as f64, LAYER_MIN_HEIGHT as f64);
    ctx.save();

    ctx.set_fill_style_str(theme.drag_fill);
    ctx.fill_rect(x, y, w, h);

    ctx.set_stroke_style_str(theme.drag_stroke);
    ctx.set_line_width(1.0);
    let _ = ctx.set_line_dash(&js_sys::Array::of2(
        &wasm_bindgen::JsValue::from_f64(4.0),
        &wasm_bindgen::JsValue::from_f64(4.0),
    ));
    ctx.stroke_rect(x, y, w, h);

    ctx.restore();
}
