//! Core page/layer data model for Folio magazine documents.
//!
//! A document is an ordered list of fixed-size pages. Even indices are the
//! left side of a spread, odd indices the right. Each page carries a
//! background color and an ordered stack of absolutely positioned text
//! layers (plus image layers, which are carried but never edited here).
//!
//! The list is treated as a value: editors clone it, mutate the clone, and
//! compare with `==` to decide whether anything changed. Operations that
//! target a page or layer id which no longer exists are silent no-ops that
//! return `false`.

use crate::id::{IdAllocator, LayerId, PageId};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::ops::Deref;
use thiserror::Error;

// ─── Page geometry ───────────────────────────────────────────────────────

/// Canonical page width in px.
pub const PAGE_WIDTH: f32 = 560.0;
/// Canonical page height in px.
pub const PAGE_HEIGHT: f32 = 700.0;
/// Minimum layer footprint used when clamping positions.
pub const LAYER_MIN_WIDTH: f32 = 40.0;
pub const LAYER_MIN_HEIGHT: f32 = 24.0;
/// Grid spacing shared by the overlay renderer and snap-to-grid.
pub const GRID_UNIT: f32 = 24.0;
/// A document never has fewer pages than this.
pub const MIN_PAGES: usize = 2;

pub const MIN_FONT_SIZE: f32 = 1.0;
pub const MAX_FONT_SIZE: f32 = 256.0;

/// Clamp a proposed layer origin so the layer's minimum footprint stays
/// inside the page box. Non-finite input collapses to the page origin.
pub fn clamp_position(x: f32, y: f32) -> (f32, f32) {
    let x = if x.is_finite() { x } else { 0.0 };
    let y = if y.is_finite() { y } else { 0.0 };
    (
        x.clamp(0.0, PAGE_WIDTH - LAYER_MIN_WIDTH),
        y.clamp(0.0, PAGE_HEIGHT - LAYER_MIN_HEIGHT),
    )
}

// ─── Colors ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("invalid color `{0}`: expected #RGB or #RRGGBB")]
    Invalid(String),
}

/// Opaque RGB color. Serialized as a lowercase `#rrggbb` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Helper to parse a single hex digit.
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    /// Default ink for new text layers (dark brown).
    pub const INK: Color = Color::rgb(0x3b, 0x2a, 0x1a);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RGB` / `#RRGGBB` (leading `#` optional), or the keywords
    /// `white` and `black` that older records use for page backgrounds.
    pub fn parse(s: &str) -> Result<Self, ColorError> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("white") {
            return Ok(Self::WHITE);
        }
        if trimmed.eq_ignore_ascii_case("black") {
            return Ok(Self::BLACK);
        }
        Self::from_hex(trimmed).ok_or_else(|| ColorError::Invalid(s.to_string()))
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();

        match bytes.len() {
            3 => {
                let r = hex_val(bytes[0])?;
                let g = hex_val(bytes[1])?;
                let b = hex_val(bytes[2])?;
                Some(Self::rgb(r * 17, g * 17, b * 17))
            }
            6 => {
                let r = hex_val(bytes[0])? << 4 | hex_val(bytes[1])?;
                let g = hex_val(bytes[2])? << 4 | hex_val(bytes[3])?;
                let b = hex_val(bytes[4])? << 4 | hex_val(bytes[5])?;
                Some(Self::rgb(r, g, b))
            }
            _ => None,
        }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Color {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::parse(&value)
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_hex()
    }
}

// ─── Typography ──────────────────────────────────────────────────────────

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn as_css(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }

    pub fn from_css(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" | "end" => Some(Self::Right),
            _ => None,
        }
    }
}

/// Strip characters that would let a font family escape its CSS declaration.
pub fn sanitize_font_family(family: &str) -> String {
    let cleaned: String = family
        .chars()
        .filter(|c| !matches!(c, ';' | '{' | '}' | '<' | '>' | '\\') && !c.is_control())
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "serif".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Read a stored color, falling back to `fallback` when the string is not
/// one we understand (`transparent`, `rgb(...)`, named colors). One odd
/// value must not make the whole record unreadable.
fn color_or<'de, D>(deserializer: D, fallback: Color) -> Result<Color, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(Color::parse(&raw).unwrap_or_else(|e| {
        log::debug!("{e}; using {}", fallback.to_hex());
        fallback
    }))
}

fn background_or_white<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Color, D::Error> {
    color_or(deserializer, Color::WHITE)
}

fn ink_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Color, D::Error> {
    color_or(deserializer, Color::INK)
}

pub fn clamp_font_size(size: f32) -> f32 {
    if size.is_finite() {
        size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
    } else {
        TextLayer::DEFAULT_FONT_SIZE
    }
}

// ─── Layers ──────────────────────────────────────────────────────────────

/// A positioned, styled block of text on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLayer {
    pub id: LayerId,
    pub x: f32,
    pub y: f32,
    pub text: String,
    pub font_family: String,
    pub font_size: f32,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(deserialize_with = "ink_or_default")]
    pub color: Color,
    #[serde(default)]
    pub align: TextAlign,
}

impl TextLayer {
    pub const DEFAULT_TEXT: &'static str = "new text";
    pub const DEFAULT_FONT_FAMILY: &'static str = "serif";
    pub const DEFAULT_FONT_SIZE: f32 = 18.0;
    pub const DEFAULT_X: f32 = 40.0;
    pub const DEFAULT_Y: f32 = 40.0;

    /// A fresh layer as created by the "add text" action.
    pub fn new(id: LayerId) -> Self {
        Self {
            id,
            x: Self::DEFAULT_X,
            y: Self::DEFAULT_Y,
            text: Self::DEFAULT_TEXT.to_string(),
            font_family: Self::DEFAULT_FONT_FAMILY.to_string(),
            font_size: Self::DEFAULT_FONT_SIZE,
            bold: false,
            italic: false,
            color: Color::INK,
            align: TextAlign::Left,
        }
    }

    pub fn font_weight(&self) -> u16 {
        if self.bold { 700 } else { 400 }
    }

    /// Pull a stored layer back inside the rules an edit would enforce:
    /// origin inside the page box, font size 1–256, safe font family.
    pub fn normalize(&mut self) {
        (self.x, self.y) = clamp_position(self.x, self.y);
        self.font_size = clamp_font_size(self.font_size);
        self.font_family = sanitize_font_family(&self.font_family);
    }
}

/// An image placed on a page. Carried through load/save untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLayer {
    pub id: LayerId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub src: String,
}

/// Sparse update for a text layer. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<TextAlign>,
}

impl LayerPatch {
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge into `layer`. Positions are clamped to the page box, font size
    /// to 1–256, and font family is sanitized.
    pub fn apply_to(&self, layer: &mut TextLayer) {
        if self.x.is_some() || self.y.is_some() {
            let (x, y) = clamp_position(self.x.unwrap_or(layer.x), self.y.unwrap_or(layer.y));
            layer.x = x;
            layer.y = y;
        }
        if let Some(ref text) = self.text {
            layer.text.clone_from(text);
        }
        if let Some(ref family) = self.font_family {
            layer.font_family = sanitize_font_family(family);
        }
        if let Some(size) = self.font_size {
            layer.font_size = clamp_font_size(size);
        }
        if let Some(bold) = self.bold {
            layer.bold = bold;
        }
        if let Some(italic) = self.italic {
            layer.italic = italic;
        }
        if let Some(color) = self.color {
            layer.color = color;
        }
        if let Some(align) = self.align {
            layer.align = align;
        }
    }
}

// ─── Pages ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: PageId,
    #[serde(deserialize_with = "background_or_white")]
    pub background_color: Color,
    #[serde(default)]
    pub layers: Vec<TextLayer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageLayer>,
}

impl Page {
    pub fn blank(id: PageId) -> Self {
        Self {
            id,
            background_color: Color::WHITE,
            layers: Vec::new(),
            images: Vec::new(),
        }
    }

    pub fn layer(&self, id: LayerId) -> Option<&TextLayer> {
        self.layers.iter().find(|l| l.id == id)
    }

    fn layer_mut(&mut self, id: LayerId) -> Option<&mut TextLayer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }
}

/// Which half of a spread a page sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Left,
    Right,
}

impl Side {
    pub fn of_index(index: usize) -> Self {
        if index % 2 == 0 { Self::Left } else { Self::Right }
    }
}

/// The ordered page list of a document. Always holds at least
/// [`MIN_PAGES`] pages.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PageList(Vec<Page>);

impl PageList {
    /// Two blank pages: the state of a new document.
    pub fn blank(ids: &mut IdAllocator) -> Self {
        Self::from_pages(Vec::new(), ids)
    }

    /// Adopt hydrated pages, padding with blank pages up to the floor.
    /// Layers are normalized so stored data obeys the same bounds as edits.
    pub fn from_pages(mut pages: Vec<Page>, ids: &mut IdAllocator) -> Self {
        for layer in pages.iter_mut().flat_map(|p| p.layers.iter_mut()) {
            layer.normalize();
        }
        while pages.len() < MIN_PAGES {
            pages.push(Page::blank(ids.next_page_id()));
        }
        Self(pages)
    }

    pub fn as_slice(&self) -> &[Page] {
        &self.0
    }

    pub fn page(&self, id: PageId) -> Option<&Page> {
        self.0.iter().find(|p| p.id == id)
    }

    pub fn index_of(&self, id: PageId) -> Option<usize> {
        self.0.iter().position(|p| p.id == id)
    }

    pub fn layer(&self, page_id: PageId, layer_id: LayerId) -> Option<&TextLayer> {
        self.page(page_id).and_then(|p| p.layer(layer_id))
    }

    fn page_mut(&mut self, id: PageId) -> Option<&mut Page> {
        self.0.iter_mut().find(|p| p.id == id)
    }

    /// Append a blank page with a white background.
    pub fn add_page(&mut self, id: PageId) -> bool {
        self.0.push(Page::blank(id));
        true
    }

    /// Drop the last page unless that would go below the floor.
    pub fn remove_last_page(&mut self) -> bool {
        if self.0.len() <= MIN_PAGES {
            return false;
        }
        self.0.pop().is_some()
    }

    /// Append a default text layer to `page_id`. Returns the new layer's id
    /// so the caller can select it.
    pub fn add_layer(&mut self, page_id: PageId, layer_id: LayerId) -> Option<LayerId> {
        let page = self.page_mut(page_id)?;
        page.layers.push(TextLayer::new(layer_id));
        Some(layer_id)
    }

    pub fn remove_layer(&mut self, page_id: PageId, layer_id: LayerId) -> bool {
        let Some(page) = self.page_mut(page_id) else {
            return false;
        };
        let before = page.layers.len();
        page.layers.retain(|l| l.id != layer_id);
        page.layers.len() != before
    }

    pub fn update_layer(&mut self, page_id: PageId, layer_id: LayerId, patch: &LayerPatch) -> bool {
        let Some(layer) = self.page_mut(page_id).and_then(|p| p.layer_mut(layer_id)) else {
            return false;
        };
        patch.apply_to(layer);
        true
    }

    /// Set a layer's origin, clamped to the page box.
    pub fn move_layer(&mut self, page_id: PageId, layer_id: LayerId, x: f32, y: f32) -> bool {
        self.update_layer(page_id, layer_id, &LayerPatch::position(x, y))
    }

    pub fn update_page_background(&mut self, page_id: PageId, color: Color) -> bool {
        let Some(page) = self.page_mut(page_id) else {
            return false;
        };
        page.background_color = color;
        true
    }
}

impl Deref for PageList {
    type Target = [Page];

    fn deref(&self) -> &[Page] {
        &self.0
    }
}

impl<'de> Deserialize<'de> for PageList {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pages = Vec::<Page>::deserialize(deserializer)?;
        let mut ids = IdAllocator::seeded_from(&pages);
        Ok(Self::from_pages(pages, &mut ids))
    }
}
