//! Parser for stored magazine content → pages.
//!
//! Two levels:
//! - [`split_pages`] cuts the flat HTML on page-break markers. It is what
//!   the public reader uses and never fails.
//! - [`parse_page_fragment`] / [`parse_content`] recover structured pages
//!   (ids, background, layer text and typography) from emitted fragments,
//!   built on `winnow` 0.7. Used to re-open records that only carry HTML.

use crate::id::{IdAllocator, LayerId, MAX_ID, PageId};
use crate::model::*;
use regex::Regex;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::sync::LazyLock;
use thiserror::Error;
use winnow::combinator::{alt, delimited};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{take_till, take_until, take_while};

/// Any element whose class attribute contains `page-break`, in either
/// paired (`<div …></div>`) or self-closing (`<hr … />`) form.
static PAGE_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)<[a-z][a-z0-9-]*[^>]*?\sclass\s*=\s*(?:"[^"]*page-break[^"]*"|'[^']*page-break[^']*'|[^\s"'>]*page-break[^\s"'>]*)[^>]*?(?:/>|>(?:\s*</[a-z][a-z0-9-]*\s*>)?)"#,
    )
    .expect("page-break pattern is valid")
});

static EMBEDDED_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)data-(?:page|layer)-id\s*=\s*["']?(\d+)"#).expect("id pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected {expected} at byte {offset}")]
    Syntax {
        offset: usize,
        expected: &'static str,
    },
    #[error("fragment does not start with a page container element")]
    NotAContainer,
    #[error("page container is never closed")]
    Unterminated,
    #[error("page {index}: {source}")]
    InPage {
        index: usize,
        #[source]
        source: Box<ParseError>,
    },
}

// ─── Page splitting ─────────────────────────────────────────────────────

/// Split stored content into per-page HTML fragments.
///
/// Fragments are trimmed and empty ones dropped. When nothing is left (no
/// marker, or only whitespace between markers) the whole input is returned
/// as a single page.
pub fn split_pages(content: &str) -> Vec<&str> {
    let fragments: Vec<&str> = PAGE_BREAK_RE
        .split(content)
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect();
    if fragments.is_empty() {
        log::debug!("no non-empty page fragments; treating content as a single page");
        vec![content]
    } else {
        fragments
    }
}

/// Largest page/layer id embedded as a `data-*-id` attribute, or 0.
pub fn max_embedded_id(content: &str) -> u64 {
    EMBEDDED_ID_RE
        .captures_iter(content)
        .filter_map(|c| c.get(1)?.as_str().parse::<u64>().ok())
        .filter(|id| *id <= MAX_ID)
        .max()
        .unwrap_or(0)
}

/// Parse every page of stored content.
///
/// Ids embedded in the markup are kept; elements without one get a fresh id
/// above every embedded id.
pub fn parse_content(content: &str) -> Result<Vec<Page>, ParseError> {
    let mut ids = IdAllocator::starting_after(max_embedded_id(content));
    split_pages(content)
        .into_iter()
        .enumerate()
        .map(|(index, fragment)| {
            parse_page_fragment(fragment, &mut ids).map_err(|e| ParseError::InPage {
                index,
                source: Box::new(e),
            })
        })
        .collect()
}

/// Parse one page container and its layers.
///
/// `ids` must already issue ids above anything embedded in the fragment
/// (see [`max_embedded_id`]).
pub fn parse_page_fragment(fragment: &str, ids: &mut IdAllocator) -> Result<Page, ParseError> {
    let source = fragment.trim();
    let mut rest = source;
    let offset = |rest: &str| source.len() - rest.len();

    if !rest.starts_with('<') {
        return Err(ParseError::NotAContainer);
    }
    let container = parse_open_tag.parse_next(&mut rest).map_err(|_| ParseError::Syntax {
        offset: offset(rest),
        expected: "page container tag",
    })?;
    if container.self_closing {
        return Err(ParseError::NotAContainer);
    }

    let page_id = match container.attr("data-page-id").and_then(parse_id) {
        Some(id) => {
            ids.observe(id);
            PageId(id)
        }
        None => ids.next_page_id(),
    };
    let page_style = container.attr("style").unwrap_or_default();
    let decls = parse_style(&page_style);
    let background_color = style_value(&decls, "background-color")
        .or_else(|| style_value(&decls, "background"))
        .and_then(|v| Color::parse(v).ok())
        .unwrap_or(Color::WHITE);

    let mut page = Page {
        id: page_id,
        background_color,
        layers: Vec::new(),
        images: Vec::new(),
    };

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            return Err(ParseError::Unterminated);
        }
        if rest.starts_with("</") {
            parse_close_tag.parse_next(&mut rest).map_err(|_| ParseError::Syntax {
                offset: offset(rest),
                expected: "closing page tag",
            })?;
            break;
        }

        let child = parse_open_tag.parse_next(&mut rest).map_err(|_| ParseError::Syntax {
            offset: offset(rest),
            expected: "layer element",
        })?;
        if child.name.eq_ignore_ascii_case("img") {
            page.images.push(image_from_tag(&child, ids));
            continue;
        }
        if child.self_closing {
            continue;
        }

        let raw: &str = take_until::<_, _, ContextError>(0.., "</")
            .parse_next(&mut rest)
            .map_err(|_| ParseError::Unterminated)?;
        parse_close_tag.parse_next(&mut rest).map_err(|_| ParseError::Syntax {
            offset: offset(rest),
            expected: "closing layer tag",
        })?;
        page.layers.push(layer_from_tag(&child, &unescape_html(raw), ids));
    }

    if !rest.trim().is_empty() {
        log::debug!(
            "ignoring {} trailing bytes after page {}",
            rest.trim().len(),
            page.id
        );
    }
    Ok(page)
}

/// Embedded ids above [`MAX_ID`] are treated as absent and replaced.
fn parse_id(value: Cow<'_, str>) -> Option<u64> {
    value.trim().parse().ok().filter(|id| *id <= MAX_ID)
}

fn layer_id_for(tag: &Tag<'_>, ids: &mut IdAllocator) -> LayerId {
    match tag.attr("data-layer-id").and_then(parse_id) {
        Some(id) => {
            ids.observe(id);
            LayerId(id)
        }
        None => ids.next_layer_id(),
    }
}

fn layer_from_tag(tag: &Tag<'_>, text: &str, ids: &mut IdAllocator) -> TextLayer {
    let style = tag.attr("style").unwrap_or_default();
    let decls = parse_style(&style);
    let mut layer = TextLayer::new(layer_id_for(tag, ids));

    layer.text = text.to_string();
    layer.x = style_value(&decls, "left").and_then(parse_px).unwrap_or(0.0);
    layer.y = style_value(&decls, "top").and_then(parse_px).unwrap_or(0.0);
    if let Some(color) = style_value(&decls, "color").and_then(|v| Color::parse(v).ok()) {
        layer.color = color;
    }
    if let Some(family) = style_value(&decls, "font-family") {
        layer.font_family = sanitize_font_family(family);
    }
    if let Some(size) = style_value(&decls, "font-size").and_then(parse_px) {
        layer.font_size = clamp_font_size(size);
    }
    layer.bold = style_value(&decls, "font-weight").is_some_and(is_bold_weight);
    layer.italic = style_value(&decls, "font-style")
        .is_some_and(|v| v.eq_ignore_ascii_case("italic") || v.eq_ignore_ascii_case("oblique"));
    layer.align = style_value(&decls, "text-align")
        .and_then(TextAlign::from_css)
        .unwrap_or_default();
    layer
}

fn image_from_tag(tag: &Tag<'_>, ids: &mut IdAllocator) -> ImageLayer {
    let style = tag.attr("style").unwrap_or_default();
    let decls = parse_style(&style);
    let px = |prop: &str| style_value(&decls, prop).and_then(parse_px).unwrap_or(0.0);
    ImageLayer {
        id: layer_id_for(tag, ids),
        x: px("left"),
        y: px("top"),
        width: px("width"),
        height: px("height"),
        src: tag.attr("src").map(Cow::into_owned).unwrap_or_default(),
    }
}

fn is_bold_weight(v: &str) -> bool {
    v.eq_ignore_ascii_case("bold")
        || v.eq_ignore_ascii_case("bolder")
        || v.parse::<u16>().is_ok_and(|w| w >= 600)
}

fn parse_px(v: &str) -> Option<f32> {
    let v = v.trim();
    let v = v.strip_suffix("px").unwrap_or(v).trim_end();
    v.parse::<f32>().ok().filter(|n| n.is_finite())
}

// ─── Inline style ───────────────────────────────────────────────────────

type Declarations<'a> = SmallVec<[(&'a str, &'a str); 12]>;

fn parse_style(style: &str) -> Declarations<'_> {
    style
        .split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let prop = prop.trim();
            (!prop.is_empty()).then_some((prop, value.trim()))
        })
        .collect()
}

/// Last declaration of `prop` wins, as in CSS.
fn style_value<'a>(decls: &[(&str, &'a str)], prop: &str) -> Option<&'a str> {
    decls
        .iter()
        .rev()
        .find(|(p, _)| p.eq_ignore_ascii_case(prop))
        .map(|(_, v)| *v)
}

// ─── Tags ───────────────────────────────────────────────────────────────

#[derive(Debug)]
struct Tag<'a> {
    name: &'a str,
    attrs: SmallVec<[(&'a str, &'a str); 6]>,
    self_closing: bool,
}

impl<'a> Tag<'a> {
    /// Entity-decoded attribute value, matched case-insensitively.
    fn attr(&self, name: &str) -> Option<Cow<'a, str>> {
        self.attrs
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| unescape_html(v))
    }
}

fn skip_ws(input: &mut &str) {
    *input = input.trim_start();
}

fn parse_tag_name<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '-').parse_next(input)
}

fn parse_attr_name<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| {
        !c.is_whitespace() && !matches!(c, '=' | '>' | '/' | '"' | '\'')
    })
    .parse_next(input)
}

fn parse_attr_value<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    alt((
        delimited('"', take_till(0.., '"'), '"'),
        delimited('\'', take_till(0.., '\''), '\''),
        take_while(1.., |c: char| !c.is_whitespace() && c != '>'),
    ))
    .parse_next(input)
}

fn parse_attribute<'a>(input: &mut &'a str) -> ModalResult<(&'a str, &'a str)> {
    let name = parse_attr_name.parse_next(input)?;
    skip_ws(input);
    if !input.starts_with('=') {
        return Ok((name, ""));
    }
    let _ = '='.parse_next(input)?;
    skip_ws(input);
    let value = parse_attr_value.parse_next(input)?;
    Ok((name, value))
}

fn parse_open_tag<'a>(input: &mut &'a str) -> ModalResult<Tag<'a>> {
    let _ = '<'.parse_next(input)?;
    let name = parse_tag_name.parse_next(input)?;
    let mut attrs = SmallVec::new();
    loop {
        skip_ws(input);
        if input.starts_with("/>") {
            let _ = "/>".parse_next(input)?;
            return Ok(Tag {
                name,
                attrs,
                self_closing: true,
            });
        }
        if input.starts_with('>') {
            let _ = '>'.parse_next(input)?;
            // void elements never have a closing tag
            let self_closing = name.eq_ignore_ascii_case("img") || name.eq_ignore_ascii_case("br");
            return Ok(Tag {
                name,
                attrs,
                self_closing,
            });
        }
        if input.is_empty() {
            return Err(ErrMode::Backtrack(ContextError::new()));
        }
        attrs.push(parse_attribute.parse_next(input)?);
    }
}

fn parse_close_tag<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    let _ = "</".parse_next(input)?;
    let name = parse_tag_name.parse_next(input)?;
    skip_ws(input);
    let _ = '>'.parse_next(input)?;
    Ok(name)
}

// ─── Entities ───────────────────────────────────────────────────────────

/// Decode the entities produced by [`crate::emitter::escape_html`] plus
/// numeric references and `&nbsp;`. Unknown entities are left as-is.
pub fn unescape_html(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match decode_entity(rest) {
            Some((c, len)) => {
                out.push(c);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Decode one entity at the start of `s` (which begins with `&`). Returns
/// the character and the number of bytes consumed.
fn decode_entity(s: &str) -> Option<(char, usize)> {
    let (end, _) = s.char_indices().take(12).find(|(_, c)| *c == ';')?;
    let name = &s[1..end];
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse::<u32>().ok()?,
            };
            char::from_u32(code)?
        }
    };
    Some((c, end + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::{PAGE_BREAK, emit_content};
    use pretty_assertions::assert_eq;

    #[test]
    fn split_on_emitted_marker() {
        let content = format!("<p>a</p>\n{PAGE_BREAK}\n<p>b</p>");
        assert_eq!(split_pages(&content), vec!["<p>a</p>", "<p>b</p>"]);
    }

    #[test]
    fn split_tolerates_marker_variants() {
        let variants = [
            r#"<div class="page-break"></div>"#,
            r#"<DIV CLASS="page-break"></DIV>"#,
            r#"<div data-x="1" class='spread page-break'></div>"#,
            r#"<hr class="page-break" />"#,
            r#"<hr class="page-break">"#,
            r#"<div style="height:0" class="page-break" ></div >"#,
        ];
        for marker in variants {
            let content = format!("one{marker}two");
            assert_eq!(split_pages(&content), vec!["one", "two"], "marker {marker}");
        }
    }

    #[test]
    fn split_ignores_lookalike_attributes() {
        let content = r#"<div data-class="page-break">x</div>"#;
        assert_eq!(split_pages(content), vec![content]);
    }

    #[test]
    fn split_drops_empty_fragments() {
        let content = format!("{PAGE_BREAK}a{PAGE_BREAK}  {PAGE_BREAK}b{PAGE_BREAK}");
        assert_eq!(split_pages(&content), vec!["a", "b"]);
    }

    #[test]
    fn split_degrades_to_single_page() {
        assert_eq!(split_pages(""), vec![""]);
        assert_eq!(split_pages("plain text"), vec!["plain text"]);
        let only_markers = format!("{PAGE_BREAK} {PAGE_BREAK}");
        assert_eq!(split_pages(&only_markers), vec![only_markers.as_str()]);
    }

    #[test]
    fn escaped_marker_in_text_does_not_split() {
        let mut page = Page::blank(PageId(1));
        let mut layer = TextLayer::new(LayerId(2));
        layer.text = PAGE_BREAK.to_string();
        page.layers.push(layer);
        let content = emit_content(&[page]);
        assert_eq!(split_pages(&content).len(), 1);
    }

    #[test]
    fn unescape_entities() {
        assert_eq!(unescape_html("a &amp; b"), "a & b");
        assert_eq!(unescape_html("&lt;&gt;&quot;&#39;&#x41;"), "<>\"'A");
        assert_eq!(unescape_html("AT&T"), "AT&T");
        assert_eq!(unescape_html("&bogus;"), "&bogus;");
        assert_eq!(unescape_html("fish &amp;amp; chips"), "fish &amp; chips");
    }

    #[test]
    fn parses_legacy_fragment_without_ids() {
        let fragment = r#"
            <div style="width:560px;height:700px;background:#f5e6c8">
              <div style="position:absolute;left:12.5px;top:30px;font-weight:bold;font-family:Georgia, serif;font-size:20px;text-align:center">Hello &amp; welcome</div>
              <br>
            </div>"#;
        let mut ids = IdAllocator::starting_after(max_embedded_id(fragment));
        let page = parse_page_fragment(fragment, &mut ids).unwrap();
        assert_eq!(page.background_color, Color::rgb(0xf5, 0xe6, 0xc8));
        assert_eq!(page.layers.len(), 1);
        let layer = &page.layers[0];
        assert_eq!(layer.text, "Hello & welcome");
        assert_eq!((layer.x, layer.y), (12.5, 30.0));
        assert!(layer.bold);
        assert_eq!(layer.font_family, "Georgia, serif");
        assert_eq!(layer.align, TextAlign::Center);
        assert_eq!(layer.color, Color::INK);
        assert_ne!(layer.id.0, page.id.0);
    }

    #[test]
    fn rejects_non_container_fragment() {
        let mut ids = IdAllocator::new();
        assert_eq!(
            parse_page_fragment("just words", &mut ids),
            Err(ParseError::NotAContainer)
        );
        assert_eq!(
            parse_page_fragment(r#"<div class="mag-page"><div>open"#, &mut ids),
            Err(ParseError::Unterminated)
        );
    }

    #[test]
    fn parse_content_reports_page_index() {
        let content = format!(r#"<div></div>{PAGE_BREAK}oops"#);
        let err = parse_content(&content).unwrap_err();
        assert!(matches!(err, ParseError::InPage { index: 1, .. }));
    }

    #[test]
    fn embedded_ids() {
        let content = r#"<div data-page-id="4"><div data-layer-id='17'>x</div></div>"#;
        assert_eq!(max_embedded_id(content), 17);
        assert_eq!(max_embedded_id("<p>none</p>"), 0);
    }

    #[test]
    fn oversized_embedded_ids_get_fresh_ones() {
        let content = r#"<div data-page-id="18446744073709551615"><div data-layer-id="3">x</div></div>"#;
        assert_eq!(max_embedded_id(content), 3);
        let pages = parse_content(content).unwrap();
        let page = &pages[0];
        assert_eq!(page.layers[0].id, LayerId(3));
        assert_eq!(page.id, PageId(4));
    }
}
