//! Integration tests: pages → content HTML → split → re-parse round-trip.
//!
//! Verifies that page count, ids, layer text, position, and typography all
//! survive flattening into the stored HTML blob.

use folio_core::emitter::{PAGE_BREAK, emit_content};
use folio_core::id::{IdAllocator, LayerId, PageId};
use folio_core::model::*;
use folio_core::parser::{parse_content, parse_page_fragment, split_pages};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

// ─── Helpers ─────────────────────────────────────────────────────────────

fn assert_roundtrip_preserves(pages: &[Page]) {
    let content = emit_content(pages);
    assert_eq!(
        split_pages(&content).len(),
        pages.len(),
        "fragment count mismatch.\nContent:\n{content}"
    );
    let parsed = parse_content(&content).expect("re-parse failed");
    assert_eq!(parsed, pages, "pages changed after round-trip");
}

fn layer(id: u64, text: &str, x: f32, y: f32) -> TextLayer {
    let mut l = TextLayer::new(LayerId(id));
    l.text = text.to_string();
    l.x = x;
    l.y = y;
    l
}

// ─── Worked examples ────────────────────────────────────────────────────

#[test]
fn title_page_and_empty_page() {
    let mut first = Page::blank(PageId(1));
    let mut title = layer(10, "Title", 50.0, 50.0);
    title.font_size = 28.0;
    title.bold = true;
    first.layers.push(title);
    let second = Page::blank(PageId(2));

    let content = emit_content(&[first.clone(), second.clone()]);
    let fragments = split_pages(&content);
    assert_eq!(fragments.len(), 2);
    assert!(fragments[0].contains(">Title</div>"));
    assert!(fragments[0].contains("font-weight:700"));
    assert!(!fragments[1].contains("mag-layer"));

    let mut ids = IdAllocator::starting_after(100);
    assert_eq!(parse_page_fragment(fragments[1], &mut ids).unwrap(), second);
    assert_eq!(parse_page_fragment(fragments[0], &mut ids).unwrap(), first);
}

#[test]
fn script_text_is_fully_escaped() {
    let mut page = Page::blank(PageId(1));
    page.layers.push(layer(2, r#"<script>&"</script>"#, 0.0, 0.0));
    let content = emit_content(&[page.clone(), Page::blank(PageId(3))]);

    let fragment = split_pages(&content)[0];
    let start = fragment.find("margin:0\">").unwrap() + "margin:0\">".len();
    let end = fragment[start..].find("</div>").unwrap() + start;
    let text = &fragment[start..end];
    assert!(!text.contains('<'));
    assert!(!text.contains('>'));
    assert!(text.split('&').skip(1).all(|rest| rest.starts_with("lt;")
        || rest.starts_with("gt;")
        || rest.starts_with("amp;")
        || rest.starts_with("quot;")));

    assert_roundtrip_preserves(&[page, Page::blank(PageId(3))]);
}

#[test]
fn styled_layers_roundtrip() {
    let mut page = Page::blank(PageId(5));
    page.background_color = Color::rgb(0x10, 0x20, 0x30);
    let mut a = layer(6, "  leading and trailing  \nsecond line", 12.25, 600.5);
    a.font_family = r#""Playfair Display", 'Times New Roman', serif"#.into();
    a.font_size = 72.5;
    a.italic = true;
    a.align = TextAlign::Right;
    a.color = Color::rgb(0xaa, 0xbb, 0xcc);
    let b = layer(7, "AT&T <b>not bold</b> &amp;", 520.0, 676.0);
    page.layers.extend([a, b]);

    assert_roundtrip_preserves(&[page, Page::blank(PageId(8)), Page::blank(PageId(9))]);
}

#[test]
fn image_layers_roundtrip() {
    let mut page = Page::blank(PageId(1));
    page.images.push(ImageLayer {
        id: LayerId(2),
        x: 10.0,
        y: 20.0,
        width: 300.0,
        height: 200.5,
        src: "https://cdn.example/a.jpg?w=300&q=80".into(),
    });
    page.layers.push(layer(3, "caption", 10.0, 230.0));
    assert_roundtrip_preserves(&[page, Page::blank(PageId(4))]);
}

#[test]
fn marker_with_surrounding_whitespace() {
    let content = format!("\n\n  <div>a</div>  \n{PAGE_BREAK}\n\n  <div>b</div>\n");
    assert_eq!(split_pages(&content), vec!["<div>a</div>", "<div>b</div>"]);
}

// ─── Properties ─────────────────────────────────────────────────────────

fn arb_align() -> impl Strategy<Value = TextAlign> {
    prop_oneof![
        Just(TextAlign::Left),
        Just(TextAlign::Center),
        Just(TextAlign::Right)
    ]
}

fn arb_layer() -> impl Strategy<Value = (String, f32, f32, String, f32, bool, bool, (u8, u8, u8), TextAlign)> {
    (
        any::<String>(),
        0.0f32..=(PAGE_WIDTH - LAYER_MIN_WIDTH),
        0.0f32..=(PAGE_HEIGHT - LAYER_MIN_HEIGHT),
        "[A-Za-z\"' ,-]{0,24}".prop_map(|s| sanitize_font_family(&s)),
        MIN_FONT_SIZE..=MAX_FONT_SIZE,
        any::<bool>(),
        any::<bool>(),
        any::<(u8, u8, u8)>(),
        arb_align(),
    )
}

fn arb_pages() -> impl Strategy<Value = Vec<Page>> {
    prop::collection::vec(
        (any::<(u8, u8, u8)>(), prop::collection::vec(arb_layer(), 0..5)),
        2..6,
    )
    .prop_map(|raw| {
        let mut ids = IdAllocator::new();
        raw.into_iter()
            .map(|((r, g, b), layers)| {
                let mut page = Page::blank(ids.next_page_id());
                page.background_color = Color::rgb(r, g, b);
                for (text, x, y, family, size, bold, italic, (cr, cg, cb), align) in layers {
                    let mut l = TextLayer::new(ids.next_layer_id());
                    l.text = text;
                    l.x = x;
                    l.y = y;
                    l.font_family = family;
                    l.font_size = size;
                    l.bold = bold;
                    l.italic = italic;
                    l.color = Color::rgb(cr, cg, cb);
                    l.align = align;
                    page.layers.push(l);
                }
                page
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn split_count_matches_page_count(pages in arb_pages()) {
        let content = emit_content(&pages);
        prop_assert_eq!(split_pages(&content).len(), pages.len());
    }

    #[test]
    fn every_layer_survives_reparse(pages in arb_pages()) {
        let content = emit_content(&pages);
        let parsed = parse_content(&content).expect("re-parse failed");
        prop_assert_eq!(parsed, pages);
    }

    #[test]
    fn emitted_text_never_contains_raw_markup(text in any::<String>()) {
        let mut page = Page::blank(PageId(1));
        page.layers.push(layer(2, &text, 0.0, 0.0));
        let content = emit_content(&[page]);
        let escaped = folio_core::escape_html(&text);
        prop_assert!(!escaped.contains('<') && !escaped.contains('>'));
        prop_assert!(content.contains(escaped.as_ref()));
    }

    #[test]
    fn split_is_deterministic(content in ".{0,200}") {
        prop_assert_eq!(split_pages(&content), split_pages(&content));
        prop_assert!(!split_pages(&content).is_empty());
    }
}
