//! WASM bridge for Folio: exposes the editor session to the browser host.
//!
//! Compiled via `wasm-pack build --target web`. Structured values cross the
//! boundary as JSON strings; ids cross as numbers.

mod render2d;

use folio_core::{
    Author, Color, LayerId, LayerPatch, MAX_ID, PAGE_HEIGHT, PAGE_WIDTH, PageId, PersistedRecord,
    PublishStatus, Side, split_pages,
};
use folio_editor::{
    EditorConfig, EditorSession, InputEvent, LayerPart, LoadError, Point, PointerTarget,
    Selection, ShortcutAction, ShortcutMap, ToolTab,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

/// The main WASM-facing editor controller.
///
/// Holds one editing session. All interaction from the host page goes
/// through this struct.
#[wasm_bindgen]
pub struct MagazineEditor {
    session: EditorSession,
    /// Dark mode flag for the overlay: `false` = light (default).
    dark_mode: bool,
}

#[wasm_bindgen]
impl MagazineEditor {
    /// Create an editor with a blank two-page document. `config_json` may
    /// be empty for defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<MagazineEditor, JsValue> {
        console_error_panic_hook_setup();

        let config = if config_json.trim().is_empty() {
            EditorConfig::default()
        } else {
            EditorConfig::from_json(config_json).map_err(|e| JsValue::from_str(&e.to_string()))?
        };
        Ok(Self {
            session: EditorSession::new(config),
            dark_mode: false,
        })
    }

    // ─── Loading ─────────────────────────────────────────────────────────

    /// Enter the loading phase; edits are ignored until the load finishes.
    pub fn begin_load(&mut self) {
        self.session.begin_load();
    }

    /// Finish loading with a persisted record as JSON. Returns `false` if
    /// the record was malformed (the editor then holds a blank document).
    pub fn finish_load(&mut self, record_json: &str) -> bool {
        let result = PersistedRecord::from_json(record_json).map_err(LoadError::from);
        self.session.finish_load(result)
    }

    /// Finish loading with a failure reported by the host.
    pub fn fail_load(&mut self, not_found: bool, message: &str) {
        let err = if not_found {
            LoadError::NotFound
        } else {
            LoadError::Storage(message.to_string())
        };
        self.session.finish_load(Err(err));
    }

    // ─── State queries ───────────────────────────────────────────────────

    /// The page list as JSON (same shape as `editorPages`).
    pub fn pages_json(&self) -> String {
        to_json(self.session.pages())
    }

    pub fn view_json(&self) -> String {
        to_json(self.session.view())
    }

    pub fn meta_json(&self) -> String {
        to_json(self.session.meta())
    }

    /// The selected layer on the active page as JSON, or `null`.
    pub fn selected_layer_json(&self) -> String {
        to_json(&self.session.selected_layer())
    }

    pub fn active_page_id(&self) -> Option<f64> {
        self.session.active_page_id().map(|id| id.0 as f64)
    }

    pub fn page_count(&self) -> usize {
        self.session.pages().len()
    }

    pub fn can_undo(&self) -> bool {
        self.session.history().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.session.history().can_redo()
    }

    // ─── Document edits ──────────────────────────────────────────────────

    pub fn add_page(&mut self) -> Option<f64> {
        self.session.add_page().map(|id| id.0 as f64)
    }

    pub fn remove_last_page(&mut self) -> bool {
        self.session.remove_last_page()
    }

    /// Add a text layer to the active page and select it.
    pub fn add_layer(&mut self) -> Option<f64> {
        self.session.add_layer().map(|id| id.0 as f64)
    }

    pub fn remove_selected_layer(&mut self) -> bool {
        self.session.remove_selected_layer()
    }

    /// Apply a `LayerPatch` (JSON) to the selected layer.
    pub fn update_selected_layer(&mut self, patch_json: &str) -> bool {
        match parse_patch(patch_json) {
            Some(patch) => self.session.update_selected_layer(&patch),
            None => false,
        }
    }

    pub fn update_layer(&mut self, page_id: f64, layer_id: f64, patch_json: &str) -> bool {
        let (Some(page_id), Some(layer_id), Some(patch)) =
            (to_page_id(page_id), to_layer_id(layer_id), parse_patch(patch_json))
        else {
            return false;
        };
        self.session.update_layer(page_id, layer_id, &patch)
    }

    /// Set a page background from a `#RGB`/`#RRGGBB` string.
    pub fn set_page_background(&mut self, page_id: f64, color: &str) -> bool {
        let Some(page_id) = to_page_id(page_id) else {
            return false;
        };
        match Color::parse(color) {
            Ok(color) => self.session.set_page_background(page_id, color),
            Err(e) => {
                log::warn!("{e}");
                false
            }
        }
    }

    pub fn undo(&mut self) -> bool {
        self.session.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.session.redo()
    }

    // ─── Pointer input ───────────────────────────────────────────────────

    /// Handle pointer down. `part` is one of `handle`, `body`, `text`
    /// (layer hits), `canvas` (empty page area), or anything else for a
    /// hit outside the pages. Returns true if anything changed.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_down(
        &mut self,
        x: f32,
        y: f32,
        origin_x: f32,
        origin_y: f32,
        page_id: f64,
        layer_id: f64,
        part: &str,
    ) -> bool {
        let target = match (part, to_page_id(page_id), to_layer_id(layer_id)) {
            ("handle" | "body" | "text", Some(page_id), Some(layer_id)) => PointerTarget::Layer {
                page_id,
                layer_id,
                part: match part {
                    "handle" => LayerPart::Handle,
                    "body" => LayerPart::Body,
                    _ => LayerPart::Text,
                },
            },
            ("canvas", Some(page_id), _) => PointerTarget::Canvas { page_id },
            _ => PointerTarget::Outside,
        };
        let event = InputEvent::from_pointer_down(x, y, Point::new(origin_x, origin_y), target);
        self.session.pointer(&event)
    }

    /// Handle pointer move. Returns true if a dragged layer moved.
    pub fn handle_pointer_move(&mut self, x: f32, y: f32, origin_x: f32, origin_y: f32) -> bool {
        let event = InputEvent::from_pointer_move(x, y, Point::new(origin_x, origin_y));
        self.session.pointer(&event)
    }

    /// Window-level pointer up.
    pub fn handle_pointer_up(&mut self) -> bool {
        self.session.pointer(&InputEvent::PointerUp)
    }

    /// Window-level pointer leave.
    pub fn handle_pointer_leave(&mut self) -> bool {
        self.session.pointer(&InputEvent::PointerLeave)
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_dragging()
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn select_layer(&mut self, page_id: f64, layer_id: f64) -> bool {
        match (to_page_id(page_id), to_layer_id(layer_id)) {
            (Some(page_id), Some(layer_id)) => self.session.select_layer(page_id, layer_id),
            _ => false,
        }
    }

    pub fn clear_selection(&mut self) -> bool {
        self.session.clear_selection()
    }

    /// Adopt a selection (`{"pageId":..,"layerId":..}`) from the sidebar.
    pub fn sync_from_sidebar(&mut self, selection_json: &str) -> bool {
        match serde_json::from_str::<Selection>(selection_json) {
            Ok(selection) => self.session.sync_from_sidebar(selection),
            Err(e) => {
                log::warn!("invalid selection payload: {e}");
                false
            }
        }
    }

    /// Selection to push to the sidebar as JSON, or `undefined` when it has
    /// not changed since the sidebar last saw it.
    pub fn take_selection_change(&mut self) -> Option<String> {
        self.session.take_selection_change().map(|s| to_json(&s))
    }

    // ─── View ────────────────────────────────────────────────────────────

    pub fn next_spread(&mut self) -> bool {
        self.session.next_spread()
    }

    pub fn prev_spread(&mut self) -> bool {
        self.session.prev_spread()
    }

    /// `"left"` or `"right"`.
    pub fn set_active_side(&mut self, side: &str) -> bool {
        let side = match side {
            "left" => Side::Left,
            "right" => Side::Right,
            _ => return false,
        };
        self.session.set_active_side(side);
        true
    }

    /// `"text"`, `"page"`, or `"document"`.
    pub fn set_tool_tab(&mut self, tab: &str) -> bool {
        let tab = match tab {
            "text" => ToolTab::Text,
            "page" => ToolTab::Page,
            "document" => ToolTab::Document,
            _ => return false,
        };
        self.session.set_tool_tab(tab);
        true
    }

    pub fn toggle_grid(&mut self) -> bool {
        self.session.toggle_grid()
    }

    pub fn toggle_snap(&mut self) -> bool {
        self.session.toggle_snap()
    }

    pub fn toggle_guides(&mut self) -> bool {
        self.session.toggle_guides()
    }

    /// Set the overlay theme.
    pub fn set_theme(&mut self, is_dark: bool) {
        self.dark_mode = is_dark;
    }

    /// Draw grid, guides, and drag feedback for the page `page_id` onto an
    /// overlay canvas sized to the page.
    pub fn render_overlay(&self, ctx: &CanvasRenderingContext2d, page_id: f64) {
        let view = self.session.view();
        let grid = self.session.grid_lines();
        let drag_origin = self
            .session
            .drag_state()
            .filter(|d| Some(d.page_id) == to_page_id(page_id))
            .map(|d| d.last);
        let overlay = render2d::Overlay {
            grid: view.show_grid.then_some(&grid),
            guides: view.show_guides,
            margin: view.grid_unit,
            drag_origin,
        };
        let theme = if self.dark_mode {
            render2d::OverlayTheme::dark()
        } else {
            render2d::OverlayTheme::light()
        };
        render2d::render_overlay(
            ctx,
            PAGE_WIDTH as f64,
            PAGE_HEIGHT as f64,
            &overlay,
            &theme,
        );
    }

    // ─── Keyboard Shortcut API ───────────────────────────────────────────

    /// Handle a keyboard event. Returns a JSON string:
    /// `{"changed":bool, "action":"<action_name>"}`
    pub fn handle_key(
        &mut self,
        key: &str,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
    ) -> String {
        let action = match ShortcutMap::resolve(key, ctrl, shift, alt, meta) {
            Some(a) => a,
            None => return r#"{"changed":false,"action":"none"}"#.to_string(),
        };
        let changed = self.session.handle_shortcut(action);
        let action_name = action_to_name(action);
        format!(r#"{{"changed":{changed},"action":"{action_name}"}}"#)
    }

    // ─── Metadata ────────────────────────────────────────────────────────

    pub fn set_title(&mut self, title: &str) {
        self.session.set_title(title);
    }

    pub fn set_category(&mut self, category: &str) {
        self.session.set_category(non_empty(category));
    }

    pub fn set_cover_image_url(&mut self, url: &str) {
        self.session.set_cover_image_url(non_empty(url));
    }

    // ─── Output ──────────────────────────────────────────────────────────

    /// Flattened HTML content for the public reader.
    pub fn content_html(&self) -> String {
        self.session.content_html()
    }

    /// Per-page HTML for the page-flip preview.
    pub fn preview_pages(&self) -> js_sys::Array {
        self.session
            .preview_pages()
            .into_iter()
            .map(|page| JsValue::from_str(&page))
            .collect()
    }

    /// Record a preview widget transition: `loading`, `ready`, or
    /// `failed` (with `message`). Returns whether the state changed.
    pub fn set_preview_state(&mut self, state: &str, message: &str) -> bool {
        let preview = self.session.preview_mut();
        match state {
            "loading" => preview.start_loading(),
            "ready" => preview.loaded(),
            "failed" => preview.failed(message),
            _ => false,
        }
    }

    pub fn preview_state_json(&self) -> String {
        to_json(self.session.preview())
    }

    // ─── Saving ──────────────────────────────────────────────────────────

    /// Start a save. Returns the record JSON to store, or throws with a
    /// message when saving is not possible right now.
    pub fn begin_save(
        &mut self,
        author_uid: &str,
        author_name: &str,
        publish: bool,
    ) -> Result<String, JsValue> {
        let author = non_empty(author_uid).map(|uid| Author {
            uid,
            display_name: non_empty(author_name),
        });
        let status = if publish {
            PublishStatus::Published
        } else {
            PublishStatus::Draft
        };
        let record = self
            .session
            .begin_save(author, status)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        record
            .to_json()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Report the outcome of the storage write. An empty `error` means
    /// success.
    pub fn finish_save(&mut self, error: &str) -> bool {
        let result = match non_empty(error) {
            Some(message) => Err(message),
            None => Ok(()),
        };
        self.session.finish_save(result)
    }

    pub fn is_saving(&self) -> bool {
        self.session.is_saving()
    }

    pub fn is_dirty(&self) -> bool {
        self.session.is_dirty()
    }

    pub fn last_error(&self) -> Option<String> {
        self.session.last_error().map(str::to_string)
    }
}

fn action_to_name(action: ShortcutAction) -> &'static str {
    match action {
        ShortcutAction::Undo => "undo",
        ShortcutAction::Redo => "redo",
        ShortcutAction::DeleteLayer => "deleteLayer",
        ShortcutAction::AddLayer => "addLayer",
        ShortcutAction::Nudge { .. } => "nudge",
        ShortcutAction::ToggleGrid => "toggleGrid",
        ShortcutAction::ToggleSnap => "toggleSnap",
        ShortcutAction::ToggleGuides => "toggleGuides",
        ShortcutAction::NextSpread => "nextSpread",
        ShortcutAction::PrevSpread => "prevSpread",
        ShortcutAction::Deselect => "deselect",
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        log::error!("serialization failed: {e}");
        "null".to_string()
    })
}

fn parse_patch(json: &str) -> Option<LayerPatch> {
    serde_json::from_str(json)
        .map_err(|e| log::warn!("invalid layer patch: {e}"))
        .ok()
}

/// JS numbers are f64; only integers in `0..=MAX_ID` are valid ids.
fn to_id(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0 && value <= MAX_ID as f64 && value.fract() == 0.0)
        .then_some(value as u64)
}

fn to_page_id(value: f64) -> Option<PageId> {
    to_id(value).map(PageId)
}

fn to_layer_id(value: f64) -> Option<LayerId> {
    to_id(value).map(LayerId)
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Folio WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

// ─── Standalone reader functions (no editor needed) ──────────────────────

/// Split stored content into per-page HTML fragments, exactly as the
/// public reader does.
#[wasm_bindgen]
pub fn split_content(html: &str) -> js_sys::Array {
    split_pages(html)
        .into_iter()
        .map(JsValue::from_str)
        .collect()
}

/// The HTML of page `index` of stored content, or `undefined` when out of
/// range.
#[wasm_bindgen]
pub fn render_content_page(html: &str, index: usize) -> Option<String> {
    split_pages(html).get(index).map(|page| page.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn id_conversion() {
        assert_eq!(to_page_id(3.0), Some(PageId(3)));
        assert_eq!(to_layer_id(-1.0), None);
        assert_eq!(to_layer_id(1.5), None);
        assert_eq!(to_layer_id(f64::NAN), None);
        assert_eq!(to_page_id(1e300), None);
    }

    #[test]
    fn content_page_lookup() {
        let html = r#"<p>a</p><div class="page-break"></div><p>b</p>"#;
        assert_eq!(render_content_page(html, 1).as_deref(), Some("<p>b</p>"));
        assert_eq!(render_content_page(html, 2), None);
    }

    #[test]
    fn patch_parsing() {
        let patch = parse_patch(r##"{"text":"hi","color":"#112233"}"##).unwrap();
        assert_eq!(patch.text.as_deref(), Some("hi"));
        assert_eq!(patch.color, Some(Color::rgb(0x11, 0x22, 0x33)));
        assert!(parse_patch(r#"{"color":"red-ish"}"#).is_none());
    }

    #[test]
    fn action_names_are_camel_case() {
        assert_eq!(action_to_name(ShortcutAction::DeleteLayer), "deleteLayer");
        assert_eq!(action_to_name(ShortcutAction::PrevSpread), "prevSpread");
    }
}
