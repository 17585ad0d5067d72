//! Editor session: the orchestrator for one open magazine.
//!
//! Owns the page list, the id allocator, history, selection, the drag
//! engine, and view state. Every document mutation goes through
//! [`History::commit`], except per-frame drag updates which bypass it.
//!
//! Loading and saving are asynchronous on the host side and are modeled as
//! two-phase calls: `begin_load`/`finish_load` and
//! `begin_save`/`finish_save`.

use crate::config::{DragHistory, EditorConfig};
use crate::drag::{DragEngine, DragState, GridLines, grid_lines, nudged_position};
use crate::history::History;
use crate::input::{InputEvent, LayerPart, PointerTarget};
use crate::preview::WidgetState;
use crate::selection::{Selection, SelectionTracker};
use crate::shortcuts::ShortcutAction;
use folio_core::{
    Author, Color, IdAllocator, LayerId, LayerPatch, PAGE_HEIGHT, PAGE_WIDTH, PageId, PageList,
    PersistedRecord, PublishStatus, Side, TextLayer, emit_content, parse_content, split_pages,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("a save is already in progress")]
    InFlight,
    #[error("the document is still loading")]
    Loading,
    #[error("a title is required before saving")]
    MissingTitle,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("magazine not found")]
    NotFound,
    #[error("storage error: {0}")]
    Storage(String),
    #[error("malformed record: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Sidebar tab shown next to the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolTab {
    #[default]
    Text,
    Page,
    Document,
}

/// UI state shared by the canvas, sidebar, and overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    /// Index of the left page of the visible spread (always even).
    pub spread_index: usize,
    pub active_side: Side,
    pub tool_tab: ToolTab,
    pub show_grid: bool,
    pub snap_to_grid: bool,
    pub show_guides: bool,
    pub grid_unit: f32,
}

impl ViewState {
    fn from_config(config: &EditorConfig) -> Self {
        Self {
            spread_index: 0,
            active_side: Side::Left,
            tool_tab: ToolTab::default(),
            show_grid: config.show_grid,
            snap_to_grid: config.snap_to_grid,
            show_guides: config.show_guides,
            grid_unit: config.grid_unit,
        }
    }

    fn snap_unit(&self) -> Option<f32> {
        self.snap_to_grid.then_some(self.grid_unit)
    }
}

/// Document metadata edited alongside the pages.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMeta {
    pub title: String,
    pub category: Option<String>,
    pub cover_image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// A record is being fetched; mutations are ignored.
    Loading,
    Ready,
}

#[derive(Debug, Clone, PartialEq)]
struct Snapshot {
    meta: DocumentMeta,
    pages: PageList,
}

pub struct EditorSession {
    config: EditorConfig,
    meta: DocumentMeta,
    pages: PageList,
    ids: IdAllocator,
    history: History<PageList>,
    selection: SelectionTracker,
    drag: DragEngine,
    view: ViewState,
    phase: SessionPhase,
    saving: bool,
    /// What `begin_save` handed out, adopted as saved on success.
    pending_save: Option<Snapshot>,
    /// Last state known to match storage.
    saved: Snapshot,
    last_error: Option<String>,
    preview: WidgetState,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditorSession {
    /// A new, unsaved document with two blank pages.
    pub fn new(config: EditorConfig) -> Self {
        let mut ids = IdAllocator::new();
        let pages = PageList::blank(&mut ids);
        let meta = DocumentMeta::default();
        Self {
            history: History::new(config.history_depth),
            view: ViewState::from_config(&config),
            saved: Snapshot {
                meta: meta.clone(),
                pages: pages.clone(),
            },
            config,
            meta,
            pages,
            ids,
            selection: SelectionTracker::new(),
            drag: DragEngine::new(),
            phase: SessionPhase::Ready,
            saving: false,
            pending_save: None,
            last_error: None,
            preview: WidgetState::default(),
        }
    }

    /// Replace the whole document with a persisted record.
    ///
    /// Structured `editorPages` win. Older records with only `content` are
    /// re-parsed from the HTML; if that fails the document opens blank.
    pub fn hydrate(&mut self, record: PersistedRecord) {
        let (pages, ids) = match record.editor_pages {
            Some(pages) => {
                let mut ids = IdAllocator::seeded_from(&pages);
                (PageList::from_pages(pages, &mut ids), ids)
            }
            None if !record.content.trim().is_empty() => match parse_content(&record.content) {
                Ok(pages) => {
                    info!("hydrating {} page(s) from stored content", pages.len());
                    let mut ids = IdAllocator::seeded_from(&pages);
                    (PageList::from_pages(pages, &mut ids), ids)
                }
                Err(e) => {
                    warn!("stored content could not be re-opened: {e}");
                    let mut ids = IdAllocator::new();
                    (PageList::blank(&mut ids), ids)
                }
            },
            None => {
                let mut ids = IdAllocator::new();
                (PageList::blank(&mut ids), ids)
            }
        };

        self.meta = DocumentMeta {
            title: record.title,
            category: record.category,
            cover_image_url: record.cover_image_url,
        };
        self.pages = pages;
        self.ids = ids;
        self.reset_editing_state();
        self.saved = Snapshot {
            meta: self.meta.clone(),
            pages: self.pages.clone(),
        };
        self.phase = SessionPhase::Ready;
        self.last_error = None;
    }

    pub fn begin_load(&mut self) {
        self.end_drag();
        self.phase = SessionPhase::Loading;
    }

    /// Complete a load started with `begin_load`. On failure the error is
    /// recorded and a blank document is left editable.
    pub fn finish_load(&mut self, result: Result<PersistedRecord, LoadError>) -> bool {
        match result {
            Ok(record) => {
                self.hydrate(record);
                true
            }
            Err(e) => {
                warn!("load failed: {e}");
                let mut ids = IdAllocator::new();
                self.pages = PageList::blank(&mut ids);
                self.ids = ids;
                self.meta = DocumentMeta::default();
                self.reset_editing_state();
                self.saved = Snapshot {
                    meta: self.meta.clone(),
                    pages: self.pages.clone(),
                };
                self.phase = SessionPhase::Ready;
                self.last_error = Some(e.to_string());
                false
            }
        }
    }

    fn reset_editing_state(&mut self) {
        self.drag.end();
        self.history.clear();
        self.selection.clear();
        self.view.spread_index = 0;
        self.view.active_side = Side::Left;
        self.saving = false;
        self.pending_save = None;
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn pages(&self) -> &PageList {
        &self.pages
    }

    pub fn meta(&self) -> &DocumentMeta {
        &self.meta
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn history(&self) -> &History<PageList> {
        &self.history
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    pub fn drag_state(&self) -> Option<&DragState> {
        self.drag.active()
    }

    pub fn selection(&self) -> Selection {
        self.selection.current()
    }

    pub fn preview(&self) -> &WidgetState {
        &self.preview
    }

    pub fn preview_mut(&mut self) -> &mut WidgetState {
        &mut self.preview
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn editable(&self) -> bool {
        self.phase == SessionPhase::Ready
    }

    // ─── Derived values ──────────────────────────────────────────────────

    /// The page being edited: left or right page of the visible spread.
    pub fn active_page_id(&self) -> Option<PageId> {
        let offset = match self.view.active_side {
            Side::Left => 0,
            Side::Right => 1,
        };
        self.pages.get(self.view.spread_index + offset).map(|p| p.id)
    }

    /// The selected layer, only if it lives on the active page.
    pub fn selected_layer(&self) -> Option<&TextLayer> {
        let (page_id, layer_id) = self.selected_ids()?;
        self.pages.layer(page_id, layer_id)
    }

    fn selected_ids(&self) -> Option<(PageId, LayerId)> {
        self.selection.resolve(self.active_page_id())
    }

    // ─── Document mutations ──────────────────────────────────────────────

    pub fn add_page(&mut self) -> Option<PageId> {
        if !self.editable() {
            return None;
        }
        let id = self.ids.next_page_id();
        self.history.commit(&mut self.pages, |pages| {
            pages.add_page(id);
        });
        Some(id)
    }

    /// Remove the last page, keeping at least two.
    pub fn remove_last_page(&mut self) -> bool {
        if !self.editable() {
            return false;
        }
        self.end_drag();
        let changed = self.history.commit(&mut self.pages, |pages| {
            pages.remove_last_page();
        });
        self.clamp_view();
        changed
    }

    /// Add a text layer to the active page and select it.
    pub fn add_layer(&mut self) -> Option<LayerId> {
        let page_id = self.active_page_id()?;
        self.add_layer_to(page_id)
    }

    pub fn add_layer_to(&mut self, page_id: PageId) -> Option<LayerId> {
        if !self.editable() {
            return None;
        }
        let layer_id = self.ids.next_layer_id();
        let mut added = None;
        self.history.commit(&mut self.pages, |pages| {
            added = pages.add_layer(page_id, layer_id);
        });
        if added.is_some() {
            self.select_layer(page_id, layer_id);
        }
        added
    }

    pub fn remove_layer(&mut self, page_id: PageId, layer_id: LayerId) -> bool {
        if !self.editable() {
            return false;
        }
        if self
            .drag
            .active()
            .is_some_and(|d| d.page_id == page_id && d.layer_id == layer_id)
        {
            self.end_drag();
        }
        let mut removed = false;
        self.history.commit(&mut self.pages, |pages| {
            removed = pages.remove_layer(page_id, layer_id);
        });
        if removed && self.selection.current() == Selection::layer(page_id, layer_id) {
            self.selection.clear();
        }
        removed
    }

    pub fn remove_selected_layer(&mut self) -> bool {
        match self.selected_ids() {
            Some((page_id, layer_id)) => self.remove_layer(page_id, layer_id),
            None => false,
        }
    }

    pub fn update_layer(&mut self, page_id: PageId, layer_id: LayerId, patch: &LayerPatch) -> bool {
        if !self.editable() || patch.is_empty() {
            return false;
        }
        self.history.commit(&mut self.pages, |pages| {
            pages.update_layer(page_id, layer_id, patch);
        })
    }

    pub fn update_selected_layer(&mut self, patch: &LayerPatch) -> bool {
        match self.selected_ids() {
            Some((page_id, layer_id)) => self.update_layer(page_id, layer_id, patch),
            None => false,
        }
    }

    pub fn set_page_background(&mut self, page_id: PageId, color: Color) -> bool {
        if !self.editable() {
            return false;
        }
        self.history.commit(&mut self.pages, |pages| {
            pages.update_page_background(page_id, color);
        })
    }

    pub fn undo(&mut self) -> bool {
        if !self.editable() {
            return false;
        }
        self.drag.end();
        let changed = self.history.undo(&mut self.pages);
        self.clamp_view();
        changed
    }

    pub fn redo(&mut self) -> bool {
        if !self.editable() {
            return false;
        }
        self.drag.end();
        let changed = self.history.redo(&mut self.pages);
        self.clamp_view();
        changed
    }

    // ─── Pointer input ───────────────────────────────────────────────────

    /// Route a pointer event to selection and drag. Returns whether the
    /// document or the selection changed.
    pub fn pointer(&mut self, event: &InputEvent) -> bool {
        if !self.editable() {
            return false;
        }
        match *event {
            InputEvent::PointerDown {
                pointer,
                origin,
                target,
            } => {
                self.end_drag();
                match target {
                    PointerTarget::Layer {
                        page_id,
                        layer_id,
                        part,
                    } => {
                        let Some(layer) = self.pages.layer(page_id, layer_id) else {
                            return false;
                        };
                        let pos = (layer.x, layer.y);
                        self.select_layer(page_id, layer_id);
                        if part != LayerPart::Text {
                            self.drag.begin(page_id, layer_id, pointer, origin, pos);
                            if self.config.drag_history == DragHistory::Checkpoint {
                                self.history.begin_batch(&self.pages);
                            }
                        }
                        true
                    }
                    PointerTarget::Canvas { page_id } => {
                        self.focus_page(page_id);
                        let had = !self.selection.current().is_empty();
                        self.selection.clear();
                        had
                    }
                    PointerTarget::Outside => false,
                }
            }
            InputEvent::PointerMove { pointer, origin } => {
                let snap = self.view.snap_unit();
                let Some((page_id, layer_id, x, y)) = self.drag.propose(pointer, origin, snap)
                else {
                    return false;
                };
                self.history.apply_without_history(&mut self.pages, |pages| {
                    pages.move_layer(page_id, layer_id, x, y);
                })
            }
            InputEvent::PointerUp | InputEvent::PointerLeave => self.end_drag(),
        }
    }

    /// Finish any drag in progress. Returns whether the layer moved.
    fn end_drag(&mut self) -> bool {
        let Some(state) = self.drag.end() else {
            return false;
        };
        if self.config.drag_history == DragHistory::Checkpoint {
            self.history.end_batch(&self.pages);
        }
        debug!(
            "drag of {:?} ended at ({}, {})",
            state.layer_id, state.last.0, state.last.1
        );
        state.moved()
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Select a layer and bring its page into focus.
    pub fn select_layer(&mut self, page_id: PageId, layer_id: LayerId) -> bool {
        if self.pages.layer(page_id, layer_id).is_none() {
            return false;
        }
        self.focus_page(page_id);
        self.selection.select(page_id, layer_id);
        true
    }

    pub fn clear_selection(&mut self) -> bool {
        let had = !self.selection.current().is_empty();
        self.selection.clear();
        had
    }

    /// Adopt a selection pushed in by the sidebar.
    pub fn sync_from_sidebar(&mut self, selection: Selection) -> bool {
        if let (Some(page_id), Some(layer_id)) = (selection.page_id, selection.layer_id)
            && self.pages.layer(page_id, layer_id).is_some()
        {
            self.focus_page(page_id);
        }
        self.selection.sync_from_external(selection)
    }

    /// The selection to report to the sidebar, if it changed since the
    /// sidebar last saw it.
    pub fn take_selection_change(&mut self) -> Option<Selection> {
        self.selection.take_outbound()
    }

    fn focus_page(&mut self, page_id: PageId) {
        if let Some(index) = self.pages.index_of(page_id) {
            self.view.spread_index = index - index % 2;
            self.view.active_side = Side::of_index(index);
        }
    }

    // ─── View ────────────────────────────────────────────────────────────

    pub fn next_spread(&mut self) -> bool {
        if self.view.spread_index + 2 >= self.pages.len() {
            return false;
        }
        self.view.spread_index += 2;
        self.clamp_view();
        true
    }

    pub fn prev_spread(&mut self) -> bool {
        if self.view.spread_index == 0 {
            return false;
        }
        self.view.spread_index -= 2;
        true
    }

    pub fn set_active_side(&mut self, side: Side) {
        self.view.active_side = side;
        self.clamp_view();
    }

    pub fn set_tool_tab(&mut self, tab: ToolTab) {
        self.view.tool_tab = tab;
    }

    pub fn toggle_grid(&mut self) -> bool {
        self.view.show_grid = !self.view.show_grid;
        self.view.show_grid
    }

    pub fn toggle_snap(&mut self) -> bool {
        self.view.snap_to_grid = !self.view.snap_to_grid;
        self.view.snap_to_grid
    }

    pub fn toggle_guides(&mut self) -> bool {
        self.view.show_guides = !self.view.show_guides;
        self.view.show_guides
    }

    /// Overlay grid for one page, using the same unit as snapping.
    pub fn grid_lines(&self) -> GridLines {
        grid_lines(self.view.grid_unit, PAGE_WIDTH, PAGE_HEIGHT)
    }

    /// Keep the visible spread and side pointing at existing pages.
    fn clamp_view(&mut self) {
        let len = self.pages.len();
        if len == 0 {
            return;
        }
        let last_spread = (len - 1) - (len - 1) % 2;
        if self.view.spread_index > last_spread {
            self.view.spread_index = last_spread;
        }
        if self.view.active_side == Side::Right && self.view.spread_index + 1 >= len {
            self.view.active_side = Side::Left;
        }
    }

    // ─── Metadata ────────────────────────────────────────────────────────

    pub fn set_title(&mut self, title: impl Into<String>) {
        if self.editable() {
            self.meta.title = title.into();
        }
    }

    pub fn set_category(&mut self, category: Option<String>) {
        if self.editable() {
            self.meta.category = category;
        }
    }

    pub fn set_cover_image_url(&mut self, url: Option<String>) {
        if self.editable() {
            self.meta.cover_image_url = url;
        }
    }

    // ─── Shortcuts ───────────────────────────────────────────────────────

    /// Perform a resolved shortcut. Returns whether anything changed.
    pub fn handle_shortcut(&mut self, action: ShortcutAction) -> bool {
        match action {
            ShortcutAction::Undo => self.undo(),
            ShortcutAction::Redo => self.redo(),
            ShortcutAction::DeleteLayer => self.remove_selected_layer(),
            ShortcutAction::AddLayer => self.add_layer().is_some(),
            ShortcutAction::Deselect => self.clear_selection(),
            ShortcutAction::Nudge { dir, coarse } => {
                let Some(layer) = self.selected_layer() else {
                    return false;
                };
                let (x, y) = nudged_position(layer.x, layer.y, dir, coarse, self.view.grid_unit);
                match self.selected_ids() {
                    Some((page_id, layer_id)) => {
                        self.update_layer(page_id, layer_id, &LayerPatch::position(x, y))
                    }
                    None => false,
                }
            }
            ShortcutAction::ToggleGrid => {
                self.toggle_grid();
                true
            }
            ShortcutAction::ToggleSnap => {
                self.toggle_snap();
                true
            }
            ShortcutAction::ToggleGuides => {
                self.toggle_guides();
                true
            }
            ShortcutAction::NextSpread => self.next_spread(),
            ShortcutAction::PrevSpread => self.prev_spread(),
        }
    }

    // ─── Output ──────────────────────────────────────────────────────────

    /// Flattened HTML for the public reader.
    pub fn content_html(&self) -> String {
        emit_content(&self.pages)
    }

    /// Per-page HTML for the page-flip preview, split exactly as the
    /// reader splits stored content.
    pub fn preview_pages(&self) -> Vec<String> {
        split_pages(&self.content_html())
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    // ─── Saving ──────────────────────────────────────────────────────────

    /// Package the document for storage and mark a save in flight.
    pub fn begin_save(
        &mut self,
        author: Option<Author>,
        status: PublishStatus,
    ) -> Result<PersistedRecord, SaveError> {
        if !self.editable() {
            return Err(SaveError::Loading);
        }
        if self.saving {
            return Err(SaveError::InFlight);
        }
        if self.meta.title.trim().is_empty() {
            return Err(SaveError::MissingTitle);
        }

        let mut record = PersistedRecord::from_pages(self.meta.title.trim(), &self.pages);
        record.category = self.meta.category.clone();
        record.cover_image_url = self.meta.cover_image_url.clone();
        record.author = author;
        record.status = status;

        self.saving = true;
        self.pending_save = Some(Snapshot {
            meta: self.meta.clone(),
            pages: self.pages.clone(),
        });
        info!("saving \"{}\" ({} pages)", record.slug, self.pages.len());
        Ok(record)
    }

    /// Complete a save. On failure the message is kept for display and
    /// the document is left as it is.
    pub fn finish_save(&mut self, result: Result<(), String>) -> bool {
        if !self.saving {
            return false;
        }
        self.saving = false;
        let pending = self.pending_save.take();
        match result {
            Ok(()) => {
                if let Some(snapshot) = pending {
                    self.saved = snapshot;
                }
                self.last_error = None;
                info!("save complete");
                true
            }
            Err(message) => {
                warn!("save failed: {message}");
                self.last_error = Some(message);
                false
            }
        }
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// Whether the pages or metadata differ from what was last saved or
    /// loaded.
    pub fn is_dirty(&self) -> bool {
        self.saved.meta != self.meta || self.saved.pages != self.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Point;
    use pretty_assertions::assert_eq;

    fn session() -> EditorSession {
        EditorSession::default()
    }

    #[test]
    fn new_session_is_clean_and_blank() {
        let s = session();
        assert_eq!(s.pages().len(), 2);
        assert!(!s.is_dirty());
        assert_eq!(s.active_page_id(), Some(s.pages()[0].id));
        assert!(s.selected_layer().is_none());
    }

    #[test]
    fn add_layer_selects_it() {
        let mut s = session();
        let id = s.add_layer().unwrap();
        assert_eq!(s.selected_layer().map(|l| l.id), Some(id));
        assert_eq!(s.take_selection_change(), Some(s.selection()));
        assert!(s.is_dirty());
    }

    #[test]
    fn delete_selected_clears_selection() {
        let mut s = session();
        s.add_layer();
        assert!(s.remove_selected_layer());
        assert!(s.selection().is_empty());
        assert!(s.pages()[0].layers.is_empty());
    }

    #[test]
    fn mutations_ignored_while_loading() {
        let mut s = session();
        s.begin_load();
        assert!(s.add_layer().is_none());
        assert!(s.add_page().is_none());
        assert!(matches!(
            s.begin_save(None, PublishStatus::Draft),
            Err(SaveError::Loading)
        ));
    }

    #[test]
    fn failed_load_leaves_blank_editable_document() {
        let mut s = session();
        s.begin_load();
        assert!(!s.finish_load(Err(LoadError::NotFound)));
        assert_eq!(s.phase(), SessionPhase::Ready);
        assert_eq!(s.last_error(), Some("magazine not found"));
        assert!(s.add_layer().is_some());
    }

    #[test]
    fn text_part_selects_without_dragging() {
        let mut s = session();
        let page_id = s.pages()[0].id;
        let layer_id = s.add_layer().unwrap();
        s.clear_selection();

        let down = InputEvent::from_pointer_down(
            50.0,
            50.0,
            Point::default(),
            PointerTarget::Layer {
                page_id,
                layer_id,
                part: LayerPart::Text,
            },
        );
        assert!(s.pointer(&down));
        assert!(!s.is_dragging());
        assert_eq!(s.selected_layer().map(|l| l.id), Some(layer_id));
    }

    #[test]
    fn nudge_moves_selected_layer() {
        let mut s = session();
        s.add_layer();
        assert!(s.handle_shortcut(ShortcutAction::Nudge {
            dir: crate::shortcuts::Direction::Right,
            coarse: true,
        }));
        let layer = s.selected_layer().unwrap();
        assert_eq!((layer.x, layer.y), (64.0, 40.0));
        assert!(s.history().can_undo());
    }

    #[test]
    fn save_requires_title() {
        let mut s = session();
        assert!(matches!(
            s.begin_save(None, PublishStatus::Draft),
            Err(SaveError::MissingTitle)
        ));
        s.set_title("Spring");
        let record = s.begin_save(None, PublishStatus::Published).unwrap();
        assert_eq!(record.slug, "spring");
        assert_eq!(record.status, PublishStatus::Published);
        assert_eq!(record.editor_pages.as_deref(), Some(s.pages().as_slice()));
    }
}
