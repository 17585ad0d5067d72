//! Integration tests: snapshot history driven through the editor session
//! (folio-editor ↔ folio-core).
//!
//! Verifies that committed page-list mutations undo and redo exactly, and
//! that drag frames stay out of history unless checkpointing is enabled.

use folio_core::*;
use folio_editor::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn layer_down(page_id: PageId, layer_id: LayerId, x: f32, y: f32) -> InputEvent {
    InputEvent::from_pointer_down(
        x,
        y,
        Point::default(),
        PointerTarget::Layer {
            page_id,
            layer_id,
            part: LayerPart::Handle,
        },
    )
}

fn drag(session: &mut EditorSession, page_id: PageId, layer_id: LayerId, to: (f32, f32)) {
    let layer = session.pages().layer(page_id, layer_id).unwrap();
    let (x, y) = (layer.x, layer.y);
    session.pointer(&layer_down(page_id, layer_id, x, y));
    for step in 1..=4 {
        let t = step as f32 / 4.0;
        session.pointer(&InputEvent::from_pointer_move(
            x + (to.0 - x) * t,
            y + (to.1 - y) * t,
            Point::default(),
        ));
    }
    session.pointer(&InputEvent::PointerUp);
}

// ─── Worked example ─────────────────────────────────────────────────────

#[test]
fn two_adds_undo_twice_redo_twice() {
    let mut session = EditorSession::default();
    let page1 = session.pages()[0].id;
    let s0 = session.pages().clone();

    session.add_layer_to(page1).unwrap();
    let s1 = session.pages().clone();
    session.add_layer_to(page1).unwrap();
    let s2 = session.pages().clone();
    assert_eq!(s2[0].layers.len(), 2);

    assert!(session.undo());
    assert_eq!(session.pages(), &s1);
    assert!(session.undo());
    assert_eq!(session.pages(), &s0);
    assert!(!session.undo());

    assert!(session.redo());
    assert!(session.redo());
    assert_eq!(session.pages(), &s2);
    assert!(!session.redo());
}

// ─── Basic undo/redo ────────────────────────────────────────────────────

#[test]
fn undo_restores_background_and_typography() {
    let mut session = EditorSession::default();
    let page_id = session.pages()[0].id;
    let layer_id = session.add_layer().unwrap();
    let before = session.pages().clone();

    session.set_page_background(page_id, Color::rgb(0xf5, 0xe6, 0xd3));
    session.update_selected_layer(&LayerPatch {
        bold: Some(true),
        font_size: Some(40.0),
        ..LayerPatch::default()
    });
    let layer = session.pages().layer(page_id, layer_id).unwrap();
    assert!(layer.bold);
    assert_eq!(layer.font_size, 40.0);

    session.undo();
    session.undo();
    assert_eq!(session.pages(), &before);
}

#[test]
fn commit_after_undo_discards_redo() {
    let mut session = EditorSession::default();
    session.add_layer();
    session.undo();
    assert!(session.history().can_redo());

    session.add_page();
    assert!(!session.history().can_redo());
    assert!(!session.redo());
}

#[test]
fn noop_mutations_do_not_create_undo_steps() {
    let mut session = EditorSession::default();
    let page_id = session.pages()[0].id;

    assert!(!session.remove_last_page());
    assert!(!session.set_page_background(page_id, Color::WHITE));
    assert!(!session.remove_layer(page_id, LayerId(9_999)));
    assert!(!session.update_layer(page_id, LayerId(9_999), &LayerPatch::text("x")));
    assert_eq!(session.history().undo_depth(), 0);
}

#[test]
fn depth_is_capped() {
    let config = EditorConfig {
        history_depth: 5,
        ..EditorConfig::default()
    };
    let mut session = EditorSession::new(config);
    for _ in 0..8 {
        session.add_layer();
    }
    assert_eq!(session.history().undo_depth(), 5);

    let mut undone = 0;
    while session.undo() {
        undone += 1;
    }
    assert_eq!(undone, 5);
    // The three oldest adds can no longer be undone.
    assert_eq!(session.pages()[0].layers.len(), 3);
}

#[test]
fn ids_are_not_reissued_after_undo() {
    let mut session = EditorSession::default();
    let first = session.add_layer().unwrap();
    session.undo();
    let second = session.add_layer().unwrap();
    assert_ne!(first, second);
}

// ─── Drag and history ───────────────────────────────────────────────────

#[test]
fn drag_frames_bypass_history() {
    let mut session = EditorSession::default();
    let page_id = session.pages()[0].id;
    let layer_id = session.add_layer().unwrap();
    assert_eq!(session.history().undo_depth(), 1);

    drag(&mut session, page_id, layer_id, (200.0, 300.0));
    let layer = session.pages().layer(page_id, layer_id).unwrap();
    assert_eq!((layer.x, layer.y), (200.0, 300.0));
    assert_eq!(session.history().undo_depth(), 1);

    // Undo returns to the state before the add, not to the pre-drag spot.
    session.undo();
    assert!(session.pages()[0].layers.is_empty());
}

#[test]
fn checkpoint_drag_is_one_undo_step() {
    let config = EditorConfig {
        drag_history: DragHistory::Checkpoint,
        ..EditorConfig::default()
    };
    let mut session = EditorSession::new(config);
    let page_id = session.pages()[0].id;
    let layer_id = session.add_layer().unwrap();

    drag(&mut session, page_id, layer_id, (200.0, 300.0));
    assert_eq!(session.history().undo_depth(), 2);

    session.undo();
    let layer = session.pages().layer(page_id, layer_id).unwrap();
    assert_eq!((layer.x, layer.y), (40.0, 40.0));

    session.redo();
    let layer = session.pages().layer(page_id, layer_id).unwrap();
    assert_eq!((layer.x, layer.y), (200.0, 300.0));
}

#[test]
fn checkpoint_click_without_move_records_nothing() {
    let config = EditorConfig {
        drag_history: DragHistory::Checkpoint,
        ..EditorConfig::default()
    };
    let mut session = EditorSession::new(config);
    let page_id = session.pages()[0].id;
    let layer_id = session.add_layer().unwrap();

    session.pointer(&layer_down(page_id, layer_id, 45.0, 45.0));
    session.pointer(&InputEvent::PointerLeave);
    assert_eq!(session.history().undo_depth(), 1);
}

// ─── Properties ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    AddPage,
    RemoveLastPage,
    AddLayer(usize),
    RemoveLayer(usize, usize),
    Retext(usize, usize, String),
    Background(usize, (u8, u8, u8)),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::AddPage),
        Just(Op::RemoveLastPage),
        (0usize..4).prop_map(Op::AddLayer),
        (0usize..4, 0usize..4).prop_map(|(p, l)| Op::RemoveLayer(p, l)),
        (0usize..4, 0usize..4, "[a-z ]{0,8}").prop_map(|(p, l, t)| Op::Retext(p, l, t)),
        (0usize..4, any::<(u8, u8, u8)>()).prop_map(|(p, c)| Op::Background(p, c)),
    ]
}

fn page(s: &EditorSession, i: usize) -> Option<PageId> {
    s.pages().get(i).map(|p| p.id)
}

fn layer(s: &EditorSession, p: usize, l: usize) -> Option<LayerId> {
    s.pages()
        .get(p)
        .and_then(|page| page.layers.get(l))
        .map(|layer| layer.id)
}

fn apply(session: &mut EditorSession, op: &Op) {
    match op {
        Op::AddPage => {
            session.add_page();
        }
        Op::RemoveLastPage => {
            session.remove_last_page();
        }
        Op::AddLayer(p) => {
            if let Some(id) = page(session, *p) {
                session.add_layer_to(id);
            }
        }
        Op::RemoveLayer(p, l) => {
            if let (Some(pid), Some(lid)) = (page(session, *p), layer(session, *p, *l)) {
                session.remove_layer(pid, lid);
            }
        }
        Op::Retext(p, l, text) => {
            if let (Some(pid), Some(lid)) = (page(session, *p), layer(session, *p, *l)) {
                session.update_layer(pid, lid, &LayerPatch::text(text.clone()));
            }
        }
        Op::Background(p, (r, g, b)) => {
            if let Some(id) = page(session, *p) {
                session.set_page_background(id, Color::rgb(*r, *g, *b));
            }
        }
    }
}

proptest! {
    #[test]
    fn undo_of_commit_restores_state(setup in prop::collection::vec(arb_op(), 0..12), op in arb_op()) {
        let mut session = EditorSession::default();
        for o in &setup {
            apply(&mut session, o);
        }
        let before = session.pages().clone();
        let depth = session.history().undo_depth();

        apply(&mut session, &op);
        let after = session.pages().clone();

        if session.history().undo_depth() > depth {
            prop_assert!(session.undo());
            prop_assert_eq!(session.pages(), &before);
            prop_assert!(session.redo());
            prop_assert_eq!(session.pages(), &after);
        } else {
            prop_assert_eq!(&after, &before);
        }
    }

    #[test]
    fn page_floor_always_holds(ops in prop::collection::vec(arb_op(), 0..30)) {
        let mut session = EditorSession::default();
        for o in &ops {
            apply(&mut session, o);
            prop_assert!(session.pages().len() >= MIN_PAGES);
        }
        while session.undo() {
            prop_assert!(session.pages().len() >= MIN_PAGES);
        }
    }
}
