//! Input abstraction layer.
//!
//! The host resolves DOM hits (which layer, which part of it) and reports
//! normalized pointer events in client coordinates together with the
//! origin of the page container under the pointer. Pointer-up and
//! pointer-leave must be forwarded from the window, not only from the
//! canvas, so a drag always terminates.

use folio_core::{LayerId, PageId};

/// A point in client (viewport) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Which part of a layer element the pointer went down on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerPart {
    /// The dedicated drag handle.
    Handle,
    /// The layer frame, outside its editable text control.
    Body,
    /// Inside the editable text control. Selects but never drags.
    Text,
}

/// What the pointer went down on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Layer {
        page_id: PageId,
        layer_id: LayerId,
        part: LayerPart,
    },
    /// Empty page area.
    Canvas { page_id: PageId },
    /// Anything outside the pages (toolbars, the preview widget, ...).
    Outside,
}

/// A normalized pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown {
        pointer: Point,
        /// Top-left of the target page container, client coordinates.
        origin: Point,
        target: PointerTarget,
    },
    PointerMove { pointer: Point, origin: Point },
    PointerUp,
    /// The pointer left the window.
    PointerLeave,
}

impl InputEvent {
    pub fn from_pointer_down(x: f32, y: f32, origin: Point, target: PointerTarget) -> Self {
        Self::PointerDown {
            pointer: Point::new(x, y),
            origin,
            target,
        }
    }

    pub fn from_pointer_move(x: f32, y: f32, origin: Point) -> Self {
        Self::PointerMove {
            pointer: Point::new(x, y),
            origin,
        }
    }
}
