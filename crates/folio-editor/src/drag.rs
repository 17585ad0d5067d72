//! Drag/position engine.
//!
//! Translates pointer movement into proposed layer positions in page-local
//! coordinates. On pointer-down the pointer's offset from the layer origin
//! is captured; each move proposes
//! `pointer - container origin - offset`, clamped to the page box and
//! optionally snapped to the grid. The engine never mutates the document:
//! the session applies what it proposes.
//!
//! ## Position pipeline
//!
//! | Step | Effect |
//! |------|--------|
//! | subtract | pointer - origin - offset |
//! | clamp | x in [0, 520], y in [0, 676] |
//! | snap | round to nearest multiple of the grid unit (if enabled) |
//! | clamp | re-checked so a snapped value never leaves the page |

use crate::input::Point;
use crate::shortcuts::Direction;
use folio_core::{LayerId, PageId, clamp_position};

/// Round `value` to the nearest multiple of `unit`. Non-positive units
/// leave the value untouched.
pub fn snap_to_grid(value: f32, unit: f32) -> f32 {
    if !(unit.is_finite() && unit > 0.0) {
        return value;
    }
    (value / unit).round() * unit
}

/// Compute the clamped (and optionally snapped) layer origin for a pointer
/// position.
pub fn proposed_position(pointer: Point, origin: Point, offset: Point, snap: Option<f32>) -> (f32, f32) {
    let (x, y) = clamp_position(
        pointer.x - origin.x - offset.x,
        pointer.y - origin.y - offset.y,
    );
    match snap {
        Some(unit) => clamp_position(snap_to_grid(x, unit), snap_to_grid(y, unit)),
        None => (x, y),
    }
}

/// Keyboard nudge: 1 px, or one grid unit when `coarse`. Clamped like a
/// drag.
pub fn nudged_position(x: f32, y: f32, dir: Direction, coarse: bool, unit: f32) -> (f32, f32) {
    let step = if coarse { unit } else { 1.0 };
    let (dx, dy) = dir.delta();
    clamp_position(x + dx * step, y + dy * step)
}

/// Interior grid line offsets for the overlay.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridLines {
    /// x offsets of vertical lines.
    pub vertical: Vec<f32>,
    /// y offsets of horizontal lines.
    pub horizontal: Vec<f32>,
}

/// Every multiple of `unit` strictly inside a `width` x `height` box.
pub fn grid_lines(unit: f32, width: f32, height: f32) -> GridLines {
    GridLines {
        vertical: multiples_below(unit, width),
        horizontal: multiples_below(unit, height),
    }
}

/// Upper bound on lines per axis, whatever unit the caller passes.
const MAX_GRID_LINES: usize = 1024;

fn multiples_below(unit: f32, limit: f32) -> Vec<f32> {
    if !(unit.is_finite() && unit > 0.0 && limit.is_finite()) {
        return Vec::new();
    }
    (1..=MAX_GRID_LINES)
        .map(|i| i as f32 * unit)
        .take_while(|v| *v < limit)
        .collect()
}

/// A drag in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    pub page_id: PageId,
    pub layer_id: LayerId,
    /// Pointer offset from the layer's top-left at pointer-down.
    pub offset: Point,
    /// Layer origin when the drag started.
    pub start: (f32, f32),
    /// Last position proposed.
    pub last: (f32, f32),
}

impl DragState {
    /// Whether the layer ended up somewhere other than where it started.
    pub fn moved(&self) -> bool {
        self.last != self.start
    }
}

/// Tracks at most one active drag.
#[derive(Debug, Default)]
pub struct DragEngine {
    active: Option<DragState>,
}

impl DragEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start dragging the layer whose origin is `layer_pos`. Any drag
    /// already in progress is replaced.
    pub fn begin(
        &mut self,
        page_id: PageId,
        layer_id: LayerId,
        pointer: Point,
        origin: Point,
        layer_pos: (f32, f32),
    ) {
        let offset = Point::new(
            pointer.x - origin.x - layer_pos.0,
            pointer.y - origin.y - layer_pos.1,
        );
        self.active = Some(DragState {
            page_id,
            layer_id,
            offset,
            start: layer_pos,
            last: layer_pos,
        });
    }

    /// Propose a new origin for the dragged layer. `None` when no drag is
    /// active.
    pub fn propose(
        &mut self,
        pointer: Point,
        origin: Point,
        snap: Option<f32>,
    ) -> Option<(PageId, LayerId, f32, f32)> {
        let drag = self.active.as_mut()?;
        let (x, y) = proposed_position(pointer, origin, drag.offset, snap);
        drag.last = (x, y);
        Some((drag.page_id, drag.layer_id, x, y))
    }

    /// Finish the drag, returning its final state.
    pub fn end(&mut self) -> Option<DragState> {
        self.active.take()
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&DragState> {
        self.active.as_ref()
    }
}
