//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s.
//! The shortcut map lives in Rust so the browser bridge and native tests
//! share one table.

/// Arrow-key direction for nudges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Unit step in page coordinates (y grows downward).
    pub fn delta(self) -> (f32, f32) {
        match self {
            Self::Up => (0.0, -1.0),
            Self::Down => (0.0, 1.0),
            Self::Left => (-1.0, 0.0),
            Self::Right => (1.0, 0.0),
        }
    }
}

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Edit ──
    Undo,
    Redo,
    /// Remove the selected layer.
    DeleteLayer,
    /// Add a text layer to the active page.
    AddLayer,
    /// Move the selected layer by 1 px, or one grid unit when `coarse`.
    Nudge { dir: Direction, coarse: bool },

    // ── View ──
    ToggleGrid,
    ToggleSnap,
    ToggleGuides,
    NextSpread,
    PrevSpread,

    // ── UI ──
    Deselect,
}

/// Resolves key events into shortcut actions.
///
/// Uses platform-aware modifier detection: on macOS `meta` is ⌘,
/// on other platforms `ctrl` serves the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(
        key: &str,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
    ) -> Option<ShortcutAction> {
        let cmd = ctrl || meta;

        if let Some(dir) = arrow(key) {
            if cmd || alt {
                return None;
            }
            return Some(ShortcutAction::Nudge { dir, coarse: shift });
        }

        // ── Modifier combos first (most specific) ──
        if cmd && shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                _ => None,
            };
        }

        if alt {
            return None;
        }

        if shift {
            return match key {
                "g" | "G" => Some(ShortcutAction::ToggleSnap),
                _ => None,
            };
        }

        // ── Single keys (no modifiers) ──
        match key {
            "Delete" | "Backspace" => Some(ShortcutAction::DeleteLayer),
            "Escape" => Some(ShortcutAction::Deselect),
            "g" | "G" => Some(ShortcutAction::ToggleGrid),
            "h" | "H" => Some(ShortcutAction::ToggleGuides),
            "t" | "T" => Some(ShortcutAction::AddLayer),
            "PageDown" => Some(ShortcutAction::NextSpread),
            "PageUp" => Some(ShortcutAction::PrevSpread),
            _ => None,
        }
    }
}

fn arrow(key: &str) -> Option<Direction> {
    match key {
        "ArrowUp" => Some(Direction::Up),
        "ArrowDown" => Some(Direction::Down),
        "ArrowLeft" => Some(Direction::Left),
        "ArrowRight" => Some(Direction::Right),
        _ => None,
    }
}
