//! Editor configuration.
//!
//! Passed in by the host as JSON (camelCase keys); every field is optional
//! and falls back to its default.

use folio_core::GRID_UNIT;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest accepted grid unit, in page px. Finer grids are unreadable and
/// would make the overlay draw hundreds of lines per axis.
pub const MIN_GRID_UNIT: f32 = 4.0;

/// How a completed drag interacts with undo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragHistory {
    /// Drag frames never touch history. Undo after a drag returns to the
    /// state before the previous committed edit.
    #[default]
    Bypass,
    /// The pre-drag state is pushed once when a drag that moved ends, so
    /// each drag is its own undo step.
    Checkpoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Maximum undo depth; the oldest snapshot is dropped beyond it.
    pub history_depth: usize,
    /// Spacing of the overlay grid and of snap-to-grid, in page px.
    pub grid_unit: f32,
    pub snap_to_grid: bool,
    pub show_grid: bool,
    pub show_guides: bool,
    pub drag_history: DragHistory,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: 100,
            grid_unit: GRID_UNIT,
            snap_to_grid: false,
            show_grid: false,
            show_guides: true,
            drag_history: DragHistory::Bypass,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid editor config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("gridUnit must be a number of at least {MIN_GRID_UNIT}, got {0}")]
    GridUnit(f32),
    #[error("historyDepth must be at least 1")]
    HistoryDepth,
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.grid_unit.is_finite() && self.grid_unit >= MIN_GRID_UNIT) {
            return Err(ConfigError::GridUnit(self.grid_unit));
        }
        if self.history_depth == 0 {
            return Err(ConfigError::HistoryDepth);
        }
        Ok(())
    }
}
