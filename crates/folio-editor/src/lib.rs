pub mod config;
pub mod drag;
pub mod history;
pub mod input;
pub mod preview;
pub mod selection;
pub mod session;
pub mod shortcuts;

pub use config::{ConfigError, DragHistory, EditorConfig};
pub use drag::{DragEngine, DragState, GridLines};
pub use history::History;
pub use input::{InputEvent, LayerPart, Point, PointerTarget};
pub use preview::WidgetState;
pub use selection::{Selection, SelectionTracker};
pub use session::{
    DocumentMeta, EditorSession, LoadError, SaveError, SessionPhase, ToolTab, ViewState,
};
pub use shortcuts::{Direction, ShortcutAction, ShortcutMap};
