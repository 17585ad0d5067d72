//! Load state of the page-flip preview widget.
//!
//! The widget is an external component that loads asynchronously. Its
//! state is tracked so the host can show a placeholder or an error, but it
//! never gates editing.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "camelCase")]
pub enum WidgetState {
    #[default]
    NotLoaded,
    Loading,
    Ready,
    Failed(String),
}

impl WidgetState {
    /// `NotLoaded | Failed → Loading`. Returns whether a load should start.
    pub fn start_loading(&mut self) -> bool {
        match self {
            Self::NotLoaded | Self::Failed(_) => {
                *self = Self::Loading;
                true
            }
            Self::Loading | Self::Ready => false,
        }
    }

    /// `Loading → Ready`.
    pub fn loaded(&mut self) -> bool {
        if *self == Self::Loading {
            *self = Self::Ready;
            true
        } else {
            false
        }
    }

    /// `Loading → Failed`.
    pub fn failed(&mut self, message: impl Into<String>) -> bool {
        if *self == Self::Loading {
            *self = Self::Failed(message.into());
            true
        } else {
            false
        }
    }

    pub fn is_ready(&self) -> bool {
        *self == Self::Ready
    }
}
