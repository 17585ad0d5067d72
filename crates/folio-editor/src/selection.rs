//! Selection tracker.
//!
//! Exactly one layer (or none) is selected across the whole document. The
//! selection is shared with the sidebar: changes made on the canvas are
//! handed outward, and the sidebar can drive the selection inward. A
//! change is only handed outward when it differs from the value the
//! sidebar last pushed, which breaks the echo loop between the two.

use folio_core::{LayerId, PageId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub page_id: Option<PageId>,
    pub layer_id: Option<LayerId>,
}

impl Selection {
    pub const NONE: Selection = Selection {
        page_id: None,
        layer_id: None,
    };

    pub fn layer(page_id: PageId, layer_id: LayerId) -> Self {
        Self {
            page_id: Some(page_id),
            layer_id: Some(layer_id),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.layer_id.is_none()
    }
}

#[derive(Debug, Default)]
pub struct SelectionTracker {
    current: Selection,
    /// Value most recently pushed in by the sidebar.
    last_external: Selection,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Selection {
        self.current
    }

    pub fn select(&mut self, page_id: PageId, layer_id: LayerId) {
        self.current = Selection::layer(page_id, layer_id);
    }

    pub fn clear(&mut self) {
        self.current = Selection::NONE;
    }

    /// The selected (page, layer) if its page is the active page. A
    /// selection on another page stays stored but resolves to `None`.
    pub fn resolve(&self, active_page: Option<PageId>) -> Option<(PageId, LayerId)> {
        match (self.current.page_id, self.current.layer_id) {
            (Some(page_id), Some(layer_id)) if Some(page_id) == active_page => {
                Some((page_id, layer_id))
            }
            _ => None,
        }
    }

    /// Adopt a selection driven by the sidebar. Returns whether the
    /// canvas selection changed.
    pub fn sync_from_external(&mut self, selection: Selection) -> bool {
        self.last_external = selection;
        if self.current == selection {
            return false;
        }
        self.current = selection;
        true
    }

    /// The selection to hand to the sidebar, if it differs from what the
    /// sidebar last reported. Handing it out records it as the sidebar's
    /// value.
    pub fn take_outbound(&mut self) -> Option<Selection> {
        if self.current == self.last_external {
            return None;
        }
        self.last_external = self.current;
        Some(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_is_gated_on_active_page() {
        let mut tracker = SelectionTracker::new();
        tracker.select(PageId(1), LayerId(5));
        assert_eq!(tracker.resolve(Some(PageId(1))), Some((PageId(1), LayerId(5))));
        assert_eq!(tracker.resolve(Some(PageId(2))), None);
        // The raw selection survives.
        assert_eq!(tracker.current(), Selection::layer(PageId(1), LayerId(5)));
    }

    #[test]
    fn external_value_is_not_echoed() {
        let mut tracker = SelectionTracker::new();
        assert!(tracker.sync_from_external(Selection::layer(PageId(1), LayerId(2))));
        assert_eq!(tracker.take_outbound(), None);

        tracker.select(PageId(1), LayerId(3));
        assert_eq!(
            tracker.take_outbound(),
            Some(Selection::layer(PageId(1), LayerId(3)))
        );
        assert_eq!(tracker.take_outbound(), None);
    }

    #[test]
    fn repeated_external_value_is_noop() {
        let mut tracker = SelectionTracker::new();
        let sel = Selection::layer(PageId(4), LayerId(8));
        assert!(tracker.sync_from_external(sel));
        assert!(!tracker.sync_from_external(sel));
    }

    #[test]
    fn clear_propagates() {
        let mut tracker = SelectionTracker::new();
        tracker.select(PageId(1), LayerId(2));
        tracker.take_outbound();
        tracker.clear();
        assert_eq!(tracker.take_outbound(), Some(Selection::NONE));
        assert!(tracker.current().is_empty());
    }
}
