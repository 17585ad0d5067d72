use crate::model::Page;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Largest id a document may carry: ids cross the browser boundary as JS
/// numbers, which are exact only up to 2^53 - 1.
pub const MAX_ID: u64 = (1 << 53) - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("id {0} is larger than {MAX_ID}")]
pub struct IdOutOfRange(pub u64);

fn checked_id(id: u64) -> Result<u64, IdOutOfRange> {
    if id <= MAX_ID { Ok(id) } else { Err(IdOutOfRange(id)) }
}

/// Identifier of a page within a document.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct PageId(pub u64);

/// Identifier of a text or image layer. Unique across the whole document,
/// not just its page.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct LayerId(pub u64);

impl TryFrom<u64> for PageId {
    type Error = IdOutOfRange;

    fn try_from(id: u64) -> Result<Self, IdOutOfRange> {
        checked_id(id).map(Self)
    }
}

impl From<PageId> for u64 {
    fn from(id: PageId) -> u64 {
        id.0
    }
}

impl TryFrom<u64> for LayerId {
    type Error = IdOutOfRange;

    fn try_from(id: u64) -> Result<Self, IdOutOfRange> {
        checked_id(id).map(Self)
    }
}

impl From<LayerId> for u64 {
    fn from(id: LayerId) -> u64 {
        id.0
    }
}

impl fmt::Debug for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page#{}", self.0)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer#{}", self.0)
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic id source for one editing session.
///
/// Not part of undo snapshots: an id handed out once is never handed out
/// again, even if the page or layer that held it is undone away. Adopted
/// ids are at most [`MAX_ID`], so the counter has 2^11 times that much
/// headroom before it could saturate.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Start issuing ids strictly above `max`.
    pub fn starting_after(max: u64) -> Self {
        Self {
            next: max.saturating_add(1),
        }
    }

    /// Start issuing ids above every page, layer, and image id in `pages`.
    pub fn seeded_from(pages: &[Page]) -> Self {
        let max = pages
            .iter()
            .flat_map(|p| {
                std::iter::once(p.id.0)
                    .chain(p.layers.iter().map(|l| l.id.0))
                    .chain(p.images.iter().map(|i| i.id.0))
            })
            .max()
            .unwrap_or(0);
        Self::starting_after(max)
    }

    /// Make sure future ids stay above `id` (used when adopting ids from
    /// parsed content).
    pub fn observe(&mut self, id: u64) {
        if id >= self.next {
            self.next = id.saturating_add(1);
        }
    }

    fn bump(&mut self) -> u64 {
        let n = self.next;
        self.next = self.next.saturating_add(1);
        n
    }

    pub fn next_page_id(&mut self) -> PageId {
        PageId(self.bump())
    }

    pub fn next_layer_id(&mut self) -> LayerId {
        LayerId(self.bump())
    }
}
