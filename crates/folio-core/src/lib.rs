pub mod emitter;
pub mod id;
pub mod model;
pub mod parser;
pub mod record;

pub use emitter::{PAGE_BREAK, emit_content, escape_html};
pub use id::{IdAllocator, IdOutOfRange, LayerId, MAX_ID, PageId};
pub use model::*;
pub use parser::{ParseError, parse_content, parse_page_fragment, split_pages};
pub use record::{Author, PersistedRecord, PublishStatus, slugify};
