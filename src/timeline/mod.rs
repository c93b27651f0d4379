//! The rendered conversation: deduplicated, ordered entries and the
//! interactive controls they carry.

pub mod entry;
mod render;

pub use entry::{Control, ControlGroup, EntryBody, EntryId, GroupRef, TimelineEntry};
pub use render::{Activation, RenderOutcome, SkipReason, Timeline};
