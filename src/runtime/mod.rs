//! The per-page event loop.

pub mod content_script;
pub mod events;

pub use content_script::{ContentScript, RuntimeCounters, FRAME_INTERVAL};
pub use events::PageEvent;
