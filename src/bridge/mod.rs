//! Everything that crosses the page boundary: the settings store, the
//! message contract and the background process that relays updates.

pub mod background;
pub mod messages;
pub mod store;

pub use background::{Background, BackgroundHandle, Command, PageId};
pub use messages::{Envelope, Message, Outcome, Reply};
pub use store::{load_settings, FileStore, MemoryStore, SettingsStore};
