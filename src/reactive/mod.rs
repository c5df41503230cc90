//! Turning page activity into rebuild and reposition work: heading-relevant
//! mutation filtering, the shared debounce timer and navigation detection.

pub mod debounce;
pub mod mutation;
pub mod navigation;

pub use debounce::{Debouncer, PendingAction};
pub use mutation::is_relevant;
pub use navigation::{
    HistoryChange, NativeNavigation, NavigationObserver, NavigationSignal, PollingNavigation,
    UrlTracker, POLL_INTERVAL, SETTLE_DELAY,
};
