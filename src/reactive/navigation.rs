use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// How often the URL is compared when the host has no history events
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Wait after a URL change before rebuilding, letting the new view render
pub const SETTLE_DELAY: Duration = Duration::from_millis(300);

/// History operation reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HistoryChange {
    Push,
    Replace,
    Pop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationSignal {
    /// The host reported a history operation that landed on `url`
    Changed { change: HistoryChange, url: String },
    /// Time to compare the document URL with the last one seen
    Poll,
}

/// Source of in-page navigation signals.
///
/// Futures returned by `next` must be cancel-safe: the runtime drops them
/// whenever another event wins the race.
#[async_trait(?Send)]
pub trait NavigationObserver {
    /// Next signal; `None` once the source is exhausted
    async fn next(&mut self) -> Option<NavigationSignal>;
}

/// History events forwarded by a host that can intercept them.
///
/// With a fallback poll the URL is still compared on an interval, which
/// catches changes made behind the interception.
pub struct NativeNavigation {
    events: mpsc::UnboundedReceiver<(HistoryChange, String)>,
    fallback: Option<Interval>,
}

impl NativeNavigation {
    pub fn new(events: mpsc::UnboundedReceiver<(HistoryChange, String)>) -> Self {
        NativeNavigation { events, fallback: None }
    }

    pub fn with_fallback_poll(mut self, period: Duration) -> Self {
        self.fallback = Some(poll_interval(period));
        self
    }
}

#[async_trait(?Send)]
impl NavigationObserver for NativeNavigation {
    async fn next(&mut self) -> Option<NavigationSignal> {
        match self.fallback.as_mut() {
            Some(fallback) => tokio::select! {
                event = self.events.recv() => match event {
                    Some((change, url)) => Some(NavigationSignal::Changed { change, url }),
                    // host stopped forwarding; keep polling
                    None => {
                        fallback.tick().await;
                        Some(NavigationSignal::Poll)
                    }
                },
                _ = fallback.tick() => Some(NavigationSignal::Poll),
            },
            None => self
                .events
                .recv()
                .await
                .map(|(change, url)| NavigationSignal::Changed { change, url }),
        }
    }
}

/// Interval-driven URL comparison for hosts without history events
pub struct PollingNavigation {
    ticks: Interval,
}

impl PollingNavigation {
    pub fn new() -> Self {
        Self::every(POLL_INTERVAL)
    }

    pub fn every(period: Duration) -> Self {
        PollingNavigation {
            ticks: poll_interval(period),
        }
    }
}

impl Default for PollingNavigation {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl NavigationObserver for PollingNavigation {
    async fn next(&mut self) -> Option<NavigationSignal> {
        self.ticks.tick().await;
        Some(NavigationSignal::Poll)
    }
}

fn poll_interval(period: Duration) -> Interval {
    // first tick one period out, not immediately
    let mut ticks = interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticks
}

/// Last URL the page was seen at
#[derive(Debug, Clone)]
pub struct UrlTracker {
    last: String,
}

impl UrlTracker {
    pub fn new(url: impl Into<String>) -> Self {
        UrlTracker { last: url.into() }
    }

    pub fn last(&self) -> &str {
        &self.last
    }

    /// Record `url`; true when it differs from the previous one
    pub fn observe(&mut self, url: &str) -> bool {
        if self.last == url {
            return false;
        }
        debug!("URL changed from {} to {}", self.last, url);
        self.last = url.to_string();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_polling_ticks_every_period() {
        let start = Instant::now();
        let mut nav = PollingNavigation::new();

        assert_eq!(nav.next().await, Some(NavigationSignal::Poll));
        assert_eq!(Instant::now() - start, POLL_INTERVAL);
        assert_eq!(nav.next().await, Some(NavigationSignal::Poll));
        assert_eq!(Instant::now() - start, POLL_INTERVAL * 2);
    }

    #[tokio::test]
    async fn test_native_forwards_history_events() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut nav = NativeNavigation::new(rx);

        tx.send((HistoryChange::Push, "https://example.com/b".to_string())).unwrap();
        assert_eq!(
            nav.next().await,
            Some(NavigationSignal::Changed {
                change: HistoryChange::Push,
                url: "https://example.com/b".to_string()
            })
        );

        drop(tx);
        assert_eq!(nav.next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_native_with_fallback_polls() {
        let (tx, rx) = mpsc::unbounded_channel::<(HistoryChange, String)>();
        let mut nav = NativeNavigation::new(rx).with_fallback_poll(POLL_INTERVAL);

        assert_eq!(nav.next().await, Some(NavigationSignal::Poll));

        tx.send((HistoryChange::Pop, "https://example.com/a".to_string())).unwrap();
        assert!(matches!(nav.next().await, Some(NavigationSignal::Changed { change: HistoryChange::Pop, .. })));
    }

    #[test]
    fn test_url_tracker() {
        let mut tracker = UrlTracker::new("https://example.com/a");
        assert!(!tracker.observe("https://example.com/a"));
        assert!(tracker.observe("https://example.com/b"));
        assert_eq!(tracker.last(), "https://example.com/b");
        assert!(!tracker.observe("https://example.com/b"));
    }
}
