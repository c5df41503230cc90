use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

use crate::bridge::{load_settings, BackgroundHandle, Envelope, Message, Outcome, Reply, SettingsStore};
use crate::config::POSITION_KEY;
use crate::dom::{Document, Point};
use crate::reactive::{
    is_relevant, Debouncer, NavigationObserver, NavigationSignal, PendingAction, PollingNavigation,
    UrlTracker, SETTLE_DELAY,
};
use crate::runtime::events::PageEvent;
use crate::toc::SmartToc;
use crate::utils::error::TocError;

/// Scroll handling runs at most once per frame
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

// deadline for select branches that are disabled
const IDLE: Duration = Duration::from_secs(86_400);

/// How much work the script has done since it was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeCounters {
    pub rebuilds: usize,
    pub repositions: usize,
    pub frames: usize,
}

/// The per-page agent.
///
/// Owns the document handle and the table of contents, and serializes
/// every page event, incoming message and timer onto one task. Failures
/// are logged and reported to the background; they never end the loop.
pub struct ContentScript<D: Document> {
    doc: D,
    toc: SmartToc,
    store: Arc<dyn SettingsStore>,
    background: Option<BackgroundHandle>,
    navigation: Box<dyn NavigationObserver>,
    urls: UrlTracker,
    debouncer: Debouncer,
    frame_due: Option<Instant>,
    counters: RuntimeCounters,
    started: bool,
}

impl<D: Document> ContentScript<D> {
    /// Script with URL polling and no background connection
    pub fn new(doc: D, store: Arc<dyn SettingsStore>) -> Self {
        let urls = UrlTracker::new(doc.url());
        ContentScript {
            doc,
            toc: SmartToc::new(Default::default()),
            store,
            background: None,
            navigation: Box::new(PollingNavigation::new()),
            urls,
            debouncer: Debouncer::new(),
            frame_due: None,
            counters: RuntimeCounters::default(),
            started: false,
        }
    }

    pub fn with_background(mut self, background: BackgroundHandle) -> Self {
        self.background = Some(background);
        self
    }

    pub fn with_navigation(mut self, navigation: Box<dyn NavigationObserver>) -> Self {
        self.navigation = navigation;
        self
    }

    pub fn document(&self) -> &D {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.doc
    }

    pub fn toc(&self) -> &SmartToc {
        &self.toc
    }

    pub fn counters(&self) -> RuntimeCounters {
        self.counters
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn into_document(self) -> D {
        self.doc
    }

    /// Load settings and run the first rebuild. Later calls do nothing.
    pub async fn start(&mut self) {
        if self.started {
            debug!("Content script already started");
            return;
        }
        self.started = true;

        let settings = load_settings(self.store.as_ref()).await;
        self.toc.set_settings(settings);
        self.urls = UrlTracker::new(self.doc.url());

        info!("Content script started on {}", self.urls.last());
        self.rebuild();
    }

    /// Process page events and messages until the page unloads or its
    /// event channel closes, then remove the overlay and disconnect from
    /// the background.
    pub async fn run(
        &mut self,
        mut events: mpsc::UnboundedReceiver<PageEvent>,
        mut inbox: mpsc::UnboundedReceiver<Envelope>,
    ) {
        self.start().await;

        let mut inbox_open = true;
        let mut navigation_open = true;

        loop {
            let idle = Instant::now() + IDLE;
            let debounce_at = self.debouncer.deadline();
            let frame_at = self.frame_due;

            tokio::select! {
                event = events.recv() => match event {
                    Some(PageEvent::Unload) | None => break,
                    Some(event) => self.handle_event(event).await,
                },
                envelope = inbox.recv(), if inbox_open => match envelope {
                    Some(envelope) => self.handle_message(envelope).await,
                    None => {
                        debug!("Message channel closed");
                        inbox_open = false;
                    }
                },
                signal = self.navigation.next(), if navigation_open => match signal {
                    Some(signal) => self.handle_navigation(signal),
                    None => {
                        debug!("Navigation source closed");
                        navigation_open = false;
                    }
                },
                _ = sleep_until(debounce_at.unwrap_or(idle)), if debounce_at.is_some() => {
                    self.fire_debounced();
                },
                _ = sleep_until(frame_at.unwrap_or(idle)), if frame_at.is_some() => {
                    self.on_frame();
                },
            }
        }

        self.debouncer.cancel();
        self.frame_due = None;
        self.toc.teardown(&mut self.doc);
        if let Some(background) = &self.background {
            if let Some(page) = background.page() {
                background.unregister_page(page);
            }
        }
        info!("Content script stopped");
    }

    pub async fn handle_event(&mut self, event: PageEvent) {
        match event {
            PageEvent::Scroll => {
                if self.frame_due.is_none() {
                    self.frame_due = Some(Instant::now() + FRAME_INTERVAL);
                }
            }
            PageEvent::Resize => {
                let delay = self.toc.settings().update_delay();
                self.debouncer.schedule(PendingAction::Reposition, delay);
            }
            PageEvent::Mutation { record } => {
                if is_relevant(&record, &self.toc.settings().supported_headings) {
                    let delay = self.toc.settings().update_delay();
                    self.debouncer.schedule(PendingAction::Rebuild, delay);
                }
            }
            PageEvent::EntryClicked { index } => {
                if let Err(e) = self.toc.select_entry(&mut self.doc, index) {
                    self.report("entry selection", &e);
                }
            }
            PageEvent::ToggleCollapse => match self.toc.toggle_collapse(&mut self.doc) {
                Ok(Some(collapsed)) => debug!("Overlay collapsed: {}", collapsed),
                Ok(None) => {}
                Err(e) => self.report("collapse toggle", &e),
            },
            PageEvent::PointerDown { at } => self.toc.begin_drag(&mut self.doc, at),
            PageEvent::PointerMove { at } => {
                if let Err(e) = self.toc.drag_to(&mut self.doc, at) {
                    self.report("drag", &e);
                }
            }
            PageEvent::PointerUp { at } => {
                if let Err(e) = self.toc.drag_to(&mut self.doc, at) {
                    self.report("drag", &e);
                }
                if let Some(position) = self.toc.end_drag(true) {
                    self.save_position(position).await;
                }
            }
            PageEvent::PointerCancel => {
                self.toc.end_drag(false);
            }
            PageEvent::Unload => {
                self.toc.teardown(&mut self.doc);
            }
        }
    }

    /// Answer a message from the background or the popup
    pub async fn handle_message(&mut self, envelope: Envelope) {
        debug!("Received {}", envelope.message.kind());

        let response = match &envelope.message {
            Message::GetTocStatus => Reply::Status(self.toc.status()),
            Message::RefreshToc => {
                self.debouncer.cancel();
                self.rebuild();
                Reply::Outcome(Outcome::ok())
            }
            Message::SettingsUpdated { settings } => {
                self.toc.set_settings(settings.clone());
                self.debouncer.cancel();
                self.rebuild();
                Reply::Outcome(Outcome::ok())
            }
            other => Reply::Outcome(Outcome::failed(format!(
                "{} is not handled by pages",
                other.kind()
            ))),
        };

        envelope.respond(response);
    }

    fn handle_navigation(&mut self, signal: NavigationSignal) {
        let url = match signal {
            NavigationSignal::Changed { change, url } => {
                debug!("History {:?} to {}", change, url);
                url
            }
            NavigationSignal::Poll => self.doc.url(),
        };

        if self.urls.observe(&url) {
            info!("Navigated to {}, rebuilding shortly", url);
            self.debouncer.schedule(PendingAction::Rebuild, SETTLE_DELAY);
        }
    }

    fn fire_debounced(&mut self) {
        match self.debouncer.take_due(Instant::now()) {
            Some(PendingAction::Rebuild) => self.rebuild(),
            Some(PendingAction::Reposition) => {
                self.counters.repositions += 1;
                if let Err(e) = self.toc.reposition(&mut self.doc) {
                    self.report("reposition", &e);
                }
            }
            None => {}
        }
    }

    fn on_frame(&mut self) {
        self.frame_due = None;
        self.counters.frames += 1;
        if let Err(e) = self.toc.update_active(&mut self.doc) {
            self.report("scroll tracking", &e);
        }
    }

    fn rebuild(&mut self) {
        self.counters.rebuilds += 1;
        if let Err(e) = self.toc.rebuild(&mut self.doc) {
            self.report("rebuild", &e);
        }
    }

    async fn save_position(&self, position: Point) {
        let value = match serde_json::to_value(position) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to encode overlay position: {}", e);
                return;
            }
        };
        match self.store.set(POSITION_KEY, value).await {
            Ok(()) => debug!("Saved overlay position ({}, {})", position.x, position.y),
            Err(e) => warn!("Failed to save overlay position: {}", e),
        }
    }

    fn report(&self, context: &str, e: &TocError) {
        error!("Table of contents {} failed: {}", context, e);
        if let Some(background) = &self.background {
            let message = Message::ReportError {
                error: format!("{} failed on {}: {}", context, self.urls.last(), e),
            };
            if !background.notify(message) {
                debug!("Background unavailable, error not reported");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{Background, Command, MemoryStore};
    use crate::config::{Settings, SETTINGS_KEY};
    use crate::dom::{MutationRecord, NodeSummary, Selector, Size, SnapshotDocument, SnapshotNode};
    use crate::reactive::{HistoryChange, NativeNavigation};
    use crate::test_utils::example_page;
    use crate::utils::error::TocResult;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tokio::time::sleep;

    struct BrokenStore;

    #[async_trait]
    impl SettingsStore for BrokenStore {
        async fn get(&self, _key: &str) -> TocResult<Option<Value>> {
            Err(TocError::Store("unavailable".to_string()))
        }

        async fn set(&self, _key: &str, _value: Value) -> TocResult<()> {
            Err(TocError::Store("unavailable".to_string()))
        }
    }

    fn script() -> ContentScript<SnapshotDocument> {
        ContentScript::new(example_page("https://example.com/guide"), Arc::new(MemoryStore::new()))
    }

    fn heading_inserted() -> PageEvent {
        PageEvent::Mutation {
            record: MutationRecord {
                added: vec![NodeSummary {
                    tag: "section".to_string(),
                    descendant_tags: vec!["h2".to_string()],
                }],
                removed: vec![],
            },
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_once() {
        let mut script = script();
        script.start().await;
        assert!(script.toc().is_active());
        assert!(script.document().overlay().is_some());

        script.start().await;
        assert_eq!(script.counters().rebuilds, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_uses_stored_settings() {
        let store = MemoryStore::with_value(SETTINGS_KEY, json!({ "minHeadings": 10 }));
        let mut script = ContentScript::new(example_page("https://example.com/guide"), Arc::new(store));
        script.start().await;

        assert!(!script.toc().is_active());
        assert!(script.toc().status().reason.unwrap().contains("too few headings"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_with_broken_store_uses_defaults() {
        let mut script = ContentScript::new(example_page("https://example.com/guide"), Arc::new(BrokenStore));
        script.start().await;
        assert_eq!(script.toc().settings(), &Settings::default());
        assert!(script.toc().is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutation_burst_rebuilds_once() {
        let mut script = script();
        let (events, rx) = mpsc::unbounded_channel();
        let (_inbox, inbox_rx) = mpsc::unbounded_channel();

        let driver = async move {
            for _ in 0..5 {
                events.send(heading_inserted()).unwrap();
                sleep(Duration::from_millis(60)).await;
            }
            sleep(Duration::from_millis(400)).await;
            events.send(PageEvent::Unload).unwrap();
        };

        tokio::join!(script.run(rx, inbox_rx), driver);

        // the start rebuild plus one for the whole burst
        assert_eq!(script.counters().rebuilds, 2);
        assert!(script.document().overlay().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_added_heading_listed_after_debounce() {
        let mut script = script();
        script.start().await;
        assert_eq!(script.document().overlay().unwrap().rendered.entries, 4);

        let article = script
            .document()
            .query_selector(&Selector::parse("article").unwrap())
            .unwrap();
        let (_, record) = script
            .document_mut()
            .append_child(
                article,
                SnapshotNode::element("section").with_child(
                    SnapshotNode::element("h2").with_text("Appendix").with_rect(40.0, 3400.0, 700.0, 32.0),
                ),
            )
            .unwrap();
        script.handle_event(PageEvent::Mutation { record }).await;
        assert_eq!(script.toc().headings().len(), 4);

        sleep_until(script.debouncer.deadline().unwrap()).await;
        script.fire_debounced();

        assert_eq!(script.counters().rebuilds, 2);
        let texts: Vec<&str> = script.toc().headings().iter().map(|h| h.text.as_str()).collect();
        assert_eq!(texts, vec!["Intro", "Details", "More", "Edge", "Appendix"]);
        let overlay = script.document().overlay().unwrap();
        assert_eq!(overlay.rendered.entries, 5);
        assert!(overlay.rendered.html.contains("Appendix"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_removed_heading_dropped_after_debounce() {
        let mut script = script();
        script.start().await;

        let old = script.toc().headings()[2].node;
        let record = script.document_mut().remove(old).unwrap();
        script.handle_event(PageEvent::Mutation { record }).await;

        sleep_until(script.debouncer.deadline().unwrap()).await;
        script.fire_debounced();

        assert!(script.document().tag_name(old).is_none());
        let texts: Vec<&str> = script.toc().headings().iter().map(|h| h.text.as_str()).collect();
        assert_eq!(texts, vec!["Intro", "Details", "Edge"]);
        assert!(script.toc().headings().iter().all(|h| h.node != old));
        assert_eq!(script.document().overlay().unwrap().rendered.entries, 3);

        // scroll tracking never lands on the removed heading
        script.document_mut().set_scroll_top(2000.0);
        script.on_frame();
        assert_eq!(script.toc().active_index(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_irrelevant_mutation_ignored() {
        let mut script = script();
        script.start().await;
        script
            .handle_event(PageEvent::Mutation {
                record: MutationRecord {
                    added: vec![NodeSummary {
                        tag: "div".to_string(),
                        descendant_tags: vec!["p".to_string()],
                    }],
                    removed: vec![],
                },
            })
            .await;
        assert_eq!(script.debouncer.pending(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resize_repositions_without_rebuild() {
        let mut script = script();
        let (events, rx) = mpsc::unbounded_channel();
        let (_inbox, inbox_rx) = mpsc::unbounded_channel();

        let driver = async move {
            events.send(PageEvent::Resize).unwrap();
            events.send(PageEvent::Resize).unwrap();
            sleep(Duration::from_millis(500)).await;
            events.send(PageEvent::Unload).unwrap();
        };

        tokio::join!(script.run(rx, inbox_rx), driver);

        assert_eq!(script.counters().rebuilds, 1);
        assert_eq!(script.counters().repositions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resize_redocks_to_new_viewport() {
        let mut script = script();
        script.start().await;
        assert_eq!(script.document().overlay().unwrap().position, Point::new(980.0, 100.0));

        script.document_mut().set_viewport(Size::new(800.0, 600.0));
        script.handle_event(PageEvent::Resize).await;
        sleep_until(script.debouncer.deadline().unwrap()).await;
        script.fire_debounced();

        assert_eq!(script.document().overlay().unwrap().position, Point::new(500.0, 100.0));
        assert_eq!(script.counters().repositions, 1);
        assert_eq!(script.counters().rebuilds, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resize_then_mutation_rebuilds() {
        let mut script = script();
        let (events, rx) = mpsc::unbounded_channel();
        let (_inbox, inbox_rx) = mpsc::unbounded_channel();

        let driver = async move {
            events.send(PageEvent::Resize).unwrap();
            events.send(heading_inserted()).unwrap();
            sleep(Duration::from_millis(500)).await;
            events.send(PageEvent::Unload).unwrap();
        };

        tokio::join!(script.run(rx, inbox_rx), driver);

        assert_eq!(script.counters().rebuilds, 2);
        assert_eq!(script.counters().repositions, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scroll_coalesced_per_frame() {
        let mut script = script();
        let (events, rx) = mpsc::unbounded_channel();
        let (_inbox, inbox_rx) = mpsc::unbounded_channel();

        let driver = async move {
            for _ in 0..10 {
                events.send(PageEvent::Scroll).unwrap();
            }
            sleep(Duration::from_millis(50)).await;
            events.send(PageEvent::Scroll).unwrap();
            sleep(Duration::from_millis(50)).await;
            events.send(PageEvent::Unload).unwrap();
        };

        tokio::join!(script.run(rx, inbox_rx), driver);
        assert_eq!(script.counters().frames, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scroll_frame_updates_highlight() {
        let mut script = script();
        script.start().await;
        script.document_mut().set_scroll_top(1700.0);

        script.handle_event(PageEvent::Scroll).await;
        sleep(FRAME_INTERVAL).await;
        script.on_frame();

        assert_eq!(script.toc().active_index(), 2);
        assert_eq!(script.document().overlay().unwrap().active_entry, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_change_rebuilds_after_settle() {
        let (history, history_rx) = mpsc::unbounded_channel();
        let mut script = script().with_navigation(Box::new(NativeNavigation::new(history_rx)));
        let (events, rx) = mpsc::unbounded_channel();
        let (_inbox, inbox_rx) = mpsc::unbounded_channel();

        let driver = async move {
            // same URL: nothing to do
            history.send((HistoryChange::Replace, "https://example.com/guide".to_string())).unwrap();
            sleep(Duration::from_millis(10)).await;
            history.send((HistoryChange::Push, "https://example.com/next".to_string())).unwrap();
            sleep(Duration::from_millis(200)).await;
            events.send(PageEvent::Scroll).unwrap();
            sleep(Duration::from_millis(200)).await;
            events.send(PageEvent::Unload).unwrap();
        };

        tokio::join!(script.run(rx, inbox_rx), driver);
        assert_eq!(script.counters().rebuilds, 2);
        assert_eq!(script.urls.last(), "https://example.com/next");
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_sees_url_change() {
        let mut script = script();
        script.start().await;

        script.document_mut().set_url("https://example.com/other");
        script.handle_navigation(NavigationSignal::Poll);
        assert_eq!(script.debouncer.pending(), Some(PendingAction::Rebuild));

        script.handle_navigation(NavigationSignal::Poll);
        let deadline = script.debouncer.deadline().unwrap();
        sleep_until(deadline).await;
        script.fire_debounced();
        assert_eq!(script.counters().rebuilds, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_refresh_and_settings_messages() {
        let mut script = script();
        script.start().await;

        let (envelope, reply) = Envelope::request(Message::GetTocStatus);
        script.handle_message(envelope).await;
        match reply.await.unwrap() {
            Reply::Status(status) => assert!(status.active),
            other => panic!("unexpected reply {:?}", other),
        }

        let (envelope, reply) = Envelope::request(Message::RefreshToc);
        script.handle_message(envelope).await;
        assert_eq!(reply.await.unwrap(), Reply::Outcome(Outcome::ok()));
        assert_eq!(script.counters().rebuilds, 2);

        let disabled = Settings {
            enabled: false,
            ..Settings::default()
        };
        script
            .handle_message(Envelope::notify(Message::SettingsUpdated { settings: disabled }))
            .await;
        assert!(script.document().overlay().is_none());
        assert_eq!(script.toc().status().reason.as_deref(), Some("disabled"));

        let (envelope, reply) = Envelope::request(Message::GetSettings);
        script.handle_message(envelope).await;
        match reply.await.unwrap() {
            Reply::Outcome(outcome) => assert!(!outcome.success),
            other => panic!("unexpected reply {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_drag_saves_position() {
        let store = Arc::new(MemoryStore::new());
        let mut script = ContentScript::new(example_page("https://example.com/guide"), store.clone());
        script.start().await;

        let origin = script.document().overlay().unwrap().position;
        assert_eq!(origin, Point::new(980.0, 100.0));

        script.handle_event(PageEvent::PointerDown { at: Point::new(990.0, 110.0) }).await;
        script.handle_event(PageEvent::PointerMove { at: Point::new(400.0, 200.0) }).await;
        script.handle_event(PageEvent::PointerUp { at: Point::new(500.0, 300.0) }).await;

        assert_eq!(script.document().active_pointer_listeners(), 0);
        assert_eq!(store.get(POSITION_KEY).await.unwrap(), Some(json!({ "x": 490.0, "y": 290.0 })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_drag_saves_nothing() {
        let store = Arc::new(MemoryStore::new());
        let mut script = ContentScript::new(example_page("https://example.com/guide"), store.clone());
        script.start().await;

        script.handle_event(PageEvent::PointerDown { at: Point::new(990.0, 110.0) }).await;
        script.handle_event(PageEvent::PointerMove { at: Point::new(500.0, 300.0) }).await;
        script.handle_event(PageEvent::PointerCancel).await;

        assert_eq!(script.document().active_pointer_listeners(), 0);
        assert_eq!(store.get(POSITION_KEY).await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unload_mid_drag_releases_listeners() {
        let mut script = script();
        script.start().await;
        script.handle_event(PageEvent::PointerDown { at: Point::new(990.0, 110.0) }).await;
        assert_eq!(script.document().active_pointer_listeners(), 1);

        script.handle_event(PageEvent::Unload).await;
        assert_eq!(script.document().active_pointer_listeners(), 0);
        assert!(script.document().overlay().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_reported_to_background() {
        let (handle, mut commands) = Background::channel();
        let mut script = script().with_background(handle.for_page(7));
        script.start().await;

        script.handle_event(PageEvent::EntryClicked { index: 42 }).await;

        match commands.try_recv().unwrap() {
            Command::Send { from, to, envelope } => {
                assert_eq!(from, Some(7));
                assert_eq!(to, None);
                match envelope.message {
                    Message::ReportError { error } => assert!(error.contains("entry selection")),
                    other => panic!("unexpected message {:?}", other),
                }
            }
            other => panic!("unexpected command {:?}", other),
        }

        // the page keeps working
        script.handle_event(PageEvent::EntryClicked { index: 1 }).await;
        assert_eq!(script.toc().active_index(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_exit_disconnects_page() {
        let (handle, mut commands) = Background::channel();
        let mut script = script().with_background(handle.for_page(7));
        let (events, rx) = mpsc::unbounded_channel();
        let (_inbox, inbox_rx) = mpsc::unbounded_channel();

        events.send(PageEvent::Unload).unwrap();
        script.run(rx, inbox_rx).await;

        match commands.try_recv().unwrap() {
            Command::Unregister(page) => assert_eq!(page, 7),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_settings_broadcast_reaches_running_page() {
        let background = Background::new(Arc::new(MemoryStore::new()));
        let (handle, commands) = Background::channel();
        let popup = handle.clone();

        let mut script = script();
        let (events, rx) = mpsc::unbounded_channel();

        let run = async {
            let registrar = handle;
            let (page, inbox) = registrar.register_page().await.unwrap();
            assert_eq!(page, 1);
            script.background = Some(registrar.for_page(page));
            drop(registrar);

            script.run(rx, inbox).await;
            // release the page's handle so the background can stop
            script.background = None;
        };

        let driver = async move {
            sleep(Duration::from_millis(10)).await;
            let disabled = Settings {
                enabled: false,
                ..Settings::default()
            };
            let reply = popup.request(Message::UpdateSettings { settings: disabled }).await.unwrap();
            assert_eq!(reply, Reply::Outcome(Outcome::ok()));
            sleep(Duration::from_millis(10)).await;
            events.send(PageEvent::Unload).unwrap();
        };

        let (background, (), ()) = tokio::join!(background.run(commands), run, driver);
        assert!(!script.toc().settings().enabled);
        assert_eq!(script.toc().status().reason.as_deref(), Some("disabled"));
        // the page disconnected when its loop ended
        assert_eq!(background.page_count(), 0);
    }
}
