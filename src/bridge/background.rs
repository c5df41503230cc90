use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::sync::{mpsc, oneshot};

use crate::bridge::messages::{Envelope, Message, Outcome, Reply};
use crate::bridge::store::{load_settings, SettingsStore};
use crate::config::{validate_settings, SETTINGS_KEY};
use crate::utils::error::{TocError, TocResult};

/// Identifies one connected page
pub type PageId = u64;

/// Work queued for the background process
#[derive(Debug)]
pub enum Command {
    /// A message for the background itself, or forwarded to page `to`
    Send {
        from: Option<PageId>,
        to: Option<PageId>,
        envelope: Envelope,
    },
    /// Connect a page; its messages arrive on `inbox`
    Register {
        inbox: mpsc::UnboundedSender<Envelope>,
        reply: oneshot::Sender<PageId>,
    },
    Unregister(PageId),
}

/// Cheap, cloneable way to talk to a running [`Background`]
#[derive(Debug, Clone)]
pub struct BackgroundHandle {
    tx: mpsc::UnboundedSender<Command>,
    page: Option<PageId>,
}

impl BackgroundHandle {
    /// Handle whose messages are attributed to `page`
    pub fn for_page(&self, page: PageId) -> Self {
        BackgroundHandle {
            tx: self.tx.clone(),
            page: Some(page),
        }
    }

    pub fn page(&self) -> Option<PageId> {
        self.page
    }

    /// Send without waiting for a reply; false when the background is gone
    pub fn notify(&self, message: Message) -> bool {
        self.tx
            .send(Command::Send {
                from: self.page,
                to: None,
                envelope: Envelope::notify(message),
            })
            .is_ok()
    }

    /// Send to the background and wait for its reply
    pub async fn request(&self, message: Message) -> TocResult<Reply> {
        self.send_and_wait(None, message).await
    }

    /// Send to one page through the background and wait for its reply
    pub async fn request_page(&self, page: PageId, message: Message) -> TocResult<Reply> {
        self.send_and_wait(Some(page), message).await
    }

    async fn send_and_wait(&self, to: Option<PageId>, message: Message) -> TocResult<Reply> {
        let kind = message.kind();
        let (envelope, rx) = Envelope::request(message);
        self.tx
            .send(Command::Send {
                from: self.page,
                to,
                envelope,
            })
            .map_err(|_| TocError::Message("Background is not running".to_string()))?;

        rx.await
            .map_err(|_| TocError::Message(format!("No reply to {}", kind)))
    }

    /// Connect a page and get the receiving end of its inbox
    pub async fn register_page(&self) -> TocResult<(PageId, mpsc::UnboundedReceiver<Envelope>)> {
        let (inbox, rx) = mpsc::unbounded_channel();
        let (reply, id) = oneshot::channel();
        self.tx
            .send(Command::Register { inbox, reply })
            .map_err(|_| TocError::Message("Background is not running".to_string()))?;

        let id = id
            .await
            .map_err(|_| TocError::Message("Registration dropped".to_string()))?;
        Ok((id, rx))
    }

    pub fn unregister_page(&self, page: PageId) {
        let _ = self.tx.send(Command::Unregister(page));
    }
}

/// Long-lived coordinator owning the settings store.
///
/// Answers settings requests, persists updates and pushes them to every
/// other connected page. A page whose inbox has closed is dropped from the
/// registry the first time a send to it fails.
pub struct Background {
    store: Arc<dyn SettingsStore>,
    pages: HashMap<PageId, mpsc::UnboundedSender<Envelope>>,
    next_page: PageId,
}

impl Background {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Background {
            store,
            pages: HashMap::new(),
            next_page: 1,
        }
    }

    /// Command channel for [`Background::run`]
    pub fn channel() -> (BackgroundHandle, mpsc::UnboundedReceiver<Command>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (BackgroundHandle { tx, page: None }, rx)
    }

    pub fn register_page(&mut self, inbox: mpsc::UnboundedSender<Envelope>) -> PageId {
        let id = self.next_page;
        self.next_page += 1;
        self.pages.insert(id, inbox);
        debug!("Page {} connected", id);
        id
    }

    pub fn unregister_page(&mut self, page: PageId) {
        if self.pages.remove(&page).is_some() {
            debug!("Page {} disconnected", page);
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Handle one message addressed to the background
    pub async fn handle(&mut self, from: Option<PageId>, message: Message) -> Option<Reply> {
        match message {
            Message::GetSettings => Some(Reply::Settings(load_settings(self.store.as_ref()).await)),
            Message::UpdateSettings { settings } => {
                if let Err(e) = validate_settings(&settings) {
                    warn!("Rejected settings update: {}", e);
                    return Some(Reply::Outcome(Outcome::failed(e.to_string())));
                }

                let value = match serde_json::to_value(&settings) {
                    Ok(value) => value,
                    Err(e) => return Some(Reply::Outcome(Outcome::failed(e.to_string()))),
                };
                if let Err(e) = self.store.set(SETTINGS_KEY, value).await {
                    error!("Failed to save settings: {}", e);
                    return Some(Reply::Outcome(Outcome::failed(e.to_string())));
                }

                let delivered = self.broadcast(from, Message::SettingsUpdated { settings });
                info!("Settings saved, notified {} page(s)", delivered);
                Some(Reply::Outcome(Outcome::ok()))
            }
            Message::ReportError { error } => {
                match from {
                    Some(page) => error!("Page {} reported: {}", page, error),
                    None => error!("Reported: {}", error),
                }
                None
            }
            other => {
                debug!("{} is handled by pages, not the background", other.kind());
                Some(Reply::Outcome(Outcome::failed(format!(
                    "{} must be sent to a page",
                    other.kind()
                ))))
            }
        }
    }

    /// Send `message` to every page except `except`; returns how many took it
    pub fn broadcast(&mut self, except: Option<PageId>, message: Message) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();
        for (page, inbox) in &self.pages {
            if Some(*page) == except {
                continue;
            }
            match inbox.send(Envelope::notify(message.clone())) {
                Ok(()) => delivered += 1,
                Err(_) => closed.push(*page),
            }
        }

        for page in closed {
            debug!("Page {} is gone, dropped", page);
            self.pages.remove(&page);
        }
        delivered
    }

    /// Process commands until every handle is dropped
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) -> Self {
        while let Some(command) = commands.recv().await {
            match command {
                Command::Send { from, to: Some(page), envelope } => {
                    match self.pages.get(&page) {
                        Some(inbox) => {
                            if let Err(mpsc::error::SendError(envelope)) = inbox.send(envelope) {
                                debug!("Page {} is gone, dropped", page);
                                self.pages.remove(&page);
                                envelope.respond(Reply::Outcome(Outcome::failed("page closed")));
                            }
                        }
                        None => {
                            debug!("Message from {:?} to unknown page {}", from, page);
                            envelope.respond(Reply::Outcome(Outcome::failed("unknown page")));
                        }
                    }
                }
                Command::Send { from, to: None, envelope } => {
                    if let Some(response) = self.handle(from, envelope.message.clone()).await {
                        envelope.respond(response);
                    }
                }
                Command::Register { inbox, reply } => {
                    let id = self.register_page(inbox);
                    let _ = reply.send(id);
                }
                Command::Unregister(page) => self.unregister_page(page),
            }
        }
        debug!("Background stopped");
        self
    }
}
