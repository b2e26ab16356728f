//! Drives a [`Session`]: debounces input, runs catalog calls on the tokio
//! runtime and feeds their results back into the session on the owning loop.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::catalog::{Catalog, CatalogError, Category, Episode, Show, StreamUrl};
use crate::config::Config;
use crate::debounce::{Debouncer, Settled};
use crate::notify::{NoticeKind, Notifier};
use crate::player::{PlaybackOptions, Player};
use crate::session::{
    Completion, EpisodesRequest, ResolveRequest, SearchRequest, Session, pagination,
};

/// Results sent back from catalog tasks
#[derive(Debug)]
pub enum StageMessage {
    Search(SearchRequest, Result<Vec<Show>, CatalogError>),
    Episodes(EpisodesRequest, Result<Vec<Episode>, CatalogError>),
    Resolve(ResolveRequest, Result<StreamUrl, CatalogError>),
}

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub debounce: Duration,
    pub page_size: usize,
    pub anime_headers: BTreeMap<String, String>,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(400),
            page_size: pagination::PAGE_SIZE,
            anime_headers: BTreeMap::new(),
        }
    }
}

impl From<&Config> for ControllerSettings {
    fn from(config: &Config) -> Self {
        Self {
            debounce: config.search.debounce(),
            page_size: config.search.page_size,
            anime_headers: config.playback.anime_headers.clone(),
        }
    }
}

pub struct Controller<C, N, P> {
    session: Session,
    catalog: Arc<C>,
    notifier: N,
    player: P,
    anime_headers: BTreeMap<String, String>,

    debouncer: Debouncer<String>,
    settled_rx: mpsc::UnboundedReceiver<Settled<String>>,

    tx: mpsc::UnboundedSender<StageMessage>,
    rx: mpsc::UnboundedReceiver<StageMessage>,
    in_flight: usize,
}

impl<C, N, P> Controller<C, N, P>
where
    C: Catalog,
    N: Notifier,
    P: Player,
{
    pub fn new(catalog: C, notifier: N, player: P, settings: ControllerSettings) -> Self {
        let (debouncer, settled_rx) = Debouncer::new(settings.debounce);
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            session: Session::new(settings.page_size),
            catalog: Arc::new(catalog),
            notifier,
            player,
            anime_headers: settings.anime_headers,
            debouncer,
            settled_rx,
            tx,
            rx,
            in_flight: 0,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    /// Number of catalog calls whose results have not come back yet,
    /// superseded ones included
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Nothing pending: no debounce window open and no call outstanding
    pub fn is_idle(&self) -> bool {
        !self.debouncer.is_pending() && self.in_flight == 0
    }

    // User events

    /// Raw text from the search box
    pub fn input(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.session.set_query(text.clone());
        self.debouncer.push(text);
    }

    pub fn set_category(&mut self, category: Category) {
        let playing = self.is_playing();
        self.session.set_category(category);
        self.stop_if_cleared(playing);
    }

    pub fn toggle_category(&mut self) -> Category {
        let playing = self.is_playing();
        let category = self.session.toggle_category();
        self.stop_if_cleared(playing);
        category
    }

    pub fn select_show(&mut self, index: usize) {
        let playing = self.is_playing();
        if let Some(request) = self.session.select_show(index) {
            self.spawn_episodes(request);
        }
        self.stop_if_cleared(playing);
    }

    /// Select an episode by its position on the current page
    pub fn select_episode(&mut self, slot: usize) {
        if let Some(request) = self.session.select_visible_episode(slot) {
            self.spawn_resolve(request);
        }
    }

    pub fn set_page(&mut self, page: usize) -> bool {
        self.session.set_page(page)
    }

    pub fn next_page(&mut self) -> bool {
        self.session.next_page()
    }

    pub fn previous_page(&mut self) -> bool {
        self.session.previous_page()
    }

    // Event loop plumbing

    /// Apply everything that has already arrived without waiting.
    /// Returns true if anything was processed.
    pub fn pump(&mut self) -> bool {
        let mut changed = false;
        while let Ok(settled) = self.settled_rx.try_recv() {
            self.on_settled(settled);
            changed = true;
        }
        while let Ok(msg) = self.rx.try_recv() {
            self.on_message(msg);
            changed = true;
        }
        changed
    }

    /// Wait for the next debounce emission or stage result and apply it
    pub async fn step(&mut self) {
        tokio::select! {
            Some(settled) = self.settled_rx.recv() => self.on_settled(settled),
            Some(msg) = self.rx.recv() => self.on_message(msg),
        }
    }

    /// Keep stepping until no debounce or catalog call is outstanding
    pub async fn run_until_idle(&mut self) {
        while !self.is_idle() {
            self.step().await;
        }
    }

    fn on_settled(&mut self, settled: Settled<String>) {
        let Some(query) = self.debouncer.accept(settled) else {
            return;
        };
        let playing = self.is_playing();
        if let Some(request) = self.session.commit_query(&query) {
            self.spawn_search(request);
        }
        self.stop_if_cleared(playing);
    }

    pub fn on_message(&mut self, msg: StageMessage) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let playing = self.is_playing();
        self.apply(msg);
        self.stop_if_cleared(playing);
    }

    fn apply(&mut self, msg: StageMessage) {
        match msg {
            StageMessage::Search(request, result) => {
                let outcome = self.session.complete_search(&request, result);
                self.report(outcome, "Search failed");
            }
            StageMessage::Episodes(request, result) => {
                let outcome = self.session.complete_episodes(&request, result);
                self.report(outcome, "Could not load episodes");
            }
            StageMessage::Resolve(request, result) => match self.session.complete_resolve(&request, result) {
                Completion::Applied => self.play(request.category),
                Completion::Empty => {
                    self.notifier
                        .notify(NoticeKind::Info, "No stream available for this episode");
                }
                outcome => self.report(outcome, "Could not load stream"),
            },
        }
    }

    fn report(&mut self, outcome: Completion, message: &str) {
        match outcome {
            Completion::Failed(e) => {
                error!(error = %e, "{}", message);
                self.notifier.notify(NoticeKind::Error, message);
            }
            Completion::Stale => debug!("stale completion discarded"),
            Completion::Applied | Completion::Empty => {}
        }
    }

    fn is_playing(&self) -> bool {
        self.session.current_stream_url().is_some()
    }

    /// The player must never keep showing a stream the session has dropped
    fn stop_if_cleared(&mut self, was_playing: bool) {
        if was_playing && !self.is_playing() {
            debug!("stream cleared, stopping player");
            self.player.stop();
        }
    }

    fn play(&mut self, category: Category) {
        let Some(url) = self.session.current_stream_url() else {
            return;
        };

        let options = PlaybackOptions {
            extra_headers: category
                .wants_playback_headers()
                .then(|| self.anime_headers.clone()),
        };
        if let Err(e) = self.player.render(url, &options) {
            warn!(error = %e, "player failed to start");
            self.notifier.notify(NoticeKind::Error, &e.to_string());
        }
    }

    /// Run `call` on the runtime and report its result as one message.
    /// A panicking call still produces a message so `in_flight` drains.
    fn spawn_call<T, F, W>(&mut self, call: F, wrap: W)
    where
        T: Send + 'static,
        F: Future<Output = Result<T, CatalogError>> + Send + 'static,
        W: FnOnce(Result<T, CatalogError>) -> StageMessage + Send + 'static,
    {
        let tx = self.tx.clone();
        self.in_flight += 1;
        let handle = tokio::spawn(call);
        tokio::spawn(async move {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(CatalogError::TaskFailed(e.to_string())),
            };
            // Receiver gone means the controller was dropped
            let _ = tx.send(wrap(result));
        });
    }

    fn spawn_search(&mut self, request: SearchRequest) {
        let catalog = Arc::clone(&self.catalog);
        let query = request.query.clone();
        let category = request.category;
        self.spawn_call(
            async move { catalog.search(&query, category).await },
            move |result| StageMessage::Search(request, result),
        );
    }

    fn spawn_episodes(&mut self, request: EpisodesRequest) {
        let catalog = Arc::clone(&self.catalog);
        let path = request.show.path.clone();
        let category = request.category;
        self.spawn_call(
            async move { catalog.list_episodes(&path, category).await },
            move |result| StageMessage::Episodes(request, result),
        );
    }

    fn spawn_resolve(&mut self, request: ResolveRequest) {
        let catalog = Arc::clone(&self.catalog);
        let path = request.episode.path.clone();
        let category = request.category;
        self.spawn_call(
            async move { catalog.resolve_episode(&path, category).await },
            move |result| StageMessage::Resolve(request, result),
        );
    }
}
