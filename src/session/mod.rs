//! Session state for the search → episodes → stream pipeline.
//!
//! All mutation goes through the transitions on [`Session`]. Triggers hand
//! out a request carrying a [`Ticket`]; the matching `complete_*` call applies
//! the result only if that ticket is still current for its stage, so a late
//! response from an abandoned query or selection can never overwrite newer
//! state.

pub mod pagination;
mod stage;

pub use stage::{Stage, StageStatus, Ticket};

use tracing::{debug, info};

use crate::catalog::{CatalogError, Category, Episode, Show, StreamUrl};
use pagination::{page_offset, page_slice, total_pages};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub ticket: Ticket,
    pub query: String,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodesRequest {
    pub ticket: Ticket,
    pub show: Show,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    pub ticket: Ticket,
    pub episode: Episode,
    pub category: Category,
}

/// What happened when a stage completion was handed to the session
#[derive(Debug)]
pub enum Completion {
    /// Result applied and carried data
    Applied,
    /// Result applied but the payload was empty (no shows, no episodes, no stream)
    Empty,
    /// Ticket was superseded; nothing changed
    Stale,
    /// Remote call failed; stage is now in `Error`
    Failed(CatalogError),
}

impl Completion {
    pub fn is_stale(&self) -> bool {
        matches!(self, Completion::Stale)
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    query: String,
    category: Category,

    shows: Vec<Show>,
    episodes: Vec<Episode>,
    selected_show: Option<Show>,
    current_episode: Option<Episode>,
    current_stream_url: Option<String>,
    title: String,

    page_size: usize,
    page_index: usize,
    total_pages: usize,

    search: Stage,
    episode_list: Stage,
    resolve: Stage,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(pagination::PAGE_SIZE)
    }
}

impl Session {
    pub fn new(page_size: usize) -> Self {
        Self {
            query: String::new(),
            category: Category::default(),
            shows: Vec::new(),
            episodes: Vec::new(),
            selected_show: None,
            current_episode: None,
            current_stream_url: None,
            title: String::new(),
            page_size: page_size.max(1),
            page_index: 1,
            total_pages: 0,
            search: Stage::default(),
            episode_list: Stage::default(),
            resolve: Stage::default(),
        }
    }

    // Accessors

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn shows(&self) -> &[Show] {
        &self.shows
    }

    pub fn episodes(&self) -> &[Episode] {
        &self.episodes
    }

    pub fn selected_show(&self) -> Option<&Show> {
        self.selected_show.as_ref()
    }

    pub fn selected_show_title(&self) -> &str {
        &self.title
    }

    pub fn current_episode(&self) -> Option<&Episode> {
        self.current_episode.as_ref()
    }

    pub fn current_stream_url(&self) -> Option<&str> {
        self.current_stream_url.as_deref()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn search_status(&self) -> StageStatus {
        self.search.status()
    }

    pub fn episodes_status(&self) -> StageStatus {
        self.episode_list.status()
    }

    pub fn resolve_status(&self) -> StageStatus {
        self.resolve.status()
    }

    /// Episodes on the current page
    pub fn visible_episodes(&self) -> &[Episode] {
        page_slice(&self.episodes, self.page_index, self.page_size)
    }

    /// Page controls only make sense with more than one page
    pub fn shows_page_selector(&self) -> bool {
        self.total_pages > 1
    }

    /// Search finished with zero shows
    pub fn no_shows_found(&self) -> bool {
        self.search.status().is_success() && self.shows.is_empty()
    }

    /// Episode list finished with zero episodes
    pub fn no_episodes_yet(&self) -> bool {
        self.episode_list.status().is_success() && self.episodes.is_empty()
    }

    // Transitions

    /// Record raw (not yet debounced) input
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Act on a debounced query. A non-empty query starts a search; an empty
    /// one only drops the relevance of any search still in flight.
    pub fn commit_query(&mut self, query: &str) -> Option<SearchRequest> {
        if query.trim().is_empty() {
            if self.search.status().is_loading() {
                debug!("query cleared, abandoning in-flight search");
            }
            self.search.invalidate();
            return None;
        }

        self.reset_downstream();
        let ticket = self.search.begin();
        info!(query, generation = ticket.generation(), "search triggered");
        Some(SearchRequest {
            ticket,
            query: query.to_string(),
            category: self.category,
        })
    }

    /// Switch category. Identifiers from one category are meaningless in the
    /// other, so everything derived from the old one is dropped. Does not
    /// start a search by itself.
    pub fn set_category(&mut self, category: Category) -> bool {
        if category == self.category {
            return false;
        }
        info!(category = category.as_str(), "category switched");
        self.category = category;
        self.reset_downstream();
        self.shows.clear();
        self.search.invalidate();
        true
    }

    pub fn toggle_category(&mut self) -> Category {
        self.set_category(self.category.toggled());
        self.category
    }

    /// Clear everything below the search stage: episodes, paging, title and
    /// stream, and orphan any episode or resolve call still in flight.
    pub fn reset_downstream(&mut self) {
        self.episodes.clear();
        self.selected_show = None;
        self.current_episode = None;
        self.current_stream_url = None;
        self.title.clear();
        self.page_index = 1;
        self.total_pages = 0;
        self.episode_list.invalidate();
        self.resolve.invalidate();
    }

    pub fn select_show(&mut self, index: usize) -> Option<EpisodesRequest> {
        let show = self.shows.get(index)?.clone();

        self.reset_downstream();
        let ticket = self.episode_list.begin();
        info!(show = %show.name, path = %show.path, generation = ticket.generation(), "episode list triggered");
        Some(EpisodesRequest {
            ticket,
            show,
            category: self.category,
        })
    }

    /// Select an episode by its index in the full episode list
    pub fn select_episode(&mut self, index: usize) -> Option<ResolveRequest> {
        let episode = self.episodes.get(index)?.clone();

        let ticket = self.resolve.begin();
        info!(episode = %episode.name, path = %episode.path, generation = ticket.generation(), "stream resolve triggered");
        Some(ResolveRequest {
            ticket,
            episode,
            category: self.category,
        })
    }

    /// Select an episode by its position on the current page
    pub fn select_visible_episode(&mut self, slot: usize) -> Option<ResolveRequest> {
        if slot >= self.visible_episodes().len() {
            return None;
        }
        self.select_episode(page_offset(self.page_index, self.page_size) + slot)
    }

    pub fn set_page(&mut self, page: usize) -> bool {
        if page == 0 || page > self.total_pages || page == self.page_index {
            return false;
        }
        self.page_index = page;
        true
    }

    pub fn next_page(&mut self) -> bool {
        self.set_page(self.page_index + 1)
    }

    pub fn previous_page(&mut self) -> bool {
        self.set_page(self.page_index.saturating_sub(1))
    }

    // Completions

    pub fn complete_search(
        &mut self,
        request: &SearchRequest,
        result: Result<Vec<Show>, CatalogError>,
    ) -> Completion {
        if !self.search.is_current(request.ticket) {
            debug!(query = %request.query, generation = request.ticket.generation(), "discarding stale search result");
            return Completion::Stale;
        }

        match result {
            Ok(shows) => {
                info!(query = %request.query, count = shows.len(), "search complete");
                self.reset_downstream();
                self.shows = shows;
                self.search.finish(request.ticket, StageStatus::Success);
                if self.shows.is_empty() {
                    Completion::Empty
                } else {
                    Completion::Applied
                }
            }
            Err(e) => {
                self.search.finish(request.ticket, StageStatus::Error);
                Completion::Failed(e)
            }
        }
    }

    pub fn complete_episodes(
        &mut self,
        request: &EpisodesRequest,
        result: Result<Vec<Episode>, CatalogError>,
    ) -> Completion {
        if !self.episode_list.is_current(request.ticket) {
            debug!(show = %request.show.name, generation = request.ticket.generation(), "discarding stale episode list");
            return Completion::Stale;
        }

        match result {
            Ok(episodes) => {
                info!(show = %request.show.name, count = episodes.len(), "episode list complete");
                self.total_pages = total_pages(episodes.len(), self.page_size);
                self.episodes = episodes;
                self.page_index = 1;
                self.title = request.show.name.clone();
                self.selected_show = Some(request.show.clone());
                self.current_episode = None;
                self.current_stream_url = None;
                self.episode_list
                    .finish(request.ticket, StageStatus::Success);
                if self.episodes.is_empty() {
                    Completion::Empty
                } else {
                    Completion::Applied
                }
            }
            Err(e) => {
                self.episodes.clear();
                self.total_pages = 0;
                self.page_index = 1;
                self.episode_list.finish(request.ticket, StageStatus::Error);
                Completion::Failed(e)
            }
        }
    }

    pub fn complete_resolve(
        &mut self,
        request: &ResolveRequest,
        result: Result<StreamUrl, CatalogError>,
    ) -> Completion {
        if !self.resolve.is_current(request.ticket) {
            debug!(episode = %request.episode.name, generation = request.ticket.generation(), "discarding stale stream");
            return Completion::Stale;
        }

        match result {
            Ok(stream) => {
                self.resolve.finish(request.ticket, StageStatus::Success);
                let Some(url) = stream.playable() else {
                    info!(episode = %request.episode.name, "episode has no stream");
                    return Completion::Empty;
                };

                let show_title = self
                    .selected_show
                    .as_ref()
                    .map(|show| show.name.as_str())
                    .unwrap_or_default();
                self.title = request.episode.display_title(show_title, request.category);
                self.current_stream_url = Some(url.to_string());
                self.current_episode = Some(request.episode.clone());
                info!(title = %self.title, "stream resolved");
                Completion::Applied
            }
            Err(e) => {
                self.resolve.finish(request.ticket, StageStatus::Error);
                Completion::Failed(e)
            }
        }
    }
}
