//! Navigator facade.
//!
//! Ties one node store, one selection history, one query controller, one
//! expansion set and one selection machine into a single session object. UI
//! bindings feed it [`NavigatorEvent`]s, drive the search clock through
//! [`Navigator::tick`] (or the split `poll_search` / `search_task` /
//! `apply_search` trio when searches run on their own tasks) and render
//! [`Navigator::view`].

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tariff_model::{FetchError, Level, SearchError, SearchHit};
use tracing::{debug, info, warn};

use crate::config::NavigatorConfig;
use crate::history::SelectionHistory;
use crate::query::{
    QueryController, QueryMode, ResponseOutcome, SearchRequest, SearchResponse, SearchResults,
};
use crate::selection::{NavigatorEvent, SelectionMachine, WidgetMode};
use crate::source::{ClassificationSource, SearchService};
use crate::storage::KeyValueStore;
use crate::store::NodeStore;
use crate::tree::{ExpansionSet, TreeRow, flatten};

/// Receives the committed classification code.
pub type CodeSelected = Box<dyn FnMut(&str) + Send>;

/// What an event did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Nothing changed.
    Ignored,
    /// State changed; re-render.
    Updated,
    /// A code was selected and the widget closed.
    Committed(String),
}

/// One row of the visible list.
#[derive(Debug, Clone)]
pub enum VisibleItem {
    Row(TreeRow),
    Hit(SearchHit),
}

impl VisibleItem {
    pub fn code(&self) -> &str {
        match self {
            Self::Row(row) => row.code(),
            Self::Hit(hit) => &hit.code,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::Row(row) => &row.node.description,
            Self::Hit(hit) => &hit.description,
        }
    }

    pub fn level(&self) -> Level {
        match self {
            Self::Row(row) => row.node.level,
            Self::Hit(hit) => hit.level,
        }
    }

    /// Tree indentation; search hits are flat.
    pub fn depth(&self) -> usize {
        match self {
            Self::Row(row) => row.depth,
            Self::Hit(_) => 0,
        }
    }
}

/// Read-only snapshot of everything a renderer needs.
#[derive(Debug, Clone)]
pub struct NavigatorView {
    pub mode: WidgetMode,
    pub query: String,
    pub items: Vec<VisibleItem>,
    pub highlighted: Option<usize>,
    /// Waiting for the first response to the current query.
    pub search_pending: bool,
    pub search_error: Option<SearchError>,
    pub fetch_error: Option<FetchError>,
    pub recent: Vec<String>,
    pub favorites: Vec<String>,
}

impl NavigatorView {
    /// The last search failed, as opposed to matching nothing.
    pub fn search_failed(&self) -> bool {
        self.search_error.is_some()
    }

    pub fn highlighted_item(&self) -> Option<&VisibleItem> {
        self.highlighted.and_then(|index| self.items.get(index))
    }
}

/// One lookup session.
pub struct Navigator {
    store: NodeStore,
    search: Arc<dyn SearchService>,
    search_timeout: Option<Duration>,
    history: SelectionHistory,
    query: QueryController,
    selection: SelectionMachine,
    expansion: ExpansionSet,
    fetch_error: Option<FetchError>,
    on_code_selected: CodeSelected,
}

impl Navigator {
    pub fn new(
        config: &NavigatorConfig,
        source: Arc<dyn ClassificationSource>,
        search: Arc<dyn SearchService>,
        storage: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            store: NodeStore::with_timeout(source, config.fetch_timeout()),
            search,
            search_timeout: config.search_timeout(),
            history: SelectionHistory::load(storage, config),
            query: QueryController::new(config),
            selection: SelectionMachine::new(),
            expansion: ExpansionSet::new(),
            fetch_error: None,
            on_code_selected: Box::new(|_| {}),
        }
    }

    /// Register the consumer of committed codes.
    #[must_use]
    pub fn on_code_selected(mut self, callback: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_code_selected = Box::new(callback);
        self
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn history(&self) -> &SelectionHistory {
        &self.history
    }

    pub fn mode(&self) -> WidgetMode {
        self.selection.mode()
    }

    /// Apply one input event.
    pub async fn handle(&mut self, event: NavigatorEvent, now: Instant) -> EventOutcome {
        debug!(?event, mode = ?self.selection.mode(), "navigator event");
        match event {
            NavigatorEvent::Focus => self.focus().await,
            NavigatorEvent::Input(text) => self.input(&text, now).await,
            NavigatorEvent::ArrowDown => {
                let len = self.item_count();
                self.move_highlight(|selection| selection.move_down(len))
            }
            NavigatorEvent::ArrowUp => {
                let len = self.item_count();
                self.move_highlight(|selection| selection.move_up(len))
            }
            NavigatorEvent::ArrowRight => self.expand_highlighted().await,
            NavigatorEvent::ArrowLeft => self.collapse_highlighted(),
            NavigatorEvent::Enter => match self.selection.commit_target(self.item_count()) {
                Some(index) => self.commit(index),
                None => EventOutcome::Ignored,
            },
            NavigatorEvent::Escape | NavigatorEvent::ClickOutside => self.close(),
            NavigatorEvent::ClickRow(index) => {
                if self.selection.mode().is_open() && index < self.item_count() {
                    self.commit(index)
                } else {
                    EventOutcome::Ignored
                }
            }
        }
    }

    /// Next instant at which [`Navigator::tick`] has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.query.next_deadline()
    }

    /// Issue the debounced search if it is due.
    pub fn poll_search(&mut self, now: Instant) -> Option<SearchRequest> {
        self.query.poll(now)
    }

    /// Future running `request` against the search service.
    ///
    /// Owns everything it needs, so it can be spawned and raced freely; the
    /// sequence number sorts out ordering when its response is applied.
    pub fn search_task(
        &self,
        request: SearchRequest,
    ) -> impl Future<Output = SearchResponse> + Send + 'static {
        let service = Arc::clone(&self.search);
        let timeout = self.search_timeout;
        async move { execute_search(service.as_ref(), request, timeout).await }
    }

    /// Apply a search response; stale ones are dropped.
    pub fn apply_search(&mut self, response: SearchResponse) -> ResponseOutcome {
        let generation = self.query.generation();
        let outcome = self.query.apply(response);
        if self.query.generation() != generation {
            self.selection.reset_highlight();
        }
        outcome
    }

    /// Poll, run and apply the due search, if any.
    pub async fn tick(&mut self, now: Instant) -> Option<ResponseOutcome> {
        let request = self.poll_search(now)?;
        let response = self.search_task(request).await;
        Some(self.apply_search(response))
    }

    /// Expand `code` in the browse tree, loading its children if needed.
    pub async fn expand(&mut self, code: &str) -> Result<(), FetchError> {
        match self.store.expand(code).await {
            Ok(children) => {
                self.fetch_error = None;
                if !children.is_empty() {
                    self.expansion.expand(code);
                }
                Ok(())
            }
            Err(e) => {
                warn!("Failed to expand {}: {}", code, e);
                self.fetch_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Hide the children of `code`. Cached children are kept.
    pub fn collapse(&mut self, code: &str) -> bool {
        let collapsed = self.expansion.collapse(code);
        if collapsed {
            self.selection.clamp(self.item_count());
        }
        collapsed
    }

    /// Toggle `code` as a favorite. Returns whether it is a favorite now.
    pub fn toggle_favorite(&mut self, code: &str) -> bool {
        self.history.toggle_favorite(code)
    }

    pub fn is_favorite(&self, code: &str) -> bool {
        self.history.is_favorite(code)
    }

    pub fn view(&self) -> NavigatorView {
        let mode = self.selection.mode();
        let searching = mode == WidgetMode::Searching;
        let search_error = match self.query.results() {
            SearchResults::Failed(e) if searching => Some(e.clone()),
            _ => None,
        };
        NavigatorView {
            mode,
            query: self.query.query().to_string(),
            items: self.items(),
            highlighted: self.selection.highlighted(),
            search_pending: searching && *self.query.results() == SearchResults::Pending,
            search_error,
            fetch_error: self.fetch_error.clone(),
            recent: self.history.recent().to_vec(),
            favorites: self.history.favorites().to_vec(),
        }
    }

    async fn focus(&mut self) -> EventOutcome {
        if !self.selection.open() {
            return EventOutcome::Ignored;
        }
        self.query.close();
        self.expansion.clear();
        self.load_roots().await;
        EventOutcome::Updated
    }

    async fn input(&mut self, text: &str, now: Instant) -> EventOutcome {
        let opened = self.selection.open();
        if !opened && text == self.query.query() {
            return EventOutcome::Ignored;
        }
        if opened {
            self.expansion.clear();
        }
        let mode = self.query.set_query(text, now);
        self.selection.set_query_mode(mode);
        self.selection.reset_highlight();
        if mode == QueryMode::Browse && self.store.cached_roots().is_none() {
            self.load_roots().await;
        }
        EventOutcome::Updated
    }

    async fn load_roots(&mut self) {
        match self.store.roots().await {
            Ok(roots) => {
                debug!(count = roots.len(), "root nodes ready");
                self.fetch_error = None;
            }
            Err(e) => {
                warn!("Failed to load root nodes: {}", e);
                self.fetch_error = Some(e);
            }
        }
    }

    fn move_highlight(&mut self, step: impl FnOnce(&mut SelectionMachine)) -> EventOutcome {
        let before = self.selection.highlighted();
        step(&mut self.selection);
        if self.selection.highlighted() == before {
            EventOutcome::Ignored
        } else {
            EventOutcome::Updated
        }
    }

    fn highlighted_row(&self) -> Option<(usize, TreeRow)> {
        if self.selection.mode() != WidgetMode::Browsing {
            return None;
        }
        let index = self.selection.highlighted()?;
        self.rows().into_iter().nth(index).map(|row| (index, row))
    }

    async fn expand_highlighted(&mut self) -> EventOutcome {
        let Some((index, row)) = self.highlighted_row() else {
            return EventOutcome::Ignored;
        };
        if !row.node.has_children {
            return EventOutcome::Ignored;
        }
        if row.expanded {
            // Already open: step onto the first child
            let len = self.item_count();
            return self.move_highlight(|selection| selection.highlight(index + 1, len));
        }
        // A failed fetch lands in the view's fetch_error
        let _ = self.expand(row.code()).await;
        EventOutcome::Updated
    }

    fn collapse_highlighted(&mut self) -> EventOutcome {
        let Some((index, row)) = self.highlighted_row() else {
            return EventOutcome::Ignored;
        };
        if row.expanded {
            self.collapse(row.code());
            return EventOutcome::Updated;
        }
        let rows = self.rows();
        let parent = rows[..index]
            .iter()
            .rposition(|candidate| candidate.depth + 1 == row.depth);
        match parent {
            Some(parent) => {
                let len = rows.len();
                self.move_highlight(|selection| selection.highlight(parent, len))
            }
            None => EventOutcome::Ignored,
        }
    }

    fn commit(&mut self, index: usize) -> EventOutcome {
        let Some(code) = self.items().get(index).map(|item| item.code().to_string()) else {
            return EventOutcome::Ignored;
        };
        info!(code = code.as_str(), "classification selected");
        self.history.record_recent(&code);
        (self.on_code_selected)(&code);
        self.close();
        EventOutcome::Committed(code)
    }

    fn close(&mut self) -> EventOutcome {
        if !self.selection.mode().is_open() {
            return EventOutcome::Ignored;
        }
        self.selection.close();
        self.query.close();
        EventOutcome::Updated
    }

    fn rows(&self) -> Vec<TreeRow> {
        self.store
            .cached_roots()
            .map(|roots| flatten(&roots, &self.expansion))
            .unwrap_or_default()
    }

    fn items(&self) -> Vec<VisibleItem> {
        match self.selection.mode() {
            WidgetMode::Closed => Vec::new(),
            WidgetMode::Browsing => self.rows().into_iter().map(VisibleItem::Row).collect(),
            WidgetMode::Searching => self
                .query
                .results()
                .hits()
                .iter()
                .cloned()
                .map(VisibleItem::Hit)
                .collect(),
        }
    }

    fn item_count(&self) -> usize {
        match self.selection.mode() {
            WidgetMode::Closed => 0,
            WidgetMode::Browsing => self.rows().len(),
            WidgetMode::Searching => self.query.results().hits().len(),
        }
    }
}

/// Run one search request, turning a hang into [`SearchError::Timeout`].
pub async fn execute_search(
    service: &dyn SearchService,
    request: SearchRequest,
    timeout: Option<Duration>,
) -> SearchResponse {
    let SearchRequest { seq, query, limit } = request;
    let search = service.search_classifications(&query, limit);
    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, search).await {
            Ok(result) => result,
            Err(_) => Err(SearchError::Timeout {
                query: query.clone(),
                timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            }),
        },
        None => search.await,
    };
    SearchResponse { seq, result }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tariff_model::ClassificationNode;

    struct Source;

    #[async_trait]
    impl ClassificationSource for Source {
        async fn fetch_root_nodes(&self) -> Result<Vec<ClassificationNode>, FetchError> {
            Ok(vec![
                ClassificationNode::root("I", "Live animals", true),
                ClassificationNode::root("II", "Vegetable products", true),
            ])
        }

        async fn fetch_children(&self, code: &str) -> Result<Vec<ClassificationNode>, FetchError> {
            Ok(match code {
                "I" => vec![
                    ClassificationNode::child("01", "Live animals", Level::Chapter, "I", true),
                    ClassificationNode::child("02", "Meat", Level::Chapter, "I", false),
                ],
                _ => Vec::new(),
            })
        }
    }

    struct NoSearch;

    #[async_trait]
    impl SearchService for NoSearch {
        async fn search_classifications(
            &self,
            _query: &str,
            _limit: usize,
        ) -> Result<Vec<SearchHit>, SearchError> {
            Ok(Vec::new())
        }
    }

    fn navigator() -> Navigator {
        Navigator::new(
            &NavigatorConfig::default(),
            Arc::new(Source),
            Arc::new(NoSearch),
            Arc::new(MemoryStore::new()),
        )
    }

    fn codes(view: &NavigatorView) -> Vec<&str> {
        view.items.iter().map(VisibleItem::code).collect()
    }

    #[tokio::test]
    async fn test_focus_opens_browse_at_root() {
        let mut nav = navigator();
        let now = Instant::now();
        assert_eq!(nav.handle(NavigatorEvent::Focus, now).await, EventOutcome::Updated);
        let view = nav.view();
        assert_eq!(view.mode, WidgetMode::Browsing);
        assert_eq!(codes(&view), ["I", "II"]);
        assert_eq!(view.highlighted, None);
        assert_eq!(nav.handle(NavigatorEvent::Focus, now).await, EventOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_arrow_keys_walk_the_tree() {
        let mut nav = navigator();
        let now = Instant::now();
        nav.handle(NavigatorEvent::Focus, now).await;
        nav.handle(NavigatorEvent::ArrowDown, now).await;
        nav.handle(NavigatorEvent::ArrowRight, now).await;
        assert_eq!(codes(&nav.view()), ["I", "01", "02", "II"]);
        assert_eq!(nav.view().highlighted, Some(0));

        // Second right steps onto the first child, left returns to the parent
        nav.handle(NavigatorEvent::ArrowRight, now).await;
        assert_eq!(nav.view().highlighted, Some(1));
        nav.handle(NavigatorEvent::ArrowLeft, now).await;
        assert_eq!(nav.view().highlighted, Some(0));

        nav.handle(NavigatorEvent::ArrowLeft, now).await;
        assert_eq!(codes(&nav.view()), ["I", "II"]);
    }

    #[tokio::test]
    async fn test_click_outside_closes_without_commit() {
        let selected = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&selected);
        let mut nav = navigator().on_code_selected(move |code| {
            sink.lock().unwrap().push(code.to_string());
        });
        let now = Instant::now();
        nav.handle(NavigatorEvent::Focus, now).await;
        nav.handle(NavigatorEvent::ArrowDown, now).await;
        nav.handle(NavigatorEvent::ClickOutside, now).await;

        assert_eq!(nav.mode(), WidgetMode::Closed);
        assert!(selected.lock().unwrap().is_empty());
        assert!(nav.history().recent().is_empty());
    }

    #[tokio::test]
    async fn test_refocus_resets_expansion() {
        let mut nav = navigator();
        let now = Instant::now();
        nav.handle(NavigatorEvent::Focus, now).await;
        nav.expand("I").await.unwrap();
        assert_eq!(nav.view().items.len(), 4);

        nav.handle(NavigatorEvent::Escape, now).await;
        nav.handle(NavigatorEvent::Focus, now).await;
        assert_eq!(codes(&nav.view()), ["I", "II"]);
    }

    #[tokio::test]
    async fn test_collapse_clamps_highlight() {
        let mut nav = navigator();
        let now = Instant::now();
        nav.handle(NavigatorEvent::Focus, now).await;
        nav.expand("I").await.unwrap();
        for _ in 0..4 {
            nav.handle(NavigatorEvent::ArrowDown, now).await;
        }
        assert_eq!(nav.view().highlighted, Some(3));
        assert!(nav.collapse("I"));
        assert_eq!(nav.view().highlighted, Some(1));
    }
}
