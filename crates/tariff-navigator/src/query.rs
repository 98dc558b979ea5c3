//! Query controller: browse/search mode rule, debounce and response ordering.
//!
//! The controller never sleeps and never owns a timer. Callers pass the
//! current [`Instant`] with every input and poll for due requests, so the
//! debounce behaves the same under any event loop (and in tests).
//!
//! Every issued request carries a sequence number. A response is applied only
//! if it answers the latest request still in effect; anything older is stale
//! and dropped. Leaving search mode invalidates every outstanding request
//! without cancelling the underlying network calls.

use std::time::{Duration, Instant};

use tariff_model::{SearchError, SearchHit};
use tracing::{debug, warn};

use crate::config::NavigatorConfig;

/// Which list the widget shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryMode {
    /// Classification tree.
    #[default]
    Browse,
    /// Flat ranked search results.
    Search,
}

/// A search ready to be sent to the search service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub seq: u64,
    pub query: String,
    pub limit: usize,
}

/// Outcome of a search request, tagged with its sequence number.
#[derive(Debug, Clone)]
pub struct SearchResponse {
    pub seq: u64,
    pub result: Result<Vec<SearchHit>, SearchError>,
}

/// Result set shown in search mode.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SearchResults {
    /// No response applied yet for the current query.
    #[default]
    Pending,
    /// Matches (possibly none) for the query.
    Hits(Vec<SearchHit>),
    /// The search failed; nothing to show, but not "no matches" either.
    Failed(SearchError),
}

impl SearchResults {
    pub fn hits(&self) -> &[SearchHit] {
        match self {
            Self::Hits(hits) => hits,
            Self::Pending | Self::Failed(_) => &[],
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Whether a response was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOutcome {
    Applied,
    Stale,
}

#[derive(Debug, Clone)]
struct PendingSearch {
    query: String,
    due: Instant,
}

/// Decides browse vs search and sequences search requests.
#[derive(Debug, Clone)]
pub struct QueryController {
    min_chars: usize,
    debounce: Duration,
    limit: usize,
    query: String,
    pending: Option<PendingSearch>,
    /// Highest sequence number handed out.
    issued: u64,
    /// Sequence number whose response may still be applied. Always the
    /// highest issued one, or `None` after leaving search mode.
    accepting: Option<u64>,
    results: SearchResults,
    /// Bumped whenever `results` is replaced.
    generation: u64,
}

impl QueryController {
    pub fn new(config: &NavigatorConfig) -> Self {
        Self::with_settings(
            config.search_min_chars,
            config.debounce(),
            config.search_limit,
        )
    }

    pub fn with_settings(min_chars: usize, debounce: Duration, limit: usize) -> Self {
        Self {
            min_chars: min_chars.max(1),
            debounce,
            limit: limit.max(1),
            query: String::new(),
            pending: None,
            issued: 0,
            accepting: None,
            results: SearchResults::Pending,
            generation: 0,
        }
    }

    /// Mode implied by `query` alone.
    pub fn mode_for(&self, query: &str) -> QueryMode {
        if query.chars().count() >= self.min_chars {
            QueryMode::Search
        } else {
            QueryMode::Browse
        }
    }

    pub fn mode(&self) -> QueryMode {
        self.mode_for(&self.query)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &SearchResults {
        &self.results
    }

    /// Changes whenever the result set is replaced.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replace the query text. Restarts the debounce in search mode.
    pub fn set_query(&mut self, text: &str, now: Instant) -> QueryMode {
        if text == self.query {
            return self.mode();
        }
        self.query = text.to_string();
        match self.mode() {
            QueryMode::Browse => {
                self.invalidate();
                self.replace_results(SearchResults::Pending);
            }
            QueryMode::Search => {
                // Previous results stay visible until the next response lands
                self.pending = Some(PendingSearch {
                    query: self.query.clone(),
                    due: now + self.debounce,
                });
            }
        }
        self.mode()
    }

    /// When the next debounced search becomes due.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.due)
    }

    /// Issue the pending search if its debounce elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<SearchRequest> {
        let pending = self.pending.take_if(|p| now >= p.due)?;
        self.issued += 1;
        self.accepting = Some(self.issued);
        debug!(seq = self.issued, query = pending.query.as_str(), "issuing search");
        Some(SearchRequest {
            seq: self.issued,
            query: pending.query,
            limit: self.limit,
        })
    }

    /// Apply `response` if it answers the current request.
    pub fn apply(&mut self, response: SearchResponse) -> ResponseOutcome {
        if self.accepting != Some(response.seq) {
            debug!(seq = response.seq, "discarding stale search response");
            return ResponseOutcome::Stale;
        }
        let results = match response.result {
            Ok(hits) => SearchResults::Hits(hits),
            Err(e) => {
                warn!("search failed: {e}");
                SearchResults::Failed(e)
            }
        };
        self.replace_results(results);
        ResponseOutcome::Applied
    }

    /// Clear the query and drop every outstanding request.
    pub fn close(&mut self) {
        self.query.clear();
        self.invalidate();
        self.replace_results(SearchResults::Pending);
    }

    fn invalidate(&mut self) {
        self.pending = None;
        self.accepting = None;
    }

    fn replace_results(&mut self, results: SearchResults) {
        if results == SearchResults::Pending && self.results == SearchResults::Pending {
            return;
        }
        self.results = results;
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tariff_model::Level;

    fn controller() -> QueryController {
        QueryController::new(&NavigatorConfig::default())
    }

    fn hit(code: &str) -> SearchHit {
        SearchHit::new(code, "Telephones", Level::Subheading)
    }

    #[test]
    fn test_threshold_rule() {
        let controller = controller();
        assert_eq!(controller.mode_for(""), QueryMode::Browse);
        assert_eq!(controller.mode_for("m"), QueryMode::Browse);
        assert_eq!(controller.mode_for("mo"), QueryMode::Search);
        assert_eq!(controller.mode_for("mobile"), QueryMode::Search);
        // Characters, not bytes
        assert_eq!(controller.mode_for("é"), QueryMode::Browse);
    }

    #[test]
    fn test_debounce_restarts_on_each_keystroke() {
        let mut controller = controller();
        let t0 = Instant::now();

        controller.set_query("mo", t0);
        assert_eq!(controller.poll(t0 + Duration::from_millis(200)), None);

        controller.set_query("mob", t0 + Duration::from_millis(200));
        assert_eq!(controller.poll(t0 + Duration::from_millis(400)), None);

        let request = controller.poll(t0 + Duration::from_millis(500)).unwrap();
        assert_eq!(request.seq, 1);
        assert_eq!(request.query, "mob");
        assert_eq!(request.limit, 20);
        assert_eq!(controller.poll(t0 + Duration::from_secs(5)), None);
    }

    #[test]
    fn test_stale_response_rejected() {
        let mut controller = controller();
        let t0 = Instant::now();

        controller.set_query("mo", t0);
        let first = controller.poll(t0 + Duration::from_millis(300)).unwrap();
        controller.set_query("mob", t0 + Duration::from_millis(350));
        let second = controller.poll(t0 + Duration::from_millis(650)).unwrap();
        assert_eq!((first.seq, second.seq), (1, 2));

        let applied = controller.apply(SearchResponse {
            seq: second.seq,
            result: Ok(vec![hit("8517.12.00")]),
        });
        assert_eq!(applied, ResponseOutcome::Applied);

        let late = controller.apply(SearchResponse {
            seq: first.seq,
            result: Ok(vec![hit("0101")]),
        });
        assert_eq!(late, ResponseOutcome::Stale);
        assert_eq!(controller.results().hits()[0].code, "8517.12.00");
    }

    #[test]
    fn test_returning_to_browse_invalidates_in_flight() {
        let mut controller = controller();
        let t0 = Instant::now();

        controller.set_query("mo", t0);
        let request = controller.poll(t0 + Duration::from_millis(300)).unwrap();
        assert_eq!(
            controller.set_query("m", t0 + Duration::from_millis(310)),
            QueryMode::Browse
        );

        let outcome = controller.apply(SearchResponse {
            seq: request.seq,
            result: Ok(vec![hit("0101")]),
        });
        assert_eq!(outcome, ResponseOutcome::Stale);
        assert_eq!(controller.results(), &SearchResults::Pending);
        assert_eq!(controller.next_deadline(), None);
    }

    #[test]
    fn test_failure_is_distinct_from_no_matches() {
        let mut controller = controller();
        let t0 = Instant::now();

        controller.set_query("zz", t0);
        let request = controller.poll(t0 + Duration::from_millis(300)).unwrap();
        controller.apply(SearchResponse {
            seq: request.seq,
            result: Err(SearchError::transport("zz", "503")),
        });
        assert!(controller.results().is_failed());
        assert!(controller.results().hits().is_empty());

        controller.set_query("zzz", t0 + Duration::from_millis(400));
        let request = controller.poll(t0 + Duration::from_millis(700)).unwrap();
        controller.apply(SearchResponse {
            seq: request.seq,
            result: Ok(Vec::new()),
        });
        assert_eq!(controller.results(), &SearchResults::Hits(Vec::new()));
    }

    #[test]
    fn test_generation_tracks_result_identity() {
        let mut controller = controller();
        let t0 = Instant::now();
        let start = controller.generation();

        controller.set_query("a", t0);
        assert_eq!(controller.generation(), start);

        controller.set_query("ab", t0);
        let request = controller.poll(t0 + Duration::from_millis(300)).unwrap();
        controller.apply(SearchResponse {
            seq: request.seq,
            result: Ok(vec![hit("0101")]),
        });
        assert!(controller.generation() > start);
    }
}
