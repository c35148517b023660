use std::path::Path;

use sitesearch::normalize::char_len;
use sitesearch::page::read_index;
use sitesearch::{Highlighter, Level, normalize};
use tracing::{debug, warn};

use crate::config::SearchConfig;
use crate::engine::{FuzzyEngine, MatchEngine};
use crate::index::SearchIndex;

/// A render-ready search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub title: String,
    pub label: String,
    pub permalink: String,
    pub level: Level,
    /// Highlighted excerpts of the block's content; `None` for title hits.
    pub snippet: Option<String>,
    pub score: f64,
}

/// One search surface: an index loaded once, queried per keystroke.
pub struct Session {
    index: SearchIndex,
    engine: Box<dyn MatchEngine>,
    highlighter: Highlighter,
}

impl Session {
    pub fn new(index: SearchIndex, highlighter: Highlighter) -> Self {
        Session {
            index,
            engine: Box::new(FuzzyEngine),
            highlighter,
        }
    }

    /// Swap the match engine, e.g. for a deterministic stub.
    pub fn with_engine(mut self, engine: impl MatchEngine + 'static) -> Self {
        self.engine = Box::new(engine);
        self
    }

    /// Load the page index at `path`. A file that cannot be read or parsed
    /// is logged and leaves the session with an empty index.
    pub fn load(path: &Path, config: &SearchConfig) -> Self {
        let index = match read_index(path) {
            Ok(pages) => SearchIndex::from_pages(&pages, config.matching.clone()),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "search index unavailable, searches will return nothing");
                SearchIndex::empty(config.matching.clone())
            }
        };
        Session::new(
            index,
            Highlighter::new(config.snippet.to_highlight_options()),
        )
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    /// Run one query.
    ///
    /// A blank term performs no search and returns `None`, so callers keep
    /// whatever they are currently showing. Otherwise the hits are returned
    /// best first, possibly none.
    pub fn search(&self, raw_term: &str) -> Option<Vec<SearchHit>> {
        let term = raw_term.trim();
        if term.is_empty() {
            return None;
        }

        let min_range_length = char_len(&normalize(term));
        let results = self.index.search(self.engine.as_ref(), term);
        debug!(term, results = results.len(), "search");

        let hits = results
            .into_iter()
            .filter_map(|result| {
                let block = self.index.blocks().get(result.ref_index)?;
                Some(SearchHit {
                    title: block.title.clone(),
                    label: block.label.clone(),
                    permalink: block.permalink.clone(),
                    level: block.level,
                    snippet: self
                        .highlighter
                        .highlight_matches(&result.matches, min_range_length),
                    score: result.score,
                })
            })
            .collect();
        Some(hits)
    }
}
