use sitesearch::{Block, Page, normalize, segment};
use tracing::info;

use crate::config::MatchOptions;
use crate::engine::{MatchEngine, MatchResult};

/// The flattened block collection of a whole site plus the policy used to
/// query it. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    blocks: Vec<Block>,
    options: MatchOptions,
}

impl SearchIndex {
    pub fn build(blocks: Vec<Block>, options: MatchOptions) -> Self {
        info!(blocks = blocks.len(), "search index built");
        SearchIndex { blocks, options }
    }

    /// Segment every page and index all blocks in page order.
    pub fn from_pages(pages: &[Page], options: MatchOptions) -> Self {
        let blocks = pages.iter().flat_map(segment).collect();
        Self::build(blocks, options)
    }

    /// An index with nothing in it; every search comes back empty.
    pub fn empty(options: MatchOptions) -> Self {
        SearchIndex {
            blocks: Vec::new(),
            options,
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Normalize `term` the same way block content was normalized and
    /// hand it to `engine`.
    pub fn search(&self, engine: &dyn MatchEngine, term: &str) -> Vec<MatchResult> {
        if self.blocks.is_empty() {
            return Vec::new();
        }
        let term = normalize(term);
        engine.search(&term, &self.blocks, &self.options)
    }
}
