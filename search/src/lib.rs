pub mod config;
pub mod engine;
pub mod index;
pub mod panel;
pub mod query;
pub mod session;

pub use config::{ConfigError, MatchOptions, SearchConfig, SnippetOptions};
pub use engine::{FuzzyEngine, MatchEngine, MatchResult};
pub use index::SearchIndex;
pub use panel::{Effect, Focus, Intent, Panel};
pub use session::{SearchHit, Session};
