pub mod block;
pub mod export;
pub mod extract;
pub mod highlight;
pub mod normalize;
pub mod page;

pub use block::{Block, Field, FieldMatch, Level, MatchRange};
pub use extract::segment;
pub use highlight::{HighlightOptions, Highlighter};
pub use normalize::normalize;
pub use page::{IndexError, Page};
