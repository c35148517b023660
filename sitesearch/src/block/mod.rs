use std::fmt;

use serde::{Deserialize, Serialize};

use crate::page::Page;

/// Heading depth a block is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Level {
    /// The whole page; carries no body text.
    Page = 1,
    /// Opened by an `<h2>`.
    Section = 2,
    /// Opened by an `<h3>`.
    Subsection = 3,
}

impl From<Level> for u8 {
    fn from(level: Level) -> u8 {
        level as u8
    }
}

impl TryFrom<u8> for Level {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Level::Page),
            2 => Ok(Level::Section),
            3 => Ok(Level::Subsection),
            other => Err(format!("unsupported block level {}", other)),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

/// A heading-scoped, addressable piece of a page.
/// Blocks are the unit that gets indexed and returned as a search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Heading text, or the page title for the root block.
    pub title: String,
    /// Breadcrumb path shown with a result, segments joined by `" / "`.
    pub label: String,
    pub level: Level,
    /// Page URL, plus `#<heading id>` for sections and subsections.
    pub permalink: String,
    /// Normalized text following the heading, up to the next `<h2>` or
    /// `<h3>`. Always empty for the page block.
    pub content: String,
}

impl Block {
    /// The level-1 block every page starts with.
    pub fn root(page: &Page, label: impl Into<String>) -> Self {
        Block {
            title: page.title.clone(),
            label: label.into(),
            level: Level::Page,
            permalink: page.permalink.clone(),
            content: String::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.level == Level::Page
    }
}

/// Searchable fields of a block, in descending weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Content,
}

impl Field {
    pub const ALL: [Field; 2] = [Field::Title, Field::Content];

    pub fn value(self, block: &Block) -> &str {
        match self {
            Field::Title => &block.title,
            Field::Content => &block.content,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Title => write!(f, "title"),
            Field::Content => write!(f, "content"),
        }
    }
}

/// An inclusive range of character (not byte) offsets into one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MatchRange {
    pub start: usize,
    pub end: usize,
}

impl MatchRange {
    pub fn new(start: usize, end: usize) -> Self {
        MatchRange { start, end }
    }

    /// Number of characters covered; zero for an inverted range.
    pub fn len(&self) -> usize {
        if self.end < self.start {
            0
        } else {
            self.end - self.start + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<(usize, usize)> for MatchRange {
    fn from((start, end): (usize, usize)) -> Self {
        MatchRange::new(start, end)
    }
}

/// The hits a match engine reports for one field of one block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMatch {
    pub key: Field,
    /// The field text the indices point into.
    pub value: String,
    pub indices: Vec<MatchRange>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_serializes_as_number() {
        let json = serde_json::to_string(&Level::Subsection).unwrap();
        assert_eq!(json, "3");
        let level: Level = serde_json::from_str("2").unwrap();
        assert_eq!(level, Level::Section);
        assert!(serde_json::from_str::<Level>("4").is_err());
    }

    #[test]
    fn levels_are_ordered_by_depth() {
        assert!(Level::Page < Level::Section);
        assert!(Level::Section < Level::Subsection);
    }

    #[test]
    fn range_length_is_inclusive() {
        assert_eq!(MatchRange::new(4, 8).len(), 5);
        assert_eq!(MatchRange::new(3, 3).len(), 1);
        assert!(MatchRange::new(5, 2).is_empty());
    }
}
