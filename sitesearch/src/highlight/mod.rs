use crate::block::{Block, Field, FieldMatch, MatchRange};

/// Characters that count as a natural break when deciding whether a
/// truncated excerpt needs an ellipsis. Covers ASCII and CJK punctuation.
pub const BOUNDARY_CHARS: [char; 9] = [' ', ',', '，', '.', '。', '!', '！', '?', '？'];

/// Rendering knobs for result excerpts.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightOptions {
    /// Characters of context kept on each side of a hit.
    pub context: usize,
    /// Most excerpts rendered for one block.
    pub max_excerpts: usize,
    pub ellipsis: String,
    pub emphasis_open: String,
    pub emphasis_close: String,
    /// Placed between excerpts of the same block.
    pub separator: String,
    pub container_open: String,
    pub container_close: String,
}

impl Default for HighlightOptions {
    fn default() -> Self {
        HighlightOptions {
            context: 15,
            max_excerpts: 4,
            ellipsis: "...".to_string(),
            emphasis_open: r#"<span class="highlight">"#.to_string(),
            emphasis_close: "</span>".to_string(),
            separator: "&nbsp;&nbsp;&nbsp;&nbsp;".to_string(),
            container_open: r#"<div class="highlight-container">"#.to_string(),
            container_close: "</div>".to_string(),
        }
    }
}

/// Turns match ranges into short excerpts with the hits emphasized.
#[derive(Debug, Clone, Default)]
pub struct Highlighter {
    options: HighlightOptions,
}

impl Highlighter {
    pub fn new(options: HighlightOptions) -> Self {
        Highlighter { options }
    }

    pub fn options(&self) -> &HighlightOptions {
        &self.options
    }

    /// Render excerpts of `block.content` around `ranges`.
    ///
    /// Ranges shorter than `min_range_length` are noise and dropped; at most
    /// `max_excerpts` of the rest are rendered. Returns `None` when nothing
    /// is left to show.
    pub fn highlight(
        &self,
        block: &Block,
        ranges: &[MatchRange],
        min_range_length: usize,
    ) -> Option<String> {
        self.highlight_text(&block.content, ranges, min_range_length)
    }

    /// Render the first field match an engine reported for a block. A title
    /// hit renders nothing: the title is already shown in the label.
    pub fn highlight_matches(
        &self,
        matches: &[FieldMatch],
        min_range_length: usize,
    ) -> Option<String> {
        let first = matches.first()?;
        if first.key == Field::Title {
            return None;
        }
        self.highlight_text(&first.value, &first.indices, min_range_length)
    }

    pub fn highlight_text(
        &self,
        text: &str,
        ranges: &[MatchRange],
        min_range_length: usize,
    ) -> Option<String> {
        let chars: Vec<char> = text.chars().collect();
        let excerpts: Vec<String> = ranges
            .iter()
            .filter(|range| range.len() >= min_range_length.max(1))
            .filter_map(|range| clamp(*range, chars.len()))
            .take(self.options.max_excerpts)
            .map(|range| self.excerpt(&chars, range))
            .collect();

        if excerpts.is_empty() {
            return None;
        }

        Some(format!(
            "{}{}{}",
            self.options.container_open,
            excerpts.join(&self.options.separator),
            self.options.container_close
        ))
    }

    fn excerpt(&self, chars: &[char], range: MatchRange) -> String {
        let opts = &self.options;
        let len = chars.len();

        let prefix_start = range.start.saturating_sub(opts.context);
        let suffix_end = (range.end + 1 + opts.context).min(len);

        let mut prefix: String = chars[prefix_start..range.start].iter().collect();
        let matched: String = chars[range.start..=range.end].iter().collect();
        let mut suffix: String = chars[range.end + 1..suffix_end].iter().collect();

        if prefix_start > 0 {
            // First non-whitespace char of the prefix; look one before it.
            let kept = chars[prefix_start..range.start]
                .iter()
                .skip_while(|c| c.is_whitespace())
                .count();
            let start = range.start - kept;
            if !is_boundary(chars[start - 1]) {
                prefix.insert_str(0, &opts.ellipsis);
            }
        }

        if suffix_end < len {
            let kept = chars[range.end + 1..suffix_end]
                .iter()
                .rev()
                .skip_while(|c| c.is_whitespace())
                .count();
            let end = range.end + 1 + kept;
            if !is_boundary(chars[end]) {
                suffix.push_str(&opts.ellipsis);
            }
        }

        format!(
            "{}{}{}{}{}",
            prefix, opts.emphasis_open, matched, opts.emphasis_close, suffix
        )
    }
}

fn is_boundary(c: char) -> bool {
    BOUNDARY_CHARS.contains(&c)
}

/// Ranges starting past the text are dropped; ends are clamped.
fn clamp(range: MatchRange, len: usize) -> Option<MatchRange> {
    if range.is_empty() || range.start >= len {
        return None;
    }
    Some(MatchRange::new(range.start, range.end.min(len - 1)))
}
