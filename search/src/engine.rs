use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use sitesearch::{Block, Field, FieldMatch, MatchRange};

use crate::config::MatchOptions;
use crate::query::{self, Token, TokenKind};

/// A scored hit against one block of the corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    /// Position of the block in the corpus that was searched.
    pub ref_index: usize,
    /// 0.0 is a perfect match, 1.0 the worst accepted.
    pub score: f64,
    /// Matched fields, title before content.
    pub matches: Vec<FieldMatch>,
}

/// The matching capability the index delegates to.
///
/// Implementations receive an already normalized term and return results
/// best first.
pub trait MatchEngine {
    fn search(&self, term: &str, corpus: &[Block], options: &MatchOptions) -> Vec<MatchResult>;
}

/// Default engine: exact occurrences first, skim fuzzy alignment otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct FuzzyEngine;

impl MatchEngine for FuzzyEngine {
    fn search(&self, term: &str, corpus: &[Block], options: &MatchOptions) -> Vec<MatchResult> {
        let tokens: Vec<Token> = query::parse(term, options.extended)
            .into_iter()
            .filter(|t| t.text.chars().count() >= options.min_match_char_length)
            .collect();
        if tokens.is_empty() {
            return Vec::new();
        }

        let matcher = if options.ignore_case {
            SkimMatcherV2::default().ignore_case()
        } else {
            SkimMatcherV2::default().respect_case()
        };

        let mut results: Vec<MatchResult> = corpus
            .iter()
            .enumerate()
            .filter_map(|(ref_index, block)| {
                let (score, matches) = match_block(&matcher, &tokens, block, options)?;
                Some(MatchResult {
                    ref_index,
                    score,
                    matches,
                })
            })
            .collect();

        // Stable: ties keep corpus order.
        results.sort_by(|a, b| a.score.total_cmp(&b.score));
        results
    }
}

fn match_block(
    matcher: &SkimMatcherV2,
    tokens: &[Token],
    block: &Block,
    options: &MatchOptions,
) -> Option<(f64, Vec<FieldMatch>)> {
    let total_weight = options.total_weight();
    let mut score = 1.0;
    let mut matches = Vec::new();

    for field in Field::ALL {
        let value = field.value(block);
        if value.is_empty() {
            continue;
        }
        let Some((error, indices)) = match_field(matcher, tokens, value, options) else {
            continue;
        };
        score *= error.max(f64::EPSILON).powf(options.weight(field) / total_weight);
        matches.push(FieldMatch {
            key: field,
            value: value.to_string(),
            indices,
        });
    }

    if matches.is_empty() {
        None
    } else {
        Some((score, matches))
    }
}

/// All tokens must hold for the field. Returns the mean token error and
/// the sorted, deduplicated hit ranges.
fn match_field(
    matcher: &SkimMatcherV2,
    tokens: &[Token],
    value: &str,
    options: &MatchOptions,
) -> Option<(f64, Vec<MatchRange>)> {
    let haystack = fold(value, options.ignore_case);
    let mut errors = 0.0;
    let mut scored = 0usize;
    let mut ranges = Vec::new();

    for token in tokens {
        let needle = fold(&token.text, options.ignore_case);
        let (error, mut hits) = match_token(matcher, token, &needle, &haystack, value, options)?;
        if !token.kind.is_inverse() {
            errors += error;
            scored += 1;
        }
        ranges.append(&mut hits);
    }

    // A query made only of exclusions matches nothing.
    if scored == 0 {
        return None;
    }

    ranges.sort();
    ranges.dedup();
    Some((errors / scored as f64, ranges))
}

fn match_token(
    matcher: &SkimMatcherV2,
    token: &Token,
    needle: &[char],
    haystack: &[char],
    value: &str,
    options: &MatchOptions,
) -> Option<(f64, Vec<MatchRange>)> {
    let whole = || vec![MatchRange::new(0, haystack.len().saturating_sub(1))];
    let exact = |hit: bool, ranges: Vec<MatchRange>| hit.then_some((0.0, ranges));

    match token.kind {
        TokenKind::Include => {
            let hits = occurrences(haystack, needle);
            exact(!hits.is_empty(), hits)
        }
        TokenKind::Exact => exact(haystack == needle, whole()),
        TokenKind::Prefix => exact(
            haystack.starts_with(needle),
            vec![MatchRange::new(0, needle.len() - 1)],
        ),
        TokenKind::Suffix => {
            let start = haystack.len().saturating_sub(needle.len());
            exact(
                haystack.ends_with(needle),
                vec![MatchRange::new(start, haystack.len().saturating_sub(1))],
            )
        }
        TokenKind::InverseInclude => exact(occurrences(haystack, needle).is_empty(), Vec::new()),
        TokenKind::InversePrefix => exact(!haystack.starts_with(needle), Vec::new()),
        TokenKind::InverseSuffix => exact(!haystack.ends_with(needle), Vec::new()),
        TokenKind::Fuzzy => {
            let hits = occurrences(haystack, needle);
            if !hits.is_empty() {
                return Some((0.0, hits));
            }
            fuzzy(matcher, &token.text, needle.len(), value, options)
        }
    }
}

/// Skim alignment compressed into contiguous runs. The error is the
/// number of breaks in the alignment relative to the pattern length, so a
/// single skipped or swapped character stays under the default threshold.
fn fuzzy(
    matcher: &SkimMatcherV2,
    pattern: &str,
    pattern_len: usize,
    value: &str,
    options: &MatchOptions,
) -> Option<(f64, Vec<MatchRange>)> {
    let (_, indices) = matcher.fuzzy_indices(value, pattern)?;
    let runs = contiguous_runs(&indices);
    let breaks = runs.len().saturating_sub(1);
    let error = breaks as f64 / pattern_len.max(1) as f64;
    if runs.is_empty() || error > options.threshold {
        return None;
    }
    let runs: Vec<MatchRange> = runs
        .into_iter()
        .filter(|r| r.len() >= options.min_match_char_length)
        .collect();
    Some((error, runs))
}

/// Every (possibly overlapping) position where `needle` occurs.
fn occurrences(haystack: &[char], needle: &[char]) -> Vec<MatchRange> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return Vec::new();
    }
    haystack
        .windows(needle.len())
        .enumerate()
        .filter(|(_, window)| *window == needle)
        .map(|(start, _)| MatchRange::new(start, start + needle.len() - 1))
        .collect()
}

fn contiguous_runs(indices: &[usize]) -> Vec<MatchRange> {
    let mut runs: Vec<MatchRange> = Vec::new();
    for &i in indices {
        match runs.last_mut() {
            Some(run) if run.end + 1 == i => run.end = i,
            _ => runs.push(MatchRange::new(i, i)),
        }
    }
    runs
}

/// One char in, one char out, so offsets stay aligned with the unfolded text.
fn fold(text: &str, ignore_case: bool) -> Vec<char> {
    text.chars()
        .map(|c| {
            if ignore_case {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitesearch::Level;

    fn block(title: &str, content: &str) -> Block {
        Block {
            title: title.to_string(),
            label: format!("site / {}", title),
            level: Level::Section,
            permalink: format!("https://e.com/p.html#{}", title.to_lowercase()),
            content: content.to_string(),
        }
    }

    fn search(term: &str, corpus: &[Block]) -> Vec<MatchResult> {
        FuzzyEngine.search(term, corpus, &MatchOptions::default())
    }

    #[test]
    fn runs_from_indices() {
        assert_eq!(
            contiguous_runs(&[1, 2, 3, 7, 9, 10]),
            vec![
                MatchRange::new(1, 3),
                MatchRange::new(7, 7),
                MatchRange::new(9, 10)
            ]
        );
        assert!(contiguous_runs(&[]).is_empty());
    }

    #[test]
    fn finds_all_occurrences_case_insensitively() {
        let corpus = [block("Intro", "Rust is fast. RUST is safe.")];
        let results = search("rust", &corpus);
        assert_eq!(results.len(), 1);
        let content = &results[0].matches[0];
        assert_eq!(content.key, Field::Content);
        assert_eq!(
            content.indices,
            vec![MatchRange::new(0, 3), MatchRange::new(14, 17)]
        );
        assert_eq!(results[0].score, f64::EPSILON.powf(1.0 / 3.0));
    }

    #[test]
    fn title_matches_come_first_and_rank_higher() {
        let corpus = [
            block("Other", "mentions install once"),
            block("Install", "how to install"),
        ];
        let results = search("install", &corpus);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].ref_index, 1);
        assert_eq!(results[0].matches[0].key, Field::Title);
        assert_eq!(results[0].matches[1].key, Field::Content);
        assert_eq!(results[1].ref_index, 0);
    }

    #[test]
    fn fuzzy_tolerates_a_typo() {
        let corpus = [block("Setup", "configure the daemon first")];
        let results = search("configre", &corpus);
        assert_eq!(results.len(), 1);
        assert!(results[0].score > 0.0);
        assert!(
            results[0].matches[0]
                .indices
                .iter()
                .all(|r| r.len() >= 2)
        );
    }

    #[test]
    fn unrelated_terms_do_not_match() {
        let corpus = [block("Setup", "configure the daemon first")];
        assert!(search("kubernetes", &corpus).is_empty());
    }

    #[test]
    fn single_character_terms_match_nothing() {
        let corpus = [block("A", "a a a")];
        assert!(search("a", &corpus).is_empty());
    }

    #[test]
    fn extended_operators() {
        let corpus = [
            block("Linux", "install with apt"),
            block("macOS", "install with brew"),
        ];
        let results = search("install !brew", &corpus);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].ref_index, 0);

        let results = search("^install apt$", &corpus);
        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0].matches[0].indices,
            vec![MatchRange::new(0, 6), MatchRange::new(13, 15)]
        );

        let results = search("=linux", &corpus);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].matches[0].key, Field::Title);

        assert!(search("!brew", &corpus).is_empty());
    }

    #[test]
    fn case_sensitive_when_configured() {
        let corpus = [block("X", "Rust rust")];
        let options = MatchOptions {
            ignore_case: false,
            ..MatchOptions::default()
        };
        let results = FuzzyEngine.search("'Rust", &corpus, &options);
        assert_eq!(results[0].matches[0].indices, vec![MatchRange::new(0, 3)]);
    }

    #[test]
    fn offsets_count_characters() {
        let corpus = [block("中文", "这是 Rust 文档")];
        let results = search("rust", &corpus);
        assert_eq!(results[0].matches[0].indices, vec![MatchRange::new(3, 6)]);
    }
}
