use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use search::{SearchConfig, SearchHit, SearchIndex, Session};
use sitesearch::{Block, Highlighter, Page, segment};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectedBlock {
    /// 1 = page, 2 = section, 3 = subsection.
    pub level: u8,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub permalink: Option<String>,

    /// Substring that must appear in the block's content.
    #[serde(default)]
    pub content_contains: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectedQuery {
    pub term: String,

    /// Permalink of the best hit.
    #[serde(default)]
    pub expect_first: Option<String>,

    /// Substring of the best hit's snippet.
    #[serde(default)]
    pub expect_snippet_contains: Option<String>,

    /// The query must return no hits.
    #[serde(default)]
    pub expect_none: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Permalink the page is served under.
    #[serde(default = "default_permalink")]
    pub permalink: String,

    #[serde(default)]
    pub title: String,

    /// Expected blocks, in order. If present (even empty), the block count
    /// is checked too.
    #[serde(default)]
    pub expect_blocks: Option<Vec<ExpectedBlock>>,

    #[serde(default)]
    pub queries: Vec<ExpectedQuery>,
}

fn default_permalink() -> String {
    "https://example.com/page.html".to_string()
}

/// Parse a `.test.html` file into its TOML config and page HTML.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}'); // strip BOM

    if !content.starts_with("---") {
        return Err("missing opening --- frontmatter delimiter".into());
    }

    let after_open = &content[3..];
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest_start = close_pos + 4; // skip \n---
    let html = after_open[rest_start..]
        .strip_prefix("\r\n")
        .or_else(|| after_open[rest_start..].strip_prefix('\n'))
        .unwrap_or(&after_open[rest_start..]);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, html))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

fn run_single_test(path: &Path) -> TestResult {
    let fail = |description: Option<String>, reason: String| TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Fail(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };

    let (config, html) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => return fail(None, format!("frontmatter error: {}", e)),
    };

    let description = config.description.clone();
    let page = Page::new(config.permalink.as_str(), config.title.as_str(), html);
    let blocks = segment(&page);

    if let Some(expected) = &config.expect_blocks {
        if let Some(reason) = check_blocks(&blocks, expected) {
            return fail(description, reason);
        }
    }

    if !config.queries.is_empty() {
        let search_config = SearchConfig::default();
        let index = SearchIndex::build(blocks, search_config.matching.clone());
        let session = Session::new(
            index,
            Highlighter::new(search_config.snippet.to_highlight_options()),
        );
        for query in &config.queries {
            let hits = session.search(&query.term).unwrap_or_default();
            if let Some(reason) = check_query(query, &hits) {
                return fail(description, reason);
            }
        }
    }

    TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Pass,
    }
}

/// Check segmented blocks against expectations. Returns `Some(reason)` on mismatch.
fn check_blocks(actual: &[Block], expected: &[ExpectedBlock]) -> Option<String> {
    if actual.len() != expected.len() {
        let actual_labels: Vec<String> = actual
            .iter()
            .map(|b| format!("  - [{}] {}", b.level, b.label))
            .collect();
        return Some(format!(
            "expected {} block(s), got {}\n  actual blocks:\n{}",
            expected.len(),
            actual.len(),
            actual_labels.join("\n")
        ));
    }

    for (i, (block, expected)) in actual.iter().zip(expected).enumerate() {
        if u8::from(block.level) != expected.level {
            return Some(format!(
                "block[{}]: expected level {}, got {}",
                i, expected.level, block.level
            ));
        }
        if let Some(label) = &expected.label {
            if &block.label != label {
                return Some(format!(
                    "block[{}]: label mismatch\n  expected: {}\n  actual:   {}",
                    i, label, block.label
                ));
            }
        }
        if let Some(permalink) = &expected.permalink {
            if &block.permalink != permalink {
                return Some(format!(
                    "block[{}]: permalink mismatch\n  expected: {}\n  actual:   {}",
                    i, permalink, block.permalink
                ));
            }
        }
        if let Some(needle) = &expected.content_contains {
            if !block.content.contains(needle.as_str()) {
                return Some(format!(
                    "block[{}]: expected content containing \"{}\", got: {}",
                    i, needle, block.content
                ));
            }
        }
    }

    None
}

fn check_query(query: &ExpectedQuery, hits: &[SearchHit]) -> Option<String> {
    let term = &query.term;
    if query.expect_none {
        return match hits.first() {
            None => None,
            Some(hit) => Some(format!(
                "query \"{}\": expected no hits, got {} (first: {})",
                term,
                hits.len(),
                hit.permalink
            )),
        };
    }

    let Some(first) = hits.first() else {
        return Some(format!("query \"{}\": expected hits, got none", term));
    };

    if let Some(permalink) = &query.expect_first {
        if &first.permalink != permalink {
            return Some(format!(
                "query \"{}\": first hit mismatch\n  expected: {}\n  actual:   {}",
                term, permalink, first.permalink
            ));
        }
    }

    if let Some(needle) = &query.expect_snippet_contains {
        match &first.snippet {
            Some(snippet) if snippet.contains(needle.as_str()) => {}
            Some(snippet) => {
                return Some(format!(
                    "query \"{}\": expected snippet containing \"{}\", got: {}",
                    term, needle, snippet
                ));
            }
            None => {
                return Some(format!(
                    "query \"{}\": expected snippet containing \"{}\", but hit has no snippet",
                    term, needle
                ));
            }
        }
    }

    None
}

/// Discover `.test.html` files grouped by category (subfolder relative to root).
/// Files directly in `root` get category "" (uncategorized).
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
        } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.ends_with(".test.html") {
                let category = path
                    .parent()
                    .and_then(|p| p.strip_prefix(root).ok())
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
                    .unwrap_or_default();
                out.entry(category).or_default().push(path);
            }
        }
    }
}

/// List available categories for the given test path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no .test.html files found in {}", path.display());
        return;
    }

    eprintln!("available categories:");
    for (cat, files) in &categories {
        let label = if cat.is_empty() { "(root)" } else { cat.as_str() };
        eprintln!("  {} ({} tests)", label, files.len());
    }
}

fn pass_label(no_color: bool) -> &'static str {
    if no_color { "PASS" } else { "\x1b[32mPASS\x1b[0m" }
}

fn fail_label(no_color: bool) -> &'static str {
    if no_color { "FAIL" } else { "\x1b[31mFAIL\x1b[0m" }
}

fn ok_label(no_color: bool) -> &'static str {
    if no_color { "ok" } else { "\x1b[32mok\x1b[0m" }
}

fn failed_label(no_color: bool) -> &'static str {
    if no_color { "FAILED" } else { "\x1b[31mFAILED\x1b[0m" }
}

fn bold(s: &str, no_color: bool) -> String {
    if no_color {
        s.to_string()
    } else {
        format!("\x1b[1m{}\x1b[0m", s)
    }
}

fn display_name<'a>(result: &'a TestResult) -> &'a str {
    result.description.as_deref().unwrap_or_else(|| {
        result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .and_then(|s| s.strip_suffix(".test.html"))
            .unwrap_or("?")
    })
}

/// Run all `.test.html` files under `path` (or a single file).
/// If `categories` is non-empty, only run tests in those categories.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    // Single file mode ignores categories.
    let run_categories: BTreeMap<String, Vec<PathBuf>> = if path.is_file() {
        BTreeMap::from([(String::new(), vec![path.to_path_buf()])])
    } else {
        let all_categories = discover_categorized(path);
        if all_categories.is_empty() {
            eprintln!("no .test.html files found in {}", path.display());
            return 1;
        }
        select_categories(all_categories, categories)
    };

    if run_categories.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let single = path.is_file();
    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (cat, files) in &run_categories {
        if !single {
            let header = if cat.is_empty() { "(root)" } else { cat.as_str() };
            eprintln!();
            eprintln!("{}", bold(header, no_color));
        }

        for file in files {
            let result = run_single_test(file);
            match &result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", pass_label(no_color), display_name(&result));
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", fail_label(no_color), display_name(&result));
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for f in &failures {
            eprintln!();
            eprintln!("  --- {} ---", f.path.display());
            if let TestOutcome::Fail(reason) = &f.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    let failed = failures.len();
    if failed == 0 {
        eprintln!("test result: {}. {} passed, 0 failed", ok_label(no_color), passed);
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            failed_label(no_color),
            passed,
            failed,
            passed + failed
        );
        1
    }
}

/// Keep the requested categories and their subcategories; all of them when
/// none are requested.
fn select_categories(
    all: BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<String, Vec<PathBuf>> {
    if requested.is_empty() {
        return all;
    }

    for req in requested {
        let req = req.trim_matches('/');
        let found = all
            .keys()
            .any(|cat| cat == req || cat.starts_with(&format!("{}/", req)));
        if !found {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                req,
                all.keys()
                    .map(|k| if k.is_empty() { "(root)" } else { k.as_str() })
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }

    all.into_iter()
        .filter(|(cat, _)| {
            requested.iter().any(|req| {
                let req = req.trim_matches('/');
                cat == req || cat.starts_with(&format!("{}/", req))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"---
description = "two sections"
permalink = "https://example.com/docs/guide.html"
title = "Guide"

[[expect_blocks]]
level = 1
label = "docs / guide"

[[expect_blocks]]
level = 2
label = "docs / guide / Install"
permalink = "https://example.com/docs/guide.html#install"
content_contains = "cargo install"

[[queries]]
term = "cargo"
expect_first = "https://example.com/docs/guide.html#install"
expect_snippet_contains = '<span class="highlight">cargo</span>'

[[queries]]
term = "qqqq"
expect_none = true
---
<h2 id="install">Install</h2>
<p>Run cargo install to get started.</p>
"#;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn frontmatter_splits_config_and_html() {
        let (config, html) = parse_test_file(FIXTURE).unwrap();
        assert_eq!(config.description.as_deref(), Some("two sections"));
        assert_eq!(config.expect_blocks.as_ref().map(Vec::len), Some(2));
        assert_eq!(config.queries.len(), 2);
        assert!(html.starts_with("<h2 id=\"install\">"));
    }

    #[test]
    fn missing_delimiters_are_reported() {
        assert!(parse_test_file("<p>no frontmatter</p>").is_err());
        assert!(parse_test_file("---\ntitle = \"x\"\n<p>unterminated</p>").is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = parse_test_file("---\nexpect_output = \"x\"\n---\n").unwrap_err();
        assert!(err.contains("TOML parse error"));
    }

    #[test]
    fn passing_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "guide.test.html", FIXTURE);
        let result = run_single_test(&path);
        if let TestOutcome::Fail(reason) = &result.outcome {
            panic!("unexpected failure: {}", reason);
        }
    }

    #[test]
    fn wrong_block_count_fails() {
        let dir = tempfile::tempdir().unwrap();
        let content = FIXTURE.replace("<h2 id=\"install\">Install</h2>", "<h2>Setup</h2><h2 id=\"install\">Install</h2>");
        let path = write(dir.path(), "guide.test.html", &content);
        match run_single_test(&path).outcome {
            TestOutcome::Fail(reason) => assert!(reason.contains("expected 2 block(s), got 3")),
            TestOutcome::Pass => panic!("expected failure"),
        }
    }

    #[test]
    fn unexpected_hit_fails() {
        let dir = tempfile::tempdir().unwrap();
        let content = FIXTURE.replace("term = \"qqqq\"", "term = \"install\"");
        let path = write(dir.path(), "guide.test.html", &content);
        match run_single_test(&path).outcome {
            TestOutcome::Fail(reason) => assert!(reason.contains("expected no hits")),
            TestOutcome::Pass => panic!("expected failure"),
        }
    }

    #[test]
    fn categories_follow_subfolders() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "top.test.html", FIXTURE);
        write(dir.path(), "extract/a.test.html", FIXTURE);
        write(dir.path(), "extract/nested/b.test.html", FIXTURE);
        write(dir.path(), "extract/notes.md", "ignored");

        let all = discover_categorized(dir.path());
        let names: Vec<&str> = all.keys().map(String::as_str).collect();
        assert_eq!(names, ["", "extract", "extract/nested"]);

        let picked = select_categories(all, &["extract".to_string()]);
        assert_eq!(picked.len(), 2);
        assert!(!picked.contains_key(""));
    }

    #[test]
    fn exit_code_reflects_failures() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "good.test.html", FIXTURE);
        assert_eq!(run_tests(dir.path(), true, &[]), 0);

        write(dir.path(), "bad.test.html", "not a fixture");
        assert_eq!(run_tests(dir.path(), true, &[]), 1);
    }
}
