//! Build a page index from a tree of Markdown sources, the way a static
//! site generator would emit it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use pulldown_cmark::{CowStr, Event, HeadingLevel, Options, Parser as CmarkParser, Tag, TagEnd};
use thiserror::Error;
use tracing::debug;

use crate::extract::text::collapse_whitespace;
use crate::page::Page;

/// Characters escaped in permalink path segments.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Render one Markdown source into a page record.
///
/// The first level-1 heading becomes the page title and is left out of the
/// body. Other headings without an explicit `{#id}` get a slug id so that
/// block permalinks have a fragment to point at.
pub fn page_from_markdown(permalink: impl Into<String>, source: &str) -> Page {
    let options =
        Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES | Options::ENABLE_HEADING_ATTRIBUTES;
    let events: Vec<Event<'_>> = CmarkParser::new_ext(source, options).collect();

    let mut title: Option<String> = None;
    let mut slugs = SlugSet::default();
    let mut body: Vec<Event<'_>> = Vec::with_capacity(events.len());
    let mut i = 0;

    while i < events.len() {
        match &events[i] {
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            }) if title.is_none() => {
                i += 1;
                title = Some(collect_heading_text(&events, &mut i));
                continue;
            }
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                let id = match id {
                    Some(id) => {
                        slugs.reserve(id);
                        id.clone()
                    }
                    None => {
                        let mut j = i + 1;
                        let text = collect_heading_text(&events, &mut j);
                        CowStr::from(slugs.unique(&slugify(&text)))
                    }
                };
                body.push(Event::Start(Tag::Heading {
                    level: *level,
                    id: Some(id),
                    classes: classes.clone(),
                    attrs: attrs.clone(),
                }));
            }
            event => body.push(event.clone()),
        }
        i += 1;
    }

    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, body.into_iter());

    Page {
        permalink: permalink.into(),
        title: title.unwrap_or_default(),
        html_string: html,
    }
}

/// Export every `*.md` file under `root` (sorted by path). Permalinks are
/// `base_url` + the relative path with `.md` replaced by `.html`; pages
/// without a level-1 heading are titled after their file stem.
pub fn export_dir(root: &Path, base_url: &str) -> Result<Vec<Page>, ExportError> {
    let mut files = Vec::new();
    collect_markdown(root, &mut files)?;
    files.sort();

    let base = base_url.trim_end_matches('/');
    let mut pages = Vec::with_capacity(files.len());
    for path in files {
        let source = std::fs::read_to_string(&path).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;
        let relative = path.strip_prefix(root).unwrap_or(&path).with_extension("html");
        let url_path = relative
            .components()
            .map(|c| utf8_percent_encode(&c.as_os_str().to_string_lossy(), SEGMENT).to_string())
            .collect::<Vec<_>>()
            .join("/");

        let mut page = page_from_markdown(format!("{}/{}", base, url_path), &source);
        if page.title.is_empty() {
            page.title = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        debug!(permalink = %page.permalink, "exported page");
        pages.push(page);
    }
    Ok(pages)
}

fn collect_markdown(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), ExportError> {
    let entries = std::fs::read_dir(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_markdown(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "md") {
            out.push(path);
        }
    }
    Ok(())
}

/// Collect heading text (all Text and Code events until End(Heading)).
fn collect_heading_text(events: &[Event<'_>], i: &mut usize) -> String {
    let mut text = String::new();
    while *i < events.len() {
        match &events[*i] {
            Event::End(TagEnd::Heading(_)) => {
                *i += 1;
                break;
            }
            Event::Text(s) | Event::Code(s) => text.push_str(s),
            _ => {}
        }
        *i += 1;
    }
    collapse_whitespace(&text)
}

/// Lowercase alphanumerics; whitespace, `-` and `_` become `-`; anything
/// else is dropped.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if (c.is_whitespace() || c == '-' || c == '_') && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// Heading ids already used on a page.
#[derive(Default)]
struct SlugSet {
    seen: HashMap<String, usize>,
}

impl SlugSet {
    fn reserve(&mut self, id: &str) {
        self.seen.entry(id.to_string()).or_insert(0);
    }

    fn unique(&mut self, slug: &str) -> String {
        let slug = if slug.is_empty() { "section" } else { slug };
        match self.seen.get_mut(slug) {
            Some(count) => {
                *count += 1;
                let candidate = format!("{}-{}", slug, count);
                self.seen.insert(candidate.clone(), 0);
                candidate
            }
            None => {
                self.seen.insert(slug.to_string(), 0);
                slug.to_string()
            }
        }
    }
}
