pub mod text;

use percent_encoding::percent_decode_str;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::block::{Block, Level};
use crate::normalize::normalize;
use crate::page::Page;

/// Separator between breadcrumb segments of a block label.
pub const LABEL_SEPARATOR: &str = " / ";

/// Split a rendered page into heading-scoped blocks.
///
/// The first block is always the level-1 page block. Every `<h2>` and
/// `<h3>` directly under `<body>` opens a block; the text of every other
/// body child is appended to the most recently opened section or
/// subsection. Text that appears before the first `<h2>`/`<h3>` is not
/// attached to the page block, so such pages are only findable by title.
pub fn segment(page: &Page) -> Vec<Block> {
    let base = base_page_label(&page.permalink);
    let document = Html::parse_document(&page.html_string);

    let blocks = body_elements(&document)
        .into_iter()
        .fold(vec![Block::root(page, base.as_str())], |mut blocks, element| {
            match element.value().name() {
                "h2" => {
                    let title = text::visible_text(&element);
                    let label = join_label(&base, &title);
                    blocks.push(heading_block(page, &element, title, label, Level::Section));
                }
                "h3" => {
                    let title = text::visible_text(&element);
                    let parent = blocks
                        .iter()
                        .rev()
                        .find(|b| b.level < Level::Subsection)
                        .map_or(base.as_str(), |b| b.label.as_str());
                    let label = join_label(parent, &title);
                    blocks.push(heading_block(page, &element, title, label, Level::Subsection));
                }
                _ => {
                    if let Some(open) = blocks.last_mut().filter(|b| !b.is_root()) {
                        let text = if text::is_code_container(&element) {
                            text::code_text(&element)
                        } else {
                            text::visible_text(&element)
                        };
                        open.content.push_str(&normalize(&text));
                        open.content.push(' ');
                    }
                }
            }
            blocks
        });

    debug!(permalink = %page.permalink, blocks = blocks.len(), "segmented page");
    blocks
}

/// Breadcrumb for a page derived from its URL path: `.html` stripped,
/// segments percent-decoded, trimmed, empty ones dropped.
///
/// `https://site/docs/getting%20started/install.html` becomes
/// `docs / getting started / install`.
pub fn base_page_label(permalink: &str) -> String {
    let path = url_path(permalink);
    let path = path.strip_suffix(".html").unwrap_or(&path);
    path.split('/')
        .map(|segment| percent_decode_str(segment).decode_utf8_lossy().trim().to_string())
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(LABEL_SEPARATOR)
}

fn url_path(permalink: &str) -> String {
    match Url::parse(permalink) {
        Ok(url) => url.path().to_string(),
        // Relative permalinks: drop query and fragment, keep the path.
        Err(_) => permalink
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

fn join_label(parent: &str, title: &str) -> String {
    format!("{}{}{}", parent, LABEL_SEPARATOR, title)
}

fn heading_block(
    page: &Page,
    heading: &ElementRef<'_>,
    title: String,
    label: String,
    level: Level,
) -> Block {
    let id = heading.value().attr("id").unwrap_or_default();
    Block {
        title,
        label,
        level,
        permalink: format!("{}#{}", page.permalink, id),
        content: String::new(),
    }
}

/// Element children of `<body>`, in document order. Bare text directly
/// under body is not part of any block.
fn body_elements(document: &Html) -> Vec<ElementRef<'_>> {
    let Ok(selector) = Selector::parse("body") else {
        return Vec::new();
    };
    document
        .select(&selector)
        .next()
        .map(|body| body.children().filter_map(ElementRef::wrap).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_from_absolute_url() {
        assert_eq!(
            base_page_label("https://example.com/docs/getting%20started/install.html"),
            "docs / getting started / install"
        );
    }

    #[test]
    fn label_drops_empty_segments() {
        assert_eq!(base_page_label("https://example.com/posts//hello/"), "posts / hello");
        assert_eq!(base_page_label("https://example.com/"), "");
    }

    #[test]
    fn label_decodes_non_ascii() {
        assert_eq!(
            base_page_label("https://example.com/%E6%96%87%E6%A1%A3/%E5%AE%89%E8%A3%85.html"),
            "文档 / 安装"
        );
    }

    #[test]
    fn label_from_relative_path() {
        assert_eq!(base_page_label("/guide/intro.html?x=1#top"), "guide / intro");
    }

    #[test]
    fn only_trailing_html_suffix_is_stripped() {
        assert_eq!(base_page_label("https://e.com/a.html/b.htm"), "a.html / b.htm");
    }
}
