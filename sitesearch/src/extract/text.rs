use scraper::{ElementRef, Node, Selector};

/// Subtrees that never contribute visible text.
const HIDDEN: &[&str] = &["script", "style", "template", "noscript"];

/// Elements whose boundaries separate words even without whitespace in
/// the markup.
const BREAKING: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "details", "div", "dl", "dt",
    "figcaption", "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr",
    "li", "main", "nav", "ol", "p", "pre", "section", "summary", "table", "tbody", "td",
    "tfoot", "th", "thead", "tr", "ul",
];

/// Rendered text of an element, whitespace collapsed. `<pre>` keeps its
/// text verbatim.
pub fn visible_text(element: &ElementRef<'_>) -> String {
    if element.value().name() == "pre" {
        return raw_text(element);
    }
    let mut raw = String::new();
    collect_text(element, &mut raw);
    collapse_whitespace(&raw)
}

/// Text of a syntax-highlighted code container: only the nested
/// `code[data-lang]` element, so line-number gutters are skipped.
/// Containers without that element fall back to their visible text.
pub fn code_text(container: &ElementRef<'_>) -> String {
    let code = Selector::parse("code[data-lang]")
        .ok()
        .and_then(|selector| container.select(&selector).next());
    match code {
        Some(code) => raw_text(&code),
        None => visible_text(container),
    }
}

pub fn is_code_container(element: &ElementRef<'_>) -> bool {
    element.value().classes().any(|class| class == "highlight")
}

/// Strip leading/trailing whitespace, collapse interior whitespace.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn raw_text(element: &ElementRef<'_>) -> String {
    element.text().collect()
}

fn collect_text(element: &ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if HIDDEN.contains(&name) {
                    continue;
                }
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                let breaking = BREAKING.contains(&name);
                if breaking {
                    out.push(' ');
                }
                collect_text(&child, out);
                if breaking {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}
