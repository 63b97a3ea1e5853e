//! Turns raw markup or document bytes into sectioned plain text plus outbound links.

use crate::error::{Result, ScanError};
use crate::fetcher::{ContentKind, FetchedBody};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

/// Section label used when no heading precedes the content.
pub const DEFAULT_SECTION: &str = "Auto";

/// Elements whose content is never visible on the rendered page.
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg"];

/// Class or id tokens marking site chrome rather than page content.
const BOILERPLATE_NAMES: &[&str] = &[
    "navigation", "nav", "navbar", "menu", "sidebar", "header", "footer",
];

const BLOCK_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "li", "blockquote", "pre", "td", "dd",
];

struct Selectors {
    anchor: Selector,
    base: Selector,
    og_title: Selector,
    title: Selector,
    h1: Selector,
    roots: Vec<Selector>,
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| Selectors {
    anchor: Selector::parse("a[href]").expect("anchor selector"),
    base: Selector::parse("base[href]").expect("base selector"),
    og_title: Selector::parse(r#"meta[property="og:title"]"#).expect("og:title selector"),
    title: Selector::parse("title").expect("title selector"),
    h1: Selector::parse("h1").expect("h1 selector"),
    roots: [r#"[role="main"]"#, "main", "article", "body"]
        .iter()
        .map(|s| Selector::parse(s).expect("root selector"))
        .collect(),
});

/// A run of content blocks sharing one heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub label: String,
    pub blocks: Vec<String>,
    /// Outer HTML of each block, parallel to `blocks`. Empty for non-HTML sources.
    pub fragments: Vec<String>,
}

impl Section {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            blocks: Vec::new(),
            fragments: Vec::new(),
        }
    }

    pub fn with_block(mut self, block: impl Into<String>) -> Self {
        self.blocks.push(block.into());
        self
    }

    /// Blocks joined by blank lines so paragraph boundaries survive into chunking.
    pub fn text(&self) -> String {
        self.blocks.join("\n\n")
    }

    /// Markup of the whole section, if it came from HTML.
    pub fn markup(&self) -> Option<String> {
        (!self.fragments.is_empty()).then(|| self.fragments.concat())
    }

    fn push_html_block(&mut self, text: String, html: String) {
        self.blocks.push(text);
        self.fragments.push(html);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub title: Option<String>,
    pub sections: Vec<Section>,
    pub links: Vec<Url>,
}

impl ExtractedDocument {
    pub fn plain_text(&self) -> String {
        self.sections
            .iter()
            .map(Section::text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|s| s.blocks.is_empty())
    }
}

/// Dispatch on the payload kind. Link discovery only happens for HTML with a base URL.
pub fn extract(body: &FetchedBody, base: Option<&Url>) -> Result<ExtractedDocument> {
    match body.kind() {
        ContentKind::Html => Ok(extract_html(&body.text(), base)),
        ContentKind::Pdf => extract_pdf(&body.bytes),
        ContentKind::PlainText => Ok(extract_plain_text(&body.text())),
        ContentKind::Unsupported => Err(ScanError::UnsupportedFormat(
            body.content_type.clone().unwrap_or_else(|| "unknown".to_string()),
        )),
    }
}

pub fn extract_html(html: &str, base: Option<&Url>) -> ExtractedDocument {
    let document = Html::parse_document(html);
    let root = pick_root(&document);

    let links = match base {
        Some(base) => extract_links(&document, base),
        None => Vec::new(),
    };

    let mut sections = collect_sections(root);
    if sections.is_empty() {
        let text = visible_text(&root);
        if !text.is_empty() {
            sections.push(Section::new(DEFAULT_SECTION).with_block(text));
        }
    }

    ExtractedDocument {
        title: extract_title(&document),
        sections,
        links,
    }
}

/// One section per physical page, labelled `Page N`.
///
/// `pdf-extract` panics on some malformed files (undefined fonts, font
/// dictionaries without `/Subtype`), so the parse runs under `catch_unwind`
/// and a panic surfaces as a [`ScanError::ParseError`] like any other bad PDF.
pub fn extract_pdf(bytes: &[u8]) -> Result<ExtractedDocument> {
    let pages = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
        .map_err(|panic_info| {
            ScanError::ParseError(format!("PDF: parser panicked: {}", panic_message(&panic_info)))
        })?
        .map_err(|e| ScanError::ParseError(format!("PDF: {}", e)))?;

    let sections = pages
        .iter()
        .enumerate()
        .filter_map(|(idx, page)| {
            let text = collapse_whitespace(page);
            (!text.is_empty()).then(|| Section::new(format!("Page {}", idx + 1)).with_block(text))
        })
        .collect();

    Ok(ExtractedDocument {
        title: None,
        sections,
        links: Vec::new(),
    })
}

fn panic_message(panic_info: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

pub fn extract_plain_text(text: &str) -> ExtractedDocument {
    let mut section = Section::new(DEFAULT_SECTION);
    let mut paragraph = String::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            flush_paragraph(&mut section, &mut paragraph);
        } else {
            paragraph.push_str(line);
            paragraph.push('\n');
        }
    }
    flush_paragraph(&mut section, &mut paragraph);

    let sections = if section.blocks.is_empty() {
        Vec::new()
    } else {
        vec![section]
    };

    ExtractedDocument {
        title: None,
        sections,
        links: Vec::new(),
    }
}

fn flush_paragraph(section: &mut Section, paragraph: &mut String) {
    let text = collapse_whitespace(paragraph);
    if !text.is_empty() {
        section.blocks.push(text);
    }
    paragraph.clear();
}

/// Resolve every anchor against the document base, dropping unusable targets.
pub fn extract_links(document: &Html, page_url: &Url) -> Vec<Url> {
    let base = document
        .select(&SELECTORS.base)
        .next()
        .and_then(|el| el.value().attr("href"))
        .and_then(|href| page_url.join(href).ok())
        .unwrap_or_else(|| page_url.clone());

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&SELECTORS.anchor) {
        if let Some(href) = element.value().attr("href")
            && let Some(url) = resolve_link(&base, page_url, href)
            && seen.insert(url.clone())
        {
            debug!("Found link: {}", url);
            links.push(url);
        }
    }

    links
}

/// Resolve one `href`. Returns `None` for empty, fragment-only, non-navigational
/// schemes, or a fragment pointing back at the current page.
pub fn resolve_link(base: &Url, page_url: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let mut url = base.join(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let had_fragment = url.fragment().is_some();
    url.set_fragment(None);

    if had_fragment {
        let mut current = page_url.clone();
        current.set_fragment(None);
        if url == current {
            return None;
        }
    }

    Some(url)
}

fn extract_title(document: &Html) -> Option<String> {
    let og = document
        .select(&SELECTORS.og_title)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(collapse_whitespace);

    og.filter(|t| !t.is_empty())
        .or_else(|| first_text(document, &SELECTORS.title))
        .or_else(|| first_text(document, &SELECTORS.h1))
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(|el| visible_text(&el))
        .filter(|t| !t.is_empty())
}

fn pick_root(document: &Html) -> ElementRef<'_> {
    SELECTORS
        .roots
        .iter()
        .find_map(|selector| document.select(selector).next())
        .unwrap_or_else(|| document.root_element())
}

fn collect_sections(root: ElementRef<'_>) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current = Section::new(DEFAULT_SECTION);

    for element in root.descendent_elements() {
        let tag = element.value().name();
        if !BLOCK_TAGS.contains(&tag)
            || is_boilerplate(element)
            || has_claimed_ancestor(&element, &root)
        {
            continue;
        }

        let text = visible_text(&element);
        if text.is_empty() {
            continue;
        }

        if is_heading(tag) {
            if !current.blocks.is_empty() {
                sections.push(current);
            }
            current = Section::new(text);
        } else {
            current.push_html_block(text, element.html());
        }
    }

    if !current.blocks.is_empty() {
        sections.push(current);
    }
    sections
}

fn is_heading(tag: &str) -> bool {
    matches!(tag, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

/// True when an ancestor below `root` is hidden, boilerplate, or itself a recorded block.
fn has_claimed_ancestor(element: &ElementRef<'_>, root: &ElementRef<'_>) -> bool {
    element
        .ancestors()
        .take_while(|node| node.id() != root.id())
        .filter_map(ElementRef::wrap)
        .any(|el| {
            let name = el.value().name();
            HIDDEN_TAGS.contains(&name) || BLOCK_TAGS.contains(&name) || is_boilerplate(el)
        })
}

/// Navigation, page-level header/footer, and containers named like menus or sidebars.
/// A `header` or `footer` inside `article`, `main` or `section` belongs to that content.
fn is_boilerplate(element: ElementRef<'_>) -> bool {
    let value = element.value();
    match value.name() {
        "nav" => return true,
        "header" | "footer" => {
            return !element
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|a| matches!(a.value().name(), "article" | "main" | "section"));
        }
        _ => {}
    }

    value.classes().chain(value.id()).any(|name| {
        name.to_ascii_lowercase()
            .split(['-', '_'])
            .any(|part| BOILERPLATE_NAMES.contains(&part))
    })
}

fn visible_text(element: &ElementRef<'_>) -> String {
    let mut raw = String::new();
    for node in element.descendants() {
        if let Some(text) = node.value().as_text() {
            let hidden = node
                .ancestors()
                .take_while(|a| a.id() != element.id())
                .filter_map(ElementRef::wrap)
                .any(|a| HIDDEN_TAGS.contains(&a.value().name()) || is_boilerplate(a));
            if !hidden {
                raw.push_str(text);
            }
        } else if let Some(el) = node.value().as_element()
            && (el.name() == "br" || BLOCK_TAGS.contains(&el.name()))
        {
            raw.push(' ');
        }
    }
    collapse_whitespace(&raw)
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}
