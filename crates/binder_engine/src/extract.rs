use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

/// Placeholder substituted for embedded images during normalization.
pub const IMAGE_PLACEHOLDER: &str = "[image]";

const UNTITLED: &str = "Untitled";

/// Title candidates, most specific first. The first structural match wins;
/// sites that carry the full title in a `title` attribute get that in
/// preference to the element text.
const TITLE_SELECTORS: &[&str] = &[
    ".toon-title",
    "h1.entry-title",
    ".view-title h1",
    "h1",
];

/// Content-region candidates, most specific first. Deliberately no `body`
/// fallback: a page where none of these match has no recognizable chapter
/// content and is reported as such.
const CONTENT_SELECTORS: &[&str] = &[
    "#novel_content",
    ".novel_content",
    "#chapter_content",
    ".chapter-content",
    ".entry-content",
    ".view-content",
];

/// Title plus normalized plain-text body for one chapter page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedChapter {
    pub title: String,
    pub content: String,
}

/// Locates a chapter inside raw markup. `None` means no content region
/// matched; malformed markup never panics or errors.
pub trait Extractor: Send + Sync {
    fn extract(&self, html: &str) -> Option<ExtractedChapter>;
}

/// Selector-candidate extractor over the pre-parsed candidate lists.
#[derive(Debug)]
pub struct SelectorExtractor {
    title_selectors: Vec<Selector>,
    content_selectors: Vec<Selector>,
}

impl Default for SelectorExtractor {
    fn default() -> Self {
        Self {
            title_selectors: parse_selectors(TITLE_SELECTORS),
            content_selectors: parse_selectors(CONTENT_SELECTORS),
        }
    }
}

fn parse_selectors(candidates: &[&str]) -> Vec<Selector> {
    candidates
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .collect()
}

impl Extractor for SelectorExtractor {
    fn extract(&self, html: &str) -> Option<ExtractedChapter> {
        let doc = Html::parse_document(html);

        let region = self
            .content_selectors
            .iter()
            .find_map(|sel| doc.select(sel).next())?;

        let title = self.resolve_title(&doc);
        let mut content = normalize_content(&region.inner_html());

        // Many pages repeat the heading inside the body; drop the duplicate.
        if !title.is_empty() {
            if let Some(rest) = content.strip_prefix(title.as_str()) {
                content = rest.trim_start().to_string();
            }
        }

        Some(ExtractedChapter { title, content })
    }
}

impl SelectorExtractor {
    fn resolve_title(&self, doc: &Html) -> String {
        let element = self
            .title_selectors
            .iter()
            .find_map(|sel| doc.select(sel).next());

        let Some(element) = element else {
            return UNTITLED.to_string();
        };

        if let Some(attr) = element.value().attr("title") {
            let attr = attr.trim();
            if !attr.is_empty() {
                return attr.to_string();
            }
        }

        let text: String = element.text().collect();
        let first_line = text.lines().next().unwrap_or("").trim();
        if first_line.is_empty() {
            UNTITLED.to_string()
        } else {
            first_line.to_string()
        }
    }
}

static WRAPPER_TAGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</?(?:div|span|section|article|main|figure)[^>]*>").expect("wrapper regex")
});
static P_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<p(?:\s[^>]*)?>").expect("p regex"));
static P_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</p\s*>").expect("p close regex"));
static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?\s*>").expect("br regex"));
static IMAGE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<img[^>]*>").expect("img regex"));
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag regex"));
static SPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {2,}").expect("space regex"));
static NEWLINE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("newline regex"));

/// Fixed table of named entities decoded after tag stripping. `&amp;` is
/// decoded last so entity-encoded entities stay literal.
const ENTITIES: &[(&str, &str)] = &[
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    ("&nbsp;", " "),
    ("&mdash;", "\u{2014}"),
    ("&ndash;", "\u{2013}"),
    ("&lsquo;", "\u{2018}"),
    ("&rsquo;", "\u{2019}"),
    ("&ldquo;", "\u{201C}"),
    ("&rdquo;", "\u{201D}"),
    ("&amp;", "&"),
];

/// Normalizes a raw HTML content region into clean plain text. Total over
/// any input; each step works on the previous step's output and the step
/// order matters (entities are decoded only after the remaining tags are
/// stripped).
pub fn normalize_content(html: &str) -> String {
    let text = WRAPPER_TAGS.replace_all(html, "");
    let text = P_OPEN.replace_all(&text, "");
    let text = P_CLOSE.replace_all(&text, "\n");
    let text = LINE_BREAK.replace_all(&text, "\n");
    let text = IMAGE_TAG.replace_all(&text, IMAGE_PLACEHOLDER);
    let text = ANY_TAG.replace_all(&text, "");
    let mut text = SPACE_RUNS.replace_all(&text, " ").into_owned();

    for (entity, literal) in ENTITIES {
        text = text.replace(entity, literal);
    }

    let joined = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    NEWLINE_RUNS.replace_all(&joined, "\n\n").into_owned()
}
