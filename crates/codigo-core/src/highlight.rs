//! Detection of numbered article references ("artículo 234", "arts. 12, 34 y 56")
//!
//! The scan returns byte spans instead of injecting markup, so a renderer can
//! style the numbers however it likes and re-scanning the same text can never
//! wrap a number twice.

use regex::Regex;
use std::sync::OnceLock;

static REFERENCE_REGEX: OnceLock<Regex> = OnceLock::new();
static NUMBER_REGEX: OnceLock<Regex> = OnceLock::new();

fn reference_regex() -> &'static Regex {
    REFERENCE_REGEX.get_or_init(|| {
        Regex::new(
            r"(?xi)
            \b(?:artículos|artículo|arts\.|art\.)
            \s+
            (
                [0-9]+
                (?:\s*,\s*[0-9]+)*
                (?:\s+y\s+[0-9]+)?
            )
            ",
        )
        .expect("Failed to compile article reference regex")
    })
}

fn number_regex() -> &'static Regex {
    NUMBER_REGEX.get_or_init(|| Regex::new(r"[0-9]+").expect("Failed to compile number regex"))
}

/// One article number found in a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleReference {
    /// Byte offset of the first digit.
    pub start: usize,
    /// Byte offset one past the last digit.
    pub end: usize,
    /// The digits as written.
    pub number: String,
}

impl ArticleReference {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn display_title(&self) -> String {
        format!("Artículo {}", self.number)
    }
}

/// Find every article number referenced in `text`, in order of appearance.
///
/// A list like "arts. 12, 34 y 56" yields one reference per number; the
/// keyword and the separators are left out of every span.
pub fn highlight_references(text: &str) -> Vec<ArticleReference> {
    let mut refs = Vec::new();
    for caps in reference_regex().captures_iter(text) {
        let Some(list) = caps.get(1) else { continue };
        for number in number_regex().find_iter(list.as_str()) {
            refs.push(ArticleReference {
                start: list.start() + number.start(),
                end: list.start() + number.end(),
                number: number.as_str().to_string(),
            });
        }
    }
    refs
}

/// A piece of scanned text, either untouched or an article number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Plain(&'a str),
    Article(&'a str),
}

/// Split `text` around `refs` so a renderer can style the numbers.
///
/// `refs` must come from [`highlight_references`] on the same text.
pub fn segments<'a>(text: &'a str, refs: &[ArticleReference]) -> Vec<Segment<'a>> {
    let mut out = Vec::with_capacity(refs.len() * 2 + 1);
    let mut cursor = 0;
    for r in refs {
        if r.start < cursor || r.end > text.len() {
            continue;
        }
        if r.start > cursor {
            out.push(Segment::Plain(&text[cursor..r.start]));
        }
        out.push(Segment::Article(&text[r.start..r.end]));
        cursor = r.end;
    }
    if cursor < text.len() {
        out.push(Segment::Plain(&text[cursor..]));
    }
    out
}

/// Wrap each referenced number in an `article-highlight` span for HTML output.
///
/// Run this once on freshly rendered HTML. Feeding it its own output would
/// match the digits inside the `data-article` attributes.
pub fn annotate_html(html: &str) -> String {
    let refs = highlight_references(html);
    let mut out = String::with_capacity(html.len() + refs.len() * 64);
    for segment in segments(html, &refs) {
        match segment {
            Segment::Plain(text) => out.push_str(text),
            Segment::Article(number) => {
                out.push_str(&format!(
                    r#"<span class="article-highlight" data-article="{number}">{number}</span>"#
                ));
            }
        }
    }
    out
}
