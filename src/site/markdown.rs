//! Restricted Markdown dialect to HTML.
//!
//! The report bodies only ever use ATX headings, links, emphasis, inline
//! code, and lists, so the renderer covers exactly that dialect. Input is
//! HTML-escaped before any inline rule runs; unknown constructs pass
//! through as plain text.

use once_cell::sync::Lazy;
use regex::Regex;

static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]*)\]\(([^)\s]*)\)").unwrap());
static CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").unwrap());
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*]+)\*").unwrap());
static ORDERED_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)[.)]\s+(.*)$").unwrap());

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Apply inline rules to already-escaped text.
fn render_inline(text: &str) -> String {
    let text = LINK.replace_all(text, r#"<a href="$2">$1</a>"#);
    let text = CODE.replace_all(&text, "<code>$1</code>");
    let text = BOLD.replace_all(&text, "<strong>$1</strong>");
    let text = ITALIC.replace_all(&text, "<em>$1</em>");
    text.into_owned()
}

fn render_text(text: &str) -> String {
    render_inline(&escape_html(text))
}

#[derive(Clone, Copy, PartialEq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    fn open(self) -> &'static str {
        match self {
            ListKind::Unordered => "<ul>\n",
            ListKind::Ordered => "<ol>\n",
        }
    }

    fn close(self) -> &'static str {
        match self {
            ListKind::Unordered => "</ul>\n",
            ListKind::Ordered => "</ol>\n",
        }
    }
}

/// ATX heading: one to six `#` followed by a space.
fn heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|&c| c == '#').count();
    if (1..=6).contains(&level) {
        line[level..].strip_prefix(' ').map(|text| (level, text))
    } else {
        None
    }
}

/// Convert a report body to HTML.
///
/// Blank lines separate blocks; consecutive plain lines merge into one
/// paragraph. Output is deterministic: identical input yields identical
/// bytes.
pub fn to_html(markdown: &str) -> String {
    let mut out = String::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut list: Option<ListKind> = None;

    fn flush_paragraph(out: &mut String, paragraph: &mut Vec<&str>) {
        if !paragraph.is_empty() {
            let text = paragraph.join(" ");
            out.push_str(&format!("<p>{}</p>\n", render_text(&text)));
            paragraph.clear();
        }
    }

    fn close_list(out: &mut String, list: &mut Option<ListKind>) {
        if let Some(kind) = list.take() {
            out.push_str(kind.close());
        }
    }

    fn open_list(out: &mut String, list: &mut Option<ListKind>, kind: ListKind) {
        if *list != Some(kind) {
            close_list(out, list);
            out.push_str(kind.open());
            *list = Some(kind);
        }
    }

    for raw_line in markdown.lines() {
        let line = raw_line.trim_end();
        let trimmed = line.trim_start();

        if trimmed.is_empty() {
            flush_paragraph(&mut out, &mut paragraph);
            close_list(&mut out, &mut list);
            continue;
        }

        if let Some((level, text)) = heading(trimmed) {
            flush_paragraph(&mut out, &mut paragraph);
            close_list(&mut out, &mut list);
            out.push_str(&format!("<h{level}>{}</h{level}>\n", render_text(text)));
            continue;
        }

        if let Some(item) = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "))
        {
            flush_paragraph(&mut out, &mut paragraph);
            open_list(&mut out, &mut list, ListKind::Unordered);
            out.push_str(&format!("<li>{}</li>\n", render_text(item)));
            continue;
        }

        if let Some(caps) = ORDERED_ITEM.captures(trimmed) {
            flush_paragraph(&mut out, &mut paragraph);
            open_list(&mut out, &mut list, ListKind::Ordered);
            out.push_str(&format!(
                "<li>{}</li>\n",
                render_text(caps.get(2).map_or("", |m| m.as_str()))
            ));
            continue;
        }

        paragraph.push(trimmed);
    }

    flush_paragraph(&mut out, &mut paragraph);
    close_list(&mut out, &mut list);
    out
}
