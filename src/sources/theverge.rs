//! The Verge AI-section feed adapter.
//!
//! The section feed serves Atom (`<entry>` with a `href`-carrying `<link>`),
//! but the parser also accepts plain RSS `<item>` elements with a text
//! `<link>`, since the publisher has switched formats before.

use crate::config::Settings;
use crate::errors::SourceError;
use crate::models::Article;
use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{info, instrument};

const FEED_URL: &str = "https://www.theverge.com/ai-artificial-intelligence/rss/index.xml";

#[instrument(level = "info", skip_all)]
pub async fn fetch(cfg: &Settings) -> Result<Vec<Article>, SourceError> {
    let xml = reqwest::get(FEED_URL).await?.text().await?;
    let articles = parse_feed(&xml, cfg.limits.max_articles)?;
    info!(count = articles.len(), source = FEED_URL, "Indexed The Verge articles");
    Ok(articles)
}

/// Which text node the cursor is inside, within an entry.
#[derive(Clone, Copy, PartialEq)]
enum Field {
    Title,
    Link,
    Summary,
}

fn parse_feed(xml: &str, max_articles: usize) -> Result<Vec<Article>, SourceError> {
    let mut reader = Reader::from_str(xml);
    let mut articles = Vec::new();

    let mut in_entry = false;
    let mut field: Option<Field> = None;
    let mut title = String::new();
    let mut link = String::new();
    let mut summary = String::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| SourceError::Feed(e.to_string()))?;
        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"entry" | b"item" => {
                    in_entry = true;
                    title.clear();
                    link.clear();
                    summary.clear();
                }
                b"title" if in_entry => field = Some(Field::Title),
                b"summary" | b"description" if in_entry => field = Some(Field::Summary),
                b"link" if in_entry => {
                    field = Some(Field::Link);
                    if let Some(href) = href_attr(&e) {
                        link = href;
                    }
                }
                _ => {}
            },
            Event::Empty(e) if in_entry && e.name().as_ref() == b"link" => {
                if let Some(href) = href_attr(&e) {
                    link = href;
                }
            }
            Event::Text(t) => {
                if let Some(f) = field {
                    let text = t
                        .unescape()
                        .map_err(|e| SourceError::Feed(e.to_string()))?;
                    push_field(f, text.trim(), &mut title, &mut link, &mut summary);
                }
            }
            Event::CData(t) => {
                if let Some(f) = field {
                    let bytes = t.into_inner();
                    let text = String::from_utf8_lossy(&bytes);
                    push_field(f, text.trim(), &mut title, &mut link, &mut summary);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"entry" | b"item" => {
                    in_entry = false;
                    if !title.is_empty() && !link.is_empty() {
                        articles.push(Article::new(title.clone(), link.clone(), summary.clone()));
                        if articles.len() >= max_articles {
                            break;
                        }
                    }
                }
                b"title" | b"summary" | b"description" | b"link" => field = None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(articles)
}

fn href_attr(e: &quick_xml::events::BytesStart<'_>) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"href" {
            return Some(String::from_utf8_lossy(&attr.value).into_owned());
        }
    }
    None
}

fn push_field(field: Field, text: &str, title: &mut String, link: &mut String, summary: &mut String) {
    if text.is_empty() {
        return;
    }
    let target = match field {
        Field::Title => title,
        Field::Link => link,
        Field::Summary => summary,
    };
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(text);
}
