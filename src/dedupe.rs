//! Near-duplicate collapse over a fetched article set.
//!
//! Two articles are "the same" when their links match exactly, or when the
//! edit distance between their normalized titles falls below the configured
//! threshold. The earliest-seen article of a duplicate group is always the
//! one retained, even when a later duplicate carries a longer description.
//!
//! Comparison is O(n²) over the kept set; n is tens of items per run, and
//! nothing truncates the input before this step.

use crate::models::Article;
use once_cell::sync::Lazy;
use regex::Regex;

static SEPARATOR_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\-—_]+").unwrap());

/// Lowercase a title and collapse separator runs into single spaces, so
/// cosmetic differences do not count toward edit distance.
pub fn normalize_title(title: &str) -> String {
    let lowered = title.trim().to_lowercase();
    SEPARATOR_RUNS.replace_all(&lowered, " ").into_owned()
}

/// Collapse `articles` into a unique list, preserving first-seen order.
///
/// A `similarity_threshold` of zero disables fuzzy matching entirely: no
/// distance is below zero, so only exact link matches collapse. Empty or
/// malformed fields are tolerated; the function filters, it never fails.
pub fn dedupe(articles: Vec<Article>, similarity_threshold: usize) -> Vec<Article> {
    let mut kept: Vec<Article> = Vec::with_capacity(articles.len());
    let mut kept_titles: Vec<String> = Vec::with_capacity(articles.len());

    'incoming: for article in articles {
        let title = normalize_title(&article.title);
        for (existing, existing_title) in kept.iter().zip(&kept_titles) {
            // An empty link never identifies an article.
            if !article.link.is_empty() && article.link == existing.link {
                continue 'incoming;
            }
            if levenshtein(&title, existing_title) < similarity_threshold {
                continue 'incoming;
            }
        }
        kept.push(article);
        kept_titles.push(title);
    }

    kept
}

/// Edit distance between two strings, counted over characters.
fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0usize; b_chars.len() + 1];

    for (i, ca) in a_chars.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}
