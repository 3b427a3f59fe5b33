//! Fixed HTML shells for the generated site.
//!
//! Deliberately free of anything nondeterministic: no timestamps, no
//! version strings, nothing but the inputs. This is what keeps rebuilds
//! byte-identical.

use super::markdown::escape_html;

pub const STYLESHEET_NAME: &str = "style.css";

/// Shared page chrome: navigation, content slot, footer.
pub fn page(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="stylesheet" href="{STYLESHEET_NAME}">
</head>
<body>
<nav><a href="index.html">Today</a> · <a href="archive.html">Archive</a></nav>
<main>
{content}</main>
<footer><p>Generated by daily_digest.</p></footer>
</body>
</html>
"#,
        title = escape_html(title),
    )
}
