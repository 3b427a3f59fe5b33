//! Static site generation from the dated Markdown reports.
//!
//! Everything under the output directory is derived state: one HTML page per
//! report, an index embedding the newest report, an archive listing all of
//! them, plus the copied stylesheet. Rebuilding from a byte-identical set of
//! input documents yields byte-identical output: no timestamps, and a total
//! sort order (date descending, discovery order on ties).
//!
//! A single malformed document is skipped with a warning; it never aborts
//! the build.

pub mod markdown;
pub mod templates;

use crate::config::Settings;
use crate::errors::{DocumentError, PipelineError};
use itertools::Itertools;
use self::markdown::escape_html;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument, warn};

/// A report document parsed from the content directory. Derived, never
/// hand-edited; regenerated on every build.
#[derive(Debug)]
pub struct SiteDocument {
    /// `YYYY-MM-DD`; the metadata `date` wins over the filename stem.
    pub date: String,
    pub metadata: BTreeMap<String, String>,
    pub body: String,
}

impl SiteDocument {
    pub fn title(&self) -> String {
        self.metadata
            .get("title")
            .cloned()
            .unwrap_or_else(|| format!("AI Daily Digest {}", self.date))
    }

    fn page_name(&self) -> String {
        format!("{}.html", self.date)
    }
}

/// Counts from one build.
#[derive(Debug, Default, PartialEq)]
pub struct BuildReport {
    pub documents: usize,
    pub skipped: usize,
}

/// Split an optional leading metadata block (`---` delimited `key: value`
/// lines) from a document. Absence of a block is valid and yields empty
/// metadata.
pub fn split_front_matter(text: &str) -> Result<(BTreeMap<String, String>, &str), DocumentError> {
    let Some(rest) = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))
    else {
        return Ok((BTreeMap::new(), text));
    };

    let mut metadata = BTreeMap::new();
    let mut offset = 0usize;
    for line in rest.split_inclusive('\n') {
        let trimmed = line.trim_end();
        if trimmed == "---" {
            return Ok((metadata, &rest[offset + line.len()..]));
        }
        if !trimmed.is_empty() {
            let Some((key, value)) = trimmed.split_once(':') else {
                return Err(DocumentError::MalformedMetadata(trimmed.to_string()));
            };
            metadata.insert(key.trim().to_string(), value.trim().to_string());
        }
        offset += line.len();
    }

    Err(DocumentError::UnterminatedMetadata)
}

async fn load_document(path: &Path) -> Result<SiteDocument, DocumentError> {
    let bytes = fs::read(path).await?;
    let text = String::from_utf8(bytes).map_err(|_| DocumentError::Encoding)?;
    let (metadata, body) = split_front_matter(&text)?;

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    let date = metadata.get("date").cloned().unwrap_or(stem);

    Ok(SiteDocument {
        date,
        metadata,
        body: body.to_string(),
    })
}

/// Scan the content directory for `.md` documents in ascending path order;
/// that scan order is the discovery order the build's tie-break relies on.
async fn discover_documents(
    content_dir: &str,
) -> Result<(Vec<SiteDocument>, usize), PipelineError> {
    let mut entries = match fs::read_dir(content_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((Vec::new(), 0)),
        Err(e) => {
            return Err(PipelineError::Io {
                path: content_dir.to_string(),
                source: e,
            });
        }
    };

    let mut paths: Vec<PathBuf> = Vec::new();
    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) == Some("md") {
                    paths.push(path);
                }
            }
            Ok(None) => break,
            Err(e) => {
                return Err(PipelineError::Io {
                    path: content_dir.to_string(),
                    source: e,
                });
            }
        }
    }
    paths.sort();

    let mut docs = Vec::new();
    let mut skipped = 0usize;
    for path in paths {
        match load_document(&path).await {
            Ok(doc) => docs.push(doc),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping malformed document");
                skipped += 1;
            }
        }
    }

    Ok((docs, skipped))
}

/// Build the whole site from whatever dated reports exist on disk.
#[instrument(level = "info", skip_all, fields(content_dir = %cfg.output.content_dir, docs_dir = %cfg.output.docs_dir))]
pub async fn build(cfg: &Settings) -> Result<BuildReport, PipelineError> {
    let (mut docs, skipped) = discover_documents(&cfg.output.content_dir).await?;
    if docs.is_empty() {
        return Err(PipelineError::EmptySite);
    }

    // newest first; the stable sort keeps discovery order on equal dates
    docs.sort_by(|a, b| b.date.cmp(&a.date));

    let docs_dir = Path::new(&cfg.output.docs_dir);
    fs::create_dir_all(docs_dir)
        .await
        .map_err(|e| PipelineError::Io {
            path: cfg.output.docs_dir.clone(),
            source: e,
        })?;

    for doc in &docs {
        let html = templates::page(&doc.title(), &render_article(doc));
        write_file(&docs_dir.join(doc.page_name()), &html).await?;
    }

    write_file(&docs_dir.join("index.html"), &render_index(&docs)).await?;
    write_file(&docs_dir.join("archive.html"), &render_archive(&docs)).await?;
    copy_stylesheet(&cfg.output.assets_dir, docs_dir).await?;

    info!(documents = docs.len(), skipped, "Site build completed");
    Ok(BuildReport {
        documents: docs.len(),
        skipped,
    })
}

fn render_article(doc: &SiteDocument) -> String {
    format!(
        "<article>\n<h1>{}</h1>\n{}</article>\n",
        escape_html(&doc.title()),
        markdown::to_html(&doc.body)
    )
}

/// The index embeds the newest report in full, then links the rest.
fn render_index(docs: &[SiteDocument]) -> String {
    let newest = &docs[0];
    let mut content = render_article(newest);

    if docs.len() > 1 {
        content.push_str("<section>\n<h2>Previous reports</h2>\n<ul>\n");
        for doc in &docs[1..] {
            content.push_str(&format!(
                "<li><a href=\"{}\">{}</a></li>\n",
                doc.page_name(),
                escape_html(&doc.title())
            ));
        }
        content.push_str("</ul>\n</section>\n");
    }

    templates::page(&newest.title(), &content)
}

/// The archive lists every report, newest first, grouped by year.
fn render_archive(docs: &[SiteDocument]) -> String {
    let mut content = String::from("<h1>Archive</h1>\n");

    for (year, group) in &docs
        .iter()
        .chunk_by(|d| d.date.get(..4).unwrap_or("").to_string())
    {
        let heading = if year.is_empty() { "Undated".to_string() } else { year };
        content.push_str(&format!("<h2>{}</h2>\n<ul>\n", escape_html(&heading)));
        for doc in group {
            content.push_str(&format!(
                "<li><a href=\"{}\">{}</a></li>\n",
                doc.page_name(),
                escape_html(&doc.title())
            ));
        }
        content.push_str("</ul>\n");
    }

    templates::page("Archive", &content)
}

async fn write_file(path: &Path, contents: &str) -> Result<(), PipelineError> {
    fs::write(path, contents)
        .await
        .map_err(|e| PipelineError::Io {
            path: path.display().to_string(),
            source: e,
        })
}

/// The stylesheet is the only static asset; it is copied unmodified. A
/// missing asset degrades the styling, not the build.
async fn copy_stylesheet(assets_dir: &str, docs_dir: &Path) -> Result<(), PipelineError> {
    let src = Path::new(assets_dir).join(templates::STYLESHEET_NAME);
    match fs::read(&src).await {
        Ok(bytes) => {
            let dst = docs_dir.join(templates::STYLESHEET_NAME);
            fs::write(&dst, bytes).await.map_err(|e| PipelineError::Io {
                path: dst.display().to_string(),
                source: e,
            })
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %src.display(), "Stylesheet missing; site will be unstyled");
            Ok(())
        }
        Err(e) => Err(PipelineError::Io {
            path: src.display().to_string(),
            source: e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap as Map;

    fn test_settings(root: &Path) -> Settings {
        let mut cfg = Settings::default();
        cfg.output.content_dir = root.join("content").display().to_string();
        cfg.output.docs_dir = root.join("docs").display().to_string();
        cfg.output.assets_dir = root.join("assets").display().to_string();
        cfg
    }

    fn write_doc(cfg: &Settings, name: &str, text: &str) {
        let dir = Path::new(&cfg.output.content_dir);
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(name), text).unwrap();
    }

    fn read_site(cfg: &Settings) -> Map<String, Vec<u8>> {
        let mut files = Map::new();
        for entry in std::fs::read_dir(&cfg.output.docs_dir).unwrap() {
            let path = entry.unwrap().path();
            let name = path.file_name().unwrap().to_str().unwrap().to_string();
            files.insert(name, std::fs::read(&path).unwrap());
        }
        files
    }

    #[test]
    fn test_split_front_matter_present() {
        let (meta, body) =
            split_front_matter("---\ntitle: T\ndate: 2026-08-07\n---\n\nBody here\n").unwrap();
        assert_eq!(meta.get("title").unwrap(), "T");
        assert_eq!(meta.get("date").unwrap(), "2026-08-07");
        assert_eq!(body, "\nBody here\n");
    }

    #[test]
    fn test_split_front_matter_absent() {
        let (meta, body) = split_front_matter("Just a body\n").unwrap();
        assert!(meta.is_empty());
        assert_eq!(body, "Just a body\n");
    }

    #[test]
    fn test_split_front_matter_unterminated() {
        let err = split_front_matter("---\ntitle: T\nno end").unwrap_err();
        assert!(matches!(err, DocumentError::UnterminatedMetadata));
    }

    #[test]
    fn test_split_front_matter_malformed_line() {
        let err = split_front_matter("---\nnot a pair\n---\nbody").unwrap_err();
        assert!(matches!(err, DocumentError::MalformedMetadata(_)));
    }

    #[tokio::test]
    async fn test_build_renders_pages_index_and_archive() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = test_settings(dir.path());
        write_doc(
            &cfg,
            "2026-08-06.md",
            "---\ntitle: AI Daily Digest 2026-08-06\ndate: 2026-08-06\n---\n\n## Old story\n",
        );
        write_doc(
            &cfg,
            "2026-08-07.md",
            "---\ntitle: AI Daily Digest 2026-08-07\ndate: 2026-08-07\n---\n\n## [Fresh](https://a.example/f)\n\nDetails.\n",
        );

        let report = build(&cfg).await.unwrap();
        assert_eq!(report, BuildReport { documents: 2, skipped: 0 });

        let site = read_site(&cfg);
        assert!(site.contains_key("2026-08-06.html"));
        assert!(site.contains_key("2026-08-07.html"));

        let index = String::from_utf8(site["index.html"].clone()).unwrap();
        // newest report embedded in full, older one linked
        assert!(index.contains("<a href=\"https://a.example/f\">Fresh</a>"));
        assert!(index.contains("<a href=\"2026-08-06.html\">AI Daily Digest 2026-08-06</a>"));

        let archive = String::from_utf8(site["archive.html"].clone()).unwrap();
        assert!(archive.contains("<h2>2026</h2>"));
        assert!(archive.contains("2026-08-07.html"));
        assert!(archive.contains("2026-08-06.html"));
        let newest_pos = archive.find("2026-08-07.html").unwrap();
        let older_pos = archive.find("2026-08-06.html").unwrap();
        assert!(newest_pos < older_pos);
    }

    #[tokio::test]
    async fn test_build_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = test_settings(dir.path());
        write_doc(&cfg, "2026-08-06.md", "# A\n\n- one\n- two\n");
        write_doc(&cfg, "2026-08-07.md", "Para with **bold**.\n");
        std::fs::create_dir_all(&cfg.output.assets_dir).unwrap();
        std::fs::write(
            Path::new(&cfg.output.assets_dir).join("style.css"),
            "body { margin: 2rem; }\n",
        )
        .unwrap();

        build(&cfg).await.unwrap();
        let first = read_site(&cfg);
        build(&cfg).await.unwrap();
        let second = read_site(&cfg);

        assert_eq!(first, second);
        assert_eq!(
            second["style.css"],
            b"body { margin: 2rem; }\n".to_vec()
        );
    }

    #[tokio::test]
    async fn test_malformed_documents_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = test_settings(dir.path());
        write_doc(&cfg, "2026-08-07.md", "fine body\n");
        write_doc(&cfg, "2026-08-05.md", "---\ntitle: never closed\n");
        std::fs::write(
            Path::new(&cfg.output.content_dir).join("2026-08-06.md"),
            [0xffu8, 0xfe, 0x00, 0x41],
        )
        .unwrap();

        let report = build(&cfg).await.unwrap();
        assert_eq!(report, BuildReport { documents: 1, skipped: 2 });
        assert!(read_site(&cfg).contains_key("2026-08-07.html"));
    }

    #[tokio::test]
    async fn test_build_with_no_documents_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = test_settings(dir.path());
        let err = build(&cfg).await.unwrap_err();
        assert!(matches!(err, PipelineError::EmptySite));
    }

    #[tokio::test]
    async fn test_date_from_filename_when_metadata_absent() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = test_settings(dir.path());
        write_doc(&cfg, "2026-08-07.md", "no front matter\n");

        build(&cfg).await.unwrap();
        let site = read_site(&cfg);
        let page = String::from_utf8(site["2026-08-07.html"].clone()).unwrap();
        assert!(page.contains("AI Daily Digest 2026-08-07"));
    }

    /// End-to-end: dedupe three sources' worth of articles, format offline,
    /// persist the report, and build the site around it.
    #[tokio::test]
    async fn test_full_offline_pipeline() {
        use crate::models::Article;

        let dir = tempfile::tempdir().unwrap();
        let cfg = test_settings(dir.path());

        // 12 articles across three sources: two exact-duplicate links and
        // one near-duplicate title hide among them
        let fetched = vec![
            // source one: 5
            Article::new("Anthropic ships a coding agent", "https://s1.example/1", "d"),
            Article::new("Meta open sources a model", "https://s1.example/2", "d"),
            Article::new("Chips shortage easing at last", "https://s1.example/3", "d"),
            Article::new("Robots learn to fold laundry", "https://s1.example/4", "d"),
            Article::new("Search wars heat up again", "https://s1.example/5", "d"),
            // source two: 4 (one exact dup of s1/2, one near-dup title)
            Article::new("Meta open-sources a model", "https://s1.example/2", "dup"),
            Article::new("Anthropic ships a coding agents", "https://s2.example/1", "near"),
            Article::new("Quantum startup raises big", "https://s2.example/2", "d"),
            Article::new("Datacenter power deals signed", "https://s2.example/3", "d"),
            // source three: 3 (one exact dup of s1/5)
            Article::new("Search wars heat up once more", "https://s1.example/5", "dup"),
            Article::new("New benchmark results land", "https://s3.example/1", "d"),
            Article::new("Agents in production, really", "https://s3.example/2", "d"),
        ];
        assert_eq!(fetched.len(), 12);

        let unique = crate::dedupe::dedupe(fetched, 5);
        assert_eq!(unique.len(), 9);

        let body = crate::summarizer::offline_summary(&unique, 150, 300);
        let headings = body.lines().filter(|l| l.starts_with("## ")).count();
        assert_eq!(headings, 9);

        crate::outputs::markdown::write_report(&cfg.output.content_dir, "2026-08-07", &body)
            .await
            .unwrap();

        let report = build(&cfg).await.unwrap();
        assert_eq!(report.documents, 1);

        let site = read_site(&cfg);
        assert!(site.contains_key("2026-08-07.html"));
        assert!(site.contains_key("index.html"));
        assert!(site.contains_key("archive.html"));
        let archive = String::from_utf8(site["archive.html"].clone()).unwrap();
        assert!(archive.contains("2026-08-07.html"));
    }
}
