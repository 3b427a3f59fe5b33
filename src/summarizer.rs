//! Summarization engine: a streaming remote call with a deterministic
//! offline fallback.
//!
//! Live mode sends the deduplicated article set, prefixed by a fixed
//! instruction preamble, to an OpenAI-compatible `chat/completions`
//! endpoint and consumes the streamed response sequentially: incremental
//! text fragments are concatenated in arrival order (and echoed to stdout
//! as they arrive) until the `[DONE]` sentinel. A malformed fragment, an
//! authentication rejection, or a connection drop makes the call fail; the
//! engine never retries on its own. The caller decides whether to downgrade
//! to offline mode.
//!
//! Offline mode formats the same input without any network access: one
//! linked heading plus description per article, hard-truncated at the
//! configured character caps. Calling it twice on the same input yields
//! byte-identical output.

use crate::config::Settings;
use crate::errors::SummarizeError;
use crate::models::Article;
use crate::utils::{truncate_chars, truncate_for_log};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::io::Write as _;
use std::time::Duration;
use tracing::{info, instrument, warn};

const DEFAULT_PROMPT: &str = "You are a professional technology news editor. \
Organize the provided articles into a concise daily report written in Markdown: \
one short `##` heading per story linking to the source, followed by one or two \
sentences of context. Keep the original ordering.";

const EMPTY_BODY: &str = "No articles were collected today.";

/// Load the instruction preamble, falling back to the built-in default when
/// the configured file is absent.
pub async fn load_prompt(path: &str) -> String {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(_) => DEFAULT_PROMPT.to_string(),
    }
}

/// An article as serialized into the outbound request, with both text
/// fields capped to keep the payload bounded.
#[derive(Debug, Serialize)]
struct CompressedArticle<'a> {
    title: String,
    link: &'a str,
    desc: String,
}

fn compress_articles<'a>(
    articles: &'a [Article],
    title_max: usize,
    desc_max: usize,
) -> Vec<CompressedArticle<'a>> {
    articles
        .iter()
        .map(|a| CompressedArticle {
            title: truncate_chars(&a.title, title_max),
            link: &a.link,
            desc: truncate_chars(&a.desc, desc_max),
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ResponseChoice>,
}

#[derive(Debug, Deserialize)]
struct ResponseChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// One interpreted line of the response stream.
#[derive(Debug, PartialEq)]
enum StreamEvent {
    Fragment(String),
    Done,
    Skip,
}

/// Interpret one line of the event stream.
///
/// Lines without a `data:` field (comments, keep-alives, blank separators)
/// are skipped; the `[DONE]` payload terminates the stream; anything else
/// must be a JSON chunk carrying delta content.
fn parse_stream_line(line: &str) -> Result<StreamEvent, SummarizeError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(StreamEvent::Skip);
    }
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(StreamEvent::Skip);
    };
    let data = data.trim_start();
    if data == "[DONE]" {
        return Ok(StreamEvent::Done);
    }

    let chunk: StreamChunk = serde_json::from_str(data).map_err(|e| {
        SummarizeError::Remote(format!(
            "malformed stream fragment ({e}): {}",
            truncate_for_log(data, 120)
        ))
    })?;
    let text: String = chunk
        .choices
        .into_iter()
        .filter_map(|c| c.delta.content)
        .collect();
    if text.is_empty() {
        Ok(StreamEvent::Skip)
    } else {
        Ok(StreamEvent::Fragment(text))
    }
}

/// Client for the remote summarization endpoint.
pub struct Summarizer<'a> {
    cfg: &'a Settings,
    client: reqwest::Client,
}

impl<'a> Summarizer<'a> {
    pub fn new(cfg: &'a Settings) -> Result<Self, SummarizeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.api.request_timeout_secs))
            .build()
            .map_err(|e| SummarizeError::Remote(e.to_string()))?;
        Ok(Self { cfg, client })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.cfg.api.base_url.trim_end_matches('/'))
    }

    /// Summarize the article set via the remote streaming call.
    ///
    /// Terminal per invocation: on failure the caller may re-invoke
    /// [`offline_summary`], this function never does so itself.
    #[instrument(level = "info", skip_all, fields(model = %self.cfg.api.model, count = articles.len()))]
    pub async fn summarize_live(&self, articles: &[Article]) -> Result<String, SummarizeError> {
        if articles.is_empty() {
            return Ok(EMPTY_BODY.to_string());
        }

        let prompt = load_prompt(&self.cfg.summarize.prompt_path).await;
        let compressed = compress_articles(
            articles,
            self.cfg.summarize.title_max,
            self.cfg.summarize.desc_max,
        );
        let user_input = serde_json::to_string_pretty(&serde_json::json!({
            "articles": compressed
        }))
        .map_err(|e| SummarizeError::Remote(e.to_string()))?;

        let request = ChatRequest {
            model: &self.cfg.api.model,
            max_tokens: self.cfg.api.max_output_tokens,
            temperature: 0.7,
            stream: true,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_input,
                },
            ],
        };

        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.cfg.api.key)
            .json(&request)
            .send()
            .await
            .map_err(|e| SummarizeError::Remote(e.to_string()))?;

        let response = check_status(response).await?;
        let body = consume_stream(response).await?;
        info!(bytes = body.len(), "Streaming summarization completed");
        Ok(body)
    }

    /// Issue a trivial non-streaming request to verify endpoint, credential,
    /// and model. Returns the model's reply.
    #[instrument(level = "info", skip_all, fields(model = %self.cfg.api.model))]
    pub async fn test_connection(&self) -> Result<String, SummarizeError> {
        let request = ChatRequest {
            model: &self.cfg.api.model,
            max_tokens: 100,
            temperature: 0.7,
            stream: false,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "You are a helpful assistant.".to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: "Introduce yourself in one sentence.".to_string(),
                },
            ],
        };

        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.cfg.api.key)
            .json(&request)
            .send()
            .await
            .map_err(|e| SummarizeError::Remote(e.to_string()))?;

        let response = check_status(response).await?;
        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| SummarizeError::Remote(e.to_string()))?;
        let reply = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        Ok(reply)
    }
}

/// Map HTTP-level rejection onto the error taxonomy before any body
/// handling: 401/403 is an authentication failure, other non-success is a
/// remote failure.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SummarizeError> {
    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        let body = response.text().await.unwrap_or_default();
        return Err(SummarizeError::Auth(format!(
            "{status}: {}",
            truncate_for_log(&body, 200)
        )));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SummarizeError::Remote(format!(
            "{status}: {}",
            truncate_for_log(&body, 200)
        )));
    }
    Ok(response)
}

/// Sequentially consume the SSE body, echoing fragments to stdout as they
/// arrive. Completes only on the `[DONE]` sentinel; a stream that ends
/// without it is a failure.
async fn consume_stream(response: reqwest::Response) -> Result<String, SummarizeError> {
    let mut stream = response.bytes_stream();
    let mut buf: Vec<u8> = Vec::new();
    let mut out = String::new();
    let mut done = false;
    let mut stdout = std::io::stdout();

    'read: while let Some(chunk) = stream.next().await {
        let chunk =
            chunk.map_err(|e| SummarizeError::Remote(format!("stream read failed: {e}")))?;
        buf.extend_from_slice(&chunk);

        // Fragments can split lines (and UTF-8 sequences) anywhere, so only
        // complete lines leave the buffer.
        while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            match parse_stream_line(&line)? {
                StreamEvent::Fragment(text) => {
                    print!("{text}");
                    let _ = stdout.flush();
                    out.push_str(&text);
                }
                StreamEvent::Done => {
                    done = true;
                    break 'read;
                }
                StreamEvent::Skip => {}
            }
        }
    }
    println!();

    if !done {
        warn!("Stream ended without completion sentinel");
        return Err(SummarizeError::Remote(
            "stream ended without completion sentinel".to_string(),
        ));
    }
    Ok(out)
}

/// Deterministic offline formatter; the non-network fallback.
///
/// Each article becomes a `##` heading carrying the title as a link,
/// followed by its description. Both fields are hard-truncated at the caps,
/// with no reflow. Input order is preserved.
pub fn offline_summary(articles: &[Article], title_max: usize, desc_max: usize) -> String {
    if articles.is_empty() {
        return format!("{EMPTY_BODY}\n");
    }

    let mut out = String::new();
    for article in articles {
        let title = truncate_chars(article.title.replace('\n', " ").trim(), title_max);
        let desc = truncate_chars(article.desc.trim(), desc_max);
        writeln!(out, "## [{}]({})\n", title, article.link).unwrap();
        if !desc.is_empty() {
            writeln!(out, "{desc}\n").unwrap();
        }
    }
    while out.ends_with("\n\n") {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn articles() -> Vec<Article> {
        vec![
            Article::new(
                "OpenAI releases GPT-5",
                "https://a.example/gpt5",
                "The new flagship model.",
            ),
            Article::new("Chips are back", "https://b.example/chips", ""),
        ]
    }

    #[test]
    fn test_offline_summary_deterministic() {
        let set = articles();
        let first = offline_summary(&set, 150, 300);
        let second = offline_summary(&set, 150, 300);
        assert_eq!(first, second);
    }

    #[test]
    fn test_offline_summary_one_heading_per_article() {
        let text = offline_summary(&articles(), 150, 300);
        let headings = text.lines().filter(|l| l.starts_with("## ")).count();
        assert_eq!(headings, 2);
        assert!(text.contains("## [OpenAI releases GPT-5](https://a.example/gpt5)"));
        assert!(text.contains("The new flagship model."));
    }

    #[test]
    fn test_offline_summary_truncates_fields() {
        let set = vec![Article::new(
            "abcdefghij",
            "https://a.example/x",
            "0123456789",
        )];
        let text = offline_summary(&set, 4, 6);
        assert!(text.contains("## [abcd](https://a.example/x)"));
        assert!(text.contains("012345"));
        assert!(!text.contains("0123456"));
    }

    #[test]
    fn test_offline_summary_empty_input() {
        assert_eq!(offline_summary(&[], 150, 300), format!("{EMPTY_BODY}\n"));
    }

    #[test]
    fn test_offline_summary_preserves_order() {
        let text = offline_summary(&articles(), 150, 300);
        let first = text.find("OpenAI releases GPT-5").unwrap();
        let second = text.find("Chips are back").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_compress_articles_caps_fields() {
        let set = articles();
        let compressed = compress_articles(&set, 6, 7);
        assert_eq!(compressed[0].title, "OpenAI");
        assert_eq!(compressed[0].desc, "The new");
        assert_eq!(compressed[0].link, "https://a.example/gpt5");
    }

    #[test]
    fn test_parse_stream_line_fragment() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hello"}}]}"#;
        assert_eq!(
            parse_stream_line(line).unwrap(),
            StreamEvent::Fragment("Hello".to_string())
        );
    }

    #[test]
    fn test_parse_stream_line_done_sentinel() {
        assert_eq!(parse_stream_line("data: [DONE]").unwrap(), StreamEvent::Done);
        assert_eq!(parse_stream_line("data:[DONE]").unwrap(), StreamEvent::Done);
    }

    #[test]
    fn test_parse_stream_line_skips_noise() {
        assert_eq!(parse_stream_line("").unwrap(), StreamEvent::Skip);
        assert_eq!(parse_stream_line(": keep-alive").unwrap(), StreamEvent::Skip);
        assert_eq!(
            parse_stream_line(r#"data: {"choices":[{"delta":{}}]}"#).unwrap(),
            StreamEvent::Skip
        );
        assert_eq!(
            parse_stream_line(r#"data: {"choices":[]}"#).unwrap(),
            StreamEvent::Skip
        );
    }

    #[test]
    fn test_parse_stream_line_malformed_fragment() {
        let err = parse_stream_line("data: {not json").unwrap_err();
        assert!(matches!(err, SummarizeError::Remote(_)));
    }

    #[test]
    fn test_parse_stream_line_concatenates_choices_in_order() {
        let line = r#"data: {"choices":[{"delta":{"content":"a"}},{"delta":{"content":"b"}}]}"#;
        assert_eq!(
            parse_stream_line(line).unwrap(),
            StreamEvent::Fragment("ab".to_string())
        );
    }
}
