// src/ingest/extract.rs
//! Best-effort article body extraction. Failures of any kind (network,
//! non-2xx, no matching markup) yield an empty string, never an error.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::debug;

/// Fallback cap when the page has no semantic `<article>` container.
const MAX_LOOSE_PARAGRAPHS: usize = 20;

static ARTICLE_PARAGRAPHS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article p").expect("static selector"));
static ANY_PARAGRAPH: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("static selector"));

pub struct ContentExtractor {
    http: reqwest::Client,
}

impl ContentExtractor {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Fetch `url` and pull readable body text out of the page.
    /// Returns `""` on any failure; callers treat that as "no content".
    pub async fn extract(&self, url: &str) -> String {
        let resp = match self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                debug!(error = ?e, %url, "article fetch failed");
                return String::new();
            }
        };

        if !resp.status().is_success() {
            debug!(status = %resp.status(), %url, "article fetch non-2xx");
            return String::new();
        }

        let html = match resp.text().await {
            Ok(t) => t,
            Err(e) => {
                debug!(error = ?e, %url, "article body read failed");
                return String::new();
            }
        };

        extract_from_html(&html)
    }
}

/// Paragraphs inside a semantic `article` container, falling back to the
/// first 20 paragraph nodes on the page. Paragraphs are trimmed, empty
/// ones dropped, and joined with a blank line.
pub fn extract_from_html(html: &str) -> String {
    let document = Html::parse_document(html);

    let in_article = collect_paragraphs(document.select(&ARTICLE_PARAGRAPHS), usize::MAX);
    if !in_article.is_empty() {
        return in_article.join("\n\n");
    }

    collect_paragraphs(document.select(&ANY_PARAGRAPH), MAX_LOOSE_PARAGRAPHS).join("\n\n")
}

fn collect_paragraphs<'a>(
    selection: impl Iterator<Item = scraper::ElementRef<'a>>,
    cap: usize,
) -> Vec<String> {
    selection
        .take(cap)
        .map(|p| p.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_paragraphs_inside_article() {
        let html = r#"
            <html><body>
              <p>nav junk</p>
              <article><p> First. </p><p></p><p>Second.</p></article>
              <p>footer junk</p>
            </body></html>"#;
        assert_eq!(extract_from_html(html), "First.\n\nSecond.");
    }

    #[test]
    fn falls_back_to_first_page_paragraphs() {
        let html = "<html><body><p>One</p><p>  </p><p>Two</p></body></html>";
        assert_eq!(extract_from_html(html), "One\n\nTwo");
    }

    #[test]
    fn fallback_is_capped_at_twenty_paragraphs() {
        let body: String = (0..30).map(|i| format!("<p>p{i}</p>")).collect();
        let out = extract_from_html(&format!("<html><body>{body}</body></html>"));
        assert_eq!(out.matches("\n\n").count(), MAX_LOOSE_PARAGRAPHS - 1);
        assert!(out.ends_with("p19"));
    }

    #[test]
    fn pages_without_paragraphs_yield_empty() {
        assert_eq!(extract_from_html("<html><body><div>x</div></body></html>"), "");
    }
}
