use std::sync::Arc;

use scraper::{Html, Selector};
use url::Url;

use crate::domain::{BookmarkType, Extraction, Metadata};
use crate::errors::{BookmarkError, BookmarkResult};
use crate::http::{HttpRequest, HttpTransport, USER_AGENT};
use crate::sources::registry::domain_of;
use crate::sources::text::{collapse_whitespace, truncate};
use crate::sources::traits::MetadataSource;

pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Fields parsed out of an article page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedArticle {
    pub title: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub top_image: Option<String>,
    pub keywords: Vec<String>,
    pub published: Option<String>,
    pub text: String,
    pub media: Vec<String>,
    pub html: String,
}

/// Catch-all handler for any page that isn't claimed by a more specific source.
pub struct ArticleSource {
    transport: Arc<dyn HttpTransport>,
}

impl ArticleSource {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Download and parse the page at `url`
    pub fn fetch(&self, url: &str) -> BookmarkResult<ParsedArticle> {
        let request = HttpRequest::get(url).header("User-Agent", USER_AGENT);
        let response = self.transport.execute(request)?;

        if !response.is_success() {
            return Err(BookmarkError::Parse(format!(
                "Page returned HTTP {}",
                response.status
            )));
        }

        Ok(parse_article(&response.body, url))
    }

    fn to_metadata(article: ParsedArticle) -> Metadata {
        Metadata::new(BookmarkType::Article)
            .with_title(article.title)
            .with_description(article.description)
            .with_author(article.author)
            .with_thumbnail(article.top_image)
            .with_data("keywords", article.keywords)
            .with_data("publish_date", article.published)
            .with_data("full_text", article.text)
            .with_data("media", article.media)
    }

    fn fallback(url: &str) -> Metadata {
        let domain = domain_of(url).unwrap_or_else(|| url.to_string());
        Metadata::new(BookmarkType::Generic)
            .with_title(Some(format!("Content from {}", domain)))
            .with_description(Some(String::new()))
    }
}

impl MetadataSource for ArticleSource {
    fn bookmark_type(&self) -> BookmarkType {
        BookmarkType::Article
    }

    fn can_handle(&self, _domain: &str) -> bool {
        true
    }

    fn extract(&self, url: &str) -> BookmarkResult<Extraction> {
        match self.fetch(url) {
            Ok(article) => Ok(Extraction::Complete(Self::to_metadata(article))),
            Err(e) => {
                tracing::warn!(url, error = %e, "Article extraction failed");
                Ok(Extraction::degraded(Self::fallback(url), e))
            }
        }
    }
}

/// Parse an HTML page into article fields. Relative image and media
/// links are resolved against `base_url`.
pub fn parse_article(html: &str, base_url: &str) -> ParsedArticle {
    let document = Html::parse_document(html);
    let base = Url::parse(base_url).ok();

    let text = article_text(&document);

    let title = first_attr(&document, &["meta[property='og:title']"], "content")
        .or_else(|| first_text(&document, "title"))
        .or_else(|| first_text(&document, "h1"));

    let description = first_attr(
        &document,
        &[
            "meta[property='og:description']",
            "meta[name='description']",
        ],
        "content",
    )
    .or_else(|| (!text.is_empty()).then(|| text.clone()))
    .map(|d| truncate(&d, MAX_DESCRIPTION_CHARS));

    let author = first_attr(
        &document,
        &["meta[name='author']", "meta[property='article:author']"],
        "content",
    )
    .or_else(|| first_text(&document, "[rel='author']"));

    let top_image = first_attr(
        &document,
        &["meta[property='og:image']", "meta[name='twitter:image']"],
        "content",
    )
    .or_else(|| first_attr(&document, &["img[src]"], "src"))
    .map(|src| resolve(base.as_ref(), &src));

    let keywords = first_attr(&document, &["meta[name='keywords']"], "content")
        .map(|k| {
            k.split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let published = first_attr(
        &document,
        &[
            "meta[property='article:published_time']",
            "meta[name='date']",
            "meta[name='pubdate']",
        ],
        "content",
    )
    .or_else(|| first_attr(&document, &["time[datetime]"], "datetime"));

    let mut media: Vec<String> = Vec::new();
    if let Ok(selector) = Selector::parse("iframe[src], video[src], source[src]") {
        for element in document.select(&selector) {
            if let Some(src) = element.value().attr("src") {
                let src = resolve(base.as_ref(), src.trim());
                if !src.is_empty() && !media.contains(&src) {
                    media.push(src);
                }
            }
        }
    }

    ParsedArticle {
        title,
        description,
        author,
        top_image,
        keywords,
        published,
        text,
        media,
        html: html.to_string(),
    }
}

/// Paragraph text, or the whole body when the page has no paragraphs
fn article_text(document: &Html) -> String {
    let paragraphs: Vec<String> = Selector::parse("p")
        .map(|selector| {
            document
                .select(&selector)
                .map(|p| collapse_whitespace(&p.text().collect::<String>()))
                .filter(|p| !p.is_empty())
                .collect()
        })
        .unwrap_or_default();

    if !paragraphs.is_empty() {
        return paragraphs.join("\n\n");
    }

    first_text(document, "body").unwrap_or_default()
}

fn first_attr(document: &Html, selectors: &[&str], attr: &str) -> Option<String> {
    selectors.iter().find_map(|selector| {
        let selector = Selector::parse(selector).ok()?;
        document
            .select(&selector)
            .filter_map(|e| e.value().attr(attr))
            .map(str::trim)
            .find(|v| !v.is_empty())
            .map(str::to_string)
    })
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .map(|e| collapse_whitespace(&e.text().collect::<String>()))
        .find(|t| !t.is_empty())
}

fn resolve(base: Option<&Url>, link: &str) -> String {
    base.and_then(|b| b.join(link).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| link.to_string())
}
