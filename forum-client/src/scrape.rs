use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, error};
use url::Url;
use trendcast_core::{CoreError, ForumApiError, Post};

use crate::FORUM_WEB_BASE;

const LEGACY_LISTING_BASE: &str = "https://old.reddit.com";
const SCRAPE_TIMEOUT: Duration = Duration::from_secs(15);

/// Unauthenticated client for the legacy HTML listing pages.
#[derive(Debug)]
pub struct ScrapeClient {
    http_client: Client,
}

impl ScrapeClient {
    pub fn new(user_agent: &str) -> Result<Self, CoreError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let http_client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(SCRAPE_TIMEOUT)
            .build()?;

        Ok(Self { http_client })
    }

    pub async fn fetch_channel(&self, channel: &str, limit: u32) -> Result<Vec<Post>, CoreError> {
        let url = format!("{}/r/{}/hot/", LEGACY_LISTING_BASE, channel);
        debug!("Scraping {}", url);

        let response = self.http_client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                CoreError::ForumApi(ForumApiError::RequestTimeout)
            } else {
                CoreError::Network(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            error!("Scrape of r/{} failed with status {}", channel, status);
            return Err(match status.as_u16() {
                403 => ForumApiError::Forbidden { resource: url }.into(),
                404 => ForumApiError::ChannelNotFound {
                    channel: channel.to_string(),
                }
                .into(),
                429 => ForumApiError::RateLimitExceeded { retry_after: 60 }.into(),
                code => ForumApiError::ServerError { status_code: code }.into(),
            });
        }

        let html = response.text().await?;
        Ok(parse_listing(&html, channel, limit as usize))
    }
}

struct ListingSelectors {
    thing: Selector,
    title: Selector,
    score: Selector,
    comments: Selector,
}

impl ListingSelectors {
    fn new() -> Option<Self> {
        Some(Self {
            thing: Selector::parse("div.thing").ok()?,
            title: Selector::parse("a.title").ok()?,
            score: Selector::parse("div.score").ok()?,
            comments: Selector::parse("a.comments").ok()?,
        })
    }
}

/// Extracts posts from a legacy listing page.
///
/// Only the first `limit` post containers are inspected; promoted ones among
/// them are skipped, as are containers without a title link. Malformed
/// scores and comment counts become zero.
pub fn parse_listing(html: &str, channel: &str, limit: usize) -> Vec<Post> {
    let Some(selectors) = ListingSelectors::new() else {
        return Vec::new();
    };
    let document = Html::parse_document(html);

    document
        .select(&selectors.thing)
        .take(limit)
        .filter(|thing| !is_promoted(thing))
        .filter_map(|thing| parse_thing(&thing, &selectors, channel))
        .collect()
}

fn is_promoted(thing: &ElementRef) -> bool {
    let element = thing.value();
    element.classes().any(|class| class == "promoted")
        || element.attr("data-promoted") == Some("true")
}

fn parse_thing(thing: &ElementRef, selectors: &ListingSelectors, channel: &str) -> Option<Post> {
    let title_link = thing.select(&selectors.title).next()?;
    let title = title_link.text().collect::<String>().trim().to_string();

    let score = thing
        .select(&selectors.score)
        .next()
        .and_then(|score| score.value().attr("title"))
        .and_then(|value| value.trim().parse::<i64>().ok())
        .unwrap_or(0);

    let comment_count = thing
        .select(&selectors.comments)
        .next()
        .map(|comments| first_integer(&comments.text().collect::<String>()))
        .unwrap_or(0);

    let href = title_link.value().attr("href").unwrap_or_default();
    let url = if href.starts_with('/') {
        absolute_url(href)
    } else {
        href.to_string()
    };

    let permalink = match thing.value().attr("data-permalink") {
        Some(path) if !path.is_empty() => absolute_url(path),
        _ => url.clone(),
    };

    Some(Post {
        title,
        score,
        comment_count,
        url,
        channel: channel.to_string(),
        permalink,
    })
}

/// Resolves a site-relative path against the forum's web origin.
fn absolute_url(path: &str) -> String {
    Url::parse(FORUM_WEB_BASE)
        .and_then(|base| base.join(path))
        .map(String::from)
        .unwrap_or_else(|_| format!("{}{}", FORUM_WEB_BASE, path))
}

fn first_integer(text: &str) -> u64 {
    text.split(|c: char| !c.is_ascii_digit())
        .find(|digits| !digits.is_empty())
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body><div id="siteTable">
          <div class="thing link" data-permalink="/r/LocalLLaMA/comments/a1/first/">
            <div class="score unvoted" title="1234">1.2k</div>
            <a class="title may-blank" href="https://example.com/first">First post</a>
            <a class="comments" href="/r/LocalLLaMA/comments/a1/first/">87 comments</a>
          </div>
          <div class="thing link promoted" data-permalink="/r/LocalLLaMA/comments/ad/">
            <div class="score unvoted" title="5000">5k</div>
            <a class="title" href="https://ads.example.com">Buy things</a>
          </div>
          <div class="thing link" data-permalink="">
            <div class="score unvoted" title="•">•</div>
            <a class="title" href="/r/LocalLLaMA/comments/a2/second/">  Second post  </a>
            <a class="comments">comment</a>
          </div>
          <div class="thing link" data-permalink="/r/LocalLLaMA/comments/a3/">
            <div class="score" title="3">3</div>
          </div>
        </div></body></html>
    "#;

    #[test]
    fn test_parse_listing() {
        let posts = parse_listing(LISTING, "LocalLLaMA", 15);
        assert_eq!(posts.len(), 2);

        let first = &posts[0];
        assert_eq!(first.title, "First post");
        assert_eq!(first.score, 1234);
        assert_eq!(first.comment_count, 87);
        assert_eq!(first.url, "https://example.com/first");
        assert_eq!(
            first.permalink,
            "https://reddit.com/r/LocalLLaMA/comments/a1/first/"
        );
        assert_eq!(first.channel, "LocalLLaMA");

        let second = &posts[1];
        assert_eq!(second.title, "Second post");
        assert_eq!(second.score, 0);
        assert_eq!(second.comment_count, 0);
        assert_eq!(
            second.url,
            "https://reddit.com/r/LocalLLaMA/comments/a2/second/"
        );
        assert_eq!(second.permalink, second.url);
    }

    #[test]
    fn test_limit_counts_promoted_containers() {
        let posts = parse_listing(LISTING, "LocalLLaMA", 2);
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "First post");
    }

    #[test]
    fn test_empty_page() {
        assert!(parse_listing("<html><body></body></html>", "empty", 15).is_empty());
        assert!(parse_listing("", "empty", 15).is_empty());
    }

    #[test]
    fn test_absolute_url() {
        assert_eq!(
            absolute_url("/r/OpenAI/comments/x1/"),
            "https://reddit.com/r/OpenAI/comments/x1/"
        );
    }

    #[test]
    fn test_first_integer() {
        assert_eq!(first_integer("87 comments"), 87);
        assert_eq!(first_integer("comment"), 0);
        assert_eq!(first_integer("1,204 comments"), 1);
    }
}
