#[cfg(test)]
mod tests {
    use crate::{
        gather_posts, parse_listing, Authenticator, CollectionMode, ForumClient, ForumToken,
    };
    use std::time::Duration;
    use trendcast_core::{CoreError, Credentials, ForumApiError, ForumConfig, Post};

    fn post(channel: &str, title: &str, score: i64) -> Post {
        Post {
            title: title.to_string(),
            score,
            comment_count: 0,
            url: String::new(),
            channel: channel.to_string(),
            permalink: String::new(),
        }
    }

    fn channels(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn api_credentials() -> Credentials {
        Credentials {
            reddit_client_id: Some("test_client_id".to_string()),
            reddit_client_secret: Some("test_client_secret".to_string()),
            ..Credentials::default()
        }
    }

    #[test]
    fn test_mode_falls_back_to_scraping_without_credentials() {
        let client = ForumClient::new(ForumConfig::default(), &Credentials::default()).unwrap();
        assert!(!client.is_api_available());
        assert_eq!(client.resolve_mode(true), CollectionMode::Scrape);
        assert_eq!(client.resolve_mode(false), CollectionMode::Scrape);
    }

    #[test]
    fn test_mode_uses_api_with_credentials() {
        let client = ForumClient::new(ForumConfig::default(), &api_credentials()).unwrap();
        assert!(client.is_api_available());
        assert_eq!(client.resolve_mode(true), CollectionMode::Api);
        assert_eq!(client.resolve_mode(false), CollectionMode::Scrape);
    }

    #[test]
    fn test_token_freshness() {
        let fresh = ForumToken::new("valid_token".to_string(), Duration::from_secs(3600));
        assert!(fresh.is_fresh());

        // Lifetime shorter than the refresh margin is never fresh.
        let stale = ForumToken::new("expiring_token".to_string(), Duration::from_secs(120));
        assert!(!stale.is_fresh());
    }

    #[tokio::test]
    async fn test_cached_token_is_reused() {
        let auth = Authenticator::new(
            "id".to_string(),
            "secret".to_string(),
            reqwest::Client::new(),
        )
        .unwrap();
        assert!(auth.needs_refresh().await);

        auth.set_token(ForumToken::new(
            "cached_token".to_string(),
            Duration::from_secs(3600),
        ))
        .await;
        assert!(!auth.needs_refresh().await);

        // A fresh cached token is returned without touching the network.
        let token = auth.access_token().await.unwrap();
        assert_eq!(token, "cached_token");
    }

    #[tokio::test]
    async fn test_gather_sorts_by_score() {
        let names = channels(&["a", "b"]);
        let posts = gather_posts(&names, Duration::ZERO, |channel| async move {
            Ok::<_, CoreError>(match channel {
                "a" => vec![post("a", "low", 3), post("a", "high", 90)],
                _ => vec![post("b", "mid", 40)],
            })
        })
        .await;

        let titles: Vec<_> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["high", "mid", "low"]);
    }

    #[tokio::test]
    async fn test_gather_keeps_collection_order_for_ties() {
        let names = channels(&["a", "b"]);
        let posts = gather_posts(&names, Duration::ZERO, |channel| async move {
            Ok::<_, CoreError>(vec![post(channel, channel, 7)])
        })
        .await;

        assert_eq!(posts[0].channel, "a");
        assert_eq!(posts[1].channel, "b");
    }

    #[tokio::test]
    async fn test_failing_and_empty_channels_do_not_stop_collection() {
        let names = channels(&["healthy", "empty", "broken", "also_healthy"]);
        let posts = gather_posts(&names, Duration::ZERO, |channel| async move {
            match channel {
                "broken" => Err(CoreError::ForumApi(ForumApiError::RequestTimeout)),
                "empty" => Ok(parse_listing("<html><body></body></html>", channel, 15)),
                other => Ok(vec![post(other, other, 10), post(other, other, 5)]),
            }
        })
        .await;

        assert_eq!(posts.len(), 4);
        assert!(posts.iter().all(|p| p.channel != "empty" && p.channel != "broken"));
    }

    #[test]
    fn test_gather_with_no_channels() {
        let posts = tokio_test::block_on(gather_posts(
            &[],
            Duration::from_secs(60),
            |_channel| async move { Ok::<_, CoreError>(vec![post("never", "never", 1)]) },
        ));
        assert!(posts.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_between_channels_only() {
        let names = channels(&["a", "b", "c"]);
        let start = tokio::time::Instant::now();
        gather_posts(&names, Duration::from_millis(1500), |_channel| async move {
            Ok::<_, CoreError>(Vec::new())
        })
        .await;

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(3000));
        assert!(elapsed < Duration::from_millis(4500));
    }
}
