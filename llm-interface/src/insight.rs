use tracing::{debug, info, warn};
use trendcast_core::{clamp_topic_count, parse_json_array, CoreError, LlmConfig, Topic};

use crate::LlmProvider;

/// Runs the summary and topic-extraction calls against a digest.
pub struct InsightExtractor<'a, P: LlmProvider> {
    provider: &'a P,
    summary_max_tokens: u32,
    topics_max_tokens: u32,
}

impl<'a, P: LlmProvider> InsightExtractor<'a, P> {
    pub fn new(provider: &'a P, config: &LlmConfig) -> Self {
        Self {
            provider,
            summary_max_tokens: config.summary_max_tokens,
            topics_max_tokens: config.topics_max_tokens,
        }
    }

    /// Returns the model's narrative summary verbatim. API errors propagate.
    pub async fn summarize(&self, digest: &str) -> Result<String, CoreError> {
        info!("Generating trend summary with {}", self.provider.name());
        let summary = self
            .provider
            .complete(&summary_prompt(digest), self.summary_max_tokens)
            .await?;
        info!("Summary generated ({} characters)", summary.chars().count());
        Ok(summary)
    }

    /// Asks for the `count` most important topics (clamped to 1..=50).
    ///
    /// An unparsable reply yields an empty list; API errors propagate.
    pub async fn extract_topics(&self, digest: &str, count: usize) -> Result<Vec<Topic>, CoreError> {
        let count = clamp_topic_count(count);
        info!("Extracting top {} topics", count);

        let reply = self
            .provider
            .complete(&topics_prompt(digest, count), self.topics_max_tokens)
            .await?;

        let topics = parse_topics(&reply, count);
        info!("Extracted {} topics", topics.len());
        Ok(topics)
    }
}

/// Decodes the topic array out of a model reply, ranks it by importance and
/// keeps at most `count` entries.
pub fn parse_topics(reply: &str, count: usize) -> Vec<Topic> {
    let count = clamp_topic_count(count);

    let values = match parse_json_array(reply) {
        Ok(values) => values,
        Err(e) => {
            warn!("Topic JSON parsing error: {}", e);
            return Vec::new();
        }
    };

    let total = values.len();
    let mut topics: Vec<Topic> = values.into_iter().filter_map(Topic::decode).collect();
    if topics.len() < total {
        debug!("Dropped {} malformed topic entries", total - topics.len());
    }

    topics.sort_by(|a, b| b.importance.cmp(&a.importance));
    topics.truncate(count);
    topics
}

fn summary_prompt(digest: &str) -> String {
    format!(
        r#"You are an analyst covering the AI industry. Below are the current hot posts from several AI discussion communities, ranked by score.

Posts:
{digest}

Write a trend briefing that covers:
1. An overview of the week's direction (two or three paragraphs)
2. The discussions drawing the most attention
3. Where the technology appears to be heading
4. What the communities are most concerned about

Keep the tone professional but readable and avoid unnecessary jargon."#
    )
}

fn topics_prompt(digest: &str, count: usize) -> String {
    format!(
        r#"From the AI community posts below, identify the {count} most important topics.

Posts:
{digest}

Respond with a JSON array. Each element must be an object with:
- "title": short headline for the topic
- "title_en": the headline in English (used for image generation)
- "description": two or three sentences explaining the topic
- "keywords": array of keyword strings (used for image generation)
- "importance": integer from 1 to 10

Example:
[
  {{
    "title": "Open models close the gap",
    "title_en": "Open models close the gap",
    "description": "Community-released weights now rival hosted models on common benchmarks...",
    "keywords": ["open source", "Llama", "benchmarks"],
    "importance": 8
  }}
]

Return only the JSON array."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::ScriptedProvider;
    use trendcast_core::{MAX_IMPORTANCE, MIN_IMPORTANCE};

    fn many_topics_reply(total: usize) -> String {
        let items: Vec<String> = (0..total)
            .map(|i| {
                format!(
                    r#"{{"title": "Topic {i}", "keywords": ["k{i}"], "importance": {}}}"#,
                    (i as i64 * 7) % 15 - 2
                )
            })
            .collect();
        format!("Here you go:\n[{}]\nLet me know!", items.join(","))
    }

    #[test]
    fn test_counts_order_and_range() {
        let reply = many_topics_reply(60);
        for count in 1..=50 {
            let topics = parse_topics(&reply, count);
            assert!(topics.len() <= count);
            assert!(topics
                .windows(2)
                .all(|pair| pair[0].importance >= pair[1].importance));
            assert!(topics
                .iter()
                .all(|t| (MIN_IMPORTANCE..=MAX_IMPORTANCE).contains(&t.importance)));
        }
    }

    #[test]
    fn test_malformed_replies_yield_no_topics() {
        for reply in [
            "",
            "I could not identify any topics.",
            "{\"title\": \"not an array\"}",
            "[{\"title\": \"truncated\"",
            "] reversed [",
        ] {
            assert!(parse_topics(reply, 10).is_empty(), "reply: {reply:?}");
        }
    }

    #[test]
    fn test_malformed_elements_are_dropped_whole() {
        let reply = r#"[
            {"title": "Good", "importance": 4},
            {"title": ["bad"]},
            "stray string",
            {"title": "Also good", "importance": 9}
        ]"#;
        let topics = parse_topics(reply, 10);
        let titles: Vec<_> = topics.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Also good", "Good"]);
    }

    #[test]
    fn test_zero_count_is_clamped_to_one() {
        let topics = parse_topics(&many_topics_reply(5), 0);
        assert_eq!(topics.len(), 1);
    }

    #[tokio::test]
    async fn test_single_topic_scenario() {
        let provider = ScriptedProvider::new().with_reply(
            r#"[{"title":"GPT-5 rumors","title_en":"GPT-5 rumors","description":"d","keywords":["GPT-5"],"importance":7}]"#,
        );
        let extractor = InsightExtractor::new(&provider, &LlmConfig::default());

        let digest = "1. [OpenAI] GPT-5 rumors (Score: 100, Comments: 10)";
        let topics = extractor.extract_topics(digest, 1).await.unwrap();

        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].title, "GPT-5 rumors");
        assert_eq!(topics[0].importance, 7);
        assert_eq!(topics[0].keywords, vec!["GPT-5"]);
        assert!(provider.prompts()[0].contains(digest));
    }

    #[tokio::test]
    async fn test_summary_is_verbatim() {
        let provider = ScriptedProvider::new().with_reply("  Agents dominated the week.\n\n");
        let extractor = InsightExtractor::new(&provider, &LlmConfig::default());

        let summary = extractor.summarize("1. [a] b (Score: 1, Comments: 0)").await.unwrap();
        assert_eq!(summary, "  Agents dominated the week.\n\n");
    }

    #[tokio::test]
    async fn test_api_errors_propagate() {
        let provider = ScriptedProvider::new()
            .with_failure("overloaded")
            .with_failure("overloaded");
        let extractor = InsightExtractor::new(&provider, &LlmConfig::default());

        assert!(extractor.summarize("digest").await.is_err());
        assert!(extractor.extract_topics("digest", 10).await.is_err());
    }
}
