use serde_json::Value;
use tracing::{info, warn};
use trendcast_core::{parse_json_array, ErrorExt, LlmConfig, Topic};

use crate::LlmProvider;

const FALLBACK_KEYWORDS: &str = "AI, technology";
const FALLBACK_KEYWORD_COUNT: usize = 3;

/// Turns topics into image-generation prompts with a single batched call.
pub struct PromptSynthesizer<'a, P: LlmProvider> {
    provider: &'a P,
    max_tokens: u32,
}

impl<'a, P: LlmProvider> PromptSynthesizer<'a, P> {
    pub fn new(provider: &'a P, config: &LlmConfig) -> Self {
        Self {
            provider,
            max_tokens: config.prompts_max_tokens,
        }
    }

    /// Fills `image_prompt` on every topic. Never fails; a failed call or an
    /// unusable reply falls back to a prompt derived from the topic itself.
    pub async fn synthesize(&self, topics: &mut [Topic]) {
        if topics.is_empty() {
            return;
        }

        info!("Generating image prompts for {} topics", topics.len());

        match self
            .provider
            .complete(&synthesis_prompt(topics), self.max_tokens)
            .await
        {
            Ok(reply) => apply_prompts(topics, &reply),
            Err(e) => {
                e.log_warn();
                warn!("Falling back to generated prompts for all topics");
                for topic in topics.iter_mut() {
                    topic.image_prompt = Some(fallback_prompt(topic));
                }
            }
        }
    }
}

/// Assigns prompts from a model reply positionally. Entries that are missing,
/// blank or not strings are replaced with [`fallback_prompt`].
pub fn apply_prompts(topics: &mut [Topic], reply: &str) {
    let entries = parse_json_array(reply).unwrap_or_else(|e| {
        warn!("Image prompt JSON parsing error: {}", e);
        Vec::new()
    });

    let mut fallbacks = 0;
    for (i, topic) in topics.iter_mut().enumerate() {
        let prompt = match entries.get(i) {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            _ => {
                fallbacks += 1;
                fallback_prompt(topic)
            }
        };
        topic.image_prompt = Some(prompt);
    }

    if fallbacks > 0 {
        warn!("Used fallback image prompts for {} topics", fallbacks);
    }
}

/// Deterministic prompt built from the English title and first three keywords.
pub fn fallback_prompt(topic: &Topic) -> String {
    let keywords = if topic.keywords.is_empty() {
        FALLBACK_KEYWORDS.to_string()
    } else {
        topic
            .keywords
            .iter()
            .take(FALLBACK_KEYWORD_COUNT)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "Futuristic digital illustration of {}, featuring {}, clean modern style, blue and purple neon tones, high detail",
        topic.english_title(),
        keywords
    )
}

fn topic_line(index: usize, topic: &Topic) -> String {
    let keywords = if topic.keywords.is_empty() {
        "AI".to_string()
    } else {
        topic.keywords.join(", ")
    };
    format!("{}. {} - Keywords: {}", index + 1, topic.english_title(), keywords)
}

fn synthesis_prompt(topics: &[Topic]) -> String {
    let lines = topics
        .iter()
        .enumerate()
        .map(|(i, topic)| topic_line(i, topic))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Write one image-generation prompt for each of the following AI news topics.

Topics:
{lines}

Guidelines:
- Write every prompt in English
- Describe a single striking scene suited to a news illustration
- Favor a futuristic, technological aesthetic
- Do not ask for any text, letters or logos in the image
- Keep each prompt under 50 words

Respond with a JSON array of strings in the same order as the topics:
["prompt for topic 1", "prompt for topic 2", ...]

Return only the JSON array."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::ScriptedProvider;

    fn topic(title: &str, title_en: &str, keywords: &[&str]) -> Topic {
        Topic::from_record(trendcast_core::TopicRecord {
            title: Some(title.to_string()),
            title_en: Some(title_en.to_string()),
            keywords: Some(keywords.iter().map(|k| k.to_string()).collect()),
            ..Default::default()
        })
    }

    fn sample_topics() -> Vec<Topic> {
        vec![
            topic("Agents everywhere", "Agents everywhere", &["agents", "tools"]),
            topic("Chip shortage", "", &[]),
            topic("Small models", "Small models", &["phi", "gemma", "llama", "qwen"]),
        ]
    }

    #[test]
    fn test_topic_line_format() {
        let topics = sample_topics();
        assert_eq!(
            topic_line(0, &topics[0]),
            "1. Agents everywhere - Keywords: agents, tools"
        );
        assert_eq!(topic_line(1, &topics[1]), "2. Chip shortage - Keywords: AI");
    }

    #[test]
    fn test_fallback_prompt_contents() {
        let topics = sample_topics();

        let prompt = fallback_prompt(&topics[2]);
        assert!(prompt.contains("Small models"));
        assert!(prompt.contains("phi, gemma, llama"));
        assert!(!prompt.contains("qwen"));

        let prompt = fallback_prompt(&topics[1]);
        assert!(prompt.contains("Chip shortage"));
        assert!(prompt.contains(FALLBACK_KEYWORDS));
    }

    #[test]
    fn test_apply_prompts_fills_gaps() {
        let mut topics = sample_topics();
        apply_prompts(
            &mut topics,
            r#"Sure: ["a robot workshop at dawn", "   ", 42] done"#,
        );

        assert_eq!(
            topics[0].image_prompt.as_deref(),
            Some("a robot workshop at dawn")
        );
        assert_eq!(topics[1].image_prompt, Some(fallback_prompt(&topics[1])));
        assert_eq!(topics[2].image_prompt, Some(fallback_prompt(&topics[2])));
    }

    #[test]
    fn test_apply_prompts_unparsable_reply() {
        let mut topics = sample_topics();
        apply_prompts(&mut topics, "no prompts today");

        for topic in &topics {
            let prompt = topic.image_prompt.as_deref().unwrap();
            assert!(!prompt.is_empty());
            assert!(prompt.contains(topic.english_title()));
        }
    }

    #[test]
    fn test_empty_topics_make_no_call() {
        let provider = ScriptedProvider::new();
        let synthesizer = PromptSynthesizer::new(&provider, &LlmConfig::default());

        tokio_test::block_on(synthesizer.synthesize(&mut []));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_llm_failure_falls_back_for_every_topic() {
        let provider = ScriptedProvider::new().with_failure("upstream down");
        let synthesizer = PromptSynthesizer::new(&provider, &LlmConfig::default());

        let mut topics = sample_topics();
        synthesizer.synthesize(&mut topics).await;

        assert_eq!(provider.calls(), 1);
        for topic in &topics {
            assert_eq!(topic.image_prompt, Some(fallback_prompt(topic)));
        }
    }

    #[tokio::test]
    async fn test_prompts_are_batched_in_order() {
        let provider = ScriptedProvider::new().with_reply(r#"["one", "two", "three"]"#);
        let synthesizer = PromptSynthesizer::new(&provider, &LlmConfig::default());

        let mut topics = sample_topics();
        synthesizer.synthesize(&mut topics).await;

        let prompts: Vec<_> = topics
            .iter()
            .map(|t| t.image_prompt.as_deref().unwrap())
            .collect();
        assert_eq!(prompts, vec!["one", "two", "three"]);

        let sent = &provider.prompts()[0];
        assert!(sent.contains("1. Agents everywhere - Keywords: agents, tools"));
        assert!(sent.contains("3. Small models - Keywords: phi, gemma, llama, qwen"));
    }
}
