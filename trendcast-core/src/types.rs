use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MIN_TOPIC_COUNT: usize = 1;
pub const MAX_TOPIC_COUNT: usize = 50;
pub const DEFAULT_TOPIC_COUNT: usize = 10;

pub const MIN_IMPORTANCE: u8 = 1;
pub const MAX_IMPORTANCE: u8 = 10;
pub const DEFAULT_IMPORTANCE: i64 = 5;

pub const UNKNOWN_TOPIC_TITLE: &str = "Unknown Topic";

/// Image prompt for topics that never received one.
pub const DEFAULT_IMAGE_PROMPT: &str = "futuristic AI technology visualization";

/// A single forum post, normalized from either the scraped listing or the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub title: String,
    pub score: i64,
    pub comment_count: u64,
    pub url: String,
    pub channel: String,
    pub permalink: String,
}

/// A ranked subject extracted from the digest.
///
/// `image_prompt` is filled in by the prompt synthesizer, `image_path` and
/// `image_filename` by the illustrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub title: String,
    /// English rendering of the title, used for image prompts.
    pub title_en: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub importance: u8,
    pub image_prompt: Option<String>,
    pub image_path: Option<String>,
    pub image_filename: Option<String>,
}

/// Wire form of a topic as the model emits it.
///
/// Every field is optional; defaults are applied by [`Topic::from_record`].
/// A field that is present with the wrong JSON type makes the whole record
/// fail to decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicRecord {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub title_en: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default, deserialize_with = "deserialize_importance")]
    pub importance: Option<i64>,
    #[serde(default)]
    pub image_prompt: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub image_filename: Option<String>,
}

/// Models report importance as an integer, a float or a numeric string.
fn deserialize_importance<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|f| f as i64))
            .map(Some)
            .ok_or_else(|| de::Error::custom("importance is not a finite number")),
        Some(Value::String(text)) => text
            .trim()
            .parse::<f64>()
            .map(|f| Some(f as i64))
            .map_err(de::Error::custom),
        Some(other) => Err(de::Error::custom(format!(
            "importance has unsupported type: {other}"
        ))),
    }
}

pub fn clamp_importance(value: i64) -> u8 {
    value.clamp(MIN_IMPORTANCE as i64, MAX_IMPORTANCE as i64) as u8
}

pub fn clamp_topic_count(count: usize) -> usize {
    count.clamp(MIN_TOPIC_COUNT, MAX_TOPIC_COUNT)
}

impl Topic {
    pub fn from_record(record: TopicRecord) -> Self {
        let title = record
            .title
            .unwrap_or_else(|| UNKNOWN_TOPIC_TITLE.to_string());
        let title_en = record.title_en.unwrap_or_else(|| title.clone());

        Self {
            title,
            title_en,
            description: record.description.unwrap_or_default(),
            keywords: record.keywords.unwrap_or_default(),
            importance: clamp_importance(record.importance.unwrap_or(DEFAULT_IMPORTANCE)),
            image_prompt: record.image_prompt,
            image_path: record.image_path,
            image_filename: record.image_filename,
        }
    }

    pub fn to_record(&self) -> TopicRecord {
        TopicRecord {
            title: Some(self.title.clone()),
            title_en: Some(self.title_en.clone()),
            description: Some(self.description.clone()),
            keywords: Some(self.keywords.clone()),
            importance: Some(self.importance as i64),
            image_prompt: self.image_prompt.clone(),
            image_path: self.image_path.clone(),
            image_filename: self.image_filename.clone(),
        }
    }

    /// Decodes one element of a model-produced JSON array.
    ///
    /// Returns `None` for anything that is not an object or whose fields have
    /// the wrong shape; such elements are dropped rather than half-filled.
    pub fn decode(value: Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value::<TopicRecord>(value)
            .ok()
            .map(Self::from_record)
    }

    /// Title to use in image prompts; falls back to the primary title.
    pub fn english_title(&self) -> &str {
        if self.title_en.trim().is_empty() {
            &self.title
        } else {
            &self.title_en
        }
    }

    pub fn has_image(&self) -> bool {
        self.image_path.is_some()
    }

    pub fn clear_image(&mut self) {
        self.image_path = None;
        self.image_filename = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_topic() -> Topic {
        Topic {
            title: "Open weights catch up".to_string(),
            title_en: "Open weights catch up".to_string(),
            description: "Community models close the gap.".to_string(),
            keywords: vec!["open source".to_string(), "Llama".to_string()],
            importance: 8,
            image_prompt: Some("glowing lattice".to_string()),
            image_path: None,
            image_filename: None,
        }
    }

    #[test]
    fn test_decode_applies_defaults() {
        let topic = Topic::decode(json!({})).unwrap();
        assert_eq!(topic.title, UNKNOWN_TOPIC_TITLE);
        assert_eq!(topic.title_en, UNKNOWN_TOPIC_TITLE);
        assert_eq!(topic.description, "");
        assert!(topic.keywords.is_empty());
        assert_eq!(topic.importance, 5);
    }

    #[test]
    fn test_decode_falls_back_to_primary_title() {
        let topic = Topic::decode(json!({"title": "Agents everywhere"})).unwrap();
        assert_eq!(topic.title_en, "Agents everywhere");
    }

    #[test]
    fn test_decode_clamps_importance() {
        let high = Topic::decode(json!({"title": "a", "importance": 42})).unwrap();
        assert_eq!(high.importance, 10);

        let low = Topic::decode(json!({"title": "b", "importance": -3})).unwrap();
        assert_eq!(low.importance, 1);

        let text = Topic::decode(json!({"title": "c", "importance": "7"})).unwrap();
        assert_eq!(text.importance, 7);

        let float = Topic::decode(json!({"title": "d", "importance": 6.9})).unwrap();
        assert_eq!(float.importance, 6);
    }

    #[test]
    fn test_decode_rejects_mismatched_fields() {
        assert!(Topic::decode(json!({"title": 12})).is_none());
        assert!(Topic::decode(json!({"title": "x", "keywords": "not-a-list"})).is_none());
        assert!(Topic::decode(json!({"title": "x", "importance": "high"})).is_none());
        assert!(Topic::decode(json!("just a string")).is_none());
        assert!(Topic::decode(json!([1, 2, 3])).is_none());
    }

    #[test]
    fn test_record_round_trip() {
        let topic = sample_topic();
        let value = serde_json::to_value(topic.to_record()).unwrap();
        let decoded = Topic::decode(value).unwrap();
        assert_eq!(decoded, topic);
    }

    #[test]
    fn test_clamping_is_idempotent() {
        for raw in [-100_i64, 0, 1, 5, 10, 11, 1000] {
            let once = clamp_importance(raw);
            assert_eq!(clamp_importance(once as i64), once);
            assert!((MIN_IMPORTANCE..=MAX_IMPORTANCE).contains(&once));
        }
    }

    #[test]
    fn test_clamp_topic_count() {
        assert_eq!(clamp_topic_count(0), 1);
        assert_eq!(clamp_topic_count(10), 10);
        assert_eq!(clamp_topic_count(500), 50);
    }

    #[test]
    fn test_english_title() {
        let mut topic = sample_topic();
        topic.title = "开源模型".to_string();
        topic.title_en = "   ".to_string();
        assert_eq!(topic.english_title(), "开源模型");
    }
}
