use serde_json::Value;

/// Isolates the outermost JSON array in free-form model output.
///
/// Models tend to wrap the array in prose or code fences, so this takes the
/// span from the first `[` to the last `]`. Returns `None` when no such span
/// exists.
pub fn extract_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

/// Best-effort parse of a JSON array out of a model reply.
///
/// Falls back to parsing the whole reply when no bracketed span is found.
pub fn parse_json_array(text: &str) -> Result<Vec<Value>, serde_json::Error> {
    let candidate = extract_json_array(text).unwrap_or(text);
    serde_json::from_str(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_with_preamble() {
        let reply = "Sure! Here are the topics:\n```json\n[{\"title\": \"a\"}]\n```\nHope that helps.";
        assert_eq!(extract_json_array(reply), Some("[{\"title\": \"a\"}]"));
    }

    #[test]
    fn test_extract_without_brackets() {
        assert_eq!(extract_json_array("no array here"), None);
        assert_eq!(extract_json_array("] backwards ["), None);
    }

    #[test]
    fn test_parse_nested_arrays() {
        let values = parse_json_array("x [[1], [2, 3]] y").unwrap();
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn test_parse_failure() {
        assert!(parse_json_array("I could not find any topics.").is_err());
        assert!(parse_json_array("[not json]").is_err());
    }
}
