//! Extracting structured results from model output
//!
//! The search prompts ask for a bare JSON array but models routinely
//! wrap it in prose or code fences. Extraction takes the span from the
//! first `[` to the last `]`; if that span does not parse the caller
//! degrades to an empty result carrying the raw text.

use serde::de::DeserializeOwned;

/// Slice from the first `[` to the last `]`, if both exist
pub fn extract_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Parse the embedded array (or, failing extraction, the whole text)
/// into typed hits. `None` means the response shape was unexpected.
pub fn parse_hits<T: DeserializeOwned>(text: &str) -> Option<Vec<T>> {
    let candidate = extract_json_array(text).unwrap_or(text);
    serde_json::from_str(candidate).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_extracts_array_from_prose() {
        let text = "Here are the results:\n[{\"title\": \"A\"}]\nHope that helps!";
        assert_eq!(extract_json_array(text), Some("[{\"title\": \"A\"}]"));
    }

    #[test]
    fn test_extracts_array_from_code_fence() {
        let text = "```json\n[{\"title\": \"A\"}, {\"title\": \"B\"}]\n```";
        let hits: Vec<Value> = parse_hits(text).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0]["title"], "A");
    }

    #[test]
    fn test_bare_array_round_trips() {
        let hits: Vec<Value> = parse_hits("[]").unwrap();
        assert!(hits.is_empty());

        let hits: Vec<Value> =
            parse_hits(r#"[{"patentNumber": "US1234567", "similarityScore": 8}]"#).unwrap();
        assert_eq!(hits[0]["similarityScore"], 8);
    }

    #[test]
    fn test_no_array_is_none() {
        assert_eq!(extract_json_array("no brackets here"), None);
        assert!(parse_hits::<Value>("the model refused to answer").is_none());
    }

    #[test]
    fn test_mismatched_brackets_are_none() {
        assert_eq!(extract_json_array("] before ["), None);
        assert!(parse_hits::<Value>("[{\"title\": unterminated").is_none());
    }

    #[test]
    fn test_inner_brackets_take_widest_span() {
        let text = "scores [1, 2] then [3, 4]";
        assert_eq!(extract_json_array(text), Some("[1, 2] then [3, 4]"));
        // The widest span fails to parse, so hits degrade to None
        assert!(parse_hits::<Value>(text).is_none());
    }

    #[test]
    fn test_nested_arrays_parse() {
        let text = "result: [[1, 2], [3]]";
        let hits: Vec<Value> = parse_hits(text).unwrap();
        assert_eq!(hits.len(), 2);
    }
}
