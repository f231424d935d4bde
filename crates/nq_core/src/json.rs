use serde::de::DeserializeOwned;

/// Strip the wrapping a chat model tends to put around JSON: whitespace,
/// markdown code fences and any prose before the first `{` or after the last `}`.
pub fn clean_model_json(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // drop the language tag on the fence line
        text = match rest.find('\n') {
            Some(newline) => &rest[newline + 1..],
            None => rest,
        };
        text = text.trim_end();
        text = text.strip_suffix("```").unwrap_or(text).trim();
    }

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

/// Parse model output as JSON, allowing a single cleanup pass.
pub fn parse_model_json<T: DeserializeOwned>(raw: &str) -> serde_json::Result<T> {
    match serde_json::from_str(raw.trim()) {
        Ok(value) => Ok(value),
        Err(_) => serde_json::from_str(clean_model_json(raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_strips_code_fence() {
        let raw = "```json\n{\"command\": \"summary\"}\n```";
        assert_eq!(clean_model_json(raw), "{\"command\": \"summary\"}");

        let raw = "```\n{\"a\": 1}\n```\n";
        assert_eq!(clean_model_json(raw), "{\"a\": 1}");
    }

    #[test]
    fn test_strips_surrounding_prose() {
        let raw = "Sure! Here is the plan: {\"command\": \"summary\", \"args\": {}} Hope it helps.";
        let value: Value = parse_model_json(raw).unwrap();
        assert_eq!(value["command"], "summary");
    }

    #[test]
    fn test_plain_json_untouched() {
        let value: Value = parse_model_json("  {\"x\": [1, 2]}  ").unwrap();
        assert_eq!(value["x"][1], 2);
    }

    #[test]
    fn test_garbage_fails() {
        assert!(parse_model_json::<Value>("I cannot help with that").is_err());
        assert!(parse_model_json::<Value>("```json\n{\"broken\": \n```").is_err());
    }
}
